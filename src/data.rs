//! Dataset loading, cleaning and feature extraction using Polars

use crate::error::PipelineError;
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Number of rows shown in the dataset preview
pub const PREVIEW_ROWS: usize = 5;

/// Cell markers read as missing, besides empty fields
pub const MISSING_VALUE_MARKERS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Numeric feature matrix with its aligned target vector
#[derive(Debug, Clone)]
pub struct FeatureSet {
    /// Feature matrix (n_rows, n_features), row-major
    pub features: Array2<f64>,
    /// Target value for each row
    pub target: Array1<f64>,
    /// Feature column names in table order
    pub feature_names: Vec<String>,
    /// Name of the target column
    pub target_name: String,
}

impl FeatureSet {
    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }
}

/// Pairwise Pearson correlation of the numeric columns of a table
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Square matrix indexed like `columns`
    pub values: Array2<f64>,
}

impl CorrelationMatrix {
    /// Correlation between two named columns
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        Some(self.values[[i, j]])
    }
}

/// Load the CSV dataset into a DataFrame
///
/// # Arguments
/// * `file_path` - Path to a comma-separated file with a header row
///
/// # Returns
/// * The raw table, or `FileNotFound` when the path does not exist
pub fn load_dataset(file_path: &Path) -> crate::Result<DataFrame> {
    if !file_path.is_file() {
        return Err(PipelineError::FileNotFound(file_path.to_path_buf()));
    }

    let null_values = NullValues::AllColumns(
        MISSING_VALUE_MARKERS.iter().map(|m| (*m).into()).collect(),
    );
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_null_values(Some(null_values)))
        .try_into_reader_with_file_path(Some(file_path.to_path_buf()))?
        .finish()?;
    let df = nan_to_null(&df)?;

    if df.width() == 0 {
        return Err(PipelineError::SchemaMismatch(format!(
            "{} has no columns",
            file_path.display()
        )));
    }

    info!(
        path = %file_path.display(),
        rows = df.height(),
        columns = df.width(),
        "dataset loaded"
    );

    Ok(df)
}

/// Print the first rows of the table
pub fn print_preview(df: &DataFrame) {
    println!("Dataset Preview:\n{}", df.head(Some(PREVIEW_ROWS)));
}

/// Count missing values per column, in column order
pub fn missing_value_counts(df: &DataFrame) -> Vec<(String, usize)> {
    df.get_columns()
        .iter()
        .map(|column| (column.name().to_string(), column.null_count()))
        .collect()
}

pub fn print_missing_values(counts: &[(String, usize)]) {
    println!("\nMissing Values:");
    let width = counts.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    for (name, count) in counts {
        println!("  {:width$}  {}", name, count, width = width);
    }
}

pub fn print_remaining_columns(df: &DataFrame) {
    println!("\nRemaining Columns:\n  {:?}", column_names(df));
}

/// Column names in table order
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

/// Drop incomplete rows, then drop the non-predictive columns
///
/// Rows are filtered while every column is still present, so a missing
/// value in a column that is dropped afterwards still removes its row.
pub fn clean_dataset(df: &DataFrame, drop_columns: &[String]) -> crate::Result<DataFrame> {
    let present = column_names(df);
    if let Some(missing) = drop_columns.iter().find(|c| !present.contains(*c)) {
        return Err(PipelineError::SchemaMismatch(format!(
            "column '{}' to drop is not in the dataset",
            missing
        )));
    }

    let rows_before = df.height();
    let mut cleaned = nan_to_null(df)?.drop_nulls::<String>(None)?;
    info!(
        dropped = rows_before - cleaned.height(),
        remaining = cleaned.height(),
        "rows with missing values removed"
    );

    for column in drop_columns {
        cleaned = cleaned.drop(column)?;
    }
    debug!(columns = ?column_names(&cleaned), "non-predictive columns removed");

    Ok(cleaned)
}

/// Mark floating-point NaN cells as missing
fn nan_to_null(df: &DataFrame) -> crate::Result<DataFrame> {
    let mut out = df.clone();
    for column in df.get_columns() {
        if !matches!(column.dtype(), DataType::Float32 | DataType::Float64) {
            continue;
        }
        let series = column.as_materialized_series().cast(&DataType::Float64)?;
        let masked: Float64Chunked = series
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect();
        out.with_column(masked.with_name(column.name().clone()).into_series())?;
    }
    Ok(out)
}

/// Whether a column type can be fed to the estimators
pub fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Separate the cleaned table into the feature matrix and the target vector
///
/// Every column other than `target` becomes a feature, in table order.
pub fn split_features_and_target(df: &DataFrame, target: &str) -> crate::Result<FeatureSet> {
    let names = column_names(df);
    if !names.iter().any(|n| n == target) {
        return Err(PipelineError::SchemaMismatch(format!(
            "target column '{}' is not in the dataset",
            target
        )));
    }

    let feature_names: Vec<String> = names.into_iter().filter(|n| n != target).collect();
    if feature_names.is_empty() {
        return Err(PipelineError::SchemaMismatch(
            "no feature columns left besides the target".to_string(),
        ));
    }

    let target_values = finite_column(df, target)?;
    let columns = feature_names
        .iter()
        .map(|name| finite_column(df, name))
        .collect::<crate::Result<Vec<Vec<f64>>>>()?;

    let features = Array2::from_shape_fn((df.height(), feature_names.len()), |(r, c)| {
        columns[c][r]
    });

    Ok(FeatureSet {
        features,
        target: Array1::from(target_values),
        feature_names,
        target_name: target.to_string(),
    })
}

/// Extract a numeric, null-free column as `f64`
fn numeric_column(df: &DataFrame, name: &str) -> crate::Result<Vec<f64>> {
    let column = df.column(name)?;
    if !is_numeric(column.dtype()) {
        return Err(PipelineError::NonNumericFeature(format!(
            "{} ({})",
            name,
            column.dtype()
        )));
    }
    if column.null_count() > 0 {
        return Err(PipelineError::SchemaMismatch(format!(
            "column '{}' still contains missing values",
            name
        )));
    }

    let casted = column
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    let values = casted.f64()?.into_no_null_iter().collect();
    Ok(values)
}

/// Numeric column whose values are all finite
fn finite_column(df: &DataFrame, name: &str) -> crate::Result<Vec<f64>> {
    let values = numeric_column(df, name)?;
    if let Some(v) = values.iter().find(|v| !v.is_finite()) {
        return Err(PipelineError::NonFiniteValue(format!("{} contains {}", name, v)));
    }
    Ok(values)
}

/// Pearson correlation over every numeric column, target included
pub fn correlation_matrix(df: &DataFrame) -> crate::Result<CorrelationMatrix> {
    let mut columns = Vec::new();
    let mut data = Vec::new();
    for column in df.get_columns() {
        if !is_numeric(column.dtype()) {
            debug!(column = %column.name(), "skipping non-numeric column in correlation");
            continue;
        }
        let name = column.name().to_string();
        data.push(numeric_column(df, &name)?);
        columns.push(name);
    }

    let n = columns.len();
    let values = Array2::from_shape_fn((n, n), |(i, j)| {
        let r = pearson(&data[i], &data[j]);
        if i == j && !r.is_nan() {
            1.0
        } else {
            r
        }
    });

    Ok(CorrelationMatrix { columns, values })
}

/// Pearson correlation coefficient; NaN when either side has no variance
fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len();
    if n < 2 || n != y.len() {
        return f64::NAN;
    }

    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (&a, &b) in x.iter().zip(y.iter()) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }
    (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn drop_columns() -> Vec<String> {
        vec![
            "product_id".to_string(),
            "month_year".to_string(),
            "product_category_name".to_string(),
        ]
    }

    fn create_test_csv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "product_id,month_year,product_category_name,unit_price,qty,cost").unwrap();
        writeln!(file, "bed1,01-05-2017,bed_bath_table,45.95,1,15.10").unwrap();
        writeln!(file, "bed1,01-06-2017,bed_bath_table,45.95,3,12.93").unwrap();
        writeln!(file, "garden5,01-07-2017,garden_tools,39.24,2,").unwrap();
        writeln!(file, "health9,01-08-2017,,89.90,4,21.30").unwrap();
        writeln!(file, "toys2,01-09-2017,toys,19.99,8,7.20").unwrap();
        file
    }

    #[test]
    fn test_load_dataset() {
        let test_file = create_test_csv();
        let df = load_dataset(test_file.path()).unwrap();
        assert_eq!(df.height(), 5);
        assert_eq!(df.width(), 6);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_dataset(Path::new("/definitely/not/here/retail_price.csv"));
        assert!(matches!(result, Err(PipelineError::FileNotFound(_))));
    }

    #[test]
    fn test_missing_value_counts() {
        let test_file = create_test_csv();
        let df = load_dataset(test_file.path()).unwrap();
        let counts = missing_value_counts(&df);

        assert_eq!(counts.len(), 6);
        assert_eq!(counts[0], ("product_id".to_string(), 0));
        assert_eq!(counts[2], ("product_category_name".to_string(), 1));
        assert_eq!(counts[5], ("cost".to_string(), 1));
    }

    #[test]
    fn test_clean_dataset() {
        let test_file = create_test_csv();
        let df = load_dataset(test_file.path()).unwrap();
        let cleaned = clean_dataset(&df, &drop_columns()).unwrap();

        // The row missing only a category name is gone even though that column is dropped
        assert_eq!(cleaned.height(), 3);
        assert_eq!(column_names(&cleaned), vec!["unit_price", "qty", "cost"]);
        assert!(missing_value_counts(&cleaned).iter().all(|(_, n)| *n == 0));
    }

    #[test]
    fn test_clean_dataset_missing_drop_column() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "product_id,unit_price,qty").unwrap();
        writeln!(file, "a,1.0,2").unwrap();
        let df = load_dataset(file.path()).unwrap();

        let result = clean_dataset(&df, &drop_columns());
        assert!(matches!(result, Err(PipelineError::SchemaMismatch(_))));
    }

    #[test]
    fn test_split_features_and_target() {
        let test_file = create_test_csv();
        let df = load_dataset(test_file.path()).unwrap();
        let cleaned = clean_dataset(&df, &drop_columns()).unwrap();
        let set = split_features_and_target(&cleaned, "unit_price").unwrap();

        assert_eq!(set.features.shape(), &[3, 2]);
        assert_eq!(set.feature_names, vec!["qty", "cost"]);
        assert_eq!(set.target.to_vec(), vec![45.95, 45.95, 19.99]);
        assert_eq!(set.features[[2, 0]], 8.0);
        assert_eq!(set.features[[1, 1]], 12.93);
    }

    #[test]
    fn test_split_missing_target() {
        let test_file = create_test_csv();
        let df = load_dataset(test_file.path()).unwrap();
        let cleaned = clean_dataset(&df, &drop_columns()).unwrap();

        let result = split_features_and_target(&cleaned, "price");
        assert!(matches!(result, Err(PipelineError::SchemaMismatch(_))));
    }

    #[test]
    fn test_non_numeric_feature() {
        let test_file = create_test_csv();
        let df = load_dataset(test_file.path()).unwrap();
        let cleaned = clean_dataset(&df, &["product_id".to_string()]).unwrap();

        let result = split_features_and_target(&cleaned, "unit_price");
        assert!(matches!(result, Err(PipelineError::NonNumericFeature(_))));
    }

    #[test]
    fn test_correlation_matrix() {
        let df = df!(
            "unit_price" => [1.0, 2.0, 3.0, 4.0],
            "qty" => [2i64, 4, 6, 8],
            "discount" => [4.0, 3.0, 2.0, 1.0],
            "flat" => [5.0, 5.0, 5.0, 5.0],
            "name" => ["a", "b", "c", "d"]
        )
        .unwrap();

        let corr = correlation_matrix(&df).unwrap();
        assert_eq!(corr.columns, vec!["unit_price", "qty", "discount", "flat"]);
        assert!((corr.get("unit_price", "qty").unwrap() - 1.0).abs() < 1e-12);
        assert!((corr.get("unit_price", "discount").unwrap() + 1.0).abs() < 1e-12);
        assert!(corr.get("qty", "flat").unwrap().is_nan());
        assert_eq!(corr.get("discount", "discount"), Some(1.0));
        assert!(corr.get("unit_price", "name").is_none());

        for i in 0..4 {
            for j in 0..4 {
                let (a, b) = (corr.values[[i, j]], corr.values[[j, i]]);
                assert!(a == b || (a.is_nan() && b.is_nan()));
            }
        }
    }

    #[test]
    fn test_missing_value_markers() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "product_id,month_year,product_category_name,unit_price,qty,cost").unwrap();
        writeln!(file, "bed1,01-05-2017,bed_bath_table,45.95,1,15.10").unwrap();
        writeln!(file, "bed1,01-06-2017,bed_bath_table,45.95,3,NA").unwrap();
        writeln!(file, "garden5,01-07-2017,garden_tools,39.24,2,NaN").unwrap();
        writeln!(file, "garden5,01-08-2017,N/A,42.50,6,14.80").unwrap();
        writeln!(file, "health9,01-09-2017,health_beauty,89.90,null,21.30").unwrap();
        writeln!(file, "toys2,01-10-2017,toys,19.99,8,7.20").unwrap();
        let df = load_dataset(file.path()).unwrap();

        assert!(is_numeric(df.column("cost").unwrap().dtype()));
        assert!(is_numeric(df.column("qty").unwrap().dtype()));
        let counts = missing_value_counts(&df);
        assert_eq!(counts[2], ("product_category_name".to_string(), 1));
        assert_eq!(counts[4], ("qty".to_string(), 1));
        assert_eq!(counts[5], ("cost".to_string(), 2));

        let cleaned = clean_dataset(&df, &drop_columns()).unwrap();
        assert_eq!(cleaned.height(), 2);
        let set = split_features_and_target(&cleaned, "unit_price").unwrap();
        assert_eq!(set.n_features(), 2);
        assert_eq!(set.target.to_vec(), vec![45.95, 19.99]);
    }

    #[test]
    fn test_clean_dataset_drops_nan_cells() {
        let df = df!(
            "product_id" => ["a", "b", "c"],
            "month_year" => ["01-01-2017", "01-02-2017", "01-03-2017"],
            "product_category_name" => ["toys", "toys", "toys"],
            "unit_price" => [10.0, 12.0, 14.0],
            "cost" => [1.0, f64::NAN, 3.0]
        )
        .unwrap();

        let cleaned = clean_dataset(&df, &drop_columns()).unwrap();
        assert_eq!(cleaned.height(), 2);
        assert!(missing_value_counts(&cleaned).iter().all(|(_, n)| *n == 0));
        let set = split_features_and_target(&cleaned, "unit_price").unwrap();
        assert_eq!(set.features.column(0).to_vec(), vec![1.0, 3.0]);
    }

    #[test]
    fn test_infinite_feature_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "unit_price,qty,cost").unwrap();
        writeln!(file, "45.95,1,15.10").unwrap();
        writeln!(file, "39.24,2,inf").unwrap();
        writeln!(file, "19.99,8,7.20").unwrap();
        let df = load_dataset(file.path()).unwrap();

        let result = split_features_and_target(&df, "unit_price");
        assert!(matches!(result, Err(PipelineError::NonFiniteValue(_))));
    }
}
