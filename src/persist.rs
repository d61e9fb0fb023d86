//! Binary persistence of the fitted random forest

use crate::model::RandomForestRegressor;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Serialize the forest with bincode, replacing any existing file
pub fn save_model(model: &RandomForestRegressor, path: &Path) -> crate::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    bincode::serialize_into(&mut writer, model)?;
    writer.flush()?;

    info!(path = %path.display(), trees = model.n_trees(), "model written");
    Ok(())
}

/// Read a forest previously written by [`save_model`]
pub fn load_model(path: &Path) -> crate::Result<RandomForestRegressor> {
    let reader = BufReader::new(File::open(path)?);
    let model = bincode::deserialize_from(reader)?;
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::model::{ForestConfig, Regressor};
    use ndarray::{Array1, Array2};
    use tempfile::tempdir;

    fn create_test_forest() -> (RandomForestRegressor, Array2<f64>) {
        let features = Array2::from_shape_fn((30, 2), |(r, c)| ((r + 1) * (c + 2) % 13) as f64);
        let target = Array1::from_shape_fn(30, |r| (r as f64).sqrt() * 4.0);
        let names = vec!["qty".to_string(), "lag_price".to_string()];
        let config = ForestConfig {
            n_trees: 8,
            ..Default::default()
        };
        let forest = RandomForestRegressor::fit(config, &features, &target, &names).unwrap();
        (forest, features)
    }

    #[test]
    fn test_saved_model_predicts_identically() {
        let (forest, features) = create_test_forest();
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("rf_model.bin");

        save_model(&forest, &path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);

        let restored = load_model(&path).unwrap();
        assert_eq!(restored, forest);
        assert_eq!(
            restored.predict(&features).unwrap(),
            forest.predict(&features).unwrap()
        );
        assert_eq!(restored.feature_names(), forest.feature_names());
    }

    #[test]
    fn test_save_overwrites_existing_file() {
        let (forest, _) = create_test_forest();
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("rf_model.bin");

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, vec![0xAB; 1 << 20]).unwrap();

        save_model(&forest, &path).unwrap();
        let restored = load_model(&path).unwrap();
        assert_eq!(restored.n_trees(), 8);
    }

    #[test]
    fn test_load_garbage_fails() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("broken.bin");
        std::fs::write(&path, b"not a model").unwrap();

        assert!(matches!(
            load_model(&path),
            Err(PipelineError::Serialization(_))
        ));
    }
}
