//! Tests for the batch processor
//!
//! Each test builds a throwaway archive from the bulletin fixtures under
//! `tests/data` so runs never share files.

pub mod basic_processing;

use crate::config::MosConfig;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Copy the KAUS fixture bulletins into a fresh archive under `temp_dir`
pub fn create_test_archive(temp_dir: &TempDir) -> PathBuf {
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/KAUS");
    let root = temp_dir.path().join("data_arch");

    for model_dir in fs::read_dir(&fixtures).unwrap() {
        let model_dir = model_dir.unwrap().path();
        let target = root.join("KAUS").join(model_dir.file_name().unwrap());
        fs::create_dir_all(&target).unwrap();

        for file in fs::read_dir(&model_dir).unwrap() {
            let file = file.unwrap().path();
            fs::copy(&file, target.join(file.file_name().unwrap())).unwrap();
        }
    }

    root
}

pub fn test_config(root: &Path) -> Arc<MosConfig> {
    Arc::new(
        MosConfig::default()
            .with_data_root(root)
            .with_max_concurrent_files(2),
    )
}
