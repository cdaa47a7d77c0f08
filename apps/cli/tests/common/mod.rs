//! Shared setup for CLI integration tests.
//!
//! Each [`TestContext`] owns a temporary data directory with a fresh
//! [`JsonFileStore`] and a config pointing at it.

use std::fs;
use std::path::PathBuf;

use chrono::Duration;
use glimmind_cli::config::Config;
use glimmind_cli::store::JsonFileStore;
use tempfile::TempDir;

pub struct TestContext {
    pub dir: TempDir,
    pub store: JsonFileStore,
    pub config: Config,
}

impl TestContext {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("lists")).unwrap();
        let config = Config {
            data_dir: store.dir().to_path_buf(),
            owner_id: "tester".to_string(),
            default_threshold: 0.9,
            feedback_pause: Duration::zero(),
        };
        Self { dir, store, config }
    }

    /// Write a bulk import file inside the temp dir.
    pub fn write_import(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    /// Run a command that writes to a buffer and return the output.
    pub fn output<F>(&self, f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> anyhow::Result<()>,
    {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }
}
