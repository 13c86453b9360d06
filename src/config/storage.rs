//! Session storage configuration

use serde::Deserialize;
use std::path::PathBuf;

/// Session storage configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Directory for YAML session files; sessions live in memory when unset
    pub sessions_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Check if sessions are persisted to disk
    pub fn is_file_backed(&self) -> bool {
        self.sessions_dir.is_some()
    }
}
