//! File-based Session Repository Adapter
//!
//! Stores each session as a YAML file on disk, named after its id.
//! Human-readable so conversation logs can be inspected and diffed.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::foundation::SessionId;
use crate::domain::session::{Session, SessionError};
use crate::ports::SessionRepository;

/// File-based storage for sessions
#[derive(Debug, Clone)]
pub struct FileSessionRepository {
    base_path: PathBuf,
}

impl FileSessionRepository {
    /// Create a new file repository rooted at a base directory
    ///
    /// # Example
    /// ```ignore
    /// let repo = FileSessionRepository::new("./data/sessions");
    /// ```
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Get the session file path
    fn session_file_path(&self, id: &SessionId) -> PathBuf {
        self.base_path.join(format!("{}.yaml", id))
    }

    /// Ensure directory exists
    async fn ensure_dir(&self, path: &Path) -> Result<(), SessionError> {
        fs::create_dir_all(path)
            .await
            .map_err(|e| SessionError::storage(e.to_string()))
    }
}

#[async_trait]
impl SessionRepository for FileSessionRepository {
    async fn save(&self, session: &Session) -> Result<(), SessionError> {
        self.ensure_dir(&self.base_path).await?;

        let file_path = self.session_file_path(session.id());

        let yaml = serde_yaml::to_string(session)
            .map_err(|e| SessionError::storage(format!("serialization failed: {}", e)))?;

        // Write beside the target, then rename over it
        let tmp_path = file_path.with_extension("yaml.tmp");
        fs::write(&tmp_path, yaml)
            .await
            .map_err(|e| SessionError::storage(e.to_string()))?;
        fs::rename(&tmp_path, &file_path)
            .await
            .map_err(|e| SessionError::storage(e.to_string()))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &SessionId) -> Result<Option<Session>, SessionError> {
        let file_path = self.session_file_path(id);

        if !file_path.exists() {
            return Ok(None);
        }

        let yaml = fs::read_to_string(&file_path)
            .await
            .map_err(|e| SessionError::storage(e.to_string()))?;

        let session = serde_yaml::from_str(&yaml)
            .map_err(|e| SessionError::storage(format!("deserialization failed: {}", e)))?;

        Ok(Some(session))
    }

    async fn exists(&self, id: &SessionId) -> Result<bool, SessionError> {
        Ok(self.session_file_path(id).exists())
    }

    async fn delete(&self, id: &SessionId) -> Result<bool, SessionError> {
        match fs::remove_file(self.session_file_path(id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SessionError::storage(e.to_string())),
        }
    }
}
