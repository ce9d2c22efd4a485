//! Implements SessionStore using a JSON file.
//!
//! One file per profile; a session exists iff the file holds a username.

use crate::domain::{IntakeError, Session};
use crate::ports::SessionStore;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Serialize, Deserialize)]
struct SessionData {
    username: String,
}

/// JSON file-based session storage.
pub struct SessionJson {
    path: std::path::PathBuf,
}

impl SessionJson {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Atomic save using write-replace:
    /// 1. Write to temp file
    /// 2. sync_all() to ensure flush to disk
    /// 3. Atomic rename to target path
    async fn save_data(&self, data: &SessionData) -> Result<(), IntakeError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| IntakeError::Session(format!("create session dir: {}", e)))?;
        }
        let json = serde_json::to_string_pretty(data)
            .map_err(|e| IntakeError::Session(e.to_string()))?;

        let temp_path = self.path.with_extension("json.tmp");
        let mut f = fs::File::create(&temp_path)
            .await
            .map_err(|e| IntakeError::Session(format!("create temp file: {}", e)))?;
        f.write_all(json.as_bytes())
            .await
            .map_err(|e| IntakeError::Session(format!("write temp file: {}", e)))?;
        f.sync_all()
            .await
            .map_err(|e| IntakeError::Session(format!("sync temp file: {}", e)))?;
        drop(f);

        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| IntakeError::Session(format!("atomic rename failed: {}", e)))?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl SessionStore for SessionJson {
    async fn load(&self) -> Result<Option<Session>, IntakeError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(IntakeError::Session(e.to_string())),
        };
        // A corrupt or empty file means no session, not a fatal error.
        let data: SessionData = match serde_json::from_str(&content) {
            Ok(d) => d,
            Err(_) => return Ok(None),
        };
        if data.username.is_empty() {
            return Ok(None);
        }
        Ok(Some(Session::new(data.username)))
    }

    async fn save(&self, session: &Session) -> Result<(), IntakeError> {
        self.save_data(&SessionData {
            username: session.username.clone(),
        })
        .await
    }

    async fn clear(&self) -> Result<(), IntakeError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(IntakeError::Session(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionJson::new(dir.path().join("session.json"));

        assert!(store.load().await.unwrap().is_none());

        store.save(&Session::new("mudassir")).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.username, "mudassir");

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
        // Idempotent clear.
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionJson::new(dir.path().join("session.json"));
        store.save(&Session::new("mudassir")).await.unwrap();
        store.save(&Session::new("aamir")).await.unwrap();
        assert_eq!(store.load().await.unwrap().unwrap().username, "aamir");
    }

    #[tokio::test]
    async fn test_corrupt_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        tokio::fs::write(&path, "{not json").await.unwrap();
        let store = SessionJson::new(&path);
        assert!(store.load().await.unwrap().is_none());
    }
}
