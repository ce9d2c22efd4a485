//! Implements HistoryPort. Upload records as JSON Lines (JSONL).
//! One shared file: data/history.jsonl. Append-only writes; reads filter
//! by username and return newest first.

use crate::domain::{IntakeError, UploadJob};
use crate::ports::HistoryPort;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// File-system history log. One JSON object per line.
pub struct HistoryJson {
    path: std::path::PathBuf,
}

impl HistoryJson {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait::async_trait]
impl HistoryPort for HistoryJson {
    async fn append(&self, job: &UploadJob) -> Result<(), IntakeError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| IntakeError::History(format!("create history dir: {}", e)))?;
        }
        let mut line =
            serde_json::to_string(job).map_err(|e| IntakeError::History(e.to_string()))?;
        line.push('\n');

        let mut f = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| IntakeError::History(format!("open history log: {}", e)))?;
        f.write_all(line.as_bytes())
            .await
            .map_err(|e| IntakeError::History(format!("append history record: {}", e)))?;
        Ok(())
    }

    async fn list_for_user(
        &self,
        username: &str,
        limit: usize,
    ) -> Result<Vec<UploadJob>, IntakeError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(IntakeError::History(e.to_string())),
        };

        let mut jobs: Vec<UploadJob> = Vec::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<UploadJob>(line) {
                Ok(job) if job.username == username => jobs.push(job),
                Ok(_) => {}
                // A torn last line (crash mid-append) is skipped, not fatal.
                Err(e) => warn!(error = %e, "skipping malformed history line"),
            }
        }

        jobs.reverse();
        jobs.truncate(limit);
        Ok(jobs)
    }
}
