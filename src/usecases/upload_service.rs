//! Upload orchestration: validate the carrier batch, attach identity, submit,
//! record history.
//!
//! - Validation happens in full before any network call
//! - The username travels as the identity header, never as form content
//! - History is appended only after the backend accepted the batch

use crate::domain::{CarrierBatch, IntakeError, QcSubmission, Session, UploadJob};
use crate::ports::{BackendGateway, HistoryPort};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

/// Default number of history records shown in the TUI.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Upload service. Coordinates batch submission and the local history log.
pub struct UploadService {
    gateway: Arc<dyn BackendGateway>,
    history: Arc<dyn HistoryPort>,
}

impl UploadService {
    pub fn new(gateway: Arc<dyn BackendGateway>, history: Arc<dyn HistoryPort>) -> Self {
        Self { gateway, history }
    }

    /// Submit a multi-carrier batch (loose policy: at least one file across
    /// all entries). Returns the job whose `upload_id` drives polling.
    pub async fn submit(
        &self,
        batch: &CarrierBatch,
        session: &Session,
    ) -> Result<UploadJob, IntakeError> {
        let prepared = batch.prepare()?;

        let receipt = self.gateway.upload(&session.username, &prepared).await?;
        let job = UploadJob {
            upload_id: receipt.upload_id,
            username: session.username.clone(),
            carriers: prepared.carriers,
            total_files: receipt.total_files,
            created_at: Utc::now(),
        };

        // A history write failure should not lose an accepted upload.
        if let Err(e) = self.history.append(&job).await {
            warn!(upload_id = %job.upload_id, error = %e, "failed to record upload history");
        }

        info!(
            upload_id = %job.upload_id,
            username = %job.username,
            carriers = job.carriers.len(),
            total_files = job.total_files,
            "batch submitted"
        );
        Ok(job)
    }

    /// Submit a QC batch (strict policy: quote, policy, and certificate all
    /// required).
    pub async fn submit_qc(
        &self,
        submission: &QcSubmission,
        session: &Session,
    ) -> Result<UploadJob, IntakeError> {
        submission.validate()?;

        let receipt = self.gateway.upload_qc(&session.username, submission).await?;
        let job = UploadJob {
            upload_id: receipt.upload_id,
            username: session.username.clone(),
            carriers: Vec::new(),
            total_files: receipt.total_files,
            created_at: Utc::now(),
        };

        if let Err(e) = self.history.append(&job).await {
            warn!(upload_id = %job.upload_id, error = %e, "failed to record upload history");
        }

        info!(upload_id = %job.upload_id, username = %job.username, "QC batch submitted");
        Ok(job)
    }

    /// Recent uploads for the session's user, newest first.
    pub async fn history(&self, session: &Session) -> Result<Vec<UploadJob>, IntakeError> {
        self.history
            .list_for_user(&session.username, DEFAULT_HISTORY_LIMIT)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::http::MockBackendGateway;
    use crate::adapters::persistence::HistoryJson;
    use crate::domain::{AttachedDocument, DocumentSlot};
    use std::time::Duration;

    fn pdf(name: &str) -> AttachedDocument {
        AttachedDocument::new(name, vec![1, 2, 3])
    }

    fn service(dir: &tempfile::TempDir) -> (UploadService, Arc<MockBackendGateway>) {
        let gateway = Arc::new(MockBackendGateway::new().with_delay(Duration::from_millis(1)));
        let history = Arc::new(HistoryJson::new(dir.path().join("history.jsonl")));
        (UploadService::new(gateway.clone(), history), gateway)
    }

    #[tokio::test]
    async fn test_submit_without_files_makes_no_network_call() {
        let dir = tempfile::tempdir().unwrap();
        let (service, gateway) = service(&dir);
        let mut batch = CarrierBatch::new();
        batch.set_name(batch.entries()[0].id, "State Farm");

        let err = service
            .submit(&batch, &Session::new("mudassir"))
            .await
            .unwrap_err();
        assert!(matches!(err, IntakeError::Validation(_)));
        assert_eq!(gateway.upload_call_count(), 0);
    }

    #[tokio::test]
    async fn test_submit_single_carrier_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let (service, _) = service(&dir);
        let mut batch = CarrierBatch::new();
        let id = batch.entries()[0].id;
        batch.set_name(id, "State Farm");
        batch
            .attach(id, DocumentSlot::Property, pdf("sf_property.pdf"))
            .unwrap();

        let job = service
            .submit(&batch, &Session::new("mudassir"))
            .await
            .unwrap();
        assert_eq!(job.total_files, 1);
        assert_eq!(job.username, "mudassir");
        assert!(!job.upload_id.is_empty());
    }

    #[tokio::test]
    async fn test_identity_header_matches_each_session() {
        let dir = tempfile::tempdir().unwrap();
        let (service, gateway) = service(&dir);

        for username in ["mudassir", "aamir"] {
            let mut batch = CarrierBatch::new();
            let id = batch.entries()[0].id;
            batch.set_name(id, "State Farm");
            batch
                .attach(id, DocumentSlot::Property, pdf("quote.pdf"))
                .unwrap();
            service.submit(&batch, &Session::new(username)).await.unwrap();
        }

        assert_eq!(gateway.identity_headers(), vec!["mudassir", "aamir"]);
    }

    #[tokio::test]
    async fn test_history_records_accepted_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let (service, _) = service(&dir);
        let session = Session::new("mudassir");

        let mut batch = CarrierBatch::new();
        let id = batch.entries()[0].id;
        batch.set_name(id, "State Farm");
        batch
            .attach(id, DocumentSlot::Liability, pdf("gl.pdf"))
            .unwrap();
        let job = service.submit(&batch, &session).await.unwrap();

        let listed = service.history(&session).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].upload_id, job.upload_id);

        // Other users see nothing.
        let other = service.history(&Session::new("aamir")).await.unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn test_submit_qc_requires_all_three_documents() {
        let dir = tempfile::tempdir().unwrap();
        let (service, gateway) = service(&dir);
        let incomplete = QcSubmission {
            carrier_name: "State Farm".to_string(),
            quote: pdf("quote.pdf"),
            policy: pdf("policy.pdf"),
            certificate: AttachedDocument::new("coi.pdf", Vec::new()),
        };

        let err = service
            .submit_qc(&incomplete, &Session::new("mudassir"))
            .await
            .unwrap_err();
        assert!(matches!(err, IntakeError::Validation(_)));
        assert_eq!(gateway.upload_call_count(), 0);

        let complete = QcSubmission {
            certificate: pdf("coi.pdf"),
            ..incomplete
        };
        let job = service
            .submit_qc(&complete, &Session::new("mudassir"))
            .await
            .unwrap();
        assert_eq!(job.total_files, 3);
    }
}
