//! Application use cases. Orchestrate domain logic via ports.

pub mod auth_service;
pub mod poll_service;
pub mod report_service;
pub mod upload_service;

pub use auth_service::AuthService;
pub use poll_service::{PollCancel, ResultPoller};
pub use report_service::ReportService;
pub use upload_service::UploadService;

#[cfg(test)]
mod flow_tests {
    //! Full intake flow against the mock gateway: register, login, submit,
    //! poll to completion.

    use super::*;
    use crate::adapters::http::{MockBackendGateway, ScriptedStatus};
    use crate::adapters::persistence::{HistoryJson, SessionJson};
    use crate::domain::{AttachedDocument, CarrierBatch, DocumentSlot};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_register_upload_poll_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(
            MockBackendGateway::with_script(vec![
                ScriptedStatus::NotReady,
                ScriptedStatus::NotReady,
                ScriptedStatus::Full,
            ])
            .with_delay(Duration::from_millis(1)),
        );
        let auth = AuthService::new(
            gateway.clone(),
            Arc::new(SessionJson::new(dir.path().join("session.json"))),
        );
        let uploads = UploadService::new(
            gateway.clone(),
            Arc::new(HistoryJson::new(dir.path().join("history.jsonl"))),
        );
        let poller = ResultPoller::new(gateway.clone(), Duration::from_millis(1), 10, 20);

        let session = auth.register("mudassir", "pw1", "pw1").await.unwrap();
        assert_eq!(session.username, "mudassir");
        let session = auth.login("mudassir", "pw1").await.unwrap();
        assert_eq!(session.username, "mudassir");

        let mut batch = CarrierBatch::new();
        let id = batch.entries()[0].id;
        batch.set_name(id, "State Farm");
        batch
            .attach(
                id,
                DocumentSlot::Property,
                AttachedDocument::new("sf_property.pdf", vec![1, 2, 3]),
            )
            .unwrap();

        let job = uploads.submit(&batch, &session).await.unwrap();
        assert_eq!(job.total_files, 1);
        assert_eq!(gateway.identity_headers(), vec!["mudassir"]);

        // Two not-ready polls, then the full payload: no timeout.
        let (_cancel, rx) = PollCancel::channel();
        let result = poller.poll_for_result(&job.upload_id, rx).await.unwrap();
        assert_eq!(result.upload_id, job.upload_id);
        assert!(result.has_comparison());
    }
}
