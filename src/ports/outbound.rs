//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{
    IntakeError, PollOutcome, PreparedSubmission, QcSubmission, Session, UploadJob, UploadReceipt,
};

/// Processing backend gateway. Identity, uploads, status polling.
///
/// The backend owns upload jobs and extraction results; this side holds only
/// the opaque `upload_id` it hands back.
#[async_trait::async_trait]
pub trait BackendGateway: Send + Sync {
    /// Register a new account. Returns the canonical username echoed by the
    /// backend. `IntakeError::Conflict` when the username is taken.
    async fn register(&self, username: &str, password: &str) -> Result<String, IntakeError>;

    /// Log in. Returns the canonical username. `IntakeError::NotFound` on
    /// unknown username or bad credentials.
    async fn login(&self, username: &str, password: &str) -> Result<String, IntakeError>;

    /// Submit a prepared multi-carrier batch. `username` travels as the
    /// identity header, never inside the multipart body.
    async fn upload(
        &self,
        username: &str,
        submission: &PreparedSubmission,
    ) -> Result<UploadReceipt, IntakeError>;

    /// Submit a strict QC batch (quote + policy + certificate).
    async fn upload_qc(
        &self,
        username: &str,
        submission: &QcSubmission,
    ) -> Result<UploadReceipt, IntakeError>;

    /// Fetch processing status for an upload. Maps HTTP 404 and envelopes
    /// without the primary payload to `PollOutcome::Pending`; network
    /// failures to `IntakeError::Transient`. Idempotent on the server side.
    async fn fetch_status(&self, upload_id: &str) -> Result<PollOutcome, IntakeError>;
}

/// Session store port. One file per profile; concurrent client instances
/// with distinct profiles hold independent sessions.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the persisted session, if any.
    async fn load(&self) -> Result<Option<Session>, IntakeError>;

    /// Persist a session, overwriting any previous one.
    async fn save(&self, session: &Session) -> Result<(), IntakeError>;

    /// Remove the persisted session. Idempotent.
    async fn clear(&self) -> Result<(), IntakeError>;
}

/// Local upload-history log.
#[async_trait::async_trait]
pub trait HistoryPort: Send + Sync {
    /// Append a record for an accepted upload.
    async fn append(&self, job: &UploadJob) -> Result<(), IntakeError>;

    /// Records for one user, newest first, up to `limit`.
    async fn list_for_user(
        &self,
        username: &str,
        limit: usize,
    ) -> Result<Vec<UploadJob>, IntakeError>;
}
