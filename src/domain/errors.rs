//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntakeError {
    /// Client-detected before any network call; the user corrects input and retries.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Backend reports the username is already registered. Detail is surfaced verbatim.
    #[error("Registration conflict: {0}")]
    Conflict(String),

    /// Backend reports unknown username or bad credentials. Detail is surfaced verbatim.
    #[error("Login failed: {0}")]
    NotFound(String),

    /// Upload rejected (non-2xx) or the response body could not be parsed.
    /// Carries the backend's message; retry by resubmitting.
    #[error("Upload failed: {0}")]
    Upload(String),

    /// Network failure. Retried automatically by the poller within its deadline.
    #[error("Network error: {0}")]
    Transient(String),

    /// Primary extraction payload never arrived within the poll deadline.
    /// Processing may still complete later on the backend side.
    #[error("Processing timed out after {attempts} polls")]
    Timeout { attempts: u32 },

    /// Poll deadline exhausted on repeated network failures.
    #[error("Polling failed: {0}")]
    Poll(String),

    /// Polling was cancelled by the caller; no further attempts were scheduled.
    #[error("Polling cancelled")]
    Cancelled,

    /// Local session storage error.
    #[error("Session storage error: {0}")]
    Session(String),

    /// Local history log error.
    #[error("History log error: {0}")]
    History(String),

    /// Report file could not be written.
    #[error("Report error: {0}")]
    Report(String),
}

impl IntakeError {
    /// True for errors the poller retries on its own (the user never sees them
    /// unless the deadline is exceeded).
    pub fn is_transient(&self) -> bool {
        matches!(self, IntakeError::Transient(_))
    }
}
