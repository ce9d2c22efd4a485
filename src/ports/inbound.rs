//! Inbound port. UI (adapter) calls into the application.

use crate::domain::IntakeError;

/// Input port: UI/CLI invokes application use cases.
#[async_trait::async_trait]
pub trait InputPort: Send + Sync {
    /// Run the interactive flow (auth menu, uploads, polling, history).
    /// Returns when the user quits; application errors are rendered inline
    /// and never bubble out of here.
    async fn run(&self) -> Result<(), IntakeError>;
}
