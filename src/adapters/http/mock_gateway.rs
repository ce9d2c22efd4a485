//! Mock backend gateway for testing and offline use.
//!
//! Returns scripted responses without making network calls. Used by tests
//! and as the fallback wiring when INTAKE_API_BASE_URL is unset.

use crate::domain::{
    ComparisonFlag, CoverageCategory, ExtractionResult, IntakeError, PollOutcome,
    PreparedSubmission, QcSubmission, UploadReceipt,
};
use crate::ports::BackendGateway;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::info;

/// One scripted reply of the status endpoint, consumed in order. The last
/// step repeats once the script is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedStatus {
    /// HTTP 404 / envelope without the primary payload.
    NotReady,
    /// Primary extraction payload only.
    PrimaryOnly,
    /// Primary plus comparison payloads.
    Full,
    /// Simulated network failure.
    NetworkError,
}

/// Mock gateway. In-memory accounts, numbered upload ids, captured identity
/// headers, per-endpoint call counters, scriptable status sequence.
pub struct MockBackendGateway {
    delay: Duration,
    users: Mutex<BTreeMap<String, String>>,
    uploads_seen: Mutex<Vec<String>>,
    status_script: Mutex<Vec<ScriptedStatus>>,
    upload_calls: AtomicUsize,
    status_calls: AtomicUsize,
}

impl MockBackendGateway {
    /// Default script: pending twice, then primary, then full. The typical
    /// processing timeline compressed for interactive use.
    pub fn new() -> Self {
        Self::with_script(vec![
            ScriptedStatus::NotReady,
            ScriptedStatus::NotReady,
            ScriptedStatus::PrimaryOnly,
            ScriptedStatus::Full,
        ])
    }

    pub fn with_script(script: Vec<ScriptedStatus>) -> Self {
        Self {
            delay: Duration::from_millis(50),
            users: Mutex::new(BTreeMap::new()),
            uploads_seen: Mutex::new(Vec::new()),
            status_script: Mutex::new(script),
            upload_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Identity headers captured from upload calls, in call order.
    pub fn identity_headers(&self) -> Vec<String> {
        self.uploads_seen.lock().expect("mock state poisoned").clone()
    }

    pub fn upload_call_count(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn status_call_count(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    fn next_status(&self) -> ScriptedStatus {
        let mut script = self.status_script.lock().expect("mock state poisoned");
        if script.len() > 1 {
            script.remove(0)
        } else {
            script.first().copied().unwrap_or(ScriptedStatus::Full)
        }
    }

    fn sample_result(upload_id: &str, with_comparison: bool) -> ExtractionResult {
        let mut fields = BTreeMap::new();
        fields.insert(
            CoverageCategory::Property,
            BTreeMap::from([
                ("Building Limit".to_string(), "$1,000,000".to_string()),
                ("Deductible".to_string(), "$5,000".to_string()),
            ]),
        );
        fields.insert(
            CoverageCategory::GeneralLiability,
            BTreeMap::from([("Each Occurrence".to_string(), "$2,000,000".to_string())]),
        );

        let mut certificates = BTreeMap::new();
        certificates.insert(
            CoverageCategory::GeneralLiability,
            Some(format!("certs/{}_gl.pdf", upload_id)),
        );
        certificates.insert(CoverageCategory::Property, None);

        let comparison = with_comparison.then(|| {
            BTreeMap::from([(
                CoverageCategory::GeneralLiability,
                BTreeMap::from([
                    ("Each Occurrence".to_string(), ComparisonFlag::Match),
                    ("Aggregate".to_string(), ComparisonFlag::Unverified),
                ]),
            )])
        });

        ExtractionResult {
            upload_id: upload_id.to_string(),
            fields,
            certificates,
            comparison,
        }
    }

    fn record_upload(&self, username: &str) -> UploadReceipt {
        let n = self.upload_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.uploads_seen.lock().expect("mock state poisoned").push(username.to_string());
        UploadReceipt {
            upload_id: format!("upload_{}", n),
            total_carriers: 0,
            total_files: 0,
        }
    }
}

impl Default for MockBackendGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl BackendGateway for MockBackendGateway {
    async fn register(&self, username: &str, password: &str) -> Result<String, IntakeError> {
        info!(username, "[MOCK] register");
        tokio::time::sleep(self.delay).await;
        let mut users = self.users.lock().expect("mock state poisoned");
        if users.contains_key(username) {
            return Err(IntakeError::Conflict("Username already registered".to_string()));
        }
        users.insert(username.to_string(), password.to_string());
        Ok(username.to_string())
    }

    async fn login(&self, username: &str, password: &str) -> Result<String, IntakeError> {
        info!(username, "[MOCK] login");
        tokio::time::sleep(self.delay).await;
        match self.users.lock().expect("mock state poisoned").get(username) {
            Some(stored) if stored == password => Ok(username.to_string()),
            Some(_) => Err(IntakeError::NotFound("Wrong password".to_string())),
            None => Err(IntakeError::NotFound("Username not found".to_string())),
        }
    }

    async fn upload(
        &self,
        username: &str,
        submission: &PreparedSubmission,
    ) -> Result<UploadReceipt, IntakeError> {
        info!(
            username,
            carriers = submission.carriers.len(),
            files = submission.files.len(),
            "[MOCK] upload"
        );
        tokio::time::sleep(self.delay).await;
        let mut receipt = self.record_upload(username);
        receipt.total_carriers = submission.carriers.len() as u32;
        receipt.total_files = submission.files.len() as u32;
        Ok(receipt)
    }

    async fn upload_qc(
        &self,
        username: &str,
        submission: &QcSubmission,
    ) -> Result<UploadReceipt, IntakeError> {
        info!(username, carrier = %submission.carrier_name, "[MOCK] QC upload");
        tokio::time::sleep(self.delay).await;
        let mut receipt = self.record_upload(username);
        receipt.total_carriers = 1;
        receipt.total_files = 3;
        Ok(receipt)
    }

    async fn fetch_status(&self, upload_id: &str) -> Result<PollOutcome, IntakeError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        match self.next_status() {
            ScriptedStatus::NotReady => Ok(PollOutcome::Pending),
            ScriptedStatus::PrimaryOnly => {
                Ok(PollOutcome::Partial(Self::sample_result(upload_id, false)))
            }
            ScriptedStatus::Full => Ok(PollOutcome::Complete(Self::sample_result(upload_id, true))),
            ScriptedStatus::NetworkError => {
                Err(IntakeError::Transient("connection refused".to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CarrierSummary;

    fn empty_submission() -> PreparedSubmission {
        PreparedSubmission {
            carriers: vec![CarrierSummary {
                name: "State Farm".to_string(),
                has_property: false,
                has_liability: false,
            }],
            files: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_register_then_conflict() {
        let gateway = MockBackendGateway::new().with_delay(Duration::from_millis(1));
        assert_eq!(gateway.register("mudassir", "pw1").await.unwrap(), "mudassir");
        let err = gateway.register("mudassir", "pw2").await.unwrap_err();
        assert!(matches!(err, IntakeError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let gateway = MockBackendGateway::new().with_delay(Duration::from_millis(1));
        let err = gateway.login("ghost", "pw").await.unwrap_err();
        assert!(matches!(err, IntakeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_upload_ids_are_sequential_and_headers_captured() {
        let gateway = MockBackendGateway::new().with_delay(Duration::from_millis(1));
        let first = gateway.upload("mudassir", &empty_submission()).await.unwrap();
        let second = gateway.upload("aamir", &empty_submission()).await.unwrap();
        assert_eq!(first.upload_id, "upload_1");
        assert_eq!(second.upload_id, "upload_2");
        assert_eq!(gateway.identity_headers(), vec!["mudassir", "aamir"]);
    }

    #[tokio::test]
    async fn test_script_plays_in_order_and_repeats_last() {
        let gateway = MockBackendGateway::with_script(vec![
            ScriptedStatus::NotReady,
            ScriptedStatus::Full,
        ])
        .with_delay(Duration::from_millis(1));
        assert!(matches!(
            gateway.fetch_status("upload_1").await.unwrap(),
            PollOutcome::Pending
        ));
        assert!(matches!(
            gateway.fetch_status("upload_1").await.unwrap(),
            PollOutcome::Complete(_)
        ));
        assert!(matches!(
            gateway.fetch_status("upload_1").await.unwrap(),
            PollOutcome::Complete(_)
        ));
        assert_eq!(gateway.status_call_count(), 3);
    }
}
