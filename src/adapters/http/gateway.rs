//! HTTP backend gateway. Implements `BackendGateway` over reqwest.
//!
//! Auth endpoints take form fields; uploads are multipart with the username
//! carried as an identity header so the backend can authenticate and route
//! before parsing file content. Status responses are validated fully before
//! a result is surfaced.

use crate::domain::{
    ExtractionResult, IntakeError, PollOutcome, PreparedSubmission, QcSubmission, RoutingNotice,
    UploadReceipt,
};
use crate::ports::BackendGateway;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Identity header carrying the authenticated username, out-of-band from the
/// multipart body.
pub const IDENTITY_HEADER: &str = "X-Intake-Username";

/// Backend HTTP gateway.
pub struct HttpBackendGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackendGateway {
    /// Create a gateway for the given base URL (no trailing slash).
    pub fn new(base_url: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client, base_url }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Post username/password as form fields and return the canonical
    /// username. Client errors are mapped through `on_client_error`.
    async fn auth_request(
        &self,
        path: &str,
        username: &str,
        password: &str,
        on_client_error: fn(String) -> IntakeError,
    ) -> Result<String, IntakeError> {
        let response = self
            .client
            .post(self.endpoint(path))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(|e| IntakeError::Transient(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| IntakeError::Transient(format!("read response body: {}", e)))?;

        if status.is_server_error() {
            warn!(%status, "auth endpoint unavailable");
            return Err(IntakeError::Transient(format!(
                "auth endpoint {}: {}",
                status,
                truncate(&body)
            )));
        }
        if !status.is_success() {
            warn!(%status, body = %truncate(&body), "auth endpoint returned error");
            return Err(on_client_error(extract_error_detail(&body)));
        }

        let ack: AuthAck = serde_json::from_str(&body).map_err(|e| {
            IntakeError::Transient(format!("unexpected auth response shape: {}", e))
        })?;
        Ok(ack.username)
    }

    /// Send a multipart form and parse the upload acknowledgement.
    async fn send_upload(
        &self,
        path: &str,
        username: &str,
        form: Form,
    ) -> Result<UploadReceipt, IntakeError> {
        let response = self
            .client
            .post(self.endpoint(path))
            .header(IDENTITY_HEADER, username)
            .multipart(form)
            .send()
            .await
            .map_err(|e| IntakeError::Upload(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| IntakeError::Upload(format!("read response body: {}", e)))?;

        if !status.is_success() {
            warn!(%status, body = %truncate(&body), "upload endpoint returned error");
            return Err(IntakeError::Upload(extract_error_detail(&body)));
        }

        let ack: UploadAck = serde_json::from_str(&body)
            .map_err(|e| IntakeError::Upload(format!("unparsable upload response: {}", e)))?;
        if !ack.success {
            return Err(IntakeError::Upload(
                ack.message.unwrap_or_else(|| "upload rejected".to_string()),
            ));
        }
        Ok(UploadReceipt {
            upload_id: ack.upload_id,
            total_carriers: ack.total_carriers,
            total_files: ack.total_files,
        })
    }
}

/// Auth success envelope. The backend echoes the canonical username.
#[derive(Deserialize)]
struct AuthAck {
    username: String,
}

/// Upload success envelope.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadAck {
    success: bool,
    upload_id: String,
    total_carriers: u32,
    total_files: u32,
    #[serde(default)]
    message: Option<String>,
}

/// Status envelope. `extraction` is the primary payload; `comparison`
/// arrives later from the certificate check.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusEnvelope {
    upload_id: String,
    #[serde(default)]
    extraction: Option<serde_json::Value>,
    #[serde(default)]
    certificates: Option<serde_json::Value>,
    #[serde(default)]
    comparison: Option<serde_json::Value>,
    #[serde(default)]
    routing: Option<RoutingNotice>,
}

#[async_trait::async_trait]
impl BackendGateway for HttpBackendGateway {
    async fn register(&self, username: &str, password: &str) -> Result<String, IntakeError> {
        info!(username, "registering account");
        self.auth_request("/register/", username, password, IntakeError::Conflict)
            .await
    }

    async fn login(&self, username: &str, password: &str) -> Result<String, IntakeError> {
        info!(username, "logging in");
        self.auth_request("/login/", username, password, IntakeError::NotFound)
            .await
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
            "submitting carrier batch"
        );

        let descriptor = serde_json::to_string(&submission.carriers)
            .map_err(|e| IntakeError::Upload(format!("encode batch descriptor: {}", e)))?;
        let mut form = Form::new().text("carriers", descriptor);

        // Flat file list in batch order; each file is preceded by its tag so
        // the backend can reassemble carrier/slot pairs.
        for file in &submission.files {
            let tag = serde_json::to_string(&file.tag)
                .map_err(|e| IntakeError::Upload(format!("encode file tag: {}", e)))?;
            form = form.text("tag", tag);
            let part = Part::bytes(file.document.bytes.clone())
                .file_name(file.document.filename.clone())
                .mime_str("application/pdf")
                .map_err(|e| IntakeError::Upload(format!("build file part: {}", e)))?;
            form = form.part("file", part);
        }

        let receipt = self.send_upload("/upload/", username, form).await?;
        info!(upload_id = %receipt.upload_id, total_files = receipt.total_files, "upload accepted");
        Ok(receipt)
    }

    async fn upload_qc(
        &self,
        username: &str,
        submission: &QcSubmission,
    ) -> Result<UploadReceipt, IntakeError> {
        info!(username, carrier = %submission.carrier_name, "submitting QC batch");

        let mut form = Form::new().text("carrierName", submission.carrier_name.clone());
        for (name, doc) in [
            ("quote", &submission.quote),
            ("policy", &submission.policy),
            ("certificate", &submission.certificate),
        ] {
            let part = Part::bytes(doc.bytes.clone())
                .file_name(doc.filename.clone())
                .mime_str("application/pdf")
                .map_err(|e| IntakeError::Upload(format!("build {} part: {}", name, e)))?;
            form = form.part(name, part);
        }

        self.send_upload("/upload/qc/", username, form).await
    }

    async fn fetch_status(&self, upload_id: &str) -> Result<PollOutcome, IntakeError> {
        let response = self
            .client
            .get(self.endpoint(&format!("/status/{}", upload_id)))
            .send()
            .await
            .map_err(|e| IntakeError::Transient(format!("HTTP request failed: {}", e)))?;

        // 404 means the job is still processing, not an error.
        if response.status() == StatusCode::NOT_FOUND {
            debug!(upload_id, "status: not ready yet");
            return Ok(PollOutcome::Pending);
        }

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| IntakeError::Transient(format!("read response body: {}", e)))?;

        if !status.is_success() {
            // Treat server-side hiccups as retryable; the poll deadline bounds them.
            warn!(%status, upload_id, "status endpoint returned error");
            return Err(IntakeError::Transient(format!(
                "status endpoint {}: {}",
                status,
                truncate(&body)
            )));
        }

        // A mid-write or malformed envelope must never yield a partial
        // result; surface it as retryable instead.
        let envelope: StatusEnvelope = serde_json::from_str(&body)
            .map_err(|e| IntakeError::Transient(format!("unparsable status body: {}", e)))?;

        if let Some(routing) = &envelope.routing {
            if routing.used_fallback {
                warn!(
                    upload_id,
                    destination = %routing.destination,
                    "per-user destination absent; backend wrote to shared default"
                );
            }
        }

        let Some(extraction) = envelope.extraction else {
            debug!(upload_id, "status: primary payload not present yet");
            return Ok(PollOutcome::Pending);
        };

        // Assemble the full result object, then validate its shape in one
        // deserialization pass.
        let assembled = serde_json::json!({
            "uploadId": envelope.upload_id,
            "fields": extraction,
            "certificates": envelope.certificates.unwrap_or_else(|| serde_json::json!({})),
            "comparison": envelope.comparison,
        });
        let result: ExtractionResult = serde_json::from_value(assembled)
            .map_err(|e| IntakeError::Transient(format!("malformed extraction payload: {}", e)))?;

        if result.has_comparison() {
            Ok(PollOutcome::Complete(result))
        } else {
            Ok(PollOutcome::Partial(result))
        }
    }
}

/// Pull the human-readable message out of an error body. The backend uses
/// one of `message` / `error` / `detail` depending on the endpoint.
fn extract_error_detail(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["detail", "error", "message"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }
    truncate(body)
}

fn truncate(text: &str) -> String {
    text.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_error_detail_prefers_detail() {
        let body = r#"{"detail": "Username already registered", "message": "nope"}"#;
        assert_eq!(extract_error_detail(body), "Username already registered");
    }

    #[test]
    fn test_extract_error_detail_falls_back_to_error_and_message() {
        assert_eq!(
            extract_error_detail(r#"{"error": "Username not found"}"#),
            "Username not found"
        );
        assert_eq!(
            extract_error_detail(r#"{"message": "Failed to upload carriers"}"#),
            "Failed to upload carriers"
        );
    }

    #[test]
    fn test_extract_error_detail_plain_text() {
        assert_eq!(extract_error_detail("Internal Server Error"), "Internal Server Error");
    }

    #[test]
    fn test_status_envelope_without_primary_is_pending_shape() {
        let body = r#"{"uploadId": "upload_7"}"#;
        let envelope: StatusEnvelope = serde_json::from_str(body).unwrap();
        assert!(envelope.extraction.is_none());
        assert_eq!(envelope.upload_id, "upload_7");
    }

    #[test]
    fn test_status_envelope_full() {
        let body = r#"{
            "uploadId": "upload_7",
            "extraction": {"GL": {"Each Occurrence": "$1,000,000"}},
            "certificates": {"GL": "gs://deployment/certs/upload_7_gl.pdf"},
            "comparison": {"GL": {"Each Occurrence": "match"}},
            "routing": {"destination": "mudassir", "usedFallback": false}
        }"#;
        let envelope: StatusEnvelope = serde_json::from_str(body).unwrap();
        assert!(envelope.extraction.is_some());
        assert!(envelope.comparison.is_some());
        assert!(!envelope.routing.unwrap().used_fallback);
    }
}
