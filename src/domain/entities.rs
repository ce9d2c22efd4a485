//! Domain entities. Pure data structures for the core business.
//!
//! No HTTP/IO types here; these are mapped from adapters. Wire names
//! (camelCase) follow the backend's JSON.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authenticated identity. Exists iff the session store holds a valid username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
}

impl Session {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

/// A quote document read from disk at attach time. Only PDFs are accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl AttachedDocument {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }
}

/// Per-carrier document slot. Attaching to an occupied slot replaces the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentSlot {
    Property,
    Liability,
}

impl std::fmt::Display for DocumentSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentSlot::Property => write!(f, "property"),
            DocumentSlot::Liability => write!(f, "liability"),
        }
    }
}

/// Batch descriptor element: one carrier and which slots it filled.
/// Ordered list order == carrier index in the file tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarrierSummary {
    pub name: String,
    pub has_property: bool,
    pub has_liability: bool,
}

/// Tag pairing a flat-list file with its originating carrier and slot, so the
/// backend can reassemble the association despite the flat multipart list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileTag {
    pub carrier_index: usize,
    pub slot: DocumentSlot,
}

/// One file of a prepared submission, in batch order.
#[derive(Debug, Clone)]
pub struct TaggedFile {
    pub tag: FileTag,
    pub document: AttachedDocument,
}

/// Validated output of a carrier batch, ready for the gateway.
#[derive(Debug, Clone)]
pub struct PreparedSubmission {
    pub carriers: Vec<CarrierSummary>,
    pub files: Vec<TaggedFile>,
}

/// Strict QC submission: all three documents are required.
#[derive(Debug, Clone)]
pub struct QcSubmission {
    pub carrier_name: String,
    pub quote: AttachedDocument,
    pub policy: AttachedDocument,
    pub certificate: AttachedDocument,
}

/// Backend acknowledgement of an accepted upload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub upload_id: String,
    pub total_carriers: u32,
    pub total_files: u32,
}

/// The client's record of one accepted submission. The opaque `upload_id`
/// is the sole handle retained for polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadJob {
    pub upload_id: String,
    pub username: String,
    pub carriers: Vec<CarrierSummary>,
    pub total_files: u32,
    pub created_at: DateTime<Utc>,
}

/// Coverage classification of extracted fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CoverageCategory {
    #[serde(rename = "PROPERTY")]
    Property,
    #[serde(rename = "GL")]
    GeneralLiability,
    #[serde(rename = "LIQUOR")]
    Liquor,
}

impl std::fmt::Display for CoverageCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoverageCategory::Property => write!(f, "PROPERTY"),
            CoverageCategory::GeneralLiability => write!(f, "GL"),
            CoverageCategory::Liquor => write!(f, "LIQUOR"),
        }
    }
}

/// Per-field verdict against an uploaded certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonFlag {
    Match,
    Mismatch,
    Unverified,
}

/// Structured output of the external OCR/LLM processing for one upload.
///
/// `comparison` is the slower-arriving secondary payload; `None` means the
/// certificate check had not finished when the result was fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub upload_id: String,
    pub fields: BTreeMap<CoverageCategory, BTreeMap<String, String>>,
    #[serde(default)]
    pub certificates: BTreeMap<CoverageCategory, Option<String>>,
    #[serde(default)]
    pub comparison: Option<BTreeMap<CoverageCategory, BTreeMap<String, ComparisonFlag>>>,
}

impl ExtractionResult {
    /// Secondary payload (certificate comparison) present?
    pub fn has_comparison(&self) -> bool {
        self.comparison.is_some()
    }
}

/// Destination routing info echoed by the backend. `used_fallback` means the
/// per-user tab was absent and the shared default was written instead; this
/// is a notice, never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingNotice {
    pub destination: String,
    pub used_fallback: bool,
}

/// One status-poll observation.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// Still processing (404, or envelope without the primary payload).
    Pending,
    /// Primary extraction payload present; comparison still outstanding.
    Partial(ExtractionResult),
    /// Both payloads present.
    Complete(ExtractionResult),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carrier_summary_wire_names() {
        let summary = CarrierSummary {
            name: "State Farm".to_string(),
            has_property: true,
            has_liability: false,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["name"], "State Farm");
        assert_eq!(json["hasProperty"], true);
        assert_eq!(json["hasLiability"], false);
    }

    #[test]
    fn test_file_tag_wire_names() {
        let tag = FileTag {
            carrier_index: 2,
            slot: DocumentSlot::Liability,
        };
        let json = serde_json::to_value(tag).unwrap();
        assert_eq!(json["carrierIndex"], 2);
        assert_eq!(json["slot"], "liability");
    }

    #[test]
    fn test_extraction_result_parses_without_secondary() {
        let body = r#"{
            "uploadId": "upload_1",
            "fields": {"PROPERTY": {"Building Limit": "$1,000,000"}},
            "certificates": {"PROPERTY": null}
        }"#;
        let result: ExtractionResult = serde_json::from_str(body).unwrap();
        assert_eq!(result.upload_id, "upload_1");
        assert!(!result.has_comparison());
        assert_eq!(
            result.fields[&CoverageCategory::Property]["Building Limit"],
            "$1,000,000"
        );
    }

    #[test]
    fn test_comparison_flag_wire_values() {
        let flags: BTreeMap<String, ComparisonFlag> =
            serde_json::from_str(r#"{"a": "match", "b": "mismatch", "c": "unverified"}"#).unwrap();
        assert_eq!(flags["a"], ComparisonFlag::Match);
        assert_eq!(flags["b"], ComparisonFlag::Mismatch);
        assert_eq!(flags["c"], ComparisonFlag::Unverified);
    }
}
