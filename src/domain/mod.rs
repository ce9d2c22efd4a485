//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod batch;
pub mod entities;
pub mod errors;

pub use batch::{CarrierBatch, CarrierEntry};
pub use entities::{
    AttachedDocument, CarrierSummary, ComparisonFlag, CoverageCategory, DocumentSlot,
    ExtractionResult, FileTag, PollOutcome, PreparedSubmission, QcSubmission, RoutingNotice,
    Session, TaggedFile, UploadJob, UploadReceipt,
};
pub use errors::IntakeError;
