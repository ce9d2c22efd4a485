//! Persistence adapters. Session file and upload-history log.

pub mod history_json;
pub mod session_json;

pub use history_json::HistoryJson;
pub use session_json::SessionJson;
