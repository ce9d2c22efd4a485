//! Infrastructure adapters. Implement outbound ports.
//!
//! Backend HTTP, filesystem persistence, terminal UI. Map errors to IntakeError.

pub mod http;
pub mod persistence;
pub mod ui;
