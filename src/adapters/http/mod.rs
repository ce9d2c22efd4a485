//! HTTP adapter module. Implements BackendGateway for the processing backend.
//!
//! Provides the reqwest-based gateway and a mock gateway for testing.

pub mod gateway;
pub mod mock_gateway;

pub use gateway::{HttpBackendGateway, IDENTITY_HEADER};
pub use mock_gateway::{MockBackendGateway, ScriptedStatus};
