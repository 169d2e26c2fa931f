//! Definitions shared by the gRPC server and the HTTP gateway.
//!
//! ## Submodules
//!
//! - [`proto`] - Generated protobuf messages, client and server stubs.
//! - [`types`] - The [`Book`](types::Book) model and its protobuf conversions.
//! - [`error`] - Service error type and its mapping to `tonic::Status`.
//! - [`telemetry`] - `tracing` subscriber setup used by both binaries.
//! - [`signal`] - Termination signal handling for graceful shutdown.

pub mod error;
pub mod signal;
pub mod telemetry;
pub mod types;

pub use error::{Error, Result};

pub mod proto {
    tonic::include_proto!("bookstore");
    pub const FILE_DESCRIPTOR_SET: &[u8] =
        tonic::include_file_descriptor_set!("bookstore_descriptor");
}
