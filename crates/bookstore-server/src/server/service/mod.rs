//! gRPC service implementation and server lifecycle.
//!
//! ## Structure
//!
//! - [`handler`] - gRPC service entry point ([`BookService`]).
//! - [`lifecycle`] - Process phases from startup to shutdown.
//! - [`serve`] - Transport setup: health, reflection, gRPC-Web, compression
//!   and graceful shutdown.

pub mod handler;
pub mod lifecycle;
pub mod serve;

pub use handler::BookService;
pub use lifecycle::{Lifecycle, Phase};
pub use serve::serve_with_incoming;
