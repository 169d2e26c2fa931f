//! Error types for the bookstore service.
//!
//! [`Error`] captures every failure a request can run into. It implements
//! `From<Error>` for `tonic::Status` so handlers can return it with `?` and
//! clients receive a status code that matches the failure.
//!
//! ## Error Cases
//! - `NotFound`: No book matches the requested `bookId`.
//! - `Store`: The document store failed (transport, encoding, cursor).
//! - `ServiceShutdown`: A request arrived while the service was draining.

use tonic::Status;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the bookstore service.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// No document carries the requested `bookId`.
    #[error("Book not found: {id}")]
    NotFound { id: String },

    /// The underlying document store returned an error.
    #[error("Store error: {context}")]
    Store { context: String },

    /// The service is in the process of shutting down.
    #[error("Service is shutting down")]
    ServiceShutdown,
}

impl Error {
    pub fn store(context: impl Into<String>) -> Self {
        Self::Store {
            context: context.into(),
        }
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound { id } => {
                Status::not_found(format!("Could not find book with bookId {id:?}"))
            }
            Error::Store { context } => Status::internal(format!("Internal error: {context}")),
            Error::ServiceShutdown => Status::unavailable("Service is shutting down"),
        }
    }
}
