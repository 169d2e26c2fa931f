//! Bookstore gRPC server.
//!
//! - [`config`] - CLI / environment configuration.
//! - [`store`] - Document store adapters behind the [`store::BookStore`] trait.
//! - [`service`] - The `Bookstore` gRPC service, its lifecycle and the
//!   transport setup that serves it.

pub mod config;
pub mod service;
pub mod store;
