//! Transport setup for the bookstore gRPC server.
//!
//! Alongside the `Bookstore` service, the server exposes:
//!
//! - the standard gRPC health service, reporting `SERVING` until shutdown
//!   begins and `NOT_SERVING` while draining;
//! - gRPC server reflection built from the compiled descriptor set;
//! - gRPC-Web (with permissive CORS) so browsers can call it directly;
//! - zstd, gzip and deflate compression on the `Bookstore` service.

use super::{BookService, Phase};
use bookstore_core::proto::{FILE_DESCRIPTOR_SET, bookstore_server::BookstoreServer};
use futures::Stream;
use std::future::Future;
use tokio::io::{AsyncRead, AsyncWrite};
use tonic::transport::server::Connected;
use tonic::{codec::CompressionEncoding, transport::Server};
use tonic_reflection::server::Builder;
use tonic_web::GrpcWebLayer;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

/// Serves `service` on `incoming` until `shutdown` resolves.
///
/// Moves the lifecycle to `Serving` once the services are assembled, to
/// `Draining` when `shutdown` resolves, and to `Stopped` after in-flight
/// connections have closed and the store has been released.
pub async fn serve_with_incoming<I, IO, IE, F>(
    incoming: I,
    service: BookService,
    shutdown: F,
) -> anyhow::Result<()>
where
    I: Stream<Item = Result<IO, IE>>,
    IO: AsyncRead + AsyncWrite + Connected + Unpin + Send + 'static,
    IE: Into<tower::BoxError>,
    F: Future<Output = ()>,
{
    let (health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<BookstoreServer<BookService>>()
        .await;

    let reflection = Builder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1()?;

    let lifecycle = service.lifecycle().clone();
    let drain = {
        let lifecycle = lifecycle.clone();
        async move {
            shutdown.await;
            lifecycle.advance(Phase::Draining);
            health_reporter
                .set_not_serving::<BookstoreServer<BookService>>()
                .await;
        }
    };

    lifecycle.advance(Phase::Serving);

    Server::builder()
        .accept_http1(true)
        .http2_adaptive_window(Some(true))
        .layer(
            ServiceBuilder::new()
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(GrpcWebLayer::new()),
        )
        .add_service(health_service)
        .add_service(reflection)
        .add_service(build_bookstore_service(service.clone()))
        .serve_with_incoming_shutdown(incoming, drain)
        .await?;

    if let Err(e) = service.shutdown().await {
        tracing::error!("Error closing store: {e}");
    }
    lifecycle.advance(Phase::Stopped);
    tracing::info!("Service shut down successfully");
    Ok(())
}

fn build_bookstore_service(service: BookService) -> BookstoreServer<BookService> {
    BookstoreServer::new(service)
        .send_compressed(CompressionEncoding::Zstd)
        .send_compressed(CompressionEncoding::Gzip)
        .send_compressed(CompressionEncoding::Deflate)
        .accept_compressed(CompressionEncoding::Zstd)
        .accept_compressed(CompressionEncoding::Gzip)
        .accept_compressed(CompressionEncoding::Deflate)
}
