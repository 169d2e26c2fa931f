use anyhow::Context;
use bookstore_core::{
    proto::bookstore_client::BookstoreClient, signal::shutdown_signal, telemetry::init_telemetry,
};
use bookstore_gateway::{config::CliArgs, config::GatewayConfig, router};
use clap::Parser;
use tokio::net::TcpListener;
use tonic::{codec::CompressionEncoding, transport::Endpoint};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = GatewayConfig::try_from(args)?;

    init_telemetry(config.log_json)?;

    let channel = Endpoint::from_shared(config.backend_url.clone())?
        .connect_timeout(config.connect_timeout)
        .connect()
        .await
        .with_context(|| format!("could not connect to {}", config.backend_url))?;
    tracing::info!(backend = %config.backend_url, "Connected to bookstore service");

    let client = BookstoreClient::new(channel)
        .send_compressed(CompressionEncoding::Zstd)
        .accept_compressed(CompressionEncoding::Zstd);

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!("Gateway listening on {}", config.listen_addr);

    axum::serve(listener, router(client))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Gateway shut down");
    Ok(())
}
