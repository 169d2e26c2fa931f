use anyhow::Context;
use bookstore_core::{signal::shutdown_signal, telemetry::init_telemetry};
use bookstore_server::server::{
    config::{CliArgs, ServerConfig, StoreKind},
    service::{BookService, Lifecycle, serve_with_incoming},
    store::{BookStore, MemoryStore, MongoStore},
};
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    init_telemetry(config.log_json)?;
    let lifecycle = Lifecycle::new();

    let store = open_store(&config).await?;
    let migrated = store
        .migrate_legacy_fields()
        .await
        .context("failed to migrate legacy `category` fields")?;
    if migrated > 0 {
        tracing::info!(migrated, "Renamed legacy `category` fields to `title`");
    }

    let tcp = TcpListener::bind(config.server_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server_addr))?;
    log_startup_info(&config);

    let service = BookService::new(store, lifecycle);
    serve_with_incoming(TcpListenerStream::new(tcp), service, shutdown_signal()).await
}

async fn open_store(config: &ServerConfig) -> anyhow::Result<Arc<dyn BookStore>> {
    match config.store {
        StoreKind::Mongo => {
            tracing::info!("Connecting to MongoDB...");
            let store = MongoStore::connect(&config.mongo)
                .await
                .context("could not connect to MongoDB")?;
            Ok(Arc::new(store))
        }
        StoreKind::Memory => {
            tracing::warn!("Using the in-memory store; books are lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

fn log_startup_info(config: &ServerConfig) {
    if cfg!(debug_assertions) {
        tracing::info!(
            "Starting bookstore service on {} with full config: {:#?}",
            config.server_addr,
            config
        );
    } else {
        tracing::info!(
            "Starting bookstore service on {} with {:?} store",
            config.server_addr,
            config.store
        );
    }
}
