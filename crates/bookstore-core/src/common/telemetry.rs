//! # Logging
//!
//! Both binaries log through `tracing`. [`init_telemetry`] installs a global
//! subscriber with:
//!
//! - an `EnvFilter` read from `RUST_LOG`, defaulting to `info`;
//! - a `fmt` layer with RFC 3339 local timestamps, thread ids, file and line,
//!   printed either human-readable (`pretty`) or as one JSON object per line.
//!
//! Events inside a span (every gRPC handler and every gateway request opens
//! one) carry the span fields, so a log line can be traced back to the
//! `bookId` it concerns.

use tracing_subscriber::{
    EnvFilter, fmt, fmt::time::ChronoLocal, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Installs the global `tracing` subscriber.
///
/// Fails if a global subscriber was already set.
pub fn init_telemetry(json: bool) -> anyhow::Result<()> {
    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()));

    if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_timer(ChronoLocal::rfc_3339()),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .with_target(false)
                    .with_timer(ChronoLocal::rfc_3339())
                    .with_file(true)
                    .pretty(),
            )
            .try_init()?;
    }

    Ok(())
}
