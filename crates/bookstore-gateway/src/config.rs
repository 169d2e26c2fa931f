use anyhow::{Context, bail};
use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

/// Runtime configuration for the `bookstore-gateway` binary.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "bookstore-gateway",
    version,
    about = "HTTP/JSON gateway in front of the bookstore gRPC service"
)]
pub struct CliArgs {
    /// Address the HTTP listener binds to.
    ///
    /// Environment variable: `GATEWAY_ADDR`
    #[arg(long, env = "GATEWAY_ADDR", default_value_t = String::from("0.0.0.0:9091"))]
    pub listen_addr: String,

    /// URL of the bookstore gRPC service.
    ///
    /// Environment variable: `BOOKSTORE_URL`
    #[arg(long, env = "BOOKSTORE_URL", default_value_t = String::from("http://localhost:9090"))]
    pub backend_url: String,

    /// Seconds to wait for the gRPC channel to connect at startup.
    ///
    /// Environment variable: `BOOKSTORE_CONNECT_TIMEOUT_SECS`
    #[arg(long, env = "BOOKSTORE_CONNECT_TIMEOUT_SECS", default_value_t = 5)]
    pub connect_timeout_secs: u64,

    /// Emit logs as JSON lines instead of the human-readable format.
    ///
    /// Environment variable: `LOG_JSON`
    #[arg(long, env = "LOG_JSON", default_value_t = false)]
    pub log_json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub listen_addr: SocketAddr,
    pub backend_url: String,
    pub connect_timeout: Duration,
    pub log_json: bool,
}

impl TryFrom<CliArgs> for GatewayConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let listen_addr: SocketAddr = args.listen_addr.parse().with_context(|| {
            format!("GATEWAY_ADDR {:?} is not a socket address", args.listen_addr)
        })?;

        if !(args.backend_url.starts_with("http://") || args.backend_url.starts_with("https://"))
        {
            bail!(
                "BOOKSTORE_URL ({:?}) must be an http:// or https:// URL",
                args.backend_url
            );
        }

        if args.connect_timeout_secs == 0 {
            bail!("BOOKSTORE_CONNECT_TIMEOUT_SECS must be greater than 0");
        }

        Ok(Self {
            listen_addr,
            backend_url: args.backend_url,
            connect_timeout: Duration::from_secs(args.connect_timeout_secs),
            log_json: args.log_json,
        })
    }
}
