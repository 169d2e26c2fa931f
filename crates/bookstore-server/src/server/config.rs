use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::time::Duration;

/// Runtime configuration for the `bookstore-server` binary.
///
/// Every value can be given as a CLI flag or an environment variable; a `.env`
/// file in the working directory is loaded first.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "bookstore-server",
    version,
    about = "A gRPC service for a MongoDB-backed book catalog"
)]
pub struct CliArgs {
    /// Address the gRPC listener binds to.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:9090"))]
    pub server_addr: String,

    /// MongoDB connection string.
    ///
    /// Environment variable: `MONGO_URI`
    #[arg(long, env = "MONGO_URI", default_value_t = String::from("mongodb://localhost:27017"))]
    pub mongo_uri: String,

    /// Database holding the catalog collection.
    ///
    /// Environment variable: `MONGO_DATABASE`
    #[arg(long, env = "MONGO_DATABASE", default_value_t = String::from("Bookstore"))]
    pub database: String,

    /// Collection holding one document per book.
    ///
    /// Environment variable: `MONGO_COLLECTION`
    #[arg(long, env = "MONGO_COLLECTION", default_value_t = String::from("books"))]
    pub collection: String,

    /// Seconds to wait for MongoDB to accept a connection and answer the
    /// startup ping.
    ///
    /// Environment variable: `MONGO_CONNECT_TIMEOUT_SECS`
    #[arg(long, env = "MONGO_CONNECT_TIMEOUT_SECS", default_value_t = 10)]
    pub connect_timeout_secs: u64,

    /// Store backend. `memory` keeps books in process and loses them on exit.
    ///
    /// Environment variable: `BOOK_STORE`
    #[arg(long, env = "BOOK_STORE", value_enum, default_value_t = StoreKind::Mongo)]
    pub store: StoreKind,

    /// Emit logs as JSON lines instead of the human-readable format.
    ///
    /// Environment variable: `LOG_JSON`
    #[arg(long, env = "LOG_JSON", default_value_t = false)]
    pub log_json: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    Mongo,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub server_addr: SocketAddr,
    pub store: StoreKind,
    pub mongo: MongoConfig,
    pub log_json: bool,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let server_addr: SocketAddr = args
            .server_addr
            .parse()
            .with_context(|| format!("SERVER_ADDR {:?} is not a socket address", args.server_addr))?;

        if args.store == StoreKind::Mongo
            && !(args.mongo_uri.starts_with("mongodb://")
                || args.mongo_uri.starts_with("mongodb+srv://"))
        {
            bail!(
                "MONGO_URI ({:?}) must start with mongodb:// or mongodb+srv://",
                args.mongo_uri
            );
        }

        if args.database.is_empty() {
            bail!("MONGO_DATABASE must not be empty");
        }

        if args.collection.is_empty() {
            bail!("MONGO_COLLECTION must not be empty");
        }

        if args.connect_timeout_secs == 0 {
            bail!("MONGO_CONNECT_TIMEOUT_SECS must be greater than 0");
        }

        Ok(Self {
            server_addr,
            store: args.store,
            mongo: MongoConfig {
                uri: args.mongo_uri,
                database: args.database,
                collection: args.collection,
                connect_timeout: Duration::from_secs(args.connect_timeout_secs),
            },
            log_json: args.log_json,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> anyhow::Result<ServerConfig> {
        let argv = std::iter::once("bookstore-server").chain(args.iter().copied());
        let args = CliArgs::try_parse_from(argv)?;
        ServerConfig::try_from(args)
    }

    /// Declared default of a flag, independent of the process environment.
    fn declared_default(id: &str) -> Option<String> {
        CliArgs::command()
            .get_arguments()
            .find(|arg| arg.get_id().as_str() == id)
            .and_then(|arg| arg.get_default_values().first())
            .map(|value| value.to_string_lossy().into_owned())
    }

    #[test]
    fn defaults_match_the_deployment() {
        let expected = [
            ("server_addr", "0.0.0.0:9090"),
            ("mongo_uri", "mongodb://localhost:27017"),
            ("database", "Bookstore"),
            ("collection", "books"),
            ("connect_timeout_secs", "10"),
            ("store", "mongo"),
            ("log_json", "false"),
        ];
        for (id, value) in expected {
            assert_eq!(declared_default(id).as_deref(), Some(value), "default of {id}");
        }
    }

    #[test]
    fn flags_build_the_full_config() -> anyhow::Result<()> {
        let config = parse(&[
            "--server-addr",
            "0.0.0.0:9090",
            "--store",
            "mongo",
            "--mongo-uri",
            "mongodb://localhost:27017",
            "--database",
            "Bookstore",
            "--collection",
            "books",
            "--connect-timeout-secs",
            "10",
        ])?;
        assert_eq!(config.server_addr, "0.0.0.0:9090".parse::<SocketAddr>()?);
        assert_eq!(config.store, StoreKind::Mongo);
        assert_eq!(
            config.mongo,
            MongoConfig {
                uri: "mongodb://localhost:27017".into(),
                database: "Bookstore".into(),
                collection: "books".into(),
                connect_timeout: Duration::from_secs(10),
            }
        );
        Ok(())
    }

    #[test]
    fn flags_override_defaults() -> anyhow::Result<()> {
        let config = parse(&[
            "--server-addr",
            "127.0.0.1:7000",
            "--store",
            "memory",
            "--collection",
            "library",
        ])?;
        assert_eq!(config.server_addr.port(), 7000);
        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.mongo.collection, "library");
        Ok(())
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(parse(&["--server-addr", "localhost"]).is_err());
        assert!(parse(&["--store", "mongo", "--mongo-uri", "postgres://db"]).is_err());
        assert!(parse(&["--database", ""]).is_err());
        assert!(parse(&["--connect-timeout-secs", "0"]).is_err());
    }

    #[test]
    fn memory_store_ignores_mongo_uri_scheme() {
        assert!(parse(&["--store", "memory", "--mongo-uri", "unused"]).is_ok());
    }
}
