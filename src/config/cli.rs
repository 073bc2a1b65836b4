use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the crudgate binary.
#[derive(Debug, Parser)]
#[command(
    name = "crudgate",
    version,
    about = "Filtered, cached read gateway over Postgres tables"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "CRUDGATE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP read gateway.
    Serve(Box<ServeArgs>),
    /// Compile a query string for a table and print the resulting SQL, binds and cache key.
    Explain(ExplainArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Clone)]
pub struct ExplainArgs {
    /// Table to compile against.
    #[arg(long, value_name = "TABLE")]
    pub table: String,

    /// Raw query string, e.g. `name__ilike=pump&limit=5`.
    #[arg(long, value_name = "QUERY", default_value = "")]
    pub query: String,

    #[command(flatten)]
    pub overrides: QueryOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct QueryOverrides {
    /// Override the limit applied when a request does not send one.
    #[arg(long = "query-default-limit", value_name = "COUNT")]
    pub default_limit: Option<u64>,

    /// Override the largest limit a request may ask for.
    #[arg(long = "query-max-limit", value_name = "COUNT")]
    pub max_limit: Option<u64>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub query: QueryOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Toggle the response cache.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_enabled: Option<bool>,

    /// Override the number of cached responses.
    #[arg(long = "cache-capacity", value_name = "COUNT")]
    pub cache_capacity: Option<usize>,

    /// Override the cached response lifetime; 0 keeps entries until evicted.
    #[arg(long = "cache-ttl-seconds", value_name = "SECONDS")]
    pub cache_ttl_seconds: Option<u64>,
}
