// Configuration module entry point
// Layered loading: config file, environment variables, built-in defaults

mod state;
mod types;

use std::net::SocketAddr;

pub use state::AppState;
pub use types::{CacheConfig, Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig};

impl Config {
    /// Load configuration from the default "config.toml" location.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from specified file path (without extension).
    /// The file is optional; `TELA_`-prefixed environment variables
    /// override it, and built-in defaults fill the rest.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("TELA"))
            .set_default("server.host", types::DEFAULT_HOST)?
            .set_default("server.port", i64::from(types::DEFAULT_PORT))?
            .set_default("logging.level", types::DEFAULT_LOG_LEVEL)?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", types::DEFAULT_ACCESS_LOG_FORMAT)?
            .set_default(
                "performance.keep_alive_timeout",
                i64::try_from(types::DEFAULT_KEEP_ALIVE_TIMEOUT).unwrap_or(75),
            )?
            .set_default(
                "performance.read_timeout",
                i64::try_from(types::DEFAULT_READ_TIMEOUT).unwrap_or(30),
            )?
            .set_default(
                "performance.write_timeout",
                i64::try_from(types::DEFAULT_WRITE_TIMEOUT).unwrap_or(30),
            )?
            .set_default(
                "http.max_body_size",
                i64::try_from(types::DEFAULT_MAX_BODY_SIZE).unwrap_or(10_485_760),
            )?
            .set_default(
                "cache.route_cache_size",
                i64::try_from(types::DEFAULT_ROUTE_CACHE_SIZE).unwrap_or(10_000),
            )?
            .set_default(
                "cache.static_file_cache_size",
                i64::try_from(types::DEFAULT_STATIC_CACHE_SIZE).unwrap_or(100),
            )?
            .set_default(
                "cache.static_file_ttl",
                i64::try_from(types::DEFAULT_STATIC_CACHE_TTL).unwrap_or(3600),
            )?
            .build()?;

        settings.try_deserialize()
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
