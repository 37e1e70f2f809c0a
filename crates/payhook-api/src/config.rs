//! Configuration management for the Payhook webhook service.

use std::{net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use axum::http::HeaderName;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::crypto::SigningSecret;

const CONFIG_FILE: &str = "config.toml";
const SECRET_ENV: &str = "WEBHOOK_SECRET";

/// Which event store backs the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// PostgreSQL via sqlx.
    #[default]
    Postgres,
    /// Process-local store; contents are lost on restart.
    Memory,
}

/// Service configuration.
///
/// Environment variables override `config.toml`, which overrides the
/// built-in defaults. Each field reads the upper-cased variable of the same
/// name (`WEBHOOK_SECRET`, `SIGNATURE_HEADER`, `MAX_BODY_BYTES`,
/// `STORAGE_BACKEND`, `DATABASE_URL`, `PORT` and so on).
///
/// Only the webhook secret lacks a default, and startup fails without it.
/// The secret is taken from the environment as a raw string, so values such
/// as `007` keep their leading zeros.
///
/// # Example
///
/// ```no_run
/// use payhook_api::Config;
///
/// let config = Config::load().expect("Failed to load configuration");
///
/// println!("Server will bind to {}:{}", config.host, config.port);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Database
    /// PostgreSQL connection URL.
    #[serde(default = "default_database_url", alias = "DATABASE_URL")]
    pub database_url: String,
    /// Maximum number of database connections in the pool.
    #[serde(default = "default_max_connections", alias = "DATABASE_MAX_CONNECTIONS")]
    pub database_max_connections: u32,
    /// Minimum number of connections to maintain in the pool.
    #[serde(default = "default_min_connections", alias = "DATABASE_MIN_CONNECTIONS")]
    pub database_min_connections: u32,
    /// Database connection acquire timeout in seconds.
    #[serde(default = "default_acquire_timeout", alias = "DATABASE_CONNECTION_TIMEOUT")]
    pub database_connection_timeout: u64,
    /// Database connection idle timeout in seconds.
    #[serde(default = "default_idle_timeout", alias = "DATABASE_IDLE_TIMEOUT")]
    pub database_idle_timeout: u64,
    /// Maximum lifetime of database connections in seconds.
    #[serde(default = "default_max_lifetime", alias = "DATABASE_MAX_LIFETIME")]
    pub database_max_lifetime: u64,
    /// Event store backend.
    #[serde(default, alias = "STORAGE_BACKEND")]
    pub storage_backend: StorageBackend,

    // Server
    /// Server bind address.
    #[serde(default = "default_host", alias = "HOST")]
    pub host: String,
    /// Server bind port.
    #[serde(default = "default_port", alias = "PORT")]
    pub port: u16,
    /// HTTP request timeout in seconds.
    #[serde(default = "default_request_timeout", alias = "REQUEST_TIMEOUT")]
    pub request_timeout: u64,

    // Webhooks
    /// Shared HMAC secret used to verify webhook signatures.
    #[serde(default, alias = "WEBHOOK_SECRET")]
    pub webhook_secret: SigningSecret,
    /// Name of the header carrying the hex signature.
    #[serde(default = "default_signature_header", alias = "SIGNATURE_HEADER")]
    pub signature_header: String,
    /// Largest webhook body accepted, in bytes.
    #[serde(default = "default_max_body_bytes", alias = "MAX_BODY_BYTES")]
    pub max_body_bytes: usize,

    // Logging
    /// Log level configuration.
    #[serde(default = "default_log_level", alias = "RUST_LOG")]
    pub rust_log: String,
}

impl Config {
    /// Load configuration from defaults, config file, and environment variable
    /// overrides.
    ///
    /// # Errors
    ///
    /// Fails when a value cannot be parsed or when validation rejects the
    /// result (for example, no webhook secret).
    pub fn load() -> Result<Self> {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed("").ignore(&[SECRET_ENV]));

        // `Env` infers value types, which would turn `123456` into an integer.
        if let Ok(secret) = std::env::var(SECRET_ENV) {
            figment = figment.merge(Serialized::default("webhook_secret", secret));
        }

        let config: Self = figment.extract().context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Parse server socket address from host and port configuration.
    pub fn parse_server_addr(&self) -> Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.host, self.port);
        SocketAddr::from_str(&addr_str).context("Invalid server address")
    }

    /// Parsed signature header name.
    pub fn signature_header_name(&self) -> Result<HeaderName> {
        HeaderName::from_str(&self.signature_header)
            .with_context(|| format!("invalid signature header name '{}'", self.signature_header))
    }

    /// Request timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Get database URL with password masked for logging.
    pub fn database_url_masked(&self) -> String {
        if let Some(at_pos) = self.database_url.find('@') {
            if let Some(colon_pos) = self.database_url[..at_pos].rfind(':') {
                let mut masked = self.database_url.clone();
                masked.replace_range(colon_pos + 1..at_pos, "***");
                return masked;
            }
        }
        self.database_url.clone()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("port must be greater than 0");
        }

        if self.database_max_connections == 0 {
            anyhow::bail!("database max_connections must be greater than 0");
        }

        if self.database_min_connections > self.database_max_connections {
            anyhow::bail!("database min_connections cannot exceed max_connections");
        }

        if self.webhook_secret.is_empty() {
            anyhow::bail!("WEBHOOK_SECRET must be set");
        }

        self.signature_header_name()?;

        if self.max_body_bytes == 0 {
            anyhow::bail!("max_body_bytes must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            database_max_connections: default_max_connections(),
            database_min_connections: default_min_connections(),
            database_connection_timeout: default_acquire_timeout(),
            database_idle_timeout: default_idle_timeout(),
            database_max_lifetime: default_max_lifetime(),
            storage_backend: StorageBackend::default(),
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
            webhook_secret: SigningSecret::default(),
            signature_header: default_signature_header(),
            max_body_bytes: default_max_body_bytes(),
            rust_log: default_log_level(),
        }
    }
}

fn default_database_url() -> String {
    "postgresql://localhost/payhook".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    2
}

fn default_acquire_timeout() -> u64 {
    10
}

fn default_idle_timeout() -> u64 {
    600
}

fn default_max_lifetime() -> u64 {
    1800
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_signature_header() -> String {
    "X-Razorpay-Signature".to_string()
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}
