use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::mail::MailConfig;

const DEFAULT_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;
pub const MAX_TOKEN_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Converts a token lifetime in seconds, rejecting values outside `1..=MAX_TOKEN_TTL_SECS`.
pub fn token_ttl_from_secs(secs: i64) -> Result<Duration> {
    if !(1..=MAX_TOKEN_TTL_SECS).contains(&secs) {
        return Err(Error::Config(format!(
            "token_ttl_secs must be between 1 and {MAX_TOKEN_TTL_SECS}"
        )));
    }
    Duration::try_seconds(secs)
        .ok_or_else(|| Error::Config("token_ttl_secs out of range".to_string()))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Lifetime of issued user tokens.
    pub token_ttl_secs: i64,
    pub mail: Option<MailConfig>,
}

impl ServerConfig {
    /// Reads a TOML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).map_err(|e| Error::Config(e.to_string()))?;
        token_ttl_from_secs(config.token_ttl_secs)?;
        Ok(config)
    }

    pub fn socket_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("shipway.db")
    }

    pub fn token_ttl(&self) -> Result<Duration> {
        token_ttl_from_secs(self.token_ttl_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            mail: None,
        }
    }
}
