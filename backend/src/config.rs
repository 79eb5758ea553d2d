// Environment-driven server configuration.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use viridis_core::palette::{Palette, PaletteError};

use crate::constants::{COOLDOWN_SECS, DEFAULT_HTTP_PORT, IDLE_AFTER_SECS};
use crate::engine::EngineConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid HTTP_BIND or HTTP_PORT: {0}")]
    Address(String),
    #[error("failed to read palette file {path}: {source}")]
    PaletteRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid palette file {path}: {source}")]
    Palette {
        path: PathBuf,
        #[source]
        source: PaletteError,
    },
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub palette_path: Option<PathBuf>,
    pub cooldown_secs: u64,
    pub idle_after_secs: u64,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind = env::var("HTTP_BIND").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("HTTP_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_HTTP_PORT);
        let addr = format!("{}:{}", bind, port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::Address(format!("{}:{}", bind, port)))?;

        let palette_path = env::var("VIRIDIS_PALETTE")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);
        let cooldown_secs = env_u64("VIRIDIS_COOLDOWN_SECS").unwrap_or(COOLDOWN_SECS);
        let idle_after_secs = env_u64("VIRIDIS_IDLE_SECS").unwrap_or(IDLE_AFTER_SECS);

        Ok(Self {
            addr,
            palette_path,
            cooldown_secs,
            idle_after_secs,
        })
    }

    pub fn load_palette(&self) -> Result<Palette, ConfigError> {
        let Some(path) = &self.palette_path else {
            return Ok(Palette::builtin());
        };
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::PaletteRead {
            path: path.clone(),
            source,
        })?;
        Palette::from_json(&json).map_err(|source| ConfigError::Palette {
            path: path.clone(),
            source,
        })
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            cooldown_ms: self.cooldown_secs.saturating_mul(1_000),
            idle_after_ms: self.idle_after_secs.saturating_mul(1_000),
            ..EngineConfig::default()
        }
    }
}

fn env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|value| value.trim().parse::<u64>().ok())
}
