//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;

use crate::game::objective::DEFAULT_CAPTURE_TIME_MS;
use crate::game::{Difficulty, GameMode};
use crate::util::time::DEFAULT_FRAME_RATE;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Allowed client origins for CORS, comma-separated
    pub client_origin: String,

    /// Match loop ticks per second
    pub frame_rate: u32,
    /// Mode used when `start_match` omits one
    pub default_mode: GameMode,
    /// Bot tier used when `start_match` omits one
    pub default_difficulty: Difficulty,
    /// Hold time that wins a free-for-all
    pub capture_time_ms: f32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset keys fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = match lookup("PORT") {
            Some(port) => format!("0.0.0.0:{}", port),
            None => lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
        };

        let frame_rate = match lookup("FRAME_RATE") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|rate| *rate > 0)
                .ok_or(ConfigError::Invalid("FRAME_RATE", raw))?,
            None => DEFAULT_FRAME_RATE,
        };

        let default_mode = match lookup("DEFAULT_MODE") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid("DEFAULT_MODE", raw))?,
            None => GameMode::default(),
        };

        let default_difficulty = match lookup("DEFAULT_DIFFICULTY") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid("DEFAULT_DIFFICULTY", raw))?,
            None => Difficulty::default(),
        };

        let capture_time_ms = match lookup("CAPTURE_TIME_MS") {
            Some(raw) => raw
                .parse::<f32>()
                .ok()
                .filter(|ms| *ms > 0.0)
                .ok_or(ConfigError::Invalid("CAPTURE_TIME_MS", raw))?,
            None => DEFAULT_CAPTURE_TIME_MS,
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            client_origin: lookup("CLIENT_ORIGIN")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
            frame_rate,
            default_mode,
            default_difficulty,
            capture_time_ms,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),

    #[error("Invalid server address format")]
    InvalidAddress,
}
