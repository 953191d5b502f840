//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::r#match::Tuning;
use crate::game::MatchRegistry;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub match_registry: Arc<MatchRegistry>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            match_registry: Arc::new(MatchRegistry::new()),
        }
    }

    /// Tuning applied to every match this server starts
    pub fn tuning(&self) -> Tuning {
        Tuning {
            capture_time_ms: self.config.capture_time_ms,
            ..Tuning::default()
        }
    }
}
