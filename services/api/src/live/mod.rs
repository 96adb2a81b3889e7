//! Live agent providers.
//!
//! - `event`: SDK-shaped events handed to the relay.
//! - `gemini`: the Gemini Live backed world agent.

pub mod event;
pub mod gemini;

use crate::config::{Config, ConfigError, Provider};
use ego_core::agent::WorldAgent;
use ego_core::live::{LiveAgent, SilentAgent};
use std::sync::Arc;
use tracing::info;

pub const WORLD_AGENT_PROMPT: &str = "world_agent";

/// Chooses the live agent implementation for the configured provider.
pub fn build_agent(
    config: &Config,
    instruction: impl Into<String>,
) -> Result<Arc<dyn LiveAgent>, ConfigError> {
    match config.provider {
        Provider::Gemini => {
            let api_key = config.google_api_key.clone().ok_or_else(|| {
                ConfigError::MissingVar(
                    "GOOGLE_API_KEY must be set for 'gemini' provider".to_string(),
                )
            })?;
            info!(model = %config.live_model, "Using Gemini Live world agent");
            let agent = WorldAgent::new(config.live_model.clone(), instruction);
            Ok(Arc::new(gemini::GeminiLiveAgent::new(api_key, agent)))
        }
        Provider::Silent => {
            info!("Using silent world agent");
            Ok(Arc::new(SilentAgent))
        }
    }
}
