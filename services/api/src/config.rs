use ego_core::agent::WORLD_AGENT_MODEL;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Defines the supported backends for the live world agent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Provider {
    /// Google Gemini Live API.
    Gemini,
    /// In-process stand-in that accepts input and never answers.
    Silent,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub provider: Provider,
    pub google_api_key: Option<String>,
    pub live_model: String,
    pub log_level: Level,
    pub prompts_path: PathBuf,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let provider_str = std::env::var("AGENT_PROVIDER").unwrap_or_else(|_| "gemini".to_string());
        let provider = match provider_str.to_lowercase().as_str() {
            "gemini" => Provider::Gemini,
            "silent" => Provider::Silent,
            other => {
                return Err(ConfigError::InvalidValue(
                    "AGENT_PROVIDER".to_string(),
                    format!("'{}' is not one of 'gemini', 'silent'", other),
                ));
            }
        };

        let google_api_key = std::env::var("GOOGLE_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        let live_model =
            std::env::var("LIVE_MODEL").unwrap_or_else(|_| WORLD_AGENT_MODEL.to_string());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let prompts_path = std::env::var("PROMPTS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./prompts"));

        if provider == Provider::Gemini && google_api_key.is_none() {
            return Err(ConfigError::MissingVar(
                "GOOGLE_API_KEY must be set for 'gemini' provider".to_string(),
            ));
        }

        Ok(Self {
            bind_address,
            provider,
            google_api_key,
            live_model,
            log_level,
            prompts_path,
        })
    }
}
