//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::str::FromStr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// How new counselling requests get their mentor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MentorPolicy {
    /// Always the mentor named by `DEFAULT_MENTOR_NAME`.
    Designated,
    /// Cycle through every known mentor.
    RoundRobin,
}

impl FromStr for MentorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "designated" => Ok(MentorPolicy::Designated),
            "round_robin" | "round-robin" => Ok(MentorPolicy::RoundRobin),
            other => Err(format!(
                "'{}' is not a mentor policy (expected designated or round_robin)",
                other
            )),
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub cors_origin: String,
    pub mentor_policy: MentorPolicy,
    pub default_mentor_name: String,
    pub openai_api_key: Option<String>,
    pub insights_model: String,
    pub upload_limit_bytes: usize,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin = std::env::var("CORS_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:5173".to_string());

        let upload_limit_bytes = match std::env::var("UPLOAD_LIMIT_BYTES") {
            Ok(raw) => raw.parse::<usize>().map_err(|e| {
                ConfigError::InvalidValue("UPLOAD_LIMIT_BYTES".to_string(), e.to_string())
            })?,
            Err(_) => 10 * 1024 * 1024,
        };

        // --- Load Workflow Settings ---
        let mentor_policy = std::env::var("MENTOR_POLICY")
            .unwrap_or_else(|_| "designated".to_string())
            .parse::<MentorPolicy>()
            .map_err(|e| ConfigError::InvalidValue("MENTOR_POLICY".to_string(), e))?;
        let default_mentor_name =
            std::env::var("DEFAULT_MENTOR_NAME").unwrap_or_else(|_| "Rohan Verma".to_string());

        // --- Load API Keys (as optional) ---
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        let insights_model =
            std::env::var("INSIGHTS_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            cors_origin,
            mentor_policy,
            default_mentor_name,
            openai_api_key,
            insights_model,
            upload_limit_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mentor_policy_parses_known_names() {
        assert_eq!("designated".parse::<MentorPolicy>(), Ok(MentorPolicy::Designated));
        assert_eq!("Round_Robin".parse::<MentorPolicy>(), Ok(MentorPolicy::RoundRobin));
        assert_eq!("round-robin".parse::<MentorPolicy>(), Ok(MentorPolicy::RoundRobin));
        assert!("random".parse::<MentorPolicy>().is_err());
    }
}
