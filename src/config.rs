use crate::domain::Pubkey;
use crate::engine::BatchCountPolicy;
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rpc_url: String,
    pub program_id: Pubkey,
    pub batch_count_policy: BatchCountPolicy,
    pub rpc_max_elapsed_secs: u64,
    pub admin_index: u8,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let rpc_url = env_map
            .get("RPC_URL")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("RPC_URL".to_string()))?;

        let program_id = env_map
            .get("PROGRAM_ID")
            .ok_or_else(|| ConfigError::MissingEnv("PROGRAM_ID".to_string()))
            .and_then(|s| {
                Pubkey::from_str(s).map_err(|e| {
                    ConfigError::InvalidValue("PROGRAM_ID".to_string(), e.to_string())
                })
            })?;

        let batch_count_policy = match env_map
            .get("SLASH_BATCH_COUNT_MODE")
            .map(|s| s.as_str())
            .unwrap_or("ceil")
        {
            "ceil" => BatchCountPolicy::Ceil,
            "legacy" => BatchCountPolicy::Legacy,
            other => {
                return Err(ConfigError::InvalidValue(
                    "SLASH_BATCH_COUNT_MODE".to_string(),
                    format!("must be ceil or legacy, got {}", other),
                ))
            }
        };

        let rpc_max_elapsed_secs = env_map
            .get("RPC_MAX_ELAPSED_SECS")
            .map(|s| s.as_str())
            .unwrap_or("30")
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "RPC_MAX_ELAPSED_SECS".to_string(),
                    "must be a valid u64".to_string(),
                )
            })?;

        let admin_index = env_map
            .get("ADMIN_INDEX")
            .map(|s| s.as_str())
            .unwrap_or("0")
            .parse::<u8>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "ADMIN_INDEX".to_string(),
                    "must be a valid u8".to_string(),
                )
            })?;

        Ok(Config {
            port,
            rpc_url,
            program_id,
            batch_count_policy,
            rpc_max_elapsed_secs,
            admin_index,
        })
    }
}
