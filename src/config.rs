use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub events_path: PathBuf,
    pub rpc_url: String,
    pub contract_context_file: Option<PathBuf>,
    pub integrity_policy: IntegrityPolicy,
    pub batch_size: usize,
    pub poll_interval_ms: u64,
}

/// What the indexer does when an event hits a missing entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityPolicy {
    /// Stop indexing at the offending event.
    Halt,
    /// Log the event, roll its writes back and move on.
    Skip,
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

        let database_path = required(&env_map, "DATABASE_PATH")?;
        let events_path = PathBuf::from(required(&env_map, "EVENTS_PATH")?);
        let rpc_url = required(&env_map, "RPC_URL")?;

        let contract_context_file = env_map
            .get("CONTRACT_CONTEXT_FILE")
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let integrity_policy = match env_map
            .get("INTEGRITY_POLICY")
            .map(|s| s.as_str())
            .unwrap_or("halt")
        {
            "halt" => IntegrityPolicy::Halt,
            "skip" => IntegrityPolicy::Skip,
            other => {
                return Err(ConfigError::InvalidValue(
                    "INTEGRITY_POLICY".to_string(),
                    format!("must be halt or skip, got {}", other),
                ))
            }
        };

        let batch_size = env_map
            .get("BATCH_SIZE")
            .map(|s| s.as_str())
            .unwrap_or("500")
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "BATCH_SIZE".to_string(),
                    "must be a positive integer".to_string(),
                )
            })?;

        let poll_interval_ms = env_map
            .get("POLL_INTERVAL_MS")
            .map(|s| s.as_str())
            .unwrap_or("5000")
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "POLL_INTERVAL_MS".to_string(),
                    "must be a valid u64".to_string(),
                )
            })?;

        Ok(Config {
            port,
            database_path,
            events_path,
            rpc_url,
            contract_context_file,
            integrity_policy,
            batch_size,
            poll_interval_ms,
        })
    }
}

fn required(env_map: &HashMap<String, String>, key: &str) -> Result<String, ConfigError> {
    env_map
        .get(key)
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnv(key.to_string()))
}
