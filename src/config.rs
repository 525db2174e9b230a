use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub db_max_connections: u32,
    pub db_busy_timeout_ms: u64,
    pub max_draw_count: u32,
    /// Rarity labels that count as top rarity for pity accounting.
    pub top_rarities: Vec<String>,
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
        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let db_max_connections = env_map
            .get("DB_MAX_CONNECTIONS")
            .map(|s| s.as_str())
            .unwrap_or("5")
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "DB_MAX_CONNECTIONS".to_string(),
                    "must be a positive u32".to_string(),
                )
            })?;

        let db_busy_timeout_ms = env_map
            .get("DB_BUSY_TIMEOUT_MS")
            .map(|s| s.as_str())
            .unwrap_or("5000")
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "DB_BUSY_TIMEOUT_MS".to_string(),
                    "must be a valid u64".to_string(),
                )
            })?;

        let max_draw_count = env_map
            .get("MAX_DRAW_COUNT")
            .map(|s| s.as_str())
            .unwrap_or("10")
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "MAX_DRAW_COUNT".to_string(),
                    "must be a positive u32".to_string(),
                )
            })?;

        let top_rarities = parse_top_rarities(&env_map)?;

        Ok(Config {
            database_path,
            db_max_connections,
            db_busy_timeout_ms,
            max_draw_count,
            top_rarities,
        })
    }
}

fn parse_top_rarities(env_map: &HashMap<String, String>) -> Result<Vec<String>, ConfigError> {
    let raw = env_map
        .get("TOP_RARITY")
        .ok_or_else(|| ConfigError::MissingEnv("TOP_RARITY".to_string()))?;

    let rarities: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if rarities.is_empty() {
        return Err(ConfigError::InvalidValue(
            "TOP_RARITY".to_string(),
            "must name at least one rarity".to_string(),
        ));
    }
    Ok(rarities)
}
