use crate::store::LockMode;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub commerce_api_url: String,
    pub commerce_api_token: Option<String>,
    /// Bounded lock wait in milliseconds; 0 means wait indefinitely.
    pub lock_wait_ms: u64,
    /// Delay between reconciliation sweeps.
    pub sweep_interval_ms: u64,
    /// Products the sweep audits; empty means every product in the ledger.
    pub sweep_products: Vec<String>,
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

        let commerce_api_url = env_map
            .get("COMMERCE_API_URL")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("COMMERCE_API_URL".to_string()))?;

        let commerce_api_token = env_map.get("COMMERCE_API_TOKEN").cloned();

        let lock_wait_ms = parse_ms(&env_map, "LOCK_WAIT_MS", 5_000)?;
        let sweep_interval_ms = parse_ms(&env_map, "SWEEP_INTERVAL_MS", 300_000)?;
        let sweep_products = parse_sweep_products(&env_map)?;

        Ok(Config {
            database_path,
            commerce_api_url,
            commerce_api_token,
            lock_wait_ms,
            sweep_interval_ms,
            sweep_products,
        })
    }

    /// Lock mode implied by `lock_wait_ms`.
    pub fn lock_mode(&self) -> LockMode {
        if self.lock_wait_ms == 0 {
            LockMode::Wait
        } else {
            LockMode::Timeout(Duration::from_millis(self.lock_wait_ms))
        }
    }
}

fn parse_ms(
    env_map: &HashMap<String, String>,
    key: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    match env_map.get(key) {
        None => Ok(default),
        Some(raw) => raw.parse::<u64>().map_err(|_| {
            ConfigError::InvalidValue(key.to_string(), "must be a non-negative integer".to_string())
        }),
    }
}

fn parse_sweep_products(env_map: &HashMap<String, String>) -> Result<Vec<String>, ConfigError> {
    if let Some(products_str) = env_map.get("SWEEP_PRODUCTS") {
        Ok(products_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    } else if let Some(file_path) = env_map.get("SWEEP_PRODUCTS_FILE") {
        let content = std::fs::read_to_string(file_path).map_err(|_| {
            ConfigError::InvalidValue(
                "SWEEP_PRODUCTS_FILE".to_string(),
                "file not found or unreadable".to_string(),
            )
        })?;
        Ok(content
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    } else {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("DATABASE_PATH".to_string(), "/tmp/ledger.db".to_string());
        map.insert(
            "COMMERCE_API_URL".to_string(),
            "https://shop.example.com/admin/api".to_string(),
        );
        map
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env_map(setup_required_env()).unwrap();
        assert_eq!(config.lock_wait_ms, 5_000);
        assert_eq!(config.sweep_interval_ms, 300_000);
        assert!(config.sweep_products.is_empty());
        assert!(config.commerce_api_token.is_none());
        assert!(matches!(config.lock_mode(), LockMode::Timeout(_)));
    }

    #[test]
    fn test_missing_database_path() {
        let mut env_map = setup_required_env();
        env_map.remove("DATABASE_PATH");
        match Config::from_env_map(env_map) {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "DATABASE_PATH"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_missing_commerce_api_url() {
        let mut env_map = setup_required_env();
        env_map.remove("COMMERCE_API_URL");
        match Config::from_env_map(env_map) {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "COMMERCE_API_URL"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_invalid_lock_wait() {
        let mut env_map = setup_required_env();
        env_map.insert("LOCK_WAIT_MS".to_string(), "soon".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "LOCK_WAIT_MS"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_zero_lock_wait_means_wait_forever() {
        let mut env_map = setup_required_env();
        env_map.insert("LOCK_WAIT_MS".to_string(), "0".to_string());
        let config = Config::from_env_map(env_map).unwrap();
        assert!(matches!(config.lock_mode(), LockMode::Wait));
    }

    #[test]
    fn test_sweep_products_parsed_from_csv() {
        let mut env_map = setup_required_env();
        env_map.insert("SWEEP_PRODUCTS".to_string(), "p-1, p-2,,p-3".to_string());
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(config.sweep_products, vec!["p-1", "p-2", "p-3"]);
    }
}
