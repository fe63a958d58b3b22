use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_POOL_SIZE: u32 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    /// Origin used when building absolute links (no trailing slash).
    pub public_base_url: String,
    pub db_pool_size: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let public_base_url = lookup("PUBLIC_BASE_URL")
            .unwrap_or_else(|| DEFAULT_PUBLIC_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            database_url,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            public_base_url,
            db_pool_size: pool_size(&lookup),
        })
    }
}

/// r2d2 refuses a pool of zero connections.
fn pool_size<F>(lookup: &F) -> u32
where
    F: Fn(&str) -> Option<String>,
{
    match parse_or_default(lookup, "DB_POOL_SIZE", DEFAULT_POOL_SIZE) {
        0 => {
            warn!("DB_POOL_SIZE must be at least 1; using default {DEFAULT_POOL_SIZE}");
            DEFAULT_POOL_SIZE
        }
        size => size,
    }
}

fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw.parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value {raw:?}: {e}; using default {default}");
            default
        }),
        None => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_database_url_required() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err.to_string(), "DATABASE_URL must be set");
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://db")])).unwrap();
        assert_eq!(config.database_url, "postgres://db");
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.public_base_url, DEFAULT_PUBLIC_BASE_URL);
        assert_eq!(config.db_pool_size, DEFAULT_POOL_SIZE);
    }

    #[test]
    fn test_public_base_url_trailing_slash_trimmed() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db"),
            ("PUBLIC_BASE_URL", "https://foodgram.example/"),
        ]))
        .unwrap();
        assert_eq!(config.public_base_url, "https://foodgram.example");
    }

    #[test]
    fn test_invalid_pool_size_falls_back() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db"),
            ("DB_POOL_SIZE", "lots"),
        ]))
        .unwrap();
        assert_eq!(config.db_pool_size, DEFAULT_POOL_SIZE);

        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db"),
            ("DB_POOL_SIZE", "3"),
        ]))
        .unwrap();
        assert_eq!(config.db_pool_size, 3);
    }

    #[test]
    fn test_zero_pool_size_falls_back() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db"),
            ("DB_POOL_SIZE", "0"),
        ]))
        .unwrap();
        assert_eq!(config.db_pool_size, DEFAULT_POOL_SIZE);
    }
}
