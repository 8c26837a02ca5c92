use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Deadline for each individual oracle call.
    pub oracle_timeout: Duration,
    /// Optional directory of prompt instruction overrides.
    pub prompts_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let timeout_secs = get("ORACLE_TIMEOUT_SECS")
            .unwrap_or_else(|| "60".to_string())
            .parse::<u64>()
            .context("ORACLE_TIMEOUT_SECS must be a positive integer")?;
        if timeout_secs == 0 {
            anyhow::bail!("ORACLE_TIMEOUT_SECS must be a positive integer");
        }

        Ok(Config {
            anthropic_api_key: get("ANTHROPIC_API_KEY")
                .filter(|k| !k.trim().is_empty())
                .context("Required environment variable 'ANTHROPIC_API_KEY' is not set")?,
            port: get("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            oracle_timeout: Duration::from_secs(timeout_secs),
            prompts_dir: get("PROMPTS_DIR")
                .filter(|d| !d.trim().is_empty())
                .map(PathBuf::from),
        })
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
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("ANTHROPIC_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.rust_log, "info");
        assert_eq!(config.oracle_timeout, Duration::from_secs(60));
        assert!(config.prompts_dir.is_none());
    }

    #[test]
    fn test_missing_api_key_fails() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("PORT", "3000"),
            ("ORACLE_TIMEOUT_SECS", "15"),
            ("PROMPTS_DIR", "/etc/prompts"),
        ]))
        .unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.oracle_timeout, Duration::from_secs(15));
        assert_eq!(config.prompts_dir, Some(PathBuf::from("/etc/prompts")));
    }

    #[test]
    fn test_invalid_numbers_fail() {
        assert!(Config::from_lookup(lookup(&[("ANTHROPIC_API_KEY", "k"), ("PORT", "http")])).is_err());
        assert!(Config::from_lookup(lookup(&[
            ("ANTHROPIC_API_KEY", "k"),
            ("ORACLE_TIMEOUT_SECS", "0")
        ]))
        .is_err());
    }
}
