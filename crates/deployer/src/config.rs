//! Configuration management for the Odin deployer
//!
//! Loads configuration from environment variables with sensible defaults.

use anyhow::{Context, Result};
use odin_release::{FileStore, ObjectStore, RedisStore};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Object store location: `redis://...` or a directory path
    pub store_url: String,

    /// Region used when a release does not name one
    pub aws_region: Option<String>,

    /// Account used when a release does not name one
    pub aws_account_id: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        let config = Config {
            store_url: env::var("ODIN_STORE_URL").unwrap_or_else(|_| "./odin-store".to_string()),
            aws_region: env::var("AWS_REGION").ok().filter(|v| !v.is_empty()),
            aws_account_id: env::var("AWS_ACCOUNT_ID").ok().filter(|v| !v.is_empty()),
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.store_url.trim().is_empty() {
            anyhow::bail!("ODIN_STORE_URL must not be empty");
        }

        if let Some(account) = &self.aws_account_id {
            if !account.chars().all(|c| c.is_ascii_digit()) {
                anyhow::bail!("AWS_ACCOUNT_ID must be numeric, got {}", account);
            }
        }

        Ok(())
    }

    pub fn uses_redis(&self) -> bool {
        self.store_url.starts_with("redis://") || self.store_url.starts_with("rediss://")
    }

    /// Open the configured object store
    pub fn open_store(&self) -> Result<Box<dyn ObjectStore>> {
        if self.uses_redis() {
            let store = RedisStore::new(&self.store_url).context("Failed to open Redis store")?;
            Ok(Box::new(store))
        } else {
            Ok(Box::new(FileStore::new(&self.store_url)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_and_overrides() {
        env::remove_var("ODIN_STORE_URL");
        env::remove_var("AWS_REGION");
        env::remove_var("AWS_ACCOUNT_ID");

        let config = Config::from_env().expect("Failed to load config");
        assert_eq!(config.store_url, "./odin-store");
        assert!(!config.uses_redis());

        env::set_var("ODIN_STORE_URL", "redis://127.0.0.1:6379/2");
        env::set_var("AWS_REGION", "us-west-2");
        env::set_var("AWS_ACCOUNT_ID", "123456789012");

        let config = Config::from_env().expect("Failed to load config");
        assert!(config.uses_redis());
        assert_eq!(config.aws_region.as_deref(), Some("us-west-2"));
        assert_eq!(config.aws_account_id.as_deref(), Some("123456789012"));

        env::set_var("AWS_ACCOUNT_ID", "not-an-account");
        assert!(Config::from_env().is_err());

        env::remove_var("ODIN_STORE_URL");
        env::remove_var("AWS_REGION");
        env::remove_var("AWS_ACCOUNT_ID");
    }

    #[test]
    fn test_empty_store_url_rejected() {
        let config = Config {
            store_url: "  ".to_string(),
            aws_region: None,
            aws_account_id: None,
        };
        assert!(config.validate().is_err());
    }
}
