//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Configuration is loaded with the
//! `TRAILPASS` prefix and nested values use double underscores as
//! separators.
//!
//! # Example
//!
//! ```no_run
//! use trailpass::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod error;
mod server;
mod webhook;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use server::{Environment, ServerConfig};
pub use webhook::WebhookConfig;

use serde::Deserialize;

/// Root application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Webhook configuration (signing secret, dedup window)
    pub webhook: WebhookConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Loads a `.env` file if present, then reads environment variables
    /// with the `TRAILPASS` prefix, `__` separating nested values:
    ///
    /// - `TRAILPASS__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `TRAILPASS__DATABASE__URL=...` -> `database.url = ...`
    /// - `TRAILPASS__WEBHOOK__SIGNING_SECRET=whsec_...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or
    /// values cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("TRAILPASS")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.webhook.validate()?;
        Ok(())
    }

    /// Check if running in production environment.
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global, keep these tests serialized.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn set_minimal_env() {
        env::set_var(
            "TRAILPASS__DATABASE__URL",
            "postgresql://test@localhost/trailpass",
        );
        env::set_var("TRAILPASS__WEBHOOK__SIGNING_SECRET", "whsec_test123");
    }

    fn clear_env() {
        env::remove_var("TRAILPASS__DATABASE__URL");
        env::remove_var("TRAILPASS__WEBHOOK__SIGNING_SECRET");
        env::remove_var("TRAILPASS__SERVER__PORT");
        env::remove_var("TRAILPASS__WEBHOOK__DEDUP_CAPACITY");
    }

    #[test]
    fn load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.expect("load failed");
        assert_eq!(config.database.url, "postgresql://test@localhost/trailpass");
        assert_eq!(config.webhook.dedup_capacity, 1000);
    }

    #[test]
    fn loaded_config_passes_validation() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.expect("load failed");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn dedup_capacity_is_overridable() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("TRAILPASS__WEBHOOK__DEDUP_CAPACITY", "250");
        let result = AppConfig::load();
        clear_env();

        let config = result.expect("load failed");
        assert_eq!(config.webhook.dedup_capacity, 250);
    }
}
