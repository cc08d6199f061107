//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main client configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub api: ApiConfig,
    pub auth: AuthConfig,
    pub payments: PaymentsConfig,
    pub notifications: NotificationsConfig,
    pub logging: LoggingConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Base URL including the `/api` prefix
    pub base_url: String,
    pub timeout_seconds: u64,
    pub user_agent: String,
    /// Extra attempts for failed GET requests
    pub get_retries: u32,
    pub retry_delay_ms: u64,
}

/// Session and authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub token_key: String,
    pub refresh_token_key: String,
    pub token_expiry_key: String,
    pub user_key: String,
    pub token_prefix: String,
    pub token_expiration_minutes: i64,
    /// Appended to login identifiers that are not email addresses
    pub default_email_domain: String,
    /// Session file; the session lives in memory only when unset
    pub storage_path: Option<String>,
}

/// Payment processor configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentsConfig {
    pub publishable_key: Option<String>,
    pub processor_url: String,
}

/// Notification polling configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationsConfig {
    pub poll_interval_ms: u64,
    pub page_size: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for the rolling log file; stdout only when unset
    pub file_path: Option<String>,
    pub json: bool,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let defaults = config::Config::try_from(&Settings::default())?;

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("TONTIN")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Parse settings from an in-memory TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, crate::utils::errors::TontinError> {
        toml::from_str(source).map_err(|e| crate::utils::errors::TontinError::Config(e.to_string()))
    }

    /// Render the settings as TOML
    pub fn to_toml_string(&self) -> Result<String, crate::utils::errors::TontinError> {
        toml::to_string_pretty(self).map_err(|e| crate::utils::errors::TontinError::Config(e.to_string()))
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::TontinError> {
        super::validation::validate_settings(self)
    }

    /// Request timeout as a duration
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.api.timeout_seconds)
    }

    /// Whether a real payment processor key is configured
    pub fn payments_configured(&self) -> bool {
        self.payments
            .publishable_key
            .as_deref()
            .map(|key| !key.trim().is_empty() && !key.starts_with("pk_test_mock"))
            .unwrap_or(false)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:3000/api".to_string(),
                timeout_seconds: 30,
                user_agent: format!("tontin-client/{}", env!("CARGO_PKG_VERSION")),
                get_retries: 2,
                retry_delay_ms: 1000,
            },
            auth: AuthConfig {
                token_key: "tontin_token".to_string(),
                refresh_token_key: "tontin_refresh_token".to_string(),
                token_expiry_key: "tontin_token_expiry".to_string(),
                user_key: "tontin_user".to_string(),
                token_prefix: "Bearer".to_string(),
                token_expiration_minutes: 60,
                default_email_domain: "tontin.com".to_string(),
                storage_path: None,
            },
            payments: PaymentsConfig {
                publishable_key: None,
                processor_url: "https://api.stripe.com".to_string(),
            },
            notifications: NotificationsConfig {
                poll_interval_ms: 30_000,
                page_size: 20,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                json: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.notifications.poll_interval_ms, 30_000);
        assert_eq!(settings.auth.token_key, "tontin_token");
        assert!(!settings.payments_configured());
    }

    #[test]
    fn test_mock_key_is_not_configured() {
        let mut settings = Settings::default();
        settings.payments.publishable_key = Some("pk_test_mock_123".to_string());
        assert!(!settings.payments_configured());

        settings.payments.publishable_key = Some("pk_test_51Habc".to_string());
        assert!(settings.payments_configured());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut settings = Settings::default();
        settings.api.base_url = "https://api.tontin.example.com/api".to_string();

        let rendered = settings.to_toml_string().unwrap();
        let parsed = Settings::from_toml_str(&rendered).unwrap();
        assert_eq!(parsed.api.base_url, "https://api.tontin.example.com/api");
        assert_eq!(parsed.auth.token_expiration_minutes, 60);
    }
}
