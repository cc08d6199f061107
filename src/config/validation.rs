//! Configuration validation module
//!
//! This module provides validation functions for client configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{TontinError, Result};
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_api_config(&settings.api)?;
    validate_auth_config(&settings.auth)?;
    validate_payments_config(&settings.payments)?;
    validate_notifications_config(&settings.notifications)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate backend API configuration
fn validate_api_config(config: &super::ApiConfig) -> Result<()> {
    if config.base_url.is_empty() {
        return Err(TontinError::Config(
            "API base URL is required".to_string()
        ));
    }

    let parsed = url::Url::parse(&config.base_url)
        .map_err(|e| TontinError::Config(format!("Invalid API base URL {}: {}", config.base_url, e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(TontinError::Config(
            format!("API base URL must use http or https, got {}", parsed.scheme())
        ));
    }

    if config.timeout_seconds == 0 {
        return Err(TontinError::Config(
            "API timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate session storage configuration
fn validate_auth_config(config: &super::AuthConfig) -> Result<()> {
    let keys = [
        &config.token_key,
        &config.refresh_token_key,
        &config.token_expiry_key,
        &config.user_key,
    ];

    if keys.iter().any(|key| key.is_empty()) {
        return Err(TontinError::Config(
            "Session storage keys must not be empty".to_string()
        ));
    }

    if config.token_expiration_minutes <= 0 {
        return Err(TontinError::Config(
            "Token expiration must be greater than 0 minutes".to_string()
        ));
    }

    if config.default_email_domain.contains('@') {
        return Err(TontinError::Config(
            "Default email domain must not contain '@'".to_string()
        ));
    }

    Ok(())
}

/// Validate payment configuration
fn validate_payments_config(config: &super::PaymentsConfig) -> Result<()> {
    url::Url::parse(&config.processor_url)
        .map_err(|e| TontinError::Config(format!("Invalid payment processor URL: {}", e)))?;

    Ok(())
}

/// Validate notification polling configuration
fn validate_notifications_config(config: &super::NotificationsConfig) -> Result<()> {
    if config.poll_interval_ms == 0 {
        return Err(TontinError::Config(
            "Notification poll interval must be greater than 0".to_string()
        ));
    }

    if config.page_size == 0 || config.page_size > crate::models::dar::DarPagination::MAX_PAGE_SIZE {
        return Err(TontinError::Config(
            format!("Notification page size must be between 1 and {}", crate::models::dar::DarPagination::MAX_PAGE_SIZE)
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(TontinError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(TontinError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}
