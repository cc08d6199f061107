//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the TonTin client.

use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};
use crate::config::LoggingConfig;
use crate::utils::errors::{Result, TontinError};

/// Initialize logging based on configuration.
///
/// The returned guard flushes the file writer on drop and must be held
/// for as long as the process logs.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_new(&config.level)
        .map_err(|e| TontinError::Config(format!("Invalid log filter {}: {}", config.level, e)))?;

    let stdout_layer = if config.json {
        tracing_subscriber::fmt::layer().json().with_writer(std::io::stdout).boxed()
    } else {
        tracing_subscriber::fmt::layer().with_writer(std::io::stdout).boxed()
    };

    let (file_layer, guard) = match config.file_path.as_deref() {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "tontin.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = if config.json {
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(non_blocking)
                    .boxed()
            } else {
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking)
                    .boxed()
            };
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| TontinError::Config(format!("Logging already initialized: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log a completed API call
pub fn log_api_call(method: &str, path: &str, status: u16, duration_ms: u64, request_id: &str) {
    if status >= 500 || status == 0 {
        warn!(
            method = method,
            path = path,
            status = status,
            duration_ms = duration_ms,
            request_id = request_id,
            "API call failed"
        );
    } else {
        debug!(
            method = method,
            path = path,
            status = status,
            duration_ms = duration_ms,
            request_id = request_id,
            "API call completed"
        );
    }
}

/// Log Dar lifecycle and membership actions
pub fn log_dar_action(dar_id: &str, action: &str, details: Option<&str>) {
    info!(
        dar_id = dar_id,
        action = action,
        details = details,
        "Dar action performed"
    );
}

/// Log payment flow events
pub fn log_payment_event(dar_id: &str, payment_id: Option<&str>, event: &str) {
    info!(
        dar_id = dar_id,
        payment_id = payment_id,
        event = event,
        "Payment event"
    );
}

/// Log authentication events
pub fn log_auth_event(email: Option<&str>, event: &str, success: bool) {
    if success {
        info!(email = email, event = event, "Authentication event");
    } else {
        warn!(email = email, event = event, "Authentication event failed");
    }
}

/// Log API errors with context
pub fn log_api_error(api: &str, error: &str, context: Option<&str>) {
    error!(
        api = api,
        error = error,
        context = context,
        "API error occurred"
    );
}
