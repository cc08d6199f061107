//! TonTin client
//!
//! An async client for the TonTin rotating savings (Dar) platform.
//! This library provides typed access to Dars, rounds, memberships,
//! contribution payments and notifications, together with the session,
//! route guard and local store handling a front end needs.

pub mod config;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{ApiError, PaymentError, Result, TontinError};

// Re-export main components for easy access
pub use services::{ApiClient, ServiceFactory};
pub use state::{SessionStore, Store, Teardown, TeardownSignal};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
