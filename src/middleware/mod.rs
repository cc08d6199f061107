//! Middleware module
//!
//! This module contains request interceptors and route guards

pub mod auth;
pub mod guards;
pub mod logging;

// Re-export commonly used middleware
pub use auth::AuthInterceptor;
pub use guards::{auth_guard, check_route, guest_guard, role_guard, role_matches, GuardContext, GuardOutcome, Navigation};
pub use logging::LoggingMiddleware;
