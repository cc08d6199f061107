//! Authentication middleware
//!
//! Attaches the bearer token to outgoing API requests and drops the
//! session when the backend rejects it.

use reqwest::header::AUTHORIZATION;
use reqwest::RequestBuilder;
use tracing::{debug, warn};

use crate::state::SessionStore;
use crate::utils::errors::Result;

/// Paths that must never carry a bearer token
const PUBLIC_AUTH_PATHS: [&str; 4] = ["/auth/login", "/auth/register", "/auth/refresh-token", "/auth/verify"];

/// Request interceptor for bearer authentication
#[derive(Debug, Clone)]
pub struct AuthInterceptor {
    session: SessionStore,
}

impl AuthInterceptor {
    pub fn new(session: SessionStore) -> Self {
        Self { session }
    }

    /// Whether `path` is one of the token-issuing endpoints
    pub fn is_auth_endpoint(path: &str) -> bool {
        PUBLIC_AUTH_PATHS.iter().any(|public| path.contains(public))
    }

    /// Add the `Authorization` header unless the path is public
    pub fn apply(&self, request: RequestBuilder, path: &str) -> RequestBuilder {
        if Self::is_auth_endpoint(path) {
            return request;
        }

        match self.session.authorization_header() {
            Some(header) => request.header(AUTHORIZATION, header),
            None => {
                debug!(path = path, "No session token for request");
                request
            }
        }
    }

    /// Inspect a response status. A 401 while holding a token clears the
    /// whole session; returns whether it did.
    pub async fn on_response(&self, path: &str, status: u16) -> Result<bool> {
        if status != 401 || Self::is_auth_endpoint(path) || self.session.token().is_none() {
            return Ok(false);
        }

        warn!(path = path, "Session rejected by the backend, clearing stored credentials");
        self.session.clear().await?;
        Ok(true)
    }
}
