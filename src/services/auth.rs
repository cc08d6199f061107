//! Authentication service implementation
//!
//! This service handles login, registration, token refresh and logout
//! against the `/v1/auth` endpoints, and keeps the persisted session in
//! sync with the backend responses.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::settings::Settings;
use crate::middleware::guards::{dashboard_for_role, Navigation};
use crate::models::user::{AuthResponse, LoginRequest, RefreshTokenRequest, RegisterRequest, User};
use crate::services::api::ApiClient;
use crate::state::SessionStore;
use crate::utils::errors::{auth_status_message, ApiError, Result, TontinError};
use crate::utils::helpers::{is_valid_email, normalize_login_identifier};
use crate::utils::logging::log_auth_event;

/// Outcome of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: Option<User>,
    pub expires_at: DateTime<Utc>,
    /// Where the client should navigate next
    pub navigation: Navigation,
}

#[derive(Debug, Deserialize)]
struct ExpiryClaim {
    exp: i64,
}

/// Authentication service
#[derive(Debug, Clone)]
pub struct AuthService {
    api: ApiClient,
    session: SessionStore,
    settings: Settings,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(api: ApiClient, settings: Settings) -> Self {
        let session = api.session().clone();
        Self { api, session, settings }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Log in with an email or a bare user name
    pub async fn login(&self, email_or_username: &str, password: &str) -> Result<LoginOutcome> {
        let email = normalize_login_identifier(email_or_username, &self.settings.auth.default_email_domain);
        if password.is_empty() {
            return Err(TontinError::InvalidInput("Password is required".to_string()));
        }

        debug!(email = %email, "Logging in");
        let request = LoginRequest { email: email.clone(), password: password.to_string() };
        let response: AuthResponse = self
            .api
            .post("/v1/auth/login", &request)
            .await
            .map_err(auth_error)
            .inspect_err(|_| log_auth_event(Some(&email), "login", false))?;

        let expires_at = self.store_response(&response).await?;
        log_auth_event(Some(&email), "login", true);

        let role = response.user.as_ref().map(|u| u.role.as_str()).unwrap_or_default();
        Ok(LoginOutcome {
            navigation: Navigation::to(dashboard_for_role(role)),
            user: response.user.clone(),
            expires_at,
        })
    }

    /// Create an account; the session is stored when the backend returns a token
    pub async fn register(&self, user_name: &str, email: &str, password: &str) -> Result<Option<User>> {
        if user_name.trim().is_empty() {
            return Err(TontinError::InvalidInput("User name is required".to_string()));
        }
        if !is_valid_email(email) {
            return Err(TontinError::InvalidInput(format!("Invalid email address: {}", email)));
        }

        let request = RegisterRequest {
            user_name: user_name.trim().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let response: Option<AuthResponse> = self
            .api
            .post("/v1/auth/register", &request)
            .await
            .map_err(auth_error)?;

        log_auth_event(Some(email), "register", true);
        match response {
            Some(response) if !response.token.is_empty() => {
                self.store_response(&response).await?;
                Ok(response.user)
            }
            _ => Ok(None),
        }
    }

    /// Exchange the refresh token for a new token pair
    pub async fn refresh_token(&self) -> Result<DateTime<Utc>> {
        let token = self.session.refresh_token().ok_or(TontinError::NotAuthenticated)?;

        match self
            .api
            .post::<_, AuthResponse>("/v1/auth/refresh-token", &RefreshTokenRequest { token })
            .await
        {
            Ok(response) => {
                let expires_at = self.store_response(&response).await?;
                info!(expires_at = %expires_at, "Session token refreshed");
                Ok(expires_at)
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, clearing session");
                self.session.clear().await?;
                Err(auth_error(e))
            }
        }
    }

    /// Log out; the local session is cleared even if the backend call fails
    pub async fn logout(&self) -> Result<()> {
        if self.session.token().is_some() {
            if let Err(e) = self.api.post::<_, serde_json::Value>("/v1/auth/logout", &serde_json::json!({})).await {
                warn!(error = %e, "Logout request failed, clearing local session anyway");
            }
        }
        self.session.clear().await?;
        log_auth_event(None, "logout", true);
        Ok(())
    }

    /// Fetch the current user from the backend and store it
    pub async fn fetch_me(&self) -> Result<User> {
        let user: User = self.api.get("/v1/auth/me", &[]).await?;
        self.session.store_user(&user).await?;
        Ok(user)
    }

    /// The persisted user, if any
    pub fn current_user(&self) -> Option<User> {
        self.session.user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated(Utc::now())
    }

    /// Dashboard for the signed-in user
    pub fn home_route(&self) -> &'static str {
        dashboard_for_role(self.current_user().map(|u| u.role).as_deref().unwrap_or_default())
    }

    async fn store_response(&self, response: &AuthResponse) -> Result<DateTime<Utc>> {
        if response.token.is_empty() {
            return Err(TontinError::Authentication("Backend returned an empty token".to_string()));
        }

        let expires_at = token_expiry(&response.token)
            .unwrap_or_else(|| Utc::now() + Duration::minutes(self.settings.auth.token_expiration_minutes));

        self.session
            .store_tokens(&response.token, response.refresh_token.as_deref(), expires_at)
            .await?;
        if let Some(user) = &response.user {
            self.session.store_user(user).await?;
        }
        Ok(expires_at)
    }
}

/// Read the `exp` claim of a JWT without verifying its signature.
///
/// The client has no key to verify with; the value only decides when the
/// session is considered stale locally.
pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let header = jsonwebtoken::decode_header(token).ok()?;
    let mut validation = Validation::new(header.alg);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();
    validation.algorithms = vec![header.alg, Algorithm::HS256, Algorithm::HS512, Algorithm::RS256];

    let data = decode::<ExpiryClaim>(token, &DecodingKey::from_secret(&[]), &validation).ok()?;
    Utc.timestamp_opt(data.claims.exp, 0).single()
}

/// Replace generic API messages with the login form messages
fn auth_error(error: TontinError) -> TontinError {
    match error {
        TontinError::Api(api) => {
            let message = auth_status_message(api.status).to_string();
            TontinError::Api(ApiError { message, ..api })
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct Claims {
        sub: String,
        exp: i64,
    }

    #[test]
    fn test_token_expiry_from_jwt() {
        let exp = Utc::now().timestamp() + 3600;
        let token = encode(
            &Header::default(),
            &Claims { sub: "jane@x.com".to_string(), exp },
            &EncodingKey::from_secret(b"server-secret"),
        )
        .unwrap();

        assert_eq!(token_expiry(&token).unwrap().timestamp(), exp);
    }

    #[test]
    fn test_opaque_token_has_no_expiry() {
        assert!(token_expiry("not-a-jwt").is_none());
    }

    #[test]
    fn test_auth_error_messages() {
        let mapped = auth_error(ApiError::from_response(401, None).into());
        assert_eq!(mapped.user_message(), "Invalid credentials. Please try again.");
        assert_eq!(mapped.status(), Some(401));

        let untouched = auth_error(TontinError::NotAuthenticated);
        assert!(matches!(untouched, TontinError::NotAuthenticated));
    }
}
