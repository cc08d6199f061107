//! HTTP client for the TonTin backend
//!
//! Every service goes through [`ApiClient`], which owns the reqwest client
//! with its timeout and runs the interceptor chain: bearer injection,
//! request logging, session clearing on 401, status-to-message
//! translation and bounded retry of GET requests.

use std::time::Duration;

use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::middleware::{AuthInterceptor, LoggingMiddleware};
use crate::state::SessionStore;
use crate::utils::errors::{ApiError, ApiErrorKind, Result, TontinError};
use crate::utils::logging::log_api_error;

/// Shared HTTP client for all services
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: SessionStore,
    auth: AuthInterceptor,
    logging: LoggingMiddleware,
    get_retries: u32,
    retry_delay: Duration,
}

impl ApiClient {
    /// Create a new ApiClient instance
    pub fn new(settings: &Settings, session: SessionStore) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .connect_timeout(settings.request_timeout().min(Duration::from_secs(10)))
            .user_agent(settings.api.user_agent.as_str())
            .build()
            .map_err(TontinError::Http)?;

        url::Url::parse(&settings.api.base_url)?;

        Ok(Self {
            client,
            base_url: settings.api.base_url.trim_end_matches('/').to_string(),
            auth: AuthInterceptor::new(session.clone()),
            session,
            logging: LoggingMiddleware::default(),
            get_retries: settings.api.get_retries,
            retry_delay: Duration::from_millis(settings.api.retry_delay_ms),
        })
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path such as `/dars/my-dars`
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let body = self.execute(Method::GET, path, query, None::<&()>, &[]).await?;
        decode(&body)
    }

    /// GET that maps a 404 to `None`
    pub async fn get_optional<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<Option<T>> {
        match self.get(path, query).await {
            Ok(value) => Ok(Some(value)),
            Err(TontinError::Api(e)) if e.kind == ApiErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = self.execute(Method::POST, path, &[], Some(body), &[]).await?;
        decode(&body)
    }

    /// POST with extra request headers
    pub async fn post_with_headers<B, T>(&self, path: &str, body: &B, headers: &[(&str, String)]) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = self.execute(Method::POST, path, &[], Some(body), headers).await?;
        decode(&body)
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = self.execute(Method::PUT, path, &[], Some(body), &[]).await?;
        decode(&body)
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let body = self.execute(Method::DELETE, path, &[], None::<&()>, &[]).await?;
        decode(&body)
    }

    /// DELETE carrying a JSON body, as used by bulk endpoints
    pub async fn delete_with_body<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = self.execute(Method::DELETE, path, &[], Some(body), &[]).await?;
        decode(&body)
    }

    /// Send a request, retrying idempotent GETs on transient failures
    async fn execute<B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
        headers: &[(&str, String)],
    ) -> Result<String>
    where
        B: Serialize + ?Sized,
    {
        let max_attempts = if method == Method::GET { self.get_retries + 1 } else { 1 };
        let mut attempt = 1;

        loop {
            match self.send_once(&method, path, query, body, headers).await {
                Err(TontinError::Api(e)) if e.is_transient() && attempt < max_attempts => {
                    warn!(
                        path = path,
                        status = e.status,
                        attempt = attempt,
                        max_attempts = max_attempts,
                        "Retrying GET request"
                    );
                    attempt += 1;
                    tokio::time::sleep(self.retry_delay).await;
                }
                result => return result,
            }
        }
    }

    async fn send_once<B>(
        &self,
        method: &Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
        headers: &[(&str, String)],
    ) -> Result<String>
    where
        B: Serialize + ?Sized,
    {
        let mut request = self.client.request(method.clone(), self.url(path));
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        for (name, value) in headers {
            request = request.header(*name, value.as_str());
        }
        let request = self.auth.apply(request, path);
        let (request, trace) = self.logging.start(request, method.as_str(), path);

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                self.logging.finish(&trace, 0);
                warn!(path = path, error = %e, timeout = e.is_timeout(), "Request did not reach the server");
                let error = if e.is_timeout() { ApiError::timeout() } else { ApiError::network() };
                return Err(error.into());
            }
        };

        let status = response.status().as_u16();
        self.logging.finish(&trace, status);
        let text = response.text().await.map_err(TontinError::Http)?;

        if !response_ok(status) {
            match self.auth.on_response(path, status).await {
                Ok(true) => debug!(path = path, "Session cleared after 401"),
                Ok(false) => {}
                Err(e) => warn!(error = %e, "Failed to clear session after 401"),
            }
            let body = (!text.trim().is_empty()).then_some(text);
            let error = ApiError::from_response(status, body);
            if status >= 500 {
                log_api_error(path, &error.message, Some(method.as_str()));
            }
            return Err(error.into());
        }

        Ok(text)
    }
}

fn response_ok(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Decode a response body; an empty body decodes as JSON `null`
fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    let body = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(body).map_err(TontinError::Serialization)
}
