//! Mock TonTin backend for testing
//!
//! This module provides a mock HTTP server that simulates the TonTin REST API
//! and the payment processor. It uses wiremock to create configurable mock
//! responses.

use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, Request, ResponseTemplate,
};

/// Mock TonTin API server for testing
pub struct MockBackend {
    pub server: MockServer,
}

/// Configuration for mock responses
#[derive(Debug, Clone)]
pub struct MockResponseConfig {
    pub status: u16,
    pub delay_ms: Option<u64>,
    pub custom_response: Option<Value>,
    /// Number of matching requests the mock must receive
    pub expect: Option<u64>,
    /// Stop answering after this many requests
    pub up_to: Option<u64>,
}

impl Default for MockResponseConfig {
    fn default() -> Self {
        Self {
            status: 200,
            delay_ms: None,
            custom_response: None,
            expect: None,
            up_to: None,
        }
    }
}

impl MockResponseConfig {
    pub fn ok(body: Value) -> Self {
        Self { custom_response: Some(body), ..Self::default() }
    }

    pub fn error(status: u16) -> Self {
        Self { status, ..Self::default() }
    }

    pub fn expect(mut self, times: u64) -> Self {
        self.expect = Some(times);
        self
    }

    pub fn up_to(mut self, times: u64) -> Self {
        self.up_to = Some(times);
        self
    }
}

impl MockBackend {
    /// Create a new mock TonTin API server
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    /// Base URL the client should be configured with
    pub fn base_url(&self) -> String {
        format!("{}/api", self.server.uri())
    }

    /// Base URL of the mocked payment processor
    pub fn processor_url(&self) -> String {
        format!("{}/processor", self.server.uri())
    }

    /// Mount a JSON response for `http_method api_path`, where `api_path`
    /// is relative to the API base
    pub async fn mock_api(&self, http_method: &str, api_path: &str, config: MockResponseConfig) {
        let mock = self.build(http_method, &format!("/api{}", api_path), config);
        mock.mount(&self.server).await;
    }

    /// Same as [`mock_api`](Self::mock_api) with an absolute path
    pub async fn mock_raw(&self, http_method: &str, raw_path: &str, config: MockResponseConfig) {
        let mock = self.build(http_method, raw_path, config);
        mock.mount(&self.server).await;
    }

    fn build(&self, http_method: &str, full_path: &str, config: MockResponseConfig) -> Mock {
        let mut response = ResponseTemplate::new(config.status);
        match config.custom_response {
            Some(body) => response = response.set_body_json(body),
            None if config.status >= 400 => {
                response = response.set_body_json(json!({ "status": config.status }));
            }
            None => {}
        }
        if let Some(delay) = config.delay_ms {
            response = response.set_delay(std::time::Duration::from_millis(delay));
        }

        let mut mock = Mock::given(method(http_method)).and(path(full_path.to_string())).respond_with(response);
        if let Some(times) = config.up_to {
            mock = mock.up_to_n_times(times);
        }
        if let Some(times) = config.expect {
            mock = mock.expect(times);
        }
        mock
    }

    /// Setup mock for the login endpoint
    pub async fn mock_login(&self, token: &str, user: Value) {
        self.mock_api(
            "POST",
            "/v1/auth/login",
            MockResponseConfig::ok(json!({
                "token": token,
                "refreshToken": "refresh-token",
                "user": user,
            })),
        )
        .await;
    }

    /// Setup mock for the first page of the user's Dars
    pub async fn mock_my_dars(&self, dars: Vec<Value>) {
        self.mock_api("GET", "/dars/my-dars", MockResponseConfig::ok(page_json(dars))).await;
    }

    /// Setup mock for the unread counter
    pub async fn mock_unread_count(&self, count: u64) {
        self.mock_api(
            "GET",
            "/notifications/unread-count",
            MockResponseConfig::ok(json!({ "count": count })),
        )
        .await;
    }

    /// All requests received so far
    pub async fn received_requests(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    /// Requests received for a path relative to the API base
    pub async fn requests_to(&self, api_path: &str) -> Vec<Request> {
        let full_path = format!("/api{}", api_path);
        self.received_requests()
            .await
            .into_iter()
            .filter(|request| request.url.path() == full_path)
            .collect()
    }

    /// Reset all mocks
    pub async fn reset(&self) {
        self.server.reset().await;
    }
}

/// Wrap items in a first-page envelope
pub fn page_json(items: Vec<Value>) -> Value {
    let total = items.len();
    json!({
        "content": items,
        "totalElements": total,
        "totalPages": 1,
        "number": 0,
        "size": 20,
        "first": true,
        "last": true,
    })
}
