//! Logging middleware
//!
//! This module tags every API request with a request id and records
//! method, path, status and latency once the response arrives.

use std::time::Instant;

use reqwest::RequestBuilder;
use uuid::Uuid;

use crate::utils::logging::log_api_call;

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Logging middleware for API calls
#[derive(Debug, Clone)]
pub struct LoggingMiddleware {
    enabled: bool,
}

/// An in-flight request being timed
#[derive(Debug)]
pub struct RequestTrace {
    pub request_id: String,
    pub method: String,
    pub path: String,
    started: Instant,
}

impl LoggingMiddleware {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Tag the request and start timing it
    pub fn start(&self, request: RequestBuilder, method: &str, path: &str) -> (RequestBuilder, RequestTrace) {
        let request_id = Uuid::new_v4().to_string();
        let request = request.header(REQUEST_ID_HEADER, request_id.as_str());

        let trace = RequestTrace {
            request_id,
            method: method.to_string(),
            path: path.to_string(),
            started: Instant::now(),
        };
        (request, trace)
    }

    /// Record the outcome; status 0 means no response was received
    pub fn finish(&self, trace: &RequestTrace, status: u16) -> u64 {
        let elapsed = trace.started.elapsed().as_millis() as u64;
        if self.enabled {
            log_api_call(&trace.method, &trace.path, status, elapsed, &trace.request_id);
        }
        elapsed
    }
}

impl Default for LoggingMiddleware {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_header() {
        let middleware = LoggingMiddleware::default();
        let client = reqwest::Client::new();

        let (request, trace) = middleware.start(client.get("http://localhost/api/notifications"), "GET", "/notifications");
        let request = request.build().unwrap();

        let header = request.headers().get(REQUEST_ID_HEADER).unwrap().to_str().unwrap();
        assert_eq!(header, trace.request_id);
        assert!(Uuid::parse_str(header).is_ok());
        assert_eq!(trace.method, "GET");
    }

    #[test]
    fn test_finish_reports_elapsed() {
        let middleware = LoggingMiddleware::new(false);
        let client = reqwest::Client::new();
        let (_, trace) = middleware.start(client.get("http://localhost/api"), "GET", "/");
        assert!(middleware.finish(&trace, 200) < 1_000);
    }
}
