//! Test context for integration tests
//!
//! A [`TestContext`] wires a full [`ServiceFactory`] against a fresh
//! [`MockBackend`] with a file-backed session in a temporary directory.

use std::sync::Once;

use chrono::{Duration, Utc};
use serde_json::Value;
use tempfile::TempDir;
use tontin_client::config::Settings;
use tontin_client::models::User;
use tontin_client::services::ServiceFactory;
use tontin_client::state::{KeyValueStorage, SessionStore};

use super::backend_mock::MockBackend;
use super::test_data::{create_test_jwt, create_test_user};

static INIT_LOGGING: Once = Once::new();

/// Install a test subscriber once per test binary
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("tontin_client=debug")
            .with_test_writer()
            .try_init();
    });
}

/// Settings pointing at the mock backend with short delays
pub fn test_settings(backend: &MockBackend, session_dir: &TempDir) -> Settings {
    let mut settings = Settings::default();
    settings.api.base_url = backend.base_url();
    settings.api.timeout_seconds = 5;
    settings.api.retry_delay_ms = 10;
    settings.auth.storage_path = Some(session_dir.path().join("session.json").display().to_string());
    settings.payments.publishable_key = Some("pk_test_integration".to_string());
    settings.payments.processor_url = backend.processor_url();
    settings.notifications.poll_interval_ms = 50;
    settings
}

pub struct TestContext {
    pub backend: MockBackend,
    pub settings: Settings,
    pub services: ServiceFactory,
    pub session_dir: TempDir,
}

impl TestContext {
    /// Create a new test context with default test settings
    pub async fn new() -> Self {
        Self::with_settings(|_| {}).await
    }

    /// Create a test context after adjusting the settings
    pub async fn with_settings(adjust: impl FnOnce(&mut Settings)) -> Self {
        init_test_logging();

        let backend = MockBackend::new().await;
        let session_dir = tempfile::tempdir().expect("Failed to create session dir");
        let mut settings = test_settings(&backend, &session_dir);
        adjust(&mut settings);

        let session = SessionStore::from_config(&settings.auth)
            .await
            .expect("Failed to open session");
        let services = ServiceFactory::new(settings.clone(), session).expect("Failed to build services");

        Self { backend, settings, services, session_dir }
    }

    pub fn session(&self) -> &SessionStore {
        self.services.api.session()
    }

    /// Store a valid session for a user with `role` without calling the backend
    pub async fn sign_in(&self, role: &str) -> User {
        let user: User = serde_json::from_value(create_test_user(1, role)).expect("Invalid test user");
        let session = self.session();
        session
            .store_tokens(&create_test_jwt(60), Some("refresh-token"), Utc::now() + Duration::minutes(60))
            .await
            .expect("Failed to store tokens");
        session.store_user(&user).await.expect("Failed to store user");
        user
    }

    /// A second session reading the same file
    pub async fn reopen_session(&self) -> SessionStore {
        let path = self.session_dir.path().join("session.json");
        SessionStore::new(
            KeyValueStorage::open(path).await.expect("Failed to reopen session"),
            &self.settings.auth,
        )
    }

    /// JSON body of a received request
    pub fn body_json(request: &wiremock::Request) -> Value {
        serde_json::from_slice(&request.body).unwrap_or(Value::Null)
    }
}
