//! Services module
//!
//! This module contains the API-backed services

pub mod api;
pub mod auth;
pub mod dar;
pub mod member;
pub mod notification;
pub mod payment;
pub mod round;
pub mod user;

// Re-export commonly used services
pub use api::ApiClient;
pub use auth::{AuthService, LoginOutcome};
pub use dar::DarService;
pub use member::MemberService;
pub use notification::NotificationService;
pub use payment::{
    CardProcessor, CheckoutSummary, ContributionCheckout, PaymentEligibility, PaymentService, ProcessorConfirmation,
    StripeCardProcessor,
};
pub use round::RoundService;
pub use user::UserService;

use chrono::Utc;

use crate::config::settings::Settings;
use crate::state::SessionStore;
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Debug, Clone)]
pub struct ServiceFactory {
    pub api: ApiClient,
    pub auth_service: AuthService,
    pub dar_service: DarService,
    pub round_service: RoundService,
    pub member_service: MemberService,
    pub payment_service: PaymentService,
    pub notification_service: NotificationService,
    pub user_service: UserService,
    settings: Settings,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services sharing one HTTP client
    /// and one session
    pub fn new(settings: Settings, session: SessionStore) -> Result<Self> {
        settings.validate()?;
        let api = ApiClient::new(&settings, session)?;

        Ok(Self {
            auth_service: AuthService::new(api.clone(), settings.clone()),
            dar_service: DarService::new(api.clone()),
            round_service: RoundService::new(api.clone()),
            member_service: MemberService::new(api.clone()),
            payment_service: PaymentService::new(api.clone(), settings.clone()),
            notification_service: NotificationService::new(api.clone(), &settings),
            user_service: UserService::new(api.clone()),
            api,
            settings,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Checkout for one contribution, confirmed through `processor`
    pub fn checkout<P: CardProcessor>(&self, dar_id: &str, processor: P) -> ContributionCheckout<P> {
        ContributionCheckout::new(
            self.payment_service.clone(),
            self.dar_service.clone(),
            self.round_service.clone(),
            processor,
            dar_id,
        )
    }

    /// Log out and drop every cached value
    pub async fn sign_out(&self) -> Result<()> {
        self.notification_service.stop_polling();
        self.dar_service.clear_cache();
        self.notification_service.clear_cache();
        self.user_service.clear_cache();
        self.auth_service.logout().await
    }

    /// Local readiness of the services
    pub fn health_check(&self) -> ServiceHealthStatus {
        ServiceHealthStatus {
            session_authenticated: self.api.session().is_authenticated(Utc::now()),
            payments_configured: self.payment_service.is_configured(),
            notification_polling: self.notification_service.is_polling(),
        }
    }
}

/// Health status for all services
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceHealthStatus {
    pub session_authenticated: bool,
    pub payments_configured: bool,
    pub notification_polling: bool,
}

impl ServiceHealthStatus {
    /// Signed in is the only hard requirement
    pub fn is_healthy(&self) -> bool {
        self.session_authenticated
    }

    /// Get list of unavailable features
    pub fn get_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !self.session_authenticated {
            issues.push("Not signed in".to_string());
        }
        if !self.payments_configured {
            issues.push("Payment processor not configured".to_string());
        }
        if !self.notification_polling {
            issues.push("Notification polling not running".to_string());
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::KeyValueStorage;

    #[test]
    fn test_health_of_fresh_factory() {
        let settings = Settings::default();
        let session = SessionStore::new(KeyValueStorage::in_memory(), &settings.auth);
        let factory = ServiceFactory::new(settings, session).unwrap();

        let health = factory.health_check();
        assert!(!health.is_healthy());
        assert_eq!(health.get_issues().len(), 3);
    }
}
