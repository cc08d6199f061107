//! Payment service implementation
//!
//! Contributions are paid in two phases: the backend creates a payment
//! intent, the card is confirmed directly with the processor, and the
//! backend is then told about the outcome. [`ContributionCheckout`] drives
//! the whole sequence through a [`PaymentFlow`].

use std::future::Future;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::settings::Settings;
use crate::models::dar::{Dar, DarPagination};
use crate::models::page::Page;
use crate::models::payment::{
    ConfirmPaymentResponse, Contribution, ContributionStatus, CreatePaymentIntentRequest, CreatePaymentIntentResponse,
    Payment, PaymentRecordStatus, PaymentSummary, PendingPaymentsCheck,
};
use crate::models::round::Round;
use crate::services::api::ApiClient;
use crate::services::dar::DarService;
use crate::services::round::RoundService;
use crate::state::{PaymentFlow, PaymentFlowState};
use crate::utils::errors::{PaymentError, Result};
use crate::utils::logging::log_payment_event;

/// Header carrying the idempotency key on confirmation calls
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Result of a card confirmation reported by the processor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorConfirmation {
    pub intent_id: String,
    pub status: String,
}

impl ProcessorConfirmation {
    pub fn succeeded(&self) -> bool {
        self.status == "succeeded" || self.status == "processing"
    }
}

/// Confirms card payments against a payment processor
pub trait CardProcessor: Send + Sync {
    fn confirm_card_payment(
        &self,
        client_secret: &str,
        payment_method: &str,
    ) -> impl Future<Output = Result<ProcessorConfirmation>> + Send;
}

#[derive(Debug, Deserialize)]
struct IntentResponse {
    id: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct ProcessorErrorBody {
    error: ProcessorErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ProcessorErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

/// [`CardProcessor`] backed by the Stripe REST API
#[derive(Debug, Clone)]
pub struct StripeCardProcessor {
    client: Client,
    base_url: String,
    publishable_key: String,
}

impl StripeCardProcessor {
    pub fn new(settings: &Settings) -> Result<Self> {
        if !settings.payments_configured() {
            return Err(PaymentError::NotConfigured.into());
        }
        let publishable_key = settings
            .payments
            .publishable_key
            .clone()
            .ok_or(PaymentError::NotConfigured)?;

        let client = Client::builder()
            .timeout(settings.request_timeout())
            .user_agent(settings.api.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            base_url: settings.payments.processor_url.trim_end_matches('/').to_string(),
            publishable_key,
        })
    }
}

impl CardProcessor for StripeCardProcessor {
    async fn confirm_card_payment(&self, client_secret: &str, payment_method: &str) -> Result<ProcessorConfirmation> {
        let intent_id = intent_id_from_secret(client_secret)
            .ok_or_else(|| PaymentError::Processor("Malformed client secret".to_string()))?;

        let response = self
            .client
            .post(format!("{}/v1/payment_intents/{}/confirm", self.base_url, intent_id))
            .bearer_auth(&self.publishable_key)
            .form(&[("client_secret", client_secret), ("payment_method", payment_method)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ProcessorErrorBody>(&body).ok().map(|b| b.error);
            let message = detail
                .as_ref()
                .and_then(|d| d.message.clone())
                .unwrap_or_else(|| format!("Processor returned HTTP {}", status.as_u16()));
            let declined = detail.as_ref().and_then(|d| d.kind.as_deref()) == Some("card_error");
            return Err(if declined {
                PaymentError::Declined(message)
            } else {
                PaymentError::Processor(message)
            }
            .into());
        }

        let intent: IntentResponse = serde_json::from_str(&body)?;
        Ok(ProcessorConfirmation { intent_id: intent.id, status: intent.status })
    }
}

/// The intent id is the client secret up to `_secret_`
fn intent_id_from_secret(client_secret: &str) -> Option<&str> {
    client_secret
        .split_once("_secret_")
        .map(|(id, _)| id)
        .filter(|id| !id.is_empty())
}

/// Everything that must hold before a payment may start
#[derive(Debug, Clone, Copy)]
pub struct PaymentEligibility<'a> {
    pub dar: Option<&'a Dar>,
    pub current_round: Option<&'a Round>,
    pub processor_configured: bool,
}

impl<'a> PaymentEligibility<'a> {
    /// Amount due for the current round
    pub fn amount(&self) -> f64 {
        match (self.current_round, self.dar) {
            (Some(round), _) if round.amount > 0.0 => round.amount,
            (_, Some(dar)) => dar.monthly_contribution,
            _ => 0.0,
        }
    }

    pub fn check(&self) -> std::result::Result<f64, PaymentError> {
        if self.dar.is_none() {
            return Err(PaymentError::NotEligible("Dar details are not loaded".to_string()));
        }
        if self.current_round.is_none() {
            return Err(PaymentError::NotEligible("There is no open round".to_string()));
        }
        let amount = self.amount();
        if amount <= 0.0 {
            return Err(PaymentError::NotEligible("Nothing is due for this round".to_string()));
        }
        if !self.processor_configured {
            return Err(PaymentError::NotConfigured);
        }
        Ok(amount)
    }

    pub fn can_pay(&self) -> bool {
        self.check().is_ok()
    }
}

/// Backend side of contribution payments
#[derive(Debug, Clone)]
pub struct PaymentService {
    api: ApiClient,
    settings: Settings,
}

impl PaymentService {
    /// Create a new PaymentService instance
    pub fn new(api: ApiClient, settings: Settings) -> Self {
        Self { api, settings }
    }

    /// Whether a real publishable key is configured
    pub fn is_configured(&self) -> bool {
        self.settings.payments_configured()
    }

    pub async fn create_payment_intent(&self, dar_id: &str) -> Result<CreatePaymentIntentResponse> {
        let request = CreatePaymentIntentRequest { dart_id: dar_id.to_string() };
        let intent: CreatePaymentIntentResponse = self.api.post("/v1/payments/create-intent", &request).await?;

        if intent.client_secret.is_empty() {
            return Err(PaymentError::Processor("Backend returned no client secret".to_string()).into());
        }
        log_payment_event(dar_id, intent.payment_id.as_deref(), "intent_created");
        Ok(intent)
    }

    /// Totals and the next due contribution of the current user
    pub async fn get_payment_summary(&self) -> Result<PaymentSummary> {
        self.api.get("/payments/summary", &[]).await
    }

    /// Payment history, newest first as ordered by the backend
    pub async fn get_payments(
        &self,
        page: u32,
        size: u32,
        status: Option<PaymentRecordStatus>,
        dar_id: Option<&str>,
    ) -> Result<Page<Payment>> {
        let mut query = page_query(page, size);
        if let Some(status) = status {
            query.push(("status", status.as_str().to_string()));
        }
        if let Some(dar_id) = dar_id {
            query.push(("darId", dar_id.to_string()));
        }
        self.api.get("/payments", &query).await
    }

    pub async fn get_payment(&self, payment_id: &str) -> Result<Payment> {
        self.api.get(&format!("/payments/{}", payment_id), &[]).await
    }

    /// Contributions of every member of one Dar
    pub async fn get_contributions(
        &self,
        dar_id: &str,
        page: u32,
        size: u32,
        status: Option<ContributionStatus>,
    ) -> Result<Page<Contribution>> {
        let query = contribution_query(page, size, status);
        self.api
            .get(&format!("/payments/contributions/dar/{}", dar_id), &query)
            .await
    }

    /// The current user's contributions across all Dars
    pub async fn get_my_contributions(
        &self,
        page: u32,
        size: u32,
        status: Option<ContributionStatus>,
    ) -> Result<Page<Contribution>> {
        let query = contribution_query(page, size, status);
        self.api.get("/payments/contributions/my", &query).await
    }

    pub async fn has_pending_payments(&self, dar_id: &str) -> Result<PendingPaymentsCheck> {
        let check: PendingPaymentsCheck = self
            .api
            .get(&format!("/payments/pending-check/{}", dar_id), &[])
            .await?;
        debug!(dar_id = dar_id, pending = check.count, "Checked pending payments");
        Ok(check)
    }

    /// Tell the backend the processor accepted the payment
    pub async fn confirm_payment_success(&self, payment_id: &str) -> Result<ConfirmPaymentResponse> {
        let headers = [(IDEMPOTENCY_KEY_HEADER, payment_id.to_string())];
        self.api
            .post_with_headers(
                &format!("/v1/payments/{}/confirm-success", payment_id),
                &serde_json::json!({}),
                &headers,
            )
            .await
    }
}

fn page_query(page: u32, size: u32) -> Vec<(&'static str, String)> {
    vec![
        ("page", page.to_string()),
        ("size", DarPagination::clamp(size).to_string()),
    ]
}

fn contribution_query(page: u32, size: u32, status: Option<ContributionStatus>) -> Vec<(&'static str, String)> {
    let mut query = page_query(page, size);
    if let Some(status) = status {
        query.push(("status", status.as_str().to_string()));
    }
    query
}

/// What the user is about to pay
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSummary {
    pub dar_id: String,
    pub dar_name: String,
    pub round_number: u32,
    pub amount: f64,
}

/// Drives one contribution payment from intent creation to backend
/// acknowledgement
#[derive(Debug)]
pub struct ContributionCheckout<P> {
    payments: PaymentService,
    dars: DarService,
    rounds: RoundService,
    processor: P,
    flow: PaymentFlow,
}

impl<P: CardProcessor> ContributionCheckout<P> {
    pub fn new(payments: PaymentService, dars: DarService, rounds: RoundService, processor: P, dar_id: &str) -> Self {
        Self {
            payments,
            dars,
            rounds,
            processor,
            flow: PaymentFlow::new(dar_id),
        }
    }

    pub fn state(&self) -> &PaymentFlowState {
        self.flow.state()
    }

    pub fn flow(&self) -> &PaymentFlow {
        &self.flow
    }

    /// Load the Dar and its current round, check eligibility, create the
    /// intent and show the card form.
    ///
    /// Nothing is requested unless the flow is idle or failed before an
    /// intent existed.
    pub async fn prepare(&mut self) -> Result<CheckoutSummary> {
        self.flow.ensure_can_start()?;
        let dar_id = self.flow.dar_id().to_string();
        let (dar, round) = futures::join!(self.dars.get_dar(&dar_id), self.rounds.get_current_round(&dar_id));
        let dar = dar?;
        let round = round?;

        let eligibility = PaymentEligibility {
            dar: Some(&dar),
            current_round: round.as_ref(),
            processor_configured: self.payments.is_configured(),
        };
        let amount = eligibility.check()?;
        let round_number = round.as_ref().map(|r| r.number).unwrap_or_default();

        let intent = match self.payments.create_payment_intent(&dar_id).await {
            Ok(intent) => intent,
            Err(e) => {
                self.flow.fail(e.user_message())?;
                return Err(e);
            }
        };
        self.flow.intent_created(intent.client_secret, intent.payment_id)?;
        self.flow.show_card_form()?;

        debug!(dar_id = %dar_id, amount = amount, round = round_number, "Checkout ready");
        Ok(CheckoutSummary {
            dar_id,
            dar_name: dar.name,
            round_number,
            amount,
        })
    }

    /// Confirm the card with the processor, then acknowledge with the
    /// backend on a best-effort basis
    pub async fn pay(&mut self, payment_method: &str) -> Result<&PaymentFlowState> {
        let client_secret = self.flow.begin_confirm()?;
        let dar_id = self.flow.dar_id().to_string();

        match self.processor.confirm_card_payment(&client_secret, payment_method).await {
            Ok(confirmation) if confirmation.succeeded() => {}
            Ok(confirmation) => {
                let message = format!("Payment was not completed (status: {})", confirmation.status);
                self.flow.fail(message.clone())?;
                log_payment_event(&dar_id, self.flow.state().payment_id(), "processor_incomplete");
                return Err(PaymentError::Declined(message).into());
            }
            Err(e) => {
                self.flow.fail(e.user_message())?;
                log_payment_event(&dar_id, self.flow.state().payment_id(), "processor_failed");
                return Err(e);
            }
        }

        let payment_id = self.flow.state().payment_id().map(str::to_string);
        let acknowledged = match payment_id.as_deref() {
            Some(payment_id) => match self.payments.confirm_payment_success(payment_id).await {
                Ok(response) => {
                    debug!(payment_id = payment_id, status = %response.status, "Backend acknowledged payment");
                    true
                }
                Err(e) => {
                    warn!(
                        dar_id = %dar_id,
                        payment_id = payment_id,
                        error = %e,
                        "Backend confirmation failed, relying on webhook reconciliation"
                    );
                    false
                }
            },
            None => {
                warn!(dar_id = %dar_id, "No payment id returned, skipping backend confirmation");
                false
            }
        };

        self.flow.succeed(acknowledged)?;
        log_payment_event(&dar_id, payment_id.as_deref(), "succeeded");
        info!(dar_id = %dar_id, acknowledged = acknowledged, "Contribution paid");
        Ok(self.flow.state())
    }

    /// Return to the card form after a failure
    pub fn retry(&mut self) -> Result<()> {
        self.flow.retry()
    }

    pub fn reset(&mut self) {
        self.flow.reset();
    }

    pub fn success_redirect(&self) -> Option<String> {
        self.flow.success_redirect()
    }
}
