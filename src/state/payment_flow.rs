//! Payment confirmation flow
//!
//! The two-phase contribution payment moves through
//! `idle -> intent-created -> card-form-shown -> confirming -> success | failure`.
//! Every transition is checked; out-of-order calls are rejected.

use serde::{Deserialize, Serialize};

use crate::utils::errors::{Result, TontinError};

/// Current step of a payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum PaymentFlowState {
    Idle,
    IntentCreated {
        client_secret: String,
        payment_id: Option<String>,
    },
    CardFormShown {
        client_secret: String,
        payment_id: Option<String>,
    },
    Confirming {
        client_secret: String,
        payment_id: Option<String>,
    },
    Success {
        payment_id: Option<String>,
        /// False when the backend did not acknowledge the confirmation
        backend_acknowledged: bool,
    },
    Failure {
        message: String,
        client_secret: Option<String>,
        payment_id: Option<String>,
    },
}

impl PaymentFlowState {
    pub fn name(&self) -> &'static str {
        match self {
            PaymentFlowState::Idle => "idle",
            PaymentFlowState::IntentCreated { .. } => "intent-created",
            PaymentFlowState::CardFormShown { .. } => "card-form-shown",
            PaymentFlowState::Confirming { .. } => "confirming",
            PaymentFlowState::Success { .. } => "success",
            PaymentFlowState::Failure { .. } => "failure",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentFlowState::Success { .. } | PaymentFlowState::Failure { .. })
    }

    pub fn payment_id(&self) -> Option<&str> {
        match self {
            PaymentFlowState::Idle => None,
            PaymentFlowState::IntentCreated { payment_id, .. }
            | PaymentFlowState::CardFormShown { payment_id, .. }
            | PaymentFlowState::Confirming { payment_id, .. }
            | PaymentFlowState::Success { payment_id, .. }
            | PaymentFlowState::Failure { payment_id, .. } => payment_id.as_deref(),
        }
    }
}

/// State machine for one contribution payment
#[derive(Debug, Clone)]
pub struct PaymentFlow {
    dar_id: String,
    state: PaymentFlowState,
}

impl PaymentFlow {
    pub fn new(dar_id: impl Into<String>) -> Self {
        Self {
            dar_id: dar_id.into(),
            state: PaymentFlowState::Idle,
        }
    }

    pub fn dar_id(&self) -> &str {
        &self.dar_id
    }

    pub fn state(&self) -> &PaymentFlowState {
        &self.state
    }

    fn invalid(&self, to: &str) -> TontinError {
        TontinError::InvalidStateTransition {
            from: self.state.name().to_string(),
            to: to.to_string(),
        }
    }

    /// Check that a new intent may be requested.
    ///
    /// Only an idle flow may start. A failure that never got an intent is
    /// reset to idle first; any other state is rejected before a request
    /// is made.
    pub fn ensure_can_start(&mut self) -> Result<()> {
        match self.state {
            PaymentFlowState::Idle => Ok(()),
            PaymentFlowState::Failure { client_secret: None, .. } => {
                self.reset();
                Ok(())
            }
            _ => Err(self.invalid("intent-created")),
        }
    }

    /// idle -> intent-created
    pub fn intent_created(&mut self, client_secret: String, payment_id: Option<String>) -> Result<()> {
        match self.state {
            PaymentFlowState::Idle => {
                self.state = PaymentFlowState::IntentCreated { client_secret, payment_id };
                Ok(())
            }
            _ => Err(self.invalid("intent-created")),
        }
    }

    /// intent-created -> card-form-shown
    pub fn show_card_form(&mut self) -> Result<()> {
        match &self.state {
            PaymentFlowState::IntentCreated { client_secret, payment_id } => {
                self.state = PaymentFlowState::CardFormShown {
                    client_secret: client_secret.clone(),
                    payment_id: payment_id.clone(),
                };
                Ok(())
            }
            _ => Err(self.invalid("card-form-shown")),
        }
    }

    /// card-form-shown -> confirming; returns the client secret to confirm
    pub fn begin_confirm(&mut self) -> Result<String> {
        match &self.state {
            PaymentFlowState::CardFormShown { client_secret, payment_id } => {
                let secret = client_secret.clone();
                self.state = PaymentFlowState::Confirming {
                    client_secret: secret.clone(),
                    payment_id: payment_id.clone(),
                };
                Ok(secret)
            }
            _ => Err(self.invalid("confirming")),
        }
    }

    /// confirming -> success
    pub fn succeed(&mut self, backend_acknowledged: bool) -> Result<()> {
        match &self.state {
            PaymentFlowState::Confirming { payment_id, .. } => {
                self.state = PaymentFlowState::Success {
                    payment_id: payment_id.clone(),
                    backend_acknowledged,
                };
                Ok(())
            }
            _ => Err(self.invalid("success")),
        }
    }

    /// Any non-terminal state -> failure
    pub fn fail(&mut self, message: impl Into<String>) -> Result<()> {
        let (client_secret, payment_id) = match &self.state {
            PaymentFlowState::Idle => (None, None),
            PaymentFlowState::IntentCreated { client_secret, payment_id }
            | PaymentFlowState::CardFormShown { client_secret, payment_id }
            | PaymentFlowState::Confirming { client_secret, payment_id } => {
                (Some(client_secret.clone()), payment_id.clone())
            }
            PaymentFlowState::Success { .. } | PaymentFlowState::Failure { .. } => {
                return Err(self.invalid("failure"));
            }
        };
        self.state = PaymentFlowState::Failure {
            message: message.into(),
            client_secret,
            payment_id,
        };
        Ok(())
    }

    /// failure -> card-form-shown when the intent can be reused
    pub fn retry(&mut self) -> Result<()> {
        match &self.state {
            PaymentFlowState::Failure { client_secret: Some(secret), payment_id, .. } => {
                self.state = PaymentFlowState::CardFormShown {
                    client_secret: secret.clone(),
                    payment_id: payment_id.clone(),
                };
                Ok(())
            }
            _ => Err(self.invalid("card-form-shown")),
        }
    }

    pub fn reset(&mut self) {
        self.state = PaymentFlowState::Idle;
    }

    /// Where to navigate after a successful payment
    pub fn success_redirect(&self) -> Option<String> {
        match self.state {
            PaymentFlowState::Success { .. } => {
                Some(format!("/dashboard/client/dar/{}?payment=success", self.dar_id))
            }
            _ => None,
        }
    }
}
