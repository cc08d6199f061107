//! Payment and transaction models

use serde::{Deserialize, Serialize};

use crate::utils::helpers::{opt_string_or_number, string_or_number};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Contribution,
    Payout,
    Refund,
    Penalty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

/// A financial event recorded by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub dar_id: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: f64,
    pub status: TransactionStatus,
    pub date: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cycle_number: Option<u32>,
}

impl Transaction {
    /// Signed amount from the member's point of view
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionType::Contribution | TransactionType::Penalty => -self.amount,
            TransactionType::Payout | TransactionType::Refund => self.amount,
        }
    }
}

/// Contribution state of one member for one round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Pending,
    Overdue,
    Future,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn is_action_required(&self) -> bool {
        matches!(self, PaymentStatus::Pending | PaymentStatus::Overdue)
    }

    pub fn is_complete(&self) -> bool {
        *self == PaymentStatus::Paid
    }

    pub fn has_issue(&self) -> bool {
        matches!(self, PaymentStatus::Overdue | PaymentStatus::Failed)
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Overdue => "Overdue",
            PaymentStatus::Future => "Upcoming",
            PaymentStatus::Failed => "Failed",
            PaymentStatus::Refunded => "Refunded",
        }
    }
}

/// Processing state of a payment record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentRecordStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl PaymentRecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentRecordStatus::Pending => "pending",
            PaymentRecordStatus::Processing => "processing",
            PaymentRecordStatus::Completed => "completed",
            PaymentRecordStatus::Failed => "failed",
            PaymentRecordStatus::Cancelled => "cancelled",
            PaymentRecordStatus::Unknown => "unknown",
        }
    }
}

/// A payment in the user's history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub dar_id: String,
    #[serde(default)]
    pub dar_name: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub user_id: Option<String>,
    pub amount: f64,
    #[serde(default)]
    pub fee: f64,
    #[serde(default)]
    pub total_amount: Option<f64>,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub status: PaymentRecordStatus,
    #[serde(default)]
    pub payment_method_type: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub reference_number: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cycle_number: Option<u32>,
    #[serde(default)]
    pub scheduled_date: Option<String>,
    #[serde(default)]
    pub completed_date: Option<String>,
    pub created_date: String,
    #[serde(default)]
    pub failure_reason: Option<String>,
}

impl Payment {
    /// Amount charged including fees
    pub fn charged(&self) -> f64 {
        self.total_amount.unwrap_or(self.amount + self.fee)
    }
}

/// Contribution state of one member for one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributionStatus {
    Pending,
    Paid,
    Overdue,
    Waived,
    #[serde(other)]
    Unknown,
}

impl ContributionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContributionStatus::Pending => "pending",
            ContributionStatus::Paid => "paid",
            ContributionStatus::Overdue => "overdue",
            ContributionStatus::Waived => "waived",
            ContributionStatus::Unknown => "unknown",
        }
    }

    /// Still owed by the member
    pub fn is_outstanding(&self) -> bool {
        matches!(self, ContributionStatus::Pending | ContributionStatus::Overdue)
    }
}

/// What a member owes for one cycle of a Dar
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub dar_id: String,
    #[serde(default)]
    pub dar_name: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    pub cycle_number: u32,
    pub amount: f64,
    pub due_date: String,
    #[serde(default)]
    pub paid_date: Option<String>,
    pub status: ContributionStatus,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub reminder_sent: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NextPaymentDue {
    #[serde(deserialize_with = "string_or_number")]
    pub dar_id: String,
    #[serde(default)]
    pub dar_name: Option<String>,
    pub amount: f64,
    pub due_date: String,
}

/// Totals shown on the payments dashboard
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    #[serde(default)]
    pub total_contributions: f64,
    #[serde(default)]
    pub total_payouts: f64,
    #[serde(default)]
    pub pending_contributions: u32,
    #[serde(default)]
    pub overdue_contributions: u32,
    #[serde(default)]
    pub next_payment_due: Option<NextPaymentDue>,
    #[serde(default)]
    pub recent_payments: Vec<Payment>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PendingPaymentsCheck {
    pub has_pending: bool,
    #[serde(default)]
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentRequest {
    pub dart_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentResponse {
    pub client_secret: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub payment_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfirmPaymentResponse {
    pub status: String,
}
