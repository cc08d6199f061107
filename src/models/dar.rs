//! Dar (rotating savings fund) model

use serde::{Deserialize, Serialize};

use crate::utils::errors::{Result, TontinError};
use crate::utils::helpers::{is_valid_email, opt_string_or_number, string_or_number};
use super::member::Member;
use super::payment::Transaction;

/// Lifecycle status of a Dar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DarStatus {
    #[serde(rename = "pending", alias = "PENDING")]
    Pending,
    #[serde(rename = "active", alias = "ACTIVE")]
    Active,
    #[serde(rename = "completed", alias = "COMPLETED", alias = "FINISHED", alias = "finished")]
    Completed,
    #[serde(rename = "cancelled", alias = "CANCELLED", alias = "CANCELED")]
    Cancelled,
    /// A status this client does not know yet; never transitions
    #[serde(other)]
    Unknown,
}

impl DarStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DarStatus::Pending => "Pending",
            DarStatus::Active => "Active",
            DarStatus::Completed => "Completed",
            DarStatus::Cancelled => "Cancelled",
            DarStatus::Unknown => "Unknown",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DarStatus::Pending => "pending",
            DarStatus::Active => "active",
            DarStatus::Completed => "completed",
            DarStatus::Cancelled => "cancelled",
            DarStatus::Unknown => "unknown",
        }
    }

    /// Completed and cancelled Dars never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, DarStatus::Completed | DarStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: DarStatus) -> bool {
        matches!(
            (self, next),
            (DarStatus::Pending, DarStatus::Active)
                | (DarStatus::Pending, DarStatus::Cancelled)
                | (DarStatus::Active, DarStatus::Completed)
                | (DarStatus::Active, DarStatus::Cancelled)
        )
    }
}

impl std::fmt::Display for DarStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who can discover and join a Dar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Visibility {
    #[serde(rename = "public", alias = "PUBLIC")]
    Public,
    #[default]
    #[serde(rename = "private", alias = "PRIVATE")]
    Private,
    #[serde(rename = "invite-only", alias = "INVITE_ONLY")]
    InviteOnly,
}

/// Contribution frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaymentFrequency {
    #[serde(rename = "weekly", alias = "WEEKLY")]
    Weekly,
    #[serde(rename = "bi-weekly", alias = "BI_WEEKLY", alias = "BIWEEKLY")]
    BiWeekly,
    #[default]
    #[serde(rename = "monthly", alias = "MONTHLY")]
    Monthly,
    #[serde(rename = "quarterly", alias = "QUARTERLY")]
    Quarterly,
}

impl PaymentFrequency {
    /// Length of one cycle in days
    pub fn days(&self) -> i64 {
        match self {
            PaymentFrequency::Weekly => 7,
            PaymentFrequency::BiWeekly => 14,
            PaymentFrequency::Monthly => 30,
            PaymentFrequency::Quarterly => 90,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentFrequency::Weekly => "Weekly",
            PaymentFrequency::BiWeekly => "Bi-weekly",
            PaymentFrequency::Monthly => "Monthly",
            PaymentFrequency::Quarterly => "Quarterly",
        }
    }
}

/// How the payout order is decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderMethod {
    #[default]
    FixedOrder,
    RandomOnce,
    BiddingModel,
    #[serde(rename = "DYNAMIQUE_RANDOM")]
    DynamicRandom,
}

impl OrderMethod {
    pub fn label(&self) -> &'static str {
        match self {
            OrderMethod::FixedOrder => "Fixed order",
            OrderMethod::RandomOnce => "Random (drawn once)",
            OrderMethod::BiddingModel => "Bidding",
            OrderMethod::DynamicRandom => "Random (drawn each round)",
        }
    }
}

/// A rotating savings fund as seen by the current user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dar {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    pub status: DarStatus,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub organizer_id: Option<String>,
    #[serde(default)]
    pub organizer_name: Option<String>,
    #[serde(default, alias = "createdAt")]
    pub created_date: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub current_cycle: u32,
    #[serde(default)]
    pub total_cycles: u32,
    #[serde(default)]
    pub member_count: u32,
    #[serde(default)]
    pub max_members: Option<u32>,
    #[serde(default, alias = "contributionAmount")]
    pub monthly_contribution: f64,
    #[serde(default, alias = "potSize")]
    pub total_monthly_pool: f64,
    #[serde(default)]
    pub payment_frequency: PaymentFrequency,
    #[serde(default)]
    pub order_method: OrderMethod,
    #[serde(default)]
    pub next_payout_date: Option<String>,
    #[serde(default)]
    pub next_payout_recipient: Option<String>,
    #[serde(default)]
    pub is_organizer: bool,
    #[serde(default)]
    pub is_member: bool,
    #[serde(default)]
    pub user_permission: Option<String>,
    #[serde(default)]
    pub user_member_status: Option<String>,
    #[serde(default)]
    pub invite_code: Option<String>,
    #[serde(default, alias = "customRules")]
    pub rules: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
}

impl Dar {
    /// Check the cycle and capacity counters.
    ///
    /// A `total_cycles` of 0 means the schedule is not known yet; the
    /// cycle bound is only checked once it is set.
    pub fn check_invariants(&self) -> Result<()> {
        if self.total_cycles > 0 && self.current_cycle > self.total_cycles {
            return Err(TontinError::InvariantViolation(format!(
                "Dar {} is at cycle {} of {}",
                self.id, self.current_cycle, self.total_cycles
            )));
        }

        if let Some(max) = self.max_members {
            if self.member_count > max {
                return Err(TontinError::InvariantViolation(format!(
                    "Dar {} has {} members but allows {}",
                    self.id, self.member_count, max
                )));
            }
        }

        Ok(())
    }

    pub fn remaining_cycles(&self) -> u32 {
        self.total_cycles.saturating_sub(self.current_cycle)
    }

    /// Share of completed cycles, 0 to 100
    pub fn progress_percent(&self) -> u8 {
        if self.total_cycles == 0 {
            return 0;
        }
        let done = self.current_cycle.min(self.total_cycles) as u64;
        ((done * 100) / self.total_cycles as u64) as u8
    }

    pub fn is_full(&self) -> bool {
        self.max_members.map(|max| self.member_count >= max).unwrap_or(false)
    }

    /// Whether the organizer may start the fund now
    pub fn can_start(&self) -> bool {
        self.status == DarStatus::Pending && self.member_count >= DarLimits::MIN_MEMBERS
    }
}

/// A Dar together with its related collections
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DarDetails {
    #[serde(flatten)]
    pub dar: Dar,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub tours: Vec<Tour>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub messages: Vec<DarMessage>,
}

/// Status of a payout turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TourStatus {
    Upcoming,
    InProgress,
    Completed,
    Skipped,
    #[serde(other)]
    Unknown,
}

/// One payout turn in the schedule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub cycle_number: u32,
    #[serde(deserialize_with = "string_or_number")]
    pub recipient_id: String,
    #[serde(default)]
    pub recipient_name: Option<String>,
    pub scheduled_date: String,
    #[serde(default)]
    pub payout_date: Option<String>,
    pub amount: f64,
    pub status: TourStatus,
}

/// Chat message posted in a Dar
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DarMessage {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub dar_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub user_id: String,
    pub user_name: String,
    pub content: String,
    pub timestamp: String,
    #[serde(default)]
    pub is_system_message: bool,
}

/// Aggregates shown on a Dar dashboard
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DarStats {
    #[serde(default)]
    pub total_contributed: f64,
    #[serde(default)]
    pub total_paid_out: f64,
    #[serde(default)]
    pub active_members: u32,
    #[serde(default)]
    pub pending_members: u32,
    #[serde(default)]
    pub completed_tours: u32,
    #[serde(default)]
    pub remaining_tours: u32,
    #[serde(default)]
    pub average_trust_score: Option<f64>,
}

/// Page sizes used by Dar listings
pub struct DarPagination;

impl DarPagination {
    pub const DEFAULT_PAGE_SIZE: u32 = 20;
    pub const TRANSACTIONS_PAGE_SIZE: u32 = 20;
    pub const MESSAGES_PAGE_SIZE: u32 = 50;
    pub const MAX_PAGE_SIZE: u32 = 100;

    /// Clamp a requested page size to the accepted range
    pub fn clamp(size: u32) -> u32 {
        size.clamp(1, Self::MAX_PAGE_SIZE)
    }
}

/// Limits enforced on Dar forms
pub struct DarLimits;

impl DarLimits {
    pub const MIN_MEMBERS: u32 = 2;
    pub const MAX_MEMBERS: u32 = 50;
    pub const MIN_CONTRIBUTION: f64 = 1_000.0;
    pub const MAX_CONTRIBUTION: f64 = 10_000_000.0;
    pub const NAME_MIN_LENGTH: usize = 3;
    pub const NAME_MAX_LENGTH: usize = 100;
    pub const DESCRIPTION_MAX_LENGTH: usize = 500;
    pub const RULES_MAX_LENGTH: usize = 2_000;
    pub const MESSAGE_MAX_LENGTH: usize = 1_000;
}

/// Trust score classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustLevel {
    Excellent,
    Good,
    Acceptable,
    Low,
    Warning,
}

pub struct TrustThresholds;

impl TrustThresholds {
    pub const MIN_RECOMMENDED: u8 = 60;
    pub const GOOD: u8 = 75;
    pub const EXCELLENT: u8 = 90;
    pub const WARNING: u8 = 50;

    pub fn classify(score: u8) -> TrustLevel {
        match score {
            s if s >= Self::EXCELLENT => TrustLevel::Excellent,
            s if s >= Self::GOOD => TrustLevel::Good,
            s if s >= Self::MIN_RECOMMENDED => TrustLevel::Acceptable,
            s if s >= Self::WARNING => TrustLevel::Low,
            _ => TrustLevel::Warning,
        }
    }
}

fn check_length(field: &str, value: &str, min: usize, max: usize) -> Result<()> {
    let length = value.trim().chars().count();
    if length < min || length > max {
        return Err(TontinError::InvalidInput(format!(
            "{} must be between {} and {} characters",
            field, min, max
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateDarRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub monthly_contribution: f64,
    pub payment_frequency: PaymentFrequency,
    pub order_method: OrderMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_rules: Option<String>,
}

impl CreateDarRequest {
    pub fn validate(&self) -> Result<()> {
        check_length("Name", &self.name, DarLimits::NAME_MIN_LENGTH, DarLimits::NAME_MAX_LENGTH)?;
        if let Some(description) = &self.description {
            check_length("Description", description, 0, DarLimits::DESCRIPTION_MAX_LENGTH)?;
        }
        if let Some(rules) = &self.custom_rules {
            check_length("Rules", rules, 0, DarLimits::RULES_MAX_LENGTH)?;
        }
        if !(DarLimits::MIN_CONTRIBUTION..=DarLimits::MAX_CONTRIBUTION).contains(&self.monthly_contribution) {
            return Err(TontinError::InvalidInput(format!(
                "Contribution must be between {} and {}",
                DarLimits::MIN_CONTRIBUTION, DarLimits::MAX_CONTRIBUTION
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDarRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
}

impl UpdateDarRequest {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            check_length("Name", name, DarLimits::NAME_MIN_LENGTH, DarLimits::NAME_MAX_LENGTH)?;
        }
        if let Some(description) = &self.description {
            check_length("Description", description, 0, DarLimits::DESCRIPTION_MAX_LENGTH)?;
        }
        if let Some(rules) = &self.rules {
            check_length("Rules", rules, 0, DarLimits::RULES_MAX_LENGTH)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JoinDarRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dar_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_code: Option<String>,
}

impl JoinDarRequest {
    pub fn by_invite_code(code: impl Into<String>) -> Self {
        Self { dar_id: None, invite_code: Some(code.into()) }
    }

    pub fn by_id(dar_id: impl Into<String>) -> Self {
        Self { dar_id: Some(dar_id.into()), invite_code: None }
    }

    pub fn validate(&self) -> Result<()> {
        let has_id = self.dar_id.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false);
        let has_code = self.invite_code.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false);
        if !has_id && !has_code {
            return Err(TontinError::InvalidInput(
                "A Dar id or an invite code is required".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InviteMemberRequest {
    pub dar_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl InviteMemberRequest {
    pub fn validate(&self) -> Result<()> {
        match (&self.email, &self.user_id) {
            (Some(email), None) if is_valid_email(email) => Ok(()),
            (Some(email), None) => Err(TontinError::InvalidInput(format!("Invalid email address: {}", email))),
            (None, Some(user_id)) if !user_id.trim().is_empty() => Ok(()),
            _ => Err(TontinError::InvalidInput(
                "Provide either an email or a user id".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MemberOrder {
    pub member_id: String,
    pub order: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTurnOrderRequest {
    pub member_order: Vec<MemberOrder>,
}

impl UpdateTurnOrderRequest {
    /// Orders must be unique and run from 1 without gaps
    pub fn validate(&self) -> Result<()> {
        let mut orders: Vec<u32> = self.member_order.iter().map(|m| m.order).collect();
        orders.sort_unstable();
        let contiguous = orders.iter().enumerate().all(|(i, order)| *order == i as u32 + 1);
        if !contiguous {
            return Err(TontinError::InvalidInput(
                "Turn order positions must be unique and start at 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportMemberRequest {
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub content: String,
}

impl SendMessageRequest {
    pub fn validate(&self) -> Result<()> {
        check_length("Message", &self.content, 1, DarLimits::MESSAGE_MAX_LENGTH)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateInviteCodeResponse {
    pub invite_code: String,
}
