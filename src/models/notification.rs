//! Notification model

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::utils::helpers::{opt_string_or_number, string_or_number};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    PaymentDue,
    PaymentReceived,
    PayoutReady,
    DarInvitation,
    MemberJoined,
    MemberLeft,
    TourCompleted,
    Reminder,
    TrustScore,
    Message,
    #[serde(other)]
    System,
}

impl NotificationType {
    /// The user is expected to act on these
    pub fn requires_action(&self) -> bool {
        matches!(self, NotificationType::PaymentDue | NotificationType::DarInvitation)
    }

    pub fn is_informational(&self) -> bool {
        matches!(
            self,
            NotificationType::System | NotificationType::TourCompleted | NotificationType::MemberJoined
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::PaymentDue => "payment_due",
            NotificationType::PaymentReceived => "payment_received",
            NotificationType::PayoutReady => "payout_ready",
            NotificationType::DarInvitation => "dar_invitation",
            NotificationType::MemberJoined => "member_joined",
            NotificationType::MemberLeft => "member_left",
            NotificationType::TourCompleted => "tour_completed",
            NotificationType::Reminder => "reminder",
            NotificationType::System => "system",
            NotificationType::TrustScore => "trust_score",
            NotificationType::Message => "message",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl NotificationPriority {
    fn rank(&self) -> u8 {
        match self {
            NotificationPriority::Urgent => 0,
            NotificationPriority::High => 1,
            NotificationPriority::Medium => 2,
            NotificationPriority::Low => 3,
        }
    }
}

/// Order notifications so that the most urgent come first
pub fn compare_priority(a: NotificationPriority, b: NotificationPriority) -> Ordering {
    a.rank().cmp(&b.rank())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub priority: NotificationPriority,
    #[serde(default, alias = "read")]
    pub is_read: bool,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub action_url: Option<String>,
    #[serde(default)]
    pub action_label: Option<String>,
    #[serde(default)]
    pub related_entity_type: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub related_entity_id: Option<String>,
    pub created_date: String,
    #[serde(default)]
    pub read_date: Option<String>,
}

/// Server-side filter for notification listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationFilter {
    pub kind: Option<NotificationType>,
    pub is_read: Option<bool>,
}

impl NotificationFilter {
    pub fn unread() -> Self {
        Self { kind: None, is_read: Some(false) }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnreadCount {
    pub count: u64,
}

/// Counters for the notification center header
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSummary {
    pub unread_count: u64,
    #[serde(default)]
    pub total_count: u64,
    /// Keyed by the wire name of the notification type
    #[serde(default)]
    pub unread_by_type: HashMap<String, u64>,
    #[serde(default)]
    pub has_urgent: bool,
}

impl NotificationSummary {
    pub fn unread_of(&self, kind: NotificationType) -> u64 {
        self.unread_by_type.get(kind.as_str()).copied().unwrap_or(0)
    }
}

/// Related entity a notification can point at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelatedEntity {
    Dar,
    Payment,
    User,
    Contribution,
}

impl RelatedEntity {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelatedEntity::Dar => "dar",
            RelatedEntity::Payment => "payment",
            RelatedEntity::User => "user",
            RelatedEntity::Contribution => "contribution",
        }
    }
}

/// Delivery preferences of the current user
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationPreferences {
    #[serde(deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    #[serde(deserialize_with = "opt_string_or_number")]
    pub user_id: Option<String>,
    pub email_notifications: bool,
    pub push_notifications: bool,
    pub sms_notifications: bool,
    pub payment_reminders: bool,
    pub dar_updates: bool,
    pub member_activity: bool,
    pub marketing_emails: bool,
    pub weekly_digest: bool,
    pub instant_alerts: bool,
    pub quiet_hours_enabled: bool,
    pub quiet_hours_start: Option<String>,
    pub quiet_hours_end: Option<String>,
}

/// Partial preferences update; unset fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferencesUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_notifications: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_notifications: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sms_notifications: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_reminders: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dar_updates: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_activity: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marketing_emails: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekly_digest: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instant_alerts: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiet_hours_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiet_hours_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiet_hours_end: Option<String>,
}

/// Body of the bulk notification endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationIds {
    pub notification_ids: Vec<String>,
}
