//! User model and authentication payloads

use serde::{Deserialize, Serialize};

use crate::utils::helpers::{opt_string_or_number, string_or_number};

use super::dar::{TrustLevel, TrustThresholds};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(alias = "username")]
    pub user_name: String,
    pub email: String,
    /// Role string as sent by the backend, e.g. `ROLE_CLIENT` or `ADMIN`
    pub role: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub email_confirmed: Option<bool>,
    #[serde(default)]
    pub creation_date: Option<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        is_admin_role(&self.role)
    }
}

/// ADMIN and ROLE_ADMIN, in any case
pub fn is_admin_role(role: &str) -> bool {
    let upper = role.trim().to_ascii_uppercase();
    upper == "ADMIN" || upper == "ROLE_ADMIN"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub user_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenRequest {
    pub token: String,
}

/// Token pair returned by login, register and refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(alias = "accessToken")]
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

/// Trust score of a user with its breakdown and recent history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrustScore {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub user_id: Option<String>,
    pub score: f64,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub total_users: Option<u32>,
    #[serde(default)]
    pub percentile: Option<f64>,
    #[serde(default)]
    pub breakdown: TrustScoreBreakdown,
    #[serde(default)]
    pub history: Vec<TrustScoreHistory>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

impl TrustScore {
    pub fn level(&self) -> TrustLevel {
        TrustThresholds::classify(self.score.round().clamp(0.0, 100.0) as u8)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TrustScoreBreakdown {
    pub payment_history: f64,
    pub dar_participation: f64,
    pub community_reputation: f64,
    pub account_age: f64,
    pub verification_level: f64,
    pub penalty_deductions: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrustScoreHistory {
    pub date: String,
    pub score: f64,
    #[serde(default)]
    pub change: f64,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Window of the trust score history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustPeriod {
    Week,
    #[default]
    Month,
    Year,
    All,
}

impl TrustPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrustPeriod::Week => "week",
            TrustPeriod::Month => "month",
            TrustPeriod::Year => "year",
            TrustPeriod::All => "all",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_roles() {
        assert!(is_admin_role("ADMIN"));
        assert!(is_admin_role("role_admin"));
        assert!(!is_admin_role("ROLE_CLIENT"));
        assert!(!is_admin_role("ADMINISTRATOR"));
    }

    #[test]
    fn test_login_response() {
        let json = r#"{
            "token": "abc",
            "refreshToken": "def",
            "user": {"id": "u1", "userName": "jane", "email": "jane@x.com", "role": "ROLE_CLIENT", "status": "ACTIVE"}
        }"#;
        let response: AuthResponse = serde_json::from_str(json).unwrap();
        let user = response.user.unwrap();
        assert_eq!(user.role, "ROLE_CLIENT");
        assert!(!user.is_admin());
        assert_eq!(response.refresh_token.as_deref(), Some("def"));
    }

    #[test]
    fn test_trust_score_level() {
        let json = r#"{"userId":5,"score":91.6,"rank":3,"breakdown":{"paymentHistory":40.0}}"#;
        let trust: TrustScore = serde_json::from_str(json).unwrap();
        assert_eq!(trust.user_id.as_deref(), Some("5"));
        assert_eq!(trust.level(), TrustLevel::Excellent);
        assert_eq!(trust.breakdown.payment_history, 40.0);
        assert!(trust.history.is_empty());
    }
}
