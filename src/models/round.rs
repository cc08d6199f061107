//! Round model
//!
//! A round is one payout cycle of a Dar with a single recipient.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::helpers::{opt_string_or_number, parse_timestamp, string_or_number};

/// Days before the round date when contributions open
pub const PAYMENT_WINDOW_DAYS: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RoundStatus {
    Payed,
    Inpayed,
}

impl RoundStatus {
    pub fn is_paid(&self) -> bool {
        *self == RoundStatus::Payed
    }

    pub fn label(&self) -> &'static str {
        match self {
            RoundStatus::Payed => "Paid",
            RoundStatus::Inpayed => "Unpaid",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub number: u32,
    pub status: RoundStatus,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub amount: f64,
    #[serde(deserialize_with = "string_or_number")]
    pub dart_id: String,
    #[serde(default)]
    pub dart_name: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub recipient_member_id: Option<String>,
    #[serde(default)]
    pub recipient_member_name: Option<String>,
    #[serde(default)]
    pub recipient_member_email: Option<String>,
    #[serde(default)]
    pub paid_member_ids: Vec<String>,
    #[serde(default)]
    pub payment_open_date: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Round {
    pub fn has_member_paid(&self, member_id: &str) -> bool {
        self.paid_member_ids.iter().any(|id| id == member_id)
    }

    /// When contributions for this round are accepted.
    ///
    /// Falls back to [`PAYMENT_WINDOW_DAYS`] before the round date.
    pub fn payment_opens_at(&self) -> Option<DateTime<Utc>> {
        if let Some(open) = self.payment_open_date.as_deref().and_then(parse_timestamp) {
            return Some(open);
        }
        self.date
            .as_deref()
            .and_then(parse_timestamp)
            .map(|date| date - Duration::days(PAYMENT_WINDOW_DAYS))
    }

    pub fn is_payment_window_open(&self, now: DateTime<Utc>) -> bool {
        !self.status.is_paid() && self.payment_opens_at().map(|open| now >= open).unwrap_or(true)
    }
}

/// Sort rounds by their cycle number
pub fn sort_rounds(rounds: &mut [Round]) {
    rounds.sort_by_key(|round| round.number);
}

/// Aggregate counters for the rounds of a Dar
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundStatistics {
    pub total_rounds: u32,
    pub paid_rounds: u32,
    pub unpaid_rounds: u32,
    #[serde(default)]
    pub current_round_number: Option<u32>,
}

impl RoundStatistics {
    /// Compute statistics from a list of rounds
    pub fn from_rounds(rounds: &[Round]) -> Self {
        let paid = rounds.iter().filter(|r| r.status.is_paid()).count() as u32;
        let current = rounds
            .iter()
            .filter(|r| !r.status.is_paid())
            .map(|r| r.number)
            .min();

        Self {
            total_rounds: rounds.len() as u32,
            paid_rounds: paid,
            unpaid_rounds: rounds.len() as u32 - paid,
            current_round_number: current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn round(number: u32, status: RoundStatus) -> Round {
        Round {
            id: format!("r{}", number),
            number,
            status,
            date: Some("2024-02-10T00:00:00".to_string()),
            amount: 1500.0,
            dart_id: "d1".to_string(),
            dart_name: None,
            recipient_member_id: None,
            recipient_member_name: None,
            recipient_member_email: None,
            paid_member_ids: vec!["m1".to_string()],
            payment_open_date: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_sort_and_statistics() {
        let mut rounds = vec![
            round(3, RoundStatus::Inpayed),
            round(1, RoundStatus::Payed),
            round(2, RoundStatus::Inpayed),
        ];
        sort_rounds(&mut rounds);
        let numbers: Vec<u32> = rounds.iter().map(|r| r.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);

        let stats = RoundStatistics::from_rounds(&rounds);
        assert_eq!(stats.total_rounds, 3);
        assert_eq!(stats.paid_rounds, 1);
        assert_eq!(stats.unpaid_rounds, 2);
        assert_eq!(stats.current_round_number, Some(2));
    }

    #[test]
    fn test_payment_window() {
        let r = round(1, RoundStatus::Inpayed);
        let before = Utc.with_ymd_and_hms(2024, 2, 4, 0, 0, 0).unwrap();
        let inside = Utc.with_ymd_and_hms(2024, 2, 5, 0, 0, 0).unwrap();
        assert!(!r.is_payment_window_open(before));
        assert!(r.is_payment_window_open(inside));
        assert!(r.has_member_paid("m1"));
        assert!(!r.has_member_paid("m2"));
    }

    #[test]
    fn test_status_wire_format() {
        let json = r#"{"id":"r1","number":1,"status":"INPAYED","amount":100.0,"dartId":"d1"}"#;
        let parsed: Round = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.status, RoundStatus::Inpayed);
        assert_eq!(serde_json::to_string(&RoundStatus::Payed).unwrap(), "\"PAYED\"");
    }
}
