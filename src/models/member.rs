//! Member model
//!
//! A member links a user to a Dar. Participation status is tracked here
//! and is independent of payment state.

use serde::{Deserialize, Serialize};

use crate::utils::errors::{Result, TontinError};
use crate::utils::helpers::string_or_number;

/// Role of a member inside a Dar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberRole {
    #[serde(rename = "organizer", alias = "ORGANIZER")]
    Organizer,
    #[serde(rename = "co-organizer", alias = "CO_ORGANIZER")]
    CoOrganizer,
    #[serde(rename = "member", alias = "MEMBER")]
    Member,
    /// Unrecognised role; grants nothing
    #[serde(other)]
    Unknown,
}

impl MemberRole {
    pub fn has_admin_privileges(&self) -> bool {
        matches!(self, MemberRole::Organizer | MemberRole::CoOrganizer)
    }

    pub fn can_manage_members(&self) -> bool {
        *self == MemberRole::Organizer
    }

    pub fn can_edit_settings(&self) -> bool {
        *self == MemberRole::Organizer
    }

    pub fn can_delete_dar(&self) -> bool {
        *self == MemberRole::Organizer
    }

    pub fn can_invite(&self) -> bool {
        self.has_admin_privileges()
    }

    pub fn can_send_messages(&self) -> bool {
        true
    }

    pub fn label(&self) -> &'static str {
        match self {
            MemberRole::Organizer => "Organizer",
            MemberRole::CoOrganizer => "Co-organizer",
            MemberRole::Member | MemberRole::Unknown => "Member",
        }
    }
}

/// Participation status of a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MemberStatus {
    Pending,
    Active,
    Leaved,
    #[serde(other)]
    Unknown,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Pending => "PENDING",
            MemberStatus::Active => "ACTIVE",
            MemberStatus::Leaved => "LEAVED",
            MemberStatus::Unknown => "UNKNOWN",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MemberStatus::Pending => "Invitation pending",
            MemberStatus::Active => "Active",
            MemberStatus::Leaved => "Left",
            MemberStatus::Unknown => "Unknown",
        }
    }

    /// Only PENDING -> ACTIVE and PENDING/ACTIVE -> LEAVED are allowed
    pub fn can_transition_to(&self, next: MemberStatus) -> bool {
        matches!(
            (self, next),
            (MemberStatus::Pending, MemberStatus::Active)
                | (MemberStatus::Pending, MemberStatus::Leaved)
                | (MemberStatus::Active, MemberStatus::Leaved)
        )
    }

    /// Validate a transition and return the new status
    pub fn transition(self, next: MemberStatus) -> Result<MemberStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TontinError::InvalidStateTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }

    /// Members in this status take part in the payout rotation
    pub fn is_in_rotation(&self) -> bool {
        matches!(self, MemberStatus::Pending | MemberStatus::Active)
    }
}

impl std::fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub user_id: String,
    pub user_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(alias = "permission")]
    pub role: MemberRole,
    pub status: MemberStatus,
    #[serde(default, alias = "joinedAt")]
    pub joined_date: Option<String>,
    #[serde(default)]
    pub turn_order: Option<u32>,
    #[serde(default)]
    pub turn_date: Option<String>,
    #[serde(default)]
    pub trust_score: Option<u8>,
}

/// The member list of one Dar
#[derive(Debug, Clone, Default)]
pub struct Roster {
    members: Vec<Member>,
}

impl Roster {
    pub fn new(members: Vec<Member>) -> Self {
        Self { members }
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn organizer(&self) -> Option<&Member> {
        self.members.iter().find(|m| m.role == MemberRole::Organizer)
    }

    pub fn find(&self, member_id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.id == member_id)
    }

    pub fn find_by_user(&self, user_id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.user_id == user_id)
    }

    /// A Dar has exactly one organizer and trust scores stay within 0..=100
    pub fn check_invariants(&self) -> Result<()> {
        let organizers = self.members.iter().filter(|m| m.role == MemberRole::Organizer).count();
        if organizers != 1 {
            return Err(TontinError::InvariantViolation(format!(
                "expected exactly one organizer, found {}",
                organizers
            )));
        }

        if let Some(member) = self.members.iter().find(|m| m.trust_score.map(|s| s > 100).unwrap_or(false)) {
            return Err(TontinError::InvariantViolation(format!(
                "trust score of member {} is out of range",
                member.id
            )));
        }

        Ok(())
    }

    /// Members still in the rotation, in payout order.
    ///
    /// LEAVED members are excluded; members without a position go last.
    pub fn active_turn_order(&self) -> Vec<&Member> {
        let mut rotation: Vec<&Member> = self
            .members
            .iter()
            .filter(|m| m.status.is_in_rotation())
            .collect();
        rotation.sort_by_key(|m| (m.turn_order.is_none(), m.turn_order, m.user_name.clone()));
        rotation
    }

    pub fn active_count(&self) -> usize {
        self.members.iter().filter(|m| m.status == MemberStatus::Active).count()
    }

    pub fn pending_count(&self) -> usize {
        self.members.iter().filter(|m| m.status == MemberStatus::Pending).count()
    }
}
