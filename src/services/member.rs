//! Member service implementation
//!
//! Invitation answers are the only membership transitions a member drives
//! directly: PENDING -> ACTIVE on accept and PENDING/ACTIVE -> LEAVED on
//! decline or leave.

use serde::de::IgnoredAny;
use tracing::info;

use crate::models::member::{Member, MemberStatus};
use crate::services::api::ApiClient;
use crate::utils::errors::Result;
use crate::utils::logging::log_dar_action;

/// Service for a member's own participation in a Dar
#[derive(Debug, Clone)]
pub struct MemberService {
    api: ApiClient,
}

impl MemberService {
    /// Create a new MemberService instance
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Accept a pending invitation
    pub async fn accept_invitation(&self, dar_id: &str, current: MemberStatus) -> Result<MemberStatus> {
        let next = current.transition(MemberStatus::Active)?;
        let _: IgnoredAny = self
            .api
            .post(&format!("/v1/member/dart/{}/accept", dar_id), &serde_json::json!({}))
            .await?;

        log_dar_action(dar_id, "invitation_accepted", None);
        Ok(next)
    }

    /// Decline an invitation or leave an active membership
    pub async fn leave(&self, dar_id: &str, current: MemberStatus) -> Result<MemberStatus> {
        let next = current.transition(MemberStatus::Leaved)?;
        let _: IgnoredAny = self
            .api
            .post(&format!("/v1/member/dart/{}/leave", dar_id), &serde_json::json!({}))
            .await?;

        info!(dar_id = dar_id, from = %current, "Left Dar");
        Ok(next)
    }

    /// Decline a pending invitation
    pub async fn decline_invitation(&self, dar_id: &str) -> Result<MemberStatus> {
        self.leave(dar_id, MemberStatus::Pending).await
    }

    /// Apply an accept or leave to a member record
    pub async fn respond(&self, dar_id: &str, member: &mut Member, accept: bool) -> Result<()> {
        member.status = if accept {
            self.accept_invitation(dar_id, member.status).await?
        } else {
            self.leave(dar_id, member.status).await?
        };
        Ok(())
    }
}
