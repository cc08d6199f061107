//! User service implementation
//!
//! Trust score lookups. The signed-in user's score is kept in a store so
//! profile and dashboard views share one copy.

use tracing::debug;

use crate::models::user::{TrustPeriod, TrustScore, TrustScoreHistory};
use crate::services::api::ApiClient;
use crate::state::Store;
use crate::utils::errors::Result;

/// Service for user trust scores
#[derive(Debug, Clone)]
pub struct UserService {
    api: ApiClient,
    trust_score: Store<Option<TrustScore>>,
}

impl UserService {
    /// Create a new UserService instance
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            trust_score: Store::default(),
        }
    }

    /// The signed-in user's last fetched trust score
    pub fn trust_score(&self) -> &Store<Option<TrustScore>> {
        &self.trust_score
    }

    pub fn clear_cache(&self) {
        self.trust_score.set(None);
    }

    /// Trust score of `user_id`, or of the signed-in user when `None`.
    /// Only the signed-in user's score is stored.
    pub async fn get_trust_score(&self, user_id: Option<&str>) -> Result<TrustScore> {
        match user_id {
            None => {
                let score: TrustScore = self.api.get("/trust/me", &[]).await?;
                debug!(score = score.score, level = ?score.level(), "Trust score loaded");
                self.trust_score.set(Some(score.clone()));
                Ok(score)
            }
            Some(id) => self.api.get(&format!("/trust/{}", id), &[]).await,
        }
    }

    /// Score changes over `period`, for `user_id` or the signed-in user
    pub async fn get_trust_score_history(
        &self,
        user_id: Option<&str>,
        period: TrustPeriod,
    ) -> Result<Vec<TrustScoreHistory>> {
        let path = match user_id {
            Some(id) => format!("/trust/{}/history", id),
            None => "/trust/me/history".to_string(),
        };
        self.api.get(&path, &[("period", period.as_str().to_string())]).await
    }
}
