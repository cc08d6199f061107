//! Round service implementation

use tracing::{debug, info};

use crate::models::page::Page;
use crate::models::round::{sort_rounds, Round, RoundStatistics, RoundStatus};
use crate::services::api::ApiClient;
use crate::utils::errors::{Result, TontinError};

/// Read access to the payout rounds of a Dar
#[derive(Debug, Clone)]
pub struct RoundService {
    api: ApiClient,
}

impl RoundService {
    /// Create a new RoundService instance
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// All rounds of a Dar, ordered by number
    pub async fn get_rounds_by_dar(&self, dar_id: &str) -> Result<Vec<Round>> {
        debug!(dar_id = dar_id, "Fetching rounds");
        let mut rounds: Vec<Round> = self.api.get(&format!("/v1/rounds/dart/{}", dar_id), &[]).await?;
        sort_rounds(&mut rounds);
        Ok(rounds)
    }

    pub async fn get_rounds_paginated(&self, dar_id: &str, page: u32, size: u32) -> Result<Page<Round>> {
        let query = [("page", page.to_string()), ("size", size.to_string())];
        let mut result: Page<Round> = self
            .api
            .get(&format!("/v1/rounds/dart/{}/paginated", dar_id), &query)
            .await?;
        sort_rounds(&mut result.content);
        Ok(result)
    }

    pub async fn get_round(&self, dar_id: &str, round_id: &str) -> Result<Round> {
        self.api.get(&format!("/v1/rounds/dart/{}/{}", dar_id, round_id), &[]).await
    }

    /// The round currently collecting contributions, if any
    pub async fn get_current_round(&self, dar_id: &str) -> Result<Option<Round>> {
        self.api
            .get_optional(&format!("/v1/rounds/dart/{}/current", dar_id), &[])
            .await
    }

    pub async fn get_statistics(&self, dar_id: &str) -> Result<RoundStatistics> {
        self.api
            .get(&format!("/v1/rounds/dart/{}/statistics", dar_id), &[])
            .await
    }

    /// Mark a round as paid; the backend must answer with a PAYED round
    pub async fn mark_round_as_paid(&self, dar_id: &str, round_id: &str) -> Result<Round> {
        let round: Round = self
            .api
            .put(
                &format!("/v1/rounds/dart/{}/{}/mark-paid", dar_id, round_id),
                &serde_json::json!({}),
            )
            .await?;

        if round.status != RoundStatus::Payed {
            return Err(TontinError::InvariantViolation(format!(
                "Round {} is still {} after mark-paid",
                round.id,
                round.status.label()
            )));
        }

        info!(dar_id = dar_id, round_id = round_id, "Round marked as paid");
        Ok(round)
    }
}
