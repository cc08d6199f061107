//! Dar service implementation
//!
//! This service wraps the `/dars` endpoints and keeps the current page of
//! the user's Dars in a local store. Successful mutations patch that store;
//! failed ones leave it untouched and return the error unchanged.

use serde::de::IgnoredAny;
use tracing::{debug, info};

use crate::models::dar::{
    CreateDarRequest, Dar, DarDetails, DarMessage, DarPagination, DarStats, DarStatus, GenerateInviteCodeResponse,
    InviteMemberRequest, JoinDarRequest, ReportMemberRequest, SendMessageRequest, Tour, UpdateDarRequest,
    UpdateTurnOrderRequest,
};
use crate::models::member::Member;
use crate::models::page::Page;
use crate::models::payment::Transaction;
use crate::services::api::ApiClient;
use crate::state::Store;
use crate::utils::errors::{Result, TontinError};
use crate::utils::logging::log_dar_action;

/// Service for Dar management and membership
#[derive(Debug, Clone)]
pub struct DarService {
    api: ApiClient,
    my_dars: Store<Vec<Dar>>,
}

impl DarService {
    /// Create a new DarService instance
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            my_dars: Store::default(),
        }
    }

    /// The cached first page of the user's Dars
    pub fn my_dars(&self) -> &Store<Vec<Dar>> {
        &self.my_dars
    }

    /// Fetch a page of the user's Dars; page 0 replaces the cache
    pub async fn get_my_dars(&self, page: u32, size: u32, status: Option<DarStatus>) -> Result<Page<Dar>> {
        let size = DarPagination::clamp(size);
        debug!(page = page, size = size, status = ?status, "Fetching my Dars");

        let mut query = vec![("page", page.to_string()), ("size", size.to_string())];
        if let Some(status) = status {
            query.push(("status", status.as_str().to_string()));
        }

        let result: Page<Dar> = self.api.get("/dars/my-dars", &query).await?;
        if page == 0 {
            self.my_dars.set(result.content.clone());
        }
        Ok(result)
    }

    pub async fn get_dar(&self, dar_id: &str) -> Result<Dar> {
        self.api.get(&format!("/dars/{}", dar_id), &[]).await
    }

    /// Fetch a Dar with its members, tours, recent transactions and messages
    pub async fn get_dar_details(&self, dar_id: &str) -> Result<DarDetails> {
        let (dar, members, tours, transactions, messages) = futures::try_join!(
            self.get_dar(dar_id),
            self.get_members(dar_id),
            self.get_tours(dar_id),
            self.get_transactions(dar_id, 0, DarPagination::TRANSACTIONS_PAGE_SIZE),
            self.get_messages(dar_id, 0, DarPagination::MESSAGES_PAGE_SIZE),
        )?;

        Ok(DarDetails {
            dar,
            members,
            tours,
            transactions: transactions.content,
            messages: messages.content,
        })
    }

    pub async fn create_dar(&self, request: &CreateDarRequest) -> Result<Dar> {
        request.validate()?;

        let dar: Dar = self.api.post("/dars", request).await?;
        self.my_dars.update(|dars| prepend_unique(dars, dar.clone()));

        log_dar_action(&dar.id, "created", Some(&dar.name));
        Ok(dar)
    }

    pub async fn update_dar(&self, dar_id: &str, request: &UpdateDarRequest) -> Result<Dar> {
        request.validate()?;

        let dar: Dar = self.api.put(&format!("/dars/{}", dar_id), request).await?;
        self.my_dars.update(|dars| replace_in_place(dars, &dar));

        log_dar_action(dar_id, "updated", None);
        Ok(dar)
    }

    pub async fn delete_dar(&self, dar_id: &str) -> Result<()> {
        let _: IgnoredAny = self.api.delete(&format!("/dars/{}", dar_id)).await?;
        self.my_dars.update(|dars| remove_by_id(dars, dar_id));

        log_dar_action(dar_id, "deleted", None);
        Ok(())
    }

    /// Join by invite code or by id
    pub async fn join_dar(&self, request: &JoinDarRequest) -> Result<Dar> {
        request.validate()?;

        let dar: Dar = self.api.post("/dars/join", request).await?;
        self.my_dars.update(|dars| prepend_unique(dars, dar.clone()));

        log_dar_action(&dar.id, "joined", request.invite_code.as_deref());
        Ok(dar)
    }

    pub async fn leave_dar(&self, dar_id: &str) -> Result<()> {
        let _: IgnoredAny = self
            .api
            .post(&format!("/dars/{}/leave", dar_id), &serde_json::json!({}))
            .await?;
        self.my_dars.update(|dars| remove_by_id(dars, dar_id));

        log_dar_action(dar_id, "left", None);
        Ok(())
    }

    /// Move a pending Dar to active
    pub async fn start_dar(&self, dar_id: &str) -> Result<Dar> {
        if let Some(cached) = self.cached(dar_id) {
            if !cached.status.can_transition_to(DarStatus::Active) {
                return Err(TontinError::InvalidStateTransition {
                    from: cached.status.as_str().to_string(),
                    to: DarStatus::Active.as_str().to_string(),
                });
            }
        }

        let dar: Dar = self
            .api
            .post(&format!("/dars/{}/start", dar_id), &serde_json::json!({}))
            .await?;
        self.my_dars.update(|dars| replace_in_place(dars, &dar));

        info!(dar_id = dar_id, status = %dar.status, "Dar started");
        Ok(dar)
    }

    pub async fn invite_member(&self, request: &InviteMemberRequest) -> Result<()> {
        request.validate()?;

        let _: IgnoredAny = self
            .api
            .post(&format!("/dars/{}/invite", request.dar_id), request)
            .await?;
        log_dar_action(&request.dar_id, "member_invited", request.email.as_deref());
        Ok(())
    }

    pub async fn remove_member(&self, dar_id: &str, member_id: &str) -> Result<()> {
        let _: IgnoredAny = self
            .api
            .delete(&format!("/dars/{}/members/{}", dar_id, member_id))
            .await?;
        log_dar_action(dar_id, "member_removed", Some(member_id));
        Ok(())
    }

    pub async fn get_members(&self, dar_id: &str) -> Result<Vec<Member>> {
        self.api.get(&format!("/dars/{}/members", dar_id), &[]).await
    }

    pub async fn get_tours(&self, dar_id: &str) -> Result<Vec<Tour>> {
        let mut tours: Vec<Tour> = self.api.get(&format!("/dars/{}/tours", dar_id), &[]).await?;
        tours.sort_by_key(|tour| tour.cycle_number);
        Ok(tours)
    }

    pub async fn complete_tour(&self, dar_id: &str, tour_id: &str) -> Result<Tour> {
        let tour: Tour = self
            .api
            .post(&format!("/dars/{}/tours/{}/complete", dar_id, tour_id), &serde_json::json!({}))
            .await?;
        log_dar_action(dar_id, "tour_completed", Some(tour_id));
        Ok(tour)
    }

    pub async fn get_transactions(&self, dar_id: &str, page: u32, size: u32) -> Result<Page<Transaction>> {
        let query = [("page", page.to_string()), ("size", DarPagination::clamp(size).to_string())];
        self.api.get(&format!("/dars/{}/transactions", dar_id), &query).await
    }

    pub async fn get_messages(&self, dar_id: &str, page: u32, size: u32) -> Result<Page<DarMessage>> {
        let query = [("page", page.to_string()), ("size", DarPagination::clamp(size).to_string())];
        self.api.get(&format!("/dars/{}/messages", dar_id), &query).await
    }

    pub async fn send_message(&self, dar_id: &str, content: &str) -> Result<DarMessage> {
        let request = SendMessageRequest { content: content.trim().to_string() };
        request.validate()?;
        self.api.post(&format!("/dars/{}/messages", dar_id), &request).await
    }

    pub async fn generate_invite_code(&self, dar_id: &str) -> Result<String> {
        let response: GenerateInviteCodeResponse = self
            .api
            .post(&format!("/dars/{}/generate-invite-code", dar_id), &serde_json::json!({}))
            .await?;

        self.my_dars.update(|dars| {
            for dar in dars.iter_mut().filter(|d| d.id == dar_id) {
                dar.invite_code = Some(response.invite_code.clone());
            }
        });
        Ok(response.invite_code)
    }

    /// Browse public Dars, optionally filtered by a search term
    pub async fn get_public_dars(&self, page: u32, size: u32, search: Option<&str>) -> Result<Page<Dar>> {
        let mut query = vec![("page", page.to_string()), ("size", DarPagination::clamp(size).to_string())];
        if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
            query.push(("search", search.to_string()));
        }
        self.api.get("/dars/public", &query).await
    }

    pub async fn report_member(&self, dar_id: &str, member_id: &str, reason: &str) -> Result<()> {
        if reason.trim().is_empty() {
            return Err(TontinError::InvalidInput("A reason is required".to_string()));
        }
        let request = ReportMemberRequest { reason: reason.trim().to_string() };
        let _: IgnoredAny = self
            .api
            .post(&format!("/dars/{}/members/{}/report", dar_id, member_id), &request)
            .await?;
        log_dar_action(dar_id, "member_reported", Some(member_id));
        Ok(())
    }

    pub async fn get_stats(&self, dar_id: &str) -> Result<DarStats> {
        self.api.get(&format!("/dars/{}/stats", dar_id), &[]).await
    }

    pub async fn update_turn_order(&self, dar_id: &str, request: &UpdateTurnOrderRequest) -> Result<()> {
        request.validate()?;
        let _: IgnoredAny = self.api.put(&format!("/dars/{}/turn-order", dar_id), request).await?;
        log_dar_action(dar_id, "turn_order_updated", None);
        Ok(())
    }

    /// Empty the local cache, e.g. on logout
    pub fn clear_cache(&self) {
        self.my_dars.set(Vec::new());
    }

    fn cached(&self, dar_id: &str) -> Option<Dar> {
        self.my_dars.with(|dars| dars.iter().find(|d| d.id == dar_id).cloned())
    }
}

/// Put `dar` at the head, dropping any older entry with the same id
fn prepend_unique(dars: &mut Vec<Dar>, dar: Dar) {
    dars.retain(|d| d.id != dar.id);
    dars.insert(0, dar);
}

fn remove_by_id(dars: &mut Vec<Dar>, dar_id: &str) {
    dars.retain(|d| d.id != dar_id);
}

fn replace_in_place(dars: &mut [Dar], dar: &Dar) {
    for entry in dars.iter_mut().filter(|d| d.id == dar.id) {
        *entry = dar.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dar(id: &str, name: &str) -> Dar {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": name,
            "status": "pending",
        }))
        .unwrap()
    }

    #[test]
    fn test_prepend_unique_moves_existing_entry() {
        let mut dars = vec![dar("1", "A"), dar("2", "B"), dar("3", "C")];
        prepend_unique(&mut dars, dar("2", "B2"));

        let ids: Vec<&str> = dars.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1", "3"]);
        assert_eq!(dars[0].name, "B2");
    }

    #[test]
    fn test_remove_by_id_drops_duplicates() {
        let mut dars = vec![dar("1", "A"), dar("2", "B"), dar("1", "A again")];
        remove_by_id(&mut dars, "1");
        assert_eq!(dars.len(), 1);
        assert_eq!(dars[0].id, "2");
    }

    #[test]
    fn test_replace_in_place_keeps_position() {
        let mut dars = vec![dar("1", "A"), dar("2", "B")];
        let mut updated = dar("2", "Renamed");
        updated.status = DarStatus::Active;
        replace_in_place(&mut dars, &updated);

        assert_eq!(dars[1].name, "Renamed");
        assert_eq!(dars[1].status, DarStatus::Active);

        replace_in_place(&mut dars, &dar("9", "Unknown"));
        assert_eq!(dars.len(), 2);
    }
}
