//! Notification service implementation
//!
//! This service lists and updates notifications, keeps the unread counter
//! in a local store and polls the backend for that counter in the
//! background.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use futures::Stream;
use serde::de::IgnoredAny;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::settings::Settings;
use crate::models::notification::{
    Notification, NotificationFilter, NotificationIds, NotificationPreferences, NotificationPreferencesUpdate,
    NotificationSummary, NotificationType, RelatedEntity, UnreadCount,
};
use crate::models::page::Page;
use crate::services::api::ApiClient;
use crate::state::{Store, TeardownSignal};
use crate::utils::errors::Result;

/// Service for user notifications and the unread badge
#[derive(Debug, Clone)]
pub struct NotificationService {
    api: ApiClient,
    notifications: Store<Vec<Notification>>,
    unread: Store<u64>,
    preferences: Store<Option<NotificationPreferences>>,
    poll_interval: Duration,
    page_size: u32,
    poller: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl NotificationService {
    /// Create a new NotificationService instance
    pub fn new(api: ApiClient, settings: &Settings) -> Self {
        Self {
            api,
            notifications: Store::default(),
            unread: Store::default(),
            preferences: Store::default(),
            poll_interval: Duration::from_millis(settings.notifications.poll_interval_ms),
            page_size: settings.notifications.page_size,
            poller: Arc::new(Mutex::new(None)),
        }
    }

    /// The cached first page of notifications
    pub fn notifications(&self) -> &Store<Vec<Notification>> {
        &self.notifications
    }

    /// Unread counter shown on the badge
    pub fn unread_count(&self) -> &Store<u64> {
        &self.unread
    }

    /// Last preferences fetched or saved
    pub fn preferences(&self) -> &Store<Option<NotificationPreferences>> {
        &self.preferences
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Drop cached notifications, the counter and preferences
    pub fn clear_cache(&self) {
        self.notifications.set(Vec::new());
        self.unread.set(0);
        self.preferences.set(None);
    }

    /// Fetch a page of notifications, newest first; page 0 replaces the cache
    pub async fn get_notifications(
        &self,
        page: u32,
        size: u32,
        filter: &NotificationFilter,
    ) -> Result<Page<Notification>> {
        let mut query = vec![
            ("page", page.to_string()),
            ("size", size.to_string()),
            ("sort", "createdDate,desc".to_string()),
        ];
        if let Some(kind) = filter.kind {
            query.push(("type", kind.as_str().to_string()));
        }
        if let Some(is_read) = filter.is_read {
            query.push(("isRead", is_read.to_string()));
        }

        let result: Page<Notification> = self.api.get("/notifications", &query).await?;
        if page == 0 {
            self.notifications.set(result.content.clone());
        }
        Ok(result)
    }

    /// Notifications of one type; not cached
    pub async fn get_notifications_by_type(
        &self,
        kind: NotificationType,
        page: u32,
        size: u32,
    ) -> Result<Page<Notification>> {
        self.api
            .get(&format!("/notifications/by-type/{}", kind.as_str()), &newest_first(page, size))
            .await
    }

    /// Notifications about one Dar, payment, user or contribution; not cached
    pub async fn get_notifications_by_entity(
        &self,
        entity: RelatedEntity,
        entity_id: &str,
        page: u32,
        size: u32,
    ) -> Result<Page<Notification>> {
        self.api
            .get(
                &format!("/notifications/by-entity/{}/{}", entity.as_str(), entity_id),
                &newest_first(page, size),
            )
            .await
    }

    pub async fn get_notification(&self, notification_id: &str) -> Result<Notification> {
        self.api.get(&format!("/notifications/{}", notification_id), &[]).await
    }

    /// Fetch the summary counters; the unread count is published
    pub async fn get_summary(&self) -> Result<NotificationSummary> {
        let summary: NotificationSummary = self.api.get("/notifications/summary", &[]).await?;
        self.unread.set(summary.unread_count);
        Ok(summary)
    }

    /// Fetch the unread counter and publish it
    pub async fn get_unread_count(&self) -> Result<u64> {
        let response: UnreadCount = self.api.get("/notifications/unread-count", &[]).await?;
        self.unread.set(response.count);
        Ok(response.count)
    }

    pub async fn mark_as_read(&self, notification_id: &str) -> Result<()> {
        let _: IgnoredAny = self
            .api
            .put(&format!("/notifications/{}/read", notification_id), &serde_json::json!({}))
            .await?;

        let was_unread = self.cached_read_state(notification_id).map(|read| !read).unwrap_or(true);
        let read_date = Utc::now().to_rfc3339();
        self.notifications.update(|items| {
            for item in items.iter_mut().filter(|n| n.id == notification_id) {
                item.is_read = true;
                item.read_date = Some(read_date.clone());
            }
        });
        if was_unread {
            self.unread.update(|count| *count = count.saturating_sub(1));
        }
        Ok(())
    }

    pub async fn mark_all_as_read(&self) -> Result<()> {
        let _: IgnoredAny = self
            .api
            .put("/notifications/mark-all-read", &serde_json::json!({}))
            .await?;

        let read_date = Utc::now().to_rfc3339();
        self.notifications.update(|items| {
            for item in items.iter_mut().filter(|n| !n.is_read) {
                item.is_read = true;
                item.read_date = Some(read_date.clone());
            }
        });
        self.unread.set(0);
        info!("All notifications marked as read");
        Ok(())
    }

    pub async fn mark_as_unread(&self, notification_id: &str) -> Result<()> {
        let _: IgnoredAny = self
            .api
            .put(&format!("/notifications/{}/unread", notification_id), &serde_json::json!({}))
            .await?;

        let was_read = self.cached_read_state(notification_id).unwrap_or(true);
        self.notifications.update(|items| {
            for item in items.iter_mut().filter(|n| n.id == notification_id) {
                item.is_read = false;
                item.read_date = None;
            }
        });
        if was_read {
            self.unread.update(|count| *count += 1);
        }
        Ok(())
    }

    pub async fn archive(&self, notification_id: &str) -> Result<()> {
        let _: IgnoredAny = self
            .api
            .put(&format!("/notifications/{}/archive", notification_id), &serde_json::json!({}))
            .await?;
        self.notifications.update(|items| items.retain(|n| n.id != notification_id));
        Ok(())
    }

    pub async fn delete(&self, notification_id: &str) -> Result<()> {
        let _: IgnoredAny = self
            .api
            .delete(&format!("/notifications/{}", notification_id))
            .await?;

        let was_unread = self.cached_read_state(notification_id) == Some(false);
        self.notifications.update(|items| items.retain(|n| n.id != notification_id));
        if was_unread {
            self.unread.update(|count| *count = count.saturating_sub(1));
        }
        Ok(())
    }

    /// Mark several notifications read, then reload the counter from the
    /// backend. An empty list makes no request.
    pub async fn mark_multiple_as_read(&self, notification_ids: &[String]) -> Result<()> {
        if notification_ids.is_empty() {
            return Ok(());
        }
        let _: IgnoredAny = self
            .api
            .put("/notifications/mark-read", &ids_body(notification_ids))
            .await?;

        let read_date = Utc::now().to_rfc3339();
        self.notifications.update(|items| {
            for item in items.iter_mut().filter(|n| !n.is_read && notification_ids.contains(&n.id)) {
                item.is_read = true;
                item.read_date = Some(read_date.clone());
            }
        });
        self.refresh_unread_count().await;
        Ok(())
    }

    pub async fn archive_multiple(&self, notification_ids: &[String]) -> Result<()> {
        if notification_ids.is_empty() {
            return Ok(());
        }
        let _: IgnoredAny = self
            .api
            .put("/notifications/archive-multiple", &ids_body(notification_ids))
            .await?;
        self.notifications.update(|items| items.retain(|n| !notification_ids.contains(&n.id)));
        Ok(())
    }

    /// Delete several notifications, then reload the counter
    pub async fn delete_multiple(&self, notification_ids: &[String]) -> Result<()> {
        if notification_ids.is_empty() {
            return Ok(());
        }
        let _: IgnoredAny = self
            .api
            .delete_with_body("/notifications/delete-multiple", &ids_body(notification_ids))
            .await?;
        self.notifications.update(|items| items.retain(|n| !notification_ids.contains(&n.id)));
        self.refresh_unread_count().await;
        Ok(())
    }

    /// Delete every read notification; the unread counter is unaffected
    pub async fn delete_all_read(&self) -> Result<()> {
        let _: IgnoredAny = self.api.delete("/notifications/delete-all-read").await?;
        self.notifications.update(|items| items.retain(|n| !n.is_read));
        info!("Read notifications deleted");
        Ok(())
    }

    pub async fn get_preferences(&self) -> Result<NotificationPreferences> {
        let preferences: NotificationPreferences = self.api.get("/notification-preferences", &[]).await?;
        self.preferences.set(Some(preferences.clone()));
        Ok(preferences)
    }

    /// Save the given fields and publish the preferences the backend returns
    pub async fn update_preferences(&self, update: &NotificationPreferencesUpdate) -> Result<NotificationPreferences> {
        let preferences: NotificationPreferences = self.api.put("/notification-preferences", update).await?;
        self.preferences.set(Some(preferences.clone()));
        debug!("Notification preferences updated");
        Ok(preferences)
    }

    /// Start polling the unread counter until `teardown` fires or
    /// [`stop_polling`](Self::stop_polling) is called.
    ///
    /// Does nothing while a poll task is already running.
    pub fn start_polling(&self, teardown: TeardownSignal) {
        let mut poller = self.poller.lock().unwrap_or_else(PoisonError::into_inner);
        if poller.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!("Notification polling already running");
            return;
        }

        let service = self.clone();
        let period = self.poll_interval;
        let mut teardown = teardown;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = teardown.cancelled() => {
                        debug!("Notification polling torn down");
                        break;
                    }
                    _ = ticker.tick() => {}
                }

                if let Err(e) = service.get_unread_count().await {
                    warn!(error = %e, "Failed to poll unread notification count");
                }
            }
        });

        *poller = Some(handle);
        info!(interval_ms = period.as_millis() as u64, "Started notification polling");
    }

    pub fn stop_polling(&self) {
        let handle = self.poller.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = handle {
            handle.abort();
            info!("Stopped notification polling");
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Unread counts from the same poll, as a stream that ends on teardown
    pub fn unread_count_stream(&self, mut teardown: TeardownSignal) -> impl Stream<Item = u64> + Send + 'static {
        let service = self.clone();
        let period = self.poll_interval;

        async_stream::stream! {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = teardown.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                match service.get_unread_count().await {
                    Ok(count) => yield count,
                    Err(e) => warn!(error = %e, "Failed to poll unread notification count"),
                }
            }
        }
    }

    /// Reload the counter after a bulk change; the change itself already
    /// succeeded, so a failure here is only logged
    async fn refresh_unread_count(&self) {
        if let Err(e) = self.get_unread_count().await {
            warn!(error = %e, "Failed to refresh unread notification count");
        }
    }

    /// Read flag of a cached notification, if it is cached
    fn cached_read_state(&self, notification_id: &str) -> Option<bool> {
        self.notifications
            .with(|items| items.iter().find(|n| n.id == notification_id).map(|n| n.is_read))
    }
}

fn newest_first(page: u32, size: u32) -> Vec<(&'static str, String)> {
    vec![
        ("page", page.to_string()),
        ("size", size.to_string()),
        ("sort", "createdDate,desc".to_string()),
    ]
}

fn ids_body(notification_ids: &[String]) -> NotificationIds {
    NotificationIds { notification_ids: notification_ids.to_vec() }
}
