//! Integration tests for notifications, the unread counter and polling

mod helpers;

use std::time::Duration;

use futures::StreamExt;
use helpers::*;
use serde_json::json;
use tontin_client::models::{NotificationFilter, NotificationPreferencesUpdate, NotificationType, RelatedEntity};
use tontin_client::state::{Teardown, TeardownSignal};

async fn seeded_context(unread: u64) -> TestContext {
    let ctx = TestContext::new().await;
    ctx.sign_in("ROLE_CLIENT").await;
    ctx.backend
        .mock_api(
            "GET",
            "/notifications",
            MockResponseConfig::ok(page_json(vec![
                create_test_notification(1, "payment_due", false),
                create_test_notification(2, "member_joined", true),
                create_test_notification(3, "brand_new_kind", false),
            ])),
        )
        .await;
    ctx.backend.mock_unread_count(unread).await;

    let notifications = &ctx.services.notification_service;
    notifications.get_notifications(0, 20, &NotificationFilter::default()).await.unwrap();
    notifications.get_unread_count().await.unwrap();
    ctx
}

#[tokio::test]
async fn test_listing_fills_cache_and_sends_filters() {
    let ctx = seeded_context(2).await;
    let notifications = &ctx.services.notification_service;

    let cached = notifications.notifications().get();
    assert_eq!(cached.len(), 3);
    assert_eq!(cached[2].kind, NotificationType::System);
    assert_eq!(notifications.unread_count().get(), 2);

    let filter = NotificationFilter { kind: Some(NotificationType::PaymentDue), is_read: Some(false) };
    notifications.get_notifications(1, 20, &filter).await.unwrap();

    let requests = ctx.backend.requests_to("/notifications").await;
    let query = requests.last().unwrap().url.query().unwrap_or_default().to_string();
    assert!(query.contains("sort=createdDate%2Cdesc"));
    assert!(query.contains("type=payment_due"));
    assert!(query.contains("isRead=false"));
}

#[tokio::test]
async fn test_read_and_unread_adjust_counter() {
    let ctx = seeded_context(2).await;
    ctx.backend.mock_api("PUT", "/notifications/1/read", MockResponseConfig::default()).await;
    ctx.backend.mock_api("PUT", "/notifications/2/unread", MockResponseConfig::default()).await;
    let notifications = &ctx.services.notification_service;

    notifications.mark_as_read("1").await.unwrap();
    assert_eq!(notifications.unread_count().get(), 1);
    let first = notifications.notifications().get().into_iter().find(|n| n.id == "1").unwrap();
    assert!(first.is_read);
    assert!(first.read_date.is_some());

    // Reading an already read notification does not count twice
    notifications.mark_as_read("1").await.unwrap();
    assert_eq!(notifications.unread_count().get(), 1);

    notifications.mark_as_unread("2").await.unwrap();
    assert_eq!(notifications.unread_count().get(), 2);
}

#[tokio::test]
async fn test_counter_never_goes_below_zero() {
    let ctx = seeded_context(0).await;
    ctx.backend.mock_api("PUT", "/notifications/99/read", MockResponseConfig::default()).await;
    let notifications = &ctx.services.notification_service;

    notifications.mark_as_read("99").await.unwrap();
    notifications.mark_as_read("99").await.unwrap();
    assert_eq!(notifications.unread_count().get(), 0);
}

#[tokio::test]
async fn test_mark_all_archive_and_delete() {
    let ctx = seeded_context(2).await;
    ctx.backend.mock_api("PUT", "/notifications/mark-all-read", MockResponseConfig::default()).await;
    ctx.backend.mock_api("PUT", "/notifications/2/archive", MockResponseConfig::default()).await;
    ctx.backend.mock_api("DELETE", "/notifications/3", MockResponseConfig::default()).await;
    let notifications = &ctx.services.notification_service;

    notifications.delete("3").await.unwrap();
    assert_eq!(notifications.unread_count().get(), 1);

    notifications.archive("2").await.unwrap();
    let ids: Vec<String> = notifications.notifications().get().into_iter().map(|n| n.id).collect();
    assert_eq!(ids, vec!["1"]);

    notifications.mark_all_as_read().await.unwrap();
    assert_eq!(notifications.unread_count().get(), 0);
    assert!(notifications.notifications().get().iter().all(|n| n.is_read));
}

#[tokio::test]
async fn test_polling_publishes_and_stops_on_teardown() {
    let ctx = TestContext::new().await;
    ctx.sign_in("ROLE_CLIENT").await;
    ctx.backend.mock_unread_count(5).await;
    let notifications = ctx.services.notification_service.clone();
    let mut updates = notifications.unread_count().subscribe();

    let teardown = Teardown::new();
    notifications.start_polling(teardown.signal());
    notifications.start_polling(teardown.signal());
    assert!(notifications.is_polling());

    tokio::time::timeout(Duration::from_secs(2), updates.changed()).await.unwrap().unwrap();
    assert_eq!(*updates.borrow(), 5);

    drop(teardown);
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(!notifications.is_polling());

    let polled = ctx.backend.requests_to("/notifications/unread-count").await.len();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(ctx.backend.requests_to("/notifications/unread-count").await.len(), polled);
}

#[tokio::test]
async fn test_stop_polling_and_restart() {
    let ctx = TestContext::new().await;
    ctx.sign_in("ROLE_CLIENT").await;
    ctx.backend.mock_unread_count(1).await;
    let notifications = &ctx.services.notification_service;

    notifications.start_polling(TeardownSignal::never());
    tokio::time::sleep(Duration::from_millis(120)).await;
    notifications.stop_polling();
    assert!(!notifications.is_polling());
    tokio::time::sleep(Duration::from_millis(20)).await;

    let polled = ctx.backend.requests_to("/notifications/unread-count").await.len();
    assert!(polled >= 2);
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(ctx.backend.requests_to("/notifications/unread-count").await.len(), polled);

    notifications.start_polling(TeardownSignal::never());
    assert!(notifications.is_polling());
    notifications.stop_polling();
}

#[tokio::test]
async fn test_poll_failures_are_absorbed() {
    let ctx = TestContext::with_settings(|settings| settings.api.get_retries = 0).await;
    ctx.sign_in("ROLE_CLIENT").await;
    ctx.backend
        .mock_api("GET", "/notifications/unread-count", MockResponseConfig::error(500).up_to(1))
        .await;
    ctx.backend.mock_unread_count(3).await;

    let teardown = Teardown::new();
    let counts: Vec<u64> = ctx
        .services
        .notification_service
        .unread_count_stream(teardown.signal())
        .take(2)
        .collect()
        .await;

    assert_eq!(counts, vec![3, 3]);
    assert_eq!(ctx.backend.requests_to("/notifications/unread-count").await.len(), 3);
}

#[tokio::test]
async fn test_unread_stream_ends_on_teardown() {
    let ctx = TestContext::new().await;
    ctx.sign_in("ROLE_CLIENT").await;
    ctx.backend.mock_unread_count(0).await;

    let teardown = Teardown::new();
    let stream = ctx.services.notification_service.unread_count_stream(teardown.signal());
    teardown.fire();

    let remaining: Vec<u64> = tokio::time::timeout(Duration::from_secs(1), stream.collect())
        .await
        .unwrap();
    assert!(remaining.len() <= 1);
}

/// Same cache as `seeded_context`, with the counter answering `before`
/// once and `after` from then on
async fn context_with_counter_change(before: u64, after: u64) -> TestContext {
    let ctx = TestContext::new().await;
    ctx.sign_in("ROLE_CLIENT").await;
    ctx.backend
        .mock_api(
            "GET",
            "/notifications",
            MockResponseConfig::ok(page_json(vec![
                create_test_notification(1, "payment_due", false),
                create_test_notification(2, "member_joined", true),
                create_test_notification(3, "reminder", false),
            ])),
        )
        .await;
    ctx.backend
        .mock_api(
            "GET",
            "/notifications/unread-count",
            MockResponseConfig::ok(json!({ "count": before })).up_to(1),
        )
        .await;
    ctx.backend.mock_unread_count(after).await;

    let notifications = &ctx.services.notification_service;
    notifications.get_notifications(0, 20, &NotificationFilter::default()).await.unwrap();
    notifications.get_unread_count().await.unwrap();
    ctx
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[tokio::test]
async fn test_summary_publishes_unread_count() {
    let ctx = TestContext::new().await;
    ctx.sign_in("ROLE_CLIENT").await;
    ctx.backend
        .mock_api(
            "GET",
            "/notifications/summary",
            MockResponseConfig::ok(json!({
                "unreadCount": 4,
                "totalCount": 12,
                "unreadByType": { "payment_due": 3, "reminder": 1 },
                "hasUrgent": true,
            })),
        )
        .await;
    let notifications = &ctx.services.notification_service;

    let summary = notifications.get_summary().await.unwrap();
    assert!(summary.has_urgent);
    assert_eq!(summary.unread_of(NotificationType::PaymentDue), 3);
    assert_eq!(notifications.unread_count().get(), 4);
}

#[tokio::test]
async fn test_mark_multiple_as_read_sends_ids_and_reloads_counter() {
    let ctx = context_with_counter_change(2, 0).await;
    ctx.backend.mock_api("PUT", "/notifications/mark-read", MockResponseConfig::default()).await;
    let notifications = &ctx.services.notification_service;
    assert_eq!(notifications.unread_count().get(), 2);

    notifications.mark_multiple_as_read(&ids(&["1", "3"])).await.unwrap();

    let request = &ctx.backend.requests_to("/notifications/mark-read").await[0];
    assert_eq!(TestContext::body_json(request), json!({ "notificationIds": ["1", "3"] }));
    let cached = notifications.notifications().get();
    assert!(cached.iter().all(|n| n.is_read));
    assert!(cached.iter().filter(|n| n.id != "2").all(|n| n.read_date.is_some()));
    assert_eq!(notifications.unread_count().get(), 0);
}

#[tokio::test]
async fn test_archive_and_delete_multiple_drop_cached_entries() {
    let ctx = context_with_counter_change(2, 1).await;
    ctx.backend.mock_api("PUT", "/notifications/archive-multiple", MockResponseConfig::default()).await;
    ctx.backend.mock_api("DELETE", "/notifications/delete-multiple", MockResponseConfig::default()).await;
    let notifications = &ctx.services.notification_service;

    notifications.archive_multiple(&ids(&["2"])).await.unwrap();
    notifications.delete_multiple(&ids(&["3"])).await.unwrap();

    let remaining: Vec<String> = notifications.notifications().get().into_iter().map(|n| n.id).collect();
    assert_eq!(remaining, vec!["1"]);
    assert_eq!(notifications.unread_count().get(), 1);

    let delete = &ctx.backend.requests_to("/notifications/delete-multiple").await[0];
    assert_eq!(TestContext::body_json(delete), json!({ "notificationIds": ["3"] }));
}

#[tokio::test]
async fn test_failed_counter_reload_keeps_bulk_change() {
    let ctx = TestContext::with_settings(|settings| settings.api.get_retries = 0).await;
    ctx.sign_in("ROLE_CLIENT").await;
    ctx.backend.mock_api("PUT", "/notifications/mark-read", MockResponseConfig::default()).await;
    ctx.backend
        .mock_api("GET", "/notifications/unread-count", MockResponseConfig::error(503))
        .await;

    let result = ctx
        .services
        .notification_service
        .mark_multiple_as_read(&ids(&["1"]))
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_empty_id_lists_make_no_request() {
    let ctx = TestContext::new().await;
    ctx.sign_in("ROLE_CLIENT").await;
    ctx.backend
        .mock_api("PUT", "/notifications/mark-read", MockResponseConfig::default().expect(0))
        .await;
    ctx.backend
        .mock_api("PUT", "/notifications/archive-multiple", MockResponseConfig::default().expect(0))
        .await;
    ctx.backend
        .mock_api("DELETE", "/notifications/delete-multiple", MockResponseConfig::default().expect(0))
        .await;
    let notifications = &ctx.services.notification_service;

    notifications.mark_multiple_as_read(&[]).await.unwrap();
    notifications.archive_multiple(&[]).await.unwrap();
    notifications.delete_multiple(&[]).await.unwrap();
    assert!(ctx.backend.requests_to("/notifications/mark-read").await.is_empty());
}

#[tokio::test]
async fn test_delete_all_read_keeps_unread_entries() {
    let ctx = seeded_context(2).await;
    ctx.backend.mock_api("DELETE", "/notifications/delete-all-read", MockResponseConfig::default()).await;
    let notifications = &ctx.services.notification_service;

    notifications.delete_all_read().await.unwrap();

    let remaining: Vec<String> = notifications.notifications().get().into_iter().map(|n| n.id).collect();
    assert_eq!(remaining, vec!["1", "3"]);
    assert_eq!(notifications.unread_count().get(), 2);
}

#[tokio::test]
async fn test_listing_by_type_and_by_entity() {
    let ctx = TestContext::new().await;
    ctx.sign_in("ROLE_CLIENT").await;
    ctx.backend
        .mock_api(
            "GET",
            "/notifications/by-type/payment_due",
            MockResponseConfig::ok(page_json(vec![create_test_notification(1, "payment_due", false)])),
        )
        .await;
    ctx.backend
        .mock_api(
            "GET",
            "/notifications/by-entity/dar/7",
            MockResponseConfig::ok(page_json(vec![create_test_notification(4, "member_joined", true)])),
        )
        .await;
    ctx.backend
        .mock_api("GET", "/notifications/4", MockResponseConfig::ok(create_test_notification(4, "member_joined", true)))
        .await;
    let notifications = &ctx.services.notification_service;

    let due = notifications
        .get_notifications_by_type(NotificationType::PaymentDue, 0, 20)
        .await
        .unwrap();
    assert_eq!(due.content[0].id, "1");
    let about_dar = notifications
        .get_notifications_by_entity(RelatedEntity::Dar, "7", 0, 20)
        .await
        .unwrap();
    assert_eq!(about_dar.content[0].kind, NotificationType::MemberJoined);
    assert!(notifications.notifications().get().is_empty());

    let single = notifications.get_notification("4").await.unwrap();
    assert!(single.is_read);

    let request = &ctx.backend.requests_to("/notifications/by-entity/dar/7").await[0];
    assert!(request.url.query().unwrap_or_default().contains("sort=createdDate%2Cdesc"));
}

#[tokio::test]
async fn test_preferences_are_stored_and_cleared_on_sign_out() {
    let ctx = TestContext::new().await;
    ctx.sign_in("ROLE_CLIENT").await;
    ctx.backend
        .mock_api(
            "GET",
            "/notification-preferences",
            MockResponseConfig::ok(json!({ "id": 3, "userId": 1, "emailNotifications": true, "weeklyDigest": true })),
        )
        .await;
    ctx.backend
        .mock_api(
            "PUT",
            "/notification-preferences",
            MockResponseConfig::ok(json!({ "id": 3, "userId": 1, "emailNotifications": true, "weeklyDigest": false })),
        )
        .await;
    ctx.backend.mock_api("POST", "/v1/auth/logout", MockResponseConfig::ok(json!({}))).await;
    let notifications = &ctx.services.notification_service;

    let loaded = notifications.get_preferences().await.unwrap();
    assert!(loaded.weekly_digest);
    assert_eq!(notifications.preferences().get(), Some(loaded));

    let update = NotificationPreferencesUpdate { weekly_digest: Some(false), ..Default::default() };
    let saved = notifications.update_preferences(&update).await.unwrap();
    assert!(!saved.weekly_digest);
    assert_eq!(notifications.preferences().get().map(|p| p.weekly_digest), Some(false));

    let request = &ctx.backend.requests_to("/notification-preferences").await[1];
    assert_eq!(TestContext::body_json(request), json!({ "weeklyDigest": false }));

    ctx.services.sign_out().await.unwrap();
    assert_eq!(notifications.preferences().get(), None);
}
