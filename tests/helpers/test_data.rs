//! Test data helpers for creating test objects
//!
//! This module provides builders for backend JSON payloads: Dars, rounds,
//! members, notifications, users and session tokens.

use chrono::{Duration, Utc};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;
use serde_json::{json, Value};

/// Dar payload as returned by `/dars` endpoints
pub fn create_test_dar(id: u64, name: &str, status: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": "Savings circle for testing",
        "status": status,
        "organizerId": 1,
        "organizerName": Name().fake::<String>(),
        "currentCycle": 1,
        "totalCycles": 10,
        "memberCount": 5,
        "maxMembers": 10,
        "monthlyContribution": 5000.0,
        "totalMonthlyPool": 25000.0,
        "paymentFrequency": "MONTHLY",
        "orderMethod": "FIXED_ORDER",
        "isOrganizer": false,
        "isMember": true,
        "visibility": "private",
    })
}

/// Round payload as returned by `/v1/rounds` endpoints
pub fn create_test_round(id: u64, dar_id: u64, number: u32, status: &str) -> Value {
    json!({
        "id": id,
        "number": number,
        "status": status,
        "date": (Utc::now() + Duration::days(3)).to_rfc3339(),
        "amount": 5000.0,
        "dartId": dar_id,
        "dartName": "Family fund",
        "recipientMemberId": 10 + number,
        "recipientMemberName": Name().fake::<String>(),
    })
}

/// Notification payload
pub fn create_test_notification(id: u64, kind: &str, is_read: bool) -> Value {
    json!({
        "id": id,
        "userId": 1,
        "type": kind,
        "title": format!("Notification {}", id),
        "message": "Something happened in your Dar",
        "priority": "medium",
        "isRead": is_read,
        "isArchived": false,
        "createdDate": Utc::now().to_rfc3339(),
    })
}

/// User payload with a random name and email
pub fn create_test_user(id: u64, role: &str) -> Value {
    json!({
        "id": id,
        "userName": Name().fake::<String>(),
        "email": SafeEmail().fake::<String>(),
        "role": role,
        "status": "ACTIVE",
        "emailConfirmed": true,
    })
}

#[derive(Serialize)]
struct TestClaims {
    sub: String,
    exp: i64,
}

/// A signed JWT expiring `minutes` from now
pub fn create_test_jwt(minutes: i64) -> String {
    let claims = TestClaims {
        sub: SafeEmail().fake(),
        exp: (Utc::now() + Duration::minutes(minutes)).timestamp(),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(b"backend-secret")).unwrap()
}
