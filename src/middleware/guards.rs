//! Route guards
//!
//! Pure functions that decide whether navigation to a client route may
//! proceed. They read only the explicit [`GuardContext`]; no request is
//! made, so the outcome is advisory and the backend re-checks every call.

use chrono::{DateTime, Utc};

use crate::models::user::{is_admin_role, User};
use crate::state::SessionStore;

pub mod routes {
    pub const LANDING: &str = "/";
    pub const LOGIN: &str = "/auth/login";
    pub const UNAUTHORIZED: &str = "/unauthorized";
    pub const CLIENT_DASHBOARD: &str = "/dashboard/client";
    pub const ADMIN_DASHBOARD: &str = "/dashboard/admin";
    pub const RETURN_URL_PARAM: &str = "returnUrl";
}

const CLIENT_AREA_ROLES: &[&str] = &["ROLE_CLIENT", "ROLE_ADMIN"];
const ADMIN_AREA_ROLES: &[&str] = &["ROLE_ADMIN"];

/// A navigation target with query parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl Navigation {
    pub fn to(path: impl Into<String>) -> Self {
        Self { path: path.into(), query: Vec::new() }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Render as a relative URL with encoded query values
    pub fn to_url(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query: Vec<String> = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect();
        format!("{}?{}", self.path, query.join("&"))
    }
}

/// Result of a guard check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Allow,
    Redirect(Navigation),
}

impl GuardOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardOutcome::Allow)
    }
}

/// Everything a guard is allowed to look at
#[derive(Debug, Clone, Default)]
pub struct GuardContext {
    pub user: Option<User>,
    pub authenticated: bool,
}

impl GuardContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(user: User) -> Self {
        Self { user: Some(user), authenticated: true }
    }

    /// Build the context from the persisted session
    pub fn from_session(session: &SessionStore, now: DateTime<Utc>) -> Self {
        Self {
            user: session.user(),
            authenticated: session.is_authenticated(now),
        }
    }
}

/// Dashboard root for a role
pub fn dashboard_for_role(role: &str) -> &'static str {
    if is_admin_role(role) {
        routes::ADMIN_DASHBOARD
    } else {
        routes::CLIENT_DASHBOARD
    }
}

/// Case-insensitive role comparison that tolerates the `ROLE_` prefix on
/// either side
pub fn role_matches(user_role: &str, required: &str) -> bool {
    let user = user_role.to_ascii_uppercase();
    let required = required.to_ascii_uppercase();
    user == required || format!("ROLE_{}", user) == required || user == format!("ROLE_{}", required)
}

/// Only authenticated users may pass; others go to the landing page with
/// the requested URL preserved
pub fn auth_guard(ctx: &GuardContext, target_url: &str) -> GuardOutcome {
    if ctx.authenticated {
        return GuardOutcome::Allow;
    }
    GuardOutcome::Redirect(Navigation::to(routes::LANDING).with_query(routes::RETURN_URL_PARAM, target_url))
}

/// The user must hold one of `required_roles`
pub fn role_guard(ctx: &GuardContext, required_roles: &[&str]) -> GuardOutcome {
    let Some(user) = ctx.user.as_ref() else {
        return GuardOutcome::Redirect(Navigation::to(routes::LOGIN));
    };

    if required_roles.is_empty() || required_roles.iter().any(|role| role_matches(&user.role, role)) {
        return GuardOutcome::Allow;
    }

    GuardOutcome::Redirect(Navigation::to(dashboard_for_role(&user.role)))
}

/// Signed-in users are sent to their dashboard instead of guest pages
pub fn guest_guard(ctx: &GuardContext) -> GuardOutcome {
    if !ctx.authenticated {
        return GuardOutcome::Allow;
    }
    let role = ctx.user.as_ref().map(|u| u.role.as_str()).unwrap_or_default();
    GuardOutcome::Redirect(Navigation::to(dashboard_for_role(role)))
}

/// Roles required for a client route; empty when the route is public
pub fn route_requirements(path: &str) -> &'static [&'static str] {
    let path = path.split('?').next().unwrap_or(path);
    if path == routes::ADMIN_DASHBOARD || path.starts_with("/dashboard/admin/") {
        ADMIN_AREA_ROLES
    } else if path == routes::CLIENT_DASHBOARD || path.starts_with("/dashboard/client/") {
        CLIENT_AREA_ROLES
    } else {
        &[]
    }
}

/// Run the guards configured for `target_url` in order
pub fn check_route(ctx: &GuardContext, target_url: &str) -> GuardOutcome {
    let required = route_requirements(target_url);
    if required.is_empty() {
        return GuardOutcome::Allow;
    }

    match auth_guard(ctx, target_url) {
        GuardOutcome::Allow => role_guard(ctx, required),
        redirect => redirect,
    }
}
