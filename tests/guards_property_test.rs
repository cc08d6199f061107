//! Property tests for route guards and login identifier handling

use assert_matches::assert_matches;
use proptest::prelude::*;
use tontin_client::middleware::{check_route, role_matches, GuardContext, GuardOutcome};
use tontin_client::models::User;
use tontin_client::utils::helpers::normalize_login_identifier;

fn user_with_role(role: &str) -> User {
    User {
        id: "1".to_string(),
        user_name: "prop".to_string(),
        email: "prop@tontin.com".to_string(),
        role: role.to_string(),
        status: None,
        email_confirmed: None,
        creation_date: None,
    }
}

proptest! {
    #[test]
    fn role_matches_itself(role in "[A-Za-z]{1,12}") {
        prop_assert!(role_matches(&role, &role));
    }

    #[test]
    fn role_prefix_is_optional_on_either_side(role in "[A-Za-z]{1,12}") {
        let prefixed = format!("ROLE_{}", role);
        prop_assert!(role_matches(&role, &prefixed));
        prop_assert!(role_matches(&prefixed, &role));
    }

    #[test]
    fn role_matching_ignores_case(role in "[A-Za-z_]{1,12}") {
        prop_assert!(role_matches(&role.to_ascii_lowercase(), &role.to_ascii_uppercase()));
    }

    #[test]
    fn different_roles_do_not_match(a in "[A-Z]{3,8}", b in "[A-Z]{3,8}") {
        prop_assume!(a != b);
        prop_assert!(!role_matches(&a, &b));
    }

    #[test]
    fn bare_identifiers_get_the_default_domain(name in "[a-z0-9.]{1,16}") {
        let email = normalize_login_identifier(&name, "tontin.com");
        prop_assert_eq!(email, format!("{}@tontin.com", name));
    }

    #[test]
    fn emails_are_kept_as_typed(local in "[a-z0-9]{1,10}", domain in "[a-z]{2,10}\\.[a-z]{2,4}") {
        let email = format!("{}@{}", local, domain);
        prop_assert_eq!(normalize_login_identifier(&format!("  {} ", email), "tontin.com"), email);
    }

    #[test]
    fn anonymous_users_keep_the_requested_url(segment in "[a-z0-9-]{1,20}") {
        let target = format!("/dashboard/client/{}", segment);
        let outcome = check_route(&GuardContext::anonymous(), &target);
        let GuardOutcome::Redirect(nav) = outcome else {
            panic!("anonymous access to {} was allowed", target);
        };
        prop_assert_eq!(nav.path.as_str(), "/");
        prop_assert_eq!(nav.query_param("returnUrl"), Some(target.as_str()));
    }

    #[test]
    fn public_routes_are_always_open(segment in "[a-z0-9-]{1,20}") {
        let target = format!("/{}", segment);
        prop_assume!(!target.starts_with("/dashboard"));
        prop_assert!(check_route(&GuardContext::anonymous(), &target).is_allowed());
    }
}

#[test]
fn test_clients_are_sent_back_from_admin_area() {
    let ctx = GuardContext::signed_in(user_with_role("ROLE_CLIENT"));
    let outcome = check_route(&ctx, "/dashboard/admin/dars");
    assert_matches!(outcome, GuardOutcome::Redirect(nav) if nav.path == "/dashboard/client");
}

#[test]
fn test_admins_may_enter_client_area() {
    let ctx = GuardContext::signed_in(user_with_role("admin"));
    assert!(check_route(&ctx, "/dashboard/client/my-dars").is_allowed());
}
