mod common;

use anyhow::Result;
use axum::http::StatusCode;
use chrono::{Duration, Utc};

use campus_gate::authz::{PermissionTable, Role};
use common::{api, location, page, spawn_app, spawn_app_with};

#[tokio::test]
async fn login_page_is_served_without_a_cookie() -> Result<()> {
    let t = spawn_app().await?;

    let (status, _, body) = t.send(page("/login", None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], "/login");
    assert!(body["user"].is_null());

    let (status, _, _) = t.send(page("/signup", None)?).await?;
    assert_eq!(status, StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn guarded_page_without_cookie_redirects_to_login() -> Result<()> {
    let t = spawn_app().await?;

    let (status, headers, _) = t.send(page("/manage-staff", None)?).await?;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&headers), Some("/login"));

    let (status, headers, _) = t.send(page("/", None)?).await?;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&headers), Some("/login"));

    Ok(())
}

#[tokio::test]
async fn staff_session_reaches_staff_page_with_identity_attached() -> Result<()> {
    let t = spawn_app().await?;
    let org = t.seed_org("Riverside High").await?;
    let (staff, token) = t.seed_user("staff@riverside.test", Role::Staff, Some(org)).await?;

    let (status, _, body) = t.send(page("/manage-staff", Some(&token))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], "/manage-staff");
    assert_eq!(body["user"]["email"], "staff@riverside.test");
    assert_eq!(body["user"]["role"], "STAFF");
    assert_eq!(body["user"]["user_id"], staff.user_id.to_string());

    Ok(())
}

#[tokio::test]
async fn student_session_is_sent_to_access_denied_for_admin_pages() -> Result<()> {
    let t = spawn_app().await?;
    let org = t.seed_org("Riverside High").await?;
    let (_, token) = t.seed_user("pupil@riverside.test", Role::Student, Some(org)).await?;

    let (status, headers, _) = t.send(page("/manage-admin", Some(&token))?).await?;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&headers), Some("/access-denied"));

    // The landing page itself stays reachable for the same session.
    let (status, _, body) = t.send(page("/access-denied", Some(&token))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "STUDENT");

    Ok(())
}

#[tokio::test]
async fn nested_page_needs_its_exact_path_listed() -> Result<()> {
    let t = spawn_app().await?;
    let org = t.seed_org("Riverside High").await?;
    let (_, staff_token) = t.seed_user("staff@riverside.test", Role::Staff, Some(org)).await?;
    let (_, admin_token) = t.seed_user("admin@riverside.test", Role::Admin, Some(org)).await?;

    // Staff may list staff but not add them.
    let (status, headers, _) = t.send(page("/manage-staff/add", Some(&staff_token))?).await?;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&headers), Some("/access-denied"));

    let (status, _, _) = t.send(page("/manage-staff/add", Some(&admin_token))?).await?;
    assert_eq!(status, StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn tampered_or_expired_cookie_redirects_to_login() -> Result<()> {
    let t = spawn_app().await?;
    let org = t.seed_org("Riverside High").await?;
    let (staff, token) = t.seed_user("staff@riverside.test", Role::Staff, Some(org)).await?;

    let tampered = format!("{token}x");
    let (status, headers, _) = t.send(page("/dashboard", Some(&tampered))?).await?;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&headers), Some("/login"));

    let expired = t.jwt.issue_at(&staff, Utc::now() - Duration::hours(25))?;
    let (status, headers, _) = t.send(page("/dashboard", Some(&expired))?).await?;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&headers), Some("/login"));

    Ok(())
}

#[tokio::test]
async fn api_routes_are_not_gated() -> Result<()> {
    let t = spawn_app().await?;

    // No cookie: the gate lets it through and the handler answers for itself.
    let (status, headers, _) = t.send(api("GET", "/api/health", None, None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(location(&headers).is_none());

    let (status, _, body) = t.send(api("GET", "/api/staff", None, None)?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    Ok(())
}

#[tokio::test]
async fn gate_follows_a_loaded_permission_table() -> Result<()> {
    let table = PermissionTable::from_json_str(r#"{ "STAFF": ["/attendance", "/access-denied"] }"#)?;
    let t = spawn_app_with(table).await?;
    let org = t.seed_org("Riverside High").await?;
    let (_, staff) = t.seed_user("staff@riverside.test", Role::Staff, Some(org)).await?;
    let (_, admin) = t.seed_user("admin@riverside.test", Role::Admin, Some(org)).await?;

    let (status, _, _) = t.send(page("/attendance", Some(&staff))?).await?;
    assert_eq!(status, StatusCode::OK);

    // Listing the base page does not open its nested pages.
    let (status, headers, _) = t.send(page("/attendance/mark", Some(&staff))?).await?;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&headers), Some("/access-denied"));

    let (status, headers, _) = t.send(page("/manage-staff", Some(&staff))?).await?;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&headers), Some("/access-denied"));

    // A role absent from the table is denied everything.
    let (status, headers, _) = t.send(page("/dashboard", Some(&admin))?).await?;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&headers), Some("/access-denied"));

    Ok(())
}
