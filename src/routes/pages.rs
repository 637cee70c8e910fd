//! Browser pages. Rendering lives in the frontend; these handlers only return
//! the shell data a page needs, using the identity the session gate attached.

use axum::extract::Extension;
use axum::http::Uri;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::app::AppState;
use crate::authz::Principal;
use crate::gate::{LOGIN_PATH, SIGNUP_PATH};

/// Pages behind the session gate.
pub const GUARDED_PAGES: &[&str] = &[
    "/",
    "/dashboard",
    "/profile",
    "/access-denied",
    "/manage-organization",
    "/manage-organization/add",
    "/manage-admin",
    "/manage-admin/add",
    "/manage-staff",
    "/manage-staff/add",
    "/manage-student",
    "/manage-student/add",
    "/manage-course",
    "/manage-course/add",
    "/attendance",
    "/attendance/mark",
    "/leave",
    "/leave/apply",
    "/results",
    "/results/add",
];

#[derive(Debug, Serialize)]
pub struct PageShell {
    pub page: String,
    pub user: Option<Principal>,
}

pub async fn page_shell(uri: Uri, principal: Option<Extension<Principal>>) -> Json<PageShell> {
    Json(PageShell {
        page: uri.path().to_string(),
        user: principal.map(|Extension(principal)| principal),
    })
}

pub fn routes() -> Router<AppState> {
    [LOGIN_PATH, SIGNUP_PATH]
        .iter()
        .chain(GUARDED_PAGES)
        .fold(Router::new(), |router, path| router.route(path, get(page_shell)))
}
