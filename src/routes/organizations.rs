use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::Role;
use crate::db::conflict_on_unique;
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::organization::{Organization, OrganizationCreateRequest};
use crate::utils::{required, utc_now};

const COLUMNS: &str = "id, name, created_at, updated_at";

#[utoipa::path(
    get,
    path = "/api/organizations",
    tag = "Organizations",
    responses((status = 200, description = "Organizations visible to the caller", body = [Organization])),
    security(("bearerAuth" = []))
)]
pub async fn list_organizations(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Vec<Organization>>> {
    let scope = auth.scope(None)?;

    let organizations = sqlx::query_as::<_, Organization>(&format!(
        "SELECT {COLUMNS} FROM organizations WHERE (? IS NULL OR id = ?) ORDER BY name"
    ))
    .bind(scope)
    .bind(scope)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(organizations))
}

#[utoipa::path(
    post,
    path = "/api/organizations",
    tag = "Organizations",
    request_body = OrganizationCreateRequest,
    responses(
        (status = 201, description = "Organization created", body = Organization),
        (status = 403, description = "Caller is not the super admin"),
        (status = 409, description = "Name already taken")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_organization(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<OrganizationCreateRequest>,
) -> AppResult<(StatusCode, Json<Organization>)> {
    auth.require_any(&[Role::SuperAdmin])?;

    let name = required("name", &payload.name)?;
    let now = utc_now();
    let organization = Organization {
        id: Uuid::new_v4(),
        name,
        created_at: now,
        updated_at: now,
    };

    sqlx::query("INSERT INTO organizations (id, name, created_at, updated_at) VALUES (?, ?, ?, ?)")
        .bind(organization.id)
        .bind(&organization.name)
        .bind(organization.created_at)
        .bind(organization.updated_at)
        .execute(&state.pool)
        .await
        .map_err(|err| conflict_on_unique(err, "organization name already taken"))?;

    tracing::info!(organization_id = %organization.id, actor = %auth.user_id, "organization created");

    Ok((StatusCode::CREATED, Json(organization)))
}

#[utoipa::path(
    get,
    path = "/api/organizations/{id}",
    tag = "Organizations",
    params(("id" = Uuid, Path, description = "Organization id")),
    responses((status = 200, description = "Organization detail", body = Organization)),
    security(("bearerAuth" = []))
)]
pub async fn get_organization(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Organization>> {
    if !auth.can_reach(id) {
        return Err(AppError::not_found("organization not found"));
    }

    let organization = sqlx::query_as::<_, Organization>(&format!("SELECT {COLUMNS} FROM organizations WHERE id = ?"))
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::not_found("organization not found"))?;

    Ok(Json(organization))
}

#[utoipa::path(
    delete,
    path = "/api/organizations/{id}",
    tag = "Organizations",
    params(("id" = Uuid, Path, description = "Organization id")),
    responses((status = 204, description = "Organization and its records deleted")),
    security(("bearerAuth" = []))
)]
pub async fn delete_organization(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    auth.require_any(&[Role::SuperAdmin])?;

    let result = sqlx::query("DELETE FROM organizations WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("organization not found"));
    }

    tracing::info!(organization_id = %id, actor = %auth.user_id, "organization deleted");

    Ok(StatusCode::NO_CONTENT)
}
