use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::Role;
use crate::db::conflict_on_unique;
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::staff::{Staff, StaffCreateRequest, StaffUpdateRequest, STAFF_COLUMNS};
use crate::routes::ScopeQuery;
use crate::utils::{normalize_email, required, utc_now};

const READERS: &[Role] = &[Role::SuperAdmin, Role::Admin, Role::Staff];
const WRITERS: &[Role] = &[Role::SuperAdmin, Role::Admin];

#[utoipa::path(
    get,
    path = "/api/staff",
    tag = "Staff",
    params(ScopeQuery),
    responses((status = 200, description = "Staff members in scope", body = [Staff])),
    security(("bearerAuth" = []))
)]
pub async fn list_staff(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ScopeQuery>,
) -> AppResult<Json<Vec<Staff>>> {
    auth.require_any(READERS)?;
    let scope = auth.scope(query.organization_id)?;

    let staff = sqlx::query_as::<_, Staff>(&format!(
        "SELECT {STAFF_COLUMNS} FROM staff WHERE (? IS NULL OR organization_id = ?) ORDER BY name"
    ))
    .bind(scope)
    .bind(scope)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(staff))
}

#[utoipa::path(
    post,
    path = "/api/staff",
    tag = "Staff",
    request_body = StaffCreateRequest,
    responses(
        (status = 201, description = "Staff member created", body = Staff),
        (status = 409, description = "Email already registered in this organization")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_staff(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<StaffCreateRequest>,
) -> AppResult<(StatusCode, Json<Staff>)> {
    auth.require_any(WRITERS)?;
    let organization_id = auth.owning_organization(payload.organization_id)?;

    let name = required("name", &payload.name)?;
    let email = normalize_email(&payload.email)?;
    let now = utc_now();
    let id = Uuid::new_v4();

    sqlx::query(
        "INSERT INTO staff (id, organization_id, name, email, designation, phone, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(organization_id)
    .bind(&name)
    .bind(&email)
    .bind(&payload.designation)
    .bind(&payload.phone)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await
    .map_err(|err| conflict_on_unique(err, "staff email already registered"))?;

    let staff = fetch_staff(&state.pool, &auth, id).await?;
    Ok((StatusCode::CREATED, Json(staff)))
}

#[utoipa::path(
    get,
    path = "/api/staff/{id}",
    tag = "Staff",
    params(("id" = Uuid, Path, description = "Staff id")),
    responses((status = 200, description = "Staff detail", body = Staff)),
    security(("bearerAuth" = []))
)]
pub async fn get_staff(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Staff>> {
    auth.require_any(READERS)?;
    Ok(Json(fetch_staff(&state.pool, &auth, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/staff/{id}",
    tag = "Staff",
    params(("id" = Uuid, Path, description = "Staff id")),
    request_body = StaffUpdateRequest,
    responses((status = 200, description = "Staff updated", body = Staff)),
    security(("bearerAuth" = []))
)]
pub async fn update_staff(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<StaffUpdateRequest>,
) -> AppResult<Json<Staff>> {
    auth.require_any(WRITERS)?;
    let existing = fetch_staff(&state.pool, &auth, id).await?;

    let name = match payload.name {
        Some(name) => required("name", &name)?,
        None => existing.name,
    };
    let email = match payload.email {
        Some(email) => normalize_email(&email)?,
        None => existing.email,
    };
    let designation = payload.designation.or(existing.designation);
    let phone = payload.phone.or(existing.phone);

    sqlx::query("UPDATE staff SET name = ?, email = ?, designation = ?, phone = ?, updated_at = ? WHERE id = ?")
        .bind(&name)
        .bind(&email)
        .bind(&designation)
        .bind(&phone)
        .bind(utc_now())
        .bind(id)
        .execute(&state.pool)
        .await
        .map_err(|err| conflict_on_unique(err, "staff email already registered"))?;

    Ok(Json(fetch_staff(&state.pool, &auth, id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/staff/{id}",
    tag = "Staff",
    params(("id" = Uuid, Path, description = "Staff id")),
    responses((status = 204, description = "Staff deleted")),
    security(("bearerAuth" = []))
)]
pub async fn delete_staff(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    auth.require_any(WRITERS)?;
    fetch_staff(&state.pool, &auth, id).await?;

    sqlx::query("DELETE FROM staff WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Loads a staff row the caller is allowed to see. Rows from other
/// organizations look like missing rows.
async fn fetch_staff(pool: &SqlitePool, auth: &AuthUser, id: Uuid) -> AppResult<Staff> {
    sqlx::query_as::<_, Staff>(&format!("SELECT {STAFF_COLUMNS} FROM staff WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .filter(|staff| auth.can_reach(staff.organization_id))
        .ok_or_else(|| AppError::not_found("staff member not found"))
}
