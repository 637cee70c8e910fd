use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::Role;
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::leave::{
    DbLeaveRequest, LeaveCreateRequest, LeaveRequest, LeaveReviewRequest, LeaveStatus, LEAVE_COLUMNS,
};
use crate::routes::ScopeQuery;
use crate::utils::{required, utc_now};

const REVIEWERS: &[Role] = &[Role::SuperAdmin, Role::Admin];

#[utoipa::path(
    get,
    path = "/api/leaves",
    tag = "Leaves",
    params(ScopeQuery),
    responses((status = 200, description = "Leave requests; staff and students see their own", body = [LeaveRequest])),
    security(("bearerAuth" = []))
)]
pub async fn list_leaves(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ScopeQuery>,
) -> AppResult<Json<Vec<LeaveRequest>>> {
    let scope = auth.scope(query.organization_id)?;
    let requester = (!auth.has_any_role(REVIEWERS)).then_some(auth.user_id);

    let rows = sqlx::query_as::<_, DbLeaveRequest>(&format!(
        "SELECT {LEAVE_COLUMNS} FROM leave_requests \
         WHERE (? IS NULL OR organization_id = ?) AND (? IS NULL OR requester_id = ?) \
         ORDER BY created_at DESC"
    ))
    .bind(scope)
    .bind(scope)
    .bind(requester)
    .bind(requester)
    .fetch_all(&state.pool)
    .await?;

    let leaves = rows
        .into_iter()
        .map(LeaveRequest::try_from)
        .collect::<Result<_, _>>()?;

    Ok(Json(leaves))
}

#[utoipa::path(
    post,
    path = "/api/leaves",
    tag = "Leaves",
    request_body = LeaveCreateRequest,
    responses(
        (status = 201, description = "Leave request filed", body = LeaveRequest),
        (status = 400, description = "Invalid date range")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_leave(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<LeaveCreateRequest>,
) -> AppResult<(StatusCode, Json<LeaveRequest>)> {
    let organization_id = auth.owning_organization(None)?;
    let reason = required("reason", &payload.reason)?;

    if payload.end_date < payload.start_date {
        return Err(AppError::bad_request("end_date must not be before start_date"));
    }

    let now = utc_now();
    let leave = LeaveRequest {
        id: Uuid::new_v4(),
        organization_id,
        requester_id: auth.user_id,
        reason,
        start_date: payload.start_date,
        end_date: payload.end_date,
        status: LeaveStatus::Pending,
        reviewed_by: None,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        "INSERT INTO leave_requests (id, organization_id, requester_id, reason, start_date, end_date, status, reviewed_by, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(leave.id)
    .bind(leave.organization_id)
    .bind(leave.requester_id)
    .bind(&leave.reason)
    .bind(leave.start_date)
    .bind(leave.end_date)
    .bind(leave.status.as_str())
    .bind(leave.reviewed_by)
    .bind(leave.created_at)
    .bind(leave.updated_at)
    .execute(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(leave)))
}

#[utoipa::path(
    put,
    path = "/api/leaves/{id}",
    tag = "Leaves",
    params(("id" = Uuid, Path, description = "Leave request id")),
    request_body = LeaveReviewRequest,
    responses(
        (status = 200, description = "Leave request decided", body = LeaveRequest),
        (status = 403, description = "Caller is not a reviewer, or is the requester"),
        (status = 409, description = "Request was already decided")
    ),
    security(("bearerAuth" = []))
)]
pub async fn review_leave(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<LeaveReviewRequest>,
) -> AppResult<Json<LeaveRequest>> {
    auth.require_any(REVIEWERS)?;
    let mut leave = fetch_leave(&state.pool, &auth, id).await?;

    if leave.requester_id == auth.user_id {
        return Err(AppError::forbidden("you cannot review your own leave request"));
    }

    if !leave.status.can_transition_to(payload.status) {
        return Err(AppError::conflict(format!(
            "cannot move leave request from {} to {}",
            leave.status.as_str(),
            payload.status.as_str()
        )));
    }

    leave.status = payload.status;
    leave.reviewed_by = Some(auth.user_id);
    leave.updated_at = utc_now();

    // A concurrent review may have decided it since the read above.
    let result = sqlx::query(
        "UPDATE leave_requests SET status = ?, reviewed_by = ?, updated_at = ? WHERE id = ? AND status = 'PENDING'",
    )
    .bind(leave.status.as_str())
    .bind(leave.reviewed_by)
    .bind(leave.updated_at)
    .bind(leave.id)
    .execute(&state.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::conflict("leave request was already decided"));
    }

    tracing::info!(leave_id = %leave.id, status = leave.status.as_str(), reviewer = %auth.user_id, "leave reviewed");

    Ok(Json(leave))
}

async fn fetch_leave(pool: &SqlitePool, auth: &AuthUser, id: Uuid) -> AppResult<LeaveRequest> {
    let row = sqlx::query_as::<_, DbLeaveRequest>(&format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .filter(|leave| auth.can_reach(leave.organization_id))
        .ok_or_else(|| AppError::not_found("leave request not found"))?;

    row.try_into()
}
