use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::Role;
use crate::db::conflict_on_unique;
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::course::{Course, CourseCreateRequest};
use crate::routes::ScopeQuery;
use crate::utils::{required, utc_now};

#[utoipa::path(
    get,
    path = "/api/courses",
    tag = "Courses",
    params(ScopeQuery),
    responses((status = 200, description = "Courses in scope", body = [Course])),
    security(("bearerAuth" = []))
)]
pub async fn list_courses(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ScopeQuery>,
) -> AppResult<Json<Vec<Course>>> {
    let scope = auth.scope(query.organization_id)?;

    let courses = sqlx::query_as::<_, Course>(
        "SELECT id, organization_id, code, name, description, created_at FROM courses WHERE (? IS NULL OR organization_id = ?) ORDER BY code",
    )
    .bind(scope)
    .bind(scope)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(courses))
}

#[utoipa::path(
    post,
    path = "/api/courses",
    tag = "Courses",
    request_body = CourseCreateRequest,
    responses(
        (status = 201, description = "Course created", body = Course),
        (status = 409, description = "Course code already used")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_course(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CourseCreateRequest>,
) -> AppResult<(StatusCode, Json<Course>)> {
    auth.require_any(&[Role::SuperAdmin, Role::Admin])?;

    let course = Course {
        id: Uuid::new_v4(),
        organization_id: auth.owning_organization(payload.organization_id)?,
        code: required("code", &payload.code)?.to_uppercase(),
        name: required("name", &payload.name)?,
        description: payload.description,
        created_at: utc_now(),
    };

    sqlx::query("INSERT INTO courses (id, organization_id, code, name, description, created_at) VALUES (?, ?, ?, ?, ?, ?)")
        .bind(course.id)
        .bind(course.organization_id)
        .bind(&course.code)
        .bind(&course.name)
        .bind(&course.description)
        .bind(course.created_at)
        .execute(&state.pool)
        .await
        .map_err(|err| conflict_on_unique(err, "course code already used"))?;

    Ok((StatusCode::CREATED, Json(course)))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{id}",
    tag = "Courses",
    params(("id" = Uuid, Path, description = "Course id")),
    responses((status = 204, description = "Course deleted")),
    security(("bearerAuth" = []))
)]
pub async fn delete_course(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    auth.require_any(&[Role::SuperAdmin, Role::Admin])?;
    let scope = auth.scope(None)?;

    let result = sqlx::query("DELETE FROM courses WHERE id = ? AND (? IS NULL OR organization_id = ?)")
        .bind(id)
        .bind(scope)
        .bind(scope)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("course not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
