use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{Principal, Role};
use crate::db::conflict_on_unique;
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::student::{Student, StudentCreateRequest, StudentUpdateRequest, STUDENT_COLUMNS};
use crate::routes::ScopeQuery;
use crate::utils::{normalize_email, required, utc_now};

const READERS: &[Role] = &[Role::SuperAdmin, Role::Admin, Role::Staff];
const WRITERS: &[Role] = &[Role::SuperAdmin, Role::Admin];

#[utoipa::path(
    get,
    path = "/api/students",
    tag = "Students",
    params(ScopeQuery),
    responses((status = 200, description = "Students in scope", body = [Student])),
    security(("bearerAuth" = []))
)]
pub async fn list_students(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ScopeQuery>,
) -> AppResult<Json<Vec<Student>>> {
    auth.require_any(READERS)?;
    let scope = auth.scope(query.organization_id)?;

    let students = sqlx::query_as::<_, Student>(&format!(
        "SELECT {STUDENT_COLUMNS} FROM students WHERE (? IS NULL OR organization_id = ?) ORDER BY class_name, roll_number"
    ))
    .bind(scope)
    .bind(scope)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(students))
}

#[utoipa::path(
    post,
    path = "/api/students",
    tag = "Students",
    request_body = StudentCreateRequest,
    responses(
        (status = 201, description = "Student created", body = Student),
        (status = 409, description = "Email or roll number already taken")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_student(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<StudentCreateRequest>,
) -> AppResult<(StatusCode, Json<Student>)> {
    auth.require_any(WRITERS)?;
    let organization_id = auth.owning_organization(payload.organization_id)?;

    let now = utc_now();
    let student = Student {
        id: Uuid::new_v4(),
        organization_id,
        name: required("name", &payload.name)?,
        email: normalize_email(&payload.email)?,
        class_name: required("class_name", &payload.class_name)?,
        roll_number: required("roll_number", &payload.roll_number)?,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        "INSERT INTO students (id, organization_id, name, email, class_name, roll_number, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(student.id)
    .bind(student.organization_id)
    .bind(&student.name)
    .bind(&student.email)
    .bind(&student.class_name)
    .bind(&student.roll_number)
    .bind(student.created_at)
    .bind(student.updated_at)
    .execute(&state.pool)
    .await
    .map_err(|err| conflict_on_unique(err, "student email or roll number already taken"))?;

    Ok((StatusCode::CREATED, Json(student)))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}",
    tag = "Students",
    params(("id" = Uuid, Path, description = "Student id")),
    responses((status = 200, description = "Student detail", body = Student)),
    security(("bearerAuth" = []))
)]
pub async fn get_student(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Student>> {
    auth.require_any(READERS)?;
    Ok(Json(fetch_student(&state.pool, &auth, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/students/{id}",
    tag = "Students",
    params(("id" = Uuid, Path, description = "Student id")),
    request_body = StudentUpdateRequest,
    responses((status = 200, description = "Student updated", body = Student)),
    security(("bearerAuth" = []))
)]
pub async fn update_student(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<StudentUpdateRequest>,
) -> AppResult<Json<Student>> {
    auth.require_any(WRITERS)?;
    let mut student = fetch_student(&state.pool, &auth, id).await?;

    if let Some(name) = payload.name {
        student.name = required("name", &name)?;
    }
    if let Some(email) = payload.email {
        student.email = normalize_email(&email)?;
    }
    if let Some(class_name) = payload.class_name {
        student.class_name = required("class_name", &class_name)?;
    }
    if let Some(roll_number) = payload.roll_number {
        student.roll_number = required("roll_number", &roll_number)?;
    }
    student.updated_at = utc_now();

    sqlx::query("UPDATE students SET name = ?, email = ?, class_name = ?, roll_number = ?, updated_at = ? WHERE id = ?")
        .bind(&student.name)
        .bind(&student.email)
        .bind(&student.class_name)
        .bind(&student.roll_number)
        .bind(student.updated_at)
        .bind(student.id)
        .execute(&state.pool)
        .await
        .map_err(|err| conflict_on_unique(err, "student email or roll number already taken"))?;

    Ok(Json(student))
}

#[utoipa::path(
    delete,
    path = "/api/students/{id}",
    tag = "Students",
    params(("id" = Uuid, Path, description = "Student id")),
    responses((status = 204, description = "Student deleted")),
    security(("bearerAuth" = []))
)]
pub async fn delete_student(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    auth.require_any(WRITERS)?;
    let student = fetch_student(&state.pool, &auth, id).await?;

    sqlx::query("DELETE FROM students WHERE id = ?")
        .bind(student.id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn fetch_student(pool: &SqlitePool, principal: &Principal, id: Uuid) -> AppResult<Student> {
    sqlx::query_as::<_, Student>(&format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .filter(|student| principal.can_reach(student.organization_id))
        .ok_or_else(|| AppError::not_found("student not found"))
}
