use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::Role;
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::attendance::{Attendance, AttendanceMarkRequest, DbAttendance, ATTENDANCE_COLUMNS};
use crate::routes::students::fetch_student;
use crate::utils::utc_now;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AttendanceQuery {
    pub organization_id: Option<Uuid>,
    #[param(value_type = Option<String>, format = Date)]
    pub date: Option<NaiveDate>,
    pub student_id: Option<Uuid>,
}

#[utoipa::path(
    get,
    path = "/api/attendance",
    tag = "Attendance",
    params(AttendanceQuery),
    responses((status = 200, description = "Attendance records; students only see their own", body = [Attendance])),
    security(("bearerAuth" = []))
)]
pub async fn list_attendance(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<AttendanceQuery>,
) -> AppResult<Json<Vec<Attendance>>> {
    let scope = auth.scope(query.organization_id)?;
    let own_email = (auth.role == Role::Student).then(|| auth.email.clone());

    let rows = sqlx::query_as::<_, DbAttendance>(&format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance a JOIN students s ON s.id = a.student_id \
         WHERE (? IS NULL OR a.organization_id = ?) \
           AND (? IS NULL OR a.date = ?) \
           AND (? IS NULL OR a.student_id = ?) \
           AND (? IS NULL OR s.email = ?) \
         ORDER BY a.date DESC, s.class_name, s.roll_number"
    ))
    .bind(scope)
    .bind(scope)
    .bind(query.date)
    .bind(query.date)
    .bind(query.student_id)
    .bind(query.student_id)
    .bind(&own_email)
    .bind(&own_email)
    .fetch_all(&state.pool)
    .await?;

    let records = rows
        .into_iter()
        .map(Attendance::try_from)
        .collect::<Result<_, _>>()?;

    Ok(Json(records))
}

/// Marks (or corrects) one student's attendance for a day.
#[utoipa::path(
    post,
    path = "/api/attendance",
    tag = "Attendance",
    request_body = AttendanceMarkRequest,
    responses(
        (status = 200, description = "Attendance recorded", body = Attendance),
        (status = 404, description = "Student not found in scope")
    ),
    security(("bearerAuth" = []))
)]
pub async fn mark_attendance(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<AttendanceMarkRequest>,
) -> AppResult<Json<Attendance>> {
    auth.require_any(&[Role::Admin, Role::Staff])?;
    let student = fetch_student(&state.pool, &auth, payload.student_id).await?;

    sqlx::query(
        "INSERT INTO attendance (id, organization_id, student_id, date, status, marked_by, created_at) VALUES (?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT(student_id, date) DO UPDATE SET status = excluded.status, marked_by = excluded.marked_by",
    )
    .bind(Uuid::new_v4())
    .bind(student.organization_id)
    .bind(student.id)
    .bind(payload.date)
    .bind(payload.status.as_str())
    .bind(auth.user_id)
    .bind(utc_now())
    .execute(&state.pool)
    .await?;

    let row = sqlx::query_as::<_, DbAttendance>(&format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance a WHERE a.student_id = ? AND a.date = ?"
    ))
    .bind(student.id)
    .bind(payload.date)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::internal("attendance row vanished after upsert"))?;

    Ok(Json(row.try_into()?))
}
