use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::Role;
use crate::db::conflict_on_unique;
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::exam_result::{ExamResult, ExamResultCreateRequest, RESULT_COLUMNS};
use crate::routes::students::fetch_student;
use crate::utils::{required, utc_now};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ResultQuery {
    pub organization_id: Option<Uuid>,
    pub student_id: Option<Uuid>,
    pub exam_type: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/results",
    tag = "Results",
    params(ResultQuery),
    responses((status = 200, description = "Exam results; students only see their own", body = [ExamResult])),
    security(("bearerAuth" = []))
)]
pub async fn list_results(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ResultQuery>,
) -> AppResult<Json<Vec<ExamResult>>> {
    let scope = auth.scope(query.organization_id)?;
    let own_email = (auth.role == Role::Student).then(|| auth.email.clone());

    let results = sqlx::query_as::<_, ExamResult>(&format!(
        "SELECT {RESULT_COLUMNS} FROM results r JOIN students s ON s.id = r.student_id \
         WHERE (? IS NULL OR r.organization_id = ?) \
           AND (? IS NULL OR r.student_id = ?) \
           AND (? IS NULL OR r.exam_type = ?) \
           AND (? IS NULL OR s.email = ?) \
         ORDER BY r.exam_type, r.subject"
    ))
    .bind(scope)
    .bind(scope)
    .bind(query.student_id)
    .bind(query.student_id)
    .bind(&query.exam_type)
    .bind(&query.exam_type)
    .bind(&own_email)
    .bind(&own_email)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(results))
}

#[utoipa::path(
    post,
    path = "/api/results",
    tag = "Results",
    request_body = ExamResultCreateRequest,
    responses(
        (status = 201, description = "Result recorded", body = ExamResult),
        (status = 400, description = "Marks out of range"),
        (status = 409, description = "Result already recorded for this exam and subject")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_result(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ExamResultCreateRequest>,
) -> AppResult<(StatusCode, Json<ExamResult>)> {
    auth.require_any(&[Role::Admin, Role::Staff])?;

    if !(payload.max_marks > 0.0 && (0.0..=payload.max_marks).contains(&payload.marks)) {
        return Err(AppError::bad_request("marks must be between 0 and max_marks"));
    }

    let student = fetch_student(&state.pool, &auth, payload.student_id).await?;
    let result = ExamResult {
        id: Uuid::new_v4(),
        organization_id: student.organization_id,
        student_id: student.id,
        exam_type: required("exam_type", &payload.exam_type)?,
        subject: required("subject", &payload.subject)?,
        marks: payload.marks,
        max_marks: payload.max_marks,
        recorded_by: auth.user_id,
        created_at: utc_now(),
    };

    sqlx::query(
        "INSERT INTO results (id, organization_id, student_id, exam_type, subject, marks, max_marks, recorded_by, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(result.id)
    .bind(result.organization_id)
    .bind(result.student_id)
    .bind(&result.exam_type)
    .bind(&result.subject)
    .bind(result.marks)
    .bind(result.max_marks)
    .bind(result.recorded_by)
    .bind(result.created_at)
    .execute(&state.pool)
    .await
    .map_err(|err| conflict_on_unique(err, "result already recorded"))?;

    Ok((StatusCode::CREATED, Json(result)))
}
