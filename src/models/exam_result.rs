use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ExamResult {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub student_id: Uuid,
    pub exam_type: String,
    pub subject: String,
    pub marks: f64,
    pub max_marks: f64,
    pub recorded_by: Uuid,
    pub created_at: DateTime<Utc>,
}

pub const RESULT_COLUMNS: &str =
    "r.id, r.organization_id, r.student_id, r.exam_type, r.subject, r.marks, r.max_marks, r.recorded_by, r.created_at";

#[derive(Debug, Deserialize, ToSchema)]
pub struct ExamResultCreateRequest {
    pub student_id: Uuid,
    #[schema(example = "Midterm")]
    pub exam_type: String,
    #[schema(example = "Mathematics")]
    pub subject: String,
    #[schema(example = 78.5)]
    pub marks: f64,
    #[schema(example = 100.0)]
    pub max_marks: f64,
}
