use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Student {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub email: String,
    pub class_name: String,
    pub roll_number: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const STUDENT_COLUMNS: &str =
    "id, organization_id, name, email, class_name, roll_number, created_at, updated_at";

#[derive(Debug, Deserialize, ToSchema)]
pub struct StudentCreateRequest {
    #[schema(example = "Alan Turing")]
    pub name: String,
    #[schema(example = "alan@example.com")]
    pub email: String,
    #[schema(example = "10-A")]
    pub class_name: String,
    #[schema(example = "17")]
    pub roll_number: String,
    pub organization_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StudentUpdateRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub class_name: Option<String>,
    pub roll_number: Option<String>,
}
