use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Staff {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub email: String,
    pub designation: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const STAFF_COLUMNS: &str =
    "id, organization_id, name, email, designation, phone, created_at, updated_at";

#[derive(Debug, Deserialize, ToSchema)]
pub struct StaffCreateRequest {
    #[schema(example = "Grace Hopper")]
    pub name: String,
    #[schema(example = "grace@example.com")]
    pub email: String,
    #[schema(example = "Mathematics teacher")]
    pub designation: Option<String>,
    pub phone: Option<String>,
    /// Required for the super admin, ignored otherwise.
    pub organization_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StaffUpdateRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub designation: Option<String>,
    pub phone: Option<String>,
}
