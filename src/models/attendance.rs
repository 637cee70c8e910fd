use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "PRESENT",
            AttendanceStatus::Absent => "ABSENT",
            AttendanceStatus::Late => "LATE",
        }
    }
}

impl FromStr for AttendanceStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PRESENT" => Ok(AttendanceStatus::Present),
            "ABSENT" => Ok(AttendanceStatus::Absent),
            "LATE" => Ok(AttendanceStatus::Late),
            other => Err(AppError::internal(format!("unknown attendance status: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Attendance {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub student_id: Uuid,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub marked_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbAttendance {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub student_id: Uuid,
    pub date: NaiveDate,
    pub status: String,
    pub marked_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbAttendance> for Attendance {
    type Error = AppError;

    fn try_from(value: DbAttendance) -> Result<Self, Self::Error> {
        Ok(Attendance {
            id: value.id,
            organization_id: value.organization_id,
            student_id: value.student_id,
            date: value.date,
            status: value.status.parse()?,
            marked_by: value.marked_by,
            created_at: value.created_at,
        })
    }
}

pub const ATTENDANCE_COLUMNS: &str =
    "a.id, a.organization_id, a.student_id, a.date, a.status, a.marked_by, a.created_at";

#[derive(Debug, Deserialize, ToSchema)]
pub struct AttendanceMarkRequest {
    pub student_id: Uuid,
    #[schema(value_type = String, format = Date, example = "2025-03-14")]
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}
