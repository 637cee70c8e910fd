use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveStatus::Pending => "PENDING",
            LeaveStatus::Approved => "APPROVED",
            LeaveStatus::Rejected => "REJECTED",
        }
    }

    /// Only pending requests can be decided, and only into a final state.
    pub fn can_transition_to(&self, next: LeaveStatus) -> bool {
        *self == LeaveStatus::Pending && next != LeaveStatus::Pending
    }
}

impl FromStr for LeaveStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(LeaveStatus::Pending),
            "APPROVED" => Ok(LeaveStatus::Approved),
            "REJECTED" => Ok(LeaveStatus::Rejected),
            other => Err(AppError::internal(format!("unknown leave status: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LeaveRequest {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub requester_id: Uuid,
    pub reason: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: LeaveStatus,
    pub reviewed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbLeaveRequest {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub requester_id: Uuid,
    pub reason: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: String,
    pub reviewed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbLeaveRequest> for LeaveRequest {
    type Error = AppError;

    fn try_from(value: DbLeaveRequest) -> Result<Self, Self::Error> {
        Ok(LeaveRequest {
            id: value.id,
            organization_id: value.organization_id,
            requester_id: value.requester_id,
            reason: value.reason,
            start_date: value.start_date,
            end_date: value.end_date,
            status: value.status.parse()?,
            reviewed_by: value.reviewed_by,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

pub const LEAVE_COLUMNS: &str = "id, organization_id, requester_id, reason, start_date, end_date, status, reviewed_by, created_at, updated_at";

#[derive(Debug, Deserialize, ToSchema)]
pub struct LeaveCreateRequest {
    #[schema(example = "Family event")]
    pub reason: String,
    #[schema(value_type = String, format = Date, example = "2025-04-01")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = Date, example = "2025-04-03")]
    pub end_date: NaiveDate,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LeaveReviewRequest {
    pub status: LeaveStatus,
}
