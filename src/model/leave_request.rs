use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LeaveStatus::Pending)
    }
}

/// What an approver asked for, either through the email link or a JSON call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum LeaveAction {
    Approve,
    Reject,
}

impl LeaveAction {
    /// Status a pending request moves to when this action is applied.
    pub fn target_status(&self) -> LeaveStatus {
        match self {
            LeaveAction::Approve => LeaveStatus::Approved,
            LeaveAction::Reject => LeaveStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "leave_id": "0b6f3a62-8b0e-4df4-9a39-1f3f4b1d2c10",
    "employee_email": "a@x.com",
    "approver_email": "b@x.com",
    "start_date": "2024-01-01",
    "end_date": "2024-01-03",
    "reason": "trip",
    "status": "pending",
    "created_at": "2024-01-01T09:00:00Z",
    "days": 3
}))]
pub struct LeaveRequest {
    pub leave_id: String,
    pub employee_email: String,
    pub approver_email: String,
    #[schema(example = "2024-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2024-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    pub reason: String,
    pub status: LeaveStatus,
    #[schema(example = "2024-01-01T09:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    /// inclusive day span, captured once at submission
    pub days: i64,
}

impl LeaveRequest {
    /// Builds a fresh pending request with a new id and its day count.
    pub fn pending(
        employee_email: String,
        approver_email: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: String,
    ) -> Self {
        Self {
            leave_id: Uuid::new_v4().to_string(),
            employee_email,
            approver_email,
            start_date,
            end_date,
            reason,
            status: LeaveStatus::Pending,
            created_at: Utc::now(),
            days: inclusive_days(start_date, end_date),
        }
    }
}

/// Number of calendar days covered by `start..=end`.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}
