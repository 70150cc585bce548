use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use derive_more::Display;
use serde_json::json;

use crate::model::leave_request::LeaveStatus;
use crate::store::StoreError;

/// Every failure an operation can report to a caller.
#[derive(Debug, Display)]
pub enum ApiError {
    #[display(fmt = "Missing required fields")]
    MissingFields,
    #[display(fmt = "Missing parameters")]
    MissingParameters,
    #[display(fmt = "{} parameter required", _0)]
    MissingParameter(&'static str),
    #[display(fmt = "Invalid JSON in request body")]
    InvalidJson,
    #[display(fmt = "Invalid query parameters")]
    InvalidQuery,
    #[display(fmt = "Invalid date format, expected YYYY-MM-DD")]
    InvalidDate,
    #[display(fmt = "end_date cannot be before start_date")]
    InvalidDateRange,
    #[display(fmt = "Invalid action, expected approve or reject")]
    InvalidAction,
    #[display(fmt = "employee_email does not match leave request")]
    EmployeeMismatch,
    #[display(
        fmt = "Insufficient leave balance. Available: {}, Required: {}",
        available,
        required
    )]
    InsufficientBalance { available: i64, required: i64 },
    #[display(fmt = "Leave already {}", _0)]
    AlreadyProcessed(LeaveStatus),
    #[display(fmt = "Leave not found")]
    NotFound,
    #[display(fmt = "Balance check failed: {}", _0)]
    BalanceCheck(StoreError),
    #[display(fmt = "{}", _0)]
    Internal(String),
}

impl std::error::Error for ApiError {}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        ApiError::Internal(value.to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::BalanceCheck(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}
