use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::ApiError;
use crate::model::leave_request::LeaveRequest;
use crate::service::{CreatedLeave, Decision, DecisionParams, LeaveService, NewLeave};

#[derive(Serialize, ToSchema)]
#[schema(example = json!({
    "message": "Leave applied successfully",
    "leave_id": "0b6f3a62-8b0e-4df4-9a39-1f3f4b1d2c10",
    "days": 3
}))]
pub struct CreateLeaveResponse {
    pub message: String,
    pub leave_id: String,
    pub days: i64,
    /// notification failures; the leave itself was stored
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub email_errors: Vec<String>,
}

impl From<CreatedLeave> for CreateLeaveResponse {
    fn from(created: CreatedLeave) -> Self {
        Self {
            message: "Leave applied successfully".to_string(),
            leave_id: created.leave_id,
            days: created.days,
            email_errors: created.email_errors,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Leave approved")]
    pub message: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmployeeQuery {
    /// Employee email to filter on
    pub email: Option<String>,
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leaves",
    request_body(
        content = NewLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave stored as pending", body = CreateLeaveResponse),
        (status = 400, description = "Missing fields, bad dates or insufficient balance", body = Object, example = json!({
            "error": "Insufficient leave balance. Available: 2, Required: 3"
        })),
        (status = 500, description = "Balance check or store failure")
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    service: web::Data<LeaveService>,
    payload: web::Json<NewLeave>,
) -> Result<HttpResponse, ApiError> {
    let created = service.create_leave(payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(CreateLeaveResponse::from(created)))
}

/// CORS preflight for the create endpoint
#[utoipa::path(
    options,
    path = "/api/leaves",
    responses((status = 204, description = "Preflight accepted")),
    tag = "Leave"
)]
pub async fn preflight() -> HttpResponse {
    HttpResponse::NoContent()
        .insert_header(ContentType::json())
        .finish()
}

/* =========================
Approve / reject
========================= */
async fn record_decision(
    service: &LeaveService,
    params: DecisionParams,
) -> Result<HttpResponse, ApiError> {
    let message = match service.decide(params).await? {
        Decision::Applied(status) => format!("Leave {}", status),
        Decision::Repeated(status) => format!("Leave already {}", status),
    };
    Ok(HttpResponse::Ok().json(MessageResponse { message }))
}

/// Accepts the parameters either as a JSON body or as query parameters; a
/// body carrying any of them wins.
#[utoipa::path(
    post,
    path = "/api/leaves/decision",
    params(DecisionParams),
    request_body(
        content = DecisionParams,
        description = "Same parameters as the query string",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Decision recorded", body = MessageResponse),
        (status = 400, description = "Missing parameters, bad action or already decided", body = Object, example = json!({
            "error": "Missing parameters"
        })),
        (status = 404, description = "Unknown leave id", body = Object, example = json!({
            "error": "Leave not found"
        })),
        (status = 500, description = "Store failure")
    ),
    tag = "Leave"
)]
pub async fn decide_leave(
    service: web::Data<LeaveService>,
    query: web::Query<DecisionParams>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        Some(serde_json::from_slice::<DecisionParams>(&body).map_err(|_| ApiError::InvalidJson)?)
    };
    record_decision(&service, DecisionParams::merge(body, query.into_inner())).await
}

/// Target of the approve/reject links in the approver's email.
#[utoipa::path(
    get,
    path = "/api/leaves/decision",
    params(DecisionParams),
    responses(
        (status = 200, description = "Decision recorded, or the same decision repeated", body = MessageResponse, example = json!({
            "message": "Leave already approved"
        })),
        (status = 400, description = "Missing parameters, bad action or already decided", body = Object, example = json!({
            "error": "Leave already rejected"
        })),
        (status = 404, description = "Unknown leave id", body = Object, example = json!({
            "error": "Leave not found"
        })),
        (status = 500, description = "Store failure")
    ),
    tag = "Leave"
)]
pub async fn decide_leave_link(
    service: web::Data<LeaveService>,
    query: web::Query<DecisionParams>,
) -> Result<HttpResponse, ApiError> {
    record_decision(&service, query.into_inner()).await
}

/* =========================
Listing
========================= */
#[utoipa::path(
    get,
    path = "/api/leaves",
    responses(
        (status = 200, description = "Every leave request, unordered", body = [LeaveRequest]),
        (status = 500, description = "Store failure")
    ),
    tag = "Leave"
)]
pub async fn list_leaves(service: web::Data<LeaveService>) -> Result<HttpResponse, ApiError> {
    let leaves = service.list_all().await?;
    Ok(HttpResponse::Ok().json(leaves))
}

#[utoipa::path(
    get,
    path = "/api/leaves/employee",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Leave requests of one employee", body = [LeaveRequest]),
        (status = 400, description = "Email parameter missing", body = Object, example = json!({
            "error": "Email parameter required"
        })),
        (status = 500, description = "Store failure")
    ),
    tag = "Leave"
)]
pub async fn employee_leaves(
    service: web::Data<LeaveService>,
    query: web::Query<EmployeeQuery>,
) -> Result<HttpResponse, ApiError> {
    let leaves = service.list_for_employee(query.into_inner().email).await?;
    Ok(HttpResponse::Ok().json(leaves))
}
