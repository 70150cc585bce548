use actix_web::{HttpResponse, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::leave_request::EmployeeQuery;
use crate::error::ApiError;
use crate::service::LeaveService;

#[derive(Serialize, ToSchema)]
pub struct BalanceResponse {
    #[schema(example = 17)]
    pub balance: i64,
}

/// Remaining leave days; employees without a record get the default.
#[utoipa::path(
    get,
    path = "/api/balance",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Remaining days", body = BalanceResponse),
        (status = 400, description = "Email parameter missing", body = Object, example = json!({
            "error": "Email parameter required"
        })),
        (status = 500, description = "Store failure")
    ),
    tag = "Balance"
)]
pub async fn get_balance(
    service: web::Data<LeaveService>,
    query: web::Query<EmployeeQuery>,
) -> Result<HttpResponse, ApiError> {
    let balance = service.balance(query.into_inner().email).await?;
    Ok(HttpResponse::Ok().json(BalanceResponse { balance }))
}
