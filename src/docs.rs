use crate::api::balance::BalanceResponse;
use crate::api::leave_request::{CreateLeaveResponse, MessageResponse};
use crate::model::balance::BalanceRecord;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::service::{DecisionParams, NewLeave};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "SmartLeave API",
        version = "0.1.0",
        description = r#"
## Leave request workflow

Employees submit leave requests, approvers get an email with approve/reject
links, and a per-employee ledger tracks the remaining leave days.

### Lifecycle
- A request starts **pending** and moves once to **approved** or **rejected**.
- Approving deducts the request's day count from the employee's balance.
- Employees without a ledger entry start with **20** days.

### Response Format
- JSON bodies; failures carry a single `error` string.
"#,
    ),
    paths(
        crate::api::leave_request::create_leave,
        crate::api::leave_request::preflight,
        crate::api::leave_request::decide_leave,
        crate::api::leave_request::decide_leave_link,
        crate::api::leave_request::list_leaves,
        crate::api::leave_request::employee_leaves,

        crate::api::balance::get_balance
    ),
    components(
        schemas(
            NewLeave,
            DecisionParams,
            LeaveRequest,
            LeaveStatus,
            BalanceRecord,
            CreateLeaveResponse,
            MessageResponse,
            BalanceResponse
        )
    ),
    tags(
        (name = "Leave", description = "Leave request APIs"),
        (name = "Balance", description = "Leave balance APIs"),
    )
)]
pub struct ApiDoc;
