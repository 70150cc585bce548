use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{error, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};

use crate::error::ApiError;
use crate::model::balance::DEFAULT_BALANCE;
use crate::model::leave_request::{LeaveAction, LeaveRequest, LeaveStatus};
use crate::notify::{ApprovalLinks, Email, Notifier, templates};
use crate::store::{BalanceStore, LeaveStore, Transition};

/// Submission payload. Every field is optional on the wire so a missing one
/// turns into a 400 instead of an extractor failure.
#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
pub struct NewLeave {
    #[schema(example = "a@x.com")]
    pub employee_email: Option<String>,
    #[schema(example = "b@x.com")]
    pub approver_email: Option<String>,
    #[schema(example = "2024-01-01", format = "date")]
    pub start_date: Option<String>,
    #[schema(example = "2024-01-03", format = "date")]
    pub end_date: Option<String>,
    #[schema(example = "trip")]
    pub reason: Option<String>,
}

/// Approve/reject parameters, shared by the JSON call and the email link.
#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct DecisionParams {
    /// id of the leave request
    pub leave_id: Option<String>,
    /// `approve` or `reject`
    pub action: Option<String>,
    /// employee who owns the request
    pub employee_email: Option<String>,
}

impl DecisionParams {
    /// A body carrying any parameter wins over the query string.
    pub fn merge(body: Option<DecisionParams>, query: DecisionParams) -> DecisionParams {
        match body {
            Some(body) if !body.is_empty() => body,
            _ => query,
        }
    }

    fn is_empty(&self) -> bool {
        self.leave_id.is_none() && self.action.is_none() && self.employee_email.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatedLeave {
    pub leave_id: String,
    pub days: i64,
    /// `confirmation_email: ..` / `notification_email: ..` failures
    pub email_errors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Applied(LeaveStatus),
    /// The same decision had already been recorded; nothing changed.
    Repeated(LeaveStatus),
}

fn required(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| ApiError::InvalidDate)
}

/// The leave workflow: submission, balance ledger and approver decisions.
pub struct LeaveService {
    leaves: Arc<dyn LeaveStore>,
    balances: Arc<dyn BalanceStore>,
    notifier: Arc<dyn Notifier>,
    links: ApprovalLinks,
}

impl LeaveService {
    pub fn new(
        leaves: Arc<dyn LeaveStore>,
        balances: Arc<dyn BalanceStore>,
        notifier: Arc<dyn Notifier>,
        links: ApprovalLinks,
    ) -> Self {
        Self {
            leaves,
            balances,
            notifier,
            links,
        }
    }

    #[instrument(name = "create_leave", skip_all)]
    pub async fn create_leave(&self, input: NewLeave) -> Result<CreatedLeave, ApiError> {
        let (Some(employee_email), Some(approver_email), Some(start), Some(end), Some(reason)) = (
            required(input.employee_email),
            required(input.approver_email),
            required(input.start_date),
            required(input.end_date),
            required(input.reason),
        ) else {
            error!("Missing required fields");
            return Err(ApiError::MissingFields);
        };

        let start_date = parse_date(&start)?;
        let end_date = parse_date(&end)?;
        if end_date < start_date {
            return Err(ApiError::InvalidDateRange);
        }

        let leave = LeaveRequest::pending(
            employee_email,
            approver_email,
            start_date,
            end_date,
            reason,
        );
        info!(days = leave.days, "Leave duration computed");

        let available = self.available_balance(&leave.employee_email).await?;
        if available < leave.days {
            error!(available, required = leave.days, "Insufficient balance");
            return Err(ApiError::InsufficientBalance {
                available,
                required: leave.days,
            });
        }

        self.leaves.put(&leave).await?;
        info!(leave_id = %leave.leave_id, employee_email = %leave.employee_email, "Leave saved");

        let mut email_errors = Vec::new();
        if let Err(e) = self.notifier.send(&templates::confirmation(&leave)).await {
            error!(error = %e, "Failed to send confirmation email");
            email_errors.push(format!("confirmation_email: {}", e));
        }
        let approver_email = templates::approver_request(&leave, &self.links);
        if let Err(e) = self.notifier.send(&approver_email).await {
            error!(error = %e, "Failed to send notification email");
            email_errors.push(format!("notification_email: {}", e));
        }

        Ok(CreatedLeave {
            leave_id: leave.leave_id,
            days: leave.days,
            email_errors,
        })
    }

    /// Reads the employee's balance, seeding the default on first use.
    async fn available_balance(&self, employee_email: &str) -> Result<i64, ApiError> {
        let record = self
            .balances
            .get(employee_email)
            .await
            .map_err(ApiError::BalanceCheck)?;

        match record {
            Some(record) => Ok(record.balance),
            None => {
                warn!(
                    employee_email,
                    "No balance record, initializing with {} days", DEFAULT_BALANCE
                );
                let record = self
                    .balances
                    .init(employee_email, DEFAULT_BALANCE)
                    .await
                    .map_err(ApiError::BalanceCheck)?;
                Ok(record.balance)
            }
        }
    }

    #[instrument(name = "decide_leave", skip_all)]
    pub async fn decide(&self, params: DecisionParams) -> Result<Decision, ApiError> {
        let (Some(leave_id), Some(action), Some(employee_email)) = (
            required(params.leave_id),
            required(params.action),
            required(params.employee_email),
        ) else {
            error!("Missing required parameters");
            return Err(ApiError::MissingParameters);
        };
        let action: LeaveAction = action.parse().map_err(|_| ApiError::InvalidAction)?;
        let target = action.target_status();
        info!(%leave_id, %action, "Processing decision");

        let leave = self.leaves.get(&leave_id).await?.ok_or_else(|| {
            error!(%leave_id, "Leave not found");
            ApiError::NotFound
        })?;
        if leave.employee_email != employee_email {
            return Err(ApiError::EmployeeMismatch);
        }

        match self.leaves.transition(&leave_id, target).await? {
            Transition::Applied => {
                info!(%leave_id, status = %target, "Leave status updated");
            }
            Transition::Stale(current) if current == target => {
                info!(%leave_id, status = %current, "Decision already recorded");
                return Ok(Decision::Repeated(current));
            }
            Transition::Stale(current) => return Err(ApiError::AlreadyProcessed(current)),
            Transition::Missing => return Err(ApiError::NotFound),
        }

        if target == LeaveStatus::Approved {
            match self.balances.deduct(&leave.employee_email, leave.days).await {
                Ok(remaining) => info!(
                    employee_email = %leave.employee_email,
                    days = leave.days,
                    remaining,
                    "Balance deducted"
                ),
                Err(e) => error!(
                    error = %e,
                    employee_email = %leave.employee_email,
                    days = leave.days,
                    "Failed to deduct balance"
                ),
            }
        }

        self.notify(&templates::status_update(&leave.employee_email, target))
            .await;

        Ok(Decision::Applied(target))
    }

    async fn notify(&self, email: &Email) {
        match self.notifier.send(email).await {
            Ok(()) => info!(to = %email.to, "Notification email sent"),
            Err(e) => error!(error = %e, to = %email.to, "Failed to send email"),
        }
    }

    /// Current balance, or the default for employees without a record. Never
    /// writes.
    pub async fn balance(&self, employee_email: Option<String>) -> Result<i64, ApiError> {
        let email = required(employee_email).ok_or(ApiError::MissingParameter("Email"))?;
        match self.balances.get(&email).await? {
            Some(record) => Ok(record.balance),
            None => {
                info!(employee_email = %email, "No balance record, returning default");
                Ok(DEFAULT_BALANCE)
            }
        }
    }

    pub async fn list_all(&self) -> Result<Vec<LeaveRequest>, ApiError> {
        let leaves = self.leaves.scan().await?;
        info!(count = leaves.len(), "Fetched all leaves");
        Ok(leaves)
    }

    pub async fn list_for_employee(
        &self,
        employee_email: Option<String>,
    ) -> Result<Vec<LeaveRequest>, ApiError> {
        let email = required(employee_email).ok_or(ApiError::MissingParameter("Email"))?;
        let leaves = self.leaves.scan_by_employee(&email).await?;
        info!(count = leaves.len(), employee_email = %email, "Fetched employee leaves");
        Ok(leaves)
    }
}
