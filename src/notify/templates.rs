use url::Url;

use super::Email;
use crate::model::leave_request::{LeaveAction, LeaveRequest, LeaveStatus};

/// Builds the approve/reject links embedded in approver emails.
#[derive(Debug, Clone)]
pub struct ApprovalLinks {
    base: Url,
}

impl ApprovalLinks {
    pub fn new(base: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            base: Url::parse(base)?,
        })
    }

    pub fn link(&self, leave: &LeaveRequest, action: LeaveAction) -> String {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("leave_id", &leave.leave_id)
            .append_pair("action", action.as_ref())
            .append_pair("employee_email", &leave.employee_email);
        url.into()
    }
}

pub fn confirmation(leave: &LeaveRequest) -> Email {
    Email {
        to: leave.employee_email.clone(),
        subject: "Leave Application Received".to_string(),
        body: format!(
            "Your leave request from {} to {} ({} days) has been received.\n\n\
             Reason: {}\n\n\
             Your request is pending approval.",
            leave.start_date, leave.end_date, leave.days, leave.reason
        ),
    }
}

pub fn approver_request(leave: &LeaveRequest, links: &ApprovalLinks) -> Email {
    let body = format!(
        r#"Dear Approver,

Employee {employee} has applied for leave.

Leave Details:
- Start Date: {start}
- End Date: {end}
- Duration: {days} days
- Reason: {reason}

Please review and take action:

APPROVE: {approve}

REJECT: {reject}

Regards,
SmartLeave System
"#,
        employee = leave.employee_email,
        start = leave.start_date,
        end = leave.end_date,
        days = leave.days,
        reason = leave.reason,
        approve = links.link(leave, LeaveAction::Approve),
        reject = links.link(leave, LeaveAction::Reject),
    );

    Email {
        to: leave.approver_email.clone(),
        subject: format!("New Leave Request to Approve - {}", leave.employee_email),
        body,
    }
}

pub fn status_update(employee_email: &str, status: LeaveStatus) -> Email {
    let label = match status {
        LeaveStatus::Pending => "Pending",
        LeaveStatus::Approved => "Approved",
        LeaveStatus::Rejected => "Rejected",
    };
    Email {
        to: employee_email.to_string(),
        subject: format!("Leave {}", label),
        body: format!("Your leave has been {}.", status),
    }
}
