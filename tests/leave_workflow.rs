mod common;

use std::sync::Arc;

use common::{
    BrokenBalanceStore, FailingNotifier, LINK_BASE, RecordingNotifier, harness, harness_with,
    new_leave,
};
use smartleave::error::ApiError;
use smartleave::model::leave_request::LeaveStatus;
use smartleave::notify::ApprovalLinks;
use smartleave::service::{Decision, DecisionParams, LeaveService, NewLeave};
use smartleave::store::{BalanceStore, InMemoryBalanceStore, InMemoryLeaveStore, LeaveStore};

fn decision(leave_id: &str, action: &str, employee: &str) -> DecisionParams {
    DecisionParams {
        leave_id: Some(leave_id.to_string()),
        action: Some(action.to_string()),
        employee_email: Some(employee.to_string()),
    }
}

#[actix_web::test]
async fn create_then_approve_deducts_the_day_count() {
    let h = harness();

    let created = h
        .service
        .create_leave(new_leave("a@x.com", "2024-01-01", "2024-01-03"))
        .await
        .expect("leave created");
    assert_eq!(created.days, 3);
    assert!(created.email_errors.is_empty());

    let stored = h
        .leaves
        .get(&created.leave_id)
        .await
        .expect("get")
        .expect("stored");
    assert_eq!(stored.status, LeaveStatus::Pending);
    assert_eq!(stored.days, 3);

    let outcome = h
        .service
        .decide(decision(&created.leave_id, "approve", "a@x.com"))
        .await
        .expect("approved");
    assert_eq!(outcome, Decision::Applied(LeaveStatus::Approved));

    let stored = h.leaves.get(&created.leave_id).await.expect("get").expect("stored");
    assert_eq!(stored.status, LeaveStatus::Approved);
    assert_eq!(h.service.balance(Some("a@x.com".into())).await.expect("balance"), 17);
}

#[actix_web::test]
async fn first_creation_seeds_the_default_balance() {
    let h = harness();
    assert!(h.balances.get("a@x.com").await.expect("get").is_none());

    h.service
        .create_leave(new_leave("a@x.com", "2024-03-01", "2024-03-01"))
        .await
        .expect("created");

    let record = h.balances.get("a@x.com").await.expect("get").expect("seeded");
    assert_eq!(record.balance, 20);
}

#[actix_web::test]
async fn default_balance_still_caps_the_first_request() {
    let h = harness();
    let err = h
        .service
        .create_leave(new_leave("a@x.com", "2024-01-01", "2024-01-21"))
        .await
        .expect_err("21 days exceed 20");

    assert!(matches!(
        err,
        ApiError::InsufficientBalance {
            available: 20,
            required: 21
        }
    ));
    // the lazy default insert is the only write on this path
    assert_eq!(h.balances.get("a@x.com").await.expect("get").map(|r| r.balance), Some(20));
    assert!(h.leaves.scan().await.expect("scan").is_empty());
    assert!(h.notifier.sent().is_empty());
}

#[actix_web::test]
async fn insufficient_balance_is_rejected() {
    let h = harness_with(InMemoryBalanceStore::new().with_balance("a@x.com", 2));
    let err = h
        .service
        .create_leave(new_leave("a@x.com", "2024-01-01", "2024-01-03"))
        .await
        .expect_err("not enough days");

    assert_eq!(
        err.to_string(),
        "Insufficient leave balance. Available: 2, Required: 3"
    );
    assert!(h.leaves.scan().await.expect("scan").is_empty());
}

#[actix_web::test]
async fn missing_or_blank_fields_fail_validation() {
    let h = harness();
    let mut input = new_leave("a@x.com", "2024-01-01", "2024-01-03");
    input.reason = Some("   ".into());
    assert!(matches!(
        h.service.create_leave(input).await,
        Err(ApiError::MissingFields)
    ));
    assert!(matches!(
        h.service.create_leave(NewLeave::default()).await,
        Err(ApiError::MissingFields)
    ));
}

#[actix_web::test]
async fn malformed_and_inverted_dates_are_rejected() {
    let h = harness();
    assert!(matches!(
        h.service
            .create_leave(new_leave("a@x.com", "01/01/2024", "2024-01-03"))
            .await,
        Err(ApiError::InvalidDate)
    ));
    assert!(matches!(
        h.service
            .create_leave(new_leave("a@x.com", "2024-01-05", "2024-01-03"))
            .await,
        Err(ApiError::InvalidDateRange)
    ));
}

#[actix_web::test]
async fn creation_notifies_employee_and_approver() {
    let h = harness();
    let created = h
        .service
        .create_leave(new_leave("a@x.com", "2024-01-01", "2024-01-03"))
        .await
        .expect("created");

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, "a@x.com");
    assert_eq!(sent[0].subject, "Leave Application Received");
    assert_eq!(sent[1].to, "b@x.com");
    let approve_link = format!(
        "{}?leave_id={}&action=approve&employee_email=a%40x.com",
        LINK_BASE, created.leave_id
    );
    assert!(sent[1].body.contains(&approve_link), "{}", sent[1].body);
}

#[actix_web::test]
async fn notification_failures_are_collected_not_fatal() {
    let leaves = Arc::new(InMemoryLeaveStore::new());
    let service = LeaveService::new(
        leaves.clone(),
        Arc::new(InMemoryBalanceStore::new()),
        Arc::new(FailingNotifier),
        ApprovalLinks::new(LINK_BASE).expect("base"),
    );

    let created = service
        .create_leave(new_leave("a@x.com", "2024-01-01", "2024-01-02"))
        .await
        .expect("created despite mail failures");

    assert_eq!(
        created.email_errors,
        vec![
            "confirmation_email: send failed: sender not verified".to_string(),
            "notification_email: send failed: sender not verified".to_string(),
        ]
    );
    assert_eq!(leaves.scan().await.expect("scan").len(), 1);

    let outcome = service
        .decide(decision(&created.leave_id, "approve", "a@x.com"))
        .await
        .expect("status mail failure is swallowed");
    assert_eq!(outcome, Decision::Applied(LeaveStatus::Approved));
}

#[actix_web::test]
async fn balance_store_outage_fails_the_balance_check() {
    let service = LeaveService::new(
        Arc::new(InMemoryLeaveStore::new()),
        Arc::new(BrokenBalanceStore),
        Arc::new(RecordingNotifier::default()),
        ApprovalLinks::new(LINK_BASE).expect("base"),
    );
    let err = service
        .create_leave(new_leave("a@x.com", "2024-01-01", "2024-01-02"))
        .await
        .expect_err("balance check must fail");
    assert_eq!(
        err.to_string(),
        "Balance check failed: store unavailable: connection refused"
    );
}

#[actix_web::test]
async fn deduction_failure_does_not_fail_approval() {
    let leaves = Arc::new(InMemoryLeaveStore::new());
    let seeding = LeaveService::new(
        leaves.clone(),
        Arc::new(InMemoryBalanceStore::new()),
        Arc::new(RecordingNotifier::default()),
        ApprovalLinks::new(LINK_BASE).expect("base"),
    );
    let created = seeding
        .create_leave(new_leave("a@x.com", "2024-01-01", "2024-01-02"))
        .await
        .expect("created");

    let broken = LeaveService::new(
        leaves.clone(),
        Arc::new(BrokenBalanceStore),
        Arc::new(RecordingNotifier::default()),
        ApprovalLinks::new(LINK_BASE).expect("base"),
    );
    let outcome = broken
        .decide(decision(&created.leave_id, "approve", "a@x.com"))
        .await
        .expect("approval stands");
    assert_eq!(outcome, Decision::Applied(LeaveStatus::Approved));
    let stored = leaves.get(&created.leave_id).await.expect("get").expect("stored");
    assert_eq!(stored.status, LeaveStatus::Approved);
}

#[actix_web::test]
async fn rejecting_leaves_the_balance_alone() {
    let h = harness();
    let created = h
        .service
        .create_leave(new_leave("a@x.com", "2024-01-01", "2024-01-05"))
        .await
        .expect("created");

    let outcome = h
        .service
        .decide(decision(&created.leave_id, "reject", "a@x.com"))
        .await
        .expect("rejected");
    assert_eq!(outcome, Decision::Applied(LeaveStatus::Rejected));
    assert_eq!(h.service.balance(Some("a@x.com".into())).await.expect("balance"), 20);

    let status_mail = h.notifier.sent().pop().expect("status email");
    assert_eq!(status_mail.subject, "Leave Rejected");
    assert_eq!(status_mail.body, "Your leave has been rejected.");
}

#[actix_web::test]
async fn repeated_approval_deducts_once() {
    let h = harness();
    let created = h
        .service
        .create_leave(new_leave("a@x.com", "2024-01-01", "2024-01-03"))
        .await
        .expect("created");

    let first = h
        .service
        .decide(decision(&created.leave_id, "approve", "a@x.com"))
        .await
        .expect("first approval");
    let second = h
        .service
        .decide(decision(&created.leave_id, "approve", "a@x.com"))
        .await
        .expect("repeat is harmless");

    assert_eq!(first, Decision::Applied(LeaveStatus::Approved));
    assert_eq!(second, Decision::Repeated(LeaveStatus::Approved));
    assert_eq!(h.service.balance(Some("a@x.com".into())).await.expect("balance"), 17);
}

#[actix_web::test]
async fn concurrent_approvals_deduct_once() {
    let h = harness();
    let created = h
        .service
        .create_leave(new_leave("a@x.com", "2024-01-01", "2024-01-04"))
        .await
        .expect("created");

    let (a, b) = futures::join!(
        h.service.decide(decision(&created.leave_id, "approve", "a@x.com")),
        h.service.decide(decision(&created.leave_id, "approve", "a@x.com")),
    );
    let outcomes = [a.expect("first"), b.expect("second")];
    assert_eq!(
        outcomes
            .iter()
            .filter(|o| matches!(o, Decision::Applied(_)))
            .count(),
        1
    );
    assert_eq!(h.service.balance(Some("a@x.com".into())).await.expect("balance"), 16);
}

#[actix_web::test]
async fn opposite_decision_on_a_closed_request_is_refused() {
    let h = harness();
    let created = h
        .service
        .create_leave(new_leave("a@x.com", "2024-01-01", "2024-01-03"))
        .await
        .expect("created");
    h.service
        .decide(decision(&created.leave_id, "reject", "a@x.com"))
        .await
        .expect("rejected");

    let err = h
        .service
        .decide(decision(&created.leave_id, "approve", "a@x.com"))
        .await
        .expect_err("already rejected");
    assert!(matches!(err, ApiError::AlreadyProcessed(LeaveStatus::Rejected)));
    assert_eq!(h.service.balance(Some("a@x.com".into())).await.expect("balance"), 20);
}

#[actix_web::test]
async fn decision_input_is_validated() {
    let h = harness();
    let created = h
        .service
        .create_leave(new_leave("a@x.com", "2024-01-01", "2024-01-03"))
        .await
        .expect("created");

    let mut missing = decision(&created.leave_id, "approve", "a@x.com");
    missing.employee_email = None;
    assert!(matches!(
        h.service.decide(missing).await,
        Err(ApiError::MissingParameters)
    ));
    assert!(matches!(
        h.service
            .decide(decision(&created.leave_id, "maybe", "a@x.com"))
            .await,
        Err(ApiError::InvalidAction)
    ));
    assert!(matches!(
        h.service
            .decide(decision("no-such-leave", "approve", "a@x.com"))
            .await,
        Err(ApiError::NotFound)
    ));
    assert!(matches!(
        h.service
            .decide(decision(&created.leave_id, "approve", "other@x.com"))
            .await,
        Err(ApiError::EmployeeMismatch)
    ));

    let stored = h.leaves.get(&created.leave_id).await.expect("get").expect("stored");
    assert_eq!(stored.status, LeaveStatus::Pending);
}

#[actix_web::test]
async fn unknown_employee_balance_is_not_persisted() {
    let h = harness();
    assert_eq!(h.service.balance(Some("new@x.com".into())).await.expect("balance"), 20);
    assert!(h.balances.get("new@x.com").await.expect("get").is_none());
    assert!(matches!(
        h.service.balance(None).await,
        Err(ApiError::MissingParameter("Email"))
    ));
}

#[actix_web::test]
async fn listing_by_employee_returns_exactly_their_requests() {
    let h = harness();
    for (employee, start, end) in [
        ("a@x.com", "2024-01-01", "2024-01-02"),
        ("c@x.com", "2024-02-01", "2024-02-01"),
        ("a@x.com", "2024-03-01", "2024-03-03"),
    ] {
        h.service
            .create_leave(new_leave(employee, start, end))
            .await
            .expect("created");
    }

    let mine = h
        .service
        .list_for_employee(Some("a@x.com".into()))
        .await
        .expect("list");
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|l| l.employee_email == "a@x.com"));

    assert_eq!(h.service.list_all().await.expect("list").len(), 3);
    assert!(matches!(
        h.service.list_for_employee(Some(" ".into())).await,
        Err(ApiError::MissingParameter("Email"))
    ));
}

#[actix_web::test]
async fn emails_differing_in_case_or_accent_are_separate_employees() {
    let h = harness();
    let jose = h
        .service
        .create_leave(new_leave("jose@x.com", "2024-01-01", "2024-01-05"))
        .await
        .expect("created");
    h.service
        .create_leave(new_leave("José@x.com", "2024-02-01", "2024-02-01"))
        .await
        .expect("created");

    h.service
        .decide(decision(&jose.leave_id, "approve", "jose@x.com"))
        .await
        .expect("approved");

    assert_eq!(h.service.balance(Some("jose@x.com".into())).await.expect("balance"), 15);
    assert_eq!(h.service.balance(Some("José@x.com".into())).await.expect("balance"), 20);

    let mine = h
        .service
        .list_for_employee(Some("jose@x.com".into()))
        .await
        .expect("list");
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].leave_id, jose.leave_id);

    assert!(matches!(
        h.service
            .decide(decision(&jose.leave_id, "approve", "JOSE@x.com"))
            .await,
        Err(ApiError::EmployeeMismatch)
    ));
}
