#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use smartleave::model::balance::BalanceRecord;
use smartleave::notify::{ApprovalLinks, Email, Notifier, NotifyError};
use smartleave::service::{LeaveService, NewLeave};
use smartleave::store::{BalanceStore, InMemoryBalanceStore, InMemoryLeaveStore, StoreError};

pub const LINK_BASE: &str = "http://localhost:8080/api/leaves/decision";

/// Keeps every email instead of sending it.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Email>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().expect("notifier lock").clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, email: &Email) -> Result<(), NotifyError> {
        self.sent.lock().expect("notifier lock").push(email.clone());
        Ok(())
    }
}

/// Fails every send, like a mail service rejecting an unverified sender.
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _email: &Email) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("sender not verified".to_string()))
    }
}

/// Balance store whose backend is down.
pub struct BrokenBalanceStore;

#[async_trait]
impl BalanceStore for BrokenBalanceStore {
    async fn get(&self, _employee_email: &str) -> Result<Option<BalanceRecord>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn init(&self, _employee_email: &str, _balance: i64) -> Result<BalanceRecord, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn deduct(&self, _employee_email: &str, _days: i64) -> Result<i64, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

pub struct Harness {
    pub service: LeaveService,
    pub leaves: Arc<InMemoryLeaveStore>,
    pub balances: Arc<InMemoryBalanceStore>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn harness() -> Harness {
    harness_with(InMemoryBalanceStore::new())
}

pub fn harness_with(balances: InMemoryBalanceStore) -> Harness {
    let leaves = Arc::new(InMemoryLeaveStore::new());
    let balances = Arc::new(balances);
    let notifier = Arc::new(RecordingNotifier::default());
    let service = LeaveService::new(
        leaves.clone(),
        balances.clone(),
        notifier.clone(),
        ApprovalLinks::new(LINK_BASE).expect("valid link base"),
    );
    Harness {
        service,
        leaves,
        balances,
        notifier,
    }
}

pub fn new_leave(employee: &str, start: &str, end: &str) -> NewLeave {
    NewLeave {
        employee_email: Some(employee.to_string()),
        approver_email: Some("b@x.com".to_string()),
        start_date: Some(start.to_string()),
        end_date: Some(end.to_string()),
        reason: Some("trip".to_string()),
    }
}
