use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{BalanceStore, LeaveStore, StoreError, Transition};
use crate::model::balance::BalanceRecord;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
}

/// Process-local leave store for `STORE_BACKEND=memory` and tests.
#[derive(Debug, Default)]
pub struct InMemoryLeaveStore {
    leaves: Mutex<HashMap<String, LeaveRequest>>,
}

impl InMemoryLeaveStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeaveStore for InMemoryLeaveStore {
    async fn put(&self, leave: &LeaveRequest) -> Result<(), StoreError> {
        lock(&self.leaves)?.insert(leave.leave_id.clone(), leave.clone());
        Ok(())
    }

    async fn get(&self, leave_id: &str) -> Result<Option<LeaveRequest>, StoreError> {
        Ok(lock(&self.leaves)?.get(leave_id).cloned())
    }

    async fn scan(&self) -> Result<Vec<LeaveRequest>, StoreError> {
        Ok(lock(&self.leaves)?.values().cloned().collect())
    }

    async fn scan_by_employee(
        &self,
        employee_email: &str,
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        Ok(lock(&self.leaves)?
            .values()
            .filter(|leave| leave.employee_email == employee_email)
            .cloned()
            .collect())
    }

    async fn transition(&self, leave_id: &str, to: LeaveStatus) -> Result<Transition, StoreError> {
        let mut leaves = lock(&self.leaves)?;
        let Some(leave) = leaves.get_mut(leave_id) else {
            return Ok(Transition::Missing);
        };
        if leave.status.is_terminal() {
            return Ok(Transition::Stale(leave.status));
        }
        leave.status = to;
        Ok(Transition::Applied)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryBalanceStore {
    balances: Mutex<HashMap<String, i64>>,
}

impl InMemoryBalanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a balance, overwriting whatever was there.
    pub fn with_balance(self, employee_email: &str, balance: i64) -> Self {
        if let Ok(mut balances) = self.balances.lock() {
            balances.insert(employee_email.to_string(), balance);
        }
        self
    }
}

#[async_trait]
impl BalanceStore for InMemoryBalanceStore {
    async fn get(&self, employee_email: &str) -> Result<Option<BalanceRecord>, StoreError> {
        Ok(lock(&self.balances)?
            .get(employee_email)
            .map(|balance| BalanceRecord {
                employee_email: employee_email.to_string(),
                balance: *balance,
            }))
    }

    async fn init(&self, employee_email: &str, balance: i64) -> Result<BalanceRecord, StoreError> {
        let mut balances = lock(&self.balances)?;
        let stored = *balances
            .entry(employee_email.to_string())
            .or_insert(balance);
        Ok(BalanceRecord {
            employee_email: employee_email.to_string(),
            balance: stored,
        })
    }

    async fn deduct(&self, employee_email: &str, days: i64) -> Result<i64, StoreError> {
        let mut balances = lock(&self.balances)?;
        match balances.get_mut(employee_email) {
            Some(balance) => {
                *balance -= days;
                Ok(*balance)
            }
            None => Err(StoreError::NotFound(format!(
                "no balance record for {}",
                employee_email
            ))),
        }
    }
}
