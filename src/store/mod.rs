pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use derive_more::Display;

use crate::model::balance::BalanceRecord;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};

pub use memory::{InMemoryBalanceStore, InMemoryLeaveStore};
pub use mysql::{MySqlBalanceStore, MySqlLeaveStore};

#[derive(Debug, Display)]
pub enum StoreError {
    #[display(fmt = "store unavailable: {}", _0)]
    Unavailable(String),
    #[display(fmt = "corrupt record: {}", _0)]
    Corrupt(String),
    #[display(fmt = "record not found: {}", _0)]
    NotFound(String),
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::RowNotFound => StoreError::NotFound("row not found".to_string()),
            sqlx::Error::ColumnDecode { index, source } => {
                StoreError::Corrupt(format!("column {}: {}", index, source))
            }
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

/// Outcome of a conditional status write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The request was pending and now carries the new status.
    Applied,
    /// The request had already left `pending`; nothing was written.
    Stale(LeaveStatus),
    Missing,
}

/// Keyed collection of leave requests.
#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn put(&self, leave: &LeaveRequest) -> Result<(), StoreError>;

    async fn get(&self, leave_id: &str) -> Result<Option<LeaveRequest>, StoreError>;

    /// Every request, in whatever order the backend yields them.
    async fn scan(&self) -> Result<Vec<LeaveRequest>, StoreError>;

    async fn scan_by_employee(&self, employee_email: &str)
    -> Result<Vec<LeaveRequest>, StoreError>;

    /// Moves a request out of `pending`. Only one caller can win this for a
    /// given request.
    async fn transition(&self, leave_id: &str, to: LeaveStatus) -> Result<Transition, StoreError>;
}

/// Per-employee remaining leave days.
#[async_trait]
pub trait BalanceStore: Send + Sync {
    async fn get(&self, employee_email: &str) -> Result<Option<BalanceRecord>, StoreError>;

    /// Inserts `balance` unless a record already exists, then returns the
    /// stored record.
    async fn init(&self, employee_email: &str, balance: i64) -> Result<BalanceRecord, StoreError>;

    /// Subtracts `days` without a floor and returns the new balance.
    async fn deduct(&self, employee_email: &str, days: i64) -> Result<i64, StoreError>;
}
