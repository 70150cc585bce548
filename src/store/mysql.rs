use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use futures::future::ready;
use futures_util::TryStreamExt;
use sqlx::{FromRow, MySqlPool};

use super::{BalanceStore, LeaveStore, StoreError, Transition};
use crate::model::balance::BalanceRecord;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};

const LEAVE_COLUMNS: &str =
    "leave_id, employee_email, approver_email, start_date, end_date, reason, status, created_at, days";

/// Table names come from the environment, so they are checked before being
/// spliced into SQL.
pub fn validate_table_name(name: &str) -> Result<&str, StoreError> {
    let valid = !name.is_empty()
        && name.len() <= 64
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(name)
    } else {
        Err(StoreError::Unavailable(format!(
            "invalid table name `{}`",
            name
        )))
    }
}

#[derive(FromRow)]
struct LeaveRow {
    leave_id: String,
    employee_email: String,
    approver_email: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    reason: String,
    status: String,
    created_at: DateTime<Utc>,
    days: i64,
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = StoreError;

    fn try_from(row: LeaveRow) -> Result<Self, Self::Error> {
        let status = LeaveStatus::from_str(&row.status).map_err(|_| {
            StoreError::Corrupt(format!(
                "leave {} has unknown status `{}`",
                row.leave_id, row.status
            ))
        })?;
        Ok(LeaveRequest {
            leave_id: row.leave_id,
            employee_email: row.employee_email,
            approver_email: row.approver_email,
            start_date: row.start_date,
            end_date: row.end_date,
            reason: row.reason,
            status,
            created_at: row.created_at,
            days: row.days,
        })
    }
}

pub struct MySqlLeaveStore {
    pool: MySqlPool,
    table: String,
}

impl MySqlLeaveStore {
    pub fn new(pool: MySqlPool, table: &str) -> Result<Self, StoreError> {
        Ok(Self {
            pool,
            table: validate_table_name(table)?.to_string(),
        })
    }

    async fn fetch_many(
        &self,
        sql: &str,
        employee_email: Option<&str>,
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        let mut query = sqlx::query_as::<_, LeaveRow>(sql);
        if let Some(email) = employee_email {
            query = query.bind(email);
        }

        query
            .fetch(&self.pool)
            .map_err(StoreError::from)
            .and_then(|row| ready(LeaveRequest::try_from(row)))
            .try_collect()
            .await
    }
}

#[async_trait]
impl LeaveStore for MySqlLeaveStore {
    async fn put(&self, leave: &LeaveRequest) -> Result<(), StoreError> {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            self.table, LEAVE_COLUMNS
        );
        sqlx::query(&sql)
            .bind(&leave.leave_id)
            .bind(&leave.employee_email)
            .bind(&leave.approver_email)
            .bind(leave.start_date)
            .bind(leave.end_date)
            .bind(&leave.reason)
            .bind(leave.status.as_ref())
            .bind(leave.created_at)
            .bind(leave.days)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get(&self, leave_id: &str) -> Result<Option<LeaveRequest>, StoreError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE leave_id = ?",
            LEAVE_COLUMNS, self.table
        );
        sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(leave_id)
            .fetch_optional(&self.pool)
            .await?
            .map(LeaveRequest::try_from)
            .transpose()
    }

    async fn scan(&self) -> Result<Vec<LeaveRequest>, StoreError> {
        let sql = format!("SELECT {} FROM {}", LEAVE_COLUMNS, self.table);
        self.fetch_many(&sql, None).await
    }

    async fn scan_by_employee(
        &self,
        employee_email: &str,
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE employee_email = ?",
            LEAVE_COLUMNS, self.table
        );
        self.fetch_many(&sql, Some(employee_email)).await
    }

    async fn transition(&self, leave_id: &str, to: LeaveStatus) -> Result<Transition, StoreError> {
        let sql = format!(
            "UPDATE {} SET status = ? WHERE leave_id = ? AND status = 'pending'",
            self.table
        );
        let result = sqlx::query(&sql)
            .bind(to.as_ref())
            .bind(leave_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            return Ok(Transition::Applied);
        }

        // Nothing matched: either the id is unknown or someone got there first.
        match self.get(leave_id).await? {
            Some(current) => Ok(Transition::Stale(current.status)),
            None => Ok(Transition::Missing),
        }
    }
}

pub struct MySqlBalanceStore {
    pool: MySqlPool,
    table: String,
}

impl MySqlBalanceStore {
    pub fn new(pool: MySqlPool, table: &str) -> Result<Self, StoreError> {
        Ok(Self {
            pool,
            table: validate_table_name(table)?.to_string(),
        })
    }
}

#[async_trait]
impl BalanceStore for MySqlBalanceStore {
    async fn get(&self, employee_email: &str) -> Result<Option<BalanceRecord>, StoreError> {
        let sql = format!(
            "SELECT employee_email, balance FROM {} WHERE employee_email = ?",
            self.table
        );
        let record = sqlx::query_as::<_, BalanceRecord>(&sql)
            .bind(employee_email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn init(&self, employee_email: &str, balance: i64) -> Result<BalanceRecord, StoreError> {
        let sql = format!(
            "INSERT IGNORE INTO {} (employee_email, balance) VALUES (?, ?)",
            self.table
        );
        sqlx::query(&sql)
            .bind(employee_email)
            .bind(balance)
            .execute(&self.pool)
            .await?;

        self.get(employee_email).await?.ok_or_else(|| {
            StoreError::NotFound(format!("balance for {} vanished after init", employee_email))
        })
    }

    async fn deduct(&self, employee_email: &str, days: i64) -> Result<i64, StoreError> {
        let sql = format!(
            "UPDATE {} SET balance = balance - ? WHERE employee_email = ?",
            self.table
        );
        let result = sqlx::query(&sql)
            .bind(days)
            .bind(employee_email)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!(
                "no balance record for {}",
                employee_email
            )));
        }

        self.get(employee_email)
            .await?
            .map(|record| record.balance)
            .ok_or_else(|| StoreError::NotFound(format!("no balance record for {}", employee_email)))
    }
}
