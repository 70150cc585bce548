use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;

use crate::store::StoreError;
use crate::store::mysql::validate_table_name;

/// Builds the pool without dialing the database; an unreachable server shows
/// up on the first query instead of at startup.
pub fn init_db(database_url: &str) -> Result<MySqlPool, sqlx::Error> {
    MySqlPoolOptions::new()
        .max_connections(10)
        .connect_lazy(database_url)
}

// Emails are compared byte for byte; the server default collation would fold
// case and accents and merge distinct employees.
const EMAIL_COLUMN: &str = "VARCHAR(255) CHARACTER SET utf8mb4 COLLATE utf8mb4_bin NOT NULL";

fn leave_table_ddl(table: &str) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            leave_id       VARCHAR(36)  NOT NULL PRIMARY KEY,
            employee_email {},
            approver_email VARCHAR(255) NOT NULL,
            start_date     DATE         NOT NULL,
            end_date       DATE         NOT NULL,
            reason         TEXT         NOT NULL,
            status         VARCHAR(16)  NOT NULL DEFAULT 'pending',
            created_at     TIMESTAMP    NOT NULL,
            days           BIGINT       NOT NULL,
            INDEX idx_employee_email (employee_email)
        )
        "#,
        table, EMAIL_COLUMN
    )
}

fn balance_table_ddl(table: &str) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            employee_email {} PRIMARY KEY,
            balance        BIGINT       NOT NULL
        )
        "#,
        table, EMAIL_COLUMN
    )
}

/// Creates the leave and balance tables when they do not exist yet.
pub async fn ensure_schema(
    pool: &MySqlPool,
    leave_table: &str,
    balance_table: &str,
) -> Result<(), StoreError> {
    let leave_table = validate_table_name(leave_table)?;
    let balance_table = validate_table_name(balance_table)?;

    sqlx::query(&leave_table_ddl(leave_table))
        .execute(pool)
        .await?;
    sqlx::query(&balance_table_ddl(balance_table))
        .execute(pool)
        .await?;

    Ok(())
}
