use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Days every employee starts with when no ledger entry exists yet.
pub const DEFAULT_BALANCE: i64 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct BalanceRecord {
    #[schema(example = "a@x.com")]
    pub employee_email: String,
    #[schema(example = 17)]
    pub balance: i64,
}
