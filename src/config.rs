use std::env;
use std::str::FromStr;

use dotenvy::dotenv;
use strum_macros::{Display, EnumString};
use url::Url;

pub const DEFAULT_LEAVE_TABLE: &str = "leave_requests";
pub const DEFAULT_BALANCE_TABLE: &str = "leave_balances";
pub const ANY_ORIGIN: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum StoreBackend {
    Mysql,
    Memory,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// log outgoing mail instead of sending it
    pub skip_send: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    pub api_prefix: String,

    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub leave_table: String,
    pub balance_table: String,

    pub sender_email: String,
    pub approval_link_url: String,
    pub smtp: SmtpConfig,

    // Rate limiting
    pub rate_per_min: u32,

    /// Browser origins allowed to call the API, `*` for any
    pub cors_allowed_origins: Vec<String>,
}

fn parse_or<T: FromStr>(value: Option<String>, key: &str, default: T) -> T {
    match value {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "unparsable setting, using default");
            default
        }),
        None => default,
    }
}

/// Splits a comma-separated origin list. Entries that are not a bare
/// `scheme://host[:port]` are logged and skipped, since the CORS layer
/// refuses to start with one.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .filter(|origin| {
            if *origin == ANY_ORIGIN {
                return true;
            }
            let valid = Url::parse(origin)
                .map(|url| url.has_host() && url.path() == "/" && url.query().is_none())
                .unwrap_or(false);
            if !valid {
                tracing::warn!(origin, "ignoring invalid CORS origin");
            }
            valid
        })
        .map(str::to_string)
        .collect()
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads every setting through `lookup`, so tests never touch the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let leave_table = get("LEAVE_TABLE_NAME").unwrap_or_else(|| {
            tracing::error!("LEAVE_TABLE_NAME not set, using `{}`", DEFAULT_LEAVE_TABLE);
            DEFAULT_LEAVE_TABLE.to_string()
        });
        let balance_table = get("LEAVE_BALANCE_TABLE_NAME").unwrap_or_else(|| {
            tracing::error!(
                "LEAVE_BALANCE_TABLE_NAME not set, using `{}`",
                DEFAULT_BALANCE_TABLE
            );
            DEFAULT_BALANCE_TABLE.to_string()
        });
        let sender_email = get("SENDER_EMAIL").unwrap_or_else(|| {
            tracing::warn!("SENDER_EMAIL not set");
            "noreply@smartleave.local".to_string()
        });

        let server_addr = get("SERVER_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string());
        let api_prefix = get("API_PREFIX").unwrap_or_else(|| "/api".to_string());
        let approval_link_url = get("APPROVAL_LINK_URL")
            .unwrap_or_else(|| format!("http://{}{}/leaves/decision", server_addr, api_prefix));

        Self {
            store_backend: parse_or(get("STORE_BACKEND"), "STORE_BACKEND", StoreBackend::Mysql),
            database_url: get("DATABASE_URL"),
            leave_table,
            balance_table,
            sender_email,
            approval_link_url,
            smtp: SmtpConfig {
                host: get("SMTP_HOST").unwrap_or_else(|| "localhost".to_string()),
                port: parse_or(get("SMTP_PORT"), "SMTP_PORT", 587),
                username: get("SMTP_USERNAME").unwrap_or_default(),
                password: get("SMTP_PASSWORD").unwrap_or_default(),
                skip_send: parse_or(get("SMTP_SKIP_SEND"), "SMTP_SKIP_SEND", false),
            },
            rate_per_min: parse_or(get("RATE_PER_MIN"), "RATE_PER_MIN", 600),
            cors_allowed_origins: get("CORS_ALLOWED_ORIGINS")
                .map(|raw| parse_origins(&raw))
                .unwrap_or_else(|| vec![ANY_ORIGIN.to_string()]),
            server_addr,
            api_prefix,
        }
    }
}
