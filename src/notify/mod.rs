pub mod smtp;
pub mod templates;

use async_trait::async_trait;
use derive_more::Display;
use tracing::info;

pub use smtp::SmtpNotifier;
pub use templates::ApprovalLinks;

/// A plain-text message for a single recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Display)]
pub enum NotifyError {
    #[display(fmt = "invalid address: {}", _0)]
    Address(String),
    #[display(fmt = "could not build message: {}", _0)]
    Message(String),
    #[display(fmt = "send failed: {}", _0)]
    Transport(String),
}

impl std::error::Error for NotifyError {}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), NotifyError>;
}

/// Writes emails to the log instead of sending them (`SMTP_SKIP_SEND=true`).
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, email: &Email) -> Result<(), NotifyError> {
        info!(to = %email.to, subject = %email.subject, body = %email.body, "Email skipped (SMTP_SKIP_SEND)");
        Ok(())
    }
}
