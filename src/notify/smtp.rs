use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{Email, Notifier, NotifyError};
use crate::config::SmtpConfig;

pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(smtp: &SmtpConfig, sender_email: &str) -> Result<Self, NotifyError> {
        let from: Mailbox = sender_email
            .parse()
            .map_err(|e| NotifyError::Address(format!("{}: {}", sender_email, e)))?;

        let mailer = if smtp.username.is_empty() {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp.host)
                .port(smtp.port)
                .build()
        } else {
            let creds = Credentials::new(smtp.username.clone(), smtp.password.clone());
            AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)
                .map_err(|e| NotifyError::Transport(e.to_string()))?
                .port(smtp.port)
                .credentials(creds)
                .build()
        };

        Ok(Self { mailer, from })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, email: &Email) -> Result<(), NotifyError> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| NotifyError::Address(format!("{}: {}", email.to, e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|e| NotifyError::Message(e.to_string()))?;

        self.mailer
            .send(message)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        Ok(())
    }
}
