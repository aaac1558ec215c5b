//! Best-effort operator alerting over mail submission.
//!
//! Alerting is advisory: the controller logs delivery failures and carries
//! on. Nothing in here may abort a cycle.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::info;

use crate::config::MailConfig;
use crate::drift::DriftReport;

/// Errors from composing or delivering an alert.
#[derive(Error, Debug)]
pub enum AlertError {
    #[error("Invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build alert message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("Mail submission failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// Delivery seam for drift notifications.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn send(&self, report: &DriftReport) -> Result<(), AlertError>;
}

/// Sends the drift alert over an authenticated STARTTLS mail submission
/// session to the single configured recipient.
pub struct SmtpAlertDispatcher {
    mail: MailConfig,
}

impl SmtpAlertDispatcher {
    pub fn new(mail: MailConfig) -> Self {
        Self { mail }
    }

    fn compose(&self, report: &DriftReport) -> Result<Message, AlertError> {
        let percent = report.ratio * 100.0;
        let body = format!(
            "ALERT: {percent:.2}% of the transactions were flagged as fraud by the model.\n\
             This may indicate data drift or model degradation.\n\n\
             The model will be retrained immediately.\n"
        );

        let from: Mailbox = self.mail.user.parse()?;
        let to: Mailbox = self.mail.to.parse()?;

        Ok(Message::builder()
            .from(from)
            .to(to)
            .subject(format!("Model alert: {percent:.1}% fraud detected"))
            .body(body)?)
    }
}

#[async_trait]
impl AlertSink for SmtpAlertDispatcher {
    async fn send(&self, report: &DriftReport) -> Result<(), AlertError> {
        let message = self.compose(report)?;

        let credentials = Credentials::new(self.mail.user.clone(), self.mail.pass.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.mail.smtp_host)?
            .port(self.mail.smtp_port)
            .credentials(credentials)
            .build();

        mailer.send(message).await?;
        info!(to = %self.mail.to, "Drift alert sent");
        Ok(())
    }
}
