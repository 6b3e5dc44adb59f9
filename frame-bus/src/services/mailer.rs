//! Outbound email
//!
//! `SEND_EMAIL` hands messages to a [`Mailer`]. The bundled [`LogMailer`]
//! only records them on the `mail` log target; hosts with a real delivery
//! channel plug in their own implementation.

use async_trait::async_trait;
use shared::AppResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> AppResult<()>;
}

/// Mailer that writes to the log instead of delivering
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> AppResult<()> {
        tracing::info!(
            target: "mail",
            to = %email.to,
            subject = %email.subject,
            body_len = email.body.len(),
            "Email accepted for delivery"
        );
        Ok(())
    }
}
