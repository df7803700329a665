// src/email/console.rs

use super::{EmailMessage, EmailSender};

// Desenvolvimento: o e-mail vai para o log
pub struct ConsoleEmailSender;

impl ConsoleEmailSender {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleEmailSender {
    fn default() -> Self {
        Self::new()
    }
}

impl EmailSender for ConsoleEmailSender {
    fn send(&self, message: &EmailMessage) -> anyhow::Result<()> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.body,
            "E-mail (console)"
        );
        Ok(())
    }
}
