// src/email.rs

pub mod console;
pub mod smtp;

pub use console::ConsoleEmailSender;
pub use smtp::{SmtpConfig, SmtpEmailSender};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Transporte de e-mail. Chamado fora do runtime async (pool de blocking).
pub trait EmailSender: Send + Sync {
    fn send(&self, message: &EmailMessage) -> anyhow::Result<()>;
}

/// SMTP quando `SMTP_*` está completo, console caso contrário.
pub fn sender_from_config(smtp: Option<SmtpConfig>) -> anyhow::Result<Box<dyn EmailSender>> {
    match smtp {
        Some(config) => Ok(Box::new(SmtpEmailSender::new(config)?)),
        None => {
            tracing::warn!("SMTP não configurado; e-mails serão apenas registrados no log");
            Ok(Box::new(ConsoleEmailSender::new()))
        }
    }
}
