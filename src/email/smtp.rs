// src/email/smtp.rs

use anyhow::Context;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, Message,
    SmtpTransport, Transport,
};

use super::{EmailMessage, EmailSender};

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    // 587 usa STARTTLS; qualquer outra porta, TLS implícito (465)
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: Option<String>,
}

impl SmtpConfig {
    /// Lê `SMTP_HOST`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `SMTP_FROM_EMAIL`
    /// (obrigatórias) e `SMTP_PORT` / `SMTP_FROM_NAME` (opcionais).
    /// Faltando qualquer obrigatória, devolve `None`.
    pub fn from_env() -> Option<Self> {
        fn get_env(key: &str) -> Option<String> {
            std::env::var(key).ok().filter(|s| !s.is_empty())
        }

        let host = get_env("SMTP_HOST")?;
        let username = get_env("SMTP_USERNAME")?;
        let password = get_env("SMTP_PASSWORD")?;
        let from_email = get_env("SMTP_FROM_EMAIL")?;

        let port = get_env("SMTP_PORT").and_then(|s| s.parse().ok()).unwrap_or(465);

        Some(Self {
            host,
            port,
            username,
            password,
            from_email,
            from_name: get_env("SMTP_FROM_NAME"),
        })
    }
}

const STARTTLS_PORT: u16 = 587;

fn uses_starttls(port: u16) -> bool {
    port == STARTTLS_PORT
}

pub struct SmtpEmailSender {
    transport: SmtpTransport,
    from_email: String,
    from_name: Option<String>,
}

impl SmtpEmailSender {
    pub fn new(config: SmtpConfig) -> anyhow::Result<Self> {
        let creds = Credentials::new(config.username, config.password);

        let builder = if uses_starttls(config.port) {
            SmtpTransport::starttls_relay(&config.host)
        } else {
            SmtpTransport::relay(&config.host)
        };

        let transport = builder
            .context("Falha ao criar o transporte SMTP")?
            .port(config.port)
            .credentials(creds)
            .build();

        tracing::info!(host = %config.host, port = config.port, "Transporte SMTP configurado");

        Ok(Self {
            transport,
            from_email: config.from_email,
            from_name: config.from_name,
        })
    }

    fn from_address(&self) -> String {
        match &self.from_name {
            Some(name) => format!("{} <{}>", name, self.from_email),
            None => self.from_email.clone(),
        }
    }
}

impl EmailSender for SmtpEmailSender {
    fn send(&self, message: &EmailMessage) -> anyhow::Result<()> {
        let email = Message::builder()
            .from(self.from_address().parse().context("Remetente inválido")?)
            .to(message.to.parse().context("Destinatário inválido")?)
            .subject(message.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .context("Falha ao montar o e-mail")?;

        self.transport.send(&email).context("Falha no envio SMTP")?;

        tracing::debug!(to = %message.to, "E-mail enviado via SMTP");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(587, true)]
    #[case(465, false)]
    #[case(2525, false)]
    fn submission_port_upgrades_with_starttls(#[case] port: u16, #[case] expected: bool) {
        assert_eq!(uses_starttls(port), expected);
    }

    #[test]
    fn both_transports_build_for_a_plain_host() {
        for port in [465, 587] {
            let sender = SmtpEmailSender::new(SmtpConfig {
                host: "smtp.example.com".to_string(),
                port,
                username: "user".to_string(),
                password: "secret".to_string(),
                from_email: "no-reply@example.com".to_string(),
                from_name: Some("HomeServe".to_string()),
            });
            assert!(sender.is_ok(), "porta {port}");
        }
    }
}
