// src/services/notification.rs

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    email::{EmailMessage, EmailSender},
    models::booking::{Booking, BookingStatus},
};

// Destino de log das notificações perdidas (fila cheia, render ou envio com falha)
const DEAD_LETTER: &str = "notification.dead_letter";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    BookingCreated {
        booking_code: String,
        customer_name: String,
        customer_email: String,
        scheduled_date: NaiveDate,
        otp: String,
    },
    ProviderAssigned {
        booking_code: String,
        customer_email: String,
        provider_name: String,
        provider_email: String,
        scheduled_date: NaiveDate,
    },
    StatusChanged {
        booking_code: String,
        customer_email: String,
        status: BookingStatus,
    },
    CompletionOtp {
        booking_code: String,
        customer_email: String,
        otp: String,
        valid_minutes: i64,
    },
    BookingCompleted {
        booking_code: String,
        customer_email: String,
        total: Decimal,
    },
}

impl NotificationEvent {
    pub fn booking_created(booking: &Booking, otp: String) -> Self {
        Self::BookingCreated {
            booking_code: booking.booking_code.clone(),
            customer_name: booking.customer.name.clone(),
            customer_email: booking.customer.email.clone(),
            scheduled_date: booking.scheduled_date,
            otp,
        }
    }

    pub fn status_changed(booking: &Booking) -> Self {
        Self::StatusChanged {
            booking_code: booking.booking_code.clone(),
            customer_email: booking.customer.email.clone(),
            status: booking.status,
        }
    }

    pub fn booking_completed(booking: &Booking) -> Self {
        Self::BookingCompleted {
            booking_code: booking.booking_code.clone(),
            customer_email: booking.customer.email.clone(),
            total: booking.pricing.total,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::BookingCreated { .. } => "booking_created",
            Self::ProviderAssigned { .. } => "provider_assigned",
            Self::StatusChanged { .. } => "status_changed",
            Self::CompletionOtp { .. } => "completion_otp",
            Self::BookingCompleted { .. } => "booking_completed",
        }
    }

    pub fn booking_code(&self) -> &str {
        match self {
            Self::BookingCreated { booking_code, .. }
            | Self::ProviderAssigned { booking_code, .. }
            | Self::StatusChanged { booking_code, .. }
            | Self::CompletionOtp { booking_code, .. }
            | Self::BookingCompleted { booking_code, .. } => booking_code,
        }
    }

    /// Monta os e-mails do evento.
    pub fn render(&self) -> anyhow::Result<Vec<EmailMessage>> {
        let messages = match self {
            Self::BookingCreated { booking_code, customer_name, customer_email, scheduled_date, otp } => {
                vec![message(
                    customer_email,
                    format!("Booking {} received", booking_code),
                    format!(
                        "Hi {},\n\nWe received your booking {} for {}.\n\
                         Your verification code is: {}\n\n\
                         You can track the booking with its code and your phone number.",
                        customer_name, booking_code, scheduled_date, otp
                    ),
                )]
            }
            Self::ProviderAssigned { booking_code, customer_email, provider_name, provider_email, scheduled_date } => {
                vec![
                    message(
                        customer_email,
                        format!("Provider assigned to {}", booking_code),
                        format!(
                            "{} will handle your booking {} on {}.",
                            provider_name, booking_code, scheduled_date
                        ),
                    ),
                    message(
                        provider_email,
                        format!("New job {}", booking_code),
                        format!("You were assigned to booking {} on {}.", booking_code, scheduled_date),
                    ),
                ]
            }
            Self::StatusChanged { booking_code, customer_email, status } => {
                vec![message(
                    customer_email,
                    format!("Booking {} updated", booking_code),
                    format!("Your booking {} is now '{}'.", booking_code, status),
                )]
            }
            Self::CompletionOtp { booking_code, customer_email, otp, valid_minutes } => {
                vec![message(
                    customer_email,
                    format!("Completion code for {}", booking_code),
                    format!(
                        "Share this code with the service provider to confirm the work on {} is done: {}\n\
                         It is valid for {} minutes.",
                        booking_code, otp, valid_minutes
                    ),
                )]
            }
            Self::BookingCompleted { booking_code, customer_email, total } => {
                vec![message(
                    customer_email,
                    format!("Booking {} completed", booking_code),
                    format!(
                        "Your booking {} was completed. Total: {}.\nThank you! You can now rate the service.",
                        booking_code, total
                    ),
                )]
            }
        };

        if let Some(empty) = messages.iter().find(|m| m.to.trim().is_empty()) {
            anyhow::bail!("destinatário vazio em '{}'", empty.subject);
        }
        Ok(messages)
    }
}

fn message(to: &str, subject: String, body: String) -> EmailMessage {
    EmailMessage { to: to.to_string(), subject, body }
}

/// Fila de notificações: no máximo uma entrega, nunca bloqueia nem falha a requisição.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::Sender<NotificationEvent>,
}

impl Notifier {
    pub fn spawn(sender: Arc<dyn EmailSender>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (notifier, rx) = Self::channel(capacity);
        let worker = tokio::spawn(run_worker(rx, sender));
        (notifier, worker)
    }

    fn channel(capacity: usize) -> (Self, mpsc::Receiver<NotificationEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Enfileira o evento. Devolve `false` quando ele foi descartado.
    pub fn dispatch(&self, event: NotificationEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(err) => {
                let reason = match &err {
                    mpsc::error::TrySendError::Full(_) => "fila cheia",
                    mpsc::error::TrySendError::Closed(_) => "fila fechada",
                };
                let event = err.into_inner();
                tracing::error!(
                    target: DEAD_LETTER,
                    event = event.kind(),
                    booking = event.booking_code(),
                    reason,
                    "Notificação descartada"
                );
                false
            }
        }
    }
}

async fn run_worker(mut rx: mpsc::Receiver<NotificationEvent>, sender: Arc<dyn EmailSender>) {
    while let Some(event) = rx.recv().await {
        let messages = match event.render() {
            Ok(messages) => messages,
            Err(e) => {
                tracing::error!(
                    target: DEAD_LETTER,
                    event = event.kind(),
                    booking = event.booking_code(),
                    error = %e,
                    "Falha ao montar notificação"
                );
                continue;
            }
        };

        for msg in messages {
            let sender = Arc::clone(&sender);
            let to = msg.to.clone();
            let result = tokio::task::spawn_blocking(move || sender.send(&msg)).await;

            match result {
                Ok(Ok(())) => {
                    tracing::debug!(event = event.kind(), booking = event.booking_code(), to = %to, "Notificação enviada");
                }
                Ok(Err(e)) => {
                    tracing::error!(
                        target: DEAD_LETTER,
                        event = event.kind(),
                        booking = event.booking_code(),
                        to = %to,
                        error = %e,
                        "Falha no envio da notificação"
                    );
                }
                Err(join_err) => {
                    tracing::error!(
                        target: DEAD_LETTER,
                        event = event.kind(),
                        booking = event.booking_code(),
                        to = %to,
                        error = %join_err,
                        "Tarefa de envio abortada"
                    );
                }
            }
        }
    }

    tracing::info!("Fila de notificações encerrada");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<EmailMessage>>,
        fail_for: Option<String>,
    }

    impl EmailSender for RecordingSender {
        fn send(&self, message: &EmailMessage) -> anyhow::Result<()> {
            if self.fail_for.as_deref() == Some(message.to.as_str()) {
                anyhow::bail!("smtp recusou");
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    fn assigned() -> NotificationEvent {
        NotificationEvent::ProviderAssigned {
            booking_code: "OD-BK-000007".into(),
            customer_email: "anita@example.com".into(),
            provider_name: "Ravi".into(),
            provider_email: "ravi@example.com".into(),
            scheduled_date: NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
        }
    }

    #[test]
    fn provider_assignment_notifies_both_parties() {
        let messages = assigned().render().unwrap();
        let recipients: Vec<_> = messages.iter().map(|m| m.to.as_str()).collect();
        assert_eq!(recipients, vec!["anita@example.com", "ravi@example.com"]);
    }

    #[test]
    fn completion_otp_email_carries_the_code() {
        let event = NotificationEvent::CompletionOtp {
            booking_code: "OD-BK-000007".into(),
            customer_email: "anita@example.com".into(),
            otp: "482913".into(),
            valid_minutes: 10,
        };
        let messages = event.render().unwrap();
        assert!(messages[0].body.contains("482913"));
    }

    #[test]
    fn blank_recipient_fails_rendering() {
        let event = NotificationEvent::StatusChanged {
            booking_code: "OD-BK-000007".into(),
            customer_email: " ".into(),
            status: BookingStatus::Confirmed,
        };
        assert!(event.render().is_err());
    }

    #[tokio::test]
    async fn full_queue_drops_instead_of_blocking() {
        let (notifier, _rx) = Notifier::channel(1);
        assert!(notifier.dispatch(assigned()));
        assert!(!notifier.dispatch(assigned()));
    }

    #[tokio::test]
    async fn closed_queue_drops() {
        let (notifier, rx) = Notifier::channel(4);
        drop(rx);
        assert!(!notifier.dispatch(assigned()));
    }

    #[tokio::test]
    async fn transport_failure_does_not_stop_the_worker() {
        let sender = Arc::new(RecordingSender {
            fail_for: Some("ravi@example.com".into()),
            ..Default::default()
        });
        let (notifier, worker) = Notifier::spawn(sender.clone(), 8);

        assert!(notifier.dispatch(assigned()));
        assert!(notifier.dispatch(NotificationEvent::StatusChanged {
            booking_code: "OD-BK-000007".into(),
            customer_email: "anita@example.com".into(),
            status: BookingStatus::ProviderOnWay,
        }));

        drop(notifier);
        worker.await.unwrap();

        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|m| m.to == "anita@example.com"));
    }
}
