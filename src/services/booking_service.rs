// src/services/booking_service.rs

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::{types::Json, PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{BookingRepository, ProviderRepository, ServiceRepository},
    models::{
        account::{Account, Role, Vertical},
        booking::{
            Booking, BookingStatus, CreateBookingPayload, Payment, PaymentMethod, PaymentStatus,
            Priority, RateBookingPayload, RatingDirection, Ratings, ReschedulePayload,
            StatusHistoryEntry, UpdateStatusPayload,
        },
        provider::Provider,
    },
    services::{
        access_control::{filter_for, has_capability, require_capability, Capability},
        booking_lifecycle::{self as lifecycle, ProviderEffect, TransitionOutcome},
        notification::{NotificationEvent, Notifier},
    },
};

// =============================================================================
//  Orquestração das reservas
// =============================================================================
// Toda mudança roda numa transação: a reserva é travada com FOR UPDATE e o
// prestador/serviço afetados são travados antes de mexer nos contadores.
// Notificações só saem depois do commit.

#[derive(Clone)]
pub struct BookingService {
    booking_repo: BookingRepository,
    provider_repo: ProviderRepository,
    service_repo: ServiceRepository,
    notifier: Notifier,
    completion_otp_ttl: Duration,
    pool: PgPool,
}

impl BookingService {
    pub fn new(
        booking_repo: BookingRepository,
        provider_repo: ProviderRepository,
        service_repo: ServiceRepository,
        notifier: Notifier,
        completion_otp_ttl: Duration,
        pool: PgPool,
    ) -> Self {
        Self { booking_repo, provider_repo, service_repo, notifier, completion_otp_ttl, pool }
    }

    // -------------------------------------------------------------------------
    //  Rotas públicas
    // -------------------------------------------------------------------------

    pub async fn create(&self, payload: CreateBookingPayload, now: DateTime<Utc>) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await?;

        let service = self
            .service_repo
            .find_by_id(&mut *tx, payload.service_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Serviço".to_string()))?;
        if !service.is_active {
            return Err(AppError::InvalidInput("o serviço não está ativo".to_string()));
        }

        let booking_code = self.booking_repo.next_code(&mut *tx).await?;
        let payment = payload.payment.map(|p| (p.method, p.transaction_id)).unwrap_or((PaymentMethod::Cash, None));

        let mut booking = Booking {
            id: Uuid::new_v4(),
            booking_code,
            service_id: service.id,
            service_type: service.service_type,
            customer: Json(payload.customer),
            service_address: Json(payload.service_address),
            scheduled_date: payload.scheduled_date,
            time_slot: Json(payload.time_slot),
            service_details: Json(payload.service_details),
            service_provider: None,
            payment: Json(Payment {
                method: payment.0,
                status: initial_payment_status(payload.pricing.total, payload.pricing.advance_paid),
                transaction_id: payment.1,
            }),
            pricing: Json(payload.pricing),
            status: BookingStatus::Pending,
            status_history: Json(vec![StatusHistoryEntry {
                status: BookingStatus::Pending,
                timestamp: now,
                updated_by: None,
                notes: Some("Reserva criada".to_string()),
            }]),
            otp: None,
            completion_otp: None,
            work_started_at: None,
            work_ended_at: None,
            actual_duration_minutes: None,
            cancellation: None,
            ratings: Json(Ratings::default()),
            priority: payload.priority.unwrap_or(Priority::Normal),
            source: payload.source.unwrap_or_else(|| "web".to_string()),
            created_at: now,
            updated_at: now,
        };
        let otp = lifecycle::issue_booking_otp(&mut booking, now);

        self.booking_repo.insert(&mut *tx, &mut booking).await?;
        self.service_repo.increment_total_bookings(&mut *tx, service.id).await?;

        tx.commit().await?;

        tracing::info!(booking = %booking.booking_code, service_type = %booking.service_type, "Reserva criada");
        self.notifier.dispatch(NotificationEvent::booking_created(&booking, otp));

        Ok(booking)
    }

    pub async fn verify_otp(&self, id: Uuid, submitted: &str, now: DateTime<Utc>) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut booking = self.lock_booking(&mut tx, id).await?;

        let result = lifecycle::verify_booking_otp(&mut booking, submitted, now);
        // Sucesso e código errado alteram a reserva; os demais erros não
        if matches!(result, Ok(()) | Err(AppError::InvalidOtp)) {
            self.booking_repo.save(&mut *tx, &mut booking).await?;
            tx.commit().await?;
        }
        result?;

        Ok(booking)
    }

    pub async fn track(&self, booking_code: &str, phone: &str) -> Result<Booking, AppError> {
        // Código ou telefone errado: mesma resposta, sem revelar qual dos dois
        self.booking_repo
            .find_by_code_and_phone(booking_code, phone)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Reserva".to_string()))
    }

    // -------------------------------------------------------------------------
    //  Consultas autenticadas
    // -------------------------------------------------------------------------

    pub async fn list(
        &self,
        actor: &Account,
        requested: Option<Vertical>,
        status: Option<&str>,
    ) -> Result<Vec<Booking>, AppError> {
        require_capability(actor, Capability::ManageBookings)?;
        let filter = filter_for(actor, requested)?;
        let status = status.map(lifecycle::parse_status).transpose()?;

        self.booking_repo.list(&filter, status).await
    }

    pub async fn list_mine(&self, actor: &Account, status: Option<&str>) -> Result<Vec<Booking>, AppError> {
        require_capability(actor, Capability::FulfilBookings)?;
        let provider_id = actor
            .provider_id
            .ok_or_else(|| AppError::ResourceNotFound("Prestador vinculado".to_string()))?;
        let status = status.map(lifecycle::parse_status).transpose()?;

        self.booking_repo.list_by_provider(provider_id, status).await
    }

    pub async fn get(&self, actor: &Account, requested: Option<Vertical>, id: Uuid) -> Result<Booking, AppError> {
        let booking = self
            .booking_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Reserva".to_string()))?;

        if lifecycle::ensure_assigned(&booking, actor.provider_id).is_ok() {
            return Ok(booking);
        }
        ensure_staff_scope(actor, requested, &booking)?;
        Ok(booking)
    }

    // -------------------------------------------------------------------------
    //  Máquina de estados
    // -------------------------------------------------------------------------

    pub async fn update_status(
        &self,
        actor: &Account,
        requested: Option<Vertical>,
        id: Uuid,
        payload: UpdateStatusPayload,
        now: DateTime<Utc>,
    ) -> Result<Booking, AppError> {
        // Status desconhecido falha antes de abrir transação
        let next = lifecycle::parse_status(&payload.status)?;

        let mut tx = self.pool.begin().await?;
        let mut booking = self.lock_booking(&mut tx, id).await?;

        authorize_transition(actor, requested, &booking, next)?;

        let outcome = lifecycle::apply_transition(&mut booking, next, Some(actor.id), payload.notes, now)?;
        self.apply_side_effects(&mut tx, &booking, outcome).await?;

        self.booking_repo.save(&mut *tx, &mut booking).await?;
        tx.commit().await?;

        tracing::info!(
            booking = %booking.booking_code,
            from = %outcome.from,
            to = %outcome.to,
            actor = %actor.id,
            "Status da reserva alterado"
        );
        self.notify_transition(&booking, outcome);

        Ok(booking)
    }

    pub async fn assign_provider(
        &self,
        actor: &Account,
        requested: Option<Vertical>,
        id: Uuid,
        provider_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Booking, AppError> {
        require_capability(actor, Capability::AssignProviders)?;

        let mut tx = self.pool.begin().await?;
        let mut booking = self.lock_booking(&mut tx, id).await?;
        ensure_staff_scope(actor, requested, &booking)?;

        // Novo e anterior travados sempre na mesma ordem: trocas cruzadas não se bloqueiam
        let mut locked = Vec::with_capacity(2);
        for locked_id in provider_lock_order(provider_id, booking.service_provider) {
            locked.push(self.lock_provider(&mut tx, locked_id).await?);
        }
        let index = locked
            .iter()
            .position(|p| p.id == provider_id)
            .ok_or_else(|| AppError::ResourceNotFound("Prestador".to_string()))?;
        let mut provider = locked.swap_remove(index);

        let released = lifecycle::assign_provider(&mut booking, &mut provider, Some(actor.id), now)?;

        if released.is_some() {
            if let Some(mut previous) = locked.pop() {
                previous.release();
                self.provider_repo.save(&mut *tx, &mut previous).await?;
            }
        }
        self.provider_repo.save(&mut *tx, &mut provider).await?;
        self.booking_repo.save(&mut *tx, &mut booking).await?;

        tx.commit().await?;

        tracing::info!(
            booking = %booking.booking_code,
            provider = %provider.provider_code,
            "Prestador atribuído"
        );
        self.notifier.dispatch(NotificationEvent::ProviderAssigned {
            booking_code: booking.booking_code.clone(),
            customer_email: booking.customer.email.clone(),
            provider_name: provider.name.clone(),
            provider_email: provider.email.clone(),
            scheduled_date: booking.scheduled_date,
        });

        Ok(booking)
    }

    pub async fn reschedule(
        &self,
        actor: &Account,
        requested: Option<Vertical>,
        id: Uuid,
        payload: ReschedulePayload,
        now: DateTime<Utc>,
    ) -> Result<Booking, AppError> {
        require_capability(actor, Capability::ManageBookings)?;

        let mut tx = self.pool.begin().await?;
        let mut booking = self.lock_booking(&mut tx, id).await?;
        ensure_staff_scope(actor, requested, &booking)?;

        let outcome = lifecycle::reschedule(
            &mut booking,
            payload.scheduled_date,
            payload.time_slot,
            Some(actor.id),
            payload.notes,
            now,
        )?;

        self.booking_repo.save(&mut *tx, &mut booking).await?;
        tx.commit().await?;

        self.notify_transition(&booking, outcome);
        Ok(booking)
    }

    // -------------------------------------------------------------------------
    //  OTP de conclusão (somente o prestador atribuído)
    // -------------------------------------------------------------------------

    pub async fn request_completion_otp(&self, actor: &Account, id: Uuid, now: DateTime<Utc>) -> Result<(), AppError> {
        require_capability(actor, Capability::FulfilBookings)?;

        let mut tx = self.pool.begin().await?;
        let mut booking = self.lock_booking(&mut tx, id).await?;

        let otp = lifecycle::issue_completion_otp(&mut booking, actor.provider_id, self.completion_otp_ttl, now)?;

        self.booking_repo.save(&mut *tx, &mut booking).await?;
        tx.commit().await?;

        self.notifier.dispatch(NotificationEvent::CompletionOtp {
            booking_code: booking.booking_code.clone(),
            customer_email: booking.customer.email.clone(),
            otp,
            valid_minutes: self.completion_otp_ttl.num_minutes(),
        });
        Ok(())
    }

    pub async fn verify_completion_otp(
        &self,
        actor: &Account,
        id: Uuid,
        submitted: &str,
        now: DateTime<Utc>,
    ) -> Result<Booking, AppError> {
        require_capability(actor, Capability::FulfilBookings)?;

        let mut tx = self.pool.begin().await?;
        let mut booking = self.lock_booking(&mut tx, id).await?;

        let result = lifecycle::verify_completion_otp(&mut booking, actor.provider_id, submitted, Some(actor.id), now);
        let outcome = match result {
            Ok(outcome) => outcome,
            // A tentativa errada precisa ficar gravada
            Err(AppError::InvalidOtp) => {
                self.booking_repo.save(&mut *tx, &mut booking).await?;
                tx.commit().await?;
                return Err(AppError::InvalidOtp);
            }
            Err(e) => return Err(e),
        };
        self.apply_side_effects(&mut tx, &booking, outcome).await?;

        self.booking_repo.save(&mut *tx, &mut booking).await?;
        tx.commit().await?;

        tracing::info!(booking = %booking.booking_code, "Reserva concluída via OTP");
        self.notify_transition(&booking, outcome);
        Ok(booking)
    }

    // -------------------------------------------------------------------------
    //  Avaliação
    // -------------------------------------------------------------------------

    pub async fn rate(
        &self,
        actor: &Account,
        requested: Option<Vertical>,
        id: Uuid,
        payload: RateBookingPayload,
        now: DateTime<Utc>,
    ) -> Result<Booking, AppError> {
        require_capability(actor, Capability::RateBookings)?;

        let mut tx = self.pool.begin().await?;
        let mut booking = self.lock_booking(&mut tx, id).await?;

        match payload.direction {
            RatingDirection::CustomerToProvider => {
                let is_customer =
                    actor.role == Role::Customer && actor.email.eq_ignore_ascii_case(&booking.customer.email);
                if !is_customer {
                    require_capability(actor, Capability::ManageBookings)?;
                    ensure_staff_scope(actor, requested, &booking)?;
                }
            }
            RatingDirection::ProviderToCustomer => lifecycle::ensure_assigned(&booking, actor.provider_id)?,
        }

        let provider_rating = lifecycle::rate(&mut booking, payload.direction, payload.rating, payload.comment.clone(), now)?;

        if let (Some(rating), Some(provider_id)) = (provider_rating, booking.service_provider) {
            let mut provider = self.lock_provider(&mut tx, provider_id).await?;
            provider.record_rating(booking.id, rating, payload.comment, now);
            self.provider_repo.save(&mut *tx, &mut provider).await?;
        }

        self.booking_repo.save(&mut *tx, &mut booking).await?;
        tx.commit().await?;

        Ok(booking)
    }

    // -------------------------------------------------------------------------
    //  Internos
    // -------------------------------------------------------------------------

    async fn lock_booking(&self, conn: &mut PgConnection, id: Uuid) -> Result<Booking, AppError> {
        self.booking_repo
            .lock_for_update(&mut *conn, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Reserva".to_string()))
    }

    async fn lock_provider(&self, conn: &mut PgConnection, id: Uuid) -> Result<Provider, AppError> {
        self.provider_repo
            .lock_for_update(&mut *conn, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Prestador".to_string()))
    }

    /// Contadores do prestador e do serviço, na mesma transação da reserva.
    async fn apply_side_effects(
        &self,
        conn: &mut PgConnection,
        booking: &Booking,
        outcome: TransitionOutcome,
    ) -> Result<(), AppError> {
        if let (Some(provider_id), true) = (booking.service_provider, outcome.provider_effect != ProviderEffect::None) {
            let mut provider = self.lock_provider(&mut *conn, provider_id).await?;
            lifecycle::apply_provider_effect(&mut provider, outcome.provider_effect);
            self.provider_repo.save(&mut *conn, &mut provider).await?;
        }

        if outcome.service_completed {
            self.service_repo.increment_completed_bookings(&mut *conn, booking.service_id).await?;
        }
        Ok(())
    }

    fn notify_transition(&self, booking: &Booking, outcome: TransitionOutcome) {
        self.notifier.dispatch(NotificationEvent::status_changed(booking));
        if outcome.to == BookingStatus::Completed {
            self.notifier.dispatch(NotificationEvent::booking_completed(booking));
        }
    }
}

/// Ids a travar na atribuição, em ordem crescente e sem repetição.
fn provider_lock_order(new_provider: Uuid, current: Option<Uuid>) -> Vec<Uuid> {
    let mut ids = vec![new_provider];
    if let Some(current) = current.filter(|c| *c != new_provider) {
        ids.push(current);
    }
    ids.sort();
    ids
}

fn initial_payment_status(total: Decimal, advance_paid: Decimal) -> PaymentStatus {
    if advance_paid.is_zero() {
        PaymentStatus::Pending
    } else if advance_paid >= total {
        PaymentStatus::Completed
    } else {
        PaymentStatus::Partial
    }
}

/// Equipe com `ManageBookings` e a vertical da reserva no escopo.
fn ensure_staff_scope(actor: &Account, requested: Option<Vertical>, booking: &Booking) -> Result<(), AppError> {
    if !has_capability(actor, Capability::ManageBookings) && !has_capability(actor, Capability::AssignProviders) {
        return Err(if has_capability(actor, Capability::FulfilBookings) {
            AppError::NotAssignedProvider
        } else {
            AppError::MissingCapability(Capability::ManageBookings.slug())
        });
    }

    let filter = filter_for(actor, requested)?;
    if filter.allows(booking.service_type) {
        Ok(())
    } else {
        Err(AppError::AccessDenied(booking.service_type.to_string()))
    }
}

/// Quem pode levar a reserva para `next`.
fn authorize_transition(
    actor: &Account,
    requested: Option<Vertical>,
    booking: &Booking,
    next: BookingStatus,
) -> Result<(), AppError> {
    if has_capability(actor, Capability::ManageBookings) {
        return ensure_staff_scope(actor, requested, booking);
    }

    if has_capability(actor, Capability::FulfilBookings) {
        lifecycle::ensure_assigned(booking, actor.provider_id)?;
        if lifecycle::provider_may_set(next) {
            return Ok(());
        }
    }

    Err(AppError::MissingCapability(Capability::ManageBookings.slug()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::booking::fixtures::booking,
        services::access_control::fixtures::account,
    };

    #[test]
    fn payment_status_follows_advance() {
        assert_eq!(initial_payment_status(Decimal::from(770), Decimal::ZERO), PaymentStatus::Pending);
        assert_eq!(initial_payment_status(Decimal::from(770), Decimal::from(100)), PaymentStatus::Partial);
        assert_eq!(initial_payment_status(Decimal::from(770), Decimal::from(770)), PaymentStatus::Completed);
    }

    #[test]
    fn reassignment_locks_providers_in_a_stable_order() {
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();

        // Booking A: p1 -> p2. Booking B: p2 -> p1. Mesma ordem nos dois.
        assert_eq!(provider_lock_order(p2, Some(p1)), provider_lock_order(p1, Some(p2)));

        let order = provider_lock_order(p2, Some(p1));
        assert!(order[0] < order[1]);

        assert_eq!(provider_lock_order(p1, None), vec![p1]);
        assert_eq!(provider_lock_order(p1, Some(p1)), vec![p1]);
    }

    #[test]
    fn assigned_provider_drives_field_statuses_only() {
        let mut b = booking(Uuid::new_v4(), 100, 0);
        let mut provider_account = account(Role::ServiceProvider, Some(Vertical::OnDemand));
        let provider_id = Uuid::new_v4();
        provider_account.provider_id = Some(provider_id);
        b.service_provider = Some(provider_id);

        assert!(authorize_transition(&provider_account, None, &b, BookingStatus::InProgress).is_ok());
        assert!(matches!(
            authorize_transition(&provider_account, None, &b, BookingStatus::Completed),
            Err(AppError::MissingCapability(_))
        ));

        b.service_provider = Some(Uuid::new_v4());
        assert!(matches!(
            authorize_transition(&provider_account, None, &b, BookingStatus::InProgress),
            Err(AppError::NotAssignedProvider)
        ));
    }

    #[test]
    fn staff_outside_the_booking_vertical_is_denied() {
        let b = booking(Uuid::new_v4(), 100, 0);
        let interior_admin = account(Role::InteriorAdmin, None);
        let on_demand_admin = account(Role::OnDemandAdmin, None);

        assert!(matches!(
            authorize_transition(&interior_admin, None, &b, BookingStatus::Confirmed),
            Err(AppError::AccessDenied(v)) if v == "on_demand"
        ));
        assert!(authorize_transition(&on_demand_admin, None, &b, BookingStatus::Confirmed).is_ok());
    }

    #[test]
    fn customers_cannot_drive_transitions() {
        let b = booking(Uuid::new_v4(), 100, 0);
        let customer = account(Role::Customer, None);
        assert!(matches!(
            authorize_transition(&customer, None, &b, BookingStatus::CancelledByCustomer),
            Err(AppError::MissingCapability(_))
        ));
    }
}
