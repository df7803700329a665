// src/services/booking_lifecycle.rs

// Regras puras da máquina de estados da reserva. Nada aqui toca o banco:
// o `BookingService` trava as linhas, chama estas funções e persiste o resultado.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        booking::{
            Booking, BookingOtp, BookingStatus, Cancellation, CompletionOtp, PaymentStatus,
            RatingDirection, RatingEntry, StatusHistoryEntry, TimeSlot,
        },
        provider::Provider,
    },
};

/// Erros de código aceitos antes de o OTP ser bloqueado.
pub const MAX_OTP_ATTEMPTS: u32 = 5;

/// O que a transição exige do prestador atribuído.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProviderEffect {
    None,
    // no_show_*: volta a ficar disponível, contadores intactos
    Release,
    Cancellation,
    Completion(Decimal),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionOutcome {
    pub from: BookingStatus,
    pub to: BookingStatus,
    pub provider_effect: ProviderEffect,
    pub service_completed: bool,
}

pub fn generate_otp() -> String {
    format!("{:06}", rand::rng().random_range(0..1_000_000u32))
}

pub fn parse_status(raw: &str) -> Result<BookingStatus, AppError> {
    raw.parse::<BookingStatus>().map_err(AppError::InvalidStatus)
}

/// Status que o prestador atribuído pode aplicar por conta própria.
pub fn provider_may_set(next: BookingStatus) -> bool {
    matches!(
        next,
        BookingStatus::ProviderOnWay
            | BookingStatus::InProgress
            | BookingStatus::WorkCompleted
            | BookingStatus::CancelledByProvider
            | BookingStatus::NoShowCustomer
    )
}

pub fn ensure_assigned(booking: &Booking, provider_id: Option<Uuid>) -> Result<(), AppError> {
    match (booking.service_provider, provider_id) {
        (Some(assigned), Some(caller)) if assigned == caller => Ok(()),
        _ => Err(AppError::NotAssignedProvider),
    }
}

/// Aplica uma transição validada. Em erro a reserva fica intacta.
pub fn apply_transition(
    booking: &mut Booking,
    next: BookingStatus,
    updated_by: Option<Uuid>,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> Result<TransitionOutcome, AppError> {
    let from = booking.status;
    if !from.can_transition_to(next) {
        return Err(AppError::InvalidTransition { from: from.to_string(), to: next.to_string() });
    }

    booking.status = next;
    booking.status_history.push(StatusHistoryEntry {
        status: next,
        timestamp: now,
        updated_by,
        notes,
    });
    booking.updated_at = now;

    let assigned = booking.service_provider.is_some();
    let mut outcome = TransitionOutcome {
        from,
        to: next,
        provider_effect: ProviderEffect::None,
        service_completed: false,
    };

    match next {
        BookingStatus::InProgress => {
            if booking.work_started_at.is_none() {
                booking.work_started_at = Some(now);
            }
        }
        BookingStatus::WorkCompleted => {
            if booking.work_ended_at.is_none() {
                booking.work_ended_at = Some(now);
                booking.actual_duration_minutes = booking.work_started_at.map(|start| rounded_minutes(now - start));
            }
        }
        BookingStatus::Completed => {
            if booking.pricing.remaining_amount.is_zero() {
                booking.payment.status = PaymentStatus::Completed;
            }
            if assigned {
                outcome.provider_effect = ProviderEffect::Completion(booking.pricing.total);
            }
            outcome.service_completed = true;
        }
        status if status.is_no_show() => {
            if assigned {
                outcome.provider_effect = ProviderEffect::Release;
            }
        }
        status => {
            if let Some(cancelled_by) = status.cancelled_by() {
                booking.cancellation = Some(Json(Cancellation {
                    cancelled_by,
                    cancelled_at: now,
                    reason: booking.status_history.last().and_then(|h| h.notes.clone()),
                    refund_eligible: true,
                }));
                if assigned {
                    outcome.provider_effect = ProviderEffect::Cancellation;
                }
            }
        }
    }

    Ok(outcome)
}

fn rounded_minutes(elapsed: Duration) -> i64 {
    (elapsed.num_seconds() as f64 / 60.0).round() as i64
}

pub fn apply_provider_effect(provider: &mut Provider, effect: ProviderEffect) {
    match effect {
        ProviderEffect::None => {}
        ProviderEffect::Release => provider.release(),
        ProviderEffect::Cancellation => provider.record_cancellation(),
        ProviderEffect::Completion(amount) => provider.record_completion(amount),
    }
}

/// Atribui (ou troca) o prestador. Devolve o prestador anterior, que deve ser liberado.
pub fn assign_provider(
    booking: &mut Booking,
    provider: &mut Provider,
    updated_by: Option<Uuid>,
    now: DateTime<Utc>,
) -> Result<Option<Uuid>, AppError> {
    if !matches!(
        booking.status,
        BookingStatus::Pending | BookingStatus::Rescheduled | BookingStatus::Confirmed
    ) {
        return Err(AppError::WrongBookingState("pending/confirmed/rescheduled".to_string()));
    }
    if !provider.is_active() {
        return Err(AppError::ProviderIneligible(format!("{} não está ativo", provider.provider_code)));
    }
    if !provider.offers_service(booking.service_id) {
        return Err(AppError::ProviderIneligible(format!(
            "{} não oferece este serviço",
            provider.provider_code
        )));
    }
    if booking.service_provider == Some(provider.id) {
        return Err(AppError::InvalidInput("prestador já atribuído a esta reserva".to_string()));
    }

    if booking.status != BookingStatus::Confirmed {
        apply_transition(booking, BookingStatus::Confirmed, updated_by, None, now)?;
    }

    let previous = booking.service_provider.replace(provider.id);
    booking.updated_at = now;
    provider.record_assignment();

    Ok(previous)
}

pub fn reschedule(
    booking: &mut Booking,
    scheduled_date: NaiveDate,
    time_slot: TimeSlot,
    updated_by: Option<Uuid>,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> Result<TransitionOutcome, AppError> {
    let outcome = apply_transition(booking, BookingStatus::Rescheduled, updated_by, notes, now)?;
    booking.scheduled_date = scheduled_date;
    booking.time_slot = Json(time_slot);
    Ok(outcome)
}

// --- OTP de criação ---

pub fn issue_booking_otp(booking: &mut Booking, now: DateTime<Utc>) -> String {
    let code = generate_otp();
    booking.otp = Some(Json(BookingOtp {
        code: code.clone(),
        verified: false,
        generated_at: now,
        verified_at: None,
        failed_attempts: 0,
    }));
    code
}

pub fn verify_booking_otp(booking: &mut Booking, submitted: &str, now: DateTime<Utc>) -> Result<(), AppError> {
    let otp = &mut booking.otp.as_mut().ok_or(AppError::NoOtpRequested)?.0;
    if otp.verified {
        return Err(AppError::OtpAlreadyVerified);
    }
    check_attempt(&otp.code, &mut otp.failed_attempts, submitted)?;
    otp.verified = true;
    otp.verified_at = Some(now);
    booking.updated_at = now;
    Ok(())
}

/// Bloqueado no limite; código errado conta uma tentativa.
/// Quem chama precisa persistir a reserva também no caso `InvalidOtp`.
fn check_attempt(code: &str, failed_attempts: &mut u32, submitted: &str) -> Result<(), AppError> {
    if *failed_attempts >= MAX_OTP_ATTEMPTS {
        return Err(AppError::TooManyOtpAttempts);
    }
    if code != submitted {
        *failed_attempts += 1;
        return Err(AppError::InvalidOtp);
    }
    Ok(())
}

// --- OTP de conclusão ---

pub fn issue_completion_otp(
    booking: &mut Booking,
    caller_provider: Option<Uuid>,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<String, AppError> {
    ensure_assigned(booking, caller_provider)?;
    if booking.status != BookingStatus::WorkCompleted {
        return Err(AppError::WrongBookingState(BookingStatus::WorkCompleted.to_string()));
    }

    let code = generate_otp();
    booking.completion_otp = Some(Json(CompletionOtp {
        code: code.clone(),
        generated_at: now,
        expires_at: now + ttl,
        verified: false,
        verified_at: None,
        failed_attempts: 0,
    }));
    booking.updated_at = now;
    Ok(code)
}

/// Confere o código e conclui a reserva pela mesma transição do caminho de status.
pub fn verify_completion_otp(
    booking: &mut Booking,
    caller_provider: Option<Uuid>,
    submitted: &str,
    updated_by: Option<Uuid>,
    now: DateTime<Utc>,
) -> Result<TransitionOutcome, AppError> {
    ensure_assigned(booking, caller_provider)?;

    let otp = &mut booking.completion_otp.as_mut().ok_or(AppError::NoOtpRequested)?.0;
    if now > otp.expires_at {
        return Err(AppError::OtpExpired);
    }
    if otp.verified {
        return Err(AppError::OtpAlreadyVerified);
    }
    check_attempt(&otp.code, &mut otp.failed_attempts, submitted)?;

    let outcome = apply_transition(
        booking,
        BookingStatus::Completed,
        updated_by,
        Some("Concluída via OTP".to_string()),
        now,
    )?;

    if let Some(otp) = booking.completion_otp.as_mut() {
        otp.verified = true;
        otp.verified_at = Some(now);
    }

    Ok(outcome)
}

// --- Avaliação ---

/// Registra a nota na reserva. Devolve a nota quando ela deve entrar na média do prestador.
pub fn rate(
    booking: &mut Booking,
    direction: RatingDirection,
    rating: i32,
    comment: Option<String>,
    now: DateTime<Utc>,
) -> Result<Option<u8>, AppError> {
    let rating = u8::try_from(rating)
        .ok()
        .filter(|r| (1..=5).contains(r))
        .ok_or(AppError::InvalidRating)?;

    if booking.status != BookingStatus::Completed {
        return Err(AppError::WrongBookingState(BookingStatus::Completed.to_string()));
    }

    let slot = match direction {
        RatingDirection::CustomerToProvider => &mut booking.ratings.customer_to_provider,
        RatingDirection::ProviderToCustomer => &mut booking.ratings.provider_to_customer,
    };
    if slot.is_some() {
        return Err(AppError::AlreadyRated);
    }
    *slot = Some(RatingEntry { rating, comment, rated_at: now });
    booking.updated_at = now;

    Ok(match direction {
        RatingDirection::CustomerToProvider => Some(rating),
        RatingDirection::ProviderToCustomer => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        booking::fixtures::booking,
        provider::{fixtures::provider, AvailabilityStatus, ProviderStatus},
    };
    use chrono::TimeZone;
    use rstest::rstest;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 20, 10, 0, 0).unwrap()
    }

    fn walk(b: &mut Booking, steps: &[BookingStatus], at: DateTime<Utc>) {
        for s in steps {
            apply_transition(b, *s, None, None, at).unwrap();
        }
    }

    /// Reserva com prestador atribuído, parada em `work_completed`.
    fn finished_work() -> (Booking, Provider) {
        let service_id = Uuid::new_v4();
        let mut b = booking(service_id, 770, 0);
        let mut p = provider(&[service_id]);
        assign_provider(&mut b, &mut p, None, t0()).unwrap();
        walk(&mut b, &[BookingStatus::InProgress], t0());
        walk(&mut b, &[BookingStatus::WorkCompleted], t0() + Duration::minutes(110));
        (b, p)
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(matches!(parse_status("flying"), Err(AppError::InvalidStatus(s)) if s == "flying"));
        assert_eq!(parse_status("work_completed").unwrap(), BookingStatus::WorkCompleted);
    }

    #[test]
    fn each_transition_appends_exactly_one_history_entry() {
        let mut b = booking(Uuid::new_v4(), 100, 0);
        let before = b.status_history.len();
        let actor = Uuid::new_v4();

        apply_transition(&mut b, BookingStatus::Confirmed, Some(actor), Some("ok".into()), t0()).unwrap();

        assert_eq!(b.status_history.len(), before + 1);
        let last = b.status_history.last().unwrap();
        assert_eq!(last.status, BookingStatus::Confirmed);
        assert_eq!(last.updated_by, Some(actor));
        assert_eq!(last.notes.as_deref(), Some("ok"));
    }

    #[test]
    fn rejected_transition_leaves_booking_untouched() {
        let mut b = booking(Uuid::new_v4(), 100, 0);
        let err = apply_transition(&mut b, BookingStatus::Completed, None, None, t0()).unwrap_err();

        assert!(matches!(err, AppError::InvalidTransition { .. }));
        assert_eq!(b.status, BookingStatus::Pending);
        assert_eq!(b.status_history.len(), 1);
    }

    #[test]
    fn full_scenario_records_duration_and_frees_provider() {
        let (mut b, mut p) = finished_work();
        assert_eq!(b.pricing.remaining_amount, Decimal::from(770));
        assert_eq!(b.actual_duration_minutes, Some(110));
        assert_eq!(p.availability_status, AvailabilityStatus::Busy);
        assert_eq!(p.total_bookings, 1);

        let outcome = apply_transition(&mut b, BookingStatus::Completed, None, None, t0()).unwrap();
        assert!(outcome.service_completed);
        apply_provider_effect(&mut p, outcome.provider_effect);

        assert_eq!(p.completed_bookings, 1);
        assert_eq!(p.availability_status, AvailabilityStatus::Available);
        assert_eq!(p.earnings.total_earned, Decimal::from(770));
        // Ainda há saldo a pagar
        assert_eq!(b.payment.status, PaymentStatus::Pending);
    }

    #[test]
    fn completing_twice_is_rejected() {
        let (mut b, _) = finished_work();
        apply_transition(&mut b, BookingStatus::Completed, None, None, t0()).unwrap();

        let again = apply_transition(&mut b, BookingStatus::Completed, None, None, t0());
        assert!(matches!(again, Err(AppError::InvalidTransition { .. })));
    }

    #[test]
    fn work_start_is_not_overwritten() {
        let (b, _) = finished_work();
        assert_eq!(b.work_started_at, Some(t0()));
        assert_eq!(b.work_ended_at, Some(t0() + Duration::minutes(110)));
    }

    #[test]
    fn duration_rounds_to_nearest_minute() {
        assert_eq!(rounded_minutes(Duration::seconds(89)), 1);
        assert_eq!(rounded_minutes(Duration::seconds(90)), 2);
        assert_eq!(rounded_minutes(Duration::seconds(6600)), 110);
    }

    #[test]
    fn fully_paid_booking_marks_payment_completed() {
        let service_id = Uuid::new_v4();
        let mut b = booking(service_id, 500, 500);
        walk(
            &mut b,
            &[
                BookingStatus::Confirmed,
                BookingStatus::InProgress,
                BookingStatus::WorkCompleted,
                BookingStatus::Completed,
            ],
            t0(),
        );
        assert_eq!(b.payment.status, PaymentStatus::Completed);
    }

    #[test]
    fn cancellation_is_recorded_with_actor_from_status() {
        let service_id = Uuid::new_v4();
        let mut b = booking(service_id, 100, 0);
        let mut p = provider(&[service_id]);
        assign_provider(&mut b, &mut p, None, t0()).unwrap();

        let outcome = apply_transition(
            &mut b,
            BookingStatus::CancelledByCustomer,
            None,
            Some("mudou de ideia".into()),
            t0(),
        )
        .unwrap();
        apply_provider_effect(&mut p, outcome.provider_effect);

        let cancellation = b.cancellation.as_ref().unwrap();
        assert_eq!(cancellation.cancelled_by, crate::models::booking::CancelledBy::Customer);
        assert!(cancellation.refund_eligible);
        assert_eq!(cancellation.reason.as_deref(), Some("mudou de ideia"));
        assert_eq!(p.cancelled_bookings, 1);
        assert_eq!(p.availability_status, AvailabilityStatus::Available);
    }

    #[test]
    fn no_show_releases_provider_without_counting() {
        let service_id = Uuid::new_v4();
        let mut b = booking(service_id, 100, 0);
        let mut p = provider(&[service_id]);
        assign_provider(&mut b, &mut p, None, t0()).unwrap();

        let outcome = apply_transition(&mut b, BookingStatus::NoShowCustomer, None, None, t0()).unwrap();
        assert_eq!(outcome.provider_effect, ProviderEffect::Release);
        apply_provider_effect(&mut p, outcome.provider_effect);

        assert_eq!(p.availability_status, AvailabilityStatus::Available);
        assert_eq!(p.cancelled_bookings, 0);
        assert_eq!(p.completed_bookings, 0);
    }

    #[test]
    fn assignment_requires_the_booked_service() {
        let mut b = booking(Uuid::new_v4(), 100, 0);
        let mut p = provider(&[Uuid::new_v4()]);

        let err = assign_provider(&mut b, &mut p, None, t0()).unwrap_err();
        assert!(matches!(err, AppError::ProviderIneligible(_)));
        assert_eq!(b.service_provider, None);
        assert_eq!(p.total_bookings, 0);
    }

    #[test]
    fn assignment_rejects_inactive_provider() {
        let service_id = Uuid::new_v4();
        let mut b = booking(service_id, 100, 0);
        let mut p = provider(&[service_id]);
        p.status = ProviderStatus::Suspended;

        assert!(matches!(
            assign_provider(&mut b, &mut p, None, t0()),
            Err(AppError::ProviderIneligible(_))
        ));
    }

    #[test]
    fn assignment_confirms_and_reassignment_returns_previous() {
        let service_id = Uuid::new_v4();
        let mut b = booking(service_id, 100, 0);
        let mut first = provider(&[service_id]);
        let mut second = provider(&[service_id]);

        assert_eq!(assign_provider(&mut b, &mut first, None, t0()).unwrap(), None);
        assert_eq!(b.status, BookingStatus::Confirmed);
        assert_eq!(first.availability_status, AvailabilityStatus::Busy);
        let history = b.status_history.len();

        let previous = assign_provider(&mut b, &mut second, None, t0()).unwrap();
        assert_eq!(previous, Some(first.id));
        assert_eq!(b.service_provider, Some(second.id));
        // Já estava confirmada: nenhuma entrada nova
        assert_eq!(b.status_history.len(), history);
    }

    #[rstest]
    #[case(-1, true)]
    #[case(1, false)]
    #[case(0, false)]
    #[case(59, false)]
    fn completion_otp_expiry_boundary(#[case] offset_secs: i64, #[case] expired: bool) {
        let (mut b, p) = finished_work();
        let issued_at = t0() + Duration::minutes(120);
        let code = issue_completion_otp(&mut b, Some(p.id), Duration::minutes(10), issued_at).unwrap();
        let expires_at = issued_at + Duration::minutes(10);

        // offset positivo = antes de expirar; negativo = depois
        let now = expires_at - Duration::seconds(offset_secs);
        let result = verify_completion_otp(&mut b, Some(p.id), &code, None, now);

        if expired {
            assert!(matches!(result, Err(AppError::OtpExpired)), "{offset_secs}");
            assert_eq!(b.status, BookingStatus::WorkCompleted);
        } else {
            assert!(result.is_ok(), "{offset_secs}");
            assert_eq!(b.status, BookingStatus::Completed);
            assert!(b.completion_otp.as_ref().unwrap().verified);
        }
    }

    #[test]
    fn completion_otp_errors_in_order() {
        let (mut b, p) = finished_work();
        let now = t0() + Duration::minutes(120);

        assert!(matches!(
            verify_completion_otp(&mut b, Some(p.id), "000000", None, now),
            Err(AppError::NoOtpRequested)
        ));

        let code = issue_completion_otp(&mut b, Some(p.id), Duration::minutes(10), now).unwrap();
        let wrong = if code == "000000" { "111111" } else { "000000" };
        assert!(matches!(
            verify_completion_otp(&mut b, Some(p.id), wrong, None, now),
            Err(AppError::InvalidOtp)
        ));

        let outcome = verify_completion_otp(&mut b, Some(p.id), &code, None, now).unwrap();
        assert_eq!(outcome.provider_effect, ProviderEffect::Completion(Decimal::from(770)));

        assert!(matches!(
            verify_completion_otp(&mut b, Some(p.id), &code, None, now),
            Err(AppError::OtpAlreadyVerified)
        ));
    }

    #[test]
    fn only_assigned_provider_handles_completion_otp() {
        let (mut b, _) = finished_work();
        let stranger = Some(Uuid::new_v4());

        assert!(matches!(
            issue_completion_otp(&mut b, stranger, Duration::minutes(10), t0()),
            Err(AppError::NotAssignedProvider)
        ));
        assert!(matches!(
            issue_completion_otp(&mut b, None, Duration::minutes(10), t0()),
            Err(AppError::NotAssignedProvider)
        ));
    }

    #[test]
    fn completion_otp_requires_work_completed() {
        let service_id = Uuid::new_v4();
        let mut b = booking(service_id, 100, 0);
        let mut p = provider(&[service_id]);
        assign_provider(&mut b, &mut p, None, t0()).unwrap();

        assert!(matches!(
            issue_completion_otp(&mut b, Some(p.id), Duration::minutes(10), t0()),
            Err(AppError::WrongBookingState(_))
        ));
        assert!(b.completion_otp.is_none());
    }

    #[test]
    fn booking_otp_verifies_once() {
        let mut b = booking(Uuid::new_v4(), 100, 0);
        assert!(matches!(verify_booking_otp(&mut b, "123456", t0()), Err(AppError::NoOtpRequested)));

        let code = issue_booking_otp(&mut b, t0());
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));

        verify_booking_otp(&mut b, &code, t0()).unwrap();
        assert!(matches!(verify_booking_otp(&mut b, &code, t0()), Err(AppError::OtpAlreadyVerified)));
    }

    #[test]
    fn booking_otp_locks_after_repeated_wrong_codes() {
        let mut b = booking(Uuid::new_v4(), 100, 0);
        let code = issue_booking_otp(&mut b, t0());
        let wrong = if code == "000000" { "111111" } else { "000000" };

        for _ in 0..MAX_OTP_ATTEMPTS {
            assert!(matches!(verify_booking_otp(&mut b, wrong, t0()), Err(AppError::InvalidOtp)));
        }
        assert_eq!(b.otp.as_ref().unwrap().failed_attempts, MAX_OTP_ATTEMPTS);

        // Nem o código certo passa depois do bloqueio
        assert!(matches!(verify_booking_otp(&mut b, &code, t0()), Err(AppError::TooManyOtpAttempts)));
        assert!(!b.otp.as_ref().unwrap().verified);
    }

    #[test]
    fn completion_otp_locks_after_repeated_wrong_codes() {
        let (mut b, p) = finished_work();
        let now = t0() + Duration::minutes(120);
        let code = issue_completion_otp(&mut b, Some(p.id), Duration::minutes(10), now).unwrap();
        let wrong = if code == "000000" { "111111" } else { "000000" };

        for _ in 0..MAX_OTP_ATTEMPTS {
            assert!(matches!(
                verify_completion_otp(&mut b, Some(p.id), wrong, None, now),
                Err(AppError::InvalidOtp)
            ));
        }
        assert!(matches!(
            verify_completion_otp(&mut b, Some(p.id), &code, None, now),
            Err(AppError::TooManyOtpAttempts)
        ));
        assert_eq!(b.status, BookingStatus::WorkCompleted);

        // Um código novo zera o contador
        let fresh = issue_completion_otp(&mut b, Some(p.id), Duration::minutes(10), now).unwrap();
        assert!(verify_completion_otp(&mut b, Some(p.id), &fresh, None, now).is_ok());
    }

    #[rstest]
    #[case(0)]
    #[case(6)]
    #[case(-3)]
    fn out_of_range_rating_is_rejected_first(#[case] rating: i32) {
        // Reserva ainda pendente: o intervalo é checado antes do estado
        let mut b = booking(Uuid::new_v4(), 100, 0);
        assert!(matches!(
            rate(&mut b, RatingDirection::CustomerToProvider, rating, None, t0()),
            Err(AppError::InvalidRating)
        ));
        assert!(b.ratings.customer_to_provider.is_none());
    }

    #[test]
    fn rating_needs_completed_booking_and_is_accepted_once_per_direction() {
        let (mut b, mut p) = finished_work();
        assert!(matches!(
            rate(&mut b, RatingDirection::CustomerToProvider, 5, None, t0()),
            Err(AppError::WrongBookingState(_))
        ));

        apply_transition(&mut b, BookingStatus::Completed, None, None, t0()).unwrap();

        let to_provider = rate(&mut b, RatingDirection::CustomerToProvider, 4, Some("bom".into()), t0()).unwrap();
        assert_eq!(to_provider, Some(4));
        p.record_rating(b.id, 4, None, t0());
        assert!((p.rating_average - 4.0).abs() < 1e-9);

        assert_eq!(rate(&mut b, RatingDirection::ProviderToCustomer, 5, None, t0()).unwrap(), None);
        assert!(matches!(
            rate(&mut b, RatingDirection::CustomerToProvider, 3, None, t0()),
            Err(AppError::AlreadyRated)
        ));
    }

    #[test]
    fn reschedule_moves_the_window() {
        let mut b = booking(Uuid::new_v4(), 100, 0);
        let new_date = NaiveDate::from_ymd_opt(2026, 10, 27).unwrap();
        let slot = TimeSlot { start: "14:00".into(), end: "16:00".into() };

        reschedule(&mut b, new_date, slot, None, None, t0()).unwrap();
        assert_eq!(b.status, BookingStatus::Rescheduled);
        assert_eq!(b.scheduled_date, new_date);
        assert_eq!(b.time_slot.start, "14:00");
    }

    #[test]
    fn provider_permissions_cover_field_statuses_only() {
        assert!(provider_may_set(BookingStatus::InProgress));
        assert!(provider_may_set(BookingStatus::CancelledByProvider));
        assert!(!provider_may_set(BookingStatus::Completed));
        assert!(!provider_may_set(BookingStatus::CancelledByAdmin));
    }
}
