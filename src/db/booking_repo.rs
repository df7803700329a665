// src/db/booking_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::next_display_code, error::AppError},
    models::booking::{Booking, BookingStatus},
    services::access_control::VerticalFilter,
};

#[derive(Clone)]
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn next_code<'e, E>(&self, executor: E) -> Result<String, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        next_display_code(executor, "booking_code_seq", "OD-BK").await
    }

    pub async fn insert<'e, E>(&self, executor: E, booking: &mut Booking) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        booking.prepare_for_save();

        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, booking_code, service_id, service_type, customer, service_address,
                scheduled_date, time_slot, service_details, service_provider, pricing, payment,
                status, status_history, otp, completion_otp, ratings, priority, source,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21)
            "#,
        )
        .bind(booking.id)
        .bind(&booking.booking_code)
        .bind(booking.service_id)
        .bind(booking.service_type)
        .bind(&booking.customer)
        .bind(&booking.service_address)
        .bind(booking.scheduled_date)
        .bind(&booking.time_slot)
        .bind(&booking.service_details)
        .bind(booking.service_provider)
        .bind(&booking.pricing)
        .bind(&booking.payment)
        .bind(booking.status)
        .bind(&booking.status_history)
        .bind(&booking.otp)
        .bind(&booking.completion_otp)
        .bind(&booking.ratings)
        .bind(booking.priority)
        .bind(&booking.source)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>, AppError> {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(booking)
    }

    /// Trava a reserva até o fim da transação: toda transição passa por aqui.
    pub async fn lock_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Booking>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(booking)
    }

    /// Rastreamento público: o código e o telefone precisam bater.
    pub async fn find_by_code_and_phone(&self, booking_code: &str, phone: &str) -> Result<Option<Booking>, AppError> {
        let booking = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE booking_code = $1 AND customer ->> 'phone' = $2",
        )
        .bind(booking_code.trim())
        .bind(phone.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(booking)
    }

    pub async fn list(&self, filter: &VerticalFilter, status: Option<BookingStatus>) -> Result<Vec<Booking>, AppError> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE ($1::text[] IS NULL OR service_type = ANY($1))
              AND ($2::text IS NULL OR status = $2)
            ORDER BY scheduled_date DESC, created_at DESC
            "#,
        )
        .bind(filter.as_bind())
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(bookings)
    }

    pub async fn list_by_provider(&self, provider_id: Uuid, status: Option<BookingStatus>) -> Result<Vec<Booking>, AppError> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE service_provider = $1
              AND ($2::text IS NULL OR status = $2)
            ORDER BY scheduled_date ASC, created_at ASC
            "#,
        )
        .bind(provider_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(bookings)
    }

    /// Grava a reserva inteira. O preço é recalculado antes, sempre.
    pub async fn save<'e, E>(&self, executor: E, booking: &mut Booking) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        booking.prepare_for_save();

        sqlx::query(
            r#"
            UPDATE bookings SET
                scheduled_date = $2,
                time_slot = $3,
                service_provider = $4,
                pricing = $5,
                payment = $6,
                status = $7,
                status_history = $8,
                otp = $9,
                completion_otp = $10,
                work_started_at = $11,
                work_ended_at = $12,
                actual_duration_minutes = $13,
                cancellation = $14,
                ratings = $15,
                updated_at = $16
            WHERE id = $1
            "#,
        )
        .bind(booking.id)
        .bind(booking.scheduled_date)
        .bind(&booking.time_slot)
        .bind(booking.service_provider)
        .bind(&booking.pricing)
        .bind(&booking.payment)
        .bind(booking.status)
        .bind(&booking.status_history)
        .bind(&booking.otp)
        .bind(&booking.completion_otp)
        .bind(booking.work_started_at)
        .bind(booking.work_ended_at)
        .bind(booking.actual_duration_minutes)
        .bind(&booking.cancellation)
        .bind(&booking.ratings)
        .bind(booking.updated_at)
        .execute(executor)
        .await?;

        Ok(())
    }
}
