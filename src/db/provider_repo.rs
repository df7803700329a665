// src/db/provider_repo.rs

use sqlx::{types::Json, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::next_display_code, error::map_unique_violation, error::AppError},
    models::provider::{CreateProviderPayload, Provider},
    services::provider_matching::{city_pattern, EligibilityCriteria},
};

#[derive(Clone)]
pub struct ProviderRepository {
    pool: PgPool,
}

impl ProviderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(&self, executor: E, provider_code: &str, payload: &CreateProviderPayload) -> Result<Provider, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Provider>(
            r#"
            INSERT INTO providers (
                provider_code, account_id, name, email, phone, services, experience_years,
                address, service_pincodes, working_days, working_hours
            )
            VALUES ($1, $2, $3, lower($4), $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(provider_code)
        .bind(payload.account_id)
        .bind(&payload.name)
        .bind(&payload.email)
        .bind(&payload.phone)
        .bind(Json(&payload.services))
        .bind(payload.experience_years)
        .bind(Json(&payload.address))
        .bind(&payload.service_pincodes)
        .bind(normalized_days(&payload.working_days))
        .bind(Json(payload.working_hours.clone().unwrap_or_default()))
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, &payload.email))
    }

    pub async fn next_code<'e, E>(&self, executor: E) -> Result<String, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        next_display_code(executor, "provider_code_seq", "SP").await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Provider>, AppError> {
        let provider = sqlx::query_as::<_, Provider>("SELECT * FROM providers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(provider)
    }

    /// Trava a linha até o fim da transação.
    pub async fn lock_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Provider>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let provider = sqlx::query_as::<_, Provider>("SELECT * FROM providers WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(provider)
    }

    pub async fn set_account<'e, E>(&self, executor: E, provider_id: Uuid, account_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE providers SET account_id = $2, updated_at = now() WHERE id = $1")
            .bind(provider_id)
            .bind(account_id)
            .execute(executor)
            .await
            .map_err(|e| map_unique_violation(e, "account_id"))?;
        Ok(())
    }

    /// Grava o estado mutável do prestador (contadores, agenda, avaliações).
    pub async fn save<'e, E>(&self, executor: E, provider: &mut Provider) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        provider.recompute_derived();

        sqlx::query(
            r#"
            UPDATE providers SET
                status = $2,
                availability_status = $3,
                working_days = $4,
                working_hours = $5,
                unavailable_dates = $6,
                total_bookings = $7,
                completed_bookings = $8,
                cancelled_bookings = $9,
                completion_rate = $10,
                rating_average = $11,
                rating_count = $12,
                reviews = $13,
                earnings = $14,
                documents_verified = $15,
                background_verified = $16,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(provider.id)
        .bind(provider.status)
        .bind(provider.availability_status)
        .bind(&provider.working_days)
        .bind(&provider.working_hours)
        .bind(&provider.unavailable_dates)
        .bind(provider.total_bookings)
        .bind(provider.completed_bookings)
        .bind(provider.cancelled_bookings)
        .bind(provider.completion_rate)
        .bind(provider.rating_average)
        .bind(provider.rating_count)
        .bind(&provider.reviews)
        .bind(&provider.earnings)
        .bind(provider.documents_verified)
        .bind(provider.background_verified)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Primeira fase da busca: serviço, status, disponibilidade, local e ordenação.
    /// Empate na nota: mais experiência primeiro, depois o cadastro mais antigo.
    pub async fn find_eligible(&self, criteria: &EligibilityCriteria) -> Result<Vec<Provider>, AppError> {
        let offered = serde_json::json!([{ "service": criteria.service_id }]);

        let providers = sqlx::query_as::<_, Provider>(
            r#"
            SELECT * FROM providers
            WHERE services @> $1
              AND status = 'active'
              AND availability_status = 'available'
              AND ($2::text IS NULL OR address ->> 'city' ILIKE $2)
              AND ($3::text IS NULL OR $3 = ANY(service_pincodes))
            ORDER BY rating_average DESC, experience_years DESC, created_at ASC
            "#,
        )
        .bind(offered)
        .bind(criteria.city.as_deref().map(city_pattern))
        .bind(criteria.pincode.as_deref())
        .fetch_all(&self.pool)
        .await?;

        Ok(providers)
    }
}

pub(crate) fn normalized_days(days: &[String]) -> Vec<String> {
    days.iter().map(|d| d.trim().to_lowercase()).collect()
}
