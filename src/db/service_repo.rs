// src/db/service_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::service::{CreateServicePayload, ServiceDefinition},
    services::access_control::VerticalFilter,
};

#[derive(Clone)]
pub struct ServiceRepository {
    pool: PgPool,
}

impl ServiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn create(&self, payload: &CreateServicePayload) -> Result<ServiceDefinition, AppError> {
        sqlx::query_as::<_, ServiceDefinition>(
            r#"
            INSERT INTO services (name, description, category, service_type, base_price, duration_minutes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(&payload.category)
        .bind(payload.service_type)
        .bind(payload.base_price)
        .bind(payload.duration_minutes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, &payload.name))
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<ServiceDefinition>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let service = sqlx::query_as::<_, ServiceDefinition>("SELECT * FROM services WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(service)
    }

    /// Catálogo público: só serviços ativos.
    pub async fn list_active(&self, filter: &VerticalFilter) -> Result<Vec<ServiceDefinition>, AppError> {
        let services = sqlx::query_as::<_, ServiceDefinition>(
            r#"
            SELECT * FROM services
            WHERE is_active AND ($1::text[] IS NULL OR service_type = ANY($1))
            ORDER BY service_type, category, name
            "#,
        )
        .bind(filter.as_bind())
        .fetch_all(&self.pool)
        .await?;
        Ok(services)
    }

    // Contadores: chamados dentro da transação da reserva
    pub async fn increment_total_bookings<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE services SET total_bookings = total_bookings + 1, updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn increment_completed_bookings<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "UPDATE services SET completed_bookings = completed_bookings + 1, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(())
    }
}
