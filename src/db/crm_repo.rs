// src/db/crm_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        account::Vertical,
        project::{CreateLeadPayload, Lead},
    },
    services::access_control::VerticalFilter,
};

// Leads comerciais (CRM)
#[derive(Clone)]
pub struct CrmRepository {
    pool: PgPool,
}

impl CrmRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_lead(
        &self,
        payload: &CreateLeadPayload,
        service_type: Vertical,
        created_by: Uuid,
    ) -> Result<Lead, AppError> {
        let lead = sqlx::query_as::<_, Lead>(
            r#"
            INSERT INTO leads (name, email, phone, service_type, source, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&payload.name)
        .bind(&payload.email)
        .bind(&payload.phone)
        .bind(service_type)
        .bind(&payload.source)
        .bind(&payload.notes)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(lead)
    }

    pub async fn find_lead(&self, id: Uuid) -> Result<Option<Lead>, AppError> {
        let lead = sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(lead)
    }

    pub async fn list_leads(&self, filter: &VerticalFilter) -> Result<Vec<Lead>, AppError> {
        let leads = sqlx::query_as::<_, Lead>(
            r#"
            SELECT * FROM leads
            WHERE ($1::text[] IS NULL OR service_type = ANY($1))
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.as_bind())
        .fetch_all(&self.pool)
        .await?;
        Ok(leads)
    }

    pub async fn update_lead(&self, lead: &Lead) -> Result<Lead, AppError> {
        let updated = sqlx::query_as::<_, Lead>(
            r#"
            UPDATE leads SET status = $2, phone = $3, source = $4, notes = $5, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(lead.id)
        .bind(lead.status)
        .bind(&lead.phone)
        .bind(&lead.source)
        .bind(&lead.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(updated)
    }
}
