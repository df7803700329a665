// src/db/project_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        account::Vertical,
        project::{CreateProjectPayload, Project},
    },
    services::access_control::VerticalFilter,
};

#[derive(Clone)]
pub struct ProjectRepository {
    pool: PgPool,
}

impl ProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        payload: &CreateProjectPayload,
        service_type: Vertical,
        created_by: Uuid,
    ) -> Result<Project, AppError> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, client_name, client_email, service_type, budget, start_date, end_date, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(&payload.name)
        .bind(&payload.client_name)
        .bind(&payload.client_email)
        .bind(service_type)
        .bind(payload.budget)
        .bind(payload.start_date)
        .bind(payload.end_date)
        .bind(&payload.notes)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(project)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Project>, AppError> {
        let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(project)
    }

    pub async fn list(&self, filter: &VerticalFilter) -> Result<Vec<Project>, AppError> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT * FROM projects
            WHERE ($1::text[] IS NULL OR service_type = ANY($1))
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.as_bind())
        .fetch_all(&self.pool)
        .await?;
        Ok(projects)
    }

    // Só as colunas da lista de campos editáveis
    pub async fn update(&self, project: &Project) -> Result<Project, AppError> {
        let updated = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects SET
                name = $2, status = $3, budget = $4, start_date = $5, end_date = $6, notes = $7,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(project.id)
        .bind(&project.name)
        .bind(project.status)
        .bind(project.budget)
        .bind(project.start_date)
        .bind(project.end_date)
        .bind(&project.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(updated)
    }
}
