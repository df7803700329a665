// src/db/account_repo.rs

use sqlx::{types::Json, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{is_link_constraint, map_unique_violation, AppError},
    models::account::{Account, AccountStatus, Role, Vertical},
};

// Dados de uma conta nova, já com a senha em hash
pub struct NewAccount<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub password_hash: &'a str,
    pub role: Role,
    pub service_type: Option<Vertical>,
    pub verticals: &'a [Vertical],
    pub provider_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE lower(email) = lower($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    pub async fn create<'e, E>(&self, executor: E, new: NewAccount<'_>) -> Result<Account, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (name, email, phone, password_hash, role, service_type, verticals, provider_id)
            VALUES ($1, lower($2), $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(new.name)
        .bind(new.email)
        .bind(new.phone)
        .bind(new.password_hash)
        .bind(new.role)
        .bind(new.service_type)
        .bind(Json(new.verticals))
        .bind(new.provider_id)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    if is_link_constraint(db_err.constraint()) {
                        return AppError::ProviderAlreadyLinked;
                    }
                    return AppError::EmailAlreadyExists;
                }
            }
            e.into()
        })
    }

    /// Trava a linha até o fim da transação.
    pub async fn lock_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Account>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(account)
    }

    pub async fn update_status(&self, id: Uuid, status: AccountStatus) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>(
            "UPDATE accounts SET status = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    pub async fn link_provider<'e, E>(&self, executor: E, account_id: Uuid, provider_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE accounts SET provider_id = $2, updated_at = now() WHERE id = $1")
            .bind(account_id)
            .bind(provider_id)
            .execute(executor)
            .await
            .map_err(|e| map_unique_violation(e, "provider_id"))?;
        Ok(())
    }
}
