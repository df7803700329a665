// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use axum::http::HeaderValue;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{AccountRepository, BookingRepository, CrmRepository, ProjectRepository, ProviderRepository, ServiceRepository},
    email::{self, SmtpConfig},
    services::{
        auth::AuthService, booking_service::BookingService, catalog_service::CatalogService,
        notification::Notifier, project_service::ProjectService, provider_service::ProviderService,
    },
};

// =============================================================================
//  CONFIGURAÇÃO (.env)
// =============================================================================

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    // "development" expõe a causa dos erros 500 na resposta
    pub app_env: String,
    pub cors_allowed_origins: Vec<HeaderValue>,
    pub db_max_connections: u32,
    pub notification_queue_capacity: usize,
    pub completion_otp_ttl_minutes: i64,
    pub smtp: Option<SmtpConfig>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(|o| HeaderValue::from_str(o).with_context(|| format!("Origem CORS inválida: {}", o)))
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            app_env: app_env_or_default(env::var("APP_ENV").ok()),
            cors_allowed_origins,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", 5)?,
            notification_queue_capacity: parse_var("NOTIFICATION_QUEUE_CAPACITY", 256)?,
            completion_otp_ttl_minutes: parse_var("COMPLETION_OTP_TTL_MINUTES", 10)?,
            smtp: SmtpConfig::from_env(),
        })
    }

    pub fn is_development(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("development")
    }
}

const DEFAULT_APP_ENV: &str = "development";

fn app_env_or_default(raw: Option<String>) -> String {
    raw.map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_APP_ENV.to_string())
}

fn parse_var<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse().with_context(|| format!("{} inválida: {}", key, raw)),
        _ => Ok(default),
    }
}

// =============================================================================
//  ESTADO COMPARTILHADO
// =============================================================================

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub i18n_store: Arc<I18nStore>,

    pub auth_service: AuthService,
    pub catalog_service: CatalogService,
    pub provider_service: ProviderService,
    pub booking_service: BookingService,
    pub project_service: ProjectService,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Notificações ---
        let sender = email::sender_from_config(config.smtp.clone())?;
        let (notifier, _worker) = Notifier::spawn(Arc::from(sender), config.notification_queue_capacity);

        // --- Repositórios ---
        let account_repo = AccountRepository::new(db_pool.clone());
        let service_repo = ServiceRepository::new(db_pool.clone());
        let provider_repo = ProviderRepository::new(db_pool.clone());
        let booking_repo = BookingRepository::new(db_pool.clone());
        let project_repo = ProjectRepository::new(db_pool.clone());
        let crm_repo = CrmRepository::new(db_pool.clone());

        // --- Serviços ---
        let auth_service = AuthService::new(
            account_repo.clone(),
            provider_repo.clone(),
            config.jwt_secret.clone(),
            db_pool.clone(),
        );
        let catalog_service = CatalogService::new(service_repo.clone());
        let provider_service =
            ProviderService::new(provider_repo.clone(), account_repo, service_repo.clone(), db_pool.clone());
        let booking_service = BookingService::new(
            booking_repo,
            provider_repo,
            service_repo,
            notifier,
            chrono::Duration::minutes(config.completion_otp_ttl_minutes),
            db_pool.clone(),
        );
        let project_service = ProjectService::new(project_repo, crm_repo);

        let i18n_store = Arc::new(I18nStore::new(config.is_development()));

        Ok(Self {
            db_pool,
            i18n_store,
            auth_service,
            catalog_service,
            provider_service,
            booking_service,
            project_service,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, "development")]
    #[case(Some("  "), "development")]
    #[case(Some("production"), "production")]
    #[case(Some(" staging "), "staging")]
    fn app_env_falls_back_to_development(#[case] raw: Option<&str>, #[case] expected: &str) {
        assert_eq!(app_env_or_default(raw.map(str::to_string)), expected);
    }
}
