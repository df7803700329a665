// src/services/provider_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{provider_repo::normalized_days, AccountRepository, ProviderRepository, ServiceRepository},
    models::{
        account::Account,
        provider::{
            CreateProviderPayload, EligibleProvidersQuery, Provider, UpdateAvailabilityPayload,
            UpdateVerificationPayload,
        },
    },
    services::{
        access_control::{ensure_account_linkable, filter_for, has_capability, require_capability, Capability},
        provider_matching::{filter_by_date, EligibilityCriteria},
    },
};

#[derive(Clone)]
pub struct ProviderService {
    provider_repo: ProviderRepository,
    account_repo: AccountRepository,
    service_repo: ServiceRepository,
    pool: PgPool,
}

impl ProviderService {
    pub fn new(
        provider_repo: ProviderRepository,
        account_repo: AccountRepository,
        service_repo: ServiceRepository,
        pool: PgPool,
    ) -> Self {
        Self { provider_repo, account_repo, service_repo, pool }
    }

    pub async fn create(&self, actor: &Account, payload: &CreateProviderPayload) -> Result<Provider, AppError> {
        require_capability(actor, Capability::ManageProviders)?;

        // Cada serviço oferecido precisa existir e estar no escopo de quem cadastra
        for offered in &payload.services {
            let service = self
                .service_repo
                .find_by_id(self.service_repo.pool(), offered.service)
                .await?
                .ok_or_else(|| AppError::ResourceNotFound(format!("Serviço {}", offered.service)))?;
            filter_for(actor, Some(service.service_type))?;
        }

        let mut tx = self.pool.begin().await?;

        // Conta travada: dois cadastros simultâneos não vinculam a mesma conta
        if let Some(account_id) = payload.account_id {
            let account = self
                .account_repo
                .lock_for_update(&mut *tx, account_id)
                .await?
                .ok_or_else(|| AppError::ResourceNotFound("Conta".to_string()))?;
            ensure_account_linkable(&account)?;
        }

        let code = self.provider_repo.next_code(&mut *tx).await?;
        let provider = self.provider_repo.create(&mut *tx, &code, payload).await?;

        if let Some(account_id) = payload.account_id {
            self.account_repo.link_provider(&mut *tx, account_id, provider.id).await?;
        }

        tx.commit().await?;

        tracing::info!(provider_id = %provider.id, code = %provider.provider_code, "Prestador cadastrado");
        Ok(provider)
    }

    pub async fn get(&self, actor: &Account, id: Uuid) -> Result<Provider, AppError> {
        let is_self = actor.provider_id == Some(id);
        if !is_self && !has_capability(actor, Capability::AssignProviders) {
            require_capability(actor, Capability::ManageProviders)?;
        }

        self.provider_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Prestador".to_string()))
    }

    /// O próprio prestador ou um administrador de prestadores.
    pub async fn update_availability(
        &self,
        actor: &Account,
        id: Uuid,
        payload: UpdateAvailabilityPayload,
    ) -> Result<Provider, AppError> {
        if actor.provider_id != Some(id) {
            require_capability(actor, Capability::ManageProviders)?;
        }

        if let Some(ranges) = &payload.unavailable_dates {
            if ranges.iter().any(|r| r.from > r.to) {
                return Err(AppError::InvalidInput("unavailableDates: from > to".to_string()));
            }
        }

        let mut tx = self.pool.begin().await?;

        let mut provider = self
            .provider_repo
            .lock_for_update(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Prestador".to_string()))?;

        provider.availability_status = payload.status;
        if let Some(days) = payload.working_days {
            provider.working_days = normalized_days(&days);
        }
        if let Some(hours) = payload.working_hours {
            provider.working_hours.0 = hours;
        }
        if let Some(ranges) = payload.unavailable_dates {
            provider.unavailable_dates.0 = ranges;
        }

        self.provider_repo.save(&mut *tx, &mut provider).await?;
        tx.commit().await?;

        Ok(provider)
    }

    pub async fn update_verification(
        &self,
        actor: &Account,
        id: Uuid,
        payload: UpdateVerificationPayload,
    ) -> Result<Provider, AppError> {
        require_capability(actor, Capability::ManageProviders)?;

        let mut tx = self.pool.begin().await?;

        let mut provider = self
            .provider_repo
            .lock_for_update(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Prestador".to_string()))?;

        if let Some(documents) = payload.documents_verified {
            provider.documents_verified = documents;
        }
        if let Some(background) = payload.background_verified {
            provider.background_verified = background;
        }
        if let Some(status) = payload.status {
            provider.status = status;
        }

        self.provider_repo.save(&mut *tx, &mut provider).await?;
        tx.commit().await?;

        tracing::info!(provider_id = %id, status = %provider.status, "Verificação do prestador atualizada");
        Ok(provider)
    }

    /// Busca em duas fases: filtro e ordenação no banco, data em memória.
    pub async fn find_eligible(&self, actor: &Account, query: EligibleProvidersQuery) -> Result<Vec<Provider>, AppError> {
        require_capability(actor, Capability::AssignProviders)?;

        let criteria = EligibilityCriteria::from(query);
        let candidates = self.provider_repo.find_eligible(&criteria).await?;

        Ok(filter_by_date(candidates, criteria.date))
    }
}
