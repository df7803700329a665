// src/services/catalog_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ServiceRepository,
    models::{
        account::{Account, Vertical},
        service::{CreateServicePayload, ServiceDefinition},
    },
    services::access_control::{filter_for, require_capability, Capability, VerticalFilter},
};

#[derive(Clone)]
pub struct CatalogService {
    service_repo: ServiceRepository,
}

impl CatalogService {
    pub fn new(service_repo: ServiceRepository) -> Self {
        Self { service_repo }
    }

    pub async fn create(
        &self,
        actor: &Account,
        requested: Option<Vertical>,
        payload: &CreateServicePayload,
    ) -> Result<ServiceDefinition, AppError> {
        require_capability(actor, Capability::ManageServices)?;
        if payload.base_price.is_sign_negative() {
            return Err(AppError::InvalidInput("basePrice".to_string()));
        }

        let filter = filter_for(actor, requested)?;
        if !filter.allows(payload.service_type) {
            return Err(AppError::AccessDenied(payload.service_type.to_string()));
        }

        let service = self.service_repo.create(payload).await?;
        tracing::info!(service_id = %service.id, service_type = %service.service_type, "Serviço criado");
        Ok(service)
    }

    /// Catálogo público; o cabeçalho de vertical só estreita a lista.
    pub async fn list_active(&self, requested: Option<Vertical>) -> Result<Vec<ServiceDefinition>, AppError> {
        let filter = match requested {
            Some(v) => VerticalFilter::Only(vec![v]),
            None => VerticalFilter::All,
        };
        self.service_repo.list_active(&filter).await
    }

    pub async fn get(&self, id: Uuid) -> Result<ServiceDefinition, AppError> {
        self.service_repo
            .find_by_id(self.service_repo.pool(), id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Serviço".to_string()))
    }
}
