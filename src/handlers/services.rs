// src/handlers/services.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        response::ApiResponse,
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{CapManageServices, RequireCapability},
        tenancy::VerticalContext,
    },
    models::service::{CreateServicePayload, ServiceDefinition},
};

#[utoipa::path(
    get,
    path = "/api/services",
    tag = "Services",
    responses(
        (status = 200, description = "Serviços ativos do catálogo", body = Vec<ServiceDefinition>)
    ),
    params(
        ("x-service-type" = Option<String>, Header, description = "Restringe o catálogo a uma vertical")
    )
)]
pub async fn list_services(
    State(app_state): State<AppState>,
    locale: Locale,
    VerticalContext(requested): VerticalContext,
) -> Result<impl IntoResponse, ApiError> {
    let services = app_state
        .catalog_service
        .list_active(requested)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::ok("Catálogo de serviços", services)))
}

#[utoipa::path(
    get,
    path = "/api/services/{service_id}",
    tag = "Services",
    responses(
        (status = 200, description = "Detalhe do serviço", body = ServiceDefinition),
        (status = 404, description = "Serviço não encontrado")
    ),
    params(
        ("service_id" = Uuid, Path, description = "ID do serviço")
    )
)]
pub async fn get_service(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(service_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let service = app_state
        .catalog_service
        .get(service_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::ok("Serviço encontrado", service)))
}

#[utoipa::path(
    post,
    path = "/api/services",
    tag = "Services",
    request_body = CreateServicePayload,
    responses(
        (status = 201, description = "Serviço criado", body = ServiceDefinition),
        (status = 409, description = "Já existe um serviço com esse nome na vertical")
    ),
    params(
        ("x-service-type" = Option<String>, Header, description = "Vertical de trabalho")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_service(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    VerticalContext(requested): VerticalContext,
    _guard: RequireCapability<CapManageServices>,
    Json(payload): Json<CreateServicePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let service = app_state
        .catalog_service
        .create(&actor, requested, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok("Serviço criado", service))))
}
