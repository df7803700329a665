// src/handlers/providers.rs

use axum::{
    extract::{Path, Query, State},
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
        rbac::{CapAssignProviders, CapManageProviders, RequireCapability},
    },
    models::provider::{
        CreateProviderPayload, EligibleProvidersQuery, Provider, UpdateAvailabilityPayload, UpdateVerificationPayload,
    },
};

#[utoipa::path(
    post,
    path = "/api/providers",
    tag = "Providers",
    request_body = CreateProviderPayload,
    responses(
        (status = 201, description = "Prestador cadastrado (código SP-NNNNNN)", body = Provider),
        (status = 404, description = "Serviço ou conta inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_provider(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireCapability<CapManageProviders>,
    Json(payload): Json<CreateProviderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let provider = app_state
        .provider_service
        .create(&actor, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok("Prestador cadastrado", provider))))
}

#[utoipa::path(
    get,
    path = "/api/providers/eligible",
    tag = "Providers",
    params(EligibleProvidersQuery),
    responses(
        (status = 200, description = "Prestadores aptos, melhor avaliados primeiro", body = Vec<Provider>)
    ),
    security(("api_jwt" = []))
)]
pub async fn find_eligible_providers(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireCapability<CapAssignProviders>,
    Query(query): Query<EligibleProvidersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let providers = app_state
        .provider_service
        .find_eligible(&actor, query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::ok("Prestadores elegíveis", providers)))
}

#[utoipa::path(
    get,
    path = "/api/providers/{provider_id}",
    tag = "Providers",
    responses(
        (status = 200, description = "Detalhe do prestador", body = Provider),
        (status = 404, description = "Prestador não encontrado")
    ),
    params(
        ("provider_id" = Uuid, Path, description = "ID do prestador")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_provider(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(provider_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let provider = app_state
        .provider_service
        .get(&actor, provider_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::ok("Prestador encontrado", provider)))
}

// Sem guardião de capacidade: o próprio prestador também pode alterar
#[utoipa::path(
    put,
    path = "/api/providers/{provider_id}/availability",
    tag = "Providers",
    request_body = UpdateAvailabilityPayload,
    responses(
        (status = 200, description = "Disponibilidade atualizada", body = Provider)
    ),
    params(
        ("provider_id" = Uuid, Path, description = "ID do prestador")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_availability(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(provider_id): Path<Uuid>,
    Json(payload): Json<UpdateAvailabilityPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let provider = app_state
        .provider_service
        .update_availability(&actor, provider_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::ok("Disponibilidade atualizada", provider)))
}

#[utoipa::path(
    put,
    path = "/api/providers/{provider_id}/verification",
    tag = "Providers",
    request_body = UpdateVerificationPayload,
    responses(
        (status = 200, description = "Verificação atualizada", body = Provider)
    ),
    params(
        ("provider_id" = Uuid, Path, description = "ID do prestador")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_verification(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireCapability<CapManageProviders>,
    Path(provider_id): Path<Uuid>,
    Json(payload): Json<UpdateVerificationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let provider = app_state
        .provider_service
        .update_verification(&actor, provider_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::ok("Verificação atualizada", provider)))
}
