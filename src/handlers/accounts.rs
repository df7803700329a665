// src/handlers/accounts.rs

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
        rbac::{CapManageAccounts, RequireCapability},
    },
    models::account::{Account, ProvisionAccountPayload, UpdateAccountStatusPayload},
};

#[utoipa::path(
    post,
    path = "/api/accounts",
    tag = "Accounts",
    request_body = ProvisionAccountPayload,
    responses(
        (status = 201, description = "Conta interna provisionada", body = Account),
        (status = 403, description = "Sem permissão ou vertical fora do escopo"),
        (status = 409, description = "E-mail já em uso")
    ),
    security(("api_jwt" = []))
)]
pub async fn provision_account(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireCapability<CapManageAccounts>,
    Json(payload): Json<ProvisionAccountPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let account = app_state
        .auth_service
        .provision(&actor, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok("Conta provisionada", account))))
}

#[utoipa::path(
    put,
    path = "/api/accounts/{account_id}/status",
    tag = "Accounts",
    request_body = UpdateAccountStatusPayload,
    responses(
        (status = 200, description = "Status atualizado", body = Account),
        (status = 404, description = "Conta não encontrada")
    ),
    params(
        ("account_id" = Uuid, Path, description = "ID da conta")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_account_status(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireCapability<CapManageAccounts>,
    Path(account_id): Path<Uuid>,
    Json(payload): Json<UpdateAccountStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let account = app_state
        .auth_service
        .update_status(&actor, account_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::ok("Status da conta atualizado", account)))
}
