// src/handlers/projects.rs

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
        rbac::{CapManageLeads, CapManageProjects, RequireCapability},
        tenancy::VerticalContext,
    },
    models::project::{
        CreateLeadPayload, CreateProjectPayload, Lead, Project, UpdateLeadPayload, UpdateProjectPayload,
    },
};

// ---
// Projetos
// ---

#[utoipa::path(
    post,
    path = "/api/projects",
    tag = "Projects",
    request_body = CreateProjectPayload,
    responses(
        (status = 201, description = "Projeto criado", body = Project)
    ),
    params(
        ("x-service-type" = Option<String>, Header, description = "Vertical do projeto")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_project(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    VerticalContext(requested): VerticalContext,
    _guard: RequireCapability<CapManageProjects>,
    Json(payload): Json<CreateProjectPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let project = app_state
        .project_service
        .create_project(&actor, requested, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok("Projeto criado", project))))
}

#[utoipa::path(
    get,
    path = "/api/projects",
    tag = "Projects",
    responses(
        (status = 200, description = "Projetos das verticais visíveis", body = Vec<Project>)
    ),
    params(
        ("x-service-type" = Option<String>, Header, description = "Vertical a listar")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_projects(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    VerticalContext(requested): VerticalContext,
    _guard: RequireCapability<CapManageProjects>,
) -> Result<impl IntoResponse, ApiError> {
    let projects = app_state
        .project_service
        .list_projects(&actor, requested)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::ok("Projetos", projects)))
}

#[utoipa::path(
    get,
    path = "/api/projects/{project_id}",
    tag = "Projects",
    responses(
        (status = 200, description = "Detalhe do projeto", body = Project),
        (status = 404, description = "Projeto não encontrado")
    ),
    params(
        ("project_id" = Uuid, Path, description = "ID do projeto"),
        ("x-service-type" = Option<String>, Header, description = "Vertical de trabalho")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_project(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    VerticalContext(requested): VerticalContext,
    _guard: RequireCapability<CapManageProjects>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let project = app_state
        .project_service
        .get_project(&actor, requested, project_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::ok("Projeto encontrado", project)))
}

#[utoipa::path(
    put,
    path = "/api/projects/{project_id}",
    tag = "Projects",
    request_body = UpdateProjectPayload,
    responses(
        (status = 200, description = "Projeto atualizado", body = Project)
    ),
    params(
        ("project_id" = Uuid, Path, description = "ID do projeto"),
        ("x-service-type" = Option<String>, Header, description = "Vertical de trabalho")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_project(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    VerticalContext(requested): VerticalContext,
    _guard: RequireCapability<CapManageProjects>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<UpdateProjectPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let project = app_state
        .project_service
        .update_project(&actor, requested, project_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::ok("Projeto atualizado", project)))
}

// ---
// Leads
// ---

#[utoipa::path(
    post,
    path = "/api/leads",
    tag = "Leads",
    request_body = CreateLeadPayload,
    responses(
        (status = 201, description = "Lead registrado", body = Lead)
    ),
    params(
        ("x-service-type" = Option<String>, Header, description = "Vertical do lead")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    VerticalContext(requested): VerticalContext,
    _guard: RequireCapability<CapManageLeads>,
    Json(payload): Json<CreateLeadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let lead = app_state
        .project_service
        .create_lead(&actor, requested, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok("Lead registrado", lead))))
}

#[utoipa::path(
    get,
    path = "/api/leads",
    tag = "Leads",
    responses(
        (status = 200, description = "Leads das verticais visíveis", body = Vec<Lead>)
    ),
    params(
        ("x-service-type" = Option<String>, Header, description = "Vertical a listar")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_leads(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    VerticalContext(requested): VerticalContext,
    _guard: RequireCapability<CapManageLeads>,
) -> Result<impl IntoResponse, ApiError> {
    let leads = app_state
        .project_service
        .list_leads(&actor, requested)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::ok("Leads", leads)))
}

#[utoipa::path(
    get,
    path = "/api/leads/{lead_id}",
    tag = "Leads",
    responses(
        (status = 200, description = "Detalhe do lead", body = Lead),
        (status = 404, description = "Lead não encontrado")
    ),
    params(
        ("lead_id" = Uuid, Path, description = "ID do lead"),
        ("x-service-type" = Option<String>, Header, description = "Vertical de trabalho")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    VerticalContext(requested): VerticalContext,
    _guard: RequireCapability<CapManageLeads>,
    Path(lead_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let lead = app_state
        .project_service
        .get_lead(&actor, requested, lead_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::ok("Lead encontrado", lead)))
}

#[utoipa::path(
    put,
    path = "/api/leads/{lead_id}",
    tag = "Leads",
    request_body = UpdateLeadPayload,
    responses(
        (status = 200, description = "Lead atualizado", body = Lead)
    ),
    params(
        ("lead_id" = Uuid, Path, description = "ID do lead"),
        ("x-service-type" = Option<String>, Header, description = "Vertical de trabalho")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    VerticalContext(requested): VerticalContext,
    _guard: RequireCapability<CapManageLeads>,
    Path(lead_id): Path<Uuid>,
    Json(payload): Json<UpdateLeadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let lead = app_state
        .project_service
        .update_lead(&actor, requested, lead_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::ok("Lead atualizado", lead)))
}
