// src/handlers/bookings.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
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
        rbac::{CapAssignProviders, CapFulfilBookings, CapManageBookings, RequireCapability},
        tenancy::VerticalContext,
    },
    models::booking::{
        AssignProviderPayload, Booking, CreateBookingPayload, ListBookingsQuery, RateBookingPayload,
        ReschedulePayload, TrackBookingPayload, UpdateStatusPayload, VerifyOtpPayload,
    },
};

// =============================================================================
//  ROTAS PÚBLICAS (cliente sem login)
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/bookings/create",
    tag = "Bookings",
    request_body = CreateBookingPayload,
    responses(
        (status = 201, description = "Reserva criada; o OTP vai por e-mail", body = Booking),
        (status = 400, description = "Dados inválidos ou serviço inativo"),
        (status = 404, description = "Serviço não encontrado")
    )
)]
pub async fn create_booking(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<CreateBookingPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let booking = app_state
        .booking_service
        .create(payload, Utc::now())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok("Reserva criada", booking))))
}

#[utoipa::path(
    post,
    path = "/api/bookings/track",
    tag = "Bookings",
    request_body = TrackBookingPayload,
    responses(
        (status = 200, description = "Reserva encontrada", body = Booking),
        (status = 404, description = "Código ou telefone não conferem")
    )
)]
pub async fn track_booking(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<TrackBookingPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let booking = app_state
        .booking_service
        .track(&payload.booking_id, &payload.phone)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::ok("Reserva encontrada", booking)))
}

#[utoipa::path(
    post,
    path = "/api/bookings/{booking_id}/verify-otp",
    tag = "Bookings",
    request_body = VerifyOtpPayload,
    responses(
        (status = 200, description = "OTP da reserva confirmado", body = Booking),
        (status = 400, description = "OTP inválido, expirado ou já verificado")
    ),
    params(
        ("booking_id" = Uuid, Path, description = "ID da reserva")
    )
)]
pub async fn verify_booking_otp(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<VerifyOtpPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let booking = app_state
        .booking_service
        .verify_otp(booking_id, &payload.otp, Utc::now())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::ok("OTP verificado", booking)))
}

// =============================================================================
//  EQUIPE INTERNA
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/bookings",
    tag = "Bookings",
    responses(
        (status = 200, description = "Reservas das verticais visíveis, mais recentes primeiro", body = Vec<Booking>),
        (status = 403, description = "Vertical fora do escopo")
    ),
    params(
        ListBookingsQuery,
        ("x-service-type" = Option<String>, Header, description = "Vertical a listar")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_bookings(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    VerticalContext(requested): VerticalContext,
    _guard: RequireCapability<CapManageBookings>,
    Query(query): Query<ListBookingsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let bookings = app_state
        .booking_service
        .list(&actor, requested, query.status.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::ok("Reservas", bookings)))
}

#[utoipa::path(
    get,
    path = "/api/bookings/{booking_id}",
    tag = "Bookings",
    responses(
        (status = 200, description = "Detalhe da reserva", body = Booking),
        (status = 403, description = "Fora do escopo do chamador"),
        (status = 404, description = "Reserva não encontrada")
    ),
    params(
        ("booking_id" = Uuid, Path, description = "ID da reserva"),
        ("x-service-type" = Option<String>, Header, description = "Vertical de trabalho")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_booking(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    VerticalContext(requested): VerticalContext,
    Path(booking_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = app_state
        .booking_service
        .get(&actor, requested, booking_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::ok("Reserva encontrada", booking)))
}

// Staff e prestador atribuído usam a mesma rota; a autorização fica no serviço
#[utoipa::path(
    put,
    path = "/api/bookings/{booking_id}/status",
    tag = "Bookings",
    request_body = UpdateStatusPayload,
    responses(
        (status = 200, description = "Status alterado", body = Booking),
        (status = 400, description = "Status desconhecido ou transição inválida"),
        (status = 403, description = "Chamador não pode alterar esta reserva")
    ),
    params(
        ("booking_id" = Uuid, Path, description = "ID da reserva"),
        ("x-service-type" = Option<String>, Header, description = "Vertical de trabalho")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_booking_status(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    VerticalContext(requested): VerticalContext,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = app_state
        .booking_service
        .update_status(&actor, requested, booking_id, payload, Utc::now())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::ok("Status da reserva atualizado", booking)))
}

#[utoipa::path(
    put,
    path = "/api/bookings/{booking_id}/assign-provider",
    tag = "Bookings",
    request_body = AssignProviderPayload,
    responses(
        (status = 200, description = "Prestador atribuído; reserva confirmada", body = Booking),
        (status = 400, description = "Prestador inelegível ou estado inválido")
    ),
    params(
        ("booking_id" = Uuid, Path, description = "ID da reserva"),
        ("x-service-type" = Option<String>, Header, description = "Vertical de trabalho")
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_provider(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    VerticalContext(requested): VerticalContext,
    _guard: RequireCapability<CapAssignProviders>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<AssignProviderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = app_state
        .booking_service
        .assign_provider(&actor, requested, booking_id, payload.provider_id, Utc::now())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::ok("Prestador atribuído", booking)))
}

#[utoipa::path(
    put,
    path = "/api/bookings/{booking_id}/reschedule",
    tag = "Bookings",
    request_body = ReschedulePayload,
    responses(
        (status = 200, description = "Reserva reagendada", body = Booking)
    ),
    params(
        ("booking_id" = Uuid, Path, description = "ID da reserva"),
        ("x-service-type" = Option<String>, Header, description = "Vertical de trabalho")
    ),
    security(("api_jwt" = []))
)]
pub async fn reschedule_booking(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    VerticalContext(requested): VerticalContext,
    _guard: RequireCapability<CapManageBookings>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<ReschedulePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let booking = app_state
        .booking_service
        .reschedule(&actor, requested, booking_id, payload, Utc::now())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::ok("Reserva reagendada", booking)))
}

// Cliente ou prestador, conforme a direção
#[utoipa::path(
    post,
    path = "/api/bookings/{booking_id}/rating",
    tag = "Bookings",
    request_body = RateBookingPayload,
    responses(
        (status = 200, description = "Avaliação registrada", body = Booking),
        (status = 400, description = "Nota fora de 1..5, reserva não concluída ou já avaliada")
    ),
    params(
        ("booking_id" = Uuid, Path, description = "ID da reserva"),
        ("x-service-type" = Option<String>, Header, description = "Vertical de trabalho")
    ),
    security(("api_jwt" = []))
)]
pub async fn rate_booking(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    VerticalContext(requested): VerticalContext,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<RateBookingPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = app_state
        .booking_service
        .rate(&actor, requested, booking_id, payload, Utc::now())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::ok("Avaliação registrada", booking)))
}

// =============================================================================
//  PRESTADOR
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/bookings/mine",
    tag = "Bookings",
    responses(
        (status = 200, description = "Reservas atribuídas ao prestador autenticado", body = Vec<Booking>)
    ),
    params(ListBookingsQuery),
    security(("api_jwt" = []))
)]
pub async fn list_my_bookings(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireCapability<CapFulfilBookings>,
    Query(query): Query<ListBookingsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let bookings = app_state
        .booking_service
        .list_mine(&actor, query.status.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::ok("Minhas reservas", bookings)))
}

#[utoipa::path(
    post,
    path = "/api/bookings/{booking_id}/request-completion-otp",
    tag = "Bookings",
    responses(
        (status = 200, description = "OTP de conclusão enviado ao cliente"),
        (status = 400, description = "Reserva não está em work_completed"),
        (status = 403, description = "Prestador não atribuído")
    ),
    params(
        ("booking_id" = Uuid, Path, description = "ID da reserva")
    ),
    security(("api_jwt" = []))
)]
pub async fn request_completion_otp(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireCapability<CapFulfilBookings>,
    Path(booking_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .booking_service
        .request_completion_otp(&actor, booking_id, Utc::now())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::message("OTP de conclusão enviado ao cliente")))
}

#[utoipa::path(
    post,
    path = "/api/bookings/{booking_id}/verify-completion-otp",
    tag = "Bookings",
    request_body = VerifyOtpPayload,
    responses(
        (status = 200, description = "Serviço concluído", body = Booking),
        (status = 400, description = "OTP ausente, expirado, já usado ou incorreto")
    ),
    params(
        ("booking_id" = Uuid, Path, description = "ID da reserva")
    ),
    security(("api_jwt" = []))
)]
pub async fn verify_completion_otp(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequireCapability<CapFulfilBookings>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<VerifyOtpPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let booking = app_state
        .booking_service
        .verify_completion_otp(&actor, booking_id, &payload.otp, Utc::now())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ApiResponse::ok("Serviço concluído", booking)))
}
