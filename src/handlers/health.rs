// src/handlers/health.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{common::response::ApiResponse, config::AppState};

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses(
        (status = 200, description = "API e banco de dados respondendo"),
        (status = 503, description = "Banco de dados indisponível")
    )
)]
pub async fn health_check(State(app_state): State<AppState>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").execute(&app_state.db_pool).await {
        Ok(_) => (StatusCode::OK, Json(ApiResponse::message("OK"))),
        Err(e) => {
            tracing::error!(error = %e, "Health check: banco de dados indisponível");
            (StatusCode::SERVICE_UNAVAILABLE, Json(ApiResponse::message("database unavailable")))
        }
    }
}
