//src/main.rs

use anyhow::Context;
use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod email;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppConfig, AppState};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("homeserve_backend=info,tower_http=info")),
        )
        .with_target(true)
        .compact()
        .init();

    let config = AppConfig::from_env()?;
    let bind_addr = config.bind_addr.clone();
    let cors = cors_layer(&config);

    let app_state = AppState::new(config).await?;

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados.")?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Rotas públicas: cadastro/login, catálogo e reserva sem login
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/services", get(handlers::services::list_services))
        .route("/services/{service_id}", get(handlers::services::get_service))
        .route("/bookings/create", post(handlers::bookings::create_booking))
        .route("/bookings/track", post(handlers::bookings::track_booking))
        .route("/bookings/{booking_id}/verify-otp", post(handlers::bookings::verify_booking_otp));

    // Rotas protegidas pelo Bearer token
    let protected_routes = Router::new()
        .route("/auth/me", get(handlers::auth::get_me))
        // Contas internas
        .route("/accounts", post(handlers::accounts::provision_account))
        .route("/accounts/{account_id}/status", put(handlers::accounts::update_account_status))
        // Catálogo
        .route("/services", post(handlers::services::create_service))
        // Prestadores
        .route("/providers", post(handlers::providers::create_provider))
        .route("/providers/eligible", get(handlers::providers::find_eligible_providers))
        .route("/providers/{provider_id}", get(handlers::providers::get_provider))
        .route("/providers/{provider_id}/availability", put(handlers::providers::update_availability))
        .route("/providers/{provider_id}/verification", put(handlers::providers::update_verification))
        // Reservas
        .route("/bookings", get(handlers::bookings::list_bookings))
        .route("/bookings/mine", get(handlers::bookings::list_my_bookings))
        .route("/bookings/{booking_id}", get(handlers::bookings::get_booking))
        .route("/bookings/{booking_id}/status", put(handlers::bookings::update_booking_status))
        .route("/bookings/{booking_id}/assign-provider", put(handlers::bookings::assign_provider))
        .route("/bookings/{booking_id}/reschedule", put(handlers::bookings::reschedule_booking))
        .route(
            "/bookings/{booking_id}/request-completion-otp",
            post(handlers::bookings::request_completion_otp),
        )
        .route(
            "/bookings/{booking_id}/verify-completion-otp",
            post(handlers::bookings::verify_completion_otp),
        )
        .route("/bookings/{booking_id}/rating", post(handlers::bookings::rate_booking))
        // Projetos e leads
        .route(
            "/projects",
            post(handlers::projects::create_project).get(handlers::projects::list_projects),
        )
        .route(
            "/projects/{project_id}",
            get(handlers::projects::get_project).put(handlers::projects::update_project),
        )
        .route(
            "/leads",
            post(handlers::projects::create_lead).get(handlers::projects::list_leads),
        )
        .route(
            "/leads/{lead_id}",
            get(handlers::projects::get_lead).put(handlers::projects::update_lead),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", public_routes.merge(protected_routes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {}", bind_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Erro no servidor Axum")?;

    Ok(())
}

// Lista vazia em desenvolvimento libera qualquer origem
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.cors_allowed_origins.is_empty() && config.is_development() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(config.cors_allowed_origins.clone()))
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Falha ao escutar o sinal de desligamento");
        std::future::pending::<()>().await;
    }
    tracing::info!("Sinal recebido, encerrando o servidor...");
}
