// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

// As respostas reais vêm no envelope { success, message, data }; os schemas descrevem `data`
#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Health ---
        handlers::health::health_check,

        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_me,

        // --- Accounts ---
        handlers::accounts::provision_account,
        handlers::accounts::update_account_status,

        // --- Services ---
        handlers::services::list_services,
        handlers::services::get_service,
        handlers::services::create_service,

        // --- Providers ---
        handlers::providers::create_provider,
        handlers::providers::find_eligible_providers,
        handlers::providers::get_provider,
        handlers::providers::update_availability,
        handlers::providers::update_verification,

        // --- Bookings ---
        handlers::bookings::create_booking,
        handlers::bookings::track_booking,
        handlers::bookings::verify_booking_otp,
        handlers::bookings::list_bookings,
        handlers::bookings::list_my_bookings,
        handlers::bookings::get_booking,
        handlers::bookings::update_booking_status,
        handlers::bookings::assign_provider,
        handlers::bookings::reschedule_booking,
        handlers::bookings::request_completion_otp,
        handlers::bookings::verify_completion_otp,
        handlers::bookings::rate_booking,

        // --- Projects / Leads ---
        handlers::projects::create_project,
        handlers::projects::list_projects,
        handlers::projects::get_project,
        handlers::projects::update_project,
        handlers::projects::create_lead,
        handlers::projects::list_leads,
        handlers::projects::get_lead,
        handlers::projects::update_lead,
    ),
    components(
        schemas(
            // --- Accounts ---
            models::account::Vertical,
            models::account::Role,
            models::account::AccountStatus,
            models::account::Account,
            models::account::RegisterPayload,
            models::account::LoginPayload,
            models::account::ProvisionAccountPayload,
            models::account::UpdateAccountStatusPayload,
            models::account::AuthResponse,

            // --- Services ---
            models::service::ServiceDefinition,
            models::service::CreateServicePayload,

            // --- Providers ---
            models::provider::ProviderStatus,
            models::provider::AvailabilityStatus,
            models::provider::OfferedService,
            models::provider::ProviderAddress,
            models::provider::WorkingHours,
            models::provider::UnavailableRange,
            models::provider::ProviderReview,
            models::provider::Earnings,
            models::provider::Provider,
            models::provider::CreateProviderPayload,
            models::provider::UpdateAvailabilityPayload,
            models::provider::UpdateVerificationPayload,

            // --- Bookings ---
            models::booking::BookingStatus,
            models::booking::CancelledBy,
            models::booking::PaymentMethod,
            models::booking::PaymentStatus,
            models::booking::Priority,
            models::booking::RatingDirection,
            models::booking::CustomerSnapshot,
            models::booking::GeoPoint,
            models::booking::ServiceAddress,
            models::booking::TimeSlot,
            models::booking::ServiceDetails,
            models::booking::Pricing,
            models::booking::Payment,
            models::booking::StatusHistoryEntry,
            models::booking::Cancellation,
            models::booking::RatingEntry,
            models::booking::Ratings,
            models::booking::Booking,
            models::booking::CreateBookingPayload,
            models::booking::PaymentInput,
            models::booking::VerifyOtpPayload,
            models::booking::UpdateStatusPayload,
            models::booking::AssignProviderPayload,
            models::booking::ReschedulePayload,
            models::booking::TrackBookingPayload,
            models::booking::RateBookingPayload,

            // --- Projects / Leads ---
            models::project::ProjectStatus,
            models::project::LeadStatus,
            models::project::Project,
            models::project::Lead,
            models::project::CreateProjectPayload,
            models::project::UpdateProjectPayload,
            models::project::CreateLeadPayload,
            models::project::UpdateLeadPayload,
        )
    ),
    tags(
        (name = "Health", description = "Estado da API"),
        (name = "Auth", description = "Autenticação e Registro de clientes"),
        (name = "Accounts", description = "Provisionamento de contas internas"),
        (name = "Services", description = "Catálogo de serviços por vertical"),
        (name = "Providers", description = "Prestadores de serviço e busca por elegibilidade"),
        (name = "Bookings", description = "Reservas: criação, ciclo de vida, OTP e avaliações"),
        (name = "Projects", description = "Projetos de design e reforma"),
        (name = "Leads", description = "Leads comerciais (CRM)")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented_with_bearer_scheme() {
        let doc = ApiDoc::openapi();

        for path in ["/api/bookings/{booking_id}/verify-completion-otp", "/api/providers/eligible", "/api/leads/{lead_id}"] {
            assert!(doc.paths.paths.contains_key(path), "faltando {path}");
        }

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
    }
}
