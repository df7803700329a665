// src/db.rs

pub mod account_repo;
pub use account_repo::AccountRepository;
pub mod booking_repo;
pub use booking_repo::BookingRepository;
pub mod crm_repo;
pub use crm_repo::CrmRepository;
pub mod project_repo;
pub use project_repo::ProjectRepository;
pub mod provider_repo;
pub use provider_repo::ProviderRepository;
pub mod service_repo;
pub use service_repo::ServiceRepository;
