// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    services::access_control::{has_capability, Capability},
};

/// Capacidade exigida por uma rota, resolvida em tempo de compilação.
pub trait CapabilityDef: Send + Sync + 'static {
    const CAPABILITY: Capability;
}

/// Guardião: falha com 403 antes de o handler ler o corpo.
pub struct RequireCapability<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireCapability<T>
where
    T: CapabilityDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_parts(parts);

        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))?;

        if !has_capability(&user.0, T::CAPABILITY) {
            return Err(AppError::MissingCapability(T::CAPABILITY.slug()).to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequireCapability(PhantomData))
    }
}

// ---
// CAPACIDADES (TIPOS)
// ---

pub struct CapManageAccounts;
impl CapabilityDef for CapManageAccounts {
    const CAPABILITY: Capability = Capability::ManageAccounts;
}

pub struct CapManageServices;
impl CapabilityDef for CapManageServices {
    const CAPABILITY: Capability = Capability::ManageServices;
}

pub struct CapManageProviders;
impl CapabilityDef for CapManageProviders {
    const CAPABILITY: Capability = Capability::ManageProviders;
}

pub struct CapAssignProviders;
impl CapabilityDef for CapAssignProviders {
    const CAPABILITY: Capability = Capability::AssignProviders;
}

pub struct CapManageBookings;
impl CapabilityDef for CapManageBookings {
    const CAPABILITY: Capability = Capability::ManageBookings;
}

pub struct CapFulfilBookings;
impl CapabilityDef for CapFulfilBookings {
    const CAPABILITY: Capability = Capability::FulfilBookings;
}

pub struct CapManageProjects;
impl CapabilityDef for CapManageProjects {
    const CAPABILITY: Capability = Capability::ManageProjects;
}

pub struct CapManageLeads;
impl CapabilityDef for CapManageLeads {
    const CAPABILITY: Capability = Capability::ManageLeads;
}
