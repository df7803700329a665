// src/middleware/tenancy.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::account::Vertical,
};

// Cabeçalho com a vertical que o chamador quer enxergar
pub const SERVICE_TYPE_HEADER: &str = "x-service-type";

/// Vertical pedida explicitamente. Ausente = deixa o filtro de acesso decidir.
#[derive(Debug, Clone, Copy)]
pub struct VerticalContext(pub Option<Vertical>);

impl VerticalContext {
    pub fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(VerticalContext(None)),
            Some(value) => value
                .parse::<Vertical>()
                .map(|v| VerticalContext(Some(v)))
                .map_err(|v| AppError::InvalidInput(format!("{}: {}", SERVICE_TYPE_HEADER, v))),
        }
    }
}

impl<S> FromRequestParts<S> for VerticalContext
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let raw = match parts.headers.get(SERVICE_TYPE_HEADER) {
            Some(value) => Some(value.to_str().map_err(|_| {
                AppError::InvalidInput(SERVICE_TYPE_HEADER.to_string())
            })),
            None => None,
        };

        raw.transpose()
            .and_then(VerticalContext::parse)
            .map_err(|e| {
                let app_state = AppState::from_ref(state);
                e.to_api_error(&Locale::from_parts(parts), &app_state.i18n_store)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_verticals_and_ignores_blank() {
        assert_eq!(VerticalContext::parse(Some("on_demand")).unwrap().0, Some(Vertical::OnDemand));
        assert_eq!(VerticalContext::parse(Some("  ")).unwrap().0, None);
        assert_eq!(VerticalContext::parse(None).unwrap().0, None);
    }

    #[test]
    fn unknown_vertical_is_rejected() {
        assert!(matches!(VerticalContext::parse(Some("plumbing")), Err(AppError::InvalidInput(_))));
    }
}
