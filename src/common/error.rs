// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

// Erro de domínio/infra. Os handlers nunca devolvem AppError direto:
// convertem com `to_api_error` para ganhar status + mensagem traduzida.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Entrada inválida: {0}")]
    InvalidInput(String),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Conta inativa ou suspensa")]
    AccountInactive,

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    // Escopo de vertical (service type) negado. Nunca vira lista vazia.
    #[error("Acesso negado: {0}")]
    AccessDenied(String),

    #[error("Permissão ausente: {0}")]
    MissingCapability(&'static str),

    #[error("Apenas o prestador atribuído pode executar esta ação")]
    NotAssignedProvider,

    #[error("Status desconhecido: {0}")]
    InvalidStatus(String),

    #[error("Transição inválida de {from} para {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Prestador inelegível: {0}")]
    ProviderIneligible(String),

    #[error("Nenhum OTP foi solicitado")]
    NoOtpRequested,

    #[error("OTP expirado")]
    OtpExpired,

    #[error("OTP já verificado")]
    OtpAlreadyVerified,

    #[error("OTP inválido")]
    InvalidOtp,

    // Código bloqueado após tentativas erradas demais
    #[error("Tentativas de OTP esgotadas")]
    TooManyOtpAttempts,

    // Conta e prestador se vinculam 1:1
    #[error("Conta ou prestador já vinculado")]
    ProviderAlreadyLinked,

    #[error("A reserva precisa estar em {0}")]
    WrongBookingState(String),

    #[error("Avaliação fora do intervalo 1..=5")]
    InvalidRating,

    #[error("Avaliação já registrada")]
    AlreadyRated,

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidInput(_)
            | AppError::InvalidStatus(_)
            | AppError::InvalidTransition { .. }
            | AppError::ProviderIneligible(_)
            | AppError::NoOtpRequested
            | AppError::OtpExpired
            | AppError::OtpAlreadyVerified
            | AppError::InvalidOtp
            | AppError::WrongBookingState(_)
            | AppError::InvalidRating
            | AppError::AlreadyRated => StatusCode::BAD_REQUEST,
            AppError::EmailAlreadyExists
            | AppError::UniqueConstraintViolation(_)
            | AppError::ProviderAlreadyLinked => StatusCode::CONFLICT,
            AppError::TooManyOtpAttempts => StatusCode::TOO_MANY_REQUESTS,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::AccountInactive
            | AppError::AccessDenied(_)
            | AppError::MissingCapability(_)
            | AppError::NotAssignedProvider => StatusCode::FORBIDDEN,
            AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Chave usada no catálogo de mensagens (i18n).
    pub fn message_key(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation_failed",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::EmailAlreadyExists => "email_already_exists",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::InvalidToken => "invalid_token",
            AppError::AccountInactive => "account_inactive",
            AppError::ResourceNotFound(_) => "resource_not_found",
            AppError::AccessDenied(_) => "access_denied",
            AppError::MissingCapability(_) => "missing_capability",
            AppError::NotAssignedProvider => "not_assigned_provider",
            AppError::InvalidStatus(_) => "invalid_status",
            AppError::InvalidTransition { .. } => "invalid_transition",
            AppError::ProviderIneligible(_) => "provider_ineligible",
            AppError::NoOtpRequested => "no_otp_requested",
            AppError::OtpExpired => "otp_expired",
            AppError::OtpAlreadyVerified => "otp_already_verified",
            AppError::InvalidOtp => "invalid_otp",
            AppError::TooManyOtpAttempts => "too_many_otp_attempts",
            AppError::ProviderAlreadyLinked => "provider_already_linked",
            AppError::WrongBookingState(_) => "wrong_booking_state",
            AppError::InvalidRating => "invalid_rating",
            AppError::AlreadyRated => "already_rated",
            AppError::UniqueConstraintViolation(_) => "unique_violation",
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => "internal_error",
        }
    }

    // Parâmetro que completa a mensagem traduzida ("{}" no catálogo)
    fn message_arg(&self) -> Option<String> {
        match self {
            AppError::InvalidInput(s)
            | AppError::ResourceNotFound(s)
            | AppError::AccessDenied(s)
            | AppError::InvalidStatus(s)
            | AppError::ProviderIneligible(s)
            | AppError::WrongBookingState(s)
            | AppError::UniqueConstraintViolation(s) => Some(s.clone()),
            AppError::MissingCapability(c) => Some((*c).to_string()),
            AppError::InvalidTransition { from, to } => Some(format!("{} -> {}", from, to)),
            _ => None,
        }
    }

    pub fn to_api_error(&self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let status = self.status();
        let message = i18n.translate(&locale.0, self.message_key(), self.message_arg().as_deref());

        let details = match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                collect_validation_details(errors, "", &locale.0, i18n, &mut details);
                Some(Value::Object(details))
            }
            e if status.is_server_error() => {
                tracing::error!(error = %e, "Erro interno do servidor");
                // Em produção o texto do erro não sai do processo
                i18n.expose_internal_errors().then(|| json!({ "cause": e.to_string() }))
            }
            _ => None,
        };

        ApiError { status, message, details }
    }
}

// Achata erros aninhados (payload.customer.email) num único mapa campo -> mensagens
fn collect_validation_details(
    errors: &validator::ValidationErrors,
    prefix: &str,
    lang: &str,
    i18n: &I18nStore,
    out: &mut serde_json::Map<String, Value>,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() { field.to_string() } else { format!("{}.{}", prefix, field) };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages: Vec<Value> = field_errors
                    .iter()
                    .map(|e| {
                        let key = e.message.as_ref().map(|m| m.to_string()).unwrap_or_else(|| e.code.to_string());
                        Value::String(i18n.translate(lang, &key, None))
                    })
                    .collect();
                out.insert(path, Value::Array(messages));
            }
            ValidationErrorsKind::Struct(nested) => {
                collect_validation_details(nested, &path, lang, i18n, out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_validation_details(nested, &format!("{}[{}]", path, index), lang, i18n, out);
                }
            }
        }
    }
}

// Rejeição HTTP padronizada: { success: false, message, details? }
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "success": false,
            "message": self.message,
        });
        if let Some(details) = self.details {
            body["details"] = details;
        }
        (self.status, Json(body)).into_response()
    }
}

// Conversão de violação de unicidade do Postgres para um erro amigável
pub(crate) fn map_unique_violation(e: sqlx::Error, what: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            if is_link_constraint(db_err.constraint()) {
                return AppError::ProviderAlreadyLinked;
            }
            return AppError::UniqueConstraintViolation(what.to_string());
        }
    }
    e.into()
}

// Índices únicos que garantem o vínculo 1:1 conta <-> prestador
const LINK_CONSTRAINTS: [&str; 2] = ["accounts_provider_id_key", "providers_account_id_key"];

pub(crate) fn is_link_constraint(constraint: Option<&str>) -> bool {
    constraint.is_some_and(|name| LINK_CONSTRAINTS.contains(&name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn en() -> Locale {
        Locale("en".to_string())
    }

    #[test]
    fn domain_rule_violations_are_bad_request() {
        for err in [
            AppError::OtpExpired,
            AppError::InvalidOtp,
            AppError::NoOtpRequested,
            AppError::OtpAlreadyVerified,
            AppError::ProviderIneligible("x".into()),
            AppError::InvalidStatus("flying".into()),
        ] {
            assert_eq!(err.status(), StatusCode::BAD_REQUEST, "{err}");
        }
    }

    #[test]
    fn only_link_indexes_count_as_link_conflicts() {
        assert!(is_link_constraint(Some("accounts_provider_id_key")));
        assert!(is_link_constraint(Some("providers_account_id_key")));
        assert!(!is_link_constraint(Some("accounts_email_key")));
        assert!(!is_link_constraint(None));
    }

    #[test]
    fn link_conflicts_and_locked_otp_have_their_own_status() {
        assert_eq!(AppError::ProviderAlreadyLinked.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::TooManyOtpAttempts.status(), StatusCode::TOO_MANY_REQUESTS);

        let api = AppError::TooManyOtpAttempts.to_api_error(&Locale("pt".to_string()), &I18nStore::new(false));
        assert!(api.message.contains("tentativas"));
    }

    #[test]
    fn access_denied_is_forbidden_not_empty_result() {
        let err = AppError::AccessDenied("interior".into());
        let api = err.to_api_error(&en(), &I18nStore::new(false));
        assert_eq!(api.status, StatusCode::FORBIDDEN);
        assert!(api.message.contains("interior"));
    }

    #[test]
    fn internal_errors_hide_cause_in_production() {
        let err = AppError::InternalServerError(anyhow::anyhow!("pool exhausted"));
        let prod = err.to_api_error(&en(), &I18nStore::new(false));
        assert_eq!(prod.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(prod.details.is_none());
        assert!(!prod.message.contains("pool exhausted"));

        let dev = err.to_api_error(&en(), &I18nStore::new(true));
        assert!(dev.details.unwrap()["cause"].as_str().unwrap().contains("pool exhausted"));
    }
}
