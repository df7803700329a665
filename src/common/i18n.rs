// src/common/i18n.rs

use std::collections::HashMap;

// Idioma usado quando o Accept-Language não tem catálogo
const FALLBACK_LANG: &str = "en";

// (chave, inglês, português). "{}" recebe o argumento do erro.
const MESSAGES: &[(&str, &str, &str)] = &[
    ("validation_failed", "One or more fields are invalid.", "Um ou mais campos são inválidos."),
    ("invalid_input", "Invalid input: {}", "Entrada inválida: {}"),
    ("email_already_exists", "This e-mail is already in use.", "Este e-mail já está em uso."),
    ("invalid_credentials", "Invalid e-mail or password.", "E-mail ou senha inválidos."),
    ("invalid_token", "Missing or invalid authentication token.", "Token de autenticação inválido ou ausente."),
    ("account_inactive", "This account is not active.", "Esta conta não está ativa."),
    ("resource_not_found", "{} not found.", "{} não encontrado."),
    ("access_denied", "Access denied for service type {}.", "Acesso negado ao tipo de serviço {}."),
    ("missing_capability", "You need the '{}' permission for this action.", "Você precisa da permissão '{}' para realizar esta ação."),
    ("not_assigned_provider", "Only the assigned service provider can do this.", "Apenas o prestador atribuído pode executar esta ação."),
    ("invalid_status", "Unknown booking status '{}'.", "Status de reserva desconhecido '{}'."),
    ("invalid_transition", "Status change not allowed: {}.", "Mudança de status não permitida: {}."),
    ("provider_ineligible", "Provider is not eligible: {}.", "Prestador inelegível: {}."),
    ("no_otp_requested", "No OTP was requested for this booking.", "Nenhum OTP foi solicitado para esta reserva."),
    ("otp_expired", "The OTP has expired.", "O OTP expirou."),
    ("otp_already_verified", "The OTP was already verified.", "O OTP já foi verificado."),
    ("invalid_otp", "Invalid OTP.", "OTP inválido."),
    ("too_many_otp_attempts", "Too many wrong OTP attempts.", "Muitas tentativas erradas de OTP."),
    ("provider_already_linked", "This account or provider is already linked.", "Esta conta ou prestador já está vinculado."),
    ("wrong_booking_state", "The booking must be {} for this action.", "A reserva precisa estar em {} para esta ação."),
    ("invalid_rating", "Rating must be between 1 and 5.", "A avaliação deve estar entre 1 e 5."),
    ("already_rated", "This booking was already rated in that direction.", "Esta reserva já foi avaliada nessa direção."),
    ("unique_violation", "{} already exists.", "{} já existe."),
    ("internal_error", "An unexpected error occurred.", "Ocorreu um erro inesperado."),
    // Mensagens de validação de payload
    ("required", "Required field.", "Campo obrigatório."),
    ("invalid_email", "Invalid e-mail.", "E-mail inválido."),
    ("invalid_phone", "Invalid phone number.", "Telefone inválido."),
    ("password_too_short", "Password must have at least 6 characters.", "A senha deve ter no mínimo 6 caracteres."),
    ("negative_amount", "Amounts can't be negative.", "Valores não podem ser negativos."),
    ("advance_exceeds_total", "Advance paid can't exceed the total.", "O adiantamento não pode exceder o total."),
    ("invalid_otp_format", "OTP must have 6 digits.", "O OTP deve ter 6 dígitos."),
];

#[derive(Debug, Clone)]
pub struct I18nStore {
    catalogs: HashMap<&'static str, HashMap<&'static str, &'static str>>,
    expose_internal_errors: bool,
}

impl I18nStore {
    /// `expose_internal_errors` só deve ser `true` em desenvolvimento.
    pub fn new(expose_internal_errors: bool) -> Self {
        let mut en = HashMap::new();
        let mut pt = HashMap::new();
        for (key, en_msg, pt_msg) in MESSAGES {
            en.insert(*key, *en_msg);
            pt.insert(*key, *pt_msg);
        }

        let mut catalogs = HashMap::new();
        catalogs.insert("en", en);
        catalogs.insert("pt", pt);

        Self { catalogs, expose_internal_errors }
    }

    pub fn expose_internal_errors(&self) -> bool {
        self.expose_internal_errors
    }

    // Chave desconhecida volta como ela mesma (mensagens livres do validator)
    pub fn translate(&self, lang: &str, key: &str, arg: Option<&str>) -> String {
        let template = self
            .catalogs
            .get(lang)
            .or_else(|| self.catalogs.get(FALLBACK_LANG))
            .and_then(|catalog| catalog.get(key))
            .copied()
            .unwrap_or(key);

        match arg {
            Some(value) => template.replacen("{}", value, 1),
            None => template.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_with_argument_and_falls_back_to_english() {
        let store = I18nStore::new(false);
        assert_eq!(store.translate("pt", "resource_not_found", Some("Reserva")), "Reserva não encontrado.");
        assert_eq!(store.translate("fr", "invalid_otp", None), "Invalid OTP.");
    }

    #[test]
    fn unknown_keys_are_returned_verbatim() {
        let store = I18nStore::new(false);
        assert_eq!(store.translate("en", "some free text", None), "some free text");
    }
}
