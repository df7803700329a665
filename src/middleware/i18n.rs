// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

const DEFAULT_LANG: &str = "en";

// Idioma da resposta, vindo do Accept-Language ("pt-BR" -> "pt")
#[derive(Debug, Clone)]
pub struct Locale(pub String);

impl Locale {
    pub fn from_parts(parts: &Parts) -> Self {
        let lang = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok())
            .and_then(|header_str| {
                accept_language::parse(header_str)
                    .first()
                    .map(|tag| tag.split('-').next().unwrap_or(tag).to_lowercase())
            })
            .unwrap_or_else(|| DEFAULT_LANG.to_string());

        Locale(lang)
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Locale::from_parts(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(lang: Option<&str>) -> Parts {
        let mut builder = Request::builder();
        if let Some(lang) = lang {
            builder = builder.header(header::ACCEPT_LANGUAGE, lang);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn picks_primary_subtag_of_preferred_language() {
        assert_eq!(Locale::from_parts(&parts_with(Some("pt-BR,en;q=0.8"))).0, "pt");
        assert_eq!(Locale::from_parts(&parts_with(Some("en-US"))).0, "en");
    }

    #[test]
    fn defaults_to_english() {
        assert_eq!(Locale::from_parts(&parts_with(None)).0, "en");
    }
}
