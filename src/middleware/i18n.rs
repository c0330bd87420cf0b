// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::common::i18n::{DEFAULT_LANG, SUPPORTED_LANGS};

// Idioma do cliente, negociado pelo Accept-Language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(pub String);

impl Default for Locale {
    fn default() -> Self {
        Locale(DEFAULT_LANG.to_string())
    }
}

impl Locale {
    /// "pt-BR,pt;q=0.9,en;q=0.8" -> "pt". Sem idioma suportado, cai no padrão.
    pub fn negotiate(header_value: &str) -> Self {
        let tags = accept_language::parse(header_value);
        tags.iter()
            .map(|tag| tag.split('-').next().unwrap_or(tag).to_ascii_lowercase())
            .find(|lang| SUPPORTED_LANGS.contains(&lang.as_str()))
            .map(Locale)
            .unwrap_or_default()
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let locale = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok())
            .map(Locale::negotiate)
            .unwrap_or_default();

        Ok(locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_first_supported_language() {
        assert_eq!(Locale::negotiate("pt-BR,pt;q=0.9,en;q=0.8").0, "pt");
        assert_eq!(Locale::negotiate("fr-FR,en;q=0.5").0, "en");
        assert_eq!(Locale::negotiate("de").0, DEFAULT_LANG);
        assert_eq!(Locale::negotiate("").0, DEFAULT_LANG);
    }
}
