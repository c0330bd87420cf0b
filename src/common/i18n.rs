// src/common/i18n.rs

use std::collections::HashMap;

pub const DEFAULT_LANG: &str = "en";
pub const SUPPORTED_LANGS: &[&str] = &["en", "pt"];

// Catálogos embutidos no binário (não dependem do diretório de execução)
const CATALOGS: &[(&str, &str)] = &[
    ("en", include_str!("../../locales/en.json")),
    ("pt", include_str!("../../locales/pt.json")),
];

/// Catálogo de mensagens por idioma. As chaves são as mesmas em todos os arquivos
/// `locales/*.json`; placeholders usam o formato `{nome}`.
#[derive(Debug, Clone)]
pub struct I18nStore {
    catalogs: HashMap<String, HashMap<String, String>>,
}

impl I18nStore {
    pub fn load() -> anyhow::Result<Self> {
        let mut catalogs = HashMap::new();
        for (lang, raw) in CATALOGS {
            let messages: HashMap<String, String> = serde_json::from_str(raw)
                .map_err(|e| anyhow::anyhow!("Catálogo '{}' inválido: {}", lang, e))?;
            catalogs.insert(lang.to_string(), messages);
        }
        Ok(Self { catalogs })
    }

    /// Busca a mensagem no idioma pedido, cai para inglês e, por último, para a própria chave.
    pub fn translate(&self, lang: &str, key: &str, args: &[(&str, String)]) -> String {
        let template = self
            .catalogs
            .get(lang)
            .and_then(|c| c.get(key))
            .or_else(|| self.catalogs.get(DEFAULT_LANG).and_then(|c| c.get(key)));

        let Some(template) = template else {
            return key.to_string();
        };

        args.iter().fold(template.clone(), |msg, (name, value)| {
            msg.replace(&format!("{{{}}}", name), value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogs_share_the_same_keys() {
        let store = I18nStore::load().unwrap();
        let en = &store.catalogs["en"];
        let pt = &store.catalogs["pt"];
        let mut missing: Vec<_> = en.keys().filter(|k| !pt.contains_key(*k)).collect();
        missing.extend(pt.keys().filter(|k| !en.contains_key(*k)));
        assert!(missing.is_empty(), "chaves sem tradução: {:?}", missing);
    }

    #[test]
    fn fills_placeholders() {
        let store = I18nStore::load().unwrap();
        let msg = store.translate(
            "en",
            "insufficient_stock",
            &[("available", "7".into()), ("requested", "8".into())],
        );
        assert_eq!(msg, "Insufficient quantity. Available: 7, Requested: 8");
    }

    #[test]
    fn falls_back_to_english_then_to_key() {
        let store = I18nStore::load().unwrap();
        assert_eq!(store.translate("de", "user_not_found", &[]), "User not found.");
        assert_eq!(store.translate("pt", "no_such_key", &[]), "no_such_key");
        assert!(SUPPORTED_LANGS.iter().all(|lang| store.catalogs.contains_key(*lang)));
    }
}
