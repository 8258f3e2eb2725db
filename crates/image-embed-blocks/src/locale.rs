//! Localized block text.
//!
//! The host decides how messages are rendered by handing a
//! [`MessageFormatter`] to the facade at construction.

use std::collections::HashMap;

/// A translatable message: lookup id plus the English default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message {
    pub id: &'static str,
    pub default: &'static str,
}

impl Message {
    pub const fn new(id: &'static str, default: &'static str) -> Self {
        Self { id, default }
    }
}

/// Renders messages for the current locale.
pub trait MessageFormatter: Send + Sync {
    fn format(&self, message: &Message) -> String;

    fn locale(&self) -> &str {
        "en"
    }
}

/// Always renders the default text.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFormatter;

impl MessageFormatter for DefaultFormatter {
    fn format(&self, message: &Message) -> String {
        message.default.to_string()
    }
}

const TRANSLATIONS: &str = include_str!("translations.json");

/// Renders messages from the bundled translation table.
#[derive(Debug, Clone)]
pub struct LocaleFormatter {
    locale: String,
    table: HashMap<String, String>,
}

impl LocaleFormatter {
    /// Formatter for `locale`. Tries the exact tag, then its language part
    /// (`ja-JP` -> `ja`); unknown locales render default text.
    pub fn new(locale: &str) -> Self {
        let mut all: HashMap<String, HashMap<String, String>> =
            serde_json::from_str(TRANSLATIONS).unwrap_or_else(|e| {
                tracing::warn!("Bundled translations are unreadable: {e}");
                HashMap::new()
            });

        let language = locale.split(['-', '_']).next().unwrap_or(locale);
        let table = all
            .remove(locale)
            .or_else(|| all.remove(language))
            .unwrap_or_default();

        if table.is_empty() && language != "en" {
            tracing::debug!("No translations for locale {locale}; using defaults");
        }

        Self {
            locale: locale.to_string(),
            table,
        }
    }

    /// Locales with a bundled translation table.
    pub fn available_locales() -> Vec<String> {
        let all: HashMap<String, serde_json::Value> =
            serde_json::from_str(TRANSLATIONS).unwrap_or_default();
        let mut locales: Vec<String> = all.into_keys().collect();
        locales.push("en".to_string());
        locales.sort();
        locales
    }

    /// Whether `locale` (or its language part) has a bundled table.
    pub fn is_supported(locale: &str) -> bool {
        let language = locale.split(['-', '_']).next().unwrap_or(locale);
        Self::available_locales()
            .iter()
            .any(|l| l == locale || l == language)
    }
}

/// The bundled translations as `locale -> message id -> text`.
pub fn translation_map() -> serde_json::Value {
    serde_json::from_str(TRANSLATIONS).unwrap_or_else(|e| {
        tracing::warn!("Bundled translations are unreadable: {e}");
        serde_json::Value::Object(serde_json::Map::new())
    })
}

impl MessageFormatter for LocaleFormatter {
    fn format(&self, message: &Message) -> String {
        self.table
            .get(message.id)
            .cloned()
            .unwrap_or_else(|| message.default.to_string())
    }

    fn locale(&self) -> &str {
        &self.locale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAME: Message = Message::new("mpImageEmbed.name", "Image Embedding");
    const UNKNOWN: Message = Message::new("mpImageEmbed.nope", "Fallback");

    #[test]
    fn test_default_formatter() {
        assert_eq!(DefaultFormatter.format(&NAME), "Image Embedding");
        assert_eq!(DefaultFormatter.locale(), "en");
    }

    #[test]
    fn test_locale_formatter_japanese() {
        let fmt = LocaleFormatter::new("ja");
        assert_eq!(fmt.format(&NAME), "画像埋め込み");
        assert_eq!(fmt.format(&UNKNOWN), "Fallback");
    }

    #[test]
    fn test_locale_formatter_region_falls_back_to_language() {
        let fmt = LocaleFormatter::new("ja-JP");
        assert_eq!(fmt.format(&NAME), "画像埋め込み");
        assert_eq!(fmt.locale(), "ja-JP");
    }

    #[test]
    fn test_locale_formatter_hiragana_is_distinct() {
        let fmt = LocaleFormatter::new("ja-Hira");
        assert_eq!(fmt.format(&NAME), "がぞううめこみ");
    }

    #[test]
    fn test_unknown_locale_uses_defaults() {
        let fmt = LocaleFormatter::new("fr");
        assert_eq!(fmt.format(&NAME), "Image Embedding");
    }

    #[test]
    fn test_available_locales() {
        assert_eq!(LocaleFormatter::available_locales(), vec!["en", "ja", "ja-Hira"]);
    }

    #[test]
    fn test_supported_locales() {
        assert!(LocaleFormatter::is_supported("en"));
        assert!(LocaleFormatter::is_supported("ja-JP"));
        assert!(LocaleFormatter::is_supported("ja-Hira"));
        assert!(!LocaleFormatter::is_supported("fr"));
    }

    #[test]
    fn test_translation_map() {
        let map = translation_map();
        assert_eq!(map["ja"]["mpImageEmbed.name"], "画像埋め込み");
        assert_eq!(map["ja-Hira"]["mpImageEmbed.name"], "がぞううめこみ");
    }
}
