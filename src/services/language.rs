//! Picks the geocoding language hint from the city text.

/// Language used when the query is written in Cyrillic
pub const CYRILLIC_LANGUAGE: &str = "ru";

#[derive(Debug, Clone)]
pub struct LanguageResolver {
    default_language: String,
}

impl LanguageResolver {
    pub fn new(default_language: impl Into<String>) -> Self {
        Self {
            default_language: default_language.into(),
        }
    }

    pub fn resolve(&self, city: &str) -> &str {
        if city.chars().any(is_cyrillic) {
            CYRILLIC_LANGUAGE
        } else {
            &self.default_language
        }
    }
}

impl Default for LanguageResolver {
    fn default() -> Self {
        Self::new("en")
    }
}

fn is_cyrillic(ch: char) -> bool {
    matches!(ch, '\u{0400}'..='\u{052F}' | '\u{2DE0}'..='\u{2DFF}' | '\u{A640}'..='\u{A69F}')
}
