//! Locale message tables.
//!
//! Tables are static data resolved at startup; there is no per-request
//! bundle loading. An unrecognized locale tag resolves to `None` and the
//! HTTP layer turns that into a 404.

use serde::{Deserialize, Serialize};

/// Locales the marketing site ships copy for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Es,
    En,
}

pub const SUPPORTED_LOCALES: [Locale; 2] = [Locale::Es, Locale::En];

impl Locale {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "es" | "es-es" => Some(Self::Es),
            "en" | "en-us" | "en-gb" => Some(Self::En),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Locale::Es => "es",
            Locale::En => "en",
        }
    }
}

/// Static message table for one locale, as `(key, text)` pairs.
pub fn messages(locale: Locale) -> &'static [(&'static str, &'static str)] {
    match locale {
        Locale::Es => &[
            ("nav.apartments", "Apartamentos"),
            ("nav.contact", "Contacto"),
            ("listing.from", "Desde"),
            ("listing.per_month", "al mes"),
            ("footer.legal", "Aviso legal"),
        ],
        Locale::En => &[
            ("nav.apartments", "Apartments"),
            ("nav.contact", "Contact"),
            ("listing.from", "From"),
            ("listing.per_month", "per month"),
            ("footer.legal", "Legal notice"),
        ],
    }
}

pub fn lookup(locale: Locale, key: &str) -> Option<&'static str> {
    messages(locale)
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, text)| *text)
}
