//! Emoji Catalog FFI Interface Definition
//!
//! This file defines the enums, records and errors exposed to the picker UI
//! via UniFFI. It acts as the source of truth for shared types.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Emoji;

// ═══════════════════════════════════════════════════════════════════════════════
// ENUMS
// ═══════════════════════════════════════════════════════════════════════════════

/// Rendering source for emoji glyphs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, uniffi::Enum)]
#[serde(rename_all = "lowercase")]
pub enum VendorSet {
    Native,
    Apple,
    Facebook,
    Google,
    Twitter,
    Fluentui,
}

impl VendorSet {
    pub const ALL: [VendorSet; 6] = [
        VendorSet::Native,
        VendorSet::Apple,
        VendorSet::Facebook,
        VendorSet::Google,
        VendorSet::Twitter,
        VendorSet::Fluentui,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VendorSet::Native => "native",
            VendorSet::Apple => "apple",
            VendorSet::Facebook => "facebook",
            VendorSet::Google => "google",
            VendorSet::Twitter => "twitter",
            VendorSet::Fluentui => "fluentui",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|set| set.as_str() == value)
    }

    /// Sprite-sheet sets depend on a per-record image; native and the
    /// icon-asset set do not.
    pub fn uses_sprite_sheet(&self) -> bool {
        !matches!(self, VendorSet::Native | VendorSet::Fluentui)
    }
}

impl fmt::Display for VendorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unicode emoji release a bundle is capped at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, uniffi::Enum)]
pub enum EmojiVersion {
    V1,
    V2,
    V3,
    V4,
    V5,
    V11,
    V12,
    V12_1,
    V13,
    V13_1,
    V14,
}

impl EmojiVersion {
    pub const ALL: [EmojiVersion; 11] = [
        EmojiVersion::V1,
        EmojiVersion::V2,
        EmojiVersion::V3,
        EmojiVersion::V4,
        EmojiVersion::V5,
        EmojiVersion::V11,
        EmojiVersion::V12,
        EmojiVersion::V12_1,
        EmojiVersion::V13,
        EmojiVersion::V13_1,
        EmojiVersion::V14,
    ];

    pub const LATEST: EmojiVersion = EmojiVersion::V14;

    pub fn value(&self) -> f64 {
        match self {
            EmojiVersion::V1 => 1.0,
            EmojiVersion::V2 => 2.0,
            EmojiVersion::V3 => 3.0,
            EmojiVersion::V4 => 4.0,
            EmojiVersion::V5 => 5.0,
            EmojiVersion::V11 => 11.0,
            EmojiVersion::V12 => 12.0,
            EmojiVersion::V12_1 => 12.1,
            EmojiVersion::V13 => 13.0,
            EmojiVersion::V13_1 => 13.1,
            EmojiVersion::V14 => 14.0,
        }
    }

    pub fn from_value(value: f64) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|v| (v.value() - value).abs() < f64::EPSILON)
    }

    pub fn parse(value: &str) -> Option<Self> {
        value.parse::<f64>().ok().and_then(Self::from_value)
    }
}

/// Formats like the bundle directory names: `1`, `12`, `12.1`
impl fmt::Display for EmojiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Locales with published translation files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, uniffi::Enum)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Ar,
    Cs,
    De,
    Es,
    Fa,
    Fr,
    It,
    Ja,
    Nl,
    Pl,
    Pt,
    Ru,
    Uk,
    Zh,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Ar => "ar",
            Locale::Cs => "cs",
            Locale::De => "de",
            Locale::Es => "es",
            Locale::Fa => "fa",
            Locale::Fr => "fr",
            Locale::It => "it",
            Locale::Ja => "ja",
            Locale::Nl => "nl",
            Locale::Pl => "pl",
            Locale::Pt => "pt",
            Locale::Ru => "ru",
            Locale::Uk => "uk",
            Locale::Zh => "zh",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECORDS (Structs)
// ═══════════════════════════════════════════════════════════════════════════════

/// Caller-defined category appended after the bundle's own categories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct CustomCategory {
    pub id: Option<String>,
    pub name: Option<String>,
    pub icon: Option<String>,
    pub emojis: Vec<Emoji>,
}

/// Result of the host's rendering-capability check.
/// Only consulted for the native set.
#[derive(Debug, Clone, Copy, PartialEq, uniffi::Record)]
pub struct PlatformSupport {
    /// Newest emoji version the platform renders, `None` if unknown
    pub latest_version: Option<EmojiVersion>,
    pub country_flags: bool,
}

impl Default for PlatformSupport {
    fn default() -> Self {
        Self {
            latest_version: None,
            country_flags: true,
        }
    }
}

/// Initialization options as passed across the FFI boundary.
///
/// `data_json` / `i18n_json` override the remote fetch with pre-fetched
/// payloads. Unset numeric fields fall back to the picker defaults.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct CatalogOptions {
    pub emoji_version: Option<EmojiVersion>,
    pub set: Option<VendorSet>,
    pub locale: Option<Locale>,
    pub data_json: Option<String>,
    pub i18n_json: Option<String>,
    pub custom: Vec<CustomCategory>,
    pub categories: Option<Vec<String>>,
    pub category_icons: HashMap<String, String>,
    pub max_frequent_rows: Option<u32>,
    pub per_line: Option<u32>,
    pub no_country_flags: bool,
    pub platform: Option<PlatformSupport>,
}

/// Payload handed to the host when the user picks an emoji
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct EmojiSelection {
    pub id: String,
    pub name: String,
    pub native: Option<String>,
    pub unified: Option<String>,
    pub keywords: Vec<String>,
    pub shortcodes: Option<String>,
    pub src: Option<String>,
    pub aliases: Vec<String>,
    pub emoticons: Vec<String>,
    /// 1-based tone that was rendered
    pub skin: u8,
}

/// Error type for catalog operations
///
/// Payloads are strings so one failed load can be reported to every waiter.
#[derive(Debug, Clone, PartialEq, Error, uniffi::Error)]
pub enum CatalogError {
    #[error("Fetch error: {0}")]
    FetchError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Catalog not initialized")]
    NotInitialized,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Load interrupted")]
    Interrupted,
}

pub type CatalogResult<T> = Result<T, CatalogError>;

impl From<crate::fetch::FetchError> for CatalogError {
    fn from(e: crate::fetch::FetchError) -> Self {
        match e {
            crate::fetch::FetchError::Json(e) => CatalogError::ParseError(e.to_string()),
            other => CatalogError::FetchError(other.to_string()),
        }
    }
}

impl From<crate::storage::StoreError> for CatalogError {
    fn from(e: crate::storage::StoreError) -> Self {
        CatalogError::StorageError(e.to_string())
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::ParseError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_display_matches_directory_names() {
        let names: Vec<String> = EmojiVersion::ALL.iter().map(|v| v.to_string()).collect();
        assert_eq!(
            names,
            vec!["1", "2", "3", "4", "5", "11", "12", "12.1", "13", "13.1", "14"]
        );
    }

    #[test]
    fn test_version_parse() {
        assert_eq!(EmojiVersion::parse("12.1"), Some(EmojiVersion::V12_1));
        assert_eq!(EmojiVersion::parse("14"), Some(EmojiVersion::V14));
        assert_eq!(EmojiVersion::parse("6"), None);
    }

    #[test]
    fn test_vendor_set_parse() {
        assert_eq!(VendorSet::parse("twitter"), Some(VendorSet::Twitter));
        assert_eq!(VendorSet::parse("all"), None);
        assert!(!VendorSet::Native.uses_sprite_sheet());
        assert!(!VendorSet::Fluentui.uses_sprite_sheet());
        assert!(VendorSet::Apple.uses_sprite_sheet());
    }
}
