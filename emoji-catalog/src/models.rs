//! Core data models for the emoji catalog
//!
//! These are the shapes persisted in bundle files and handed to the picker UI.
//! Record types carry uniffi derives so they are exported to foreign code as-is.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Sprite sheet grid size shared by every non-native vendor set.
pub const SHEET_SIZE: SheetSize = SheetSize { cols: 61, rows: 61 };

/// Matches `:id:` and `:id::skin-tone-N:`.
static SHORTCODES_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?::([^:]+):)(?::skin-tone-(\d):)?$").expect("valid shortcodes regex")
});

// ─────────────────────────────────────────────────────────────────────────────
// SKIN
// ─────────────────────────────────────────────────────────────────────────────

/// One rendering of an emoji at a given tone.
///
/// Native and sprite-sheet sets carry `unified`/`native` (plus `x`/`y` for
/// sheets). The icon-asset set carries only `src`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct Skin {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unified: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    /// `:id:` or `:id::skin-tone-N:`, derived at load time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortcodes: Option<String>,
}

impl Skin {
    /// Skin for the native set: code points only, rendered as text.
    pub fn native(unified: &str) -> Option<Self> {
        let unified = unified.to_lowercase();
        let native = unified_to_native(&unified)?;
        Some(Self {
            unified: Some(unified),
            native: Some(native),
            ..Self::default()
        })
    }

    /// Skin addressed by sprite sheet coordinates.
    pub fn sprite(unified: &str, x: u32, y: u32) -> Option<Self> {
        Self::native(unified).map(|skin| Self {
            x: Some(x),
            y: Some(y),
            ..skin
        })
    }

    /// Skin backed by a direct image source (data URI or CDN URL).
    pub fn image(src: String) -> Self {
        Self {
            src: Some(src),
            ..Self::default()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EMOJI
// ─────────────────────────────────────────────────────────────────────────────

fn default_version() -> f64 {
    1.0
}

/// Canonical emoji entity as stored in a bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct Emoji {
    pub id: String,
    pub name: String,
    /// Backward lookup of aliases, filled in at load time
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emoticons: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Slot 0 is the default tone, slots 1-5 the Fitzpatrick modifiers.
    /// A missing tone is `None`; trailing holes are never stored.
    pub skins: Vec<Option<Skin>>,
    #[serde(default = "default_version")]
    pub version: f64,
}

impl Emoji {
    /// The default-tone skin. Bundles guarantee it exists.
    pub fn default_skin(&self) -> Option<&Skin> {
        self.skins.first().and_then(Option::as_ref)
    }

    /// Skin for a 1-based tone, falling back to the default tone when the
    /// slot is empty or out of range.
    pub fn skin(&self, tone: u8) -> Option<&Skin> {
        let slot = usize::from(tone.max(1)) - 1;
        self.skins
            .get(slot)
            .and_then(Option::as_ref)
            .or_else(|| self.default_skin())
    }

    /// Every native string rendered by this emoji, in skin order.
    pub fn natives(&self) -> impl Iterator<Item = &str> {
        self.skins
            .iter()
            .flatten()
            .filter_map(|skin| skin.native.as_deref())
    }

    /// Fill each present skin's `shortcodes`.
    pub fn assign_shortcodes(&mut self) {
        let id = self.id.clone();
        for (slot, skin) in self.skins.iter_mut().enumerate() {
            if let Some(skin) = skin {
                skin.shortcodes = Some(shortcodes_for(&id, slot));
            }
        }
    }

    /// Drop `None` slots from the end of `skins`.
    pub fn trim_skins(&mut self) {
        while matches!(self.skins.last(), Some(None)) {
            self.skins.pop();
        }
    }
}

/// Shortcode string for a skin slot (0-based).
pub fn shortcodes_for(id: &str, slot: usize) -> String {
    if slot == 0 {
        format!(":{}:", id)
    } else {
        format!(":{}::skin-tone-{}:", id, slot + 1)
    }
}

/// Parse `:id:` / `:id::skin-tone-N:` into the id and optional 1-based tone.
pub fn parse_shortcodes(shortcodes: &str) -> Option<(String, Option<u8>)> {
    let captures = SHORTCODES_REGEX.captures(shortcodes)?;
    let id = captures.get(1)?.as_str().to_string();
    let skin = captures
        .get(2)
        .and_then(|m| m.as_str().parse::<u8>().ok());
    Some((id, skin))
}

// ─────────────────────────────────────────────────────────────────────────────
// CATEGORY & BUNDLE
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered bucket of emoji ids. Order determines grid layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct Category {
    pub id: String,
    pub emojis: Vec<String>,
    /// Display name, only present on caller-supplied categories
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Id of the earlier custom category whose icon/label this one shares
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub custom: bool,
}

impl Category {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            emojis: Vec::new(),
            name: None,
            icon: None,
            target: None,
            custom: false,
        }
    }

    pub fn with_emojis(id: impl Into<String>, emojis: Vec<String>) -> Self {
        Self {
            emojis,
            ..Self::new(id)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct SheetSize {
    pub cols: u32,
    pub rows: u32,
}

/// One serialized snapshot for a (Unicode version, vendor set) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    pub categories: Vec<Category>,
    pub emojis: BTreeMap<String, Emoji>,
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    pub sheet: SheetSize,
}

impl Bundle {
    pub fn empty() -> Self {
        Self {
            categories: Vec::new(),
            emojis: BTreeMap::new(),
            aliases: BTreeMap::new(),
            sheet: SHEET_SIZE,
        }
    }

    /// Category ids that reference an emoji missing from the table.
    pub fn dangling_references(&self) -> Vec<(String, String)> {
        self.categories
            .iter()
            .flat_map(|category| {
                category
                    .emojis
                    .iter()
                    .filter(|id| !self.emojis.contains_key(*id))
                    .map(|id| (category.id.clone(), id.clone()))
            })
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CODE POINTS
// ─────────────────────────────────────────────────────────────────────────────

/// Expand a hyphen-joined hex code point sequence into its characters.
/// Returns `None` if any segment is not a valid scalar value.
pub fn unified_to_native(unified: &str) -> Option<String> {
    unified
        .split('-')
        .map(|hex| {
            u32::from_str_radix(hex, 16)
                .ok()
                .and_then(char::from_u32)
        })
        .collect()
}

/// Lowercase hyphen-joined hex code points of a native string.
pub fn native_to_unified(native: &str) -> String {
    native
        .chars()
        .map(|c| format!("{:x}", c as u32))
        .collect::<Vec<_>>()
        .join("-")
}
