//! Upstream inputs of a build
//!
//! * the canonical per-emoji dataset (an array of records with short names,
//!   category, sprite coordinates and skin variations)
//! * a keyword lexicon keyed by native string
//! * the Unicode name table keyed by native string
//!
//! Parsing is strict: a record without `unified` or `short_name` rejects the
//! whole dataset.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use emoji_catalog::VendorSet;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {what}: {source}")]
    Json {
        what: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type SourceResult<T> = Result<T, SourceError>;

/// `added_in` is published as a string ("0.6") but some mirrors use numbers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AddedIn {
    Number(f64),
    Text(String),
}

impl AddedIn {
    /// Introduction version, clamped to at least 1.
    pub fn clamped(&self) -> f64 {
        let value = match self {
            AddedIn::Number(n) => *n,
            AddedIn::Text(s) => s.trim().parse().unwrap_or(1.0),
        };
        value.max(1.0)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SkinVariation {
    pub unified: String,
    #[serde(default)]
    pub sheet_x: u32,
    #[serde(default)]
    pub sheet_y: u32,
    /// `has_img_<set>` flags
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl SkinVariation {
    pub fn has_image(&self, set: VendorSet) -> bool {
        has_image(&self.extra, set)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceRecord {
    #[serde(default)]
    pub name: Option<String>,
    pub unified: String,
    pub short_name: String,
    #[serde(default)]
    pub short_names: Vec<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub texts: Option<Vec<String>>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sort_order: Option<u32>,
    #[serde(default)]
    pub added_in: Option<AddedIn>,
    #[serde(default)]
    pub sheet_x: u32,
    #[serde(default)]
    pub sheet_y: u32,
    #[serde(default)]
    pub skin_variations: Option<BTreeMap<String, SkinVariation>>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl SourceRecord {
    pub fn has_image(&self, set: VendorSet) -> bool {
        has_image(&self.extra, set)
    }

    pub fn version(&self) -> f64 {
        self.added_in.as_ref().map_or(1.0, AddedIn::clamped)
    }

    /// Variation for a tone modifier, keyed either `1F3FB` or `1F3FB-1F3FB`.
    pub fn variation(&self, modifier: &str) -> Option<&SkinVariation> {
        let variations = self.skin_variations.as_ref()?;
        variations
            .get(modifier)
            .or_else(|| variations.get(&format!("{modifier}-{modifier}")))
    }
}

fn has_image(extra: &HashMap<String, serde_json::Value>, set: VendorSet) -> bool {
    extra
        .get(&format!("has_img_{}", set))
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false)
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnicodeName {
    pub name: String,
}

/// Everything a build reads besides icon assets.
#[derive(Debug, Clone, Default)]
pub struct Sources {
    pub records: Vec<SourceRecord>,
    pub keywords: HashMap<String, Vec<String>>,
    pub names: HashMap<String, UnicodeName>,
}

impl Sources {
    pub fn load(dataset: &Path, keywords: &Path, names: &Path) -> SourceResult<Self> {
        Ok(Self {
            records: read_json(dataset)?,
            keywords: read_json(keywords)?,
            names: read_json(names)?,
        })
    }

    pub fn from_json(dataset: &str, keywords: &str, names: &str) -> SourceResult<Self> {
        Ok(Self {
            records: parse_json("dataset", dataset)?,
            keywords: parse_json("keyword lexicon", keywords)?,
            names: parse_json("name table", names)?,
        })
    }
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> SourceResult<T> {
    let raw = fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_json(&path.display().to_string(), &raw)
}

fn parse_json<T: DeserializeOwned>(what: &str, raw: &str) -> SourceResult<T> {
    serde_json::from_str(raw).map_err(|source| SourceError::Json {
        what: what.to_string(),
        source,
    })
}
