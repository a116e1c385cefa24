//! Icon-asset index for the `fluentui` vendor set
//!
//! The asset tree holds one directory per emoji with a metadata JSON file
//! next to `Color/`, `Flat/` or `Default/...` icon directories, plus one
//! directory per skin tone when the emoji supports tones.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use ignore::WalkBuilder;
use serde::Deserialize;

use crate::sources::{read_json, SourceError, SourceResult};

const PRIMARY_DIRS: [&str; 4] = ["Color", "Flat", "Default/Color", "Default/Flat"];

/// Tone directories in modifier order (1F3FB..1F3FF).
const TONE_DIRS: [&str; 5] = ["Light", "Medium-Light", "Medium", "Medium-Dark", "Dark"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetMetadata {
    unicode: String,
    #[serde(default)]
    unicode_skintones: Vec<String>,
}

/// One icon file, resolved to the `src` a bundle skin carries.
#[derive(Debug, Clone)]
pub struct IconAsset {
    pub path: PathBuf,
    /// File name with parentheses removed and whitespace replaced
    pub file_name: String,
    pub src: String,
}

#[derive(Debug, Default)]
pub struct IconIndex {
    assets: HashMap<String, IconAsset>,
}

/// `"1f44b 1f3fb"` → `"1f44b-1f3fb"`
fn unified_key(unicode: &str) -> String {
    unicode
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '(' && *c != ')')
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> SourceError + '_ {
    move |source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// First icon file under `dir/<sub>` for the first sub-directory that has
/// one. Rasterized `.png` files win over `.svg` in the same directory.
fn first_icon(dir: &Path, subdirs: &[&str]) -> SourceResult<Option<PathBuf>> {
    for sub in subdirs {
        let candidate = dir.join(sub);
        if !candidate.is_dir() {
            continue;
        }
        let mut files: Vec<PathBuf> = fs::read_dir(&candidate)
            .map_err(io_error(&candidate))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                matches!(
                    path.extension().and_then(|e| e.to_str()),
                    Some("png") | Some("svg")
                )
            })
            .collect();
        files.sort_by_key(|path| {
            (
                path.extension().and_then(|e| e.to_str()) != Some("png"),
                path.clone(),
            )
        });
        if let Some(first) = files.into_iter().next() {
            return Ok(Some(first));
        }
    }
    Ok(None)
}

fn asset(path: PathBuf, cdn_base: Option<&str>) -> SourceResult<IconAsset> {
    let raw_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = sanitize_file_name(&raw_name);

    let src = match cdn_base {
        Some(base) => format!("{}/{}", base.trim_end_matches('/'), file_name),
        None => {
            let bytes = fs::read(&path).map_err(io_error(&path))?;
            let mime = match path.extension().and_then(|e| e.to_str()) {
                Some("svg") => "image/svg+xml",
                _ => "image/png",
            };
            format!(
                "data:{};base64,{}",
                mime,
                base64::engine::general_purpose::STANDARD.encode(bytes)
            )
        }
    };

    Ok(IconAsset {
        path,
        file_name,
        src,
    })
}

impl IconIndex {
    /// Walk `root` for metadata files and index every icon they describe.
    ///
    /// With a CDN base each `src` is `<cdn_base>/<file name>`, otherwise the
    /// icon is inlined as a base64 data URI.
    pub fn load(root: &Path, cdn_base: Option<&str>) -> SourceResult<Self> {
        let cdn_base = cdn_base.filter(|base| !base.is_empty());
        let mut assets = HashMap::new();

        let walker = WalkBuilder::new(root)
            .hidden(false)
            .git_ignore(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        for entry in walker.filter_map(|e| e.ok()) {
            let path = entry.path();
            let is_metadata = entry.file_type().is_some_and(|t| t.is_file())
                && path.extension().and_then(|e| e.to_str()) == Some("json");
            if !is_metadata {
                continue;
            }
            let Some(dir) = path.parent() else {
                continue;
            };
            let meta: AssetMetadata = read_json(path)?;

            let Some(icon) = first_icon(dir, &PRIMARY_DIRS)? else {
                log::warn!("Unable to find color icon at {}", dir.display());
                continue;
            };
            assets.insert(unified_key(&meta.unicode), asset(icon, cdn_base)?);

            for (tone, tone_dir) in TONE_DIRS.iter().enumerate() {
                let Some(code) = meta.unicode_skintones.get(tone + 1) else {
                    break;
                };
                let subdirs = [format!("{tone_dir}/Color"), format!("{tone_dir}/Flat")];
                let subdirs: Vec<&str> = subdirs.iter().map(String::as_str).collect();
                match first_icon(dir, &subdirs)? {
                    Some(icon) => {
                        assets.insert(unified_key(code), asset(icon, cdn_base)?);
                    }
                    None => log::debug!("No {} icon at {}", tone_dir, dir.display()),
                }
            }
        }

        log::info!("Indexed {} icons under {}", assets.len(), root.display());
        Ok(Self { assets })
    }

    pub fn get(&self, unified: &str) -> Option<&IconAsset> {
        self.assets.get(&unified.to_lowercase())
    }

    pub fn src(&self, unified: &str) -> Option<&str> {
        self.get(unified).map(|asset| asset.src.as_str())
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Copy every indexed icon into `dest` under its sanitized name.
    pub fn copy_assets(&self, dest: &Path) -> SourceResult<usize> {
        fs::create_dir_all(dest).map_err(io_error(dest))?;
        for asset in self.assets.values() {
            let target = dest.join(&asset.file_name);
            fs::copy(&asset.path, &target).map_err(io_error(&asset.path))?;
        }
        Ok(self.assets.len())
    }
}
