//! Merge upstream sources into one bundle per (version, vendor set)

use std::collections::BTreeMap;

use thiserror::Error;

use emoji_catalog::models::{unified_to_native, Bundle, Category, Emoji, Skin};
use emoji_catalog::{EmojiVersion, VendorSet};

use crate::icons::IconIndex;
use crate::sources::{SourceRecord, Sources};
use crate::text;

/// Upstream category name → bundle category id, in bundle order.
const CATEGORIES: [(&str, &str); 9] = [
    ("Smileys & Emotion", "smileys"),
    ("People & Body", "people"),
    ("Animals & Nature", "nature"),
    ("Food & Drink", "foods"),
    ("Activities", "activity"),
    ("Travel & Places", "places"),
    ("Objects", "objects"),
    ("Symbols", "symbols"),
    ("Flags", "flags"),
];

/// Upstream marker for skin-tone modifiers and other non-pickable parts.
const COMPONENT_CATEGORY: &str = "Component";

/// Fitzpatrick modifiers, in skin slot order 1..=5.
const SKIN_MODIFIERS: [&str; 5] = ["1F3FB", "1F3FC", "1F3FD", "1F3FE", "1F3FF"];

/// Smileys are split around the people category at this position.
const SMILEYS_SPLIT: usize = 114;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("\"{0}\" doesn't have a category")]
    MissingCategory(String),
    #[error("\"{0}\" doesn't have a name")]
    MissingName(String),
    #[error("\"{short_name}\" has unknown category \"{category}\"")]
    UnknownCategory { short_name: String, category: String },
    #[error("\"{short_name}\" has invalid code points \"{unified}\"")]
    InvalidUnified { short_name: String, unified: String },
    #[error("the {0} set needs an icon index")]
    MissingIconIndex(VendorSet),
    #[error("cannot write {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type BuildResult<T> = Result<T, BuildError>;

/// One cell of the emission matrix. `version: None` is the unconstrained
/// bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BuildTarget {
    pub version: Option<EmojiVersion>,
    pub set: VendorSet,
}

impl BuildTarget {
    pub fn new(version: Option<EmojiVersion>, set: VendorSet) -> Self {
        Self { version, set }
    }
}

impl std::fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.version {
            Some(version) => write!(f, "{}/{}", version, self.set),
            None => write!(f, "{}", self.set),
        }
    }
}

/// How skins are rendered for the target set.
enum SkinSource<'a> {
    Native,
    Sprite(VendorSet),
    Icons(&'a IconIndex),
}

impl SkinSource<'_> {
    fn primary(&self, record: &SourceRecord) -> Option<Skin> {
        match self {
            SkinSource::Native => Skin::native(&record.unified),
            SkinSource::Sprite(_) => Skin::sprite(&record.unified, record.sheet_x, record.sheet_y),
            SkinSource::Icons(index) => index
                .src(&record.unified)
                .map(|src| Skin::image(src.to_string())),
        }
    }

    fn tone(&self, record: &SourceRecord, modifier: &str) -> Option<Skin> {
        let variation = record.variation(modifier)?;
        match self {
            SkinSource::Native => Skin::native(&variation.unified),
            SkinSource::Sprite(set) => {
                if !variation.has_image(*set) {
                    return None;
                }
                Skin::sprite(&variation.unified, variation.sheet_x, variation.sheet_y)
            }
            SkinSource::Icons(index) => {
                let skin = index
                    .src(&variation.unified)
                    .map(|src| Skin::image(src.to_string()));
                if skin.is_none() {
                    log::warn!(
                        "No icon for {} tone {}",
                        record.short_name,
                        variation.unified
                    );
                }
                skin
            }
        }
    }
}

fn resolve_name(record: &SourceRecord, native: &str, sources: &Sources) -> BuildResult<String> {
    let vendor = record
        .name
        .clone()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| record.short_name.replace('-', " "));
    let mut name = text::titleize(&vendor);

    let unicode = sources
        .names
        .get(native)
        .map(|entry| text::titleize(&entry.name))
        .unwrap_or_default();
    if !name.contains(':') && !unicode.is_empty() && unicode.chars().count() < name.chars().count()
    {
        name = unicode;
    }

    if name.is_empty() {
        return Err(BuildError::MissingName(record.short_name.clone()));
    }
    Ok(name)
}

fn short_names(record: &SourceRecord) -> Vec<String> {
    let mut ids = record.short_names.clone();
    if !ids.contains(&record.short_name) {
        ids.insert(0, record.short_name.clone());
    }
    ids
}

fn emoticons(record: &SourceRecord, id: &str) -> Vec<String> {
    let mut emoticons = record.texts.clone().unwrap_or_default();
    if let Some(text) = &record.text {
        if !emoticons.contains(text) {
            emoticons.insert(0, text.clone());
        }
    }
    if id == "expressionless" && !emoticons.iter().any(|e| e == "-_-") {
        emoticons.push("-_-".to_string());
    }
    emoticons
}

/// Build the bundle for one target.
///
/// A record without a category or a name aborts the build. A record whose
/// default icon is missing from the icon index is left out of the bundle.
pub fn build_bundle(
    sources: &Sources,
    target: &BuildTarget,
    icons: Option<&IconIndex>,
) -> BuildResult<Bundle> {
    let skin_source = match target.set {
        VendorSet::Native => SkinSource::Native,
        VendorSet::Fluentui => {
            SkinSource::Icons(icons.ok_or(BuildError::MissingIconIndex(target.set))?)
        }
        set => SkinSource::Sprite(set),
    };

    let mut records: Vec<&SourceRecord> = sources.records.iter().collect();
    records.sort_by(|a, b| {
        (a.sort_order.is_none(), a.sort_order, &a.short_name).cmp(&(
            b.sort_order.is_none(),
            b.sort_order,
            &b.short_name,
        ))
    });

    let mut bundle = Bundle::empty();
    let mut buckets: BTreeMap<&str, Vec<String>> = BTreeMap::new();

    for record in records {
        if target.set.uses_sprite_sheet() && !record.has_image(target.set) {
            continue;
        }

        let category = record
            .category
            .as_deref()
            .ok_or_else(|| BuildError::MissingCategory(record.short_name.clone()))?;
        let unified = record.unified.to_lowercase();
        let native = unified_to_native(&unified).ok_or_else(|| BuildError::InvalidUnified {
            short_name: record.short_name.clone(),
            unified: record.unified.clone(),
        })?;
        let name = resolve_name(record, &native, sources)?;

        if let Some(ceiling) = target.version {
            if record.version() > ceiling.value() {
                continue;
            }
        }
        if category == COMPONENT_CATEGORY {
            continue;
        }
        let bucket = CATEGORIES
            .iter()
            .find(|(upstream, _)| *upstream == category)
            .map(|(_, id)| *id)
            .ok_or_else(|| BuildError::UnknownCategory {
                short_name: record.short_name.clone(),
                category: category.to_string(),
            })?;

        let Some(primary) = skin_source.primary(record) else {
            log::warn!("No {} image for {}, skipping", target.set, record.short_name);
            continue;
        };

        let ids = short_names(record);
        let id = ids[0].clone();
        for alias in &ids[1..] {
            if *alias != id {
                bundle.aliases.insert(alias.clone(), id.clone());
            }
        }

        let mut skins = vec![Some(primary)];
        if record.skin_variations.is_some() {
            skins.extend(
                SKIN_MODIFIERS
                    .iter()
                    .map(|modifier| skin_source.tone(record, modifier)),
            );
        }

        let lexicon = sources.keywords.get(&native).into_iter().flatten();
        let mut emoji = Emoji {
            id: id.clone(),
            keywords: text::keywords(&ids, lexicon, &name),
            name,
            aliases: Vec::new(),
            emoticons: emoticons(record, &id),
            skins,
            version: record.version(),
        };
        emoji.trim_skins();

        buckets.entry(bucket).or_default().push(id.clone());
        bundle.emojis.insert(id, emoji);
    }

    if let Some(flags) = buckets.get_mut("flags") {
        flags.sort();
    }

    let mut smileys = buckets.remove("smileys").unwrap_or_default();
    let tail = smileys.split_off(SMILEYS_SPLIT.min(smileys.len()));
    let mut people = smileys;
    people.extend(buckets.remove("people").unwrap_or_default());
    people.extend(tail);
    bundle.categories.push(Category::with_emojis("people", people));

    for (_, id) in CATEGORIES.iter().skip(2) {
        bundle
            .categories
            .push(Category::with_emojis(*id, buckets.remove(id).unwrap_or_default()));
    }

    log::debug!(
        "Built {}: {} emoji, {} aliases",
        target,
        bundle.emojis.len(),
        bundle.aliases.len()
    );
    Ok(bundle)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATASET: &str = r#"[
        {"name": "GRINNING FACE", "unified": "1F600", "short_name": "grinning",
         "short_names": ["grinning"], "category": "Smileys & Emotion", "sort_order": 1,
         "added_in": "6.1", "sheet_x": 32, "sheet_y": 20, "has_img_apple": true, "has_img_google": true,
         "text": ":D", "texts": null},
        {"name": "EXPRESSIONLESS FACE", "unified": "1F611", "short_name": "expressionless",
         "short_names": ["expressionless"], "category": "Smileys & Emotion", "sort_order": 2,
         "added_in": "6.1", "sheet_x": 32, "sheet_y": 37, "has_img_apple": true},
        {"name": "MELTING FACE", "unified": "1FAE0", "short_name": "melting_face",
         "short_names": ["melting_face"], "category": "Smileys & Emotion", "sort_order": 3,
         "added_in": "14.0", "sheet_x": 55, "sheet_y": 0, "has_img_apple": true},
        {"name": "WAVING HAND SIGN", "unified": "1F44B", "short_name": "wave",
         "short_names": ["wave", "waving_hand"], "category": "People & Body", "sort_order": 10,
         "added_in": "0.6", "sheet_x": 13, "sheet_y": 27, "has_img_apple": true,
         "skin_variations": {
            "1F3FB": {"unified": "1F44B-1F3FB", "sheet_x": 13, "sheet_y": 28, "has_img_apple": true},
            "1F3FC": {"unified": "1F44B-1F3FC", "sheet_x": 13, "sheet_y": 29, "has_img_apple": false},
            "1F3FD": {"unified": "1F44B-1F3FD", "sheet_x": 13, "sheet_y": 30, "has_img_apple": true}
         }},
        {"name": "CAT FACE", "unified": "1F431", "short_name": "cat", "short_names": ["cat"],
         "category": "Animals & Nature", "sort_order": 20, "added_in": "0.6", "has_img_apple": true},
        {"name": "REGIONAL INDICATOR SYMBOL LETTERS FR", "unified": "1F1EB-1F1F7", "short_name": "flag-fr", "short_names": ["fr", "flag-fr"],
         "category": "Flags", "sort_order": 31, "added_in": "0.6", "has_img_apple": true},
        {"name": null, "unified": "1F3F4-200D-2620-FE0F", "short_name": "pirate_flag",
         "short_names": ["pirate_flag"], "category": "Flags", "sort_order": 30, "added_in": "11.0",
         "has_img_apple": true},
        {"name": "EMOJI MODIFIER FITZPATRICK TYPE-1-2", "unified": "1F3FB", "short_name": "skin-tone-2",
         "short_names": ["skin-tone-2"], "category": "Component", "sort_order": 40, "added_in": "8.0",
         "has_img_apple": true}
    ]"#;

    const KEYWORDS: &str = r#"{"😀": ["face", "smile", "happy"], "🐱": ["animal", "pet"]}"#;
    const NAMES: &str = r#"{"🐱": {"name": "cat"}, "🇫🇷": {"name": "flag: France"}}"#;

    fn sources() -> Sources {
        Sources::from_json(DATASET, KEYWORDS, NAMES).unwrap()
    }

    fn build(version: Option<EmojiVersion>, set: VendorSet) -> Bundle {
        build_bundle(&sources(), &BuildTarget::new(version, set), None).unwrap()
    }

    fn category<'a>(bundle: &'a Bundle, id: &str) -> &'a [String] {
        &bundle.categories.iter().find(|c| c.id == id).unwrap().emojis
    }

    #[test]
    fn test_category_layout() {
        let bundle = build(None, VendorSet::Native);
        let ids: Vec<&str> = bundle.categories.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["people", "nature", "foods", "activity", "places", "objects", "symbols", "flags"]
        );
        assert_eq!(
            category(&bundle, "people"),
            ["grinning", "expressionless", "melting_face", "wave"]
        );
        assert!(bundle.dangling_references().is_empty());
    }

    #[test]
    fn test_smileys_interleave_around_people() {
        let mut records = Vec::new();
        for i in 0..116 {
            records.push(format!(
                r#"{{"unified": "1F600", "short_name": "s{i:03}", "category": "Smileys & Emotion", "sort_order": {i}}}"#
            ));
        }
        records.push(
            r#"{"unified": "1F44B", "short_name": "p", "category": "People & Body", "sort_order": 500}"#
                .to_string(),
        );
        let dataset = format!("[{}]", records.join(","));
        let sources = Sources::from_json(&dataset, "{}", "{}").unwrap();
        let bundle =
            build_bundle(&sources, &BuildTarget::new(None, VendorSet::Native), None).unwrap();

        let people = category(&bundle, "people");
        assert_eq!(people.len(), 117);
        assert_eq!(people[113], "s113");
        assert_eq!(people[114], "p");
        assert_eq!(people[115], "s114");
    }

    #[test]
    fn test_flags_sorted_and_component_excluded() {
        let bundle = build(None, VendorSet::Native);
        assert_eq!(category(&bundle, "flags"), ["fr", "pirate_flag"]);
        assert!(!bundle.emojis.contains_key("skin-tone-2"));
    }

    #[test]
    fn test_version_ceiling() {
        let v11 = build(Some(EmojiVersion::V11), VendorSet::Native);
        assert!(!v11.emojis.contains_key("melting_face"));
        assert!(v11.emojis.contains_key("pirate_flag"));

        let v5 = build(Some(EmojiVersion::V5), VendorSet::Native);
        assert!(!v5.emojis.contains_key("pirate_flag"));
        assert!(v5.emojis.contains_key("wave"));
        assert_eq!(v5.emojis["wave"].version, 1.0);

        let latest = build(None, VendorSet::Native);
        assert_eq!(latest.emojis["melting_face"].version, 14.0);
    }

    #[test]
    fn test_id_and_aliases() {
        let bundle = build(None, VendorSet::Native);
        assert_eq!(bundle.aliases.get("waving_hand").map(String::as_str), Some("wave"));
        assert_eq!(bundle.aliases.get("flag-fr").map(String::as_str), Some("fr"));
        assert!(!bundle.aliases.contains_key("wave"));
    }

    #[test]
    fn test_names() {
        let bundle = build(None, VendorSet::Native);
        assert_eq!(bundle.emojis["wave"].name, "Waving Hand Sign");
        // shorter unicode names win
        assert_eq!(bundle.emojis["cat"].name, "Cat");
        assert_eq!(bundle.emojis["fr"].name, "Flag: France");
        assert_eq!(bundle.emojis["pirate_flag"].name, "Pirate Flag");
    }

    #[test]
    fn test_emoticons() {
        let bundle = build(None, VendorSet::Native);
        assert_eq!(bundle.emojis["grinning"].emoticons, vec![":D"]);
        assert_eq!(bundle.emojis["expressionless"].emoticons, vec!["-_-"]);
        assert!(bundle.emojis["cat"].emoticons.is_empty());
    }

    #[test]
    fn test_keywords() {
        let bundle = build(None, VendorSet::Native);
        assert_eq!(
            bundle.emojis["grinning"].keywords,
            vec!["smile", "happy"]
        );
        assert_eq!(bundle.emojis["cat"].keywords, vec!["animal", "pet"]);
        assert_eq!(bundle.emojis["wave"].keywords, vec!["wave"]);
    }

    #[test]
    fn test_native_skins() {
        let bundle = build(None, VendorSet::Native);
        let wave = &bundle.emojis["wave"];
        assert_eq!(wave.skins.len(), 4);
        assert_eq!(wave.skins[0].as_ref().unwrap().native.as_deref(), Some("👋"));
        assert!(wave.skins[0].as_ref().unwrap().x.is_none());
        assert_eq!(
            wave.skins[3].as_ref().unwrap().unified.as_deref(),
            Some("1f44b-1f3fd")
        );
    }

    #[test]
    fn test_sprite_skins_respect_image_flags() {
        let bundle = build(None, VendorSet::Apple);
        let wave = &bundle.emojis["wave"];
        assert_eq!(wave.skins.len(), 4);
        assert_eq!(wave.skins[1].as_ref().unwrap().y, Some(28));
        assert!(wave.skins[2].is_none());
        assert_eq!(wave.skins[3].as_ref().unwrap().y, Some(30));
        assert_eq!(wave.default_skin().unwrap().x, Some(13));
    }

    #[test]
    fn test_sprite_set_filters_records_without_image() {
        let bundle = build(None, VendorSet::Google);
        assert_eq!(bundle.emojis.keys().collect::<Vec<_>>(), vec!["grinning"]);
        assert_eq!(bundle.categories.len(), 8);
    }

    #[test]
    fn test_missing_category_fails() {
        let dataset = r#"[{"unified": "1F600", "short_name": "grinning"}]"#;
        let sources = Sources::from_json(dataset, "{}", "{}").unwrap();
        let err =
            build_bundle(&sources, &BuildTarget::new(None, VendorSet::Native), None).unwrap_err();
        assert!(matches!(err, BuildError::MissingCategory(id) if id == "grinning"));
    }

    #[test]
    fn test_missing_name_fails_even_when_filtered_by_version() {
        let dataset = r#"[{"name": "", "unified": "1F600", "short_name": "",
            "category": "Smileys & Emotion", "added_in": "14.0"}]"#;
        let sources = Sources::from_json(dataset, "{}", "{}").unwrap();
        let target = BuildTarget::new(Some(EmojiVersion::V1), VendorSet::Native);
        assert!(matches!(
            build_bundle(&sources, &target, None),
            Err(BuildError::MissingName(_))
        ));
    }

    #[test]
    fn test_icon_set_requires_index() {
        let target = BuildTarget::new(None, VendorSet::Fluentui);
        assert!(matches!(
            build_bundle(&sources(), &target, None),
            Err(BuildError::MissingIconIndex(VendorSet::Fluentui))
        ));
    }

    #[test]
    fn test_icon_set_skips_missing_icons() {
        let dir = tempfile::tempdir().unwrap();
        let cat = dir.path().join("Cat face");
        std::fs::create_dir_all(cat.join("Color")).unwrap();
        std::fs::write(cat.join("metadata.json"), r#"{"unicode": "1f431"}"#).unwrap();
        std::fs::write(cat.join("Color/cat_face_color.png"), b"cat").unwrap();
        let icons = IconIndex::load(dir.path(), Some("https://cdn.example.com")).unwrap();

        let target = BuildTarget::new(None, VendorSet::Fluentui);
        let bundle = build_bundle(&sources(), &target, Some(&icons)).unwrap();

        assert_eq!(bundle.emojis.keys().collect::<Vec<_>>(), vec!["cat"]);
        let skin = bundle.emojis["cat"].default_skin().unwrap();
        assert_eq!(
            skin.src.as_deref(),
            Some("https://cdn.example.com/cat_face_color.png")
        );
        assert!(skin.unified.is_none());
        assert!(bundle.dangling_references().is_empty());
    }
}
