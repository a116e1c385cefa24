//! Runtime data store
//!
//! Owns everything a picker session reads: the base bundle, the emoji table
//! (base plus every custom emoji seen so far), reverse lookups, the search
//! index and the frequency tracker.
//!
//! A load resolves its sources first (possibly over the network) and then
//! applies them in one synchronous step under the write lock, so readers
//! only ever observe a complete [`LoadedState`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use parking_lot::{Mutex, RwLock};

use crate::fetch::BundleFetcher;
use crate::frequency::FrequencyTracker;
use crate::i18n::{needs_fetch, Translations};
use crate::indexer::SearchIndex;
use crate::interface::{
    CatalogError, CatalogOptions, CatalogResult, CustomCategory, EmojiVersion, Locale,
    PlatformSupport, VendorSet,
};
use crate::models::{parse_shortcodes, Bundle, Category, Emoji, SheetSize};
use crate::storage::Preferences;

pub const FREQUENT_CATEGORY: &str = "frequent";
pub const FLAGS_CATEGORY: &str = "flags";
pub const DEFAULT_MAX_FREQUENT_ROWS: u32 = 4;
pub const DEFAULT_PER_LINE: u32 = 9;

/// Flags kept when country flags are suppressed.
pub const NON_COUNTRY_FLAGS: [&str; 8] = [
    "checkered_flag",
    "crossed_flags",
    "pirate_flag",
    "rainbow-flag",
    "transgender_flag",
    "triangular_flag_on_post",
    "waving_black_flag",
    "waving_white_flag",
];

// ─────────────────────────────────────────────────────────────────────────────
// OPTIONS
// ─────────────────────────────────────────────────────────────────────────────

pub type DeferredBundle = Arc<dyn Fn() -> BoxFuture<'static, CatalogResult<Bundle>> + Send + Sync>;
pub type DeferredTranslations =
    Arc<dyn Fn() -> BoxFuture<'static, CatalogResult<Translations>> + Send + Sync>;

/// Where the bundle comes from on a first load.
#[derive(Clone)]
pub enum BundleSource {
    Data(Bundle),
    Deferred(DeferredBundle),
    /// Fetch `(emoji_version, set)` through the store's fetcher
    Remote,
}

impl BundleSource {
    pub fn deferred<F, Fut>(producer: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CatalogResult<Bundle>> + Send + 'static,
    {
        BundleSource::Deferred(Arc::new(move || producer().boxed()))
    }
}

#[derive(Clone)]
pub enum TranslationsSource {
    Data(Translations),
    Deferred(DeferredTranslations),
    /// Built in for English, fetched by locale otherwise
    Remote,
}

impl TranslationsSource {
    pub fn deferred<F, Fut>(producer: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CatalogResult<Translations>> + Send + 'static,
    {
        TranslationsSource::Deferred(Arc::new(move || producer().boxed()))
    }
}

#[derive(Clone)]
pub struct InitOptions {
    pub emoji_version: EmojiVersion,
    pub set: VendorSet,
    pub locale: Locale,
    pub data: BundleSource,
    pub i18n: TranslationsSource,
    pub custom: Vec<CustomCategory>,
    /// Ordered allow-list of category ids
    pub categories: Option<Vec<String>>,
    pub category_icons: HashMap<String, String>,
    pub max_frequent_rows: u32,
    pub per_line: u32,
    pub no_country_flags: bool,
    pub platform: PlatformSupport,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            emoji_version: EmojiVersion::LATEST,
            set: VendorSet::Native,
            locale: Locale::En,
            data: BundleSource::Remote,
            i18n: TranslationsSource::Remote,
            custom: Vec::new(),
            categories: None,
            category_icons: HashMap::new(),
            max_frequent_rows: DEFAULT_MAX_FREQUENT_ROWS,
            per_line: DEFAULT_PER_LINE,
            no_country_flags: false,
            platform: PlatformSupport::default(),
        }
    }
}

impl TryFrom<CatalogOptions> for InitOptions {
    type Error = CatalogError;

    fn try_from(options: CatalogOptions) -> CatalogResult<Self> {
        let defaults = InitOptions::default();
        let data = match options.data_json {
            Some(json) => BundleSource::Data(serde_json::from_str(&json)?),
            None => BundleSource::Remote,
        };
        let i18n = match options.i18n_json {
            Some(json) => TranslationsSource::Data(Translations::from_json(&json)?),
            None => TranslationsSource::Remote,
        };
        let per_line = options.per_line.unwrap_or(defaults.per_line);
        if per_line == 0 {
            return Err(CatalogError::InvalidInput("per_line must be positive".into()));
        }

        Ok(Self {
            emoji_version: options.emoji_version.unwrap_or(defaults.emoji_version),
            set: options.set.unwrap_or(defaults.set),
            locale: options.locale.unwrap_or(defaults.locale),
            data,
            i18n,
            custom: options.custom,
            categories: options.categories,
            category_icons: options.category_icons,
            max_frequent_rows: options
                .max_frequent_rows
                .unwrap_or(defaults.max_frequent_rows),
            per_line,
            no_country_flags: options.no_country_flags,
            platform: options.platform.unwrap_or_default(),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LOADED STATE
// ─────────────────────────────────────────────────────────────────────────────

/// Immutable view produced by one load.
pub struct LoadedState {
    pub set: VendorSet,
    pub categories: Vec<Category>,
    pub emojis: HashMap<String, Arc<Emoji>>,
    pub aliases: BTreeMap<String, String>,
    pub natives: HashMap<String, String>,
    pub emoticons: HashMap<String, String>,
    pub translations: Translations,
    pub sheet: SheetSize,
    pub index: Arc<SearchIndex>,
}

impl LoadedState {
    /// Resolve an id, then an alias, then a native string.
    pub fn get(&self, key: &str) -> Option<Arc<Emoji>> {
        self.emojis
            .get(key)
            .or_else(|| self.aliases.get(key).and_then(|id| self.emojis.get(id)))
            .or_else(|| self.natives.get(key).and_then(|id| self.emojis.get(id)))
            .cloned()
    }

    /// Resolve `:id:` / `:id::skin-tone-N:` into the emoji and its 1-based tone.
    pub fn get_by_shortcodes(&self, shortcodes: &str) -> Option<(Arc<Emoji>, u8)> {
        let (id, skin) = parse_shortcodes(shortcodes)?;
        let emoji = self.get(&id)?;
        Some((emoji, skin.unwrap_or(1)))
    }

    pub fn emoji_for_emoticon(&self, emoticon: &str) -> Option<Arc<Emoji>> {
        self.emoticons
            .get(emoticon)
            .and_then(|id| self.emojis.get(id))
            .cloned()
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }
}

/// What a load changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOutcome {
    /// The search index was rebuilt because new emoji became searchable
    pub rebuilt: bool,
    pub categories: usize,
}

// ─────────────────────────────────────────────────────────────────────────────
// STORE
// ─────────────────────────────────────────────────────────────────────────────

/// Bundle as first loaded, with `frequent` prepended and aliases expanded.
struct BaseBundle {
    categories: Vec<Category>,
    aliases: BTreeMap<String, String>,
    sheet: SheetSize,
}

#[derive(Default)]
struct Tables {
    base: Option<BaseBundle>,
    /// Base emoji plus every custom emoji merged so far
    emojis: HashMap<String, Arc<Emoji>>,
    translations: Option<(Locale, Translations)>,
    searchable: HashSet<String>,
    natives: HashMap<String, String>,
    emoticons: HashMap<String, String>,
    index: Arc<SearchIndex>,
    current: Option<Arc<LoadedState>>,
}

pub struct DataStore {
    fetcher: Arc<dyn BundleFetcher>,
    tables: RwLock<Tables>,
    tracker: Mutex<FrequencyTracker>,
}

impl DataStore {
    pub fn new(fetcher: Arc<dyn BundleFetcher>, prefs: Preferences) -> Self {
        Self {
            fetcher,
            tables: RwLock::new(Tables::default()),
            tracker: Mutex::new(FrequencyTracker::new(prefs)),
        }
    }

    /// Latest complete state, if any load has finished.
    pub fn current(&self) -> Option<Arc<LoadedState>> {
        self.tables.read().current.clone()
    }

    /// Forget the base bundle, strings and search state. The next load
    /// starts from scratch.
    pub fn reset(&self) {
        *self.tables.write() = Tables::default();
        log::debug!("data store reset");
    }

    pub fn record(&self, emoji_id: &str) {
        self.tracker.lock().record(emoji_id);
    }

    pub fn frequent(&self, max_rows: u32, per_line: u32) -> Vec<String> {
        self.tracker.lock().top_n(max_rows, per_line)
    }

    /// Run one load with `options`.
    pub async fn load(&self, options: &InitOptions) -> CatalogResult<LoadOutcome> {
        let (needs_bundle, needs_strings) = {
            let tables = self.tables.read();
            (tables.base.is_none(), tables.needs_translations(options))
        };

        let bundle = if needs_bundle {
            Some(self.resolve_bundle(options).await?)
        } else {
            None
        };
        let translations = if needs_strings {
            Some(self.resolve_translations(options).await?)
        } else {
            None
        };

        let mut tables = self.tables.write();
        if let Some(bundle) = bundle {
            tables.install_base(bundle);
        }
        if let Some(translations) = translations {
            tables.translations = Some((options.locale, translations));
        }
        // A reset raced with this load
        if tables.base.is_none() || tables.translations.is_none() {
            return Err(CatalogError::Interrupted);
        }

        let mut tracker = self.tracker.lock();
        Ok(tables.apply(options, &mut tracker))
    }

    async fn resolve_bundle(&self, options: &InitOptions) -> CatalogResult<Bundle> {
        let bundle = match &options.data {
            BundleSource::Data(bundle) => bundle.clone(),
            BundleSource::Deferred(producer) => producer().await?,
            BundleSource::Remote => {
                self.fetcher
                    .fetch_bundle(options.emoji_version, options.set)
                    .await?
            }
        };
        validate_bundle(&bundle)?;
        Ok(bundle)
    }

    async fn resolve_translations(&self, options: &InitOptions) -> CatalogResult<Translations> {
        match &options.i18n {
            TranslationsSource::Data(strings) => Ok(strings.clone()),
            TranslationsSource::Deferred(producer) => producer().await,
            TranslationsSource::Remote if !needs_fetch(options.locale) => {
                Ok(Translations::english())
            }
            TranslationsSource::Remote => {
                Ok(self.fetcher.fetch_translations(options.locale).await?)
            }
        }
    }
}

/// Reject bundles a picker cannot render.
pub fn validate_bundle(bundle: &Bundle) -> CatalogResult<()> {
    for (id, emoji) in &bundle.emojis {
        if emoji.default_skin().is_none() {
            return Err(CatalogError::ParseError(format!(
                "emoji {} has no default skin",
                id
            )));
        }
    }
    Ok(())
}

fn prepare(mut emoji: Emoji) -> Emoji {
    emoji.trim_skins();
    emoji.assign_shortcodes();
    emoji
}

impl Tables {
    fn needs_translations(&self, options: &InitOptions) -> bool {
        match (&self.translations, &options.i18n) {
            (None, _) => true,
            (Some(_), TranslationsSource::Data(_) | TranslationsSource::Deferred(_)) => true,
            (Some((locale, _)), TranslationsSource::Remote) => *locale != options.locale,
        }
    }

    fn install_base(&mut self, bundle: Bundle) {
        let Bundle {
            mut categories,
            emojis,
            aliases,
            sheet,
        } = bundle;

        let mut emojis: HashMap<String, Emoji> = emojis.into_iter().collect();
        for (alias, id) in &aliases {
            if let Some(emoji) = emojis.get_mut(id) {
                if !emoji.aliases.contains(alias) {
                    emoji.aliases.push(alias.clone());
                }
            }
        }
        categories.retain(|c| c.id != FREQUENT_CATEGORY);
        categories.insert(0, Category::new(FREQUENT_CATEGORY));

        log::debug!(
            "installed base bundle: {} emoji, {} categories, {} aliases",
            emojis.len(),
            categories.len(),
            aliases.len()
        );
        self.emojis = emojis
            .into_iter()
            .map(|(id, emoji)| (id, Arc::new(prepare(emoji))))
            .collect();
        self.base = Some(BaseBundle {
            categories,
            aliases,
            sheet,
        });
    }

    /// Derive the category view for `options` and publish a new state.
    fn apply(&mut self, options: &InitOptions, tracker: &mut FrequencyTracker) -> LoadOutcome {
        let (mut categories, aliases, sheet) = match &self.base {
            Some(base) => (base.categories.clone(), base.aliases.clone(), base.sheet),
            None => (Vec::new(), BTreeMap::new(), SheetSize { cols: 0, rows: 0 }),
        };
        let translations = match &self.translations {
            Some((_, strings)) => strings.clone(),
            None => Translations::english(),
        };

        categories.extend(self.merge_custom(&options.custom, &translations));

        if let Some(allowed) = &options.categories {
            categories.retain(|c| allowed.contains(&c.id));
            categories.sort_by_key(|c| allowed.iter().position(|id| *id == c.id));
        }

        let (latest_version, no_country_flags) = if options.set == VendorSet::Native {
            (
                options.platform.latest_version.map(|v| v.value()),
                options.no_country_flags || !options.platform.country_flags,
            )
        } else {
            (None, false)
        };

        let mut grew = false;
        // within one pass the last emoji listing an emoticon owns it
        let mut claimed: HashMap<String, String> = HashMap::new();
        let mut kept = Vec::with_capacity(categories.len());
        for mut category in categories {
            if category.id == FREQUENT_CATEGORY {
                category.emojis = tracker.top_n(options.max_frequent_rows, options.per_line);
            }
            if category.emojis.is_empty() {
                continue;
            }
            if category.icon.is_none() {
                category.icon = options.category_icons.get(&category.id).cloned();
            }

            let is_flags = category.id == FLAGS_CATEGORY;
            category.emojis.retain(|id| {
                let Some(emoji) = self.emojis.get(id) else {
                    return false;
                };
                if latest_version.is_some_and(|latest| emoji.version > latest) {
                    return false;
                }
                if no_country_flags && is_flags && !NON_COUNTRY_FLAGS.contains(&id.as_str()) {
                    return false;
                }
                true
            });
            if category.emojis.is_empty() {
                continue;
            }

            for id in &category.emojis {
                if self.searchable.contains(id) {
                    continue;
                }
                if let Some(emoji) = self.emojis.get(id) {
                    for emoticon in &emoji.emoticons {
                        claimed.insert(emoticon.clone(), id.clone());
                    }
                    for native in emoji.natives() {
                        self.natives
                            .entry(native.to_string())
                            .or_insert_with(|| id.clone());
                    }
                }
                self.searchable.insert(id.clone());
                grew = true;
            }
            kept.push(category);
        }
        for (emoticon, id) in claimed {
            self.emoticons.entry(emoticon).or_insert(id);
        }

        if grew {
            let mut ids: Vec<&String> = self.searchable.iter().collect();
            ids.sort();
            let pool: Vec<&Arc<Emoji>> =
                ids.iter().filter_map(|id| self.emojis.get(*id)).collect();
            self.index = Arc::new(SearchIndex::build(pool));
            log::debug!("search index rebuilt over {} emoji", self.index.len());
        }

        let outcome = LoadOutcome {
            rebuilt: grew,
            categories: kept.len(),
        };
        self.current = Some(Arc::new(LoadedState {
            set: options.set,
            categories: kept,
            emojis: self.emojis.clone(),
            aliases,
            natives: self.natives.clone(),
            emoticons: self.emoticons.clone(),
            translations,
            sheet,
            index: Arc::clone(&self.index),
        }));
        outcome
    }

    /// Turn caller categories into id-only categories, adding their emoji to
    /// the table. Empty ones are skipped.
    fn merge_custom(
        &mut self,
        custom: &[CustomCategory],
        translations: &Translations,
    ) -> Vec<Category> {
        let mut merged = Vec::new();
        // (id, target) of the previous caller category, as resolved
        let mut previous: Option<(Option<String>, Option<String>)> = None;

        for (i, source) in custom.iter().enumerate() {
            let link = previous.take();
            if source.emojis.is_empty() {
                previous = Some((source.id.clone(), None));
                continue;
            }

            let id = source
                .id
                .clone()
                .unwrap_or_else(|| format!("custom_{}", i + 1));
            let target = match (&source.icon, link) {
                (None, Some((prev_id, prev_target))) => prev_target.or(prev_id),
                _ => None,
            };

            let mut ids: Vec<String> = Vec::new();
            for emoji in &source.emojis {
                if ids.contains(&emoji.id) {
                    continue;
                }
                let emoji = Arc::new(prepare(emoji.clone()));
                if let Some(existing) = self.emojis.get(&emoji.id) {
                    if **existing != *emoji {
                        // Replaced emoji must be indexed again
                        self.searchable.remove(&emoji.id);
                    }
                }
                self.emojis.insert(emoji.id.clone(), emoji.clone());
                ids.push(emoji.id.clone());
            }

            log::debug!("merged custom category {} ({} emoji)", id, ids.len());
            previous = Some((Some(id.clone()), target.clone()));
            merged.push(Category {
                id,
                emojis: ids,
                name: Some(
                    source
                        .name
                        .clone()
                        .unwrap_or_else(|| translations.categories.custom.clone()),
                ),
                icon: source.icon.clone(),
                target,
                custom: true,
            });
        }
        merged
    }
}
