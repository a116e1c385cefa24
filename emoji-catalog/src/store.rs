//! EmojiCatalog - Main API for the picker UI
//!
//! One catalog is one picker session: it owns the data store, the search
//! index and the frequency tracker, and is exported through UniFFI.
//!
//! Initialization Model:
//! Loads run as tasks on a tokio runtime and are wrapped in a `Shared`
//! future. While a load is in flight every `initialize`/`ready` caller
//! awaits that same future and observes the same outcome. The task marks
//! its load finished itself, so the next `initialize` starts a fresh load
//! with its options even if every earlier caller was dropped.
//! Callers that arrive before any load has started park until one does.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::data_store::{DataStore, InitOptions, DEFAULT_MAX_FREQUENT_ROWS};
use crate::fetch::{BundleFetcher, HttpFetcher};
use crate::i18n::Translations;
use crate::interface::{CatalogError, CatalogOptions, CatalogResult, EmojiSelection, VendorSet};
use crate::models::{Category, Emoji};
use crate::search::DEFAULT_MAX_RESULTS;
use crate::storage::{Preferences, SqliteStore, DEFAULT_NAMESPACE};

/// Version of the per-vendor image packages on the CDN
const DATASOURCE_VERSION: &str = "14.0.0";

/// Global fallback Tokio runtime for when async functions are called outside any runtime context.
/// Shared across all EmojiCatalog instances and never dropped.
static FALLBACK_RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create fallback tokio runtime")
});

type SharedLoad = Shared<BoxFuture<'static, CatalogResult<()>>>;

#[derive(Clone)]
struct Load {
    outcome: SharedLoad,
    /// Set by the load task, whether or not anyone is still awaiting it
    finished: Arc<AtomicBool>,
}

struct Session {
    data: DataStore,
    /// Most recent load, finished or not
    load: Mutex<Option<Load>>,
    /// Wakes callers parked before the first load
    started: Notify,
    /// Row limit of the most recent load; selections are recorded when > 0
    max_frequent_rows: AtomicU32,
}

/// Thread-safe emoji catalog
#[derive(uniffi::Object)]
pub struct EmojiCatalog {
    session: Arc<Session>,
}

// Internal implementation (not exported via FFI)
impl EmojiCatalog {
    /// Catalog over an arbitrary preferences store and fetcher
    pub fn with_parts(fetcher: Arc<dyn BundleFetcher>, prefs: Preferences) -> Self {
        Self {
            session: Arc::new(Session {
                data: DataStore::new(fetcher, prefs),
                load: Mutex::new(None),
                started: Notify::new(),
                max_frequent_rows: AtomicU32::new(DEFAULT_MAX_FREQUENT_ROWS),
            }),
        }
    }

    /// Get a tokio runtime handle - uses current runtime if available, otherwise global fallback
    fn runtime_handle(&self) -> tokio::runtime::Handle {
        tokio::runtime::Handle::try_current()
            .unwrap_or_else(|_| FALLBACK_RUNTIME.handle().clone())
    }

    /// Join the in-flight load, or start one with `options`.
    pub async fn initialize_with(&self, options: InitOptions) -> CatalogResult<()> {
        let load = {
            let mut slot = self.session.load.lock();
            match slot.as_ref() {
                Some(load) if !load.finished.load(Ordering::SeqCst) => load.clone(),
                _ => {
                    let load = self.spawn_load(options);
                    *slot = Some(load.clone());
                    self.session.started.notify_waiters();
                    load
                }
            }
        };
        load.outcome.await
    }

    fn spawn_load(&self, options: InitOptions) -> Load {
        let session = Arc::clone(&self.session);
        let finished = Arc::new(AtomicBool::new(false));
        let done = Arc::clone(&finished);
        let handle = self.runtime_handle().spawn(async move {
            let result = session.data.load(&options).await.map(|outcome| {
                session
                    .max_frequent_rows
                    .store(options.max_frequent_rows, Ordering::SeqCst);
                log::debug!(
                    "catalog loaded: {} categories, index rebuilt: {}",
                    outcome.categories,
                    outcome.rebuilt
                );
            });
            done.store(true, Ordering::SeqCst);
            result
        });

        let aborted = Arc::clone(&finished);
        let outcome = async move {
            match handle.await {
                Ok(result) => result,
                Err(_join_error) => {
                    aborted.store(true, Ordering::SeqCst);
                    Err(CatalogError::Interrupted)
                }
            }
        }
        .boxed()
        .shared();
        Load { outcome, finished }
    }

    fn record_if_tracking(&self, emoji_id: &str) {
        if self.session.max_frequent_rows.load(Ordering::SeqCst) > 0 {
            self.session.data.record(emoji_id);
        }
    }

    pub fn get_shared(&self, key: &str) -> Option<Arc<Emoji>> {
        self.session.data.current()?.get(key)
    }
}

// FFI-exported constructors (must be in standalone impl block)
#[uniffi::export]
impl EmojiCatalog {
    /// Create a catalog persisting preferences in a database at the given path
    #[uniffi::constructor]
    pub fn new(db_path: String) -> Result<Self, CatalogError> {
        let store = SqliteStore::open(PathBuf::from(db_path))?;
        Ok(Self::with_parts(
            Arc::new(HttpFetcher::default()),
            Preferences::new(Arc::new(store), DEFAULT_NAMESPACE),
        ))
    }

    /// Create a catalog whose preferences live only as long as it does
    #[uniffi::constructor]
    pub fn new_in_memory() -> Self {
        Self::with_parts(Arc::new(HttpFetcher::default()), Preferences::in_memory())
    }
}

#[uniffi::export]
impl EmojiCatalog {
    // ─────────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────────

    /// Load (or reload) the catalog. Concurrent calls share one load.
    pub async fn initialize(&self, options: CatalogOptions) -> Result<(), CatalogError> {
        let options = InitOptions::try_from(options)?;
        self.initialize_with(options).await
    }

    /// Wait for the current load to finish, or for the first one to start
    pub async fn ready(&self) -> Result<(), CatalogError> {
        let load = loop {
            let started = {
                let slot = self.session.load.lock();
                match slot.as_ref() {
                    Some(load) => break load.outcome.clone(),
                    // registered under the lock so a concurrent start can't be missed
                    None => self.session.started.notified(),
                }
            };
            started.await;
        };
        load.await
    }

    /// Drop all loaded data; the next `initialize` fetches again
    pub fn reset(&self) {
        *self.session.load.lock() = None;
        self.session.data.reset();
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Read Operations
    // ─────────────────────────────────────────────────────────────────────────────

    /// Ranked search. `None` for a blank query, empty for no matches.
    /// Waits for the load to finish, or to start if none has.
    pub async fn search(
        &self,
        query: String,
        max_results: Option<u32>,
    ) -> Result<Option<Vec<Emoji>>, CatalogError> {
        if query.trim().is_empty() {
            return Ok(None);
        }
        self.ready().await?;

        let state = self
            .session
            .data
            .current()
            .ok_or(CatalogError::NotInitialized)?;
        let max_results = max_results
            .filter(|n| *n > 0)
            .map_or(DEFAULT_MAX_RESULTS, |n| n as usize);

        Ok(state
            .index
            .search(&query, max_results)
            .map(|results| results.iter().map(|e| Emoji::clone(e)).collect()))
    }

    /// Look up by id, alias or native string
    pub fn get(&self, key: String) -> Option<Emoji> {
        self.get_shared(&key).map(|e| Emoji::clone(&e))
    }

    /// Look up `:id:` or `:id::skin-tone-N:`
    pub fn get_by_shortcodes(&self, shortcodes: String) -> Option<EmojiSelection> {
        let state = self.session.data.current()?;
        let (emoji, skin) = state.get_by_shortcodes(&shortcodes)?;
        Some(selection(&emoji, skin))
    }

    /// Categories of the current load, in display order
    pub fn categories(&self) -> Vec<Category> {
        self.session
            .data
            .current()
            .map(|state| state.categories.clone())
            .unwrap_or_default()
    }

    /// Strings of the current load; English before any load
    pub fn translations(&self) -> Translations {
        self.session
            .data
            .current()
            .map(|state| state.translations.clone())
            .unwrap_or_default()
    }

    pub fn frequent(&self, max_rows: u32, per_line: u32) -> Vec<String> {
        self.session.data.frequent(max_rows, per_line)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Write Operations
    // ─────────────────────────────────────────────────────────────────────────────

    /// Count one use of `emoji_id`
    pub fn record_selection(&self, emoji_id: String) {
        self.session.data.record(&emoji_id);
    }

    /// Build the payload for a pick of `key` at a 1-based tone and record it
    pub fn select(&self, key: String, skin: u8) -> Option<EmojiSelection> {
        let emoji = self.get_shared(&key)?;
        let picked = selection(&emoji, skin);
        self.record_if_tracking(&picked.id);
        Some(picked)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Asset Locations
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn image_url(&self, set: VendorSet, unified: String) -> String {
        image_url(set, &unified)
    }

    pub fn spritesheet_url(&self, set: VendorSet) -> String {
        spritesheet_url(set)
    }
}

/// Selection payload for `emoji` rendered at a 1-based tone.
pub fn selection(emoji: &Emoji, tone: u8) -> EmojiSelection {
    let skin = emoji.skin(tone);
    let rendered = if tone > 1 && skin != emoji.default_skin() {
        tone
    } else {
        1
    };

    EmojiSelection {
        id: emoji.id.clone(),
        name: emoji.name.clone(),
        native: skin.and_then(|s| s.native.clone()),
        unified: skin.and_then(|s| s.unified.clone()),
        keywords: emoji.keywords.clone(),
        shortcodes: skin.and_then(|s| s.shortcodes.clone()),
        src: skin.and_then(|s| s.src.clone()),
        aliases: emoji.aliases.clone(),
        emoticons: emoji.emoticons.clone(),
        skin: rendered,
    }
}

/// Default per-glyph image for a sprite-sheet set
pub fn image_url(set: VendorSet, unified: &str) -> String {
    format!(
        "https://cdn.jsdelivr.net/npm/emoji-datasource-{set}@{DATASOURCE_VERSION}/img/{set}/64/{unified}.png"
    )
}

pub fn spritesheet_url(set: VendorSet) -> String {
    format!(
        "https://cdn.jsdelivr.net/npm/emoji-datasource-{set}@{DATASOURCE_VERSION}/img/{set}/sheets-256/64.png"
    )
}
