//! End-to-end tests of the catalog session: loading, reloading, search,
//! frequency tracking and persistence, against an in-process fetcher.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use emoji_catalog::data_store::{BundleSource, InitOptions};
use emoji_catalog::fetch::{BundleFetcher, FetchResult};
use emoji_catalog::i18n::Translations;
use emoji_catalog::models::{Bundle, Emoji, Skin};
use emoji_catalog::storage::{Preferences, SqliteStore, DEFAULT_NAMESPACE};
use emoji_catalog::{
    CatalogError, CustomCategory, EmojiCatalog, EmojiVersion, Locale, PlatformSupport, VendorSet,
};
use tempfile::TempDir;

const FIXTURE: &str = r#"{
    "categories": [
        {"id": "people", "emojis": ["grinning", "smile", "smiley", "wave", "melting_face"]},
        {"id": "nature", "emojis": ["cat", "smile_cat"]},
        {"id": "flags", "emojis": ["flag-fr", "pirate_flag"]}
    ],
    "emojis": {
        "grinning": {"id": "grinning", "name": "Grinning Face", "keywords": ["smile", "happy"],
            "skins": [{"unified": "1f600", "native": "😀"}], "version": 1},
        "smile": {"id": "smile", "name": "Grinning Face with Smiling Eyes",
            "emoticons": [":)", "C:", ":-)"], "keywords": ["happy", "joy", "funny"],
            "skins": [{"unified": "1f604", "native": "😄"}], "version": 1},
        "smiley": {"id": "smiley", "name": "Grinning Face with Big Eyes",
            "emoticons": ["=)", "=-)"], "keywords": ["happy", "joy", "haha"],
            "skins": [{"unified": "1f603", "native": "😃"}], "version": 1},
        "wave": {"id": "wave", "name": "Waving Hand", "keywords": ["hello", "bye"],
            "skins": [{"unified": "1f44b", "native": "👋"}, {"unified": "1f44b-1f3fb", "native": "👋🏻"}],
            "version": 1},
        "melting_face": {"id": "melting_face", "name": "Melting Face", "keywords": ["hot", "heat"],
            "skins": [{"unified": "1fae0", "native": "🫠"}], "version": 14},
        "cat": {"id": "cat", "name": "Cat Face", "keywords": ["animal", "meow"],
            "skins": [{"unified": "1f431", "native": "🐱"}], "version": 1},
        "smile_cat": {"id": "smile_cat", "name": "Grinning Cat with Smiling Eyes",
            "keywords": ["animal", "cats"], "skins": [{"unified": "1f638", "native": "😸"}], "version": 1},
        "flag-fr": {"id": "flag-fr", "name": "France Flag", "keywords": ["fr", "flag"],
            "skins": [{"unified": "1f1eb-1f1f7", "native": "🇫🇷"}], "version": 2},
        "pirate_flag": {"id": "pirate_flag", "name": "Pirate Flag", "keywords": ["skull", "crossbones"],
            "skins": [{"unified": "1f3f4-200d-2620-fe0f", "native": "🏴‍☠️"}], "version": 11}
    },
    "aliases": {"waving_hand": "wave"},
    "sheet": {"cols": 61, "rows": 61}
}"#;

struct FixtureFetcher {
    bundle_calls: AtomicUsize,
    delay: Duration,
}

impl FixtureFetcher {
    fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            bundle_calls: AtomicUsize::new(0),
            delay,
        })
    }

    fn calls(&self) -> usize {
        self.bundle_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl BundleFetcher for FixtureFetcher {
    async fn fetch_bundle(&self, _version: EmojiVersion, _set: VendorSet) -> FetchResult<Bundle> {
        self.bundle_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(serde_json::from_str(FIXTURE)?)
    }

    async fn fetch_translations(&self, _locale: Locale) -> FetchResult<Translations> {
        Ok(Translations::english())
    }
}

fn catalog(fetcher: Arc<FixtureFetcher>) -> EmojiCatalog {
    EmojiCatalog::with_parts(fetcher, Preferences::in_memory())
}

fn custom_category() -> CustomCategory {
    CustomCategory {
        id: None,
        name: Some("Team".to_string()),
        icon: None,
        emojis: vec![Emoji {
            id: "party_parrot".to_string(),
            name: "Party Parrot".to_string(),
            aliases: Vec::new(),
            emoticons: Vec::new(),
            keywords: vec!["bird".to_string()],
            skins: vec![Some(Skin::image("https://example.com/parrot.gif".to_string()))],
            version: 1.0,
        }],
    }
}

fn ids(results: Option<Vec<Emoji>>) -> Vec<String> {
    results
        .unwrap_or_default()
        .into_iter()
        .map(|e| e.id)
        .collect()
}

fn category_ids(catalog: &EmojiCatalog) -> Vec<String> {
    catalog.categories().into_iter().map(|c| c.id).collect()
}

// ============================================================
// Initialization
// ============================================================

#[tokio::test]
async fn concurrent_initialize_shares_one_load() {
    let fetcher = FixtureFetcher::new(Duration::from_millis(50));
    let catalog = catalog(fetcher.clone());
    let options = InitOptions {
        custom: vec![custom_category()],
        ..InitOptions::default()
    };

    let (first, second) = tokio::join!(
        catalog.initialize_with(options.clone()),
        catalog.initialize_with(options.clone())
    );
    assert_eq!(first, Ok(()));
    assert_eq!(second, Ok(()));
    assert_eq!(fetcher.calls(), 1);

    let custom: Vec<_> = catalog.categories().into_iter().filter(|c| c.custom).collect();
    assert_eq!(custom.len(), 1);
    assert_eq!(custom[0].id, "custom_1");
    assert_eq!(custom[0].emojis, vec!["party_parrot"]);

    // A reload after completion reapplies rather than appends
    catalog.initialize_with(options).await.unwrap();
    assert_eq!(catalog.categories().iter().filter(|c| c.custom).count(), 1);
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn search_waits_for_in_flight_load() {
    let fetcher = FixtureFetcher::new(Duration::from_millis(50));
    let catalog = catalog(fetcher);

    let mut load = Box::pin(catalog.initialize_with(InitOptions::default()));
    assert!(futures::poll!(&mut load).is_pending());

    let results = catalog.search("cat".to_string(), None).await.unwrap();
    assert_eq!(ids(results), vec!["cat", "smile_cat"]);
    load.await.unwrap();
}

#[tokio::test]
async fn ready_reports_load_failure() {
    let catalog = catalog(FixtureFetcher::new(Duration::ZERO));
    let options = InitOptions {
        data: BundleSource::deferred(|| async {
            Err(CatalogError::FetchError("connection reset".to_string()))
        }),
        ..InitOptions::default()
    };

    assert!(catalog.initialize_with(options).await.is_err());
    assert!(matches!(catalog.ready().await, Err(CatalogError::FetchError(_))));
    assert!(catalog.categories().is_empty());
}

#[tokio::test]
async fn reset_forces_refetch() {
    let fetcher = FixtureFetcher::new(Duration::ZERO);
    let catalog = catalog(fetcher.clone());

    catalog.initialize_with(InitOptions::default()).await.unwrap();
    catalog.reset();
    assert!(catalog.get("smile".to_string()).is_none());

    // After a reset, queries wait for the next load instead of failing
    let mut query = Box::pin(catalog.search("smiley".to_string(), None));
    assert!(futures::poll!(&mut query).is_pending());

    catalog.initialize_with(InitOptions::default()).await.unwrap();
    assert_eq!(ids(query.await.unwrap()), vec!["smiley"]);
    assert_eq!(fetcher.calls(), 2);
    assert!(catalog.get("smile".to_string()).is_some());
}

#[tokio::test]
async fn search_before_initialize_waits_for_first_load() {
    let catalog = Arc::new(catalog(FixtureFetcher::new(Duration::ZERO)));

    let early = {
        let catalog = Arc::clone(&catalog);
        tokio::spawn(async move { catalog.search("smiley".to_string(), None).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!early.is_finished());

    catalog.initialize_with(InitOptions::default()).await.unwrap();
    assert_eq!(ids(early.await.unwrap().unwrap()), vec!["smiley"]);
}

#[tokio::test]
async fn cancelled_initialize_does_not_hold_back_new_options() {
    let fetcher = FixtureFetcher::new(Duration::from_millis(20));
    let catalog = catalog(fetcher.clone());

    let first = tokio::time::timeout(
        Duration::from_millis(5),
        catalog.initialize_with(InitOptions::default()),
    )
    .await;
    assert!(first.is_err());

    // The abandoned load still runs to completion in the background
    tokio::time::sleep(Duration::from_millis(100)).await;

    let options = InitOptions {
        categories: Some(vec!["flags".to_string()]),
        ..InitOptions::default()
    };
    catalog.initialize_with(options).await.unwrap();
    assert_eq!(category_ids(&catalog), vec!["flags"]);
}

// ============================================================
// Categories
// ============================================================

#[tokio::test]
async fn frequent_category_follows_selections() {
    let catalog = catalog(FixtureFetcher::new(Duration::ZERO));
    catalog.initialize_with(InitOptions::default()).await.unwrap();

    // Only "grinning" from the default list exists in the fixture
    let categories = catalog.categories();
    assert_eq!(categories[0].id, "frequent");
    assert_eq!(categories[0].emojis, vec!["grinning"]);

    let picked = catalog.select("waving_hand".to_string(), 2).unwrap();
    assert_eq!(picked.id, "wave");
    assert_eq!(picked.unified.as_deref(), Some("1f44b-1f3fb"));

    catalog.initialize_with(InitOptions::default()).await.unwrap();
    assert_eq!(catalog.categories()[0].emojis, vec!["grinning", "wave"]);
}

#[tokio::test]
async fn selection_not_recorded_without_frequent_rows() {
    let catalog = catalog(FixtureFetcher::new(Duration::ZERO));
    let options = InitOptions {
        max_frequent_rows: 0,
        ..InitOptions::default()
    };
    catalog.initialize_with(options).await.unwrap();
    assert_eq!(category_ids(&catalog), vec!["people", "nature", "flags"]);

    catalog.select("cat".to_string(), 1).unwrap();
    assert!(!catalog.frequent(4, 9).contains(&"cat".to_string()));
}

#[tokio::test]
async fn platform_version_ceiling_hides_newer_emoji() {
    let catalog = catalog(FixtureFetcher::new(Duration::ZERO));
    let options = InitOptions {
        platform: PlatformSupport {
            latest_version: Some(EmojiVersion::V13_1),
            country_flags: false,
        },
        ..InitOptions::default()
    };
    catalog.initialize_with(options).await.unwrap();

    let people = catalog
        .categories()
        .into_iter()
        .find(|c| c.id == "people")
        .unwrap();
    assert!(!people.emojis.contains(&"melting_face".to_string()));

    let flags = catalog
        .categories()
        .into_iter()
        .find(|c| c.id == "flags")
        .unwrap();
    assert_eq!(flags.emojis, vec!["pirate_flag"]);

    assert_eq!(catalog.search("melting".to_string(), None).await, Ok(Some(Vec::new())));
}

#[tokio::test]
async fn category_allow_list_and_icons() {
    let catalog = catalog(FixtureFetcher::new(Duration::ZERO));
    let options = InitOptions {
        categories: Some(vec!["flags".to_string(), "nature".to_string()]),
        category_icons: [("nature".to_string(), "leaf.svg".to_string())]
            .into_iter()
            .collect(),
        ..InitOptions::default()
    };
    catalog.initialize_with(options).await.unwrap();

    let categories = catalog.categories();
    assert_eq!(category_ids(&catalog), vec!["flags", "nature"]);
    assert_eq!(categories[1].icon.as_deref(), Some("leaf.svg"));
}

// ============================================================
// Search & Lookup
// ============================================================

#[tokio::test]
async fn search_ranking() {
    let catalog = catalog(FixtureFetcher::new(Duration::ZERO));
    catalog.initialize_with(InitOptions::default()).await.unwrap();

    assert_eq!(
        ids(catalog.search("smile".to_string(), None).await.unwrap()),
        vec!["smile", "smile_cat", "smiley", "grinning"]
    );
    assert_eq!(
        ids(catalog.search("smile".to_string(), Some(2)).await.unwrap()),
        vec!["smile", "smile_cat"]
    );
    assert_eq!(catalog.search("".to_string(), None).await, Ok(None));
    assert_eq!(catalog.search("unicorn".to_string(), None).await, Ok(Some(Vec::new())));
    assert_eq!(
        ids(catalog.search("grinning cat".to_string(), None).await.unwrap()),
        vec!["smile_cat"]
    );
}

#[tokio::test]
async fn lookups_resolve_ids_aliases_and_natives() {
    let catalog = catalog(FixtureFetcher::new(Duration::ZERO));
    catalog.initialize_with(InitOptions::default()).await.unwrap();

    assert_eq!(catalog.get("waving_hand".to_string()).unwrap().id, "wave");
    assert_eq!(catalog.get("👋🏻".to_string()).unwrap().id, "wave");
    assert!(catalog.get("nope".to_string()).is_none());

    let toned = catalog
        .get_by_shortcodes(":wave::skin-tone-2:".to_string())
        .unwrap();
    assert_eq!(toned.native.as_deref(), Some("👋🏻"));
    assert_eq!(toned.shortcodes.as_deref(), Some(":wave::skin-tone-2:"));
    assert!(catalog.get_by_shortcodes("wave".to_string()).is_none());
}

// ============================================================
// Persistence
// ============================================================

#[tokio::test]
async fn selections_persist_in_sqlite() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("catalog.db");
    let open = |fetcher: Arc<FixtureFetcher>| {
        let store = SqliteStore::open(&path).unwrap();
        EmojiCatalog::with_parts(fetcher, Preferences::new(Arc::new(store), DEFAULT_NAMESPACE))
    };

    {
        let catalog = open(FixtureFetcher::new(Duration::ZERO));
        catalog.initialize_with(InitOptions::default()).await.unwrap();
        for _ in 0..20 {
            catalog.select("cat".to_string(), 1).unwrap();
        }
    }

    let catalog = open(FixtureFetcher::new(Duration::ZERO));
    assert_eq!(catalog.frequent(4, 9)[0], "cat");
}
