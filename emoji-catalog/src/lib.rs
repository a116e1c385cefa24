//! Emoji Catalog - Rust core for an emoji picker
//!
//! Loads published emoji bundles, derives per-session category views,
//! ranks free-text searches and tracks frequently used emoji.
//!
//! Types are exported via UniFFI proc-macros (#[derive(uniffi::Record/Enum)]).

pub mod data_store;
pub mod fetch;
pub mod frequency;
pub mod i18n;
mod indexer;
pub mod interface;
pub mod models;
pub mod search;
pub mod storage;
mod store;

pub use indexer::{search_words, SearchIndex};
pub use interface::*;
pub use store::{image_url, selection, spritesheet_url, EmojiCatalog};

uniffi::setup_scaffolding!("emoji_catalog");
