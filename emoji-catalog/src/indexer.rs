//! Search index construction
//!
//! Each emoji is reduced to an ordered list of lowercase words: id, name
//! words, keywords, emoticons, then the native string of every skin. Ranking
//! depends on the position of a word inside the comma-joined form of that
//! list (`,id,name,words,...`), so every word is stored with the UTF-16
//! offset of its leading comma. Field order is therefore part of the ranking
//! contract.
//!
//! Words are kept in an ordered map so a query token can be answered with a
//! prefix range scan instead of scanning every emoji.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Bound;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Emoji;

/// Separators inside a display name.
static NAME_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-|_\s]+").expect("valid name split regex"));

/// Location of one word inside an emoji's joined search string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Posting {
    pub(crate) entry: u32,
    /// UTF-16 offset of the comma preceding the word
    pub(crate) offset: u32,
}

#[derive(Debug)]
pub(crate) struct IndexEntry {
    pub(crate) emoji: Arc<Emoji>,
    pub(crate) search: String,
}

/// Immutable search index over a fixed pool of emoji.
#[derive(Debug, Default)]
pub struct SearchIndex {
    pub(crate) entries: Vec<IndexEntry>,
    pub(crate) tokens: BTreeMap<String, Vec<Posting>>,
    by_id: HashMap<String, u32>,
}

impl SearchIndex {
    /// Build an index over `emojis`. Later duplicates of an id are ignored.
    pub fn build<'a>(emojis: impl IntoIterator<Item = &'a Arc<Emoji>>) -> Self {
        let mut index = Self::default();
        let mut seen = HashSet::new();

        for emoji in emojis {
            if !seen.insert(emoji.id.as_str()) {
                continue;
            }
            let entry = index.entries.len() as u32;
            let words = search_words(emoji);

            let mut offset: u32 = 0;
            for word in &words {
                let postings = index.tokens.entry(word.clone()).or_default();
                // First occurrence is the lowest offset for this emoji
                if postings.last().map(|p| p.entry) != Some(entry) {
                    postings.push(Posting { entry, offset });
                }
                offset += 1 + word.encode_utf16().count() as u32;
            }

            let mut search = String::new();
            for word in &words {
                search.push(',');
                search.push_str(word);
            }

            index.by_id.insert(emoji.id.clone(), entry);
            index.entries.push(IndexEntry {
                emoji: Arc::clone(emoji),
                search,
            });
        }

        log::debug!(
            "search index built: {} emoji, {} distinct words",
            index.entries.len(),
            index.tokens.len()
        );
        index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// The comma-joined search string derived for `id`.
    pub fn search_text(&self, id: &str) -> Option<&str> {
        let entry = *self.by_id.get(id)?;
        self.entries
            .get(entry as usize)
            .map(|e| e.search.as_str())
    }

    /// Lowest offset per entry of any word starting with `token`.
    pub(crate) fn prefix_matches(&self, token: &str) -> HashMap<u32, u32> {
        let mut matches: HashMap<u32, u32> = HashMap::new();
        let range = self
            .tokens
            .range::<str, _>((Bound::Included(token), Bound::Unbounded))
            .take_while(|(word, _)| word.starts_with(token));

        for (_, postings) in range {
            for posting in postings {
                matches
                    .entry(posting.entry)
                    .and_modify(|best| *best = (*best).min(posting.offset))
                    .or_insert(posting.offset);
            }
        }
        matches
    }
}

/// Ordered search words for one emoji.
pub fn search_words(emoji: &Emoji) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();

    words.push(emoji.id.to_lowercase());
    words.extend(NAME_SPLIT.split(&emoji.name).map(str::to_lowercase));
    words.extend(emoji.keywords.iter().map(|k| k.to_lowercase()));
    words.extend(emoji.emoticons.iter().map(|e| e.to_lowercase()));
    words.retain(|w| !w.trim().is_empty());

    words.extend(emoji.natives().map(str::to_string));
    words
}
