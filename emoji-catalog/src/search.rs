//! Free-text emoji search
//!
//! Query tokens progressively narrow the pool: an emoji survives a token if
//! one of its search words starts with it. Each surviving emoji accumulates
//! the offset of the first such word (+1), or nothing when the token is its
//! exact id. Lowest total wins, ties go to the lexically smaller id.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::indexer::SearchIndex;
use crate::models::Emoji;

/// Default cap on returned results.
pub const DEFAULT_MAX_RESULTS: usize = 90;

/// First hyphen that follows a word character (`high-five` → `high five`).
static COMPOUND_HYPHEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z0-9_])-").expect("valid hyphen regex"));

static QUERY_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s|,]+").expect("valid query split regex"));

/// Lowercased, de-duplicated query tokens in input order.
pub fn tokenize_query(query: &str) -> Vec<String> {
    let lowered = query.to_lowercase();
    let rewritten = COMPOUND_HYPHEN.replacen(&lowered, 1, "$1 ");

    let mut seen = HashSet::new();
    QUERY_SPLIT
        .split(&rewritten)
        .filter(|word| !word.trim().is_empty())
        .filter(|word| seen.insert(word.to_string()))
        .map(str::to_string)
        .collect()
}

impl SearchIndex {
    /// Ranked matches for `query`.
    ///
    /// Returns `None` for a query without any token, `Some(vec![])` when
    /// nothing matches.
    pub fn search(&self, query: &str, max_results: usize) -> Option<Vec<Arc<Emoji>>> {
        if query.trim().is_empty() {
            return None;
        }
        let tokens = tokenize_query(query);
        if tokens.is_empty() {
            return None;
        }

        let mut pool: Option<HashMap<u32, u64>> = None;
        for token in &tokens {
            if pool.as_ref().is_some_and(|p| p.is_empty()) {
                break;
            }
            let matches = self.prefix_matches(token);

            let mut next: HashMap<u32, u64> = HashMap::with_capacity(matches.len());
            for (entry, offset) in matches {
                let previous = match &pool {
                    Some(pool) => match pool.get(&entry) {
                        Some(score) => *score,
                        None => continue,
                    },
                    None => 0,
                };
                let emoji = &self.entries[entry as usize].emoji;
                let contribution = if emoji.id == *token {
                    0
                } else {
                    u64::from(offset) + 1
                };
                next.insert(entry, previous + contribution);
            }
            pool = Some(next);
        }

        let mut ranked: Vec<(u64, &Arc<Emoji>)> = pool
            .unwrap_or_default()
            .into_iter()
            .map(|(entry, score)| (score, &self.entries[entry as usize].emoji))
            .collect();
        ranked.sort_by(|(a_score, a), (b_score, b)| {
            a_score.cmp(b_score).then_with(|| a.id.cmp(&b.id))
        });
        ranked.truncate(max_results);

        Some(ranked.into_iter().map(|(_, emoji)| Arc::clone(emoji)).collect())
    }
}
