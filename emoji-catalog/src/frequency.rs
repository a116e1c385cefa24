//! Frequently-used emoji tracking
//!
//! Usage counts live in a persisted map (`<namespace>.frequently`) next to the
//! id of the last pick (`<namespace>.last`). The map is pruned to the visible
//! capacity whenever it outgrows it, but the last pick always survives.

use std::collections::BTreeMap;

use crate::storage::Preferences;

const INDEX_KEY: &str = "frequently";
const LAST_KEY: &str = "last";

/// Shown, in this order, before the user has picked anything.
pub const DEFAULT_FREQUENT: [&str; 15] = [
    "+1",
    "grinning",
    "kissing_heart",
    "heart_eyes",
    "laughing",
    "stuck_out_tongue_winking_eye",
    "sweat_smile",
    "joy",
    "scream",
    "disappointed",
    "unamused",
    "weary",
    "sob",
    "sunglasses",
    "heart",
];

pub struct FrequencyTracker {
    prefs: Preferences,
    /// Lazily loaded copy of the persisted map
    index: Option<BTreeMap<String, u64>>,
}

impl FrequencyTracker {
    pub fn new(prefs: Preferences) -> Self {
        Self { prefs, index: None }
    }

    fn load(&mut self) -> &mut Option<BTreeMap<String, u64>> {
        if self.index.is_none() {
            self.index = self.prefs.get(INDEX_KEY);
        }
        &mut self.index
    }

    /// Count one pick of `emoji_id` and remember it as the last one.
    pub fn record(&mut self, emoji_id: &str) {
        if emoji_id.is_empty() {
            return;
        }
        let index = self.load().get_or_insert_with(BTreeMap::new);
        *index.entry(emoji_id.to_string()).or_insert(0) += 1;
        let snapshot = index.clone();

        self.prefs.set(LAST_KEY, emoji_id);
        self.prefs.set(INDEX_KEY, &snapshot);
    }

    pub fn count(&mut self, emoji_id: &str) -> u64 {
        self.load()
            .as_ref()
            .and_then(|index| index.get(emoji_id).copied())
            .unwrap_or(0)
    }

    pub fn last_used(&self) -> Option<String> {
        self.prefs.get(LAST_KEY)
    }

    /// Ids for the "frequent" category, at most `max_rows * per_line` long.
    ///
    /// Ranked by descending count, ties by ascending id. Ids past the
    /// capacity are evicted from storage, except the last pick, which
    /// replaces the lowest-ranked survivor if it fell off. A zero capacity
    /// shows nothing and leaves the stored history alone.
    pub fn top_n(&mut self, max_rows: u32, per_line: u32) -> Vec<String> {
        if max_rows == 0 || per_line == 0 {
            return Vec::new();
        }

        if self.load().is_none() {
            let seeded: Vec<String> = DEFAULT_FREQUENT
                .iter()
                .take(per_line as usize)
                .map(|id| id.to_string())
                .collect();
            let scores = seeded
                .iter()
                .enumerate()
                .map(|(i, id)| (id.clone(), u64::from(per_line) - i as u64))
                .collect();
            self.index = Some(scores);
            return seeded;
        }

        let max = (max_rows as usize).saturating_mul(per_line as usize);
        let mut ranked: Vec<(String, u64)> = self
            .index
            .iter()
            .flatten()
            .map(|(id, count)| (id.clone(), *count))
            .collect();
        ranked.sort_by(|(a_id, a_count), (b_id, b_count)| {
            b_count.cmp(a_count).then_with(|| a_id.cmp(b_id))
        });
        let mut ids: Vec<String> = ranked.into_iter().map(|(id, _)| id).collect();

        if ids.len() <= max {
            return ids;
        }

        let last: Option<String> = self.prefs.get(LAST_KEY);
        let Some(index) = self.index.as_mut() else {
            return ids;
        };

        for removed in ids.split_off(max) {
            if Some(&removed) == last.as_ref() {
                continue;
            }
            index.remove(&removed);
        }

        if let Some(last) = last {
            if !ids.contains(&last) {
                if let Some(tail) = ids.last_mut() {
                    index.remove(tail.as_str());
                    *tail = last;
                }
            }
        }

        let snapshot = index.clone();
        self.prefs.set(INDEX_KEY, &snapshot);
        ids
    }
}
