// Weft - A content substitution and markup rewrite engine
// Copyright (C) 2026 Weft Project Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::collections::HashMap;
use std::sync::RwLock;

use weft_core::models::Entry;

/// In-process cache for resolved entries and localized bodies.
///
/// Owned by the resolver, never a global. Translation misses are
/// recorded as `None` so a key without a variant is not re-queried
/// within the same lifetime. The write path clears the cache through
/// [`ResolutionCache::invalidate`].
///
/// Locks are only held for map access, never across awaits.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: RwLock<HashMap<String, Entry>>,
    translations: RwLock<HashMap<(i64, i64), Option<String>>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Of `keys`, those not yet cached.
    pub fn missing_keys(&self, keys: &[String]) -> Vec<String> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());

        keys.iter()
            .filter(|k| !entries.contains_key(*k))
            .cloned()
            .collect()
    }

    pub fn insert_entries(&self, loaded: HashMap<String, Entry>) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.extend(loaded);
    }

    /// Cached entries among `keys`; silently skips unknown keys.
    pub fn entries_for(&self, keys: &[String]) -> HashMap<String, Entry> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());

        keys.iter()
            .filter_map(|k| entries.get(k).map(|e| (k.clone(), e.clone())))
            .collect()
    }

    /// Of `entry_ids`, those without a cached translation outcome for
    /// `locale_id` (a recorded miss counts as cached).
    pub fn missing_translations(&self, entry_ids: &[i64], locale_id: i64) -> Vec<i64> {
        let translations = self.translations.read().unwrap_or_else(|e| e.into_inner());

        entry_ids
            .iter()
            .filter(|id| !translations.contains_key(&(**id, locale_id)))
            .copied()
            .collect()
    }

    pub fn insert_translation(&self, entry_id: i64, locale_id: i64, body: Option<String>) {
        let mut translations = self.translations.write().unwrap_or_else(|e| e.into_inner());
        translations.insert((entry_id, locale_id), body);
    }

    /// Non-empty cached translations among `entry_ids`.
    pub fn translations_for(&self, entry_ids: &[i64], locale_id: i64) -> HashMap<i64, String> {
        let translations = self.translations.read().unwrap_or_else(|e| e.into_inner());

        entry_ids
            .iter()
            .filter_map(|id| {
                translations
                    .get(&(*id, locale_id))
                    .and_then(|body| body.clone())
                    .filter(|body| !body.is_empty())
                    .map(|body| (*id, body))
            })
            .collect()
    }

    /// Drop everything; called after writes to the backing store.
    pub fn invalidate(&self) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        self.translations
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}
