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

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::Arc;

use weft_core::models::Entry;

use crate::cache::ResolutionCache;
use crate::store::ContentStore;

/// Batch-loading front for the content store.
///
/// However many distinct placeholders a render contains, at most one
/// store query per batch goes out; everything else is served from the
/// cache.
pub struct ContentResolver {
    store: Arc<dyn ContentStore>,
    cache: ResolutionCache,
}

impl ContentResolver {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            store,
            cache: ResolutionCache::new(),
        }
    }

    /// Resolve `keys` against cache and store. Missing keys are simply
    /// absent from the result.
    pub async fn resolve_batch(&self, keys: &[String]) -> Result<HashMap<String, Entry>> {
        let missing = self.cache.missing_keys(keys);

        if !missing.is_empty() {
            let loaded = self
                .store
                .find_by_keys(&missing)
                .await
                .context("Failed to batch-load entries")?;

            tracing::debug!(requested = missing.len(), found = loaded.len(), "loaded entries");

            self.cache.insert_entries(loaded);
        }

        Ok(self.cache.entries_for(keys))
    }

    /// Resolve localized bodies for `entry_ids`. A store miss is cached
    /// as a miss so it is not re-queried within this cache's lifetime.
    pub async fn resolve_translations(
        &self,
        entry_ids: &[i64],
        locale_id: i64,
    ) -> Result<HashMap<i64, String>> {
        if entry_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let missing = self.cache.missing_translations(entry_ids, locale_id);

        if !missing.is_empty() {
            let loaded = self
                .store
                .find_translations(&missing, locale_id)
                .await
                .context("Failed to batch-load translations")?;

            for id in &missing {
                self.cache
                    .insert_translation(*id, locale_id, loaded.get(id).cloned());
            }
        }

        Ok(self.cache.translations_for(entry_ids, locale_id))
    }

    /// Clear the cache; the write path calls this after every entry
    /// creation or update.
    pub fn invalidate(&self) {
        self.cache.invalidate();
    }
}
