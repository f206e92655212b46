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

//! In-memory collaborator implementations for engine tests.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use weft_core::models::{Entry, RenderContext, RewriteRule, Surface, Term};

use crate::store::{AuditSink, CapabilityCheck, ContentStore, EditGuard, RuleStore, TermStore};

/// Content store fixture that counts queries and can be told to fail.
#[derive(Default)]
pub struct CountingStore {
    entries: HashMap<String, Entry>,
    translations: HashMap<(i64, i64), String>,
    batch_queries: AtomicUsize,
    translation_queries: AtomicUsize,
    fail: bool,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry(&mut self, entry: Entry) {
        self.entries.insert(entry.key.clone(), entry);
    }

    pub fn add_translation(&mut self, entry_id: i64, locale_id: i64, body: &str) {
        self.translations
            .insert((entry_id, locale_id), body.to_string());
    }

    pub fn fail_batches(&mut self) {
        self.fail = true;
    }

    pub fn batch_queries(&self) -> usize {
        self.batch_queries.load(Ordering::SeqCst)
    }

    pub fn translation_queries(&self) -> usize {
        self.translation_queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentStore for CountingStore {
    async fn find_by_key(&self, key: &str) -> Result<Option<Entry>> {
        if self.fail {
            bail!("store down");
        }

        Ok(self.entries.get(key).cloned())
    }

    async fn find_by_keys(&self, keys: &[String]) -> Result<HashMap<String, Entry>> {
        self.batch_queries.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            bail!("store down");
        }

        Ok(keys
            .iter()
            .filter_map(|k| self.entries.get(k).map(|e| (k.clone(), e.clone())))
            .collect())
    }

    async fn find_translations(
        &self,
        entry_ids: &[i64],
        locale_id: i64,
    ) -> Result<HashMap<i64, String>> {
        self.translation_queries.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            bail!("store down");
        }

        Ok(entry_ids
            .iter()
            .filter_map(|id| {
                self.translations
                    .get(&(*id, locale_id))
                    .map(|body| (*id, body.clone()))
            })
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryRuleStore {
    pub rules: Vec<RewriteRule>,
}

#[async_trait]
impl RuleStore for MemoryRuleStore {
    async fn find_active(&self, surface: Surface) -> Result<Vec<RewriteRule>> {
        Ok(self
            .rules
            .iter()
            .filter(|r| r.active && r.scope.surface.allows(surface))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryTermStore {
    pub terms: Vec<Term>,
}

#[async_trait]
impl TermStore for MemoryTermStore {
    async fn find_active(&self, surface: Surface) -> Result<Vec<Term>> {
        Ok(self
            .terms
            .iter()
            .filter(|t| t.active && t.scope.surface.allows(surface))
            .cloned()
            .collect())
    }
}

/// Audit sink fixture recording (entry key, actor) pairs.
#[derive(Default)]
pub struct RecordingAudit {
    pub executions: Mutex<Vec<(String, String)>>,
}

impl RecordingAudit {
    pub fn recorded(&self) -> Vec<(String, String)> {
        self.executions.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl AuditSink for RecordingAudit {
    async fn record_execution(&self, entry: &Entry, ctx: &RenderContext) -> Result<()> {
        self.executions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((
                entry.key.clone(),
                ctx.actor.clone().unwrap_or_else(|| "system".to_string()),
            ));
        Ok(())
    }
}

pub struct NeverEditing;

impl EditGuard for NeverEditing {
    fn is_edit_context(&self, _ctx: &RenderContext) -> bool {
        false
    }
}

pub struct AlwaysEditing;

impl EditGuard for AlwaysEditing {
    fn is_edit_context(&self, _ctx: &RenderContext) -> bool {
        true
    }
}

pub struct Capability(pub bool);

impl CapabilityCheck for Capability {
    fn can_execute_privileged(&self) -> bool {
        self.0
    }
}
