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

//! Placeholder replacement over outgoing renders.
//!
//! One batch query loads every referenced entry, one more loads the
//! localized bodies, then a single linear pass substitutes all
//! occurrences. A broken reference resolves to empty output (or an
//! inline diagnostic in debug mode) and never aborts the page.

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::sync::Arc;

use weft_core::filters;
use weft_core::models::{ContentKind, Entry, RenderContext};
use weft_core::parser::{self, PlaceholderMatch};
use weft_core::utils::escape::escape_html;

use crate::config::EngineConfig;
use crate::error::RenderFailure;
use crate::resolver::ContentResolver;
use crate::store::{AuditSink, CapabilityCheck, ContentStore, EditGuard};

const TOKEN_PREFIX: &str = "[[snippet:";

pub struct ReplacementEngine {
    resolver: ContentResolver,
    edit_guard: Arc<dyn EditGuard>,
    capability: Arc<dyn CapabilityCheck>,
    audit: Arc<dyn AuditSink>,
    config: EngineConfig,
}

impl ReplacementEngine {
    pub fn new(
        store: Arc<dyn ContentStore>,
        edit_guard: Arc<dyn EditGuard>,
        capability: Arc<dyn CapabilityCheck>,
        audit: Arc<dyn AuditSink>,
        config: EngineConfig,
    ) -> Self {
        Self {
            resolver: ContentResolver::new(store),
            edit_guard,
            capability,
            audit,
            config,
        }
    }

    pub fn resolver(&self) -> &ContentResolver {
        &self.resolver
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replace every placeholder in `content`. Never fails: a store
    /// outage returns the content unchanged, a broken single match
    /// degrades to empty output.
    pub async fn replace(&self, content: &str, ctx: &RenderContext) -> String {
        if !content.contains(TOKEN_PREFIX) {
            return content.to_string();
        }

        // Never rewrite content a human is actively editing
        if self.edit_guard.is_edit_context(ctx) {
            return content.to_string();
        }

        let matches = parser::find_all(content);

        if matches.is_empty() {
            return content.to_string();
        }

        let mut keys: Vec<String> = Vec::new();
        for m in &matches {
            if !keys.contains(&m.key) {
                keys.push(m.key.clone());
            }
        }

        let entries = match self.resolver.resolve_batch(&keys).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!(error = ?e, "content store unavailable, leaving text unchanged");
                return content.to_string();
            }
        };

        let multilang_ids: Vec<i64> = entries
            .values()
            .filter(|e| e.multilang)
            .filter_map(|e| e.id)
            .collect();

        let translations = match self
            .resolver
            .resolve_translations(&multilang_ids, ctx.locale_id)
            .await
        {
            Ok(translations) => translations,
            Err(e) => {
                tracing::error!(error = ?e, "translation store unavailable, leaving text unchanged");
                return content.to_string();
            }
        };

        let mut replacements: HashMap<String, String> = HashMap::new();

        for m in &matches {
            // duplicate identical matches reuse one computed value
            if replacements.contains_key(&m.full_match) {
                continue;
            }

            let value = self.render_match(m, &entries, &translations, ctx).await;
            replacements.insert(m.full_match.clone(), value);
        }

        parser::substitute(content, &replacements)
    }

    async fn render_match(
        &self,
        m: &PlaceholderMatch,
        entries: &HashMap<String, Entry>,
        translations: &HashMap<i64, String>,
        ctx: &RenderContext,
    ) -> String {
        let Some(entry) = entries.get(&m.key) else {
            return self.failure_output(&RenderFailure::ReferenceNotFound(m.key.clone()));
        };

        if !entry.active {
            return String::new();
        }

        if !entry.surface.allows(ctx.surface) {
            return String::new();
        }

        let body = self.body_for(entry, translations);

        if body.is_empty() {
            return String::new();
        }

        let rendered = match entry.kind {
            ContentKind::Markup | ContentKind::PlainText => render_template(&body, &m.params),
            ContentKind::Executable => self.render_privileged(entry, &body, &m.params, ctx).await,
        };

        filters::apply(rendered, &m.filters)
    }

    /// Localized variant if one was resolved, default body otherwise.
    fn body_for(&self, entry: &Entry, translations: &HashMap<i64, String>) -> String {
        if entry.multilang {
            if let Some(body) = entry.id.and_then(|id| translations.get(&id)) {
                return body.clone();
            }
        }

        entry.body.clone()
    }

    /// Render an `executable` entry in a restricted substitution scope
    /// exposing only the resolved parameters and the entry key. Gated by
    /// the capability check; every execution leaves an audit record.
    async fn render_privileged(
        &self,
        entry: &Entry,
        body: &str,
        params: &[(String, String)],
        ctx: &RenderContext,
    ) -> String {
        if !self.capability.can_execute_privileged() {
            tracing::warn!(
                key = %entry.key,
                "attempt to render executable entry without capability"
            );
            return String::new();
        }

        if let Err(e) = self.audit.record_execution(entry, ctx).await {
            // no audit record, no execution
            tracing::error!(error = ?e, key = %entry.key, "audit sink failed, suppressing output");
            return String::new();
        }

        render_restricted(body, params, &entry.key)
    }

    /// Render one entry by key without filter processing; used by the
    /// short-form API.
    pub(crate) async fn render_single(
        &self,
        key: &str,
        params: &[(String, String)],
        ctx: &RenderContext,
    ) -> Result<String> {
        let keys = vec![key.to_string()];
        let entries = self.resolver.resolve_batch(&keys).await?;

        let entry = entries
            .get(key)
            .ok_or_else(|| anyhow!(RenderFailure::ReferenceNotFound(key.to_string())))?;

        if !entry.active || !entry.surface.allows(ctx.surface) {
            return Ok(String::new());
        }

        let translations = match entry.id {
            Some(id) if entry.multilang => {
                self.resolver
                    .resolve_translations(&[id], ctx.locale_id)
                    .await?
            }
            _ => HashMap::new(),
        };

        let body = self.body_for(entry, &translations);

        if body.is_empty() {
            return Ok(String::new());
        }

        Ok(match entry.kind {
            ContentKind::Markup | ContentKind::PlainText => render_template(&body, params),
            ContentKind::Executable => self.render_privileged(entry, &body, params, ctx).await,
        })
    }

    pub(crate) fn failure_output(&self, failure: &RenderFailure) -> String {
        if self.config.debug_mode {
            return format!("<!-- weft: {} -->", escape_html(&failure.to_string()));
        }

        String::new()
    }
}

/// `{name}`-style parameter substitution with escaping, for markup and
/// plain-text entries.
fn render_template(body: &str, params: &[(String, String)]) -> String {
    let mut rendered = body.to_string();

    for (name, value) in params {
        rendered = rendered.replace(&format!("{{{}}}", name), &escape_html(value));
    }

    rendered
}

/// Restricted scope for executable entries: the resolved parameters and
/// the entry key, substituted without escaping.
fn render_restricted(body: &str, params: &[(String, String)], key: &str) -> String {
    let mut rendered = body.to_string();

    for (name, value) in params {
        rendered = rendered.replace(&format!("{{{}}}", name), value);
    }

    rendered.replace("{_key}", key)
}
