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

//! Short-form API over the replacement engine, for hosts that want to
//! render a single entry or run a filter chain without going through
//! placeholder syntax.

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

use weft_core::filters::{self, FilterCall};
use weft_core::models::RenderContext;
use weft_core::utils::escape::escape_html;

use crate::replacer::ReplacementEngine;

static FILTER_SPEC_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+)\((.+)\)$").expect("Failed to compile filter spec regex"));

pub struct Weft {
    engine: Arc<ReplacementEngine>,
}

impl Weft {
    pub fn new(engine: Arc<ReplacementEngine>) -> Self {
        Self { engine }
    }

    /// Render one entry. Failures resolve to empty output (or a
    /// diagnostic comment in debug mode), like placeholder rendering.
    pub async fn get(&self, key: &str, params: &[(String, String)], ctx: &RenderContext) -> String {
        match self.engine.render_single(key, params, ctx).await {
            Ok(rendered) => rendered,
            Err(e) => {
                tracing::warn!(key = %key, error = ?e, "entry render failed");
                if self.engine.config().debug_mode {
                    format!("<!-- weft: {} - {} -->", escape_html(key), escape_html(&e.to_string()))
                } else {
                    String::new()
                }
            }
        }
    }

    /// Render one entry, then apply a filter spec like
    /// `"upper|truncate(50)"`.
    pub async fn filtered(
        &self,
        key: &str,
        params: &[(String, String)],
        filter_spec: &str,
        ctx: &RenderContext,
    ) -> String {
        let content = self.get(key, params, ctx).await;

        if content.is_empty() {
            return content;
        }

        filters::apply(content, &parse_filter_spec(filter_spec))
    }

    /// Replace placeholders in `text` (same as the engine entry point).
    pub async fn apply(&self, text: &str, ctx: &RenderContext) -> String {
        self.engine.replace(text, ctx).await
    }

    /// Whether an entry exists and is active.
    pub async fn exists(&self, key: &str) -> bool {
        match self
            .engine
            .resolver()
            .resolve_batch(&[key.to_string()])
            .await
        {
            Ok(entries) => entries.get(key).map(|e| e.active).unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Render one entry, falling back when the result is empty.
    pub async fn get_or(
        &self,
        key: &str,
        fallback: &str,
        params: &[(String, String)],
        ctx: &RenderContext,
    ) -> String {
        let content = self.get(key, params, ctx).await;

        if content.trim().is_empty() {
            return fallback.to_string();
        }

        content
    }

    /// Apply a filter spec to arbitrary text.
    pub fn filter(&self, content: &str, filter_spec: &str) -> String {
        if content.is_empty() {
            return content.to_string();
        }

        filters::apply(content.to_string(), &parse_filter_spec(filter_spec))
    }

    /// Drop the resolution cache; call after writes to the content
    /// store.
    pub fn invalidate_cache(&self) {
        self.engine.resolver().invalidate();
    }
}

/// Parse `"upper|truncate(50,'…')"` into filter calls. Quotes and
/// whitespace around arguments are trimmed; unknown names are kept and
/// no-op downstream.
pub fn parse_filter_spec(spec: &str) -> Vec<FilterCall> {
    spec.split('|')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            if let Some(caps) = FILTER_SPEC_REGEX.captures(part) {
                FilterCall::new(
                    caps[1].to_lowercase(),
                    caps[2]
                        .split(',')
                        .map(|a| a.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
                        .collect(),
                )
            } else {
                FilterCall::bare(part.to_lowercase())
            }
        })
        .collect()
}
