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

//! Scoped markup rewriting: structural rules and term tagging.
//!
//! Rules run in priority order (higher first, ties by name); a failing
//! rule leaves the content unchanged for that rule and the rest
//! proceed. Both passes share the scope matcher.

use regex::Regex;
use std::sync::Arc;

use weft_core::models::{MatchKind, RenderContext, RewriteRule, Term};
use weft_core::pattern;
use weft_core::scope;

use crate::callbacks::CallbackRegistry;
use crate::config::EngineConfig;
use crate::dom;
use crate::replacer::ReplacementEngine;
use crate::store::{RuleStore, TermStore};

pub struct RewriteEngine {
    rules: Arc<dyn RuleStore>,
    terms: Arc<dyn TermStore>,
    callbacks: CallbackRegistry,
    config: EngineConfig,
    replacer: Option<Arc<ReplacementEngine>>,
}

impl RewriteEngine {
    pub fn new(rules: Arc<dyn RuleStore>, terms: Arc<dyn TermStore>, config: EngineConfig) -> Self {
        Self {
            rules,
            terms,
            callbacks: CallbackRegistry::new(),
            config,
            replacer: None,
        }
    }

    pub fn with_callbacks(mut self, callbacks: CallbackRegistry) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Enable placeholder expansion inside rule payloads (when the
    /// configuration asks for it).
    pub fn with_placeholder_expansion(mut self, replacer: Arc<ReplacementEngine>) -> Self {
        self.replacer = Some(replacer);
        self
    }

    /// Apply every applicable structural rule to `content`. Never
    /// fails; a store outage or a broken rule degrades to the text as
    /// it stands.
    pub async fn apply_structural_rules(&self, content: &str, ctx: &RenderContext) -> String {
        if content.trim().is_empty() {
            return content.to_string();
        }

        let rules = match self.rules.find_active(ctx.surface).await {
            Ok(rules) => rules,
            Err(e) => {
                tracing::error!(error = ?e, "rule store unavailable, skipping structural rewrite");
                return content.to_string();
            }
        };

        let mut applicable: Vec<RewriteRule> = rules
            .into_iter()
            .filter(|rule| scope::rule_applies(rule, ctx))
            .collect();

        if applicable.is_empty() {
            return content.to_string();
        }

        applicable.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.name.cmp(&b.name)));

        let mut content = content.to_string();
        for rule in &applicable {
            content = self.apply_rule(content, rule, ctx).await;
        }

        content
    }

    async fn apply_rule(&self, content: String, rule: &RewriteRule, ctx: &RenderContext) -> String {
        match rule.kind {
            MatchKind::Selector => {
                let payload = self.prepare_payload(&rule.replacement, ctx).await;
                dom::apply_selector_rule(&content, &rule.search_value, &payload, rule.position)
                    .unwrap_or(content)
            }
            MatchKind::Literal => {
                if rule.search_value.is_empty() {
                    return content;
                }

                let payload = self.prepare_payload(&rule.replacement, ctx).await;
                content.replace(&rule.search_value, &payload)
            }
            MatchKind::Regex => match pattern::compile(&rule.search_value) {
                Some(regex) => {
                    let payload = self.prepare_payload(&rule.replacement, ctx).await;
                    regex.replace_all(&content, payload.as_str()).into_owned()
                }
                None => {
                    tracing::warn!(
                        rule = %rule.name,
                        pattern = %rule.search_value,
                        "rule pattern cannot be compiled, skipping"
                    );
                    content
                }
            },
            MatchKind::Callback => self
                .callbacks
                .invoke(
                    &rule.replacement,
                    &self.config.allowed_callback_namespaces,
                    &rule.search_value,
                    &content,
                )
                .unwrap_or(content),
        }
    }

    async fn prepare_payload(&self, payload: &str, ctx: &RenderContext) -> String {
        if self.config.expand_rule_payloads {
            if let Some(replacer) = &self.replacer {
                return replacer.replace(payload, ctx).await;
            }
        }

        payload.to_string()
    }

    /// Wrap every applicable term occurrence in `content` in an
    /// annotation element. Never fails.
    pub async fn tag_terms(&self, content: &str, ctx: &RenderContext) -> String {
        if content.trim().is_empty() || content.len() < self.config.min_tagging_length {
            return content.to_string();
        }

        let terms = match self.terms.find_active(ctx.surface).await {
            Ok(terms) => terms,
            Err(e) => {
                tracing::error!(error = ?e, "term store unavailable, skipping tagging");
                return content.to_string();
            }
        };

        let mut applicable: Vec<Term> = terms
            .into_iter()
            .filter(|term| scope::term_applies(term, ctx))
            .collect();

        if applicable.is_empty() {
            return content.to_string();
        }

        // higher priority wins exact-span ties during matching
        applicable.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.term.cmp(&b.term)));

        let patterns = build_patterns(&applicable);
        let excludes = dom::parse_selectors(&self.config.term_exclude_selectors);

        dom::tag_terms(content, &patterns, &excludes).unwrap_or_else(|| content.to_string())
    }
}

/// Compile one pattern per term; terms whose pattern cannot be built
/// are skipped.
fn build_patterns(terms: &[Term]) -> Vec<(Regex, &Term)> {
    terms
        .iter()
        .filter_map(|term| {
            let mut pattern = regex::escape(&term.term);

            if term.whole_word {
                pattern = format!(r"\b{}\b", pattern);
            }

            if !term.case_sensitive {
                pattern = format!("(?i){}", pattern);
            }

            match Regex::new(&pattern) {
                Ok(regex) => Some((regex, term)),
                Err(e) => {
                    tracing::warn!(term = %term.term, error = ?e, "term pattern rejected");
                    None
                }
            }
        })
        .collect()
}
