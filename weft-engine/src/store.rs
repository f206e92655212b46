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

//! Collaborator interfaces consumed by the engines. The pipeline is
//! written against these traits only; hosts plug in their own storage,
//! permission model and audit trail.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

use weft_core::models::{Entry, RenderContext, RewriteRule, Surface, Term};

/// Keyed content store. Lookups return absence, not errors, for
/// unknown keys.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn find_by_key(&self, key: &str) -> Result<Option<Entry>>;

    /// Batch lookup; the result only contains keys that were found.
    async fn find_by_keys(&self, keys: &[String]) -> Result<HashMap<String, Entry>>;

    /// Localized bodies for the given entries; entries without a
    /// variant for `locale_id` are absent from the result.
    async fn find_translations(
        &self,
        entry_ids: &[i64],
        locale_id: i64,
    ) -> Result<HashMap<i64, String>>;
}

/// Structural rewrite rules, already restricted to active rows for the
/// given surface (rules scoped to `both` included).
#[async_trait]
pub trait RuleStore: Send + Sync {
    async fn find_active(&self, surface: Surface) -> Result<Vec<RewriteRule>>;
}

/// Vocabulary terms, already restricted to active rows for the given
/// surface.
#[async_trait]
pub trait TermStore: Send + Sync {
    async fn find_active(&self, surface: Surface) -> Result<Vec<Term>>;
}

/// Append-only record of privileged-content executions.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record_execution(&self, entry: &Entry, ctx: &RenderContext) -> Result<()>;
}

/// Host-supplied veto: content that originates from an edit/authoring
/// context must never be rewritten. The answer is authoritative.
pub trait EditGuard: Send + Sync {
    fn is_edit_context(&self, ctx: &RenderContext) -> bool;
}

/// Host-supplied capability check gating `executable`-kind rendering.
pub trait CapabilityCheck: Send + Sync {
    fn can_execute_privileged(&self) -> bool;
}
