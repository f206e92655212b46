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

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use weft_core::models::{InsertPosition, MatchKind, RewriteRule, RuleScope, Surface};
use weft_engine::store::RuleStore;

pub struct RuleRepository {
    pool: SqlitePool,
}

impl RuleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, rule: &RewriteRule) -> Result<i64> {
        rule.validate_name().map_err(|e| anyhow!(e))?;
        rule.validate_search_value().map_err(|e| anyhow!(e))?;

        let result = sqlx::query(
            r#"
            INSERT INTO rewrite_rules (name, description, kind, search_value, replacement,
                                       position, surface, scope_templates, scope_categories,
                                       scope_url_pattern, scope_admin_paths, scope_request_pattern,
                                       priority, active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&rule.name)
        .bind(&rule.description)
        .bind(rule.kind.as_str())
        .bind(&rule.search_value)
        .bind(&rule.replacement)
        .bind(rule.position.as_str())
        .bind(rule.scope.surface.as_str())
        .bind(super::encode_list(&rule.scope.templates)?)
        .bind(super::encode_list(&rule.scope.categories)?)
        .bind(&rule.scope.url_pattern)
        .bind(super::encode_list(&rule.scope.admin_paths)?)
        .bind(&rule.scope.request_pattern)
        .bind(rule.priority)
        .bind(rule.active)
        .bind(rule.created_at)
        .bind(rule.updated_at)
        .execute(&self.pool)
        .await
        .context("Failed to create rule")?;

        Ok(result.last_insert_rowid())
    }

    /// Active rules for a surface (rules scoped to `both` included),
    /// priority descending, name ascending.
    pub async fn get_active(&self, surface: Surface) -> Result<Vec<RewriteRule>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, kind, search_value, replacement, position, surface,
                   scope_templates, scope_categories, scope_url_pattern, scope_admin_paths,
                   scope_request_pattern, priority, active, created_at, updated_at
            FROM rewrite_rules
            WHERE active = 1 AND surface IN (?, 'both')
            ORDER BY priority DESC, name ASC
            "#,
        )
        .bind(surface.as_str())
        .fetch_all(&self.pool)
        .await
        .context("Failed to load active rules")?;

        rows.into_iter().map(row_to_rule).collect()
    }
}

fn row_to_rule(row: SqliteRow) -> Result<RewriteRule> {
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;
    let active: i64 = row.try_get("active")?;
    let kind: String = row.try_get("kind")?;
    let position: String = row.try_get("position")?;
    let surface: String = row.try_get("surface")?;

    Ok(RewriteRule {
        id: Some(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        kind: MatchKind::parse(&kind),
        search_value: row.try_get("search_value")?,
        replacement: row.try_get("replacement")?,
        position: InsertPosition::parse(&position),
        scope: RuleScope {
            surface: Surface::parse(&surface),
            templates: super::parse_id_list(row.try_get("scope_templates")?),
            categories: super::parse_id_list(row.try_get("scope_categories")?),
            url_pattern: row.try_get("scope_url_pattern")?,
            admin_paths: super::parse_string_list(row.try_get("scope_admin_paths")?),
            request_pattern: row.try_get("scope_request_pattern")?,
        },
        priority: row.try_get("priority")?,
        active: active != 0,
        created_at: super::parse_datetime(&created_at)?,
        updated_at: super::parse_datetime(&updated_at)?,
    })
}

#[async_trait]
impl RuleStore for RuleRepository {
    async fn find_active(&self, surface: Surface) -> Result<Vec<RewriteRule>> {
        self.get_active(surface).await
    }
}
