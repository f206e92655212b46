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

use weft_core::models::{RuleScope, Surface, Term};
use weft_engine::store::TermStore;

pub struct TermRepository {
    pool: SqlitePool,
}

impl TermRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, term: &Term) -> Result<i64> {
        term.validate_term().map_err(|e| anyhow!(e))?;
        term.validate_title().map_err(|e| anyhow!(e))?;

        let result = sqlx::query(
            r#"
            INSERT INTO terms (term, title, description, language, case_sensitive, whole_word,
                               surface, scope_templates, scope_categories, scope_url_pattern,
                               priority, active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&term.term)
        .bind(&term.title)
        .bind(&term.description)
        .bind(&term.language)
        .bind(term.case_sensitive)
        .bind(term.whole_word)
        .bind(term.scope.surface.as_str())
        .bind(super::encode_list(&term.scope.templates)?)
        .bind(super::encode_list(&term.scope.categories)?)
        .bind(&term.scope.url_pattern)
        .bind(term.priority)
        .bind(term.active)
        .bind(term.created_at)
        .bind(term.updated_at)
        .execute(&self.pool)
        .await
        .context("Failed to create term")?;

        Ok(result.last_insert_rowid())
    }

    /// Active terms for a surface, priority descending, term ascending.
    pub async fn get_active(&self, surface: Surface) -> Result<Vec<Term>> {
        let rows = sqlx::query(
            r#"
            SELECT id, term, title, description, language, case_sensitive, whole_word, surface,
                   scope_templates, scope_categories, scope_url_pattern, priority, active,
                   created_at, updated_at
            FROM terms
            WHERE active = 1 AND surface IN (?, 'both')
            ORDER BY priority DESC, term ASC
            "#,
        )
        .bind(surface.as_str())
        .fetch_all(&self.pool)
        .await
        .context("Failed to load active terms")?;

        rows.into_iter().map(row_to_term).collect()
    }
}

fn row_to_term(row: SqliteRow) -> Result<Term> {
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;
    let active: i64 = row.try_get("active")?;
    let case_sensitive: i64 = row.try_get("case_sensitive")?;
    let whole_word: i64 = row.try_get("whole_word")?;
    let surface: String = row.try_get("surface")?;

    Ok(Term {
        id: Some(row.try_get("id")?),
        term: row.try_get("term")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        language: row.try_get("language")?,
        case_sensitive: case_sensitive != 0,
        whole_word: whole_word != 0,
        scope: RuleScope {
            surface: Surface::parse(&surface),
            templates: super::parse_id_list(row.try_get("scope_templates")?),
            categories: super::parse_id_list(row.try_get("scope_categories")?),
            url_pattern: row.try_get("scope_url_pattern")?,
            admin_paths: None,
            request_pattern: None,
        },
        priority: row.try_get("priority")?,
        active: active != 0,
        created_at: super::parse_datetime(&created_at)?,
        updated_at: super::parse_datetime(&updated_at)?,
    })
}

#[async_trait]
impl TermStore for TermRepository {
    async fn find_active(&self, surface: Surface) -> Result<Vec<Term>> {
        self.get_active(surface).await
    }
}
