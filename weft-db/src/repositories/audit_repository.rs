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
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use weft_core::models::{Entry, RenderContext};
use weft_engine::store::AuditSink;

/// Append-only log of privileged-content executions: who, when, which
/// entry.
pub struct AuditRepository {
    pool: SqlitePool,
}

impl AuditRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn record(&self, entry_id: Option<i64>, entry_key: &str, actor: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO execution_log (entry_id, entry_key, actor, executed_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(entry_id)
        .bind(entry_key)
        .bind(actor)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .context("Failed to append execution record")?;

        Ok(())
    }

    pub async fn count_for_key(&self, entry_key: &str) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM execution_log WHERE entry_key = ?")
                .bind(entry_key)
                .fetch_one(&self.pool)
                .await
                .context("Failed to count execution records")?;

        Ok(count)
    }
}

#[async_trait]
impl AuditSink for AuditRepository {
    async fn record_execution(&self, entry: &Entry, ctx: &RenderContext) -> Result<()> {
        let actor = ctx.actor.as_deref().unwrap_or("system");
        self.record(entry.id, &entry.key, actor).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init::create_schema;
    use pretty_assertions::assert_eq;
    use weft_core::models::{ContentKind, Surface};

    #[tokio::test]
    async fn test_record_and_count() -> Result<()> {
        let pool = SqlitePool::connect(":memory:").await?;
        create_schema(&pool).await?;
        let repo = AuditRepository::new(pool);

        repo.record(Some(1), "calc", "alice").await?;
        repo.record(Some(1), "calc", "bob").await?;

        assert_eq!(repo.count_for_key("calc").await?, 2);
        assert_eq!(repo.count_for_key("other").await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_audit_sink_uses_context_actor() -> Result<()> {
        let pool = SqlitePool::connect(":memory:").await?;
        create_schema(&pool).await?;
        let repo = AuditRepository::new(pool);

        let mut entry = Entry::new(
            "calc".to_string(),
            "Calc".to_string(),
            "{x}".to_string(),
            ContentKind::Executable,
        );
        entry.id = Some(9);

        let ctx = RenderContext::new(Surface::Admin, 1).with_actor("alice");
        repo.record_execution(&entry, &ctx).await?;

        let ctx_anonymous = RenderContext::new(Surface::Admin, 1);
        repo.record_execution(&entry, &ctx_anonymous).await?;

        let (actors,): (i64,) = sqlx::query_as(
            "SELECT COUNT(DISTINCT actor) FROM execution_log WHERE entry_key = 'calc'",
        )
        .fetch_one(&repo.pool)
        .await?;
        assert_eq!(actors, 2);

        Ok(())
    }
}
