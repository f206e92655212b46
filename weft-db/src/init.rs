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
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize the database, creating the file if needed and the schema
/// on first run.
pub async fn init_database(database_url: &str) -> Result<SqlitePool> {
    if database_url.starts_with("sqlite:") {
        let path = database_url.trim_start_matches("sqlite:");
        if !path.starts_with(":memory:") {
            if let Some(parent) = Path::new(path).parent() {
                std::fs::create_dir_all(parent).context("Failed to create database directory")?;
            }
        }
    }

    let pool = SqlitePool::connect(database_url)
        .await
        .context("Failed to connect to database")?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables and indexes if they do not exist yet.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    tracing::info!("Ensuring database schema...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            key_name TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            description TEXT,
            body TEXT NOT NULL DEFAULT '',
            kind TEXT NOT NULL DEFAULT 'markup',
            surface TEXT NOT NULL DEFAULT 'both',
            active INTEGER NOT NULL DEFAULT 1,
            multilang INTEGER NOT NULL DEFAULT 0,
            revision INTEGER NOT NULL DEFAULT 0,
            created_by TEXT,
            updated_by TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create entries table")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS entry_translations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            entry_id INTEGER NOT NULL,
            locale_id INTEGER NOT NULL,
            body TEXT NOT NULL DEFAULT '',
            UNIQUE (entry_id, locale_id),
            FOREIGN KEY (entry_id) REFERENCES entries (id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create entry_translations table")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS rewrite_rules (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT,
            kind TEXT NOT NULL DEFAULT 'selector',
            search_value TEXT NOT NULL,
            replacement TEXT NOT NULL DEFAULT '',
            position TEXT NOT NULL DEFAULT 'replace',
            surface TEXT NOT NULL DEFAULT 'both',
            scope_templates TEXT,
            scope_categories TEXT,
            scope_url_pattern TEXT,
            scope_admin_paths TEXT,
            scope_request_pattern TEXT,
            priority INTEGER NOT NULL DEFAULT 10,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create rewrite_rules table")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS terms (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            term TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            language TEXT,
            case_sensitive INTEGER NOT NULL DEFAULT 0,
            whole_word INTEGER NOT NULL DEFAULT 1,
            surface TEXT NOT NULL DEFAULT 'both',
            scope_templates TEXT,
            scope_categories TEXT,
            scope_url_pattern TEXT,
            priority INTEGER NOT NULL DEFAULT 10,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create terms table")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS execution_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            entry_id INTEGER,
            entry_key TEXT NOT NULL,
            actor TEXT NOT NULL,
            executed_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create execution_log table")?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_rewrite_rules_active ON rewrite_rules (active, surface)",
    )
    .execute(pool)
    .await
    .context("Failed to create rewrite_rules index")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_terms_active ON terms (active, surface)")
        .execute(pool)
        .await
        .context("Failed to create terms index")?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_translations_entry ON entry_translations (entry_id, locale_id)",
    )
    .execute(pool)
    .await
    .context("Failed to create entry_translations index")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_in_memory() -> Result<()> {
        let pool = init_database("sqlite::memory:").await?;

        // schema creation is idempotent
        create_schema(&pool).await?;

        sqlx::query("SELECT id FROM entries").fetch_all(&pool).await?;
        sqlx::query("SELECT id FROM rewrite_rules").fetch_all(&pool).await?;
        sqlx::query("SELECT id FROM terms").fetch_all(&pool).await?;
        sqlx::query("SELECT id FROM execution_log").fetch_all(&pool).await?;

        Ok(())
    }
}
