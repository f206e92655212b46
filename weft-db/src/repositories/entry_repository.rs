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
use std::collections::HashMap;

use sqlx::SqlitePool;
use weft_core::models::{ContentKind, Entry, Surface};
use weft_engine::store::ContentStore;

type EntryRow = (
    i64,            // id
    String,         // key_name
    String,         // title
    Option<String>, // description
    String,         // body
    String,         // kind
    String,         // surface
    i64,            // active
    i64,            // multilang
    i64,            // revision
    Option<String>, // created_by
    Option<String>, // updated_by
    String,         // created_at
    String,         // updated_at
);

const ENTRY_COLUMNS: &str = "id, key_name, title, description, body, kind, surface, active, \
                             multilang, revision, created_by, updated_by, created_at, updated_at";

pub struct EntryRepository {
    pool: SqlitePool,
}

impl EntryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, entry: &Entry) -> Result<i64> {
        entry.validate_key().map_err(|e| anyhow!(e))?;
        entry.validate_title().map_err(|e| anyhow!(e))?;

        let result = sqlx::query(
            r#"
            INSERT INTO entries (key_name, title, description, body, kind, surface, active,
                                 multilang, revision, created_by, updated_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.key)
        .bind(&entry.title)
        .bind(&entry.description)
        .bind(&entry.body)
        .bind(entry.kind.as_str())
        .bind(entry.surface.as_str())
        .bind(entry.active)
        .bind(entry.multilang)
        .bind(&entry.created_by)
        .bind(&entry.updated_by)
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .execute(&self.pool)
        .await
        .context("Failed to create entry")?;

        Ok(result.last_insert_rowid())
    }

    /// Update an entry by key; the key itself is immutable. The
    /// revision counter is bumped in the same statement.
    pub async fn update(&self, entry: &Entry) -> Result<()> {
        entry.validate_title().map_err(|e| anyhow!(e))?;

        let result = sqlx::query(
            r#"
            UPDATE entries
            SET title = ?, description = ?, body = ?, kind = ?, surface = ?, active = ?,
                multilang = ?, updated_by = ?, updated_at = ?, revision = revision + 1
            WHERE key_name = ?
            "#,
        )
        .bind(&entry.title)
        .bind(&entry.description)
        .bind(&entry.body)
        .bind(entry.kind.as_str())
        .bind(entry.surface.as_str())
        .bind(entry.active)
        .bind(entry.multilang)
        .bind(&entry.updated_by)
        .bind(entry.updated_at)
        .bind(&entry.key)
        .execute(&self.pool)
        .await
        .context("Failed to update entry")?;

        if result.rows_affected() == 0 {
            return Err(anyhow!("No entry with key '{}'", entry.key));
        }

        Ok(())
    }

    pub async fn get_by_key(&self, key: &str) -> Result<Option<Entry>> {
        let result = sqlx::query_as::<_, EntryRow>(&format!(
            "SELECT {} FROM entries WHERE key_name = ?",
            ENTRY_COLUMNS
        ))
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find entry by key")?;

        result.map(row_to_entry).transpose()
    }

    pub async fn get_by_keys(&self, keys: &[String]) -> Result<HashMap<String, Entry>> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders = vec!["?"; keys.len()].join(", ");
        let sql = format!(
            "SELECT {} FROM entries WHERE key_name IN ({})",
            ENTRY_COLUMNS, placeholders
        );

        let mut query = sqlx::query_as::<_, EntryRow>(&sql);
        for key in keys {
            query = query.bind(key);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .context("Failed to find entries by keys")?;

        let mut entries = HashMap::new();
        for row in rows {
            let entry = row_to_entry(row)?;
            entries.insert(entry.key.clone(), entry);
        }

        Ok(entries)
    }

    /// Upsert the localized body for (entry, locale).
    pub async fn set_translation(&self, entry_id: i64, locale_id: i64, body: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO entry_translations (entry_id, locale_id, body)
            VALUES (?, ?, ?)
            ON CONFLICT (entry_id, locale_id) DO UPDATE SET body = excluded.body
            "#,
        )
        .bind(entry_id)
        .bind(locale_id)
        .bind(body)
        .execute(&self.pool)
        .await
        .context("Failed to set translation")?;

        Ok(())
    }

    pub async fn get_translations(
        &self,
        entry_ids: &[i64],
        locale_id: i64,
    ) -> Result<HashMap<i64, String>> {
        if entry_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders = vec!["?"; entry_ids.len()].join(", ");
        let sql = format!(
            "SELECT entry_id, body FROM entry_translations WHERE locale_id = ? AND entry_id IN ({})",
            placeholders
        );

        let mut query = sqlx::query_as::<_, (i64, String)>(&sql).bind(locale_id);
        for id in entry_ids {
            query = query.bind(id);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .context("Failed to find translations")?;

        Ok(rows
            .into_iter()
            .filter(|(_, body)| !body.is_empty())
            .collect())
    }
}

fn row_to_entry(row: EntryRow) -> Result<Entry> {
    let (
        id,
        key,
        title,
        description,
        body,
        kind,
        surface,
        active,
        multilang,
        revision,
        created_by,
        updated_by,
        created_at,
        updated_at,
    ) = row;

    Ok(Entry {
        id: Some(id),
        key,
        title,
        description,
        body,
        kind: ContentKind::parse(&kind),
        surface: Surface::parse(&surface),
        active: active != 0,
        multilang: multilang != 0,
        revision,
        created_by,
        updated_by,
        created_at: super::parse_datetime(&created_at)?,
        updated_at: super::parse_datetime(&updated_at)?,
    })
}

#[async_trait]
impl ContentStore for EntryRepository {
    async fn find_by_key(&self, key: &str) -> Result<Option<Entry>> {
        self.get_by_key(key).await
    }

    async fn find_by_keys(&self, keys: &[String]) -> Result<HashMap<String, Entry>> {
        self.get_by_keys(keys).await
    }

    async fn find_translations(
        &self,
        entry_ids: &[i64],
        locale_id: i64,
    ) -> Result<HashMap<i64, String>> {
        self.get_translations(entry_ids, locale_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init::create_schema;
    use pretty_assertions::assert_eq;

    async fn repo() -> Result<EntryRepository> {
        let pool = SqlitePool::connect(":memory:").await?;
        create_schema(&pool).await?;
        Ok(EntryRepository::new(pool))
    }

    fn entry(key: &str, body: &str) -> Entry {
        Entry::new(
            key.to_string(),
            format!("Title of {}", key),
            body.to_string(),
            ContentKind::Markup,
        )
    }

    #[tokio::test]
    async fn test_create_and_get_by_key() -> Result<()> {
        let repo = repo().await?;

        let id = repo.create(&entry("greeting", "hello")).await?;
        assert!(id > 0);

        let found = repo.get_by_key("greeting").await?.expect("entry expected");
        assert_eq!(found.id, Some(id));
        assert_eq!(found.body, "hello");
        assert_eq!(found.kind, ContentKind::Markup);
        assert_eq!(found.revision, 0);
        assert!(found.active);

        assert!(repo.get_by_key("missing").await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_key() -> Result<()> {
        let repo = repo().await?;
        assert!(repo.create(&entry("bad key", "x")).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_get_by_keys_returns_only_found() -> Result<()> {
        let repo = repo().await?;
        repo.create(&entry("a", "1")).await?;
        repo.create(&entry("b", "2")).await?;

        let found = repo
            .get_by_keys(&["a".to_string(), "b".to_string(), "missing".to_string()])
            .await?;

        assert_eq!(found.len(), 2);
        assert_eq!(found.get("a").map(|e| e.body.as_str()), Some("1"));
        assert_eq!(found.get("b").map(|e| e.body.as_str()), Some("2"));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_bumps_revision() -> Result<()> {
        let repo = repo().await?;
        repo.create(&entry("greeting", "hello")).await?;

        let mut updated = entry("greeting", "hello again");
        updated.updated_by = Some("alice".to_string());
        repo.update(&updated).await?;
        repo.update(&updated).await?;

        let found = repo.get_by_key("greeting").await?.expect("entry expected");
        assert_eq!(found.revision, 2);
        assert_eq!(found.body, "hello again");
        assert_eq!(found.updated_by, Some("alice".to_string()));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_unknown_key_fails() -> Result<()> {
        let repo = repo().await?;
        assert!(repo.update(&entry("absent", "x")).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_translations_round_trip() -> Result<()> {
        let repo = repo().await?;
        let id = repo.create(&entry("greeting", "hello")).await?;

        repo.set_translation(id, 2, "hallo").await?;
        repo.set_translation(id, 2, "hallo!").await?;
        repo.set_translation(id, 3, "bonjour").await?;

        let found = repo.get_translations(&[id, 999], 2).await?;
        assert_eq!(found.len(), 1);
        assert_eq!(found.get(&id).map(String::as_str), Some("hallo!"));

        Ok(())
    }
}
