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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::surface::Surface;
use crate::parser::is_valid_key;

/// How an entry's body is rendered once resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentKind {
    Markup,
    PlainText,
    Executable,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Markup => "markup",
            ContentKind::PlainText => "plain-text",
            ContentKind::Executable => "executable",
        }
    }

    /// Parse a stored kind tag. Unknown values fall back to `Markup`.
    pub fn parse(value: &str) -> Self {
        match value {
            "plain-text" => ContentKind::PlainText,
            "executable" => ContentKind::Executable,
            _ => ContentKind::Markup,
        }
    }
}

/// A stored, keyed content unit substitutable into rendered output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entry {
    pub id: Option<i64>,
    pub key: String,
    pub title: String,
    pub description: Option<String>,
    pub body: String,
    pub kind: ContentKind,
    pub surface: Surface,
    pub active: bool,
    pub multilang: bool,
    pub revision: i64,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    pub fn new(key: String, title: String, body: String, kind: ContentKind) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            key,
            title,
            description: None,
            body,
            kind,
            surface: Surface::Both,
            active: true,
            multilang: false,
            revision: 0,
            created_by: None,
            updated_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate_key(&self) -> Result<(), String> {
        if self.key.is_empty() {
            return Err("Key cannot be empty".to_string());
        }

        if self.key.len() > 255 {
            return Err("Key cannot exceed 255 characters".to_string());
        }

        if !is_valid_key(&self.key) {
            return Err(
                "Key can only contain letters, numbers, hyphens, and underscores".to_string(),
            );
        }

        Ok(())
    }

    pub fn validate_title(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Title cannot be empty".to_string());
        }

        if self.title.len() > 255 {
            return Err("Title cannot exceed 255 characters".to_string());
        }

        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate_key().is_ok() && self.validate_title().is_ok()
    }

    /// The placeholder token that resolves to this entry.
    pub fn placeholder(&self) -> String {
        format!("[[snippet:{}]]", self.key)
    }
}
