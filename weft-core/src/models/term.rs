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

use crate::models::rule::RuleScope;

/// A vocabulary term wrapped in an annotation element wherever it
/// occurs in rendered text (the abbreviation feature).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Term {
    pub id: Option<i64>,
    pub term: String,
    /// Expansion shown as the annotation's title attribute.
    pub title: String,
    pub description: Option<String>,
    /// Locale code this term is limited to; unset applies everywhere.
    pub language: Option<String>,
    pub case_sensitive: bool,
    pub whole_word: bool,
    pub scope: RuleScope,
    pub priority: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Term {
    pub fn new(term: String, title: String) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            term,
            title,
            description: None,
            language: None,
            case_sensitive: false,
            whole_word: true,
            scope: RuleScope::default(),
            priority: 10,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate_term(&self) -> Result<(), String> {
        if self.term.trim().is_empty() {
            return Err("Term cannot be empty".to_string());
        }

        if self.term.len() > 255 {
            return Err("Term cannot exceed 255 characters".to_string());
        }

        Ok(())
    }

    pub fn validate_title(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Title cannot be empty".to_string());
        }

        Ok(())
    }
}
