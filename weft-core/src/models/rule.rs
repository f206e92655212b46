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

/// How a structural rule locates its targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// CSS-subset selector resolved against the parsed document.
    Selector,
    /// Literal substring match over the serialized text.
    Literal,
    /// Regular-expression substitution over the serialized text.
    Regex,
    /// Registered callback, gated by a namespace allow-list.
    Callback,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::Selector => "selector",
            MatchKind::Literal => "literal",
            MatchKind::Regex => "regex",
            MatchKind::Callback => "callback",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "literal" => MatchKind::Literal,
            "regex" => MatchKind::Regex,
            "callback" => MatchKind::Callback,
            _ => MatchKind::Selector,
        }
    }
}

/// Where a selector rule's replacement fragment lands relative to the
/// matched node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertPosition {
    Replace,
    Before,
    After,
    Prepend,
    Append,
}

impl InsertPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsertPosition::Replace => "replace",
            InsertPosition::Before => "before",
            InsertPosition::After => "after",
            InsertPosition::Prepend => "prepend",
            InsertPosition::Append => "append",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "before" => InsertPosition::Before,
            "after" => InsertPosition::After,
            "prepend" => InsertPosition::Prepend,
            "append" => InsertPosition::Append,
            _ => InsertPosition::Replace,
        }
    }
}

/// Applicability predicate shared by structural rules and terms.
///
/// Every field is independently optional; an unset field imposes no
/// restriction.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RuleScope {
    pub surface: Surface,
    pub templates: Option<Vec<i64>>,
    pub categories: Option<Vec<i64>>,
    pub url_pattern: Option<String>,
    pub admin_paths: Option<Vec<String>>,
    pub request_pattern: Option<String>,
}

impl RuleScope {
    pub fn for_surface(surface: Surface) -> Self {
        Self {
            surface,
            ..Self::default()
        }
    }
}

/// A scoped rule that rewrites markup at matched locations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RewriteRule {
    pub id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub kind: MatchKind,
    pub search_value: String,
    /// Replacement fragment, substitution text, or (for callback rules)
    /// the fully-qualified callback name.
    pub replacement: String,
    pub position: InsertPosition,
    pub scope: RuleScope,
    pub priority: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RewriteRule {
    pub fn new(name: String, kind: MatchKind, search_value: String, replacement: String) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            name,
            description: None,
            kind,
            search_value,
            replacement,
            position: InsertPosition::Replace,
            scope: RuleScope::default(),
            priority: 10,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate_name(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Name cannot be empty".to_string());
        }

        if self.name.len() > 255 {
            return Err("Name cannot exceed 255 characters".to_string());
        }

        Ok(())
    }

    pub fn validate_search_value(&self) -> Result<(), String> {
        if self.search_value.is_empty() {
            return Err("Search value cannot be empty".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_defaults() {
        let rule = RewriteRule::new(
            "promo banner".to_string(),
            MatchKind::Selector,
            ".promo".to_string(),
            "<b>!</b>".to_string(),
        );
        assert_eq!(rule.position, InsertPosition::Replace);
        assert_eq!(rule.priority, 10);
        assert!(rule.active);
        assert_eq!(rule.scope.surface, Surface::Both);
        assert_eq!(rule.scope.templates, None);
    }

    #[test]
    fn test_kind_and_position_round_trip() {
        for kind in [
            MatchKind::Selector,
            MatchKind::Literal,
            MatchKind::Regex,
            MatchKind::Callback,
        ] {
            assert_eq!(MatchKind::parse(kind.as_str()), kind);
        }

        for position in [
            InsertPosition::Replace,
            InsertPosition::Before,
            InsertPosition::After,
            InsertPosition::Prepend,
            InsertPosition::Append,
        ] {
            assert_eq!(InsertPosition::parse(position.as_str()), position);
        }
    }

    #[test]
    fn test_validation() {
        let mut rule = RewriteRule::new(
            "r".to_string(),
            MatchKind::Literal,
            "foo".to_string(),
            "bar".to_string(),
        );
        assert!(rule.validate_name().is_ok());
        assert!(rule.validate_search_value().is_ok());

        rule.name = " ".to_string();
        assert!(rule.validate_name().is_err());
        rule.search_value = String::new();
        assert!(rule.validate_search_value().is_err());
    }
}
