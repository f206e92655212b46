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

pub mod audit_repository;
pub mod entry_repository;
pub mod rule_repository;
pub mod term_repository;

pub use audit_repository::*;
pub use entry_repository::*;
pub use rule_repository::*;
pub use term_repository::*;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

/// SQLite stores datetime as "YYYY-MM-DD HH:MM:SS" or ISO8601
pub(crate) fn parse_datetime(value: &str) -> Result<DateTime<Utc>> {
    if value.contains('T') {
        Ok(DateTime::parse_from_rfc3339(value)
            .context("Failed to parse datetime as RFC3339")?
            .with_timezone(&Utc))
    } else {
        Ok(
            chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .context("Failed to parse datetime as SQLite format")?
                .and_utc(),
        )
    }
}

/// JSON-encoded id list column; NULL or empty means unrestricted.
pub(crate) fn parse_id_list(value: Option<String>) -> Option<Vec<i64>> {
    value
        .filter(|v| !v.trim().is_empty())
        .and_then(|v| serde_json::from_str(&v).ok())
}

/// JSON-encoded string list column; NULL or empty means unrestricted.
pub(crate) fn parse_string_list(value: Option<String>) -> Option<Vec<String>> {
    value
        .filter(|v| !v.trim().is_empty())
        .and_then(|v| serde_json::from_str(&v).ok())
}

/// Serialize an optional list for a JSON column.
pub(crate) fn encode_list<T: serde::Serialize>(value: &Option<Vec<T>>) -> Result<Option<String>> {
    match value {
        None => Ok(None),
        Some(items) => Ok(Some(
            serde_json::to_string(items).context("Failed to encode scope list")?,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_datetime_both_formats() {
        let rfc = parse_datetime("2024-06-01T10:30:00Z").unwrap();
        let sqlite = parse_datetime("2024-06-01 10:30:00").unwrap();
        assert_eq!(rfc, sqlite);
        assert!(parse_datetime("garbage").is_err());
    }

    #[test]
    fn test_parse_id_list() {
        assert_eq!(parse_id_list(Some("[1,2]".to_string())), Some(vec![1, 2]));
        assert_eq!(parse_id_list(Some("".to_string())), None);
        assert_eq!(parse_id_list(None), None);
        assert_eq!(parse_id_list(Some("not json".to_string())), None);
    }

    #[test]
    fn test_encode_list_round_trip() {
        let encoded = encode_list(&Some(vec![5i64, 6])).unwrap();
        assert_eq!(parse_id_list(encoded), Some(vec![5, 6]));
        assert_eq!(encode_list::<i64>(&None).unwrap(), None);
    }
}
