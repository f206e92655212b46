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

//! Placeholder scanner.
//!
//! Syntax: `[[snippet:key_name]]`
//! With parameters: `[[snippet:key_name|param1=value|param2=value]]`
//! With filters: `[[snippet:key_name|upper|truncate(50)]]`
//! Combined: `[[snippet:key_name|upper|param=value|truncate(50)]]`
//!
//! A modifier is a parameter when it contains `=` and does not look like
//! a filter call; otherwise it is matched against the filter registry.
//! Unknown filter names are dropped silently - lenient parsing, so a
//! typo in one placeholder never breaks the surrounding page.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::filters::{self, FilterCall};

static PLACEHOLDER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\[snippet:([A-Za-z0-9_-]+)(?:\|([^\]]+))?\]\]")
        .expect("Failed to compile placeholder regex")
});

static KEY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("Failed to compile key regex"));

static FILTER_CALL_SHAPE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\w+\(").expect("Failed to compile filter shape regex"));

static FILTER_WITH_ARGS_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+)\((.+)\)$").expect("Failed to compile filter args regex"));

static FILTER_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+)$").expect("Failed to compile filter name regex"));

/// One placeholder occurrence, parsed out of raw text.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderMatch {
    pub key: String,
    /// Inline parameters in source order.
    pub params: Vec<(String, String)>,
    /// Filter invocations in source order.
    pub filters: Vec<FilterCall>,
    /// The exact substring matched, used as the substitution key.
    pub full_match: String,
}

/// Find all placeholder occurrences in `content`. Returns an empty list
/// when nothing matches.
pub fn find_all(content: &str) -> Vec<PlaceholderMatch> {
    PLACEHOLDER_REGEX
        .captures_iter(content)
        .map(|caps| {
            let modifiers = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            let (params, filters) = parse_modifiers(modifiers);
            PlaceholderMatch {
                key: caps[1].to_string(),
                params,
                filters,
                full_match: caps[0].to_string(),
            }
        })
        .collect()
}

/// Replace every placeholder occurrence in one linear pass, looking up
/// the computed replacement by the exact matched substring. Occurrences
/// absent from the map are left untouched.
pub fn substitute(content: &str, replacements: &HashMap<String, String>) -> String {
    PLACEHOLDER_REGEX
        .replace_all(content, |caps: &regex::Captures| {
            replacements
                .get(&caps[0])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Parse a modifier string (everything after the first `|`) into
/// parameters and filter invocations.
pub fn parse_modifiers(modifier_string: &str) -> (Vec<(String, String)>, Vec<FilterCall>) {
    let mut params = Vec::new();
    let mut filter_calls = Vec::new();

    if modifier_string.is_empty() {
        return (params, filter_calls);
    }

    for part in split_by_pipe(modifier_string) {
        let part = part.trim();

        if part.is_empty() {
            continue;
        }

        // Parameter: contains "=" without a leading call shape
        if part.contains('=') && !FILTER_CALL_SHAPE_REGEX.is_match(part) {
            let (key, value) = part.split_once('=').unwrap_or((part, ""));
            params.push((key.trim().to_string(), value.trim().to_string()));
            continue;
        }

        if let Some(filter) = parse_filter(part) {
            filter_calls.push(filter);
        }
    }

    (params, filter_calls)
}

/// Parse a single filter invocation; `None` for anything the registry
/// does not know.
fn parse_filter(filter_string: &str) -> Option<FilterCall> {
    if let Some(caps) = FILTER_WITH_ARGS_REGEX.captures(filter_string) {
        let name = caps[1].to_lowercase();

        if !filters::exists(&name) {
            return None;
        }

        return Some(FilterCall {
            name,
            args: parse_filter_args(&caps[2]),
        });
    }

    if let Some(caps) = FILTER_NAME_REGEX.captures(filter_string) {
        let name = caps[1].to_lowercase();

        if !filters::exists(&name) {
            return None;
        }

        return Some(FilterCall {
            name,
            args: Vec::new(),
        });
    }

    None
}

/// Split comma-separated filter arguments, honoring quoting and nested
/// parentheses. Unescaped quote characters are stripped from the result.
fn parse_filter_args(args_string: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quote_char = ' ';
    let mut depth = 0usize;
    let mut prev: Option<char> = None;

    for c in args_string.chars() {
        if (c == '"' || c == '\'') && prev != Some('\\') {
            if !in_quotes {
                in_quotes = true;
                quote_char = c;
                prev = Some(c);
                continue;
            } else if c == quote_char {
                in_quotes = false;
                quote_char = ' ';
                prev = Some(c);
                continue;
            }
        }

        if !in_quotes {
            if c == '(' {
                depth += 1;
            } else if c == ')' {
                depth = depth.saturating_sub(1);
            }
        }

        if c == ',' && !in_quotes && depth == 0 {
            args.push(current.trim().to_string());
            current.clear();
            prev = Some(c);
            continue;
        }

        current.push(c);
        prev = Some(c);
    }

    if !current.trim().is_empty() {
        args.push(current.trim().to_string());
    }

    args
}

/// Split on `|`, but never inside quotes or parentheses.
fn split_by_pipe(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quote_char = ' ';
    let mut depth = 0usize;
    let mut prev: Option<char> = None;

    for c in input.chars() {
        if (c == '"' || c == '\'') && prev != Some('\\') {
            if !in_quotes {
                in_quotes = true;
                quote_char = c;
            } else if c == quote_char {
                in_quotes = false;
                quote_char = ' ';
            }
        }

        if !in_quotes {
            if c == '(' {
                depth += 1;
            } else if c == ')' {
                depth = depth.saturating_sub(1);
            }
        }

        if c == '|' && !in_quotes && depth == 0 {
            parts.push(std::mem::take(&mut current));
            prev = Some(c);
            continue;
        }

        current.push(c);
        prev = Some(c);
    }

    parts.push(current);

    parts
}

/// Validate an entry key.
pub fn is_valid_key(key: &str) -> bool {
    KEY_REGEX.is_match(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_find_all_plain() {
        let matches = find_all("Hello [[snippet:name]]!");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].key, "name");
        assert_eq!(matches[0].full_match, "[[snippet:name]]");
        assert!(matches[0].params.is_empty());
        assert!(matches[0].filters.is_empty());
    }

    #[test]
    fn test_find_all_no_matches_returns_empty() {
        assert!(find_all("no placeholders here").is_empty());
        assert!(find_all("[[snippet:]]").is_empty());
        assert!(find_all("[[other:key]]").is_empty());
    }

    #[test]
    fn test_find_all_multiple() {
        let matches = find_all("[[snippet:a]] and [[snippet:b]] and [[snippet:a]]");
        assert_eq!(matches.len(), 3);
        assert_eq!(matches[0].key, "a");
        assert_eq!(matches[1].key, "b");
        assert_eq!(matches[2].key, "a");
    }

    #[test]
    fn test_params_and_filters_interleaved() {
        let matches = find_all("[[snippet:greeting|upper|name=World|truncate(50)]]");
        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert_eq!(m.params, vec![("name".to_string(), "World".to_string())]);
        assert_eq!(m.filters.len(), 2);
        assert_eq!(m.filters[0].name, "upper");
        assert!(m.filters[0].args.is_empty());
        assert_eq!(m.filters[1].name, "truncate");
        assert_eq!(m.filters[1].args, vec!["50".to_string()]);
    }

    #[test]
    fn test_unknown_filter_is_dropped_not_a_param() {
        let (params, filter_calls) = parse_modifiers("nosuchfilter|upper");
        assert!(params.is_empty());
        assert_eq!(filter_calls.len(), 1);
        assert_eq!(filter_calls[0].name, "upper");
    }

    #[test]
    fn test_filter_name_is_case_insensitive() {
        let (_, filter_calls) = parse_modifiers("UPPER");
        assert_eq!(filter_calls.len(), 1);
        assert_eq!(filter_calls[0].name, "upper");
    }

    #[test]
    fn test_quoted_args_keep_commas_and_pipes() {
        let (_, filter_calls) = parse_modifiers(r#"replace("a,b|c",'x')"#);
        assert_eq!(filter_calls.len(), 1);
        assert_eq!(
            filter_calls[0].args,
            vec!["a,b|c".to_string(), "x".to_string()]
        );
    }

    #[test]
    fn test_nested_parens_in_args() {
        let args = parse_filter_args("wrap(a), (b,c), d");
        assert_eq!(
            args,
            vec!["wrap(a)".to_string(), "(b,c)".to_string(), "d".to_string()]
        );
    }

    #[test]
    fn test_param_with_equals_in_value() {
        let (params, _) = parse_modifiers("query=a=b");
        assert_eq!(params, vec![("query".to_string(), "a=b".to_string())]);
    }

    #[test]
    fn test_substitute_single_pass() {
        let mut map = HashMap::new();
        map.insert("[[snippet:a]]".to_string(), "X".to_string());
        let out = substitute("[[snippet:a]] [[snippet:b]] [[snippet:a]]", &map);
        assert_eq!(out, "X [[snippet:b]] X");
    }

    #[test]
    fn test_full_match_identity_round_trip() {
        let text = "pre [[snippet:key|upper|name=v|truncate(5,'…')]] post";
        let matches = find_all(text);
        assert_eq!(matches.len(), 1);
        let mut map = HashMap::new();
        map.insert(matches[0].full_match.clone(), matches[0].full_match.clone());
        assert_eq!(substitute(text, &map), text);
    }

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("foo-bar_2"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("a b"));
        assert!(!is_valid_key("a.b"));
    }
}
