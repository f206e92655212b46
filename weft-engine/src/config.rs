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

use std::env;

/// Engine configuration, loaded from the environment by the host.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Surface failures as inline HTML comments instead of empty output.
    pub debug_mode: bool,
    /// Run rule replacement payloads through the placeholder engine
    /// before grafting.
    pub expand_rule_payloads: bool,
    /// Selectors (id/class/tag forms) whose subtrees term tagging skips,
    /// on top of the fixed exclusion set.
    pub term_exclude_selectors: Vec<String>,
    /// Namespace prefixes callback rules may resolve against.
    pub allowed_callback_namespaces: Vec<String>,
    /// Minimum content length before term tagging parses at all.
    pub min_tagging_length: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debug_mode: false,
            expand_rule_payloads: false,
            term_exclude_selectors: vec![
                "a".to_string(),
                "nav".to_string(),
                "code".to_string(),
                "pre".to_string(),
            ],
            allowed_callback_namespaces: vec!["weft".to_string()],
            min_tagging_length: 10,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            debug_mode: env::var("WEFT_DEBUG")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            expand_rule_payloads: env::var("WEFT_EXPAND_RULE_PAYLOADS")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            term_exclude_selectors: env::var("WEFT_TAG_EXCLUDE_SELECTORS")
                .map(|raw| parse_list(&raw))
                .unwrap_or(defaults.term_exclude_selectors),
            allowed_callback_namespaces: env::var("WEFT_CALLBACK_NAMESPACES")
                .map(|raw| parse_list(&raw))
                .unwrap_or(defaults.allowed_callback_namespaces),
            min_tagging_length: env::var("WEFT_MIN_TAGGING_LENGTH")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
        }
    }

    pub fn with_debug_mode(mut self, debug_mode: bool) -> Self {
        self.debug_mode = debug_mode;
        self
    }
}

/// One selector per line, or comma-separated.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(['\n', ','])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
