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

//! Rule applicability against the current execution context.
//!
//! Every scope field is independently optional: an unset field imposes
//! no restriction. Template, category and URL restrictions are checked
//! on the client surface; navigation-path and request-pattern
//! restrictions on the admin surface.

use crate::models::{RenderContext, RewriteRule, RuleScope, Surface, Term};
use crate::pattern;

/// Whether a structural rule applies in `ctx`. Inactive rules never
/// match.
pub fn rule_applies(rule: &RewriteRule, ctx: &RenderContext) -> bool {
    if !rule.active {
        return false;
    }

    scope_applies(&rule.scope, ctx)
}

/// Whether a term applies in `ctx`. On top of the shared scope checks,
/// a term with a language set requires an exact locale-code match.
pub fn term_applies(term: &Term, ctx: &RenderContext) -> bool {
    if !term.active {
        return false;
    }

    match term.language.as_deref() {
        None | Some("") => {}
        Some(code) => {
            if code != ctx.locale_code {
                return false;
            }
        }
    }

    scope_applies(&term.scope, ctx)
}

/// Shared scope evaluation.
pub fn scope_applies(scope: &RuleScope, ctx: &RenderContext) -> bool {
    if !scope.surface.allows(ctx.surface) {
        return false;
    }

    match ctx.surface {
        Surface::Client => {
            if let Some(template_id) = ctx.template_id {
                if !id_allowed(&scope.templates, template_id) {
                    return false;
                }
            }

            if let Some(category_id) = ctx.category_id {
                if !id_allowed(&scope.categories, category_id) {
                    return false;
                }
            }

            if !url_allowed(&scope.url_pattern, &ctx.request_uri) {
                return false;
            }
        }
        Surface::Admin => {
            if !admin_path_allowed(&scope.admin_paths, ctx.admin_path.as_deref()) {
                return false;
            }

            if !request_pattern_allowed(&scope.request_pattern, ctx) {
                return false;
            }
        }
        Surface::Both => {}
    }

    true
}

/// Empty or unset allow-list means unrestricted.
fn id_allowed(allowed: &Option<Vec<i64>>, id: i64) -> bool {
    match allowed {
        None => true,
        Some(ids) if ids.is_empty() => true,
        Some(ids) => ids.contains(&id),
    }
}

/// Unset pattern means unrestricted; a pattern that fails to compile
/// fails closed.
fn url_allowed(url_pattern: &Option<String>, request_uri: &str) -> bool {
    match url_pattern.as_deref() {
        None | Some("") => true,
        Some(p) => match pattern::compile(p) {
            Some(re) => re.is_match(request_uri),
            None => false,
        },
    }
}

/// Navigation paths compare case-insensitively, trailing-slash
/// normalized and prefix-aware: "content" matches "content/edit".
fn admin_path_allowed(allowed: &Option<Vec<String>>, current: Option<&str>) -> bool {
    let paths = match allowed {
        None => return true,
        Some(paths) if paths.is_empty() => return true,
        Some(paths) => paths,
    };

    let current = normalize_path(current.unwrap_or(""));

    if current.is_empty() {
        return false;
    }

    paths.iter().any(|p| {
        let p = normalize_path(p);
        !p.is_empty() && (current == p || current.starts_with(&format!("{}/", p)))
    })
}

fn normalize_path(path: &str) -> String {
    path.trim().trim_matches('/').to_lowercase()
}

/// Request-pattern groups are OR'ed; within a group either a free-text
/// substring match against the full URI, or a `key=value[&k2=v2]`
/// conjunction against the parsed query parameters. A missing key or a
/// mismatched non-empty value fails the whole group.
fn request_pattern_allowed(request_pattern: &Option<String>, ctx: &RenderContext) -> bool {
    let raw = match request_pattern.as_deref() {
        None | Some("") => return true,
        Some(p) => p,
    };

    let groups: Vec<&str> = raw
        .split('\n')
        .flat_map(|line| line.split("||"))
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .collect();

    if groups.is_empty() {
        return true;
    }

    groups.iter().any(|group| {
        if group.contains('=') {
            query_group_matches(group, ctx)
        } else {
            ctx.request_uri.contains(group)
        }
    })
}

fn query_group_matches(group: &str, ctx: &RenderContext) -> bool {
    group.split('&').map(str::trim).all(|pair| {
        if pair.is_empty() {
            return true;
        }

        let (key, expected) = pair.split_once('=').unwrap_or((pair, ""));

        match ctx.query_param(key.trim()) {
            None => false,
            Some(_) if expected.is_empty() => true,
            Some(actual) => actual == expected.trim(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchKind;

    fn client_ctx() -> RenderContext {
        RenderContext::new(Surface::Client, 1).with_locale_code("en")
    }

    fn admin_ctx() -> RenderContext {
        RenderContext::new(Surface::Admin, 1).with_locale_code("en")
    }

    fn rule() -> RewriteRule {
        RewriteRule::new(
            "test".to_string(),
            MatchKind::Literal,
            "foo".to_string(),
            "bar".to_string(),
        )
    }

    #[test]
    fn test_inactive_rule_never_matches() {
        let mut r = rule();
        r.active = false;
        assert!(!rule_applies(&r, &client_ctx()));
    }

    #[test]
    fn test_surface_both_matches_everywhere() {
        let r = rule();
        assert!(rule_applies(&r, &client_ctx()));
        assert!(rule_applies(&r, &admin_ctx()));
    }

    #[test]
    fn test_surface_must_match_exactly() {
        let mut r = rule();
        r.scope.surface = Surface::Client;
        assert!(rule_applies(&r, &client_ctx()));
        assert!(!rule_applies(&r, &admin_ctx()));
    }

    #[test]
    fn test_unset_template_list_matches_any_template() {
        let r = rule();
        assert!(rule_applies(&r, &client_ctx().with_template(6)));
    }

    #[test]
    fn test_template_allow_list() {
        let mut r = rule();
        r.scope.templates = Some(vec![5]);
        assert!(rule_applies(&r, &client_ctx().with_template(5)));
        assert!(!rule_applies(&r, &client_ctx().with_template(6)));
        // unknown template id skips the check
        assert!(rule_applies(&r, &client_ctx()));
    }

    #[test]
    fn test_empty_template_list_is_unrestricted() {
        let mut r = rule();
        r.scope.templates = Some(vec![]);
        assert!(rule_applies(&r, &client_ctx().with_template(6)));
    }

    #[test]
    fn test_category_allow_list() {
        let mut r = rule();
        r.scope.categories = Some(vec![3]);
        assert!(rule_applies(&r, &client_ctx().with_category(3)));
        assert!(!rule_applies(&r, &client_ctx().with_category(4)));
    }

    #[test]
    fn test_url_pattern() {
        let mut r = rule();
        r.scope.url_pattern = Some("/^\\/news\\//".to_string());
        assert!(rule_applies(&r, &client_ctx().with_request_uri("/news/2024")));
        assert!(!rule_applies(&r, &client_ctx().with_request_uri("/blog/")));
    }

    #[test]
    fn test_invalid_url_pattern_fails_closed() {
        let mut r = rule();
        r.scope.url_pattern = Some("/(/".to_string());
        assert!(!rule_applies(&r, &client_ctx().with_request_uri("/news/")));
    }

    #[test]
    fn test_url_pattern_ignored_on_admin_surface() {
        let mut r = rule();
        r.scope.url_pattern = Some("/^\\/news\\//".to_string());
        assert!(rule_applies(&r, &admin_ctx()));
    }

    #[test]
    fn test_admin_path_prefix_matching() {
        let mut r = rule();
        r.scope.admin_paths = Some(vec!["content".to_string()]);
        assert!(rule_applies(&r, &admin_ctx().with_admin_path("content")));
        assert!(rule_applies(&r, &admin_ctx().with_admin_path("content/edit")));
        assert!(rule_applies(&r, &admin_ctx().with_admin_path("Content/Edit/")));
        assert!(!rule_applies(&r, &admin_ctx().with_admin_path("contents")));
        assert!(!rule_applies(&r, &admin_ctx()));
    }

    #[test]
    fn test_request_pattern_substring_group() {
        let mut r = rule();
        r.scope.request_pattern = Some("func=edit".to_string());
        let ctx = admin_ctx()
            .with_request_uri("/index.php?page=content&func=edit")
            .with_query_params(vec![
                ("page".to_string(), "content".to_string()),
                ("func".to_string(), "edit".to_string()),
            ]);
        assert!(rule_applies(&r, &ctx));

        r.scope.request_pattern = Some("index.php".to_string());
        assert!(rule_applies(&r, &ctx));

        r.scope.request_pattern = Some("other.php".to_string());
        assert!(!rule_applies(&r, &ctx));
    }

    #[test]
    fn test_request_pattern_conjunction() {
        let mut r = rule();
        r.scope.request_pattern = Some("page=content&func=edit".to_string());

        let matching = admin_ctx().with_query_params(vec![
            ("page".to_string(), "content".to_string()),
            ("func".to_string(), "edit".to_string()),
        ]);
        assert!(rule_applies(&r, &matching));

        let wrong_value = admin_ctx().with_query_params(vec![
            ("page".to_string(), "content".to_string()),
            ("func".to_string(), "add".to_string()),
        ]);
        assert!(!rule_applies(&r, &wrong_value));

        let missing_key =
            admin_ctx().with_query_params(vec![("page".to_string(), "content".to_string())]);
        assert!(!rule_applies(&r, &missing_key));
    }

    #[test]
    fn test_request_pattern_key_presence_only() {
        let mut r = rule();
        r.scope.request_pattern = Some("func=".to_string());
        let ctx = admin_ctx().with_query_params(vec![("func".to_string(), "whatever".to_string())]);
        assert!(rule_applies(&r, &ctx));
        assert!(!rule_applies(&r, &admin_ctx()));
    }

    #[test]
    fn test_request_pattern_groups_are_or_ed() {
        let mut r = rule();
        r.scope.request_pattern = Some("page=content\nfunc=edit".to_string());
        let ctx = admin_ctx().with_query_params(vec![("func".to_string(), "edit".to_string())]);
        assert!(rule_applies(&r, &ctx));

        r.scope.request_pattern = Some("page=content || func=edit".to_string());
        assert!(rule_applies(&r, &ctx));
    }

    #[test]
    fn test_term_language_scoping() {
        let mut term = Term::new("API".to_string(), "Application Programming Interface".to_string());
        assert!(term_applies(&term, &client_ctx()));

        term.language = Some("de".to_string());
        assert!(!term_applies(&term, &client_ctx()));
        assert!(term_applies(
            &term,
            &RenderContext::new(Surface::Client, 2).with_locale_code("de")
        ));

        term.language = Some(String::new());
        assert!(term_applies(&term, &client_ctx()));
    }

    #[test]
    fn test_inactive_term_never_matches() {
        let mut term = Term::new("API".to_string(), "x".to_string());
        term.active = false;
        assert!(!term_applies(&term, &client_ctx()));
    }

    #[test]
    fn test_term_template_scoping_on_client_only() {
        let mut term = Term::new("API".to_string(), "x".to_string());
        term.scope.templates = Some(vec![5]);
        assert!(!term_applies(&term, &client_ctx().with_template(6)));
        assert!(term_applies(&term, &client_ctx().with_template(5)));
        assert!(term_applies(&term, &admin_ctx().with_template(6)));
    }
}
