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

use std::collections::HashMap;

/// A registered rewrite callback: receives the rule's search value and
/// the current content, returns the rewritten content (or `None` to
/// leave it unchanged).
pub type RewriteCallback = fn(search: &str, content: &str) -> Option<String>;

/// Registry of named callbacks for callback-kind rules.
///
/// A rule references a callback by fully-qualified name
/// (`namespace::function`). Only names under an allow-listed namespace
/// are ever invoked; anything else is refused.
#[derive(Default)]
pub struct CallbackRegistry {
    handlers: HashMap<String, RewriteCallback>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(&mut self, name: &str, handler: RewriteCallback) {
        self.handlers.insert(name.to_string(), handler);
    }

    pub fn get(&self, name: &str) -> Option<&RewriteCallback> {
        self.handlers.get(name)
    }

    /// Invoke `name` if it is registered and its namespace is trusted.
    /// Returns `None` (content unchanged) in every refusal case.
    pub fn invoke(
        &self,
        name: &str,
        allowed_namespaces: &[String],
        search: &str,
        content: &str,
    ) -> Option<String> {
        let (namespace, _) = name.split_once("::")?;

        if !allowed_namespaces.iter().any(|ns| namespace == ns) {
            tracing::warn!(callback = %name, "callback namespace not allow-listed, refusing");
            return None;
        }

        let handler = self.get(name)?;

        handler(search, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn shout(search: &str, content: &str) -> Option<String> {
        Some(content.replace(search, &search.to_uppercase()))
    }

    fn allowed() -> Vec<String> {
        vec!["weft".to_string()]
    }

    #[test]
    fn test_invoke_registered_callback() {
        let mut registry = CallbackRegistry::new();
        registry.register("weft::shout", shout);

        let out = registry.invoke("weft::shout", &allowed(), "hi", "hi there");
        assert_eq!(out, Some("HI there".to_string()));
    }

    #[test]
    fn test_unqualified_name_is_refused() {
        let mut registry = CallbackRegistry::new();
        registry.register("shout", shout);

        assert_eq!(registry.invoke("shout", &allowed(), "hi", "hi"), None);
    }

    #[test]
    fn test_untrusted_namespace_is_refused() {
        let mut registry = CallbackRegistry::new();
        registry.register("evil::shout", shout);

        assert_eq!(registry.invoke("evil::shout", &allowed(), "hi", "hi"), None);
    }

    #[test]
    fn test_unregistered_callback_is_refused() {
        let registry = CallbackRegistry::new();
        assert_eq!(registry.invoke("weft::absent", &allowed(), "a", "b"), None);
    }
}
