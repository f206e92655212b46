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

use serde::{Deserialize, Serialize};

use crate::models::surface::Surface;

/// Execution context for one outgoing render, supplied by the host.
///
/// Everything the scope matcher and the replacement engine need to
/// decide applicability is carried here; the engines never reach out to
/// ambient request state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderContext {
    pub surface: Surface,
    pub locale_id: i64,
    /// Locale code (e.g. "en", "de"), used by term language scoping.
    pub locale_code: String,
    pub template_id: Option<i64>,
    pub category_id: Option<i64>,
    /// Full request URI including the query string.
    pub request_uri: String,
    pub query_params: Vec<(String, String)>,
    /// Structural navigation path on the admin surface (e.g. "content/edit").
    pub admin_path: Option<String>,
    /// Acting user recorded by the audit sink for privileged renders.
    pub actor: Option<String>,
}

impl RenderContext {
    pub fn new(surface: Surface, locale_id: i64) -> Self {
        Self {
            surface,
            locale_id,
            locale_code: String::new(),
            template_id: None,
            category_id: None,
            request_uri: String::new(),
            query_params: Vec::new(),
            admin_path: None,
            actor: None,
        }
    }

    pub fn with_locale_code(mut self, code: impl Into<String>) -> Self {
        self.locale_code = code.into();
        self
    }

    pub fn with_template(mut self, template_id: i64) -> Self {
        self.template_id = Some(template_id);
        self
    }

    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_request_uri(mut self, uri: impl Into<String>) -> Self {
        self.request_uri = uri.into();
        self
    }

    pub fn with_query_params(mut self, params: Vec<(String, String)>) -> Self {
        self.query_params = params;
        self
    }

    pub fn with_admin_path(mut self, path: impl Into<String>) -> Self {
        self.admin_path = Some(path.into());
        self
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}
