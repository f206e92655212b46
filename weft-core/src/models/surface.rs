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

/// Rendering surface an entry or rule is allowed to appear on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    Client,
    Admin,
    Both,
}

impl Default for Surface {
    fn default() -> Self {
        Surface::Both
    }
}

impl Surface {
    pub fn as_str(&self) -> &'static str {
        match self {
            Surface::Client => "client",
            Surface::Admin => "admin",
            Surface::Both => "both",
        }
    }

    /// Parse a stored surface tag. Unknown values fall back to `Both`,
    /// matching the lenient handling of legacy rows.
    pub fn parse(value: &str) -> Self {
        match value {
            "client" => Surface::Client,
            "admin" => Surface::Admin,
            _ => Surface::Both,
        }
    }

    /// Whether content restricted to `self` may render on `current`.
    /// A `both` restriction matches everything; otherwise the surface
    /// must match exactly.
    pub fn allows(&self, current: Surface) -> bool {
        *self == Surface::Both || *self == current
    }
}
