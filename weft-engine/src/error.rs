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

use std::fmt;

/// What went wrong while rendering a single placeholder or applying a
/// single rule. Failures are contained at that unit: they become empty
/// output (or an inline diagnostic comment in debug mode) and are never
/// raised to the caller of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderFailure {
    /// The referenced key does not exist in the content store.
    ReferenceNotFound(String),
    /// Privileged content requested without the required capability.
    PermissionDenied(String),
    /// A filter received arguments it cannot interpret.
    MalformedFilterArgs { filter: String, detail: String },
    /// A rule's regular expression or selector cannot be compiled.
    InvalidPattern(String),
    /// The content store could not be reached at all.
    UpstreamUnavailable(String),
}

impl fmt::Display for RenderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderFailure::ReferenceNotFound(key) => write!(f, "entry not found: {}", key),
            RenderFailure::PermissionDenied(key) => {
                write!(f, "privileged entry suppressed: {}", key)
            }
            RenderFailure::MalformedFilterArgs { filter, detail } => {
                write!(f, "malformed arguments for filter {}: {}", filter, detail)
            }
            RenderFailure::InvalidPattern(pattern) => {
                write!(f, "pattern cannot be compiled: {}", pattern)
            }
            RenderFailure::UpstreamUnavailable(detail) => {
                write!(f, "content store unavailable: {}", detail)
            }
        }
    }
}

impl std::error::Error for RenderFailure {}
