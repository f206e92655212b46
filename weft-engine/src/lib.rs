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

pub mod cache;
pub mod callbacks;
pub mod config;
pub mod dom;
pub mod error;
pub mod facade;
pub mod replacer;
pub mod resolver;
pub mod rewrite;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use cache::ResolutionCache;
pub use callbacks::CallbackRegistry;
pub use config::EngineConfig;
pub use error::RenderFailure;
pub use facade::Weft;
pub use replacer::ReplacementEngine;
pub use resolver::ContentResolver;
pub use rewrite::RewriteEngine;
pub use store::{AuditSink, CapabilityCheck, ContentStore, EditGuard, RuleStore, TermStore};
