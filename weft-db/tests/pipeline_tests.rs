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

//! End-to-end pipeline tests against SQLite-backed stores: placeholder
//! replacement, structural rewrite and term tagging in sequence, the
//! way a page-rendering host drives them.

use std::sync::Arc;

use anyhow::Result;
use pretty_assertions::assert_eq;

use weft_core::models::{
    ContentKind, Entry, InsertPosition, MatchKind, RenderContext, RewriteRule, Surface, Term,
};
use weft_db::init::init_database;
use weft_db::repositories::{
    AuditRepository, EntryRepository, RuleRepository, TermRepository,
};
use weft_engine::config::EngineConfig;
use weft_engine::replacer::ReplacementEngine;
use weft_engine::rewrite::RewriteEngine;
use weft_engine::store::{CapabilityCheck, EditGuard};

struct NoEditing;

impl EditGuard for NoEditing {
    fn is_edit_context(&self, _ctx: &RenderContext) -> bool {
        false
    }
}

struct AdminEditing;

impl EditGuard for AdminEditing {
    fn is_edit_context(&self, ctx: &RenderContext) -> bool {
        ctx.admin_path
            .as_deref()
            .is_some_and(|p| p.starts_with("content/edit"))
    }
}

struct AllowExecution(bool);

impl CapabilityCheck for AllowExecution {
    fn can_execute_privileged(&self) -> bool {
        self.0
    }
}

struct Fixture {
    entries: Arc<EntryRepository>,
    rules: Arc<RuleRepository>,
    terms: Arc<TermRepository>,
    audit: Arc<AuditRepository>,
    replacer: Arc<ReplacementEngine>,
    rewriter: RewriteEngine,
}

async fn fixture(can_execute: bool) -> Result<Fixture> {
    let pool = init_database("sqlite::memory:").await?;

    let entries = Arc::new(EntryRepository::new(pool.clone()));
    let rules = Arc::new(RuleRepository::new(pool.clone()));
    let terms = Arc::new(TermRepository::new(pool.clone()));
    let audit = Arc::new(AuditRepository::new(pool));

    let replacer = Arc::new(ReplacementEngine::new(
        entries.clone(),
        Arc::new(NoEditing),
        Arc::new(AllowExecution(can_execute)),
        audit.clone(),
        EngineConfig::default(),
    ));

    let rewriter = RewriteEngine::new(rules.clone(), terms.clone(), EngineConfig::default());

    Ok(Fixture {
        entries,
        rules,
        terms,
        audit,
        replacer,
        rewriter,
    })
}

fn client_ctx() -> RenderContext {
    RenderContext::new(Surface::Client, 1)
        .with_locale_code("en")
        .with_request_uri("/news/today")
}

#[tokio::test]
async fn test_full_render_pass() -> Result<()> {
    let f = fixture(true).await?;

    f.entries
        .create(&Entry::new(
            "greeting".to_string(),
            "Greeting".to_string(),
            "world".to_string(),
            ContentKind::Markup,
        ))
        .await?;

    let mut promo = RewriteRule::new(
        "promo banner".to_string(),
        MatchKind::Selector,
        ".promo".to_string(),
        "<b>!</b>".to_string(),
    );
    promo.position = InsertPosition::Append;
    f.rules.create(&promo).await?;

    f.terms
        .create(&Term::new(
            "API".to_string(),
            "Application Programming Interface".to_string(),
        ))
        .await?;

    let ctx = client_ctx();

    let substituted = f
        .replacer
        .replace(
            r#"<div class="promo">Hello [[snippet:greeting|upper]]</div> <p>the API</p>"#,
            &ctx,
        )
        .await;
    assert_eq!(
        substituted,
        r#"<div class="promo">Hello WORLD</div> <p>the API</p>"#
    );

    let rewritten = f.rewriter.apply_structural_rules(&substituted, &ctx).await;
    assert_eq!(
        rewritten,
        r#"<div class="promo">Hello WORLD<b>!</b></div> <p>the API</p>"#
    );

    let tagged = f.rewriter.tag_terms(&rewritten, &ctx).await;
    assert_eq!(
        tagged,
        concat!(
            r#"<div class="promo">Hello WORLD<b>!</b></div> "#,
            r#"<p>the <abbr title="Application Programming Interface">API</abbr></p>"#
        )
    );

    Ok(())
}

#[tokio::test]
async fn test_executable_entry_is_audited() -> Result<()> {
    let f = fixture(true).await?;

    f.entries
        .create(&Entry::new(
            "report".to_string(),
            "Report".to_string(),
            "report for {audience} ({_key})".to_string(),
            ContentKind::Executable,
        ))
        .await?;

    let ctx = client_ctx().with_actor("alice");
    let out = f
        .replacer
        .replace("[[snippet:report|audience=ops]]", &ctx)
        .await;

    assert_eq!(out, "report for ops (report)");
    assert_eq!(f.audit.count_for_key("report").await?, 1);

    Ok(())
}

#[tokio::test]
async fn test_executable_entry_denied_without_capability() -> Result<()> {
    let f = fixture(false).await?;

    f.entries
        .create(&Entry::new(
            "report".to_string(),
            "Report".to_string(),
            "secret".to_string(),
            ContentKind::Executable,
        ))
        .await?;

    let out = f
        .replacer
        .replace("[[snippet:report]]", &client_ctx())
        .await;

    assert_eq!(out, "");
    assert_eq!(f.audit.count_for_key("report").await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_write_path_invalidates_resolver_cache() -> Result<()> {
    let f = fixture(true).await?;

    f.entries
        .create(&Entry::new(
            "motd".to_string(),
            "Motd".to_string(),
            "old".to_string(),
            ContentKind::Markup,
        ))
        .await?;

    let ctx = client_ctx();
    assert_eq!(f.replacer.replace("[[snippet:motd]]", &ctx).await, "old");

    let mut updated = Entry::new(
        "motd".to_string(),
        "Motd".to_string(),
        "new".to_string(),
        ContentKind::Markup,
    );
    updated.updated_by = Some("alice".to_string());
    f.entries.update(&updated).await?;

    // stale until the write path invalidates
    assert_eq!(f.replacer.replace("[[snippet:motd]]", &ctx).await, "old");

    f.replacer.resolver().invalidate();
    assert_eq!(f.replacer.replace("[[snippet:motd]]", &ctx).await, "new");

    Ok(())
}

#[tokio::test]
async fn test_localized_variant_is_used() -> Result<()> {
    let f = fixture(true).await?;

    let mut entry = Entry::new(
        "greeting".to_string(),
        "Greeting".to_string(),
        "hello".to_string(),
        ContentKind::Markup,
    );
    entry.multilang = true;
    let id = f.entries.create(&entry).await?;
    f.entries.set_translation(id, 2, "hallo").await?;

    let de = RenderContext::new(Surface::Client, 2).with_locale_code("de");
    assert_eq!(f.replacer.replace("[[snippet:greeting]]", &de).await, "hallo");

    let en = client_ctx();
    assert_eq!(f.replacer.replace("[[snippet:greeting]]", &en).await, "hello");

    Ok(())
}

#[tokio::test]
async fn test_edit_context_blocks_replacement() -> Result<()> {
    let pool = init_database("sqlite::memory:").await?;
    let entries = Arc::new(EntryRepository::new(pool.clone()));
    let audit = Arc::new(AuditRepository::new(pool));

    entries
        .create(&Entry::new(
            "greeting".to_string(),
            "Greeting".to_string(),
            "world".to_string(),
            ContentKind::Markup,
        ))
        .await?;

    let replacer = ReplacementEngine::new(
        entries,
        Arc::new(AdminEditing),
        Arc::new(AllowExecution(true)),
        audit,
        EngineConfig::default(),
    );

    let editing = RenderContext::new(Surface::Admin, 1).with_admin_path("content/edit");
    let text = "Hello [[snippet:greeting]]";
    assert_eq!(replacer.replace(text, &editing).await, text);

    let browsing = RenderContext::new(Surface::Admin, 1).with_admin_path("structure");
    assert_eq!(replacer.replace(text, &browsing).await, "Hello world");

    Ok(())
}
