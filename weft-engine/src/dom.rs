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

//! Tree-level mutation for the rewrite engine.
//!
//! Markup is parsed with html5ever (via `scraper`); nodes live in an
//! arena with stable ids, so matched nodes are collected first and
//! mutated afterwards, in reverse document order, without iterator
//! invalidation. Replacement fragments are grafted as fresh clones per
//! target node.

use once_cell::sync::Lazy;
use regex::Regex;
use ego_tree::{NodeId, NodeMut, NodeRef, Tree};
use scraper::node::{Element, Node, Text};
use scraper::Html;

use weft_core::models::{InsertPosition, Term};
use weft_core::utils::escape::escape_html;

/// Tags whose subtrees term tagging always skips.
const SKIP_TAGS: &[&str] = &["pre", "code", "script", "style", "abbr", "textarea", "a"];

static ID_SELECTOR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#([\w-]+)$").expect("Failed to compile id selector regex"));
static CLASS_SELECTOR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\.([\w-]+)$").expect("Failed to compile class selector regex"));
static TAG_SELECTOR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z][\w-]*)$").expect("Failed to compile tag selector regex")
});
static TAG_CLASS_SELECTOR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z][\w-]*)\.([\w-]+)$").expect("Failed to compile tag.class selector regex")
});
static TAG_ID_SELECTOR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z][\w-]*)#([\w-]+)$").expect("Failed to compile tag#id selector regex")
});
static ATTR_SELECTOR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\[([A-Za-z][\w-]*)=["']([^"']*)["']\]$"#)
        .expect("Failed to compile attribute selector regex")
});

/// The supported selector subset. Anything outside these shapes fails
/// closed: no match, never a crash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorPattern {
    Id(String),
    Class(String),
    Tag(String),
    TagClass(String, String),
    TagId(String, String),
    AttrEq(String, String),
}

impl SelectorPattern {
    pub fn parse(selector: &str) -> Option<Self> {
        let selector = selector.trim();

        if let Some(caps) = ID_SELECTOR_REGEX.captures(selector) {
            return Some(SelectorPattern::Id(caps[1].to_string()));
        }

        if let Some(caps) = CLASS_SELECTOR_REGEX.captures(selector) {
            return Some(SelectorPattern::Class(caps[1].to_string()));
        }

        if let Some(caps) = TAG_SELECTOR_REGEX.captures(selector) {
            return Some(SelectorPattern::Tag(caps[1].to_lowercase()));
        }

        if let Some(caps) = TAG_CLASS_SELECTOR_REGEX.captures(selector) {
            return Some(SelectorPattern::TagClass(
                caps[1].to_lowercase(),
                caps[2].to_string(),
            ));
        }

        if let Some(caps) = TAG_ID_SELECTOR_REGEX.captures(selector) {
            return Some(SelectorPattern::TagId(
                caps[1].to_lowercase(),
                caps[2].to_string(),
            ));
        }

        if let Some(caps) = ATTR_SELECTOR_REGEX.captures(selector) {
            return Some(SelectorPattern::AttrEq(
                caps[1].to_lowercase(),
                caps[2].to_string(),
            ));
        }

        None
    }

    pub fn matches(&self, element: &Element) -> bool {
        match self {
            SelectorPattern::Id(id) => element.id() == Some(id),
            SelectorPattern::Class(class) => element.classes().any(|c| c == class),
            SelectorPattern::Tag(tag) => element.name().eq_ignore_ascii_case(tag),
            SelectorPattern::TagClass(tag, class) => {
                element.name().eq_ignore_ascii_case(tag) && element.classes().any(|c| c == class)
            }
            SelectorPattern::TagId(tag, id) => {
                element.name().eq_ignore_ascii_case(tag) && element.id() == Some(id)
            }
            SelectorPattern::AttrEq(attr, value) => element.attr(attr) == Some(value),
        }
    }
}

/// Parse configured exclude selectors, dropping unsupported shapes.
pub fn parse_selectors(raw: &[String]) -> Vec<SelectorPattern> {
    raw.iter()
        .filter_map(|s| SelectorPattern::parse(s))
        .collect()
}

/// Apply one selector rule. Returns `None` when the selector is
/// unsupported or nothing matched, leaving the content to the caller
/// unchanged.
pub fn apply_selector_rule(
    content: &str,
    selector: &str,
    replacement: &str,
    position: InsertPosition,
) -> Option<String> {
    if content.trim().is_empty() {
        return None;
    }

    let pattern = SelectorPattern::parse(selector)?;

    let mut doc = Html::parse_fragment(content);
    let targets = select_nodes(&doc, &pattern);

    if targets.is_empty() {
        return None;
    }

    let fragment = Html::parse_fragment(replacement);

    // reverse document order, so sibling edits never shift pending targets
    for target in targets.iter().rev() {
        graft(&mut doc.tree, *target, &fragment, position);
    }

    Some(serialize_fragment(&doc))
}

/// Matched element ids in document order.
fn select_nodes(doc: &Html, pattern: &SelectorPattern) -> Vec<NodeId> {
    doc.tree
        .root()
        .descendants()
        .filter(|node| {
            node.value()
                .as_element()
                .is_some_and(|el| pattern.matches(el))
        })
        .map(|node| node.id())
        .collect()
}

/// Insert a fresh clone of `fragment`'s top-level nodes relative to
/// `target`.
fn graft(tree: &mut Tree<Node>, target: NodeId, fragment: &Html, position: InsertPosition) {
    let children: Vec<NodeRef<Node>> = fragment.root_element().children().collect();

    match position {
        InsertPosition::Replace => {
            for child in &children {
                insert_subtree_before(tree, target, *child);
            }
            if let Some(mut node) = tree.get_mut(target) {
                node.detach();
            }
        }
        InsertPosition::Before => {
            for child in &children {
                insert_subtree_before(tree, target, *child);
            }
        }
        InsertPosition::After => {
            let mut anchor = target;
            for child in &children {
                if let Some(new_id) = insert_subtree_after(tree, anchor, *child) {
                    anchor = new_id;
                }
            }
        }
        InsertPosition::Prepend => {
            for child in children.iter().rev() {
                prepend_subtree(tree, target, *child);
            }
        }
        InsertPosition::Append => {
            for child in &children {
                append_subtree(tree, target, *child);
            }
        }
    }
}

fn copy_children(dest: &mut NodeMut<Node>, src: NodeRef<Node>) {
    for child in src.children() {
        let mut appended = dest.append(child.value().clone());
        copy_children(&mut appended, child);
    }
}

fn insert_subtree_before(tree: &mut Tree<Node>, anchor: NodeId, src: NodeRef<Node>) {
    if let Some(mut anchor_node) = tree.get_mut(anchor) {
        let mut new_node = anchor_node.insert_before(src.value().clone());
        copy_children(&mut new_node, src);
    }
}

fn insert_subtree_after(tree: &mut Tree<Node>, anchor: NodeId, src: NodeRef<Node>) -> Option<NodeId> {
    let mut anchor_node = tree.get_mut(anchor)?;
    let mut new_node = anchor_node.insert_after(src.value().clone());
    let new_id = new_node.id();
    copy_children(&mut new_node, src);
    Some(new_id)
}

fn prepend_subtree(tree: &mut Tree<Node>, parent: NodeId, src: NodeRef<Node>) {
    if let Some(mut parent_node) = tree.get_mut(parent) {
        let mut new_node = parent_node.prepend(src.value().clone());
        copy_children(&mut new_node, src);
    }
}

fn append_subtree(tree: &mut Tree<Node>, parent: NodeId, src: NodeRef<Node>) {
    if let Some(mut parent_node) = tree.get_mut(parent) {
        let mut new_node = parent_node.append(src.value().clone());
        copy_children(&mut new_node, src);
    }
}

fn serialize_fragment(doc: &Html) -> String {
    doc.root_element().inner_html()
}

/// Wrap every pattern match inside eligible text nodes in an annotation
/// element. Returns `None` when nothing was tagged.
///
/// Subtrees rooted at an excluded tag or matching an exclude selector
/// are skipped entirely; the exclusion is inherited by descendants.
/// Inserted annotation content is never re-scanned.
pub fn tag_terms(
    content: &str,
    patterns: &[(Regex, &Term)],
    excludes: &[SelectorPattern],
) -> Option<String> {
    let mut doc = Html::parse_fragment(content);

    let mut text_nodes = Vec::new();
    collect_text_nodes(doc.tree.root(), excludes, &mut text_nodes);

    let mut changed = false;

    for node_id in text_nodes {
        if tag_text_node(&mut doc.tree, node_id, patterns) {
            changed = true;
        }
    }

    if changed {
        Some(serialize_fragment(&doc))
    } else {
        None
    }
}

fn collect_text_nodes(node: NodeRef<Node>, excludes: &[SelectorPattern], out: &mut Vec<NodeId>) {
    if let Some(element) = node.value().as_element() {
        let name = element.name();

        if SKIP_TAGS.iter().any(|t| name.eq_ignore_ascii_case(t))
            || excludes.iter().any(|s| s.matches(element))
        {
            return;
        }
    }

    if let Some(text) = node.value().as_text() {
        if !text.text.trim().is_empty() {
            out.push(node.id());
        }
        return;
    }

    for child in node.children() {
        collect_text_nodes(child, excludes, out);
    }
}

/// Split one text node around its matches, rightmost first so earlier
/// offsets stay valid. Overlapping spans lose to the match processed
/// before them.
fn tag_text_node(tree: &mut Tree<Node>, node_id: NodeId, patterns: &[(Regex, &Term)]) -> bool {
    let original = match tree.get(node_id).and_then(|n| n.value().as_text().map(|t| t.text.to_string())) {
        Some(text) => text,
        None => return false,
    };

    let mut matches: Vec<(usize, usize, &Term)> = Vec::new();
    for (regex, term) in patterns {
        for m in regex.find_iter(&original) {
            matches.push((m.start(), m.end(), term));
        }
    }

    if matches.is_empty() {
        return false;
    }

    // rightmost first; on equal offsets the longer span wins
    matches.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));

    let mut boundary = original.len();
    let mut changed = false;

    for (start, end, term) in matches {
        if end > boundary || start >= end {
            continue;
        }

        let after = &original[end..boundary];
        if !after.is_empty() {
            if let Some(mut node) = tree.get_mut(node_id) {
                node.insert_after(Node::Text(Text {
                    text: after.into(),
                }));
            }
        }

        let annotation = Html::parse_fragment(&annotation_markup(term, &original[start..end]));
        let annotation_children: Vec<NodeRef<Node>> =
            annotation.root_element().children().collect();
        for child in annotation_children.iter().rev() {
            insert_subtree_after(tree, node_id, *child);
        }

        boundary = start;
        changed = true;
    }

    if !changed {
        return false;
    }

    if boundary == 0 {
        if let Some(mut node) = tree.get_mut(node_id) {
            node.detach();
        }
    } else if let Some(mut node) = tree.get_mut(node_id) {
        if let Node::Text(text) = node.value() {
            text.text = original[..boundary].into();
        }
    }

    true
}

fn annotation_markup(term: &Term, matched: &str) -> String {
    let lang_attr = match term.language.as_deref() {
        Some(code) if !code.is_empty() => format!(r#" lang="{}""#, escape_html(code)),
        _ => String::new(),
    };

    format!(
        r#"<abbr title="{}"{}>{}</abbr>"#,
        escape_html(&term.title),
        lang_attr,
        escape_html(matched)
    )
}
