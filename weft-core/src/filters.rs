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

//! Named, pure text transforms applied after content resolution.
//!
//! Filters are noted after the placeholder key with `|`:
//! `[[snippet:key|upper|truncate(100)]]`
//!
//! An unknown filter name is a no-op and malformed arguments fall back
//! to safe defaults; a broken filter chain never takes down a render.

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use pulldown_cmark::{html, Options, Parser};
use regex::Regex;
use std::collections::HashSet;

use crate::utils::escape::escape_html;
use crate::utils::slug::slugify;

/// One parsed filter invocation: name plus positional string arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCall {
    pub name: String,
    pub args: Vec<String>,
}

impl FilterCall {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    pub fn bare(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }
}

const AVAILABLE_FILTERS: &[&str] = &[
    "upper",
    "lower",
    "title",
    "capitalize",
    "trim",
    "truncate",
    "limit", // alias for truncate
    "words",
    "nl2br",
    "raw",
    "markdown",
    "strip_tags",
    "escape",
    "sanitize",
    "format",
    "default",
    "replace",
    "prefix",
    "suffix",
    "wrap",
    "date",
    "intldate",
    "number",
    "bytes",
    "slug",
    "url",
    "email",
    "widont",
    "highlight",
    "json",
    "base64",
    "reverse",
    "wordwrap",
];

/// Whether a filter name is registered.
pub fn exists(name: &str) -> bool {
    AVAILABLE_FILTERS.contains(&name)
}

/// All registered filter names.
pub fn available_filters() -> &'static [&'static str] {
    AVAILABLE_FILTERS
}

/// Apply filters to `content`, strictly in the given order. Unknown
/// names pass the content through unchanged.
pub fn apply(content: String, filter_calls: &[FilterCall]) -> String {
    let mut content = content;

    for call in filter_calls {
        let args = call.args.as_slice();

        content = match call.name.as_str() {
            "upper" => content.to_uppercase(),
            "lower" => content.to_lowercase(),
            "title" => title_case(&content),
            "capitalize" => capitalize(&content),
            "trim" => content.trim().to_string(),
            "truncate" | "limit" => truncate(&content, args),
            "words" => words(&content, args),
            "nl2br" => nl2br(&content),
            // raw suppresses the default auto-linebreaking applied by hosts
            "raw" => content,
            "markdown" => markdown(&content),
            "strip_tags" => strip_tags(&content, args),
            "escape" => escape_html(&content),
            "sanitize" => ammonia::clean(&content),
            "format" => format_filter(&content, args),
            "default" => default_value(content, args),
            "replace" => replace(&content, args),
            "prefix" => prefix(content, args),
            "suffix" => suffix(content, args),
            "wrap" => wrap(content, args),
            "date" => date(&content, args),
            "intldate" => intl_date(&content, args),
            "number" => number(&content, args),
            "bytes" => bytes(&content, args),
            "slug" => slugify(&content),
            "url" => url(&content, args),
            "email" => email(&content, args),
            "widont" => widont(&content),
            "highlight" => highlight(&content),
            "json" => json(&content),
            "base64" => BASE64_STANDARD.encode(&content),
            "reverse" => content.chars().rev().collect(),
            "wordwrap" => wordwrap(&content, args),
            // unknown filter: ignore
            _ => content,
        };
    }

    content
}

// ========================================
// Argument helpers
// ========================================

fn arg<'a>(args: &'a [String], index: usize) -> Option<&'a str> {
    args.get(index).map(String::as_str)
}

fn arg_or<'a>(args: &'a [String], index: usize, default: &'a str) -> &'a str {
    arg(args, index).unwrap_or(default)
}

fn arg_usize(args: &[String], index: usize, default: usize) -> usize {
    arg(args, index)
        .and_then(|a| a.trim().parse().ok())
        .unwrap_or(default)
}

fn arg_bool(args: &[String], index: usize) -> bool {
    matches!(
        arg(args, index).map(str::trim),
        Some("1") | Some("true") | Some("yes")
    )
}

// ========================================
// Filter implementations
// ========================================

/// Title Case: every word starts uppercase, the rest is lowered.
fn title_case(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut at_word_start = true;

    for c in content.chars() {
        if c.is_whitespace() {
            out.push(c);
            at_word_start = true;
        } else if at_word_start {
            out.extend(c.to_uppercase());
            at_word_start = false;
        } else {
            out.extend(c.to_lowercase());
        }
    }

    out
}

/// First character uppercase, rest untouched.
fn capitalize(content: &str) -> String {
    let mut chars = content.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Limit to n characters. args: [0] length (default 80), [1] ellipsis
/// (default '…'), [2] break_words flag.
fn truncate(content: &str, args: &[String]) -> String {
    let length = arg_usize(args, 0, 80);
    let ellipsis = arg_or(args, 1, "…");
    let break_words = arg_bool(args, 2);

    if content.chars().count() <= length {
        return content.to_string();
    }

    let mut cut: String = content.chars().take(length).collect();

    if !break_words {
        if let Some(pos) = cut.rfind(char::is_whitespace) {
            cut.truncate(pos);
            cut = cut.trim_end().to_string();
        }
    }

    cut + ellipsis
}

/// Limit to n words. args: [0] word count (default 20), [1] suffix
/// (default '...').
fn words(content: &str, args: &[String]) -> String {
    let count = arg_usize(args, 0, 20);
    let suffix = arg_or(args, 1, "...");

    let all: Vec<&str> = content.split_whitespace().collect();

    if all.len() <= count {
        return content.to_string();
    }

    all[..count].join(" ") + suffix
}

/// Insert `<br>` before every newline.
fn nl2br(content: &str) -> String {
    content.replace("\r\n", "\n").replace('\n', "<br>\n")
}

/// Markdown to sanitized markup.
fn markdown(content: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(content, options);

    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);

    // Sanitize to prevent XSS from stored bodies
    ammonia::clean(&html_output)
}

static ALLOWED_TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<([a-zA-Z][a-zA-Z0-9]*)>").expect("Failed to compile tag regex"));

/// Remove markup. args: [0] allowed tags, e.g. `<p><br><strong>`.
fn strip_tags(content: &str, args: &[String]) -> String {
    let allowed = arg_or(args, 0, "");

    let tags: HashSet<&str> = ALLOWED_TAG_REGEX
        .captures_iter(allowed)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();

    ammonia::Builder::default()
        .tags(tags)
        .link_rel(None)
        .clean(content)
        .to_string()
}

/// sprintf-style formatting, subset: `%s`, `%d`, `%f` (with optional
/// precision), `%x`/`%X`, `%%`. One argument: the argument is the format
/// string and the content the value. Several arguments: the content is
/// the format string. Anything unparseable returns the content.
fn format_filter(content: &str, args: &[String]) -> String {
    if args.is_empty() {
        return content.to_string();
    }

    let (format, values): (&str, Vec<String>) = if args.len() == 1 {
        (args[0].as_str(), vec![content.to_string()])
    } else {
        (content, args.to_vec())
    };

    sprintf_subset(format, &values).unwrap_or_else(|| content.to_string())
}

fn sprintf_subset(format: &str, values: &[String]) -> Option<String> {
    let mut out = String::new();
    let mut vals = values.iter();
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        if chars.peek() == Some(&'%') {
            chars.next();
            out.push('%');
            continue;
        }

        let mut precision: Option<usize> = None;
        if chars.peek() == Some(&'.') {
            chars.next();
            let mut digits = String::new();
            while chars.peek().is_some_and(|d| d.is_ascii_digit()) {
                digits.push(chars.next()?);
            }
            precision = digits.parse().ok();
        }

        let conversion = chars.next()?;
        let value = vals.next()?;

        match conversion {
            's' => out.push_str(value),
            'd' => {
                let n = parse_i64(value)?;
                out.push_str(&n.to_string());
            }
            'f' => {
                let f: f64 = value.trim().parse().ok()?;
                out.push_str(&format!("{:.*}", precision.unwrap_or(6), f));
            }
            'x' => {
                let n = parse_i64(value)?;
                out.push_str(&format!("{:x}", n));
            }
            'X' => {
                let n = parse_i64(value)?;
                out.push_str(&format!("{:X}", n));
            }
            _ => return None,
        }
    }

    Some(out)
}

fn parse_i64(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    trimmed
        .parse::<i64>()
        .ok()
        .or_else(|| trimmed.parse::<f64>().ok().map(|f| f as i64))
}

/// Fallback when content is empty. args: [0] default value.
fn default_value(content: String, args: &[String]) -> String {
    if content.trim().is_empty() {
        return arg_or(args, 0, "").to_string();
    }

    content
}

/// Literal search/replace. args: [0] search, [1] replacement.
fn replace(content: &str, args: &[String]) -> String {
    let search = arg_or(args, 0, "");
    let replacement = arg_or(args, 1, "");

    if search.is_empty() {
        return content.to_string();
    }

    content.replace(search, replacement)
}

/// Prepend text, skipped when content is empty.
fn prefix(content: String, args: &[String]) -> String {
    if content.trim().is_empty() {
        return content;
    }

    format!("{}{}", arg_or(args, 0, ""), content)
}

/// Append text, skipped when content is empty.
fn suffix(content: String, args: &[String]) -> String {
    if content.trim().is_empty() {
        return content;
    }

    format!("{}{}", content, arg_or(args, 0, ""))
}

/// Surround with text. args: [0] before, [1] after (defaults to before).
fn wrap(content: String, args: &[String]) -> String {
    if content.trim().is_empty() {
        return content;
    }

    let before = arg_or(args, 0, "");
    let after = arg_or(args, 1, before);

    format!("{}{}{}", before, content, after)
}

fn parse_timestamp(content: &str) -> Option<DateTime<Utc>> {
    let trimmed = content.trim();

    if let Ok(epoch) = trimmed.parse::<i64>() {
        return Utc.timestamp_opt(epoch, 0).single();
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }

    if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }

    if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%d.%m.%Y") {
        return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }

    None
}

/// Format a datetime, refusing format strings chrono cannot express
/// instead of panicking mid-render.
fn format_datetime(dt: &DateTime<Utc>, format: &str) -> Option<String> {
    let items: Vec<Item> = StrftimeItems::new(format).collect();

    if items.iter().any(|item| matches!(item, Item::Error)) {
        return None;
    }

    Some(dt.format_with_items(items.iter()).to_string())
}

/// Format a date value. args: [0] strftime format (default `%d.%m.%Y`).
fn date(content: &str, args: &[String]) -> String {
    let format = arg_or(args, 0, "%d.%m.%Y");

    parse_timestamp(content)
        .and_then(|dt| format_datetime(&dt, format))
        .unwrap_or_else(|| content.to_string())
}

/// Format a date by style name. args: [0] FULL | LONG | MEDIUM | SHORT
/// (default MEDIUM).
fn intl_date(content: &str, args: &[String]) -> String {
    let format = match arg_or(args, 0, "MEDIUM").to_uppercase().as_str() {
        "FULL" => "%A, %d %B %Y",
        "LONG" => "%d %B %Y",
        "SHORT" => "%d/%m/%y",
        _ => "%d %b %Y",
    };

    parse_timestamp(content)
        .and_then(|dt| format_datetime(&dt, format))
        .unwrap_or_else(|| content.to_string())
}

fn format_number(value: f64, precision: usize, dec_point: &str, thousands_sep: &str) -> String {
    let formatted = format!("{:.*}", precision, value);

    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let negative = int_part.starts_with('-');
    let digits = int_part.trim_start_matches('-');

    let mut grouped = String::new();
    let len = digits.len();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push_str(thousands_sep);
        }
        grouped.push(c);
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push_str(dec_point);
        out.push_str(frac);
    }

    out
}

/// Format a number. args: [0] precision (default 2), [1] decimal point
/// (default ','), [2] thousands separator (default ' ').
fn number(content: &str, args: &[String]) -> String {
    let Ok(value) = content.trim().parse::<f64>() else {
        return content.to_string();
    };

    let precision = arg_usize(args, 0, 2);
    let dec_point = arg_or(args, 1, ",");
    let thousands_sep = arg_or(args, 2, " ");

    format_number(value, precision, dec_point, thousands_sep)
}

const BYTE_UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB", "PiB"];

/// Format a byte count with binary units. args: [0] precision (default 2).
fn bytes(content: &str, args: &[String]) -> String {
    let Ok(parsed) = content.trim().parse::<f64>() else {
        return content.to_string();
    };

    let precision = arg_usize(args, 0, 2);

    let mut value = parsed;
    let mut unit = 0;
    while value.abs() >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!(
        "{} {}",
        format_number(value, precision, ",", " "),
        BYTE_UNITS[unit]
    )
}

/// Render as a clickable link. args: [0] extra attribute string.
fn url(content: &str, args: &[String]) -> String {
    if content.trim().is_empty() {
        return content.to_string();
    }

    let href = if content.contains("://") {
        content.to_string()
    } else {
        format!("https://{}", content)
    };

    format!(
        r#"<a href="{}"{}>{}</a>"#,
        escape_html(&href),
        attr_suffix(args),
        escape_html(content)
    )
}

/// Render as a clickable e-mail address. args: [0] extra attribute string.
fn email(content: &str, args: &[String]) -> String {
    if content.trim().is_empty() {
        return content.to_string();
    }

    format!(
        r#"<a href="mailto:{}"{}>{}</a>"#,
        escape_html(content.trim()),
        attr_suffix(args),
        escape_html(content)
    )
}

fn attr_suffix(args: &[String]) -> String {
    let attr = arg_or(args, 0, "");

    if attr.is_empty() {
        String::new()
    } else if attr.starts_with(' ') {
        attr.to_string()
    } else {
        format!(" {}", attr)
    }
}

static WIDONT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+(\S+)\s*$").expect("Failed to compile widont regex"));

/// Glue the last two words together so no word stands alone on the
/// final line.
fn widont(content: &str) -> String {
    if content.split_whitespace().count() < 2 {
        return content.to_string();
    }

    WIDONT_REGEX.replace(content, "&nbsp;$1").into_owned()
}

/// Escaped code block.
fn highlight(content: &str) -> String {
    format!(
        r#"<pre class="highlight"><code>{}</code></pre>"#,
        escape_html(content)
    )
}

/// JSON string encoding.
fn json(content: &str) -> String {
    serde_json::to_string(content).unwrap_or_else(|_| content.to_string())
}

/// Wrap lines at a width, breaking long words. args: [0] width (default
/// 75), [1] break string (default '\n').
fn wordwrap(content: &str, args: &[String]) -> String {
    let width = arg_usize(args, 0, 75).max(1);
    let break_str = arg_or(args, 1, "\n");

    content
        .split('\n')
        .map(|line| wrap_line(line, width, break_str))
        .collect::<Vec<_>>()
        .join("\n")
}

fn wrap_line(line: &str, width: usize, break_str: &str) -> String {
    let mut segments: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in line.split(' ') {
        let mut word = word;

        loop {
            let current_len = current.chars().count();
            let word_len = word.chars().count();
            let needed = if current.is_empty() {
                word_len
            } else {
                current_len + 1 + word_len
            };

            if needed <= width {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
                break;
            }

            if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
                continue;
            }

            // single word longer than the width: hard break
            let head: String = word.chars().take(width).collect();
            segments.push(head.clone());
            word = &word[head.len()..];

            if word.is_empty() {
                break;
            }
        }
    }

    if !current.is_empty() {
        segments.push(current);
    }

    segments.join(break_str)
}
