//! Translation of stored, delimiter-wrapped regular expressions
//! (`/pattern/flags`, as the admin screens historically accepted) into
//! compiled [`regex::Regex`] values. A bare pattern without a
//! recognized delimiter is compiled as-is. Unsupported flags reject the
//! whole pattern so callers can fail closed.

use regex::Regex;

const DELIMITERS: &[char] = &['/', '#', '~', '%'];

/// Compile a stored pattern. Returns `None` when the pattern (or one of
/// its flags) cannot be expressed; callers treat that as "no match".
pub fn compile(pattern: &str) -> Option<Regex> {
    let trimmed = pattern.trim();

    if trimmed.is_empty() {
        return None;
    }

    let (body, flags) = split_delimited(trimmed)
        .unwrap_or_else(|| (trimmed.to_string(), String::new()));

    let mut inline = String::new();
    for flag in flags.chars() {
        match flag {
            'i' | 'm' | 's' | 'x' => inline.push(flag),
            // The regex crate is Unicode-aware by default
            'u' => {}
            _ => return None,
        }
    }

    let full = if inline.is_empty() {
        body
    } else {
        format!("(?{}){}", inline, body)
    };

    Regex::new(&full).ok()
}

/// Split `/body/flags` into body and flags when the first character is
/// a recognized delimiter with a matching closer.
fn split_delimited(pattern: &str) -> Option<(String, String)> {
    let delimiter = pattern.chars().next()?;

    if !DELIMITERS.contains(&delimiter) {
        return None;
    }

    let rest = &pattern[delimiter.len_utf8()..];
    let close = rest.rfind(delimiter)?;

    let body = rest[..close].to_string();
    let flags = rest[close + delimiter.len_utf8()..].to_string();

    Some((body, flags))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_compile_delimited_case_insensitive() {
        let re = compile("/foo/i").expect("pattern should compile");
        assert!(re.is_match("Foo"));
        assert!(re.is_match("foo"));
        assert_eq!(re.replace_all("Foo and foo", "bar"), "bar and bar");
    }

    #[test]
    fn test_compile_bare_pattern() {
        let re = compile(r"\d+").expect("pattern should compile");
        assert!(re.is_match("abc123"));
    }

    #[test]
    fn test_compile_alternate_delimiter() {
        let re = compile("#^/news/#").expect("pattern should compile");
        assert!(re.is_match("/news/2024"));
        assert!(!re.is_match("/blog/"));
    }

    #[test]
    fn test_compile_unicode_flag_is_accepted() {
        assert!(compile("/ä/iu").is_some());
    }

    #[test]
    fn test_compile_rejects_unknown_flag() {
        assert!(compile("/foo/e").is_none());
    }

    #[test]
    fn test_compile_rejects_invalid_pattern() {
        assert!(compile("/foo(/").is_none());
        assert!(compile("").is_none());
    }
}
