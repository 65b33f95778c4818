//! Pattern source manipulation for rule compilation
//!
//! Two jobs live here: escaping a literal search string into a regex
//! source, and the scanner that splits a pattern source around its first
//! top-level capture group for partial-replacement mode.

/// Escape a literal search string so it matches itself as a regex.
pub fn escape_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        if matches!(
            c,
            '[' | ']' | '\\' | '^' | '$' | '.' | '|' | '?' | '*' | '+' | '(' | ')' | '{' | '}'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// The three spans a partial-replacement pattern is split into.
///
/// `prefix` is everything before the first top-level capture group,
/// `body` is the group's content with its wrapping parens removed (taken
/// greedily to the last unescaped close paren), and `suffix` is the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitGroups {
    pub prefix: String,
    pub body: String,
    pub suffix: String,
}

/// Split a pattern source on its first unescaped capture group.
///
/// Any `(` immediately followed by `?` is skipped: that covers
/// non-capturing groups, inline flags, and named groups, none of which
/// can be the partial-replacement target. Returns `None` when no
/// eligible group exists, in which case the caller falls back to full
/// replacement.
pub fn split_first_capture_group(source: &str) -> Option<SplitGroups> {
    let bytes = source.as_bytes();

    let open = find_unescaped(bytes, 0, |bytes, i| {
        bytes[i] == b'(' && bytes.get(i + 1) != Some(&b'?')
    })?;

    // Body extends greedily to the last unescaped ')' after the opener.
    let mut close = None;
    let mut i = open + 1;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            i += 2;
            continue;
        }
        if bytes[i] == b')' {
            close = Some(i);
        }
        i += 1;
    }
    let close = close?;

    Some(SplitGroups {
        prefix: source[..open].to_string(),
        body: source[open + 1..close].to_string(),
        suffix: source[close + 1..].to_string(),
    })
}

/// Scan forward for the first position satisfying `pred`, honoring
/// backslash escapes.
fn find_unescaped(
    bytes: &[u8],
    start: usize,
    pred: impl Fn(&[u8], usize) -> bool,
) -> Option<usize> {
    let mut i = start;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            i += 2;
            continue;
        }
        if pred(bytes, i) {
            return Some(i);
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_literal_plain() {
        assert_eq!(escape_literal("hello"), "hello");
    }

    #[test]
    fn test_escape_literal_metacharacters() {
        assert_eq!(escape_literal("a.b*c"), r"a\.b\*c");
        assert_eq!(escape_literal("(x)"), r"\(x\)");
        assert_eq!(escape_literal("[a-z]+?"), r"\[a-z\]\+\?");
        assert_eq!(escape_literal(r"\d"), r"\\d");
        assert_eq!(escape_literal("$1"), r"\$1");
    }

    #[test]
    fn test_escaped_literal_round_trips_through_regex() {
        let re = regex::Regex::new(&escape_literal("a.b(c)*")).unwrap();
        assert!(re.is_match("xx a.b(c)* yy"));
        assert!(!re.is_match("aXb(c)*"));
    }

    #[test]
    fn test_split_simple_group() {
        let split = split_first_capture_group(r"pre(body)post").unwrap();
        assert_eq!(split.prefix, "pre");
        assert_eq!(split.body, "body");
        assert_eq!(split.suffix, "post");
    }

    #[test]
    fn test_split_no_group() {
        assert_eq!(split_first_capture_group("abc"), None);
        assert_eq!(split_first_capture_group(r"a\(b\)c"), None);
    }

    #[test]
    fn test_split_skips_non_capturing_and_named() {
        let split = split_first_capture_group(r"(?:x)(target)").unwrap();
        assert_eq!(split.prefix, "(?:x)");
        assert_eq!(split.body, "target");

        let split = split_first_capture_group(r"(?i)a(b)").unwrap();
        assert_eq!(split.prefix, "(?i)a");
        assert_eq!(split.body, "b");

        // Named groups are not eligible split targets either
        assert_eq!(split_first_capture_group(r"(?<n>x)"), None);
    }

    #[test]
    fn test_split_body_is_greedy_to_last_close() {
        // Nested groups are swallowed whole into the body
        let split = split_first_capture_group(r"a((b)c)d").unwrap();
        assert_eq!(split.prefix, "a");
        assert_eq!(split.body, "(b)c");
        assert_eq!(split.suffix, "d");

        // Two sibling groups: the body runs to the last close paren
        let split = split_first_capture_group(r"(x)y(z)").unwrap();
        assert_eq!(split.prefix, "");
        assert_eq!(split.body, "x)y(z");
        assert_eq!(split.suffix, "");
    }

    #[test]
    fn test_split_ignores_escaped_close() {
        let split = split_first_capture_group(r"(a\))b").unwrap();
        assert_eq!(split.body, r"a\)");
        assert_eq!(split.suffix, "b");
    }

    #[test]
    fn test_split_unclosed_group() {
        assert_eq!(split_first_capture_group("(abc"), None);
    }
}
