//! Capture-group placeholder expansion for string replacements
//!
//! Supports `$1`..`$999` (nth capture group), `$&` (matched text),
//! `` $` `` (text before the match), `$'` (text after the match) and
//! `$$` (a literal dollar sign). Expansion runs in two passes like a
//! conventional replace: tokens first, then `$$`, so a dollar produced
//! by `$$` can never combine with following digits into a new token.

use tracing::warn;

/// Per-match substitution context. In full-replacement mode `matched` is
/// the whole match and `preceding`/`following` are the surrounding part
/// text; in partial mode `matched` is the captured substring and the
/// surroundings are the matched prefix/suffix.
pub struct PlaceholderContext<'a> {
    pub matched: &'a str,
    pub groups: &'a [Option<&'a str>],
    pub preceding: &'a str,
    pub following: &'a str,
}

/// Whether a replacement string contains at least one expandable token.
pub fn has_placeholders(replacement: &str) -> bool {
    let bytes = replacement.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            i += 2;
            continue;
        }
        if bytes[i] == b'$' && token_len(&bytes[i + 1..]) > 0 {
            return true;
        }
        i += 1;
    }
    false
}

/// Expand every placeholder in `replacement` against one match.
///
/// An out-of-range group index logs a warning and leaves the token text
/// as a literal; an in-range group that did not participate in the match
/// expands to the empty string.
pub fn expand(replacement: &str, ctx: &PlaceholderContext<'_>) -> String {
    let bytes = replacement.as_bytes();
    let mut out = String::with_capacity(replacement.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\\' {
            // Escaped dollar stays literal, backslash included
            out.push('\\');
            if i + 1 < bytes.len() {
                out.push_str(&replacement[i + 1..][..char_len(&replacement[i + 1..])]);
                i += 1 + char_len(&replacement[i + 1..]);
            } else {
                i += 1;
            }
            continue;
        }

        if bytes[i] == b'$' {
            let len = token_len(&bytes[i + 1..]);
            if len > 0 {
                let token = &replacement[i + 1..i + 1 + len];
                match token {
                    "&" => out.push_str(ctx.matched),
                    "`" => out.push_str(ctx.preceding),
                    "'" => out.push_str(ctx.following),
                    digits => {
                        let n: usize = digits.parse().expect("token is 1-3 digits");
                        match ctx.groups.get(n - 1) {
                            Some(group) => out.push_str(group.unwrap_or("")),
                            None => {
                                warn!(
                                    "${} is not satisfiable for '{}' with capture groups [ {} ]",
                                    digits,
                                    ctx.matched,
                                    ctx.groups
                                        .iter()
                                        .map(|g| g.unwrap_or(""))
                                        .collect::<Vec<_>>()
                                        .join(", ")
                                );
                                out.push('$');
                                out.push_str(digits);
                            }
                        }
                    }
                }
                i += 1 + len;
                continue;
            }
        }

        let len = char_len(&replacement[i..]);
        out.push_str(&replacement[i..i + len]);
        i += len;
    }

    // Second pass: literal dollars, resolved last
    out.replace("$$", "$")
}

/// Length in bytes of the token following a `$`, or 0 if none.
/// Tokens are `&`, `` ` ``, `'`, or one to three digits from 1-9.
fn token_len(rest: &[u8]) -> usize {
    match rest.first() {
        Some(b'&') | Some(b'`') | Some(b'\'') => 1,
        Some(b'1'..=b'9') => rest
            .iter()
            .take(3)
            .take_while(|b| (b'1'..=b'9').contains(b))
            .count(),
        _ => 0,
    }
}

fn char_len(s: &str) -> usize {
    s.chars().next().map_or(0, char::len_utf8)
}
