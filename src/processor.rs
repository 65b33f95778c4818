//! Applying a rule set to one completed part
//!
//! The part processor runs every live rule over the part text in rule
//! order, splicing replacements left to right, then applies the
//! post-processing step (normally re-appending the join text to every
//! part except the last).

use crate::rule::{Channel, Rule, RuleSet};
use std::sync::Arc;

/// What gets appended to each processed part except the stream's last.
#[derive(Clone, Default)]
pub enum Join {
    /// Leave parts as the separator split them.
    #[default]
    None,
    /// Append this text to every non-final part.
    Literal(String),
    /// Compute the append from the processed part.
    Func(Arc<dyn Fn(&str) -> String + Send + Sync>),
}

/// A caller-supplied post-processing hook. Receives the processed part
/// and whether it is the stream's final part; its return value replaces
/// the part entirely.
pub type PostProcessFn = Arc<dyn Fn(&str, bool) -> String + Send + Sync>;

/// The step run on each part after rule application.
#[derive(Clone)]
pub enum PostProcessing {
    Join(Join),
    Custom(PostProcessFn),
}

impl PostProcessing {
    fn apply(&self, part: String, is_last: bool) -> String {
        match self {
            Self::Custom(f) => f(&part, is_last),
            Self::Join(_) if is_last => part,
            Self::Join(Join::None) => part,
            Self::Join(Join::Literal(text)) => part + text,
            Self::Join(Join::Func(f)) => {
                let appended = f(&part);
                part + &appended
            }
        }
    }
}

/// Applies an ordered rule set plus post-processing to stream parts.
pub struct PartProcessor {
    rules: RuleSet,
    post: PostProcessing,
}

impl PartProcessor {
    pub fn new(rules: RuleSet, post: PostProcessing) -> Self {
        Self { rules, post }
    }

    /// Run all rules over one part, then post-process it.
    pub fn process(&mut self, part: &str, is_last: bool) -> String {
        let (rules, channel) = self.rules.split_mut();
        let mut text = part.to_string();
        for rule in rules.iter_mut() {
            if rule.is_retired() {
                continue;
            }
            text = apply_rule(rule, &text, channel);
        }
        self.post.apply(text, is_last)
    }

    /// Whether the stream-wide replacement limit has fired.
    pub fn limit_reached(&self) -> bool {
        self.rules.channel().limit_reached()
    }

    pub fn finalize(&self) -> crate::error::EditResult<()> {
        self.rules.finalize()
    }
}

/// Replace every match of one rule within `input`, left to right.
///
/// A zero-width match advances the scan position by one character so a
/// pattern that matches the empty string cannot loop forever.
fn apply_rule(rule: &mut Rule, input: &str, channel: &mut Channel) -> String {
    let mut out = String::with_capacity(input.len());
    let mut copied = 0;
    let mut pos = 0;

    while pos <= input.len() {
        let Some(caps) = rule.pattern().captures_at(input, pos) else {
            break;
        };
        let m = caps.get(0).expect("group 0 always participates");
        let (start, end) = (m.start(), m.end());

        let replaced = rule.apply(&caps, input, channel);
        out.push_str(&input[copied..start]);
        out.push_str(&replaced);
        copied = end;

        if end == start {
            match input[end..].chars().next() {
                Some(c) => pos = end + c.len_utf8(),
                None => break,
            }
        } else {
            pos = end;
        }
    }

    out.push_str(&input[copied..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RuleSpec;

    fn processor(specs: &[RuleSpec], global_limit: usize, post: PostProcessing) -> PartProcessor {
        let rules = RuleSet::compile(specs, global_limit).unwrap();
        PartProcessor::new(rules, post)
    }

    #[test]
    fn test_replaces_all_matches_in_order() {
        let mut p = processor(
            &[RuleSpec::literal("a", "X")],
            0,
            PostProcessing::Join(Join::None),
        );
        assert_eq!(p.process("a-a-a", true), "X-X-X");
    }

    #[test]
    fn test_rules_apply_in_sequence() {
        let mut p = processor(
            &[RuleSpec::literal("a", "b"), RuleSpec::literal("b", "c")],
            0,
            PostProcessing::Join(Join::None),
        );
        // the second rule sees the first rule's output
        assert_eq!(p.process("a", true), "c");
    }

    #[test]
    fn test_zero_width_match_makes_progress() {
        let mut spec = RuleSpec::pattern("x*", "<>");
        spec.is_full_replacement = true;
        let mut p = processor(&[spec], 0, PostProcessing::Join(Join::None));
        // must terminate; every position gets one replacement
        let out = p.process("ab", true);
        assert_eq!(out, "<>a<>b<>");
    }

    #[test]
    fn test_max_times_stops_midway_through_part() {
        let mut spec = RuleSpec::literal("a", "X");
        spec.max_times = Some(2);
        let mut p = processor(&[spec], 0, PostProcessing::Join(Join::None));
        assert_eq!(p.process("aaaa", true), "XXaa");
    }

    #[test]
    fn test_limit_replaces_final_match_then_passes_through() {
        let mut spec = RuleSpec::literal("a", "X");
        spec.limit = Some(2);
        let mut p = processor(&[spec], 0, PostProcessing::Join(Join::None));
        assert_eq!(p.process("aaaa", true), "XXaa");
        assert!(p.limit_reached());
    }

    #[test]
    fn test_join_literal_appended_except_last() {
        let mut p = processor(&[], 0, PostProcessing::Join(Join::Literal("\n".into())));
        assert_eq!(p.process("one", false), "one\n");
        assert_eq!(p.process("two", true), "two");
    }

    #[test]
    fn test_join_func_sees_processed_part() {
        let join = Join::Func(Arc::new(|part: &str| format!("[{}]", part.len())));
        let mut p = processor(
            &[RuleSpec::literal("aa", "b")],
            0,
            PostProcessing::Join(join),
        );
        assert_eq!(p.process("aa", false), "b[1]");
    }

    #[test]
    fn test_custom_post_processing_replaces_part() {
        let post = PostProcessing::Custom(Arc::new(|part: &str, is_last: bool| {
            if is_last {
                part.to_uppercase()
            } else {
                format!("{part};")
            }
        }));
        let mut p = processor(&[], 0, post);
        assert_eq!(p.process("mid", false), "mid;");
        assert_eq!(p.process("end", true), "END");
    }

    #[test]
    fn test_partial_replacement_within_part() {
        let mut p = processor(
            &[RuleSpec::pattern(r"v(\d+)", "N")],
            0,
            PostProcessing::Join(Join::None),
        );
        assert_eq!(p.process("v1 and v22", true), "vN and vN");
    }
}
