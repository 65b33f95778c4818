//! Rule compilation: turning user-supplied search/replacement
//! specifications into compiled, counter-carrying rules
//!
//! A `RuleSpec` is what callers build; `RuleSet::compile` turns a slice
//! of them into `Rule`s plus the shared `Channel` that tracks the global
//! match counter and the one-shot limit notification. All counters live
//! as plain struct fields so rule state is inspectable and never hidden
//! inside closures.

use crate::error::{EditError, EditResult};
use crate::pattern::{escape_literal, split_first_capture_group};
use crate::placeholder::{self, PlaceholderContext};
use regex::{Captures, Regex, RegexBuilder};
use std::sync::Arc;

/// What a replacement function sees for one match.
///
/// In full-replacement mode `matched` is the whole match, `offset` is its
/// position within the part, and `input` is the part text. In partial mode
/// `matched` is the captured substring, `offset` its position within the
/// whole match, and `input` the whole match.
pub struct MatchContext<'a> {
    pub matched: &'a str,
    pub groups: Vec<Option<&'a str>>,
    pub offset: usize,
    pub input: &'a str,
}

/// A user-supplied replacement function.
pub type ReplacementFn = Arc<dyn Fn(&MatchContext<'_>) -> String + Send + Sync>;

/// The search side of a rule: a literal string (escaped and matched
/// verbatim, always full replacement) or a regex source.
#[derive(Clone)]
pub enum Search {
    Literal(String),
    Pattern(String),
}

/// The replacement side of a rule.
#[derive(Clone)]
pub enum ReplacementSpec {
    Text(String),
    Func(ReplacementFn),
}

/// One substitution rule as specified by the caller.
#[derive(Clone)]
pub struct RuleSpec {
    pub search: Search,
    pub replacement: ReplacementSpec,
    /// Force replacing the entire match even when the pattern has a
    /// capture group. Literal searches and group-less patterns are full
    /// replacements regardless.
    pub is_full_replacement: bool,
    /// Skip `$`-placeholder expansion in string replacements.
    pub disable_placeholders: bool,
    pub case_insensitive: bool,
    /// Per-rule replacement cap; reaching it triggers the stream-wide
    /// limit transition. 0 means unlimited.
    pub limit: Option<usize>,
    /// Retire the rule after this many invocations. 0 means never.
    pub max_times: Option<usize>,
    /// Fail the operation at completion if the rule fired fewer times.
    pub min_times: Option<usize>,
    /// Shorthand for `min_times: 1`.
    pub required: bool,
}

impl RuleSpec {
    pub fn new(search: Search, replacement: ReplacementSpec) -> Self {
        Self {
            search,
            replacement,
            is_full_replacement: false,
            disable_placeholders: false,
            case_insensitive: false,
            limit: None,
            max_times: None,
            min_times: None,
            required: false,
        }
    }

    /// Convenience constructor for a regex search with a string replacement.
    pub fn pattern(source: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self::new(
            Search::Pattern(source.into()),
            ReplacementSpec::Text(replacement.into()),
        )
    }

    /// Convenience constructor for a literal search with a string replacement.
    pub fn literal(search: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self::new(
            Search::Literal(search.into()),
            ReplacementSpec::Text(replacement.into()),
        )
    }
}

/// Result of poking the channel's one-shot limit notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notify {
    /// The limit was just reached; the triggering match is still replaced.
    First,
    /// Someone already fired the notification; pass the match through.
    AlreadyNotified,
}

/// Shared per-stream state: the global counter/limit and the one-shot
/// limit-reached flag the transform watches.
#[derive(Debug)]
pub struct Channel {
    global_limit: usize,
    global_counter: usize,
    notified: bool,
    /// True when any rule enforces a limit, so the transform knows to
    /// watch for the transition at all.
    pub with_limit: bool,
}

impl Channel {
    fn new(global_limit: usize) -> Self {
        Self {
            global_limit,
            global_counter: 0,
            notified: false,
            with_limit: false,
        }
    }

    /// Idempotent limit notification. The first call flips the
    /// limit-reached state; repeats report `AlreadyNotified`.
    pub fn notify(&mut self) -> Notify {
        if self.notified {
            Notify::AlreadyNotified
        } else {
            self.notified = true;
            Notify::First
        }
    }

    /// Whether the limit transition has fired for this stream.
    pub fn limit_reached(&self) -> bool {
        self.notified
    }
}

enum Mode {
    Full,
    /// Pattern was rewritten to `(prefix)(body)suffix`; only group 2's
    /// span is substituted.
    Partial,
}

enum CompiledReplacement {
    Text { raw: String, expand: bool },
    Func(ReplacementFn),
}

/// A compiled rule with its private counters.
pub struct Rule {
    pattern: Regex,
    pattern_source: String,
    mode: Mode,
    replacement: CompiledReplacement,
    limit: Option<usize>,
    limit_counter: usize,
    /// Whether this rule participates in limit counting at all (it does
    /// when it has a local limit or a global limit is configured).
    limit_wrapped: bool,
    max_times: Option<usize>,
    max_counter: usize,
    retired: bool,
    min_times: Option<usize>,
    min_counter: usize,
}

impl Rule {
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub fn is_retired(&self) -> bool {
        self.retired
    }

    /// Apply this rule to one match, updating counters.
    ///
    /// Evaluation order within an invocation is fixed: min-times
    /// observation, then max-times retirement, then the limit check.
    /// The occurrence that retires the rule or first reaches a limit is
    /// still replaced; later occurrences pass through unmodified.
    pub(crate) fn apply(
        &mut self,
        caps: &Captures<'_>,
        part: &str,
        channel: &mut Channel,
    ) -> String {
        let whole = caps.get(0).expect("group 0 always participates");

        if self.min_times.is_some() {
            self.min_counter += 1;
        }

        if let Some(max) = self.max_times {
            self.max_counter += 1;
            if self.max_counter >= max {
                if self.retired {
                    return whole.as_str().to_string();
                }
                self.retired = true;
            }
        }

        if self.limit_wrapped {
            let mut reached = false;
            if channel.global_limit > 0 {
                channel.global_counter += 1;
                reached = channel.global_counter >= channel.global_limit;
            }
            if !reached {
                self.limit_counter += 1;
                if let Some(lim) = self.limit {
                    reached = self.limit_counter >= lim;
                }
            }
            if reached && channel.notify() == Notify::AlreadyNotified {
                return whole.as_str().to_string();
            }
        }

        match self.mode {
            Mode::Full => self.substitute_full(caps, part),
            Mode::Partial => self.substitute_partial(caps),
        }
    }

    fn substitute_full(&self, caps: &Captures<'_>, part: &str) -> String {
        let whole = caps.get(0).expect("group 0 always participates");
        let groups: Vec<Option<&str>> = (1..caps.len())
            .map(|i| caps.get(i).map(|m| m.as_str()))
            .collect();

        match &self.replacement {
            CompiledReplacement::Text { raw, expand: false } => raw.clone(),
            CompiledReplacement::Text { raw, expand: true } => placeholder::expand(
                raw,
                &PlaceholderContext {
                    matched: whole.as_str(),
                    groups: &groups,
                    preceding: &part[..whole.start()],
                    following: &part[whole.end()..],
                },
            ),
            CompiledReplacement::Func(f) => f(&MatchContext {
                matched: whole.as_str(),
                groups,
                offset: whole.start(),
                input: part,
            }),
        }
    }

    fn substitute_partial(&self, caps: &Captures<'_>) -> String {
        let whole = caps.get(0).expect("group 0 always participates").as_str();
        // Groups 1 and 2 are the wrapping the compiler added; they open
        // at the match start and abut each other.
        let prefix = caps.get(1).map_or("", |m| m.as_str());
        let substr = caps.get(2).map_or("", |m| m.as_str());
        let suffix = &whole[prefix.len() + substr.len()..];

        // User-visible groups: the captured substring first, then any
        // groups nested deeper in the original pattern.
        let mut groups: Vec<Option<&str>> = vec![Some(substr)];
        groups.extend((3..caps.len()).map(|i| caps.get(i).map(|m| m.as_str())));

        let replaced = match &self.replacement {
            CompiledReplacement::Text { raw, expand: false } => raw.clone(),
            CompiledReplacement::Text { raw, expand: true } => placeholder::expand(
                raw,
                &PlaceholderContext {
                    matched: substr,
                    groups: &groups,
                    preceding: prefix,
                    following: suffix,
                },
            ),
            CompiledReplacement::Func(f) => f(&MatchContext {
                matched: substr,
                groups,
                offset: prefix.len(),
                input: whole,
            }),
        };

        format!("{prefix}{replaced}{suffix}")
    }
}

/// The ordered rule collection plus its shared channel.
pub struct RuleSet {
    rules: Vec<Rule>,
    channel: Channel,
}

impl RuleSet {
    /// Compile rule specifications against an optional global limit.
    ///
    /// Counters start at zero; callers that process multiple independent
    /// streams recompile per stream so counts never leak across them.
    pub fn compile(specs: &[RuleSpec], global_limit: usize) -> EditResult<Self> {
        let mut channel = Channel::new(global_limit);
        let rules = specs
            .iter()
            .map(|spec| compile_rule(spec, global_limit))
            .collect::<EditResult<Vec<_>>>()?;
        channel.with_limit = rules.iter().any(|r| r.limit_wrapped);
        Ok(Self { rules, channel })
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Split borrow for the part processor's rule-application loop.
    pub(crate) fn split_mut(&mut self) -> (&mut [Rule], &mut Channel) {
        (&mut self.rules, &mut self.channel)
    }

    /// Post-completion assertions: every rule with `min_times` must have
    /// fired at least that often.
    pub fn finalize(&self) -> EditResult<()> {
        for rule in &self.rules {
            if let Some(min) = rule.min_times {
                if rule.min_counter < min {
                    return Err(EditError::MinTimesUnmet {
                        pattern: rule.pattern_source.clone(),
                        expected: min,
                        actual: rule.min_counter,
                    });
                }
            }
        }
        Ok(())
    }
}

fn compile_rule(spec: &RuleSpec, global_limit: usize) -> EditResult<Rule> {
    let (source, literal) = match &spec.search {
        Search::Literal(s) => (escape_literal(s), true),
        Search::Pattern(p) => (p.clone(), false),
    };

    // A literal search is always a full replacement; so is a pattern
    // with no eligible capture group to isolate.
    let full = spec.is_full_replacement || literal;
    let split = if full {
        None
    } else {
        split_first_capture_group(&source)
    };

    let (final_source, mode) = match split {
        Some(sg) => (
            format!("({})({}){}", sg.prefix, sg.body, sg.suffix),
            Mode::Partial,
        ),
        None => (source, Mode::Full),
    };

    let pattern = RegexBuilder::new(&final_source)
        .case_insensitive(spec.case_insensitive)
        .build()
        .map_err(|e| EditError::InvalidPattern {
            pattern: final_source.clone(),
            source: e,
        })?;

    let replacement = match &spec.replacement {
        ReplacementSpec::Text(raw) => CompiledReplacement::Text {
            raw: raw.clone(),
            expand: !spec.disable_placeholders && placeholder::has_placeholders(raw),
        },
        ReplacementSpec::Func(f) => CompiledReplacement::Func(Arc::clone(f)),
    };

    // 0 is treated as "unlimited" for all of the count options
    let limit = spec.limit.filter(|&n| n >= 1);
    let max_times = spec.max_times.filter(|&n| n >= 1);
    let min_times = match spec.min_times.filter(|&n| n >= 1) {
        Some(n) => Some(n),
        None if spec.required => Some(1),
        None => None,
    };

    Ok(Rule {
        pattern,
        pattern_source: final_source,
        mode,
        replacement,
        limit_wrapped: limit.is_some() || global_limit > 0,
        limit,
        limit_counter: 0,
        max_times,
        max_counter: 0,
        retired: false,
        min_times,
        min_counter: 0,
    })
}
