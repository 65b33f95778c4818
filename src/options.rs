//! Engine configuration: separators, per-stream options, cancellation,
//! and the JSON rule-file format the CLI accepts

use crate::decoder::InputEncoding;
use crate::error::{EditError, EditResult};
use crate::processor::{Join, PostProcessFn};
use crate::rule::RuleSpec;
use regex::Regex;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// How incoming text is split into parts.
#[derive(Debug, Clone, Default)]
pub enum Separator {
    /// Split after every newline, keeping the line ending (including a
    /// preceding carriage return) at the end of each part.
    #[default]
    Line,
    /// Split on a literal delimiter; the delimiter is removed.
    Literal(String),
    /// Split on a regex; matched text is removed.
    Pattern(Regex),
    /// Never split: the whole stream is one part, processed at EOF.
    Whole,
}

impl Separator {
    /// Split one decoded chunk. Always yields at least one part.
    pub(crate) fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let parts: Vec<&'a str> = match self {
            Self::Line => text.split_inclusive('\n').collect(),
            Self::Literal(delim) => text.split(delim.as_str()).collect(),
            Self::Pattern(re) => re.split(text).collect(),
            Self::Whole => vec![text],
        };
        if parts.is_empty() {
            vec![""]
        } else {
            parts
        }
    }
}

/// Cooperative cancellation for in-flight edits. Clone it, hand one copy
/// to the operation, keep the other; `abort` stops the edit at the next
/// chunk boundary.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Options for one edit operation.
#[derive(Clone, Default)]
pub struct EditOptions {
    /// Substitution rules, applied in order to every part.
    pub rules: Vec<RuleSpec>,
    /// Stream-wide replacement cap shared by all rules. 0 means none.
    pub limit: usize,
    pub separator: Separator,
    /// Appended to each processed part except the last.
    pub join: Join,
    /// Overrides `join` entirely when set.
    pub post_processing: Option<PostProcessFn>,
    pub encoding: InputEncoding,
    /// When the limit fires: truncate the output instead of passing the
    /// remainder through untouched.
    pub truncate: bool,
    /// Largest a part buffer may grow while waiting for a separator.
    /// 0 means unbounded.
    pub max_length: usize,
    /// Written between sources when merging several into one output.
    pub content_join: String,
    pub abort: Option<AbortHandle>,
}

impl EditOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, spec: RuleSpec) -> Self {
        self.rules.push(spec);
        self
    }

    pub fn separator(mut self, separator: Separator) -> Self {
        self.separator = separator;
        self
    }

    pub fn join(mut self, join: Join) -> Self {
        self.join = join;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn truncate(mut self, truncate: bool) -> Self {
        self.truncate = truncate;
        self
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn content_join(mut self, text: impl Into<String>) -> Self {
        self.content_join = text.into();
        self
    }

    /// Boundary checks run once before a stream starts.
    pub fn validate(&self) -> EditResult<()> {
        if let Separator::Literal(delim) = &self.separator {
            if delim.is_empty() {
                return Err(EditError::config(
                    "literal separator must not be empty",
                ));
            }
        }
        Ok(())
    }
}

/// One rule as it appears in a JSON rule file.
///
/// `search` holds a regex source unless `literal` is set; `match` is
/// accepted as an alias for `search`. Unknown keys are rejected so a
/// typoed option fails loudly instead of silently matching nothing.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct RuleFileEntry {
    #[serde(alias = "match")]
    pub search: String,
    pub replacement: String,
    #[serde(default)]
    pub literal: bool,
    #[serde(default)]
    pub is_full_replacement: bool,
    #[serde(default)]
    pub disable_placeholders: bool,
    #[serde(default)]
    pub case_insensitive: bool,
    pub limit: Option<usize>,
    pub max_times: Option<usize>,
    pub min_times: Option<usize>,
    #[serde(default)]
    pub required: bool,
}

impl RuleFileEntry {
    pub fn into_spec(self) -> RuleSpec {
        let mut spec = if self.literal {
            RuleSpec::literal(self.search, self.replacement)
        } else {
            RuleSpec::pattern(self.search, self.replacement)
        };
        spec.is_full_replacement = self.is_full_replacement;
        spec.disable_placeholders = self.disable_placeholders;
        spec.case_insensitive = self.case_insensitive;
        spec.limit = self.limit;
        spec.max_times = self.max_times;
        spec.min_times = self.min_times;
        spec.required = self.required;
        spec
    }
}

/// Parse a JSON rule file: an array of rule objects.
pub fn parse_rule_file(json: &str) -> EditResult<Vec<RuleSpec>> {
    let entries: Vec<RuleFileEntry> = serde_json::from_str(json)
        .map_err(|e| EditError::config(format!("malformed rule file: {e}")))?;
    Ok(entries.into_iter().map(RuleFileEntry::into_spec).collect())
}
