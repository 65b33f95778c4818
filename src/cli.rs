use crate::decoder::InputEncoding;
use crate::error::EditError;
use crate::options::{self, EditOptions, Separator};
use crate::processor::Join;
use crate::rule::RuleSpec;
use anyhow::{Context, Result};
use clap::Parser;
use regex::Regex;
use std::fs;
use std::path::PathBuf;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "

Copyright (c) 2025 InkyQuill
License: MIT
Source: https://github.com/InkyQuill/stredit"
);

#[derive(Parser)]
#[command(name = "stredit")]
#[command(about = "Streaming search-and-replace for files and pipes")]
#[command(long_about = "stredit applies ordered substitution rules to a stream without ever
loading the whole input into memory.

Input is split into parts (lines by default), each part is run through
the rules in order, and results are written out as they complete. This
makes it safe on inputs far larger than RAM.

REPLACEMENT PLACEHOLDERS:
  $1..$999   nth capture group
  $&         the matched text
  $`         text before the match
  $'         text after the match
  $$         a literal dollar sign

PARTIAL REPLACEMENT:
  When the pattern has a capture group, only the group's text is
  replaced; the rest of the match is preserved around it. Use --full
  to replace the entire match instead.

STDIN/STDOUT:
  When no files are given, stredit reads stdin and writes stdout:
    cat access.log | stredit 'user=(\\w+)' 'REDACTED'
  With files, each one is edited in place through a temp file.

EXAMPLES:
  stredit 'v(\\d+)' '9' Cargo.toml            Bump only the captured digits
  stredit --literal 'a.b' 'x' notes.txt      Treat the search as plain text
  stredit --limit 1 'TODO' 'DONE' todo.md    Stop editing after 1 replacement
  stredit --rules rules.json big.ndjson      Apply a JSON rule file")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_version = LONG_VERSION)]
struct Cli {
    /// Search pattern (a regex unless --literal is given)
    #[arg(value_name = "PATTERN")]
    pattern: Option<String>,

    /// Replacement text; supports $-placeholders
    #[arg(value_name = "REPLACEMENT")]
    replacement: Option<String>,

    /// Files to edit in place; stdin/stdout when omitted
    #[arg(value_name = "FILE")]
    files: Vec<String>,

    /// Load additional rules from a JSON file (an array of rule objects)
    #[arg(short = 'r', long, value_name = "FILE")]
    rules: Option<PathBuf>,

    /// Treat the search pattern as literal text
    #[arg(short = 'l', long)]
    literal: bool,

    /// Case-insensitive matching
    #[arg(short = 'i', long)]
    ignore_case: bool,

    /// Replace the whole match even when the pattern has a capture group
    #[arg(short = 'f', long)]
    full: bool,

    /// Do not expand $-placeholders in the replacement
    #[arg(long = "no-placeholders")]
    no_placeholders: bool,

    /// Stop editing after N replacements across all rules
    #[arg(short = 'n', long, value_name = "N")]
    limit: Option<usize>,

    /// Cut the output short when the limit is reached instead of
    /// passing the rest through
    #[arg(long, requires = "limit")]
    truncate: bool,

    /// Retire the rule after N replacements
    #[arg(long, value_name = "N")]
    max_times: Option<usize>,

    /// Fail unless the rule replaced at least N times
    #[arg(long, value_name = "N")]
    min_times: Option<usize>,

    /// Fail unless the rule replaced at least once
    #[arg(long)]
    required: bool,

    /// Split parts on this regex instead of line endings
    #[arg(short = 's', long, value_name = "REGEX")]
    separator: Option<String>,

    /// Process the whole input as a single part
    #[arg(long, conflicts_with = "separator")]
    whole: bool,

    /// Text appended to every part except the last
    #[arg(short = 'j', long, value_name = "TEXT")]
    join: Option<String>,

    /// Largest a part may grow (in bytes) while waiting for a separator
    #[arg(long, value_name = "BYTES")]
    max_length: Option<usize>,

    /// Decode input as Latin-1 instead of UTF-8
    #[arg(long)]
    latin1: bool,

    /// Log engine activity to a debug log file
    #[arg(long)]
    debug: bool,
}

/// Everything main needs to run one edit.
pub struct Args {
    pub options: EditOptions,
    pub files: Vec<PathBuf>,
    pub debug: bool,
}

pub fn parse_args() -> Result<Args> {
    let cli = Cli::parse();
    build_args(cli)
}

fn build_args(cli: Cli) -> Result<Args> {
    let mut rules: Vec<RuleSpec> = Vec::new();

    if let Some(path) = &cli.rules {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read rule file: {}", path.display()))?;
        rules.extend(options::parse_rule_file(&json)?);
    }

    let mut files = cli.files;

    match (cli.pattern, cli.replacement) {
        // with a rule file, every positional is a file to edit
        (Some(pattern), Some(replacement)) if cli.rules.is_some() => {
            files.insert(0, replacement);
            files.insert(0, pattern);
        }
        (Some(pattern), None) if cli.rules.is_some() => {
            files.insert(0, pattern);
        }
        (Some(pattern), Some(replacement)) => {
            let mut spec = if cli.literal {
                RuleSpec::literal(pattern, replacement)
            } else {
                RuleSpec::pattern(pattern, replacement)
            };
            spec.is_full_replacement = cli.full;
            spec.disable_placeholders = cli.no_placeholders;
            spec.case_insensitive = cli.ignore_case;
            spec.max_times = cli.max_times;
            spec.min_times = cli.min_times;
            spec.required = cli.required;
            rules.push(spec);
        }
        (Some(_), None) => {
            anyhow::bail!("Missing replacement. Usage: stredit PATTERN REPLACEMENT [FILE...]");
        }
        (None, _) if cli.rules.is_none() => {
            anyhow::bail!("Nothing to do: give PATTERN and REPLACEMENT, or --rules FILE");
        }
        (None, _) => {}
    }

    let separator = if cli.whole {
        Separator::Whole
    } else if let Some(source) = &cli.separator {
        let re = Regex::new(source).map_err(|e| EditError::InvalidPattern {
            pattern: source.clone(),
            source: e,
        })?;
        Separator::Pattern(re)
    } else {
        Separator::Line
    };

    let mut opts = EditOptions::new();
    opts.rules = rules;
    opts.limit = cli.limit.unwrap_or(0);
    opts.truncate = cli.truncate;
    opts.separator = separator;
    opts.join = match cli.join {
        Some(text) => Join::Literal(text),
        None => Join::None,
    };
    opts.max_length = cli.max_length.unwrap_or(0);
    opts.encoding = if cli.latin1 {
        InputEncoding::Latin1
    } else {
        InputEncoding::Utf8
    };

    Ok(Args {
        options: opts,
        files: files.into_iter().map(PathBuf::from).collect(),
        debug: cli.debug,
    })
}
