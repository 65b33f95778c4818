//! Property-based tests for the streaming edit engine
//!
//! Uses proptest to verify invariants that must hold regardless of input
//! shape: chunking must never change output, counters must honor their
//! thresholds, and pass-through configurations must be lossless.

use std::io::Cursor;

use proptest::prelude::*;
use stredit::processor::Join;
use stredit::{process_streaming, EditOptions, RuleSpec, Separator};

/// Run one input through the engine and collect the output as a string.
fn edit(input: &str, options: &EditOptions) -> String {
    let mut source = Cursor::new(input.as_bytes().to_vec());
    let mut dest = Vec::new();
    process_streaming(&mut source, &mut dest, options).unwrap();
    String::from_utf8(dest).unwrap()
}

/// Same, but feeding the input in chunks of the given sizes (the final
/// remainder goes in one last chunk).
fn edit_chunked(input: &str, options: &EditOptions, sizes: &[usize]) -> String {
    use stredit::{ChunkOutcome, StreamTransform};

    let bytes = input.as_bytes();
    let mut transform = StreamTransform::new(options).unwrap();
    let mut out = Vec::new();
    let mut offset = 0;

    for &size in sizes {
        if offset >= bytes.len() {
            break;
        }
        let end = (offset + size.max(1)).min(bytes.len());
        let outcome = transform.push_chunk(&bytes[offset..end], &mut out).unwrap();
        offset = end;
        if outcome == ChunkOutcome::Ended {
            transform.finalize_rules().unwrap();
            return out.concat();
        }
    }
    if offset < bytes.len() {
        transform.push_chunk(&bytes[offset..], &mut out).unwrap();
    }
    transform.finish(&mut out).unwrap();
    transform.finalize_rules().unwrap();
    out.concat()
}

// ============================================================================
// Property 1: Chunking invariance
// ============================================================================
// Byte chunk boundaries are an accident of transport and must never be
// visible in the output.

proptest! {
    #[test]
    fn prop_chunk_boundaries_do_not_change_output(
        lines in prop::collection::vec("[a-z ]{0,30}", 0..20),
        sizes in prop::collection::vec(1usize..13, 1..40)
    ) {
        let input = lines.join("\n");
        let opts = EditOptions::new().rule(RuleSpec::literal("a", "A"));

        let whole = edit(&input, &opts);
        let chunked = edit_chunked(&input, &opts, &sizes);
        prop_assert_eq!(whole, chunked);
    }

    #[test]
    fn prop_chunking_invariant_with_multibyte_input(
        words in prop::collection::vec("[aé𝄞]{0,8}", 0..15),
        sizes in prop::collection::vec(1usize..5, 1..60)
    ) {
        let input = words.join("\n");
        let opts = EditOptions::new().rule(RuleSpec::literal("é", "e"));

        let whole = edit(&input, &opts);
        let chunked = edit_chunked(&input, &opts, &sizes);
        prop_assert_eq!(whole, chunked);
    }
}

// ============================================================================
// Property 2: Pass-through configurations are lossless
// ============================================================================

proptest! {
    /// No rules at all: the stream comes out byte-identical.
    #[test]
    fn prop_no_rules_is_identity(input in "[ -~\n]{0,300}") {
        let opts = EditOptions::new();
        prop_assert_eq!(edit(&input, &opts), input);
    }

    /// A rule that cannot match leaves the stream untouched.
    #[test]
    fn prop_non_matching_rule_is_identity(input in "[a-m\n]{0,200}") {
        let opts = EditOptions::new().rule(RuleSpec::literal("zzz", "XXX"));
        prop_assert_eq!(edit(&input, &opts), input);
    }

    /// Splitting on a literal separator and joining with the same text
    /// reconstructs the input exactly.
    #[test]
    fn prop_separator_join_round_trip(
        fields in prop::collection::vec("[a-z]{0,10}", 1..20)
    ) {
        let input = fields.join(",");
        let opts = EditOptions::new()
            .separator(Separator::Literal(",".to_string()))
            .join(Join::Literal(",".to_string()));
        prop_assert_eq!(edit(&input, &opts), input);
    }
}

// ============================================================================
// Property 3: Replacement semantics
// ============================================================================

proptest! {
    /// A full-replacement rule on a literal target behaves exactly like
    /// a global replace over the whole text.
    #[test]
    fn prop_literal_rule_matches_global_replace(
        lines in prop::collection::vec("[a-f]{0,25}", 0..20)
    ) {
        let input = lines.join("\n");
        let opts = EditOptions::new().rule(RuleSpec::literal("ab", "<>"));
        prop_assert_eq!(edit(&input, &opts), input.replace("ab", "<>"));
    }

    /// Applying a replacement whose output cannot re-match is idempotent.
    #[test]
    fn prop_non_overlapping_replacement_is_idempotent(input in "[a-c\n]{0,150}") {
        let opts = EditOptions::new().rule(RuleSpec::literal("a", "x"));
        let once = edit(&input, &opts);
        let twice = edit(&once, &opts);
        prop_assert_eq!(once, twice);
    }

    /// Partial replacement keeps everything around the capture group.
    #[test]
    fn prop_partial_replacement_preserves_surroundings(
        name in "[a-z]{1,10}",
        value in "[0-9]{1,6}"
    ) {
        let input = format!("{name}={value};");
        let opts = EditOptions::new()
            .rule(RuleSpec::pattern(r"[a-z]+=([0-9]+);", "N"));
        let expected = format!("{name}=N;");
        prop_assert_eq!(edit(&input, &opts), expected);
    }
}

// ============================================================================
// Property 4: Counters honor their thresholds
// ============================================================================

proptest! {
    /// max_times: 1 replaces exactly the first occurrence.
    #[test]
    fn prop_max_times_one_replaces_first_only(count in 1usize..20) {
        let input = "a".repeat(count);
        let mut spec = RuleSpec::literal("a", "B");
        spec.max_times = Some(1);
        let opts = EditOptions::new().rule(spec);

        let out = edit(&input, &opts);
        let expected = format!("B{}", "a".repeat(count - 1));
        prop_assert_eq!(out, expected);
    }

    /// With a stream-wide limit, the number of replacements never
    /// exceeds it and the remainder survives verbatim.
    #[test]
    fn prop_limit_caps_replacements(
        count in 1usize..30,
        limit in 1usize..10
    ) {
        let input = (0..count).map(|_| "a\n").collect::<String>();
        let opts = EditOptions::new()
            .rule(RuleSpec::literal("a", "B"))
            .limit(limit);

        let out = edit(&input, &opts);
        let replaced = out.matches('B').count();
        prop_assert_eq!(replaced, count.min(limit));
        prop_assert_eq!(out.matches('a').count(), count - replaced);
        // nothing is lost, only substituted
        prop_assert_eq!(out.len(), input.len());
    }

    /// With truncation on, output stops once the limit fires.
    #[test]
    fn prop_truncate_stops_at_limit(count in 2usize..30) {
        let input = (0..count).map(|_| "a\n").collect::<String>();
        let opts = EditOptions::new()
            .rule(RuleSpec::literal("a", "B"))
            .limit(1)
            .truncate(true);

        let out = edit(&input, &opts);
        prop_assert_eq!(out, "B\n");
    }

    /// min_times fails exactly when there were fewer matches than asked.
    #[test]
    fn prop_min_times_threshold(count in 0usize..6, min in 1usize..6) {
        let input = "a ".repeat(count);
        let mut spec = RuleSpec::literal("a", "A");
        spec.min_times = Some(min);
        let opts = EditOptions::new().rule(spec);

        let mut source = Cursor::new(input.into_bytes());
        let mut dest = Vec::new();
        let result = process_streaming(&mut source, &mut dest, &opts);
        prop_assert_eq!(result.is_ok(), count >= min);
    }
}

// ============================================================================
// Property 5: Buffer bounds
// ============================================================================

proptest! {
    /// Input that keeps producing separators never overflows, no matter
    /// how long the stream is overall.
    #[test]
    fn prop_short_parts_never_overflow(count in 1usize..50) {
        let input = "abcd\n".repeat(count);
        let opts = EditOptions::new().max_length(16);
        prop_assert_eq!(edit(&input, &opts), input);
    }

    /// A separator-free run longer than max_length is rejected.
    #[test]
    fn prop_long_fragment_overflows(extra in 1usize..100) {
        let input = "x".repeat(16 + extra);
        let opts = EditOptions::new().max_length(16);

        let mut source = Cursor::new(input.into_bytes());
        let mut dest = Vec::new();
        prop_assert!(process_streaming(&mut source, &mut dest, &opts).is_err());
    }
}

// ============================================================================
// Unit tests for end-to-end scenarios
// ============================================================================

#[test]
fn test_field_replacement_with_custom_separator() {
    let opts = EditOptions::new()
        .rule(RuleSpec::pattern("^b+$", "B"))
        .separator(Separator::Literal(",".to_string()))
        .join(Join::Literal(",".to_string()));
    assert_eq!(edit("aaa,bbb,ccc", &opts), "aaa,B,ccc");
}

#[test]
fn test_placeholder_expansion_end_to_end() {
    let mut spec = RuleSpec::pattern(r"(\w+)@(\w+)", "$2 at $1");
    spec.is_full_replacement = true;
    let opts = EditOptions::new().rule(spec);
    assert_eq!(edit("alice@example\n", &opts), "example at alice\n");
}

#[test]
fn test_rules_chain_in_declaration_order() {
    let opts = EditOptions::new()
        .rule(RuleSpec::literal("cat", "dog"))
        .rule(RuleSpec::literal("dog", "fox"));
    assert_eq!(edit("a cat and a dog\n", &opts), "a fox and a fox\n");
}

#[test]
fn test_merge_two_sources_with_content_join() {
    use stredit::merge_sources;

    let mut sources = vec![
        Cursor::new(b"first x\n".to_vec()),
        Cursor::new(b"second x\n".to_vec()),
    ];
    let mut dest = Vec::new();
    let opts = EditOptions::new()
        .rule(RuleSpec::literal("x", "!"))
        .content_join("===\n");
    merge_sources(&mut sources, &mut dest, &opts).unwrap();
    assert_eq!(
        String::from_utf8(dest).unwrap(),
        "first !\n===\nsecond !\n"
    );
}

#[test]
fn test_tee_to_multiple_destinations() {
    use stredit::tee_stream;

    let mut source = Cursor::new(b"shared line\n".to_vec());
    let mut dests = vec![Vec::new(), Vec::new()];
    let opts = EditOptions::new().rule(RuleSpec::literal("shared", "copied"));
    tee_stream(&mut source, &mut dests, &opts).unwrap();
    assert_eq!(dests[0], b"copied line\n");
    assert_eq!(dests[1], b"copied line\n");
}

#[test]
fn test_whole_stream_rule_spans_lines() {
    let opts = EditOptions::new()
        .rule(RuleSpec::literal("one\ntwo", "both"))
        .separator(Separator::Whole);
    assert_eq!(edit("one\ntwo\nthree", &opts), "both\nthree");
}

#[test]
fn test_limit_passthrough_keeps_remainder_unedited() {
    let opts = EditOptions::new()
        .rule(RuleSpec::literal("a", "X"))
        .limit(2);
    assert_eq!(edit("a\na\na\na\n", &opts), "X\nX\na\na\n");
}
