//! The six concrete end-to-end scenarios from `spec.md` §8, reduced to
//! generation-shape assertions: since this exercise never runs `rustc` on
//! generated code (see the crate root doc), each test checks that the
//! right engine was chosen and the right identifiers were emitted, rather
//! than feeding the scenario's sample input through the generated matcher.

use regexgen::{generate, GeneratorConfig};

fn config(name: &str) -> GeneratorConfig {
    GeneratorConfig { name: name.to_string(), ..GeneratorConfig::default() }
}

/// Scenario 1: email extraction. Named groups `user`/`domain` become
/// `User`/`Domain` fields; no end anchor and moderate size means plain
/// checkpointed Backtracking, not TDFA.
#[test]
fn email_extraction() {
    let pattern = r"(?P<user>[\w.+-]+)@(?P<domain>[\w.-]+)\.[A-Za-z]{2,}";
    let src = generate(pattern, &config("Email")).unwrap();
    assert!(src.contains("fn is_match_email"));
    assert!(src.contains("fn find_email"));
    assert!(src.contains("struct EmailMatch"));
    assert!(src.contains("pub User"));
    assert!(src.contains("pub Domain"));
}

/// Scenario 2: date roundtrip. Three capture groups, bounded length (10),
/// no catastrophic risk -> plain Backtracking-with-checkpointing for Find,
/// plus a `DateReplaceReader` since the pattern is bounded.
#[test]
fn date_roundtrip() {
    let pattern = r"(?P<y>\d{4})-(?P<m>\d{2})-(?P<d>\d{2})";
    let src = generate(pattern, &config("Date")).unwrap();
    assert!(src.contains("struct DateMatch"));
    assert!(src.contains("pub Y"));
    assert!(src.contains("pub M"));
    assert!(src.contains("pub D"));
    assert!(src.contains("DateReplaceReader"));
}

/// Scenario 3: `(a+)+b`, the textbook catastrophic-backtracking pattern.
/// Small enough for Thompson (boolean `Match`), and its capture-bearing
/// sibling (adding a capture group) should still get memoized Backtracking
/// since Thompson never handles captures.
#[test]
fn catastrophic_pattern_prefers_thompson_for_match() {
    let src = generate("(a+)+b", &config("Evil")).unwrap();
    assert!(src.contains("fn is_match_evil"));
    assert!(src.contains("ACCEPT_MASK"), "expected the Thompson engine's table, got:\n{src}");
}

#[test]
fn catastrophic_pattern_with_capture_falls_back_to_memoized_backtracking_or_tdfa() {
    let src = generate("(?P<run>a+)+b", &config("EvilCap")).unwrap();
    // A capture-bearing catastrophic pattern selects TDFA (preferred) or
    // memoized Backtracking checkpointing for `find`; either way it must
    // not silently drop memoization/determinism safeguards.
    let has_tdfa = src.contains("TRANSITION");
    let has_memo_or_checkpoint = src.contains("visited") || src.contains("Frame");
    assert!(has_tdfa || has_memo_or_checkpoint, "expected a catastrophic-safe find engine, got:\n{src}");
}

/// Scenario 4: `[a-z]+` is small and unanchored with no end anchor, well
/// under the Thompson instruction cap, so boolean matching should *not*
/// require a backtrack stack even when not flagged catastrophic (Thompson
/// is only forced on catastrophic risk or the `-force-thompson` flag; a
/// plain `[a-z]+` is not itself catastrophic, so this asserts the simpler,
/// still-correct property that compilation succeeds and no capture state
/// is emitted for a groupless pattern).
#[test]
fn thompson_eligible_pattern_generates_successfully() {
    let force_thompson = GeneratorConfig {
        name: "Lower".to_string(),
        force: regexgen::select::Force { thompson: true, tdfa: false },
        ..GeneratorConfig::default()
    };
    let src = generate("[a-z]+", &force_thompson).unwrap();
    assert!(src.contains("fn is_match_lower"));
    assert!(src.contains("CLOSURE"));
    assert!(!src.contains("struct LowerMatch"), "a groupless pattern has no capture struct");
}

/// Scenario 5: TDFA multi-group. Forcing TDFA on a pattern with an
/// optional group (`(:(?P<port>\d+))?`) must succeed and name every group,
/// including the unnamed wrapping group around the optional port clause.
#[test]
fn tdfa_multi_group() {
    let pattern = r"(?P<scheme>https?)://(?P<host>[\w.-]+)(:(?P<port>\d+))?";
    let forced_tdfa = GeneratorConfig {
        name: "Url".to_string(),
        force: regexgen::select::Force { thompson: false, tdfa: true },
        ..GeneratorConfig::default()
    };
    let src = generate(pattern, &forced_tdfa).unwrap();
    assert!(src.contains("TRANSITION"));
    assert!(src.contains("pub Scheme"));
    assert!(src.contains("pub Host"));
    assert!(src.contains("pub Port"));
    assert!(src.contains("pub Group")); // the unnamed `(:...)`  wrapper group
}

/// Scenario 6: streaming across a chunk boundary. A bounded 10-byte
/// pattern gets a `FindReader` sized off `spec.md` §4.6's defaults
/// (64 KiB floor, well above the scenario's 64 KiB example buffer).
#[test]
fn streaming_across_boundary_reader_is_emitted() {
    let pattern = r"\d{4}-\d{2}-\d{2}";
    let src = generate(pattern, &config("Ymd")).unwrap();
    assert!(src.contains("struct YmdFindReader"));
    assert!(src.contains("ChunkBuffer"));
    assert!(src.contains("next_match"));
}
