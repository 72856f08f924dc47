//! Integration tests exercising `regexgen`'s public API end to end at the
//! generation layer (`spec.md` §8's invariants and boundary scenarios,
//! reduced to decision-logic and emitted-shape assertions since generated
//! matcher source is never compiled as part of this crate's test suite).

use regexgen::select::Force;
use regexgen::{generate, GeneratorConfig};

fn config(name: &str) -> GeneratorConfig {
    GeneratorConfig { name: name.to_string(), ..GeneratorConfig::default() }
}

/// `spec.md` §8, "Boundary scenarios": a pattern that can match empty
/// (`a*`) must still get a working `find_*`; one that must consume at
/// least one byte (`a+`) is unaffected by the same check.
#[test]
fn pattern_matching_empty_string_still_generates_find() {
    let src = generate("a*", &config("MaybeA")).unwrap();
    assert!(src.contains("fn find_maybea"));
}

/// `spec.md` §8 invariant 7 / scenario 3: a known catastrophic pattern
/// picks a safe engine (Thompson for boolean match, TDFA or memoized
/// Backtracking for capture-bearing find) rather than the naive
/// exponential Backtracking path.
#[test]
fn catastrophic_pattern_never_uses_naive_backtracking_for_match() {
    let src = generate("(a+)+b", &config("Nested")).unwrap();
    // Plain (non-memoized, non-Thompson) Backtracking never declares
    // Thompson's `ACCEPT_MASK` table or a `visited` memo table; a
    // catastrophic pattern must get one or the other.
    assert!(src.contains("ACCEPT_MASK") || src.contains("visited"));
}

/// `spec.md` §7: an unparseable pattern surfaces a `PatternError`, not a
/// panic, with the pattern text preserved for the caller.
#[test]
fn invalid_pattern_reports_cleanly() {
    let err = generate("a(", &config("Broken")).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("invalid pattern"));
}

/// `spec.md` §7: forcing TDFA on a pattern whose tag-set exceeds a tiny
/// state cap surfaces an error instead of silently falling back, since the
/// caller explicitly asked for that engine.
#[test]
fn forcing_an_infeasible_engine_is_reported_not_silently_downgraded() {
    let config = GeneratorConfig {
        name: "TooBig".to_string(),
        force: Force { thompson: false, tdfa: true },
        tdfa_state_cap: 1,
        ..GeneratorConfig::default()
    };
    let err = generate(r"(?P<y>\d{4})-(?P<m>\d{2})-(?P<d>\d{2})", &config).unwrap_err();
    assert!(err.to_string().contains("state cap"));
}

/// `spec.md` §8, "Round-trip & idempotence": `Replace(x, "$0")` is the
/// identity template; verified here at the template layer (generated code
/// delegates to exactly this `Template::expand_into` call).
#[test]
fn dollar_zero_template_is_the_identity() {
    let template = regexgen::template::Template::parse("$0");
    let mut out = String::new();
    template.expand_into(&mut out, "2025-10-05", |_| None, |_| None);
    assert_eq!(out, "2025-10-05");
}

/// `spec.md` §8 scenario 2: date roundtrip, checked at the template layer
/// (`"$d/$m/$y"` against named groups).
#[test]
fn named_template_reorders_date_fields() {
    let template = regexgen::template::Template::parse("$d/$m/$y");
    let mut out = String::new();
    let group_by_name = |name: &str| match name {
        "y" => Some("2025"),
        "m" => Some("10"),
        "d" => Some("05"),
        _ => None,
    };
    template.expand_into(&mut out, "2025-10-05", |_| None, group_by_name);
    assert_eq!(out, "05/10/2025");
}

/// `spec.md` §4.5/§8 scenario 1: `find_*` must return the pattern's own
/// `{Name}Match` struct, built via its `from_slots` constructor, not a raw
/// slot array — the whole point of generating one per pattern.
#[test]
fn capture_bearing_find_returns_the_named_match_struct() {
    let src = generate(r"(?P<user>\w+)@(?P<domain>\w+)", &config("Email")).unwrap();
    assert!(src.contains("fn find_email_slots"));
    assert!(src.contains("Option<EmailMatch>"));
    assert!(src.contains("pub fn from_slots"));
    assert!(src.contains("EmailMatch::from_slots"));
}

/// `spec.md` §4.5: a pattern with no named capture groups still gets a
/// `find_*`, but it returns a bare whole-match span since there is no
/// `{Name}Match` struct for it.
#[test]
fn groupless_find_returns_a_whole_match_span_not_a_struct() {
    let src = generate(r"\d{4}", &config("Digits")).unwrap();
    assert!(!src.contains("struct DigitsMatch"));
    assert!(src.contains("Option<(usize, usize)>"));
}
