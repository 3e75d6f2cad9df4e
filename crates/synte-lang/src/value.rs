//! Value & type parser (component A).
//!
//! Parses a token plus the owning operator's "is this operand numeric and
//! unbounded" flags into a unitless internal scalar, per spec §4.A.

use synte_core::ReservedConstants;

/// Outcome of parsing a numeric token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedValue {
    /// The resolved, unitless internal scalar.
    pub value: f64,
    /// Whether the token was valid for the requested operand kind.
    pub ok: bool,
}

impl ParsedValue {
    const REJECT: ParsedValue = ParsedValue { value: 0.0, ok: false };

    fn accept(value: f64) -> Self {
        Self { value, ok: true }
    }
}

/// Unit suffixes recognised by the value parser, longest-match order so that
/// e.g. `ms` is tried before `s`.
const UNIT_SUFFIXES: [&str; 6] = ["bpm", "ms", "hz", "db", "s", "!"];

/// Parse a token into a resolved internal scalar.
///
/// `unbounded` corresponds to the operator table's "unbounded" flag: when
/// false, a bare (unit-less) numeric operand must land in `[0, 1]`.
pub fn parse_value(token: &str, unbounded: bool, constants: &ReservedConstants) -> ParsedValue {
    let token = token.trim();
    if token.is_empty() {
        return ParsedValue::REJECT;
    }

    // Reserved constants are resolved whole-token, ahead of everything else.
    if let Some(v) = constants.resolve(token) {
        return ParsedValue::accept(v);
    }

    let (body, unit) = split_unit(token);

    let Some(x) = parse_numeric_body(body, constants) else {
        return ParsedValue::REJECT;
    };

    match unit {
        None => {
            if unbounded || (0.0..=1.0).contains(&x) {
                ParsedValue::accept(x)
            } else {
                ParsedValue::REJECT
            }
        }
        Some("hz") => {
            if x >= 0.0 && x <= constants.sr / 2.0 {
                ParsedValue::accept(x / constants.sr)
            } else {
                ParsedValue::REJECT
            }
        }
        Some("ms") => {
            if x > 0.0 {
                ParsedValue::accept(1000.0 / (x * constants.sr))
            } else {
                ParsedValue::REJECT
            }
        }
        Some("s") => {
            if x > 0.0 {
                ParsedValue::accept(1.0 / (x * constants.sr))
            } else {
                ParsedValue::REJECT
            }
        }
        Some("bpm") => {
            if x > 0.0 && x <= 3000.0 {
                ParsedValue::accept((x / 60.0) / constants.sr)
            } else {
                ParsedValue::REJECT
            }
        }
        Some("db") => ParsedValue::accept(synte_core::math::db_to_linear(x)),
        Some("!") => ParsedValue::accept(x),
        Some(_) => ParsedValue::REJECT,
    }
}

/// Split a trailing unit suffix off a token, longest-match first.
fn split_unit(token: &str) -> (&str, Option<&'static str>) {
    for &suffix in &UNIT_SUFFIXES {
        if token.len() > suffix.len() && token.ends_with(suffix) {
            let body = &token[..token.len() - suffix.len()];
            // Don't strip "s" off something like "5.0" (no match) or a bare
            // name ending in 's' that isn't actually a numeric body — the
            // body parse below rejects those anyway.
            return (body, Some(suffix));
        }
        if token == suffix {
            // A bare unit with no numeric body is never valid; let the
            // caller's numeric parse reject it.
            return (token, None);
        }
    }
    (token, None)
}

/// Parse `a`, `a/b`, or `a*b` where both sides are plain floats or reserved
/// constant names.
fn parse_numeric_body(body: &str, constants: &ReservedConstants) -> Option<f64> {
    if let Some(pos) = body.find('/') {
        let a = parse_float_or_constant(&body[..pos], constants)?;
        let b = parse_float_or_constant(&body[pos + 1..], constants)?;
        if b == 0.0 {
            return None;
        }
        return Some(a / b);
    }
    if let Some(pos) = body.find('*') {
        let a = parse_float_or_constant(&body[..pos], constants)?;
        let b = parse_float_or_constant(&body[pos + 1..], constants)?;
        return Some(a * b);
    }
    parse_float_or_constant(body, constants)
}

fn parse_float_or_constant(s: &str, constants: &ReservedConstants) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Some(v) = constants.resolve(s) {
        return Some(v);
    }
    s.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constants() -> ReservedConstants {
        ReservedConstants::for_sample_rate(48000.0)
    }

    #[test]
    fn bare_fraction_in_range() {
        let c = constants();
        let out = parse_value("0.5", false, &c);
        assert!(out.ok);
        assert!((out.value - 0.5).abs() < 1e-12);
    }

    #[test]
    fn bare_value_out_of_range_rejected() {
        let c = constants();
        let out = parse_value("1.5", false, &c);
        assert!(!out.ok);
    }

    #[test]
    fn bare_value_out_of_range_accepted_when_unbounded() {
        let c = constants();
        let out = parse_value("1.5", true, &c);
        assert!(out.ok);
        assert!((out.value - 1.5).abs() < 1e-12);
    }

    #[test]
    fn hz_suffix_converts_to_fraction_of_sr() {
        let c = constants();
        let out = parse_value("330hz", true, &c);
        assert!(out.ok);
        assert!((out.value - 330.0 / 48000.0).abs() < 1e-12);
    }

    #[test]
    fn hz_suffix_rejects_above_nyquist() {
        let c = constants();
        let out = parse_value("30000hz", true, &c);
        assert!(!out.ok);
    }

    #[test]
    fn ms_suffix_converts_to_cycles_per_sample() {
        let c = constants();
        let out = parse_value("1000ms", true, &c);
        assert!(out.ok);
        assert!((out.value - 1000.0 / (1000.0 * 48000.0)).abs() < 1e-12);
    }

    #[test]
    fn ms_suffix_rejects_nonpositive() {
        let c = constants();
        assert!(!parse_value("0ms", true, &c).ok);
        assert!(!parse_value("-5ms", true, &c).ok);
    }

    #[test]
    fn s_suffix_converts() {
        let c = constants();
        let out = parse_value("2s", true, &c);
        assert!(out.ok);
        assert!((out.value - 1.0 / (2.0 * 48000.0)).abs() < 1e-15);
    }

    #[test]
    fn bpm_suffix_range() {
        let c = constants();
        assert!(parse_value("120bpm", true, &c).ok);
        assert!(!parse_value("0bpm", true, &c).ok);
        assert!(!parse_value("3001bpm", true, &c).ok);
    }

    #[test]
    fn db_suffix_any_value() {
        let c = constants();
        let out = parse_value("-6db", true, &c);
        assert!(out.ok);
        assert!((out.value - synte_core::math::db_to_linear(-6.0)).abs() < 1e-12);
    }

    #[test]
    fn force_suffix_bypasses_range_check() {
        let c = constants();
        let out = parse_value("4!", false, &c);
        assert!(out.ok);
        assert!((out.value - 4.0).abs() < 1e-12);
    }

    #[test]
    fn fraction_operand() {
        let c = constants();
        let out = parse_value("1/2", false, &c);
        assert!(out.ok);
        assert!((out.value - 0.5).abs() < 1e-12);
    }

    #[test]
    fn product_operand_with_unit() {
        let c = constants();
        let out = parse_value("2*165hz", true, &c);
        assert!(out.ok);
        assert!((out.value - 330.0 / 48000.0).abs() < 1e-9);
    }

    #[test]
    fn division_by_zero_rejected() {
        let c = constants();
        assert!(!parse_value("1/0", true, &c).ok);
    }

    #[test]
    fn non_numeric_rejected() {
        let c = constants();
        assert!(!parse_value("not_a_number", false, &c).ok);
    }

    #[test]
    fn reserved_constant_resolved_whole_token() {
        let c = constants();
        let out = parse_value("Pi", true, &c);
        assert!(out.ok);
        assert!((out.value - core::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn unknown_unit_suffix_rejected() {
        let c = constants();
        assert!(!parse_value("5xyz", true, &c).ok);
    }

    proptest::proptest! {
        #[test]
        fn parser_totality_in_range_floats_always_accept(x in 0.0f64..=1.0) {
            let c = constants();
            let token = format!("{x}");
            let out = parse_value(&token, false, &c);
            proptest::prop_assert!(out.ok);
        }

        #[test]
        fn parser_rejection_never_mutates_anything(x in -1000.0f64..2000.0) {
            // A rejected parse always reports (0.0, false); this is the
            // totality half of the invariant — callers rely on `ok == false`
            // implying no listing state changed.
            let c = constants();
            let token = format!("{x}garbage_unit");
            let out = parse_value(&token, false, &c);
            if !out.ok {
                proptest::prop_assert_eq!(out.value, 0.0);
            }
        }
    }
}
