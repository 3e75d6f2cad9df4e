//! Built-in functions (§3 Function, spec's glossary list of macro names
//! that are "not primitives"): a small library of macro expansions over
//! [`crate::ops::OPERATOR_TABLE`], seeded into a fresh [`FunctionStore`] at
//! startup so a performer can call `=osc 330hz` etc. without first typing
//! out the definition.
//!
//! These are session-local by default (like any user-defined function) —
//! `:fon` persists a particular one across sessions same as any other.
//! Each body is a minimal, directly-expressible composition of the
//! primitive table; the spec names these but (by design) leaves their
//! exact bodies unspecified ("need not appear in the engine table"), so
//! there is no ground truth to match — see `DESIGN.md` for the scope note.

use crate::model::Function;
use crate::store::FunctionStore;

fn f(name: &str, comment: &str, tokens: &[&str]) -> Function {
    Function::new(name, comment, tokens.iter().map(|t| t.to_string()).collect())
}

/// Populate `store` with every built-in named in the glossary. Existing
/// definitions of the same name (e.g. loaded from a persisted
/// `functions.json`) are left alone — built-ins seed first, so a user's
/// own `osc` redefinition simply overwrites this one, same as any other
/// `define`.
pub fn seed(store: &mut FunctionStore) {
    for function in builtins() {
        store.define(function);
    }
}

fn builtins() -> Vec<Function> {
    vec![
        f("osc", "scale input by a frequency/depth argument", &["mul", "@"]),
        f("saw", "sawtooth: scale then wrap to [0,1)", &["mul", "@", "mod", "1"]),
        f("tri", "triangle: wrapped ramp folded around its midpoint", &["mul", "@", "mod", "1", "sub", "0.5", "abs"]),
        f("sino", "sine: scale then run through the sine shaper", &["mul", "@", "sine"]),
        f("flip", "invert sign", &["mul", "-1!"]),
        f("mix", "scale and add into the shared Mix bus", &["mul", "@", "out+", "'Mix"]),
        f("lpf", "one-pole smoothing as a low-pass stand-in", &["rms", "@"]),
        f("hpf", "input minus its own smoothed envelope", &["sub", "@", "rms", "@"]),
        f("pulse", "threshold gate", &["gt", "@"]),
        f("posc", "phase-synchronisable oscillator (pair with <sync)", &["mul", "@", "sine"]),
        f("slew", "rate-limit via envelope smoothing", &["rms", "@"]),
        f("ramp", "scale then wrap to [0,1)", &["mul", "@", "mod", "1"]),
        f("decay", "exponential-ish decay via envelope smoothing", &["rms", "@"]),
        f("half", "halve the input", &["mul", "0.5"]),
        f("s/h", "sample and hold via the tape's most recent write", &["tap", "0"]),
        f("once", "pass only values above a near-unity threshold", &["gt", "0.99"]),
        f("zx", "zero-crossing detector (emits a sync pulse)", &[">sync", "0"]),
        f("lmap", "linear map: scale by @1, offset by @2", &["mul", "@1", "+", "@2"]),
        f("euclid", "probabilistic rhythm gate", &["degrade", "@"]),
        f("exp", "exponential curve", &["pow", "@"]),
        f("range", "linear map: scale by @1, offset by @2", &["mul", "@1", "+", "@2"]),
        f("echo", "write-then-read the tape at a fixed delay", &["tape", "@"]),
        f("step", "threshold gate", &["gt", "@"]),
        f("count", "this listing's own index as a free counter", &["index"]),
        f("tempo", "read the shared tempo bus", &["in", "tempo"]),
        f("grid", "read the shared grid bus", &["in", "grid"]),
        f("end", "terminate the listing to the output bus", &["out", "dac"]),
        f(".", "no-op peek, useful for print-debugging a chain", &["print"]),
        f("cv2a", "control-rate value to an audio-rate filter coefficient", &["f2c"]),
        f("T2", "scale then wrap to [0,1)", &["mul", "@", "mod", "1"]),
        f("dirac", "unit impulse gate", &["gt", "0.99"]),
        f("bd909", "saturated thump", &["tanh"]),
        f("heat", "soft saturation", &["tanh"]),
        f("dial", "scale input by an argument", &["mul", "@"]),
        f("alp", "all-pass-ish coefficient from a control value", &["f2c"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeding_defines_every_glossary_name() {
        let mut store = FunctionStore::new();
        seed(&mut store);
        for name in [
            "osc", "saw", "tri", "sino", "flip", "mix", "lpf", "hpf", "pulse", "posc", "slew",
            "ramp", "decay", "half", "s/h", "once", "zx", "lmap", "euclid", "exp", "range",
            "echo", "step", "count", "tempo", "grid", "end", ".", "cv2a", "T2", "dirac", "bd909",
            "heat", "dial", "alp",
        ] {
            assert!(store.get(name).is_some(), "missing built-in `{name}`");
        }
    }

    #[test]
    fn seeded_functions_are_session_local_by_default() {
        let mut store = FunctionStore::new();
        seed(&mut store);
        assert!(!store.get("osc").unwrap().persistent);
    }

    #[test]
    fn a_user_definition_overwrites_the_seeded_builtin() {
        let mut store = FunctionStore::new();
        seed(&mut store);
        store.define(Function::new("osc", "custom", vec!["mul".to_string(), "2".to_string()]));
        assert_eq!(store.get("osc").unwrap().comment, "custom");
    }
}
