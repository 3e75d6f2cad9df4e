//! Property test for the single-writer-per-listing invariant (§3 "a signal
//! written by more than one producer... is rejected at compile time").
//!
//! Builds listings out of an arbitrary set of single-letter `out` targets:
//! a listing that writes each name at most once always compiles, and
//! re-using any one of those names a second time is always rejected with
//! `DuplicateWrite`, regardless of how many other distinct writes surround
//! it.

use proptest::prelude::*;
use synte_compiler::{CompileError, Compiler};

fn letters() -> impl Strategy<Value = Vec<char>> {
    prop::collection::hash_set('b'..='z', 1..=20).prop_map(|set| set.into_iter().collect())
}

fn listing_line(names: &[char]) -> String {
    let mut line = String::new();
    for name in names {
        line.push_str(&format!("in a out {name} "));
    }
    line.push_str("out dac");
    line
}

proptest! {
    #[test]
    fn distinct_writes_always_compile(names in letters()) {
        let mut compiler = Compiler::new(48_000.0);
        let line = listing_line(&names);
        prop_assert!(compiler.feed_line(&line).is_ok(), "rejected distinct-write listing: {line}");
    }

    #[test]
    fn repeating_any_write_is_always_rejected(names in letters(), repeat_at in 0usize..20) {
        prop_assume!(!names.is_empty());
        let repeat = names[repeat_at % names.len()];
        let mut names_with_repeat = names.clone();
        names_with_repeat.push(repeat);

        let mut compiler = Compiler::new(48_000.0);
        let line = listing_line(&names_with_repeat);
        let err = compiler.feed_line(&line).unwrap_err();
        prop_assert_eq!(err, CompileError::DuplicateWrite(repeat.to_string()));
    }
}
