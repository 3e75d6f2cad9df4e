//! Property-based stability tests for the synte-core DSP primitives.
//!
//! Mirrors the teacher's `sonido-core::tests::properties` split: random
//! finite-input sweeps across the valid parameter range should never
//! produce a non-finite output.

use proptest::prelude::*;
use synte_core::{DcBlocker, HighShelf, OnePole};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn one_pole_stability(
        freq in 20.0f64..20_000.0f64,
        sample_rate in 44_100.0f64..96_000.0f64,
        input in prop::array::uniform32(-1.0f64..=1.0f64),
    ) {
        let mut filter = OnePole::new(sample_rate, freq);
        for &sample in &input {
            let out = filter.process(sample);
            prop_assert!(out.is_finite(), "OnePole({freq}, {sample_rate}) produced {out} for input {sample}");
        }
    }

    #[test]
    fn dc_blocker_stability(
        sample_rate in 44_100.0f64..96_000.0f64,
        input in prop::array::uniform32(-1.0f64..=1.0f64),
    ) {
        let mut blocker = DcBlocker::new(sample_rate);
        for &sample in &input {
            let out = blocker.process(sample);
            prop_assert!(out.is_finite(), "DcBlocker({sample_rate}) produced {out} for input {sample}");
        }
    }

    #[test]
    fn high_shelf_stability(
        corner_hz in 200.0f64..18_000.0f64,
        boost_db in 0.0f64..18.0f64,
        input in prop::array::uniform32(-1.0f64..=1.0f64),
    ) {
        let mut shelf = HighShelf::new(48_000.0, corner_hz, boost_db);
        for &sample in &input {
            let out = shelf.process(sample);
            prop_assert!(out.is_finite(), "HighShelf({corner_hz}, {boost_db}) produced {out} for input {sample}");
        }
    }
}
