//! Property test for frame determinism and output boundedness (§8): any
//! admitted listing, no matter what constant it adds before `out dac`,
//! must leave `process_frame` returning a finite stereo pair inside
//! `[-1, 1]` — the per-op NaN/Inf guard (§4.I) and the master chain's
//! final `clip_sym` make this an invariant of the kernel itself, not a
//! fact about any one listing.

use proptest::prelude::*;
use synte_engine::{channel, DispatchMessage, Kernel, ListingState};
use synte_lang::{Listing, OpCode, Operation, SignalName};

fn dac_listing(constant: f64) -> Listing {
    let ops = vec![
        Operation::numeric(OpCode::Add, constant, format!("+ {constant}")),
        Operation::signal(OpCode::OutDac, SignalName("dac".to_string()), "out dac".to_string()),
    ];
    Listing::new(ops, format!("+ {constant} out dac"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn output_is_always_finite_and_bounded(constant in -1.0e6f64..1.0e6f64, frames in 1usize..500) {
        let (tx, rx) = channel(16);
        let mut kernel = Kernel::new(48_000.0, rx);
        let state = ListingState::new(dac_listing(constant), 48_000.0);
        tx.send(DispatchMessage::Admit(Box::new(state))).unwrap();

        for _ in 0..frames {
            let (l, r) = kernel.process_frame();
            prop_assert!(l.is_finite() && r.is_finite(), "non-finite output for constant {constant}");
            prop_assert!((-1.0..=1.0).contains(&l), "left channel {l} out of range for constant {constant}");
            prop_assert!((-1.0..=1.0).contains(&r), "right channel {r} out of range for constant {constant}");
        }
    }
}
