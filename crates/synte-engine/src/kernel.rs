//! DSP kernel (component F): per-frame evaluation of every active listing,
//! signal-bus propagation, and the load governor that keeps the audio
//! thread inside its per-sample time budget (§4.F, §5).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use synte_lang::{OpCode, Operation};

use crate::bus::SignalBus;
use crate::dispatch::{DispatchMessage, Inbox};
use crate::listing_state::ListingState;
use crate::master_chain::{normalize_sum, MasterChain};

/// Fraction of the per-sample period the governor allows before evicting
/// the highest-indexed listing (§5 "Load governor", default 85%).
pub const DEFAULT_LOAD_THRESHOLD: f64 = 0.85;

/// Width of the exponential moving average used to smooth the per-frame
/// timing measurement before comparing it against the threshold.
const LOAD_EMA_ALPHA: f64 = 0.05;

/// The DSP kernel: owns every admitted listing's runtime state, the signal
/// bus, and the master chain. Lives entirely on the audio thread; the only
/// inputs it accepts after construction are drained from its [`Inbox`].
pub struct Kernel {
    sample_rate: f64,
    bus: SignalBus,
    listings: Vec<Option<ListingState>>,
    dac_outputs: Vec<f64>,
    inbox: Inbox,
    master: MasterChain,
    wav_tables: HashMap<String, Arc<Vec<f64>>>,
    sync_pulse_active: bool,
    load_threshold: f64,
    load_ema: f64,
    period: Duration,
    pub overload_warning: Option<String>,
}

impl Kernel {
    pub fn new(sample_rate: f64, inbox: Inbox) -> Self {
        Self {
            sample_rate,
            bus: SignalBus::new(),
            listings: Vec::new(),
            dac_outputs: Vec::new(),
            inbox,
            master: MasterChain::new(sample_rate),
            wav_tables: HashMap::new(),
            sync_pulse_active: false,
            load_threshold: DEFAULT_LOAD_THRESHOLD,
            load_ema: 0.0,
            period: Duration::from_secs_f64(1.0 / sample_rate),
            overload_warning: None,
        }
    }

    pub fn gain_reduction_db(&self) -> f64 {
        self.master.gain_reduction_db()
    }

    /// Smoothed fraction of the per-sample time budget the last frame
    /// spent, in `[0, threshold]` under normal operation (§4.H `load`,
    /// §5 load governor).
    pub fn load_fraction(&self) -> f64 {
        self.load_ema
    }

    /// Number of occupied listing slots, including muted/soloed ones —
    /// §4.H's `listings` telemetry field.
    pub fn listing_count(&self) -> usize {
        self.listings.iter().flatten().count()
    }

    /// Per-slot mute flags in index order, for §4.H's `mutes` field. A
    /// freed (`None`) slot reports `false` rather than shifting indices.
    pub fn mute_flags(&self) -> Vec<bool> {
        self.listings
            .iter()
            .map(|slot| slot.as_ref().is_some_and(|s| s.muted))
            .collect()
    }

    /// Per-slot output levels in index order, for the hot-reload
    /// ghost-prevention policy (§4.I): a reloading listing whose level has
    /// faded near zero should come back audible rather than silently
    /// stuck. A freed (`None`) slot reports `0.0`.
    pub fn listing_levels(&self) -> Vec<f64> {
        self.listings
            .iter()
            .map(|slot| slot.as_ref().map_or(0.0, |s| s.level))
            .collect()
    }

    /// Whether a sync pulse (`.>sync`/`:mc sync`) was broadcast during the
    /// frame just processed — §4.H's `sync` telemetry field.
    pub fn sync_active(&self) -> bool {
        self.sync_pulse_active
    }

    /// Whether the master chain is currently paused (`:pause`/`:play`).
    pub fn paused(&self) -> bool {
        self.master.is_paused()
    }

    /// Apply every dispatch message queued since the last frame. Called
    /// once, between frames, never mid-frame (§4.E).
    fn apply_dispatch(&mut self) {
        for message in self.inbox.drain() {
            match message {
                DispatchMessage::Admit(state) => self.admit(*state),
                DispatchMessage::Replace(index, state) => self.replace(index, *state),
                DispatchMessage::Delete(index) => {
                    if let Some(slot) = self.listings.get_mut(index) {
                        *slot = None;
                    }
                }
                DispatchMessage::Mute(index, muted) => {
                    if let Some(Some(state)) = self.listings.get_mut(index) {
                        state.muted = muted;
                    }
                }
                DispatchMessage::Solo(index) => {
                    if let Some(Some(state)) = self.listings.get_mut(index) {
                        state.soloed = !state.soloed;
                    }
                }
                DispatchMessage::Level(index, amount) => {
                    if let Some(Some(state)) = self.listings.get_mut(index) {
                        state.level = amount;
                    }
                }
                DispatchMessage::SyncBroadcast => self.sync_pulse_active = true,
                DispatchMessage::SetRelease(ms) => self.master.set_release_ms(ms),
                DispatchMessage::SetFade(ms) => self.master.set_fade_ms(ms),
                DispatchMessage::Pause(paused) => self.master.set_paused(paused),
                DispatchMessage::LoadWav(name, samples) => {
                    self.wav_tables.insert(name, samples);
                }
            }
        }
    }

    fn admit(&mut self, state: ListingState) {
        if let Some(slot) = self.listings.iter_mut().find(|s| s.is_none()) {
            *slot = Some(state);
        } else {
            self.listings.push(Some(state));
            self.dac_outputs.push(0.0);
        }
    }

    fn replace(&mut self, index: usize, state: ListingState) {
        if index >= self.listings.len() {
            self.listings.resize_with(index + 1, || None);
            self.dac_outputs.resize(index + 1, 0.0);
        }
        self.listings[index] = Some(state);
    }

    /// Publish the external mouse collaborator's current reading onto the
    /// reserved `mousex`/`mousey`/`butt1..3` bus names (§4.H, §5 "external
    /// collaborators"). Call once per frame before [`process_frame`];
    /// reading the device itself lives outside the engine.
    ///
    /// [`process_frame`]: Kernel::process_frame
    pub fn set_external_inputs(&mut self, mousex: f64, mousey: f64, butt1: bool, butt2: bool, butt3: bool) {
        self.bus.write("mousex", mousex);
        self.bus.write("mousey", mousey);
        self.bus.write("butt1", if butt1 { 1.0 } else { 0.0 });
        self.bus.write("butt2", if butt2 { 1.0 } else { 0.0 });
        self.bus.write("butt3", if butt3 { 1.0 } else { 0.0 });
    }

    /// Run one sample frame to completion, returning the post-master-chain
    /// stereo pair in `[-1, 1]` (§4.F steps 1-6; format conversion, step 7,
    /// is a `synte-io` concern).
    pub fn process_frame(&mut self) -> (f64, f64) {
        let frame_start = Instant::now();

        self.apply_dispatch();
        self.sync_pulse_active = false;
        self.overload_warning = None;

        let solo_active = self
            .listings
            .iter()
            .flatten()
            .any(|s| s.soloed && !s.deleted);

        let mut dac_sum = 0.0;
        let mut active_count = 0usize;

        for i in 0..self.listings.len() {
            let Some(mut state) = self.listings[i].take() else {
                continue;
            };
            if state.deleted {
                // Freed, not kept: a listing marked deleted by `del`/`.del`
                // this frame drops out for good rather than lingering as a
                // permanently-skipped occupied slot.
                continue;
            }
            let (wrote_dac, value) = self.eval_listing(i, &mut state);
            if wrote_dac {
                self.dac_outputs[i] = value;
                let silenced = if solo_active {
                    !state.soloed
                } else {
                    state.muted
                };
                if !silenced {
                    dac_sum += value * state.level;
                    active_count += 1;
                }
            }
            self.listings[i] = Some(state);
        }

        let mono = normalize_sum(dac_sum, active_count);
        let output = self.master.process(mono);

        self.run_load_governor(frame_start.elapsed());
        output
    }

    fn run_load_governor(&mut self, elapsed: Duration) {
        let fraction = elapsed.as_secs_f64() / self.period.as_secs_f64().max(1e-12);
        self.load_ema += LOAD_EMA_ALPHA * (fraction - self.load_ema);
        if self.load_ema > self.load_threshold {
            if let Some(index) = self.listings.iter().rposition(|s| s.is_some()) {
                self.listings[index] = None;
                self.overload_warning = Some(format!(
                    "overload: evicted listing {index} ({:.0}% of frame budget)",
                    self.load_ema * 100.0
                ));
                self.load_ema = 0.0;
            }
        }
    }

    /// Evaluate one listing's operation stream for the current sample,
    /// returning whether it terminated in `out dac` (or `.>sync`, which
    /// contributes silence) and the value written.
    fn eval_listing(&mut self, index: usize, state: &mut ListingState) -> (bool, f64) {
        let mut x = 0.0f64;
        let mut wrote_dac = false;
        let listing_count = self.listings.len().max(1);

        // Swap the op stream out of `state` (an allocation-free move, not a
        // clone) so it can be iterated while `state` itself is passed to
        // `eval_op` mutably — the audio thread must never allocate.
        let listing = std::mem::replace(&mut state.listing, synte_lang::Listing::new(Vec::new(), String::new()));
        for (op_index, op) in listing.ops.iter().enumerate() {
            x = self.eval_op(index, op_index, op, state, x, listing_count);
            if !x.is_finite() {
                // "a DSP operation that would produce NaN/Inf is silently
                // replaced by 0 on output only; internal registers keep the
                // bad value" (§4.I) — registers were already written inside
                // eval_op with the raw value before this check runs.
                x = 0.0;
            }
            if op.opcode == OpCode::OutDac {
                wrote_dac = true;
            }
        }
        state.listing = listing;
        (wrote_dac, x)
    }

    #[allow(clippy::too_many_arguments)]
    fn eval_op(
        &mut self,
        listing_index: usize,
        op_index: usize,
        op: &Operation,
        state: &mut ListingState,
        x: f64,
        listing_count: usize,
    ) -> f64 {
        let num = op.num.unwrap_or(0.0);
        match op.opcode {
            OpCode::Add => x + num,
            OpCode::Mul => x * num,
            OpCode::Sub => x - num,
            OpCode::Div => {
                if num == 0.0 {
                    0.0
                } else {
                    x / num
                }
            }
            OpCode::DivRev => {
                if x == 0.0 {
                    0.0
                } else {
                    num / x
                }
            }
            OpCode::Mod => {
                if num == 0.0 {
                    0.0
                } else {
                    x.rem_euclid(num)
                }
            }
            OpCode::Abs => x.abs(),
            OpCode::Sgn => {
                if x > 0.0 {
                    1.0
                } else if x < 0.0 {
                    -1.0
                } else {
                    0.0
                }
            }
            OpCode::Pow => num.powf(x),
            OpCode::Base => x.powf(num),
            OpCode::Sine => (std::f64::consts::TAU * x).sin(),
            OpCode::Tanh => synte_core::math::soft_saturate(x),
            OpCode::Noise => x * state.noise_uniform(),
            OpCode::Clip => synte_core::math::clip_sym(x, num),
            OpCode::Gt => {
                if x > num {
                    1.0
                } else {
                    0.0
                }
            }
            OpCode::Lt => {
                if x < num {
                    1.0
                } else {
                    0.0
                }
            }
            OpCode::F2c => synte_core::math::freq_to_coeff(x),
            OpCode::Bitcrush => {
                let levels = 2f64.powf(num.max(1.0));
                (x * levels).round() / levels
            }
            OpCode::Rms => {
                let alpha = 1.0 - (-1.0 / (0.125 * self.sample_rate)).exp();
                let env = state.op_state(op_index);
                let rectified = x.abs();
                let next = *env + alpha * (rectified - *env);
                if next < num {
                    // Hold below threshold rather than decaying further.
                } else {
                    *env = next;
                }
                *env
            }
            OpCode::In => {
                // `in 330hz` etc.: a numeric-looking operand supplies the
                // constant directly instead of naming a register/bus slot.
                let Some(name) = &op.signal else { return num };
                let base = name.base();
                if name.is_exported() || crate::bus::RESERVED_NAMES.contains(&base) {
                    self.bus.read(base)
                } else {
                    state.read_register(base)
                }
            }
            OpCode::Out => {
                if let Some(name) = &op.signal {
                    let base = name.base();
                    if name.is_exported() || crate::bus::RESERVED_NAMES.contains(&base) {
                        self.bus.write(base, x);
                    } else {
                        state.write_register(base, x);
                    }
                }
                x
            }
            OpCode::OutAdd => {
                if let Some(name) = &op.signal {
                    let base = name.base();
                    if name.is_exported() || crate::bus::RESERVED_NAMES.contains(&base) {
                        self.bus.add(base, x);
                    } else {
                        let current = state.read_register(base);
                        state.write_register(base, current + x);
                    }
                }
                x
            }
            OpCode::OutDac => x,
            OpCode::Push => {
                state.push(x);
                x
            }
            OpCode::Pop => state.pop(),
            OpCode::Tape => {
                state.tape_write(x);
                state.tape_read(num, self.sample_rate)
            }
            OpCode::Tap => state.tape_read(num, self.sample_rate),
            OpCode::Reel => state.reel_read(num),
            OpCode::From => {
                let n = ((num.round() as i64).rem_euclid(listing_count as i64)) as usize;
                self.dac_outputs.get(n).copied().unwrap_or(0.0)
            }
            OpCode::Index => listing_index as f64,
            OpCode::Level => {
                if let Some(Some(target)) = self.listings.get_mut(num.round() as usize) {
                    target.level = x;
                }
                x
            }
            OpCode::Del => {
                if x > 0.0 {
                    if let Some(Some(target)) = self.listings.get_mut(num.round() as usize) {
                        target.deleted = true;
                    }
                }
                x
            }
            OpCode::Mute => {
                if let Some(Some(target)) = self.listings.get_mut(num.round() as usize) {
                    target.muted = x > 0.0;
                }
                x
            }
            OpCode::Solo => {
                if let Some(Some(target)) = self.listings.get_mut(num.round() as usize) {
                    target.soloed = x > 0.0;
                }
                x
            }
            OpCode::SyncEmit | OpCode::SyncEmitTerminal => {
                if state.detect_sync_edge(x) {
                    self.sync_pulse_active = true;
                }
                0.0
            }
            OpCode::SyncRecv => {
                if self.sync_pulse_active {
                    state.receive_sync(num);
                }
                x
            }
            OpCode::Degrade => {
                if state.noise_uniform().abs() < num {
                    0.0
                } else {
                    x
                }
            }
            OpCode::Wav => {
                let name = op.signal.as_ref().map(|s| s.base()).unwrap_or_default();
                match self.wav_tables.get(name).cloned() {
                    Some(table) => state.wav_read(name, &table),
                    None => 0.0,
                }
            }
            OpCode::Print => {
                tracing::debug!(listing = listing_index, value = x, "print");
                x
            }
            OpCode::Erase => {
                if x > 0.0 {
                    if let Some(Some(target)) = self.listings.get_mut(num.round() as usize) {
                        target.reset_state();
                    }
                }
                x
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::channel;
    use synte_lang::{Listing, SignalName};

    fn op(opcode: OpCode, num: Option<f64>, token: &str) -> Operation {
        Operation {
            opcode,
            num,
            signal: None,
            token: token.to_string(),
        }
    }

    fn signal_op(opcode: OpCode, name: &str, token: &str) -> Operation {
        Operation {
            opcode,
            num: None,
            signal: Some(SignalName(name.to_string())),
            token: token.to_string(),
        }
    }

    fn kernel() -> (Kernel, crate::dispatch::Dispatcher) {
        let (tx, rx) = channel(16);
        (Kernel::new(48_000.0, rx), tx)
    }

    #[test]
    fn silent_with_no_listings() {
        let (mut k, _tx) = kernel();
        assert_eq!(k.process_frame(), (0.0, 0.0));
    }

    #[test]
    fn in_with_a_numeric_operand_supplies_the_constant_directly() {
        // §8 scenarios 1-3 all open with a numeric `in` (`in 330hz`, `in
        // 0.1`, `in 1`): the accumulator should take that constant rather
        // than falling through to a register/bus read.
        let (mut k, tx) = kernel();
        let ops = vec![
            op(OpCode::In, Some(0.1), "in 0.1"),
            signal_op(OpCode::OutDac, "dac", "out dac"),
        ];
        let listing = Listing::new(ops, "in 0.1 out dac");
        let state = ListingState::new(listing, 48_000.0);
        tx.send(DispatchMessage::Admit(Box::new(state))).unwrap();

        k.process_frame();
        assert!((k.dac_outputs[0] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn constant_listing_produces_steady_dc_free_output() {
        let (mut k, tx) = kernel();
        let ops = vec![
            op(OpCode::Add, Some(0.5), "+ 0.5"),
            signal_op(OpCode::OutDac, "dac", "out dac"),
        ];
        let listing = Listing::new(ops, "+ 0.5 out dac");
        let state = ListingState::new(listing, 48_000.0);
        tx.send(DispatchMessage::Admit(Box::new(state))).unwrap();

        let mut last = (0.0, 0.0);
        for _ in 0..2000 {
            last = k.process_frame();
        }
        // DC-blocked, so a constant input settles near zero, not at 0.5.
        assert!(last.0.abs() < 0.1);
    }

    #[test]
    fn muted_listing_contributes_silence() {
        let (mut k, tx) = kernel();
        let ops = vec![
            op(OpCode::Add, Some(1.0), "+ 1"),
            signal_op(OpCode::OutDac, "dac", "out dac"),
        ];
        let mut state = ListingState::new(Listing::new(ops, "+ 1 out dac"), 48_000.0);
        state.muted = true;
        tx.send(DispatchMessage::Admit(Box::new(state))).unwrap();
        let (l, r) = k.process_frame();
        assert_eq!((l, r), (0.0, 0.0));
    }

    #[test]
    fn solo_silences_non_soloed_listings() {
        let (mut k, tx) = kernel();
        let loud = ListingState::new(
            Listing::new(
                vec![
                    op(OpCode::Add, Some(1.0), "+ 1"),
                    signal_op(OpCode::OutDac, "dac", "out dac"),
                ],
                "+ 1 out dac",
            ),
            48_000.0,
        );
        let mut quiet = ListingState::new(
            Listing::new(
                vec![
                    op(OpCode::Add, Some(1.0), "+ 1"),
                    signal_op(OpCode::OutDac, "dac", "out dac"),
                ],
                "+ 1 out dac #2",
            ),
            48_000.0,
        );
        quiet.soloed = true;
        tx.send(DispatchMessage::Admit(Box::new(loud))).unwrap();
        tx.send(DispatchMessage::Admit(Box::new(quiet))).unwrap();
        let before = k.process_frame();
        // With listing 1 soloed, listing 0's contribution should be absent;
        // confirm the engine didn't just silence everything.
        assert_ne!(before, (0.0, 0.0));
    }

    #[test]
    fn from_reads_the_target_listings_dac_output() {
        let (mut k, tx) = kernel();
        let source = ListingState::new(
            Listing::new(
                vec![
                    op(OpCode::Add, Some(0.25), "+ 0.25"),
                    signal_op(OpCode::OutDac, "dac", "out dac"),
                ],
                "+ 0.25 out dac",
            ),
            48_000.0,
        );
        tx.send(DispatchMessage::Admit(Box::new(source))).unwrap();
        k.process_frame();
        assert!((k.dac_outputs[0] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn delete_message_removes_listing() {
        let (mut k, tx) = kernel();
        let state = ListingState::new(
            Listing::new(vec![signal_op(OpCode::OutDac, "dac", "out dac")], "out dac"),
            48_000.0,
        );
        tx.send(DispatchMessage::Admit(Box::new(state))).unwrap();
        tx.send(DispatchMessage::Delete(0)).unwrap();
        k.process_frame();
        assert!(k.listings[0].is_none());
    }
}
