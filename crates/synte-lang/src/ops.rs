//! Operator table (component B): the static registry of primitive operations.
//!
//! Each entry declares whether an operand is required and its kind, which
//! compile-time check applies, and the engine opcode it lowers to.

use crate::model::OpCode;

/// What kind of operand (if any) an operator expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// No operand (bare operator).
    None,
    /// A numeric literal, parsed by the value parser (component A).
    Numeric,
    /// A signal name.
    Signal,
    /// Either, decided by the token's shape (§4.C "numeric-looking tokens
    /// are parsed by 4.A; otherwise treated as a signal name"): `in 330hz`
    /// supplies a constant input value directly, `in a` reads a register
    /// or bus slot.
    SignalOrNumeric,
}

/// Which compile-time check an operator's operand is subject to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    /// No additional check beyond operand-kind parsing.
    None,
    /// Single-writer discipline (`checkOut`): `^`/`out+`/`@` carve-outs.
    Out,
    /// Operand must resolve to a valid listing index, excluding self.
    Index,
    /// Same as `Index` but self-reference is permitted.
    IndexIncl,
    /// Fade duration, bounded 0..=104_000 ms (§4.G "up to 104 s").
    Fade,
    /// Release duration, bounded 200..=60_000 ms (§4.G "minimum ~200 ms").
    Release,
}

/// One row of the static operator table.
#[derive(Debug, Clone, Copy)]
pub struct OpSpec {
    /// The token that selects this operator (e.g. `"mul"`, `"out"`, `">sync"`).
    pub name: &'static str,
    /// The operand kind this operator expects.
    pub operand: Operand,
    /// Whether a numeric operand is range-checked to `[0, 1]` (`false`) or
    /// left unchecked beyond its unit's own validity rule (`true`).
    pub unbounded: bool,
    /// The compile-time check applied to this operator's operand.
    pub check: Check,
    /// The engine opcode this operator lowers to.
    pub opcode: OpCode,
}

macro_rules! op {
    ($name:expr, $operand:expr, $unbounded:expr, $check:expr, $opcode:expr) => {
        OpSpec {
            name: $name,
            operand: $operand,
            unbounded: $unbounded,
            check: $check,
            opcode: $opcode,
        }
    };
}

// Only operators whose operand is naturally outside [0, 1] — mainly
// listing-index arguments and the bit-crush depth — are flagged unbounded.
// Everything else defaults to the bounded [0, 1] rule from §4.A; callers
// needing a larger bare value reach for a unit suffix or the `!` force
// suffix instead.
pub const OPERATOR_TABLE: &[OpSpec] = &[
    op!("+", Operand::Numeric, false, Check::None, OpCode::Add),
    op!("mul", Operand::Numeric, false, Check::None, OpCode::Mul),
    op!("x", Operand::Numeric, false, Check::None, OpCode::Mul),
    op!("*", Operand::Numeric, false, Check::None, OpCode::Mul),
    op!("sub", Operand::Numeric, false, Check::None, OpCode::Sub),
    op!("/", Operand::Numeric, false, Check::None, OpCode::Div),
    op!("\\", Operand::Numeric, false, Check::None, OpCode::DivRev),
    op!("mod", Operand::Numeric, false, Check::None, OpCode::Mod),
    op!("abs", Operand::None, false, Check::None, OpCode::Abs),
    op!("sgn", Operand::None, false, Check::None, OpCode::Sgn),
    op!("pow", Operand::Numeric, false, Check::None, OpCode::Pow),
    op!("base", Operand::Numeric, false, Check::None, OpCode::Base),
    op!("sine", Operand::None, false, Check::None, OpCode::Sine),
    op!("tanh", Operand::None, false, Check::None, OpCode::Tanh),
    op!("noise", Operand::None, false, Check::None, OpCode::Noise),
    op!("clip", Operand::Numeric, true, Check::None, OpCode::Clip),
    op!("gt", Operand::Numeric, false, Check::None, OpCode::Gt),
    op!("lt", Operand::Numeric, false, Check::None, OpCode::Lt),
    op!("f2c", Operand::None, false, Check::None, OpCode::F2c),
    op!("8bit", Operand::Numeric, true, Check::None, OpCode::Bitcrush),
    op!("rms", Operand::Numeric, false, Check::None, OpCode::Rms),
    op!("in", Operand::SignalOrNumeric, false, Check::None, OpCode::In),
    op!("out", Operand::Signal, false, Check::Out, OpCode::Out),
    op!("out+", Operand::Signal, false, Check::None, OpCode::OutAdd),
    op!("push", Operand::None, false, Check::None, OpCode::Push),
    op!("pop", Operand::None, false, Check::None, OpCode::Pop),
    op!("tape", Operand::Numeric, false, Check::None, OpCode::Tape),
    op!("tap", Operand::Numeric, false, Check::None, OpCode::Tap),
    op!("+tap", Operand::Numeric, false, Check::None, OpCode::Tap),
    op!("reel", Operand::Numeric, false, Check::None, OpCode::Reel),
    op!("from", Operand::Numeric, true, Check::IndexIncl, OpCode::From),
    op!("index", Operand::None, false, Check::None, OpCode::Index),
    op!("level", Operand::Numeric, true, Check::Index, OpCode::Level),
    op!(".level", Operand::Numeric, true, Check::Index, OpCode::Level),
    op!("del", Operand::Numeric, true, Check::Index, OpCode::Del),
    op!(".del", Operand::Numeric, true, Check::Index, OpCode::Del),
    op!("mute", Operand::Numeric, true, Check::Index, OpCode::Mute),
    op!(".mute", Operand::Numeric, true, Check::Index, OpCode::Mute),
    op!("solo", Operand::Numeric, true, Check::Index, OpCode::Solo),
    op!(".solo", Operand::Numeric, true, Check::Index, OpCode::Solo),
    op!(">sync", Operand::Numeric, false, Check::None, OpCode::SyncEmit),
    op!("<sync", Operand::Numeric, false, Check::None, OpCode::SyncRecv),
    op!(".>sync", Operand::Numeric, false, Check::None, OpCode::SyncEmitTerminal),
    op!("degrade", Operand::Numeric, false, Check::None, OpCode::Degrade),
    op!("wav", Operand::Signal, false, Check::None, OpCode::Wav),
    op!("print", Operand::None, false, Check::None, OpCode::Print),
    op!("erase", Operand::Numeric, true, Check::Index, OpCode::Erase),
];

/// Look up an operator by its token name.
pub fn lookup(name: &str) -> Option<&'static OpSpec> {
    OPERATOR_TABLE.iter().find(|spec| spec.name == name)
}
