//! Data model shared by the compiler, function store, and engine: the
//! compiled representation of operations, listings, and functions (§3, §4.D).

use serde::{Deserialize, Serialize};

/// Engine opcode that a compiled [`Operation`] dispatches to in the DSP
/// kernel. One variant per primitive in the operator table (component B).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpCode {
    Add,
    Mul,
    Sub,
    Div,
    DivRev,
    Mod,
    Abs,
    Sgn,
    Pow,
    Base,
    Sine,
    Tanh,
    Noise,
    Clip,
    Gt,
    Lt,
    F2c,
    Bitcrush,
    Rms,
    In,
    Out,
    OutAdd,
    OutDac,
    Push,
    Pop,
    Tape,
    Tap,
    Reel,
    From,
    Index,
    Level,
    Del,
    Mute,
    Solo,
    SyncEmit,
    SyncRecv,
    SyncEmitTerminal,
    Degrade,
    Wav,
    Print,
    Erase,
}

/// A signal name: either a reserved bus name (`dac`, `tape`, ...) or an
/// exported (capitalised first letter) name visible to every listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignalName(pub String);

impl SignalName {
    /// An exported name is visible from every listing; a local name is
    /// scoped to the listing that wrote it. Prefix markers are stripped
    /// first since `'Lead` and `Lead` name the same bus slot.
    pub fn is_exported(&self) -> bool {
        self.base()
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_uppercase())
    }

    /// Strip an optional `'`/`"`/`^` prefix marker, returning the
    /// underlying register/bus name.
    pub fn base(&self) -> &str {
        self.0
            .strip_prefix(['\'', '"', '^'])
            .unwrap_or(&self.0)
    }

    /// This name's register initial value: 1.0 for `'`-prefixed, 0.5 for
    /// `"`-prefixed, 0.0 otherwise (§3 "Register initial value").
    pub fn initial_value(&self) -> f64 {
        match self.0.chars().next() {
            Some('\'') => 1.0,
            Some('"') => 0.5,
            _ => 0.0,
        }
    }

    /// Whether this name is marked write-many (`^` prefix), exempting it
    /// from the single-writer-per-listing invariant.
    pub fn is_write_many(&self) -> bool {
        self.0.starts_with('^')
    }
}

/// One compiled instruction: an opcode plus its resolved operand.
///
/// `num` carries a numeric operand already reduced to its unitless internal
/// scalar by the value parser; `signal` carries a resolved bus index. Only
/// one of the two is populated, matching the operator's `Operand` kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub opcode: OpCode,
    pub num: Option<f64>,
    pub signal: Option<SignalName>,
    /// Source token, kept for `.syt` round-tripping and error messages.
    pub token: String,
}

impl Operation {
    pub fn numeric(opcode: OpCode, value: f64, token: impl Into<String>) -> Self {
        Self {
            opcode,
            num: Some(value),
            signal: None,
            token: token.into(),
        }
    }

    pub fn signal(opcode: OpCode, name: SignalName, token: impl Into<String>) -> Self {
        Self {
            opcode,
            num: None,
            signal: Some(name),
            token: token.into(),
        }
    }

    pub fn bare(opcode: OpCode, token: impl Into<String>) -> Self {
        Self {
            opcode,
            num: None,
            signal: None,
            token: token.into(),
        }
    }
}

/// A compiled listing: the ordered operation stream plus its per-instance
/// runtime state shape (register file, tape buffer, sync flag) described
/// separately at the engine layer. This type is the *program*; the engine
/// owns the mutable state a running instance of it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub ops: Vec<Operation>,
    /// Source text, kept for display and `.syt` export.
    pub source: String,
}

impl Listing {
    pub fn new(ops: Vec<Operation>, source: impl Into<String>) -> Self {
        Self {
            ops,
            source: source.into(),
        }
    }

    /// Whether this listing terminates in `out dac` (the only valid
    /// terminator for an audible listing, per §3's single-writer invariant).
    pub fn writes_dac(&self) -> bool {
        matches!(
            self.ops.last().map(|op| op.opcode),
            Some(OpCode::OutDac)
        )
    }
}

/// A named, storable macro body.
///
/// The body is kept as raw tokens rather than compiled [`Operation`]s:
/// expansion (`@`, `@1`, `@2` substitution) is textual, so a placeholder's
/// eventual operand kind (numeric or signal) is only resolved once the
/// substituted token stream is fed back through the compiler at the call
/// site. This matches the persistence format, which is human-readable
/// structured text rather than a binary compiled form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub comment: String,
    pub tokens: Vec<String>,
    /// Whether this function is persisted across sessions (`:fon`) or
    /// session-local (`:foff`, the default).
    pub persistent: bool,
}

impl Function {
    pub fn new(name: impl Into<String>, comment: impl Into<String>, tokens: Vec<String>) -> Self {
        Self {
            name: name.into(),
            comment: comment.into(),
            tokens,
            persistent: false,
        }
    }
}
