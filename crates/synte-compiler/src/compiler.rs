//! Listing compiler (component C): the token-stream state machine described
//! in spec §4.C, plus the function-invocation expansion pass and the
//! single-writer / terminal-uniqueness checks that run at compile time.

use std::collections::{HashSet, VecDeque};

use synte_lang::{
    expand, parse_value, Check, ExpansionError, Function, FunctionStore, Listing, OpCode,
    Operand, Operation, ReservedConstants, SignalName, OPERATOR_TABLE,
};

use crate::tokenizer::{split_args, tokenize};

/// A session command entered via `:name` in command mode.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Exit,
    Erase,
    Play,
    Pause,
    Fon,
    Foff,
    Clear,
    Verbose,
    SetFade(f64),
    SetRelease(f64),
}

/// Something the compiler produced while consuming a line of input.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileEvent {
    /// A listing reached its `out dac` (or `.>sync`) terminator and is ready
    /// for dispatch to the engine.
    ListingEmitted(Listing),
    /// A function definition closed (`]`).
    FunctionDefined(String),
    /// A command-mode directive.
    Command(Command),
}

/// Everything that can go wrong while compiling a token stream.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("unknown operator `{0}`")]
    UnknownOperator(String),
    #[error("operand `{token}` rejected for operator `{op}`")]
    OperandRejected { op: String, token: String },
    #[error("`{0}` is not a valid signal name")]
    InvalidSignalName(String),
    #[error("unexpected token `{0}`")]
    UnexpectedToken(String),
    #[error("function definition never closed with `]`")]
    UnterminatedFunctionDef,
    #[error("placeholder `{0}` used outside a function body")]
    PlaceholderOutsideFunction(String),
    #[error("signal `{0}` written more than once in this listing")]
    DuplicateWrite(String),
    #[error("function expansion failed: {0}")]
    Expansion(#[from] ExpansionError),
    #[error("function invocation `{0}` is missing its argument list")]
    MissingFunctionArgs,
    #[error("unknown command `:{0}`")]
    UnknownCommand(String),
    #[error("listing index operand `{0}` must be non-negative")]
    NegativeIndex(String),
}

#[derive(Debug, Clone)]
enum State {
    AwaitOperator,
    AwaitOperand {
        spec: &'static synte_lang::OpSpec,
        op_token: String,
    },
    ExpectFunctionName,
    InsideFunctionDef { name: String, tokens: Vec<String> },
    CommandMode,
}

#[derive(Debug, Default)]
struct PendingListing {
    ops: Vec<Operation>,
    written: HashSet<String>,
    tokens: Vec<String>,
}

/// The listing compiler. Owns compiler state across feed calls: the current
/// partially-built listing, the function store, and the pending token
/// queue used for macro expansion.
pub struct Compiler {
    constants: ReservedConstants,
    functions: FunctionStore,
    pending: VecDeque<String>,
    state: State,
    current: PendingListing,
    expansions_this_call: usize,
}

/// Upper bound on function expansions processed within one `feed_line`
/// call, guarding against runaway direct or mutual recursion.
const MAX_EXPANSIONS_PER_LINE: usize = 256;

impl Compiler {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            constants: ReservedConstants::for_sample_rate(sample_rate),
            functions: FunctionStore::new(),
            pending: VecDeque::new(),
            state: State::AwaitOperator,
            current: PendingListing::default(),
            expansions_this_call: 0,
        }
    }

    pub fn functions(&self) -> &FunctionStore {
        &self.functions
    }

    pub fn functions_mut(&mut self) -> &mut FunctionStore {
        &mut self.functions
    }

    /// Feed one line of input, running the state machine to completion over
    /// every token it (and any function expansions) produce.
    pub fn feed_line(&mut self, line: &str) -> Result<Vec<CompileEvent>, CompileError> {
        self.expansions_this_call = 0;
        self.pending.extend(tokenize(line));
        let mut events = Vec::new();
        while let Some(token) = self.pending.pop_front() {
            if let Some(event) = self.process_token(token)? {
                events.push(event);
            }
        }
        Ok(events)
    }

    fn process_token(&mut self, token: String) -> Result<Option<CompileEvent>, CompileError> {
        // `_` is a universal escape hatch: silently drop the line being
        // accumulated, in any state where a line is in progress.
        if token == "_" {
            self.current = PendingListing::default();
            self.state = State::AwaitOperator;
            return Ok(None);
        }

        match std::mem::replace(&mut self.state, State::AwaitOperator) {
            State::AwaitOperator => self.in_await_operator(token),
            State::AwaitOperand { spec, op_token } => self.in_await_operand(spec, op_token, token),
            State::ExpectFunctionName => {
                self.state = State::InsideFunctionDef {
                    name: token,
                    tokens: Vec::new(),
                };
                Ok(None)
            }
            State::InsideFunctionDef { name, tokens } => {
                self.in_function_def(name, tokens, token)
            }
            State::CommandMode => self.in_command_mode(token),
        }
    }

    fn in_await_operator(&mut self, token: String) -> Result<Option<CompileEvent>, CompileError> {
        if token == ":" {
            self.state = State::CommandMode;
            return Ok(None);
        }
        if token == "[" {
            self.state = State::ExpectFunctionName;
            return Ok(None);
        }
        if token == "]" {
            return Err(CompileError::UnexpectedToken(token));
        }
        if let Some(name) = token.strip_prefix('=') {
            return self.invoke_function(name.to_string());
        }

        let Some(spec) = OPERATOR_TABLE.iter().find(|s| s.name == token) else {
            return Err(CompileError::UnknownOperator(token));
        };
        self.current.tokens.push(token.clone());

        if spec.operand == Operand::None {
            self.finish_operation(Operation::bare(spec.opcode, token), spec.opcode, false)
        } else {
            self.state = State::AwaitOperand {
                spec,
                op_token: token,
            };
            Ok(None)
        }
    }

    fn in_await_operand(
        &mut self,
        spec: &'static synte_lang::OpSpec,
        op_token: String,
        token: String,
    ) -> Result<Option<CompileEvent>, CompileError> {
        if token.starts_with('@') {
            return Err(CompileError::PlaceholderOutsideFunction(token));
        }
        self.current.tokens.push(token.clone());

        let op = match spec.operand {
            Operand::None => unreachable!("AwaitOperand only entered for operand-bearing ops"),
            Operand::Numeric => self.build_numeric_operand(spec, &op_token, token)?,
            Operand::Signal => self.build_signal_operand(spec, token)?,
            // §4.C: "numeric-looking tokens are parsed by 4.A; otherwise
            // treated as a signal name" — `in 330hz` supplies a constant,
            // `in a` reads a register or bus slot.
            Operand::SignalOrNumeric => {
                if looks_numeric(&token) {
                    self.build_numeric_operand(spec, &op_token, token)?
                } else {
                    self.build_signal_operand(spec, token)?
                }
            }
        };
        let opcode = op.opcode;
        // `.level n` / `.mute n` / `.del n` / `.solo n` terminate a listing
        // the same way `out dac` does (§4.C terminator grammar); the plain
        // `level n` / `mute n` / ... forms are ordinary non-terminal ops.
        let dotted_terminator = op_token.starts_with('.')
            && matches!(
                opcode,
                OpCode::Level | OpCode::Del | OpCode::Mute | OpCode::Solo
            );
        self.finish_operation(op, opcode, dotted_terminator)
    }

    fn build_numeric_operand(
        &mut self,
        spec: &'static synte_lang::OpSpec,
        op_token: &str,
        token: String,
    ) -> Result<Operation, CompileError> {
        let parsed = parse_value(&token, spec.unbounded, &self.constants);
        if !parsed.ok {
            return Err(CompileError::OperandRejected {
                op: op_token.to_string(),
                token,
            });
        }
        if matches!(spec.check, Check::Index | Check::IndexIncl) && parsed.value < 0.0 {
            return Err(CompileError::NegativeIndex(token));
        }
        Ok(Operation::numeric(spec.opcode, parsed.value, token))
    }

    fn build_signal_operand(
        &mut self,
        spec: &'static synte_lang::OpSpec,
        token: String,
    ) -> Result<Operation, CompileError> {
        let name = SignalName(token.clone());
        if !is_valid_signal_name(name.base()) {
            return Err(CompileError::InvalidSignalName(token));
        }
        if spec.check == Check::Out && !name.is_write_many() {
            if self.current.written.contains(name.base()) {
                return Err(CompileError::DuplicateWrite(token));
            }
            self.current.written.insert(name.base().to_string());
        }
        // "out dac" is not a distinct operator token: it's the plain `out`
        // operator targeting the reserved `dac` bus, which is the listing's
        // unique terminator.
        let opcode = if spec.opcode == OpCode::Out && name.base() == "dac" {
            OpCode::OutDac
        } else {
            spec.opcode
        };
        Ok(Operation::signal(opcode, name, token))
    }

    fn finish_operation(
        &mut self,
        op: Operation,
        opcode: OpCode,
        extra_terminator: bool,
    ) -> Result<Option<CompileEvent>, CompileError> {
        self.current.ops.push(op);
        self.state = State::AwaitOperator;
        if extra_terminator || matches!(opcode, OpCode::OutDac | OpCode::SyncEmitTerminal) {
            let finished = std::mem::take(&mut self.current);
            let listing = Listing::new(finished.ops, finished.tokens.join(" "));
            return Ok(Some(CompileEvent::ListingEmitted(listing)));
        }
        Ok(None)
    }

    fn in_function_def(
        &mut self,
        name: String,
        mut tokens: Vec<String>,
        token: String,
    ) -> Result<Option<CompileEvent>, CompileError> {
        if token == "]" {
            self.functions.define(Function::new(name.clone(), "", tokens));
            self.state = State::AwaitOperator;
            return Ok(Some(CompileEvent::FunctionDefined(name)));
        }
        tokens.push(token);
        self.state = State::InsideFunctionDef { name, tokens };
        Ok(None)
    }

    fn in_command_mode(&mut self, token: String) -> Result<Option<CompileEvent>, CompileError> {
        self.state = State::AwaitOperator;
        let command = match token.as_str() {
            "exit" => Command::Exit,
            "erase" => {
                self.current = PendingListing::default();
                Command::Erase
            }
            "play" => Command::Play,
            "pause" => Command::Pause,
            "fon" => Command::Fon,
            "foff" => Command::Foff,
            "clear" => Command::Clear,
            "verbose" => Command::Verbose,
            "mc" => return self.in_master_chain_command(),
            other => return Err(CompileError::UnknownCommand(other.to_string())),
        };
        Ok(Some(CompileEvent::Command(command)))
    }

    fn in_master_chain_command(&mut self) -> Result<Option<CompileEvent>, CompileError> {
        let sub = self
            .pending
            .pop_front()
            .ok_or_else(|| CompileError::UnknownCommand("mc".to_string()))?;
        let value_token = self
            .pending
            .pop_front()
            .ok_or_else(|| CompileError::UnknownCommand("mc".to_string()))?;
        // `fade`/`release` are entered in plain milliseconds, not through
        // the operator table's unit-suffix grammar, so parse them directly
        // rather than through `parse_value`.
        let ms: f64 = value_token
            .parse()
            .map_err(|_| CompileError::OperandRejected {
                op: sub.clone(),
                token: value_token.clone(),
            })?;
        let command = match sub.as_str() {
            "fade" if (0.0..=104_000.0).contains(&ms) => Command::SetFade(ms),
            "release" if (200.0..=60_000.0).contains(&ms) => Command::SetRelease(ms),
            "fade" | "release" => {
                return Err(CompileError::OperandRejected {
                    op: sub,
                    token: value_token,
                })
            }
            other => return Err(CompileError::UnknownCommand(format!("mc {other}"))),
        };
        Ok(Some(CompileEvent::Command(command)))
    }

    fn invoke_function(&mut self, name: String) -> Result<Option<CompileEvent>, CompileError> {
        let arg_token = self
            .pending
            .pop_front()
            .ok_or(CompileError::MissingFunctionArgs)?;
        let args = split_args(&arg_token);
        self.expansions_this_call += 1;
        if self.expansions_this_call > MAX_EXPANSIONS_PER_LINE {
            return Err(CompileError::Expansion(ExpansionError::TooDeep));
        }
        let expanded = expand(&self.functions, &name, &args, 0)?;
        // Insert the expanded tokens at the front of the queue so they're
        // processed before whatever followed the invocation on this line.
        for tok in expanded.into_iter().rev() {
            self.pending.push_front(tok);
        }
        Ok(None)
    }
}

fn is_valid_signal_name(token: &str) -> bool {
    match token.chars().next() {
        Some(c) => c.is_alphabetic(),
        None => false,
    }
}

/// Shape test for operators whose operand is [`Operand::SignalOrNumeric`]:
/// a token starting with a digit, `+`, `-`, or `.` can never be a valid
/// signal name (the EBNF's `nameStart` excludes exactly these), so it must
/// be the numeric form instead.
fn looks_numeric(token: &str) -> bool {
    matches!(token.chars().next(), Some(c) if c.is_ascii_digit() || matches!(c, '+' | '-' | '.'))
}
