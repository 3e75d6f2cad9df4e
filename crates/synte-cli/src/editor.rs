//! Editor thread (§5): owns the compiler, the function store, and the
//! dispatch queue's send side. Reads token lines (normally from stdin) and
//! turns each compiled listing, function definition, or command into the
//! appropriate side effect — dispatching to the audio thread, persisting
//! functions and usage stats, or adjusting master-chain settings.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use synte_compiler::{Command, CompileEvent, Compiler};
use synte_engine::{DispatchMessage, Dispatcher, ListingState};
use synte_lang::{ops, Listing};
use synte_session::{persistence, UsageCounter};

/// Seconds since the Unix epoch, used to name `recordings/<timestamp>.json`.
fn unix_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Rolling on-screen info buffer depth (§7 "a rolling info buffer (16
/// lines)").
const INFO_BUFFER_LINES: usize = 16;

/// Everything the editor thread owns between lines of input.
pub struct Editor {
    compiler: Compiler,
    dispatcher: Dispatcher,
    sample_rate: f64,
    temp_dir: PathBuf,
    functions_path: PathBuf,
    recordings_dir: PathBuf,
    next_index: usize,
    last_function: Option<String>,
    admitted: Vec<Listing>,
    usage: UsageCounter,
    info: VecDeque<String>,
    verbose: Arc<AtomicBool>,
    exit_requested: bool,
}

impl Editor {
    /// `verbose` is shared with the audio thread, which reads it into each
    /// telemetry snapshot; `:verbose` here only flips the flag.
    pub fn new(
        sample_rate: f64,
        dispatcher: Dispatcher,
        temp_dir: PathBuf,
        functions_path: PathBuf,
        recordings_dir: PathBuf,
        verbose: Arc<AtomicBool>,
    ) -> Self {
        let mut compiler = Compiler::new(sample_rate);
        synte_lang::builtins::seed(compiler.functions_mut());
        Self {
            compiler,
            dispatcher,
            sample_rate,
            temp_dir,
            functions_path,
            recordings_dir,
            next_index: 0,
            last_function: None,
            admitted: Vec::new(),
            usage: UsageCounter::new(),
            info: VecDeque::with_capacity(INFO_BUFFER_LINES),
            verbose,
            exit_requested: false,
        }
    }

    /// Load any previously persisted (`:fon`) functions at startup. A
    /// missing file is not an error — LoadErrors degrade silently (§7).
    pub fn load_persisted_functions(&mut self) {
        match persistence::read_functions_json(&self.functions_path) {
            Ok(functions) => {
                for function in functions {
                    self.compiler.functions_mut().define(function);
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => self.push_info(format!("functions.json load failed: {err}")),
        }
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    pub fn info_lines(&self) -> impl Iterator<Item = &str> {
        self.info.iter().map(String::as_str)
    }

    /// Feed one line of input through the compiler, acting on whatever
    /// events it produces. A `CompileError` aborts only the
    /// listing-in-progress (§7 policy); the session keeps running.
    pub fn feed_line(&mut self, line: &str) {
        match self.compiler.feed_line(line) {
            Ok(events) => {
                for event in events {
                    self.handle_event(event);
                }
            }
            Err(err) => self.push_info(format!("error: {err}")),
        }
    }

    fn handle_event(&mut self, event: CompileEvent) {
        match event {
            CompileEvent::ListingEmitted(listing) => self.admit_listing(listing),
            CompileEvent::FunctionDefined(name) => self.last_function = Some(name),
            CompileEvent::Command(command) => self.handle_command(command),
        }
    }

    fn admit_listing(&mut self, listing: Listing) {
        record_usage(&mut self.usage, &listing);

        let index = self.next_index;
        self.next_index += 1;

        if let Err(err) = synte_compiler::syt::write(&self.temp_dir, index, &listing) {
            self.push_info(format!("listing {index}: couldn't write .syt snapshot: {err}"));
        }
        self.admitted.push(listing.clone());

        let state = ListingState::new(listing, self.sample_rate);
        if self
            .dispatcher
            .send(DispatchMessage::Replace(index, Box::new(state)))
            .is_err()
        {
            self.push_info("audio thread is gone; listing dropped".to_string());
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Exit => {
                self.persist_functions();
                self.write_usage();
                self.persist_recording_archive();
                self.exit_requested = true;
            }
            Command::Erase => {}
            Command::Play => {
                let _ = self.dispatcher.send(DispatchMessage::Pause(false));
            }
            Command::Pause => {
                let _ = self.dispatcher.send(DispatchMessage::Pause(true));
            }
            Command::Fon => self.set_last_function_persistent(true),
            Command::Foff => self.set_last_function_persistent(false),
            Command::Clear => self.info.clear(),
            Command::Verbose => {
                let current = self.verbose.load(Ordering::Relaxed);
                self.verbose.store(!current, Ordering::Relaxed);
            }
            Command::SetFade(ms) => {
                let _ = self.dispatcher.send(DispatchMessage::SetFade(ms));
            }
            Command::SetRelease(ms) => {
                let _ = self.dispatcher.send(DispatchMessage::SetRelease(ms));
            }
        }
    }

    fn set_last_function_persistent(&mut self, persistent: bool) {
        let Some(name) = self.last_function.clone() else {
            self.push_info(":fon/:foff with no function defined yet".to_string());
            return;
        };
        if let Some(function) = self.compiler.functions().get(&name) {
            let mut function = function.clone();
            function.persistent = persistent;
            self.compiler.functions_mut().define(function);
        }
    }

    fn persist_functions(&self) {
        if let Err(err) =
            persistence::write_functions_json(&self.functions_path, self.compiler.functions().persistent())
        {
            tracing::warn!(%err, "failed to persist functions.json");
        }
    }

    /// Archive every listing admitted this session to
    /// `recordings/<timestamp>.json` (§4.C / §6 on-disk artifacts). A
    /// session that never admitted a listing still gets an empty archive,
    /// same as `functions.json` and `usage.txt` are written unconditionally.
    fn persist_recording_archive(&self) {
        let path = self.recordings_dir.join(format!("{}.json", unix_timestamp()));
        if let Err(err) = persistence::write_recording(&path, &self.admitted) {
            tracing::warn!(%err, "failed to write recordings archive");
        }
    }

    fn write_usage(&self) {
        let Some(dir) = self.functions_path.parent() else {
            return;
        };
        if let Err(err) = self.usage.write(&dir.join("usage.txt")) {
            tracing::warn!(%err, "failed to write usage.txt");
        }
    }

    fn push_info(&mut self, message: String) {
        tracing::warn!("{message}");
        if self.info.len() >= INFO_BUFFER_LINES {
            self.info.pop_front();
        }
        self.info.push_back(message);
    }
}

/// Record one use of each operator this listing invoked, resolving the
/// operator's name from its opcode via the operator table (an
/// `Operation`'s own `token` field holds its operand's text, not its
/// operator name, for operand-bearing operators).
fn record_usage(usage: &mut UsageCounter, listing: &Listing) {
    for op in &listing.ops {
        if let Some(spec) = ops::OPERATOR_TABLE.iter().find(|spec| spec.opcode == op.opcode) {
            usage.record(spec.name);
        }
    }
}

/// Directory layout the editor and audio threads share under the
/// configured temp/data root (§6 on-disk artifacts).
pub struct SessionPaths {
    pub temp_dir: PathBuf,
    pub functions_path: PathBuf,
    pub recordings_dir: PathBuf,
    pub audio_recordings_dir: PathBuf,
    pub wavs_dir: PathBuf,
}

impl SessionPaths {
    pub fn new(temp_dir: PathBuf, functions_path: PathBuf) -> Self {
        Self {
            recordings_dir: temp_dir.join("recordings"),
            audio_recordings_dir: temp_dir.join("audio-recordings"),
            wavs_dir: temp_dir.join("wavs"),
            temp_dir,
            functions_path,
        }
    }

    pub fn ensure_all(&self) -> std::io::Result<()> {
        for dir in [&self.temp_dir, &self.recordings_dir, &self.audio_recordings_dir, &self.wavs_dir] {
            ensure_dir(dir)?;
        }
        Ok(())
    }
}

fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
