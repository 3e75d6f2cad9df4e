//! Syntə live-coding sound engine — command-line front end.

mod audio_thread;
mod editor;
mod reload;

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use synte_io::CpalBackend;
use synte_session::{LevelMirror, MouseState, TelemetryPublisher};

use editor::{Editor, SessionPaths};

#[derive(Parser)]
#[command(name = "synte")]
#[command(author, version, about = "Syntə live-coding sound engine", long_about = None)]
struct Cli {
    /// Sample rate in Hz: 44100, 48000, 96000, or any value in 12000..=192000.
    #[arg(short = 's', long = "sr", default_value_t = 48_000)]
    sr: u32,

    /// Duplicate stereo output onto channels 3/4 for a 4-channel interface.
    #[arg(short = 'm', long)]
    mackie: bool,

    /// Raise the tracing log level; repeatable (-v, -vv, -vvv).
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Override the hot-reload scratch directory (`.syt`/telemetry/wavs).
    #[arg(long = "temp-dir")]
    temp_dir: Option<PathBuf>,

    /// Output device name (substring match); default device if omitted.
    #[arg(short = 'd', long)]
    device: Option<String>,

    /// Record the session's output to `<temp-dir>/audio-recordings/<name>.wav`.
    #[arg(long)]
    record: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if !is_valid_sample_rate(cli.sr) {
        anyhow::bail!(
            "--sr {} is not one of {{44100, 48000, 96000}} and not in 12000..=192000",
            cli.sr
        );
    }

    let config = synte_config::SessionConfig::load_default()?;
    let temp_dir = cli.temp_dir.clone().unwrap_or_else(|| config.temp_dir.clone());
    let paths = SessionPaths::new(temp_dir.clone(), config.functions_path.clone());
    paths.ensure_all()?;

    let (dispatcher, inbox) = synte_engine::channel(synte_engine::DEFAULT_QUEUE_DEPTH);
    let _ = dispatcher.send(synte_engine::DispatchMessage::SetFade(config.fade_ms));
    let _ = dispatcher.send(synte_engine::DispatchMessage::SetRelease(config.release_ms));

    load_wavs(&paths.wavs_dir, &dispatcher);

    let backend = CpalBackend::new();
    let mouse = Arc::new(MouseState::new());
    let telemetry = Arc::new(TelemetryPublisher::new());
    let levels = Arc::new(LevelMirror::new());
    let verbose_flag = Arc::new(AtomicBool::new(false));

    let record_path = cli
        .record
        .as_ref()
        .map(|name| paths.audio_recordings_dir.join(format!("{name}.wav")));

    let audio_config = audio_thread::AudioThreadConfig {
        sample_rate: cli.sr,
        buffer_size: 512,
        mackie: cli.mackie,
        device_name: cli.device.clone(),
        temp_dir: paths.temp_dir.clone(),
        record_path,
    };

    let _stream = audio_thread::spawn(
        audio_config,
        inbox,
        &backend,
        Arc::clone(&mouse),
        Arc::clone(&telemetry),
        Arc::clone(&levels),
        Arc::clone(&verbose_flag),
    )?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_handler = Arc::clone(&shutdown);
    ctrlc::set_handler(move || shutdown_handler.store(true, Ordering::SeqCst))?;

    let reload_dispatcher = dispatcher.clone();
    let reload_shutdown = Arc::clone(&shutdown);
    let reload_temp_dir = paths.temp_dir.clone();
    let reload_sample_rate = f64::from(cli.sr);
    let reload_handle = std::thread::spawn(move || {
        reload::run(reload_temp_dir, reload_sample_rate, reload_dispatcher, levels, reload_shutdown)
    });

    let mut editor = Editor::new(
        f64::from(cli.sr),
        dispatcher,
        paths.temp_dir.clone(),
        paths.functions_path.clone(),
        paths.recordings_dir.clone(),
        verbose_flag,
    );
    editor.load_persisted_functions();

    run_editor_loop(&mut editor, &shutdown);

    shutdown.store(true, Ordering::SeqCst);
    let _ = reload_handle.join();

    Ok(())
}

/// Read lines from stdin until `:exit` or Ctrl+C, feeding each to the
/// compiler. This is the "editor thread" (§5); it owns the process's main
/// thread since stdin and Ctrl+C both want it.
fn run_editor_loop(editor: &mut Editor, shutdown: &AtomicBool) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        if shutdown.load(Ordering::SeqCst) || editor.exit_requested() {
            break;
        }
        let Ok(line) = line else { break };
        editor.feed_line(&line);
    }
    for info in editor.info_lines() {
        tracing::info!("{info}");
    }
}

fn load_wavs(wavs_dir: &std::path::Path, dispatcher: &synte_engine::Dispatcher) {
    let Ok(entries) = std::fs::read_dir(wavs_dir) else {
        return;
    };
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("wav") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        match synte_io::load_wav_mono(&path) {
            Ok(samples) => {
                let _ = dispatcher.send(synte_engine::DispatchMessage::LoadWav(
                    stem.to_string(),
                    Arc::new(samples),
                ));
            }
            Err(err) => tracing::warn!(%err, ?path, "failed to load wav; skipping"),
        }
    }
}

fn is_valid_sample_rate(sr: u32) -> bool {
    matches!(sr, 44_100 | 48_000 | 96_000) || (12_000..=192_000).contains(&sr)
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .init();
}
