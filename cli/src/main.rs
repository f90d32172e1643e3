//! Headless capture driver.
//!
//! Runs the engine against the synthetic backend: a smoke test for the
//! whole tick loop without any native capture stack. An optional JSON
//! config file overrides the default full-desktop source.
//!
//! ```text
//! frameview [config.json] [--duration-secs N]
//! ```

use std::env;
use std::fs;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use frameview_capture::synthetic::SyntheticBackends;
use frameview_capture::CaptureBackends;
use frameview_engine::CaptureEngine;
use frameview_types::CaptureConfig;

/// Engine tick cadence. Faster than any sane frame rate target; the
/// pacer inside the engine enforces the actual rate.
const TICK: Duration = Duration::from_millis(4);

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "capture run failed");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = CaptureConfig::default();
    let mut duration = Duration::from_secs(5);

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--duration-secs" => {
                let value = args.next().ok_or("--duration-secs needs a value")?;
                duration = Duration::from_secs(value.parse()?);
            }
            "--help" | "-h" => {
                println!("usage: frameview [config.json] [--duration-secs N]");
                return Ok(());
            }
            path => {
                config = serde_json::from_str(&fs::read_to_string(path)?)?;
            }
        }
    }

    let backends: Arc<dyn CaptureBackends> = Arc::new(SyntheticBackends::default());
    let mut engine = CaptureEngine::new(backends);

    for availability in engine.get_available_sources() {
        info!(
            kind = availability.kind.name(),
            available = availability.available,
            count = availability.sources.len(),
            "source availability"
        );
    }

    engine.set_source(config)?;
    engine.start_capture()?;

    let deadline = Instant::now() + duration;
    let mut last_report = Instant::now();
    while Instant::now() < deadline {
        engine.update(Instant::now());

        if last_report.elapsed() >= Duration::from_secs(1) {
            let stats = engine.get_stats();
            info!(
                frames = stats.frames_captured,
                dropped = stats.frames_dropped,
                fps = format!("{:.1}", stats.actual_fps),
                state = engine.state().name(),
                "capture progress"
            );
            last_report = Instant::now();
        }

        thread::sleep(TICK);
    }

    let stats = engine.get_stats();
    info!(
        frames_captured = stats.frames_captured,
        frames_dropped = stats.frames_dropped,
        uptime_seconds = stats.uptime_seconds,
        buffer_bytes = engine.buffer_memory_usage(),
        "capture run complete"
    );
    engine.stop_capture();
    Ok(())
}
