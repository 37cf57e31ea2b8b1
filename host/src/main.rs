use std::io::Read;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use teamtilt_core::{
    default_config, run_script, InputScript, JsonFileProgress,
    MemoryProgress, ProgressStore, SessionConfig,
};

#[derive(Debug, Default)]
struct Args {
    script: Option<PathBuf>,
    config: Option<PathBuf>,
    progress: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => {
                args.config = Some(it.next().context("--config needs a path")?.into());
            }
            "--progress" => {
                args.progress = Some(it.next().context("--progress needs a path")?.into());
            }
            other if other.starts_with("--") => bail!("unknown flag {other}"),
            other => args.script = Some(other.into()),
        }
    }
    Ok(args)
}

/// Script from the given file, or stdin when none is given.
fn load_script(path: Option<&PathBuf>) -> Result<InputScript> {
    let json = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading script from stdin")?;
            buf
        }
    };
    serde_json::from_str(&json).context("parsing InputScript JSON")
}

/// Missing keys fall back to the defaults.
fn load_config(path: Option<&PathBuf>) -> Result<SessionConfig> {
    let Some(path) = path else {
        return Ok(default_config());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&json).context("parsing SessionConfig JSON")
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = parse_args()?;
    let script = load_script(args.script.as_ref())?;
    let config = load_config(args.config.as_ref())?;
    info!(
        world = script.world,
        level = script.level,
        ticks = script.ticks.len(),
        "script loaded"
    );

    let mut memory = MemoryProgress::new();
    let mut file;
    let progress: &mut dyn ProgressStore = match &args.progress {
        Some(path) => {
            file = JsonFileProgress::load(path)
                .with_context(|| format!("loading progress {}", path.display()))?;
            &mut file
        }
        None => &mut memory,
    };

    let start = Instant::now();
    let summary = run_script(&script, config, progress)?;
    info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        completed = summary.completed,
        respawns = summary.respawns,
        "replay done"
    );
    info!(completed_levels = progress.completed_count(), "progress");

    let output = serde_json::json!({
        "level": summary.level,
        "frames": summary.frames,
        "ticks": summary.ticks,
        "phase": summary.phase,
        "completed": summary.completed,
        "respawns": summary.respawns,
        "final_position": summary.final_position,
        "navigated_to": summary.navigated_to,
        "script_hash": hex::encode(summary.script_hash),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
