//! `statebench replay`: Replay timelines through a memory strategy.

use std::fmt::Write as _;
use std::path::PathBuf;

use clap::ValueEnum;
use statebench_config::BenchConfig;
use statebench_core::error::{Error, TimelineError};
use statebench_core::timeline::{Timeline, Track, parse_jsonl};
use statebench_memory::{QueryPrompt, StrategyOptions, create_strategy, replay_all};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable blocks
    Text,
    /// One JSON record per query
    Json,
}

pub struct ReplayArgs {
    pub file: Option<PathBuf>,
    pub strategy: Option<String>,
    pub tracks: Vec<String>,
    pub format: OutputFormat,
}

pub async fn run(args: ReplayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let output = replay(args).await.map_err(|e| e.to_string())?;
    print!("{output}");
    Ok(())
}

/// Load the timelines, pick the strategy, and render every query prompt.
async fn replay(args: ReplayArgs) -> statebench_core::Result<String> {
    let config = BenchConfig::load()?;

    let path = args
        .file
        .or_else(|| config.run.data.clone())
        .ok_or_else(|| Error::Config {
            message: "No timeline file given (pass FILE or set run.data in the config)".into(),
        })?;

    let content = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| TimelineError::Io {
            path: path.clone(),
            reason: e.to_string(),
        })?;
    let timelines = parse_jsonl(&content).inspect_err(|e| {
        warn!(path = %path.display(), error = %e, "Timeline file rejected");
    })?;

    let tracks = if args.tracks.is_empty() {
        config.track_filter()?
    } else {
        args.tracks
            .iter()
            .map(|t| t.parse::<Track>())
            .collect::<Result<Vec<_>, _>>()?
    };
    let selected = select_tracks(timelines, &tracks);
    if selected.is_empty() {
        warn!(path = %path.display(), "No timelines matched the track filter");
    }

    let name = args.strategy.unwrap_or_else(|| config.strategy.name.clone());
    let options = StrategyOptions {
        token_budget: config.strategy.token_budget,
        working_set_size: config.strategy.working_set_size,
    };
    let mut strategy = create_strategy(&name, &options)?;
    info!(strategy = %name, timelines = selected.len(), "Replaying");

    let prompts = replay_all(strategy.as_mut(), &selected);
    match args.format {
        OutputFormat::Text => Ok(render_text(&prompts, config.run.include_system_prompt)),
        OutputFormat::Json => render_json(&prompts),
    }
}

/// Keep timelines whose track is in `tracks`. An empty filter keeps all.
fn select_tracks(timelines: Vec<Timeline>, tracks: &[Track]) -> Vec<Timeline> {
    if tracks.is_empty() {
        return timelines;
    }
    timelines
        .into_iter()
        .filter(|t| tracks.contains(&t.track))
        .collect()
}

fn render_text(prompts: &[QueryPrompt], include_system_prompt: bool) -> String {
    let mut out = String::new();
    for p in prompts {
        let _ = writeln!(
            out,
            "=== {} query {} (expected: {}) ===",
            p.timeline_id, p.query_index, p.decision
        );
        if include_system_prompt {
            let _ = writeln!(out, "--- system ---\n{}", p.system_prompt);
        }
        let _ = writeln!(out, "--- prompt ---\n{}\n", p.prompt);
    }
    out
}

/// One JSON record per line.
fn render_json(prompts: &[QueryPrompt]) -> statebench_core::Result<String> {
    let mut out = String::new();
    for p in prompts {
        out.push_str(&serde_json::to_string(p)?);
        out.push('\n');
    }
    Ok(out)
}
