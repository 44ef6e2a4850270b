use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use rehab_coach::analysis::{ExerciseKind, FormEngine};
use rehab_coach::config::Config;
use rehab_coach::recording::{load_recording, save_summary};

const CONFIG_PATH: &str = "config.toml";

/// Replay a recorded landmark stream through the form analysis engine
#[derive(Parser, Debug)]
#[command(name = "session-replay")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Recording file (JSON, timestamped landmark frames)
    input: PathBuf,

    /// Config file path
    #[arg(short, long, default_value = CONFIG_PATH)]
    config: PathBuf,

    /// Override the exercise type from the config
    #[arg(short, long)]
    exercise: Option<String>,

    /// Write the session summary as JSON
    #[arg(short, long)]
    summary: Option<PathBuf>,

    /// Print every frame report as a JSON line
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load_or_default(&cli.config)?;
    if let Some(exercise) = cli.exercise {
        config.analysis.exercise = exercise;
    }

    let engine = FormEngine::new(&config.analysis).context("Invalid analysis config")?;
    let recording = load_recording(&cli.input)?;

    eprintln!("Session Replay {}", env!("GIT_VERSION"));
    eprintln!("Exercise: {}", engine.kind().display_name());
    eprintln!("Frames: {}", recording.frames.len());
    eprintln!(
        "Visibility threshold: {}, cooldown: {} ms",
        config.analysis.visibility_threshold, config.analysis.feedback_cooldown_ms
    );
    eprintln!();

    if let Some(recorded) = recording.exercise.as_deref() {
        match recorded.parse::<ExerciseKind>() {
            Ok(kind) if kind != engine.kind() => {
                warn!(recorded = %kind, analyzing = %engine.kind(), "recording exercise differs from config");
            }
            Ok(_) => {}
            Err(name) => warn!(%name, "recording names an unknown exercise"),
        }
    }

    let mut session = engine.start_session();
    let mut missing = 0usize;
    let mut visibility_sum = 0.0f32;

    for frame in &recording.frames {
        let Some(landmarks) = frame.landmark_set() else {
            missing += 1;
            continue;
        };
        let visibility = landmarks.average_visibility();
        visibility_sum += visibility;
        if visibility < config.analysis.visibility_threshold {
            debug!(at_ms = frame.timestamp_ms, visibility, "low average landmark visibility");
        }
        let report = engine.analyze(&mut session, &landmarks, frame.at());

        if cli.json {
            println!("{}", serde_json::to_string(&report)?);
        } else if let Some(event) = &report.feedback {
            let score = report
                .assessment
                .score()
                .map(|s| format!("{:>3.0}%", s))
                .unwrap_or_else(|| "  --".to_string());
            println!(
                "[{:>7.2}s] {} reps={:<3} {:?}: {}",
                frame.at().as_secs_f32(),
                score,
                session.reps(),
                event.category,
                event.message
            );
        }
    }

    if missing > 0 {
        info!(missing, "frames without a detected person were skipped");
    }
    let analyzed = recording.frames.len() - missing;
    if analyzed > 0 {
        info!(
            analyzed,
            mean_visibility = visibility_sum / analyzed as f32,
            "landmark visibility"
        );
    }

    let summary = session.summary();
    eprintln!();
    eprintln!("=== Summary ===");
    eprintln!("Total reps: {}", summary.total_reps);
    match (summary.average_score, summary.best_score) {
        (Some(avg), Some(best)) => eprintln!("Average score: {:.0}%, best: {:.0}%", avg, best),
        _ => eprintln!("Average score: --"),
    }
    eprintln!("Duration: {:.1}s, calories: {:.1}", summary.duration_secs, summary.calories);
    if let Some(verdict) = summary.verdict {
        eprintln!("{}", verdict.message());
    }

    if let Some(path) = &cli.summary {
        save_summary(path, &summary)?;
        info!(path = %path.display(), "summary written");
    }

    Ok(())
}
