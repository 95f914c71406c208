//! Quiz Arcade demo runner
//!
//! Plays a preset headless with the autopilot, logs events and prints the
//! end-of-run summary as JSON.

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::path::{Path, PathBuf};
    use std::time::{SystemTime, UNIX_EPOCH};

    use anyhow::{Context, Result, anyhow};
    use clap::Parser;
    use serde::Serialize;

    use quiz_arcade::consts::FRAME_MS;
    use quiz_arcade::sim::{Autopilot, GameEvent, GameState, GameSummary, tick};
    use quiz_arcade::{GameConfig, GamePreset, HighScores};

    #[derive(Parser)]
    #[command(name = "quiz-arcade")]
    #[command(about = "Run an answer-driven arcade game headless with the autopilot", long_about = None)]
    #[command(version)]
    struct Args {
        /// Game preset (shooter, runner, breakout, target-range)
        #[arg(long, default_value = "shooter")]
        preset: String,

        /// RNG seed for the simulation and the autopilot
        #[arg(long, default_value_t = 1)]
        seed: u64,

        /// Simulated seconds to run before stopping
        #[arg(long, default_value_t = 120.0)]
        seconds: f64,

        /// Chance the autopilot picks the correct answer
        #[arg(long, default_value_t = 0.8)]
        accuracy: f32,

        /// JSON game config, overrides --preset
        #[arg(long)]
        config: Option<PathBuf>,

        /// JSON high-score table to rank against; created or updated after the run
        #[arg(long)]
        scores: Option<PathBuf>,
    }

    #[derive(Serialize)]
    struct Report<'a> {
        game: &'a str,
        seed: u64,
        frames: u64,
        finished: bool,
        summary: GameSummary,
        rank: Option<usize>,
    }

    fn load_config(args: &Args) -> Result<GameConfig> {
        if let Some(path) = &args.config {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            return GameConfig::from_json(&json)
                .with_context(|| format!("parsing {}", path.display()));
        }
        let preset = GamePreset::from_str(&args.preset)
            .ok_or_else(|| anyhow!("unknown preset '{}'", args.preset))?;
        Ok(preset.config())
    }

    /// Loads the table at `path`, or an empty one when the file doesn't exist yet
    fn load_scores(path: &Path) -> Result<HighScores> {
        if !path.exists() {
            return Ok(HighScores::new());
        }
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        HighScores::from_json(&json).with_context(|| format!("parsing {}", path.display()))
    }

    /// Ranks the run against the stored table and writes the table back.
    /// Without a path there is nothing to rank against.
    fn record_run(
        path: Option<&Path>,
        summary: &GameSummary,
        timestamp: f64,
    ) -> Result<Option<usize>> {
        let Some(path) = path else {
            return Ok(None);
        };
        let mut scores = load_scores(path)?;
        let rank = scores.record(summary, timestamp);
        if rank.is_some() {
            std::fs::write(path, scores.to_json()?)
                .with_context(|| format!("writing {}", path.display()))?;
        }
        Ok(rank)
    }

    fn log_event(frame: u64, event: &GameEvent) {
        match event {
            GameEvent::GameOver(_)
            | GameEvent::RoundComplete { .. }
            | GameEvent::BossSpawned { .. }
            | GameEvent::BossDefeated { .. } => log::info!("[{frame}] {event:?}"),
            _ => log::debug!("[{frame}] {event:?}"),
        }
    }

    pub fn run() -> Result<()> {
        env_logger::init();
        let args = Args::parse();
        let config = load_config(&args)?;
        let name = config.name.clone();
        log::info!("Quiz Arcade demo: {} (seed {})", name, args.seed);

        let mut state = GameState::new(config, args.seed)?;
        let mut bot = Autopilot::new(args.seed, args.accuracy);
        let total_frames = (args.seconds * 1000.0 / FRAME_MS).max(0.0) as u64;

        let mut frames = 0;
        while frames < total_frames && !state.is_over() {
            let input = bot.input(&state);
            tick(&mut state, &input, frames as f64 * FRAME_MS);
            for event in &state.events {
                log_event(frames, event);
            }
            frames += 1;
        }

        let summary = state.summary();
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as f64)
            .unwrap_or(0.0);
        let rank = record_run(args.scores.as_deref(), &summary, timestamp)?;

        let report = Report {
            game: &name,
            seed: args.seed,
            frames,
            finished: state.is_over(),
            summary,
            rank,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        Ok(())
    }

}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    demo::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The web host drives the library directly
}
