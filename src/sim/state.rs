//! Game state and the player
//!
//! `GameState` is the explicit context passed to every pipeline stage.
//! Everything a tick reads or writes lives here.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::buffs::{BuffKind, BuffRegistry, Modifiers};
use super::clock::SimClock;
use super::content::{ContentProvider, NoContent, Question, ShuffledDeck, sample_items};
use super::entity::{Entity, Shape};
use super::events::{GameEvent, GameSummary};
use super::ledger::{ComboLedger, RunStats};
use super::phase::{GamePhase, PhaseMachine};
use super::pool::EntityPool;
use super::spawn::{self, Difficulty, SpawnScheduler};
use crate::config::{AnswerMode, ConfigError, ControlScheme, GameConfig, PlayerConfig};

/// The player's body and per-run status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    pub half_extents: Vec2,
    pub lives: u32,
    /// Answer carried by shots and contacts (armed-answer games)
    pub armed_answer: Option<usize>,
    /// Column index (lane control)
    pub lane: u32,
    pub grounded: bool,
    pub slide_until_ms: f64,
    pub invulnerable_until_ms: f64,
    pub next_fire_ms: f64,
}

impl Player {
    pub fn new(config: &PlayerConfig, field_width: f32) -> Self {
        let mut player = Self {
            pos: config.start,
            vel: Vec2::ZERO,
            half_extents: config.half_extents,
            lives: config.start_lives,
            armed_answer: None,
            lane: 0,
            grounded: false,
            slide_until_ms: 0.0,
            invulnerable_until_ms: 0.0,
            next_fire_ms: 0.0,
        };
        match config.control {
            ControlScheme::Lanes { count } if count > 0 => {
                player.lane = count / 2;
                player.pos.x = lane_center(player.lane, count, field_width);
            }
            ControlScheme::Runner { ground_y, .. } => {
                player.pos.y = ground_y - config.half_extents.y;
                player.grounded = true;
            }
            _ => {}
        }
        player
    }

    pub fn is_invulnerable(&self, now_ms: f64) -> bool {
        now_ms < self.invulnerable_until_ms
    }

    pub fn is_sliding(&self, now_ms: f64) -> bool {
        now_ms < self.slide_until_ms
    }

    /// Collision body; sliding halves the height and keeps the feet planted
    pub fn body(&self, now_ms: f64) -> (Vec2, Shape) {
        if self.is_sliding(now_ms) {
            let half = Vec2::new(self.half_extents.x, self.half_extents.y / 2.0);
            let pos = self.pos + Vec2::new(0.0, self.half_extents.y / 2.0);
            (pos, Shape::Rect { half })
        } else {
            (self.pos, Shape::Rect {
                half: self.half_extents,
            })
        }
    }
}

/// Centre x of `lane` when the field is split into `count` columns
pub fn lane_center(lane: u32, count: u32, width: f32) -> f32 {
    (lane as f32 + 0.5) * width / count.max(1) as f32
}

/// Read-only view handed to renderers
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub game: &'a str,
    pub phase: GamePhase,
    pub elapsed_ms: f64,
    pub entities: &'a [Entity],
    pub player: &'a Player,
    pub score: u64,
    pub streak: u32,
    pub multiplier: f32,
    pub level: u32,
    pub progress: f32,
    pub difficulty: f32,
    pub buffs: Vec<(BuffKind, f64)>,
    pub question: Option<&'a Question>,
    pub time_left_ms: Option<f64>,
    pub stats: &'a RunStats,
}

/// Complete simulation context for one run
pub struct GameState {
    pub config: GameConfig,
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub clock: SimClock,
    pub phase: PhaseMachine,
    pub pool: EntityPool,
    pub player: Player,
    pub ledger: ComboLedger,
    pub stats: RunStats,
    pub buffs: BuffRegistry,
    pub modifiers: Modifiers,
    pub scheduler: SpawnScheduler,
    pub difficulty: Difficulty,
    pub content: Box<dyn ContentProvider>,
    pub question: Option<Question>,
    pub time_left_ms: Option<f64>,
    /// Events emitted during the last tick
    pub events: Vec<GameEvent>,
    next_question_id: u32,
}

impl GameState {
    /// New run using the built-in sample deck (or no content when answers are off)
    pub fn new(config: GameConfig, seed: u64) -> Result<Self, ConfigError> {
        let content: Box<dyn ContentProvider> = match config.answers {
            AnswerMode::Off => Box::new(NoContent),
            _ => match ShuffledDeck::new(sample_items(), seed) {
                Ok(deck) => Box::new(deck),
                Err(_) => Box::new(NoContent),
            },
        };
        Self::with_content(config, seed, content)
    }

    pub fn with_content(
        config: GameConfig,
        seed: u64,
        content: Box<dyn ContentProvider>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::assemble(config, seed, content))
    }

    fn assemble(config: GameConfig, seed: u64, content: Box<dyn ContentProvider>) -> Self {
        log::info!("New '{}' run with seed {}", config.name, seed);
        Self {
            rng: Pcg32::seed_from_u64(seed),
            clock: SimClock::new(&config.clock),
            phase: PhaseMachine::new(),
            pool: EntityPool::new(config.spawns.max_particles),
            player: Player::new(&config.player, config.playfield.width),
            ledger: ComboLedger::new(&config.scoring),
            stats: RunStats::default(),
            buffs: BuffRegistry::new(),
            modifiers: Modifiers::default(),
            scheduler: SpawnScheduler::new(),
            difficulty: Difficulty::default(),
            content,
            question: None,
            time_left_ms: config.time_limit_ms,
            events: Vec::new(),
            next_question_id: 1,
            seed,
            config,
        }
    }

    /// Replace every component with a fresh instance
    pub fn restart(&mut self) {
        let mut content = std::mem::replace(&mut self.content, Box::new(NoContent));
        content.reset();
        let config = self.config.clone();
        *self = Self::assemble(config, self.seed, content);
    }

    /// Intro → Playing: first question, round one armed
    pub fn start_game(&mut self) {
        if !self.phase.start() {
            return;
        }
        self.events.push(GameEvent::GameStarted);
        if self.config.answers != AnswerMode::Off {
            self.next_question();
        }
        self.arm_round();
    }

    /// RoundTransition → Playing with the next level
    pub fn begin_round(&mut self) {
        if !self.phase.resume_round() {
            return;
        }
        self.difficulty.level += 1;
        self.arm_round();
    }

    fn arm_round(&mut self) {
        let now = self.clock.now();
        let level = self.difficulty.level;
        let multiplier = self.difficulty.multiplier(&self.config.difficulty);
        self.scheduler
            .arm(&self.config, level, multiplier, now, &mut self.rng);
        spawn::lay_formation(self, now);
        self.events.push(GameEvent::RoundStarted { level });
        log::info!("Round {} started (difficulty x{:.2})", level, multiplier);
    }

    /// Draw the next question and re-tag every live answer target
    pub fn next_question(&mut self) -> bool {
        let Some(item) = self.content.next_item() else {
            if self.question.is_none() {
                log::warn!("Content provider is empty; targets spawn untagged");
            }
            return false;
        };
        if let Err(err) = item.validate() {
            log::warn!("Skipping malformed question: {}", err);
            return false;
        }
        let id = self.next_question_id;
        self.next_question_id += 1;

        let options = item.options.len();
        for entity in self.pool.iter_mut() {
            if let Some(tag) = entity.tag_mut() {
                tag.question = id;
                tag.correct = item.correct;
                if let Some(option) = tag.option.as_mut() {
                    *option %= options;
                }
            }
        }
        self.player.armed_answer = None;
        self.question = Some(Question { id, item });
        self.events.push(GameEvent::QuestionChanged { id });
        true
    }

    pub fn phase(&self) -> GamePhase {
        self.phase.phase
    }

    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    pub fn is_over(&self) -> bool {
        self.phase.is(GamePhase::GameOver)
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            score: self.ledger.score,
            level: self.difficulty.level,
            accuracy: self.stats.accuracy(),
            best_combo: self.ledger.best_streak,
            kills: self.stats.kills,
            correct: self.stats.correct,
            wrong: self.stats.wrong,
            bosses_defeated: self.stats.bosses_defeated,
            duration_ms: self.clock.now(),
        }
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        let now = self.clock.now();
        Snapshot {
            game: &self.config.name,
            phase: self.phase.phase,
            elapsed_ms: now,
            entities: self.pool.entities(),
            player: &self.player,
            score: self.ledger.score,
            streak: self.ledger.streak,
            multiplier: self.ledger.multiplier(),
            level: self.difficulty.level,
            progress: self.difficulty.progress,
            difficulty: self.difficulty.multiplier(&self.config.difficulty),
            buffs: self.buffs.active(now),
            question: self.question.as_ref(),
            time_left_ms: self.time_left_ms,
            stats: &self.stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GamePreset;
    use crate::sim::content::QuizItem;

    #[test]
    fn test_new_validates_config() {
        let mut config = GameConfig::shooter();
        config.playfield.width = 0.0;
        assert!(GameState::new(config, 1).is_err());
    }

    #[test]
    fn test_start_draws_question_and_arms_round() {
        let mut state = GameState::new(GameConfig::shooter(), 1).unwrap();
        assert_eq!(state.phase(), GamePhase::Intro);
        state.start_game();
        assert_eq!(state.phase(), GamePhase::Playing);
        assert!(state.question.is_some());
        assert_eq!(state.scheduler.quota_left, Some(10));
        assert!(state.events.contains(&GameEvent::GameStarted));
    }

    #[test]
    fn test_empty_content_spawns_untagged() {
        let mut state =
            GameState::with_content(GameConfig::breakout(), 1, Box::new(NoContent)).unwrap();
        state.start_game();
        assert!(state.question.is_none());
        assert!(state.pool.hostile_count() > 0);
        assert!(state.pool.hostiles().all(|e| e.tag().is_none()));
    }

    /// Hands out items straight from a list, bypassing `QuizItem::new`
    struct RawItems(Vec<QuizItem>);

    impl ContentProvider for RawItems {
        fn next_item(&mut self) -> Option<QuizItem> {
            if self.0.is_empty() {
                None
            } else {
                Some(self.0.remove(0))
            }
        }
    }

    #[test]
    fn test_malformed_items_are_skipped() {
        let broken = QuizItem {
            prompt: "empty".to_string(),
            options: vec![],
            correct: 0,
        };
        let mut state =
            GameState::with_content(GameConfig::breakout(), 1, Box::new(RawItems(vec![broken])))
                .unwrap();
        state.start_game();
        assert_eq!(state.phase(), GamePhase::Playing);
        assert!(state.question.is_none());
        assert_eq!(state.pool.hostile_count(), 18);
        assert!(state.pool.hostiles().all(|e| e.tag().is_none()));
    }

    #[test]
    fn test_malformed_item_keeps_current_question() {
        let good = QuizItem::new("ok", vec!["1".into(), "2".into()], 1).unwrap();
        let out_of_range = QuizItem {
            prompt: "bad".to_string(),
            options: vec!["1".into(), "2".into()],
            correct: 5,
        };
        let mut state = GameState::with_content(
            GameConfig::breakout(),
            1,
            Box::new(RawItems(vec![good.clone(), out_of_range])),
        )
        .unwrap();
        state.start_game();
        assert!(!state.next_question());
        let question = state.question.as_ref().unwrap();
        assert_eq!(question.id, 1);
        assert_eq!(question.item, good);
    }

    #[test]
    fn test_next_question_retags_live_targets() {
        let items = vec![
            QuizItem::new("a", vec!["1".into(), "2".into(), "3".into()], 2).unwrap(),
            QuizItem::new("b", vec!["1".into(), "2".into()], 0).unwrap(),
        ];
        let deck = ShuffledDeck::new(items, 4).unwrap();
        let mut state =
            GameState::with_content(GameConfig::breakout(), 4, Box::new(deck)).unwrap();
        state.start_game();
        let first = state.question.as_ref().unwrap().id;

        assert!(state.next_question());
        let question = state.question.clone().unwrap();
        assert_ne!(question.id, first);
        for entity in state.pool.hostiles() {
            let tag = entity.tag().unwrap();
            assert_eq!(tag.question, question.id);
            assert_eq!(tag.correct, question.item.correct);
            assert!(tag.option.unwrap() < question.item.options.len());
        }
    }

    #[test]
    fn test_lane_player_starts_centred() {
        let mut config = GameConfig::shooter();
        config.player.control = ControlScheme::Lanes { count: 3 };
        let state = GameState::new(config, 1).unwrap();
        assert_eq!(state.player.lane, 1);
        assert_eq!(state.player.pos.x, state.config.playfield.width / 2.0);
    }

    #[test]
    fn test_sliding_body_is_shorter() {
        let state = GameState::new(GamePreset::Runner.config(), 1).unwrap();
        let mut player = state.player.clone();
        let (_, standing) = player.body(0.0);
        player.slide_until_ms = 100.0;
        let (pos, sliding) = player.body(0.0);
        assert!(sliding.extents().y < standing.extents().y);
        assert!(pos.y > player.pos.y);
        assert!(player.grounded);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut state = GameState::new(GameConfig::target_range(), 3).unwrap();
        state.start_game();
        let json = serde_json::to_string(&state.snapshot()).unwrap();
        assert!(json.contains("\"phase\":\"Playing\""));
        assert!(json.contains("\"time_left_ms\":60000.0"));
    }
}
