//! Game configuration and presets
//!
//! Every mini-game is the same engine fed a different `GameConfig`:
//! entity tables, spawn weights, control scheme and round rules.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::buffs::{BuffKind, PowerUpKind};
use crate::sim::entity::Shape;
use crate::sim::ledger::ComboTier;

/// Configuration rejected at load time
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("formation references unknown spawn entry '{0}'")]
    UnknownEntry(String),
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Built-in game variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum GamePreset {
    #[default]
    Shooter,
    Runner,
    Breakout,
    TargetRange,
}

impl GamePreset {
    pub const ALL: [GamePreset; 4] = [
        GamePreset::Shooter,
        GamePreset::Runner,
        GamePreset::Breakout,
        GamePreset::TargetRange,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GamePreset::Shooter => "shooter",
            GamePreset::Runner => "runner",
            GamePreset::Breakout => "breakout",
            GamePreset::TargetRange => "target-range",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "shooter" => Some(GamePreset::Shooter),
            "runner" => Some(GamePreset::Runner),
            "breakout" | "bubble" | "bubble-pop" => Some(GamePreset::Breakout),
            "target-range" | "target_range" | "range" => Some(GamePreset::TargetRange),
            _ => None,
        }
    }

    pub fn config(&self) -> GameConfig {
        match self {
            GamePreset::Shooter => GameConfig::shooter(),
            GamePreset::Runner => GameConfig::runner(),
            GamePreset::Breakout => GameConfig::breakout(),
            GamePreset::TargetRange => GameConfig::target_range(),
        }
    }
}

/// World rectangle; entities further than `cull_margin` outside are removed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Playfield {
    pub width: f32,
    pub height: f32,
    pub cull_margin: f32,
}

impl Default for Playfield {
    fn default() -> Self {
        Self {
            width: FIELD_WIDTH,
            height: FIELD_HEIGHT,
            cull_margin: CULL_MARGIN,
        }
    }
}

impl Playfield {
    /// True while a body with the given half extents is within bounds plus margin
    pub fn contains(&self, pos: Vec2, extents: Vec2) -> bool {
        let m = self.cull_margin;
        pos.x + extents.x >= -m
            && pos.x - extents.x <= self.width + m
            && pos.y + extents.y >= -m
            && pos.y - extents.y <= self.height + m
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Milliseconds per dt unit
    pub frame_ms: f64,
    /// Clamp for a single frame, in dt units
    pub max_dt: f32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            frame_ms: FRAME_MS,
            max_dt: MAX_DT_UNITS,
        }
    }
}

/// How input intents move the player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlScheme {
    /// Horizontal movement along a fixed line
    FreeAxis,
    /// Discrete columns across the field
    Lanes { count: u32 },
    /// Gravity, jump and slide over a ground line
    Runner {
        ground_y: f32,
        gravity: f32,
        jump_velocity: f32,
        slide_ms: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub start_lives: u32,
    pub max_lives: u32,
    pub half_extents: Vec2,
    pub start: Vec2,
    /// Pixels per frame unit
    pub speed: f32,
    pub control: ControlScheme,
    pub can_fire: bool,
    pub fire_cooldown_ms: f64,
    /// Fraction of velocity kept when bouncing off a solid obstacle
    pub restitution: f32,
    /// Grace period after taking damage
    pub invulnerable_ms: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            start_lives: 3,
            max_lives: 5,
            half_extents: Vec2::new(16.0, 12.0),
            start: Vec2::new(FIELD_WIDTH / 2.0, FIELD_HEIGHT - 40.0),
            speed: 5.0,
            control: ControlScheme::FreeAxis,
            can_fire: true,
            fire_cooldown_ms: 250.0,
            restitution: 0.3,
            invulnerable_ms: 1000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    pub speed: f32,
    pub radius: f32,
    pub lifetime_ms: f64,
    pub damage: f32,
    pub bounce_walls: bool,
    /// Steering fraction applied while the homing buff is active
    pub homing_strength: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            speed: 9.0,
            radius: 4.0,
            lifetime_ms: 2500.0,
            damage: 1.0,
            bounce_walls: false,
            homing_strength: 0.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Idle time after which the streak resets
    pub decay_window_ms: f64,
    pub tiers: Vec<ComboTier>,
    pub max_multiplier: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            decay_window_ms: 2500.0,
            tiers: vec![
                ComboTier::new(2, 1.5),
                ComboTier::new(3, 2.0),
                ComboTier::new(4, 3.0),
                ComboTier::new(10, 4.0),
            ],
            max_multiplier: 4.0,
        }
    }
}

/// What drives the difficulty curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressMetric {
    ElapsedSeconds,
    Distance,
    Kills,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    pub base: f32,
    /// Progress needed for +1.0 multiplier
    pub scale: f32,
    pub max: f32,
    /// Added per level above the first
    pub level_step: f32,
    pub metric: ProgressMetric,
    /// World scroll per frame unit (distance metric)
    pub scroll_speed: f32,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            base: 1.0,
            scale: 60.0,
            max: 2.5,
            level_step: 0.1,
            metric: ProgressMetric::ElapsedSeconds,
            scroll_speed: 4.0,
        }
    }
}

/// Where new entities enter the playfield
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnEdge {
    /// Above the field, moving down
    Top,
    /// Right of the field, moving left
    Right,
}

/// Motion pattern assigned at spawn
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MotionTemplate {
    Linear,
    Weave { amplitude: f32, frequency: f32 },
    Orbit { radius: f32, angular_speed: f32 },
    Falling { gravity: f32 },
}

/// How an answer-bearing entry lays out options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnswerLayout {
    /// One target per option, spread across the edge
    #[default]
    Row,
    /// One target showing a random option
    Single,
}

/// A row of the spawn table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnEntry {
    pub name: String,
    pub weight: u32,
    /// Eligible once difficulty progress reaches this value
    pub min_progress: f32,
    pub elite: bool,
    pub health: f32,
    pub points: u32,
    pub shape: Shape,
    pub speed: f32,
    pub edge: SpawnEdge,
    /// Fixed coordinate along the edge (x for top, y for right)
    pub offset: Option<f32>,
    /// Range along the edge used for rows and random placement
    pub span: Option<(f32, f32)>,
    pub motion: MotionTemplate,
    pub answer_bearing: bool,
    pub layout: AnswerLayout,
    pub solid: bool,
    pub contact_damage: bool,
}

impl Default for SpawnEntry {
    fn default() -> Self {
        Self {
            name: "drone".to_string(),
            weight: 1,
            min_progress: 0.0,
            elite: false,
            health: 1.0,
            points: 10,
            shape: Shape::rect(16.0, 14.0),
            speed: 1.0,
            edge: SpawnEdge::Top,
            offset: None,
            span: None,
            motion: MotionTemplate::Linear,
            answer_bearing: false,
            layout: AnswerLayout::Row,
            solid: false,
            contact_damage: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerUpWeight {
    pub kind: PowerUpKind,
    pub weight: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Base intervals; 0 disables the category
    pub standard_interval_ms: f64,
    pub elite_interval_ms: f64,
    pub powerup_interval_ms: f64,
    /// Random ± fraction applied to each interval
    pub jitter: f32,
    pub table: Vec<SpawnEntry>,
    pub powerups: Vec<PowerUpWeight>,
    pub powerup_edge: SpawnEdge,
    pub powerup_offset: Option<f32>,
    pub powerup_speed: f32,
    /// Chance a destroyed hostile drops a pickup
    pub drop_rate: f32,
    pub burst_particles: usize,
    pub max_particles: usize,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        use PowerUpKind::*;
        let weights = [
            (Shield, 3),
            (DoubleScore, 3),
            (SlowTime, 2),
            (Speed, 2),
            (Piercing, 2),
            (Homing, 2),
            (RapidFire, 2),
            (ExtraLife, 1),
            (Bomb, 1),
        ];
        Self {
            standard_interval_ms: 1400.0,
            elite_interval_ms: 7000.0,
            powerup_interval_ms: 12000.0,
            jitter: 0.2,
            table: vec![SpawnEntry::default()],
            powerups: weights
                .into_iter()
                .map(|(kind, weight)| PowerUpWeight { kind, weight })
                .collect(),
            powerup_edge: SpawnEdge::Top,
            powerup_offset: None,
            powerup_speed: 1.5,
            drop_rate: 0.12,
            burst_particles: BURST_PARTICLES,
            max_particles: MAX_PARTICLES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossConfig {
    pub name: String,
    /// Boss appears on rounds that are a multiple of this
    pub every_rounds: u32,
    /// Spawning is suppressed for this long before the boss enters
    pub warning_ms: f64,
    /// Minimum gap between two boss appearances
    pub min_interval_ms: f64,
    pub health: f32,
    pub health_per_level: f32,
    pub points: u32,
    pub shape: Shape,
    pub speed: f32,
    pub hover_y: f32,
    /// 0 disables boss fire
    pub fire_interval_ms: f64,
    pub projectile_speed: f32,
}

impl Default for BossConfig {
    fn default() -> Self {
        Self {
            name: "overseer".to_string(),
            every_rounds: 3,
            warning_ms: 2500.0,
            min_interval_ms: 30_000.0,
            health: 12.0,
            health_per_level: 4.0,
            points: 250,
            shape: Shape::rect(60.0, 30.0),
            speed: 1.5,
            hover_y: 120.0,
            fire_interval_ms: 1500.0,
            projectile_speed: 4.0,
        }
    }
}

/// When a round ends
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoundRule {
    /// Level-based: finite spawn quota, round ends once the field is clear
    Cleared { quota: u32, quota_growth: u32 },
    /// Endless: round ends at each progress checkpoint
    Checkpoint { distance: f32 },
}

/// Grid of hostiles laid out at the start of each round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formation {
    /// Spawn table entry used for every cell
    pub entry: String,
    pub rows: u32,
    pub cols: u32,
    pub origin: Vec2,
    pub spacing: Vec2,
}

/// How answers reach targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnswerMode {
    /// No quiz mechanic
    Off,
    /// Player arms an answer; targets carry the correct index
    #[default]
    Armed,
    /// Targets display options; hit the one showing the correct answer
    OptionTargets,
}

/// What a wrong answer costs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WrongAnswerPolicy {
    #[default]
    DamagePlayer,
    /// Counted as a miss only
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuffConfig {
    pub speed_ms: f64,
    pub shield_ms: f64,
    pub slow_time_ms: f64,
    pub double_score_ms: f64,
    pub piercing_ms: f64,
    pub homing_ms: f64,
    pub rapid_fire_ms: f64,
    pub speed_multiplier: f32,
    pub slow_time_scale: f32,
    pub score_multiplier: f32,
    pub rapid_fire_factor: f32,
    pub bomb_boss_damage: f32,
}

impl Default for BuffConfig {
    fn default() -> Self {
        Self {
            speed_ms: 6000.0,
            shield_ms: 10_000.0,
            slow_time_ms: 5000.0,
            double_score_ms: 8000.0,
            piercing_ms: 6000.0,
            homing_ms: 7000.0,
            rapid_fire_ms: 6000.0,
            speed_multiplier: 1.5,
            slow_time_scale: 0.5,
            score_multiplier: 2.0,
            rapid_fire_factor: 0.5,
            bomb_boss_damage: 3.0,
        }
    }
}

impl BuffConfig {
    pub fn duration(&self, kind: BuffKind) -> f64 {
        match kind {
            BuffKind::Speed => self.speed_ms,
            BuffKind::Shield => self.shield_ms,
            BuffKind::SlowTime => self.slow_time_ms,
            BuffKind::DoubleScore => self.double_score_ms,
            BuffKind::Piercing => self.piercing_ms,
            BuffKind::Homing => self.homing_ms,
            BuffKind::RapidFire => self.rapid_fire_ms,
        }
    }
}

/// Complete parameter set for one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub name: String,
    pub playfield: Playfield,
    pub clock: ClockConfig,
    pub player: PlayerConfig,
    pub projectile: ProjectileConfig,
    pub scoring: ScoringConfig,
    pub difficulty: DifficultyConfig,
    pub spawns: SpawnConfig,
    pub boss: Option<BossConfig>,
    pub rounds: RoundRule,
    pub round_transition_ms: f64,
    /// Countdown for timed modes
    pub time_limit_ms: Option<f64>,
    pub answers: AnswerMode,
    pub wrong_answer: WrongAnswerPolicy,
    /// Hostiles slipping past the bottom edge damage the player
    pub escape_damages: bool,
    pub buffs: BuffConfig,
    pub formation: Option<Formation>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            name: "custom".to_string(),
            playfield: Playfield::default(),
            clock: ClockConfig::default(),
            player: PlayerConfig::default(),
            projectile: ProjectileConfig::default(),
            scoring: ScoringConfig::default(),
            difficulty: DifficultyConfig::default(),
            spawns: SpawnConfig::default(),
            boss: None,
            rounds: RoundRule::Cleared {
                quota: 10,
                quota_growth: 3,
            },
            round_transition_ms: 2000.0,
            time_limit_ms: None,
            answers: AnswerMode::Armed,
            wrong_answer: WrongAnswerPolicy::DamagePlayer,
            escape_damages: true,
            buffs: BuffConfig::default(),
            formation: None,
        }
    }
}

impl GameConfig {
    /// Vertical shooter: armed answers, waves with a boss every third round
    pub fn shooter() -> Self {
        Self {
            name: GamePreset::Shooter.as_str().to_string(),
            spawns: SpawnConfig {
                table: vec![
                    SpawnEntry {
                        name: "drone".to_string(),
                        weight: 6,
                        shape: Shape::rect(18.0, 14.0),
                        speed: 1.2,
                        answer_bearing: true,
                        layout: AnswerLayout::Single,
                        ..Default::default()
                    },
                    SpawnEntry {
                        name: "weaver".to_string(),
                        weight: 3,
                        min_progress: 20.0,
                        points: 15,
                        shape: Shape::circle(16.0),
                        motion: MotionTemplate::Weave {
                            amplitude: 40.0,
                            frequency: 0.05,
                        },
                        answer_bearing: true,
                        layout: AnswerLayout::Single,
                        ..Default::default()
                    },
                    SpawnEntry {
                        name: "tank".to_string(),
                        elite: true,
                        health: 3.0,
                        points: 40,
                        shape: Shape::rect(24.0, 20.0),
                        speed: 0.7,
                        ..Default::default()
                    },
                    SpawnEntry {
                        name: "orbiter".to_string(),
                        elite: true,
                        min_progress: 45.0,
                        health: 2.0,
                        points: 30,
                        shape: Shape::circle(14.0),
                        speed: 0.9,
                        motion: MotionTemplate::Orbit {
                            radius: 30.0,
                            angular_speed: 0.08,
                        },
                        ..Default::default()
                    },
                ],
                ..Default::default()
            },
            boss: Some(BossConfig::default()),
            ..Default::default()
        }
    }

    /// Side-scrolling runner: jump obstacles, run through the right answer gates
    pub fn runner() -> Self {
        let ground_y = 560.0;
        Self {
            name: GamePreset::Runner.as_str().to_string(),
            player: PlayerConfig {
                half_extents: Vec2::new(14.0, 24.0),
                start: Vec2::new(96.0, ground_y - 24.0),
                control: ControlScheme::Runner {
                    ground_y,
                    gravity: 0.6,
                    jump_velocity: 12.0,
                    slide_ms: 600.0,
                },
                can_fire: false,
                restitution: 0.0,
                ..Default::default()
            },
            difficulty: DifficultyConfig {
                scale: 2000.0,
                max: 2.2,
                metric: ProgressMetric::Distance,
                scroll_speed: 5.0,
                ..Default::default()
            },
            spawns: SpawnConfig {
                standard_interval_ms: 1600.0,
                elite_interval_ms: 9000.0,
                table: vec![
                    SpawnEntry {
                        name: "crate".to_string(),
                        weight: 5,
                        shape: Shape::rect(20.0, 20.0),
                        speed: 5.0,
                        edge: SpawnEdge::Right,
                        offset: Some(ground_y - 20.0),
                        solid: true,
                        ..Default::default()
                    },
                    SpawnEntry {
                        name: "barrier".to_string(),
                        weight: 2,
                        min_progress: 800.0,
                        shape: Shape::rect(14.0, 40.0),
                        speed: 5.0,
                        edge: SpawnEdge::Right,
                        offset: Some(ground_y - 40.0),
                        solid: true,
                        ..Default::default()
                    },
                    SpawnEntry {
                        name: "gate".to_string(),
                        weight: 4,
                        points: 20,
                        shape: Shape::rect(18.0, 36.0),
                        speed: 5.0,
                        edge: SpawnEdge::Right,
                        offset: Some(ground_y - 36.0),
                        answer_bearing: true,
                        layout: AnswerLayout::Single,
                        contact_damage: false,
                        ..Default::default()
                    },
                    SpawnEntry {
                        name: "bat".to_string(),
                        elite: true,
                        points: 25,
                        shape: Shape::circle(12.0),
                        speed: 6.0,
                        edge: SpawnEdge::Right,
                        offset: Some(ground_y - 110.0),
                        motion: MotionTemplate::Weave {
                            amplitude: 24.0,
                            frequency: 0.12,
                        },
                        ..Default::default()
                    },
                ],
                powerup_edge: SpawnEdge::Right,
                powerup_offset: Some(ground_y - 90.0),
                powerup_speed: 5.0,
                ..Default::default()
            },
            rounds: RoundRule::Checkpoint { distance: 3000.0 },
            answers: AnswerMode::OptionTargets,
            escape_damages: false,
            ..Default::default()
        }
    }

    /// Bubble-pop: a grid of option bubbles, bouncing shots, wrong answers are free
    pub fn breakout() -> Self {
        Self {
            name: GamePreset::Breakout.as_str().to_string(),
            projectile: ProjectileConfig {
                speed: 7.0,
                radius: 6.0,
                lifetime_ms: 6000.0,
                bounce_walls: true,
                ..Default::default()
            },
            player: PlayerConfig {
                fire_cooldown_ms: 450.0,
                ..Default::default()
            },
            spawns: SpawnConfig {
                standard_interval_ms: 0.0,
                elite_interval_ms: 0.0,
                powerup_interval_ms: 0.0,
                drop_rate: 0.2,
                table: vec![SpawnEntry {
                    name: "bubble".to_string(),
                    shape: Shape::circle(22.0),
                    speed: 0.08,
                    answer_bearing: true,
                    contact_damage: true,
                    ..Default::default()
                }],
                ..Default::default()
            },
            formation: Some(Formation {
                entry: "bubble".to_string(),
                rows: 3,
                cols: 6,
                origin: Vec2::new(80.0, 80.0),
                spacing: Vec2::new(64.0, 56.0),
            }),
            rounds: RoundRule::Cleared {
                quota: 0,
                quota_growth: 0,
            },
            answers: AnswerMode::OptionTargets,
            wrong_answer: WrongAnswerPolicy::Ignore,
            ..Default::default()
        }
    }

    /// Timed shooting gallery: rows of option targets drift across the field
    pub fn target_range() -> Self {
        Self {
            name: GamePreset::TargetRange.as_str().to_string(),
            spawns: SpawnConfig {
                standard_interval_ms: 2200.0,
                elite_interval_ms: 8000.0,
                powerup_interval_ms: 15_000.0,
                table: vec![
                    SpawnEntry {
                        name: "target".to_string(),
                        weight: 1,
                        points: 10,
                        shape: Shape::circle(20.0),
                        speed: 1.6,
                        edge: SpawnEdge::Right,
                        span: Some((80.0, 360.0)),
                        motion: MotionTemplate::Weave {
                            amplitude: 12.0,
                            frequency: 0.08,
                        },
                        answer_bearing: true,
                        contact_damage: false,
                        ..Default::default()
                    },
                    SpawnEntry {
                        name: "clay".to_string(),
                        elite: true,
                        points: 35,
                        shape: Shape::circle(12.0),
                        speed: 2.4,
                        edge: SpawnEdge::Right,
                        span: Some((60.0, 200.0)),
                        motion: MotionTemplate::Orbit {
                            radius: 40.0,
                            angular_speed: 0.1,
                        },
                        contact_damage: false,
                        ..Default::default()
                    },
                ],
                ..Default::default()
            },
            rounds: RoundRule::Checkpoint { distance: 30.0 },
            time_limit_ms: Some(60_000.0),
            answers: AnswerMode::OptionTargets,
            wrong_answer: WrongAnswerPolicy::Ignore,
            escape_damages: false,
            ..Default::default()
        }
    }

    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn entry(&self, name: &str) -> Option<&SpawnEntry> {
        self.spawns.table.iter().find(|e| e.name == name)
    }

    /// Check ranges the simulation relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        let field = &self.playfield;
        if !(field.width > 0.0 && field.height > 0.0) {
            return Err(invalid("playfield", "width and height must be positive"));
        }
        if !(self.clock.frame_ms > 0.0 && self.clock.max_dt > 0.0) {
            return Err(invalid("clock", "frame_ms and max_dt must be positive"));
        }
        if self.player.start_lives == 0 || self.player.max_lives < self.player.start_lives {
            return Err(invalid(
                "player.start_lives",
                "must be at least 1 and no more than max_lives",
            ));
        }
        if self.scoring.decay_window_ms <= 0.0 {
            return Err(invalid("scoring.decay_window_ms", "must be positive"));
        }
        if self.scoring.tiers.iter().any(|t| t.multiplier <= 0.0) {
            return Err(invalid("scoring.tiers", "multipliers must be positive"));
        }
        let diff = &self.difficulty;
        if diff.scale <= 0.0 || diff.max < diff.base {
            return Err(invalid(
                "difficulty",
                "scale must be positive and max at least base",
            ));
        }
        let spawns = &self.spawns;
        if !(0.0..1.0).contains(&spawns.jitter) {
            return Err(invalid("spawns.jitter", "must be in [0, 1)"));
        }
        if !(0.0..=1.0).contains(&spawns.drop_rate) {
            return Err(invalid("spawns.drop_rate", "must be in [0, 1]"));
        }
        let needs_standard = spawns.standard_interval_ms > 0.0
            && !matches!(self.rounds, RoundRule::Cleared { quota: 0, quota_growth: 0 });
        if needs_standard && !spawns.table.iter().any(|e| !e.elite && e.weight > 0) {
            return Err(invalid(
                "spawns.table",
                "needs at least one weighted standard entry",
            ));
        }
        if spawns.powerup_interval_ms > 0.0 && spawns.powerups.iter().all(|p| p.weight == 0) {
            return Err(invalid("spawns.powerups", "needs a positive weight"));
        }
        if let Some(boss) = &self.boss {
            if boss.every_rounds == 0 || boss.health <= 0.0 {
                return Err(invalid(
                    "boss",
                    "every_rounds and health must be positive",
                ));
            }
        }
        if let RoundRule::Checkpoint { distance } = self.rounds {
            if distance <= 0.0 {
                return Err(invalid("rounds.distance", "must be positive"));
            }
        }
        if let Some(formation) = &self.formation {
            if self.entry(&formation.entry).is_none() {
                return Err(ConfigError::UnknownEntry(formation.entry.clone()));
            }
        }
        if !(self.buffs.slow_time_scale > 0.0 && self.buffs.slow_time_scale <= 1.0) {
            return Err(invalid("buffs.slow_time_scale", "must be in (0, 1]"));
        }
        Ok(())
    }
}
