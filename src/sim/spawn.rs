//! Spawn scheduling and the difficulty curve
//!
//! Each category (standard, elite, boss, power-up) keeps its own next-spawn
//! timestamp. Intervals shrink and speeds grow with the difficulty
//! multiplier.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use serde::{Deserialize, Serialize};

use super::buffs::PowerUpKind;
use super::clock::Step;
use super::entity::{
    AnswerTag, Boss, Entity, EntityKind, Hostile, Motion, Owner, Particle, Projectile, Shape,
};
use super::events::GameEvent;
use super::state::GameState;
use super::tick::TickInput;
use crate::config::{
    AnswerLayout, AnswerMode, DifficultyConfig, GameConfig, MotionTemplate, Playfield,
    PowerUpWeight, ProgressMetric, RoundRule, SpawnEdge, SpawnEntry,
};
use crate::polar_to_cartesian;

const PICKUP_RADIUS: f32 = 10.0;
const BOSS_SHOT_RADIUS: f32 = 5.0;

/// Difficulty multiplier for a given progress and level
///
/// `min(max, base + progress / scale + (level - 1) * level_step)`
pub fn multiplier_at(config: &DifficultyConfig, progress: f32, level: u32) -> f32 {
    let level_bonus = level.saturating_sub(1) as f32 * config.level_step;
    (config.base + progress.max(0.0) / config.scale + level_bonus).min(config.max)
}

/// Accumulated progress; never reset mid-run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Difficulty {
    /// Round counter, starting at 1
    pub level: u32,
    pub progress: f32,
    pub kills: u32,
}

impl Default for Difficulty {
    fn default() -> Self {
        Self {
            level: 1,
            progress: 0.0,
            kills: 0,
        }
    }
}

impl Difficulty {
    pub fn multiplier(&self, config: &DifficultyConfig) -> f32 {
        multiplier_at(config, self.progress, self.level)
    }

    /// Accumulate time- or distance-based progress
    pub fn advance(&mut self, config: &DifficultyConfig, step: &Step) {
        match config.metric {
            ProgressMetric::ElapsedSeconds => self.progress += (step.real_ms / 1000.0) as f32,
            ProgressMetric::Distance => self.progress += config.scroll_speed * step.dt,
            ProgressMetric::Kills => {}
        }
    }

    pub fn record_kill(&mut self, config: &DifficultyConfig) {
        self.kills += 1;
        if config.metric == ProgressMetric::Kills {
            self.progress += 1.0;
        }
    }

    /// Checkpoints crossed so far
    pub fn checkpoints(&self, distance: f32) -> u32 {
        if distance <= 0.0 {
            return 0;
        }
        (self.progress / distance).floor() as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnCategory {
    Standard,
    Elite,
    Boss,
    PowerUp,
}

/// Next-spawn timestamps and per-round bookkeeping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpawnScheduler {
    pub standard_at: Option<f64>,
    pub elite_at: Option<f64>,
    pub powerup_at: Option<f64>,
    /// Boss enters when this passes; standard/elite spawning is held meanwhile
    pub boss_warning_until: Option<f64>,
    pub boss_spawned_this_round: bool,
    pub last_boss_ms: Option<f64>,
    /// Spawns left this round (level-based modes)
    pub quota_left: Option<u32>,
}

/// Jittered interval, or `None` when the category is disabled
fn interval(base_ms: f64, multiplier: f32, jitter: f32, rng: &mut impl Rng) -> Option<f64> {
    if base_ms <= 0.0 {
        return None;
    }
    let spread = if jitter > 0.0 {
        rng.random_range(-jitter..=jitter)
    } else {
        0.0
    };
    Some(base_ms / multiplier.max(f32::EPSILON) as f64 * (1.0 + spread) as f64)
}

impl SpawnScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset timers and quota for the round `level`
    pub fn arm(
        &mut self,
        config: &GameConfig,
        level: u32,
        multiplier: f32,
        now_ms: f64,
        rng: &mut impl Rng,
    ) {
        let spawns = &config.spawns;
        for category in [
            SpawnCategory::Standard,
            SpawnCategory::Elite,
            SpawnCategory::PowerUp,
        ] {
            self.reschedule(category, config, multiplier, now_ms, rng);
        }
        self.boss_warning_until = None;
        self.boss_spawned_this_round = false;
        self.quota_left = match config.rounds {
            RoundRule::Cleared {
                quota,
                quota_growth,
            } => Some(quota + quota_growth * level.saturating_sub(1)),
            RoundRule::Checkpoint { .. } => None,
        };
        log::debug!(
            "Scheduler armed for level {} (quota {:?}, standard every {:.0}ms)",
            level,
            self.quota_left,
            spawns.standard_interval_ms / multiplier as f64
        );
    }

    pub fn reschedule(
        &mut self,
        category: SpawnCategory,
        config: &GameConfig,
        multiplier: f32,
        now_ms: f64,
        rng: &mut impl Rng,
    ) {
        let spawns = &config.spawns;
        let jitter = spawns.jitter;
        match category {
            SpawnCategory::Standard => {
                self.standard_at = interval(spawns.standard_interval_ms, multiplier, jitter, rng)
                    .map(|i| now_ms + i);
            }
            SpawnCategory::Elite => {
                self.elite_at = interval(spawns.elite_interval_ms, multiplier, jitter, rng)
                    .map(|i| now_ms + i);
            }
            // Power-ups are not sped up by difficulty
            SpawnCategory::PowerUp => {
                self.powerup_at =
                    interval(spawns.powerup_interval_ms, 1.0, jitter, rng).map(|i| now_ms + i);
            }
            SpawnCategory::Boss => {}
        }
    }

    pub fn due(&self, category: SpawnCategory, now_ms: f64) -> bool {
        let at = match category {
            SpawnCategory::Standard => self.standard_at,
            SpawnCategory::Elite => self.elite_at,
            SpawnCategory::PowerUp => self.powerup_at,
            SpawnCategory::Boss => self.boss_warning_until,
        };
        at.is_some_and(|t| now_ms >= t)
    }

    pub fn quota_exhausted(&self) -> bool {
        self.quota_left == Some(0)
    }

    pub fn is_warning(&self) -> bool {
        self.boss_warning_until.is_some()
    }

    /// This round is a boss round whose boss has not appeared yet
    pub fn boss_pending(&self, config: &GameConfig, level: u32) -> bool {
        config
            .boss
            .as_ref()
            .is_some_and(|b| level % b.every_rounds == 0 && !self.boss_spawned_this_round)
    }

    /// All boss preconditions hold and no warning is running
    pub fn boss_due(&self, config: &GameConfig, level: u32, now_ms: f64, boss_alive: bool) -> bool {
        let Some(boss) = &config.boss else {
            return false;
        };
        self.boss_pending(config, level)
            && !boss_alive
            && !self.is_warning()
            && self
                .last_boss_ms
                .is_none_or(|t| now_ms - t >= boss.min_interval_ms)
    }
}

/// Spawn stage of the tick pipeline
pub fn run(state: &mut GameState, _input: &TickInput, _step: &Step) {
    let now = state.clock.now();
    let multiplier = state.difficulty.multiplier(&state.config.difficulty);

    run_boss(state, now);
    fire_boss_weapons(state, now);

    if !state.scheduler.is_warning() {
        for (category, elite) in [
            (SpawnCategory::Standard, false),
            (SpawnCategory::Elite, true),
        ] {
            if !state.scheduler.due(category, now) || state.scheduler.quota_exhausted() {
                continue;
            }
            if spawn_from_table(state, elite, multiplier, now)
                && let Some(left) = state.scheduler.quota_left.as_mut()
            {
                *left = left.saturating_sub(1);
            }
            state
                .scheduler
                .reschedule(category, &state.config, multiplier, now, &mut state.rng);
        }
    }

    if state.scheduler.due(SpawnCategory::PowerUp, now) {
        if let Some(kind) = pick_power_up(&state.config.spawns.powerups, &mut state.rng) {
            let (lo, hi) = edge_range(
                &state.config.playfield,
                state.config.spawns.powerup_edge,
                Vec2::splat(PICKUP_RADIUS),
                None,
            );
            let along = state
                .config
                .spawns
                .powerup_offset
                .unwrap_or_else(|| random_along(&mut state.rng, lo, hi));
            let pos = edge_position(
                &state.config.playfield,
                state.config.spawns.powerup_edge,
                Vec2::splat(PICKUP_RADIUS),
                along,
            );
            spawn_power_up(state, kind, pos, now);
        }
        state.scheduler.reschedule(
            SpawnCategory::PowerUp,
            &state.config,
            multiplier,
            now,
            &mut state.rng,
        );
    }
}

fn run_boss(state: &mut GameState, now: f64) {
    let level = state.difficulty.level;
    if state.scheduler.due(SpawnCategory::Boss, now) {
        state.scheduler.boss_warning_until = None;
        spawn_boss(state, now);
    } else if state
        .scheduler
        .boss_due(&state.config, level, now, state.pool.has_boss())
        && let Some(boss) = &state.config.boss
    {
        state.scheduler.boss_warning_until = Some(now + boss.warning_ms);
        state.events.push(GameEvent::BossWarning { level });
        log::info!("Boss warning for level {}", level);
    }
}

fn spawn_boss(state: &mut GameState, now: f64) {
    let Some(boss) = state.config.boss.clone() else {
        return;
    };
    let level = state.difficulty.level;
    let field = state.config.playfield;
    let ext = boss.shape.extents();
    let health = boss.health + boss.health_per_level * level.saturating_sub(1) as f32;
    let tag = match (state.config.answers, &state.question) {
        (AnswerMode::Armed, Some(q)) => Some(AnswerTag {
            question: q.id,
            option: None,
            correct: q.item.correct,
        }),
        _ => None,
    };

    let entity = Entity::new(
        EntityKind::Boss(Boss {
            name: boss.name.clone(),
            tag,
            points: boss.points,
            max_health: health,
            next_fire_ms: now + boss.fire_interval_ms,
        }),
        Vec2::new(field.width / 2.0, -ext.y),
        boss.shape,
    )
    .with_velocity(Vec2::new(boss.speed, boss.speed))
    .with_motion(Motion::Patrol {
        min_x: ext.x,
        max_x: field.width - ext.x,
        hover_y: boss.hover_y,
    })
    .with_health(health);

    let id = state.pool.spawn(entity, now);
    state.scheduler.boss_spawned_this_round = true;
    state.scheduler.last_boss_ms = Some(now);
    state.events.push(GameEvent::BossSpawned { id });
    log::info!("Boss '{}' #{} spawned with {} health", boss.name, id, health);
}

fn fire_boss_weapons(state: &mut GameState, now: f64) {
    let Some(boss_cfg) = &state.config.boss else {
        return;
    };
    if boss_cfg.fire_interval_ms <= 0.0 {
        return;
    }
    let interval_ms = boss_cfg.fire_interval_ms;
    let shot_speed = boss_cfg.projectile_speed;
    let lifetime = state.config.projectile.lifetime_ms * 2.0;
    let target = state.player.pos;

    let mut shots = Vec::new();
    for entity in state.pool.iter_mut() {
        if !entity.is_alive() {
            continue;
        }
        let half_h = entity.shape.extents().y;
        if let EntityKind::Boss(boss) = &mut entity.kind
            && now >= boss.next_fire_ms
        {
            boss.next_fire_ms = now + interval_ms;
            shots.push(entity.pos + Vec2::new(0.0, half_h));
        }
    }

    for origin in shots {
        let dir = (target - origin).normalize_or_zero();
        let dir = if dir == Vec2::ZERO { Vec2::Y } else { dir };
        let shot = Entity::new(
            EntityKind::Projectile(Projectile {
                owner: Owner::Hostile,
                answer: None,
                piercing: false,
                homing: 0.0,
                bounces: false,
                damage: 1.0,
                struck: Vec::new(),
            }),
            origin,
            Shape::circle(BOSS_SHOT_RADIUS),
        )
        .with_velocity(dir * shot_speed)
        .with_expiry(now + lifetime);
        state.pool.spawn(shot, now);
    }
}

/// Draw and spawn one eligible table entry. Returns false if none qualified.
fn spawn_from_table(state: &mut GameState, elite: bool, multiplier: f32, now: f64) -> bool {
    let progress = state.difficulty.progress;
    let eligible: Vec<&SpawnEntry> = state
        .config
        .spawns
        .table
        .iter()
        .filter(|e| e.elite == elite && e.weight > 0 && progress >= e.min_progress)
        .collect();
    let Ok(dist) = WeightedIndex::new(eligible.iter().map(|e| e.weight)) else {
        return false;
    };
    let entry = eligible[dist.sample(&mut state.rng)].clone();
    spawn_entry(state, &entry, multiplier, now);
    true
}

/// Answer tags for one spawn of `entry`; one element per entity to spawn
fn answer_tags(state: &mut GameState, entry: &SpawnEntry) -> Vec<Option<AnswerTag>> {
    if !entry.answer_bearing {
        return vec![None];
    }
    let Some(question) = &state.question else {
        return vec![None];
    };
    let count = question.item.options.len();
    if count == 0 {
        return vec![None];
    }
    let tag = AnswerTag {
        question: question.id,
        option: None,
        correct: question.item.correct,
    };
    match state.config.answers {
        AnswerMode::Off => vec![None],
        AnswerMode::Armed => vec![Some(tag)],
        AnswerMode::OptionTargets => match entry.layout {
            AnswerLayout::Row => (0..count)
                .map(|option| {
                    Some(AnswerTag {
                        option: Some(option),
                        ..tag
                    })
                })
                .collect(),
            AnswerLayout::Single => vec![Some(AnswerTag {
                option: Some(state.rng.random_range(0..count)),
                ..tag
            })],
        },
    }
}

/// Spawn an entry at its edge; rows spread one target per option
pub fn spawn_entry(state: &mut GameState, entry: &SpawnEntry, multiplier: f32, now: f64) -> Vec<u32> {
    let field = state.config.playfield;
    let ext = entry.shape.extents();
    let (lo, hi) = edge_range(&field, entry.edge, ext, entry.span);
    let vel = edge_velocity(entry.edge, entry.speed * multiplier);
    let tags = answer_tags(state, entry);
    let count = tags.len();

    let mut ids = Vec::with_capacity(count);
    for (i, tag) in tags.into_iter().enumerate() {
        let along = if count > 1 {
            lo + (i as f32 + 0.5) * (hi - lo) / count as f32
        } else {
            entry
                .offset
                .unwrap_or_else(|| random_along(&mut state.rng, lo, hi))
        };
        let pos = edge_position(&field, entry.edge, ext, along);
        let entity = hostile_from(entry, tag, pos).with_velocity(vel);
        let id = state.pool.spawn(entity, now);
        log::debug!(
            "Spawned {} #{} at ({:.0}, {:.0})",
            entry.name,
            id,
            pos.x,
            pos.y
        );
        ids.push(id);
    }
    ids
}

fn hostile_from(entry: &SpawnEntry, tag: Option<AnswerTag>, pos: Vec2) -> Entity {
    Entity::new(
        EntityKind::Hostile(Hostile {
            name: entry.name.clone(),
            tag,
            points: entry.points,
            solid: entry.solid,
            contact_damage: entry.contact_damage,
            elite: entry.elite,
        }),
        pos,
        entry.shape,
    )
    .with_motion(motion_for(entry.motion, pos))
    .with_health(entry.health)
}

/// Lay out the configured formation grid for a new round
pub fn lay_formation(state: &mut GameState, now: f64) -> usize {
    let Some(formation) = state.config.formation.clone() else {
        return 0;
    };
    let Some(entry) = state.config.entry(&formation.entry).cloned() else {
        log::warn!("Formation entry '{}' missing", formation.entry);
        return 0;
    };
    let multiplier = state.difficulty.multiplier(&state.config.difficulty);
    let vel = edge_velocity(entry.edge, entry.speed * multiplier);

    let base_tag = match (&state.question, state.config.answers, entry.answer_bearing) {
        (Some(q), mode, true) if mode != AnswerMode::Off => Some(AnswerTag {
            question: q.id,
            option: None,
            correct: q.item.correct,
        }),
        _ => None,
    };
    let options = state
        .question
        .as_ref()
        .map_or(1, |q| q.item.options.len().max(1));

    let mut spawned = 0;
    for row in 0..formation.rows {
        for col in 0..formation.cols {
            let cell = (row * formation.cols + col) as usize;
            let tag = base_tag.map(|tag| match state.config.answers {
                AnswerMode::OptionTargets => AnswerTag {
                    option: Some(cell % options),
                    ..tag
                },
                _ => tag,
            });
            let pos = formation.origin + formation.spacing * Vec2::new(col as f32, row as f32);
            state
                .pool
                .spawn(hostile_from(&entry, tag, pos).with_velocity(vel), now);
            spawned += 1;
        }
    }
    log::debug!("Formation of {} '{}' laid out", spawned, entry.name);
    spawned
}

pub fn pick_power_up(weights: &[PowerUpWeight], rng: &mut impl Rng) -> Option<PowerUpKind> {
    let dist = WeightedIndex::new(weights.iter().map(|w| w.weight)).ok()?;
    weights.get(dist.sample(rng)).map(|w| w.kind)
}

pub fn spawn_power_up(state: &mut GameState, kind: PowerUpKind, pos: Vec2, now: f64) -> u32 {
    let spawns = &state.config.spawns;
    let vel = edge_velocity(spawns.powerup_edge, spawns.powerup_speed);
    let entity = Entity::new(EntityKind::Pickup { kind }, pos, Shape::circle(PICKUP_RADIUS))
        .with_velocity(vel);
    let id = state.pool.spawn(entity, now);
    log::debug!("Power-up {:?} #{} spawned", kind, id);
    id
}

/// Side effects of a destroyed hostile or boss: maybe a drop, always a burst
pub fn spawn_debris(state: &mut GameState, destroyed: &Entity, now: f64) {
    let spawns = &state.config.spawns;
    let drop_rate = spawns.drop_rate;
    let count = spawns.burst_particles;

    if drop_rate > 0.0
        && state.rng.random::<f32>() < drop_rate
        && let Some(kind) = pick_power_up(&state.config.spawns.powerups, &mut state.rng)
    {
        spawn_power_up(state, kind, destroyed.pos, now);
    }

    let color = match &destroyed.kind {
        EntityKind::Boss(_) => 0xff4040,
        EntityKind::Hostile(h) if h.elite => 0xffa040,
        _ => 0x40c0ff,
    };
    for i in 0..count {
        let angle = i as f32 / count as f32 * TAU + state.rng.random_range(-0.3..0.3);
        let speed = state.rng.random_range(1.0..4.0);
        let particle = Entity::new(
            EntityKind::Particle(Particle {
                color,
                size: state.rng.random_range(2.0..4.0),
                life: 1.0,
                decay: state.rng.random_range(0.02..0.05),
            }),
            destroyed.pos,
            Shape::circle(1.0),
        )
        .with_velocity(polar_to_cartesian(speed, angle));
        state.pool.spawn(particle, now);
    }
}

fn motion_for(template: MotionTemplate, pos: Vec2) -> Motion {
    match template {
        MotionTemplate::Linear => Motion::Linear,
        MotionTemplate::Weave {
            amplitude,
            frequency,
        } => Motion::Weave {
            anchor: pos,
            amplitude,
            frequency,
            phase: 0.0,
        },
        // Pivot placed so the first position is the spawn point
        MotionTemplate::Orbit {
            radius,
            angular_speed,
        } => Motion::Orbit {
            pivot: pos - Vec2::new(radius, 0.0),
            radius,
            angular_speed,
            angle: 0.0,
        },
        MotionTemplate::Falling { gravity } => Motion::Falling { gravity },
    }
}

fn edge_range(field: &Playfield, edge: SpawnEdge, ext: Vec2, span: Option<(f32, f32)>) -> (f32, f32) {
    span.unwrap_or(match edge {
        SpawnEdge::Top => (ext.x, field.width - ext.x),
        SpawnEdge::Right => (ext.y, field.height * 0.6),
    })
}

fn edge_position(field: &Playfield, edge: SpawnEdge, ext: Vec2, along: f32) -> Vec2 {
    match edge {
        SpawnEdge::Top => Vec2::new(along, -ext.y),
        SpawnEdge::Right => Vec2::new(field.width + ext.x, along),
    }
}

fn edge_velocity(edge: SpawnEdge, speed: f32) -> Vec2 {
    match edge {
        SpawnEdge::Top => Vec2::new(0.0, speed),
        SpawnEdge::Right => Vec2::new(-speed, 0.0),
    }
}

fn random_along(rng: &mut impl Rng, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.random_range(lo..hi) } else { lo }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BossConfig;
    use crate::sim::tick::tick;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_multiplier_is_capped_and_level_stepped() {
        let config = DifficultyConfig::default();
        assert_eq!(multiplier_at(&config, 0.0, 1), 1.0);
        assert!((multiplier_at(&config, 30.0, 1) - 1.5).abs() < 1e-5);
        assert!((multiplier_at(&config, 0.0, 3) - 1.2).abs() < 1e-5);
        assert_eq!(multiplier_at(&config, 1e6, 1), config.max);
    }

    #[test]
    fn test_arm_sets_quota_per_level() {
        let config = GameConfig::shooter();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut scheduler = SpawnScheduler::new();
        scheduler.arm(&config, 1, 1.0, 0.0, &mut rng);
        assert_eq!(scheduler.quota_left, Some(10));
        scheduler.arm(&config, 3, 1.0, 0.0, &mut rng);
        assert_eq!(scheduler.quota_left, Some(16));

        let at = scheduler.standard_at.unwrap();
        let base = config.spawns.standard_interval_ms;
        let jitter = config.spawns.jitter as f64;
        assert!(at >= base * (1.0 - jitter) - 1e-6 && at <= base * (1.0 + jitter) + 1e-6);
    }

    #[test]
    fn test_disabled_categories_never_fire() {
        let config = GameConfig::breakout();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut scheduler = SpawnScheduler::new();
        scheduler.arm(&config, 1, 1.0, 0.0, &mut rng);
        assert_eq!(scheduler.standard_at, None);
        assert!(!scheduler.due(SpawnCategory::Standard, 1e9));
        assert!(!scheduler.due(SpawnCategory::PowerUp, 1e9));
        assert!(scheduler.quota_exhausted());
    }

    #[test]
    fn test_boss_preconditions() {
        let config = GameConfig {
            boss: Some(BossConfig {
                every_rounds: 2,
                min_interval_ms: 1000.0,
                ..Default::default()
            }),
            ..GameConfig::shooter()
        };
        let mut scheduler = SpawnScheduler::new();
        assert!(!scheduler.boss_due(&config, 1, 0.0, false));
        assert!(scheduler.boss_due(&config, 2, 0.0, false));
        assert!(!scheduler.boss_due(&config, 2, 0.0, true));

        scheduler.boss_spawned_this_round = true;
        assert!(!scheduler.boss_due(&config, 2, 0.0, false));

        scheduler.boss_spawned_this_round = false;
        scheduler.last_boss_ms = Some(500.0);
        assert!(!scheduler.boss_due(&config, 4, 1000.0, false));
        assert!(scheduler.boss_due(&config, 4, 1500.0, false));
    }

    #[test]
    fn test_weighted_pick_respects_zero_weights() {
        let mut rng = Pcg32::seed_from_u64(3);
        let weights = [
            PowerUpWeight {
                kind: PowerUpKind::Shield,
                weight: 0,
            },
            PowerUpWeight {
                kind: PowerUpKind::Bomb,
                weight: 5,
            },
        ];
        for _ in 0..50 {
            assert_eq!(pick_power_up(&weights, &mut rng), Some(PowerUpKind::Bomb));
        }
        assert_eq!(pick_power_up(&[], &mut rng), None);
    }

    #[test]
    fn test_gated_entries_wait_for_progress() {
        let mut state = GameState::new(GameConfig::shooter(), 5).unwrap();
        state.difficulty.progress = 0.0;
        for _ in 0..40 {
            spawn_from_table(&mut state, true, 1.0, 0.0);
        }
        assert!(state.pool.hostiles().all(|e| match &e.kind {
            EntityKind::Hostile(h) => h.name == "tank",
            _ => false,
        }));
    }

    #[test]
    fn test_option_row_spawns_one_target_per_option() {
        let mut state = GameState::new(GameConfig::target_range(), 11).unwrap();
        tick(
            &mut state,
            &TickInput {
                start: true,
                ..Default::default()
            },
            0.0,
        );
        let options = state.question.as_ref().unwrap().item.options.len();
        let before = state.pool.hostile_count();
        let entry = state.config.entry("target").unwrap().clone();
        let ids = spawn_entry(&mut state, &entry, 1.0, 0.0);
        assert_eq!(ids.len(), options);
        assert_eq!(state.pool.hostile_count(), before + options);

        let shown: Vec<Option<usize>> = ids
            .iter()
            .map(|&id| state.pool.get(id).unwrap().tag().unwrap().option)
            .collect();
        assert_eq!(shown, (0..options).map(Some).collect::<Vec<_>>());
    }

    #[test]
    fn test_formation_fills_grid() {
        let mut state = GameState::new(GameConfig::breakout(), 2).unwrap();
        state.pool.clear();
        let laid = lay_formation(&mut state, 0.0);
        assert_eq!(laid, 18);
        assert_eq!(state.pool.hostile_count(), 18);
    }

    #[test]
    fn test_debris_bursts_particles() {
        let mut state = GameState::new(GameConfig::shooter(), 9).unwrap();
        let entry = state.config.spawns.table[0].clone();
        let dead = hostile_from(&entry, None, Vec2::new(100.0, 100.0));
        spawn_debris(&mut state, &dead, 0.0);
        assert_eq!(
            state.pool.particles().count(),
            state.config.spawns.burst_particles
        );
    }

    proptest! {
        #[test]
        fn prop_multiplier_monotonic_in_progress(
            a in 0.0f32..10_000.0,
            b in 0.0f32..10_000.0,
            level in 1u32..20,
        ) {
            let config = DifficultyConfig::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let m_lo = multiplier_at(&config, lo, level);
            let m_hi = multiplier_at(&config, hi, level);
            prop_assert!(m_lo <= m_hi);
            prop_assert!(m_hi <= config.max);
        }

        #[test]
        fn prop_progress_never_decreases(frames in proptest::collection::vec(0.0f32..3.0, 1..100)) {
            let config = DifficultyConfig {
                metric: ProgressMetric::Distance,
                ..Default::default()
            };
            let mut difficulty = Difficulty::default();
            let mut last = 0.0;
            for dt in frames {
                difficulty.advance(&config, &Step { dt, raw_dt: dt, real_ms: dt as f64 * 16.0 });
                prop_assert!(difficulty.progress >= last);
                last = difficulty.progress;
            }
        }
    }
}
