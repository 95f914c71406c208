//! Per-frame simulation tick
//!
//! A tick gates on the phase, then runs the fixed pipeline of stages in
//! order. Reordering the simulation means editing `PIPELINE`.

use glam::Vec2;

use super::buffs::Modifiers;
use super::clock::Step;
use super::entity::{Entity, EntityKind, Owner, Projectile, Shape};
use super::events::GameEvent;
use super::phase::GamePhase;
use super::state::{GameState, lane_center};
use super::{resolve, spawn};
use crate::config::{AnswerMode, ControlScheme, RoundRule};

/// Input intents for a single tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// Horizontal intent, -1..1
    pub move_x: f32,
    /// Lane change (lane control)
    pub lane_delta: i32,
    pub fire: bool,
    pub jump: bool,
    pub slide: bool,
    /// Pause toggle
    pub pause: bool,
    /// Answer to arm (armed-answer games)
    pub answer: Option<usize>,
    pub start: bool,
    pub restart: bool,
}

pub type StageFn = fn(&mut GameState, &TickInput, &Step);

/// A named step of the per-tick pipeline
pub struct Stage {
    pub name: &'static str,
    pub run: StageFn,
}

pub const PIPELINE: [Stage; 7] = [
    Stage {
        name: "control",
        run: control,
    },
    Stage {
        name: "spawn",
        run: spawn::run,
    },
    Stage {
        name: "integrate",
        run: integrate,
    },
    Stage {
        name: "collide",
        run: resolve::run,
    },
    Stage {
        name: "cull",
        run: cull,
    },
    Stage {
        name: "decay",
        run: decay,
    },
    Stage {
        name: "evaluate",
        run: evaluate,
    },
];

/// Advance the game by one frame at timestamp `frame_ms`
pub fn tick(state: &mut GameState, input: &TickInput, frame_ms: f64) {
    state.events.clear();

    if input.restart {
        state.restart();
        state.clock.hold(frame_ms);
        return;
    }

    if input.pause && state.phase.toggle_pause() {
        state.events.push(if state.phase.is(GamePhase::Paused) {
            GameEvent::Paused
        } else {
            GameEvent::Resumed
        });
    }

    match state.phase() {
        GamePhase::Intro => {
            state.clock.hold(frame_ms);
            if input.start || input.fire {
                state.start_game();
            }
        }
        GamePhase::Paused | GamePhase::GameOver => state.clock.hold(frame_ms),
        GamePhase::RoundTransition => {
            // World keeps drifting (particles), nothing spawns or scores
            let step = state.clock.advance(frame_ms, 1.0);
            state.pool.update(step.dt);
            cull(state, input, &step);
            if state.phase.transition_elapsed(state.clock.now()) {
                state.begin_round();
            }
        }
        GamePhase::Playing => {
            let step = state.clock.advance(frame_ms, state.modifiers.time_scale);
            for stage in &PIPELINE {
                (stage.run)(state, input, &step);
            }
        }
    }
}

/// Player movement, answer arming and firing
fn control(state: &mut GameState, input: &TickInput, step: &Step) {
    let now = state.clock.now();
    let width = state.config.playfield.width;
    let player_cfg = state.config.player;
    let speed = player_cfg.speed * state.modifiers.speed;
    let dt = step.raw_dt;
    let move_x = if input.move_x.is_finite() {
        input.move_x.clamp(-1.0, 1.0)
    } else {
        0.0
    };

    let player = &mut state.player;
    match player_cfg.control {
        ControlScheme::FreeAxis => {
            player.vel.x = move_x * speed;
            player.pos.x += player.vel.x * dt;
        }
        ControlScheme::Lanes { count } => {
            if input.lane_delta != 0 && count > 0 {
                let lane = (player.lane as i64 + input.lane_delta as i64).clamp(0, count as i64 - 1);
                player.lane = lane as u32;
            }
            player.pos.x = lane_center(player.lane, count, width);
        }
        ControlScheme::Runner {
            ground_y,
            gravity,
            jump_velocity,
            slide_ms,
        } => {
            if input.jump && player.grounded {
                player.vel.y = -jump_velocity;
                player.grounded = false;
                player.slide_until_ms = 0.0;
            } else if input.slide && player.grounded && !player.is_sliding(now) {
                player.slide_until_ms = now + slide_ms;
            }
            player.vel.y += gravity * dt;
            player.pos.y += player.vel.y * dt;
            player.pos.x += move_x * speed * dt;

            let floor = ground_y - player.half_extents.y;
            if player.pos.y >= floor {
                player.pos.y = floor;
                player.vel.y = 0.0;
                player.grounded = true;
            } else {
                player.grounded = false;
            }
        }
    }
    let half_w = player.half_extents.x;
    player.pos.x = player.pos.x.clamp(half_w, (width - half_w).max(half_w));

    if state.config.answers == AnswerMode::Armed
        && let (Some(answer), Some(question)) = (input.answer, &state.question)
        && answer < question.item.options.len()
    {
        state.player.armed_answer = Some(answer);
    }

    if player_cfg.can_fire && input.fire && now >= state.player.next_fire_ms {
        fire(state, now);
    }
}

fn fire(state: &mut GameState, now: f64) {
    let shot_cfg = state.config.projectile;
    let player = &mut state.player;
    player.next_fire_ms = now + state.config.player.fire_cooldown_ms * state.modifiers.fire_rate as f64;

    let answer = match state.config.answers {
        AnswerMode::Armed => player.armed_answer,
        _ => None,
    };
    let origin = player.pos - Vec2::new(0.0, player.half_extents.y + shot_cfg.radius);
    let shot = Entity::new(
        EntityKind::Projectile(Projectile {
            owner: Owner::Player,
            answer,
            piercing: state.modifiers.piercing,
            homing: if state.modifiers.homing {
                shot_cfg.homing_strength
            } else {
                0.0
            },
            bounces: shot_cfg.bounce_walls,
            damage: shot_cfg.damage,
            struck: Vec::new(),
        }),
        origin,
        Shape::circle(shot_cfg.radius),
    )
    .with_velocity(Vec2::new(0.0, -shot_cfg.speed))
    .with_expiry(now + shot_cfg.lifetime_ms);

    state.pool.spawn(shot, now);
    state.stats.shots_fired += 1;
}

/// Motion patterns and progress
fn integrate(state: &mut GameState, _input: &TickInput, step: &Step) {
    state.pool.update(step.dt);
    state.difficulty.advance(&state.config.difficulty, step);
}

/// Remove dead, expired and out-of-field entities; destroyed targets leave debris
fn cull(state: &mut GameState, _input: &TickInput, _step: &Step) {
    let now = state.clock.now();
    let field = state.config.playfield;
    let removed = state.pool.cull(|e| {
        !e.is_alive() || e.is_expired(now) || !field.contains(e.pos, e.shape.extents())
    });
    for entity in removed
        .iter()
        .filter(|e| e.is_target() && e.health <= 0.0)
    {
        spawn::spawn_debris(state, entity, now);
    }
}

/// Combo window, buff expiry and the countdown
fn decay(state: &mut GameState, _input: &TickInput, step: &Step) {
    let now = state.clock.now();
    if let Some(streak) = state.ledger.decay(now) {
        state.events.push(GameEvent::ComboLost { streak });
    }
    for kind in state.buffs.expire(now) {
        log::debug!("Buff {:?} expired", kind);
        state.events.push(GameEvent::BuffExpired { kind });
    }
    state.modifiers = Modifiers::from_registry(&state.buffs, now, &state.config.buffs);

    if let Some(left) = state.time_left_ms.as_mut() {
        *left = (*left - step.real_ms).max(0.0);
    }
}

/// Terminal conditions and round completion
fn evaluate(state: &mut GameState, _input: &TickInput, _step: &Step) {
    let now = state.clock.now();
    let out_of_time = state.time_left_ms.is_some_and(|t| t <= 0.0);
    if state.player.lives == 0 || out_of_time {
        let summary = state.summary();
        if state.phase.game_over() {
            log::info!(
                "Game over: score {} at level {} ({:.0}% accuracy)",
                summary.score,
                summary.level,
                summary.accuracy * 100.0
            );
            state.events.push(GameEvent::GameOver(summary));
        }
        return;
    }

    if round_complete(state) {
        let level = state.difficulty.level;
        state.events.push(GameEvent::RoundComplete { level });
        state.pool.clear_field();
        state
            .phase
            .begin_round_transition(now, state.config.round_transition_ms);
    }
}

fn round_complete(state: &GameState) -> bool {
    let scheduler = &state.scheduler;
    let level = state.difficulty.level;
    if state.pool.has_boss() || scheduler.is_warning() {
        return false;
    }
    match state.config.rounds {
        RoundRule::Cleared { .. } => {
            scheduler.quota_exhausted()
                && state.pool.hostile_count() == 0
                && !scheduler.boss_pending(&state.config, level)
        }
        RoundRule::Checkpoint { distance } => state.difficulty.checkpoints(distance) >= level,
    }
}
