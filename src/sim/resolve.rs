//! Collision resolution: what overlaps mean for score, health and buffs

use glam::Vec2;

use super::buffs::{BuffKind, Modifiers, PowerUpKind};
use super::clock::Step;
use super::collision::{
    Axis, collide, least_penetration, overlaps, steer_toward, wall_bounce,
};
use super::entity::{self, EntityKind, Owner};
use super::events::GameEvent;
use super::state::GameState;
use super::tick::TickInput;
use crate::config::WrongAnswerPolicy;

/// Collide stage of the tick pipeline
pub fn run(state: &mut GameState, _input: &TickInput, _step: &Step) {
    let now = state.clock.now();
    steer_homing(state);
    bounce_projectiles(state);
    resolve_player_shots(state, now);
    resolve_hostile_shots(state, now);
    resolve_player_contacts(state, now);
    collect_pickups(state, now);
    resolve_escapes(state, now);
}

fn steer_homing(state: &mut GameState) {
    let steering: Vec<(u32, Vec2, f32)> = state
        .pool
        .projectiles()
        .filter(|e| e.is_alive())
        .filter_map(|e| match &e.kind {
            EntityKind::Projectile(p) if p.owner == Owner::Player && p.homing > 0.0 => state
                .pool
                .nearest_target(e.pos)
                .map(|target| (e.id, target.pos, p.homing)),
            _ => None,
        })
        .collect();

    for (id, target, strength) in steering {
        if let Some(shot) = state.pool.get_mut(id) {
            shot.vel = steer_toward(shot.vel, shot.pos, target, strength);
        }
    }
}

fn bounce_projectiles(state: &mut GameState) {
    let width = state.config.playfield.width;
    for shot in state.pool.iter_mut() {
        if let EntityKind::Projectile(p) = &shot.kind
            && p.bounces
        {
            let extents = shot.shape.extents();
            wall_bounce(&mut shot.pos, &mut shot.vel, extents, width);
        }
    }
}

/// Player shots vs hostiles and bosses, in id order
fn resolve_player_shots(state: &mut GameState, now: f64) {
    let shots: Vec<u32> = state
        .pool
        .projectiles()
        .filter(|e| {
            e.is_alive() && matches!(&e.kind, EntityKind::Projectile(p) if p.owner == Owner::Player)
        })
        .map(|e| e.id)
        .collect();

    for shot_id in shots {
        loop {
            let Some(shot) = state.pool.get(shot_id) else {
                break;
            };
            let EntityKind::Projectile(proj) = &shot.kind else {
                break;
            };
            if !shot.is_alive() {
                break;
            }

            // Nearest overlapping target first; ties go to the lower id
            let hit = state
                .pool
                .targets()
                .filter(|t| !proj.struck.contains(&t.id))
                .filter(|t| overlaps(shot.pos, &shot.shape, t.pos, &t.shape))
                .fold(None, |best: Option<(u32, f32)>, t| {
                    let dist = t.pos.distance_squared(shot.pos);
                    match best {
                        Some((_, d)) if d <= dist => best,
                        _ => Some((t.id, dist)),
                    }
                });
            let Some((target_id, _)) = hit else {
                break;
            };
            let (answer, damage, piercing) = (proj.answer, proj.damage, proj.piercing);

            if let Some(shot) = state.pool.get_mut(shot_id) {
                if let EntityKind::Projectile(p) = &mut shot.kind {
                    p.struck.push(target_id);
                }
                if !piercing {
                    shot.consumed = true;
                }
            }
            apply_hit(state, target_id, answer, damage, now);

            if !piercing {
                break;
            }
        }
    }
}

/// Judge a hit on a target and apply its outcome. Returns true if correct.
pub fn apply_hit(
    state: &mut GameState,
    target_id: u32,
    carried: Option<usize>,
    damage: f32,
    now: f64,
) -> bool {
    let Some(target) = state.pool.get(target_id) else {
        return false;
    };
    let pos = target.pos;
    if !entity::judge(carried, target.tag()) {
        state.stats.wrong += 1;
        state.events.push(GameEvent::HitWrong { id: target_id, pos });
        if state.config.wrong_answer == WrongAnswerPolicy::DamagePlayer {
            damage_player(state, now);
        }
        return false;
    }

    state.stats.correct += 1;
    state.events.push(GameEvent::HitCorrect { id: target_id, pos });

    let Some(target) = state.pool.get_mut(target_id) else {
        return true;
    };
    target.health -= damage;
    if target.health > 0.0 {
        return true;
    }

    let base = target.points();
    let tagged = target.tag().is_some();
    let is_boss = target.is_boss();
    let awarded = state.ledger.score_hit(now, base, state.modifiers.score);
    state.stats.kills += 1;
    state.difficulty.record_kill(&state.config.difficulty);

    if is_boss {
        state.stats.bosses_defeated += 1;
        state.events.push(GameEvent::BossDefeated {
            id: target_id,
            points: awarded,
        });
        log::info!("Boss #{} defeated for {} points", target_id, awarded);
    } else {
        state.events.push(GameEvent::HostileDestroyed {
            id: target_id,
            pos,
            points: awarded,
        });
    }

    if tagged {
        state.next_question();
    }
    true
}

fn resolve_hostile_shots(state: &mut GameState, now: f64) {
    let (body_pos, body) = state.player.body(now);
    let hits: Vec<u32> = state
        .pool
        .projectiles()
        .filter(|e| {
            e.is_alive() && matches!(&e.kind, EntityKind::Projectile(p) if p.owner == Owner::Hostile)
        })
        .filter(|e| overlaps(e.pos, &e.shape, body_pos, &body))
        .map(|e| e.id)
        .collect();

    for id in hits {
        if let Some(shot) = state.pool.get_mut(id) {
            shot.consumed = true;
        }
        damage_player(state, now);
    }
}

/// Player body vs hostiles and bosses
fn resolve_player_contacts(state: &mut GameState, now: f64) {
    let ids: Vec<u32> = state.pool.targets().map(|e| e.id).collect();

    for id in ids {
        let (body_pos, body) = state.player.body(now);
        let Some(target) = state.pool.get(id) else {
            continue;
        };
        if !target.is_alive() || !collide(body_pos, &body, target.pos, &target.shape).hit {
            continue;
        }

        match &target.kind {
            EntityKind::Hostile(h) if h.solid => {
                let damaging = h.contact_damage;
                separate_from_solid(state, id, body_pos, body.extents(), damaging, now);
            }
            EntityKind::Hostile(h) if h.tag.is_some() && !h.contact_damage => {
                // Answer gates are judged on contact, then spent
                let health = target.health;
                let armed = state.player.armed_answer;
                apply_hit(state, id, armed, health, now);
                if let Some(gate) = state.pool.get_mut(id)
                    && gate.is_alive()
                {
                    gate.consumed = true;
                }
            }
            EntityKind::Hostile(h) if h.contact_damage => {
                if let Some(hostile) = state.pool.get_mut(id) {
                    hostile.consumed = true;
                }
                damage_player(state, now);
            }
            EntityKind::Boss(_) => {
                damage_player(state, now);
            }
            _ => {}
        }
    }
}

/// Push the player out of a solid obstacle along the axis of least penetration
fn separate_from_solid(
    state: &mut GameState,
    obstacle_id: u32,
    body_pos: Vec2,
    body_half: Vec2,
    damaging: bool,
    now: f64,
) {
    let Some(obstacle) = state.pool.get(obstacle_id) else {
        return;
    };
    let delta = body_pos - obstacle.pos;
    let overlap = body_half + obstacle.shape.extents() - delta.abs();
    if overlap.x <= 0.0 || overlap.y <= 0.0 {
        return;
    }
    let sep = least_penetration(delta, overlap);
    let restitution = state.config.player.restitution;
    let player = &mut state.player;
    player.pos += sep.push();

    match sep.axis {
        // Landing on top: grounded, no damage
        Axis::Vertical if sep.sign < 0.0 => {
            player.vel.y = player.vel.y.min(0.0);
            player.grounded = true;
        }
        Axis::Vertical => {
            player.vel.y = -player.vel.y * restitution;
        }
        Axis::Horizontal => {
            player.vel.x = -player.vel.x * restitution;
            if damaging {
                if let Some(obstacle) = state.pool.get_mut(obstacle_id) {
                    obstacle.consumed = true;
                }
                damage_player(state, now);
            }
        }
    }
}

fn collect_pickups(state: &mut GameState, now: f64) {
    let (body_pos, body) = state.player.body(now);
    let collected: Vec<(u32, PowerUpKind)> = state
        .pool
        .pickups()
        .filter(|e| e.is_alive() && overlaps(e.pos, &e.shape, body_pos, &body))
        .filter_map(|e| match e.kind {
            EntityKind::Pickup { kind } => Some((e.id, kind)),
            _ => None,
        })
        .collect();

    for (id, kind) in collected {
        if let Some(pickup) = state.pool.get_mut(id) {
            pickup.consumed = true;
        }
        apply_power_up(state, kind, now);
    }
}

/// Timed kinds refresh their buff; ExtraLife and Bomb act instantly
pub fn apply_power_up(state: &mut GameState, kind: PowerUpKind, now: f64) {
    state.stats.powerups += 1;
    state.events.push(GameEvent::PowerUpCollected { kind });

    if let Some(buff) = kind.as_buff() {
        let duration = state.config.buffs.duration(buff);
        state.buffs.apply(buff, now, duration);
        state.modifiers = Modifiers::from_registry(&state.buffs, now, &state.config.buffs);
        return;
    }

    match kind {
        PowerUpKind::ExtraLife => {
            let player = &mut state.player;
            player.lives = (player.lives + 1).min(state.config.player.max_lives);
            state.events.push(GameEvent::ExtraLife {
                lives: player.lives,
            });
        }
        PowerUpKind::Bomb => detonate_bomb(state),
        _ => {}
    }
}

/// Destroy every non-boss hostile; bosses lose health but survive
fn detonate_bomb(state: &mut GameState) {
    let boss_damage = state.config.buffs.bomb_boss_damage;
    let mut destroyed = 0;
    for target in state.pool.iter_mut() {
        if !target.is_alive() {
            continue;
        }
        match target.kind {
            EntityKind::Hostile(_) => {
                target.health = 0.0;
                destroyed += 1;
            }
            EntityKind::Boss(_) => {
                // Never lethal, never a heal
                target.health = (target.health - boss_damage).max(target.health.min(1.0));
            }
            _ => {}
        }
    }
    state.events.push(GameEvent::BombDetonated { destroyed });
    log::debug!("Bomb destroyed {} hostiles", destroyed);
}

/// Hostiles fully past the bottom edge escape
fn resolve_escapes(state: &mut GameState, now: f64) {
    let height = state.config.playfield.height;
    let escaped: Vec<(u32, bool)> = state
        .pool
        .hostiles()
        .filter(|e| e.is_alive() && e.pos.y - e.shape.extents().y > height)
        .map(|e| (e.id, e.tag().is_none_or(|t| t.must_answer())))
        .collect();

    for (id, counts) in escaped {
        if let Some(hostile) = state.pool.get_mut(id) {
            hostile.consumed = true;
        }
        state.events.push(GameEvent::HostileEscaped { id });
        if counts && state.config.escape_damages {
            damage_player(state, now);
        }
    }
}

/// Apply one damage event to the player. Returns false while invulnerable.
pub fn damage_player(state: &mut GameState, now: f64) -> bool {
    if state.player.is_invulnerable(now) {
        return false;
    }
    if let Some(streak) = state.ledger.break_streak() {
        state.events.push(GameEvent::ComboLost { streak });
    }
    state.player.invulnerable_until_ms = now + state.config.player.invulnerable_ms;
    state.stats.damage_taken += 1;

    if state.buffs.consume(BuffKind::Shield, now) {
        state.modifiers = Modifiers::from_registry(&state.buffs, now, &state.config.buffs);
        state.events.push(GameEvent::ShieldBroken);
        log::debug!("Shield absorbed a hit");
        return true;
    }

    state.player.lives = state.player.lives.saturating_sub(1);
    state.events.push(GameEvent::PlayerHit {
        lives_left: state.player.lives,
    });
    log::debug!("Player hit, {} lives left", state.player.lives);
    true
}
