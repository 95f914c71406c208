//! Entity types owned by the pool
//!
//! Every simulated object is an `Entity` with a common physical body
//! (position, velocity, shape, motion) and a variant payload.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::buffs::PowerUpKind;
use crate::{normalize_angle, polar_to_cartesian};

/// Collision shape, centred on the entity position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    /// Axis-aligned box with half extents
    Rect { half: Vec2 },
    Circle { radius: f32 },
}

impl Shape {
    pub fn rect(half_w: f32, half_h: f32) -> Self {
        Shape::Rect {
            half: Vec2::new(half_w, half_h),
        }
    }

    pub fn circle(radius: f32) -> Self {
        Shape::Circle { radius }
    }

    /// Half extents of the bounding box
    pub fn extents(&self) -> Vec2 {
        match *self {
            Shape::Rect { half } => half,
            Shape::Circle { radius } => Vec2::splat(radius),
        }
    }
}

/// Per-entity movement pattern applied on top of plain integration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Motion {
    Linear,
    /// Sinusoidal offset perpendicular to travel around a drifting anchor
    Weave {
        anchor: Vec2,
        amplitude: f32,
        frequency: f32,
        phase: f32,
    },
    /// Circle around a pivot that itself drifts with the velocity
    Orbit {
        pivot: Vec2,
        radius: f32,
        angular_speed: f32,
        angle: f32,
    },
    /// Descend to a hover line, then sweep horizontally between two edges
    Patrol { min_x: f32, max_x: f32, hover_y: f32 },
    /// Constant downward acceleration
    Falling { gravity: f32 },
}

impl Motion {
    /// Advance position (and velocity where the pattern owns it) by `dt` frame units
    pub fn advance(&mut self, pos: &mut Vec2, vel: &mut Vec2, dt: f32) {
        match self {
            Motion::Linear => {
                *pos += *vel * dt;
            }
            Motion::Weave {
                anchor,
                amplitude,
                frequency,
                phase,
            } => {
                *anchor += *vel * dt;
                *phase = normalize_angle(*phase + *frequency * dt);
                let dir = vel.normalize_or_zero();
                let perp = Vec2::new(-dir.y, dir.x);
                *pos = *anchor + perp * (*amplitude * phase.sin());
            }
            Motion::Orbit {
                pivot,
                radius,
                angular_speed,
                angle,
            } => {
                *pivot += *vel * dt;
                *angle = normalize_angle(*angle + *angular_speed * dt);
                *pos = *pivot + polar_to_cartesian(*radius, *angle);
            }
            Motion::Patrol {
                min_x,
                max_x,
                hover_y,
            } => {
                if pos.y < *hover_y {
                    let descent = vel.y.abs().max(1.0) * dt;
                    pos.y = (pos.y + descent).min(*hover_y);
                } else {
                    pos.x += vel.x * dt;
                    if pos.x < *min_x {
                        pos.x = *min_x;
                        vel.x = vel.x.abs();
                    } else if pos.x > *max_x {
                        pos.x = *max_x;
                        vel.x = -vel.x.abs();
                    }
                }
            }
            Motion::Falling { gravity } => {
                vel.y += *gravity * dt;
                *pos += *vel * dt;
            }
        }
    }
}

/// Who fired a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    Player,
    Hostile,
}

/// Multiple-choice answer attached to a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerTag {
    /// Question this tag belongs to
    pub question: u32,
    /// Option the target displays (`None` when the player arms the answer)
    pub option: Option<usize>,
    /// Index of the correct option
    pub correct: usize,
}

impl AnswerTag {
    /// Judge a hit carrying `carried` (the player's armed answer, if any)
    pub fn judge(&self, carried: Option<usize>) -> bool {
        match (carried, self.option) {
            (Some(answer), _) => answer == self.correct,
            (None, Some(option)) => option == self.correct,
            (None, None) => false,
        }
    }

    /// True if letting this target through counts as a miss
    pub fn must_answer(&self) -> bool {
        self.option.is_none_or(|o| o == self.correct)
    }
}

/// Judge a hit against an optional tag; untagged targets are always correct
pub fn judge(carried: Option<usize>, tag: Option<&AnswerTag>) -> bool {
    tag.is_none_or(|t| t.judge(carried))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub owner: Owner,
    /// Answer armed when fired
    pub answer: Option<usize>,
    pub piercing: bool,
    /// Fraction of velocity steered toward the nearest target per tick (0 = none)
    pub homing: f32,
    /// Reflect off the side and top walls
    pub bounces: bool,
    pub damage: f32,
    /// Targets already struck (piercing projectiles hit each target once)
    #[serde(default)]
    pub struck: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hostile {
    /// Spawn table entry this hostile came from
    pub name: String,
    pub tag: Option<AnswerTag>,
    pub points: u32,
    /// Blocks the player physically (runner obstacles)
    pub solid: bool,
    /// Touching it damages the player
    pub contact_damage: bool,
    pub elite: bool,
}

/// Visual feedback only; never read by game logic
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub color: u32,
    pub size: f32,
    /// 0-1, decreases over time
    pub life: f32,
    /// Life lost per frame unit
    pub decay: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boss {
    pub name: String,
    pub tag: Option<AnswerTag>,
    pub points: u32,
    pub max_health: f32,
    pub next_fire_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum EntityKind {
    Projectile(Projectile),
    Hostile(Hostile),
    Pickup { kind: PowerUpKind },
    Particle(Particle),
    Boss(Boss),
}

/// A simulated object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Assigned by the pool on spawn
    pub id: u32,
    pub kind: EntityKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub shape: Shape,
    pub motion: Motion,
    pub health: f32,
    pub expires_at_ms: Option<f64>,
    pub created_ms: f64,
    /// Marked by collision resolution; removed by the next cull
    pub consumed: bool,
}

impl Entity {
    pub fn new(kind: EntityKind, pos: Vec2, shape: Shape) -> Self {
        Self {
            id: 0,
            kind,
            pos,
            vel: Vec2::ZERO,
            shape,
            motion: Motion::Linear,
            health: 1.0,
            expires_at_ms: None,
            created_ms: 0.0,
            consumed: false,
        }
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }

    pub fn with_motion(mut self, motion: Motion) -> Self {
        self.motion = motion;
        self
    }

    pub fn with_health(mut self, health: f32) -> Self {
        self.health = health;
        self
    }

    pub fn with_expiry(mut self, expires_at_ms: f64) -> Self {
        self.expires_at_ms = Some(expires_at_ms);
        self
    }

    /// Not consumed and not destroyed
    pub fn is_alive(&self) -> bool {
        !self.consumed && self.health > 0.0
    }

    /// Hostiles and bosses can be shot
    pub fn is_target(&self) -> bool {
        matches!(self.kind, EntityKind::Hostile(_) | EntityKind::Boss(_))
    }

    pub fn is_boss(&self) -> bool {
        matches!(self.kind, EntityKind::Boss(_))
    }

    pub fn is_particle(&self) -> bool {
        matches!(self.kind, EntityKind::Particle(_))
    }

    pub fn tag(&self) -> Option<&AnswerTag> {
        match &self.kind {
            EntityKind::Hostile(h) => h.tag.as_ref(),
            EntityKind::Boss(b) => b.tag.as_ref(),
            _ => None,
        }
    }

    pub fn tag_mut(&mut self) -> Option<&mut AnswerTag> {
        match &mut self.kind {
            EntityKind::Hostile(h) => h.tag.as_mut(),
            EntityKind::Boss(b) => b.tag.as_mut(),
            _ => None,
        }
    }

    /// Base score for destroying this entity
    pub fn points(&self) -> u32 {
        match &self.kind {
            EntityKind::Hostile(h) => h.points,
            EntityKind::Boss(b) => b.points,
            _ => 0,
        }
    }

    /// Lifetime over at `now`
    pub fn is_expired(&self, now_ms: f64) -> bool {
        self.expires_at_ms.is_some_and(|t| now_ms >= t)
    }

    pub fn variant_name(&self) -> &'static str {
        match self.kind {
            EntityKind::Projectile(_) => "projectile",
            EntityKind::Hostile(_) => "hostile",
            EntityKind::Pickup { .. } => "pickup",
            EntityKind::Particle(_) => "particle",
            EntityKind::Boss(_) => "boss",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_judgement() {
        let armed = AnswerTag {
            question: 1,
            option: None,
            correct: 2,
        };
        assert!(armed.judge(Some(2)));
        assert!(!armed.judge(Some(0)));
        assert!(!armed.judge(None));

        let shown = AnswerTag {
            question: 1,
            option: Some(2),
            correct: 2,
        };
        assert!(shown.judge(None));
        let wrong = AnswerTag {
            option: Some(1),
            ..shown
        };
        assert!(!wrong.judge(None));
        assert!(!wrong.must_answer());

        // Untagged targets are always fair game
        assert!(judge(Some(3), None));
    }

    #[test]
    fn test_patrol_reverses_at_edges() {
        let mut motion = Motion::Patrol {
            min_x: 50.0,
            max_x: 150.0,
            hover_y: 100.0,
        };
        let mut pos = Vec2::new(140.0, 100.0);
        let mut vel = Vec2::new(20.0, 1.0);
        motion.advance(&mut pos, &mut vel, 1.0);
        assert_eq!(pos.x, 150.0);
        assert!(vel.x < 0.0);

        motion.advance(&mut pos, &mut vel, 1.0);
        assert_eq!(pos.x, 130.0);
    }

    #[test]
    fn test_patrol_descends_before_sweeping() {
        let mut motion = Motion::Patrol {
            min_x: 0.0,
            max_x: 400.0,
            hover_y: 100.0,
        };
        let mut pos = Vec2::new(200.0, 95.0);
        let mut vel = Vec2::new(10.0, 2.0);
        motion.advance(&mut pos, &mut vel, 5.0);
        assert_eq!(pos, Vec2::new(200.0, 100.0));
    }

    #[test]
    fn test_weave_with_zero_velocity_stays_put() {
        let mut motion = Motion::Weave {
            anchor: Vec2::new(10.0, 10.0),
            amplitude: 30.0,
            frequency: 0.1,
            phase: 0.5,
        };
        let mut pos = Vec2::new(10.0, 10.0);
        let mut vel = Vec2::ZERO;
        motion.advance(&mut pos, &mut vel, 1.0);
        assert!(pos.is_finite());
        assert_eq!(pos, Vec2::new(10.0, 10.0));
    }

    #[test]
    fn test_orbit_keeps_radius() {
        let mut motion = Motion::Orbit {
            pivot: Vec2::new(100.0, 100.0),
            radius: 25.0,
            angular_speed: 0.3,
            angle: 0.0,
        };
        let mut pos = Vec2::ZERO;
        let mut vel = Vec2::new(0.0, 2.0);
        for _ in 0..10 {
            motion.advance(&mut pos, &mut vel, 1.0);
        }
        let Motion::Orbit { pivot, .. } = motion else {
            unreachable!()
        };
        assert!(((pos - pivot).length() - 25.0).abs() < 0.01);
        assert_eq!(pivot, Vec2::new(100.0, 120.0));
    }
}
