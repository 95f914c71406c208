//! Quiz Arcade - shared real-time core for answer-driven arcade mini-games
//!
//! Core modules:
//! - `sim`: Deterministic simulation (clock, entities, collisions, scoring, state machine)
//! - `config`: Data-driven per-game tuning and presets
//! - `highscores`: Leaderboard fed by the end-of-run summary

pub mod config;
pub mod highscores;
pub mod sim;

pub use config::{ConfigError, GameConfig, GamePreset};
pub use highscores::HighScores;

use glam::Vec2;

/// Simulation constants shared by every game
pub mod consts {
    /// Milliseconds represented by one dt unit (60 Hz frame)
    pub const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Upper bound on a single frame's dt, in frame units
    pub const MAX_DT_UNITS: f32 = 3.0;

    /// Hard cap on live particles
    pub const MAX_PARTICLES: usize = 256;
    /// Particles emitted when a hostile is destroyed
    pub const BURST_PARTICLES: usize = 12;

    /// Default playfield dimensions
    pub const FIELD_WIDTH: f32 = 480.0;
    pub const FIELD_HEIGHT: f32 = 640.0;
    /// Distance outside the playfield before an entity is culled
    pub const CULL_MARGIN: f32 = 64.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}
