//! Demo-mode player
//!
//! Produces a `TickInput` from the current state. Deterministic given its
//! seed, so demo runs and soak tests replay exactly.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::entity::{Entity, EntityKind};
use super::phase::GamePhase;
use super::state::{GameState, lane_center};
use super::tick::TickInput;
use crate::config::{AnswerMode, ControlScheme};

/// How far ahead (px) the runner looks for something to jump
const JUMP_LOOKAHEAD: f32 = 70.0;

#[derive(Debug, Clone)]
pub struct Autopilot {
    rng: Pcg32,
    /// Chance of picking the correct answer
    pub accuracy: f32,
    /// Answer chosen for the current question
    choice: Option<(u32, usize)>,
}

impl Autopilot {
    pub fn new(seed: u64, accuracy: f32) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            accuracy: accuracy.clamp(0.0, 1.0),
            choice: None,
        }
    }

    pub fn input(&mut self, state: &GameState) -> TickInput {
        match state.phase() {
            GamePhase::Intro => TickInput {
                start: true,
                ..Default::default()
            },
            GamePhase::Playing => self.play(state),
            _ => TickInput::default(),
        }
    }

    /// Commit to one answer per question
    fn pick_answer(&mut self, state: &GameState) -> Option<usize> {
        let question = state.question.as_ref()?;
        if let Some((id, answer)) = self.choice
            && id == question.id
        {
            return Some(answer);
        }
        let count = question.item.options.len();
        let correct = question.item.correct;
        let answer = if count < 2 || self.rng.random::<f32>() < self.accuracy {
            correct
        } else {
            (correct + self.rng.random_range(1..count)) % count
        };
        self.choice = Some((question.id, answer));
        Some(answer)
    }

    /// Targets the bot is willing to hit or touch
    fn wants(entity: &Entity, answer: Option<usize>) -> bool {
        match entity.tag() {
            Some(tag) => match (tag.option, answer) {
                (Some(option), Some(answer)) => option == answer,
                _ => true,
            },
            None => true,
        }
    }

    fn play(&mut self, state: &GameState) -> TickInput {
        let answer = self.pick_answer(state);
        let player = &state.player;
        let mut input = TickInput::default();
        if state.config.answers == AnswerMode::Armed {
            input.answer = answer;
        }

        if let ControlScheme::Runner { .. } = state.config.player.control {
            let front = player.pos.x + player.half_extents.x;
            input.jump = state.pool.hostiles().any(|e| {
                let gap = e.pos.x - e.shape.extents().x - front;
                let blocking = match &e.kind {
                    EntityKind::Hostile(h) => h.solid || h.contact_damage || !Self::wants(e, answer),
                    _ => false,
                };
                e.is_alive() && blocking && (0.0..JUMP_LOOKAHEAD).contains(&gap)
            });
            return input;
        }

        // Lowest wanted target above the player (closest to reaching it)
        let target = state
            .pool
            .targets()
            .filter(|e| e.pos.y < player.pos.y && Self::wants(e, answer))
            .max_by(|a, b| {
                a.pos
                    .y
                    .partial_cmp(&b.pos.y)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        let pickup = state.pool.pickups().min_by(|a, b| {
            a.pos
                .distance_squared(player.pos)
                .partial_cmp(&b.pos.distance_squared(player.pos))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let aim_x = match (target, pickup) {
            (Some(t), _) => t.pos.x,
            (None, Some(p)) => p.pos.x,
            (None, None) => state.config.playfield.width / 2.0,
        };
        let dx = aim_x - player.pos.x;

        match state.config.player.control {
            ControlScheme::Lanes { count } => {
                let here = lane_center(player.lane, count, state.config.playfield.width);
                let half_lane = state.config.playfield.width / count.max(1) as f32 / 2.0;
                if (aim_x - here).abs() > half_lane {
                    input.lane_delta = if aim_x > here { 1 } else { -1 };
                }
            }
            _ => input.move_x = (dx / 20.0).clamp(-1.0, 1.0),
        }

        if let Some(t) = target {
            input.fire = dx.abs() < t.shape.extents().x + 6.0;
        }
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::sim::tick::tick;
    use crate::consts::FRAME_MS;

    #[test]
    fn test_starts_the_game() {
        let state = GameState::new(GameConfig::shooter(), 1).unwrap();
        let mut bot = Autopilot::new(1, 1.0);
        assert!(bot.input(&state).start);
    }

    #[test]
    fn test_perfect_bot_arms_correct_answer() {
        let mut state = GameState::new(GameConfig::shooter(), 1).unwrap();
        state.start_game();
        let mut bot = Autopilot::new(1, 1.0);
        let input = bot.input(&state);
        assert_eq!(
            input.answer,
            Some(state.question.as_ref().unwrap().item.correct)
        );
    }

    #[test]
    fn test_answer_is_stable_per_question() {
        let mut state = GameState::new(GameConfig::shooter(), 1).unwrap();
        state.start_game();
        let mut bot = Autopilot::new(5, 0.5);
        let first = bot.input(&state).answer;
        for _ in 0..20 {
            assert_eq!(bot.input(&state).answer, first);
        }
    }

    #[test]
    fn test_runner_bot_makes_progress() {
        let mut state = GameState::new(GameConfig::runner(), 21).unwrap();
        let mut bot = Autopilot::new(21, 1.0);
        for frame in 0..600 {
            let input = bot.input(&state);
            tick(&mut state, &input, frame as f64 * FRAME_MS);
        }
        assert_ne!(state.phase(), GamePhase::Intro);
        assert!(state.difficulty.progress > 0.0);
    }
}
