//! Game phase state machine

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GamePhase {
    /// Waiting for a start intent
    #[default]
    Intro,
    Playing,
    Paused,
    /// Interstitial between rounds
    RoundTransition,
    /// Terminal until restart
    GameOver,
}

/// Phase plus the bookkeeping its transitions need.
/// Invalid transitions are no-ops returning `false`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhaseMachine {
    pub phase: GamePhase,
    /// When the current round transition started
    pub transition_started_ms: f64,
    pub transition_delay_ms: f64,
}

impl PhaseMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is(&self, phase: GamePhase) -> bool {
        self.phase == phase
    }

    pub fn start(&mut self) -> bool {
        self.transition(GamePhase::Intro, GamePhase::Playing)
    }

    /// Playing ⇄ Paused only
    pub fn toggle_pause(&mut self) -> bool {
        match self.phase {
            GamePhase::Playing => self.transition(GamePhase::Playing, GamePhase::Paused),
            GamePhase::Paused => self.transition(GamePhase::Paused, GamePhase::Playing),
            _ => false,
        }
    }

    pub fn begin_round_transition(&mut self, now_ms: f64, delay_ms: f64) -> bool {
        if !self.transition(GamePhase::Playing, GamePhase::RoundTransition) {
            return false;
        }
        self.transition_started_ms = now_ms;
        self.transition_delay_ms = delay_ms;
        true
    }

    pub fn transition_elapsed(&self, now_ms: f64) -> bool {
        self.phase == GamePhase::RoundTransition
            && now_ms - self.transition_started_ms >= self.transition_delay_ms
    }

    pub fn resume_round(&mut self) -> bool {
        self.transition(GamePhase::RoundTransition, GamePhase::Playing)
    }

    /// Reachable from any live phase
    pub fn game_over(&mut self) -> bool {
        match self.phase {
            GamePhase::Playing | GamePhase::RoundTransition | GamePhase::Paused => {
                log::info!("{:?} -> GameOver", self.phase);
                self.phase = GamePhase::GameOver;
                true
            }
            _ => false,
        }
    }

    fn transition(&mut self, from: GamePhase, to: GamePhase) -> bool {
        if self.phase != from {
            return false;
        }
        log::info!("{:?} -> {:?}", from, to);
        self.phase = to;
        true
    }
}
