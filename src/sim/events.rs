//! Events emitted during a tick, consumed by audio/haptics/UI adapters

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::buffs::{BuffKind, PowerUpKind};

/// Final numbers of a run, attached to `GameEvent::GameOver`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GameSummary {
    pub score: u64,
    pub level: u32,
    pub accuracy: f32,
    pub best_combo: u32,
    pub kills: u32,
    pub correct: u32,
    pub wrong: u32,
    pub bosses_defeated: u32,
    pub duration_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    GameStarted,
    HitCorrect { id: u32, pos: Vec2 },
    HitWrong { id: u32, pos: Vec2 },
    HostileDestroyed { id: u32, pos: Vec2, points: u64 },
    HostileEscaped { id: u32 },
    BossWarning { level: u32 },
    BossSpawned { id: u32 },
    BossDefeated { id: u32, points: u64 },
    PowerUpCollected { kind: PowerUpKind },
    BuffExpired { kind: BuffKind },
    ShieldBroken,
    PlayerHit { lives_left: u32 },
    ExtraLife { lives: u32 },
    BombDetonated { destroyed: u32 },
    ComboLost { streak: u32 },
    QuestionChanged { id: u32 },
    RoundComplete { level: u32 },
    RoundStarted { level: u32 },
    Paused,
    Resumed,
    GameOver(GameSummary),
}
