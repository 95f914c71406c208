//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Clamped, injectable frame clock
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering, audio or storage dependencies

pub mod autopilot;
pub mod buffs;
pub mod clock;
pub mod collision;
pub mod content;
pub mod entity;
pub mod events;
pub mod ledger;
pub mod phase;
pub mod pool;
pub mod resolve;
pub mod spawn;
pub mod state;
pub mod tick;

pub use autopilot::Autopilot;
pub use buffs::{BuffKind, BuffRegistry, Modifiers, PowerUpKind};
pub use clock::{SimClock, Step};
pub use collision::{CollisionResult, collide, overlaps};
pub use content::{ContentError, ContentProvider, NoContent, Question, QuizItem, ShuffledDeck};
pub use entity::{AnswerTag, Entity, EntityKind, Motion, Owner, Shape};
pub use events::{GameEvent, GameSummary};
pub use ledger::{ComboLedger, ComboTier, RunStats};
pub use phase::{GamePhase, PhaseMachine};
pub use pool::EntityPool;
pub use spawn::{Difficulty, SpawnScheduler};
pub use state::{GameState, Player, Snapshot};
pub use tick::{PIPELINE, Stage, TickInput, tick};
