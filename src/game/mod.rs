//! Game Logic Module
//!
//! All match simulation code. Deterministic for identical frame deltas
//! and intents.
//!
//! ## Module Structure
//!
//! - `archetype`: Character stats and special-move hooks
//! - `combatant`: Per-fighter state machine
//! - `physics`: Gravity, platforms, world bounds, separation
//! - `combo`: Timed input-sequence recognition
//! - `projectile`: Straight-flying projectiles
//! - `combat`: Melee and projectile hit resolution
//! - `input`: Player intents and intent recording
//! - `events`: Frame events for presentation and tests
//! - `round`: Round/match controller and the frame update
//! - `state`: Top-level phases and the frame driver
//! - `replay`: Match recording and replay verification

pub mod archetype;
pub mod combatant;
pub mod physics;
pub mod combo;
pub mod projectile;
pub mod combat;
pub mod input;
pub mod events;
pub mod round;
pub mod state;
pub mod replay;

// Re-export key types
pub use archetype::{Archetype, ArchetypeStats, SpecialEffect};
pub use combatant::{AnimationState, Combatant, CombatantId};
pub use physics::PhysicsWorld;
pub use combo::{ComboInput, ComboMove, ComboRecognizer};
pub use projectile::Projectile;
pub use combat::{Hit, HitSource};
pub use input::{IntentRecording, PlayerIntent};
pub use events::{GameEvent, GameEventData, RoundEndReason};
pub use round::{FrameResult, RoundController, RoundState};
pub use state::{Game, GameError, GamePhase};
pub use replay::{MatchRecording, ReplayError};
