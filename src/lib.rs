//! # Jump Stars
//!
//! Simulation core for a two-player local platform fighter.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        JUMP STARS                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Primitives                                │
//! │  ├── vec2.rs     - 2D vector                                 │
//! │  ├── rect.rs     - Axis-aligned rectangle                    │
//! │  ├── constants.rs- Default tuning values                     │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  config/         - Tuning and persisted settings             │
//! │  ├── mod.rs      - GameConfig (JSON, env override)           │
//! │  └── settings.rs - Selected archetypes, sound toggle         │
//! │                                                              │
//! │  game/           - Match simulation                          │
//! │  ├── archetype.rs- Character stats and specials              │
//! │  ├── combatant.rs- Fighter state machine                     │
//! │  ├── physics.rs  - Gravity, platforms, bounds                │
//! │  ├── combo.rs    - Input-sequence recognizer                 │
//! │  ├── combat.rs   - Hit resolution                            │
//! │  ├── round.rs    - Round controller, frame update            │
//! │  ├── state.rs    - Game phases                               │
//! │  └── replay.rs   - Recording and replay verification         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! The simulation is single-threaded and frame-driven:
//! - All timers are countdowns advanced by the frame delta
//! - Combos use a clock accumulated from frame deltas, not wall time
//! - No randomness
//!
//! Given identical frame deltas and intents, a match produces an
//! identical state hash, which is what replay verification relies on.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod config;
pub mod game;

// Re-export commonly used types
pub use core::vec2::Vec2;
pub use core::rect::Rect;
pub use config::{GameConfig, Settings};
pub use game::input::PlayerIntent;
pub use game::state::{Game, GamePhase};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
