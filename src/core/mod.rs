//! Core primitives.
//!
//! Geometry shared by every simulation module, the default tuning
//! constants and state hashing.

pub mod vec2;
pub mod rect;
pub mod constants;
pub mod hash;

// Re-export core types
pub use vec2::Vec2;
pub use rect::Rect;
pub use hash::{StateHash, StateHasher, compute_state_hash};
