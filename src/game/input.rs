//! Player Intents
//!
//! Per-frame, per-player input as packed flag bits. Jump, attack and
//! special are "just pressed this frame"; directions and defend are held
//! levels. Also derives combo symbols from intents and records them with
//! delta compression for replays.

use serde::{Serialize, Deserialize};

use crate::core::hash::StateHasher;
use crate::game::combo::ComboInput;

// =============================================================================
// INTENT
// =============================================================================

/// Input for one player for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerIntent {
    /// Action flags (packed bits):
    /// - Bit 0: Move left held
    /// - Bit 1: Move right held
    /// - Bit 2: Down held
    /// - Bit 3: Jump pressed this frame
    /// - Bit 4: Attack pressed this frame
    /// - Bit 5: Defend held
    /// - Bit 6: Special pressed this frame
    pub flags: u8,
}

impl PlayerIntent {
    /// No input
    pub const NONE: PlayerIntent = PlayerIntent { flags: 0 };

    /// Move left flag bit
    pub const FLAG_MOVE_LEFT: u8 = 0x01;
    /// Move right flag bit
    pub const FLAG_MOVE_RIGHT: u8 = 0x02;
    /// Down flag bit
    pub const FLAG_DOWN: u8 = 0x04;
    /// Jump flag bit
    pub const FLAG_JUMP: u8 = 0x08;
    /// Attack flag bit
    pub const FLAG_ATTACK: u8 = 0x10;
    /// Defend flag bit
    pub const FLAG_DEFEND: u8 = 0x20;
    /// Special flag bit
    pub const FLAG_SPECIAL: u8 = 0x40;

    /// Copy with an extra flag set.
    pub const fn with(self, flag: u8) -> Self {
        Self { flags: self.flags | flag }
    }

    #[inline]
    fn has(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }

    #[inline]
    fn set(&mut self, flag: u8, on: bool) {
        if on {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }

    /// Move left held.
    #[inline]
    pub fn move_left(&self) -> bool {
        self.has(Self::FLAG_MOVE_LEFT)
    }

    /// Move right held.
    #[inline]
    pub fn move_right(&self) -> bool {
        self.has(Self::FLAG_MOVE_RIGHT)
    }

    /// Down held.
    #[inline]
    pub fn down(&self) -> bool {
        self.has(Self::FLAG_DOWN)
    }

    /// Jump pressed this frame.
    #[inline]
    pub fn jump(&self) -> bool {
        self.has(Self::FLAG_JUMP)
    }

    /// Attack pressed this frame.
    #[inline]
    pub fn attack(&self) -> bool {
        self.has(Self::FLAG_ATTACK)
    }

    /// Defend held.
    #[inline]
    pub fn defend(&self) -> bool {
        self.has(Self::FLAG_DEFEND)
    }

    /// Special pressed this frame.
    #[inline]
    pub fn special(&self) -> bool {
        self.has(Self::FLAG_SPECIAL)
    }

    /// Set move left.
    pub fn set_move_left(&mut self, on: bool) {
        self.set(Self::FLAG_MOVE_LEFT, on);
    }

    /// Set move right.
    pub fn set_move_right(&mut self, on: bool) {
        self.set(Self::FLAG_MOVE_RIGHT, on);
    }

    /// Set down.
    pub fn set_down(&mut self, on: bool) {
        self.set(Self::FLAG_DOWN, on);
    }

    /// Set jump.
    pub fn set_jump(&mut self, on: bool) {
        self.set(Self::FLAG_JUMP, on);
    }

    /// Set attack.
    pub fn set_attack(&mut self, on: bool) {
        self.set(Self::FLAG_ATTACK, on);
    }

    /// Set defend.
    pub fn set_defend(&mut self, on: bool) {
        self.set(Self::FLAG_DEFEND, on);
    }

    /// Set special.
    pub fn set_special(&mut self, on: bool) {
        self.set(Self::FLAG_SPECIAL, on);
    }

    /// Horizontal direction: -1, 0 or +1. Opposite directions cancel.
    pub fn move_direction(&self) -> f64 {
        let mut dir = 0.0;
        if self.move_left() {
            dir -= 1.0;
        }
        if self.move_right() {
            dir += 1.0;
        }
        dir
    }

    /// Held direction as a combo symbol, relative to the opponent.
    ///
    /// `opponent_on_right` decides which horizontal direction is forward.
    pub fn direction_symbol(&self, opponent_on_right: bool) -> Option<ComboInput> {
        let dir = self.move_direction();
        let forward = if opponent_on_right { dir > 0.0 } else { dir < 0.0 };
        let back = dir != 0.0 && !forward;

        match (self.down(), forward, back) {
            (true, true, _) => Some(ComboInput::DownForward),
            (true, _, true) => Some(ComboInput::DownBack),
            (true, false, false) => Some(ComboInput::Down),
            (false, true, _) => Some(ComboInput::Forward),
            (false, _, true) => Some(ComboInput::Back),
            (false, false, false) => None,
        }
    }
}

// =============================================================================
// COMBO SYMBOL TRACKING
// =============================================================================

/// Turns a stream of intents into discrete combo symbols.
///
/// A direction is emitted when the held direction changes to a
/// non-neutral one, attack on every press, defend on the press edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboInputTracker {
    last_direction: Option<ComboInput>,
    was_defending: bool,
}

impl ComboInputTracker {
    /// Symbols produced by this frame's intent, in order.
    pub fn symbols(
        &mut self,
        intent: &PlayerIntent,
        opponent_on_right: bool,
    ) -> impl Iterator<Item = ComboInput> {
        let direction = intent.direction_symbol(opponent_on_right);
        let new_direction = direction.filter(|_| direction != self.last_direction);
        self.last_direction = direction;

        let defend_edge = intent.defend() && !self.was_defending;
        self.was_defending = intent.defend();

        [
            new_direction,
            intent.attack().then_some(ComboInput::Attack),
            defend_edge.then_some(ComboInput::Defend),
        ]
        .into_iter()
        .flatten()
    }

    /// Forget held state, e.g. between rounds.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// =============================================================================
// RECORDING
// =============================================================================

/// Intent that took effect at a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentDelta {
    /// Frame when this intent began
    pub frame: u32,
    /// The new intent
    pub intent: PlayerIntent,
}

/// Delta-compressed intents of one player for one match.
///
/// Only frames where the intent changed are stored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentRecording {
    /// Last recorded frame
    pub end_frame: u32,

    deltas: Vec<IntentDelta>,

    #[serde(skip)]
    last_intent: PlayerIntent,
}

impl IntentRecording {
    /// Create an empty recording.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the intent for a frame; stored only if it changed.
    pub fn record(&mut self, frame: u32, intent: PlayerIntent) {
        self.end_frame = frame;
        if intent != self.last_intent {
            self.deltas.push(IntentDelta { frame, intent });
            self.last_intent = intent;
        }
    }

    /// Intent in effect at `frame`.
    pub fn intent_at(&self, frame: u32) -> PlayerIntent {
        let idx = self.deltas.partition_point(|d| d.frame <= frame);
        if idx == 0 {
            PlayerIntent::NONE
        } else {
            self.deltas[idx - 1].intent
        }
    }

    /// Stored changes.
    pub fn deltas(&self) -> &[IntentDelta] {
        &self.deltas
    }

    /// Add the recorded deltas to a hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.end_frame);
        hasher.update_u32(self.deltas.len() as u32);
        for delta in &self.deltas {
            hasher.update_u32(delta.frame);
            hasher.update_u8(delta.intent.flags);
        }
    }

    /// Iterate every frame from 0 through `end_frame`.
    pub fn replay_iter(&self) -> IntentReplay<'_> {
        IntentReplay {
            recording: self,
            frame: 0,
            delta_idx: 0,
            current: PlayerIntent::NONE,
        }
    }
}

/// Frame-by-frame playback of an [`IntentRecording`].
pub struct IntentReplay<'a> {
    recording: &'a IntentRecording,
    frame: u32,
    delta_idx: usize,
    current: PlayerIntent,
}

impl Iterator for IntentReplay<'_> {
    type Item = (u32, PlayerIntent);

    fn next(&mut self) -> Option<Self::Item> {
        if self.frame > self.recording.end_frame {
            return None;
        }

        while let Some(delta) = self.recording.deltas.get(self.delta_idx) {
            if delta.frame > self.frame {
                break;
            }
            self.current = delta.intent;
            self.delta_idx += 1;
        }

        let item = (self.frame, self.current);
        self.frame += 1;
        Some(item)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const RIGHT: PlayerIntent = PlayerIntent::NONE.with(PlayerIntent::FLAG_MOVE_RIGHT);
    const LEFT: PlayerIntent = PlayerIntent::NONE.with(PlayerIntent::FLAG_MOVE_LEFT);
    const DOWN: PlayerIntent = PlayerIntent::NONE.with(PlayerIntent::FLAG_DOWN);

    #[test]
    fn test_flags() {
        let mut intent = PlayerIntent::NONE;
        assert!(!intent.jump());

        intent.set_jump(true);
        intent.set_defend(true);
        assert!(intent.jump());
        assert!(intent.defend());
        assert!(!intent.attack());

        intent.set_jump(false);
        assert!(!intent.jump());
        assert!(intent.defend());
        assert_eq!(intent.flags, PlayerIntent::FLAG_DEFEND);
    }

    #[test]
    fn test_move_direction() {
        assert_eq!(LEFT.move_direction(), -1.0);
        assert_eq!(RIGHT.move_direction(), 1.0);
        assert_eq!(LEFT.with(PlayerIntent::FLAG_MOVE_RIGHT).move_direction(), 0.0);
        assert_eq!(PlayerIntent::NONE.move_direction(), 0.0);
    }

    #[test]
    fn test_direction_symbol_relative_to_opponent() {
        assert_eq!(RIGHT.direction_symbol(true), Some(ComboInput::Forward));
        assert_eq!(RIGHT.direction_symbol(false), Some(ComboInput::Back));
        assert_eq!(LEFT.direction_symbol(false), Some(ComboInput::Forward));
        assert_eq!(DOWN.direction_symbol(true), Some(ComboInput::Down));
        assert_eq!(
            DOWN.with(PlayerIntent::FLAG_MOVE_RIGHT).direction_symbol(true),
            Some(ComboInput::DownForward)
        );
        assert_eq!(
            DOWN.with(PlayerIntent::FLAG_MOVE_LEFT).direction_symbol(true),
            Some(ComboInput::DownBack)
        );
        assert_eq!(PlayerIntent::NONE.direction_symbol(true), None);
    }

    #[test]
    fn test_tracker_emits_on_change_only() {
        let mut tracker = ComboInputTracker::default();

        let first: Vec<_> = tracker.symbols(&DOWN, true).collect();
        assert_eq!(first, vec![ComboInput::Down]);

        let held: Vec<_> = tracker.symbols(&DOWN, true).collect();
        assert!(held.is_empty());

        let attack = RIGHT.with(PlayerIntent::FLAG_ATTACK);
        let both: Vec<_> = tracker.symbols(&attack, true).collect();
        assert_eq!(both, vec![ComboInput::Forward, ComboInput::Attack]);
    }

    #[test]
    fn test_tracker_repeat_after_neutral() {
        let mut tracker = ComboInputTracker::default();
        assert_eq!(tracker.symbols(&LEFT, true).count(), 1);
        assert_eq!(tracker.symbols(&PlayerIntent::NONE, true).count(), 0);
        let again: Vec<_> = tracker.symbols(&LEFT, true).collect();
        assert_eq!(again, vec![ComboInput::Back]);
    }

    #[test]
    fn test_tracker_defend_edge() {
        let mut tracker = ComboInputTracker::default();
        let defend = PlayerIntent::NONE.with(PlayerIntent::FLAG_DEFEND);
        assert_eq!(tracker.symbols(&defend, true).collect::<Vec<_>>(), vec![ComboInput::Defend]);
        assert_eq!(tracker.symbols(&defend, true).count(), 0);
        tracker.reset();
        assert_eq!(tracker.symbols(&defend, true).count(), 1);
    }

    #[test]
    fn test_recording_delta_compression() {
        let mut recording = IntentRecording::new();
        for frame in 0..4 {
            recording.record(frame, RIGHT);
        }
        assert_eq!(recording.deltas().len(), 1);

        recording.record(4, LEFT);
        assert_eq!(recording.deltas().len(), 2);
        assert_eq!(recording.end_frame, 4);
    }

    #[test]
    fn test_recording_intent_at() {
        let mut recording = IntentRecording::new();
        recording.record(10, RIGHT);
        recording.record(20, LEFT);

        assert_eq!(recording.intent_at(5), PlayerIntent::NONE);
        assert_eq!(recording.intent_at(10), RIGHT);
        assert_eq!(recording.intent_at(15), RIGHT);
        assert_eq!(recording.intent_at(25), LEFT);
    }

    #[test]
    fn test_recording_hash_depends_on_deltas() {
        let digest = |recording: &IntentRecording| {
            let mut hasher = StateHasher::for_inputs();
            recording.hash_into(&mut hasher);
            hasher.finalize()
        };

        let mut a = IntentRecording::new();
        a.record(0, RIGHT);
        a.record(5, LEFT);
        let mut b = IntentRecording::new();
        b.record(0, RIGHT);
        b.record(6, LEFT);

        assert_eq!(digest(&a), digest(&a.clone()));
        assert_ne!(digest(&a), digest(&b));
    }

    #[test]
    fn test_replay_iter() {
        let mut recording = IntentRecording::new();
        recording.record(0, RIGHT);
        recording.record(1, RIGHT);
        recording.record(2, RIGHT);
        recording.record(3, LEFT);
        recording.record(4, LEFT);

        let frames: Vec<_> = recording.replay_iter().collect();
        assert_eq!(frames.len(), 5);
        assert_eq!(frames[2], (2, RIGHT));
        assert_eq!(frames[3], (3, LEFT));
        assert_eq!(frames[4], (4, LEFT));
    }
}
