//! Combo Recognizer
//!
//! Buffers timestamped symbolic inputs and matches the tail of the buffer
//! against registered sequences. A match returns the combo's trigger
//! value to the caller.

use std::collections::VecDeque;

use serde::{Serialize, Deserialize};

use crate::config::ComboConfig;
use crate::core::hash::StateHasher;

// =============================================================================
// SYMBOLS
// =============================================================================

/// Symbolic input, with directions relative to the opponent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ComboInput {
    /// Toward the opponent
    Forward = 0,
    /// Away from the opponent
    Back = 1,
    /// Down
    Down = 2,
    /// Down and toward the opponent
    DownForward = 3,
    /// Down and away from the opponent
    DownBack = 4,
    /// Attack pressed
    Attack = 5,
    /// Defend pressed
    Defend = 6,
}

/// Built-in combo moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ComboMove {
    /// Fireball projectile
    Hadoken = 0,
    /// Rising uppercut
    Shoryuken = 1,
    /// Backward teleport
    Teleport = 2,
}

impl ComboMove {
    /// Registered name.
    pub fn name(self) -> &'static str {
        match self {
            ComboMove::Hadoken => "hadoken",
            ComboMove::Shoryuken => "shoryuken",
            ComboMove::Teleport => "teleport",
        }
    }
}

/// Down, down-forward, forward, attack
pub const HADOKEN: [ComboInput; 4] = [
    ComboInput::Down,
    ComboInput::DownForward,
    ComboInput::Forward,
    ComboInput::Attack,
];

/// Forward, down, down-forward, attack
pub const SHORYUKEN: [ComboInput; 4] = [
    ComboInput::Forward,
    ComboInput::Down,
    ComboInput::DownForward,
    ComboInput::Attack,
];

/// Back, back, defend
pub const TELEPORT: [ComboInput; 3] = [
    ComboInput::Back,
    ComboInput::Back,
    ComboInput::Defend,
];

// =============================================================================
// RECOGNIZER
// =============================================================================

/// One buffered input.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BufferedInput {
    /// Symbol
    pub input: ComboInput,
    /// Time recorded (ms)
    pub timestamp: f64,
}

/// A registered combo.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComboDefinition<T> {
    /// Name for logging
    pub name: String,
    /// Required inputs, oldest first
    pub sequence: Vec<ComboInput>,
    /// Value returned when the combo fires
    pub trigger: T,
}

/// Per-combatant combo matcher.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComboRecognizer<T> {
    buffer: VecDeque<BufferedInput>,
    combos: Vec<ComboDefinition<T>>,
    buffer_window_ms: f64,
    input_window_ms: f64,
}

impl<T: Clone> ComboRecognizer<T> {
    /// Create an empty recognizer with the given timing.
    pub fn new(config: ComboConfig) -> Self {
        Self {
            buffer: VecDeque::new(),
            combos: Vec::new(),
            buffer_window_ms: config.buffer_window_ms,
            input_window_ms: config.input_window_ms,
        }
    }

    /// Register a combo. Earlier registrations win when several match.
    ///
    /// Empty sequences are ignored.
    pub fn add_combo(&mut self, name: impl Into<String>, sequence: &[ComboInput], trigger: T) {
        if sequence.is_empty() {
            return;
        }
        self.combos.push(ComboDefinition {
            name: name.into(),
            sequence: sequence.to_vec(),
            trigger,
        });
    }

    /// Record an input and return the trigger of the first combo it
    /// completes, if any. The matched inputs are consumed.
    pub fn record_input(&mut self, input: ComboInput, timestamp: f64) -> Option<T> {
        self.buffer.push_back(BufferedInput { input, timestamp });
        self.prune(timestamp);

        let index = self.combos.iter().position(|c| self.matches(&c.sequence))?;
        let combo = &self.combos[index];
        let keep = self.buffer.len() - combo.sequence.len();
        self.buffer.truncate(keep);
        Some(combo.trigger.clone())
    }

    /// Drop entries at least one buffer window older than `now`.
    pub fn prune(&mut self, now: f64) {
        let window = self.buffer_window_ms;
        self.buffer.retain(|entry| now - entry.timestamp < window);
    }

    /// Forget all buffered inputs. Registered combos are kept.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    fn matches(&self, sequence: &[ComboInput]) -> bool {
        let n = sequence.len();
        if self.buffer.len() < n {
            return false;
        }

        let recent = self.buffer.range(self.buffer.len() - n..);
        if !recent.clone().map(|e| e.input).eq(sequence.iter().copied()) {
            return false;
        }

        let timestamps: Vec<f64> = recent.map(|e| e.timestamp).collect();
        timestamps
            .windows(2)
            .all(|pair| pair[1] - pair[0] <= self.input_window_ms)
    }

    /// Name of the combo that would return `trigger`.
    pub fn name_of(&self, trigger: &T) -> Option<&str>
    where
        T: PartialEq,
    {
        self.combos
            .iter()
            .find(|c| &c.trigger == trigger)
            .map(|c| c.name.as_str())
    }

    /// Buffered inputs, oldest first.
    pub fn buffer(&self) -> impl Iterator<Item = &BufferedInput> {
        self.buffer.iter()
    }

    /// Number of buffered inputs.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Registered combos in priority order.
    pub fn combos(&self) -> &[ComboDefinition<T>] {
        &self.combos
    }

    /// Add the buffer contents to a state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.buffer.len() as u32);
        for entry in &self.buffer {
            hasher.update_u8(entry.input as u8);
            hasher.update_f64(entry.timestamp);
        }
    }
}

impl ComboRecognizer<ComboMove> {
    /// Recognizer with hadoken, shoryuken and teleport registered.
    pub fn with_default_combos(config: ComboConfig) -> Self {
        let mut recognizer = Self::new(config);
        recognizer.add_combo(ComboMove::Hadoken.name(), &HADOKEN, ComboMove::Hadoken);
        recognizer.add_combo(ComboMove::Shoryuken.name(), &SHORYUKEN, ComboMove::Shoryuken);
        recognizer.add_combo(ComboMove::Teleport.name(), &TELEPORT, ComboMove::Teleport);
        recognizer
    }
}

// =============================================================================
// TESTS
// =============================================================================
