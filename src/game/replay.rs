//! Match Recording & Replay Verification
//!
//! Records everything needed to re-simulate a match: archetypes, the
//! configuration, every frame's delta time and both players'
//! delta-compressed intents. Verification replays the recording from
//! scratch and compares state hashes at periodic checkpoints and at the
//! end.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::config::GameConfig;
use crate::core::hash::{StateHash, StateHasher};
use crate::game::archetype::Archetype;
use crate::game::combatant::CombatantId;
use crate::game::input::{IntentRecording, PlayerIntent};
use crate::game::round::RoundController;

/// Current recording format version.
pub const RECORDING_VERSION: u8 = 1;

/// Checkpoint interval in frames (10 seconds at 60 Hz).
pub const CHECKPOINT_INTERVAL: u32 = 600;

/// Replay errors.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// bincode could not encode the recording
    #[error("failed to encode recording: {0}")]
    Encode(#[source] bincode::Error),

    /// bytes are not a recording
    #[error("failed to decode recording: {0}")]
    Decode(#[source] bincode::Error),

    /// Recorded with an incompatible format
    #[error("recording version mismatch: expected {expected}, got {got}")]
    VersionMismatch {
        /// Supported version
        expected: u8,
        /// Version found
        got: u8,
    },

    /// No outcome recorded
    #[error("recording is incomplete")]
    Incomplete,

    /// Frame deltas, intents or restarts changed after the recording was sealed
    #[error("input digest mismatch: expected {}, computed {}", hex::encode(.expected), hex::encode(.computed))]
    InputDigestMismatch {
        /// Digest sealed into the outcome
        expected: StateHash,
        /// Digest of the recording as it is now
        computed: StateHash,
    },

    /// Intent stream does not cover every frame
    #[error("intents of {player} cover {frames} frames, expected {expected}")]
    InputLengthMismatch {
        /// Player whose stream is short or long
        player: CombatantId,
        /// Frames covered
        frames: u32,
        /// Frames recorded
        expected: u32,
    },

    /// Replayed state diverged at a checkpoint
    #[error("checkpoint mismatch at frame {frame}: expected {}, computed {}", hex::encode(.expected), hex::encode(.computed))]
    CheckpointMismatch {
        /// Frame of the checkpoint
        frame: u32,
        /// Recorded hash
        expected: StateHash,
        /// Replayed hash
        computed: StateHash,
    },

    /// Replayed final state differs
    #[error("final state mismatch: expected {}, computed {}", hex::encode(.expected), hex::encode(.computed))]
    FinalStateMismatch {
        /// Recorded hash
        expected: StateHash,
        /// Replayed hash
        computed: StateHash,
    },

    /// Replayed scores differ
    #[error("score mismatch: expected {expected:?}, computed {computed:?}")]
    ResultMismatch {
        /// Recorded scores
        expected: [u32; 2],
        /// Replayed scores
        computed: [u32; 2],
    },
}

/// State hash at a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Frames simulated when the hash was taken
    pub frame: u32,
    /// State hash
    pub state_hash: StateHash,
}

/// How the recorded match ended up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// Frames simulated
    pub end_frame: u32,
    /// Round wins
    pub scores: [u32; 2],
    /// Whether a player reached the rounds-to-win threshold
    pub match_over: bool,
    /// Digest of the recorded inputs
    pub input_digest: StateHash,
    /// Final state hash
    pub final_state_hash: StateHash,
}

/// A complete, replayable match.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchRecording {
    /// Format version
    pub version: u8,
    /// P1 and P2 archetypes
    pub archetypes: [Archetype; 2],
    /// Configuration the match ran with
    pub config: GameConfig,
    /// Delta time fed to each frame update
    pub frame_dts: Vec<f64>,
    /// Per-player intents
    pub intents: [IntentRecording; 2],
    /// Frame indices before which the round was restarted
    pub restarts: Vec<u32>,
    /// Periodic state hashes
    pub checkpoints: Vec<Checkpoint>,
    /// Set by [`finalize`](Self::finalize)
    pub outcome: Option<MatchOutcome>,
}

impl MatchRecording {
    /// Start an empty recording.
    pub fn new(archetypes: [Archetype; 2], config: GameConfig) -> Self {
        Self {
            version: RECORDING_VERSION,
            archetypes,
            config,
            frame_dts: Vec::new(),
            intents: [IntentRecording::new(), IntentRecording::new()],
            restarts: Vec::new(),
            checkpoints: Vec::new(),
            outcome: None,
        }
    }

    /// Frames recorded so far.
    pub fn frame_count(&self) -> u32 {
        self.frame_dts.len() as u32
    }

    /// Record a frame after `controller` was updated with it.
    pub fn record_frame(&mut self, dt: f64, intents: &[PlayerIntent; 2], controller: &RoundController) {
        let index = self.frame_count();
        self.frame_dts.push(dt);
        for (recording, intent) in self.intents.iter_mut().zip(intents) {
            recording.record(index, *intent);
        }

        let frames = index + 1;
        if frames % CHECKPOINT_INTERVAL == 0 {
            self.checkpoints.push(Checkpoint {
                frame: frames,
                state_hash: controller.compute_hash(),
            });
        }
    }

    /// Note a round restart before the next recorded frame.
    pub fn record_restart(&mut self) {
        self.restarts.push(self.frame_count());
    }

    /// Seal the recording with the controller's final state.
    pub fn finalize(&mut self, controller: &RoundController) {
        self.outcome = Some(MatchOutcome {
            end_frame: self.frame_count(),
            scores: controller.scores(),
            match_over: controller.is_match_over(),
            input_digest: self.input_digest(),
            final_state_hash: controller.compute_hash(),
        });
    }

    /// Hash of everything fed into the simulation: frame deltas, both
    /// intent streams and restart points.
    pub fn input_digest(&self) -> StateHash {
        let mut hasher = StateHasher::for_inputs();
        hasher.update_u32(self.frame_count());
        for dt in &self.frame_dts {
            hasher.update_f64(*dt);
        }
        for intents in &self.intents {
            intents.hash_into(&mut hasher);
        }
        hasher.update_u32(self.restarts.len() as u32);
        for frame in &self.restarts {
            hasher.update_u32(*frame);
        }
        hasher.finalize()
    }

    /// Serialize to bytes using bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ReplayError> {
        bincode::serialize(self).map_err(ReplayError::Encode)
    }

    /// Deserialize from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ReplayError> {
        bincode::deserialize(data).map_err(ReplayError::Decode)
    }
}

/// Re-simulate a recording, checking every checkpoint on the way.
pub fn replay(recording: &MatchRecording) -> Result<RoundController, ReplayError> {
    if recording.version != RECORDING_VERSION {
        return Err(ReplayError::VersionMismatch {
            expected: RECORDING_VERSION,
            got: recording.version,
        });
    }

    let frames = recording.frame_count();
    if frames > 0 {
        for (i, intents) in recording.intents.iter().enumerate() {
            let covered = intents.end_frame + 1;
            if covered != frames {
                return Err(ReplayError::InputLengthMismatch {
                    player: CombatantId(i as u8),
                    frames: covered,
                    expected: frames,
                });
            }
        }
    }

    let mut controller = RoundController::new(recording.archetypes, recording.config.clone());
    controller.start_match();

    let mut restarts = recording.restarts.iter().copied().peekable();
    let mut checkpoints = recording.checkpoints.iter().peekable();
    let [p1, p2] = &recording.intents;

    for (index, (dt, ((_, a), (_, b)))) in recording
        .frame_dts
        .iter()
        .zip(p1.replay_iter().zip(p2.replay_iter()))
        .enumerate()
    {
        while restarts.next_if(|&frame| frame as usize == index).is_some() {
            controller.restart_round();
        }

        controller.update(*dt, &[a, b]);

        if let Some(checkpoint) = checkpoints.next_if(|c| u64::from(c.frame) == controller.frame()) {
            let computed = controller.compute_hash();
            if computed != checkpoint.state_hash {
                return Err(ReplayError::CheckpointMismatch {
                    frame: checkpoint.frame,
                    expected: checkpoint.state_hash,
                    computed,
                });
            }
            debug!("Checkpoint {} verified", checkpoint.frame);
        }
    }

    // Restarts after the last recorded frame
    for _ in restarts {
        controller.restart_round();
    }

    Ok(controller)
}

/// Replay a finished recording and check it reproduces the recorded
/// outcome. Returns the verified final state hash.
pub fn verify(recording: &MatchRecording) -> Result<StateHash, ReplayError> {
    let outcome = recording.outcome.as_ref().ok_or(ReplayError::Incomplete)?;

    let digest = recording.input_digest();
    if digest != outcome.input_digest {
        return Err(ReplayError::InputDigestMismatch {
            expected: outcome.input_digest,
            computed: digest,
        });
    }

    let controller = replay(recording)?;

    let computed = controller.compute_hash();
    if computed != outcome.final_state_hash {
        return Err(ReplayError::FinalStateMismatch {
            expected: outcome.final_state_hash,
            computed,
        });
    }

    if controller.scores() != outcome.scores {
        return Err(ReplayError::ResultMismatch {
            expected: outcome.scores,
            computed: controller.scores(),
        });
    }

    debug!(
        "Replay verified: {} frames, hash {}",
        outcome.end_frame,
        hex::encode(computed)
    );
    Ok(computed)
}
