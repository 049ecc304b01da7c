//! Game State Machine
//!
//! Top-level phases (menu, character select, playing, paused, game over)
//! and the per-frame driver. `Game` is the single context object that
//! owns the round controller and the match recording; nothing is global.
//!
//! ```text
//!  Menu ──show_character_select──▶ CharacterSelect
//!   │                                   │
//!   └────────────start_game─────────────┤
//!                                       ▼
//!  GameOver ◀──match end── Playing ◀──▶ Paused
//!      │                      ▲
//!      └──────start_game──────┘
//! ```

use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::config::{GameConfig, Settings};
use crate::game::archetype::Archetype;
use crate::game::input::PlayerIntent;
use crate::game::replay::MatchRecording;
use crate::game::round::{FrameResult, RoundController};

/// Top-level phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
#[derive(Default)]
pub enum GamePhase {
    /// Title menu
    #[default]
    Menu = 0,
    /// Picking archetypes
    CharacterSelect = 1,
    /// Match running
    Playing = 2,
    /// Match frozen
    Paused = 3,
    /// Match finished
    GameOver = 4,
}

/// Phase transition errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// The action is not allowed in the current phase
    #[error("cannot {action} while in {phase:?}")]
    InvalidTransition {
        /// Attempted action
        action: &'static str,
        /// Phase at the time
        phase: GamePhase,
    },
}

/// Game context.
#[derive(Debug)]
pub struct Game {
    config: GameConfig,
    phase: GamePhase,
    selected: [Archetype; 2],
    round: Option<RoundController>,
    recording: Option<MatchRecording>,
}

impl Game {
    /// New game in the menu with default archetypes.
    pub fn new(config: GameConfig) -> Self {
        Self::with_settings(config, &Settings::default())
    }

    /// New game in the menu with archetypes from saved settings.
    pub fn with_settings(config: GameConfig, settings: &Settings) -> Self {
        Self {
            config,
            phase: GamePhase::Menu,
            selected: settings.selected_archetypes,
            round: None,
            recording: None,
        }
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    fn require(&self, action: &'static str, allowed: &[GamePhase]) -> Result<(), GameError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(GameError::InvalidTransition {
                action,
                phase: self.phase,
            })
        }
    }

    fn set_phase(&mut self, phase: GamePhase) {
        debug!("Phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    /// Menu → CharacterSelect.
    pub fn show_character_select(&mut self) -> Result<(), GameError> {
        self.require("show character select", &[GamePhase::Menu])?;
        self.set_phase(GamePhase::CharacterSelect);
        Ok(())
    }

    /// Choose archetypes for the next match.
    pub fn select_archetypes(&mut self, archetypes: [Archetype; 2]) -> Result<(), GameError> {
        self.require(
            "select archetypes",
            &[GamePhase::Menu, GamePhase::CharacterSelect],
        )?;
        debug!("Selected {} vs {}", archetypes[0], archetypes[1]);
        self.selected = archetypes;
        Ok(())
    }

    /// Start a fresh match with the selected archetypes.
    pub fn start_game(&mut self) -> Result<(), GameError> {
        self.require(
            "start game",
            &[GamePhase::Menu, GamePhase::CharacterSelect, GamePhase::GameOver],
        )?;

        let mut round = RoundController::new(self.selected, self.config.clone());
        round.start_match();
        self.round = Some(round);
        self.recording = Some(MatchRecording::new(self.selected, self.config.clone()));

        info!("Game started: {} vs {}", self.selected[0], self.selected[1]);
        self.set_phase(GamePhase::Playing);
        Ok(())
    }

    /// Playing → Paused.
    pub fn pause(&mut self) -> Result<(), GameError> {
        self.require("pause", &[GamePhase::Playing])?;
        self.set_phase(GamePhase::Paused);
        Ok(())
    }

    /// Paused → Playing.
    pub fn resume(&mut self) -> Result<(), GameError> {
        self.require("resume", &[GamePhase::Paused])?;
        self.set_phase(GamePhase::Playing);
        Ok(())
    }

    /// Pause when playing, resume when paused.
    pub fn toggle_pause(&mut self) -> Result<(), GameError> {
        match self.phase {
            GamePhase::Playing => self.pause(),
            GamePhase::Paused => self.resume(),
            phase => Err(GameError::InvalidTransition {
                action: "toggle pause",
                phase,
            }),
        }
    }

    /// Restart the current round without scoring it.
    pub fn restart_round(&mut self) -> Result<(), GameError> {
        self.require("restart round", &[GamePhase::Playing])?;
        if let Some(round) = &mut self.round {
            round.restart_round();
            if let Some(recording) = &mut self.recording {
                recording.record_restart();
            }
        }
        Ok(())
    }

    /// Leave the match and return to the menu. Allowed from any phase.
    ///
    /// The recording of the abandoned match is sealed and stays
    /// available through [`take_recording`](Self::take_recording).
    pub fn back_to_menu(&mut self) {
        if let (Some(round), Some(recording)) = (&self.round, &mut self.recording) {
            recording.finalize(round);
        }
        self.round = None;
        self.set_phase(GamePhase::Menu);
    }

    // =========================================================================
    // Frame
    // =========================================================================

    /// Clamp a raw frame delta to `[0, max_frame_dt]`; NaN becomes 0.
    pub fn sanitize_dt(&self, raw_dt: f64) -> f64 {
        if raw_dt.is_nan() || raw_dt <= 0.0 {
            0.0
        } else {
            raw_dt.min(self.config.max_frame_dt)
        }
    }

    /// Run one frame. Does nothing unless playing.
    pub fn frame(&mut self, raw_dt: f64, intents: &[PlayerIntent; 2]) -> FrameResult {
        if self.phase != GamePhase::Playing {
            return FrameResult::default();
        }
        let dt = self.sanitize_dt(raw_dt);

        let Some(round) = &mut self.round else {
            return FrameResult::default();
        };
        let result = round.update(dt, intents);
        if let Some(recording) = &mut self.recording {
            recording.record_frame(dt, intents, round);
        }

        if result.match_ended {
            info!("Game over: scores {:?}", round.scores());
            self.set_phase(GamePhase::GameOver);
        }
        result
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Archetypes used by the next `start_game`.
    pub fn selected_archetypes(&self) -> [Archetype; 2] {
        self.selected
    }

    /// Round controller of the current match, if any.
    pub fn round(&self) -> Option<&RoundController> {
        self.round.as_ref()
    }

    /// Mutable round controller, for scripted setups.
    pub fn round_mut(&mut self) -> Option<&mut RoundController> {
        self.round.as_mut()
    }

    /// Configuration in use.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Finalize and hand over the recording of the current match.
    pub fn take_recording(&mut self) -> Option<MatchRecording> {
        let mut recording = self.recording.take()?;
        if let Some(round) = &self.round {
            recording.finalize(round);
        }
        Some(recording)
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::combatant::CombatantId;
    use crate::game::replay;
    use crate::game::round::RoundState;

    const IDLE: [PlayerIntent; 2] = [PlayerIntent::NONE; 2];

    fn playing() -> Game {
        let mut game = Game::default();
        game.start_game().unwrap();
        game
    }

    #[test]
    fn test_menu_flow() {
        let mut game = Game::default();
        assert_eq!(game.phase(), GamePhase::Menu);

        game.show_character_select().unwrap();
        game.select_archetypes([Archetype::Mage, Archetype::Robot]).unwrap();
        game.start_game().unwrap();

        assert_eq!(game.phase(), GamePhase::Playing);
        let round = game.round().unwrap();
        assert_eq!(round.combatant(CombatantId::P1).archetype, Archetype::Mage);
        assert_eq!(round.round_state(), RoundState::InProgress);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut game = Game::default();
        assert_eq!(
            game.pause(),
            Err(GameError::InvalidTransition {
                action: "pause",
                phase: GamePhase::Menu
            })
        );
        assert!(game.restart_round().is_err());
        assert!(game.toggle_pause().is_err());

        game.start_game().unwrap();
        assert!(game.start_game().is_err());
        assert!(game.select_archetypes([Archetype::Ninja; 2]).is_err());
    }

    #[test]
    fn test_settings_archetypes() {
        let settings = Settings {
            selected_archetypes: [Archetype::Robot, Archetype::Mage],
            sound_enabled: false,
        };
        let game = Game::with_settings(GameConfig::default(), &settings);
        assert_eq!(game.selected_archetypes(), [Archetype::Robot, Archetype::Mage]);
    }

    #[test]
    fn test_paused_frames_leave_state_untouched() {
        let mut game = playing();
        game.frame(0.016, &IDLE);
        game.pause().unwrap();

        let before = game.round().unwrap().compute_hash();
        for _ in 0..100 {
            game.frame(0.016, &IDLE);
        }
        assert_eq!(game.round().unwrap().compute_hash(), before);

        game.toggle_pause().unwrap();
        assert_eq!(game.phase(), GamePhase::Playing);
        game.frame(0.016, &IDLE);
        assert_ne!(game.round().unwrap().compute_hash(), before);
    }

    #[test]
    fn test_dt_cap_applied() {
        let mut game = playing();
        game.frame(5.0, &IDLE);
        let remaining = game.round().unwrap().time_remaining();
        assert!((remaining - (99.0 - 0.016)).abs() < 1e-9);
    }

    #[test]
    fn test_bad_dt_is_zero() {
        let game = Game::default();
        assert_eq!(game.sanitize_dt(-1.0), 0.0);
        assert_eq!(game.sanitize_dt(f64::NAN), 0.0);
        assert_eq!(game.sanitize_dt(0.01), 0.01);
        assert_eq!(game.sanitize_dt(1.0), 0.016);
    }

    #[test]
    fn test_match_end_goes_to_game_over() {
        let mut game = playing();
        {
            let round = game.round_mut().unwrap();
            round.set_scores([2, 0]);
            round.combatant_mut(CombatantId::P2).take_damage(10_000.0);
        }

        let result = game.frame(0.016, &IDLE);

        assert!(result.match_ended);
        assert_eq!(game.phase(), GamePhase::GameOver);
        assert_eq!(game.round().unwrap().scores(), [3, 0]);

        // Frames are ignored after game over
        let frame = game.round().unwrap().frame();
        game.frame(0.016, &IDLE);
        assert_eq!(game.round().unwrap().frame(), frame);

        game.start_game().unwrap();
        assert_eq!(game.round().unwrap().scores(), [0, 0]);
    }

    #[test]
    fn test_back_to_menu_from_anywhere() {
        let mut game = playing();
        game.pause().unwrap();
        game.back_to_menu();
        assert_eq!(game.phase(), GamePhase::Menu);
        assert!(game.round().is_none());
    }

    #[test]
    fn test_recording_sealed_when_leaving_match() {
        let mut game = playing();
        let mut intents = IDLE;
        intents[0].set_move_right(true);
        for _ in 0..120 {
            game.frame(0.016, &intents);
        }
        let expected = game.round().unwrap().compute_hash();

        game.back_to_menu();

        let recording = game.take_recording().unwrap();
        assert_eq!(recording.frame_count(), 120);
        assert_eq!(replay::verify(&recording).unwrap(), expected);
        assert!(game.take_recording().is_none());
    }

    #[test]
    fn test_recording_replays() {
        let mut game = playing();
        let mut intents = IDLE;
        for frame in 0..400u32 {
            intents[0].set_move_right(frame < 200);
            intents[0].set_attack(frame % 20 == 0);
            intents[1].set_jump(frame % 60 == 0);
            if frame == 150 {
                game.pause().unwrap();
                game.frame(0.016, &intents);
                game.resume().unwrap();
            }
            if frame == 300 {
                game.restart_round().unwrap();
            }
            game.frame(0.02, &intents);
        }

        let expected = game.round().unwrap().compute_hash();
        let recording = game.take_recording().unwrap();
        assert_eq!(recording.frame_count(), 400);
        assert_eq!(replay::verify(&recording).unwrap(), expected);
    }
}
