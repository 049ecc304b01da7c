//! Game Events
//!
//! Events emitted by each frame update, in the order they happened.
//! The simulation never reads them back; they exist for presentation,
//! logging and tests.

use serde::{Serialize, Deserialize};

use crate::game::archetype::SpecialEffect;
use crate::game::combat::{Hit, HitSource};
use crate::game::combatant::CombatantId;
use crate::game::combo::ComboMove;

/// Why a round ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum RoundEndReason {
    /// Exactly one combatant left alive
    Knockout = 0,
    /// Nobody left alive
    Draw = 1,
    /// Round timer ran out
    Timeout = 2,
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEventData {
    /// Damage registered
    Hit {
        /// Combatant credited with the hit
        attacker: CombatantId,
        /// Combatant that lost health
        target: CombatantId,
        /// Health removed
        damage: f64,
        /// Melee or projectile
        source: HitSource,
    },

    /// Combatant fell below the world and respawned
    FellOut {
        /// Combatant that fell
        combatant: CombatantId,
        /// Whether fall damage registered
        damaged: bool,
    },

    /// Combo recognized
    ComboTriggered {
        /// Combatant that entered the combo
        combatant: CombatantId,
        /// Recognized combo
        combo: ComboMove,
    },

    /// Special move performed
    SpecialUsed {
        /// Combatant that used it
        combatant: CombatantId,
        /// What the special did
        effect: SpecialEffect,
    },

    /// Projectile launched
    ProjectileFired {
        /// Combatant that fired it
        owner: CombatantId,
    },

    /// Health reached 0
    KnockedOut {
        /// Combatant knocked out
        combatant: CombatantId,
    },

    /// Round began
    RoundStarted {
        /// Round number (1-based)
        round: u32,
    },

    /// Round finished
    RoundEnded {
        /// Round number (1-based)
        round: u32,
        /// Knockout, draw or timeout
        reason: RoundEndReason,
        /// Survivor of a knockout
        winner: Option<CombatantId>,
        /// Scores after this round
        scores: [u32; 2],
    },

    /// A player reached the rounds-to-win threshold
    MatchEnded {
        /// Player with more round wins
        winner: Option<CombatantId>,
        /// Final scores
        scores: [u32; 2],
    },
}

/// A game event stamped with its frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Frame when the event occurred
    pub frame: u64,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(frame: u64, data: GameEventData) -> Self {
        Self { frame, data }
    }

    /// Combatant the event is about, if any.
    pub fn combatant(&self) -> Option<CombatantId> {
        match &self.data {
            GameEventData::Hit { target, .. } => Some(*target),
            GameEventData::FellOut { combatant, .. }
            | GameEventData::ComboTriggered { combatant, .. }
            | GameEventData::SpecialUsed { combatant, .. }
            | GameEventData::KnockedOut { combatant } => Some(*combatant),
            GameEventData::ProjectileFired { owner } => Some(*owner),
            GameEventData::RoundEnded { winner, .. } | GameEventData::MatchEnded { winner, .. } => *winner,
            GameEventData::RoundStarted { .. } => None,
        }
    }

    /// Create hit event.
    pub fn hit(frame: u64, hit: Hit) -> Self {
        Self::new(
            frame,
            GameEventData::Hit {
                attacker: hit.attacker,
                target: hit.target,
                damage: hit.damage,
                source: hit.source,
            },
        )
    }

    /// Create fell out event.
    pub fn fell_out(frame: u64, combatant: CombatantId, damaged: bool) -> Self {
        Self::new(frame, GameEventData::FellOut { combatant, damaged })
    }

    /// Create combo triggered event.
    pub fn combo_triggered(frame: u64, combatant: CombatantId, combo: ComboMove) -> Self {
        Self::new(frame, GameEventData::ComboTriggered { combatant, combo })
    }

    /// Create special used event.
    pub fn special_used(frame: u64, combatant: CombatantId, effect: SpecialEffect) -> Self {
        Self::new(frame, GameEventData::SpecialUsed { combatant, effect })
    }

    /// Create projectile fired event.
    pub fn projectile_fired(frame: u64, owner: CombatantId) -> Self {
        Self::new(frame, GameEventData::ProjectileFired { owner })
    }

    /// Create knocked out event.
    pub fn knocked_out(frame: u64, combatant: CombatantId) -> Self {
        Self::new(frame, GameEventData::KnockedOut { combatant })
    }

    /// Create round started event.
    pub fn round_started(frame: u64, round: u32) -> Self {
        Self::new(frame, GameEventData::RoundStarted { round })
    }

    /// Create round ended event.
    pub fn round_ended(
        frame: u64,
        round: u32,
        reason: RoundEndReason,
        winner: Option<CombatantId>,
        scores: [u32; 2],
    ) -> Self {
        Self::new(
            frame,
            GameEventData::RoundEnded {
                round,
                reason,
                winner,
                scores,
            },
        )
    }

    /// Create match ended event.
    pub fn match_ended(frame: u64, winner: Option<CombatantId>, scores: [u32; 2]) -> Self {
        Self::new(frame, GameEventData::MatchEnded { winner, scores })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_combatant() {
        let hit = GameEvent::hit(
            3,
            Hit {
                attacker: CombatantId::P1,
                target: CombatantId::P2,
                damage: 10.0,
                source: HitSource::Melee,
            },
        );
        assert_eq!(hit.combatant(), Some(CombatantId::P2));
        assert_eq!(hit.frame, 3);

        assert_eq!(GameEvent::round_started(0, 1).combatant(), None);
        assert_eq!(
            GameEvent::round_ended(9, 1, RoundEndReason::Knockout, Some(CombatantId::P1), [1, 0]).combatant(),
            Some(CombatantId::P1)
        );
    }
}
