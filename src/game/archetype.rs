//! Archetype Capability Table
//!
//! Every archetype is a record of base stats plus two effect hooks:
//! `on_attack` runs when an attack starts, `on_special` performs the
//! archetype's special move. Call sites invoke the hooks through the
//! profile and never branch on the archetype.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Deserialize};

use crate::core::constants::*;
use crate::game::combatant::{Combatant, BuffKind};

// =============================================================================
// ARCHETYPE
// =============================================================================

/// Playable combatant variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
#[derive(Default)]
pub enum Archetype {
    /// Fast and fragile, blinks forward on attack
    #[default]
    Ninja = 0,
    /// Slow heavy hitter
    Warrior = 1,
    /// Ranged caster
    Mage = 2,
    /// Balanced, shields up on special
    Robot = 3,
}

impl Archetype {
    /// All archetypes in selection order.
    pub const ALL: [Archetype; 4] = [
        Archetype::Ninja,
        Archetype::Warrior,
        Archetype::Mage,
        Archetype::Robot,
    ];

    /// Capability record for this archetype.
    #[inline]
    pub fn profile(self) -> &'static ArchetypeProfile {
        &PROFILES[self as usize]
    }

    /// Base stats for this archetype.
    #[inline]
    pub fn stats(self) -> ArchetypeStats {
        self.profile().stats
    }

    /// Lowercase display name.
    pub fn name(self) -> &'static str {
        self.profile().name
    }

    /// Archetype from its index (0-3).
    pub fn from_index(index: u8) -> Option<Archetype> {
        Self::ALL.get(index as usize).copied()
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown archetype name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown archetype: {0}")]
pub struct UnknownArchetype(pub String);

impl FromStr for Archetype {
    type Err = UnknownArchetype;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|a| a.name() == lower)
            .ok_or_else(|| UnknownArchetype(s.to_string()))
    }
}

// =============================================================================
// STATS & PROFILE
// =============================================================================

/// Fixed base stats of an archetype.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeStats {
    /// Horizontal run speed
    pub speed: f64,
    /// Initial upward jump velocity
    pub jump_power: f64,
    /// Base melee damage
    pub attack_damage: f64,
    /// Damage divisor
    pub defense: f64,
    /// Starting and maximum health
    pub max_health: f64,
    /// Hitbox width
    pub width: f64,
    /// Hitbox height
    pub height: f64,
}

/// What a special move did, reported to the round controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum SpecialEffect {
    /// Forward dash with brief invulnerability
    Dash = 0,
    /// Charging attack with a damage buff
    Charge = 1,
    /// Projectile to be spawned by the caller
    Projectile = 2,
    /// Defense buff with invulnerability
    Shield = 3,
}

/// Hook run when an attack starts.
pub type AttackHook = fn(&mut Combatant);

/// Hook performing a special move.
pub type SpecialHook = fn(&mut Combatant) -> SpecialEffect;

/// Stats and effect hooks of one archetype.
#[derive(Clone, Copy)]
pub struct ArchetypeProfile {
    /// Lowercase name
    pub name: &'static str,
    /// Base stats
    pub stats: ArchetypeStats,
    /// Side effect when an attack starts
    pub on_attack: Option<AttackHook>,
    /// Special move
    pub on_special: SpecialHook,
}

impl fmt::Debug for ArchetypeProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchetypeProfile")
            .field("name", &self.name)
            .field("stats", &self.stats)
            .field("on_attack", &self.on_attack.is_some())
            .finish()
    }
}

static PROFILES: [ArchetypeProfile; 4] = [
    ArchetypeProfile {
        name: "ninja",
        stats: ArchetypeStats {
            speed: 280.0,
            jump_power: 450.0,
            attack_damage: 12.0,
            defense: 0.8,
            max_health: 100.0,
            width: 35.0,
            height: COMBATANT_HEIGHT,
        },
        on_attack: Some(ninja_blink),
        on_special: ninja_dash,
    },
    ArchetypeProfile {
        name: "warrior",
        stats: ArchetypeStats {
            speed: 160.0,
            jump_power: 350.0,
            attack_damage: 25.0,
            defense: 1.5,
            max_health: 120.0,
            width: 50.0,
            height: COMBATANT_HEIGHT,
        },
        on_attack: None,
        on_special: warrior_charge,
    },
    ArchetypeProfile {
        name: "mage",
        stats: ArchetypeStats {
            speed: 200.0,
            jump_power: 380.0,
            attack_damage: 20.0,
            defense: 0.7,
            max_health: 80.0,
            width: COMBATANT_WIDTH,
            height: COMBATANT_HEIGHT,
        },
        on_attack: None,
        on_special: mage_projectile,
    },
    ArchetypeProfile {
        name: "robot",
        stats: ArchetypeStats {
            speed: 220.0,
            jump_power: 380.0,
            attack_damage: 18.0,
            defense: 1.2,
            max_health: 110.0,
            width: COMBATANT_WIDTH,
            height: COMBATANT_HEIGHT,
        },
        on_attack: None,
        on_special: robot_shield,
    },
];

// =============================================================================
// HOOKS
// =============================================================================

fn ninja_blink(combatant: &mut Combatant) {
    combatant.position.x += combatant.facing_sign() * NINJA_ATTACK_BLINK;
}

fn ninja_dash(combatant: &mut Combatant) -> SpecialEffect {
    combatant.position.x += combatant.facing_sign() * NINJA_DASH_DISTANCE;
    combatant.grant_invulnerability(NINJA_DASH_INVULNERABILITY);
    SpecialEffect::Dash
}

fn warrior_charge(combatant: &mut Combatant) -> SpecialEffect {
    combatant.velocity.x = combatant.facing_sign() * WARRIOR_CHARGE_SPEED;
    combatant.add_buff(BuffKind::Damage, WARRIOR_CHARGE_DAMAGE_MULT, WARRIOR_CHARGE_DURATION);
    combatant.attack();
    SpecialEffect::Charge
}

fn mage_projectile(_combatant: &mut Combatant) -> SpecialEffect {
    SpecialEffect::Projectile
}

fn robot_shield(combatant: &mut Combatant) -> SpecialEffect {
    combatant.add_buff(BuffKind::Defense, ROBOT_SHIELD_DEFENSE_MULT, ROBOT_SHIELD_DURATION);
    combatant.grant_invulnerability(ROBOT_SHIELD_DURATION);
    SpecialEffect::Shield
}

// =============================================================================
// TESTS
// =============================================================================
