//! Combatant State
//!
//! A combatant is a set of flags and countdown timers rather than one
//! discrete state. Actions that are not currently allowed are silent
//! no-ops; only [`Combatant::take_damage`] reports whether it landed.

use std::fmt;

use serde::{Serialize, Deserialize};

use crate::config::CombatConfig;
use crate::core::hash::StateHasher;
use crate::core::rect::Rect;
use crate::core::vec2::Vec2;
use crate::game::archetype::{Archetype, ArchetypeStats, SpecialEffect};

/// Horizontal speed above which a grounded combatant counts as walking.
const WALK_SPEED_THRESHOLD: f64 = 10.0;

// =============================================================================
// COMBATANT ID
// =============================================================================

/// Slot of a combatant in the round (0 = player 1, 1 = player 2).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub struct CombatantId(pub u8);

impl CombatantId {
    /// Player 1
    pub const P1: CombatantId = CombatantId(0);
    /// Player 2
    pub const P2: CombatantId = CombatantId(1);

    /// Index into the combatant array.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// The other slot in a two-player round.
    #[inline]
    pub fn opponent(self) -> CombatantId {
        CombatantId(1 - self.0.min(1))
    }

    /// Player 1 starts each round facing right.
    #[inline]
    pub fn is_player_one(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0 + 1)
    }
}

// =============================================================================
// BUFFS & ANIMATION
// =============================================================================

/// Stat touched by a temporary buff.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum BuffKind {
    /// Multiplies attack damage
    Damage = 0,
    /// Multiplies defense
    Defense = 1,
}

/// Temporary stat multiplier that expires when its countdown reaches 0.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatBuff {
    /// Affected stat
    pub kind: BuffKind,
    /// Multiplier applied while active
    pub multiplier: f64,
    /// Seconds left
    pub remaining: f64,
}

/// Animation selection, in increasing precedence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AnimationState {
    /// Standing still
    Idle = 0,
    /// Running on the ground
    Walk = 1,
    /// Airborne
    Jump = 2,
    /// Attack window active
    Attack = 3,
    /// Recently hit or knocked out
    Hurt = 4,
}

// =============================================================================
// COMBATANT
// =============================================================================

/// A player-controlled fighter.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Combatant {
    /// Slot in the round
    pub id: CombatantId,
    /// Archetype providing stats and hooks
    pub archetype: Archetype,
    /// Base stats copied from the archetype
    pub stats: ArchetypeStats,

    /// Top-left corner of the hitbox
    pub position: Vec2,
    /// Velocity (units/s)
    pub velocity: Vec2,
    /// Hitbox size
    pub size: Vec2,
    /// Current health, in [0, max_health]
    pub health: f64,

    // =========================================================================
    // Flags
    // =========================================================================

    /// Standing on a platform this frame
    pub grounded: bool,
    /// Attack window active
    pub attacking: bool,
    /// Holding defend
    pub defending: bool,
    /// In a jump started from the ground
    pub jumping: bool,
    /// Facing direction
    pub facing_right: bool,
    /// Health above 0
    pub alive: bool,
    /// Damage is ignored
    pub invulnerable: bool,
    /// Double jump used this airborne phase
    pub has_double_jumped: bool,
    /// Double jump allowed at all
    pub can_double_jump: bool,

    // =========================================================================
    // Timers (seconds, never negative)
    // =========================================================================

    /// Attack window left
    pub attack_timer: f64,
    /// Invulnerability left
    pub invulnerability_timer: f64,
    /// Lockout for movement and attacks
    pub action_cooldown: f64,
    /// Lockout for the special move
    pub special_cooldown: f64,

    /// Active attack region, degenerate when not attacking
    pub attack_box: Rect,
    /// Temporary stat multipliers
    pub buffs: Vec<StatBuff>,

    /// Action timings and damage tuning
    pub tuning: CombatConfig,
}

impl Combatant {
    /// Create a combatant at a spawn point.
    pub fn new(id: CombatantId, archetype: Archetype, position: Vec2, tuning: CombatConfig) -> Self {
        let stats = archetype.stats();
        Self {
            id,
            archetype,
            stats,
            position,
            velocity: Vec2::ZERO,
            size: Vec2::new(stats.width, stats.height),
            health: stats.max_health,
            grounded: false,
            attacking: false,
            defending: false,
            jumping: false,
            facing_right: id.is_player_one(),
            alive: true,
            invulnerable: false,
            has_double_jumped: false,
            can_double_jump: true,
            attack_timer: 0.0,
            invulnerability_timer: 0.0,
            action_cooldown: 0.0,
            special_cooldown: 0.0,
            attack_box: Rect::ZERO,
            buffs: Vec::new(),
            tuning,
        }
    }

    /// +1 facing right, -1 facing left.
    #[inline]
    pub fn facing_sign(&self) -> f64 {
        if self.facing_right { 1.0 } else { -1.0 }
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Run in a direction. Ignored during the action cooldown.
    pub fn move_dir(&mut self, dir: f64) {
        if self.action_cooldown > 0.0 {
            return;
        }
        self.velocity.x = dir * self.stats.speed;
        if dir > 0.0 {
            self.facing_right = true;
        } else if dir < 0.0 {
            self.facing_right = false;
        }
    }

    /// Jump from the ground, or double jump once while airborne.
    pub fn jump(&mut self) -> bool {
        if self.grounded {
            self.velocity.y = -self.stats.jump_power;
            self.grounded = false;
            self.jumping = true;
            true
        } else if self.can_double_jump && !self.has_double_jumped {
            self.velocity.y = -self.stats.jump_power * self.tuning.double_jump_factor;
            self.has_double_jumped = true;
            true
        } else {
            false
        }
    }

    /// Start an attack. Returns false while on cooldown or mid-attack.
    pub fn attack(&mut self) -> bool {
        if self.action_cooldown > 0.0 || self.attacking {
            return false;
        }

        self.attacking = true;
        self.attack_timer = self.tuning.attack_duration;
        self.action_cooldown = self.tuning.attack_cooldown;

        if let Some(on_attack) = self.archetype.profile().on_attack {
            on_attack(self);
        }
        self.update_attack_box();
        true
    }

    /// Raise guard.
    pub fn defend(&mut self) {
        self.defending = true;
    }

    /// Lower guard.
    pub fn stop_defending(&mut self) {
        self.defending = false;
    }

    /// Perform the archetype's special move if it is off cooldown.
    pub fn use_special(&mut self) -> Option<SpecialEffect> {
        if !self.alive || self.special_cooldown > 0.0 {
            return None;
        }
        self.special_cooldown = self.tuning.special_cooldown;
        Some((self.archetype.profile().on_special)(self))
    }

    /// Apply incoming damage.
    ///
    /// Returns false, leaving every field untouched, when the combatant is
    /// invulnerable or already dead.
    pub fn take_damage(&mut self, amount: f64) -> bool {
        if self.invulnerable || !self.alive {
            return false;
        }

        let mut effective = amount / self.defense();
        if self.defending {
            effective /= 2.0;
        }
        let effective = effective.max(self.tuning.min_damage);

        self.health = (self.health - effective).max(0.0);
        self.invulnerable = true;
        self.invulnerability_timer = self.tuning.invulnerability_duration;
        self.velocity.x -= self.facing_sign() * self.tuning.knockback_force;

        if self.health <= 0.0 {
            self.health = 0.0;
            self.alive = false;
        }
        true
    }

    /// Restore health up to the maximum. Dead combatants stay dead.
    pub fn heal(&mut self, amount: f64) {
        if !self.alive {
            return;
        }
        self.health = (self.health + amount.max(0.0)).min(self.stats.max_health);
    }

    /// Reinitialize to spawn values for a new round.
    pub fn reset(&mut self, x: f64, y: f64) {
        self.position = Vec2::new(x, y);
        self.velocity = Vec2::ZERO;
        self.health = self.stats.max_health;
        self.alive = true;
        self.grounded = false;
        self.invulnerable = false;
        self.attacking = false;
        self.defending = false;
        self.jumping = false;
        self.has_double_jumped = false;
        self.attack_timer = 0.0;
        self.invulnerability_timer = 0.0;
        self.action_cooldown = 0.0;
        self.special_cooldown = 0.0;
        self.attack_box = Rect::ZERO;
        self.buffs.clear();
        self.facing_right = self.id.is_player_one();
    }

    // =========================================================================
    // Timers & buffs
    // =========================================================================

    /// Count down every timer, ending expired attacks, invulnerability
    /// and buffs.
    pub fn update_timers(&mut self, dt: f64) {
        if self.attack_timer > 0.0 {
            self.attack_timer -= dt;
            if self.attack_timer <= 0.0 {
                self.attack_timer = 0.0;
                self.attacking = false;
            }
        }

        if self.invulnerability_timer > 0.0 {
            self.invulnerability_timer -= dt;
            if self.invulnerability_timer <= 0.0 {
                self.invulnerability_timer = 0.0;
                self.invulnerable = false;
            }
        }

        self.action_cooldown = (self.action_cooldown - dt).max(0.0);
        self.special_cooldown = (self.special_cooldown - dt).max(0.0);

        for buff in &mut self.buffs {
            buff.remaining -= dt;
        }
        self.buffs.retain(|b| b.remaining > 0.0);

        self.update_attack_box();
    }

    /// Make the combatant invulnerable for at least `duration` seconds.
    pub fn grant_invulnerability(&mut self, duration: f64) {
        self.invulnerable = true;
        self.invulnerability_timer = self.invulnerability_timer.max(duration);
    }

    /// Add a temporary stat multiplier.
    pub fn add_buff(&mut self, kind: BuffKind, multiplier: f64, duration: f64) {
        self.buffs.push(StatBuff {
            kind,
            multiplier,
            remaining: duration,
        });
    }

    fn buff_multiplier(&self, kind: BuffKind) -> f64 {
        self.buffs
            .iter()
            .filter(|b| b.kind == kind)
            .map(|b| b.multiplier)
            .product()
    }

    // =========================================================================
    // Derived values
    // =========================================================================

    /// Recompute the attack box from position, facing and the attack flag.
    pub fn update_attack_box(&mut self) {
        self.attack_box = if self.attacking {
            let range = self.tuning.attack_range;
            let x = if self.facing_right {
                self.position.x + self.size.x
            } else {
                self.position.x - range
            };
            Rect::new(x, self.position.y + self.tuning.attack_offset_y, range, self.tuning.attack_height)
        } else {
            Rect::ZERO
        };
    }

    /// Melee damage including active buffs.
    pub fn attack_damage(&self) -> f64 {
        self.stats.attack_damage * self.buff_multiplier(BuffKind::Damage)
    }

    /// Defense divisor including active buffs.
    pub fn defense(&self) -> f64 {
        self.stats.defense * self.buff_multiplier(BuffKind::Defense)
    }

    /// Body rectangle.
    #[inline]
    pub fn hitbox(&self) -> Rect {
        Rect::from_pos_size(self.position, self.size)
    }

    /// Center of the body rectangle.
    #[inline]
    pub fn center(&self) -> Vec2 {
        self.position + self.size * 0.5
    }

    /// Health as a fraction of the maximum.
    pub fn health_fraction(&self) -> f64 {
        if self.stats.max_health > 0.0 {
            self.health / self.stats.max_health
        } else {
            0.0
        }
    }

    /// Special move ready to use.
    pub fn special_ready(&self) -> bool {
        self.alive && self.special_cooldown <= 0.0
    }

    /// Highest-precedence animation for the current flags.
    pub fn animation_state(&self) -> AnimationState {
        if !self.alive || self.invulnerable {
            AnimationState::Hurt
        } else if self.attacking {
            AnimationState::Attack
        } else if !self.grounded {
            AnimationState::Jump
        } else if self.velocity.x.abs() > WALK_SPEED_THRESHOLD {
            AnimationState::Walk
        } else {
            AnimationState::Idle
        }
    }

    /// Add this combatant to a state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u8(self.id.0);
        hasher.update_u8(self.archetype as u8);
        hasher.update_vec2(self.position);
        hasher.update_vec2(self.velocity);
        hasher.update_f64(self.health);
        hasher.update_bool(self.grounded);
        hasher.update_bool(self.attacking);
        hasher.update_bool(self.defending);
        hasher.update_bool(self.jumping);
        hasher.update_bool(self.facing_right);
        hasher.update_bool(self.alive);
        hasher.update_bool(self.invulnerable);
        hasher.update_bool(self.has_double_jumped);
        hasher.update_rect(&self.attack_box);
        hasher.update_f64(self.attack_timer);
        hasher.update_f64(self.invulnerability_timer);
        hasher.update_f64(self.action_cooldown);
        hasher.update_f64(self.special_cooldown);
        hasher.update_u32(self.buffs.len() as u32);
        for buff in &self.buffs {
            hasher.update_u8(buff.kind as u8);
            hasher.update_f64(buff.multiplier);
            hasher.update_f64(buff.remaining);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn make(archetype: Archetype) -> Combatant {
        Combatant::new(CombatantId::P1, archetype, Vec2::new(100.0, 100.0), CombatConfig::default())
    }

    #[test]
    fn test_new_uses_archetype_stats() {
        let c = make(Archetype::Warrior);
        assert_eq!(c.health, 120.0);
        assert_eq!(c.size, Vec2::new(50.0, 60.0));
        assert!(c.facing_right);
        assert!(c.alive);

        let p2 = Combatant::new(CombatantId::P2, Archetype::Mage, Vec2::ZERO, CombatConfig::default());
        assert!(!p2.facing_right);
    }

    #[test]
    fn test_move_sets_velocity_and_facing() {
        let mut c = make(Archetype::Robot);
        c.move_dir(-1.0);
        assert_eq!(c.velocity.x, -220.0);
        assert!(!c.facing_right);

        c.action_cooldown = 0.2;
        c.move_dir(1.0);
        assert_eq!(c.velocity.x, -220.0);
        assert!(!c.facing_right);
    }

    #[test]
    fn test_jump_and_double_jump() {
        let mut c = make(Archetype::Warrior);
        c.grounded = true;

        assert!(c.jump());
        assert_eq!(c.velocity.y, -350.0);
        assert!(!c.grounded);
        assert!(c.jumping);

        assert!(c.jump());
        assert_eq!(c.velocity.y, -350.0 * 0.8);
        assert!(c.has_double_jumped);

        assert!(!c.jump());
    }

    #[test]
    fn test_attack_sets_window_and_box() {
        let mut c = make(Archetype::Robot);
        assert!(c.attack());
        assert!(c.attacking);
        assert_eq!(c.attack_timer, 0.3);
        assert_eq!(c.action_cooldown, 0.5);
        assert_eq!(c.attack_box, Rect::new(140.0, 115.0, 60.0, 30.0));

        // Already attacking
        assert!(!c.attack());
    }

    #[test]
    fn test_attack_box_facing_left() {
        let mut c = make(Archetype::Mage);
        c.facing_right = false;
        c.attack();
        assert_eq!(c.attack_box, Rect::new(40.0, 115.0, 60.0, 30.0));
    }

    #[test]
    fn test_ninja_attack_blinks_forward() {
        let mut c = make(Archetype::Ninja);
        c.attack();
        assert_eq!(c.position.x, 120.0);
    }

    #[test]
    fn test_attack_box_degenerate_iff_not_attacking() {
        let mut c = make(Archetype::Robot);
        assert!(c.attack_box.is_degenerate());

        c.attack();
        assert!(!c.attack_box.is_degenerate());

        c.update_timers(0.2);
        assert!(c.attacking);
        assert!(!c.attack_box.is_degenerate());

        c.update_timers(0.2);
        assert!(!c.attacking);
        assert!(c.attack_box.is_degenerate());
    }

    #[test]
    fn test_timers_clamp_at_zero() {
        let mut c = make(Archetype::Robot);
        c.attack();
        c.take_damage(10.0);
        c.update_timers(5.0);
        assert_eq!(c.attack_timer, 0.0);
        assert_eq!(c.invulnerability_timer, 0.0);
        assert_eq!(c.action_cooldown, 0.0);
        assert!(!c.invulnerable);
    }

    #[test]
    fn test_take_damage_applies_defense_and_knockback() {
        let mut c = make(Archetype::Warrior);
        assert!(c.take_damage(30.0));
        assert_eq!(c.health, 100.0);
        assert!(c.invulnerable);
        assert_eq!(c.invulnerability_timer, 1.0);
        assert_eq!(c.velocity.x, -100.0);
    }

    #[test]
    fn test_defending_halves_damage() {
        let mut c = make(Archetype::Warrior);
        c.defend();
        assert!(c.take_damage(30.0));
        assert_eq!(c.health, 110.0);
        c.stop_defending();
        assert!(!c.defending);
    }

    #[test]
    fn test_invulnerable_damage_dropped() {
        let mut c = make(Archetype::Robot);
        assert!(c.take_damage(12.0));
        let health = c.health;
        assert!(!c.take_damage(50.0));
        assert_eq!(c.health, health);
    }

    #[test]
    fn test_death() {
        let mut c = make(Archetype::Mage);
        assert!(c.take_damage(1000.0));
        assert_eq!(c.health, 0.0);
        assert!(!c.alive);

        c.invulnerable = false;
        assert!(!c.take_damage(10.0));
        c.heal(50.0);
        assert_eq!(c.health, 0.0);
    }

    #[test]
    fn test_heal_caps_at_max() {
        let mut c = make(Archetype::Robot);
        c.take_damage(24.0);
        c.heal(1000.0);
        assert_eq!(c.health, 110.0);
    }

    #[test]
    fn test_reset_restores_spawn_state() {
        let mut c = Combatant::new(CombatantId::P2, Archetype::Robot, Vec2::ZERO, CombatConfig::default());
        c.facing_right = true;
        c.attack();
        c.take_damage(500.0);
        c.add_buff(BuffKind::Damage, 2.0, 1.0);

        c.reset(800.0, 300.0);
        assert_eq!(c.position, Vec2::new(800.0, 300.0));
        assert_eq!(c.velocity, Vec2::ZERO);
        assert_eq!(c.health, 110.0);
        assert!(c.alive);
        assert!(!c.attacking);
        assert!(!c.invulnerable);
        assert!(!c.facing_right);
        assert!(c.buffs.is_empty());
        assert!(c.attack_box.is_degenerate());
    }

    #[test]
    fn test_buffs_multiply_and_expire() {
        let mut c = make(Archetype::Warrior);
        c.add_buff(BuffKind::Damage, 2.0, 0.5);
        assert_eq!(c.attack_damage(), 50.0);

        c.update_timers(0.3);
        assert_eq!(c.attack_damage(), 50.0);

        c.update_timers(0.3);
        assert_eq!(c.attack_damage(), 25.0);
        assert!(c.buffs.is_empty());
    }

    #[test]
    fn test_special_moves() {
        let mut ninja = make(Archetype::Ninja);
        assert_eq!(ninja.use_special(), Some(SpecialEffect::Dash));
        assert_eq!(ninja.position.x, 250.0);
        assert!(ninja.invulnerable);
        assert_eq!(ninja.use_special(), None);

        let mut warrior = make(Archetype::Warrior);
        assert_eq!(warrior.use_special(), Some(SpecialEffect::Charge));
        assert_eq!(warrior.velocity.x, 300.0);
        assert!(warrior.attacking);
        assert_eq!(warrior.attack_damage(), 50.0);

        let mut mage = make(Archetype::Mage);
        assert_eq!(mage.use_special(), Some(SpecialEffect::Projectile));

        let mut robot = make(Archetype::Robot);
        assert_eq!(robot.use_special(), Some(SpecialEffect::Shield));
        assert!((robot.defense() - 3.6).abs() < 1e-9);
        assert_eq!(robot.invulnerability_timer, 2.0);
    }

    #[test]
    fn test_special_cooldown_expires() {
        let mut c = make(Archetype::Mage);
        c.use_special();
        assert!(!c.special_ready());
        c.update_timers(2.0);
        assert!(c.special_ready());
    }

    #[test]
    fn test_animation_precedence() {
        let mut c = make(Archetype::Robot);
        c.grounded = true;
        assert_eq!(c.animation_state(), AnimationState::Idle);

        c.velocity.x = 200.0;
        assert_eq!(c.animation_state(), AnimationState::Walk);

        c.grounded = false;
        assert_eq!(c.animation_state(), AnimationState::Jump);

        c.attack();
        assert_eq!(c.animation_state(), AnimationState::Attack);

        c.take_damage(10.0);
        assert_eq!(c.animation_state(), AnimationState::Hurt);
    }

    #[test]
    fn test_hash_covers_attack_box() {
        let digest = |c: &Combatant| {
            let mut hasher = StateHasher::for_round_state();
            c.hash_into(&mut hasher);
            hasher.finalize()
        };

        let idle = make(Archetype::Robot);
        let mut shifted = idle.clone();
        shifted.attack_box = Rect::new(1.0, 2.0, 3.0, 4.0);

        assert_eq!(digest(&idle), digest(&idle.clone()));
        assert_ne!(digest(&idle), digest(&shifted));
    }

    #[test]
    fn test_opponent_id() {
        assert_eq!(CombatantId::P1.opponent(), CombatantId::P2);
        assert_eq!(CombatantId::P2.opponent(), CombatantId::P1);
        assert_eq!(CombatantId::P2.to_string(), "P2");
    }

    proptest! {
        #[test]
        fn prop_damage_formula(
            archetype in 0u8..4,
            start in 1.0f64..120.0,
            amount in 0.0f64..300.0,
            defending: bool,
        ) {
            let archetype = Archetype::from_index(archetype).unwrap();
            let mut c = make(archetype);
            c.health = start.min(c.stats.max_health);
            c.defending = defending;
            let before = c.health;

            let mut expected = amount / c.stats.defense;
            if defending {
                expected /= 2.0;
            }
            let expected = (before - expected.max(1.0)).max(0.0);

            prop_assert!(c.take_damage(amount));
            prop_assert_eq!(c.health, expected);
            prop_assert!(c.health >= 0.0 && c.health <= c.stats.max_health);
            prop_assert_eq!(c.alive, c.health > 0.0);
        }

        #[test]
        fn prop_heal_never_exceeds_max(amount in 0.0f64..1000.0, damage in 0.0f64..50.0) {
            let mut c = make(Archetype::Ninja);
            c.take_damage(damage);
            c.heal(amount);
            prop_assert!(c.health <= c.stats.max_health);
        }
    }
}
