//! Projectiles
//!
//! Straight-flying squares fired by the mage special and the hadoken
//! combo. They ignore platforms and gravity.

use serde::{Serialize, Deserialize};

use crate::config::WorldBounds;
use crate::core::hash::StateHasher;
use crate::core::rect::Rect;
use crate::core::vec2::Vec2;
use crate::game::combatant::{Combatant, CombatantId};

/// A projectile in flight.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    /// Combatant that fired it (never hit by it)
    pub owner: CombatantId,
    /// Top-left corner
    pub position: Vec2,
    /// Velocity (units/s)
    pub velocity: Vec2,
    /// Side length
    pub size: f64,
    /// Damage dealt on contact
    pub damage: f64,
    /// Seconds left before it fizzles
    pub lifetime: f64,
}

impl Projectile {
    /// Fire from the front of `owner` at chest height, carrying the
    /// owner's current attack damage.
    pub fn spawn(owner: &Combatant) -> Self {
        let tuning = &owner.tuning;
        let size = tuning.projectile_size;
        let x = if owner.facing_right {
            owner.position.x + owner.size.x
        } else {
            owner.position.x - size
        };
        let y = owner.position.y + owner.size.y / 2.0 - size / 2.0;

        Self {
            owner: owner.id,
            position: Vec2::new(x, y),
            velocity: Vec2::new(owner.facing_sign() * tuning.projectile_speed, 0.0),
            size,
            damage: owner.attack_damage(),
            lifetime: tuning.projectile_lifetime,
        }
    }

    /// Move and age by `dt` seconds.
    pub fn update(&mut self, dt: f64) {
        self.position = self.position + self.velocity * dt;
        self.lifetime -= dt;
    }

    /// Hit region.
    #[inline]
    pub fn hitbox(&self) -> Rect {
        Rect::new(self.position.x, self.position.y, self.size, self.size)
    }

    /// Lifetime over or fully outside the horizontal world bounds.
    pub fn is_expired(&self, bounds: &WorldBounds) -> bool {
        self.lifetime <= 0.0
            || self.position.x + self.size < bounds.left
            || self.position.x > bounds.right
    }

    /// Add this projectile to a state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u8(self.owner.0);
        hasher.update_vec2(self.position);
        hasher.update_vec2(self.velocity);
        hasher.update_f64(self.damage);
        hasher.update_f64(self.lifetime);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CombatConfig;
    use crate::game::archetype::Archetype;

    fn mage(facing_right: bool) -> Combatant {
        let mut c = Combatant::new(CombatantId::P1, Archetype::Mage, Vec2::new(100.0, 200.0), CombatConfig::default());
        c.facing_right = facing_right;
        c
    }

    #[test]
    fn test_spawn_in_front() {
        let right = Projectile::spawn(&mage(true));
        assert_eq!(right.position, Vec2::new(140.0, 220.0));
        assert_eq!(right.velocity, Vec2::new(400.0, 0.0));
        assert_eq!(right.damage, 20.0);
        assert_eq!(right.owner, CombatantId::P1);

        let left = Projectile::spawn(&mage(false));
        assert_eq!(left.position, Vec2::new(80.0, 220.0));
        assert_eq!(left.velocity.x, -400.0);
    }

    #[test]
    fn test_update_moves_and_ages() {
        let mut p = Projectile::spawn(&mage(true));
        p.update(0.5);
        assert_eq!(p.position.x, 340.0);
        assert_eq!(p.lifetime, 1.5);
    }

    #[test]
    fn test_expiry() {
        let bounds = WorldBounds::default();
        let mut p = Projectile::spawn(&mage(true));
        assert!(!p.is_expired(&bounds));

        p.lifetime = 0.0;
        assert!(p.is_expired(&bounds));

        let mut off_world = Projectile::spawn(&mage(true));
        off_world.position.x = 1201.0;
        assert!(off_world.is_expired(&bounds));
    }
}
