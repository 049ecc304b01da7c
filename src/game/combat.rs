//! Combat Resolution
//!
//! Melee hits between every ordered pair of combatants and projectile
//! contacts. A geometric overlap only counts as a hit when the target's
//! `take_damage` accepts it.

use serde::{Serialize, Deserialize};

use crate::game::combatant::{Combatant, CombatantId};
use crate::game::projectile::Projectile;

/// What delivered a hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum HitSource {
    /// Attack box
    Melee = 0,
    /// Projectile contact
    Projectile = 1,
}

/// A registered hit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// Combatant credited with the hit
    pub attacker: CombatantId,
    /// Combatant that lost health
    pub target: CombatantId,
    /// Health actually removed
    pub damage: f64,
    /// Delivery
    pub source: HitSource,
}

/// Check one attacker against one target, applying damage on contact.
///
/// True only if the attacker is attacking, the target is alive and
/// distinct, the attack box overlaps the target's hitbox and the damage
/// registered.
pub fn check_attack_hit(attacker: &Combatant, target: &mut Combatant) -> bool {
    if !attacker.attacking || !target.alive || attacker.id == target.id {
        return false;
    }
    if !attacker.attack_box.intersects(&target.hitbox()) {
        return false;
    }
    target.take_damage(attacker.attack_damage())
}

/// Mutable references to two distinct elements.
///
/// Returns `None` if `i == j` or either index is out of range.
pub fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> Option<(&mut T, &mut T)> {
    if i == j || i >= items.len() || j >= items.len() {
        return None;
    }
    if i < j {
        let (head, tail) = items.split_at_mut(j);
        Some((&mut head[i], &mut tail[0]))
    } else {
        let (head, tail) = items.split_at_mut(i);
        Some((&mut tail[0], &mut head[j]))
    }
}

/// Evaluate melee for every ordered pair, in index order.
pub fn resolve_melee(combatants: &mut [Combatant]) -> Vec<Hit> {
    let mut hits = Vec::new();

    for i in 0..combatants.len() {
        for j in 0..combatants.len() {
            let Some((attacker, target)) = pair_mut(combatants, i, j) else {
                continue;
            };
            let before = target.health;
            if check_attack_hit(attacker, target) {
                hits.push(Hit {
                    attacker: attacker.id,
                    target: target.id,
                    damage: before - target.health,
                    source: HitSource::Melee,
                });
            }
        }
    }

    hits
}

/// Apply projectile contacts. A projectile touching an alive non-owner
/// is consumed even if the damage was dropped.
pub fn resolve_projectiles(projectiles: &mut Vec<Projectile>, combatants: &mut [Combatant]) -> Vec<Hit> {
    let mut hits = Vec::new();

    projectiles.retain(|projectile| {
        let hitbox = projectile.hitbox();
        let Some(target) = combatants
            .iter_mut()
            .find(|c| c.alive && c.id != projectile.owner && c.hitbox().intersects(&hitbox))
        else {
            return true;
        };

        let before = target.health;
        if target.take_damage(projectile.damage) {
            hits.push(Hit {
                attacker: projectile.owner,
                target: target.id,
                damage: before - target.health,
                source: HitSource::Projectile,
            });
        }
        false
    });

    hits
}
