//! Physics World
//!
//! Gravity, damping, platform collision and world bounds for combatants.
//! All integration is semi-implicit Euler: velocity is updated before
//! position. This is the only place horizontal velocity is damped.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::config::PhysicsConfig;
use crate::core::constants::GROUND_PROBE_EPSILON;
use crate::core::rect::Rect;
use crate::core::vec2::Vec2;
use crate::game::combatant::Combatant;

/// A combatant dropped below the world and was respawned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallOut {
    /// Whether the fall damage registered (false while invulnerable)
    pub damaged: bool,
}

/// Static stage geometry plus integration constants.
#[derive(Clone, Debug)]
pub struct PhysicsWorld {
    config: PhysicsConfig,
    platforms: Vec<Rect>,
}

impl PhysicsWorld {
    /// Create a world with the configured platforms.
    pub fn new(config: PhysicsConfig) -> Self {
        let platforms = config.platforms.clone();
        Self { config, platforms }
    }

    /// Static platforms.
    #[inline]
    pub fn platforms(&self) -> &[Rect] {
        &self.platforms
    }

    /// Tuning in use.
    #[inline]
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    // =========================================================================
    // Integration
    // =========================================================================

    /// Advance one combatant by `dt` seconds.
    ///
    /// Recomputes `grounded` from scratch, then applies world bounds.
    /// Returns the fall-out if the combatant dropped below the world.
    pub fn apply_physics(&self, combatant: &mut Combatant, dt: f64) -> Option<FallOut> {
        let was_grounded = combatant.grounded;
        combatant.grounded = false;

        if !was_grounded {
            combatant.velocity.y += self.config.gravity * dt;
        }
        combatant.velocity.x *= self.config.air_resistance;
        combatant.velocity.y = combatant.velocity.y.min(self.config.max_fall_speed);

        combatant.position = combatant.position + combatant.velocity * dt;

        for platform in &self.platforms {
            self.resolve_collision(combatant, platform);
        }

        if !combatant.grounded && combatant.velocity.y >= 0.0 {
            if let Some(platform) = self.platform_under(combatant) {
                combatant.position.y = platform.y - combatant.size.y;
                combatant.velocity.y = 0.0;
                combatant.grounded = true;
            }
        }

        if combatant.grounded {
            combatant.velocity.x *= self.config.ground_friction;
            if combatant.velocity.y >= 0.0 {
                combatant.has_double_jumped = false;
                combatant.jumping = false;
            }
        }

        self.check_world_bounds(combatant)
    }

    /// Push a combatant out of one platform along the axis of least
    /// penetration. Returns whether they overlapped.
    pub fn resolve_collision(&self, combatant: &mut Combatant, platform: &Rect) -> bool {
        let body = combatant.hitbox();
        // Strict overlap: zero penetration on both axes is not a collision.
        if !body.intersects(platform) {
            return false;
        }

        let overlap_left = body.right() - platform.x;
        let overlap_right = platform.right() - body.x;
        let overlap_top = body.bottom() - platform.y;
        let overlap_bottom = platform.bottom() - body.y;

        let min_x = overlap_left.min(overlap_right);
        let min_y = overlap_top.min(overlap_bottom);

        if min_x < min_y {
            if overlap_left < overlap_right {
                combatant.position.x = platform.x - combatant.size.x;
                if combatant.velocity.x > 0.0 {
                    combatant.velocity.x = 0.0;
                }
            } else {
                combatant.position.x = platform.right();
                if combatant.velocity.x < 0.0 {
                    combatant.velocity.x = 0.0;
                }
            }
        } else if overlap_top <= overlap_bottom {
            combatant.position.y = platform.y - combatant.size.y;
            // Landing never cancels an upward velocity
            if combatant.velocity.y > 0.0 {
                combatant.velocity.y = 0.0;
                combatant.grounded = true;
            }
        } else {
            combatant.position.y = platform.bottom();
            if combatant.velocity.y < 0.0 {
                combatant.velocity.y = 0.0;
            }
        }
        true
    }

    /// Platform whose top the combatant's feet rest on, if any.
    fn platform_under(&self, combatant: &Combatant) -> Option<&Rect> {
        let body = combatant.hitbox();
        self.platforms.iter().find(|p| {
            (body.bottom() - p.y).abs() <= GROUND_PROBE_EPSILON
                && body.x < p.right()
                && body.right() > p.x
        })
    }

    /// Wrap horizontally, clamp at the top and respawn below the bottom.
    pub fn check_world_bounds(&self, combatant: &mut Combatant) -> Option<FallOut> {
        let bounds = self.config.bounds;
        let width = combatant.size.x;

        if combatant.position.x < bounds.left - width {
            combatant.position.x = bounds.right;
        } else if combatant.position.x > bounds.right {
            combatant.position.x = bounds.left - width;
        }

        if combatant.position.y < bounds.top {
            combatant.position.y = bounds.top;
            combatant.velocity.y = combatant.velocity.y.max(0.0);
        }

        if combatant.position.y > bounds.bottom {
            let damaged = combatant.take_damage(self.config.fall_damage);
            combatant.position = Vec2::new(bounds.right / 2.0 - width / 2.0, self.config.respawn_y);
            combatant.velocity = Vec2::ZERO;
            combatant.grounded = false;
            debug!("{} fell out (damaged: {})", combatant.id, damaged);
            return Some(FallOut { damaged });
        }
        None
    }

    /// Push two overlapping combatants apart horizontally.
    ///
    /// Returns whether they overlapped.
    pub fn separate_combatants(&self, a: &mut Combatant, b: &mut Combatant) -> bool {
        let rect_a = a.hitbox();
        let rect_b = b.hitbox();
        if !rect_a.intersects(&rect_b) {
            return false;
        }

        let center_a = rect_a.center().x;
        let center_b = rect_b.center().x;
        // -1 pushes `a` left, +1 pushes it right
        let direction = if center_a < center_b { -1.0 } else { 1.0 };

        let force = self.config.separation_force;
        a.velocity.x += direction * force;
        b.velocity.x -= direction * force;

        let overlap = (rect_a.width + rect_b.width) / 2.0 - (center_a - center_b).abs();
        if overlap > 0.0 {
            a.position.x += direction * overlap / 2.0;
            b.position.x -= direction * overlap / 2.0;
        }
        true
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Whether a 1x1 probe at `(x, y)` overlaps any platform.
    pub fn is_position_on_platform(&self, x: f64, y: f64) -> bool {
        let probe = Rect::new(x, y, 1.0, 1.0);
        self.platforms.iter().any(|p| probe.intersects(p))
    }

    /// Platform whose center is closest to `(x, y)`.
    pub fn nearest_platform(&self, x: f64, y: f64) -> Option<&Rect> {
        let point = Vec2::new(x, y);
        self.platforms.iter().min_by(|a, b| {
            let da = a.center().distance(point);
            let db = b.center().distance(point);
            da.total_cmp(&db)
        })
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CombatConfig, WorldBounds};
    use crate::game::archetype::Archetype;
    use crate::game::combatant::CombatantId;
    use proptest::prelude::*;

    const DT: f64 = 0.016;

    fn world_with(platforms: Vec<Rect>) -> PhysicsWorld {
        PhysicsWorld::new(PhysicsConfig {
            platforms,
            ..PhysicsConfig::default()
        })
    }

    fn robot_at(x: f64, y: f64) -> Combatant {
        Combatant::new(CombatantId::P1, Archetype::Robot, Vec2::new(x, y), CombatConfig::default())
    }

    #[test]
    fn test_default_world_has_stage() {
        let world = PhysicsWorld::default();
        assert_eq!(world.platforms().len(), 10);
        assert_eq!(world.platforms()[0], Rect::new(0.0, 750.0, 1200.0, 50.0));
    }

    #[test]
    fn test_gravity_when_airborne() {
        let world = world_with(Vec::new());
        let mut c = robot_at(500.0, 100.0);
        world.apply_physics(&mut c, DT);
        assert_eq!(c.velocity.y, 800.0 * DT);
        assert!(!c.grounded);
    }

    #[test]
    fn test_fall_speed_clamped() {
        let world = world_with(Vec::new());
        let mut c = robot_at(500.0, 100.0);
        c.velocity.y = 2000.0;
        world.apply_physics(&mut c, DT);
        assert_eq!(c.velocity.y, 600.0);
    }

    #[test]
    fn test_landing_on_platform() {
        let platform = Rect::new(400.0, 500.0, 400.0, 20.0);
        let world = world_with(vec![platform]);
        let mut c = robot_at(500.0, 500.0 - 60.0 - 2.0);
        c.velocity.y = 300.0;

        world.apply_physics(&mut c, DT);

        assert!(c.grounded);
        assert_eq!(c.velocity.y, 0.0);
        assert_eq!(c.position.y, platform.y - c.size.y);
    }

    #[test]
    fn test_exact_touchdown_stops_fall() {
        let platform = Rect::new(400.0, 500.0, 400.0, 20.0);
        let world = world_with(vec![platform]);
        let dt = 1.0 / 64.0;
        let mut c = robot_at(500.0, 439.8046875);

        // Gravity for one step lands the feet exactly on the platform top
        world.apply_physics(&mut c, dt);

        assert!(c.grounded);
        assert_eq!(c.velocity.y, 0.0);
        assert_eq!(c.position.y, platform.y - c.size.y);
    }

    #[test]
    fn test_upward_velocity_not_zeroed_by_floor() {
        let platform = Rect::new(400.0, 500.0, 400.0, 20.0);
        let world = world_with(vec![platform]);
        let mut c = robot_at(500.0, 445.0);
        c.velocity.y = -200.0;

        world.apply_physics(&mut c, DT);

        assert_eq!(c.position.y, 440.0);
        assert!(c.velocity.y < 0.0);
        assert!(!c.grounded);
    }

    #[test]
    fn test_grounded_does_not_flicker_while_standing() {
        let world = PhysicsWorld::default();
        let mut c = robot_at(500.0, 690.0);
        c.velocity.y = 100.0;

        for _ in 0..120 {
            world.apply_physics(&mut c, DT);
            assert!(c.grounded);
            assert_eq!(c.position.y, 690.0);
            assert_eq!(c.velocity.y, 0.0);
        }
    }

    #[test]
    fn test_landing_resets_double_jump() {
        let world = PhysicsWorld::default();
        let mut c = robot_at(500.0, 688.0);
        c.jumping = true;
        c.has_double_jumped = true;
        c.velocity.y = 200.0;

        world.apply_physics(&mut c, DT);

        assert!(c.grounded);
        assert!(!c.jumping);
        assert!(!c.has_double_jumped);
    }

    #[test]
    fn test_walking_off_edge_starts_falling() {
        let platform = Rect::new(400.0, 500.0, 100.0, 20.0);
        let world = world_with(vec![platform]);
        let mut c = robot_at(600.0, 440.0);
        c.grounded = true;

        world.apply_physics(&mut c, DT);
        assert!(!c.grounded);

        world.apply_physics(&mut c, DT);
        assert!(c.velocity.y > 0.0);
    }

    #[test]
    fn test_ground_friction_applied_once() {
        let world = PhysicsWorld::default();
        let mut c = robot_at(500.0, 690.0);
        c.grounded = true;
        c.velocity.x = 100.0;

        world.apply_physics(&mut c, DT);

        assert_eq!(c.velocity.x, 100.0 * 0.98 * 0.85);
    }

    #[test]
    fn test_side_collision_pushes_out() {
        let wall = Rect::new(600.0, 0.0, 50.0, 700.0);
        let world = world_with(vec![wall]);
        let mut c = robot_at(562.0, 300.0);
        c.velocity.x = 200.0;

        world.apply_physics(&mut c, DT);

        assert_eq!(c.position.x, 560.0);
        assert_eq!(c.velocity.x, 0.0);
    }

    #[test]
    fn test_ceiling_hit_zeroes_upward_velocity() {
        let ceiling = Rect::new(400.0, 200.0, 400.0, 20.0);
        let world = world_with(vec![ceiling]);
        let mut c = robot_at(500.0, 222.0);
        c.velocity.y = -400.0;

        world.apply_physics(&mut c, DT);

        assert_eq!(c.position.y, 220.0);
        assert_eq!(c.velocity.y, 0.0);
    }

    #[test]
    fn test_touching_edges_is_not_collision() {
        let platform = Rect::new(100.0, 100.0, 50.0, 50.0);
        let world = world_with(vec![platform]);
        let mut c = robot_at(150.0, 150.0);
        assert!(!world.resolve_collision(&mut c, &platform));
        assert_eq!(c.position, Vec2::new(150.0, 150.0));
    }

    #[test]
    fn test_wrap_right_to_left() {
        let world = world_with(Vec::new());
        let mut c = robot_at(1201.0, 100.0);

        world.apply_physics(&mut c, DT);

        let vy = 800.0 * DT;
        assert_eq!(c.position.x, -c.size.x);
        assert_eq!(c.position.y, 100.0 + vy * DT);
    }

    #[test]
    fn test_wrap_left_to_right() {
        let world = world_with(Vec::new());
        let mut c = robot_at(-41.0, 300.0);
        c.velocity.y = 0.0;
        assert!(world.check_world_bounds(&mut c).is_none());
        assert_eq!(c.position, Vec2::new(1200.0, 300.0));
    }

    #[test]
    fn test_top_clamp() {
        let world = world_with(Vec::new());
        let mut c = robot_at(500.0, -5.0);
        c.velocity.y = -100.0;
        world.check_world_bounds(&mut c);
        assert_eq!(c.position.y, 0.0);
        assert_eq!(c.velocity.y, 0.0);
    }

    #[test]
    fn test_fall_out_damages_and_respawns() {
        let world = world_with(Vec::new());
        let mut c = robot_at(300.0, 801.0);
        c.velocity = Vec2::new(50.0, 300.0);

        let fall = world.check_world_bounds(&mut c);

        assert_eq!(fall, Some(FallOut { damaged: true }));
        assert_eq!(c.position, Vec2::new(580.0, 100.0));
        assert_eq!(c.velocity, Vec2::ZERO);
        assert!(c.health < c.stats.max_health);
    }

    #[test]
    fn test_fall_out_while_invulnerable() {
        let world = world_with(Vec::new());
        let mut c = robot_at(300.0, 801.0);
        c.grant_invulnerability(1.0);

        let fall = world.check_world_bounds(&mut c);

        assert_eq!(fall, Some(FallOut { damaged: false }));
        assert_eq!(c.health, c.stats.max_health);
    }

    #[test]
    fn test_separation_pushes_apart() {
        let world = PhysicsWorld::default();
        let mut a = robot_at(100.0, 300.0);
        let mut b = Combatant::new(CombatantId::P2, Archetype::Robot, Vec2::new(120.0, 300.0), CombatConfig::default());

        assert!(world.separate_combatants(&mut a, &mut b));

        assert_eq!(a.velocity.x, -50.0);
        assert_eq!(b.velocity.x, 50.0);
        assert_eq!(a.position.x, 90.0);
        assert_eq!(b.position.x, 130.0);
        assert!(!a.hitbox().intersects(&b.hitbox()));
    }

    #[test]
    fn test_separation_with_shared_center_pushes_first_right() {
        let world = PhysicsWorld::default();
        let mut a = robot_at(100.0, 300.0);
        let mut b = Combatant::new(CombatantId::P2, Archetype::Robot, Vec2::new(100.0, 300.0), CombatConfig::default());

        assert!(world.separate_combatants(&mut a, &mut b));

        assert_eq!(a.velocity.x, 50.0);
        assert_eq!(b.velocity.x, -50.0);
        assert!(a.position.x > b.position.x);
        assert!(!a.hitbox().intersects(&b.hitbox()));
    }

    #[test]
    fn test_no_separation_without_overlap() {
        let world = PhysicsWorld::default();
        let mut a = robot_at(100.0, 300.0);
        let mut b = robot_at(140.0, 300.0);
        assert!(!world.separate_combatants(&mut a, &mut b));
        assert_eq!(a.velocity.x, 0.0);
    }

    #[test]
    fn test_platform_queries() {
        let world = PhysicsWorld::default();
        assert!(world.is_position_on_platform(600.0, 760.0));
        assert!(!world.is_position_on_platform(600.0, 100.0));

        let nearest = world.nearest_platform(600.0, 210.0).copied();
        assert_eq!(nearest, Some(Rect::new(450.0, 200.0, 300.0, 20.0)));

        assert!(world_with(Vec::new()).nearest_platform(0.0, 0.0).is_none());
    }

    proptest! {
        #[test]
        fn prop_wrap_has_no_vertical_effect(x in 1200.001f64..1300.0, y in 0.0f64..700.0) {
            let world = PhysicsWorld::new(PhysicsConfig {
                bounds: WorldBounds::default(),
                platforms: Vec::new(),
                ..PhysicsConfig::default()
            });
            let mut c = robot_at(x, y);
            c.velocity.y = 12.0;
            world.check_world_bounds(&mut c);
            prop_assert_eq!(c.position.x, -c.size.x);
            prop_assert_eq!(c.position.y, y);
            prop_assert_eq!(c.velocity.y, 12.0);
        }
    }
}
