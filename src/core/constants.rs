//! Game Constants
//!
//! Default tuning values. Runtime code reads them through
//! [`GameConfig`](crate::config::GameConfig) so they can be overridden.
//!
//! Units: world units (canvas pixels), seconds, milliseconds for combo
//! timestamps only.

// =============================================================================
// FRAME TIMING
// =============================================================================

/// Maximum delta time fed into a single update (seconds).
///
/// Larger steps (e.g. after a stalled tab) are clamped to this value.
pub const MAX_FRAME_DT: f64 = 0.016;

/// Nominal frame duration used by scripted drivers (seconds).
pub const NOMINAL_FRAME_DT: f64 = 1.0 / 60.0;

// =============================================================================
// PHYSICS
// =============================================================================

/// Gravity acceleration (units/s²)
pub const GRAVITY: f64 = 800.0;

/// Horizontal decay applied every frame
pub const AIR_RESISTANCE: f64 = 0.98;

/// Extra horizontal decay applied when grounded
pub const GROUND_FRICTION: f64 = 0.85;

/// Terminal fall speed (units/s)
pub const MAX_FALL_SPEED: f64 = 600.0;

/// World bounds
pub const WORLD_LEFT: f64 = 0.0;
/// Right world edge
pub const WORLD_RIGHT: f64 = 1200.0;
/// Top world edge
pub const WORLD_TOP: f64 = 0.0;
/// Bottom world edge (falling past it is a fall-out)
pub const WORLD_BOTTOM: f64 = 800.0;

/// Damage applied when falling out of the world
pub const FALL_DAMAGE: f64 = 15.0;

/// Respawn height after a fall-out
pub const RESPAWN_Y: f64 = 100.0;

/// Horizontal impulse applied when two combatants overlap
pub const SEPARATION_FORCE: f64 = 50.0;

/// Tolerance for the resting-on-platform probe
pub const GROUND_PROBE_EPSILON: f64 = 1e-6;

/// Stage layout: (x, y, width, height)
pub const STAGE_PLATFORMS: [(f64, f64, f64, f64); 10] = [
    // Main floor
    (0.0, 750.0, 1200.0, 50.0),
    // Floating platforms
    (200.0, 600.0, 200.0, 20.0),
    (800.0, 600.0, 200.0, 20.0),
    (100.0, 450.0, 150.0, 20.0),
    (950.0, 450.0, 150.0, 20.0),
    (400.0, 500.0, 400.0, 20.0),
    (500.0, 350.0, 200.0, 20.0),
    // Side ledges
    (50.0, 300.0, 100.0, 20.0),
    (1050.0, 300.0, 100.0, 20.0),
    // Top center
    (450.0, 200.0, 300.0, 20.0),
];

// =============================================================================
// COMBATANT
// =============================================================================

/// Default combatant width
pub const COMBATANT_WIDTH: f64 = 40.0;

/// Combatant height (all archetypes)
pub const COMBATANT_HEIGHT: f64 = 60.0;

/// Attack active window (seconds)
pub const ATTACK_DURATION: f64 = 0.3;

/// Cooldown after starting an attack (seconds)
pub const ATTACK_COOLDOWN: f64 = 0.5;

/// Invulnerability after taking damage (seconds)
pub const INVULNERABILITY_DURATION: f64 = 1.0;

/// Horizontal knockback impulse on hit
pub const KNOCKBACK_FORCE: f64 = 100.0;

/// Double jump strength relative to jump power
pub const DOUBLE_JUMP_FACTOR: f64 = 0.8;

/// Attack box reach in front of the combatant
pub const ATTACK_RANGE: f64 = 60.0;

/// Attack box height
pub const ATTACK_HEIGHT: f64 = 30.0;

/// Attack box vertical offset from the top of the hitbox
pub const ATTACK_OFFSET_Y: f64 = 15.0;

/// Minimum damage per registered hit
pub const MIN_DAMAGE: f64 = 1.0;

/// Cooldown between special moves (seconds)
pub const SPECIAL_COOLDOWN: f64 = 2.0;

// =============================================================================
// SPECIAL MOVES
// =============================================================================

/// Ninja attack: forward blink distance
pub const NINJA_ATTACK_BLINK: f64 = 20.0;

/// Ninja special: dash distance
pub const NINJA_DASH_DISTANCE: f64 = 150.0;

/// Ninja special: invulnerability (seconds)
pub const NINJA_DASH_INVULNERABILITY: f64 = 0.5;

/// Warrior special: charge velocity
pub const WARRIOR_CHARGE_SPEED: f64 = 300.0;

/// Warrior special: damage multiplier
pub const WARRIOR_CHARGE_DAMAGE_MULT: f64 = 2.0;

/// Warrior special: buff duration (seconds)
pub const WARRIOR_CHARGE_DURATION: f64 = 0.5;

/// Robot special: defense multiplier
pub const ROBOT_SHIELD_DEFENSE_MULT: f64 = 3.0;

/// Robot special: shield duration (seconds)
pub const ROBOT_SHIELD_DURATION: f64 = 2.0;

/// Shoryuken: launch strength relative to jump power
pub const UPPERCUT_LAUNCH_FACTOR: f64 = 1.1;

/// Teleport combo: backward distance
pub const TELEPORT_DISTANCE: f64 = 120.0;

// =============================================================================
// PROJECTILES
// =============================================================================

/// Projectile horizontal speed
pub const PROJECTILE_SPEED: f64 = 400.0;

/// Projectile square size
pub const PROJECTILE_SIZE: f64 = 20.0;

/// Projectile lifetime (seconds)
pub const PROJECTILE_LIFETIME: f64 = 2.0;

// =============================================================================
// COMBOS
// =============================================================================

/// Inputs older than this are pruned from the buffer (ms)
pub const COMBO_BUFFER_MS: f64 = 1000.0;

/// Maximum gap between consecutive combo inputs (ms)
pub const COMBO_INPUT_WINDOW_MS: f64 = 500.0;

// =============================================================================
// ROUNDS
// =============================================================================

/// Round length (seconds)
pub const ROUND_TIME: f64 = 99.0;

/// Round wins needed to take the match
pub const ROUNDS_TO_WIN: u32 = 3;

/// Pause between rounds (seconds)
pub const ROUND_RESTART_DELAY: f64 = 3.0;

/// Player 1 spawn
pub const SPAWN_P1: (f64, f64) = (200.0, 300.0);

/// Player 2 spawn
pub const SPAWN_P2: (f64, f64) = (800.0, 300.0);
