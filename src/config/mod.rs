//! Configuration
//!
//! Tuning for every simulation subsystem. All sections default to the
//! values in [`crate::core::constants`]; a JSON file may override any
//! subset of fields.

pub mod settings;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};

use crate::core::constants::*;
use crate::core::rect::Rect;
use crate::core::vec2::Vec2;

pub use settings::{Settings, SettingsError};

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV_VAR: &str = "JUMP_STARS_CONFIG";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("Failed to read config {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for [`GameConfig`].
    #[error("Invalid config format: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is outside its allowed range.
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Horizontal wrap and vertical fall-out limits.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    /// Left edge
    pub left: f64,
    /// Right edge
    pub right: f64,
    /// Top edge
    pub top: f64,
    /// Bottom edge
    pub bottom: f64,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            left: WORLD_LEFT,
            right: WORLD_RIGHT,
            top: WORLD_TOP,
            bottom: WORLD_BOTTOM,
        }
    }
}

/// Physics world tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Downward acceleration while airborne
    pub gravity: f64,
    /// Horizontal decay applied every frame
    pub air_resistance: f64,
    /// Extra horizontal decay applied while grounded
    pub ground_friction: f64,
    /// Terminal fall speed
    pub max_fall_speed: f64,
    /// World limits
    pub bounds: WorldBounds,
    /// Damage for falling past the bottom
    pub fall_damage: f64,
    /// Respawn height after a fall-out
    pub respawn_y: f64,
    /// Impulse pushing overlapping combatants apart
    pub separation_force: f64,
    /// Static platforms
    pub platforms: Vec<Rect>,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            air_resistance: AIR_RESISTANCE,
            ground_friction: GROUND_FRICTION,
            max_fall_speed: MAX_FALL_SPEED,
            bounds: WorldBounds::default(),
            fall_damage: FALL_DAMAGE,
            respawn_y: RESPAWN_Y,
            separation_force: SEPARATION_FORCE,
            platforms: STAGE_PLATFORMS
                .iter()
                .map(|&(x, y, w, h)| Rect::new(x, y, w, h))
                .collect(),
        }
    }
}

/// Combatant action and damage tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Attack active window
    pub attack_duration: f64,
    /// Cooldown after starting an attack
    pub attack_cooldown: f64,
    /// Invulnerability after a registered hit
    pub invulnerability_duration: f64,
    /// Knockback impulse on hit
    pub knockback_force: f64,
    /// Double jump strength relative to jump power
    pub double_jump_factor: f64,
    /// Attack box reach
    pub attack_range: f64,
    /// Attack box height
    pub attack_height: f64,
    /// Attack box offset from the top of the hitbox
    pub attack_offset_y: f64,
    /// Damage floor for a registered hit
    pub min_damage: f64,
    /// Cooldown between special moves
    pub special_cooldown: f64,
    /// Projectile speed
    pub projectile_speed: f64,
    /// Projectile square size
    pub projectile_size: f64,
    /// Projectile lifetime
    pub projectile_lifetime: f64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            attack_duration: ATTACK_DURATION,
            attack_cooldown: ATTACK_COOLDOWN,
            invulnerability_duration: INVULNERABILITY_DURATION,
            knockback_force: KNOCKBACK_FORCE,
            double_jump_factor: DOUBLE_JUMP_FACTOR,
            attack_range: ATTACK_RANGE,
            attack_height: ATTACK_HEIGHT,
            attack_offset_y: ATTACK_OFFSET_Y,
            min_damage: MIN_DAMAGE,
            special_cooldown: SPECIAL_COOLDOWN,
            projectile_speed: PROJECTILE_SPEED,
            projectile_size: PROJECTILE_SIZE,
            projectile_lifetime: PROJECTILE_LIFETIME,
        }
    }
}

/// Combo recognizer timing (milliseconds).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComboConfig {
    /// Entries older than this are pruned
    pub buffer_window_ms: f64,
    /// Maximum gap between consecutive inputs of a combo
    pub input_window_ms: f64,
}

impl Default for ComboConfig {
    fn default() -> Self {
        Self {
            buffer_window_ms: COMBO_BUFFER_MS,
            input_window_ms: COMBO_INPUT_WINDOW_MS,
        }
    }
}

/// Round lifecycle tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundConfig {
    /// Round length in seconds
    pub round_time: f64,
    /// Round wins needed to take the match
    pub rounds_to_win: u32,
    /// Delay before the next round starts
    pub restart_delay: f64,
    /// Spawn points for player 1 and player 2
    pub spawn_points: [Vec2; 2],
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            round_time: ROUND_TIME,
            rounds_to_win: ROUNDS_TO_WIN,
            restart_delay: ROUND_RESTART_DELAY,
            spawn_points: [
                Vec2::new(SPAWN_P1.0, SPAWN_P1.1),
                Vec2::new(SPAWN_P2.0, SPAWN_P2.1),
            ],
        }
    }
}

/// Complete simulation configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Delta-time cap per frame (seconds)
    pub max_frame_dt: f64,
    /// Physics world
    pub physics: PhysicsConfig,
    /// Combatant actions
    pub combat: CombatConfig,
    /// Combo recognizer
    pub combo: ComboConfig,
    /// Rounds and scoring
    pub round: RoundConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_frame_dt: MAX_FRAME_DT,
            physics: PhysicsConfig::default(),
            combat: CombatConfig::default(),
            combo: ComboConfig::default(),
            round: RoundConfig::default(),
        }
    }
}

impl GameConfig {
    /// Parse and validate a JSON document. Missing fields keep defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Load the file named by `JUMP_STARS_CONFIG`, or defaults if unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.is_empty() => Self::from_file(path),
            _ => Ok(Self::default()),
        }
    }

    /// Reject values that would break the simulation's invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_positive(self.max_frame_dt) {
            return Err(ConfigError::Invalid("max_frame_dt must be positive".into()));
        }
        let physics = &self.physics;
        if !is_unit_factor(physics.air_resistance) {
            return Err(ConfigError::Invalid("physics.air_resistance must be in (0, 1]".into()));
        }
        if !is_unit_factor(physics.ground_friction) {
            return Err(ConfigError::Invalid("physics.ground_friction must be in (0, 1]".into()));
        }
        if physics.bounds.right <= physics.bounds.left || physics.bounds.bottom <= physics.bounds.top {
            return Err(ConfigError::Invalid("physics.bounds are empty".into()));
        }
        if self.round.rounds_to_win == 0 {
            return Err(ConfigError::Invalid("round.rounds_to_win must be at least 1".into()));
        }
        if !is_positive(self.round.round_time) {
            return Err(ConfigError::Invalid("round.round_time must be positive".into()));
        }
        if self.combo.input_window_ms < 0.0 || self.combo.buffer_window_ms <= 0.0 {
            return Err(ConfigError::Invalid("combo windows must be positive".into()));
        }
        Ok(())
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn is_unit_factor(value: f64) -> bool {
    is_positive(value) && value <= 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.physics.platforms.len(), STAGE_PLATFORMS.len());
        assert_eq!(config.round.rounds_to_win, 3);
        assert_eq!(config.max_frame_dt, 0.016);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = GameConfig::from_json_str(r#"{ "round": { "rounds_to_win": 5 } }"#).unwrap();
        assert_eq!(config.round.rounds_to_win, 5);
        assert_eq!(config.round.round_time, ROUND_TIME);
        assert_eq!(config.physics.gravity, GRAVITY);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let result = GameConfig::from_json_str(r#"{ "round": { "rounds_to_win": 0 } }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let result = GameConfig::from_json_str(r#"{ "physics": { "air_resistance": 1.5 } }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let result = GameConfig::from_json_str("{ not json");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let path = env::temp_dir().join("jump-stars-missing-config.json");
        let _ = fs::remove_file(&path);
        assert!(matches!(GameConfig::from_file(&path), Err(ConfigError::Io { .. })));
    }
}
