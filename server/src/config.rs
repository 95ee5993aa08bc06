//! AI tuning values and JSON loading.
//!
//! Every threshold the behavior layer uses lives in [`AiTuning`]. Missing
//! fields fall back to the defaults below, so a config file only needs to
//! name what it changes.

use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Read and deserialize a JSON file
pub fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Runtime-tunable AI thresholds. Distances are world units, times seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiTuning {
    // Navigation
    pub nav_cell_size: f32,
    pub nav_max_iterations: usize,
    pub nav_cache_ttl_ms: u64,
    pub nav_cache_capacity: usize,
    pub nav_nearest_search_radius: i32,

    // Path following
    pub path_arrival_distance: f32,
    pub waypoint_reached_distance: f32,
    pub path_lead_distance: f32,
    pub path_recalc_interval: f32,
    pub path_target_moved_threshold: f32,
    pub direct_arrival_distance: f32,

    // Behavior
    pub wander_speed_multiplier: f32,
    pub return_speed_multiplier: f32,
    pub wander_interval_min: f32,
    pub wander_interval_max: f32,
    /// Share of the patrol radius a wander point may lie from spawn
    pub wander_patrol_fraction: f32,
    pub attack_range_hysteresis: f32,
    pub leash_arrival_distance: f32,
    pub heal_on_return: bool,
    pub pack_alert_radius: f32,
    pub wanderer_bounds_padding: f32,

    // Bosses
    pub boss_phase2_threshold: f32,
    pub boss_phase3_threshold: f32,
    pub boss_phase2_speed: f32,
    pub boss_phase2_attack_rate: f32,
    pub boss_phase3_speed: f32,
    pub boss_phase3_damage: f32,
    pub boss_ability_chance: f32,
    pub boss_ability_range_factor: f32,
    pub boss_ability_windup: f32,
    pub boss_ability_cooldown: f32,
    pub boss_regen_per_sec: f32,

    // Players
    pub player_attack_stamina_cost: f32,

    // Frame time
    pub nominal_delta: f32,
    pub max_delta: f32,
}

impl Default for AiTuning {
    fn default() -> Self {
        Self {
            nav_cell_size: 32.0,
            nav_max_iterations: 500,
            nav_cache_ttl_ms: 2000,
            nav_cache_capacity: 256,
            nav_nearest_search_radius: 5,

            path_arrival_distance: 20.0,
            waypoint_reached_distance: 30.0,
            path_lead_distance: 50.0,
            path_recalc_interval: 1.0,
            path_target_moved_threshold: 100.0,
            direct_arrival_distance: 10.0,

            wander_speed_multiplier: 0.3,
            return_speed_multiplier: 0.8,
            wander_interval_min: 3.0,
            wander_interval_max: 5.0,
            wander_patrol_fraction: 0.5,
            attack_range_hysteresis: 1.2,
            leash_arrival_distance: 20.0,
            heal_on_return: true,
            pack_alert_radius: 150.0,
            wanderer_bounds_padding: 20.0,

            boss_phase2_threshold: 0.66,
            boss_phase3_threshold: 0.33,
            boss_phase2_speed: 1.2,
            boss_phase2_attack_rate: 1.3,
            boss_phase3_speed: 1.5,
            boss_phase3_damage: 1.5,
            boss_ability_chance: 0.3,
            boss_ability_range_factor: 1.5,
            boss_ability_windup: 1.0,
            boss_ability_cooldown: 5.0,
            boss_regen_per_sec: 100.0,

            player_attack_stamina_cost: 10.0,

            nominal_delta: 1.0 / warden_shared::SIM_TICK_RATE as f32,
            max_delta: 0.25,
        }
    }
}

impl AiTuning {
    /// Load tuning from a JSON file and validate it
    pub fn load_from_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let tuning: AiTuning = read_json(path.as_ref())?;
        tuning.validate()?;
        info!("[CONFIG] Loaded AI tuning from {}", path.as_ref().display());
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: &str) -> ConfigError {
            ConfigError::Invalid {
                field,
                reason: reason.to_string(),
            }
        }

        if !(self.nav_cell_size > 0.0) {
            return Err(invalid("nav_cell_size", "must be positive"));
        }
        if self.nav_max_iterations == 0 {
            return Err(invalid("nav_max_iterations", "must be at least 1"));
        }
        if self.nav_cache_capacity == 0 {
            return Err(invalid("nav_cache_capacity", "must be at least 1"));
        }
        if self.wander_interval_min < 0.0 || self.wander_interval_min > self.wander_interval_max {
            return Err(invalid(
                "wander_interval_min",
                "must be non-negative and not above wander_interval_max",
            ));
        }
        if self.attack_range_hysteresis < 1.0 {
            return Err(invalid("attack_range_hysteresis", "must be at least 1.0"));
        }
        if !(self.boss_phase3_threshold < self.boss_phase2_threshold) {
            return Err(invalid(
                "boss_phase3_threshold",
                "must be below boss_phase2_threshold",
            ));
        }
        if !(0.0..=1.0).contains(&self.boss_ability_chance) {
            return Err(invalid("boss_ability_chance", "must be within [0, 1]"));
        }
        if !(self.nominal_delta > 0.0) || !(self.max_delta >= self.nominal_delta) {
            return Err(invalid(
                "max_delta",
                "nominal_delta must be positive and max_delta at least nominal_delta",
            ));
        }
        Ok(())
    }

    /// Replace unusable frame times with the nominal tick length
    pub fn sanitize_delta(&self, delta: f32) -> f32 {
        if delta.is_finite() && delta > 0.0 && delta <= self.max_delta {
            delta
        } else {
            warn!(
                "[CONFIG] Frame delta {} out of range, using nominal {}",
                delta, self.nominal_delta
            );
            self.nominal_delta
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        assert!(AiTuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "pack_alert_radius": 300.0, "heal_on_return": false }}"#).unwrap();

        let tuning = AiTuning::load_from_json(file.path()).unwrap();
        assert_eq!(tuning.pack_alert_radius, 300.0);
        assert!(!tuning.heal_on_return);
        assert_eq!(tuning.nav_cell_size, 32.0);
        assert_eq!(tuning.nav_max_iterations, 500);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AiTuning::load_from_json(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = AiTuning::load_from_json(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_inverted_wander_interval_rejected() {
        let tuning = AiTuning {
            wander_interval_min: 6.0,
            wander_interval_max: 2.0,
            ..Default::default()
        };
        let err = tuning.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "wander_interval_min", .. }));
    }

    #[test]
    fn test_sanitize_delta() {
        let tuning = AiTuning::default();
        assert_eq!(tuning.sanitize_delta(0.1), 0.1);
        assert_eq!(tuning.sanitize_delta(0.0), tuning.nominal_delta);
        assert_eq!(tuning.sanitize_delta(-1.0), tuning.nominal_delta);
        assert_eq!(tuning.sanitize_delta(f32::NAN), tuning.nominal_delta);
        assert_eq!(tuning.sanitize_delta(5.0), tuning.nominal_delta);
    }
}
