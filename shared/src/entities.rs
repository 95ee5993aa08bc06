//! Shared hostile definitions.

use serde::{Deserialize, Serialize};

/// Behavior family of a hostile, fixed when the entity is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HostileFamily {
    #[default]
    Enemy,
    Boss,
    /// Passive roamer that never engages
    Wanderer,
}

impl HostileFamily {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Enemy => "enemy",
            Self::Boss => "boss",
            Self::Wanderer => "wanderer",
        }
    }
}

/// How an entity's movement reaches the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MovementMode {
    /// Steps are written straight into the entity position
    #[default]
    Direct,
    /// Steps are emitted as move requests; a collaborator applies them
    Gated,
}

/// Stat template for a hostile type, already merged with any per-instance
/// overrides by whoever loads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostileTemplate {
    pub name: String,
    pub family: HostileFamily,
    pub max_health: f32,
    pub defense: f32,
    pub speed: f32,
    pub damage: f32,
    /// Attacks per second
    pub attack_rate: f32,
    pub attack_range: f32,
    pub aggro_range: f32,
    pub leash_distance: f32,
    pub patrol_radius: f32,
    pub group_id: Option<u32>,
    pub pack_aggro: bool,
    pub threat_level: u8,
    /// Probability in [0, 1] that a spawned instance is elite
    pub elite_chance: f32,
    pub elite_multiplier: f32,
    pub respawn_secs: f32,
    pub movement: MovementMode,
    pub abilities: Vec<String>,
    /// Roaming area for wanderers as `[min_x, min_y, max_x, max_y]`
    pub bounds: Option<[f32; 4]>,
}

impl Default for HostileTemplate {
    fn default() -> Self {
        Self {
            name: "Hostile".to_string(),
            family: HostileFamily::Enemy,
            max_health: 100.0,
            defense: 0.0,
            speed: 50.0,
            damage: 10.0,
            attack_rate: 1.0,
            attack_range: 50.0,
            aggro_range: 200.0,
            leash_distance: 500.0,
            patrol_radius: 150.0,
            group_id: None,
            pack_aggro: true,
            threat_level: 1,
            elite_chance: 0.0,
            elite_multiplier: 2.0,
            respawn_secs: 30.0,
            movement: MovementMode::Direct,
            abilities: Vec::new(),
            bounds: None,
        }
    }
}

impl HostileTemplate {
    pub fn new(name: &str, family: HostileFamily) -> Self {
        Self {
            name: name.to_string(),
            family,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_partial_json_uses_defaults() {
        let json = r#"{ "name": "Raptor", "family": "wanderer", "speed": 80.0 }"#;
        let template: HostileTemplate = serde_json::from_str(json).unwrap();
        assert_eq!(template.family, HostileFamily::Wanderer);
        assert_eq!(template.speed, 80.0);
        assert_eq!(template.max_health, 100.0);
        assert_eq!(template.movement, MovementMode::Direct);
    }
}
