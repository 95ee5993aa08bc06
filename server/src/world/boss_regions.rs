//! Boss region bookkeeping.
//!
//! Each region owns at most one boss, live or pending. A region walks
//! `Unoccupied -> Spawning -> Alive -> RespawnCountdown -> Unoccupied` and
//! every spawn attempt is checked against that slot first. Entity
//! construction itself stays in [`super::GameWorld`], so initial spawns and
//! respawns share one code path.

use std::collections::BTreeMap;
use std::path::Path;

use log::{debug, info, warn};
use serde::Deserialize;
use thiserror::Error;
use warden_shared::{EntityHandle, HostileFamily, HostileTemplate};

use crate::config::{read_json, ConfigError};
use crate::navigation::Vec2;

/// One boss region as configured on disk
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BossRegionConfig {
    pub id: String,
    pub spawn: [f32; 2],
    pub template: HostileTemplate,
}

impl BossRegionConfig {
    pub fn new(id: &str, spawn: Vec2, template: HostileTemplate) -> Self {
        Self {
            id: id.to_string(),
            spawn: spawn.to_array(),
            template,
        }
    }

    /// Load a list of regions from a JSON array
    pub fn load_from_json(path: impl AsRef<Path>) -> Result<Vec<Self>, ConfigError> {
        let path = path.as_ref();
        let regions: Vec<BossRegionConfig> = read_json(path)?;
        for region in &regions {
            if region.id.is_empty() {
                return Err(ConfigError::Invalid {
                    field: "id",
                    reason: "boss region id must not be empty".to_string(),
                });
            }
            if region.template.family != HostileFamily::Boss {
                warn!(
                    "[CONFIG] Region {} template {} is not a boss, treating it as one",
                    region.id, region.template.name
                );
            }
        }
        info!("[CONFIG] Loaded {} boss regions from {}", regions.len(), path.display());
        Ok(regions)
    }

    pub fn spawn_position(&self) -> Vec2 {
        Vec2::from(self.spawn)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegionSlot {
    Unoccupied,
    Spawning,
    Alive(EntityHandle),
    RespawnCountdown {
        remaining: f32,
        /// Body left in the world until the countdown ends
        corpse: Option<EntityHandle>,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum SpawnRejected {
    #[error("unknown boss region {0}")]
    UnknownRegion(String),

    #[error("region {region} already has a live boss")]
    AlreadyAlive { region: String },

    #[error("region {region} is already spawning a boss")]
    AlreadySpawning { region: String },

    #[error("region {region} respawns its boss in {remaining:.1}s")]
    RespawnPending { region: String, remaining: f32 },
}

#[derive(Debug)]
struct BossRegion {
    config: BossRegionConfig,
    slot: RegionSlot,
}

/// A region whose countdown finished this tick
#[derive(Debug, Clone, PartialEq)]
pub struct RespawnDue {
    pub region: String,
    pub corpse: Option<EntityHandle>,
}

#[derive(Debug, Default)]
pub struct BossLifecycle {
    regions: BTreeMap<String, BossRegion>,
}

impl BossLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_configs(configs: impl IntoIterator<Item = BossRegionConfig>) -> Self {
        let mut lifecycle = Self::new();
        for config in configs {
            lifecycle.add_region(config);
        }
        lifecycle
    }

    /// Register a region. Re-adding an id replaces its config but keeps its slot.
    pub fn add_region(&mut self, mut config: BossRegionConfig) {
        config.template.family = HostileFamily::Boss;
        match self.regions.get_mut(&config.id) {
            Some(region) => {
                debug!("[BOSS] Replacing config for region {}", config.id);
                region.config = config;
            }
            None => {
                info!("[BOSS] Registered region {} ({})", config.id, config.template.name);
                self.regions.insert(
                    config.id.clone(),
                    BossRegion {
                        config,
                        slot: RegionSlot::Unoccupied,
                    },
                );
            }
        }
    }

    pub fn region_ids(&self) -> Vec<String> {
        self.regions.keys().cloned().collect()
    }

    pub fn config(&self, region: &str) -> Option<&BossRegionConfig> {
        self.regions.get(region).map(|r| &r.config)
    }

    pub fn slot(&self, region: &str) -> Option<RegionSlot> {
        self.regions.get(region).map(|r| r.slot)
    }

    /// Claim the region for a new boss. Only an unoccupied region can be claimed.
    pub fn begin_spawn(&mut self, region: &str) -> Result<BossRegionConfig, SpawnRejected> {
        let entry = self
            .regions
            .get_mut(region)
            .ok_or_else(|| SpawnRejected::UnknownRegion(region.to_string()))?;

        match entry.slot {
            RegionSlot::Unoccupied => {
                entry.slot = RegionSlot::Spawning;
                Ok(entry.config.clone())
            }
            RegionSlot::Spawning => Err(SpawnRejected::AlreadySpawning {
                region: region.to_string(),
            }),
            RegionSlot::Alive(_) => Err(SpawnRejected::AlreadyAlive {
                region: region.to_string(),
            }),
            RegionSlot::RespawnCountdown { remaining, .. } => Err(SpawnRejected::RespawnPending {
                region: region.to_string(),
                remaining,
            }),
        }
    }

    /// Finish a claim started by [`begin_spawn`](Self::begin_spawn)
    pub fn confirm_spawn(&mut self, region: &str, handle: EntityHandle) {
        match self.regions.get_mut(region) {
            Some(entry) if entry.slot == RegionSlot::Spawning => {
                entry.slot = RegionSlot::Alive(handle);
                info!("[BOSS] {} is up in region {} as {}", entry.config.template.name, region, handle);
            }
            Some(entry) => warn!("[BOSS] Ignoring spawn confirmation for {} in state {:?}", region, entry.slot),
            None => warn!("[BOSS] Spawn confirmation for unknown region {}", region),
        }
    }

    /// Start the respawn countdown for the region owning `handle`.
    /// Returns the region id, or `None` if the handle is not a tracked boss.
    pub fn on_boss_death(&mut self, handle: EntityHandle, respawn_secs: f32) -> Option<String> {
        let (id, entry) = self
            .regions
            .iter_mut()
            .find(|(_, r)| r.slot == RegionSlot::Alive(handle))?;

        let remaining = respawn_secs.max(0.0);
        entry.slot = RegionSlot::RespawnCountdown {
            remaining,
            corpse: Some(handle),
        };
        info!(
            "[BOSS] {} in region {} died, respawning in {:.0}s",
            entry.config.template.name, id, remaining
        );
        Some(id.clone())
    }

    /// Forget a boss that left the world without dying. The region becomes free.
    pub fn release(&mut self, handle: EntityHandle) -> Option<String> {
        let (id, entry) = self.regions.iter_mut().find(|(_, r)| match r.slot {
            RegionSlot::Alive(h) => h == handle,
            RegionSlot::RespawnCountdown { corpse, .. } => corpse == Some(handle),
            _ => false,
        })?;

        entry.slot = match entry.slot {
            RegionSlot::RespawnCountdown { remaining, .. } => RegionSlot::RespawnCountdown {
                remaining,
                corpse: None,
            },
            _ => RegionSlot::Unoccupied,
        };
        debug!("[BOSS] Released {} from region {}", handle, id);
        Some(id.clone())
    }

    /// Count down every pending respawn. Regions that reach zero are freed
    /// and returned so the caller can clear the corpse and spawn again.
    pub fn update(&mut self, dt: f32) -> Vec<RespawnDue> {
        let mut due = Vec::new();
        for (id, entry) in self.regions.iter_mut() {
            if let RegionSlot::RespawnCountdown { remaining, corpse } = entry.slot {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    entry.slot = RegionSlot::Unoccupied;
                    due.push(RespawnDue {
                        region: id.clone(),
                        corpse,
                    });
                } else {
                    entry.slot = RegionSlot::RespawnCountdown { remaining, corpse };
                }
            }
        }
        due
    }

    pub fn is_boss_alive(&self, region: &str) -> bool {
        matches!(self.slot(region), Some(RegionSlot::Alive(_)))
    }

    pub fn boss(&self, region: &str) -> Option<EntityHandle> {
        match self.slot(region)? {
            RegionSlot::Alive(handle) => Some(handle),
            _ => None,
        }
    }

    /// Seconds until the region's boss returns, if a countdown is running
    pub fn respawn_remaining(&self, region: &str) -> Option<f32> {
        match self.slot(region)? {
            RegionSlot::RespawnCountdown { remaining, .. } => Some(remaining),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    fn lifecycle() -> BossLifecycle {
        let template = HostileTemplate {
            respawn_secs: 10.0,
            ..HostileTemplate::new("Tyrant", HostileFamily::Boss)
        };
        BossLifecycle::from_configs([BossRegionConfig::new("swamp", Vec2::new(100.0, 100.0), template)])
    }

    #[test]
    fn test_spawn_claims_region_once() {
        let mut bosses = lifecycle();
        let config = bosses.begin_spawn("swamp").unwrap();
        assert_eq!(config.template.name, "Tyrant");
        assert_eq!(
            bosses.begin_spawn("swamp"),
            Err(SpawnRejected::AlreadySpawning {
                region: "swamp".to_string()
            })
        );

        let handle = EntityHandle::new(3, 0);
        bosses.confirm_spawn("swamp", handle);
        assert!(bosses.is_boss_alive("swamp"));
        assert_eq!(bosses.boss("swamp"), Some(handle));
        assert!(matches!(bosses.begin_spawn("swamp"), Err(SpawnRejected::AlreadyAlive { .. })));
    }

    #[test]
    fn test_unknown_region_rejected() {
        let mut bosses = lifecycle();
        assert_eq!(
            bosses.begin_spawn("desert"),
            Err(SpawnRejected::UnknownRegion("desert".to_string()))
        );
    }

    #[test]
    fn test_death_starts_countdown_and_blocks_spawn() {
        let mut bosses = lifecycle();
        bosses.begin_spawn("swamp").unwrap();
        let handle = EntityHandle::new(0, 0);
        bosses.confirm_spawn("swamp", handle);

        assert_eq!(bosses.on_boss_death(handle, 10.0), Some("swamp".to_string()));
        assert!(!bosses.is_boss_alive("swamp"));
        assert_relative_eq!(bosses.respawn_remaining("swamp").unwrap(), 10.0);

        assert!(bosses.update(4.0).is_empty());
        match bosses.begin_spawn("swamp") {
            Err(SpawnRejected::RespawnPending { remaining, .. }) => assert_relative_eq!(remaining, 6.0),
            other => panic!("expected pending respawn, got {:?}", other),
        }

        let due = bosses.update(6.0);
        assert_eq!(
            due,
            vec![RespawnDue {
                region: "swamp".to_string(),
                corpse: Some(handle),
            }]
        );
        assert_eq!(bosses.slot("swamp"), Some(RegionSlot::Unoccupied));
        assert!(bosses.begin_spawn("swamp").is_ok());
    }

    #[test]
    fn test_death_of_untracked_entity_ignored() {
        let mut bosses = lifecycle();
        assert_eq!(bosses.on_boss_death(EntityHandle::new(9, 9), 5.0), None);
        assert_eq!(bosses.slot("swamp"), Some(RegionSlot::Unoccupied));
    }

    #[test]
    fn test_release_frees_region() {
        let mut bosses = lifecycle();
        bosses.begin_spawn("swamp").unwrap();
        let handle = EntityHandle::new(1, 2);
        bosses.confirm_spawn("swamp", handle);

        assert_eq!(bosses.release(handle), Some("swamp".to_string()));
        assert_eq!(bosses.slot("swamp"), Some(RegionSlot::Unoccupied));
    }

    #[test]
    fn test_load_from_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": "crags", "spawn": [500.0, 250.0],
                 "template": {{"name": "Magma Rex", "max_health": 2000.0, "respawn_secs": 120.0}}}}]"#
        )
        .unwrap();

        let configs = BossRegionConfig::load_from_json(file.path()).unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].spawn_position(), Vec2::new(500.0, 250.0));

        let bosses = BossLifecycle::from_configs(configs);
        assert_eq!(bosses.region_ids(), vec!["crags".to_string()]);
        let config = bosses.config("crags").unwrap();
        assert_eq!(config.template.family, HostileFamily::Boss);
        assert_relative_eq!(config.template.max_health, 2000.0);
    }

    #[test]
    fn test_load_rejects_empty_id() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"id": "", "spawn": [0.0, 0.0], "template": {{}}}}]"#).unwrap();
        assert!(matches!(
            BossRegionConfig::load_from_json(file.path()),
            Err(ConfigError::Invalid { field: "id", .. })
        ));
    }
}
