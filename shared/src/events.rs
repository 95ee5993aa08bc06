//! Event definitions raised by the simulation core for its observers.

use serde::{Deserialize, Serialize};

use crate::EntityHandle;

/// Simulation tick rate in Hz
pub const SIM_TICK_RATE: u32 = 20;

// =============================================================================
// Behavior States
// =============================================================================

/// Behavior state of a hostile entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AiState {
    #[default]
    Wander,
    Chase,
    Attack,
    LeashReturn,
}

impl AiState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Wander => "WANDER",
            Self::Chase => "CHASE",
            Self::Attack => "ATTACK",
            Self::LeashReturn => "LEASH_RETURN",
        }
    }

    /// States in which the entity is allowed to hold a target
    pub fn holds_target(&self) -> bool {
        matches!(self, Self::Chase | Self::Attack)
    }
}

impl std::fmt::Display for AiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind of damage being applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DamageKind {
    #[default]
    Physical,
    Ability,
    Environment,
}

// =============================================================================
// Simulation Events
// =============================================================================

/// Everything the core tells the outside world about.
///
/// Events are collected during a tick and handed back to the caller once the
/// tick completes; nothing in the core reacts to its own events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    /// A hostile acquired a target on its own
    AggroStarted {
        entity: EntityHandle,
        target: EntityHandle,
    },

    /// A pack member was pulled into combat by a group mate
    PackAlerted {
        source: EntityHandle,
        member: EntityHandle,
        target: EntityHandle,
    },

    /// A hostile strayed too far from its spawn and gave up its target
    Leashed {
        entity: EntityHandle,
    },

    /// A returning hostile made it back to its spawn point
    ReturnedHome {
        entity: EntityHandle,
    },

    /// A hostile swung at its target; damage is resolved separately
    AttackPerformed {
        attacker: EntityHandle,
        target: EntityHandle,
        damage: f32,
    },

    /// Damage was applied after mitigation
    Damaged {
        target: EntityHandle,
        source: Option<EntityHandle>,
        amount: f32,
        kind: DamageKind,
        remaining: f32,
    },

    /// An entity's health reached zero
    Killed {
        entity: EntityHandle,
        killer: Option<EntityHandle>,
        position: [f32; 2],
    },

    /// A regular hostile came back at its spawn point
    Respawned {
        entity: EntityHandle,
    },

    /// A gated entity asks its movement collaborator to apply a step
    MoveRequested {
        entity: EntityHandle,
        dx: f32,
        dy: f32,
    },

    BossSpawned {
        region: String,
        entity: EntityHandle,
    },

    BossPhaseChanged {
        entity: EntityHandle,
        phase: u8,
        enraged: bool,
    },

    BossAbilityUsed {
        entity: EntityHandle,
        ability: String,
        target: Option<EntityHandle>,
    },
}

impl SimEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AggroStarted { .. } => "aggro_started",
            Self::PackAlerted { .. } => "pack_alerted",
            Self::Leashed { .. } => "leashed",
            Self::ReturnedHome { .. } => "returned_home",
            Self::AttackPerformed { .. } => "attack_performed",
            Self::Damaged { .. } => "damaged",
            Self::Killed { .. } => "killed",
            Self::Respawned { .. } => "respawned",
            Self::MoveRequested { .. } => "move_requested",
            Self::BossSpawned { .. } => "boss_spawned",
            Self::BossPhaseChanged { .. } => "boss_phase_changed",
            Self::BossAbilityUsed { .. } => "boss_ability_used",
        }
    }
}

/// Receiver for simulation events
pub trait EventSink {
    fn emit(&mut self, event: SimEvent);
}

impl EventSink for Vec<SimEvent> {
    fn emit(&mut self, event: SimEvent) {
        self.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_holding_states() {
        assert!(AiState::Chase.holds_target());
        assert!(AiState::Attack.holds_target());
        assert!(!AiState::Wander.holds_target());
        assert!(!AiState::LeashReturn.holds_target());
    }

    #[test]
    fn test_vec_sink_collects_in_order() {
        let mut sink: Vec<SimEvent> = Vec::new();
        let a = EntityHandle::new(0, 0);
        sink.emit(SimEvent::Leashed { entity: a });
        sink.emit(SimEvent::ReturnedHome { entity: a });
        assert_eq!(sink.len(), 2);
        assert_eq!(sink[0].name(), "leashed");
        assert_eq!(sink[1].name(), "returned_home");
    }
}
