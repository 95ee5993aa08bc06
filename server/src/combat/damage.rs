//! Single choke point for applying damage to anything in the simulation.

use log::{debug, info};
use warden_shared::{DamageKind, EntityHandle, EventSink, SimEvent};

use crate::entities::{Actor, EntityStore, Health, HostileEntity, PlayerEntity};
use crate::navigation::Vec2;

/// Damage left after defense. Any positive hit deals at least 1.
pub fn mitigate(amount: f32, defense: f32) -> f32 {
    if amount <= 0.0 {
        return 0.0;
    }
    (amount - defense.max(0.0)).max(1.0)
}

/// What a hit did to its target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageReport {
    pub dealt: f32,
    pub remaining: f32,
    pub killed: bool,
}

/// Something that can take damage.
///
/// Targets expose their health in one of three ways, tried in order: a
/// dedicated [`Health`] record, a plain health field, or their own damage
/// routine. A target offering none of them is left untouched.
pub trait Damageable {
    fn defense(&self) -> f32 {
        0.0
    }

    fn is_dead(&self) -> bool;

    fn position(&self) -> Vec2;

    fn health_record(&mut self) -> Option<&mut Health> {
        None
    }

    fn health_field(&mut self) -> Option<&mut f32> {
        None
    }

    /// Target-specific damage handling, given already-mitigated damage
    fn take_damage(&mut self, _amount: f32, _source: Option<EntityHandle>) -> Option<DamageReport> {
        None
    }

    /// Called once health has reached zero
    fn mark_dead(&mut self);
}

impl Damageable for HostileEntity {
    fn defense(&self) -> f32 {
        self.defense
    }

    fn is_dead(&self) -> bool {
        !self.alive
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn health_record(&mut self) -> Option<&mut Health> {
        Some(&mut self.health)
    }

    fn mark_dead(&mut self) {
        self.kill();
    }
}

impl Damageable for PlayerEntity {
    fn defense(&self) -> f32 {
        self.defense
    }

    fn is_dead(&self) -> bool {
        PlayerEntity::is_dead(self)
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn health_field(&mut self) -> Option<&mut f32> {
        Some(&mut self.health)
    }

    fn mark_dead(&mut self) {
        self.alive = false;
    }
}

impl Damageable for Actor {
    fn defense(&self) -> f32 {
        match self {
            Actor::Hostile(h) => Damageable::defense(h),
            Actor::Player(p) => Damageable::defense(p),
        }
    }

    fn is_dead(&self) -> bool {
        match self {
            Actor::Hostile(h) => Damageable::is_dead(h),
            Actor::Player(p) => Damageable::is_dead(p),
        }
    }

    fn position(&self) -> Vec2 {
        Actor::position(self)
    }

    fn health_record(&mut self) -> Option<&mut Health> {
        match self {
            Actor::Hostile(h) => h.health_record(),
            Actor::Player(p) => p.health_record(),
        }
    }

    fn health_field(&mut self) -> Option<&mut f32> {
        match self {
            Actor::Hostile(h) => h.health_field(),
            Actor::Player(p) => p.health_field(),
        }
    }

    fn take_damage(&mut self, amount: f32, source: Option<EntityHandle>) -> Option<DamageReport> {
        match self {
            Actor::Hostile(h) => h.take_damage(amount, source),
            Actor::Player(p) => p.take_damage(amount, source),
        }
    }

    fn mark_dead(&mut self) {
        match self {
            Actor::Hostile(h) => h.mark_dead(),
            Actor::Player(p) => p.mark_dead(),
        }
    }
}

/// Apply `amount` to `target`, emitting the damage event and, on a killing
/// blow, the death event carrying `source` as killer.
///
/// Dead targets and non-positive amounts are ignored.
pub fn apply_to<T: Damageable + ?Sized>(
    target: &mut T,
    handle: EntityHandle,
    amount: f32,
    source: Option<EntityHandle>,
    kind: DamageKind,
    events: &mut dyn EventSink,
) -> Option<DamageReport> {
    if target.is_dead() || amount <= 0.0 {
        return None;
    }
    let dealt = mitigate(amount, target.defense());

    let report = if let Some(health) = target.health_record() {
        health.current = (health.current - dealt).max(0.0);
        DamageReport {
            dealt,
            remaining: health.current,
            killed: health.current <= 0.0,
        }
    } else if let Some(health) = target.health_field() {
        *health = (*health - dealt).max(0.0);
        DamageReport {
            dealt,
            remaining: *health,
            killed: *health <= 0.0,
        }
    } else if let Some(report) = target.take_damage(dealt, source) {
        report
    } else {
        debug!("[COMBAT] {} has no way to take damage, ignoring hit", handle);
        return None;
    };

    events.emit(SimEvent::Damaged {
        target: handle,
        source,
        amount: report.dealt,
        kind,
        remaining: report.remaining,
    });

    if report.killed {
        target.mark_dead();
        info!("[COMBAT] {} killed by {:?}", handle, source);
        events.emit(SimEvent::Killed {
            entity: handle,
            killer: source,
            position: target.position().to_array(),
        });
    }
    Some(report)
}

/// Resolve `target` in the store and apply damage to it. Stale handles are a no-op.
pub fn apply_damage(
    store: &mut EntityStore,
    target: EntityHandle,
    amount: f32,
    source: Option<EntityHandle>,
    kind: DamageKind,
    events: &mut dyn EventSink,
) -> Option<DamageReport> {
    let actor = store.get_mut(target)?;
    apply_to(actor, target, amount, source, kind, events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// A destructible that keeps its own hit counter instead of health
    struct Barricade {
        hits_left: u32,
        broken: bool,
    }

    impl Damageable for Barricade {
        fn is_dead(&self) -> bool {
            self.broken
        }

        fn position(&self) -> Vec2 {
            Vec2::new(1.0, 2.0)
        }

        fn take_damage(&mut self, _amount: f32, _source: Option<EntityHandle>) -> Option<DamageReport> {
            self.hits_left = self.hits_left.saturating_sub(1);
            Some(DamageReport {
                dealt: 1.0,
                remaining: self.hits_left as f32,
                killed: self.hits_left == 0,
            })
        }

        fn mark_dead(&mut self) {
            self.broken = true;
        }
    }

    /// Scenery with no health at all
    struct Rock;

    impl Damageable for Rock {
        fn is_dead(&self) -> bool {
            false
        }

        fn position(&self) -> Vec2 {
            Vec2::ZERO
        }

        fn mark_dead(&mut self) {}
    }

    fn handle(index: u32) -> EntityHandle {
        EntityHandle::new(index, 0)
    }

    #[rstest]
    #[case(5.0, 3.0, 2.0)]
    #[case(5.0, 10.0, 1.0)]
    #[case(20.0, 0.0, 20.0)]
    #[case(0.0, 0.0, 0.0)]
    fn test_mitigation(#[case] amount: f32, #[case] defense: f32, #[case] expected: f32) {
        assert_eq!(mitigate(amount, defense), expected);
    }

    #[test]
    fn test_health_field_target() {
        let mut player = PlayerEntity::new("p", Vec2::ZERO).with_defense(3.0);
        let mut events: Vec<SimEvent> = Vec::new();

        let report = apply_to(&mut player, handle(1), 5.0, Some(handle(2)), DamageKind::Physical, &mut events).unwrap();

        assert_eq!(report.dealt, 2.0);
        assert_eq!(player.health, 98.0);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            SimEvent::Damaged { amount, remaining, .. } if amount == 2.0 && remaining == 98.0
        ));
    }

    #[test]
    fn test_killing_blow_emits_death_with_killer() {
        let mut player = PlayerEntity::new("p", Vec2::new(3.0, 4.0));
        player.health = 5.0;
        let mut events: Vec<SimEvent> = Vec::new();

        let report = apply_to(&mut player, handle(1), 50.0, Some(handle(9)), DamageKind::Ability, &mut events).unwrap();

        assert!(report.killed);
        assert!(player.is_dead());
        assert_eq!(
            events.last(),
            Some(&SimEvent::Killed {
                entity: handle(1),
                killer: Some(handle(9)),
                position: [3.0, 4.0],
            })
        );

        // Further hits on the dead are ignored
        assert!(apply_to(&mut player, handle(1), 50.0, None, DamageKind::Physical, &mut events).is_none());
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_delegated_target() {
        let mut barricade = Barricade {
            hits_left: 2,
            broken: false,
        };
        let mut events: Vec<SimEvent> = Vec::new();

        let first = apply_to(&mut barricade, handle(4), 100.0, None, DamageKind::Physical, &mut events).unwrap();
        assert!(!first.killed);
        let second = apply_to(&mut barricade, handle(4), 100.0, None, DamageKind::Physical, &mut events).unwrap();
        assert!(second.killed);
        assert!(barricade.broken);
        assert_eq!(events.iter().filter(|e| matches!(e, SimEvent::Killed { .. })).count(), 1);
    }

    #[test]
    fn test_target_without_health_is_noop() {
        let mut events: Vec<SimEvent> = Vec::new();
        assert!(apply_to(&mut Rock, handle(0), 10.0, None, DamageKind::Environment, &mut events).is_none());
        assert!(events.is_empty());
    }

    #[test]
    fn test_stale_handle_is_noop() {
        let mut store = EntityStore::new();
        let h = store.insert(Actor::Player(PlayerEntity::new("p", Vec2::ZERO)));
        store.remove(h);
        let mut events: Vec<SimEvent> = Vec::new();
        assert!(apply_damage(&mut store, h, 10.0, None, DamageKind::Physical, &mut events).is_none());
        assert!(events.is_empty());
    }
}
