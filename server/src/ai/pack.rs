//! Group aggro: one member's aggro pulls in idle group mates nearby.

use log::debug;
use warden_shared::{AiState, EntityHandle, EventSink, HostileFamily, SimEvent};

use crate::entities::{Actor, EntityStore};

/// Put every idle, pack-enabled group mate within `radius` of `source` into
/// CHASE against `target`. Alerted members do not alert further, and
/// wanderers never join.
///
/// Returns the number of members pulled in.
pub fn alert_pack(
    store: &mut EntityStore,
    source: EntityHandle,
    target: EntityHandle,
    radius: f32,
    events: &mut dyn EventSink,
) -> usize {
    let Some(origin) = store.get(source).and_then(Actor::as_hostile) else {
        return 0;
    };
    let Some(group) = origin.group_id else {
        return 0;
    };
    let origin_position = origin.position;

    let members: Vec<EntityHandle> = store
        .iter()
        .filter_map(|(handle, actor)| {
            let member = actor.as_hostile()?;
            let eligible = handle != source
                && handle != target
                && member.alive
                && member.family != HostileFamily::Wanderer
                && member.group_id == Some(group)
                && member.pack_aggro
                && member.behavior.state() == AiState::Wander
                && member.position.distance_to(origin_position) <= radius;
            eligible.then_some(handle)
        })
        .collect();

    for &member in &members {
        if let Some(entity) = store.get_mut(member).and_then(Actor::as_hostile_mut) {
            entity.behavior.enter_chase(target);
            entity.follower.clear();
            events.emit(SimEvent::PackAlerted { source, member, target });
        }
    }

    if !members.is_empty() {
        debug!(
            "[PACK] {} pulled {} members of group {} onto {}",
            source,
            members.len(),
            group,
            target
        );
    }
    members.len()
}
