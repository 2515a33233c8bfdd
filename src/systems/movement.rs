use bevy_ecs::prelude::*;
use log::warn;

use crate::components::oscillator::Oscillator;
use crate::components::transformhandle::TransformHandle;
use crate::resources::transformtree::{TransformError, TransformTree};
use crate::resources::worldtime::WorldTime;

fn step_oscillator(
    tree: &mut TransformTree,
    handle: &TransformHandle,
    osc: &Oscillator,
    time: &WorldTime,
) -> Result<(), TransformError> {
    let position = osc.position_at(time.elapsed);
    tree.set_position(handle.id, position.x, position.y)?;
    if osc.spin_degrees_per_second != 0.0 {
        let rotation = tree.rotation(handle.id)?;
        tree.set_rotation(handle.id, rotation + osc.spin_degrees_per_second * time.delta)?;
    }
    Ok(())
}

/// Drive oscillating entities' local position and rotation from world time.
pub fn oscillate_system(
    query: Query<(Entity, &TransformHandle, &Oscillator)>,
    mut tree: ResMut<TransformTree>,
    time: Res<WorldTime>,
) {
    for (entity, handle, osc) in query.iter() {
        if let Err(e) = step_oscillator(&mut tree, handle, osc, &time) {
            warn!("Cannot move {}: {}", entity, e);
        }
    }
}
