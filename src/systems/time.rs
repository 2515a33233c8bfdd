//! Frame clock system.
//!
//! Advances the shared [`WorldTime`](crate::resources::worldtime::WorldTime)
//! resource once per frame, before the logic schedule runs.
use bevy_ecs::prelude::*;
use log::trace;

use crate::resources::worldtime::WorldTime;

/// Advance elapsed and delta seconds and the frame counter on `WorldTime`.
///
/// `dt` is the unscaled frame delta in seconds; negative values are treated
/// as zero so the clock never runs backwards.
pub fn update_world_time(world: &mut World, dt: f32) {
    let mut wt = world.resource_mut::<WorldTime>();
    let scaled_dt = dt.max(0.0) * wt.time_scale;
    wt.elapsed += scaled_dt;
    wt.delta = scaled_dt;
    wt.frame_count += 1;
    trace!("Frame {} at {:.3}s", wt.frame_count, wt.elapsed);
}
