//! ECS resources that hand computed model matrices to a render thread.
//!
//! The logic thread owns the [`TransformTree`](super::transformtree::TransformTree)
//! and is the only one that mutates or queries it. Once the frame's update
//! pass is finished, [`publish_frame_snapshot`](crate::systems::renderbridge::publish_frame_snapshot)
//! copies every model matrix into an owned [`FrameSnapshot`] and sends it over
//! a bounded channel. The render thread never sees the tree itself.
//!
//! Use [`setup_render_bridge`] once during initialization and
//! [`shutdown_render_bridge`] during teardown; dropping the sender ends the
//! render thread's receive loop.

use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender, bounded};
use serde::Serialize;

/// Model matrix of one entity for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelMatrix {
    /// Entity bits, stable for the entity's lifetime.
    pub entity: u64,
    pub label: Option<String>,
    /// Column-major 4x4 local-to-world matrix.
    pub model: [[f32; 4]; 4],
}

/// All model matrices computed for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub models: Vec<ModelMatrix>,
}

/// Sending half of the logic/render handoff.
#[derive(Resource)]
pub struct RenderBridge {
    /// Sender for [`FrameSnapshot`] messages (ECS -> render thread).
    pub tx_frame: Sender<FrameSnapshot>,
    /// Frames dropped because the render thread was behind.
    pub dropped: u64,
}

/// Create the handoff channel and register the [`RenderBridge`] resource.
///
/// `capacity` is how many finished frames may wait for the render thread;
/// when it is full newer frames are dropped instead of blocking the logic
/// thread. Returns the receiving end for the render thread.
pub fn setup_render_bridge(world: &mut World, capacity: usize) -> Receiver<FrameSnapshot> {
    let (tx_frame, rx_frame) = bounded::<FrameSnapshot>(capacity.max(1));
    world.insert_resource(RenderBridge {
        tx_frame,
        dropped: 0,
    });
    rx_frame
}

/// Remove the bridge, closing the channel. Returns the dropped-frame count.
pub fn shutdown_render_bridge(world: &mut World) -> u64 {
    world
        .remove_resource::<RenderBridge>()
        .map(|bridge| bridge.dropped)
        .unwrap_or(0)
}
