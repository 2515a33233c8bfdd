//! Logic-to-render frame handoff.
//!
//! [`publish_frame_snapshot`] runs last in the logic schedule and sends the
//! frame's model matrices through the
//! [`RenderBridge`](crate::resources::renderbridge::RenderBridge).
//! [`render_thread`] is the body of the consumer thread.

use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, TrySendError};
use log::{debug, warn};

use crate::components::label::Label;
use crate::components::transformhandle::TransformHandle;
use crate::resources::renderbridge::{FrameSnapshot, ModelMatrix, RenderBridge};
use crate::resources::transformtree::TransformTree;
use crate::resources::worldtime::WorldTime;

/// Collect every entity's local-to-world matrix and hand the frame off.
///
/// Never blocks: if the render thread has not consumed earlier frames the
/// snapshot is dropped and counted in [`RenderBridge::dropped`].
pub fn publish_frame_snapshot(
    mut tree: ResMut<TransformTree>,
    query: Query<(Entity, &TransformHandle, Option<&Label>)>,
    time: Option<Res<WorldTime>>,
    bridge: Option<ResMut<RenderBridge>>,
) {
    let Some(mut bridge) = bridge else {
        return;
    };
    let frame = time.map(|t| t.frame_count).unwrap_or(0);

    let mut models = Vec::new();
    for (entity, handle, label) in query.iter() {
        match tree.local_to_world(handle.id) {
            Ok(matrix) => models.push(ModelMatrix {
                entity: entity.to_bits(),
                label: label.map(|l| l.0.clone()),
                model: matrix.to_cols_array_2d(),
            }),
            Err(e) => warn!("Skipping {} in frame {}: {}", entity, frame, e),
        }
    }
    models.sort_by_key(|m| m.entity);

    match bridge.tx_frame.try_send(FrameSnapshot { frame, models }) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            bridge.dropped += 1;
            debug!("Render thread behind, dropped frame {}", frame);
        }
        Err(TrySendError::Disconnected(_)) => {
            debug!("Render thread gone, frame {} not delivered", frame);
        }
    }
}

/// Consume snapshots until the sending side is dropped.
///
/// Returns the number of frames presented.
pub fn render_thread<F>(rx: Receiver<FrameSnapshot>, mut present: F) -> u64
where
    F: FnMut(&FrameSnapshot),
{
    let mut presented = 0;
    for snapshot in rx.iter() {
        present(&snapshot);
        presented += 1;
    }
    presented
}
