//! Entity-level reparenting requests.
//!
//! Gameplay code does not hold [`TransformId`]s; it triggers a
//! [`ReparentEvent`] naming entities. The [`reparent_observer`] resolves both
//! entities' [`TransformHandle`]s and applies the change to the
//! [`TransformTree`]. Requests that would create a cycle, or that name an
//! entity without a transform, leave the hierarchy untouched and are
//! re-emitted as [`ReparentRejectedEvent`].
//!
//! # Example
//!
//! ```ignore
//! // Rider steps onto the platform and rides along with it.
//! commands.trigger(ReparentEvent::attach(rider, platform));
//!
//! // Rider jumps off, staying where it is on screen.
//! commands.trigger(ReparentEvent::detach(rider).keeping_world());
//! ```

use bevy_ecs::prelude::*;
use log::{debug, warn};

use crate::components::transformhandle::TransformHandle;
use crate::resources::transformtree::{TransformError, TransformTree};

/// Request to move `child` under `parent` (or to the root with `None`).
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReparentEvent {
    pub child: Entity,
    pub parent: Option<Entity>,
    /// Rewrite the child's local values so its world pose does not jump.
    pub keep_world: bool,
}

impl ReparentEvent {
    pub fn attach(child: Entity, parent: Entity) -> Self {
        Self {
            child,
            parent: Some(parent),
            keep_world: false,
        }
    }

    pub fn detach(child: Entity) -> Self {
        Self {
            child,
            parent: None,
            keep_world: false,
        }
    }

    pub fn keeping_world(mut self) -> Self {
        self.keep_world = true;
        self
    }
}

/// Why a [`ReparentEvent`] was not applied.
#[derive(Debug, Clone, PartialEq)]
pub enum ReparentFailure {
    /// The named entity has no [`TransformHandle`].
    MissingHandle(Entity),
    Transform(TransformError),
}

/// Emitted when a [`ReparentEvent`] is rejected. The hierarchy is unchanged.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct ReparentRejectedEvent {
    pub child: Entity,
    pub parent: Option<Entity>,
    pub reason: ReparentFailure,
}

fn apply_reparent(
    event: &ReparentEvent,
    handles: &Query<&TransformHandle>,
    tree: &mut TransformTree,
) -> Result<(), ReparentFailure> {
    let child = handles
        .get(event.child)
        .map_err(|_| ReparentFailure::MissingHandle(event.child))?
        .id;
    let parent = match event.parent {
        Some(parent) => Some(
            handles
                .get(parent)
                .map_err(|_| ReparentFailure::MissingHandle(parent))?
                .id,
        ),
        None => None,
    };
    let result = if event.keep_world {
        tree.set_parent_keep_world(child, parent)
    } else {
        tree.set_parent(child, parent)
    };
    result.map_err(ReparentFailure::Transform)
}

/// Observer that applies [`ReparentEvent`]s to the transform tree.
pub fn reparent_observer(
    trigger: On<ReparentEvent>,
    handles: Query<&TransformHandle>,
    mut tree: ResMut<TransformTree>,
    mut commands: Commands,
) {
    let event = *trigger.event();
    match apply_reparent(&event, &handles, &mut tree) {
        Ok(()) => debug!(
            "Reparented {} under {:?} (keep_world={})",
            event.child, event.parent, event.keep_world
        ),
        Err(reason) => {
            warn!(
                "Rejected reparenting {} under {:?}: {:?}",
                event.child, event.parent, reason
            );
            commands.trigger(ReparentRejectedEvent {
                child: event.child,
                parent: event.parent,
                reason,
            });
        }
    }
}
