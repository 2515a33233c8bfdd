//! Demo scene: a swinging platform carrying a rider, a lamp and debris.
//!
//! ```text
//! platform (Oscillator)
//! ├── rider
//! │   └── lamp
//! └── debris x N (seeded random offsets)
//! ```
//!
//! The scene exercises every path of the transform hierarchy: children
//! follow the platform, the rider later jumps off keeping its world pose,
//! an attempt to hang the platform under its own lamp is rejected, and the
//! platform is finally despawned so its debris are orphaned per policy.

use bevy_ecs::prelude::*;
use glam::Vec2;
use log::info;

use crate::components::label::Label;
use crate::components::oscillator::Oscillator;
use crate::components::pickbounds::PickBounds;
use crate::components::transformhandle::TransformHandle;
use crate::events::reparent::ReparentEvent;
use crate::resources::picking::CursorPosition;
use crate::resources::sceneconfig::SceneConfig;
use crate::resources::transformtree::{Pose, TransformTree};
use crate::resources::worldtime::WorldTime;

const PLATFORM_WIDTH: f32 = 120.0;
const PLATFORM_HEIGHT: f32 = 10.0;
const CURSOR_SPEED: f32 = 80.0;
const CURSOR_START: Vec2 = Vec2::new(-200.0, 10.0);

/// Entities spawned by [`setup_scene`].
#[derive(Debug, Clone)]
pub struct DemoScene {
    pub platform: Entity,
    pub rider: Entity,
    pub lamp: Entity,
    pub debris: Vec<Entity>,
}

fn spawn_node(world: &mut World, name: &str, local: Pose) -> Entity {
    let handle = {
        let mut tree = world.resource_mut::<TransformTree>();
        TransformHandle::create_with(&mut tree, local)
    };
    world.spawn((handle, Label::new(name))).id()
}

/// Spawn the demo hierarchy.
///
/// Requires the [`TransformTree`] resource and the
/// [`reparent_observer`](crate::events::reparent::reparent_observer).
pub fn setup_scene(world: &mut World, config: &SceneConfig) -> DemoScene {
    let platform = spawn_node(world, "platform", Pose::from_position(0.0, 0.0));
    world.entity_mut(platform).insert((
        Oscillator::new(Vec2::ZERO, Vec2::new(100.0, 0.0), 0.25).with_spin(15.0),
        PickBounds::new(PLATFORM_WIDTH, PLATFORM_HEIGHT),
    ));

    let rider = spawn_node(world, "rider", Pose::from_position(0.0, 20.0));
    world
        .entity_mut(rider)
        .insert(PickBounds::new(10.0, 30.0));
    let lamp = spawn_node(
        world,
        "lamp",
        Pose::from_position(0.0, 25.0).with_scale(0.5, 0.5),
    );

    world.trigger(ReparentEvent::attach(rider, platform));
    world.trigger(ReparentEvent::attach(lamp, rider));
    // Rejected: the lamp already hangs below the platform.
    world.trigger(ReparentEvent::attach(platform, lamp));

    let mut rng = fastrand::Rng::with_seed(config.seed);
    let mut debris = Vec::new();
    for i in 0..config.debris {
        let x = (rng.f32() - 0.5) * PLATFORM_WIDTH;
        let local = Pose::from_position(x, PLATFORM_HEIGHT)
            .with_rotation(rng.f32() * 360.0)
            .with_scale(0.5 + rng.f32(), 0.5 + rng.f32());
        let entity = spawn_node(world, &format!("debris-{}", i), local);
        world.entity_mut(entity).insert(PickBounds::new(4.0, 4.0));
        world.trigger(ReparentEvent::attach(entity, platform));
        debris.push(entity);
    }

    info!(
        "Scene ready: platform, rider, lamp and {} debris ({} transforms)",
        debris.len(),
        world.resource::<TransformTree>().len()
    );

    DemoScene {
        platform,
        rider,
        lamp,
        debris,
    }
}

/// Frames at which the rider jumps off and the platform is despawned:
/// halfway and three quarters through a run of `frames` frames.
pub fn scripted_frames(frames: u32) -> (u32, u32) {
    (frames / 2, frames - frames / 4)
}

/// Move the cursor left-to-right across the scene at a constant speed.
pub fn sweep_cursor_system(time: Res<WorldTime>, mut cursor: ResMut<CursorPosition>) {
    cursor.0 = Some(CURSOR_START + Vec2::new(CURSOR_SPEED * time.elapsed, 0.0));
}
