//! Scene transform library.
//!
//! Hierarchical 2D transforms for a small game engine: a lazily refreshed
//! parent/child transform tree plus the ECS components, systems and events
//! that connect it to entities, picking and a render thread.
//!
//! The core lives in [`resources::transformtree`] and can be used on its
//! own; the rest of the crate wires it into a `bevy_ecs` world.

pub mod components;
pub mod events;
pub mod game;
pub mod resources;
pub mod systems;
