//! Engine systems.
//!
//! Submodules overview
//! - [`movement`] – drive oscillating entities' local transforms
//! - [`picking`] – convert the cursor into local space and collect hits
//! - [`propagate_transforms`] – copy world poses into [`GlobalTransform2D`](crate::components::globaltransform2d::GlobalTransform2D)
//! - [`renderbridge`] – publish frame snapshots and the render thread body
//! - [`time`] – update simulation time and delta
//! - [`transformlifecycle`] – free transform nodes when their entity goes away

pub mod movement;
pub mod picking;
pub mod propagate_transforms;
pub mod renderbridge;
pub mod time;
pub mod transformlifecycle;
