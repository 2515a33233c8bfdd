//! ECS components for entities.
//!
//! Submodules overview:
//! - [`globaltransform2d`] – computed world-space pose, refreshed every frame
//! - [`label`] – human-readable entity name for logs and frame dumps
//! - [`oscillator`] – periodic swing and spin applied to the local transform
//! - [`pickbounds`] – local-space rectangle used for cursor hit testing
//! - [`transformhandle`] – the entity's node in the transform tree

pub mod globaltransform2d;
pub mod label;
pub mod oscillator;
pub mod pickbounds;
pub mod transformhandle;
