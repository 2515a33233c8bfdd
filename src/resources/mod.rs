//! ECS resources made available to systems.
//!
//! Overview
//! - `framestats` – rolling update and present timings
//! - `picking` – world-space cursor position and per-frame hit results
//! - `renderbridge` – bounded channel handing frame snapshots to the render thread
//! - `sceneconfig` – INI-backed settings for the transform system and demo
//! - `transformtree` – the hierarchical transform arena itself
//! - `worldtime` – simulation time and delta
pub mod framestats;
pub mod picking;
pub mod renderbridge;
pub mod sceneconfig;
pub mod transformtree;
pub mod worldtime;
