//! Event types and observers used by the engine.
//!
//! Events provide a decoupled way for gameplay code to request changes to
//! shared state without holding direct references to it.
//!
//! Submodules:
//! - [`reparent`] – entity-level requests to change the transform hierarchy
pub mod reparent;
