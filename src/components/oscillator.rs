//! Periodic motion driven directly on an entity's local transform.
//!
//! Used for moving platforms and similar scenery: the entity swings around
//! `origin` along `amplitude` and spins at a constant rate. Children attached
//! through the hierarchy ride along without any code of their own.

use bevy_ecs::prelude::Component;
use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Component)]
pub struct Oscillator {
    /// Local position at the center of the swing.
    pub origin: Vec2,
    /// Peak offset from `origin` per axis.
    pub amplitude: Vec2,
    /// Full swings per second.
    pub frequency_hz: f32,
    /// Constant spin added to the local rotation.
    pub spin_degrees_per_second: f32,
}

impl Oscillator {
    pub fn new(origin: Vec2, amplitude: Vec2, frequency_hz: f32) -> Self {
        Self {
            origin,
            amplitude,
            frequency_hz,
            spin_degrees_per_second: 0.0,
        }
    }

    pub fn with_spin(mut self, degrees_per_second: f32) -> Self {
        self.spin_degrees_per_second = degrees_per_second;
        self
    }

    /// Local position at `elapsed` seconds.
    pub fn position_at(&self, elapsed: f32) -> Vec2 {
        let phase = (std::f32::consts::TAU * self.frequency_hz * elapsed).sin();
        self.origin + self.amplitude * phase
    }
}
