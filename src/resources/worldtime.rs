use bevy_ecs::prelude::Resource;

/// Simulation clock advanced once per frame.
///
/// `frame_count` numbers the frames handed to the render thread, so it only
/// moves forward, even while the clock is paused.
#[derive(Resource, Clone, Copy, Debug, PartialEq)]
pub struct WorldTime {
    pub elapsed: f32,
    pub delta: f32,
    /// Multiplier applied to every frame delta. `0.0` pauses the scene.
    pub time_scale: f32,
    pub frame_count: u64,
}

impl Default for WorldTime {
    fn default() -> Self {
        WorldTime {
            elapsed: 0.0,
            delta: 0.0,
            time_scale: 1.0,
            frame_count: 0,
        }
    }
}

impl WorldTime {
    pub fn with_time_scale(mut self, time_scale: f32) -> Self {
        self.time_scale = time_scale.max(0.0);
        self
    }

    pub fn is_paused(&self) -> bool {
        self.time_scale == 0.0
    }
}
