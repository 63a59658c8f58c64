//! Runtime tuning record

/// Allowed range of the background blurriness slider
pub const BACKGROUND_BLURRINESS_RANGE: (f32, f32) = (0.0, 1.0);

/// Allowed range of the background intensity slider
pub const BACKGROUND_INTENSITY_RANGE: (f32, f32) = (0.0, 10.0);

/// Allowed range of the environment-map intensity slider
pub const ENV_MAP_INTENSITY_RANGE: (f32, f32) = (0.0, 10.0);

/// Values the debug panel tunes while the viewer runs.
///
/// Owned by the viewer and passed by reference into the panel change path;
/// writes clamp to the allowed range.
#[derive(Debug, Clone, PartialEq)]
pub struct TuningState {
    environment_map_intensity: f32,
}

impl Default for TuningState {
    fn default() -> Self {
        Self {
            environment_map_intensity: 1.0,
        }
    }
}

impl TuningState {
    /// Start from a configured intensity
    pub fn new(environment_map_intensity: f32) -> Self {
        let mut state = Self::default();
        state.set_environment_map_intensity(environment_map_intensity);
        state
    }

    /// Current environment-map intensity
    pub fn environment_map_intensity(&self) -> f32 {
        self.environment_map_intensity
    }

    /// Store a new intensity, clamped to [0, 10]. Returns the stored value.
    pub fn set_environment_map_intensity(&mut self, value: f32) -> f32 {
        let (min, max) = ENV_MAP_INTENSITY_RANGE;
        self.environment_map_intensity = if value.is_nan() { min } else { value.clamp(min, max) };
        self.environment_map_intensity
    }
}
