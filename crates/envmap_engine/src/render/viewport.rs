//! Output surface dimensions

/// Highest pixel ratio the renderer is asked to draw at
pub const MAX_PIXEL_RATIO: f32 = 2.0;

/// Logical window size plus the monitor's device pixel ratio
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Width in logical pixels
    pub width: u32,
    /// Height in logical pixels
    pub height: u32,
    /// Physical pixels per logical pixel, as reported by the platform
    pub device_pixel_ratio: f32,
}

impl Viewport {
    /// Create a viewport
    pub fn new(width: u32, height: u32, device_pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio,
        }
    }

    /// Width / height; 1.0 while the window is minimized
    pub fn aspect(&self) -> f32 {
        if self.width == 0 || self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// Pixel ratio to render at: the device ratio capped at [`MAX_PIXEL_RATIO`]
    pub fn pixel_ratio(&self) -> f32 {
        if self.device_pixel_ratio.is_finite() && self.device_pixel_ratio > 0.0 {
            self.device_pixel_ratio.min(MAX_PIXEL_RATIO)
        } else {
            1.0
        }
    }
}
