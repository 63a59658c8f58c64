//! Headless backend
//!
//! Draws nothing. Each submitted frame is reduced to a [`FrameRecord`] so the
//! viewer can run without a GPU and tests can inspect what would have been
//! drawn.

use std::collections::VecDeque;

use super::backend::{BackendResult, FrameData, RenderBackend, RenderError};

/// Summary of one submitted frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    /// Frame index
    pub frame: u64,
    /// Drawing buffer size
    pub target_size: (u32, u32),
    /// Mesh draws
    pub draw_calls: usize,
    /// Triangles across all draws
    pub triangles: usize,
    /// Vertex data the draws would upload
    pub vertex_bytes: usize,
    /// Skybox draws
    pub skyboxes: usize,
    /// Environment intensity of every lit draw, in draw order
    pub env_map_intensities: Vec<f32>,
    /// Background intensity
    pub background_intensity: f32,
}

/// Backend that records frames instead of drawing them
#[derive(Debug)]
pub struct HeadlessBackend {
    size: (u32, u32),
    resizes: usize,
    history: VecDeque<FrameRecord>,
    capacity: usize,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new(120)
    }
}

impl HeadlessBackend {
    /// Keep the most recent `capacity` frame records
    pub fn new(capacity: usize) -> Self {
        Self {
            size: (0, 0),
            resizes: 0,
            history: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
        }
    }

    /// Current drawing buffer size
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// How many times the drawing buffer was resized
    pub fn resize_count(&self) -> usize {
        self.resizes
    }

    /// Most recent frame
    pub fn last_frame(&self) -> Option<&FrameRecord> {
        self.history.back()
    }

    /// Retained frames, oldest first
    pub fn frames(&self) -> impl Iterator<Item = &FrameRecord> {
        self.history.iter()
    }
}

impl RenderBackend for HeadlessBackend {
    fn name(&self) -> &str {
        "headless"
    }

    fn resize(&mut self, width: u32, height: u32) -> BackendResult<()> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidSize { width, height });
        }
        log::debug!("Headless drawing buffer resized to {}x{}", width, height);
        self.size = (width, height);
        self.resizes += 1;
        Ok(())
    }

    fn submit(&mut self, frame: &FrameData<'_>) -> BackendResult<()> {
        let record = FrameRecord {
            frame: frame.frame,
            target_size: frame.target_size,
            draw_calls: frame.draws.len(),
            triangles: frame.draws.iter().map(|draw| draw.mesh.triangle_count()).sum(),
            vertex_bytes: frame.draws.iter().map(|draw| draw.mesh.vertex_bytes()).sum(),
            skyboxes: frame.skyboxes.len(),
            env_map_intensities: frame
                .draws
                .iter()
                .filter(|draw| draw.material.unlit == 0)
                .map(|draw| draw.material.env_map_intensity)
                .collect(),
            background_intensity: frame.environment_uniforms.background_intensity,
        };

        log::trace!(
            "Frame {}: {} draws, {} triangles",
            record.frame,
            record.draw_calls,
            record.triangles
        );

        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(record);
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
