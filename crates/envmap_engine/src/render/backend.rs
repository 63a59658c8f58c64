//! Render backend abstraction
//!
//! The [`Renderer`](super::Renderer) flattens the scene into a [`FrameData`]
//! each frame and hands it to a backend. Backends own every GPU or output
//! resource; the rest of the crate never sees them.

use bytemuck::{Pod, Zeroable};
use thiserror::Error;

use super::material::MaterialUniforms;
use super::mesh::Mesh;
use crate::foundation::math::Mat4;
use crate::scene::{NodeId, SceneEnvironment};

/// Rendering errors
#[derive(Error, Debug)]
pub enum RenderError {
    /// The backend failed to draw or present
    #[error("Backend error: {0}")]
    Backend(String),

    /// The backend cannot draw into a surface of this size
    #[error("Invalid surface size {width}x{height}")]
    InvalidSize {
        /// Requested width in physical pixels
        width: u32,
        /// Requested height in physical pixels
        height: u32,
    },
}

/// Result alias for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

/// Camera block laid out for a uniform buffer
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraUniforms {
    /// World-to-view
    pub view: [[f32; 4]; 4],
    /// View-to-clip
    pub projection: [[f32; 4]; 4],
    /// Combined
    pub view_projection: [[f32; 4]; 4],
    /// Camera position, w = 1
    pub position: [f32; 4],
}

/// Scene environment block laid out for a uniform buffer
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct EnvironmentUniforms {
    /// Background blur
    pub background_blurriness: f32,
    /// Background brightness
    pub background_intensity: f32,
    /// 1 when an environment map is bound
    pub has_environment: u32,
    /// 1 for cube maps, 0 for equirectangular panoramas
    pub cube_map: u32,
}

/// One mesh to draw
#[derive(Debug, Clone)]
pub struct DrawItem<'a> {
    /// Source node
    pub node: NodeId,
    /// Geometry
    pub mesh: &'a Mesh,
    /// Local-to-world
    pub model: Mat4,
    /// Material parameters
    pub material: MaterialUniforms,
}

/// Ground-projected skybox to draw
#[derive(Debug, Clone, Copy)]
pub struct SkyboxDraw {
    /// Source node
    pub node: NodeId,
    /// Local-to-world
    pub model: Mat4,
    /// Projection sphere radius
    pub radius: f32,
    /// Capture height
    pub height: f32,
}

/// Everything a backend needs to draw one frame
#[derive(Debug, Clone)]
pub struct FrameData<'a> {
    /// Frame index
    pub frame: u64,
    /// Drawing buffer size in physical pixels
    pub target_size: (u32, u32),
    /// Camera block
    pub camera: CameraUniforms,
    /// Environment block
    pub environment_uniforms: EnvironmentUniforms,
    /// Background and environment maps
    pub environment: &'a SceneEnvironment,
    /// Visible meshes in traversal order
    pub draws: Vec<DrawItem<'a>>,
    /// Visible skyboxes
    pub skyboxes: Vec<SkyboxDraw>,
}

/// Rendering backend
pub trait RenderBackend {
    /// Human-readable backend name
    fn name(&self) -> &str;

    /// Resize the drawing buffer (physical pixels)
    fn resize(&mut self, width: u32, height: u32) -> BackendResult<()>;

    /// Draw and present one frame
    fn submit(&mut self, frame: &FrameData<'_>) -> BackendResult<()>;

    /// Get as Any for downcasting
    fn as_any(&self) -> &dyn std::any::Any;
}
