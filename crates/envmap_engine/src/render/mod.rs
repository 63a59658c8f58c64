//! Rendering: geometry, materials, camera, and the backend-facing renderer

pub mod backend;
pub mod camera;
pub mod geometry;
pub mod headless;
pub mod material;
pub mod mesh;
pub mod renderer;
pub mod viewport;
pub mod window;

pub use backend::{BackendResult, FrameData, RenderBackend, RenderError};
pub use camera::PerspectiveCamera;
pub use geometry::{torus_knot, TorusKnotParams};
pub use headless::{FrameRecord, HeadlessBackend};
pub use material::{BasicMaterial, Material, MaterialKind, MaterialUniforms, PhysicalMaterial, StandardMaterial};
pub use mesh::{Mesh, Vertex};
pub use renderer::{DirtyFlags, FrameStats, Renderer};
pub use viewport::{Viewport, MAX_PIXEL_RATIO};
pub use window::{Window, WindowError, WindowResult};
