//! # Envmap Engine
//!
//! Scene, environment-map and asset plumbing for a small PBR viewer.
//!
//! ## Features
//!
//! - **Scene Graph**: slotmap-backed node tree with standard, physical and unlit materials
//! - **Environment Maps**: LDR, Radiance HDR, OpenEXR and cube-map sources
//! - **Asset Loading**: glTF models and textures on a background worker pool
//! - **Debug Panel**: keyboard-driven sliders for the scene's environment tuning
//! - **Headless Rendering**: a backend trait plus a frame recorder that needs no GPU
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use envmap_engine::prelude::*;
//!
//! fn main() -> Result<(), ViewerError> {
//!     let config = ViewerConfig::default();
//!     let mut viewer = SceneViewer::new(config, Box::new(HeadlessBackend::default()))?;
//!
//!     let mut frame_loop = FrameLoop::with_token(Some(60), viewer.cancellation_token());
//!     frame_loop.run(|context| viewer.tick(context))?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod assets;
pub mod config;
pub mod controls;
pub mod events;
pub mod foundation;
pub mod render;
pub mod scene;
pub mod ui;
pub mod viewer;

#[cfg(test)]
mod tests;

pub use viewer::{SceneViewer, ViewerError, ViewerStats};

/// Common imports for viewer users
pub mod prelude {
    pub use crate::{
        assets::{AssetError, EnvironmentMap},
        config::{Config, ConfigError, TuningState, ViewerConfig},
        events::{AppEvent, KeyCode, MouseButton},
        foundation::{
            frame_loop::{CancellationToken, FrameContext, FrameControl, FrameLoop},
            math::{Mat4, Transform, Vec3},
        },
        render::{HeadlessBackend, Material, PerspectiveCamera, RenderBackend, Renderer, Window},
        scene::{apply_environment_intensity, Node, NodeId, SceneEnvironment, SceneGraph},
        ui::{DebugPanel, PanelBinding},
        SceneViewer, ViewerError, ViewerStats,
    };
}
