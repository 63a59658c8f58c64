//! Scene management
//!
//! - [`SceneGraph`]: node hierarchy with transforms and tagged node kinds
//! - [`SceneEnvironment`]: background and reflected environment
//! - [`apply_environment_intensity`]: pushes the tuned intensity into every
//!   standard material

pub mod environment;
pub mod graph;

pub use environment::{apply_environment_intensity, Background, GroundProjectedSkybox, SceneEnvironment};
pub use graph::{MeshNode, Node, NodeId, NodeKind, SceneError, SceneGraph};
