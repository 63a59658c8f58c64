//! Camera controls

pub mod orbit;

pub use orbit::{OrbitButton, OrbitControls};
