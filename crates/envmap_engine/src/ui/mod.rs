//! Debug UI

pub mod panel;

pub use panel::{DebugPanel, PanelBinding, PanelChange, Slider, SliderId};
