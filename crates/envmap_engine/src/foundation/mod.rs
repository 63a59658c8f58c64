//! Foundation module - Core utilities and types
//!
//! - Math types and operations
//! - Frame timing
//! - Logging setup
//! - Cooperative frame loop

pub mod math;
pub mod time;
pub mod logging;
pub mod frame_loop;
