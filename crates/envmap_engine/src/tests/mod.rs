//! Crate-level test support and end-to-end viewer scenarios
