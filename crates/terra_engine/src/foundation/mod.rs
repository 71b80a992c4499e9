//! Foundation layer: math types and logging utilities
//!
//! Low-level building blocks shared by the rendering and collision modules.

pub mod logging;
pub mod math;
