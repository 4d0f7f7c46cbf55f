//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - 2D math types (vectors, rects, sweep axes)
//! - Logging utilities

pub mod math;
pub mod logging;
