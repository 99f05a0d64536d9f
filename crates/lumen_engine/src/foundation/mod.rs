//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - The linear algebra kernel behind every transform
//! - Frame timing
//! - Logging setup

pub mod logging;
pub mod math;
pub mod time;
