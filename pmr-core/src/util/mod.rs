//! Utility functions.

pub mod math;
