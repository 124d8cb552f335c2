//! Model inputs, parameters and fit results.
//!
//! - `data`: validated individual-level and summary-level inputs
//! - `params`: parameters, constraint flags and named model variants
//! - `result`: the immutable outcome of one fit
//! - `serialization`: JSON persistence and text summaries of results

pub mod data;
pub mod params;
pub mod result;
pub mod serialization;
