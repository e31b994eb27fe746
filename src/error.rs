//! Unified error handling for the interpolation engine.
//!
//! This module provides a consistent error type for all engine operations,
//! replacing mixed failure patterns (silent NaN propagation, unbounded
//! scans) with explicit, typed errors.

use std::fmt;

/// Unified error type for interpolation operations.
#[derive(Debug, Clone)]
pub enum InterpolateError {
    /// Fewer than `requested` neighbors with measurement spans covering the
    /// query time exist in the dataset. The time-filtered scan is bounded by
    /// the point count and fails here instead of running past the data.
    InsufficientNeighbors {
        x: f64,
        y: f64,
        t: f64,
        requested: usize,
        available: usize,
    },
    /// A neighbor's measurement series cannot support temporal interpolation
    /// (multiple measurements sharing a single time ordinate).
    DegenerateSeries { point_id: String },
    /// The dataset parsed to zero points.
    EmptyDataset,
    /// Invalid job configuration (non-positive k or p, bad delimiter, ...)
    Config { message: String },
    /// Writing the result file failed. Fatal to the whole job.
    Output { path: String, message: String },
}

impl fmt::Display for InterpolateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterpolateError::InsufficientNeighbors {
                x,
                y,
                t,
                requested,
                available,
            } => {
                write!(
                    f,
                    "Query ({}, {}) at t={} needs {} time-valid neighbors, only {} available",
                    x, y, t, requested, available
                )
            }
            InterpolateError::DegenerateSeries { point_id } => {
                write!(
                    f,
                    "Point '{}' has a degenerate measurement series (zero time span)",
                    point_id
                )
            }
            InterpolateError::EmptyDataset => {
                write!(f, "Dataset contains no sensor points")
            }
            InterpolateError::Config { message } => {
                write!(f, "Configuration error: {}", message)
            }
            InterpolateError::Output { path, message } => {
                write!(f, "Failed to write output '{}': {}", path, message)
            }
        }
    }
}

impl std::error::Error for InterpolateError {}

/// Result type alias for interpolation operations.
pub type Result<T> = std::result::Result<T, InterpolateError>;
