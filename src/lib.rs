//! # IDW Interpolator
//!
//! Spatiotemporal inverse-distance-weighted interpolation of a scalar
//! measurement (e.g. an air-quality index) at arbitrary query locations
//! and times, from a sparse set of sensor points each carrying a time
//! series of measurements.
//!
//! This library provides:
//! - k-nearest-neighbor search with a per-job coordinate cache
//! - IDW value estimation with temporal interpolation
//! - A batch driver that sweeps a location × day grid and writes results
//!
//! ## Features
//!
//! - **`parallel`** (default) - Process interpolation targets concurrently with rayon
//!
//! ## Quick Start
//!
//! ```rust
//! use idw_interpolator::{EngineConfig, InterpolationEngine, TimeDomain, parse_dataset};
//!
//! let dataset = "s1\t2009\t1\t1\t0.0\t0.0\t10.0\r\n\
//!                s1\t2009\t12\t31\t0.0\t0.0\t20.0\r\n\
//!                s2\t2009\t1\t1\t3.0\t4.0\t30.0\r\n\
//!                s2\t2009\t12\t31\t3.0\t4.0\t40.0\r\n";
//!
//! let config = EngineConfig::default();
//! let points = parse_dataset(dataset, '\t', config.time_domain);
//! let engine = InterpolationEngine::new(points, config);
//!
//! let t = TimeDomain::YearMonthDay.normalize(2009, 7, 1);
//! let value = engine.idw(1.0, 1.0, t, 2, 2.0).unwrap();
//! assert!(value.is_finite());
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{InterpolateError, Result};

// Calendar/time normalization
pub mod time;
pub use time::{day_of_year, is_leap_year, TimeDomain};

// Predicate-parameterized in-place sort
pub mod sort;
pub use sort::quicksort_by;

// Neighbor search and the coordinate-keyed cache
pub mod neighbors;
pub use neighbors::{euclidean_distance, NeighborCache};

// IDW value computation
pub mod idw;

// Delimited-text input parsing
pub mod parse;
pub use parse::{parse_dataset, parse_locations};

// Interpolation engine and batch job driver
pub mod engine;
pub use engine::{
    run_job, EngineConfig, InterpolationEngine, JobConfig, JobReport, LocationOutcome, ResultRow,
};

// Algorithm toolbox - modular access without the full engine
pub mod algorithms;

// ============================================================================
// Core Types
// ============================================================================

/// A single sensor reading at a calendar date.
///
/// `normalized` is derived by the [`TimeDomain`] at parse time, never read
/// from input. Within one point's series it must be non-decreasing in
/// input order; the parser assumes chronological input and checks this
/// with a debug assertion only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub value: f64,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// Scalar time ordinate of (year, month, day), set at parse time.
    pub normalized: f64,
}

/// A sensor point: a fixed coordinate with an ordered measurement series.
///
/// Immutable after the parse phase for the duration of one job. The
/// measurement series is behind an `Arc` so neighbors can hold a shared
/// read-only view without cloning the data.
#[derive(Debug, Clone)]
pub struct SensorPoint {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub measurements: Arc<Vec<Measurement>>,
}

impl SensorPoint {
    /// First and last normalized ordinates of the series, if non-empty.
    pub fn time_span(&self) -> Option<(f64, f64)> {
        span(&self.measurements)
    }
}

/// An interpolation target. Never carries measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

/// A candidate sample point for one query: the owning point's id, its
/// distance to the query coordinate, and a shared view of its series.
#[derive(Debug, Clone)]
pub struct Neighbor {
    pub point_id: String,
    /// Euclidean distance to the query coordinate. Always >= 0.
    pub distance: f64,
    pub measurements: Arc<Vec<Measurement>>,
}

impl Neighbor {
    /// First and last normalized ordinates of the series, if non-empty.
    pub fn time_span(&self) -> Option<(f64, f64)> {
        span(&self.measurements)
    }

    /// Whether `t` falls within this neighbor's measurement span,
    /// endpoints inclusive.
    pub fn covers_time(&self, t: f64) -> bool {
        match self.time_span() {
            Some((first, last)) => t >= first && t <= last,
            None => false,
        }
    }
}

fn span(measurements: &[Measurement]) -> Option<(f64, f64)> {
    let first = measurements.first()?;
    let last = measurements.last()?;
    Some((first.normalized, last.normalized))
}

// ============================================================================
// Tests
// ============================================================================
