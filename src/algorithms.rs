//! # Algorithm Toolbox
//!
//! Direct access to the engine's building blocks, for integrating a
//! specific algorithm without running full batch jobs.
//!
//! ## Core Algorithms
//!
//! - **Neighbor Search**: cached and legacy uncached k-nearest-neighbor search
//! - **IDW Estimation**: weights, temporal values, and the combined estimate
//! - **Partition-Exchange Sort**: predicate-parameterized in-place sort
//!
//! ## Time Utilities
//!
//! - **Leap-Year Predicate / Day-of-Year**: calendar arithmetic
//! - **Time Normalization**: calendar date to scalar ordinate
//!
//! # Example
//!
//! ```rust
//! use idw_interpolator::algorithms::{day_of_year, euclidean_distance, is_leap_year};
//!
//! assert_eq!(day_of_year(2009, 3, 1), 60);
//! assert!(!is_leap_year(2009));
//! let d = euclidean_distance(0.0, 0.0, 3.0, 4.0);
//! assert_eq!(d, 5.0);
//! ```

// =============================================================================
// Core Types (re-exported from lib)
// =============================================================================

pub use crate::{Location, Measurement, Neighbor, SensorPoint};

// =============================================================================
// Time Utilities
// =============================================================================

pub use crate::time::{day_of_year, is_leap_year, TimeDomain};

// =============================================================================
// Sorting
// =============================================================================

pub use crate::sort::{by_distance, by_time_validity_then_distance, quicksort_by};

// =============================================================================
// Neighbor Search
// =============================================================================

pub use crate::neighbors::{euclidean_distance, nearest_neighbors_uncached, NeighborCache};

// =============================================================================
// IDW Estimation
// =============================================================================

pub use crate::idw::{idw_estimate, idw_weight, temporal_value};

// =============================================================================
// Parsing
// =============================================================================

pub use crate::parse::{parse_dataset, parse_locations};
