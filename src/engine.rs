//! # Interpolation Engine
//!
//! Stateful engine owning the parsed point table and the per-job neighbor
//! cache, plus the batch driver that sweeps a location × day grid through
//! it and writes the result file.
//!
//! ## Architecture
//!
//! One engine instance serves one job. The point table is immutable after
//! parse; the neighbor cache fills lazily as coordinates are first
//! queried and is discarded with the engine. Locations are independent
//! units of work: each runs its 365 day-queries in sequence (they share
//! one cache entry), and with the `parallel` feature the units run
//! concurrently under rayon.

use std::collections::HashMap;
use std::fs;

use serde::{Deserialize, Serialize};

use crate::error::{InterpolateError, Result};
use crate::idw::idw_estimate;
use crate::neighbors::NeighborCache;
use crate::parse::{parse_dataset, parse_locations};
use crate::time::{day_of_year, TimeDomain};
use crate::{Location, Neighbor, SensorPoint};

/// Non-leap month lengths. The query grid always uses these: the batch
/// sweep covers 365 days and leap days are out of scope.
const DAYS_IN_MONTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

// ============================================================================
// Configuration
// ============================================================================

/// Engine-level configuration.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Time granularity used to normalize calendar dates.
    pub time_domain: TimeDomain,
    /// Whether neighbors must temporally cover the query time.
    pub time_filter: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            time_domain: TimeDomain::YearMonthDay,
            time_filter: true,
        }
    }
}

/// A batch interpolation job, as handed over by the external caller.
///
/// Field names follow the request form of the original service: `t` is
/// the time-domain name, `n` the output path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Number of neighbors per query.
    pub k: usize,
    /// IDW power parameter.
    pub p: f64,
    /// Time-domain name ("Year", "Year Month", "Year Month Day").
    pub t: String,
    /// Output file path.
    pub n: String,
    /// Raw delimited dataset text.
    pub dataset: String,
    /// Raw delimited locations text.
    pub locations: String,
    /// Field delimiter for input and output.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Calendar year swept by the query grid.
    #[serde(default = "default_reference_year")]
    pub reference_year: i32,
    /// Whether neighbors must temporally cover the query time.
    #[serde(default = "default_time_filter")]
    pub time_filter: bool,
}

fn default_delimiter() -> char {
    '\t'
}

fn default_reference_year() -> i32 {
    2009
}

fn default_time_filter() -> bool {
    true
}

// ============================================================================
// Results and reporting
// ============================================================================

/// One interpolated value: a location on one grid day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub location_id: String,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

impl ResultRow {
    fn to_line(&self, delimiter: char) -> String {
        format!(
            "{}{d}{}{d}{}{d}{}{d}{}{d}{}{d}{}",
            self.location_id,
            self.year,
            self.month,
            self.day,
            self.x,
            self.y,
            self.value,
            d = delimiter
        )
    }
}

/// Per-location completion record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationOutcome {
    pub location_id: String,
    /// Rows produced for this location (0 on failure).
    pub rows: usize,
    /// Failure message, if the location's queries could not complete.
    pub error: Option<String>,
}

/// Job acknowledgment returned to the caller once the file is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub rows_written: usize,
    pub locations_ok: usize,
    pub failures: Vec<LocationOutcome>,
}

impl JobReport {
    /// JSON form of the report, the acknowledgment body handed back to
    /// the HTTP collaborator.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// ============================================================================
// Query grid
// ============================================================================

/// One day of the batch grid, pre-annotated with its time ordinate.
#[derive(Debug, Clone, Copy)]
struct GridDay {
    year: i32,
    month: u32,
    day: u32,
    normalized: f64,
}

/// Every calendar day of `year` under non-leap month lengths: 365 entries.
fn build_day_grid(year: i32, domain: TimeDomain) -> Vec<GridDay> {
    let mut grid = Vec::with_capacity(365);
    for (m, &len) in DAYS_IN_MONTH.iter().enumerate() {
        let month = m as u32 + 1;
        for day in 1..=len {
            grid.push(GridDay {
                year,
                month,
                day,
                normalized: domain.normalize(year, month, day),
            });
        }
    }
    grid
}

// ============================================================================
// Interpolation Engine
// ============================================================================

/// The per-job interpolation engine.
///
/// Owns the immutable point table and the coordinate-keyed neighbor
/// cache. Queries take `&self`: the cache synchronizes its own interior,
/// so one engine can serve concurrent location tasks.
pub struct InterpolationEngine {
    points: HashMap<String, SensorPoint>,
    cache: NeighborCache,
    config: EngineConfig,
}

impl InterpolationEngine {
    pub fn new(points: HashMap<String, SensorPoint>, config: EngineConfig) -> Self {
        Self {
            points,
            cache: NeighborCache::new(),
            config,
        }
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Number of query coordinates with a materialized cache entry.
    pub fn cached_coordinates(&self) -> usize {
        self.cache.len()
    }

    /// The k nearest neighbors of (x, y) at time `t`, per the engine's
    /// time-filter setting.
    pub fn nearest_neighbors(&self, x: f64, y: f64, t: f64, k: usize) -> Result<Vec<Neighbor>> {
        self.cache
            .nearest_neighbors(x, y, t, k, self.config.time_filter, &self.points)
    }

    /// IDW estimate at (x, y) and ordinate `t` from the k nearest
    /// neighbors with power parameter `p`.
    pub fn idw(&self, x: f64, y: f64, t: f64, k: usize, p: f64) -> Result<f64> {
        let neighbors = self.nearest_neighbors(x, y, t, k)?;
        idw_estimate(t, p, &neighbors)
    }

    /// Run all 365 day-queries for one location. The queries share the
    /// location's cache entry, so they run in sequence; the first one
    /// pays the distance sort.
    fn interpolate_location(
        &self,
        location: &Location,
        grid: &[GridDay],
        k: usize,
        p: f64,
    ) -> Result<Vec<ResultRow>> {
        let mut rows = Vec::with_capacity(grid.len());
        for day in grid {
            let value = self.idw(location.x, location.y, day.normalized, k, p)?;
            rows.push(ResultRow {
                location_id: location.id.clone(),
                year: day.year,
                month: day.month,
                day: day.day,
                x: location.x,
                y: location.y,
                value,
            });
        }
        Ok(rows)
    }
}

// ============================================================================
// Batch driver
// ============================================================================

/// Run a batch interpolation job: parse the inputs, sweep the
/// location × day grid, write the result file, and report.
///
/// This is the single entry point for the external caller. It returns
/// once every location has completed and the file is written. A single
/// location's failure is recorded in the report and does not abort its
/// siblings; a failure to write the output file is fatal.
pub fn run_job(config: &JobConfig) -> Result<JobReport> {
    if config.k == 0 {
        return Err(InterpolateError::Config {
            message: "k must be a positive integer".to_string(),
        });
    }
    if !(config.p > 0.0) {
        return Err(InterpolateError::Config {
            message: "p must be a positive number".to_string(),
        });
    }

    let domain = TimeDomain::parse(&config.t);
    let points = parse_dataset(&config.dataset, config.delimiter, domain);
    if points.is_empty() {
        return Err(InterpolateError::EmptyDataset);
    }
    let locations = parse_locations(&config.locations, config.delimiter);

    log::info!(
        "Starting interpolation job: {} points, {} locations, k={}, p={}",
        points.len(),
        locations.len(),
        config.k,
        config.p
    );

    let engine = InterpolationEngine::new(
        points,
        EngineConfig {
            time_domain: domain,
            time_filter: config.time_filter,
        },
    );
    let grid = build_day_grid(config.reference_year, domain);

    let per_location = compute_locations(&engine, &locations, &grid, config.k, config.p);

    let mut rows: Vec<ResultRow> = Vec::new();
    let mut outcomes: Vec<LocationOutcome> = Vec::new();
    for (location, result) in locations.iter().zip(per_location) {
        match result {
            Ok(location_rows) => {
                outcomes.push(LocationOutcome {
                    location_id: location.id.clone(),
                    rows: location_rows.len(),
                    error: None,
                });
                rows.extend(location_rows);
            }
            Err(err) => {
                log::warn!("Location '{}' failed: {}", location.id, err);
                outcomes.push(LocationOutcome {
                    location_id: location.id.clone(),
                    rows: 0,
                    error: Some(err.to_string()),
                });
            }
        }
    }

    // Task completion order is unordered across locations; sort for
    // reproducible output.
    rows.sort_by(|a, b| {
        (&a.location_id, day_of_year(a.year, a.month, a.day))
            .cmp(&(&b.location_id, day_of_year(b.year, b.month, b.day)))
    });

    let mut output = String::new();
    for row in &rows {
        output.push_str(&row.to_line(config.delimiter));
        output.push('\n');
    }
    fs::write(&config.n, output).map_err(|e| InterpolateError::Output {
        path: config.n.clone(),
        message: e.to_string(),
    })?;

    let locations_ok = outcomes.iter().filter(|o| o.error.is_none()).count();
    let failures: Vec<LocationOutcome> =
        outcomes.into_iter().filter(|o| o.error.is_some()).collect();

    log::info!(
        "Job complete: {} rows written to '{}', {} locations ok, {} failed",
        rows.len(),
        config.n,
        locations_ok,
        failures.len()
    );

    Ok(JobReport {
        rows_written: rows.len(),
        locations_ok,
        failures,
    })
}

/// One unit of work per location, run concurrently under rayon.
#[cfg(feature = "parallel")]
fn compute_locations(
    engine: &InterpolationEngine,
    locations: &[Location],
    grid: &[GridDay],
    k: usize,
    p: f64,
) -> Vec<Result<Vec<ResultRow>>> {
    use rayon::prelude::*;

    locations
        .par_iter()
        .map(|location| engine.interpolate_location(location, grid, k, p))
        .collect()
}

/// Sequential fallback when the `parallel` feature is disabled.
#[cfg(not(feature = "parallel"))]
fn compute_locations(
    engine: &InterpolationEngine,
    locations: &[Location],
    grid: &[GridDay],
    k: usize,
    p: f64,
) -> Vec<Result<Vec<ResultRow>>> {
    locations
        .iter()
        .map(|location| engine.interpolate_location(location, grid, k, p))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
