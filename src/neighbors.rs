//! Nearest-neighbor search with a coordinate-keyed cache.
//!
//! Distance from a query coordinate to the sensor points does not depend
//! on the query time, so the full distance-sorted neighbor list for a
//! coordinate is computed once per job and reused for every day-query at
//! that coordinate. Cache entries hold ALL points in ascending-distance
//! order; time validity is applied as a post-filter over the cached order,
//! never baked into it.
//!
//! The cache is owned by the engine instance and lives for one job. It is
//! never invalidated mid-job: the point table is immutable after parse.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use once_cell::sync::OnceCell;

use crate::error::{InterpolateError, Result};
use crate::sort::{by_distance, by_time_validity_then_distance, quicksort_by};
use crate::{Neighbor, SensorPoint};

/// 2D Euclidean distance between (x1, y1) and (x2, y2).
pub fn euclidean_distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt()
}

/// Exact bit-pattern identity of a query coordinate pair.
///
/// Cache hits require the same (x, y) bits as a prior query; nearby but
/// unequal coordinates are distinct keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CoordKey(u64, u64);

impl CoordKey {
    fn new(x: f64, y: f64) -> Self {
        CoordKey(x.to_bits(), y.to_bits())
    }
}

type CacheEntry = Arc<OnceCell<Arc<Vec<Neighbor>>>>;

/// Per-job cache of distance-sorted neighbor lists, keyed by exact query
/// coordinate.
///
/// The mutex guards only key creation; first computation for a key runs
/// inside that key's `OnceCell`, so concurrent first-touch on the same
/// coordinate computes the entry exactly once while distinct coordinates
/// proceed independently.
#[derive(Debug, Default)]
pub struct NeighborCache {
    entries: Mutex<HashMap<CoordKey, CacheEntry>>,
}

impl NeighborCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of coordinates with a materialized entry.
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().expect("neighbor cache poisoned");
        entries.values().filter(|cell| cell.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The full ascending-distance neighbor list for (x, y), computed on
    /// first touch. The returned list always contains every point in the
    /// table.
    pub fn sorted_neighbors(
        &self,
        x: f64,
        y: f64,
        points: &HashMap<String, SensorPoint>,
    ) -> Arc<Vec<Neighbor>> {
        let cell = {
            let mut entries = self.entries.lock().expect("neighbor cache poisoned");
            entries.entry(CoordKey::new(x, y)).or_default().clone()
        };

        cell.get_or_init(|| {
            log::debug!("Building neighbor list for ({}, {})", x, y);
            let mut neighbors: Vec<Neighbor> = points
                .values()
                .map(|p| Neighbor {
                    point_id: p.id.clone(),
                    distance: euclidean_distance(x, y, p.x, p.y),
                    measurements: Arc::clone(&p.measurements),
                })
                .collect();
            quicksort_by(&mut neighbors, &by_distance);
            Arc::new(neighbors)
        })
        .clone()
    }

    /// The k nearest neighbors of (x, y) for query time `t`.
    ///
    /// With `time_filter` set, the cached list is scanned in ascending
    /// distance order and only neighbors whose measurement span covers `t`
    /// qualify; the scan is bounded by the list length and fails with
    /// [`InterpolateError::InsufficientNeighbors`] when fewer than `k`
    /// qualify. Without it, the first `k` entries are returned verbatim.
    pub fn nearest_neighbors(
        &self,
        x: f64,
        y: f64,
        t: f64,
        k: usize,
        time_filter: bool,
        points: &HashMap<String, SensorPoint>,
    ) -> Result<Vec<Neighbor>> {
        // An empty selection would flow into the weight computation as a
        // 0/0 division; reject it here instead of returning NaN later.
        if k == 0 {
            return Err(InterpolateError::Config {
                message: "k must be a positive integer".to_string(),
            });
        }

        let sorted = self.sorted_neighbors(x, y, points);

        let selected: Vec<Neighbor> = if time_filter {
            sorted
                .iter()
                .filter(|n| n.covers_time(t))
                .take(k)
                .cloned()
                .collect()
        } else {
            sorted.iter().take(k).cloned().collect()
        };

        if selected.len() < k {
            return Err(InterpolateError::InsufficientNeighbors {
                x,
                y,
                t,
                requested: k,
                available: selected.len(),
            });
        }
        Ok(selected)
    }
}

/// Legacy uncached k-nearest-neighbor search.
///
/// Recomputes distances on every call and ranks with time-valid neighbors
/// first, ties by distance - the historical ordering. NOT equivalent to
/// [`NeighborCache::nearest_neighbors`] when time filtering matters: here a
/// distant time-valid neighbor outranks a near invalid one, and invalid
/// neighbors can appear in the result when fewer than `k` valid ones
/// exist. Kept for comparison; the cached path is canonical.
pub fn nearest_neighbors_uncached(
    x: f64,
    y: f64,
    t: f64,
    k: usize,
    points: &HashMap<String, SensorPoint>,
) -> Vec<Neighbor> {
    let mut neighbors: Vec<Neighbor> = points
        .values()
        .map(|p| Neighbor {
            point_id: p.id.clone(),
            distance: euclidean_distance(x, y, p.x, p.y),
            measurements: Arc::clone(&p.measurements),
        })
        .collect();
    let lte = by_time_validity_then_distance(t);
    quicksort_by(&mut neighbors, &lte);
    neighbors.truncate(k);
    neighbors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Measurement;

    fn point(id: &str, x: f64, y: f64, span: (f64, f64)) -> SensorPoint {
        let measurements = vec![
            Measurement {
                value: 10.0,
                year: 2009,
                month: 1,
                day: 1,
                normalized: span.0,
            },
            Measurement {
                value: 20.0,
                year: 2009,
                month: 12,
                day: 31,
                normalized: span.1,
            },
        ];
        SensorPoint {
            id: id.to_string(),
            x,
            y,
            measurements: Arc::new(measurements),
        }
    }

    fn table(points: Vec<SensorPoint>) -> HashMap<String, SensorPoint> {
        points.into_iter().map(|p| (p.id.clone(), p)).collect()
    }

    #[test]
    fn test_distance_properties() {
        // Identity, symmetry, non-negativity
        assert_eq!(euclidean_distance(3.0, 4.0, 3.0, 4.0), 0.0);
        assert_eq!(
            euclidean_distance(1.0, 2.0, 4.0, 6.0),
            euclidean_distance(4.0, 6.0, 1.0, 2.0)
        );
        assert!(euclidean_distance(-5.0, -5.0, 2.0, 3.0) >= 0.0);
        // 3-4-5 triangle
        assert_eq!(euclidean_distance(0.0, 0.0, 3.0, 4.0), 5.0);
    }

    #[test]
    fn test_cache_entry_is_sorted_and_complete() {
        let points = table(vec![
            point("far", 10.0, 0.0, (1.0, 365.0)),
            point("near", 1.0, 0.0, (1.0, 365.0)),
            point("mid", 5.0, 0.0, (1.0, 365.0)),
        ]);
        let cache = NeighborCache::new();
        let sorted = cache.sorted_neighbors(0.0, 0.0, &points);

        assert_eq!(sorted.len(), points.len());
        assert!(sorted.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert_eq!(sorted[0].point_id, "near");
        assert_eq!(sorted[2].point_id, "far");
    }

    #[test]
    fn test_cache_reused_across_query_times() {
        let points = table(vec![
            point("a", 1.0, 0.0, (1.0, 100.0)),
            point("b", 2.0, 0.0, (200.0, 300.0)),
        ]);
        let cache = NeighborCache::new();

        let first = cache.sorted_neighbors(0.0, 0.0, &points);
        // Same ranking must back queries at different times
        let early = cache.nearest_neighbors(0.0, 0.0, 50.0, 1, true, &points).unwrap();
        let late = cache.nearest_neighbors(0.0, 0.0, 250.0, 1, true, &points).unwrap();

        assert_eq!(cache.len(), 1);
        let second = cache.sorted_neighbors(0.0, 0.0, &points);
        assert!(Arc::ptr_eq(&first, &second));

        // Time filter selects different qualifiers over the one ordering
        assert_eq!(early[0].point_id, "a");
        assert_eq!(late[0].point_id, "b");
    }

    #[test]
    fn test_distinct_coordinates_get_distinct_entries() {
        let points = table(vec![point("a", 1.0, 0.0, (1.0, 365.0))]);
        let cache = NeighborCache::new();
        cache.sorted_neighbors(0.0, 0.0, &points);
        cache.sorted_neighbors(5.0, 5.0, &points);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_time_filter_preserves_distance_order_among_qualifiers() {
        let points = table(vec![
            point("near-invalid", 1.0, 0.0, (500.0, 600.0)),
            point("mid-valid", 2.0, 0.0, (1.0, 365.0)),
            point("far-valid", 3.0, 0.0, (1.0, 365.0)),
        ]);
        let cache = NeighborCache::new();
        let result = cache.nearest_neighbors(0.0, 0.0, 100.0, 2, true, &points).unwrap();
        assert_eq!(result[0].point_id, "mid-valid");
        assert_eq!(result[1].point_id, "far-valid");
    }

    #[test]
    fn test_insufficient_time_valid_neighbors_errors() {
        let points = table(vec![
            point("a", 1.0, 0.0, (1.0, 365.0)),
            point("b", 2.0, 0.0, (1.0, 365.0)),
            point("c", 3.0, 0.0, (500.0, 600.0)),
        ]);
        let cache = NeighborCache::new();
        let err = cache
            .nearest_neighbors(0.0, 0.0, 100.0, 5, true, &points)
            .unwrap_err();
        match err {
            InterpolateError::InsufficientNeighbors {
                requested,
                available,
                ..
            } => {
                assert_eq!(requested, 5);
                assert_eq!(available, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_zero_k_is_a_config_error_not_nan_fuel() {
        let points = table(vec![point("a", 1.0, 0.0, (1.0, 365.0))]);
        let cache = NeighborCache::new();
        for time_filter in [true, false] {
            let err = cache
                .nearest_neighbors(0.0, 0.0, 100.0, 0, time_filter, &points)
                .unwrap_err();
            assert!(matches!(err, InterpolateError::Config { .. }));
        }
    }

    #[test]
    fn test_filter_disabled_returns_prefix_verbatim() {
        let points = table(vec![
            point("near", 1.0, 0.0, (500.0, 600.0)),
            point("far", 2.0, 0.0, (1.0, 365.0)),
        ]);
        let cache = NeighborCache::new();
        // t outside "near"'s span, but filtering is off
        let result = cache.nearest_neighbors(0.0, 0.0, 100.0, 1, false, &points).unwrap();
        assert_eq!(result[0].point_id, "near");
    }

    #[test]
    fn test_k_larger_than_table_errors_without_filter() {
        let points = table(vec![point("a", 1.0, 0.0, (1.0, 365.0))]);
        let cache = NeighborCache::new();
        let err = cache
            .nearest_neighbors(0.0, 0.0, 100.0, 3, false, &points)
            .unwrap_err();
        assert!(matches!(
            err,
            InterpolateError::InsufficientNeighbors { available: 1, .. }
        ));
    }

    #[test]
    fn test_legacy_uncached_ranking_diverges_from_cached() {
        // A near invalid point and a far valid one: the cached path filters
        // the invalid one out, the legacy path also picks the valid one but
        // keeps invalid points as fillers when k exceeds the valid count.
        let points = table(vec![
            point("near-invalid", 1.0, 0.0, (500.0, 600.0)),
            point("far-valid", 9.0, 0.0, (1.0, 365.0)),
        ]);

        let legacy = nearest_neighbors_uncached(0.0, 0.0, 100.0, 2, &points);
        assert_eq!(legacy[0].point_id, "far-valid");
        assert_eq!(legacy[1].point_id, "near-invalid");

        let cache = NeighborCache::new();
        let err = cache
            .nearest_neighbors(0.0, 0.0, 100.0, 2, true, &points)
            .unwrap_err();
        assert!(matches!(
            err,
            InterpolateError::InsufficientNeighbors { available: 1, .. }
        ));
    }

    #[test]
    fn test_concurrent_first_touch_computes_once() {
        let points = table(vec![
            point("a", 1.0, 0.0, (1.0, 365.0)),
            point("b", 2.0, 0.0, (1.0, 365.0)),
        ]);
        let cache = NeighborCache::new();
        let entries: Vec<Arc<Vec<Neighbor>>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| cache.sorted_neighbors(0.0, 0.0, &points)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for entry in &entries[1..] {
            assert!(Arc::ptr_eq(&entries[0], entry));
        }
        assert_eq!(cache.len(), 1);
    }
}
