//! Inverse-distance-weighted value estimation.
//!
//! Weights are inversely proportional to distance raised to the power
//! parameter `p`; each neighbor contributes a temporally interpolated
//! value. The temporal step interpolates linearly between the FIRST and
//! LAST measurements of the neighbor's entire series, not between the two
//! measurements bracketing `t`. That endpoint-based scheme is the
//! documented contract of this engine, preserved as-is; treat results as
//! an endpoint trend estimate rather than a piecewise reconstruction.

use crate::error::{InterpolateError, Result};
use crate::Neighbor;

/// IDW weight of `neighbor` within `neighbors`:
/// `(1/d)^p / sum((1/d_j)^p)`.
///
/// Callers must rule out zero distances first (see [`idw_estimate`]).
pub fn idw_weight(p: f64, neighbor: &Neighbor, neighbors: &[Neighbor]) -> f64 {
    let denom: f64 = neighbors
        .iter()
        .map(|n| (1.0 / n.distance).powf(p))
        .sum();
    (1.0 / neighbor.distance).powf(p) / denom
}

/// Temporal value of a neighbor at ordinate `t`, linear between the
/// endpoints of its series.
///
/// A single-measurement series evaluates to that measurement's value. A
/// longer series whose endpoints share one ordinate cannot support the
/// interpolation and fails with [`InterpolateError::DegenerateSeries`].
pub fn temporal_value(t: f64, neighbor: &Neighbor) -> Result<f64> {
    let first = neighbor.measurements.first();
    let last = neighbor.measurements.last();
    let (first, last) = match (first, last) {
        (Some(f), Some(l)) => (f, l),
        _ => {
            return Err(InterpolateError::DegenerateSeries {
                point_id: neighbor.point_id.clone(),
            })
        }
    };

    if neighbor.measurements.len() == 1 {
        return Ok(first.value);
    }

    let (t1, t2) = (first.normalized, last.normalized);
    if t1 == t2 {
        return Err(InterpolateError::DegenerateSeries {
            point_id: neighbor.point_id.clone(),
        });
    }

    Ok(((t2 - t) / (t2 - t1)) * first.value + ((t - t1) / (t2 - t1)) * last.value)
}

/// IDW estimate at ordinate `t` from an already-selected neighbor set.
///
/// A neighbor at distance 0 means the query coincides with that sample
/// point; its temporal value is returned directly, unweighted, instead of
/// dividing by zero.
pub fn idw_estimate(t: f64, p: f64, neighbors: &[Neighbor]) -> Result<f64> {
    if let Some(coincident) = neighbors.iter().find(|n| n.distance == 0.0) {
        return temporal_value(t, coincident);
    }

    let mut sum_weighted = 0.0;
    let mut sum_weights = 0.0;
    for neighbor in neighbors {
        let weight = idw_weight(p, neighbor, neighbors);
        sum_weighted += weight * temporal_value(t, neighbor)?;
        sum_weights += weight;
    }
    // Weights sum to 1 by construction; the division guards float drift.
    Ok(sum_weighted / sum_weights)
}
