//! In-place partition-exchange sort over a caller-supplied total order.
//!
//! The neighbor cache needs a deterministic sort parameterized by a
//! predicate, so the primitive takes `lte(a, b)` directly instead of going
//! through `Ord`. Single pivot (last element of the active subrange),
//! Lomuto partitioning, recursion on both sides. No pivot randomization
//! and no worst-case guard: expected input sizes are hundreds to low
//! thousands of points, where the plain scheme is fast; adversarial
//! already-sorted input degrades to O(n²).
//!
//! Not stable: elements the predicate reports as equal may be reordered.

use crate::Neighbor;

/// Sort `items` in place so that `lte(items[i], items[i+1])` holds for all
/// adjacent pairs. `lte` must be a total order ("less than or equal").
pub fn quicksort_by<T, F>(items: &mut [T], lte: &F)
where
    F: Fn(&T, &T) -> bool,
{
    let len = items.len();
    if len < 2 {
        return;
    }

    // Lomuto partition with the last element as pivot: everything that
    // compares lte to the pivot is swapped into a growing left boundary,
    // then the pivot lands on the boundary itself.
    let mut boundary = 0;
    for i in 0..len - 1 {
        if lte(&items[i], &items[len - 1]) {
            items.swap(i, boundary);
            boundary += 1;
        }
    }
    items.swap(boundary, len - 1);

    let (left, right) = items.split_at_mut(boundary);
    quicksort_by(left, lte);
    quicksort_by(&mut right[1..], lte);
}

/// Canonical neighbor order: ascending distance only.
///
/// This is the order the neighbor cache stores; time validity is applied
/// as a post-filter over it, never baked into the ranking.
pub fn by_distance(a: &Neighbor, b: &Neighbor) -> bool {
    a.distance <= b.distance
}

/// Legacy neighbor order: time-valid neighbors first, ties by distance.
///
/// Used only by the uncached search path kept for comparison with the
/// historical behavior. This ranking is NOT equivalent to distance-only
/// order plus post-filtering: with time filtering enabled, a distant
/// time-valid neighbor outranks a near invalid one here, which can change
/// which k neighbors are selected. The cached path is canonical.
pub fn by_time_validity_then_distance(t: f64) -> impl Fn(&Neighbor, &Neighbor) -> bool {
    move |a: &Neighbor, b: &Neighbor| {
        let a_valid = a.covers_time(t);
        let b_valid = b.covers_time(t);
        if a_valid != b_valid {
            return a_valid;
        }
        a.distance <= b.distance
    }
}
