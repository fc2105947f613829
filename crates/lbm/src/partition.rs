//! Column partitioning of the lattice across the worker pool.

use std::ops::Range;

/// Split `cols` lattice columns into `workers` contiguous, disjoint ranges
/// by even stride division; the last worker absorbs any remainder columns.
///
/// Callers must validate `1 <= workers <= cols` first (see
/// `LatticeConfig::validate`).
pub fn column_ranges(cols: usize, workers: usize) -> Vec<Range<usize>> {
    debug_assert!(workers >= 1 && workers <= cols);

    let stride = cols / workers;
    (0..workers)
        .map(|w| {
            let start = w * stride;
            let end = if w == workers - 1 { cols } else { start + stride };
            start..end
        })
        .collect()
}
