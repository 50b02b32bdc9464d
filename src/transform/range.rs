//! Coordinate-range operations: subsetting, reverse complement and offsets.

use log::debug;

use crate::set::FeatureSet;
use crate::types::{Feature, Strand};

/// Return a new set with copies of the features lying entirely within
/// `[start, end]`. Metadata is copied from `set`; the result is ungrouped.
///
/// With `reset_indices`, coordinates are made relative to the range, so a
/// feature at `start` begins at 1.
pub fn subset_range(set: &FeatureSet, start: i64, end: i64, reset_indices: bool) -> FeatureSet {
    let mut subset = FeatureSet::from_template(set);
    for feature in set.iter().filter(|f| f.contained_in(start, end)) {
        let mut copy = feature.clone();
        if reset_indices {
            copy.start -= start - 1;
            copy.end -= start - 1;
        }
        subset.features.push(copy);
    }
    subset
}

/// Return a new set with copies of every feature intersecting `[start, end]`.
/// Coordinates are never renumbered. The result may be empty.
pub fn subset_range_overlap(set: &FeatureSet, start: i64, end: i64) -> FeatureSet {
    let mut subset = FeatureSet::from_template(set);
    subset
        .features
        .extend(set.iter().filter(|f| f.overlaps(start, end)).cloned());
    subset
}

/// Like `subset_range_overlap`, for a set sorted by start and a series of
/// queries with non-decreasing ranges.
///
/// Scanning begins at `cursor` and stops at the first feature starting after
/// `end`. On return `cursor` points at the first matching feature, so the
/// next query can resume from there; it is left unchanged if nothing matched.
pub fn subset_range_overlap_sorted(
    set: &FeatureSet,
    start: i64,
    end: i64,
    cursor: &mut usize,
) -> FeatureSet {
    let mut subset = FeatureSet::from_template(set);
    let mut first_match: Option<usize> = None;

    for (i, feature) in set.features.iter().enumerate().skip(*cursor) {
        if feature.start > end {
            break;
        }
        if feature.overlaps(start, end) {
            first_match.get_or_insert(i);
            subset.features.push(feature.clone());
        }
    }

    if let Some(i) = first_match {
        *cursor = i;
    }
    subset
}

/// Mirror every feature within `[range_start, range_end]`, flip `+`/`-`
/// strands and reverse the order of the slice.
pub fn reverse_complement(features: &mut [Feature], range_start: i64, range_end: i64) {
    for f in features.iter_mut() {
        let start = f.start;
        f.start = range_end - f.end + range_start;
        f.end = range_end - start + range_start;
        f.strand = f.strand.flip();
    }
    features.reverse();
}

/// True if no feature is on the `+` strand and at least one is on `-`.
pub fn reverse_strand_only(features: &[Feature]) -> bool {
    let mut any_negative = false;
    for f in features {
        match f.strand {
            Strand::Positive => return false,
            Strand::Negative => any_negative = true,
            Strand::Unknown => {}
        }
    }
    any_negative
}

/// Shift every feature by `offset`.
///
/// Features ending before position 1, or (with `max_coord`) starting after
/// it, are dropped; the rest are clamped into `[1, max_coord]`. A
/// `max_coord` of zero or less means no upper bound. The grouping is
/// dropped. Returns the number of features removed.
pub fn add_offset(set: &mut FeatureSet, offset: i64, max_coord: Option<i64>) -> usize {
    let max_coord = max_coord.filter(|&max| max > 0);
    set.ungroup();
    let before = set.len();

    set.features.retain_mut(|f| {
        f.start += offset;
        f.end += offset;
        if f.end < 1 || max_coord.is_some_and(|max| f.start > max) {
            return false;
        }
        f.start = f.start.max(1);
        if let Some(max) = max_coord {
            f.end = f.end.min(max);
        }
        true
    });

    let removed = before - set.len();
    if removed > 0 {
        debug!("add_offset dropped {} features outside the coordinate range", removed);
    }
    removed
}
