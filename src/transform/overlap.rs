//! Resolution of overlapping groups.
//!
//! Groups are visited once, in order. Kept groups are tracked in parallel
//! vectors sorted by start, so the run of kept groups a candidate overlaps can
//! be found by binary search instead of comparing against every group.

use anyhow::Result;
use log::debug;
use std::io::Write;

use crate::output::discard;
use crate::set::{FeatureGroup, FeatureSet};

/// Kept-group bookkeeping, all vectors parallel and sorted by start.
#[derive(Default)]
struct KeptGroups {
    starts: Vec<i64>,
    ends: Vec<i64>,
    scores: Vec<f64>,
    groups: Vec<FeatureGroup>,
}

impl KeptGroups {
    fn insert(&mut self, at: usize, group: FeatureGroup, score: f64) {
        self.starts.insert(at, group.start);
        self.ends.insert(at, group.end);
        self.scores.insert(at, score);
        self.groups.insert(at, group);
    }

    fn push(&mut self, group: FeatureGroup, score: f64) {
        let at = self.groups.len();
        self.insert(at, group, score);
    }

    /// Remove kept groups `[lo, hi]` (inclusive) and return them.
    fn evict(&mut self, lo: usize, hi: usize) -> Vec<FeatureGroup> {
        self.starts.drain(lo..=hi);
        self.ends.drain(lo..=hi);
        self.scores.drain(lo..=hi);
        self.groups.drain(lo..=hi).collect()
    }
}

/// Find the contiguous run of kept groups intersecting `[start, end]`.
///
/// `prev` is the index of the last kept group whose start is `<= start`.
/// Returns the inclusive index range and the summed score of the run, or
/// `None` if nothing overlaps.
fn overlapping_run(
    kept: &KeptGroups,
    prev: Option<usize>,
    start: i64,
    end: i64,
) -> Option<(usize, usize, f64)> {
    let mut altscore = 0.0;

    // expand left
    let mut lo = prev.map_or(0, |p| p + 1);
    while lo > 0 && kept.ends[lo - 1] >= start {
        lo -= 1;
        altscore += kept.scores[lo];
    }

    // expand right
    let mut hi = prev.map_or(0, |p| p + 1);
    while hi < kept.starts.len() && kept.starts[hi] <= end {
        altscore += kept.scores[hi];
        hi += 1;
    }

    if lo == hi {
        None
    } else {
        Some((lo, hi - 1, altscore))
    }
}

/// Remove overlapping groups, keeping the higher-scoring side.
///
/// A group's score is the sum of its members' scores, or its span length if
/// none of its members is scored. When a group overlaps a run of already-kept
/// groups, it replaces the whole run only if its score is strictly greater
/// than the run's summed score; otherwise it is discarded. The features of
/// every discarded group are written to `discards` if given.
///
/// Groups should be sorted (see `sort`). On return the kept groups have
/// pairwise disjoint spans and the features are the concatenation of the
/// kept groups. Returns the number of groups discarded.
pub fn remove_overlaps(set: &mut FeatureSet, mut discards: Option<&mut dyn Write>) -> Result<usize> {
    set.require_grouping("remove_overlaps")?;
    let Some(grouping) = set.grouping.as_mut() else {
        return Ok(0);
    };

    let candidates = std::mem::take(&mut grouping.groups);
    let mut kept = KeptGroups::default();
    let mut discarded: Vec<FeatureGroup> = Vec::new();
    let mut last_end = i64::MIN;

    for group in candidates {
        let score = group.score(&set.features);

        // common case: starts after everything kept so far
        if group.start > last_end {
            last_end = group.end;
            kept.push(group, score);
            continue;
        }

        let n_le = kept.starts.partition_point(|&s| s <= group.start);
        let prev = n_le.checked_sub(1);

        match overlapping_run(&kept, prev, group.start, group.end) {
            None => {
                last_end = last_end.max(group.end);
                kept.insert(n_le, group, score);
            }
            Some((lo, hi, altscore)) => {
                if score > altscore {
                    debug!(
                        "group '{}' ({}) replaces {} overlapping group(s) ({})",
                        group.name,
                        score,
                        hi - lo + 1,
                        altscore
                    );
                    discarded.extend(kept.evict(lo, hi));
                    last_end = last_end.max(group.end);
                    kept.insert(lo, group, score);
                } else {
                    discarded.push(group);
                }
            }
        }
    }

    for group in &discarded {
        for &idx in &group.members {
            discard(&mut discards, &set.features[idx])?;
        }
    }

    debug!(
        "remove_overlaps kept {} groups, discarded {}",
        kept.groups.len(),
        discarded.len()
    );

    grouping.groups = kept.groups;
    set.rebuild_from_groups();
    Ok(discarded.len())
}
