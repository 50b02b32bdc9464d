//! Ordering of features and groups.

use std::cmp::Ordering;

use crate::set::{FeatureGroup, FeatureSet};
use crate::types::Feature;

/// Order features by start, then by end.
///
/// This puts short features that overlap the ends of longer ones in a
/// sensible order.
pub fn compare_features(a: &Feature, b: &Feature) -> Ordering {
    a.start.cmp(&b.start).then(a.end.cmp(&b.end))
}

/// Order groups by their maintained span: start, then end.
///
/// The span is not recomputed from the members.
pub fn compare_groups(a: &FeatureGroup, b: &FeatureGroup) -> Ordering {
    a.start.cmp(&b.start).then(a.end.cmp(&b.end))
}

/// Sort a feature set.
///
/// Ungrouped sets are sorted directly. Grouped sets are sorted within each
/// group, then the groups are sorted by span, and the features are rewritten
/// as the concatenation of the groups in that order.
pub fn sort(set: &mut FeatureSet) {
    let Some(grouping) = set.grouping.as_mut() else {
        set.features.sort_by(compare_features);
        return;
    };

    let features = &set.features;
    for group in &mut grouping.groups {
        group
            .members
            .sort_by(|&a, &b| compare_features(&features[a], &features[b]));
    }
    grouping.groups.sort_by(compare_groups);
    set.rebuild_from_groups();
}

/// Whether the features are in (start, end) order.
pub fn is_sorted(features: &[Feature]) -> bool {
    features
        .windows(2)
        .all(|w| compare_features(&w[0], &w[1]) != Ordering::Greater)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_features() {
        let a = Feature::new("chr1", "t", "exon", 10, 20);
        let b = Feature::new("chr1", "t", "exon", 10, 15);
        let c = Feature::new("chr1", "t", "exon", 5, 50);
        assert_eq!(compare_features(&a, &b), Ordering::Greater);
        assert_eq!(compare_features(&c, &b), Ordering::Less);
        assert_eq!(compare_features(&a, &a), Ordering::Equal);
    }

    #[test]
    fn test_sort_ungrouped() {
        let mut set = FeatureSet::from_features(vec![
            Feature::new("chr1", "t", "exon", 30, 40),
            Feature::new("chr1", "t", "exon", 10, 20),
            Feature::new("chr1", "t", "exon", 10, 12),
        ]);
        sort(&mut set);
        let coords: Vec<(i64, i64)> = set.iter().map(|f| (f.start, f.end)).collect();
        assert_eq!(coords, vec![(10, 12), (10, 20), (30, 40)]);
        assert!(is_sorted(set.features()));
    }
}
