//! Merging of adjacent or overlapping features of the same type.

use log::debug;

use crate::set::FeatureSet;
use crate::types::Feature;

/// Whether `current` can be merged into `last`: adjacent or overlapping,
/// same strand, same type, and neither carries a frame.
fn mergeable(last: &Feature, current: &Feature) -> bool {
    last.end >= current.start - 1
        && last.strand == current.strand
        && last.feature_type == current.feature_type
        && last.frame.is_none()
        && current.frame.is_none()
}

/// Merge `current` into `last`. Scores are summed only if both are present;
/// `current`'s attribute is dropped. A contained feature never shortens `last`.
fn absorb(last: &mut Feature, current: &Feature) {
    last.end = last.end.max(current.end);
    if let (Some(a), Some(b)) = (last.score, current.score) {
        last.score = Some(a + b);
    }
}

/// Single left-to-right merge scan. When `within_groups` is set, features
/// owned by different groups are never merged. Returns the keep mask.
fn merge_scan(set: &mut FeatureSet, within_groups: bool) -> Vec<bool> {
    let mut keep = vec![true; set.features.len()];
    let mut last = 0;

    for i in 1..set.features.len() {
        let same_group = match (&set.grouping, within_groups) {
            (Some(grouping), true) => grouping.owner_of(i) == grouping.owner_of(last),
            _ => true,
        };

        if same_group && mergeable(&set.features[last], &set.features[i]) {
            let current = set.features[i].clone();
            absorb(&mut set.features[last], &current);
            keep[i] = false;
        } else {
            last = i;
        }
    }

    keep
}

/// Merge overlapping or adjacent features of the same type, across groups.
///
/// Features must be sorted. Features with a frame are never merged. If any
/// merge happened the grouping is dropped, since merged features may have
/// belonged to different groups. Returns the number of features merged away.
pub fn flatten(set: &mut FeatureSet) -> usize {
    if set.len() <= 1 {
        return 0;
    }

    let keep = merge_scan(set, false);
    let merged = keep.iter().filter(|&&k| !k).count();
    if merged > 0 {
        set.ungroup();
        set.retain_indices(&keep);
        debug!("flatten merged {} features", merged);
    }
    merged
}

/// Merge overlapping or adjacent features of the same type, but only within
/// a group.
///
/// Features must be sorted. The grouping is kept: merged-away features are
/// removed from their group's member list. On an ungrouped set this is the
/// same as `flatten`. Returns the number of features merged away.
pub fn flatten_within_groups(set: &mut FeatureSet) -> usize {
    if set.len() <= 1 {
        return 0;
    }

    let keep = merge_scan(set, true);
    let merged = keep.iter().filter(|&&k| !k).count();
    if merged > 0 {
        set.retain_indices(&keep);
        debug!("flatten_within_groups merged {} features", merged);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::group::group_by_tag;
    use crate::types::{Frame, Strand};

    fn feat(start: i64, end: i64, score: Option<f64>) -> Feature {
        let mut f = Feature::new("chr1", "t", "exon", start, end).with_strand(Strand::Positive);
        f.score = score;
        f
    }

    #[test]
    fn test_flatten_merges_overlap() {
        let mut set = FeatureSet::from_features(vec![
            feat(1, 10, Some(2.0)),
            feat(5, 15, Some(3.0)),
        ]);
        assert_eq!(flatten(&mut set), 1);
        assert_eq!(set.len(), 1);
        let f = &set.features()[0];
        assert_eq!((f.start, f.end), (1, 15));
        assert_eq!(f.score, Some(5.0));
    }

    #[test]
    fn test_flatten_merges_adjacent_only() {
        let mut set = FeatureSet::from_features(vec![
            feat(1, 10, None),
            feat(11, 20, None),
            feat(22, 30, None),
        ]);
        flatten(&mut set);
        let coords: Vec<(i64, i64)> = set.iter().map(|f| (f.start, f.end)).collect();
        assert_eq!(coords, vec![(1, 20), (22, 30)]);
    }

    #[test]
    fn test_flatten_contained_feature() {
        let mut set = FeatureSet::from_features(vec![feat(1, 100, Some(1.0)), feat(5, 10, Some(1.0))]);
        flatten(&mut set);
        let f = &set.features()[0];
        assert_eq!((f.start, f.end), (1, 100));
        assert_eq!(f.score, Some(2.0));
    }

    #[test]
    fn test_flatten_keeps_last_score_when_one_is_null() {
        let mut set = FeatureSet::from_features(vec![feat(1, 10, Some(2.0)), feat(5, 15, None)]);
        flatten(&mut set);
        assert_eq!(set.features()[0].score, Some(2.0));

        let mut set = FeatureSet::from_features(vec![feat(1, 10, None), feat(5, 15, Some(2.0))]);
        flatten(&mut set);
        assert_eq!(set.features()[0].score, None);
    }

    #[test]
    fn test_flatten_respects_type_strand_frame() {
        let mut set = FeatureSet::from_features(vec![
            feat(1, 10, None),
            feat(5, 15, None).with_strand(Strand::Negative),
        ]);
        assert_eq!(flatten(&mut set), 0);

        let mut cds = feat(5, 15, None);
        cds.feature_type = "CDS".to_string();
        let mut set = FeatureSet::from_features(vec![feat(1, 10, None), cds]);
        assert_eq!(flatten(&mut set), 0);

        let framed = feat(5, 15, None).with_frame(Frame::from_external(0).unwrap());
        let mut set = FeatureSet::from_features(vec![feat(1, 10, None), framed]);
        assert_eq!(flatten(&mut set), 0);
    }

    #[test]
    fn test_flatten_drops_grouping() {
        let mut set = FeatureSet::from_features(vec![
            feat(1, 10, None).with_attribute("id \"a\""),
            feat(5, 15, None).with_attribute("id \"b\""),
        ]);
        group_by_tag(&mut set, "id").unwrap();
        flatten(&mut set);
        assert!(!set.is_grouped());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_flatten_within_groups() {
        let mut set = FeatureSet::from_features(vec![
            feat(1, 10, None).with_attribute("id \"a\""),
            feat(5, 15, None).with_attribute("id \"b\""),
            feat(12, 20, None).with_attribute("id \"b\""),
        ]);
        group_by_tag(&mut set, "id").unwrap();
        assert_eq!(flatten_within_groups(&mut set), 1);

        assert!(set.is_grouped());
        let coords: Vec<(i64, i64)> = set.iter().map(|f| (f.start, f.end)).collect();
        assert_eq!(coords, vec![(1, 10), (5, 20)]);
        assert_eq!(set.group_name(1).unwrap(), "b");
        assert_eq!(set.grouping().unwrap().groups[1].members, vec![1]);
    }
}
