//! Grouping of features by attribute tag, by type, or by contiguity.

use ahash::AHashMap;
use anyhow::Result;
use log::debug;

use crate::parser::attribute::TagMatcher;
use crate::set::{FeatureGroup, FeatureSet, Grouping};
use crate::transform::sort::sort;
use crate::types::Feature;

/// Tag name recorded for a grouping by feature type.
pub const TYPE_GROUP_TAG: &str = "feature";

/// Partition the features into groups keyed by `key`, in arena order.
///
/// Groups are created on first encounter of a key; their span starts as the
/// first member's interval and widens as members are added.
fn build_grouping<F>(set: &mut FeatureSet, tag: &str, key: F)
where
    F: Fn(&Feature) -> String,
{
    set.ungroup();

    let mut index: AHashMap<String, usize> = AHashMap::new();
    let mut groups: Vec<FeatureGroup> = Vec::with_capacity((set.len() / 10).max(1));

    for (i, feature) in set.features.iter().enumerate() {
        let name = key(feature);
        match index.get(&name) {
            Some(&g) => groups[g].add(feature, i),
            None => {
                index.insert(name.clone(), groups.len());
                groups.push(FeatureGroup::new(name, feature, i));
            }
        }
    }

    debug!("grouped {} features into {} groups by '{}'", set.len(), groups.len(), tag);
    set.grouping = Some(Grouping::new(tag.to_string(), groups, set.len()));
}

/// Group features by the value of `tag` in their attribute string.
///
/// All features with a missing value are placed in a single group whose name
/// is the empty string.
pub fn group_by_tag(set: &mut FeatureSet, tag: &str) -> Result<()> {
    let matcher = TagMatcher::new(tag)?;
    build_grouping(set, tag, |f| {
        matcher.value(&f.attribute).unwrap_or_default().to_string()
    });
    Ok(())
}

/// Group features by feature type.
pub fn group_by_type(set: &mut FeatureSet) {
    build_grouping(set, TYPE_GROUP_TAG, |f| f.feature_type.clone());
}

/// Remove the grouping without touching the features.
pub fn ungroup(set: &mut FeatureSet) {
    set.ungroup();
}

/// Group contiguous features, e.g. an exon and its adjacent splice sites.
///
/// The set is sorted first. If it is already grouped (e.g. by transcript),
/// sub-groups are formed within each group and named `<outer>.<n>`;
/// otherwise the whole set is scanned and runs are named `<n>`. A new run
/// starts at a gap of more than one base or a change of strand. The run name
/// is appended to each feature's attribute as `new_tag "<name>"` and the set
/// is regrouped by `new_tag`. The resulting feature order reflects the initial
/// grouping, not the new one.
pub fn group_contiguous(set: &mut FeatureSet, new_tag: &str) -> Result<()> {
    sort(set);

    // (outer name, member indices); after sort, grouped members are contiguous
    let runs: Vec<(Option<String>, Vec<usize>)> = match set.grouping() {
        Some(grouping) => grouping
            .groups
            .iter()
            .map(|g| (Some(g.name.clone()), g.members.clone()))
            .collect(),
        None => vec![(None, (0..set.len()).collect())],
    };

    for (outer, members) in runs {
        let mut idx = 0;
        let mut last: Option<usize> = None;

        for i in members {
            let starts_run = match last {
                None => true,
                Some(l) => {
                    let prev = &set.features[l];
                    let f = &set.features[i];
                    f.start > prev.end + 1 || f.strand != prev.strand
                }
            };
            if starts_run {
                idx += 1;
            }

            let name = match outer.as_deref() {
                Some(outer) if !outer.is_empty() => format!("{}.{}", outer, idx),
                _ => idx.to_string(),
            };

            let f = &mut set.features[i];
            if f.attribute.is_empty() || f.attribute == "." {
                f.attribute.clear();
            } else {
                f.attribute.push_str(" ; ");
            }
            f.attribute.push_str(&format!("{} \"{}\"", new_tag, name));

            // the run extends as far as its furthest-reaching member
            if last.map_or(true, |l| set.features[i].end > set.features[l].end) {
                last = Some(i);
            }
        }
    }

    group_by_tag(set, new_tag)
}
