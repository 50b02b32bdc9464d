//! Filtering by type or group, and small per-group attribute utilities.

use anyhow::Result;
use indexmap::IndexMap;
use log::debug;
use std::io::Write;

use crate::config::Config;
use crate::output::discard;
use crate::set::FeatureSet;
use crate::transform::group::{group_by_tag, group_by_type, TYPE_GROUP_TAG};
use crate::types::Feature;

/// Keep only features whose type is listed in `types`, or, with `exclude`,
/// only those whose type is not listed.
///
/// Removed features are written to `discards` if given. If anything was
/// removed the grouping is dropped. Returns the number of features removed.
pub fn filter_by_type<S: AsRef<str>>(
    set: &mut FeatureSet,
    types: &[S],
    exclude: bool,
    mut discards: Option<&mut dyn Write>,
) -> Result<usize> {
    let keep: Vec<bool> = set
        .features
        .iter()
        .map(|f| types.iter().any(|t| f.is_type(t.as_ref())) != exclude)
        .collect();

    for (feature, _) in set.features.iter().zip(&keep).filter(|&(_, &k)| !k) {
        discard(&mut discards, feature)?;
    }

    let removed = keep.iter().filter(|&&k| !k).count();
    if removed > 0 {
        set.ungroup();
        set.retain_indices(&keep);
        debug!("filter_by_type removed {} features", removed);
    }
    Ok(removed)
}

/// Keep only the members of groups whose name is listed in `names`, then
/// regroup the same way: by type for a type grouping, by tag otherwise.
pub fn filter_by_group<S: AsRef<str>>(set: &mut FeatureSet, names: &[S]) -> Result<()> {
    let grouping = set.require_grouping("filter_by_group")?;
    let tag = grouping.tag.clone();

    let mut keep = vec![false; set.len()];
    for group in &grouping.groups {
        if names.iter().any(|n| n.as_ref() == group.name) {
            for &idx in &group.members {
                keep[idx] = true;
            }
        }
    }

    set.ungroup();
    set.retain_indices(&keep);
    if tag == TYPE_GROUP_TAG {
        group_by_type(set);
        Ok(())
    } else {
        group_by_tag(set, &tag)
    }
}

/// Prefix each feature's attribute with a gene id tag naming its group, e.g.
/// `gene_id "T1" ; transcript_id "T1";`.
pub fn add_gene_id(set: &mut FeatureSet, config: &Config) -> Result<()> {
    let grouping = set.require_grouping("add_gene_id")?;
    let prefixes: Vec<(usize, String)> = grouping
        .groups
        .iter()
        .flat_map(|g| {
            let prefix = format!("{} \"{}\" ; ", config.gene_id_tag, g.name);
            g.members.iter().map(move |&idx| (idx, prefix.clone()))
        })
        .collect();

    for (idx, prefix) in prefixes {
        let feature = &mut set.features[idx];
        feature.attribute.insert_str(0, &prefix);
    }
    Ok(())
}

/// Split the features by type, preserving the order types are first seen.
pub fn partition_by_type(set: &FeatureSet) -> IndexMap<String, Vec<&Feature>> {
    let mut partition: IndexMap<String, Vec<&Feature>> = IndexMap::new();
    for feature in set {
        partition
            .entry(feature.feature_type.clone())
            .or_default()
            .push(feature);
    }
    partition
}
