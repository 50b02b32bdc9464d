//! Feature sets and their groupings.
//!
//! A `FeatureSet` owns its features in a single arena (`Vec<Feature>`) whose
//! order is meaningful. A `Grouping` never owns features: each `FeatureGroup`
//! holds indices into the arena, and the grouping keeps an owner table mapping
//! every arena index back to its group. Any operation that moves or removes
//! arena slots must either remap those indices or drop the grouping.

use anyhow::{anyhow, bail, Result};
use chrono::{Datelike, Local};
use log::debug;

use crate::config::DEFAULT_GFF_VERSION;
use crate::types::{Feature, Metadata};

/// A named partition of features with a maintained span.
#[derive(Debug, Clone)]
pub struct FeatureGroup {
    pub name: String,
    /// Minimum start over members. Widened as members are added, never narrowed.
    pub start: i64,
    /// Maximum end over members. Widened as members are added, never narrowed.
    pub end: i64,
    /// Indices into the owning set's feature arena.
    pub members: Vec<usize>,
}

impl FeatureGroup {
    /// Create a group whose span is initialized from its first member.
    pub fn new(name: String, first: &Feature, index: usize) -> Self {
        FeatureGroup {
            name,
            start: first.start,
            end: first.end,
            members: vec![index],
        }
    }

    /// Add a member and widen the span to cover it.
    pub fn add(&mut self, feature: &Feature, index: usize) {
        if feature.start < self.start {
            self.start = feature.start;
        }
        if feature.end > self.end {
            self.end = feature.end;
        }
        self.members.push(index);
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Span length (end - start + 1).
    pub fn span(&self) -> i64 {
        self.end - self.start + 1
    }

    /// Rough score used to arbitrate between overlapping groups: the sum of
    /// member scores if any member has one, otherwise the span length.
    pub fn score(&self, features: &[Feature]) -> f64 {
        let mut total = 0.0;
        let mut has_scores = false;
        for &idx in &self.members {
            if let Some(score) = features[idx].score {
                total += score;
                has_scores = true;
            }
        }
        if has_scores {
            total
        } else {
            self.span() as f64
        }
    }
}

/// A tag name plus the groups built from it.
#[derive(Debug, Clone)]
pub struct Grouping {
    pub tag: String,
    pub groups: Vec<FeatureGroup>,
    /// owner[feature_index] = group index.
    owner: Vec<usize>,
}

impl Grouping {
    /// Build a grouping from a list of groups covering `n_features` arena slots.
    pub(crate) fn new(tag: String, groups: Vec<FeatureGroup>, n_features: usize) -> Self {
        let mut grouping = Grouping {
            tag,
            groups,
            owner: Vec::new(),
        };
        grouping.relink(n_features);
        grouping
    }

    /// Recompute the owner table from the member lists.
    pub(crate) fn relink(&mut self, n_features: usize) {
        let mut owner = vec![usize::MAX; n_features];
        for (g, group) in self.groups.iter().enumerate() {
            for &idx in &group.members {
                owner[idx] = g;
            }
        }
        self.owner = owner;
    }

    /// Index of the group owning arena slot `feature_index`, if any.
    pub fn owner_of(&self, feature_index: usize) -> Option<usize> {
        match self.owner.get(feature_index) {
            Some(&g) if g != usize::MAX => Some(g),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Find a group by name (linear scan).
    pub fn find(&self, name: &str) -> Option<&FeatureGroup> {
        self.groups.iter().find(|g| g.name == name)
    }
}

/// An ordered collection of features plus optional metadata and grouping.
#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    pub metadata: Metadata,
    pub(crate) features: Vec<Feature>,
    pub(crate) grouping: Option<Grouping>,
}

impl FeatureSet {
    /// Create an empty set with empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty set carrying the same metadata as `template`.
    pub fn from_template(template: &FeatureSet) -> Self {
        FeatureSet {
            metadata: template.metadata.clone(),
            ..Default::default()
        }
    }

    /// Create an empty set with the default GFF version, the given source
    /// and source version, and today's date.
    pub fn new_init(source: &str, source_version: &str) -> Self {
        let today = Local::now();
        FeatureSet {
            metadata: Metadata {
                gff_version: DEFAULT_GFF_VERSION.to_string(),
                source: source.to_string(),
                source_version: source_version.to_string(),
                date: format!("{}-{}-{}", today.year(), today.month(), today.day()),
            },
            ..Default::default()
        }
    }

    /// Create an ungrouped set from features, in the given order.
    pub fn from_features(features: Vec<Feature>) -> Self {
        FeatureSet {
            features,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Features in arena order.
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Mutable access to feature contents.
    ///
    /// Slots can't be added, removed or reordered through this slice, so the
    /// grouping stays consistent; group spans are not updated.
    pub fn features_mut(&mut self) -> &mut [Feature] {
        &mut self.features
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }

    /// Consume the set and return its features in arena order.
    pub fn into_features(self) -> Vec<Feature> {
        self.features
    }

    /// Append a feature. If the set is grouped the grouping is dropped, since
    /// the new feature belongs to no group.
    pub fn push(&mut self, feature: Feature) {
        if self.grouping.is_some() {
            debug!("push on a grouped set; dropping grouping");
            self.ungroup();
        }
        self.features.push(feature);
    }

    /// Remove all features and the grouping. Metadata is kept.
    pub fn clear(&mut self) {
        self.features.clear();
        self.grouping = None;
    }

    pub fn grouping(&self) -> Option<&Grouping> {
        self.grouping.as_ref()
    }

    pub fn is_grouped(&self) -> bool {
        self.grouping.is_some()
    }

    /// Drop the grouping without touching the features.
    pub fn ungroup(&mut self) {
        self.grouping = None;
    }

    /// Features of group `g`, in member order. Empty if the set is ungrouped
    /// or there is no group `g`.
    pub fn group_features(&self, g: usize) -> Vec<&Feature> {
        match self.grouping.as_ref().and_then(|grouping| grouping.groups.get(g)) {
            Some(group) => group.members.iter().map(|&idx| &self.features[idx]).collect(),
            None => Vec::new(),
        }
    }

    /// Return the grouping or an error naming the operation that needed it.
    pub(crate) fn require_grouping(&self, operation: &str) -> Result<&Grouping> {
        self.grouping
            .as_ref()
            .ok_or_else(|| anyhow!("{} requires groups", operation))
    }

    /// Index of the group that owns the feature at `feature_index`.
    pub fn group_idx(&self, feature_index: usize) -> Result<usize> {
        let grouping = self.require_grouping("group_idx")?;
        grouping.owner_of(feature_index).ok_or_else(|| {
            anyhow!(
                "group_idx couldn't find feature {} in any group",
                feature_index
            )
        })
    }

    /// Group index and position within that group's member list.
    pub fn group_position(&self, feature_index: usize) -> Result<(usize, usize)> {
        let g = self.group_idx(feature_index)?;
        let grouping = self.require_grouping("group_position")?;
        match grouping.groups[g]
            .members
            .iter()
            .position(|&idx| idx == feature_index)
        {
            Some(pos) => Ok((g, pos)),
            None => bail!(
                "feature {} is owned by group {} but not listed as a member",
                feature_index,
                g
            ),
        }
    }

    /// Name of the group that owns the feature at `feature_index`.
    pub fn group_name(&self, feature_index: usize) -> Result<&str> {
        let g = self.group_idx(feature_index)?;
        let grouping = self.require_grouping("group_name")?;
        Ok(&grouping.groups[g].name)
    }

    /// Append a synthesized feature to the arena and to group `g`.
    pub(crate) fn push_to_group(&mut self, g: usize, feature: Feature) -> usize {
        let idx = self.features.len();
        if let Some(grouping) = self.grouping.as_mut() {
            grouping.groups[g].add(&feature, idx);
            grouping.owner.push(g);
        }
        self.features.push(feature);
        idx
    }

    /// Rewrite the arena as the concatenation of the groups' members, in
    /// group order, and remap member indices accordingly. Features that are
    /// not a member of any group are dropped.
    pub(crate) fn rebuild_from_groups(&mut self) {
        let Some(grouping) = self.grouping.as_mut() else {
            return;
        };
        let mut slots: Vec<Option<Feature>> =
            std::mem::take(&mut self.features).into_iter().map(Some).collect();
        let mut rebuilt = Vec::with_capacity(slots.len());

        for group in &mut grouping.groups {
            let mut members = Vec::with_capacity(group.members.len());
            for &idx in &group.members {
                if let Some(feature) = slots.get_mut(idx).and_then(Option::take) {
                    members.push(rebuilt.len());
                    rebuilt.push(feature);
                }
            }
            group.members = members;
        }

        grouping.relink(rebuilt.len());
        self.features = rebuilt;
    }

    /// Keep only the arena slots for which `keep[i]` is true, remapping group
    /// membership. Groups left without members are removed.
    pub(crate) fn retain_indices(&mut self, keep: &[bool]) {
        let mut new_index = vec![usize::MAX; self.features.len()];
        let mut next = 0;
        for (i, &k) in keep.iter().enumerate() {
            if k {
                new_index[i] = next;
                next += 1;
            }
        }

        let old = std::mem::take(&mut self.features);
        self.features = old
            .into_iter()
            .zip(keep.iter())
            .filter_map(|(f, &k)| if k { Some(f) } else { None })
            .collect();

        if let Some(grouping) = self.grouping.as_mut() {
            for group in &mut grouping.groups {
                group.members = group
                    .members
                    .iter()
                    .filter(|&&idx| keep[idx])
                    .map(|&idx| new_index[idx])
                    .collect();
            }
            grouping.groups.retain(|g| !g.is_empty());
            grouping.relink(self.features.len());
        }
    }

    /// Mirror all features within `[range_start, range_end]`, flip their
    /// strands and reverse the arena order. Group membership is remapped so
    /// the grouping survives; group spans are mirrored too.
    pub fn reverse_complement(&mut self, range_start: i64, range_end: i64) {
        crate::transform::range::reverse_complement(&mut self.features, range_start, range_end);

        let n = self.features.len();
        if let Some(grouping) = self.grouping.as_mut() {
            for group in &mut grouping.groups {
                let start = group.start;
                group.start = range_end - group.end + range_start;
                group.end = range_end - start + range_start;
                for idx in &mut group.members {
                    *idx = n - 1 - *idx;
                }
            }
            grouping.relink(n);
        }
    }
}

impl<'a> IntoIterator for &'a FeatureSet {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}
