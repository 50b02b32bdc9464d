//! Derived features: UTRs, introns, start/stop codons and splice sites,
//! plus CDS boundary repair around start and stop codons.
//!
//! Every operation works group by group and requires a grouping. New
//! features are clones of an existing member with a new type and new
//! coordinates; they are appended to the arena and to the owning group.

use anyhow::Result;
use log::debug;

use crate::config::Config;
use crate::set::FeatureSet;
use crate::transform::sort::compare_features;
use crate::types::{Feature, Strand};

/// Min start and max end over the members of group `g` whose type matches.
fn span_of<F>(set: &FeatureSet, members: &[usize], pred: F) -> Option<(i64, i64)>
where
    F: Fn(&Feature) -> bool,
{
    members
        .iter()
        .map(|&i| &set.features[i])
        .filter(|f| pred(f))
        .fold(None, |acc, f| match acc {
            None => Some((f.start, f.end)),
            Some((s, e)) => Some((s.min(f.start), e.max(f.end))),
        })
}

/// Strand of a group, taken from its first member.
fn group_strand(set: &FeatureSet, members: &[usize]) -> Strand {
    members
        .first()
        .map(|&i| set.features[i].strand)
        .unwrap_or_default()
}

/// Snapshot of every group's member list, so groups can grow while iterating.
fn member_lists(set: &FeatureSet) -> Vec<Vec<usize>> {
    set.grouping
        .as_ref()
        .map(|g| g.groups.iter().map(|grp| grp.members.clone()).collect())
        .unwrap_or_default()
}

/// Clone `template` with a new type and coordinates.
fn derived(template: &Feature, feature_type: &str, start: i64, end: i64) -> Feature {
    let mut f = template.clone();
    f.feature_type = feature_type.to_string();
    f.start = start;
    f.end = end;
    f
}

/// Adjust CDS coordinates so that start codons are included and stop codons
/// are excluded, as GTF2 requires.
///
/// Assumes at most one start codon and one stop codon per group; if there
/// are several, the last one listed is used. A stop codon adjustment is
/// skipped if it would make the CDS end before it starts.
pub fn fix_start_stop(set: &mut FeatureSet, config: &Config) -> Result<()> {
    set.require_grouping("fix_start_stop")?;
    let types = &config.types;
    let mut adjusted = 0;

    for members in member_lists(set) {
        let mut start_codon: Option<(i64, i64)> = None;
        let mut stop_codon: Option<(i64, i64)> = None;
        for &i in &members {
            let f = &set.features[i];
            if f.is_type(&types.start_codon) {
                start_codon = Some((f.start, f.end));
            } else if f.is_type(&types.stop_codon) {
                stop_codon = Some((f.start, f.end));
            }
        }
        if start_codon.is_none() && stop_codon.is_none() {
            continue;
        }

        for &i in &members {
            let f = &mut set.features[i];
            if !f.is_type(&types.cds) {
                continue;
            }
            let before = (f.start, f.end);

            let strand = f.strand;
            if let Some((codon_start, codon_end)) = start_codon {
                match strand {
                    Strand::Positive if f.start == codon_end + 1 => f.start = codon_start,
                    Strand::Negative if f.end == codon_start - 1 => f.end = codon_end,
                    _ => {}
                }
            }
            if let Some((codon_start, codon_end)) = stop_codon {
                match strand {
                    Strand::Positive if f.end == codon_end && codon_start - 1 >= f.start => {
                        f.end = codon_start - 1
                    }
                    Strand::Negative if f.start == codon_start && codon_end + 1 <= f.end => {
                        f.start = codon_end + 1
                    }
                    _ => {}
                }
            }

            if before != (f.start, f.end) {
                adjusted += 1;
            }
        }
    }

    debug!("fix_start_stop adjusted {} CDS features", adjusted);
    Ok(())
}

/// Extend features of primary types (e.g. CDS) over immediately adjacent
/// features of helper types (e.g. start_codon) in the same group.
///
/// Groups must be sorted. No features are created or removed; only
/// coordinates and frames change. Extending the 5' end of a coding feature
/// moves its frame: on the `+` strand when extending left, on the `-`
/// strand when extending right. The frame is shifted by `2 * length` mod 3,
/// i.e. `length` is subtracted, which assumes a range size of 3.
pub fn absorb_helpers(
    set: &mut FeatureSet,
    primary_types: &[String],
    helper_types: &[String],
) -> Result<()> {
    set.require_grouping("absorb_helpers")?;
    let is_primary = |f: &Feature| primary_types.iter().any(|t| f.is_type(t));
    let is_helper = |f: &Feature| helper_types.iter().any(|t| f.is_type(t));

    for members in member_lists(set) {
        for (j, &fi) in members.iter().enumerate() {
            if !is_primary(&set.features[fi]) {
                continue;
            }

            // extend to left
            for &pi in members[..j].iter().rev() {
                let prev = &set.features[pi];
                if !(is_helper(prev) && prev.end == set.features[fi].start - 1) {
                    break;
                }
                let (prev_start, prev_len) = (prev.start, prev.length());
                let f = &mut set.features[fi];
                f.start = prev_start;
                if f.strand == Strand::Positive {
                    f.frame = f.frame.map(|fr| fr.advance(2 * prev_len));
                }
            }

            // extend to right
            for &ni in &members[j + 1..] {
                let next = &set.features[ni];
                if !(is_helper(next) && next.start == set.features[fi].end + 1) {
                    break;
                }
                let (next_end, next_len) = (next.end, next.length());
                let f = &mut set.features[fi];
                f.end = next_end;
                if f.strand == Strand::Negative {
                    f.frame = f.frame.map(|fr| fr.advance(2 * next_len));
                }
            }
        }
    }

    Ok(())
}

/// Create 5'UTR and 3'UTR features where exons extend beyond the CDS of
/// their group.
///
/// Which side is 5' depends on the group's strand (taken from its first
/// member): upstream on `+` and `.`, downstream on `-`. Groups without CDS
/// are left alone.
pub fn create_utrs(set: &mut FeatureSet, config: &Config) -> Result<()> {
    set.require_grouping("create_utrs")?;
    let types = &config.types;
    let mut created = 0;

    for (g, members) in member_lists(set).into_iter().enumerate() {
        let Some((cds_start, cds_end)) = span_of(set, &members, |f| f.is_type(&types.cds)) else {
            continue;
        };
        let strand = group_strand(set, &members);
        let (upstream_type, downstream_type) = if strand == Strand::Negative {
            (&types.utr3, &types.utr5)
        } else {
            (&types.utr5, &types.utr3)
        };

        let exons: Vec<Feature> = members
            .iter()
            .map(|&i| &set.features[i])
            .filter(|f| f.is_type(&types.exon))
            .cloned()
            .collect();

        for exon in &exons {
            if exon.start < cds_start {
                let end = if exon.end >= cds_start { cds_start - 1 } else { exon.end };
                set.push_to_group(g, derived(exon, upstream_type, exon.start, end));
                created += 1;
            }
            if exon.end > cds_end {
                let start = if exon.start <= cds_end { cds_end + 1 } else { exon.start };
                set.push_to_group(g, derived(exon, downstream_type, start, exon.end));
                created += 1;
            }
        }
    }

    debug!("create_utrs created {} features", created);
    Ok(())
}

/// Create intron features between consecutive exons of each group.
pub fn create_introns(set: &mut FeatureSet, config: &Config) -> Result<()> {
    set.require_grouping("create_introns")?;
    let types = &config.types;
    let mut created = 0;

    for (g, members) in member_lists(set).into_iter().enumerate() {
        let mut exons: Vec<Feature> = members
            .iter()
            .map(|&i| &set.features[i])
            .filter(|f| f.is_type(&types.exon))
            .cloned()
            .collect();
        exons.sort_by(compare_features);

        for pair in exons.windows(2) {
            let intron = derived(&pair[0], &types.intron, pair[0].end + 1, pair[1].start - 1);
            set.push_to_group(g, intron);
            created += 1;
        }
    }

    debug!("create_introns created {} features", created);
    Ok(())
}

/// Create start codon, stop codon and splice site features.
///
/// For each CDS of at least 3 bp that begins or ends the group's coding
/// region, a 3 bp codon is created at that boundary. Stop codons are
/// trimmed off the CDS (the low end on `-`, the high end otherwise) and get
/// the frame the CDS would have after them. Two-base splice sites are added
/// next to every CDS or UTR boundary that is not a codon boundary or a
/// transcript end. UTR splice sites only appear if UTRs are annotated (see
/// `create_utrs`).
pub fn create_signals(set: &mut FeatureSet, config: &Config) -> Result<()> {
    set.require_grouping("create_signals")?;
    let types = &config.types;
    let mut created = 0;

    for (g, members) in member_lists(set).into_iter().enumerate() {
        let cds_span = span_of(set, &members, |f| f.is_type(&types.cds));
        let trans_span = span_of(set, &members, |f| {
            f.is_type(&types.cds) || types.is_utr(&f.feature_type)
        });
        let strand = group_strand(set, &members);
        let minus = strand == Strand::Negative;

        for &i in &members {
            let is_cds = set.features[i].is_type(&types.cds);
            let is_utr = types.is_utr(&set.features[i].feature_type);
            let mut new_features: Vec<Feature> = Vec::new();

            if let (true, Some((cds_start, cds_end))) = (is_cds, cds_span) {
                if set.features[i].length() >= 3 {
                    if set.features[i].start == cds_start {
                        let f = &mut set.features[i];
                        let mut codon = f.clone();
                        codon.end = f.start + 2;
                        if minus {
                            codon.feature_type = types.stop_codon.clone();
                            f.start += 3;
                            codon.frame = f.frame.map(|fr| fr.advance(f.length()));
                        } else {
                            codon.feature_type = types.start_codon.clone();
                        }
                        new_features.push(codon);
                    }
                    if set.features[i].end == cds_end {
                        let f = &mut set.features[i];
                        let mut codon = f.clone();
                        codon.start = f.end - 2;
                        if minus {
                            codon.feature_type = types.start_codon.clone();
                        } else {
                            codon.feature_type = types.stop_codon.clone();
                            f.end -= 3;
                            codon.frame = f.frame.map(|fr| fr.advance(f.length()));
                        }
                        new_features.push(codon);
                    }
                }
            }

            let f = &set.features[i];
            let (splice_before, splice_after) = match (cds_span, trans_span) {
                (Some((cds_start, cds_end)), Some((trans_start, trans_end))) => (
                    (is_cds && f.start != cds_start && f.start != cds_start + 3)
                        || (is_utr && f.start != trans_start && f.start != cds_end + 1),
                    (is_cds && f.end != cds_end && f.end != cds_end - 3)
                        || (is_utr && f.end != cds_start - 1 && f.end != trans_end),
                ),
                // UTRs without CDS: only transcript ends are exempt
                (None, Some((trans_start, trans_end))) => (
                    is_utr && f.start != trans_start,
                    is_utr && f.end != trans_end,
                ),
                _ => (false, false),
            };

            if splice_before {
                let site_type = if minus { &types.splice5 } else { &types.splice3 };
                new_features.push(derived(f, site_type, f.start - 2, f.start - 1));
            }
            if splice_after {
                let site_type = if minus { &types.splice3 } else { &types.splice5 };
                new_features.push(derived(f, site_type, f.end + 1, f.end + 2));
            }

            created += new_features.len();
            for feature in new_features {
                set.push_to_group(g, feature);
            }
        }
    }

    debug!("create_signals created {} features", created);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::group::group_by_tag;
    use crate::types::Frame;

    fn feat(feature_type: &str, start: i64, end: i64, strand: Strand) -> Feature {
        Feature::new("chr1", "t", feature_type, start, end)
            .with_strand(strand)
            .with_attribute("transcript_id \"T1\";")
    }

    fn grouped(features: Vec<Feature>) -> FeatureSet {
        let mut set = FeatureSet::from_features(features);
        group_by_tag(&mut set, "transcript_id").unwrap();
        set
    }

    fn of_type(set: &FeatureSet, t: &str) -> Vec<(i64, i64)> {
        set.iter()
            .filter(|f| f.is_type(t))
            .map(|f| (f.start, f.end))
            .collect()
    }

    #[test]
    fn test_requires_groups() {
        let config = Config::default();
        let mut set = FeatureSet::from_features(vec![feat("CDS", 1, 9, Strand::Positive)]);
        assert!(create_utrs(&mut set, &config).is_err());
        assert!(create_introns(&mut set, &config).is_err());
        assert!(create_signals(&mut set, &config).is_err());
        assert!(fix_start_stop(&mut set, &config).is_err());
        assert!(absorb_helpers(&mut set, &config.primary_types(), &config.helper_types()).is_err());
    }

    #[test]
    fn test_create_utrs_minus_strand() {
        let config = Config::default();
        let mut set = grouped(vec![
            feat("exon", 1, 200, Strand::Negative),
            feat("CDS", 50, 150, Strand::Negative),
        ]);
        create_utrs(&mut set, &config).unwrap();
        assert_eq!(of_type(&set, "3'UTR"), vec![(1, 49)]);
        assert_eq!(of_type(&set, "5'UTR"), vec![(151, 200)]);
        assert_eq!(set.grouping().unwrap().groups[0].len(), 4);
    }

    #[test]
    fn test_create_utrs_whole_exon_outside_cds() {
        let config = Config::default();
        let mut set = grouped(vec![
            feat("exon", 1, 20, Strand::Positive),
            feat("exon", 40, 100, Strand::Positive),
            feat("CDS", 60, 100, Strand::Positive),
        ]);
        create_utrs(&mut set, &config).unwrap();
        assert_eq!(of_type(&set, "5'UTR"), vec![(1, 20), (40, 59)]);
        assert!(of_type(&set, "3'UTR").is_empty());
    }

    #[test]
    fn test_create_utrs_without_cds() {
        let config = Config::default();
        let mut set = grouped(vec![feat("exon", 1, 20, Strand::Positive)]);
        create_utrs(&mut set, &config).unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_create_introns_unsorted_exons() {
        let config = Config::default();
        let mut set = grouped(vec![
            feat("exon", 50, 60, Strand::Positive),
            feat("exon", 1, 10, Strand::Positive),
            feat("exon", 21, 30, Strand::Positive),
        ]);
        create_introns(&mut set, &config).unwrap();
        assert_eq!(of_type(&set, "intron"), vec![(11, 20), (31, 49)]);
    }

    #[test]
    fn test_fix_start_stop_plus() {
        let config = Config::default();
        let mut set = grouped(vec![
            feat("start_codon", 100, 102, Strand::Positive),
            feat("CDS", 103, 200, Strand::Positive),
            feat("stop_codon", 198, 200, Strand::Positive),
        ]);
        fix_start_stop(&mut set, &config).unwrap();
        assert_eq!(of_type(&set, "CDS"), vec![(100, 197)]);
    }

    #[test]
    fn test_fix_start_stop_minus() {
        let config = Config::default();
        let mut set = grouped(vec![
            feat("stop_codon", 100, 102, Strand::Negative),
            feat("CDS", 100, 197, Strand::Negative),
            feat("start_codon", 198, 200, Strand::Negative),
        ]);
        fix_start_stop(&mut set, &config).unwrap();
        assert_eq!(of_type(&set, "CDS"), vec![(103, 200)]);
    }

    #[test]
    fn test_fix_start_stop_never_inverts() {
        let config = Config::default();
        let mut set = grouped(vec![
            feat("CDS", 199, 200, Strand::Positive),
            feat("stop_codon", 198, 200, Strand::Positive),
        ]);
        fix_start_stop(&mut set, &config).unwrap();
        assert_eq!(of_type(&set, "CDS"), vec![(199, 200)]);
    }

    #[test]
    fn test_absorb_helpers_plus_strand_frame() {
        let config = Config::default();
        let cds = feat("CDS", 104, 200, Strand::Positive).with_frame(Frame::from_internal(0));
        let mut set = grouped(vec![
            feat("start_codon", 101, 103, Strand::Positive),
            cds,
            feat("stop_codon", 201, 203, Strand::Positive),
        ]);
        absorb_helpers(&mut set, &config.primary_types(), &config.helper_types()).unwrap();

        let cds = set.iter().find(|f| f.is_type("CDS")).unwrap();
        assert_eq!((cds.start, cds.end), (101, 203));
        // 3 bases: frame unchanged on the + strand
        assert_eq!(cds.frame.unwrap().internal(), 0);
    }

    #[test]
    fn test_absorb_helpers_stops_at_gap() {
        let config = Config::default();
        let mut set = grouped(vec![
            feat("start_codon", 100, 102, Strand::Positive),
            feat("CDS", 104, 200, Strand::Positive),
        ]);
        absorb_helpers(&mut set, &config.primary_types(), &config.helper_types()).unwrap();
        assert_eq!(of_type(&set, "CDS"), vec![(104, 200)]);
    }

    #[test]
    fn test_create_signals_plus_strand() {
        let config = Config::default();
        let cds1 = feat("CDS", 100, 150, Strand::Positive).with_frame(Frame::from_external(0).unwrap());
        let cds2 = feat("CDS", 201, 300, Strand::Positive).with_frame(Frame::from_external(0).unwrap());
        let mut set = grouped(vec![cds1, cds2]);
        create_signals(&mut set, &config).unwrap();

        assert_eq!(of_type(&set, "start_codon"), vec![(100, 102)]);
        assert_eq!(of_type(&set, "stop_codon"), vec![(298, 300)]);
        assert_eq!(of_type(&set, "CDS"), vec![(100, 150), (201, 297)]);
        assert_eq!(of_type(&set, "5'splice"), vec![(151, 152)]);
        assert_eq!(of_type(&set, "3'splice"), vec![(199, 200)]);

        // trimmed CDS is 97 bp: internal 0 + 97 = 1 (mod 3)
        let stop = set.iter().find(|f| f.is_type("stop_codon")).unwrap();
        assert_eq!(stop.frame.unwrap().internal(), 1);
    }

    #[test]
    fn test_create_signals_minus_strand() {
        let config = Config::default();
        let mut set = grouped(vec![
            feat("CDS", 100, 150, Strand::Negative),
            feat("CDS", 201, 300, Strand::Negative),
        ]);
        create_signals(&mut set, &config).unwrap();

        assert_eq!(of_type(&set, "stop_codon"), vec![(100, 102)]);
        assert_eq!(of_type(&set, "start_codon"), vec![(298, 300)]);
        assert_eq!(of_type(&set, "CDS"), vec![(103, 150), (201, 300)]);
        assert_eq!(of_type(&set, "3'splice"), vec![(151, 152)]);
        assert_eq!(of_type(&set, "5'splice"), vec![(199, 200)]);
        // null frame stays null
        let stop = set.iter().find(|f| f.is_type("stop_codon")).unwrap();
        assert_eq!(stop.frame, None);
    }

    #[test]
    fn test_create_signals_with_utrs() {
        let config = Config::default();
        let mut set = grouped(vec![
            feat("5'UTR", 1, 20, Strand::Positive),
            feat("5'UTR", 41, 49, Strand::Positive),
            feat("CDS", 50, 150, Strand::Positive),
            feat("3'UTR", 151, 200, Strand::Positive),
        ]);
        create_signals(&mut set, &config).unwrap();

        assert_eq!(of_type(&set, "5'splice"), vec![(21, 22)]);
        assert_eq!(of_type(&set, "3'splice"), vec![(39, 40)]);
        assert_eq!(of_type(&set, "start_codon"), vec![(50, 52)]);
        assert_eq!(of_type(&set, "stop_codon"), vec![(148, 150)]);
    }
}
