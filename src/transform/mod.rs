//! Transformations over feature sets: sorting, grouping, overlap
//! resolution, merging, derived-feature synthesis, range operations and
//! filters.

pub mod derive;
pub mod filter;
pub mod flatten;
pub mod group;
pub mod overlap;
pub mod range;
pub mod sort;

pub use derive::{absorb_helpers, create_introns, create_signals, create_utrs, fix_start_stop};
pub use filter::{add_gene_id, filter_by_group, filter_by_type, partition_by_type};
pub use flatten::{flatten, flatten_within_groups};
pub use group::{group_by_tag, group_by_type, group_contiguous, ungroup};
pub use overlap::remove_overlaps;
pub use range::{
    add_offset, reverse_complement, reverse_strand_only, subset_range, subset_range_overlap,
    subset_range_overlap_sorted,
};
pub use sort::{compare_features, compare_groups, is_sorted, sort};
