//! gffsets - In-memory GFF feature sets.
//!
//! This library parses GFF annotation files into an indexed feature set and
//! provides the transformations gene-structure pipelines need on top of it.
//!
//! # Features
//!
//! - Parse GFF files (with gzip support), including `##` metadata headers
//! - Group features by attribute tag, by type, or by contiguity
//! - Sort features and groups, resolve overlapping groups by score
//! - Merge overlapping features, with or without respect to groups
//! - Derive UTRs, introns, start/stop codons and splice sites
//! - Subset, reverse-complement and shift coordinate ranges
//!
//! # Example
//!
//! ```ignore
//! use gffsets::config::Config;
//! use gffsets::parser::parse_gff;
//! use gffsets::transform::{create_utrs, group_by_tag, sort};
//! use gffsets::output::write_gff;
//! use std::path::Path;
//!
//! let config = Config::default();
//! let mut set = parse_gff(Path::new("genes.gff"))?;
//! group_by_tag(&mut set, &config.group_tag)?;
//! sort(&mut set);
//! create_utrs(&mut set, &config)?;
//! write_gff(Path::new("genes.utr.gff"), &set)?;
//! ```

pub mod config;
pub mod output;
pub mod parser;
pub mod set;
pub mod transform;
pub mod types;

pub use config::Config;
pub use parser::{parse_gff, parse_gff_reader};
pub use set::{FeatureGroup, FeatureSet, Grouping};
pub use types::{Feature, Frame, Metadata, Strand};
