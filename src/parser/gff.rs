//! GFF file parser with gzip support.
//!
//! Reads tab-separated feature records into a `FeatureSet`. Only the first
//! five columns are required; score, strand, frame and attribute default to
//! null, `.`, null and the empty string.

use anyhow::{bail, Context, Result};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::BufRead;
use std::path::Path;

use crate::config::{DATE_TAG, GFF_VERSION_TAG, SOURCE_VERSION_TAG};
use crate::parser::util::open_reader;
use crate::set::FeatureSet;
use crate::types::{Feature, Frame, Metadata, Strand};

/// Minimum number of columns in a feature line.
pub const MIN_COLUMNS: usize = 5;

static META_COMMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*##\s*(\S+)\s+(\S+)(\s+(\S+))?").expect("valid metadata pattern")
});

/// Parse a GFF file into a feature set.
///
/// Supports both plain text and gzip-compressed files.
pub fn parse_gff(path: &Path) -> Result<FeatureSet> {
    let reader = open_reader(path)?;
    parse_gff_reader(reader)
        .with_context(|| format!("Failed to parse GFF file '{}'", path.display()))
}

/// Parse GFF data from a reader.
pub fn parse_gff_reader<R: BufRead>(reader: R) -> Result<FeatureSet> {
    let mut set = FeatureSet::new();
    let mut done_with_header = false;

    for (i, line_result) in reader.lines().enumerate() {
        let lineno = i + 1;
        let line = line_result.context("Failed to read GFF line")?;
        let line = line.trim();

        if line.is_empty() {
            continue;
        }

        if !done_with_header && line.starts_with("##") {
            read_metadata_line(line, &mut set.metadata);
            continue;
        }

        // Ordinary comments
        if line.starts_with('#') {
            continue;
        }

        done_with_header = true;
        let feature = parse_feature_line(line, lineno)?;
        set.features.push(feature);
    }

    debug!("read {} features", set.len());
    Ok(set)
}

/// Interpret a `##` header line. Unrecognised tags are ignored.
fn read_metadata_line(line: &str, metadata: &mut Metadata) {
    let Some(caps) = META_COMMENT.captures(line) else {
        debug!("unrecognized meta-data: '{}'", line);
        return;
    };
    let tag = &caps[1];
    let val1 = &caps[2];
    let val2 = caps.get(4).map(|m| m.as_str());

    if tag.eq_ignore_ascii_case(GFF_VERSION_TAG) {
        metadata.gff_version = val1.to_string();
    } else if tag.eq_ignore_ascii_case(SOURCE_VERSION_TAG) && val2.is_some() {
        metadata.source = val1.to_string();
        metadata.source_version = val2.unwrap_or_default().to_string();
    } else if tag.eq_ignore_ascii_case(DATE_TAG) {
        metadata.date = val1.to_string();
    } else {
        debug!("unrecognized meta-data: '{}'", line);
    }
}

/// Parse a single feature line. `lineno` is only used in error messages.
pub fn parse_feature_line(line: &str, lineno: usize) -> Result<Feature> {
    let fields: Vec<&str> = line.split('\t').collect();

    if fields.len() < MIN_COLUMNS {
        bail!(
            "line {}: minimum of {} columns are required",
            lineno,
            MIN_COLUMNS
        );
    }

    let start: i64 = match fields[3].parse() {
        Ok(v) => v,
        Err(_) => bail!("line {}: non-numeric 'start' value ('{}')", lineno, fields[3]),
    };
    let end: i64 = match fields[4].parse() {
        Ok(v) => v,
        Err(_) => bail!("line {}: non-numeric 'end' value ('{}')", lineno, fields[4]),
    };

    let mut score = None;
    if let Some(&score_str) = fields.get(5) {
        if score_str != "." {
            match score_str.parse::<f64>() {
                Ok(v) => score = Some(v),
                Err(_) => bail!(
                    "line {}: non-numeric and non-null 'score' value ('{}')",
                    lineno,
                    score_str
                ),
            }
        }
    }

    let strand = match fields.get(6) {
        Some(s) => s
            .parse::<Strand>()
            .with_context(|| format!("line {}: illegal 'strand' ('{}')", lineno, s))?,
        None => Strand::Unknown,
    };

    let frame = match fields.get(7) {
        Some(s) => Frame::parse_column(s)
            .with_context(|| format!("line {}: illegal 'frame' ('{}')", lineno, s))?,
        None => None,
    };

    let attribute = fields.get(8).map(|s| s.to_string()).unwrap_or_default();

    Ok(Feature {
        seqname: fields[0].to_string(),
        source: fields[1].to_string(),
        feature_type: fields[2].to_string(),
        start,
        end,
        score,
        strand,
        frame,
        attribute,
    })
}
