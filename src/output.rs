//! Output formatting for feature sets.
//!
//! Writes the 9-column GFF layout the parser reads, with `.` for a null
//! score or frame. The same formatting is used for discard sinks.

use anyhow::Result;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::config::{DATE_TAG, GFF_VERSION_TAG, SOURCE_VERSION_TAG};
use crate::set::FeatureSet;
use crate::types::{Feature, Metadata};

/// Write the `##` metadata header. Absent fields are skipped.
pub fn write_header<W: Write + ?Sized>(writer: &mut W, metadata: &Metadata) -> Result<()> {
    if !metadata.gff_version.is_empty() {
        writeln!(writer, "##{} {}", GFF_VERSION_TAG, metadata.gff_version)?;
    }
    if !metadata.source_version.is_empty() {
        writeln!(
            writer,
            "##{} {} {}",
            SOURCE_VERSION_TAG, metadata.source, metadata.source_version
        )?;
    }
    if !metadata.date.is_empty() {
        writeln!(writer, "##{} {}", DATE_TAG, metadata.date)?;
    }
    Ok(())
}

/// Format a single feature as a GFF line (without trailing newline).
pub fn format_feature_line(feature: &Feature) -> String {
    let score = match feature.score {
        Some(score) => format!("{:.3}", score),
        None => ".".to_string(),
    };
    let frame = match feature.frame {
        Some(frame) => frame.external().to_string(),
        None => ".".to_string(),
    };

    format!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        feature.seqname,
        feature.source,
        feature.feature_type,
        feature.start,
        feature.end,
        score,
        feature.strand,
        frame,
        feature.attribute
    )
}

/// Write a single feature line.
pub fn write_feature<W: Write + ?Sized>(writer: &mut W, feature: &Feature) -> Result<()> {
    writeln!(writer, "{}", format_feature_line(feature))?;
    Ok(())
}

/// Write the header and every feature of the set, in arena order.
pub fn write_set<W: Write + ?Sized>(writer: &mut W, set: &FeatureSet) -> Result<()> {
    write_header(writer, &set.metadata)?;
    for feature in set {
        write_feature(writer, feature)?;
    }
    Ok(())
}

/// Write a feature set to a file.
pub fn write_gff(path: &Path, set: &FeatureSet) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_set(&mut writer, set)?;
    writer.flush()?;
    Ok(())
}

/// Send a feature to an optional discard sink.
pub(crate) fn discard<W: Write + ?Sized>(sink: &mut Option<&mut W>, feature: &Feature) -> Result<()> {
    if let Some(w) = sink.as_deref_mut() {
        write_feature(w, feature)?;
    }
    Ok(())
}
