//! Core data structures for gffsets.
//!
//! This module contains the single-record types: strand, reading frame,
//! file metadata and the annotated feature itself.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// Strand orientation for genomic features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strand {
    Positive,
    Negative,
    #[default]
    Unknown,
}

/// Error type for parsing strand from string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStrandError;

impl fmt::Display for ParseStrandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid strand: expected '+', '-' or '.'")
    }
}

impl std::error::Error for ParseStrandError {}

impl FromStr for Strand {
    type Err = ParseStrandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Strand::Positive),
            "-" => Ok(Strand::Negative),
            "." => Ok(Strand::Unknown),
            _ => Err(ParseStrandError),
        }
    }
}

impl Strand {
    /// Convert strand to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Strand::Positive => "+",
            Strand::Negative => "-",
            Strand::Unknown => ".",
        }
    }

    /// The opposite strand. `.` stays `.`.
    pub fn flip(self) -> Self {
        match self {
            Strand::Positive => Strand::Negative,
            Strand::Negative => Strand::Positive,
            Strand::Unknown => Strand::Unknown,
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reading frame of a coding feature.
///
/// The value is kept in the internal representation `(3 - f) % 3`, where `f`
/// is the frame as written in a GFF file. The conversion is its own inverse
/// on 0..=2, so the same formula is used when writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frame(u8);

/// Error type for parsing a frame column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFrameError;

impl fmt::Display for ParseFrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid frame: expected 0, 1, 2 or '.'")
    }
}

impl std::error::Error for ParseFrameError {}

impl Frame {
    /// Build a frame from its file (external) value.
    pub fn from_external(frame: u8) -> Option<Frame> {
        if frame > 2 {
            return None;
        }
        Some(Frame((3 - frame) % 3))
    }

    /// Build a frame from an internal value, reducing it mod 3.
    pub fn from_internal(value: i64) -> Frame {
        Frame(value.rem_euclid(3) as u8)
    }

    /// Internal representation (0..=2).
    pub fn internal(self) -> u8 {
        self.0
    }

    /// Frame as written in a GFF file (0..=2).
    pub fn external(self) -> u8 {
        (3 - self.0) % 3
    }

    /// Add `n` in mod-3 space.
    ///
    /// Subtracting `x` is done by adding `2 * x`, which assumes a range size
    /// of 3.
    pub fn advance(self, n: i64) -> Frame {
        Frame::from_internal(self.0 as i64 + n)
    }

    /// Parse a GFF frame column: `.` is a null frame.
    pub fn parse_column(s: &str) -> Result<Option<Frame>, ParseFrameError> {
        if s == "." {
            return Ok(None);
        }
        let value: u8 = s.parse().map_err(|_| ParseFrameError)?;
        Frame::from_external(value).map(Some).ok_or(ParseFrameError)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.external())
    }
}

/// File-level metadata carried by `##` header lines.
///
/// Empty strings mean "absent".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub gff_version: String,
    pub source: String,
    pub source_version: String,
    pub date: String,
}

/// A single annotated interval.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub seqname: String,
    pub source: String,
    pub feature_type: String,
    /// 1-based, inclusive.
    pub start: i64,
    /// 1-based, inclusive.
    pub end: i64,
    /// `None` is a null score, which is not the same as `0.0`.
    pub score: Option<f64>,
    pub strand: Strand,
    pub frame: Option<Frame>,
    pub attribute: String,
}

static GENOMIC_POS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(chr[_a-zA-Z0-9]+):([0-9]+)-([0-9]+)([-+])?").expect("valid position pattern")
});

impl Feature {
    /// Create a feature with null score, unknown strand, null frame and an
    /// empty attribute.
    pub fn new(seqname: &str, source: &str, feature_type: &str, start: i64, end: i64) -> Self {
        Feature {
            seqname: seqname.to_string(),
            source: source.to_string(),
            feature_type: feature_type.to_string(),
            start,
            end,
            score: None,
            strand: Strand::Unknown,
            frame: None,
            attribute: String::new(),
        }
    }

    /// Create a feature from a genome-browser position such as
    /// `chr10:102553847-102554897`, optionally followed by `+` or `-`.
    ///
    /// Returns `None` if the position can't be parsed.
    pub fn from_genomic_pos(
        position: &str,
        source: &str,
        feature_type: &str,
        score: Option<f64>,
        frame: Option<Frame>,
        attribute: &str,
    ) -> Option<Self> {
        let caps = GENOMIC_POS_PATTERN.captures(position)?;
        let start: i64 = caps.get(2)?.as_str().parse().ok()?;
        let end: i64 = caps.get(3)?.as_str().parse().ok()?;
        let strand = caps
            .get(4)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(Strand::Unknown);

        Some(Feature {
            seqname: caps.get(1)?.as_str().to_string(),
            source: source.to_string(),
            feature_type: feature_type.to_string(),
            start,
            end,
            score,
            strand,
            frame,
            attribute: attribute.to_string(),
        })
    }

    /// Builder-style setter for the strand.
    pub fn with_strand(mut self, strand: Strand) -> Self {
        self.strand = strand;
        self
    }

    /// Builder-style setter for the score.
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    /// Builder-style setter for the frame (internal representation).
    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frame = Some(frame);
        self
    }

    /// Builder-style setter for the attribute string.
    pub fn with_attribute(mut self, attribute: &str) -> Self {
        self.attribute = attribute.to_string();
        self
    }

    /// Get feature length (end - start + 1).
    pub fn length(&self) -> i64 {
        self.end - self.start + 1
    }

    /// Whether the feature intersects `[start, end]`.
    pub fn overlaps(&self, start: i64, end: i64) -> bool {
        self.start <= end && self.end >= start
    }

    /// Whether the feature lies entirely within `[start, end]`.
    pub fn contained_in(&self, start: i64, end: i64) -> bool {
        self.start >= start && self.end <= end
    }

    pub fn is_type(&self, feature_type: &str) -> bool {
        self.feature_type == feature_type
    }
}
