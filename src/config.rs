//! Configuration and defaults for gffsets.
//!
//! This module contains the feature type names and attribute tags the
//! transforms look for. Defaults follow GTF2 conventions.

/// Header tag for the format version.
pub const GFF_VERSION_TAG: &str = "gff-version";
/// Header tag for the producing program and its version.
pub const SOURCE_VERSION_TAG: &str = "source-version";
/// Header tag for the creation date.
pub const DATE_TAG: &str = "date";
/// Version written by `FeatureSet::new_init`.
pub const DEFAULT_GFF_VERSION: u32 = 2;

/// Feature type names recognised and produced by the synthesis transforms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureTypes {
    pub cds: String,
    pub exon: String,
    pub start_codon: String,
    pub stop_codon: String,
    pub utr5: String,
    pub utr3: String,
    pub intron: String,
    pub splice5: String,
    pub splice3: String,
}

impl Default for FeatureTypes {
    fn default() -> Self {
        FeatureTypes {
            cds: "CDS".to_string(),
            exon: "exon".to_string(),
            start_codon: "start_codon".to_string(),
            stop_codon: "stop_codon".to_string(),
            utr5: "5'UTR".to_string(),
            utr3: "3'UTR".to_string(),
            intron: "intron".to_string(),
            splice5: "5'splice".to_string(),
            splice3: "3'splice".to_string(),
        }
    }
}

impl FeatureTypes {
    /// Whether `feature_type` is one of the two UTR types.
    pub fn is_utr(&self, feature_type: &str) -> bool {
        feature_type == self.utr5 || feature_type == self.utr3
    }
}

/// Configuration for grouping and feature synthesis.
#[derive(Debug, Clone)]
pub struct Config {
    /// Attribute tag identifying transcripts.
    pub group_tag: String,
    /// Attribute tag added by contiguous (exon-level) grouping.
    pub exon_group_tag: String,
    /// Attribute tag written by `add_gene_id`.
    pub gene_id_tag: String,
    /// Feature type names.
    pub types: FeatureTypes,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            group_tag: "transcript_id".to_string(),
            exon_group_tag: "exon_id".to_string(),
            gene_id_tag: "gene_id".to_string(),
            types: FeatureTypes::default(),
        }
    }
}

impl Config {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Types that `absorb_helpers` extends by default (CDS).
    pub fn primary_types(&self) -> Vec<String> {
        vec![self.types.cds.clone()]
    }

    /// Types that CDS features absorb by default (start and stop codons).
    pub fn helper_types(&self) -> Vec<String> {
        vec![self.types.start_codon.clone(), self.types.stop_codon.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.group_tag, "transcript_id");
        assert_eq!(config.exon_group_tag, "exon_id");
        assert_eq!(config.gene_id_tag, "gene_id");
        assert_eq!(config.types.cds, "CDS");
        assert_eq!(config.types.utr5, "5'UTR");
        assert_eq!(config.types.splice3, "3'splice");
    }

    #[test]
    fn test_is_utr() {
        let types = FeatureTypes::default();
        assert!(types.is_utr("5'UTR"));
        assert!(types.is_utr("3'UTR"));
        assert!(!types.is_utr("CDS"));
    }

    #[test]
    fn test_default_absorb_types() {
        let config = Config::new();
        assert_eq!(config.primary_types(), vec!["CDS".to_string()]);
        assert_eq!(
            config.helper_types(),
            vec!["start_codon".to_string(), "stop_codon".to_string()]
        );
    }
}
