//! Tag/value extraction from the free-form attribute column.
//!
//! Attributes are stored unparsed and only matched when grouping. The pattern
//! for each tag is compiled once and cached.

use ahash::AHashMap;
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Mutex;

static TAG_PATTERNS: Lazy<Mutex<AHashMap<String, Regex>>> =
    Lazy::new(|| Mutex::new(AHashMap::new()));

/// Compile (or fetch from the cache) the pattern for `tag`.
fn tag_pattern(tag: &str) -> Result<Regex> {
    let mut cache = TAG_PATTERNS
        .lock()
        .map_err(|_| anyhow::anyhow!("tag pattern cache poisoned"))?;
    if let Some(re) = cache.get(tag) {
        return Ok(re.clone());
    }
    // Greedy prefix: the last occurrence of the tag wins.
    let re = Regex::new(&format!(r#".*{}\s+("[^"]*"|\S+)"#, regex::escape(tag)))
        .with_context(|| format!("Failed to build pattern for tag '{}'", tag))?;
    cache.insert(tag.to_string(), re.clone());
    Ok(re)
}

/// A matcher bound to a single tag.
pub struct TagMatcher {
    tag_len: usize,
    pattern: Regex,
}

impl TagMatcher {
    pub fn new(tag: &str) -> Result<Self> {
        Ok(TagMatcher {
            tag_len: tag.len(),
            pattern: tag_pattern(tag)?,
        })
    }

    /// Value of the tag in `attribute`, or `None` if it isn't present.
    ///
    /// A trailing `;` is dropped and surrounding quotes are removed.
    pub fn value<'a>(&self, attribute: &'a str) -> Option<&'a str> {
        if attribute.len() <= self.tag_len {
            return None;
        }
        let caps = self.pattern.captures(attribute)?;
        let mut val = caps.get(1)?.as_str();
        if let Some(stripped) = val.strip_suffix(';') {
            val = stripped;
        }
        Some(remove_quotes(val))
    }
}

/// Strip one pair of enclosing double or single quotes.
fn remove_quotes(s: &str) -> &str {
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// Extract the value of `tag` from a GFF attribute string.
pub fn extract_tag_value(attribute: &str, tag: &str) -> Result<Option<String>> {
    let matcher = TagMatcher::new(tag)?;
    Ok(matcher.value(attribute).map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_tag_value() {
        let attrs = r#"gene_id "ENSG00000279493.1"; transcript_id "ENST00000624081.1"; gene_type "artifact";"#;

        assert_eq!(
            extract_tag_value(attrs, "gene_id").unwrap(),
            Some("ENSG00000279493.1".to_string())
        );
        assert_eq!(
            extract_tag_value(attrs, "transcript_id").unwrap(),
            Some("ENST00000624081.1".to_string())
        );
        assert_eq!(
            extract_tag_value(attrs, "gene_type").unwrap(),
            Some("artifact".to_string())
        );
        assert_eq!(extract_tag_value(attrs, "nonexistent").unwrap(), None);
    }

    #[test]
    fn test_bare_value_with_semicolon() {
        let attrs = "gene_id g1; exon_number 2;";
        assert_eq!(
            extract_tag_value(attrs, "exon_number").unwrap(),
            Some("2".to_string())
        );
        assert_eq!(
            extract_tag_value(attrs, "gene_id").unwrap(),
            Some("g1".to_string())
        );
    }

    #[test]
    fn test_last_occurrence_wins() {
        let attrs = r#"exon_id "a" ; exon_id "b""#;
        assert_eq!(
            extract_tag_value(attrs, "exon_id").unwrap(),
            Some("b".to_string())
        );
    }

    #[test]
    fn test_short_attribute_is_skipped() {
        let matcher = TagMatcher::new("gene_id").unwrap();
        assert_eq!(matcher.value(""), None);
        assert_eq!(matcher.value("gene_id"), None);
    }

    #[test]
    fn test_tag_is_escaped() {
        let attrs = r#"a.b "x"; aXb "y""#;
        assert_eq!(extract_tag_value(attrs, "a.b").unwrap(), Some("x".to_string()));
    }
}
