//! Input helpers shared by the parsers.

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Whether `path` names a gzip-compressed file, judged by its extension.
pub fn is_gzipped(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

/// Open `path` for line-oriented reading.
///
/// Files ending in `.gz` are decompressed on the fly; anything else is read
/// as plain text.
pub fn open_reader(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open GFF file '{}'", path.display()))?;
    if is_gzipped(path) {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_gzipped() {
        assert!(is_gzipped(Path::new("genes.gff.gz")));
        assert!(is_gzipped(Path::new("GENES.GFF.GZ")));
        assert!(!is_gzipped(Path::new("genes.gff")));
        assert!(!is_gzipped(Path::new("gz")));
    }
}
