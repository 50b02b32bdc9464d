//! Parsers for GFF annotation files and their attribute column.

pub mod attribute;
pub mod gff;
pub mod util;

pub use attribute::{extract_tag_value, TagMatcher};
pub use gff::{parse_gff, parse_gff_reader};
