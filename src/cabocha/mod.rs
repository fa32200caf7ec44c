//! Extended CaboCha input: parsing and re-serialization.

mod csv;
mod directive;
mod meta;
mod reader;
mod writer;

pub use csv::{join_csv_row, parse_csv_row, parse_delimited_row};
pub use reader::{parse_documents, DocumentReader};
pub use writer::{write_document, write_sentence};

/// Fatal error while reading extended CaboCha. Carries the 1-based line
/// number and the offending line.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("line {line}: malformed bunsetsu header: {text}")]
    BadBunsetuHeader { line: usize, text: String },

    #[error("line {line}: sentence is not terminated by EOS: {text}")]
    MissingEos { line: usize, text: String },

    #[error("line {line}: ATTR without a preceding SEGMENT, LINK or GROUP: {text}")]
    StrayAttr { line: usize, text: String },

    #[error("line {line}: {reason}: {text}")]
    BadDirective {
        line: usize,
        reason: &'static str,
        text: String,
    },

    #[error("line {line}: feature CSV has {found} fields, at least 9 required: {text}")]
    TruncatedFeatures {
        line: usize,
        found: usize,
        text: String,
    },

    #[error("line {line}: token before any bunsetsu header: {text}")]
    TokenOutsideBunsetu { line: usize, text: String },

    #[error("line {line}: long-unit continuation without a preceding long unit: {text}")]
    OrphanContinuation { line: usize, text: String },

    #[error("read error: {0}")]
    Io(#[from] std::io::Error),
}
