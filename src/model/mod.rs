//! Annotation model: documents own sentences, sentences own bunsetsu,
//! bunsetsu own words. Cross references are plain indices.

pub mod annotation;
mod bunsetu;
mod document;
mod sentence;
mod word;

pub use annotation::{AnnotationKind, AnnotationList, Group, Link, Range, Scope, Segment};
pub use bunsetu::{Bunsetu, BunsetuType};
pub use document::{DocMeta, Document};
pub use sentence::Sentence;
pub use word::{
    Features, LongUnit, LuwLabel, PositionType, SuwField, Word, LUW_FIELD_COUNT,
    SUW_FIELD_COUNT,
};

/// Violated structural invariant of a sentence.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("bunsetu_pos is not sequential (expected {expected}, found {found})")]
    NonSequentialBunsetu { expected: usize, found: usize },

    #[error("bunsetsu {bunsetu} depends on missing bunsetsu {dep_pos}")]
    DepOutOfRange { bunsetu: usize, dep_pos: i32 },

    #[error("bunsetsu {bunsetu} is empty")]
    EmptyBunsetu { bunsetu: usize },

    #[error("token positions are not contiguous (expected {expected}, found {found})")]
    NonContiguousToken { expected: usize, found: usize },

    #[error("token {token} points at missing head {head}")]
    HeadOutOfRange { token: usize, head: usize },

    #[error("token {token} is part of a cycle")]
    Cycle { token: usize },

    #[error("sentence has no root")]
    NoRoot,

    #[error("sentence has {count} roots")]
    MultiRoot { count: usize },
}
