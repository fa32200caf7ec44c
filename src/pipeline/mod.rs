//! Optional stages selected with `--pipeline`. Pre-stages edit the CaboCha
//! model before head detection; post-stages edit CoNLL-U sentences.

pub mod build_luw;
pub mod merge_number;
pub mod merge_sp;
pub mod multiroot;
pub mod newdoc;
pub mod paren;
pub mod patch;

pub use build_luw::build_long_units;
pub use merge_number::merge_numbers;
pub use merge_sp::{merge_into_conll, merge_into_sentence, AlignError, SpaceAligner, SpaceDb};
pub use multiroot::{fix_leaf_open_bracket, fix_punct_projectivity, resolve_multi_root, RootResolution};
pub use newdoc::{fix_newdoc_spacing, mark_document_end};
pub use paren::convert_parens;
pub use patch::{PatchError, PatchTable};
