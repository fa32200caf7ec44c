//! Declarative UPOS / DEPREL / object-case rule tables.
//!
//! Tables are YAML (UPOS, DEPREL) and TOML (object case). The defaults are
//! embedded; each can be replaced by a file. Everything is compiled at load
//! time so evaluation never touches strings it has to re-parse.

pub mod deprel;
pub mod objcase;
pub mod upos;

use std::path::{Path, PathBuf};

use crate::model::{AnnotationList, Sentence};

pub use deprel::DeprelRules;
pub use objcase::ObjCaseTable;
pub use upos::{UposRules, UposSubject};

pub const DEFAULT_UPOS_YAML: &str = include_str!("data/upos.yaml");
pub const DEFAULT_DEPREL_YAML: &str = include_str!("data/deprel.yaml");
pub const DEFAULT_OBJCASE_TOML: &str = include_str!("data/objcase.toml");

#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("cannot read rule file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{table}: YAML parse error: {source}")]
    Yaml {
        table: &'static str,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("{table}: TOML parse error: {source}")]
    Toml {
        table: &'static str,
        #[source]
        source: toml::de::Error,
    },
    #[error("{table} rule {rule}: invalid regex for {key}: {source}")]
    Regex {
        table: &'static str,
        rule: usize,
        key: String,
        #[source]
        source: regex::Error,
    },
    #[error("{table} rule {rule}: unknown predicate {key}: {reason}")]
    UnknownPredicate {
        table: &'static str,
        rule: usize,
        key: String,
        reason: &'static str,
    },
    #[error("{table} rule {rule}: bad argument for {key}: {reason}")]
    BadArgument {
        table: &'static str,
        rule: usize,
        key: String,
        reason: String,
    },
}

/// Every rule table the pipeline needs, loaded once and shared read-only.
#[derive(Debug)]
pub struct RuleSet {
    pub upos: UposRules,
    pub deprel: DeprelRules,
    pub objcase: ObjCaseTable,
}

impl RuleSet {
    /// The embedded default tables.
    pub fn embedded() -> Result<Self, RuleError> {
        Ok(Self {
            upos: UposRules::from_yaml(DEFAULT_UPOS_YAML)?,
            deprel: DeprelRules::from_yaml(DEFAULT_DEPREL_YAML)?,
            objcase: ObjCaseTable::from_toml(DEFAULT_OBJCASE_TOML)?,
        })
    }

    /// Embedded defaults, with any given file replacing its table.
    pub fn load(
        upos: Option<&Path>,
        deprel: Option<&Path>,
        objcase: Option<&Path>,
    ) -> Result<Self, RuleError> {
        Ok(Self {
            upos: match upos {
                Some(p) => UposRules::from_yaml(&read_table(p)?)?,
                None => UposRules::from_yaml(DEFAULT_UPOS_YAML)?,
            },
            deprel: match deprel {
                Some(p) => DeprelRules::from_yaml(&read_table(p)?)?,
                None => DeprelRules::from_yaml(DEFAULT_DEPREL_YAML)?,
            },
            objcase: match objcase {
                Some(p) => ObjCaseTable::from_toml(&read_table(p)?)?,
                None => ObjCaseTable::from_toml(DEFAULT_OBJCASE_TOML)?,
            },
        })
    }
}

fn read_table(path: &Path) -> Result<String, RuleError> {
    std::fs::read_to_string(path).map_err(|source| RuleError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// A sentence together with the document-scope annotations that apply to it.
#[derive(Clone, Copy)]
pub struct SentenceContext<'a> {
    pub sent: &'a Sentence,
    pub doc_annotations: Option<&'a AnnotationList>,
    /// Character offset of the sentence within the document.
    pub offset: usize,
}

impl<'a> SentenceContext<'a> {
    pub fn new(sent: &'a Sentence) -> Self {
        Self {
            sent,
            doc_annotations: None,
            offset: 0,
        }
    }

    pub fn with_document(mut self, annotations: &'a AnnotationList, offset: usize) -> Self {
        self.doc_annotations = Some(annotations);
        self.offset = offset;
        self
    }
}
