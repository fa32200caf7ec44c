//! `patch_fix`: hand-written corrections keyed by `sent_id`.
//!
//! ```yaml
//! - sent_id: doc-3
//!   rules:
//!     - {ids: [4, 5], target: DEPREL, value: fixed}
//!     - {ids: [-1], target: text_en, value: "A cat."}
//! ```
//!
//! Id `-1` addresses a sentence header instead of tokens.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::Value;
use tracing::debug;

use crate::ud::conllu::split_map;
use crate::ud::{UdSentence, UdToken};

const HEADER_ID: i64 = -1;

#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error("cannot read patch file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("patch YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("{sent_id}: unknown UD field {target:?}")]
    UnknownField { sent_id: String, target: String },
    #[error("{sent_id}: bad patch for {target}: {reason}")]
    BadValue {
        sent_id: String,
        target: String,
        reason: String,
    },
    #[error("{sent_id}: patch addresses missing token {id}")]
    MissingToken { sent_id: String, id: usize },
}

/// Patchable token columns. `ID` is deliberately absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Form,
    Lemma,
    Upos,
    Xpos,
    Feats,
    Head,
    Deprel,
    Deps,
    Misc,
}

impl Column {
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name.to_ascii_uppercase().as_str() {
            "FORM" => Self::Form,
            "LEMMA" => Self::Lemma,
            "UPOS" => Self::Upos,
            "XPOS" => Self::Xpos,
            "FEATS" => Self::Feats,
            "HEAD" => Self::Head,
            "DEPREL" => Self::Deprel,
            "DEPS" => Self::Deps,
            "MISC" => Self::Misc,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchTarget {
    Header(String),
    Tokens { ids: Vec<usize>, column: Column },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRule {
    pub target: PatchTarget,
    pub value: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPatch {
    sent_id: String,
    rules: Vec<RawRule>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRule {
    ids: Vec<i64>,
    target: String,
    value: Value,
}

#[derive(Debug, Clone, Default)]
pub struct PatchTable {
    by_sentence: HashMap<String, Vec<PatchRule>>,
}

impl PatchTable {
    pub fn open(path: &Path) -> Result<Self, PatchError> {
        let text = std::fs::read_to_string(path).map_err(|source| PatchError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, PatchError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: Vec<RawPatch> = serde_yaml::from_str(yaml)?;
        let mut by_sentence: HashMap<String, Vec<PatchRule>> = HashMap::new();
        for patch in raw {
            let mut rules = Vec::with_capacity(patch.rules.len());
            for r in patch.rules {
                rules.push(compile_rule(&patch.sent_id, r)?);
            }
            by_sentence.entry(patch.sent_id).or_default().extend(rules);
        }
        Ok(Self { by_sentence })
    }

    /// Number of patched sentences.
    pub fn len(&self) -> usize {
        self.by_sentence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_sentence.is_empty()
    }

    /// Applies every rule for the sentence's id. Returns the number of
    /// rules applied.
    pub fn apply(&self, sent: &mut UdSentence) -> Result<usize, PatchError> {
        let sent_id = sent.sent_id().to_string();
        let Some(rules) = self.by_sentence.get(&sent_id) else {
            return Ok(0);
        };
        for rule in rules {
            match &rule.target {
                PatchTarget::Header(key) => {
                    debug!(sent_id = %sent_id, key = %key, "patch header");
                    sent.set_header(key, rule.value.clone());
                }
                PatchTarget::Tokens { ids, column } => {
                    for &id in ids {
                        let tok = sent.token_mut(id).ok_or_else(|| PatchError::MissingToken {
                            sent_id: sent_id.clone(),
                            id,
                        })?;
                        debug!(sent_id = %sent_id, id, column = ?column, value = %rule.value, "patch token");
                        set_column(tok, *column, &rule.value);
                    }
                }
            }
        }
        Ok(rules.len())
    }
}

fn set_column(tok: &mut UdToken, column: Column, value: &str) {
    match column {
        Column::Form => tok.form = value.to_string(),
        Column::Lemma => tok.lemma = value.to_string(),
        Column::Upos => tok.upos = value.to_string(),
        Column::Xpos => tok.xpos = value.to_string(),
        Column::Feats => tok.feats = split_map(value),
        // validated when the table was loaded
        Column::Head => tok.head = value.parse().unwrap_or(tok.head),
        Column::Deprel => tok.deprel = value.to_string(),
        Column::Deps => tok.deps = value.to_string(),
        Column::Misc => tok.misc = split_map(value),
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn compile_rule(sent_id: &str, raw: RawRule) -> Result<PatchRule, PatchError> {
    let bad = |reason: &str| PatchError::BadValue {
        sent_id: sent_id.to_string(),
        target: raw.target.clone(),
        reason: reason.to_string(),
    };
    let value = scalar(&raw.value).ok_or_else(|| bad("value must be a scalar"))?;
    if raw.ids == [HEADER_ID] {
        return Ok(PatchRule {
            target: PatchTarget::Header(raw.target.clone()),
            value,
        });
    }
    if raw.ids.is_empty() {
        return Err(bad("no ids given"));
    }
    let ids = raw
        .ids
        .iter()
        .map(|&id| usize::try_from(id).ok().filter(|&id| id > 0))
        .collect::<Option<Vec<usize>>>()
        .ok_or_else(|| bad("ids must be positive token ids, or [-1] for a header"))?;
    let column = Column::parse(&raw.target).ok_or_else(|| PatchError::UnknownField {
        sent_id: sent_id.to_string(),
        target: raw.target.clone(),
    })?;
    if column == Column::Head && value.parse::<usize>().is_err() {
        return Err(bad("HEAD must be a token id"));
    }
    Ok(PatchRule {
        target: PatchTarget::Tokens { ids, column },
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ud::tests::ud_sentence;
    use std::io::Write;

    const PATCHES: &str = r#"
- sent_id: d-1
  rules:
    - {ids: [2], target: DEPREL, value: obj}
    - {ids: [2], target: head, value: 1}
    - {ids: [1, 2], target: MISC, value: "SpaceAfter=Yes|Note=x"}
    - {ids: [-1], target: text_en, value: "Cats."}
"#;

    #[test]
    fn test_apply() {
        let table = PatchTable::from_yaml(PATCHES).unwrap();
        assert_eq!(table.len(), 1);
        let mut s = ud_sentence("d-1", &[("猫", 0, "root"), ("魚", 0, "root")]);
        assert_eq!(table.apply(&mut s).unwrap(), 4);
        assert_eq!(s.tokens[1].deprel, "obj");
        assert_eq!(s.tokens[1].head, 1);
        assert!(s.tokens[0].space_after());
        assert_eq!(s.tokens[1].misc.get("Note").map(String::as_str), Some("x"));
        assert_eq!(s.header("text_en"), Some("Cats."));
    }

    #[test]
    fn test_other_sentence_untouched() {
        let table = PatchTable::from_yaml(PATCHES).unwrap();
        let mut s = ud_sentence("d-2", &[("猫", 0, "root")]);
        let before = s.clone();
        assert_eq!(table.apply(&mut s).unwrap(), 0);
        assert_eq!(s, before);
    }

    #[test]
    fn test_unknown_field() {
        let yaml = "- sent_id: a\n  rules:\n    - {ids: [1], target: COLOUR, value: red}\n";
        let err = PatchTable::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, PatchError::UnknownField { .. }));
    }

    #[test]
    fn test_bad_values() {
        let yaml = "- sent_id: a\n  rules:\n    - {ids: [1], target: HEAD, value: up}\n";
        assert!(matches!(PatchTable::from_yaml(yaml), Err(PatchError::BadValue { .. })));
        let yaml = "- sent_id: a\n  rules:\n    - {ids: [0], target: UPOS, value: X}\n";
        assert!(matches!(PatchTable::from_yaml(yaml), Err(PatchError::BadValue { .. })));
    }

    #[test]
    fn test_missing_token() {
        let table = PatchTable::from_yaml(PATCHES).unwrap();
        let mut s = ud_sentence("d-1", &[("猫", 0, "root")]);
        assert!(matches!(table.apply(&mut s), Err(PatchError::MissingToken { id: 2, .. })));
    }

    #[test]
    fn test_open_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(PATCHES.as_bytes()).unwrap();
        assert_eq!(PatchTable::open(f.path()).unwrap().len(), 1);
        assert!(PatchTable::from_yaml("").unwrap().is_empty());
    }
}
