//! Case-pattern table for sentences whose predicate has several subjects.
//!
//! ```toml
//! [[rules]]
//! condition = { size = 2, is_case = [{ pos = 0, case = ["は"] }, { pos = 1, case = ["が"] }] }
//! eval = [{ pos = 0, dep = "dislocated" }]
//! ```
//!
//! An `is_case` entry with an empty `case` list accepts any particle.

use serde::Deserialize;

use super::RuleError;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseCondition {
    pub pos: usize,
    #[serde(default)]
    pub case: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Condition {
    pub size: usize,
    #[serde(default)]
    pub is_case: Vec<CaseCondition>,
}

/// Relabelling of the subject at `pos`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Eval {
    pub pos: usize,
    pub dep: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjCaseRule {
    pub condition: Condition,
    pub eval: Vec<Eval>,
}

impl ObjCaseRule {
    fn matches(&self, cases: &[&str]) -> bool {
        self.condition.size == cases.len()
            && self.condition.is_case.iter().all(|c| {
                cases
                    .get(c.pos)
                    .is_some_and(|&got| c.case.is_empty() || c.case.iter().any(|w| w == got))
            })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTable {
    #[serde(default)]
    rules: Vec<ObjCaseRule>,
}

#[derive(Debug, Default)]
pub struct ObjCaseTable {
    rules: Vec<ObjCaseRule>,
}

impl ObjCaseTable {
    pub fn from_toml(text: &str) -> Result<Self, RuleError> {
        let raw: RawTable = toml::from_str(text).map_err(|source| RuleError::Toml {
            table: "objcase",
            source,
        })?;
        for (i, rule) in raw.rules.iter().enumerate() {
            let size = rule.condition.size;
            let out_of_range = rule
                .condition
                .is_case
                .iter()
                .map(|c| c.pos)
                .chain(rule.eval.iter().map(|e| e.pos))
                .find(|&p| p >= size);
            if let Some(p) = out_of_range {
                return Err(RuleError::BadArgument {
                    table: "objcase",
                    rule: i,
                    key: "pos".to_string(),
                    reason: format!("position {p} outside condition size {size}"),
                });
            }
        }
        Ok(Self { rules: raw.rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Relabellings of the first rule matching the subjects' case particles,
    /// given in token order (`""` for a subject without one).
    pub fn lookup(&self, cases: &[&str]) -> Option<&[Eval]> {
        self.rules
            .iter()
            .find(|r| r.matches(cases))
            .map(|r| r.eval.as_slice())
    }
}
