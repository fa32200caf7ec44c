//! Ordered UPOS rule table.
//!
//! ```yaml
//! - - pos: ^名詞-固有名詞
//!   - [PROPN]
//! - - pos: ^動詞-非自立可能
//!     bpos: FUNC
//!   - [AUX]
//! ```
//!
//! The first rule whose every predicate holds wins.

use std::borrow::Cow;
use std::collections::VecDeque;

use regex::Regex;
use serde::Deserialize;

use crate::model::{PositionType, Sentence, Word};
use crate::ud::{UdSentence, UdToken};

use super::RuleError;

/// `parent_upos` value seen by root words.
pub const THIS_ROOT: &str = "THIS_ROOT";

/// UPOS given when no rule matches.
pub const FALLBACK_UPOS: &str = "X";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCondition {
    pos: Option<String>,
    base_lexeme: Option<String>,
    luw: Option<String>,
    usage: Option<String>,
    bpos: Option<String>,
    parent_upos: Option<String>,
}

#[derive(Debug)]
enum UposPredicate {
    Xpos(Regex),
    Lemma(Regex),
    LuwPos(Regex),
    Usage(String),
    Bpos(PositionType),
    ParentUpos(Regex),
}

#[derive(Debug)]
struct UposRule {
    predicates: Vec<UposPredicate>,
    upos: Vec<String>,
}

/// What the UPOS rules look at. Implemented by the word model and by
/// CoNLL-U tokens, so emitted output can be re-tagged.
pub trait UposSubject {
    fn xpos(&self) -> Cow<'_, str>;
    fn lemma(&self) -> &str;
    fn luw_pos(&self) -> Cow<'_, str>;
    /// The `type` feature; not every representation carries it.
    fn usage(&self) -> Option<&str>;
    fn bpos(&self) -> Option<PositionType>;
}

impl UposSubject for Word {
    fn xpos(&self) -> Cow<'_, str> {
        Cow::Owned(Word::xpos(self))
    }

    fn lemma(&self) -> &str {
        Word::lemma(self)
    }

    fn luw_pos(&self) -> Cow<'_, str> {
        Cow::Owned(Word::luw_pos(self))
    }

    fn usage(&self) -> Option<&str> {
        Some(Word::usage(self))
    }

    fn bpos(&self) -> Option<PositionType> {
        self.position_type
    }
}

/// `_` is the CoNLL-U spelling of an empty column.
fn column(value: &str) -> &str {
    if value == "_" {
        ""
    } else {
        value
    }
}

/// Reads the columns and MISC keys the emitter writes. The `type` feature
/// is not emitted, so `usage` rules never hold for tokens.
impl UposSubject for UdToken {
    fn xpos(&self) -> Cow<'_, str> {
        Cow::Borrowed(column(&self.xpos))
    }

    fn lemma(&self) -> &str {
        column(&self.lemma)
    }

    fn luw_pos(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.misc.get("LUWPOS").map_or("", String::as_str))
    }

    fn usage(&self) -> Option<&str> {
        None
    }

    fn bpos(&self) -> Option<PositionType> {
        self.misc
            .get("BunsetuPositionType")
            .and_then(|t| PositionType::parse(t))
    }
}

impl UposPredicate {
    fn holds(&self, w: &dyn UposSubject, parent_upos: &str) -> bool {
        match self {
            Self::Xpos(re) => re.is_match(&w.xpos()),
            Self::Lemma(re) => re.is_match(w.lemma()),
            Self::LuwPos(re) => re.is_match(&w.luw_pos()),
            Self::Usage(u) => w.usage() == Some(u.as_str()),
            Self::Bpos(t) => w.bpos() == Some(*t),
            Self::ParentUpos(re) => re.is_match(parent_upos),
        }
    }
}

#[derive(Debug)]
pub struct UposRules {
    rules: Vec<UposRule>,
}

impl UposRules {
    pub fn from_yaml(yaml: &str) -> Result<Self, RuleError> {
        let raw: Vec<(RawCondition, Vec<String>)> =
            serde_yaml::from_str(yaml).map_err(|source| RuleError::Yaml {
                table: "upos",
                source,
            })?;
        let rules = raw
            .into_iter()
            .enumerate()
            .map(|(i, (cond, upos))| compile(i, cond, upos))
            .collect::<Result<_, _>>()?;
        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// UPOS candidates of the first matching rule.
    pub fn classify(&self, w: &dyn UposSubject, parent_upos: &str) -> Option<&[String]> {
        self.rules
            .iter()
            .find(|r| r.predicates.iter().all(|p| p.holds(w, parent_upos)))
            .map(|r| r.upos.as_slice())
    }

    /// Assigns UPOS to every word, parents before children so that
    /// `parent_upos` sees final values.
    pub fn assign(&self, sent: &mut Sentence) {
        let n = sent.len();
        let mut assigned: Vec<Option<Vec<String>>> = vec![None; n + 1];
        for tok in top_down_order(sent) {
            let Some(w) = sent.word(tok) else { continue };
            let parent_upos = match w.dep_num {
                0 => THIS_ROOT,
                h => match assigned.get(h).and_then(Option::as_ref) {
                    Some(u) => u.last().map_or("", String::as_str),
                    None => sent.word(h).map_or("", Word::upos),
                },
            };
            let upos = match self.classify(w, parent_upos) {
                Some(u) if !u.is_empty() => u.to_vec(),
                _ => vec![FALLBACK_UPOS.to_string()],
            };
            assigned[tok] = Some(upos);
        }
        for w in sent.words_mut() {
            if let Some(upos) = assigned.get_mut(w.token_pos).and_then(Option::take) {
                add_features(w);
                w.upos = upos;
            }
        }
    }

    /// Re-derives the UPOS of every CoNLL-U token from its emitted columns,
    /// using each head's current UPOS as `parent_upos`.
    pub fn classify_sentence(&self, sent: &UdSentence) -> Vec<String> {
        sent.tokens
            .iter()
            .map(|t| {
                let parent_upos = match t.head {
                    0 => THIS_ROOT,
                    h => sent.token(h).map_or("", |p| p.upos.as_str()),
                };
                match self.classify(t, parent_upos) {
                    Some([.., last]) => last.clone(),
                    _ => FALLBACK_UPOS.to_string(),
                }
            })
            .collect()
    }
}

fn compile(idx: usize, cond: RawCondition, upos: Vec<String>) -> Result<UposRule, RuleError> {
    let regex = |key: &str, pattern: String| {
        Regex::new(&pattern).map_err(|source| RuleError::Regex {
            table: "upos",
            rule: idx,
            key: key.to_string(),
            source,
        })
    };
    let mut predicates = Vec::new();
    if let Some(p) = cond.pos {
        predicates.push(UposPredicate::Xpos(regex("pos", p)?));
    }
    if let Some(p) = cond.base_lexeme {
        predicates.push(UposPredicate::Lemma(regex("base_lexeme", p)?));
    }
    if let Some(p) = cond.luw {
        predicates.push(UposPredicate::LuwPos(regex("luw", p)?));
    }
    if let Some(u) = cond.usage {
        predicates.push(UposPredicate::Usage(u));
    }
    if let Some(b) = cond.bpos {
        let t = PositionType::parse(&b).ok_or_else(|| RuleError::BadArgument {
            table: "upos",
            rule: idx,
            key: "bpos".to_string(),
            reason: format!("unknown position type {b}"),
        })?;
        predicates.push(UposPredicate::Bpos(t));
    }
    if let Some(p) = cond.parent_upos {
        predicates.push(UposPredicate::ParentUpos(regex("parent_upos", p)?));
    }
    Ok(UposRule { predicates, upos })
}

/// Token positions in breadth-first order from the roots; anything not
/// reachable (only possible in a malformed tree) follows in token order.
fn top_down_order(sent: &Sentence) -> Vec<usize> {
    let n = sent.len();
    let mut seen = vec![false; n + 1];
    let mut order = Vec::with_capacity(n);
    let mut queue: VecDeque<usize> = sent.children(0).iter().copied().collect();
    while let Some(t) = queue.pop_front() {
        if t == 0 || t > n || seen[t] {
            continue;
        }
        seen[t] = true;
        order.push(t);
        queue.extend(sent.children(t).iter().copied());
    }
    order.extend((1..=n).filter(|&t| !seen[t]));
    order
}

const NEG_PREFIXES: &[&str] = &["非", "不", "無", "未", "反", "異"];

/// Polarity=Neg and Foreign=Yes.
fn add_features(w: &mut Word) {
    let lemma = w.lemma();
    let negative = match w.pos1() {
        "助動詞" => matches!(lemma, "ない" | "ず" | "ぬ"),
        "接尾辞" => lemma == "ない",
        "接頭辞" => NEG_PREFIXES.contains(&lemma),
        "名詞" => lemma == "無し",
        _ => false,
    };
    if negative {
        w.ud_feat.insert("Polarity".to_string(), "Neg".to_string());
    }
    if w.xpos().contains("英単語") {
        w.ud_feat.insert("Foreign".to_string(), "Yes".to_string());
    }
}
