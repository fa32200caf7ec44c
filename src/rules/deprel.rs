//! Ordered DEPREL rule table.
//!
//! Each rule is a conjunction of predicates named `<op>_<target>_<attribute>`
//! plus the relation it assigns:
//!
//! ```yaml
//! - - match_word_upos: ADP
//!   - case
//! - - match_word_bpos: SEM_HEAD
//!     include_word_case: [が, は]
//!   - nsubj
//! ```

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde_yaml::Value;

use crate::model::{AnnotationList, LuwLabel, Range, Sentence};

use super::{RuleError, SentenceContext};

/// Relation given when no rule matches.
pub const DEFAULT_DEPREL: &str = "dep";

static CASE_PARTICLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^助詞-(係|格|副)助詞").unwrap());
static DIS_FORMULA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*X\s*-\s*Y\s*(<=|>=|==|!=|<|>)\s*(-?\d+)\s*$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Word,
    Parent,
    Child,
    ParentChild,
    SemHead,
    SynHead,
}

impl Target {
    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "word" => Self::Word,
            "parent" => Self::Parent,
            "child" => Self::Child,
            "parentchild" => Self::ParentChild,
            "semhead" => Self::SemHead,
            "synhead" => Self::SynHead,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attribute {
    Lemma,
    Xpos,
    LuwPos,
    Bpos,
    Upos,
    DepNum,
    Katuyo,
    Case,
    BunsetuType,
    Segment,
    PasLink,
    SuffixString,
    DisFormula,
}

impl Attribute {
    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "lemma" => Self::Lemma,
            "xpos" => Self::Xpos,
            "luwpos" => Self::LuwPos,
            "bpos" => Self::Bpos,
            "upos" => Self::Upos,
            "depnum" => Self::DepNum,
            "katuyo" => Self::Katuyo,
            "case" => Self::Case,
            "busetutype" => Self::BunsetuType,
            "segment" => Self::Segment,
            "paslink" => Self::PasLink,
            "suffixstring" => Self::SuffixString,
            "disformula" => Self::DisFormula,
            _ => return None,
        })
    }
}

#[derive(Debug)]
enum Test {
    /// Any value equals the argument.
    Equals(String),
    /// The value list equals the argument list.
    EqualsList(Vec<String>),
    Regex(Regex),
    /// Any value is a member of the argument set.
    Include(HashSet<String>),
}

impl Test {
    fn holds(&self, values: &[String]) -> bool {
        match self {
            Self::Equals(s) => values.iter().any(|v| v == s),
            Self::EqualsList(list) => values == list.as_slice(),
            Self::Regex(re) => values.iter().any(|v| re.is_match(v)),
            Self::Include(set) => values.iter().any(|v| set.contains(v)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Cmp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl Cmp {
    fn apply(self, lhs: i64, rhs: i64) -> bool {
        match self {
            Self::Lt => lhs < rhs,
            Self::Le => lhs <= rhs,
            Self::Gt => lhs > rhs,
            Self::Ge => lhs >= rhs,
            Self::Eq => lhs == rhs,
            Self::Ne => lhs != rhs,
        }
    }
}

#[derive(Debug)]
enum Predicate {
    Attr {
        target: Target,
        attr: Attribute,
        test: Test,
    },
    /// `X-Y<op><n>`: head position minus own position.
    Distance { target: Target, cmp: Cmp, n: i64 },
}

#[derive(Debug)]
struct DeprelRule {
    predicates: Vec<Predicate>,
    deprel: String,
}

#[derive(Debug)]
pub struct DeprelRules {
    rules: Vec<DeprelRule>,
}

fn scalar(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn string_list(v: &Value) -> Option<Vec<String>> {
    match v {
        Value::Sequence(seq) => seq.iter().map(scalar).collect(),
        other => scalar(other).map(|s| vec![s]),
    }
}

fn compile_predicate(rule: usize, key: &str, arg: &Value) -> Result<Predicate, RuleError> {
    let unknown = |reason| RuleError::UnknownPredicate {
        table: "deprel",
        rule,
        key: key.to_string(),
        reason,
    };
    let bad = |reason: &str| RuleError::BadArgument {
        table: "deprel",
        rule,
        key: key.to_string(),
        reason: reason.to_string(),
    };
    let mut parts = key.splitn(3, '_');
    let (Some(op), Some(target), Some(attr)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(unknown("expected <op>_<target>_<attribute>"));
    };
    let target = Target::parse(target).ok_or_else(|| unknown("unknown target"))?;
    let attr = Attribute::parse(attr).ok_or_else(|| unknown("unknown attribute"))?;
    if !matches!(op, "match" | "regex" | "include") {
        return Err(unknown("unknown op"));
    }

    if attr == Attribute::DisFormula {
        let formula = scalar(arg).ok_or_else(|| bad("formula must be a string"))?;
        let cap = DIS_FORMULA
            .captures(&formula)
            .ok_or_else(|| bad("expected X-Y<op><n>"))?;
        let cmp = match &cap[1] {
            "<" => Cmp::Lt,
            "<=" => Cmp::Le,
            ">" => Cmp::Gt,
            ">=" => Cmp::Ge,
            "==" => Cmp::Eq,
            _ => Cmp::Ne,
        };
        let n = cap[2].parse().map_err(|_| bad("offset out of range"))?;
        return Ok(Predicate::Distance { target, cmp, n });
    }

    let test = match op {
        "match" => match arg {
            Value::Sequence(_) => {
                Test::EqualsList(string_list(arg).ok_or_else(|| bad("list of scalars expected"))?)
            }
            _ => Test::Equals(scalar(arg).ok_or_else(|| bad("scalar expected"))?),
        },
        "regex" => {
            let pattern = scalar(arg).ok_or_else(|| bad("pattern must be a string"))?;
            Test::Regex(Regex::new(&pattern).map_err(|source| RuleError::Regex {
                table: "deprel",
                rule,
                key: key.to_string(),
                source,
            })?)
        }
        _ => Test::Include(
            string_list(arg)
                .ok_or_else(|| bad("list of scalars expected"))?
                .into_iter()
                .collect(),
        ),
    };
    Ok(Predicate::Attr { target, attr, test })
}

impl DeprelRules {
    pub fn from_yaml(yaml: &str) -> Result<Self, RuleError> {
        let raw: Vec<(BTreeMap<String, Value>, String)> =
            serde_yaml::from_str(yaml).map_err(|source| RuleError::Yaml {
                table: "deprel",
                source,
            })?;
        let mut rules = Vec::with_capacity(raw.len());
        for (i, (conds, deprel)) in raw.into_iter().enumerate() {
            let predicates = conds
                .iter()
                .map(|(k, v)| compile_predicate(i, k, v))
                .collect::<Result<_, _>>()?;
            rules.push(DeprelRule { predicates, deprel });
        }
        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Relation of the first rule that holds for `tok`, else `dep`.
    pub fn label(&self, ctx: &SentenceContext<'_>, tok: usize) -> &str {
        self.rules
            .iter()
            .find(|r| r.predicates.iter().all(|p| holds(ctx, tok, p)))
            .map_or(DEFAULT_DEPREL, |r| r.deprel.as_str())
    }

    /// Labels every word, then forces `root` on words attached to 0.
    pub fn assign(&self, sent: &mut Sentence, doc: Option<(&AnnotationList, usize)>) {
        let labels: Vec<String> = {
            let mut ctx = SentenceContext::new(sent);
            if let Some((ann, offset)) = doc {
                ctx = ctx.with_document(ann, offset);
            }
            (1..=sent.len()).map(|t| self.label(&ctx, t).to_string()).collect()
        };
        for (w, label) in sent.words_mut().zip(labels) {
            w.dep_label = if w.dep_num == 0 {
                "root".to_string()
            } else {
                label
            };
        }
    }
}

fn holds(ctx: &SentenceContext<'_>, tok: usize, p: &Predicate) -> bool {
    match p {
        Predicate::Attr { target, attr, test } => targets(ctx.sent, tok, *target)
            .into_iter()
            .any(|t| test.holds(&attribute(ctx, t, *attr))),
        Predicate::Distance { target, cmp, n } => {
            targets(ctx.sent, tok, *target).into_iter().any(|t| {
                let Some(w) = ctx.sent.word(t) else {
                    return false;
                };
                w.dep_num != 0 && cmp.apply(w.dep_num as i64 - t as i64, *n)
            })
        }
    }
}

fn targets(sent: &Sentence, tok: usize, target: Target) -> Vec<usize> {
    let Some(w) = sent.word(tok) else {
        return Vec::new();
    };
    match target {
        Target::Word => vec![tok],
        Target::Parent => {
            if w.dep_num == 0 {
                Vec::new()
            } else {
                vec![w.dep_num]
            }
        }
        Target::Child => sent.children(tok).to_vec(),
        Target::ParentChild => {
            if w.dep_num == 0 {
                return Vec::new();
            }
            sent.children(w.dep_num)
                .iter()
                .copied()
                .filter(|&c| c != tok)
                .collect()
        }
        Target::SemHead => sent
            .bunsetu_of(tok)
            .and_then(|b| b.subj_word())
            .map(|h| vec![h.token_pos])
            .unwrap_or_default(),
        Target::SynHead => sent
            .bunsetu_of(tok)
            .and_then(|b| b.func_word())
            .map(|h| vec![h.token_pos])
            .unwrap_or_default(),
    }
}

/// Case particles attached to `tok`.
pub fn case_markers(sent: &Sentence, tok: usize) -> Vec<String> {
    sent.children(tok)
        .iter()
        .filter_map(|&c| sent.word(c))
        .filter(|c| CASE_PARTICLE.is_match(&c.xpos()))
        .map(|c| c.lemma().to_string())
        .collect()
}

fn attribute(ctx: &SentenceContext<'_>, tok: usize, attr: Attribute) -> Vec<String> {
    let sent = ctx.sent;
    let Some(w) = sent.word(tok) else {
        return Vec::new();
    };
    match attr {
        Attribute::Lemma => vec![w.lemma().to_string()],
        Attribute::Xpos => vec![w.xpos()],
        Attribute::LuwPos => vec![w.luw_pos()],
        Attribute::Bpos => w
            .position_type
            .map(|t| vec![t.as_str().to_string()])
            .unwrap_or_default(),
        Attribute::Upos => vec![w.upos().to_string()],
        Attribute::DepNum => vec![w.dep_num.to_string()],
        Attribute::Katuyo => vec![w.katuyo().to_string()],
        Attribute::Case => case_markers(sent, tok),
        Attribute::BunsetuType => sent
            .bunsetu_of(tok)
            .map(|b| vec![b.bunsetu_type().as_str().to_string()])
            .unwrap_or_default(),
        Attribute::Segment => segment_names(ctx, tok),
        Attribute::PasLink => pas_cases(ctx, tok),
        Attribute::SuffixString => {
            let Some((b, i)) = sent.locate(tok) else {
                return Vec::new();
            };
            let rest: String = sent.bunsetus()[b].words[i + 1..]
                .iter()
                .map(|w| w.surface.as_str())
                .collect();
            vec![rest]
        }
        // handled by Predicate::Distance
        Attribute::DisFormula => Vec::new(),
    }
}

fn shift(r: Range, offset: usize) -> Range {
    (r.0 + offset, r.1 + offset)
}

/// Ranges of the segments covering `range` in both scopes, each tagged with
/// the list it came from (false: sentence, true: document).
fn covering_ranges(ctx: &SentenceContext<'_>, range: Range) -> Vec<(bool, Range)> {
    let sent_ann = &ctx.sent.annotations;
    let mut out: Vec<(bool, Range)> = sent_ann
        .covering(range)
        .filter_map(|i| sent_ann.segment(i))
        .map(|s| (false, s.range()))
        .collect();
    if let Some(doc) = ctx.doc_annotations {
        out.extend(
            doc.covering(shift(range, ctx.offset))
                .filter_map(|i| doc.segment(i))
                .map(|s| (true, s.range())),
        );
    }
    out
}

fn segment_names(ctx: &SentenceContext<'_>, tok: usize) -> Vec<String> {
    let Some(range) = ctx.sent.word_range(tok) else {
        return Vec::new();
    };
    let mut names: Vec<String> = ctx
        .sent
        .annotations
        .covering(range)
        .filter_map(|i| ctx.sent.annotations.segment(i))
        .map(|s| s.name.clone())
        .collect();
    if let Some(doc) = ctx.doc_annotations {
        names.extend(
            doc.covering(shift(range, ctx.offset))
                .filter_map(|i| doc.segment(i))
                .map(|s| s.name.clone()),
        );
    }
    names
}

/// The word carrying a predicate's PAS links: the first `為る` continuing
/// the head's long unit if there is one, else the head itself.
fn pas_predicate(sent: &Sentence, head: usize) -> usize {
    let Some((b, i)) = sent.locate(head) else {
        return head;
    };
    sent.bunsetus()[b].words[i + 1..]
        .iter()
        .take_while(|w| w.luw_label == Some(LuwLabel::I))
        .find(|w| w.lemma() == "為る")
        .map_or(head, |w| w.token_pos)
}

/// Case labels (`ga`, `o`, `ni`, ...) of PAS links between `tok` and its
/// head, in either direction.
fn pas_cases(ctx: &SentenceContext<'_>, tok: usize) -> Vec<String> {
    let sent = ctx.sent;
    let Some(w) = sent.word(tok) else {
        return Vec::new();
    };
    if w.dep_num == 0 {
        return Vec::new();
    }
    let pred = pas_predicate(sent, w.dep_num);
    let (Some(arg_range), Some(pred_range)) = (sent.word_range(tok), sent.word_range(pred)) else {
        return Vec::new();
    };
    let args = covering_ranges(ctx, arg_range);
    let preds = covering_ranges(ctx, pred_range);
    let mut cases = Vec::new();
    for &(a_doc, a) in &args {
        for &(p_doc, p) in &preds {
            if a_doc != p_doc {
                continue;
            }
            let list = if a_doc {
                match ctx.doc_annotations {
                    Some(d) => d,
                    None => continue,
                }
            } else {
                &sent.annotations
            };
            for link in list.links_between(a, p).chain(list.links_between(p, a)) {
                if let Some(c) = link.pas_case() {
                    cases.push(c.to_string());
                }
            }
        }
    }
    cases
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Link, Scope, Segment};
    use crate::testutil::{sentence, tok};

    fn sample() -> Sentence {
        let mut s = sentence(&[
            (2, vec![tok("猫", "名詞,普通名詞,一般"), tok("が", "助詞,格助詞")]),
            (2, vec![tok("魚", "名詞,普通名詞,一般"), tok("を", "助詞,格助詞")]),
            (-1, vec![tok("食べる", "動詞,一般")]),
        ]);
        for (t, h) in [(1, 5), (2, 1), (3, 5), (4, 3), (5, 0)] {
            s.word_mut(t).unwrap().dep_num = h;
        }
        for (t, u) in [(1, "NOUN"), (2, "ADP"), (3, "NOUN"), (4, "ADP"), (5, "VERB")] {
            s.word_mut(t).unwrap().set_upos(u);
        }
        s
    }

    fn labels(rules: &str, s: &mut Sentence) -> Vec<String> {
        let rules = DeprelRules::from_yaml(rules).unwrap();
        rules.assign(s, None);
        s.words().map(|w| w.dep_label.clone()).collect()
    }

    #[test]
    fn test_case_predicates() {
        let rules = r#"
- - match_word_upos: ADP
  - case
- - include_word_case: [が, は]
  - nsubj
- - match_word_case: [を]
  - obj
"#;
        let mut s = sample();
        assert_eq!(labels(rules, &mut s), vec!["nsubj", "case", "obj", "case", "root"]);
    }

    #[test]
    fn test_parent_child_and_suffix() {
        let rules = r#"
- - regex_parent_upos: ^VERB$
    include_child_lemma: [を]
  - obj
- - match_word_suffixstring: が
  - nsubj
- - include_parentchild_lemma: [が]
  - sibling
"#;
        let mut s = sample();
        let l = labels(rules, &mut s);
        assert_eq!(l[0], "nsubj");
        assert_eq!(l[2], "obj");
        assert_eq!(l[3], "dep");
    }

    #[test]
    fn test_disformula() {
        let rules = "- - match_word_disformula: X-Y>1\n  - far\n- - match_word_disformula: X-Y<0\n  - left\n";
        let mut s = sample();
        assert_eq!(labels(rules, &mut s), vec!["far", "left", "far", "left", "root"]);
    }

    #[test]
    fn test_segment_and_paslink() {
        let mut s = sample();
        let seg = |name: &str, start, end| Segment {
            scope: Scope::Sentence,
            name: name.to_string(),
            start,
            end,
            comment: String::new(),
            attrs: Default::default(),
        };
        s.annotations.push_segment(seg("Arg", 0, 1));
        s.annotations.push_segment(seg("Pred", 4, 7));
        s.annotations.push_link(Link {
            scope: Scope::Sentence,
            name: "pas:ga".to_string(),
            from: 1,
            to: 0,
            comment: String::new(),
            attrs: Default::default(),
        });
        let rules = "- - include_word_paslink: [ga]\n  - nsubj\n- - include_word_segment: [Pred]\n  - inpred\n";
        let l = labels(rules, &mut s);
        assert_eq!(l[0], "nsubj");
        assert_eq!(l[2], "dep");
        assert_eq!(l[4], "root");
        let ctx = SentenceContext::new(&s);
        assert_eq!(segment_names(&ctx, 5), vec!["Pred".to_string()]);
    }

    #[test]
    fn test_document_scope_segments_use_offset() {
        let s = sample();
        let mut doc = AnnotationList::new();
        doc.push_segment(Segment {
            scope: Scope::Document,
            name: "Disfluency".to_string(),
            start: 10,
            end: 12,
            comment: String::new(),
            attrs: Default::default(),
        });
        let ctx = SentenceContext::new(&s).with_document(&doc, 10);
        assert_eq!(segment_names(&ctx, 1), vec!["Disfluency".to_string()]);
        assert!(segment_names(&ctx, 3).is_empty());
    }

    #[test]
    fn test_bad_predicates_rejected() {
        for key in ["equal_word_upos", "match_uncle_upos", "match_word_colour", "match_word"] {
            let yaml = format!("- - {key}: X\n  - dep\n");
            let err = DeprelRules::from_yaml(&yaml).unwrap_err();
            assert!(matches!(err, RuleError::UnknownPredicate { .. }), "{key}");
        }
        let err = DeprelRules::from_yaml("- - match_word_disformula: Z>1\n  - dep\n").unwrap_err();
        assert!(matches!(err, RuleError::BadArgument { .. }));
    }

    #[test]
    fn test_busetutype() {
        let mut s = sentence(&[
            (1, vec![tok("これ", "代名詞"), tok("は", "助詞,係助詞")]),
            (-1, vec![tok("本", "名詞,普通名詞,一般"), tok("だ", "助動詞")]),
        ]);
        crate::converter::head::assign_heads(s.bunsetus_mut());
        s.word_mut(1).unwrap().dep_num = 3;
        s.word_mut(2).unwrap().dep_num = 1;
        s.word_mut(4).unwrap().dep_num = 3;
        let rules = "- - match_parent_busetutype: コピュラ\n    match_word_bpos: SEM_HEAD\n  - nsubj\n- - match_word_busetutype: コピュラ\n  - incop\n";
        s.word_mut(1).unwrap().position_type = Some(crate::model::PositionType::SemHead);
        let l = labels(rules, &mut s);
        assert_eq!(l, vec!["nsubj", "dep", "root", "incop"]);
    }
}
