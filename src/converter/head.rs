//! Semantic / functional head detection inside a bunsetsu.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::model::{Bunsetu, Word};

/// Functional markers, matched against the comma-joined features.
static FUNC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(助詞|助動詞|接尾辞,形容詞的|接尾辞,形状詞的|接尾辞,動詞的)").unwrap()
});

/// Words that can never be a content head. A word is a content candidate
/// when this does *not* match.
static NOT_SUBJ: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(助詞|助動詞|接尾辞,形容詞的|接尾辞,形状詞的|接尾辞,動詞的|空白|補助記号|形状詞,助動詞語幹|名詞,助動詞語幹|接頭辞|接続詞)",
    )
    .unwrap()
});

static NO_SUBJ: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(補助記号,括弧|接頭辞)").unwrap());

const LIGHT_VERBS: &[&str] = &["為る", "出来る", "下さる", "頂く", "為さる"];
const COMPLEMENTIZERS: &[&str] = &["もの", "物", "こと", "事"];

fn is_func(w: &Word) -> bool {
    FUNC.is_match(&w.features.joined())
}

fn is_subj(w: &Word) -> bool {
    !NOT_SUBJ.is_match(&w.features.joined())
}

fn luw_major(w: &Word) -> String {
    w.luw_pos().split('-').next().unwrap_or("").to_string()
}

/// Inflecting long units, the ones that can continue a predicate.
fn is_inflecting_luw(w: &Word) -> bool {
    matches!(luw_major(w).as_str(), "動詞" | "形容詞" | "形容動詞")
}

/// Result of head detection for one bunsetsu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heads {
    pub subj_pos: usize,
    pub func_pos: usize,
    /// False when no word qualified as either head.
    pub found: bool,
}

/// Computes `(subj_pos, func_pos)` for a word sequence.
pub fn detect_heads(words: &[Word]) -> Heads {
    if words.is_empty() {
        return Heads {
            subj_pos: 0,
            func_pos: 0,
            found: false,
        };
    }

    let mut subj_pos = 0;
    let mut func_pos = 0;
    let mut func_started = false;
    let mut found = false;
    let mut func_positions = Vec::new();

    for (i, w) in words.iter().enumerate() {
        if is_func(w) {
            func_pos = i;
            func_started = true;
            found = true;
            func_positions.push(i);
        } else if !func_started && is_subj(w) {
            // 接続助詞 long units over an adverb-capable word keep the earlier head
            if w.luw_pos() == "助詞-接続助詞" && w.features.xpos().ends_with("副詞可能") {
                continue;
            }
            subj_pos = i;
            found = true;
        } else if func_started && is_subj(w) {
            func_pos = i;
            func_positions.push(i);
        }
    }

    if func_positions.len() > 1 && func_positions.iter().all(|&i| is_inflecting_luw(&words[i])) {
        func_pos = func_positions[0];
    }
    if subj_pos > func_pos {
        func_pos = subj_pos;
    }

    subj_pos = sweep_no_subj(words, subj_pos, func_pos);
    subj_pos = contract_sa(words, subj_pos);
    subj_pos = fix_inside_paren(words, subj_pos);
    (subj_pos, func_pos) = check_other_subj(words, subj_pos, func_pos);
    subj_pos = promote_conjunction(words, subj_pos);
    subj_pos = swap_sahen(words, subj_pos);

    if subj_pos > func_pos {
        func_pos = subj_pos;
    }
    Heads {
        subj_pos,
        func_pos,
        found,
    }
}

fn sweep_no_subj(words: &[Word], mut subj_pos: usize, func_pos: usize) -> usize {
    while subj_pos < func_pos && NO_SUBJ.is_match(&words[subj_pos].features.joined()) {
        subj_pos += 1;
    }
    subj_pos
}

/// `高さ`: the nominalizing suffix defers to the stem before it.
fn contract_sa(words: &[Word], subj_pos: usize) -> usize {
    let head = &words[subj_pos];
    if head.xpos() != "接尾辞-名詞的" || head.lemma() != "さ" {
        return subj_pos;
    }
    (0..subj_pos)
        .rev()
        .find(|&j| is_subj(&words[j]))
        .unwrap_or(subj_pos)
}

/// A head inside parentheses moves back to the content before the bracket.
fn fix_inside_paren(words: &[Word], subj_pos: usize) -> usize {
    let Some(open) = words.iter().position(Word::is_open_bracket) else {
        return subj_pos;
    };
    if subj_pos <= open {
        return subj_pos;
    }
    (0..open)
        .rev()
        .find(|&j| words[j].pos1() != "補助記号")
        .filter(|&j| is_subj(&words[j]))
        .unwrap_or(subj_pos)
}

fn inside_parens(words: &[Word]) -> Vec<bool> {
    let mut depth = 0usize;
    words
        .iter()
        .map(|w| {
            if w.is_open_bracket() {
                depth += 1;
                false
            } else if w.is_close_bracket() {
                depth = depth.saturating_sub(1);
                false
            } else {
                depth > 0
            }
        })
        .collect()
}

/// Light verbs and complementizer nouns inside a functional long unit give
/// the head back to the earliest real content word.
fn check_other_subj(words: &[Word], subj_pos: usize, func_pos: usize) -> (usize, usize) {
    let head = &words[subj_pos];
    let non_autonomous_verb = head.xpos().starts_with("動詞-非自立可能");
    let complementizer = head.pos1() == "名詞"
        && COMPLEMENTIZERS.contains(&head.lemma())
        && matches!(luw_major(head).as_str(), "助詞" | "助動詞");
    if !non_autonomous_verb && !complementizer {
        return (subj_pos, func_pos);
    }
    let in_paren = inside_parens(words);
    let candidate = words.iter().enumerate().position(|(i, w)| {
        let xpos = w.xpos();
        is_subj(w)
            && !in_paren[i]
            && !xpos.starts_with("接尾辞")
            && !xpos.starts_with("補助記号")
            && !LIGHT_VERBS.contains(&w.lemma())
            && !(i == subj_pos && non_autonomous_verb)
    });
    match candidate {
        Some(c) if c < subj_pos => (c, func_pos.max(c)),
        _ => (subj_pos, func_pos),
    }
}

/// `そして`: a conjunction long unit is headed by its first word.
fn promote_conjunction(words: &[Word], subj_pos: usize) -> usize {
    if luw_major(&words[subj_pos]) == "接続詞" && luw_major(&words[0]) == "接続詞" {
        0
    } else {
        subj_pos
    }
}

/// `勉強 する`: the sa-hen noun heads, the light verb becomes function.
fn swap_sahen(words: &[Word], subj_pos: usize) -> usize {
    if subj_pos > 0
        && words[subj_pos].xpos().starts_with("動詞-非自立可能")
        && words[subj_pos - 1].xpos().starts_with("名詞-普通名詞-サ変可能")
    {
        subj_pos - 1
    } else {
        subj_pos
    }
}

/// Runs head detection on every bunsetsu of `bunsetus`.
pub fn assign_heads(bunsetus: &mut [Bunsetu]) {
    for b in bunsetus {
        let heads = detect_heads(&b.words);
        b.has_head = heads.found;
        b.set_heads(heads.subj_pos, heads.func_pos);
        if !heads.found {
            debug!(bunsetu = b.bunsetu_pos, "no head candidate");
        }
    }
}
