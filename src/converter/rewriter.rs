use tracing::debug;

use crate::model::{LuwLabel, PositionType, Sentence, Word};

/// A pattern-directed rewrite of the word tree. Bunsetsu that do not match
/// the pattern are left untouched.
pub(crate) trait Rewriter {
    fn name(&self) -> &'static str;
    fn rewrite(&self, sent: &mut Sentence);
}

/// Run all rewriters in sequence on one sentence.
pub(crate) fn run_rewriters(rewriters: &[&dyn Rewriter], sent: &mut Sentence) {
    for rw in rewriters {
        rw.rewrite(sent);
    }
}

/// The fixed rewrite sequence applied after arc lifting.
pub(crate) fn default_rewriters() -> [&'static dyn Rewriter; 5] {
    [
        &LuwParticleChainRewriter,
        &BracketReversalRewriter,
        &TekiRewriter,
        &CrossBracketRewriter,
        &AuxSwapRewriter,
    ]
}

/// Makes `new` take over the place of `old` in the tree: `new` inherits
/// `old`'s head and position type, every other child of `old` moves to `new`,
/// and `old` hangs below `new` as `demoted`. Returns false when the swap would
/// create a cycle.
pub(crate) fn promote(sent: &mut Sentence, old: usize, new: usize, demoted: PositionType) -> bool {
    if old == new || sent.is_ancestor(new, old) {
        return false;
    }
    let Some(old_word) = sent.word(old) else {
        return false;
    };
    let old_dep = old_word.dep_num;
    let old_type = old_word.position_type;
    let old_is_subj = old_word.is_subj;
    let children: Vec<usize> = sent.children(old).to_vec();
    for c in children {
        if c != new {
            if let Some(w) = sent.word_mut(c) {
                w.dep_num = new;
            }
        }
    }
    if let Some(w) = sent.word_mut(new) {
        w.dep_num = old_dep;
        w.position_type = old_type;
    }
    if let Some(w) = sent.word_mut(old) {
        w.dep_num = new;
        w.position_type = Some(demoted);
    }

    // keep the bunsetsu head index in step when the swap stays inside it
    if old_is_subj {
        if let (Some((ob, _)), Some((nb, ni))) = (sent.locate(old), sent.locate(new)) {
            if ob == nb {
                let b = &mut sent.bunsetus_mut()[nb];
                let func = b.func_pos.max(ni);
                b.set_heads(ni, func);
            }
        }
    }
    true
}

/// `について`: every I-continuation of a functional long unit attaches to
/// the unit's first word.
pub(crate) struct LuwParticleChainRewriter;

impl Rewriter for LuwParticleChainRewriter {
    fn name(&self) -> &'static str {
        "luw_particle_chain"
    }

    fn rewrite(&self, sent: &mut Sentence) {
        let mut moves = Vec::new();
        for b in sent.bunsetus() {
            let mut chain_head: Option<usize> = None;
            for w in &b.words {
                match w.luw_label {
                    Some(LuwLabel::B) => {
                        let pos = w.luw_pos();
                        chain_head = (pos.starts_with("助動詞") || pos.starts_with("助詞"))
                            .then_some(w.token_pos);
                    }
                    Some(LuwLabel::I) => {
                        if let Some(h) = chain_head {
                            moves.push((w.token_pos, h));
                        }
                    }
                    None => chain_head = None,
                }
            }
        }
        for (tok, head) in moves {
            if sent.is_ancestor(tok, head) || sent.word(tok).is_some_and(|w| w.dep_num == head) {
                continue;
            }
            if let Some(w) = sent.word_mut(tok) {
                w.dep_num = head;
                debug!(rewrite = self.name(), token = tok, head, "applied");
            }
        }
    }
}

/// An opening bracket chosen as semantic head hands the role to the word
/// right after it.
pub(crate) struct BracketReversalRewriter;

impl Rewriter for BracketReversalRewriter {
    fn name(&self) -> &'static str {
        "bracket_reversal"
    }

    fn rewrite(&self, sent: &mut Sentence) {
        let mut swaps = Vec::new();
        for b in sent.bunsetus() {
            let Some(s) = b.subj_word() else { continue };
            if !s.is_open_bracket() {
                continue;
            }
            if let Some(next) = b.words.get(b.subj_pos + 1) {
                if next.dep_num == s.token_pos {
                    swaps.push((s.token_pos, next.token_pos));
                }
            }
        }
        for (old, new) in swaps {
            if promote(sent, old, new, PositionType::Cont) {
                debug!(rewrite = self.name(), token = new, "applied");
            }
        }
    }
}

fn is_common_noun(w: &Word) -> bool {
    w.xpos().starts_with("名詞-普通名詞-一般")
}

/// `経済 的 問題`: the noun after a `-teki` suffix becomes the head.
pub(crate) struct TekiRewriter;

impl Rewriter for TekiRewriter {
    fn name(&self) -> &'static str {
        "teki_promotion"
    }

    fn rewrite(&self, sent: &mut Sentence) {
        let mut jobs = Vec::new();
        for b in sent.bunsetus() {
            let Some(i) = b.words.iter().position(|w| w.xpos() == "接尾辞-形状詞的") else {
                continue;
            };
            if i == 0 || b.subj_pos != i - 1 {
                continue;
            }
            let run = b.words[i + 1..].iter().take_while(|w| is_common_noun(w)).count();
            if run == 0 {
                continue;
            }
            let new = b.words[i + run].token_pos;
            let between: Vec<usize> = b.words[i..i + run].iter().map(|w| w.token_pos).collect();
            jobs.push((b.words[i - 1].token_pos, new, between));
        }
        for (old, new, between) in jobs {
            if !promote(sent, old, new, PositionType::Cont) {
                continue;
            }
            for t in between {
                if let Some(w) = sent.word_mut(t) {
                    w.dep_num = new;
                    w.position_type = Some(PositionType::Cont);
                }
            }
            debug!(rewrite = self.name(), token = new, "applied");
        }
    }
}

/// An opening bracket heading its bunsetsu whose long arc crosses other arcs
/// is reattached to the following word.
pub(crate) struct CrossBracketRewriter;

impl Rewriter for CrossBracketRewriter {
    fn name(&self) -> &'static str {
        "cross_bracket"
    }

    fn rewrite(&self, sent: &mut Sentence) {
        let mut targets = Vec::new();
        for b in sent.bunsetus() {
            let Some(s) = b.subj_word() else { continue };
            if !s.is_open_bracket() || s.dep_num == 0 {
                continue;
            }
            let head_local = sent.bunsetu_of(s.dep_num).map(|hb| hb.bunsetu_pos) == Some(b.bunsetu_pos);
            if !head_local {
                targets.push(s.token_pos);
            }
        }
        for s in targets {
            let Some(head) = sent.word(s).map(|w| w.dep_num) else {
                continue;
            };
            let (lo, hi) = (s.min(head), s.max(head));
            let crossing = (lo + 1..hi).any(|t| t != head && !sent.is_ancestor(head, t));
            let next = s + 1;
            if !crossing || next > sent.len() || next == head || sent.is_ancestor(s, next) {
                continue;
            }
            if let Some(w) = sent.word_mut(s) {
                w.dep_num = next;
                debug!(rewrite = self.name(), token = s, head = next, "applied");
            }
        }
    }
}

/// Long-unit lemmas of auxiliaries that take over their complement.
const SWAP_AUX_LEMMAS: &[&str] = &[
    "だ",
    "わけにはいかない",
    "こともある",
    "こととなる",
    "ことになる",
    "ことがある",
    "こともない",
    "ことができない",
    "ではない",
];

/// True if the head word `p` of a bunsetsu should become the syntactic head
/// of the bunsetsu whose semantic head depends on it.
fn swaps_with_child(p: &Word, child_func: &Word) -> bool {
    let luw_pos = p.luw_pos();
    let functional_luw = luw_pos.starts_with("助動詞") || luw_pos.starts_with("助詞");
    let aux = p.pos1() == "助動詞" || luw_pos.starts_with("助動詞");
    if aux && (SWAP_AUX_LEMMAS.contains(&p.lemma()) || SWAP_AUX_LEMMAS.contains(&p.luw_lemma())) {
        return true;
    }
    if p.lemma() == "来る" && p.xpos().starts_with("動詞-非自立可能") && child_func.lemma() == "て" {
        return true;
    }
    matches!(p.lemma(), "上" | "所") && functional_luw
}

/// Auxiliary-like bunsetsu (`だ`, `ことになる`, `て 来る`, `上で`) are
/// demoted below the content they follow.
pub(crate) struct AuxSwapRewriter;

impl Rewriter for AuxSwapRewriter {
    fn name(&self) -> &'static str {
        "aux_swap"
    }

    fn rewrite(&self, sent: &mut Sentence) {
        let mut swaps = Vec::new();
        for b in sent.bunsetus() {
            if !b.has_head {
                continue;
            }
            let (Some(h), Some(f)) = (b.subj_word(), b.func_word()) else {
                continue;
            };
            let Some(p) = sent.word(h.dep_num) else { continue };
            if p.bunsetu_pos == b.bunsetu_pos || !p.is_subj {
                continue;
            }
            if swaps_with_child(p, f) {
                swaps.push((p.token_pos, h.token_pos));
            }
        }
        for (old, new) in swaps {
            if promote(sent, old, new, PositionType::SynHead) {
                debug!(rewrite = self.name(), token = new, aux = old, "applied");
            }
        }
    }
}
