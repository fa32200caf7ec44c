//! Sentence clean-up after DEPREL assignment: multi-subject disambiguation,
//! UPOS/DEPREL touch-ups, whitespace removal and SpaceAfter defaults.

use tracing::{debug, debug_span};

use crate::model::{Bunsetu, Sentence, Word};
use crate::rules::deprel::case_markers;
use crate::rules::ObjCaseTable;
use crate::unicode::strip_trailing_space;

/// Runs the clean-up passes in order.
pub(super) fn postprocess(sent: &mut Sentence, objcase: &ObjCaseTable, skip_space: bool) {
    let _span = debug_span!("postprocess", words = sent.len()).entered();
    disambiguate_subjects(sent, objcase);
    touch_up(sent);
    if skip_space {
        remove_spaces(sent);
    }
    default_space_after(sent);
}

fn is_subject(label: &str) -> bool {
    matches!(label, "nsubj" | "csubj")
}

/// Relabels the subjects of predicates that have more than one, by their
/// case-particle pattern. Subjects marked by several particles become `obl`
/// first and drop out of the pattern.
pub fn disambiguate_subjects(sent: &mut Sentence, table: &ObjCaseTable) {
    let mut edits: Vec<(usize, String)> = Vec::new();
    for head in 1..=sent.len() {
        let mut subjects: Vec<(usize, String)> = Vec::new();
        for &c in sent.children(head) {
            let Some(w) = sent.word(c) else { continue };
            if !is_subject(&w.dep_label) {
                continue;
            }
            let markers = case_markers(sent, c);
            if markers.len() > 1 {
                edits.push((c, "obl".to_string()));
                continue;
            }
            subjects.push((c, markers.into_iter().next().unwrap_or_default()));
        }
        if subjects.len() < 2 {
            continue;
        }
        let cases: Vec<&str> = subjects.iter().map(|(_, c)| c.as_str()).collect();
        if let Some(evals) = table.lookup(&cases) {
            for e in evals {
                if let Some(&(tok, _)) = subjects.get(e.pos) {
                    edits.push((tok, e.dep.clone()));
                }
            }
        }
    }
    if edits.is_empty() {
        return;
    }
    for w in sent.words_mut() {
        if let Some((_, label)) = edits.iter().rev().find(|(t, _)| *t == w.token_pos) {
            debug!(token = w.token_pos, from = %w.dep_label, to = %label, "multi-subject relabel");
            w.dep_label = label.clone();
        }
    }
}

/// Small UPOS/DEPREL corrections the rule tables cannot express.
pub fn touch_up(sent: &mut Sentence) {
    let n = sent.len();
    let mut promote_to_verb = Vec::new();
    for t in 1..=n {
        let Some(w) = sent.word(t) else { continue };
        if w.lemma() == "為る" && w.upos() == "AUX" && w.dep_num != 0 {
            let parent = w.dep_num;
            if sent
                .word(parent)
                .is_some_and(|p| p.upos() == "NOUN" && p.xpos().contains("サ変可能"))
            {
                promote_to_verb.push(parent);
            }
        }
    }
    let mut promote = vec![false; n + 1];
    for t in promote_to_verb {
        promote[t] = true;
    }
    for w in sent.words_mut() {
        let t = w.token_pos;
        if w.upos() == "PUNCT" && w.dep_num != 0 && w.dep_label != "punct" {
            w.dep_label = "punct".to_string();
        }
        if w.upos() == "AUX" && w.dep_label == "cc" {
            debug!(token = t, "cc auxiliary retagged CCONJ");
            w.set_upos("CCONJ");
        }
        if w.upos() == "NOUN" && w.luw_pos().starts_with("助動詞") {
            debug!(token = t, "auxiliary long unit retagged AUX");
            w.set_upos("AUX");
            if w.dep_num != 0 {
                w.dep_label = "aux".to_string();
            }
        }
        if promote.get(t).copied().unwrap_or(false) {
            debug!(token = t, "sa-hen noun with する retagged VERB");
            w.set_upos("VERB");
        }
    }
    flatten_fixed(sent);
}

/// `fixed` dependents of a `fixed` word move up to its head, so that every
/// fixed expression hangs off its first word.
fn flatten_fixed(sent: &mut Sentence) {
    let arcs: Vec<(usize, bool)> = std::iter::once((0, false))
        .chain(sent.words().map(|w| (w.dep_num, w.dep_label == "fixed")))
        .collect();
    let n = arcs.len() - 1;
    let mut heads: Vec<usize> = arcs.iter().map(|&(h, _)| h).collect();
    for t in 1..=n {
        if !arcs[t].1 {
            continue;
        }
        let mut h = heads[t];
        for _ in 0..n {
            match arcs.get(h) {
                Some(&(up, true)) if up != 0 => h = up,
                _ => break,
            }
        }
        heads[t] = h;
    }
    if heads.iter().zip(&arcs).all(|(h, (old, _))| h == old) {
        return;
    }
    for w in sent.words_mut() {
        w.dep_num = heads[w.token_pos];
    }
}

/// Drops whitespace words and trailing whitespace inside surfaces. The word
/// before a removed space gets `SpaceAfter=Yes`; dependents of a removed
/// word become roots.
pub fn remove_spaces(sent: &mut Sentence) {
    let removed: Vec<bool> = std::iter::once(false)
        .chain(sent.words().map(Word::is_space))
        .collect();
    let count = removed.iter().filter(|&&r| r).count();
    if count > 0 {
        for w in sent.words_mut() {
            let t = w.token_pos;
            if !removed[t] && removed.get(t + 1).copied().unwrap_or(false) {
                w.set_space_after(true);
            }
        }
        let bunsetus = sent.bunsetus_mut();
        for b in bunsetus.iter_mut() {
            b.words.retain(|w| !w.is_space());
            realign_heads(b);
        }
        drop_empty_bunsetus(bunsetus);
        sent.renumber();
        debug!(removed = count, "space words removed");
    }

    for w in sent.words_mut() {
        let (trimmed, had_space) = strip_trailing_space(&w.surface);
        if had_space && !trimmed.is_empty() {
            w.surface = trimmed.to_string();
            w.set_space_after(true);
        }
    }
}

fn realign_heads(b: &mut Bunsetu) {
    let subj = b.words.iter().position(|w| w.is_subj).unwrap_or(0);
    let func = b.words.iter().position(|w| w.is_func).unwrap_or(subj).max(subj);
    b.subj_pos = subj;
    b.func_pos = func;
}

/// Removes empty bunsetsu; pointers to a removed one follow its own
/// pointer.
fn drop_empty_bunsetus(bunsetus: &mut Vec<Bunsetu>) {
    if bunsetus.iter().all(|b| !b.words.is_empty()) {
        return;
    }
    let old: Vec<(bool, i32)> = bunsetus.iter().map(|b| (b.words.is_empty(), b.dep_pos)).collect();
    let mut new_index = vec![None; old.len()];
    let mut next = 0;
    for (i, (empty, _)) in old.iter().enumerate() {
        if !empty {
            new_index[i] = Some(next as i32);
            next += 1;
        }
    }
    let resolve = |mut d: i32| {
        for _ in 0..=old.len() {
            let Ok(i) = usize::try_from(d) else { return -1 };
            match old.get(i) {
                Some((false, _)) => return new_index[i].unwrap_or(-1),
                Some((true, up)) => d = *up,
                None => return -1,
            }
        }
        -1
    };
    bunsetus.retain(|b| !b.words.is_empty());
    for b in bunsetus.iter_mut() {
        b.dep_pos = resolve(b.dep_pos);
    }
}

/// Every word without an explicit `SpaceAfter` gets `SpaceAfter=No`.
pub fn default_space_after(sent: &mut Sentence) {
    for w in sent.words_mut() {
        if !w.ud_misc.contains_key("SpaceAfter") {
            w.set_space_after(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::DEFAULT_OBJCASE_TOML;
    use crate::testutil::{sentence, tok};

    fn wire(s: &mut Sentence, arcs: &[(usize, usize, &str, &str)]) {
        for &(t, h, d, u) in arcs {
            let w = s.word_mut(t).unwrap();
            w.dep_num = h;
            w.dep_label = d.to_string();
            w.set_upos(u);
        }
    }

    #[test]
    fn test_dislocation() {
        let mut s = sentence(&[
            (3, vec![tok("象", "名詞,普通名詞,一般"), tok("は", "助詞,係助詞")]),
            (3, vec![tok("昨日", "名詞,普通名詞,副詞可能")]),
            (3, vec![tok("鼻", "名詞,普通名詞,一般"), tok("が", "助詞,格助詞")]),
            (-1, vec![tok("長い", "形容詞,一般")]),
        ]);
        wire(
            &mut s,
            &[
                (1, 6, "nsubj", "NOUN"),
                (2, 1, "case", "ADP"),
                (3, 6, "obl", "NOUN"),
                (4, 6, "nsubj", "NOUN"),
                (5, 4, "case", "ADP"),
                (6, 0, "root", "ADJ"),
            ],
        );
        let table = ObjCaseTable::from_toml(DEFAULT_OBJCASE_TOML).unwrap();
        disambiguate_subjects(&mut s, &table);
        assert_eq!(s.word(1).unwrap().dep_label, "dislocated");
        assert_eq!(s.word(3).unwrap().dep_label, "obl");
        assert_eq!(s.word(4).unwrap().dep_label, "nsubj");
    }

    #[test]
    fn test_double_particle_subject_becomes_obl() {
        let mut s = sentence(&[
            (1, vec![tok("東京", "名詞,固有名詞,地名"), tok("に", "助詞,格助詞"), tok("は", "助詞,係助詞")]),
            (-1, vec![tok("ある", "動詞,非自立可能")]),
        ]);
        wire(&mut s, &[(1, 4, "nsubj", "PROPN"), (2, 1, "case", "ADP"), (3, 1, "case", "ADP"), (4, 0, "root", "VERB")]);
        let table = ObjCaseTable::from_toml(DEFAULT_OBJCASE_TOML).unwrap();
        disambiguate_subjects(&mut s, &table);
        assert_eq!(s.word(1).unwrap().dep_label, "obl");
    }

    #[test]
    fn test_touch_up() {
        let mut s = sentence(&[
            (1, vec![tok("勉強", "名詞,普通名詞,サ変可能"), tok("し", "動詞,非自立可能").lemma("為る")]),
            (-1, vec![tok("た", "助動詞"), tok("。", "補助記号,句点")]),
        ]);
        wire(&mut s, &[(1, 0, "root", "NOUN"), (2, 1, "aux", "AUX"), (3, 1, "aux", "AUX"), (4, 1, "dep", "PUNCT")]);
        touch_up(&mut s);
        assert_eq!(s.word(1).unwrap().upos(), "VERB");
        assert_eq!(s.word(4).unwrap().dep_label, "punct");
    }

    #[test]
    fn test_fixed_chain_flattened() {
        let mut s = sentence(&[(
            -1,
            vec![
                tok("に", "助詞,格助詞"),
                tok("つい", "動詞,非自立可能"),
                tok("て", "助詞,接続助詞"),
                tok("話す", "動詞,一般"),
            ],
        )]);
        wire(&mut s, &[(1, 4, "case", "ADP"), (2, 1, "fixed", "VERB"), (3, 2, "fixed", "SCONJ"), (4, 0, "root", "VERB")]);
        touch_up(&mut s);
        assert_eq!(s.word(3).unwrap().dep_num, 1);
        assert_eq!(s.word(2).unwrap().dep_num, 1);
    }

    #[test]
    fn test_remove_space_words() {
        let mut s = sentence(&[
            (1, vec![tok("東京", "名詞,固有名詞,地名"), tok("　", "空白")]),
            (-1, vec![tok("着く", "動詞,一般")]),
        ]);
        wire(&mut s, &[(1, 3, "obl", "PROPN"), (2, 1, "dep", "SYM"), (3, 0, "root", "VERB")]);
        remove_spaces(&mut s);
        default_space_after(&mut s);
        assert_eq!(s.len(), 2);
        assert!(s.word(1).unwrap().space_after());
        assert_eq!(s.word(1).unwrap().dep_num, 2);
        assert!(!s.word(2).unwrap().space_after());
        assert!(s.words().all(|w| !w.xpos().starts_with("空白")));
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_space_dependents_become_roots() {
        let mut s = sentence(&[
            (1, vec![tok("東京", "名詞,固有名詞,地名"), tok("　", "空白")]),
            (-1, vec![tok("着く", "動詞,一般")]),
        ]);
        wire(&mut s, &[(1, 2, "dep", "PROPN"), (2, 3, "dep", "SYM"), (3, 0, "root", "VERB")]);
        remove_spaces(&mut s);
        let w = s.word(1).unwrap();
        assert_eq!((w.dep_num, w.dep_label.as_str()), (0, "root"));
        assert!(w.space_after());
        assert_eq!(s.roots(), vec![1, 2]);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_space_only_bunsetu_dropped() {
        let mut s = sentence(&[
            (2, vec![tok("雨", "名詞,普通名詞,一般")]),
            (2, vec![tok("　", "空白")]),
            (-1, vec![tok("降る", "動詞,一般")]),
        ]);
        wire(&mut s, &[(1, 3, "nsubj", "NOUN"), (2, 3, "dep", "SYM"), (3, 0, "root", "VERB")]);
        remove_spaces(&mut s);
        assert_eq!(s.bunsetus().len(), 2);
        assert_eq!(s.bunsetus()[0].dep_pos, 1);
        assert_eq!(s.word(1).unwrap().dep_num, 2);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_trailing_space_in_surface() {
        let mut s = sentence(&[(-1, vec![tok("東京　", "名詞,固有名詞,地名")])]);
        remove_spaces(&mut s);
        let w = s.word(1).unwrap();
        assert_eq!(w.surface, "東京");
        assert!(w.space_after());
    }
}
