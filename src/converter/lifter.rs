//! Lifts bunsetsu-level dependencies to word-level arcs.

use crate::model::{PositionType, Sentence};

/// Assigns `dep_num` and the position type of every word from the bunsetsu
/// tree and the detected heads.
pub fn lift_arcs(sent: &mut Sentence) {
    let heads: Vec<usize> = sent
        .bunsetus()
        .iter()
        .map(|b| b.subj_word().map_or(0, |w| w.token_pos))
        .collect();

    for b in sent.bunsetus_mut() {
        let parent_word = b.parent().and_then(|p| heads.get(p).copied()).unwrap_or(0);
        let subj_head = heads[b.bunsetu_pos];
        let self_loop = b.is_self_loop();
        let has_head = b.has_head;
        for w in &mut b.words {
            let (dep, ptype) = if !has_head {
                (parent_word, PositionType::NoHead)
            } else if self_loop && w.is_subj {
                (0, PositionType::NoHead)
            } else if w.is_subj {
                let t = if parent_word == 0 {
                    PositionType::Root
                } else {
                    PositionType::SemHead
                };
                (parent_word, t)
            } else if w.is_func {
                (subj_head, PositionType::SynHead)
            } else if w.pos1().starts_with('助') || w.pos2() == "非自立可能" {
                (subj_head, PositionType::Func)
            } else {
                (subj_head, PositionType::Cont)
            };
            w.dep_num = dep;
            w.position_type = Some(ptype);
        }
    }

    for w in sent.words_mut() {
        if w.dep_num == w.token_pos {
            w.dep_num = 0;
            w.position_type = Some(PositionType::NoHead);
        }
    }
}
