//! `merge_number`: glues runs of single-digit numeral tokens into one token.

use tracing::debug;

use crate::model::{Sentence, SuwField, Word};
use crate::unicode::is_numeric_str;

const NUMERAL_XPOS: &str = "名詞-数詞";

/// Fields concatenated across a merged run.
const JOINED_FIELDS: [SuwField; 8] = [
    SuwField::LForm,
    SuwField::Lemma,
    SuwField::Orth,
    SuwField::OrthBase,
    SuwField::Kana,
    SuwField::KanaBase,
    SuwField::Form,
    SuwField::FormBase,
];

fn is_numeral(w: &Word) -> bool {
    is_numeric_str(&w.surface) && w.xpos() == NUMERAL_XPOS
}

/// Merges adjacent numeral tokens within each bunsetsu. Returns the number
/// of tokens removed.
pub fn merge_numbers(sent: &mut Sentence) -> usize {
    let mut removed = 0;
    for b in sent.bunsetus_mut() {
        let mut merged: Vec<Word> = Vec::with_capacity(b.words.len());
        for w in b.words.drain(..) {
            match merged.last_mut() {
                Some(prev) if is_numeral(prev) && is_numeral(&w) => {
                    absorb(prev, &w);
                    removed += 1;
                }
                _ => merged.push(w),
            }
        }
        b.words = merged;
    }
    if removed > 0 {
        sent.renumber();
    }
    removed
}

fn absorb(into: &mut Word, next: &Word) {
    debug!(token = into.token_pos, prev = %into.surface, next = %next.surface, "merge numeral");
    into.surface.push_str(&next.surface);
    for field in JOINED_FIELDS {
        let joined = format!("{}{}", into.features.get(field), next.features.get(field));
        into.features.set(field, joined);
    }
    into.features.set(SuwField::Lid, "");
    into.features.set(SuwField::LemmaId, "");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{sentence, tok};

    fn numeral(s: &str) -> crate::testutil::Tok {
        tok(s, "名詞,数詞").field(SuwField::Lid, "42").field(SuwField::LemmaId, "7")
    }

    #[test]
    fn test_merges_digit_run() {
        let mut s = sentence(&[
            (1, vec![numeral("1"), numeral("2"), numeral("3"), tok("人", "接尾辞,名詞的,助数詞")]),
            (-1, vec![tok("来る", "動詞,非自立可能")]),
        ]);
        assert_eq!(merge_numbers(&mut s), 2);
        assert_eq!(s.len(), 3);
        let w = s.word(1).unwrap();
        assert_eq!(w.surface, "123");
        assert_eq!(w.lemma(), "123");
        assert_eq!(w.orth(), "123");
        assert_eq!(w.features.get(SuwField::Lid), "");
        assert_eq!(w.features.get(SuwField::LemmaId), "");
        assert_eq!(s.word(2).unwrap().surface, "人");
        assert_eq!(s.word(3).unwrap().token_pos, 3);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_single_numeral_untouched() {
        let mut s = sentence(&[(-1, vec![numeral("5"), tok("個", "接尾辞,名詞的,助数詞")])]);
        assert_eq!(merge_numbers(&mut s), 0);
        assert_eq!(s.word(1).unwrap().features.get(SuwField::Lid), "42");
    }

    #[test]
    fn test_does_not_cross_bunsetsu() {
        let mut s = sentence(&[(1, vec![numeral("1")]), (-1, vec![numeral("2")])]);
        assert_eq!(merge_numbers(&mut s), 0);
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn test_kanji_numeral_not_numeric() {
        // kanji numerals are letters, not digits
        let mut s = sentence(&[(-1, vec![numeral("一"), numeral("億")])]);
        assert_eq!(merge_numbers(&mut s), 0);
    }
}
