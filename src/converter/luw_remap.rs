//! Moves long units that straddle a bunsetsu boundary into the earlier
//! bunsetsu.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::model::{Bunsetu, LuwLabel, Sentence};

/// Long units that cannot open a bunsetsu that has dependents on its left.
static FUNCTIONAL_LUW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(助動詞|助詞|補助記号-句点|補助記号-読点|補助記号-括弧|接続詞)").unwrap()
});

/// Number of leading words of `b` to move to the previous bunsetsu, if any.
fn leading_move(bunsetus: &[Bunsetu], k: usize) -> usize {
    let b = &bunsetus[k];
    let Some(first) = b.words.first() else {
        return 0;
    };
    let continuation_len = |start: usize| {
        b.words[start..]
            .iter()
            .take_while(|w| w.luw_label == Some(LuwLabel::I))
            .count()
    };
    if first.luw_label == Some(LuwLabel::I) {
        return continuation_len(0);
    }
    let has_left_dependent = bunsetus[..k]
        .iter()
        .any(|o| o.parent() == Some(k));
    if first.luw.is_some() && has_left_dependent && FUNCTIONAL_LUW.is_match(&first.luw_pos()) {
        return 1 + continuation_len(1);
    }
    0
}

/// Removes the empty bunsetsu `k`, redirecting its dependents to `k - 1`
/// and shifting later indices down.
fn collapse(bunsetus: &mut Vec<Bunsetu>, k: usize) {
    let removed = bunsetus.remove(k);
    let prev = k - 1;
    for (i, b) in bunsetus.iter_mut().enumerate() {
        let Some(p) = b.parent() else { continue };
        let target = if p == k {
            if i == prev {
                removed.dep_pos
            } else {
                prev as i32
            }
        } else {
            b.dep_pos
        };
        b.dep_pos = match usize::try_from(target) {
            Ok(t) if t > k => target - 1,
            _ => target,
        };
    }
}

/// Repeats the move until no bunsetsu qualifies. Returns true if anything
/// changed.
pub fn remap_long_units(sent: &mut Sentence) -> bool {
    let bunsetus = sent.bunsetus_mut();
    let mut changed = false;
    loop {
        let Some((k, n)) = (1..bunsetus.len())
            .map(|k| (k, leading_move(bunsetus, k)))
            .find(|&(_, n)| n > 0)
        else {
            break;
        };
        let moved: Vec<_> = bunsetus[k].words.drain(..n).collect();
        debug!(bunsetu = k, words = moved.len(), "long unit moved to previous bunsetsu");
        bunsetus[k - 1].words.extend(moved);
        if bunsetus[k].words.is_empty() {
            collapse(bunsetus, k);
        }
        changed = true;
    }
    if changed {
        sent.renumber();
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{sentence, tok};

    #[test]
    fn test_continuation_moves_and_collapses() {
        let mut s = sentence(&[
            (2, vec![tok("研究", "名詞,普通名詞,サ変可能").luw("研究所", "名詞,普通名詞,一般")]),
            (2, vec![tok("所", "接尾辞,名詞的,一般").cont()]),
            (-1, vec![tok("ある", "動詞,非自立可能").luw("ある", "動詞,非自立可能")]),
        ]);
        assert!(remap_long_units(&mut s));
        assert_eq!(s.bunsetus().len(), 2);
        assert_eq!(s.bunsetus()[0].words.len(), 2);
        assert_eq!(s.bunsetus()[0].dep_pos, 1);
        assert_eq!(s.bunsetus()[1].bunsetu_pos, 1);
        assert_eq!(s.bunsetus()[1].dep_pos, -1);
        assert_eq!(s.word(3).unwrap().bunsetu_pos, 1);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_pointer_to_collapsed_bunsetu_redirected() {
        let mut s = sentence(&[
            (1, vec![tok("雨", "名詞,普通名詞,一般").luw("雨", "名詞,普通名詞,一般")]),
            (3, vec![tok("降り", "動詞,一般").luw("降り続く", "動詞,一般")]),
            (3, vec![tok("続く", "動詞,一般").cont()]),
            (-1, vec![tok("日", "名詞,普通名詞,一般").luw("日", "名詞,普通名詞,一般")]),
        ]);
        remap_long_units(&mut s);
        let deps: Vec<i32> = s.bunsetus().iter().map(|b| b.dep_pos).collect();
        assert_eq!(deps, vec![1, 2, -1]);
    }

    #[test]
    fn test_functional_unit_with_left_dependent() {
        let mut s = sentence(&[
            (1, vec![tok("本", "名詞,普通名詞,一般").luw("本", "名詞,普通名詞,一般")]),
            (
                -1,
                vec![
                    tok("を", "助詞,格助詞").luw("を", "助詞,格助詞"),
                    tok("読む", "動詞,一般").luw("読む", "動詞,一般"),
                ],
            ),
        ]);
        assert!(remap_long_units(&mut s));
        assert_eq!(s.bunsetus()[0].words.len(), 2);
        assert_eq!(s.bunsetus()[1].words[0].surface, "読む");
    }

    #[test]
    fn test_no_change_without_luw() {
        let mut s = sentence(&[
            (1, vec![tok("猫", "名詞,普通名詞,一般")]),
            (-1, vec![tok("寝る", "動詞,一般")]),
        ]);
        assert!(!remap_long_units(&mut s));
    }
}
