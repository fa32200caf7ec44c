//! `build_luw`: collapses every long unit into a single token.

use tracing::debug;

use crate::converter::remap_long_units;
use crate::model::{Features, LongUnit, LuwLabel, Sentence, SuwField, Word};

/// Rebuilds the sentence with one word per long unit. Long units crossing a
/// bunsetsu boundary are first moved so that each unit sits inside one
/// bunsetsu. Returns the number of short units absorbed.
pub fn build_long_units(sent: &mut Sentence) -> usize {
    remap_long_units(sent);
    let mut absorbed = 0;
    for b in sent.bunsetus_mut() {
        let mut units: Vec<Vec<Word>> = Vec::new();
        for w in b.words.drain(..) {
            match units.last_mut() {
                Some(unit) if w.luw_label == Some(LuwLabel::I) => unit.push(w),
                _ => units.push(vec![w]),
            }
        }
        b.words = units
            .into_iter()
            .map(|unit| {
                absorbed += unit.len() - 1;
                collapse(unit)
            })
            .collect();
    }
    if absorbed > 0 {
        sent.renumber();
    }
    absorbed
}

fn collapse(mut unit: Vec<Word>) -> Word {
    let Some(luw) = unit.first().and_then(|w| w.luw.clone()) else {
        return unit.remove(0);
    };
    let surface: String = unit.iter().map(|w| w.surface.as_str()).collect();
    let space_after = unit.last().is_some_and(Word::space_after);
    let mut head = unit.remove(0);
    if !unit.is_empty() {
        debug!(token = head.token_pos, luw = %surface, parts = unit.len() + 1, "build long unit");
    }

    let lemma: String = if luw.lemma().is_empty() {
        std::iter::once(&head)
            .chain(unit.iter())
            .map(Word::lemma)
            .collect()
    } else {
        luw.lemma().to_string()
    };
    head.features = luw_features(&head.features, &luw, &surface, &lemma, !unit.is_empty());
    head.surface = surface;
    head.luw = Some(luw);
    head.luw_label = Some(LuwLabel::B);
    if space_after {
        head.set_space_after(true);
    }
    head
}

fn luw_features(base: &Features, luw: &LongUnit, surface: &str, lemma: &str, merged: bool) -> Features {
    let mut f = base.clone();
    let pos = [SuwField::Pos1, SuwField::Pos2, SuwField::Pos3, SuwField::Pos4];
    for (field, value) in pos.into_iter().zip(&luw.fields) {
        f.set(field, value.as_str());
    }
    f.set(SuwField::CType, luw.ctype());
    f.set(SuwField::CForm, luw.cform());
    f.set(SuwField::LForm, luw.reading());
    f.set(SuwField::Lemma, lemma);
    f.set(SuwField::Orth, surface);
    f.set(SuwField::Kana, luw.reading());
    if merged {
        f.set(SuwField::Lid, "");
        f.set(SuwField::LemmaId, "");
    }
    f
}
