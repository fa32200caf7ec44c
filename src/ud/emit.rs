//! Word model → CoNLL-U.

use tracing::debug;

use crate::model::{Document, Sentence, Word};
use crate::settings::SpaceMarker;
use crate::unicode::is_ascii_only;

use super::{UdSentence, UdToken};

pub const ZENKAKU_SPACE_FORM: &str = "[JSP]";
pub const HANKAKU_SPACE_FORM: &str = "[SP]";

/// Lemmas rewritten to the spelling UD Japanese treebanks use.
const LEMMA_NORMALIZATION: &[(&str, &str)] = &[
    ("為る", "する"),
    ("居る", "いる"),
    ("成る", "なる"),
    ("有る", "ある"),
    ("無い", "ない"),
    ("出来る", "できる"),
    ("下さる", "くださる"),
    ("頂く", "いただく"),
    ("為さる", "なさる"),
    ("致す", "いたす"),
    ("御座る", "ござる"),
    ("言う", "いう"),
    ("行く", "いく"),
    ("来る", "くる"),
    ("見る", "みる"),
    ("置く", "おく"),
    ("仕舞う", "しまう"),
    ("貰う", "もらう"),
    ("遣る", "やる"),
    ("呉れる", "くれる"),
    ("良い", "よい"),
    ("事", "こと"),
    ("物", "もの"),
    ("所", "ところ"),
    ("為", "ため"),
    ("様", "よう"),
    ("訳", "わけ"),
    ("筈", "はず"),
    ("程", "ほど"),
    ("ず", "ぬ"),
    ("又", "また"),
    ("及び", "および"),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct EmitOptions {
    pub space_marker: SpaceMarker,
}

impl SpaceMarker {
    /// Placeholder FORM/LEMMA of a whitespace token.
    pub fn form(self) -> &'static str {
        match self {
            Self::Zenkaku => ZENKAKU_SPACE_FORM,
            Self::Hankaku => HANKAKU_SPACE_FORM,
        }
    }

    /// What `SpaceAfter=Yes` renders as in `# text`.
    pub fn text(self) -> &'static str {
        match self {
            Self::Zenkaku => "\u{3000}",
            Self::Hankaku => " ",
        }
    }
}

pub fn lemma_of(w: &Word, opts: &EmitOptions) -> String {
    if w.is_space() {
        return opts.space_marker.form().to_string();
    }
    if w.upos() == "PROPN" || is_ascii_only(&w.surface) {
        return w.surface.clone();
    }
    let lemma = w.lemma();
    if lemma.is_empty() || lemma == "*" {
        return "_".to_string();
    }
    LEMMA_NORMALIZATION
        .iter()
        .find(|(from, _)| *from == lemma)
        .map_or_else(|| lemma.to_string(), |(_, to)| to.to_string())
}

fn token_of(w: &Word, first_in_bunsetu: bool, opts: &EmitOptions) -> UdToken {
    let mut misc = w.ud_misc.clone();
    misc.insert(
        "BunsetuBILabel".to_string(),
        if first_in_bunsetu { "B" } else { "I" }.to_string(),
    );
    if let Some(t) = w.position_type {
        misc.insert("BunsetuPositionType".to_string(), t.as_str().to_string());
    }
    if let Some(label) = w.luw_label {
        misc.insert("LUWBILabel".to_string(), label.as_str().to_string());
        misc.insert("LUWPOS".to_string(), w.luw_pos());
    }
    misc.entry("SpaceAfter".to_string())
        .or_insert_with(|| "No".to_string());
    let xpos = w.xpos();
    UdToken {
        id: w.token_pos,
        form: if w.is_space() {
            opts.space_marker.form().to_string()
        } else {
            w.surface.clone()
        },
        lemma: lemma_of(w, opts),
        upos: match w.upos() {
            "" => "X".to_string(),
            u => u.to_string(),
        },
        xpos: if xpos.is_empty() { "_".to_string() } else { xpos },
        feats: w.ud_feat.clone(),
        head: w.dep_num,
        deprel: if w.dep_label.is_empty() {
            "dep".to_string()
        } else {
            w.dep_label.clone()
        },
        deps: "_".to_string(),
        misc,
    }
}

/// One CoNLL-U sentence. `newdoc` is written before `sent_id` when given.
pub fn emit_sentence(
    sent: &Sentence,
    sent_id: &str,
    newdoc: Option<&str>,
    opts: &EmitOptions,
) -> UdSentence {
    let tokens = sent
        .bunsetus()
        .iter()
        .flat_map(|b| {
            b.words
                .iter()
                .enumerate()
                .map(move |(i, w)| token_of(w, i == 0, opts))
        })
        .collect();
    let mut ud = UdSentence {
        headers: Vec::new(),
        tokens,
    };
    if let Some(id) = newdoc {
        ud.set_header("newdoc id", id);
    }
    ud.set_header("sent_id", sent_id);
    ud.refresh_text(opts.space_marker.text());
    if let Some(en) = &sent.text_en {
        ud.set_header("text_en", en.as_str());
    }
    ud
}

/// Every sentence of `doc`; the first one opens the document with
/// `# newdoc id`.
pub fn emit_document(doc: &Document, opts: &EmitOptions) -> Vec<UdSentence> {
    debug!(doc = %doc.doc_id, sentences = doc.sentences.len(), "emit");
    doc.sentences
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let newdoc = s
                .newdoc_id
                .as_deref()
                .or_else(|| (i == 0).then_some(doc.doc_id.as_str()));
            emit_sentence(s, &doc.sent_id(i), newdoc, opts)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LuwLabel, PositionType};
    use crate::testutil::{sentence, tok};

    fn sample() -> Sentence {
        let mut s = sentence(&[
            (1, vec![tok("猫", "名詞,普通名詞,一般"), tok("が", "助詞,格助詞")]),
            (-1, vec![tok("い", "動詞,非自立可能").lemma("居る"), tok("た", "助動詞")]),
        ]);
        for (t, h, d, u) in [(1, 3, "nsubj", "NOUN"), (2, 1, "case", "ADP"), (3, 0, "root", "VERB"), (4, 3, "aux", "AUX")] {
            let w = s.word_mut(t).unwrap();
            w.dep_num = h;
            w.dep_label = d.to_string();
            w.set_upos(u);
        }
        s
    }

    #[test]
    fn test_columns_and_misc() {
        let mut s = sample();
        s.word_mut(3).unwrap().position_type = Some(PositionType::Root);
        let ud = emit_sentence(&s, "d-1", Some("d"), &EmitOptions::default());
        assert_eq!(ud.header("newdoc id"), Some("d"));
        assert_eq!(ud.header("text"), Some("猫がいた"));
        assert_eq!(ud.tokens.len(), 4);
        let t = &ud.tokens[2];
        assert_eq!(t.lemma, "いる");
        assert_eq!(t.xpos, "動詞-非自立可能");
        assert_eq!(t.head, 0);
        assert_eq!(t.misc["BunsetuBILabel"], "B");
        assert_eq!(t.misc["BunsetuPositionType"], "ROOT");
        assert_eq!(t.misc["SpaceAfter"], "No");
        assert_eq!(ud.tokens[1].misc["BunsetuBILabel"], "I");
        assert!(!t.misc.contains_key("LUWPOS"));
    }

    #[test]
    fn test_lemma_rules() {
        let opts = EmitOptions::default();
        let mut w = crate::testutil::word("Apple", "名詞,普通名詞,一般");
        w.features.set(crate::model::SuwField::Lemma, "アップル");
        assert_eq!(lemma_of(&w, &opts), "Apple");
        let mut w = crate::testutil::word("東京", "名詞,固有名詞,地名");
        w.features.set(crate::model::SuwField::Lemma, "トウキョウ");
        w.set_upos("PROPN");
        assert_eq!(lemma_of(&w, &opts), "東京");
        let mut w = crate::testutil::word("ね", "助詞,終助詞");
        w.features.set(crate::model::SuwField::Lemma, "");
        assert_eq!(lemma_of(&w, &opts), "_");
        let w = crate::testutil::word("　", "空白");
        assert_eq!(lemma_of(&w, &opts), "[JSP]");
        let opts = EmitOptions {
            space_marker: SpaceMarker::Hankaku,
        };
        assert_eq!(lemma_of(&w, &opts), "[SP]");
    }

    #[test]
    fn test_space_after_in_text() {
        let mut s = sample();
        s.word_mut(2).unwrap().set_space_after(true);
        let ud = emit_sentence(&s, "d-1", None, &EmitOptions::default());
        assert_eq!(ud.header("text"), Some("猫が\u{3000}いた"));
        let ud = emit_sentence(
            &s,
            "d-1",
            None,
            &EmitOptions {
                space_marker: SpaceMarker::Hankaku,
            },
        );
        assert_eq!(ud.header("text"), Some("猫が いた"));
        assert!(ud.header("newdoc id").is_none());
    }

    #[test]
    fn test_luw_misc() {
        let mut s = sample();
        {
            let w = s.word_mut(1).unwrap();
            w.luw_label = Some(LuwLabel::B);
        }
        let ud = emit_sentence(&s, "d-1", None, &EmitOptions::default());
        assert_eq!(ud.tokens[0].misc["LUWBILabel"], "B");
        assert_eq!(ud.tokens[0].misc["LUWPOS"], "");
    }

    #[test]
    fn test_document_headers() {
        let lines = crate::testutil::cabocha(&[(-1, vec![tok("猫", "名詞,普通名詞,一般")])]);
        let mut all = lines.clone();
        all.extend(lines);
        let doc = crate::testutil::parse_one(&all);
        let uds = emit_document(&doc, &EmitOptions::default());
        assert_eq!(uds.len(), 2);
        assert_eq!(uds[0].header("newdoc id"), Some("test-1"));
        assert_eq!(uds[0].sent_id(), "test-1-1");
        assert!(uds[1].header("newdoc id").is_none());
        assert_eq!(uds[1].sent_id(), "test-1-2");
    }
}
