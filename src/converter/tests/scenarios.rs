use pretty_assertions::assert_eq;

use super::converter;
use crate::settings::{ConvertOptions, Stage};
use crate::testutil::{cabocha, parse_one, tok, Tok};
use crate::ud::tests::ud_sentence;
use crate::rules::RuleSet;
use crate::ud::{parse_conllu, write_conllu, UdSentence};

fn convert(options: ConvertOptions, bunsetus: &[(i32, Vec<Tok>)]) -> Vec<UdSentence> {
    let mut c = converter(options);
    c.convert_document(parse_one(&cabocha(bunsetus))).unwrap()
}

fn arcs(s: &UdSentence) -> Vec<(usize, &str)> {
    s.tokens.iter().map(|t| (t.head, t.deprel.as_str())).collect()
}

fn forms(s: &UdSentence) -> Vec<&str> {
    s.tokens.iter().map(|t| t.form.as_str()).collect()
}

fn upos(s: &UdSentence) -> Vec<&str> {
    s.tokens.iter().map(|t| t.upos.as_str()).collect()
}

#[test]
fn test_transitive_clause() {
    let out = convert(
        ConvertOptions::default(),
        &[
            (2, vec![tok("猫", "名詞,普通名詞,一般"), tok("が", "助詞,格助詞")]),
            (2, vec![tok("魚", "名詞,普通名詞,一般"), tok("を", "助詞,格助詞")]),
            (-1, vec![tok("食べた", "動詞,一般")]),
        ],
    );
    assert_eq!(out.len(), 1);
    let s = &out[0];
    assert_eq!(
        arcs(s),
        vec![(5, "nsubj"), (1, "case"), (5, "obj"), (3, "case"), (0, "root")]
    );
    assert_eq!(upos(s), vec!["NOUN", "ADP", "NOUN", "ADP", "VERB"]);
    assert_eq!(s.header("newdoc id"), Some("test-1"));
    assert_eq!(s.sent_id(), "test-1-1");
    assert_eq!(s.header("text"), Some("猫が魚を食べた"));
    assert_eq!(s.tokens[0].misc["BunsetuBILabel"], "B");
    assert_eq!(s.tokens[1].misc["BunsetuBILabel"], "I");
    assert!(s.tokens.iter().all(|t| !t.space_after()));
}

#[test]
fn test_copula_clause() {
    let out = convert(
        ConvertOptions::default(),
        &[
            (1, vec![tok("これ", "代名詞"), tok("は", "助詞,係助詞")]),
            (-1, vec![tok("本", "名詞,普通名詞,一般"), tok("だ", "助動詞")]),
        ],
    );
    let s = &out[0];
    assert_eq!(arcs(s), vec![(3, "nsubj"), (1, "case"), (0, "root"), (3, "cop")]);
    assert_eq!(upos(s), vec!["PRON", "ADP", "NOUN", "AUX"]);
}

#[test]
fn test_stacked_topics_become_dislocated() {
    let out = convert(
        ConvertOptions::default(),
        &[
            (3, vec![tok("象", "名詞,普通名詞,一般"), tok("は", "助詞,係助詞")]),
            (3, vec![tok("今日", "名詞,普通名詞,副詞可能"), tok("も", "助詞,係助詞")]),
            (3, vec![tok("雨", "名詞,普通名詞,一般"), tok("が", "助詞,格助詞")]),
            (-1, vec![tok("降る", "動詞,一般")]),
        ],
    );
    let s = &out[0];
    assert_eq!(s.tokens[0].deprel, "dislocated");
    assert_eq!(s.tokens[2].deprel, "dislocated");
    assert_eq!(s.tokens[4].deprel, "nsubj");
    assert!([1, 3, 5].iter().all(|&i| s.tokens[i].deprel == "case"));
    assert_eq!(s.roots(), vec![7]);
}

#[test]
fn test_split_digits_merged() {
    let mut options = ConvertOptions::default();
    options.set_stages("merge_number").unwrap();
    let out = convert(
        options,
        &[
            (
                1,
                vec![
                    tok("1", "名詞,数詞"),
                    tok("0", "名詞,数詞"),
                    tok("人", "接尾辞,名詞的,助数詞"),
                    tok("が", "助詞,格助詞"),
                ],
            ),
            (-1, vec![tok("来た", "動詞,一般")]),
        ],
    );
    let s = &out[0];
    assert_eq!(forms(s), vec!["10", "人", "が", "来た"]);
    assert_eq!(s.tokens[0].upos, "NUM");
    assert_eq!(s.tokens[0].lemma, "10");
    assert_eq!(s.header("text"), Some("10人が来た"));
    assert!(s.validate().is_ok());
}

#[test]
fn test_upos_stable_over_emitted_conllu() {
    let out = convert(
        ConvertOptions::default(),
        &[
            (1, vec![tok("この", "連体詞")]),
            (3, vec![tok("猫", "名詞,普通名詞,一般"), tok("が", "助詞,格助詞")]),
            (3, vec![tok("魚", "名詞,普通名詞,一般"), tok("を", "助詞,格助詞")]),
            (
                -1,
                vec![
                    tok("食べ", "動詞,一般"),
                    tok("て", "助詞,接続助詞"),
                    tok("いる", "動詞,非自立可能"),
                    tok("。", "補助記号,句点"),
                ],
            ),
        ],
    );
    let mut buf = Vec::new();
    write_conllu(&mut buf, &out).unwrap();
    let reread = parse_conllu(buf.as_slice()).unwrap();
    assert_eq!(reread.len(), 1);

    let rules = RuleSet::embedded().unwrap();
    let s = &reread[0];
    assert_eq!(upos(s)[..2], ["DET", "NOUN"]);
    assert_eq!(rules.upos.classify_sentence(s), upos(s));
}

fn spaced() -> Vec<(i32, Vec<Tok>)> {
    vec![
        (1, vec![tok("東京", "名詞,固有名詞,地名,一般"), tok("\u{3000}", "空白")]),
        (2, vec![tok("大阪", "名詞,固有名詞,地名,一般"), tok("へ", "助詞,格助詞")]),
        (-1, vec![tok("行く", "動詞,一般")]),
    ]
}

#[test]
fn test_skip_space_moves_whitespace_to_misc() {
    let options = ConvertOptions {
        skip_space: true,
        ..ConvertOptions::default()
    };
    let s = &convert(options, &spaced())[0];
    assert_eq!(forms(s), vec!["東京", "大阪", "へ", "行く"]);
    assert!(s.tokens[0].space_after());
    assert!(!s.tokens[1].space_after());
    assert_eq!(s.header("text"), Some("東京\u{3000}大阪へ行く"));
    assert!(s.validate().is_ok());
}

#[test]
fn test_spaces_kept_as_placeholder_tokens() {
    let s = &convert(ConvertOptions::default(), &spaced())[0];
    assert_eq!(forms(s), vec!["東京", "[JSP]", "大阪", "へ", "行く"]);
    assert_eq!(s.tokens[1].lemma, "[JSP]");
    assert_eq!(s.header("text"), Some("東京\u{3000}大阪へ行く"));
}

#[test]
fn test_parenthesis_post_stage() {
    let mut options = ConvertOptions::default();
    options.set_stages("convert_paren").unwrap();
    let mut c = converter(options);
    let sent = ud_sentence(
        "p-1",
        &[
            ("田中さん", 3, "compound"),
            ("（", 3, "punct"),
            ("博士", 6, "nsubj"),
            ("）", 3, "punct"),
            ("が", 3, "case"),
            ("来た", 0, "root"),
        ],
    );
    let out = c.post_process(vec![sent]).unwrap();
    assert_eq!(
        arcs(&out[0]),
        vec![(6, "nsubj"), (3, "punct"), (1, "appos"), (3, "punct"), (1, "case"), (0, "root")]
    );
    assert_eq!(c.stats().sentences, 1);
}

#[test]
fn test_multi_root_removed_or_tolerated() {
    let two_roots = || ud_sentence("m-1", &[("猫", 0, "root"), ("犬", 0, "root")]);

    let mut c = converter(ConvertOptions::default());
    assert_eq!(c.post_process(vec![two_roots()]).unwrap().len(), 1);

    let mut options = ConvertOptions::default();
    options.set_stages("replace_multi_root").unwrap();
    options.multi_root_mode = crate::settings::MultiRootMode::Remove;
    let mut c = converter(options);
    assert!(c.post_process(vec![two_roots()]).unwrap().is_empty());
    assert_eq!(c.stats().dropped, 1);
}

#[test]
fn test_stage_file_required() {
    let mut options = ConvertOptions::default();
    options.set_stages("patch_fix").unwrap();
    assert!(super::Converter::from_options(options).is_err());
}

#[test]
fn test_lenient_mode_drops_broken_sentence() {
    let options = ConvertOptions {
        strict: false,
        ..ConvertOptions::default()
    };
    let mut c = converter(options);
    let mut doc = parse_one(&cabocha(&[
        (1, vec![tok("猫", "名詞,普通名詞,一般")]),
        (-1, vec![tok("寝る", "動詞,一般")]),
    ]));
    doc.sentences[0].bunsetus_mut()[1].words.clear();
    doc.sentences[0].invalidate();
    let out = c.convert_document(doc).unwrap();
    assert!(out.is_empty());
    assert_eq!(c.stats().dropped, 1);
}

#[test]
fn test_strict_mode_reports_bunsetu() {
    let mut c = converter(ConvertOptions::default());
    let mut doc = parse_one(&cabocha(&[
        (1, vec![tok("猫", "名詞,普通名詞,一般")]),
        (-1, vec![tok("寝る", "動詞,一般")]),
    ]));
    doc.sentences[0].bunsetus_mut()[1].words.clear();
    doc.sentences[0].invalidate();
    let err = c.convert_document(doc).unwrap_err();
    assert!(err.to_string().contains("bunsetsu 1"), "{err}");
}

#[test]
fn test_stream_marks_document_boundary() {
    let mut options = ConvertOptions::default();
    options.set_stages("fixed_newdoc").unwrap();
    let mut c = converter(options);

    let mut lines = vec!["#! DOC 1".to_string()];
    lines.extend(cabocha(&[(-1, vec![tok("雨", "名詞,普通名詞,一般")])]));
    lines.push("#! DOC 2".to_string());
    lines.extend(cabocha(&[(-1, vec![tok("雪", "名詞,普通名詞,一般")])]));
    let input = lines.join("\n");

    let mut out = Vec::new();
    let stats = c.convert_stream(input.as_bytes(), "src", &mut out).unwrap();
    assert_eq!(stats.documents, 2);
    assert_eq!(stats.sentences, 2);

    let text = String::from_utf8(out).unwrap();
    let sents = crate::ud::parse_conllu(text.as_bytes()).unwrap();
    assert_eq!(sents.len(), 2);
    assert_eq!(sents[0].header("newdoc id"), Some("src-1"));
    assert_eq!(sents[0].header("text"), Some("雨\u{3000}"));
    assert!(sents[0].tokens[0].space_after());
    assert_eq!(sents[1].header("newdoc id"), Some("src-2"));
    assert!(!sents[1].tokens[0].space_after());
}
