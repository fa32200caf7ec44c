//! Line-oriented reader for extended CaboCha.

use std::io::{self, BufRead};
use std::iter::{Enumerate, Peekable};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::model::{
    AnnotationKind, AnnotationList, Bunsetu, Document, Features, Group, Link, LongUnit, LuwLabel,
    Segment, Sentence, Word,
};

use super::csv::parse_csv_row;
use super::directive::{is_directive, parse_directive, Directive};
use super::meta::read_meta_line;
use super::ParseError;

static BUNSETU_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\* (\d+) (-?\d+)([A-Z][A-Z]?) (\d+)/(\d+)(?: (.*))?$").unwrap()
});

/// Fewest SUW fields accepted (pos1 .. orth).
const MIN_SUW_FIELDS: usize = 9;

/// Streams documents out of a line source, one document at a time.
pub struct DocumentReader<I: Iterator<Item = io::Result<String>>> {
    lines: Peekable<Enumerate<I>>,
    source_name: String,
    doc_index: usize,
}

impl<R: BufRead> DocumentReader<io::Lines<R>> {
    pub fn from_reader(reader: R, source_name: &str) -> Self {
        Self::new(reader.lines(), source_name)
    }
}

impl<I: Iterator<Item = io::Result<String>>> DocumentReader<I> {
    pub fn new(lines: I, source_name: &str) -> Self {
        Self {
            lines: lines.enumerate().peekable(),
            source_name: source_name.to_string(),
            doc_index: 0,
        }
    }

    fn next_document(&mut self) -> Result<Option<Document>, ParseError> {
        let mut chunk: Vec<(usize, String)> = Vec::new();
        while let Some((n, line)) = self.lines.next() {
            let line = line?;
            let line = line.trim_end_matches('\r').to_string();
            if chunk.is_empty() && line.trim().is_empty() {
                continue;
            }
            chunk.push((n + 1, line));
            let boundary = match self.lines.peek() {
                Some((_, Ok(next))) => is_doc_header(next),
                _ => false,
            };
            if boundary {
                break;
            }
        }
        if chunk.is_empty() {
            return Ok(None);
        }
        self.doc_index += 1;
        parse_document(chunk, &self.source_name, self.doc_index).map(Some)
    }
}

impl<I: Iterator<Item = io::Result<String>>> Iterator for DocumentReader<I> {
    type Item = Result<Document, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_document().transpose()
    }
}

/// Parses a whole input held in memory.
pub fn parse_documents<S: AsRef<str>>(lines: &[S], source_name: &str) -> Result<Vec<Document>, ParseError> {
    let iter = lines.iter().map(|l| Ok(l.as_ref().to_string()));
    DocumentReader::new(iter, source_name).collect()
}

fn is_doc_header(line: &str) -> bool {
    line.strip_prefix("#!")
        .and_then(|body| body.split_whitespace().next())
        == Some("DOC")
}

/// Where the next `ATTR` line goes.
#[derive(Clone, Copy)]
enum AttrTarget {
    Document(AnnotationKind),
    Pending(AnnotationKind),
    Current(AnnotationKind),
    LastSentence(AnnotationKind),
}

struct DocumentBuilder {
    doc: Document,
    /// Sentence annotations seen before the first bunsetsu.
    pending: AnnotationList,
    current: Option<(Vec<Bunsetu>, AnnotationList)>,
    last_attr_target: Option<AttrTarget>,
}

impl DocumentBuilder {
    fn annotations_mut(&mut self, target: AttrTarget) -> Option<&mut AnnotationList> {
        match target {
            AttrTarget::Document(_) => Some(&mut self.doc.annotations),
            AttrTarget::Pending(_) => Some(&mut self.pending),
            AttrTarget::Current(_) => self.current.as_mut().map(|(_, a)| a),
            AttrTarget::LastSentence(_) => self.doc.sentences.last_mut().map(|s| &mut s.annotations),
        }
    }

    fn push_annotation(&mut self, directive: Directive) {
        let (kind, sentence_scope) = match &directive {
            Directive::Segment { scope, .. } => (AnnotationKind::Segment, *scope),
            Directive::Link { scope, .. } => (AnnotationKind::Link, *scope),
            Directive::Group { scope, .. } => (AnnotationKind::Group, *scope),
            _ => return,
        };
        let is_sentence = sentence_scope == crate::model::Scope::Sentence;
        let target = if !is_sentence {
            AttrTarget::Document(kind)
        } else if self.current.is_some() {
            AttrTarget::Current(kind)
        } else if !self.doc.sentences.is_empty() {
            AttrTarget::LastSentence(kind)
        } else {
            AttrTarget::Pending(kind)
        };
        let Some(list) = self.annotations_mut(target) else {
            return;
        };
        match directive {
            Directive::Segment {
                scope,
                name,
                start,
                end,
                comment,
            } => list.push_segment(Segment {
                scope,
                name,
                start,
                end,
                comment,
                attrs: Default::default(),
            }),
            Directive::Link {
                scope,
                name,
                from,
                to,
                comment,
            } => list.push_link(Link {
                scope,
                name,
                from,
                to,
                comment,
                attrs: Default::default(),
            }),
            Directive::Group {
                scope,
                name,
                members,
                comment,
            } => list.push_group(Group {
                scope,
                name,
                members,
                comment,
                attrs: Default::default(),
            }),
            _ => unreachable!("filtered above"),
        }
        self.last_attr_target = Some(target);
    }

    fn push_attr(&mut self, key: String, value: String) -> bool {
        let Some(target) = self.last_attr_target else {
            return false;
        };
        let kind = match target {
            AttrTarget::Document(k)
            | AttrTarget::Pending(k)
            | AttrTarget::Current(k)
            | AttrTarget::LastSentence(k) => k,
        };
        match self
            .annotations_mut(target)
            .and_then(|list| list.last_attrs_mut(kind))
        {
            Some(attrs) => {
                attrs.insert(key, value);
                true
            }
            None => false,
        }
    }

    fn finish_sentence(&mut self) {
        let Some((bunsetus, annotations)) = self.current.take() else {
            return;
        };
        let mut sentence = Sentence::new(bunsetus);
        sentence.annotations = annotations;
        if self.doc.sentences.is_empty() && !self.pending.is_empty() {
            // leading sentence annotations are re-homed onto the first sentence
            let pending = std::mem::take(&mut self.pending);
            for (kind, idx) in pending.in_order() {
                copy_annotation(&pending, kind, idx, &mut sentence.annotations);
            }
        }
        self.doc.sentences.push(sentence);
    }
}

fn copy_annotation(from: &AnnotationList, kind: AnnotationKind, idx: usize, to: &mut AnnotationList) {
    match kind {
        AnnotationKind::Segment => to.push_segment(from.segments()[idx].clone()),
        AnnotationKind::Link => to.push_link(from.links()[idx].clone()),
        AnnotationKind::Group => to.push_group(from.groups()[idx].clone()),
    }
}

fn parse_document(
    mut lines: Vec<(usize, String)>,
    source_name: &str,
    doc_index: usize,
) -> Result<Document, ParseError> {
    while lines.last().is_some_and(|(_, l)| l.trim().is_empty()) {
        lines.pop();
    }

    let mut b = DocumentBuilder {
        doc: Document::default(),
        pending: AnnotationList::new(),
        current: None,
        last_attr_target: None,
    };
    let mut trailing_directives = Vec::new();

    for (idx, (line_no, line)) in lines.iter().enumerate() {
        let line_no = *line_no;
        if line == "EOS" {
            if b.current.is_none() {
                debug!(line = line_no, "EOS without bunsetsu, skipped");
            }
            b.finish_sentence();
            b.last_attr_target = None;
            continue;
        }
        if is_directive(line) {
            let directive = parse_directive(line).map_err(|reason| ParseError::BadDirective {
                line: line_no,
                reason,
                text: line.clone(),
            })?;
            match directive {
                Directive::Doc(n) => {
                    if idx != 0 {
                        return Err(ParseError::BadDirective {
                            line: line_no,
                            reason: "DOC header inside a document",
                            text: line.clone(),
                        });
                    }
                    b.doc.doc_number = Some(n);
                }
                Directive::Attr { key, value } => {
                    if !b.push_attr(key, value) {
                        return Err(ParseError::StrayAttr {
                            line: line_no,
                            text: line.clone(),
                        });
                    }
                }
                Directive::Other => {
                    if b.doc.sentences.is_empty() && b.current.is_none() {
                        read_meta_line(line, &mut b.doc.meta);
                        b.doc.attributes.push(line.clone());
                    } else {
                        trailing_directives.push(line.clone());
                    }
                    b.last_attr_target = None;
                }
                annotation => b.push_annotation(annotation),
            }
            continue;
        }
        if line.starts_with('*') {
            let bunsetu = parse_bunsetu_header(line).ok_or_else(|| ParseError::BadBunsetuHeader {
                line: line_no,
                text: line.clone(),
            })?;
            let (bunsetus, _) = b.current.get_or_insert_with(|| (Vec::new(), AnnotationList::new()));
            bunsetus.push(bunsetu);
            b.last_attr_target = None;
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }
        let Some((bunsetus, _)) = b.current.as_mut() else {
            return Err(ParseError::TokenOutsideBunsetu {
                line: line_no,
                text: line.clone(),
            });
        };
        let prev = bunsetus
            .iter()
            .rev()
            .find_map(|bu| bu.words.last())
            .cloned();
        let word = parse_token(line, prev.as_ref()).map_err(|e| e.at(line_no, line))?;
        match bunsetus.last_mut() {
            Some(bu) => bu.words.push(word),
            None => {
                return Err(ParseError::TokenOutsideBunsetu {
                    line: line_no,
                    text: line.clone(),
                })
            }
        }
    }

    if b.current.is_some() {
        let (line, text) = lines.last().cloned().unwrap_or_default();
        return Err(ParseError::MissingEos { line, text });
    }
    if !b.pending.is_empty() && b.doc.sentences.is_empty() {
        debug!("sentence annotations without any sentence, dropped");
    }

    let mut doc = b.doc;
    doc.trailing_directives = trailing_directives;
    doc.doc_id = match (&doc.meta.bib_id, &doc.doc_number) {
        (Some(id), _) => id.clone(),
        (None, Some(n)) => format!("{source_name}-{n}"),
        (None, None) => format!("{source_name}-{doc_index}"),
    };
    if let Some(first) = doc.sentences.first_mut() {
        first.sent_id = doc.meta.sent_id.clone();
        first.newdoc_id = doc.meta.newdoc_id.clone();
        first.text_en = doc.meta.text_en.clone();
    }
    Ok(doc)
}

fn parse_bunsetu_header(line: &str) -> Option<Bunsetu> {
    let cap = BUNSETU_HEADER.captures(line)?;
    let mut b = Bunsetu::new(cap[1].parse().ok()?, cap[2].parse().ok()?, cap[3].to_string());
    b.subj_pos = cap[4].parse().ok()?;
    b.func_pos = cap[5].parse().ok()?;
    b.score = cap.get(6).map(|m| m.as_str().to_string()).unwrap_or_default();
    Some(b)
}

/// Token-level failure, positioned by the caller.
enum TokenError {
    Truncated(usize),
    OrphanContinuation,
}

impl TokenError {
    fn at(self, line: usize, text: &str) -> ParseError {
        match self {
            Self::Truncated(found) => ParseError::TruncatedFeatures {
                line,
                found,
                text: text.to_string(),
            },
            Self::OrphanContinuation => ParseError::OrphanContinuation {
                line,
                text: text.to_string(),
            },
        }
    }
}

fn parse_token(line: &str, prev: Option<&Word>) -> Result<Word, TokenError> {
    let cols: Vec<&str> = line.split('\t').collect();
    let Some(csv) = cols.get(1) else {
        return Err(TokenError::Truncated(0));
    };
    let fields = parse_csv_row(csv);
    if fields.len() < MIN_SUW_FIELDS {
        return Err(TokenError::Truncated(fields.len()));
    }
    let mut word = Word::new(cols[0].to_string(), Features::new(fields));
    if cols.len() >= 3 {
        if cols[2].is_empty() {
            let luw = prev
                .and_then(|p| p.luw.clone())
                .ok_or(TokenError::OrphanContinuation)?;
            word.luw = Some(luw);
            word.luw_label = Some(LuwLabel::I);
        } else {
            let luw_fields = cols.get(3).map(|c| parse_csv_row(c)).unwrap_or_default();
            word.luw = Some(LongUnit::new(cols[2].to_string(), luw_fields));
            word.luw_label = Some(LuwLabel::B);
        }
    }
    Ok(word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{cabocha, tok};

    fn parse(lines: &[String]) -> Vec<Document> {
        parse_documents(lines, "test").unwrap()
    }

    #[test]
    fn test_simple_sentence() {
        let lines = cabocha(&[
            (1, vec![tok("猫", "名詞,普通名詞,一般"), tok("が", "助詞,格助詞")]),
            (-1, vec![tok("寝る", "動詞,一般")]),
        ]);
        let docs = parse(&lines);
        assert_eq!(docs.len(), 1);
        let s = &docs[0].sentences[0];
        assert_eq!(s.bunsetus().len(), 2);
        assert_eq!(s.bunsetus()[0].dep_pos, 1);
        assert_eq!(s.bunsetus()[1].dep_pos, -1);
        assert_eq!(s.word(2).unwrap().surface, "が");
        assert_eq!(s.word(3).unwrap().bunsetu_pos, 1);
        assert_eq!(docs[0].doc_id, "test-1");
    }

    #[test]
    fn test_documents_split_on_doc_header() {
        let mut lines = vec!["#! DOC 1".to_string(), "#! DOCID\t1\tA001".to_string()];
        lines.extend(cabocha(&[(-1, vec![tok("雨", "名詞,普通名詞,一般")])]));
        lines.push("#! DOC 2".to_string());
        lines.extend(cabocha(&[(-1, vec![tok("雪", "名詞,普通名詞,一般")])]));
        lines.push(String::new());
        let docs = parse(&lines);
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].doc_id, "A001");
        assert_eq!(docs[1].doc_id, "test-2");
        assert_eq!(docs[0].attributes, vec!["#! DOCID\t1\tA001".to_string()]);
        assert_eq!(docs[1].sentences[0].text(), "雪");
    }

    #[test]
    fn test_reader_is_lazy() {
        let mut lines = vec!["#! DOC 1".to_string()];
        lines.extend(cabocha(&[(-1, vec![tok("雨", "名詞,普通名詞,一般")])]));
        lines.push("#! DOC 2".to_string());
        lines.push("* 0 -1D 0/0 0.0".to_string());
        // second document never terminates: only surfaces when pulled
        let mut reader = DocumentReader::new(lines.into_iter().map(Ok), "lazy");
        assert!(reader.next().unwrap().is_ok());
        assert!(matches!(reader.next(), Some(Err(ParseError::MissingEos { .. }))));
    }

    #[test]
    fn test_luw_continuation_inherits() {
        let lines = cabocha(&[(
            -1,
            vec![
                tok("に", "助詞,格助詞").luw("について", "助詞,格助詞"),
                tok("つい", "動詞,非自立可能").cont(),
                tok("て", "助詞,接続助詞").cont(),
            ],
        )]);
        let docs = parse(&lines);
        let s = &docs[0].sentences[0];
        let w2 = s.word(2).unwrap();
        assert_eq!(w2.luw_label, Some(LuwLabel::I));
        assert_eq!(w2.luw_pos(), "助詞-格助詞");
        assert_eq!(w2.luw.as_ref().unwrap().form, "について");
        assert_eq!(s.word(1).unwrap().luw_label, Some(LuwLabel::B));
    }

    #[test]
    fn test_sentence_annotations_trail_eos() {
        let mut lines = cabocha(&[(-1, vec![tok("雨", "名詞,普通名詞,一般")])]);
        lines.push(r#"#! SEGMENT_S Disfluency 0 1 "d""#.to_string());
        lines.push(r#"#! ATTR kind "filler""#.to_string());
        lines.push(r#"#! SEGMENT Topic 0 1 """#.to_string());
        let docs = parse(&lines);
        let s = &docs[0].sentences[0];
        assert_eq!(s.annotations.segments().len(), 1);
        assert_eq!(s.annotations.segments()[0].attrs["kind"], "filler");
        assert_eq!(docs[0].annotations.segments().len(), 1);
    }

    #[test]
    fn test_leading_sentence_annotations_go_to_first_sentence() {
        let mut lines = vec![
            "#! DOC 1".to_string(),
            r#"#! SEGMENT_S Arg 0 1 """#.to_string(),
        ];
        lines.extend(cabocha(&[(-1, vec![tok("雨", "名詞,普通名詞,一般")])]));
        let docs = parse(&lines);
        assert_eq!(docs[0].sentences[0].annotations.segments().len(), 1);
        assert!(docs[0].attributes.is_empty());
    }

    #[test]
    fn test_xml_metadata() {
        let mut lines = vec![
            "#! DOC 1".to_string(),
            r#"#! ATTRIBUTES <s sent_id="train-s7" english_text="Rain."/>"#.to_string(),
        ];
        lines.extend(cabocha(&[(-1, vec![tok("雨", "名詞,普通名詞,一般")])]));
        let docs = parse(&lines);
        assert_eq!(docs[0].sentences[0].sent_id.as_deref(), Some("train-s7"));
        assert_eq!(docs[0].sentences[0].text_en.as_deref(), Some("Rain."));
        assert_eq!(docs[0].sent_id(0), "train-s7");
    }

    #[test]
    fn test_missing_eos() {
        let mut lines = cabocha(&[(-1, vec![tok("雨", "名詞,普通名詞,一般")])]);
        lines.pop();
        let err = parse_documents(&lines, "t").unwrap_err();
        assert!(matches!(err, ParseError::MissingEos { .. }));
    }

    #[test]
    fn test_stray_attr() {
        let lines = vec![r#"#! ATTR key "v""#.to_string()];
        let err = parse_documents(&lines, "t").unwrap_err();
        assert!(matches!(err, ParseError::StrayAttr { line: 1, .. }));
    }

    #[test]
    fn test_bad_bunsetu_header() {
        let lines = vec!["* 0 D 0/0 0.0".to_string(), "EOS".to_string()];
        let err = parse_documents(&lines, "t").unwrap_err();
        assert!(matches!(err, ParseError::BadBunsetuHeader { line: 1, .. }));
        assert!(err.to_string().contains("* 0 D 0/0"));
    }

    #[test]
    fn test_truncated_features() {
        let lines = vec![
            "* 0 -1D 0/0 0.0".to_string(),
            "雨\t名詞,普通名詞".to_string(),
            "EOS".to_string(),
        ];
        let err = parse_documents(&lines, "t").unwrap_err();
        assert!(matches!(err, ParseError::TruncatedFeatures { line: 2, found: 2, .. }));
    }

    #[test]
    fn test_trailing_blank_lines_trimmed() {
        let mut lines = cabocha(&[(-1, vec![tok("雨", "名詞,普通名詞,一般")])]);
        lines.push(String::new());
        lines.push("  ".to_string());
        assert_eq!(parse(&lines).len(), 1);
    }
}
