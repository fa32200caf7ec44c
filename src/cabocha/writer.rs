//! Serializes the annotation model back to extended CaboCha.

use std::fmt::Write;

use crate::model::{AnnotationKind, AnnotationList, Document, LuwLabel, Sentence, Word};

use super::csv::join_csv_row;

/// Renders a document. Output parses back into an equivalent document.
pub fn write_document(doc: &Document) -> String {
    let mut out = String::new();
    if let Some(n) = &doc.doc_number {
        let _ = writeln!(out, "#! DOC\t{n}");
    }
    for line in &doc.attributes {
        out.push_str(line);
        out.push('\n');
    }
    for sent in &doc.sentences {
        out.push_str(&write_sentence(sent));
    }
    for line in &doc.trailing_directives {
        out.push_str(line);
        out.push('\n');
    }
    write_annotations(&doc.annotations, &mut out);
    out
}

/// Renders one sentence including its `EOS` and trailing annotations.
pub fn write_sentence(sent: &Sentence) -> String {
    let mut out = String::new();
    for b in sent.bunsetus() {
        let _ = write!(
            out,
            "* {} {}{} {}/{}",
            b.bunsetu_pos, b.dep_pos, b.dep_type, b.subj_pos, b.func_pos
        );
        if !b.score.is_empty() {
            out.push(' ');
            out.push_str(&b.score);
        }
        out.push('\n');
        for w in &b.words {
            write_token(w, &mut out);
        }
    }
    out.push_str("EOS\n");
    write_annotations(&sent.annotations, &mut out);
    out
}

fn write_token(w: &Word, out: &mut String) {
    out.push_str(&w.surface);
    out.push('\t');
    out.push_str(&join_csv_row(trim_padding(w.features.fields())));
    match (&w.luw, w.luw_label) {
        (Some(_), Some(LuwLabel::I)) => out.push_str("\t\t"),
        (Some(luw), _) => {
            let _ = write!(out, "\t{}\t{}", luw.form, join_csv_row(&luw.fields));
        }
        (None, _) => {}
    }
    out.push('\n');
}

/// Drops trailing empty fields added by padding.
fn trim_padding(fields: &[String]) -> &[String] {
    let keep = fields
        .iter()
        .rposition(|f| !f.is_empty())
        .map_or(0, |i| i + 1);
    &fields[..keep]
}

fn write_annotations(list: &AnnotationList, out: &mut String) {
    for (kind, idx) in list.in_order() {
        let attrs = match kind {
            AnnotationKind::Segment => {
                let s = &list.segments()[idx];
                let _ = writeln!(
                    out,
                    "#! SEGMENT{} {} {} {} \"{}\"",
                    s.scope.suffix(),
                    s.name,
                    s.start,
                    s.end,
                    s.comment
                );
                &s.attrs
            }
            AnnotationKind::Link => {
                let l = &list.links()[idx];
                let _ = writeln!(
                    out,
                    "#! LINK{} {} {} {} \"{}\"",
                    l.scope.suffix(),
                    l.name,
                    l.from,
                    l.to,
                    l.comment
                );
                &l.attrs
            }
            AnnotationKind::Group => {
                let g = &list.groups()[idx];
                let members: Vec<String> = g.members.iter().map(usize::to_string).collect();
                let _ = writeln!(
                    out,
                    "#! GROUP{} {} {} \"{}\"",
                    g.scope.suffix(),
                    g.name,
                    members.join(" "),
                    g.comment
                );
                &g.attrs
            }
        };
        for (k, v) in attrs {
            let _ = writeln!(out, "#! ATTR {k} \"{v}\"");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cabocha::parse_documents;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "#! DOC\t1
#! DOCID\t1\tOC01_00001
* 0 1D 0/1 1.234
猫\t名詞,普通名詞,一般,*,*,*,ネコ,猫,猫\t猫\t名詞,普通名詞,一般,*,*,*,ネコ,猫
が\t助詞,格助詞,*,*,*,*,ガ,が,が\tが\t助詞,格助詞,*,*,*,*,ガ,が
* 1 -1D 0/0 0.000
寝る\t動詞,一般,*,*,下一段-ナ行,終止形-一般,ネル,寝る,寝る\t寝る\t動詞,一般,*,*,下一段-ナ行,終止形-一般,ネル,寝る
EOS
#! SEGMENT_S Arg 0 1 \"cat\"
#! ATTR role \"agent\"
#! SEGMENT_S Pred 2 4 \"\"
#! LINK_S pas:ga 1 0 \"\"
#! SEGMENT Topic 0 4 \"whole\"
";

    #[test]
    fn test_round_trip() {
        let lines: Vec<&str> = SAMPLE.lines().collect();
        let docs = parse_documents(&lines, "t").unwrap();
        assert_eq!(write_document(&docs[0]), SAMPLE);
    }

    #[test]
    fn test_continuation_written_as_empty_column() {
        let lines = [
            "* 0 -1D 0/0 0.0",
            "に\t助詞,格助詞,*,*,*,*,ニ,に,に\tについて\t助詞,格助詞,*,*,*,*,ニツイテ,について",
            "つい\t動詞,非自立可能,*,*,五段-カ行,連用形-イ音便,ツク,付く,つい\t\t",
            "EOS",
        ];
        let docs = parse_documents(&lines, "t").unwrap();
        let text = write_sentence(&docs[0].sentences[0]);
        assert!(text.contains("つい\t動詞,非自立可能,*,*,五段-カ行,連用形-イ音便,ツク,付く,つい\t\t\n"));
    }
}
