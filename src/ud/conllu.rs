use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, BufRead, Write};

use super::{UdSentence, UdToken};

#[derive(Debug, thiserror::Error)]
pub enum ConlluError {
    #[error("line {line}: expected 10 columns, found {found}")]
    BadColumns { line: usize, found: usize },
    #[error("line {line}: bad {column} value: {text}")]
    BadNumber {
        line: usize,
        column: &'static str,
        text: String,
    },
    #[error("line {line}: expected token id {expected}, found {found}")]
    UnexpectedId {
        line: usize,
        expected: usize,
        found: String,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// `k=v|k=v`, or `_` when empty.
pub(crate) fn join_map(map: &BTreeMap<String, String>) -> String {
    if map.is_empty() {
        return "_".to_string();
    }
    map.iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("|")
}

pub(crate) fn split_map(s: &str) -> BTreeMap<String, String> {
    if s == "_" {
        return BTreeMap::new();
    }
    s.split('|')
        .filter(|kv| !kv.is_empty())
        .map(|kv| match kv.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (kv.to_string(), String::new()),
        })
        .collect()
}

fn parse_token(line_no: usize, line: &str, expected: usize) -> Result<UdToken, ConlluError> {
    let cols: Vec<&str> = line.split('\t').collect();
    if cols.len() != 10 {
        return Err(ConlluError::BadColumns {
            line: line_no,
            found: cols.len(),
        });
    }
    let id: usize = cols[0].parse().map_err(|_| ConlluError::UnexpectedId {
        line: line_no,
        expected,
        found: cols[0].to_string(),
    })?;
    if id != expected {
        return Err(ConlluError::UnexpectedId {
            line: line_no,
            expected,
            found: cols[0].to_string(),
        });
    }
    let head = cols[6].parse().map_err(|_| ConlluError::BadNumber {
        line: line_no,
        column: "HEAD",
        text: cols[6].to_string(),
    })?;
    Ok(UdToken {
        id,
        form: cols[1].to_string(),
        lemma: cols[2].to_string(),
        upos: cols[3].to_string(),
        xpos: cols[4].to_string(),
        feats: split_map(cols[5]),
        head,
        deprel: cols[7].to_string(),
        deps: cols[8].to_string(),
        misc: split_map(cols[9]),
    })
}

/// Reads CoNLL-U sentences. Multiword tokens and empty nodes are rejected.
pub fn parse_conllu<R: BufRead>(reader: R) -> Result<Vec<UdSentence>, ConlluError> {
    let mut sentences = Vec::new();
    let mut cur = UdSentence::default();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        let line_no = i + 1;
        if line.trim().is_empty() {
            if !cur.tokens.is_empty() || !cur.headers.is_empty() {
                sentences.push(std::mem::take(&mut cur));
            }
            continue;
        }
        if let Some(comment) = line.strip_prefix('#') {
            let comment = comment.trim_start();
            let (k, v) = match comment.split_once(" = ") {
                Some((k, v)) => (k.trim(), v),
                None => (comment.trim_end(), ""),
            };
            cur.headers.push((k.to_string(), v.to_string()));
            continue;
        }
        let tok = parse_token(line_no, line, cur.tokens.len() + 1)?;
        cur.tokens.push(tok);
    }
    if !cur.tokens.is_empty() || !cur.headers.is_empty() {
        sentences.push(cur);
    }
    Ok(sentences)
}

impl fmt::Display for UdToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.id,
            self.form,
            self.lemma,
            self.upos,
            self.xpos,
            join_map(&self.feats),
            self.head,
            self.deprel,
            self.deps,
            join_map(&self.misc),
        )
    }
}

impl fmt::Display for UdSentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (k, v) in &self.headers {
            if v.is_empty() {
                writeln!(f, "# {k}")?;
            } else {
                writeln!(f, "# {k} = {v}")?;
            }
        }
        for t in &self.tokens {
            writeln!(f, "{t}")?;
        }
        writeln!(f)
    }
}

pub fn write_conllu<W: Write>(out: &mut W, sentences: &[UdSentence]) -> io::Result<()> {
    for s in sentences {
        write!(out, "{s}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "\
# newdoc id = doc1
# sent_id = doc1-1
# text = 猫が寝た
1\t猫\t猫\tNOUN\t名詞-普通名詞-一般\t_\t3\tnsubj\t_\tBunsetuBILabel=B|SpaceAfter=No
2\tが\tが\tADP\t助詞-格助詞\t_\t1\tcase\t_\tBunsetuBILabel=I|SpaceAfter=No
3\t寝た\t寝る\tVERB\t動詞-一般\tPolarity=Neg\t0\troot\t_\tBunsetuBILabel=B|SpaceAfter=No

";

    #[test]
    fn test_read_write() {
        let sents = parse_conllu(SAMPLE.as_bytes()).unwrap();
        assert_eq!(sents.len(), 1);
        let s = &sents[0];
        assert_eq!(s.header("newdoc id"), Some("doc1"));
        assert_eq!(s.tokens[2].feats["Polarity"], "Neg");
        assert_eq!(s.tokens[0].misc["BunsetuBILabel"], "B");
        let mut out = Vec::new();
        write_conllu(&mut out, &sents).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), SAMPLE);
    }

    #[test]
    fn test_token_field_by_name() {
        let sents = parse_conllu(SAMPLE.as_bytes()).unwrap();
        let t = &sents[0].tokens[0];
        assert_eq!(t.field("HEAD").as_deref(), Some("3"));
        assert_eq!(t.field("FEATS").as_deref(), Some("_"));
        assert!(t.field("GLOSS").is_none());
    }

    #[test]
    fn test_errors() {
        let err = parse_conllu("1\t猫\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ConlluError::BadColumns { line: 1, found: 2 }));
        let err = parse_conllu("1-2\ta\t_\t_\t_\t_\t0\t_\t_\t_\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ConlluError::UnexpectedId { .. }));
        let err = parse_conllu("1\ta\t_\t_\t_\t_\tx\t_\t_\t_\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ConlluError::BadNumber { column: "HEAD", .. }));
    }

    #[test]
    fn test_several_sentences_without_final_blank() {
        let text = "# sent_id = a\n1\tx\tx\tX\t_\t_\t0\troot\t_\t_\n\n# sent_id = b\n1\ty\ty\tX\t_\t_\t0\troot\t_\t_\n";
        let sents = parse_conllu(text.as_bytes()).unwrap();
        assert_eq!(sents.len(), 2);
        assert_eq!(sents[1].sent_id(), "b");
    }
}
