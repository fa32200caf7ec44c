//! Builders for test sentences and CaboCha input.

use crate::cabocha::{join_csv_row, parse_documents};
use crate::model::{Bunsetu, Document, Features, Sentence, SuwField, Word};

/// SUW feature fields for `pos` ("名詞,普通名詞,一般"), with lemma and orth
/// set to `surface`.
fn suw_fields(surface: &str, pos: &str) -> Vec<String> {
    let mut fields: Vec<String> = pos.split(',').map(str::to_string).collect();
    fields.resize(4, "*".to_string());
    fields.extend(["*", "*", ""].map(str::to_string));
    fields.push(surface.to_string());
    fields.push(surface.to_string());
    fields
}

pub fn word(surface: &str, pos: &str) -> Word {
    Word::new(surface.to_string(), Features::new(suw_fields(surface, pos)))
}

pub fn bunsetu(idx: usize, dep: i32, words: Vec<Word>) -> Bunsetu {
    let mut b = Bunsetu::new(idx, dep, "D".to_string());
    b.words = words;
    b
}

/// One token line under construction.
#[derive(Clone, Debug)]
pub struct Tok {
    surface: String,
    fields: Vec<String>,
    luw: Option<(String, String)>,
    cont: bool,
}

pub fn tok(surface: &str, pos: &str) -> Tok {
    Tok {
        surface: surface.to_string(),
        fields: suw_fields(surface, pos),
        luw: None,
        cont: false,
    }
}

impl Tok {
    pub fn lemma(self, lemma: &str) -> Self {
        self.field(SuwField::Lemma, lemma)
    }

    pub fn field(mut self, field: SuwField, value: &str) -> Self {
        let i = field as usize;
        if self.fields.len() <= i {
            self.fields.resize(i + 1, String::new());
        }
        self.fields[i] = value.to_string();
        self
    }

    /// Starts a long unit with the given form and POS.
    pub fn luw(mut self, form: &str, pos: &str) -> Self {
        let mut fields: Vec<String> = pos.split(',').map(str::to_string).collect();
        fields.resize(4, "*".to_string());
        fields.extend(["*", "*", "", form].map(str::to_string));
        self.luw = Some((form.to_string(), join_csv_row(&fields)));
        self
    }

    /// Continues the previous token's long unit.
    pub fn cont(mut self) -> Self {
        self.cont = true;
        self
    }

    pub fn line(&self) -> String {
        let mut line = format!("{}\t{}", self.surface, join_csv_row(&self.fields));
        if self.cont {
            line.push_str("\t\t");
        } else if let Some((form, csv)) = &self.luw {
            line.push_str(&format!("\t{form}\t{csv}"));
        }
        line
    }
}

/// CaboCha lines for one sentence: `(dep_pos, tokens)` per bunsetsu.
pub fn cabocha(bunsetus: &[(i32, Vec<Tok>)]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, (dep, toks)) in bunsetus.iter().enumerate() {
        lines.push(format!("* {i} {dep}D 0/0 0.000"));
        lines.extend(toks.iter().map(Tok::line));
    }
    lines.push("EOS".to_string());
    lines
}

pub fn parse_one(lines: &[String]) -> Document {
    let mut docs = parse_documents(lines, "test").unwrap();
    assert_eq!(docs.len(), 1);
    docs.remove(0)
}

pub fn sentence(bunsetus: &[(i32, Vec<Tok>)]) -> Sentence {
    parse_one(&cabocha(bunsetus)).sentences.remove(0)
}
