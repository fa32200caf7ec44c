//! SpaceAfter information from an external token database.
//!
//! The database is a TSV file with a header row. Three columns are read:
//! `orthToken(S)` (token orthography), `boundary(S)` (`B` opens a sentence)
//! and `SpaceAfter` (`YES`/`NO`). Database sentences are matched to
//! converted sentences in order, allowing a few database sentences to be
//! skipped, then tokens are aligned by longest common subsequence.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use similar::{capture_diff_slices, Algorithm, DiffTag, TextDiff};
use tracing::{debug, warn};

use crate::cabocha::parse_delimited_row;
use crate::model::Sentence;
use crate::ud::UdSentence;

/// Minimum character similarity for a database sentence to be taken.
pub const MIN_SENTENCE_RATIO: f32 = 0.8;

/// Database sentences looked at ahead of the cursor.
const SEARCH_WINDOW: usize = 5;

const ORTH_COLUMN: &str = "orthToken(S)";
const BOUNDARY_COLUMN: &str = "boundary(S)";
const SPACE_COLUMN: &str = "SpaceAfter";

#[derive(Debug, thiserror::Error)]
pub enum AlignError {
    #[error("cannot read space database {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("space database: missing column {0}")]
    MissingColumn(&'static str),
    #[error("space database line {line}: expected {expected} columns, found {found}")]
    ShortRow {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("{sent_id}: no space database sentence within reach (best similarity {ratio:.2})")]
    NoMatch { sent_id: String, ratio: f32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceToken {
    pub orth: String,
    pub space_after: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SpaceDb {
    sentences: Vec<Vec<SpaceToken>>,
}

impl SpaceDb {
    pub fn open(path: &Path) -> Result<Self, AlignError> {
        let io_err = |source| AlignError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = std::fs::File::open(path).map_err(io_err)?;
        Self::from_reader(std::io::BufReader::new(file)).map_err(|e| match e {
            AlignError::Io { source, .. } => io_err(source),
            other => other,
        })
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, AlignError> {
        let mut lines = reader.lines();
        let header = match lines.next() {
            Some(line) => line.map_err(|source| AlignError::Io {
                path: PathBuf::new(),
                source,
            })?,
            None => return Ok(Self::default()),
        };
        let header = parse_delimited_row(header.trim_end_matches('\r'), b'\t');
        let column = |name: &'static str| {
            header
                .iter()
                .position(|h| h == name)
                .ok_or(AlignError::MissingColumn(name))
        };
        let (orth, boundary, space) = (
            column(ORTH_COLUMN)?,
            column(BOUNDARY_COLUMN)?,
            column(SPACE_COLUMN)?,
        );
        let width = orth.max(boundary).max(space) + 1;

        let mut sentences: Vec<Vec<SpaceToken>> = Vec::new();
        for (i, line) in lines.enumerate() {
            let line = line.map_err(|source| AlignError::Io {
                path: PathBuf::new(),
                source,
            })?;
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            let row = parse_delimited_row(line, b'\t');
            if row.len() < width {
                return Err(AlignError::ShortRow {
                    line: i + 2,
                    expected: width,
                    found: row.len(),
                });
            }
            let tok = SpaceToken {
                orth: row[orth].clone(),
                space_after: row[space].eq_ignore_ascii_case("yes"),
            };
            match sentences.last_mut() {
                Some(cur) if row[boundary] != "B" => cur.push(tok),
                _ => sentences.push(vec![tok]),
            }
        }
        Ok(Self { sentences })
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }
}

/// Walks the database alongside the converted corpus.
#[derive(Debug)]
pub struct SpaceAligner {
    db: SpaceDb,
    cursor: usize,
    best_effort: bool,
}

impl SpaceAligner {
    pub fn new(db: SpaceDb, best_effort: bool) -> Self {
        Self {
            db,
            cursor: 0,
            best_effort,
        }
    }

    /// SpaceAfter flags for `tokens`, or `None` when no database sentence
    /// matched and best-effort alignment is on.
    pub fn align(&mut self, sent_id: &str, tokens: &[&str]) -> Result<Option<Vec<bool>>, AlignError> {
        let text: String = tokens.concat();
        let end = (self.cursor + SEARCH_WINDOW).min(self.db.sentences.len());
        let mut best: Option<(usize, f32)> = None;
        for i in self.cursor..end {
            let db_text: String = self.db.sentences[i].iter().map(|t| t.orth.as_str()).collect();
            let ratio = TextDiff::from_chars(text.as_str(), db_text.as_str()).ratio();
            if best.map_or(true, |(_, r)| ratio > r) {
                best = Some((i, ratio));
            }
            if ratio >= 1.0 {
                break;
            }
        }
        let ratio = best.map_or(0.0, |(_, r)| r);
        let Some((idx, _)) = best.filter(|&(_, r)| r >= MIN_SENTENCE_RATIO) else {
            if self.best_effort {
                warn!(sent_id, ratio, "no space database sentence; SpaceAfter left unchanged");
                return Ok(None);
            }
            return Err(AlignError::NoMatch {
                sent_id: sent_id.to_string(),
                ratio,
            });
        };
        if idx > self.cursor {
            debug!(sent_id, skipped = idx - self.cursor, "space database sentences skipped");
        }
        self.cursor = idx + 1;
        Ok(Some(align_tokens(tokens, &self.db.sentences[idx])))
    }
}

/// Maps database SpaceAfter values onto `tokens`. Equal runs map one to
/// one; a replaced run whose concatenations agree passes the value of its
/// last database token to its last token.
fn align_tokens(tokens: &[&str], db: &[SpaceToken]) -> Vec<bool> {
    let db_orth: Vec<&str> = db.iter().map(|t| t.orth.as_str()).collect();
    let mut flags = vec![false; tokens.len()];
    for op in capture_diff_slices(Algorithm::Lcs, tokens, &db_orth[..]) {
        let (tag, old, new) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => {
                for (o, n) in old.zip(new) {
                    flags[o] = db[n].space_after;
                }
            }
            DiffTag::Replace => {
                if tokens[old.clone()].concat() == db_orth[new.clone()].concat() {
                    if let (Some(o), Some(n)) = (old.last(), new.last()) {
                        flags[o] = db[n].space_after;
                    }
                }
            }
            DiffTag::Delete | DiffTag::Insert => {}
        }
    }
    flags
}

/// `merge_sp_to_cabocha`: sets SpaceAfter on words before conversion.
pub fn merge_into_sentence(
    aligner: &mut SpaceAligner,
    sent_id: &str,
    sent: &mut Sentence,
) -> Result<(), AlignError> {
    let surfaces: Vec<String> = sent.words().map(|w| w.surface.clone()).collect();
    let refs: Vec<&str> = surfaces.iter().map(String::as_str).collect();
    if let Some(flags) = aligner.align(sent_id, &refs)? {
        for (w, yes) in sent.words_mut().zip(flags) {
            if yes {
                w.set_space_after(true);
            }
        }
    }
    Ok(())
}

/// `merge_sp_to_conll`: sets SpaceAfter on output tokens and rebuilds
/// `# text`.
pub fn merge_into_conll(
    aligner: &mut SpaceAligner,
    sent: &mut UdSentence,
    marker: &str,
) -> Result<(), AlignError> {
    let forms: Vec<String> = sent.tokens.iter().map(|t| t.form.clone()).collect();
    let refs: Vec<&str> = forms.iter().map(String::as_str).collect();
    let sent_id = sent.sent_id().to_string();
    if let Some(flags) = aligner.align(&sent_id, &refs)? {
        for (t, yes) in sent.tokens.iter_mut().zip(flags) {
            if yes {
                t.set_space_after(true);
            }
        }
        sent.refresh_text(marker);
    }
    Ok(())
}
