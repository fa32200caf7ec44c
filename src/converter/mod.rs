//! Bunsetsu-to-UD conversion.
//!
//! - `Converter::convert_sentence` runs the core steps on one sentence:
//!   head detection, arc lifting, rewrites, UPOS and DEPREL rules, clean-up
//! - `Converter::convert_document` adds the pre-stages and emission
//! - `Converter::convert_stream` reads CaboCha and writes CoNLL-U document
//!   by document

pub mod head;
pub mod lifter;
mod luw_remap;
pub mod postprocess;
pub(crate) mod rewriter;

#[cfg(test)]
mod tests;

use std::io::{BufRead, Write};

use tracing::{debug, debug_span, warn};

use crate::cabocha::{DocumentReader, ParseError};
use crate::model::{AnnotationList, Document, Sentence, TreeError};
use crate::pipeline::{
    build_long_units, convert_parens, fix_newdoc_spacing, mark_document_end, merge_into_conll,
    merge_into_sentence, merge_numbers, resolve_multi_root, AlignError, PatchError, PatchTable,
    RootResolution, SpaceAligner, SpaceDb,
};
use crate::rules::{RuleError, RuleSet};
use crate::settings::{ConvertOptions, OptionsError, Stage};
use crate::ud::{emit_sentence, write_conllu, ConlluError, EmitOptions, UdSentence};

pub use head::{assign_heads, detect_heads, Heads};
pub use lifter::lift_arcs;
pub use luw_remap::remap_long_units;

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Rules(#[from] RuleError),
    #[error(transparent)]
    Options(#[from] OptionsError),
    #[error(transparent)]
    Align(#[from] AlignError),
    #[error(transparent)]
    Patch(#[from] PatchError),
    #[error(transparent)]
    Conllu(#[from] ConlluError),
    #[error("{sent_id}{}: {source}", bunsetu.map(|b| format!(" (bunsetsu {b})")).unwrap_or_default())]
    Tree {
        sent_id: String,
        bunsetu: Option<usize>,
        #[source]
        source: TreeError,
    },
    #[error("write error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    fn tree(sent_id: &str, source: TreeError) -> Self {
        let bunsetu = match source {
            TreeError::EmptyBunsetu { bunsetu } | TreeError::DepOutOfRange { bunsetu, .. } => {
                Some(bunsetu)
            }
            _ => None,
        };
        Self::Tree {
            sent_id: sent_id.to_string(),
            bunsetu,
            source,
        }
    }
}

/// Counters for one conversion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertStats {
    pub documents: usize,
    pub sentences: usize,
    pub dropped: usize,
}

/// Runs the whole pipeline: pre-stages, head detection, arc lifting,
/// rewrites, UPOS and DEPREL rules, clean-up, emission and post-stages.
pub struct Converter {
    options: ConvertOptions,
    rules: RuleSet,
    patches: PatchTable,
    /// Separate cursors: both merge stages walk the database from the start.
    sp_cabocha: Option<SpaceAligner>,
    sp_conll: Option<SpaceAligner>,
    stats: ConvertStats,
}

impl Converter {
    pub fn new(options: ConvertOptions, rules: RuleSet) -> Self {
        Self {
            options,
            rules,
            patches: PatchTable::default(),
            sp_cabocha: None,
            sp_conll: None,
            stats: ConvertStats::default(),
        }
    }

    /// Loads every table and side file named in `options`. Stages that need
    /// a file fail here when it is missing.
    pub fn from_options(options: ConvertOptions) -> Result<Self, ConvertError> {
        let files = options.files.clone();
        let rules = RuleSet::load(
            files.upos_rules.as_deref(),
            files.deprel_rules.as_deref(),
            files.objcase_rules.as_deref(),
        )?;
        let needs = |stage: Stage, field: &str, given: bool| {
            if options.has_stage(stage) && !given {
                return Err(OptionsError::InvalidValue {
                    field: field.to_string(),
                    reason: format!("stage {} needs this file", stage.as_str()),
                });
            }
            Ok(())
        };
        needs(Stage::PatchFix, "files.patch", files.patch.is_some())?;
        needs(Stage::MergeSpToCabocha, "files.space_db", files.space_db.is_some())?;
        needs(Stage::MergeSpToConll, "files.space_db", files.space_db.is_some())?;

        let mut converter = Self::new(options, rules);
        if let Some(path) = &files.patch {
            converter = converter.with_patches(PatchTable::open(path)?);
        }
        if let Some(path) = &files.space_db {
            converter = converter.with_space_db(SpaceDb::open(path)?);
        }
        Ok(converter)
    }

    pub fn with_patches(mut self, patches: PatchTable) -> Self {
        self.patches = patches;
        self
    }

    pub fn with_space_db(mut self, db: SpaceDb) -> Self {
        let best_effort = self.options.best_effort_alignment;
        self.sp_cabocha = Some(SpaceAligner::new(db.clone(), best_effort));
        self.sp_conll = Some(SpaceAligner::new(db, best_effort));
        self
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    pub fn stats(&self) -> ConvertStats {
        self.stats
    }

    fn emit_options(&self) -> EmitOptions {
        EmitOptions {
            space_marker: self.options.space_marker,
        }
    }

    /// Logs and drops the sentence in lenient mode; fails in strict mode.
    fn structural(&mut self, err: ConvertError) -> Result<(), ConvertError> {
        if self.options.strict {
            return Err(err);
        }
        if let ConvertError::Tree {
            sent_id,
            bunsetu,
            source,
        } = &err
        {
            warn!(sent_id = %sent_id, bunsetu = ?bunsetu, reason = %source, "sentence dropped");
        } else {
            warn!(reason = %err, "sentence dropped");
        }
        self.stats.dropped += 1;
        Ok(())
    }

    /// Pre-stages, in the configured order.
    fn pre_process(&mut self, sent: &mut Sentence, sent_id: &str) -> Result<(), ConvertError> {
        for stage in self.options.pre_stages() {
            let _span = debug_span!("stage", stage = stage.as_str()).entered();
            match stage {
                Stage::MergeNumber => {
                    merge_numbers(sent);
                }
                Stage::BuildLuw => {
                    build_long_units(sent);
                }
                Stage::MergeSpToCabocha => {
                    if let Some(aligner) = self.sp_cabocha.as_mut() {
                        merge_into_sentence(aligner, sent_id, sent)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// The core conversion of one sentence, from bunsetsu layout to labelled
    /// word tree.
    pub fn convert_sentence(
        &self,
        sent: &mut Sentence,
        sent_id: &str,
        doc: Option<(&AnnotationList, usize)>,
    ) -> Result<(), ConvertError> {
        let _span = debug_span!("sentence", sent_id).entered();
        sent.validate().map_err(|e| ConvertError::tree(sent_id, e))?;
        remap_long_units(sent);
        assign_heads(sent.bunsetus_mut());
        lift_arcs(sent);
        rewriter::run_rewriters(&rewriter::default_rewriters(), sent);
        self.rules.upos.assign(sent);
        self.rules.deprel.assign(sent, doc);
        postprocess::postprocess(sent, &self.rules.objcase, self.options.skip_space);
        sent.validate().map_err(|e| ConvertError::tree(sent_id, e))
    }

    /// Converts one document into CoNLL-U sentences, post-stages included.
    /// The first emitted sentence opens the document with `# newdoc id`.
    pub fn convert_document(&mut self, mut doc: Document) -> Result<Vec<UdSentence>, ConvertError> {
        let _span = debug_span!("document", doc_id = %doc.doc_id).entered();
        self.stats.documents += 1;
        let ids: Vec<String> = (0..doc.sentences.len()).map(|i| doc.sent_id(i)).collect();
        let mut sentences = std::mem::take(&mut doc.sentences);
        for (sent, id) in sentences.iter_mut().zip(&ids) {
            self.pre_process(sent, id)?;
        }
        doc.sentences = sentences;
        let offsets = doc.sentence_offsets();
        let sentences = std::mem::take(&mut doc.sentences);

        let opts = self.emit_options();
        let mut out = Vec::with_capacity(sentences.len());
        for ((mut sent, id), offset) in sentences.into_iter().zip(&ids).zip(offsets) {
            if let Err(e) = self.convert_sentence(&mut sent, id, Some((&doc.annotations, offset))) {
                self.structural(e)?;
                continue;
            }
            if sent.is_empty() {
                debug!(sent_id = %id, "empty sentence dropped");
                self.stats.dropped += 1;
                continue;
            }
            let newdoc = sent
                .newdoc_id
                .as_deref()
                .or_else(|| out.is_empty().then_some(doc.doc_id.as_str()));
            out.push(emit_sentence(&sent, id, newdoc, &opts));
        }
        self.post_process(out)
    }

    /// Post-stages over CoNLL-U sentences, in the configured order, then a
    /// final tree check. Root count is only enforced when
    /// `replace_multi_root` ran.
    pub fn post_process(&mut self, mut sentences: Vec<UdSentence>) -> Result<Vec<UdSentence>, ConvertError> {
        let marker = self.options.space_marker.text();
        for stage in self.options.post_stages() {
            let _span = debug_span!("stage", stage = stage.as_str()).entered();
            match stage {
                Stage::ConvertParen => {
                    let n: usize = sentences.iter_mut().map(convert_parens).sum();
                    debug!(spans = n, "parentheses rewritten");
                }
                Stage::FixedNewdoc => {
                    fix_newdoc_spacing(&mut sentences, marker);
                }
                Stage::MergeSpToConll => {
                    if let Some(aligner) = self.sp_conll.as_mut() {
                        for s in &mut sentences {
                            merge_into_conll(aligner, s, marker)?;
                        }
                    }
                }
                Stage::PatchFix => {
                    for s in &mut sentences {
                        self.patches.apply(s)?;
                    }
                }
                Stage::ReplaceMultiRoot => {
                    let mode = self.options.multi_root_mode;
                    let before = sentences.len();
                    sentences.retain_mut(|s| resolve_multi_root(s, mode) != RootResolution::Remove);
                    self.stats.dropped += before - sentences.len();
                }
                _ => {}
            }
        }

        let check_roots = self.options.has_stage(Stage::ReplaceMultiRoot);
        let mut kept = Vec::with_capacity(sentences.len());
        for s in sentences {
            match s.validate() {
                Ok(()) => kept.push(s),
                Err(TreeError::MultiRoot { .. }) if !check_roots => kept.push(s),
                Err(e) => self.structural(ConvertError::tree(s.sent_id(), e))?,
            }
        }
        self.stats.sentences += kept.len();
        Ok(kept)
    }

    /// Streams documents from `reader` to `out` as CoNLL-U. The last
    /// sentence of each document is held back until the next document is
    /// known, so that `fixed_newdoc` also applies across documents.
    pub fn convert_stream<R: BufRead, W: Write>(
        &mut self,
        reader: R,
        source_name: &str,
        out: &mut W,
    ) -> Result<ConvertStats, ConvertError> {
        let fix_boundaries = self.options.has_stage(Stage::FixedNewdoc);
        let marker = self.options.space_marker.text();
        let mut held: Option<UdSentence> = None;
        for doc in DocumentReader::from_reader(reader, source_name) {
            let mut sentences = self.convert_document(doc?)?;
            if let Some(mut prev) = held.take() {
                if let (true, Some(first)) = (fix_boundaries, sentences.first()) {
                    mark_document_end(&mut prev, first, marker);
                }
                write_conllu(out, std::slice::from_ref(&prev))?;
            }
            held = sentences.pop();
            write_conllu(out, &sentences)?;
        }
        if let Some(last) = held {
            write_conllu(out, std::slice::from_ref(&last))?;
        }
        Ok(self.stats)
    }
}
