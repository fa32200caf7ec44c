use super::annotation::AnnotationList;
use super::sentence::Sentence;

/// Bibliographic metadata extracted from document directives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocMeta {
    pub bib_id: Option<String>,
    pub sent_id: Option<String>,
    pub newdoc_id: Option<String>,
    pub text_en: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Document {
    /// Number given on the `#! DOC` line, if any.
    pub doc_number: Option<String>,
    pub doc_id: String,
    /// Document directives verbatim (everything between `#! DOC` and the
    /// first bunsetsu, excluding sentence annotations).
    pub attributes: Vec<String>,
    /// Non-annotation directives found after the first sentence.
    pub trailing_directives: Vec<String>,
    pub meta: DocMeta,
    pub sentences: Vec<Sentence>,
    pub annotations: AnnotationList,
}

impl Document {
    /// Character offset of each sentence within the document text.
    pub fn sentence_offsets(&self) -> Vec<usize> {
        let mut offsets = Vec::with_capacity(self.sentences.len());
        let mut acc = 0;
        for s in &self.sentences {
            offsets.push(acc);
            acc += s.text().chars().count();
        }
        offsets
    }

    /// `sent_id` of the sentence at `idx`: an explicit id if the metadata
    /// supplied one, else `<doc-id>-<1-based index>`.
    pub fn sent_id(&self, idx: usize) -> String {
        self.sentences
            .get(idx)
            .and_then(|s| s.sent_id.clone())
            .unwrap_or_else(|| format!("{}-{}", self.doc_id, idx + 1))
    }
}
