use std::cell::OnceCell;
use std::collections::HashMap;

use super::annotation::{AnnotationList, Range};
use super::bunsetu::Bunsetu;
use super::word::Word;
use super::TreeError;

/// Lookup tables derived from the bunsetsu/word layout. Rebuilt lazily
/// after a structural mutation.
#[derive(Debug, Default)]
struct SentenceIndex {
    /// `token_pos - 1` → (bunsetsu index, word index).
    locs: Vec<(usize, usize)>,
    /// `token_pos - 1` → character range within the sentence.
    ranges: Vec<Range>,
    by_range: HashMap<Range, usize>,
}

/// head token_pos → child token_pos list (0 holds the roots). Rebuilt
/// lazily after any head change.
type ChildIndex = HashMap<usize, Vec<usize>>;

#[derive(Debug, Default)]
pub struct Sentence {
    bunsetus: Vec<Bunsetu>,
    pub annotations: AnnotationList,
    /// Explicit id from document metadata, overriding `<doc-id>-<n>`.
    pub sent_id: Option<String>,
    pub text_en: Option<String>,
    pub newdoc_id: Option<String>,
    index: OnceCell<SentenceIndex>,
    children: OnceCell<ChildIndex>,
}

impl Clone for Sentence {
    fn clone(&self) -> Self {
        Self {
            bunsetus: self.bunsetus.clone(),
            annotations: self.annotations.clone(),
            sent_id: self.sent_id.clone(),
            text_en: self.text_en.clone(),
            newdoc_id: self.newdoc_id.clone(),
            index: OnceCell::new(),
            children: OnceCell::new(),
        }
    }
}

impl Sentence {
    pub fn new(bunsetus: Vec<Bunsetu>) -> Self {
        let mut sent = Self {
            bunsetus,
            ..Self::default()
        };
        sent.renumber();
        sent
    }

    pub fn bunsetus(&self) -> &[Bunsetu] {
        &self.bunsetus
    }

    /// Mutable access to the bunsetsu list. Drops every cached index.
    pub fn bunsetus_mut(&mut self) -> &mut Vec<Bunsetu> {
        self.invalidate();
        &mut self.bunsetus
    }

    pub fn invalidate(&mut self) {
        self.index = OnceCell::new();
        self.children = OnceCell::new();
    }

    fn index(&self) -> &SentenceIndex {
        self.index.get_or_init(|| {
            let mut idx = SentenceIndex::default();
            let mut offset = 0;
            for (bi, b) in self.bunsetus.iter().enumerate() {
                for (wi, w) in b.words.iter().enumerate() {
                    let len = w.surface.chars().count();
                    let range = (offset, offset + len);
                    offset += len;
                    idx.by_range.insert(range, idx.locs.len() + 1);
                    idx.locs.push((bi, wi));
                    idx.ranges.push(range);
                }
            }
            idx
        })
    }

    fn child_index(&self) -> &ChildIndex {
        self.children.get_or_init(|| {
            let mut children = ChildIndex::new();
            for w in self.words() {
                children.entry(w.dep_num).or_default().push(w.token_pos);
            }
            children
        })
    }

    pub fn is_empty(&self) -> bool {
        self.bunsetus.iter().all(|b| b.words.is_empty())
    }

    /// Number of words.
    pub fn len(&self) -> usize {
        self.index().locs.len()
    }

    pub fn words(&self) -> impl Iterator<Item = &Word> {
        self.bunsetus.iter().flat_map(|b| b.words.iter())
    }

    /// Visits every word mutably. Drops cached indices.
    pub fn words_mut(&mut self) -> impl Iterator<Item = &mut Word> {
        self.invalidate();
        self.bunsetus.iter_mut().flat_map(|b| b.words.iter_mut())
    }

    /// (bunsetsu index, word index) of the word at `token_pos`.
    pub fn locate(&self, token_pos: usize) -> Option<(usize, usize)> {
        token_pos
            .checked_sub(1)
            .and_then(|i| self.index().locs.get(i).copied())
    }

    pub fn word(&self, token_pos: usize) -> Option<&Word> {
        let (b, w) = self.locate(token_pos)?;
        self.bunsetus[b].words.get(w)
    }

    /// Mutable access to one word for head, label or tag edits. Keeps the
    /// layout index; surface edits go through `words_mut`.
    pub fn word_mut(&mut self, token_pos: usize) -> Option<&mut Word> {
        let (b, w) = self.locate(token_pos)?;
        self.children = OnceCell::new();
        self.bunsetus[b].words.get_mut(w)
    }

    pub fn bunsetu_of(&self, token_pos: usize) -> Option<&Bunsetu> {
        let (b, _) = self.locate(token_pos)?;
        self.bunsetus.get(b)
    }

    /// Children of `head` (0 for the roots), in token order.
    pub fn children(&self, head: usize) -> &[usize] {
        self.child_index()
            .get(&head)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn word_range(&self, token_pos: usize) -> Option<Range> {
        token_pos
            .checked_sub(1)
            .and_then(|i| self.index().ranges.get(i).copied())
    }

    pub fn word_at_range(&self, range: Range) -> Option<usize> {
        self.index().by_range.get(&range).copied()
    }

    /// Concatenated surfaces.
    pub fn text(&self) -> String {
        self.words().map(|w| w.surface.as_str()).collect()
    }

    pub fn roots(&self) -> Vec<usize> {
        self.children(0).to_vec()
    }

    /// True if `ancestor` lies on the head chain of `token_pos`.
    pub fn is_ancestor(&self, ancestor: usize, token_pos: usize) -> bool {
        let mut cur = token_pos;
        for _ in 0..=self.len() {
            let Some(w) = self.word(cur) else {
                return false;
            };
            if w.dep_num == ancestor {
                return true;
            }
            if w.dep_num == 0 {
                return false;
            }
            cur = w.dep_num;
        }
        false
    }

    /// Re-establishes indices after a structural edit: bunsetsu positions
    /// follow list order, token positions run 1..N, and head references are
    /// remapped. Heads pointing at removed tokens become roots.
    pub fn renumber(&mut self) {
        let mut remap: HashMap<usize, usize> = HashMap::new();
        let mut next = 1;
        for b in &self.bunsetus {
            for w in &b.words {
                if w.token_pos != 0 {
                    remap.insert(w.token_pos, next);
                }
                next += 1;
            }
        }
        let fresh = remap.is_empty();
        let mut next = 1;
        for (bi, b) in self.bunsetus.iter_mut().enumerate() {
            b.bunsetu_pos = bi;
            for w in &mut b.words {
                w.token_pos = next;
                w.bunsetu_pos = bi;
                next += 1;
                if fresh || w.dep_num == 0 {
                    continue;
                }
                match remap.get(&w.dep_num) {
                    Some(&n) => w.dep_num = n,
                    None => {
                        w.dep_num = 0;
                        w.dep_label = "root".to_string();
                    }
                }
            }
        }
        self.invalidate();
    }

    /// Checks the structural invariants of the bunsetsu and word layers.
    pub fn validate(&self) -> Result<(), TreeError> {
        let n_bunsetu = self.bunsetus.len();
        let mut expected_token = 1;
        for (i, b) in self.bunsetus.iter().enumerate() {
            if b.bunsetu_pos != i {
                return Err(TreeError::NonSequentialBunsetu {
                    expected: i,
                    found: b.bunsetu_pos,
                });
            }
            if let Some(p) = b.parent() {
                if p >= n_bunsetu {
                    return Err(TreeError::DepOutOfRange {
                        bunsetu: i,
                        dep_pos: b.dep_pos,
                    });
                }
            }
            if b.words.is_empty() {
                return Err(TreeError::EmptyBunsetu { bunsetu: i });
            }
            for w in &b.words {
                if w.token_pos != expected_token {
                    return Err(TreeError::NonContiguousToken {
                        expected: expected_token,
                        found: w.token_pos,
                    });
                }
                expected_token += 1;
            }
        }
        let n = expected_token - 1;
        for w in self.words() {
            if w.dep_num > n {
                return Err(TreeError::HeadOutOfRange {
                    token: w.token_pos,
                    head: w.dep_num,
                });
            }
            if w.dep_num != 0 && self.is_ancestor(w.token_pos, w.dep_num) {
                return Err(TreeError::Cycle { token: w.token_pos });
            }
        }
        Ok(())
    }

    /// Checks that exactly one word is attached to the root.
    pub fn validate_single_root(&self) -> Result<(), TreeError> {
        match self.children(0).len() {
            0 if !self.is_empty() => Err(TreeError::NoRoot),
            0 | 1 => Ok(()),
            n => Err(TreeError::MultiRoot { count: n }),
        }
    }
}
