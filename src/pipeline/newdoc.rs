//! `fixed_newdoc`: a document boundary implies whitespace after the last
//! token of the previous document.

use tracing::debug;

use crate::ud::UdSentence;

/// Sets `SpaceAfter=Yes` on the last token of every sentence followed by a
/// sentence carrying a `newdoc id` header, and refreshes its `# text`.
pub fn fix_newdoc_spacing(sentences: &mut [UdSentence], marker: &str) -> usize {
    let mut fixed = 0;
    for i in 1..sentences.len() {
        let (done, rest) = sentences.split_at_mut(i);
        if mark_document_end(&mut done[i - 1], &rest[0], marker) {
            fixed += 1;
        }
    }
    fixed
}

/// The pairwise step of [`fix_newdoc_spacing`], for sentences that do not
/// share a slice. Returns true if `prev` changed.
pub fn mark_document_end(prev: &mut UdSentence, next: &UdSentence, marker: &str) -> bool {
    if next.header("newdoc id").is_none() {
        return false;
    }
    let Some(last) = prev.tokens.last_mut() else {
        return false;
    };
    if last.space_after() {
        return false;
    }
    last.set_space_after(true);
    prev.refresh_text(marker);
    debug!(sent_id = prev.sent_id(), "SpaceAfter before newdoc");
    true
}
