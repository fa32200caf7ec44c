//! `replace_multi_root` and the punctuation repairs that follow it.

use tracing::debug;

use crate::settings::MultiRootMode;
use crate::ud::UdSentence;
use crate::unicode::is_open_paren;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootResolution {
    /// Already a single root (or empty).
    Untouched,
    /// Extra roots were attached to the kept root.
    Converted { reattached: usize },
    /// The sentence should be dropped.
    Remove,
}

/// Collapses several roots into one, or asks for the sentence to be
/// removed, then repairs punctuation arcs. The repairs also run on
/// single-root sentences.
pub fn resolve_multi_root(sent: &mut UdSentence, mode: MultiRootMode) -> RootResolution {
    let roots = sent.roots();
    let resolution = if roots.len() < 2 {
        RootResolution::Untouched
    } else if mode == MultiRootMode::Remove {
        debug!(sent_id = sent.sent_id(), roots = roots.len(), "multi-root sentence removed");
        return RootResolution::Remove;
    } else {
        let keep = roots
            .iter()
            .rev()
            .copied()
            .find(|&id| sent.token(id).is_some_and(|t| t.upos != "PUNCT"))
            .unwrap_or(roots[roots.len() - 1]);
        for &id in &roots {
            if let Some(t) = sent.token_mut(id) {
                if id == keep {
                    t.deprel = "root".to_string();
                } else {
                    t.head = keep;
                    t.deprel = "dep".to_string();
                }
            }
        }
        debug!(sent_id = sent.sent_id(), keep, reattached = roots.len() - 1, "multi-root converted");
        RootResolution::Converted {
            reattached: roots.len() - 1,
        }
    };
    fix_punct_projectivity(sent);
    fix_leaf_open_bracket(sent);
    resolution
}

fn span(a: usize, b: usize) -> (usize, usize) {
    (a.min(b), a.max(b))
}

fn crosses(x: (usize, usize), y: (usize, usize)) -> bool {
    let ((l1, r1), (l2, r2)) = (span(x.0, x.1), span(y.0, y.1));
    (l1 < l2 && l2 < r1 && r1 < r2) || (l2 < l1 && l1 < r2 && r2 < r1)
}

/// Non-root arcs crossing `(dep, head)`.
fn crossing_arcs(sent: &UdSentence, dep: usize, head: usize) -> usize {
    sent.tokens
        .iter()
        .filter(|t| t.head != 0 && t.id != dep)
        .filter(|t| crosses((dep, head), (t.id, t.head)))
        .count()
}

/// Reattaches `punct` arcs that cross another arc. An opening bracket moves
/// to the next token; other punctuation to the nearest token it can reach
/// without crossing, preferring its original side.
pub fn fix_punct_projectivity(sent: &mut UdSentence) -> usize {
    let n = sent.tokens.len();
    let mut fixed = 0;
    for id in 1..=n {
        let Some(t) = sent.token(id) else { continue };
        if t.deprel != "punct" || t.head == 0 || crossing_arcs(sent, id, t.head) == 0 {
            continue;
        }
        let old = t.head;
        let open = is_open_paren(&t.form) || t.xpos == "補助記号-括弧開";
        let toward_head = if old > id { 1isize } else { -1 };
        let mut candidates: Vec<usize> = Vec::new();
        if open && id < n {
            candidates.push(id + 1);
        }
        for d in 1..n as isize {
            for step in [toward_head * d, -toward_head * d] {
                let c = id as isize + step;
                if c >= 1 && c as usize <= n {
                    candidates.push(c as usize);
                }
            }
        }
        let new = candidates.into_iter().find(|&c| {
            c != id && !sent.is_ancestor(id, c) && crossing_arcs(sent, id, c) == 0
        });
        if let (Some(new), Some(t)) = (new, sent.token_mut(id)) {
            t.head = new;
            fixed += 1;
            debug!(id, from = old, to = new, "non-projective punct reattached");
        }
    }
    fixed
}

/// An opening bracket with several non-punct dependents hands them, and its
/// own attachment, to the token right after it.
pub fn fix_leaf_open_bracket(sent: &mut UdSentence) -> usize {
    let mut fixed = 0;
    for id in 1..sent.tokens.len() {
        let Some(b) = sent.token(id) else { continue };
        if !(is_open_paren(&b.form) || b.xpos == "補助記号-括弧開") {
            continue;
        }
        let kids: Vec<usize> = sent
            .children(id)
            .into_iter()
            .filter(|&c| sent.token(c).is_some_and(|t| t.deprel != "punct"))
            .collect();
        if kids.len() < 2 {
            continue;
        }
        let next = id + 1;
        let (head, deprel) = (b.head, b.deprel.clone());
        if head == next {
            continue;
        }
        let backup = sent.tokens.clone();
        for t in sent.tokens.iter_mut() {
            if t.id == next {
                t.head = head;
                t.deprel = deprel.clone();
            } else if t.id == id {
                t.head = next;
                t.deprel = "punct".to_string();
            } else if t.head == id {
                t.head = next;
            }
        }
        if sent.tokens.iter().any(|t| t.head != 0 && sent.is_ancestor(t.id, t.head)) {
            sent.tokens = backup;
            continue;
        }
        debug!(sent_id = sent.sent_id(), bracket = id, new_head = next, "open bracket demoted to leaf");
        fixed += 1;
    }
    fixed
}
