//! `convert_paren`: a parenthesised span becomes an apposition of the
//! content word before it.

use std::ops::RangeInclusive;

use tracing::debug;

use crate::ud::UdSentence;
use crate::unicode::{is_close_paren, is_open_paren};

/// Deprels of a token before `（` that make its head the anchor instead.
const FUNCTIONAL_DEPRELS: [&str; 3] = ["case", "mark", "punct"];

/// `(open, close)` ids of each matched, non-empty bracket pair.
fn bracket_pairs(sent: &UdSentence) -> Vec<(usize, usize)> {
    let mut stack = Vec::new();
    let mut pairs = Vec::new();
    for t in &sent.tokens {
        if is_open_paren(&t.form) {
            stack.push(t.id);
        } else if is_close_paren(&t.form) {
            if let Some(open) = stack.pop() {
                if t.id > open + 1 {
                    pairs.push((open, t.id));
                }
            }
        }
    }
    pairs.sort_unstable();
    pairs
}

/// First token on the head chain of `id` outside `span`; 0 if the chain
/// reaches the root.
fn head_outside(sent: &UdSentence, id: usize, span: &RangeInclusive<usize>) -> usize {
    let mut cur = sent.token(id).map_or(0, |t| t.head);
    for _ in 0..sent.tokens.len() {
        if !span.contains(&cur) {
            return cur;
        }
        cur = sent.token(cur).map_or(0, |t| t.head);
    }
    0
}

fn has_cycle(sent: &UdSentence) -> bool {
    sent.tokens
        .iter()
        .any(|t| t.head != 0 && (t.head == t.id || sent.is_ancestor(t.id, t.head)))
}

/// Rewrites every bracketed span. Returns the number of spans rewritten.
pub fn convert_parens(sent: &mut UdSentence) -> usize {
    let mut done = 0;
    for (open, close) in bracket_pairs(sent) {
        let backup = sent.tokens.clone();
        if rewrite_span(sent, open, close) && !has_cycle(sent) {
            done += 1;
        } else {
            sent.tokens = backup;
        }
    }
    done
}

fn rewrite_span(sent: &mut UdSentence, open: usize, close: usize) -> bool {
    let Some(before) = open.checked_sub(1).and_then(|id| sent.token(id)) else {
        return false;
    };
    let anchor = if FUNCTIONAL_DEPRELS.contains(&before.deprel.as_str()) {
        before.head
    } else {
        before.id
    };
    let span = open..=close;
    let interior = open + 1..=close - 1;
    if anchor == 0 || span.contains(&anchor) {
        return false;
    }

    // last interior token governed from outside the interior
    let Some(in_head) = interior
        .clone()
        .rev()
        .find(|&id| sent.token(id).is_some_and(|t| !interior.contains(&t.head)))
    else {
        return false;
    };
    let (old_deprel, up) = match sent.token(in_head) {
        Some(t) => (t.deprel.clone(), head_outside(sent, in_head, &span)),
        None => return false,
    };

    // the anchor hung from the span: it takes the span's place
    let anchor_below = sent.is_ancestor(in_head, anchor)
        || sent
            .token(anchor)
            .is_some_and(|t| span.contains(&t.head));
    if anchor_below {
        if up == anchor {
            return false;
        }
        if let Some(t) = sent.token_mut(anchor) {
            t.head = up;
            t.deprel = if up == 0 { "root".to_string() } else { old_deprel };
        }
    }

    for t in sent.tokens.iter_mut() {
        if t.id == in_head || t.id == anchor {
            continue;
        }
        if t.id == open || t.id == close {
            t.head = in_head;
            t.deprel = "punct".to_string();
        } else if interior.contains(&t.id) {
            if !interior.contains(&t.head) {
                t.head = in_head;
            }
        } else if span.contains(&t.head) {
            t.head = anchor;
        }
    }
    if let Some(t) = sent.token_mut(in_head) {
        t.head = anchor;
        t.deprel = "appos".to_string();
    }
    debug!(sent_id = sent.sent_id(), open, close, anchor, in_head, "parenthesis to appos");
    true
}
