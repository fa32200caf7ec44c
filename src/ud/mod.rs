//! CoNLL-U sentences: the output side of the converter and the input of the
//! post-stages.

pub mod conllu;
pub mod emit;

use std::collections::BTreeMap;

use crate::model::TreeError;

pub use conllu::{parse_conllu, write_conllu, ConlluError};
pub use emit::{emit_document, emit_sentence, EmitOptions};

/// Header keys in the order they are written.
pub const HEADER_ORDER: [&str; 4] = ["newdoc id", "sent_id", "text", "text_en"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdToken {
    pub id: usize,
    pub form: String,
    pub lemma: String,
    pub upos: String,
    pub xpos: String,
    pub feats: BTreeMap<String, String>,
    /// 0 for the root.
    pub head: usize,
    pub deprel: String,
    pub deps: String,
    pub misc: BTreeMap<String, String>,
}

impl UdToken {
    pub fn space_after(&self) -> bool {
        self.misc.get("SpaceAfter").is_some_and(|v| v == "Yes")
    }

    pub fn set_space_after(&mut self, yes: bool) {
        self.misc.insert(
            "SpaceAfter".to_string(),
            if yes { "Yes" } else { "No" }.to_string(),
        );
    }

    /// Field value by UD column name.
    pub fn field(&self, name: &str) -> Option<String> {
        Some(match name {
            "ID" => self.id.to_string(),
            "FORM" => self.form.clone(),
            "LEMMA" => self.lemma.clone(),
            "UPOS" => self.upos.clone(),
            "XPOS" => self.xpos.clone(),
            "FEATS" => conllu::join_map(&self.feats),
            "HEAD" => self.head.to_string(),
            "DEPREL" => self.deprel.clone(),
            "DEPS" => self.deps.clone(),
            "MISC" => conllu::join_map(&self.misc),
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UdSentence {
    pub headers: Vec<(String, String)>,
    pub tokens: Vec<UdToken>,
}

impl UdSentence {
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Replaces `key` or inserts it at its canonical position.
    pub fn set_header(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(slot) = self.headers.iter_mut().find(|(k, _)| k == key) {
            slot.1 = value;
            return;
        }
        let rank = |k: &str| HEADER_ORDER.iter().position(|h| *h == k).unwrap_or(HEADER_ORDER.len());
        let at = self
            .headers
            .iter()
            .position(|(k, _)| rank(k) > rank(key))
            .unwrap_or(self.headers.len());
        self.headers.insert(at, (key.to_string(), value));
    }

    pub fn sent_id(&self) -> &str {
        self.header("sent_id").unwrap_or("")
    }

    /// Token forms joined, with `marker` after every token that has
    /// `SpaceAfter=Yes`. Space placeholders are rendered as the space they
    /// stand for.
    pub fn compose_text(&self, marker: &str) -> String {
        let mut text = String::new();
        for t in &self.tokens {
            match t.form.as_str() {
                emit::ZENKAKU_SPACE_FORM => text.push(crate::unicode::ZENKAKU_SPACE),
                emit::HANKAKU_SPACE_FORM => text.push(' '),
                form => text.push_str(form),
            }
            if t.space_after() {
                text.push_str(marker);
            }
        }
        text
    }

    pub fn refresh_text(&mut self, marker: &str) {
        let text = self.compose_text(marker);
        self.set_header("text", text);
    }

    pub fn roots(&self) -> Vec<usize> {
        self.tokens
            .iter()
            .filter(|t| t.head == 0)
            .map(|t| t.id)
            .collect()
    }

    pub fn token(&self, id: usize) -> Option<&UdToken> {
        id.checked_sub(1).and_then(|i| self.tokens.get(i))
    }

    pub fn token_mut(&mut self, id: usize) -> Option<&mut UdToken> {
        id.checked_sub(1).and_then(|i| self.tokens.get_mut(i))
    }

    pub fn children(&self, head: usize) -> Vec<usize> {
        self.tokens
            .iter()
            .filter(|t| t.head == head)
            .map(|t| t.id)
            .collect()
    }

    /// True if `ancestor` lies on the head chain of `id`.
    pub fn is_ancestor(&self, ancestor: usize, id: usize) -> bool {
        let mut cur = id;
        for _ in 0..=self.tokens.len() {
            let Some(t) = self.token(cur) else {
                return false;
            };
            if t.head == ancestor {
                return true;
            }
            if t.head == 0 {
                return false;
            }
            cur = t.head;
        }
        false
    }

    /// Ids run 1..N, heads are in range, the graph is acyclic, and there is
    /// exactly one root.
    pub fn validate(&self) -> Result<(), TreeError> {
        let n = self.tokens.len();
        for (i, t) in self.tokens.iter().enumerate() {
            if t.id != i + 1 {
                return Err(TreeError::NonContiguousToken {
                    expected: i + 1,
                    found: t.id,
                });
            }
            if t.head > n {
                return Err(TreeError::HeadOutOfRange {
                    token: t.id,
                    head: t.head,
                });
            }
        }
        for t in &self.tokens {
            if t.head != 0 && (t.head == t.id || self.is_ancestor(t.id, t.head)) {
                return Err(TreeError::Cycle { token: t.id });
            }
        }
        match self.roots().len() {
            0 if n > 0 => Err(TreeError::NoRoot),
            0 | 1 => Ok(()),
            count => Err(TreeError::MultiRoot { count }),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A token with the given form, head and deprel; everything else blank.
    pub(crate) fn ud_token(id: usize, form: &str, head: usize, deprel: &str) -> UdToken {
        let mut misc = BTreeMap::new();
        misc.insert("SpaceAfter".to_string(), "No".to_string());
        UdToken {
            id,
            form: form.to_string(),
            lemma: form.to_string(),
            upos: "NOUN".to_string(),
            xpos: "_".to_string(),
            feats: BTreeMap::new(),
            head,
            deprel: deprel.to_string(),
            deps: "_".to_string(),
            misc,
        }
    }

    pub(crate) fn ud_sentence(id: &str, tokens: &[(&str, usize, &str)]) -> UdSentence {
        let mut s = UdSentence {
            headers: vec![("sent_id".to_string(), id.to_string())],
            tokens: tokens
                .iter()
                .enumerate()
                .map(|(i, &(f, h, d))| ud_token(i + 1, f, h, d))
                .collect(),
        };
        s.refresh_text(" ");
        s
    }

    #[test]
    fn test_header_order_kept() {
        let mut s = ud_sentence("a-1", &[("猫", 0, "root")]);
        s.set_header("text_en", "cat");
        s.set_header("newdoc id", "a");
        let keys: Vec<&str> = s.headers.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["newdoc id", "sent_id", "text", "text_en"]);
        s.set_header("sent_id", "b-1");
        assert_eq!(s.sent_id(), "b-1");
    }

    #[test]
    fn test_compose_text() {
        let mut s = ud_sentence("a-1", &[("東京", 0, "root"), ("[JSP]", 1, "punct"), ("へ", 1, "case")]);
        s.tokens[0].set_space_after(true);
        assert_eq!(s.compose_text("　"), "東京　　へ");
        assert_eq!(s.compose_text(" "), "東京 　へ");
    }

    #[test]
    fn test_validate() {
        let s = ud_sentence("a-1", &[("猫", 2, "nsubj"), ("寝る", 0, "root")]);
        assert!(s.validate().is_ok());
        let s = ud_sentence("a-1", &[("猫", 0, "root"), ("寝る", 0, "root")]);
        assert_eq!(s.validate(), Err(TreeError::MultiRoot { count: 2 }));
        let s = ud_sentence("a-1", &[("猫", 2, "dep"), ("寝る", 1, "dep")]);
        assert!(matches!(s.validate(), Err(TreeError::Cycle { .. })));
        let s = ud_sentence("a-1", &[("猫", 3, "dep")]);
        assert!(matches!(s.validate(), Err(TreeError::HeadOutOfRange { .. })));
    }
}
