use super::word::Word;

/// A bunsetsu: a chunk of words plus its chunk-level dependency.
#[derive(Debug, Clone, PartialEq)]
pub struct Bunsetu {
    pub bunsetu_pos: usize,
    /// Parent bunsetsu index, -1 for the root.
    pub dep_pos: i32,
    /// `D` normally, `DX` for partial parallels, etc.
    pub dep_type: String,
    /// Semantic head, index into `words`.
    pub subj_pos: usize,
    /// Functional head, index into `words`.
    pub func_pos: usize,
    /// Remainder of the header line after the head positions (the score).
    pub score: String,
    /// False when head detection found neither a content nor a function word.
    pub has_head: bool,
    pub words: Vec<Word>,
}

impl Bunsetu {
    pub fn new(bunsetu_pos: usize, dep_pos: i32, dep_type: String) -> Self {
        Self {
            bunsetu_pos,
            dep_pos,
            dep_type,
            subj_pos: 0,
            func_pos: 0,
            score: String::new(),
            has_head: true,
            words: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<usize> {
        usize::try_from(self.dep_pos).ok()
    }

    pub fn is_self_loop(&self) -> bool {
        self.parent() == Some(self.bunsetu_pos)
    }

    pub fn subj_word(&self) -> Option<&Word> {
        self.words.get(self.subj_pos)
    }

    pub fn func_word(&self) -> Option<&Word> {
        self.words.get(self.func_pos)
    }

    /// Sets head positions and refreshes the per-word flags.
    pub fn set_heads(&mut self, subj_pos: usize, func_pos: usize) {
        self.subj_pos = subj_pos;
        self.func_pos = func_pos;
        for (i, w) in self.words.iter_mut().enumerate() {
            w.is_subj = self.has_head && i == subj_pos;
            w.is_func = self.has_head && i == func_pos;
        }
    }

    /// Coarse type derived from the heads, used by DEPREL rules.
    pub fn bunsetu_type(&self) -> BunsetuType {
        let (Some(subj), Some(func)) = (self.subj_word(), self.func_word()) else {
            return BunsetuType::Other;
        };
        let luw_major = |w: &Word| {
            let pos = w.luw_pos();
            let pos = if pos.is_empty() { w.xpos() } else { pos };
            pos.split('-').next().unwrap_or("").to_string()
        };
        let subj_major = luw_major(subj);
        let nominal = matches!(
            subj_major.as_str(),
            "記号" | "名詞" | "代名詞" | "形式名詞" | "形状詞"
        );
        if func.pos1() == "助動詞" && func.lemma() == "だ" && nominal {
            return BunsetuType::Copula;
        }
        match subj_major.as_str() {
            "動詞" | "形容詞" | "形容動詞" => BunsetuType::Yougen,
            _ if nominal => BunsetuType::Taigen,
            _ => BunsetuType::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BunsetuType {
    Copula,
    Yougen,
    Taigen,
    Other,
}

impl BunsetuType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Copula => "コピュラ",
            Self::Yougen => "用言",
            Self::Taigen => "体言",
            Self::Other => "その他",
        }
    }
}
