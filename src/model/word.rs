use std::collections::BTreeMap;
use std::fmt;

/// Number of fields in a UniDic short-unit feature row.
pub const SUW_FIELD_COUNT: usize = 29;
/// Number of fields in a long-unit feature row.
pub const LUW_FIELD_COUNT: usize = 8;

macro_rules! suw_fields {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// Short-unit feature columns, in file order.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum SuwField {
            $($variant),*
        }

        impl SuwField {
            pub const ALL: &'static [SuwField] = &[$(SuwField::$variant),*];

            pub fn name(self) -> &'static str {
                match self {
                    $(SuwField::$variant => $name),*
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(SuwField::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

suw_fields! {
    Pos1 => "pos1",
    Pos2 => "pos2",
    Pos3 => "pos3",
    Pos4 => "pos4",
    CType => "cType",
    CForm => "cForm",
    LForm => "lForm",
    Lemma => "lemma",
    Orth => "orth",
    Pron => "pron",
    OrthBase => "orthBase",
    PronBase => "pronBase",
    Goshu => "goshu",
    IType => "iType",
    IForm => "iForm",
    FType => "fType",
    FForm => "fForm",
    IConType => "iConType",
    FConType => "fConType",
    Type => "type",
    Kana => "kana",
    KanaBase => "kanaBase",
    Form => "form",
    FormBase => "formBase",
    AType => "aType",
    AConType => "aConType",
    AModType => "aModType",
    Lid => "lid",
    LemmaId => "lemma_id",
}

/// Fixed-arity short-unit feature vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Features(Vec<String>);

impl Features {
    /// Pads `fields` to [`SUW_FIELD_COUNT`] with empty strings.
    pub fn new(mut fields: Vec<String>) -> Self {
        if fields.len() < SUW_FIELD_COUNT {
            fields.resize(SUW_FIELD_COUNT, String::new());
        }
        Self(fields)
    }

    pub fn get(&self, field: SuwField) -> &str {
        self.0.get(field as usize).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, field: SuwField, value: impl Into<String>) {
        self.0[field as usize] = value.into();
    }

    pub fn fields(&self) -> &[String] {
        &self.0
    }

    /// All fields joined with commas; the head detector matches on this.
    pub fn joined(&self) -> String {
        self.0.join(",")
    }

    /// Hyphen-joined POS prefix up to the first `*` (at most four fields).
    pub fn xpos(&self) -> String {
        join_pos(&self.0[..4])
    }
}

pub(crate) fn join_pos(fields: &[String]) -> String {
    fields
        .iter()
        .take(4)
        .take_while(|f| !f.is_empty() && f.as_str() != "*")
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("-")
}

/// Long-unit B/I label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LuwLabel {
    B,
    I,
}

impl LuwLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::B => "B",
            Self::I => "I",
        }
    }
}

/// Long-unit attributes shared by every short unit of a long unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongUnit {
    pub form: String,
    /// `l_pos1..l_pos4, l_cType, l_cForm, l_reading, l_lemma`.
    pub fields: Vec<String>,
}

impl LongUnit {
    pub fn new(form: String, mut fields: Vec<String>) -> Self {
        if fields.len() < LUW_FIELD_COUNT {
            fields.resize(LUW_FIELD_COUNT, String::new());
        }
        Self { form, fields }
    }

    pub fn pos(&self) -> String {
        join_pos(&self.fields[..4])
    }

    pub fn ctype(&self) -> &str {
        &self.fields[4]
    }

    pub fn cform(&self) -> &str {
        &self.fields[5]
    }

    pub fn reading(&self) -> &str {
        &self.fields[6]
    }

    pub fn lemma(&self) -> &str {
        &self.fields[7]
    }
}

/// Intermediate role of a word within its bunsetsu after arc lifting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PositionType {
    Root,
    SemHead,
    SynHead,
    Cont,
    Func,
    NoHead,
}

impl PositionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Root => "ROOT",
            Self::SemHead => "SEM_HEAD",
            Self::SynHead => "SYN_HEAD",
            Self::Cont => "CONT",
            Self::Func => "FUNC",
            Self::NoHead => "NO_HEAD",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "ROOT" => Self::Root,
            "SEM_HEAD" => Self::SemHead,
            "SYN_HEAD" => Self::SynHead,
            "CONT" => Self::Cont,
            "FUNC" => Self::Func,
            "NO_HEAD" => Self::NoHead,
            _ => return None,
        })
    }
}

impl fmt::Display for PositionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A short-unit (or, after `build_luw`, long-unit) token.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub surface: String,
    pub features: Features,
    pub luw: Option<LongUnit>,
    pub luw_label: Option<LuwLabel>,
    /// 1-based position within the sentence.
    pub token_pos: usize,
    /// Index of the owning bunsetsu.
    pub bunsetu_pos: usize,
    pub is_subj: bool,
    pub is_func: bool,
    /// 1-based head position, 0 for root.
    pub dep_num: usize,
    pub dep_label: String,
    pub upos: Vec<String>,
    pub ud_feat: BTreeMap<String, String>,
    pub ud_misc: BTreeMap<String, String>,
    pub position_type: Option<PositionType>,
}

impl Word {
    pub fn new(surface: String, features: Features) -> Self {
        Self {
            surface,
            features,
            luw: None,
            luw_label: None,
            token_pos: 0,
            bunsetu_pos: 0,
            is_subj: false,
            is_func: false,
            dep_num: 0,
            dep_label: String::new(),
            upos: Vec::new(),
            ud_feat: BTreeMap::new(),
            ud_misc: BTreeMap::new(),
            position_type: None,
        }
    }

    pub fn xpos(&self) -> String {
        self.features.xpos()
    }

    pub fn pos1(&self) -> &str {
        self.features.get(SuwField::Pos1)
    }

    pub fn pos2(&self) -> &str {
        self.features.get(SuwField::Pos2)
    }

    pub fn lemma(&self) -> &str {
        self.features.get(SuwField::Lemma)
    }

    pub fn orth(&self) -> &str {
        self.features.get(SuwField::Orth)
    }

    pub fn katuyo(&self) -> &str {
        self.features.get(SuwField::CForm)
    }

    pub fn usage(&self) -> &str {
        self.features.get(SuwField::Type)
    }

    /// Long-unit POS, empty when the input carries no long-unit columns.
    pub fn luw_pos(&self) -> String {
        self.luw.as_ref().map(LongUnit::pos).unwrap_or_default()
    }

    pub fn luw_lemma(&self) -> &str {
        self.luw.as_ref().map(LongUnit::lemma).unwrap_or("")
    }

    /// Final UPOS: the last surviving candidate.
    pub fn upos(&self) -> &str {
        self.upos.last().map(String::as_str).unwrap_or("")
    }

    pub fn set_upos(&mut self, upos: &str) {
        self.upos = vec![upos.to_string()];
    }

    pub fn is_open_bracket(&self) -> bool {
        self.xpos() == "補助記号-括弧開"
    }

    pub fn is_close_bracket(&self) -> bool {
        self.xpos() == "補助記号-括弧閉"
    }

    pub fn is_space(&self) -> bool {
        self.pos1() == "空白"
    }

    pub fn space_after(&self) -> bool {
        self.ud_misc.get("SpaceAfter").is_some_and(|v| v == "Yes")
    }

    pub fn set_space_after(&mut self, yes: bool) {
        self.ud_misc.insert(
            "SpaceAfter".to_string(),
            if yes { "Yes" } else { "No" }.to_string(),
        );
    }
}
