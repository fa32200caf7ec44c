//! Conversion options loaded from TOML.
//!
//! - `parse_options_toml(text)` parses and validates a whole options file
//! - `ConvertOptions::default()` matches the embedded `default_options.toml`
//! - Enum-like values are kept as strings in the file and checked here, so a
//!   typo is reported with the offending field name

use std::path::PathBuf;

use serde::Deserialize;

pub const DEFAULT_OPTIONS_TOML: &str = include_str!("default_options.toml");

/// Returns the embedded default options TOML content.
pub fn default_toml() -> &'static str {
    DEFAULT_OPTIONS_TOML
}

#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

macro_rules! named_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub const NAMES: &'static [&'static str] = &[$($text),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }

            pub fn parse(s: &str) -> Option<Self> {
                match s {
                    $($text => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

named_enum!(
    /// Token granularity of the output.
    #[derive(Default)]
    WordUnit { #[default] Suw => "suw", Luw => "luw" }
);

named_enum!(
    /// Head-detection variant. All three currently run the regex detector.
    #[derive(Default)]
    BunsetuFunc { #[default] None => "none", Type1 => "type1", Type2 => "type2" }
);

named_enum!(
    /// Rendering of whitespace in `# text` and of space tokens.
    #[derive(Default)]
    SpaceMarker { #[default] Zenkaku => "zenkaku", Hankaku => "hankaku" }
);

named_enum!(
    /// What `replace_multi_root` does with a sentence that has several roots.
    #[derive(Default)]
    MultiRootMode { #[default] Convert => "convert", Remove => "remove" }
);

named_enum!(
    /// Optional pipeline stages. The first three run on the CaboCha model
    /// before head detection, the rest on CoNLL-U output.
    Stage {
        MergeNumber => "merge_number",
        BuildLuw => "build_luw",
        MergeSpToCabocha => "merge_sp_to_cabocha",
        ConvertParen => "convert_paren",
        FixedNewdoc => "fixed_newdoc",
        MergeSpToConll => "merge_sp_to_conll",
        PatchFix => "patch_fix",
        ReplaceMultiRoot => "replace_multi_root",
    }
);

impl Stage {
    pub fn is_pre(self) -> bool {
        matches!(self, Self::MergeNumber | Self::BuildLuw | Self::MergeSpToCabocha)
    }
}

/// Optional replacement tables and side inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileOptions {
    pub upos_rules: Option<PathBuf>,
    pub deprel_rules: Option<PathBuf>,
    pub objcase_rules: Option<PathBuf>,
    pub patch: Option<PathBuf>,
    pub space_db: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    pub word_unit: WordUnit,
    pub bunsetu_func: BunsetuFunc,
    pub skip_space: bool,
    pub space_marker: SpaceMarker,
    pub strict: bool,
    pub stages: Vec<Stage>,
    pub multi_root_mode: MultiRootMode,
    pub best_effort_alignment: bool,
    pub files: FileOptions,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            word_unit: WordUnit::default(),
            bunsetu_func: BunsetuFunc::default(),
            skip_space: false,
            space_marker: SpaceMarker::default(),
            strict: true,
            stages: Vec::new(),
            multi_root_mode: MultiRootMode::default(),
            best_effort_alignment: false,
            files: FileOptions::default(),
        }
    }
}

impl ConvertOptions {
    /// Pre-stages in the order given; `build_luw` is added when the word
    /// unit is `luw`.
    pub fn pre_stages(&self) -> Vec<Stage> {
        let mut stages: Vec<Stage> = self.stages.iter().copied().filter(|s| s.is_pre()).collect();
        if self.word_unit == WordUnit::Luw && !stages.contains(&Stage::BuildLuw) {
            stages.push(Stage::BuildLuw);
        }
        stages
    }

    pub fn post_stages(&self) -> Vec<Stage> {
        self.stages.iter().copied().filter(|s| !s.is_pre()).collect()
    }

    pub fn has_stage(&self, stage: Stage) -> bool {
        self.stages.contains(&stage) || (stage == Stage::BuildLuw && self.word_unit == WordUnit::Luw)
    }

    /// Parses a comma-separated stage list (`--pipeline`).
    pub fn set_stages(&mut self, list: &str) -> Result<(), OptionsError> {
        self.stages = parse_stages(list.split(',').map(str::trim).filter(|s| !s.is_empty()))?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConvert {
    word_unit: String,
    bunsetu_func: String,
    skip_space: bool,
    space_marker: String,
    strict: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPipeline {
    #[serde(default)]
    stages: Vec<String>,
    multi_root_mode: String,
    #[serde(default)]
    best_effort_alignment: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOptions {
    convert: RawConvert,
    pipeline: RawPipeline,
    #[serde(default)]
    files: FileOptions,
}

fn parse_stages<'a>(names: impl Iterator<Item = &'a str>) -> Result<Vec<Stage>, OptionsError> {
    let mut stages = Vec::new();
    for name in names {
        let stage = Stage::parse(name).ok_or_else(|| OptionsError::InvalidValue {
            field: "pipeline.stages".to_string(),
            reason: format!("unknown stage {name:?}, expected one of {}", Stage::NAMES.join(", ")),
        })?;
        if !stages.contains(&stage) {
            stages.push(stage);
        }
    }
    Ok(stages)
}

pub fn parse_options_toml(toml_str: &str) -> Result<ConvertOptions, OptionsError> {
    let raw: RawOptions =
        toml::from_str(toml_str).map_err(|e| OptionsError::Parse(e.to_string()))?;

    macro_rules! check_choice {
        ($ty:ident, $section:ident . $field:ident) => {
            $ty::parse(&raw.$section.$field).ok_or_else(|| OptionsError::InvalidValue {
                field: concat!(stringify!($section), ".", stringify!($field)).to_string(),
                reason: format!(
                    "unknown value {:?}, expected one of {}",
                    raw.$section.$field,
                    $ty::NAMES.join(", ")
                ),
            })?
        };
    }

    let word_unit = check_choice!(WordUnit, convert.word_unit);
    let bunsetu_func = check_choice!(BunsetuFunc, convert.bunsetu_func);
    let space_marker = check_choice!(SpaceMarker, convert.space_marker);
    let multi_root_mode = check_choice!(MultiRootMode, pipeline.multi_root_mode);
    let stages = parse_stages(raw.pipeline.stages.iter().map(String::as_str))?;

    Ok(ConvertOptions {
        word_unit,
        bunsetu_func,
        skip_space: raw.convert.skip_space,
        space_marker,
        strict: raw.convert.strict,
        stages,
        multi_root_mode,
        best_effort_alignment: raw.pipeline.best_effort_alignment,
        files: raw.files,
    })
}
