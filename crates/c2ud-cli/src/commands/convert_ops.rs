use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use tracing::info;

use cabocha2ud::settings::{
    parse_options_toml, BunsetuFunc, MultiRootMode, OptionsError, SpaceMarker, WordUnit,
};
use cabocha2ud::ud::{parse_conllu, write_conllu};
use cabocha2ud::{ConvertOptions, Converter};

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Options(#[from] OptionsError),
}

/// Command-line values that override the options file. `None` keeps the
/// file (or built-in) value.
#[derive(Debug, Default, Clone)]
pub struct OptionOverrides {
    pub config: Option<PathBuf>,
    pub word_unit: Option<String>,
    pub bunsetu_func: Option<String>,
    pub skip_space: bool,
    pub space_marker: Option<String>,
    pub pipeline: Option<String>,
    pub multi_root_mode: Option<String>,
    pub lenient: bool,
    pub best_effort: bool,
    pub patch_file: Option<PathBuf>,
    pub sp_file: Option<PathBuf>,
    pub pos_rule_file: Option<PathBuf>,
    pub dep_rule_file: Option<PathBuf>,
    pub objcase_rule_file: Option<PathBuf>,
}

fn choice<T>(
    value: &Option<String>,
    field: &str,
    parse: fn(&str) -> Option<T>,
    names: &[&str],
) -> Result<Option<T>, OptionsError> {
    let Some(v) = value else { return Ok(None) };
    parse(v).map(Some).ok_or_else(|| OptionsError::InvalidValue {
        field: field.to_string(),
        reason: format!("unknown value {v:?}, expected one of {}", names.join(", ")),
    })
}

/// Options file (if any) with the command-line flags applied on top.
pub fn resolve_options(o: &OptionOverrides) -> Result<ConvertOptions, CliError> {
    let mut options = match &o.config {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|source| CliError::Read {
                path: path.clone(),
                source,
            })?;
            parse_options_toml(&text)?
        }
        None => ConvertOptions::default(),
    };

    if let Some(v) = choice(&o.word_unit, "--word-unit", WordUnit::parse, WordUnit::NAMES)? {
        options.word_unit = v;
    }
    if let Some(v) = choice(&o.bunsetu_func, "--bunsetu-func", BunsetuFunc::parse, BunsetuFunc::NAMES)? {
        options.bunsetu_func = v;
    }
    if let Some(v) = choice(&o.space_marker, "--space-marker", SpaceMarker::parse, SpaceMarker::NAMES)? {
        options.space_marker = v;
    }
    if let Some(v) = choice(
        &o.multi_root_mode,
        "--rep-multi-root-mode",
        MultiRootMode::parse,
        MultiRootMode::NAMES,
    )? {
        options.multi_root_mode = v;
    }
    if let Some(list) = &o.pipeline {
        options.set_stages(list)?;
    }
    options.skip_space |= o.skip_space;
    options.best_effort_alignment |= o.best_effort;
    if o.lenient {
        options.strict = false;
    }

    let files = &mut options.files;
    for (slot, given) in [
        (&mut files.patch, &o.patch_file),
        (&mut files.space_db, &o.sp_file),
        (&mut files.upos_rules, &o.pos_rule_file),
        (&mut files.deprel_rules, &o.dep_rule_file),
        (&mut files.objcase_rules, &o.objcase_rule_file),
    ] {
        if given.is_some() {
            slot.clone_from(given);
        }
    }
    Ok(options)
}

fn open_output(output: Option<&str>) -> Box<dyn Write> {
    match output {
        Some(path) => Box::new(BufWriter::new(die!(
            File::create(path),
            "Error creating {path}: {}"
        ))),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    }
}

/// `convert`: extended CaboCha in, CoNLL-U out.
pub fn convert_cmd(base_file: &str, output: Option<&str>, overrides: &OptionOverrides) {
    let options = die!(resolve_options(overrides), "Error: {}");
    let mut converter = die!(Converter::from_options(options), "Error loading rules: {}");
    let file = die!(File::open(base_file), "Error opening {base_file}: {}");
    let source_name = Path::new(base_file)
        .file_stem()
        .map_or_else(|| base_file.to_string(), |s| s.to_string_lossy().into_owned());

    let mut out = open_output(output);
    let stats = die!(
        converter.convert_stream(BufReader::new(file), &source_name, &mut out),
        "Error converting {base_file}: {}"
    );
    die!(out.flush(), "Error writing output: {}");
    info!(
        documents = stats.documents,
        sentences = stats.sentences,
        dropped = stats.dropped,
        "done"
    );
}

/// `post`: runs the post-stages over an existing CoNLL-U file.
pub fn post_cmd(conllu_file: &str, output: Option<&str>, overrides: &OptionOverrides) {
    let options = die!(resolve_options(overrides), "Error: {}");
    let mut converter = die!(Converter::from_options(options), "Error loading rules: {}");
    let file = die!(File::open(conllu_file), "Error opening {conllu_file}: {}");
    let sentences = die!(
        parse_conllu(BufReader::new(file)),
        "Error reading {conllu_file}: {}"
    );
    let sentences = die!(
        converter.post_process(sentences),
        "Error processing {conllu_file}: {}"
    );
    let mut out = open_output(output);
    die!(write_conllu(&mut out, &sentences), "Error writing output: {}");
    die!(out.flush(), "Error writing output: {}");
    info!(sentences = sentences.len(), dropped = converter.stats().dropped, "done");
}

#[cfg(test)]
mod tests {
    use super::*;
    use cabocha2ud::settings::Stage;

    #[test]
    fn test_flags_override_config_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            "{}",
            cabocha2ud::settings::default_toml().replace("skip_space = false", "skip_space = true")
        )
        .unwrap();
        let o = OptionOverrides {
            config: Some(f.path().to_path_buf()),
            space_marker: Some("hankaku".to_string()),
            pipeline: Some("convert_paren, replace_multi_root".to_string()),
            lenient: true,
            ..OptionOverrides::default()
        };
        let options = resolve_options(&o).unwrap();
        assert!(options.skip_space);
        assert!(!options.strict);
        assert_eq!(options.space_marker, SpaceMarker::Hankaku);
        assert_eq!(options.stages, vec![Stage::ConvertParen, Stage::ReplaceMultiRoot]);
    }

    #[test]
    fn test_unknown_flag_value() {
        let o = OptionOverrides {
            word_unit: Some("mwu".to_string()),
            ..OptionOverrides::default()
        };
        let err = resolve_options(&o).unwrap_err();
        assert!(err.to_string().contains("--word-unit"), "{err}");
    }

    #[test]
    fn test_rule_files_replace_defaults() {
        let o = OptionOverrides {
            pos_rule_file: Some(PathBuf::from("upos.yaml")),
            ..OptionOverrides::default()
        };
        let options = resolve_options(&o).unwrap();
        assert_eq!(options.files.upos_rules, Some(PathBuf::from("upos.yaml")));
        assert_eq!(options.files.deprel_rules, None);
    }
}
