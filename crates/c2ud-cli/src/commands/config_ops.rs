use std::fs;
use std::path::Path;
use std::process;

use cabocha2ud::RuleSet;

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

pub fn options_export() {
    print!("{}", cabocha2ud::settings::default_toml());
}

pub fn options_validate(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    let o = die!(cabocha2ud::parse_options_toml(&content), "Error: {}");
    let stages: Vec<&str> = o.stages.iter().map(|s| s.as_str()).collect();
    println!(
        "OK: convert.word_unit={}, convert.strict={}, pipeline.stages=[{}]",
        o.word_unit.as_str(),
        o.strict,
        stages.join(", ")
    );
}

/// Prints one of the embedded rule tables.
pub fn rules_export(table: &str) {
    let text = match table {
        "upos" => cabocha2ud::rules::DEFAULT_UPOS_YAML,
        "deprel" => cabocha2ud::rules::DEFAULT_DEPREL_YAML,
        "objcase" => cabocha2ud::rules::DEFAULT_OBJCASE_TOML,
        other => {
            eprintln!("Error: unknown table {other:?}, expected upos, deprel or objcase");
            process::exit(1);
        }
    };
    print!("{text}");
}

/// Loads replacement rule tables the way `convert` would and reports their
/// sizes.
pub fn rules_validate(upos: Option<&str>, deprel: Option<&str>, objcase: Option<&str>) {
    let rules = die!(
        RuleSet::load(upos.map(Path::new), deprel.map(Path::new), objcase.map(Path::new)),
        "Error: {}"
    );
    println!(
        "OK: {} UPOS rules, {} DEPREL rules, {} case patterns",
        rules.upos.len(),
        rules.deprel.len(),
        rules.objcase.len()
    );
}
