use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use c2ud_cli::commands::convert_ops::OptionOverrides;
use c2ud_cli::commands::{config_ops, convert_ops};

#[derive(Parser)]
#[command(
    name = "cabocha2ud",
    about = "Convert extended CaboCha bunsetsu dependencies to UD CoNLL-U"
)]
struct Cli {
    /// Log conversion details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct OptionArgs {
    /// Options TOML file; flags given here override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// Comma-separated stages (merge_number, build_luw, merge_sp_to_cabocha,
    /// convert_paren, fixed_newdoc, merge_sp_to_conll, patch_fix,
    /// replace_multi_root)
    #[arg(long)]
    pipeline: Option<String>,
    /// What replace_multi_root does: convert | remove
    #[arg(long)]
    rep_multi_root_mode: Option<String>,
    /// Rendering of whitespace: zenkaku | hankaku
    #[arg(long)]
    space_marker: Option<String>,
    /// Patch YAML for patch_fix
    #[arg(long)]
    patch_file: Option<PathBuf>,
    /// Whitespace database for merge_sp_to_*
    #[arg(long)]
    sp_file: Option<PathBuf>,
    /// Accept whitespace alignments below the similarity threshold
    #[arg(long)]
    best_effort: bool,
    /// Drop malformed sentences with a warning instead of aborting
    #[arg(long)]
    lenient: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Convert an extended CaboCha file
    Convert {
        /// Input file
        base_file: String,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Token granularity: suw | luw
        #[arg(long)]
        word_unit: Option<String>,
        /// Head-detection variant: none | type1 | type2
        #[arg(long)]
        bunsetu_func: Option<String>,
        /// Remove whitespace tokens, recording them as SpaceAfter=Yes
        #[arg(long)]
        skip_space: bool,
        /// UPOS rule YAML replacing the built-in table
        #[arg(long)]
        pos_rule_file: Option<PathBuf>,
        /// DEPREL rule YAML replacing the built-in table
        #[arg(long)]
        dep_rule_file: Option<PathBuf>,
        /// Subject case-pattern TOML replacing the built-in table
        #[arg(long)]
        objcase_rule_file: Option<PathBuf>,
        #[command(flatten)]
        options: OptionArgs,
    },
    /// Run post-stages over an existing CoNLL-U file
    Post {
        /// Input CoNLL-U file
        conllu_file: String,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        #[command(flatten)]
        options: OptionArgs,
    },
    /// Export or validate an options TOML file
    Options {
        #[command(subcommand)]
        action: OptionsAction,
    },
    /// Export or validate rule tables
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },
}

#[derive(Subcommand)]
enum OptionsAction {
    /// Print the default options TOML to stdout
    Export,
    /// Validate an options TOML file
    Validate { file: String },
}

#[derive(Subcommand)]
enum RulesAction {
    /// Print a built-in table (upos | deprel | objcase)
    Export { table: String },
    /// Load replacement tables and report their sizes
    Validate {
        #[arg(long)]
        upos: Option<String>,
        #[arg(long)]
        deprel: Option<String>,
        #[arg(long)]
        objcase: Option<String>,
    },
}

impl OptionArgs {
    fn into_overrides(self) -> OptionOverrides {
        OptionOverrides {
            config: self.config,
            pipeline: self.pipeline,
            multi_root_mode: self.rep_multi_root_mode,
            space_marker: self.space_marker,
            patch_file: self.patch_file,
            sp_file: self.sp_file,
            best_effort: self.best_effort,
            lenient: self.lenient,
            ..OptionOverrides::default()
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "cabocha2ud=debug,c2ud_cli=debug"
    } else {
        "cabocha2ud=warn,c2ud_cli=warn"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Convert {
            base_file,
            output,
            word_unit,
            bunsetu_func,
            skip_space,
            pos_rule_file,
            dep_rule_file,
            objcase_rule_file,
            options,
        } => {
            let overrides = OptionOverrides {
                word_unit,
                bunsetu_func,
                skip_space,
                pos_rule_file,
                dep_rule_file,
                objcase_rule_file,
                ..options.into_overrides()
            };
            convert_ops::convert_cmd(&base_file, output.as_deref(), &overrides)
        }
        Command::Post {
            conllu_file,
            output,
            options,
        } => convert_ops::post_cmd(&conllu_file, output.as_deref(), &options.into_overrides()),
        Command::Options { action } => match action {
            OptionsAction::Export => config_ops::options_export(),
            OptionsAction::Validate { file } => config_ops::options_validate(&file),
        },
        Command::Rules { action } => match action {
            RulesAction::Export { table } => config_ops::rules_export(&table),
            RulesAction::Validate {
                upos,
                deprel,
                objcase,
            } => config_ops::rules_validate(upos.as_deref(), deprel.as_deref(), objcase.as_deref()),
        },
    }
}
