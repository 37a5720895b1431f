use clap::{ArgAction, Parser, ValueEnum};
use linkmirror_io_fs::{EnumMirrorPatternMode, SpecMirrorOptions, mirror_tree};
use std::path::PathBuf;
use std::process::ExitCode;

const DEFAULT_SOURCE_DIR: &str = "hazel";
const DEFAULT_DESTINATION_DIR: &str = "HazelInternalTests";

#[derive(Parser, Debug)]
#[command(
    name = "linkmirror",
    version,
    about = "Mirror the Hazel sources into a test tree with linkage keywords stripped"
)]
struct Cli {
    #[arg(long, help = "Repository root holding the source tree [default: current dir]")]
    root: Option<PathBuf>,
    #[arg(long, help = "Source tree [default: <root>/hazel]")]
    source: Option<PathBuf>,
    #[arg(long, help = "Destination tree [default: <root>/HazelInternalTests]")]
    destination: Option<PathBuf>,
    #[arg(
        long = "policy-dir",
        value_name = "SUFFIX",
        help = "Directory path suffix whose files get linkage stripping (repeatable)"
    )]
    policy_dirs: Vec<String>,
    #[arg(
        long = "exclude-dir",
        value_name = "PATTERN",
        help = "Additional directory name pattern never descended into (repeatable); \
                .git, .hg and .svn are always skipped"
    )]
    exclude_dirs: Vec<String>,
    #[arg(
        long = "exclude-file",
        value_name = "PATTERN",
        help = "Additional file name pattern to leave out (repeatable)"
    )]
    exclude_files: Vec<String>,
    #[arg(long, value_enum, default_value_t = PatternMode::Glob)]
    pattern_mode: PatternMode,
    #[arg(long, default_value_t = false, help = "Report what would be written without writing")]
    dry_run: bool,
    #[arg(
        short,
        long,
        default_value_t = false,
        help = "Only print warnings and the summary; hides the per-file lines"
    )]
    quiet: bool,
    #[arg(short, long, action = ArgAction::Count, help = "Increase log verbosity")]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PatternMode {
    Glob,
    Regex,
    Literal,
}

impl From<PatternMode> for EnumMirrorPatternMode {
    fn from(value: PatternMode) -> Self {
        match value {
            PatternMode::Glob => Self::Glob,
            PatternMode::Regex => Self::Regex,
            PatternMode::Literal => Self::Literal,
        }
    }
}

impl Cli {
    fn log_level(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (true, _) => "warn",
            (false, 0) => "info",
            (false, 1) => "debug",
            (false, _) => "trace",
        }
    }

    fn paths(&self) -> (PathBuf, PathBuf) {
        let root = self.root.clone().unwrap_or_else(|| PathBuf::from("."));
        let source = self
            .source
            .clone()
            .unwrap_or_else(|| root.join(DEFAULT_SOURCE_DIR));
        let destination = self
            .destination
            .clone()
            .unwrap_or_else(|| root.join(DEFAULT_DESTINATION_DIR));
        (source, destination)
    }

    fn options(&self) -> SpecMirrorOptions {
        let mut spec_mr_options = SpecMirrorOptions {
            rule_pattern: self.pattern_mode.into(),
            if_dry_run: self.dry_run,
            ..SpecMirrorOptions::default()
        };
        if !self.policy_dirs.is_empty() {
            spec_mr_options.suffixes_policy_dirs = self.policy_dirs.clone();
        }
        if !self.exclude_dirs.is_empty() {
            spec_mr_options.patterns_exclude_dirs = Some(self.exclude_dirs.clone());
        }
        if !self.exclude_files.is_empty() {
            spec_mr_options.patterns_exclude_files = Some(self.exclude_files.clone());
        }
        spec_mr_options
    }
}

fn init_logger(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.log_level());

    let (source, destination) = cli.paths();
    let spec_mr_options = cli.options();
    let label = spec_mr_options.spec_rewrite.display_name.clone();

    match mirror_tree(&source, &destination, spec_mr_options) {
        Ok(report) => {
            if cli.dry_run {
                println!(
                    "\nDry run: would copy {} source files from {label}.",
                    report.records.len()
                );
            } else {
                println!("\nCopied {} source files from {label}.", report.cnt_copied);
            }
            if cli.verbose > 0 {
                println!("{report}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
