use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use mdaccess::config::Config;
use mdaccess::error::Error;
use mdaccess::judge::{self, OpenAiJudge};
use mdaccess::{diagnostics, diff, markdown, report, review};

#[derive(Parser)]
#[command(name = "mdaccess", version, about = "Accessibility review for markdown changes in unified diffs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file to use instead of ./.mdaccess.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,
}

/// Flags shared by the commands that call the judge.
#[derive(clap::Args)]
struct JudgeArgs {
    /// API key for the judge endpoint
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model name (overrides config)
    #[arg(long)]
    model: Option<String>,

    /// Custom accessibility rules file (overrides config)
    #[arg(long)]
    rules: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the added markdown lines of a diff as JSON
    Changes {
        /// Unified diff file
        diff: PathBuf,
    },
    /// Review a single markdown document
    Document {
        /// Markdown file
        file: PathBuf,

        #[command(flatten)]
        judge: JudgeArgs,

        /// Write the report here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Review every markdown file changed by a diff and write one report
    Review {
        /// Unified diff file
        diff: PathBuf,

        /// Report format
        #[arg(long, default_value = "markdown")]
        format: FormatArg,

        #[command(flatten)]
        judge: JudgeArgs,

        /// Report path (overrides config)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the extracted structure of a markdown document as JSON
    Structure {
        /// Markdown file
        file: PathBuf,
    },
}

/// Report format CLI argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Structured JSON
    Json,
    /// Human-readable markdown
    Markdown,
}

fn init_logging(verbose: bool) {
    let filter = if verbose { EnvFilter::new("mdaccess=debug") } else { EnvFilter::new("mdaccess=warn") };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::FAILURE
        },
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    let mut config = match &cli.config {
        Some(path) => Config::load_file(path)?,
        None => Config::load(Path::new("."))?,
    };

    match cli.command {
        Commands::Changes { diff: diff_path } => {
            let changes = diff::parse(&read_input(&diff_path)?);
            println!("{}", serde_json::to_string_pretty(&changes)?);
        },
        Commands::Structure { file } => {
            let structure = markdown::extract(&read_input(&file)?);
            println!("{}", serde_json::to_string_pretty(&structure)?);
        },
        Commands::Review { diff: diff_path, format, judge, output } => {
            let api_key = apply_judge_args(&mut config, judge);
            let output = output.unwrap_or_else(|| config.output.clone());
            cmd_review(&config, api_key, &diff_path, format, &output)?;
        },
        Commands::Document { file, judge, output } => {
            let api_key = apply_judge_args(&mut config, judge);
            cmd_document(&config, api_key, &file, output.as_deref())?;
        },
    }

    Ok(())
}

/// Fold CLI overrides into the config and hand back the API key.
fn apply_judge_args(config: &mut Config, args: JudgeArgs) -> Option<String> {
    if let Some(model) = args.model {
        config.model = model;
    }
    if args.rules.is_some() {
        config.rules = args.rules;
    }
    args.api_key
}

/// Parse the diff, review each markdown file, and write the aggregate report.
///
/// # Errors
///
/// Returns errors reading the diff or rules, or writing the report. Per-file
/// review failures end up in the report instead.
fn cmd_review(
    config: &Config,
    api_key: Option<String>,
    diff_path: &Path,
    format: FormatArg,
    output: &Path,
) -> Result<(), Error> {
    let changes = diff::parse(&read_input(diff_path)?);
    info!(files = changes.len(), "markdown files changed");

    let rules = read_rules(config)?;
    let judge = OpenAiJudge::new(config.judge_config(api_key));
    let outcome = review::review_changes(&judge, &changes, rules.as_deref(), config.review_settings());

    let rendered = match format {
        FormatArg::Json => report::aggregate_json(&outcome.reviews, &outcome.failures)?,
        FormatArg::Markdown => report::aggregate(&outcome.reviews, &outcome.failures),
    };
    std::fs::write(output, rendered)?;

    println!(
        "Reviewed {} files ({} failed), report written to {}",
        outcome.reviews.len(),
        outcome.failures.len(),
        output.display()
    );
    Ok(())
}

/// Review one markdown document and print or write its report.
///
/// # Errors
///
/// Returns errors reading inputs, from the judge, or writing the report.
fn cmd_document(
    config: &Config,
    api_key: Option<String>,
    file: &Path,
    output: Option<&Path>,
) -> Result<(), Error> {
    let text = read_input(file)?;
    let rules = read_rules(config)?;
    let judge = OpenAiJudge::new(config.judge_config(api_key));
    info!(model = judge.model(), file = %file.display(), "reviewing document");

    let result = judge::review_document(&judge, &text, rules.as_deref(), config.review_settings())?;
    let rendered = report::render_document_report(&result);

    match output {
        Some(path) => {
            std::fs::write(path, rendered)?;
            println!("Score {}/100, report written to {}", result.score, path.display());
        },
        None => print!("{rendered}"),
    }
    Ok(())
}

/// Read the configured rules file, if any.
///
/// # Errors
///
/// Returns `Error::FileNotFound` if the configured file is missing.
fn read_rules(config: &Config) -> Result<Option<String>, Error> {
    return config.rules.as_deref().map(read_input).transpose();
}

/// Read a UTF-8 input file.
///
/// # Errors
///
/// Returns `Error::FileNotFound` if the file is missing, `Error::Io` otherwise.
fn read_input(path: &Path) -> Result<String, Error> {
    return match std::fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(Error::FileNotFound { path: path.to_path_buf() })
        },
        Err(e) => Err(Error::Io(e)),
    };
}
