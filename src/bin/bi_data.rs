use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use bi_data::app::App;
use bi_data::config::{ConfigLoader, ResolvedConfig, parse_subject_spec};
use bi_data::dataset::Dataset;
use bi_data::domain::{DatasetKind, Selection, SubjectId};
use bi_data::error::BiError;
use bi_data::fetch::ZenodoHttpClient;
use bi_data::output::{ConsoleOutput, JsonOutput, OutputMode};
use bi_data::store::Store;

#[derive(Parser)]
#[command(name = "bi-data")]
#[command(about = "Fetch and inspect the Brain Invaders P300 EEG datasets")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[arg(long, global = true)]
    cache_root: Option<Utf8PathBuf>,

    #[arg(long, global = true, value_enum)]
    dataset: Option<DatasetKind>,

    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Download and extract subjects")]
    Fetch(FetchArgs),
    #[command(about = "List the selected run files of a subject")]
    Runs(SubjectArgs),
    #[command(about = "Load a subject and summarize its recordings")]
    Info(SubjectArgs),
    #[command(about = "List cached archives")]
    List,
    #[command(about = "Remove the dataset's cache directory")]
    Clear,
}

#[derive(Args)]
struct FetchArgs {
    /// Subject numbers or ranges such as `1-7`.
    subjects: Vec<String>,

    #[arg(long)]
    all: bool,
}

#[derive(Args)]
struct SubjectArgs {
    subject: u32,

    #[command(flatten)]
    selection: SelectionArgs,
}

/// Condition flags and type flags each replace their half of the configured
/// selection; a half with no flag given keeps its configured value.
#[derive(Args, Default)]
struct SelectionArgs {
    /// Keep non-adaptive runs (replaces the configured conditions).
    #[arg(long)]
    non_adaptive: bool,

    /// Keep adaptive runs (replaces the configured conditions).
    #[arg(long)]
    adaptive: bool,

    /// Keep training runs (replaces the configured types).
    #[arg(long)]
    training: bool,

    /// Keep online runs (replaces the configured types).
    #[arg(long)]
    online: bool,
}

impl SelectionArgs {
    fn resolve(&self, fallback: Selection) -> Selection {
        fallback.overridden_by(Selection {
            non_adaptive: self.non_adaptive,
            adaptive: self.adaptive,
            training: self.training,
            online: self.online,
        })
    }
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<BiError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &BiError) -> u8 {
    match error {
        BiError::InvalidSubject(_) | BiError::InvalidDataset(_) | BiError::MissingConfig => 2,
        BiError::Http(_) | BiError::HttpStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let config = load_config(cli.config.as_deref())?;
    let store = match cli
        .cache_root
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.cache_root.clone()))
    {
        Some(root) => Store::new_with_root(root),
        None => Store::new()?,
    };
    let kind = cli
        .dataset
        .or_else(|| config.as_ref().map(|c| c.dataset))
        .unwrap_or(DatasetKind::BrainInvaders2013);
    let configured_selection = config
        .as_ref()
        .map(|c| c.selection)
        .unwrap_or_default();

    let selection = match &cli.command {
        Commands::Runs(args) | Commands::Info(args) => args.selection.resolve(configured_selection),
        _ => configured_selection,
    };
    let dataset = Dataset::new(kind, selection, store);
    let app = App::new(dataset, ZenodoHttpClient::new()?);

    match cli.command {
        Commands::Fetch(args) => {
            let subjects = fetch_subjects(&args, config.as_ref())?;
            let result = match output_mode {
                OutputMode::Interactive => {
                    let result = app.fetch(&subjects, &ConsoleOutput);
                    ConsoleOutput::print_fetch(&result);
                    result
                }
                OutputMode::NonInteractive => {
                    let result = app.fetch(&subjects, &JsonOutput);
                    JsonOutput::print(&result).into_diagnostic()?;
                    result
                }
            };
            if result.failures() > 0 {
                return Err(miette::Report::msg(format!(
                    "{} of {} subjects failed",
                    result.failures(),
                    result.items.len()
                )));
            }
            Ok(())
        }
        Commands::Runs(args) => match output_mode {
            OutputMode::Interactive => {
                ConsoleOutput::print_runs(&app.runs(args.subject, &ConsoleOutput)?);
                Ok(())
            }
            OutputMode::NonInteractive => {
                JsonOutput::print(&app.runs(args.subject, &JsonOutput)?).into_diagnostic()
            }
        },
        Commands::Info(args) => match output_mode {
            OutputMode::Interactive => {
                ConsoleOutput::print_info(&app.info(args.subject, &ConsoleOutput)?);
                Ok(())
            }
            OutputMode::NonInteractive => {
                JsonOutput::print(&app.info(args.subject, &JsonOutput)?).into_diagnostic()
            }
        },
        Commands::List => match output_mode {
            OutputMode::Interactive => {
                ConsoleOutput::print_list(&app.list(&ConsoleOutput)?);
                Ok(())
            }
            OutputMode::NonInteractive => {
                JsonOutput::print(&app.list(&JsonOutput)?).into_diagnostic()
            }
        },
        Commands::Clear => match output_mode {
            OutputMode::Interactive => {
                ConsoleOutput::print_clear(&app.clear(&ConsoleOutput)?);
                Ok(())
            }
            OutputMode::NonInteractive => {
                JsonOutput::print(&app.clear(&JsonOutput)?).into_diagnostic()
            }
        },
    }
}

/// An explicit `--config` must load; the implicit `bi-data.json` is optional.
fn load_config(path: Option<&str>) -> Result<Option<ResolvedConfig>, BiError> {
    match ConfigLoader::resolve(path) {
        Ok(config) => Ok(Some(config)),
        Err(BiError::MissingConfig) => Ok(None),
        Err(err) => Err(err),
    }
}

fn fetch_subjects(
    args: &FetchArgs,
    config: Option<&ResolvedConfig>,
) -> Result<Vec<SubjectId>, BiError> {
    if args.all {
        return Ok(SubjectId::all().collect());
    }
    if args.subjects.is_empty() {
        return match config {
            Some(config) if !config.subjects.is_empty() => Ok(config.subjects.clone()),
            _ => Err(BiError::InvalidSubject(
                "no subjects given (pass numbers, a range, --all or a config)".to_string(),
            )),
        };
    }
    let mut subjects = Vec::new();
    for value in &args.subjects {
        subjects.extend(parse_subject_spec(value)?);
    }
    subjects.sort();
    subjects.dedup();
    Ok(subjects)
}
