//! Argument parsing and command dispatch.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use dupekit_io_fs::{EnumLocateMode, EnumMarkerPatternMode, LocalStorage, TemplateLocator};
use dupekit_io_sheet::{JobSheet, write_run_report};

use crate::config::SpecDupeConfig;
use crate::driver::{JobDriver, SpecRunSummary};
use crate::notify::{ConsoleNotifier, EnumNotifyKind, Notifier};
use crate::telemetry::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, init_logging};

#[derive(Debug, Parser)]
#[command(
    name = "dupekit",
    version,
    about = "Duplicate template folder trees listed in a control sheet"
)]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "DUPEKIT_LOG_LEVEL",
        default_value = DEFAULT_LOG_LEVEL
    )]
    log_level: String,
    #[arg(
        long,
        global = true,
        env = "DUPEKIT_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormatArg::Pretty
    )]
    log_format: LogFormatArg,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Copy every pending job and stamp completed rows.
    Run(RunArgs),
    /// List pending jobs without copying anything.
    Pending(PendingArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    #[arg(long, env = "DUPEKIT_SHEET", help = "Control sheet (headerless CSV)")]
    sheet: PathBuf,
    #[arg(long, env = "DUPEKIT_LOCATE", value_enum, default_value_t = LocateArg::ByName)]
    locate: LocateArg,
    #[arg(long, env = "DUPEKIT_MARKER", default_value = "TEMPLATE")]
    marker: String,
    #[arg(
        long,
        env = "DUPEKIT_MARKER_MODE",
        value_enum,
        default_value_t = MarkerModeArg::Literal
    )]
    marker_mode: MarkerModeArg,
    #[arg(
        long,
        env = "DUPEKIT_WORKERS",
        help = "File-copy worker threads (defaults to CPU count, at most 8)"
    )]
    workers: Option<usize>,
    #[arg(long, env = "DUPEKIT_NO_PRESERVE_METADATA")]
    no_preserve_metadata: bool,
    #[arg(long, env = "DUPEKIT_REPORT_XLSX", help = "Write a per-job run report workbook")]
    report_xlsx: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct PendingArgs {
    #[arg(long, env = "DUPEKIT_SHEET")]
    sheet: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LocateArg {
    /// Selector is a root folder holding the marked template.
    ByName,
    /// Selector is the template folder itself.
    ById,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MarkerModeArg {
    Literal,
    Glob,
    Regex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LocateArg> for EnumLocateMode {
    fn from(value: LocateArg) -> Self {
        match value {
            LocateArg::ByName => EnumLocateMode::ByNameUnderRoot,
            LocateArg::ById => EnumLocateMode::ByIdentifier,
        }
    }
}

impl From<MarkerModeArg> for EnumMarkerPatternMode {
    fn from(value: MarkerModeArg) -> Self {
        match value {
            MarkerModeArg::Literal => EnumMarkerPatternMode::Literal,
            MarkerModeArg::Glob => EnumMarkerPatternMode::Glob,
            MarkerModeArg::Regex => EnumMarkerPatternMode::Regex,
        }
    }
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

impl RunArgs {
    fn to_config(&self) -> anyhow::Result<SpecDupeConfig> {
        let config = SpecDupeConfig::new(
            self.sheet.clone(),
            self.locate.into(),
            &self.marker,
            self.marker_mode.into(),
        )?
        .with_workers(self.workers)
        .with_preserve_metadata(!self.no_preserve_metadata)
        .with_report_xlsx(self.report_xlsx.clone())?;
        Ok(config)
    }
}

/// Parses CLI arguments, installs logging and executes the requested command.
/// Returns the process exit code.
pub fn run() -> i32 {
    let cli = Cli::parse();

    if let Err(err) = init_logging(&LoggingConfig {
        level: &cli.log_level,
        format: cli.log_format.into(),
    }) {
        eprintln!("warning: {err:#}");
    }

    let notifier = ConsoleNotifier;
    match dispatch(&cli.command, &notifier) {
        Ok(()) => 0,
        Err(err) => {
            notifier.notify(EnumNotifyKind::Error, &format!("{err:#}"));
            1
        }
    }
}

fn dispatch(command: &Command, notifier: &dyn Notifier) -> anyhow::Result<()> {
    match command {
        Command::Run(args) => {
            let config = args.to_config()?;
            run_sheet(&config, notifier)?;
            Ok(())
        }
        Command::Pending(args) => {
            let sheet = JobSheet::load(&args.sheet).with_context(|| {
                format!("failed to load control sheet {}", args.sheet.display())
            })?;
            for job in sheet.pending_jobs() {
                println!(
                    "{}\t{}\t{}\t{}",
                    job.origin_row,
                    job.source_selector,
                    job.new_name,
                    job.destination_parent.as_deref().unwrap_or("")
                );
            }
            Ok(())
        }
    }
}

/// Run every pending job of the sheet in `config` against the local filesystem.
///
/// Job failures are alerted through `notifier` and do not fail the call.
///
/// # Errors
///
/// Returns an error when the sheet cannot be loaded or saved, or when the run
/// report cannot be written.
pub fn run_sheet(
    config: &SpecDupeConfig,
    notifier: &dyn Notifier,
) -> anyhow::Result<SpecRunSummary> {
    let mut sheet = JobSheet::load(&config.path_sheet).with_context(|| {
        format!(
            "failed to load control sheet {}",
            config.path_sheet.display()
        )
    })?;

    let storage = LocalStorage::new(config.if_preserve_metadata);
    let locator = TemplateLocator::new(&config.locate)?;
    let driver = JobDriver::new(locator, config.copy.clone());

    let summary = driver
        .run(&mut sheet, &storage, notifier)
        .with_context(|| {
            format!(
                "failed to record completion in {}",
                config.path_sheet.display()
            )
        })?;

    if let Some(path_report) = &config.path_report_xlsx {
        write_run_report(path_report, &summary.report_rows())
            .with_context(|| format!("failed to write run report {}", path_report.display()))?;
    }
    Ok(summary)
}
