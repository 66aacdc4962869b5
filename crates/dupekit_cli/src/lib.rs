//! `dupekit_cli` v1:
//! Control-sheet driven template folder duplication.
//!
//! Layout:
//! - `cli.rs`: argument parsing and command dispatch
//! - `config.rs`: validated run configuration
//! - `driver.rs`: per-job locate/provision/copy loop and run summary
//! - `notify.rs`: user-visible alerts
//! - `telemetry.rs`: tracing subscriber setup
//! - `main.rs`: thin entrypoint delegating to `run()`

pub(crate) mod cli;
pub mod config;
pub mod driver;
pub mod notify;
pub mod telemetry;

pub use cli::{run, run_sheet};
pub use config::{ConfigError, SpecDupeConfig};
pub use driver::{
    CompletionSink, EnumJobPhase, JobDriver, JobSource, SpecJobResult, SpecRunSummary,
    derive_completion_timestamp,
};
pub use notify::{ConsoleNotifier, EnumNotifyKind, Notifier, RecordingNotifier, write_alert};
