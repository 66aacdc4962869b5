//! User-visible alerts.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

/// Alert category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumNotifyKind {
    /// A job or the whole run failed.
    Error,
    /// At least one job completed.
    Success,
    /// The run finished without completing any job.
    NoOp,
}

impl EnumNotifyKind {
    /// Short label shown above the alert message.
    pub fn label(self) -> &'static str {
        match self {
            EnumNotifyKind::Error => "😞 Something went wrong",
            EnumNotifyKind::Success => "🏆 Success",
            EnumNotifyKind::NoOp => "Copying Complete",
        }
    }
}

/// Sink for user-visible alerts.
pub trait Notifier {
    fn notify(&self, kind: EnumNotifyKind, message: &str);
}

/// Write one alert block: the label line, then the indented message.
pub fn write_alert<W: Write>(
    writer: &mut W,
    kind: EnumNotifyKind,
    message: &str,
) -> io::Result<()> {
    writeln!(writer, "{}\n  {message}", kind.label())
}

/// Prints alert blocks to stderr. The log subscriber is not involved.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, kind: EnumNotifyKind, message: &str) {
        // A closed stderr leaves nothing to report to.
        let _ = write_alert(&mut io::stderr().lock(), kind, message);
    }
}

/// Collects alerts in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    l_records: Mutex<Vec<(EnumNotifyKind, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All alerts in the order they were sent.
    pub fn records(&self) -> Vec<(EnumNotifyKind, String)> {
        self.l_records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of alerts of one kind.
    pub fn count(&self, kind: EnumNotifyKind) -> usize {
        self.records()
            .iter()
            .filter(|(kind_rec, _)| *kind_rec == kind)
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, kind: EnumNotifyKind, message: &str) {
        self.l_records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((kind, message.to_string()));
    }
}
