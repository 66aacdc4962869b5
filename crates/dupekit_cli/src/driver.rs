//! Job loop: locate, provision, copy, record completion.

use dupekit_io_fs::{
    DupeError, ReportCopy, SpecCopyOptions, Storage, TemplateLocator, copy_tree,
    provision_destination, resolve_folder,
};
use dupekit_io_sheet::{JobSheet, SheetError, SpecCopyJob, SpecRunReportRow};

use crate::notify::{EnumNotifyKind, Notifier};

pub const C_MSG_LOCATE_FAILED: &str = "There was a problem finding a template to copy.";
pub const C_MSG_PROVISION_FAILED: &str = "There was a problem creating the destination folder.";
pub const C_MSG_COPY_FAILED: &str = "There was a problem copying a folder.";
pub const C_MSG_NOTHING_COPIED: &str = "No folders were copied.";

/// Display form of completion timestamps written into the sheet.
pub const C_FMT_COMPLETION_TIMESTAMP: &str = "%a %b %d %Y %H:%M:%S GMT%z";

////////////////////////////////////////////////////////////////////////////////
// #region JobSeams

/// Supplies the pending jobs of a run.
pub trait JobSource {
    fn pending_jobs(&self) -> Vec<SpecCopyJob>;
}

/// Records finished jobs.
pub trait CompletionSink {
    /// Mark the job that came from `origin_row` as done.
    fn mark_complete(&mut self, origin_row: usize, timestamp: &str) -> Result<(), SheetError>;

    /// Persist marks written so far.
    fn flush(&mut self) -> Result<(), SheetError>;
}

impl JobSource for JobSheet {
    fn pending_jobs(&self) -> Vec<SpecCopyJob> {
        JobSheet::pending_jobs(self)
    }
}

impl CompletionSink for JobSheet {
    fn mark_complete(&mut self, origin_row: usize, timestamp: &str) -> Result<(), SheetError> {
        JobSheet::mark_complete(self, origin_row, timestamp)
    }

    fn flush(&mut self) -> Result<(), SheetError> {
        self.save()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Results

/// Last phase a job reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumJobPhase {
    Locate,
    Provision,
    Copy,
    Done,
}

impl EnumJobPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            EnumJobPhase::Locate => "locate",
            EnumJobPhase::Provision => "provision",
            EnumJobPhase::Copy => "copy",
            EnumJobPhase::Done => "done",
        }
    }

    /// Alert text for a job that stopped in this phase.
    pub fn failure_message(self) -> &'static str {
        match self {
            EnumJobPhase::Locate => C_MSG_LOCATE_FAILED,
            EnumJobPhase::Provision => C_MSG_PROVISION_FAILED,
            EnumJobPhase::Copy => C_MSG_COPY_FAILED,
            EnumJobPhase::Done => "",
        }
    }
}

/// Outcome of one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecJobResult {
    pub job: SpecCopyJob,
    pub phase: EnumJobPhase,
    /// Copy report, present once the engine ran to the end.
    pub report: Option<ReportCopy>,
    pub error: Option<DupeError>,
}

impl SpecJobResult {
    fn failed(job: &SpecCopyJob, phase: EnumJobPhase, error: DupeError) -> Self {
        Self {
            job: job.clone(),
            phase,
            report: None,
            error: Some(error),
        }
    }

    pub fn if_completed(&self) -> bool {
        self.phase == EnumJobPhase::Done
    }

    /// Alert text: phase message followed by the underlying error.
    pub fn message(&self) -> String {
        if self.if_completed() {
            return String::new();
        }
        match (&self.error, &self.report) {
            (Some(err), _) => format!("{} {err}", self.phase.failure_message()),
            (None, Some(report)) => format!(
                "{} Only {}/{} folders were inspected.",
                self.phase.failure_message(),
                report.cnt_inspected,
                report.cnt_expected
            ),
            (None, None) => self.phase.failure_message().to_string(),
        }
    }

    pub fn to_report_row(&self) -> SpecRunReportRow {
        SpecRunReportRow {
            origin_row: self.job.origin_row,
            source_selector: self.job.source_selector.clone(),
            new_name: self.job.new_name.clone(),
            if_completed: self.if_completed(),
            phase: self.phase.as_str().to_string(),
            message: self.message(),
            cnt_folders: self
                .report
                .as_ref()
                .map_or(0, |report| report.cnt_folders_created),
            cnt_files: self
                .report
                .as_ref()
                .map_or(0, |report| report.cnt_files_copied),
        }
    }
}

/// Outcome of a whole run, one entry per attempted job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecRunSummary {
    pub results: Vec<SpecJobResult>,
}

impl SpecRunSummary {
    pub fn n_completed(&self) -> usize {
        self.results.iter().filter(|res| res.if_completed()).count()
    }

    pub fn n_failed(&self) -> usize {
        self.results.len() - self.n_completed()
    }

    /// Closing alert for the run.
    pub fn aggregate(&self) -> (EnumNotifyKind, String) {
        match self.n_completed() {
            0 => (EnumNotifyKind::NoOp, C_MSG_NOTHING_COPIED.to_string()),
            n => (
                EnumNotifyKind::Success,
                format!("{n} folder(s) successfully copied!"),
            ),
        }
    }

    pub fn report_rows(&self) -> Vec<SpecRunReportRow> {
        self.results
            .iter()
            .map(SpecJobResult::to_report_row)
            .collect()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Driver

/// Local time in the sheet's completion-timestamp form.
pub fn derive_completion_timestamp() -> String {
    chrono::Local::now()
        .format(C_FMT_COMPLETION_TIMESTAMP)
        .to_string()
}

/// Runs jobs one after another, isolating failures per job.
#[derive(Debug, Clone)]
pub struct JobDriver {
    locator: TemplateLocator,
    spec_cp_options: SpecCopyOptions,
    fn_timestamp: fn() -> String,
}

impl JobDriver {
    pub fn new(locator: TemplateLocator, spec_cp_options: SpecCopyOptions) -> Self {
        Self {
            locator,
            spec_cp_options,
            fn_timestamp: derive_completion_timestamp,
        }
    }

    /// Replace the completion timestamp source.
    pub fn with_timestamp_fn(mut self, fn_timestamp: fn() -> String) -> Self {
        self.fn_timestamp = fn_timestamp;
        self
    }

    /// Run one job through locate, provision and copy.
    ///
    /// Never retries. The destination is provisioned at most once, and only
    /// after the template was located. An anchor inside the template fails the
    /// job before anything is created.
    pub fn run_job<S: Storage + ?Sized>(
        &self,
        storage: &S,
        job: &SpecCopyJob,
    ) -> SpecJobResult {
        let located = match self.locator.locate(storage, &job.source_selector) {
            Ok(located) => located,
            Err(err) => return SpecJobResult::failed(job, EnumJobPhase::Locate, err),
        };
        let anchor = match &job.destination_parent {
            Some(id) => match resolve_folder(storage, id) {
                Ok(folder) => folder,
                Err(err) => return SpecJobResult::failed(job, EnumJobPhase::Locate, err),
            },
            None => located.anchor,
        };
        if storage.is_within(&anchor, &located.template) {
            let err = DupeError::SourceDestinationOverlap {
                source: located.template.id().to_string(),
                destination: anchor.id().to_string(),
            };
            return SpecJobResult::failed(job, EnumJobPhase::Locate, err);
        }

        let destination = match provision_destination(storage, &anchor, &job.new_name) {
            Ok(folder) => folder,
            Err(err) => return SpecJobResult::failed(job, EnumJobPhase::Provision, err),
        };

        match copy_tree(
            storage,
            &located.template,
            &destination,
            &self.spec_cp_options,
        ) {
            Ok(report) => SpecJobResult {
                job: job.clone(),
                phase: if report.if_complete {
                    EnumJobPhase::Done
                } else {
                    EnumJobPhase::Copy
                },
                report: Some(report),
                error: None,
            },
            Err(err) => SpecJobResult::failed(job, EnumJobPhase::Copy, err),
        }
    }

    /// Run every pending job, then send the closing alert.
    ///
    /// A failed job is alerted once and left unmarked; the run continues with
    /// the next job. Only sink failures end the run early.
    pub fn run<T, S, N>(
        &self,
        jobs: &mut T,
        storage: &S,
        notifier: &N,
    ) -> Result<SpecRunSummary, SheetError>
    where
        T: JobSource + CompletionSink + ?Sized,
        S: Storage + ?Sized,
        N: Notifier + ?Sized,
    {
        let l_jobs = jobs.pending_jobs();
        tracing::info!(jobs = l_jobs.len(), "run started");

        let mut summary = SpecRunSummary::default();
        for job in l_jobs {
            let _span = tracing::info_span!("job", row = job.origin_row).entered();
            let result = self.run_job(storage, &job);

            if result.if_completed() {
                let timestamp = (self.fn_timestamp)();
                jobs.mark_complete(job.origin_row, &timestamp)?;
                jobs.flush()?;
                if let Some(report) = &result.report {
                    tracing::info!(name = %job.new_name, "{report}");
                }
            } else {
                let message = result.message();
                tracing::warn!(phase = result.phase.as_str(), "{message}");
                notifier.notify(EnumNotifyKind::Error, &message);
            }
            summary.results.push(result);
        }

        let (kind, message) = summary.aggregate();
        tracing::info!(
            completed = summary.n_completed(),
            failed = summary.n_failed(),
            "run finished"
        );
        notifier.notify(kind, &message);
        Ok(summary)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{
        C_MSG_COPY_FAILED, C_MSG_LOCATE_FAILED, C_MSG_NOTHING_COPIED, C_MSG_PROVISION_FAILED,
        CompletionSink, EnumJobPhase, JobDriver, JobSource,
    };
    use crate::notify::{EnumNotifyKind, RecordingNotifier};
    use dupekit_io_fs::{
        DupeError, EnumLocateMode, FolderRef, MemoryStorage, SpecCopyOptions, SpecLocateOptions,
        TemplateLocator,
    };
    use dupekit_io_sheet::{SheetError, SpecCopyJob};

    #[derive(Default)]
    struct FakeSheet {
        l_jobs: Vec<SpecCopyJob>,
        l_marks: Vec<(usize, String)>,
        n_flushes: usize,
        if_fail_marks: bool,
    }

    impl FakeSheet {
        fn push(&mut self, selector: &str, name: &str) {
            self.l_jobs.push(SpecCopyJob {
                origin_row: self.l_jobs.len() + 1,
                source_selector: selector.to_string(),
                new_name: name.to_string(),
                destination_parent: None,
            });
        }
    }

    impl JobSource for FakeSheet {
        fn pending_jobs(&self) -> Vec<SpecCopyJob> {
            self.l_jobs.clone()
        }
    }

    impl CompletionSink for FakeSheet {
        fn mark_complete(&mut self, origin_row: usize, timestamp: &str) -> Result<(), SheetError> {
            if self.if_fail_marks {
                return Err(SheetError::Schema("read-only".to_string()));
            }
            self.l_marks.push((origin_row, timestamp.to_string()));
            Ok(())
        }

        fn flush(&mut self) -> Result<(), SheetError> {
            self.n_flushes += 1;
            Ok(())
        }
    }

    fn fixed_timestamp() -> String {
        "Tue Oct 20 2026 09:00:00 GMT+0000".to_string()
    }

    fn derive_driver(rule_locate: EnumLocateMode) -> JobDriver {
        let locator = TemplateLocator::new(&SpecLocateOptions {
            rule_locate,
            ..Default::default()
        })
        .expect("locator");
        JobDriver::new(locator, SpecCopyOptions::default()).with_timestamp_fn(fixed_timestamp)
    }

    /// Root folder holding `TEMPLATE` with one file named `file_name`.
    fn add_client_root(storage: &MemoryStorage, name: &str, file_name: &str) -> FolderRef {
        let root = storage.add_folder(None, name);
        let template = storage.add_folder(Some(&root), "TEMPLATE");
        storage.add_file(&template, file_name, b"x");
        storage.add_folder(Some(&template), "docs");
        root
    }

    #[test]
    fn failed_job_is_isolated_and_others_complete() {
        let storage = MemoryStorage::new();
        let root_a = add_client_root(&storage, "a", "a.txt");
        let root_b = add_client_root(&storage, "b", "broken.txt");
        let root_c = add_client_root(&storage, "c", "c.txt");
        storage.reject_file_copy("broken.txt");

        let mut sheet = FakeSheet::default();
        sheet.push(root_a.id(), "ACME");
        sheet.push(root_b.id(), "Globex");
        sheet.push(root_c.id(), "Initech");

        let notifier = RecordingNotifier::new();
        let summary = derive_driver(EnumLocateMode::ByNameUnderRoot)
            .run(&mut sheet, &storage, &notifier)
            .expect("run");

        assert_eq!(summary.n_completed(), 2);
        assert_eq!(summary.n_failed(), 1);
        assert_eq!(summary.results[1].phase, EnumJobPhase::Copy);
        assert_eq!(
            sheet.l_marks,
            vec![(1, fixed_timestamp()), (3, fixed_timestamp())]
        );
        assert_eq!(sheet.n_flushes, 2);

        let l_records = notifier.records();
        assert_eq!(l_records.len(), 2);
        assert_eq!(l_records[0].0, EnumNotifyKind::Error);
        assert!(l_records[0].1.starts_with(C_MSG_COPY_FAILED));
        assert_eq!(
            l_records[1],
            (
                EnumNotifyKind::Success,
                "2 folder(s) successfully copied!".to_string()
            )
        );

        let dest_a = storage.child_folder(&root_a, "ACME").expect("ACME");
        assert_eq!(storage.file_names(&dest_a), vec!["a.txt".to_string()]);
        assert_eq!(storage.folder_names(&dest_a), vec!["docs".to_string()]);
    }

    #[test]
    fn locate_failure_creates_nothing() {
        let storage = MemoryStorage::new();
        let root = storage.add_folder(None, "clients");
        storage.add_folder(Some(&root), "archive");

        let mut sheet = FakeSheet::default();
        sheet.push(root.id(), "ACME");

        let notifier = RecordingNotifier::new();
        let summary = derive_driver(EnumLocateMode::ByNameUnderRoot)
            .run(&mut sheet, &storage, &notifier)
            .expect("run");

        assert_eq!(summary.results[0].phase, EnumJobPhase::Locate);
        assert!(matches!(
            summary.results[0].error,
            Some(DupeError::Locate { .. })
        ));
        assert!(sheet.l_marks.is_empty());
        assert_eq!(storage.folder_names(&root), vec!["archive".to_string()]);

        let l_records = notifier.records();
        assert_eq!(l_records[0].0, EnumNotifyKind::Error);
        assert!(l_records[0].1.starts_with(C_MSG_LOCATE_FAILED));
        assert_eq!(
            l_records[1],
            (EnumNotifyKind::NoOp, C_MSG_NOTHING_COPIED.to_string())
        );
    }

    #[test]
    fn each_job_provisions_at_most_once() {
        let storage = MemoryStorage::new();
        let root = add_client_root(&storage, "clients", "a.txt");
        let root_broken = add_client_root(&storage, "broken", "bad.txt");
        storage.reject_file_copy("bad.txt");

        let mut sheet = FakeSheet::default();
        sheet.push(root.id(), "ACME");
        sheet.push(root.id(), "ACME");
        sheet.push(root_broken.id(), "Globex");

        let notifier = RecordingNotifier::new();
        derive_driver(EnumLocateMode::ByNameUnderRoot)
            .run(&mut sheet, &storage, &notifier)
            .expect("run");

        assert_eq!(
            storage.folder_names(&root),
            vec![
                "TEMPLATE".to_string(),
                "ACME".to_string(),
                "ACME".to_string()
            ]
        );
        assert_eq!(
            storage.folder_names(&root_broken),
            vec!["TEMPLATE".to_string(), "Globex".to_string()]
        );
    }

    #[test]
    fn by_identifier_anchors_at_parent_or_explicit_destination() {
        let storage = MemoryStorage::new();
        let root = add_client_root(&storage, "clients", "a.txt");
        let template = storage.child_folder(&root, "TEMPLATE").expect("template");
        let outbox = storage.add_folder(None, "outbox");

        let mut sheet = FakeSheet::default();
        sheet.push(template.id(), "ACME");
        sheet.l_jobs.push(SpecCopyJob {
            origin_row: 2,
            source_selector: template.id().to_string(),
            new_name: "Globex".to_string(),
            destination_parent: Some(outbox.id().to_string()),
        });

        let notifier = RecordingNotifier::new();
        let summary = derive_driver(EnumLocateMode::ByIdentifier)
            .run(&mut sheet, &storage, &notifier)
            .expect("run");

        assert_eq!(summary.n_completed(), 2);
        assert!(storage.child_folder(&root, "ACME").is_some());
        assert!(storage.child_folder(&root, "Globex").is_none());
        let dest = storage.child_folder(&outbox, "Globex").expect("Globex");
        assert_eq!(storage.file_names(&dest), vec!["a.txt".to_string()]);
    }

    #[test]
    fn destination_parent_inside_template_leaves_template_untouched() {
        let storage = MemoryStorage::new();
        let root = add_client_root(&storage, "clients", "a.txt");
        let template = storage.child_folder(&root, "TEMPLATE").expect("template");
        let docs = storage.child_folder(&template, "docs").expect("docs");

        let mut sheet = FakeSheet::default();
        for (n_row, parent) in [(1, &template), (2, &docs)] {
            sheet.l_jobs.push(SpecCopyJob {
                origin_row: n_row,
                source_selector: root.id().to_string(),
                new_name: "ACME".to_string(),
                destination_parent: Some(parent.id().to_string()),
            });
        }

        let notifier = RecordingNotifier::new();
        let summary = derive_driver(EnumLocateMode::ByNameUnderRoot)
            .run(&mut sheet, &storage, &notifier)
            .expect("run");

        assert_eq!(summary.n_failed(), 2);
        for result in &summary.results {
            assert_eq!(result.phase, EnumJobPhase::Locate);
            assert!(matches!(
                result.error,
                Some(DupeError::SourceDestinationOverlap { .. })
            ));
        }
        assert_eq!(storage.folder_names(&template), vec!["docs".to_string()]);
        assert!(storage.folder_names(&docs).is_empty());
        assert!(sheet.l_marks.is_empty());
        assert_eq!(notifier.count(EnumNotifyKind::Error), 2);
    }

    #[test]
    fn destination_parent_above_template_is_allowed() {
        let storage = MemoryStorage::new();
        let root = add_client_root(&storage, "clients", "a.txt");

        let mut sheet = FakeSheet::default();
        sheet.l_jobs.push(SpecCopyJob {
            origin_row: 1,
            source_selector: root.id().to_string(),
            new_name: "ACME".to_string(),
            destination_parent: Some(root.id().to_string()),
        });

        let summary = derive_driver(EnumLocateMode::ByNameUnderRoot)
            .run(&mut sheet, &storage, &RecordingNotifier::new())
            .expect("run");

        assert_eq!(summary.n_completed(), 1);
        assert!(storage.child_folder(&root, "ACME").is_some());
    }

    #[test]
    fn blank_name_fails_in_provision_phase() {
        let storage = MemoryStorage::new();
        let root = add_client_root(&storage, "clients", "a.txt");

        let mut sheet = FakeSheet::default();
        sheet.push(root.id(), "");

        let notifier = RecordingNotifier::new();
        let summary = derive_driver(EnumLocateMode::ByNameUnderRoot)
            .run(&mut sheet, &storage, &notifier)
            .expect("run");

        assert_eq!(summary.results[0].phase, EnumJobPhase::Provision);
        assert!(summary.results[0].message().starts_with(C_MSG_PROVISION_FAILED));
        assert_eq!(storage.folder_names(&root), vec!["TEMPLATE".to_string()]);
    }

    #[test]
    fn sink_failure_ends_the_run() {
        let storage = MemoryStorage::new();
        let root = add_client_root(&storage, "clients", "a.txt");

        let mut sheet = FakeSheet {
            if_fail_marks: true,
            ..Default::default()
        };
        sheet.push(root.id(), "ACME");
        sheet.push(root.id(), "Globex");

        let notifier = RecordingNotifier::new();
        let res =
            derive_driver(EnumLocateMode::ByNameUnderRoot).run(&mut sheet, &storage, &notifier);
        assert!(matches!(res, Err(SheetError::Schema(_))));
        assert!(storage.child_folder(&root, "Globex").is_none());
        assert!(notifier.records().is_empty());
    }

    #[test]
    fn report_rows_carry_counts_and_messages() {
        let storage = MemoryStorage::new();
        let root = add_client_root(&storage, "clients", "a.txt");

        let mut sheet = FakeSheet::default();
        sheet.push(root.id(), "ACME");
        sheet.push("folder-999", "Ghost");

        let notifier = RecordingNotifier::new();
        let summary = derive_driver(EnumLocateMode::ByNameUnderRoot)
            .run(&mut sheet, &storage, &notifier)
            .expect("run");

        let l_rows = summary.report_rows();
        assert_eq!(l_rows.len(), 2);
        assert!(l_rows[0].if_completed);
        assert_eq!(l_rows[0].phase, "done");
        assert_eq!(l_rows[0].cnt_folders, 1);
        assert_eq!(l_rows[0].cnt_files, 1);
        assert!(l_rows[0].message.is_empty());
        assert!(!l_rows[1].if_completed);
        assert_eq!(l_rows[1].phase, "locate");
        assert!(l_rows[1].message.starts_with(C_MSG_LOCATE_FAILED));
    }
}
