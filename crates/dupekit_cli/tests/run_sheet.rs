use std::fs;
use std::path::{Path, PathBuf};

use dupekit_cli::{
    EnumNotifyKind, JobDriver, RecordingNotifier, SpecDupeConfig, derive_completion_timestamp,
    run_sheet,
};
use dupekit_io_fs::{
    EnumLocateMode, EnumMarkerPatternMode, MemoryStorage, SpecCopyOptions, SpecLocateOptions,
    TemplateLocator,
};
use dupekit_io_sheet::JobSheet;

fn write_text(path: &Path, txt: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, txt).expect("write");
}

/// `root/TEMPLATE{ a.txt, sub1{ b.txt }, sub2{} }`
fn build_client_root(base: &Path, name: &str) -> PathBuf {
    let root = base.join(name);
    let template = root.join("TEMPLATE - client");
    write_text(&template.join("a.txt"), "alpha");
    write_text(&template.join("sub1").join("b.txt"), "beta");
    fs::create_dir_all(template.join("sub2")).expect("sub2");
    root
}

fn build_config(path_sheet: &Path, rule_locate: EnumLocateMode) -> SpecDupeConfig {
    SpecDupeConfig::new(
        path_sheet.to_path_buf(),
        rule_locate,
        "TEMPLATE",
        EnumMarkerPatternMode::Literal,
    )
    .expect("config")
    .with_workers(Some(2))
}

#[test]
fn run_sheet_copies_pending_rows_and_stamps_them() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root_a = build_client_root(dir.path(), "clients_a");
    let root_b = dir.path().join("clients_b");
    fs::create_dir_all(root_b.join("archive")).expect("archive");

    let path_sheet = dir.path().join("jobs.csv");
    write_text(
        &path_sheet,
        &format!(
            ",{a},ACME\nMon Jan 01 2024 10:00:00 GMT+0000,{a},Old\n,{b},Globex\n",
            a = root_a.display(),
            b = root_b.display()
        ),
    );

    let notifier = RecordingNotifier::new();
    let summary =
        run_sheet(&build_config(&path_sheet, EnumLocateMode::ByNameUnderRoot), &notifier)
            .expect("run");

    assert_eq!(summary.n_completed(), 1);
    assert_eq!(summary.n_failed(), 1);

    let dest = root_a.join("ACME");
    assert_eq!(fs::read_to_string(dest.join("a.txt")).expect("a"), "alpha");
    assert_eq!(
        fs::read_to_string(dest.join("sub1").join("b.txt")).expect("b"),
        "beta"
    );
    assert_eq!(fs::read_dir(dest.join("sub2")).expect("sub2").count(), 0);
    assert!(!root_a.join("Old").exists());
    assert!(!root_b.join("Globex").exists());

    let l_records = notifier.records();
    assert_eq!(l_records.len(), 2);
    assert_eq!(l_records[0].0, EnumNotifyKind::Error);
    assert_eq!(
        l_records[1],
        (
            EnumNotifyKind::Success,
            "1 folder(s) successfully copied!".to_string()
        )
    );

    let sheet = JobSheet::load(&path_sheet).expect("reload");
    assert!(sheet.status_at(1).expect("row 1").is_some_and(|s| s.contains("GMT")));
    assert_eq!(
        sheet.status_at(2).expect("row 2"),
        Some("Mon Jan 01 2024 10:00:00 GMT+0000")
    );
    assert_eq!(sheet.status_at(3).expect("row 3"), None);
}

#[test]
fn rerun_only_retries_unfinished_rows() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = build_client_root(dir.path(), "clients");
    let path_sheet = dir.path().join("jobs.csv");
    write_text(&path_sheet, &format!(",{},ACME\n", root.display()));
    let config = build_config(&path_sheet, EnumLocateMode::ByNameUnderRoot);

    run_sheet(&config, &RecordingNotifier::new()).expect("first run");
    let notifier = RecordingNotifier::new();
    let summary = run_sheet(&config, &notifier).expect("second run");

    assert!(summary.results.is_empty());
    assert_eq!(
        notifier.records(),
        vec![(EnumNotifyKind::NoOp, "No folders were copied.".to_string())]
    );
    let n_children = fs::read_dir(&root).expect("root").count();
    assert_eq!(n_children, 2);
}

#[test]
fn by_identifier_places_copy_beside_template_and_writes_report() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = build_client_root(dir.path(), "clients");
    let template = root.join("TEMPLATE - client");
    let path_sheet = dir.path().join("jobs.csv");
    let path_report = dir.path().join("run.xlsx");
    write_text(&path_sheet, &format!(",{},Initech\n", template.display()));

    let config = build_config(&path_sheet, EnumLocateMode::ByIdentifier)
        .with_report_xlsx(Some(path_report.clone()))
        .expect("report path");
    let summary = run_sheet(&config, &RecordingNotifier::new()).expect("run");

    assert_eq!(summary.n_completed(), 1);
    assert!(root.join("Initech").join("sub1").join("b.txt").is_file());
    let v_bytes = fs::read(&path_report).expect("report");
    assert!(v_bytes.starts_with(b"PK"));
}

#[test]
fn missing_sheet_is_a_run_level_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = build_config(&dir.path().join("absent.csv"), EnumLocateMode::ByNameUnderRoot);

    let notifier = RecordingNotifier::new();
    let err = run_sheet(&config, &notifier).expect_err("missing sheet");
    assert!(format!("{err:#}").contains("failed to load control sheet"));
    assert!(notifier.records().is_empty());
}

#[test]
fn csv_sheet_with_memory_storage_isolates_copy_failure() {
    let storage = MemoryStorage::new();
    let mut l_roots = Vec::new();
    for (name, file_name) in [("a", "a.txt"), ("b", "locked.txt"), ("c", "c.txt")] {
        let root = storage.add_folder(None, name);
        let template = storage.add_folder(Some(&root), "TEMPLATE");
        storage.add_file(&template, file_name, b"x");
        l_roots.push(root);
    }
    storage.reject_file_copy("locked.txt");

    let dir = tempfile::tempdir().expect("tempdir");
    let path_sheet = dir.path().join("jobs.csv");
    write_text(
        &path_sheet,
        &format!(
            ",{},ACME\n,{},Globex\n,{},Initech\n",
            l_roots[0].id(),
            l_roots[1].id(),
            l_roots[2].id()
        ),
    );

    let mut sheet = JobSheet::load(&path_sheet).expect("load");
    let driver = JobDriver::new(
        TemplateLocator::new(&SpecLocateOptions::default()).expect("locator"),
        SpecCopyOptions::default(),
    )
    .with_timestamp_fn(derive_completion_timestamp);
    let notifier = RecordingNotifier::new();
    let summary = driver.run(&mut sheet, &storage, &notifier).expect("run");

    assert_eq!(summary.n_completed(), 2);
    assert_eq!(notifier.count(EnumNotifyKind::Error), 1);
    assert_eq!(
        notifier.records().last().map(|(_, msg)| msg.as_str()),
        Some("2 folder(s) successfully copied!")
    );

    let sheet = JobSheet::load(&path_sheet).expect("reload");
    assert!(sheet.status_at(1).expect("row 1").is_some());
    assert_eq!(sheet.status_at(2).expect("row 2"), None);
    assert!(sheet.status_at(3).expect("row 3").is_some());
    assert_eq!(sheet.pending_jobs().len(), 1);
}
