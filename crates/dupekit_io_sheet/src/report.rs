//! Run-report workbook: one row per attempted job.

use std::path::Path;

use polars::prelude::{Column, DataFrame};

use crate::conf::{C_SHEET_NAME_RUN_REPORT, derive_default_xlsx_formats};
use crate::spec::{SheetError, SpecRunReportRow};
use crate::writer::XlsxWriter;

/// Build the run-report table.
pub fn derive_run_report_dataframe(rows: &[SpecRunReportRow]) -> Result<DataFrame, SheetError> {
    let df = DataFrame::new(vec![
        Column::new(
            "row".into(),
            rows.iter()
                .map(|row| row.origin_row as u64)
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "source selector".into(),
            rows.iter()
                .map(|row| row.source_selector.as_str())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "new name".into(),
            rows.iter()
                .map(|row| row.new_name.as_str())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "completed".into(),
            rows.iter()
                .map(|row| if row.if_completed { "yes" } else { "no" })
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "phase".into(),
            rows.iter()
                .map(|row| row.phase.as_str())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "message".into(),
            rows.iter()
                .map(|row| row.message.as_str())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "folders".into(),
            rows.iter().map(|row| row.cnt_folders).collect::<Vec<_>>(),
        ),
        Column::new(
            "files".into(),
            rows.iter().map(|row| row.cnt_files).collect::<Vec<_>>(),
        ),
    ])?;
    Ok(df)
}

/// Write the run report to `path_file_out` as a single-sheet workbook.
pub fn write_run_report(
    path_file_out: impl AsRef<Path>,
    rows: &[SpecRunReportRow],
) -> Result<(), SheetError> {
    let df = derive_run_report_dataframe(rows)?;
    let dict_fmt = derive_default_xlsx_formats();
    let derive_fmt = |key: &str| dict_fmt.get(key).cloned().unwrap_or_default();

    let mut writer = XlsxWriter::new(
        path_file_out.as_ref().to_path_buf(),
        derive_fmt("text"),
        derive_fmt("integer"),
        derive_fmt("header"),
    );
    writer.write_sheet(&df, C_SHEET_NAME_RUN_REPORT)?;
    let c_path_out = writer.file_out();
    writer.close()?;

    tracing::info!(report = %c_path_out, rows = rows.len(), "run report written");
    Ok(())
}
