//! Control-sheet/XLSX constants and default preset factories.

use std::collections::BTreeMap;

use crate::spec::SpecCellFormat;

/// Zero-based column holding the completion status/timestamp.
pub const N_COL_STATUS: usize = 0;
/// Zero-based column holding the source selector (root or template identifier).
pub const N_COL_SELECTOR: usize = 1;
/// Zero-based column holding the new folder name.
pub const N_COL_NAME: usize = 2;
/// Zero-based optional column holding an explicit destination parent.
pub const N_COL_DESTINATION: usize = 3;
/// Minimum number of columns a control sheet must have.
pub const N_NCOLS_SHEET_MIN: usize = 3;

/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Autofit bounds for run-report columns, in character width units.
pub const N_WIDTH_CELL_MIN: usize = 8;
pub const N_WIDTH_CELL_MAX: usize = 60;
pub const N_WIDTH_CELL_PADDING: usize = 2;
/// Body rows inspected when sizing columns.
pub const N_ROWS_AUTOFIT_MAX: usize = 20_000;

/// Default sheet name of the run-report workbook.
pub const C_SHEET_NAME_RUN_REPORT: &str = "Run";

/// Build default named format presets used by [`crate::writer::XlsxWriter`].
pub fn derive_default_xlsx_formats() -> BTreeMap<String, SpecCellFormat> {
    let cfg_base_fmt_spec = SpecCellFormat {
        font_name: Some("Calibri".to_string()),
        font_size: Some(11),
        border: Some(1),
        align: Some("left".to_string()),
        valign: Some("vcenter".to_string()),
        ..Default::default()
    };

    let mut dict_fmt = BTreeMap::new();
    dict_fmt.insert("text".to_string(), cfg_base_fmt_spec.clone());
    dict_fmt.insert(
        "header".to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            bold: Some(true),
            align: Some("center".to_string()),
            bg_color: Some("#D9E1F2".to_string()),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        "integer".to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            num_format: Some("0".to_string()),
            align: Some("right".to_string()),
            ..Default::default()
        }),
    );

    dict_fmt
}
