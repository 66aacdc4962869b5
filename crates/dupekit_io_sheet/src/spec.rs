//! Shared control-sheet and workbook specification models.

use std::fmt;

use polars::prelude::PolarsError;
use rust_xlsxwriter::XlsxError;

////////////////////////////////////////////////////////////////////////////////
// #region JobSpecification

/// One pending row of the control sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecCopyJob {
    /// 1-based row number in the sheet, used to write the completion mark back.
    pub origin_row: usize,
    /// Root folder (by-name mode) or template folder (by-id mode) identifier.
    pub source_selector: String,
    /// Name of the destination folder to create.
    pub new_name: String,
    /// Explicit destination parent, overriding the located anchor.
    pub destination_parent: Option<String>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification used by [`crate::writer::XlsxWriter`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Border style for all sides.
    pub border: Option<i64>,

    /// Number format code.
    pub num_format: Option<String>,
    /// Background fill color.
    pub bg_color: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
        }
    }
}

/// Normalized cell value during conversion/write pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Text value.
    String(String),
    /// Integer value, written as a number.
    Integer(i64),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// One attempted job as it appears in the run-report workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecRunReportRow {
    /// 1-based control-sheet row.
    pub origin_row: usize,
    pub source_selector: String,
    pub new_name: String,
    pub if_completed: bool,
    /// Phase reached (`locate`, `provision`, `copy`, `done`).
    pub phase: String,
    /// Failure message, empty on success.
    pub message: String,
    pub cnt_folders: u64,
    pub cnt_files: u64,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ErrorSpecification

/// Errors raised while loading, updating, saving, or reporting a sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetError {
    /// Filesystem failure on the sheet or report path.
    Io { path: String, message: String },
    /// CSV parse or dataframe failure.
    Polars(String),
    /// Sheet layout does not match the control-sheet columns.
    Schema(String),
    /// `origin_row` outside the loaded sheet.
    RowOutOfRange { row: usize, height: usize },
    /// Workbook write failure.
    Xlsx(String),
}

impl SheetError {
    pub(crate) fn io(path: impl Into<String>, err: std::io::Error) -> Self {
        SheetError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for SheetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetError::Io { path, message } => write!(f, "I/O error on {path}: {message}"),
            SheetError::Polars(message) => write!(f, "Sheet parse error: {message}"),
            SheetError::Schema(message) => write!(f, "Sheet schema error: {message}"),
            SheetError::RowOutOfRange { row, height } => {
                write!(f, "Row {row} is outside the sheet (1..={height}).")
            }
            SheetError::Xlsx(message) => write!(f, "xlsx write error: {message}"),
        }
    }
}

impl std::error::Error for SheetError {}

impl From<PolarsError> for SheetError {
    fn from(err: PolarsError) -> Self {
        SheetError::Polars(err.to_string())
    }
}

impl From<XlsxError> for SheetError {
    fn from(err: XlsxError) -> Self {
        SheetError::Xlsx(err.to_string())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
