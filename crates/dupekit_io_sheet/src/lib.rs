//! `dupekit_io_sheet` v1:
//! Control sheet (CSV job list) and run-report workbook IO.
//!
//! Modules:
//! - `sheet`  : pending-job loading, completion marks, save
//! - `report` : run-report table and workbook
//! - `writer` : XLSX writer kernel
//! - `spec`   : jobs/formats/errors
//! - `conf`   : column positions and format presets
//! - `util`   : shared helper functions

pub mod conf;
pub mod report;
pub mod sheet;
pub mod spec;
pub mod util;
pub mod writer;

pub use report::{derive_run_report_dataframe, write_run_report};
pub use sheet::JobSheet;
pub use spec::{EnumCellValue, SheetError, SpecCellFormat, SpecCopyJob, SpecRunReportRow};
pub use writer::XlsxWriter;
