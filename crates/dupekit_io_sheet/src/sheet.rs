//! CSV control sheet: pending-job source and completion sink.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use polars::prelude::{
    Column, CsvReadOptions, CsvWriter, DataFrame, DataType, PlSmallStr, Schema, SerReader,
    SerWriter,
};

use crate::conf::{
    N_COL_DESTINATION, N_COL_NAME, N_COL_SELECTOR, N_COL_STATUS, N_NCOLS_SHEET_MIN,
};
use crate::spec::{SheetError, SpecCopyJob};
use crate::util::normalize_cell_text;

/// Headerless control sheet held as string columns.
///
/// Cells are kept verbatim (including whitespace) so `save` rewrites only the
/// status cells that were marked complete.
#[derive(Debug, Clone)]
pub struct JobSheet {
    path_file: PathBuf,
    l_colnames: Vec<String>,
    l_cols: Vec<Vec<Option<String>>>,
}

impl JobSheet {
    /// Load a control sheet from `path_file`.
    ///
    /// An empty file is an empty sheet. Otherwise at least three columns are
    /// required (status, source selector, new name). Rows may be ragged: the
    /// widest row sets the column count and missing trailing cells read as
    /// empty.
    pub fn load(path_file: impl AsRef<Path>) -> Result<Self, SheetError> {
        let path_file = path_file.as_ref().to_path_buf();
        let c_path = path_file.to_string_lossy().to_string();

        let v_bytes = fs::read(&path_file).map_err(|err| SheetError::io(&c_path, err))?;
        let n_cols = derive_max_field_count(&v_bytes);
        if n_cols == 0 {
            tracing::warn!(sheet = %c_path, "control sheet is empty");
            return Ok(Self {
                path_file,
                l_colnames: Vec::new(),
                l_cols: Vec::new(),
            });
        }
        if n_cols < N_NCOLS_SHEET_MIN {
            return Err(derive_width_error(n_cols));
        }

        let schema = Schema::from_iter((1..=n_cols).map(|n_col| {
            (PlSmallStr::from(format!("column_{n_col}")), DataType::String)
        }));
        let df = CsvReadOptions::default()
            .with_has_header(false)
            .with_schema(Some(Arc::new(schema)))
            .try_into_reader_with_file_path(Some(path_file.clone()))?
            .finish()?;

        Self::from_dataframe(path_file, &df)
    }

    fn from_dataframe(path_file: PathBuf, df: &DataFrame) -> Result<Self, SheetError> {
        if df.width() < N_NCOLS_SHEET_MIN {
            return Err(derive_width_error(df.width()));
        }

        let mut l_colnames = Vec::with_capacity(df.width());
        let mut l_cols = Vec::with_capacity(df.width());
        for c_col in df.get_columns() {
            let ca_values = c_col.as_materialized_series().str()?;
            l_colnames.push(c_col.name().to_string());
            l_cols.push(
                ca_values
                    .into_iter()
                    .map(|val| val.map(ToString::to_string))
                    .collect::<Vec<_>>(),
            );
        }

        tracing::debug!(
            sheet = %path_file.display(),
            rows = df.height(),
            cols = df.width(),
            "control sheet loaded"
        );
        Ok(Self {
            path_file,
            l_colnames,
            l_cols,
        })
    }

    /// Source path of the sheet.
    pub fn path(&self) -> &Path {
        &self.path_file
    }

    /// Number of data rows.
    pub fn height(&self) -> usize {
        self.l_cols.first().map_or(0, Vec::len)
    }

    /// Raw status cell of a 1-based row.
    pub fn status_at(&self, origin_row: usize) -> Result<Option<&str>, SheetError> {
        let n_idx_row = self.derive_row_index(origin_row)?;
        Ok(self.l_cols[N_COL_STATUS][n_idx_row].as_deref())
    }

    /// Rows whose status cell is blank, in sheet order.
    pub fn pending_jobs(&self) -> Vec<SpecCopyJob> {
        let mut l_jobs = Vec::new();
        for n_idx_row in 0..self.height() {
            if normalize_cell_text(self.cell(N_COL_STATUS, n_idx_row)).is_some() {
                continue;
            }
            l_jobs.push(SpecCopyJob {
                origin_row: n_idx_row + 1,
                source_selector: normalize_cell_text(self.cell(N_COL_SELECTOR, n_idx_row))
                    .unwrap_or_default(),
                new_name: normalize_cell_text(self.cell(N_COL_NAME, n_idx_row))
                    .unwrap_or_default(),
                destination_parent: normalize_cell_text(self.cell(N_COL_DESTINATION, n_idx_row)),
            });
        }
        l_jobs
    }

    /// Write `timestamp` into the status cell of a 1-based row.
    ///
    /// Only the in-memory sheet changes; call [`Self::save`] to persist.
    pub fn mark_complete(&mut self, origin_row: usize, timestamp: &str) -> Result<(), SheetError> {
        let n_idx_row = self.derive_row_index(origin_row)?;
        self.l_cols[N_COL_STATUS][n_idx_row] = Some(timestamp.to_string());
        Ok(())
    }

    /// Write the sheet back to its source path.
    ///
    /// The table is written to a sibling temp file first and then renamed over
    /// the original, so a failed write leaves the previous sheet intact.
    pub fn save(&self) -> Result<(), SheetError> {
        let c_path = self.path_file.to_string_lossy().to_string();
        let path_tmp = derive_tmp_path(&self.path_file);
        let c_path_tmp = path_tmp.to_string_lossy().to_string();

        if self.l_cols.is_empty() {
            fs::write(&path_tmp, b"").map_err(|err| SheetError::io(&c_path_tmp, err))?;
        } else {
            let mut df = DataFrame::new(
                self.l_colnames
                    .iter()
                    .zip(&self.l_cols)
                    .map(|(c_name, l_values)| {
                        Column::new(c_name.as_str().into(), l_values.as_slice())
                    })
                    .collect(),
            )?;
            let mut file =
                File::create(&path_tmp).map_err(|err| SheetError::io(&c_path_tmp, err))?;
            CsvWriter::new(&mut file)
                .include_header(false)
                .finish(&mut df)?;
        }

        fs::rename(&path_tmp, &self.path_file).map_err(|err| SheetError::io(&c_path, err))?;
        tracing::debug!(sheet = %c_path, rows = self.height(), "control sheet saved");
        Ok(())
    }

    fn cell(&self, n_idx_col: usize, n_idx_row: usize) -> Option<&str> {
        self.l_cols
            .get(n_idx_col)
            .and_then(|l_values| l_values.get(n_idx_row))
            .and_then(|val| val.as_deref())
    }

    fn derive_row_index(&self, origin_row: usize) -> Result<usize, SheetError> {
        let n_height = self.height();
        if origin_row == 0 || origin_row > n_height {
            return Err(SheetError::RowOutOfRange {
                row: origin_row,
                height: n_height,
            });
        }
        Ok(origin_row - 1)
    }
}

fn derive_width_error(n_cols: usize) -> SheetError {
    SheetError::Schema(format!(
        "Expected at least {N_NCOLS_SHEET_MIN} columns (status, source, name), found {n_cols}."
    ))
}

/// Field count of the widest non-empty record. Separators inside quoted
/// fields do not count.
fn derive_max_field_count(v_bytes: &[u8]) -> usize {
    let mut n_max = 0;
    let mut n_fields = 1;
    let mut if_quoted = false;
    let mut if_blank_record = true;
    for &b in v_bytes {
        match b {
            b'"' => {
                if_quoted = !if_quoted;
                if_blank_record = false;
            }
            b',' if !if_quoted => {
                n_fields += 1;
                if_blank_record = false;
            }
            b'\n' if !if_quoted => {
                if !if_blank_record {
                    n_max = n_max.max(n_fields);
                }
                n_fields = 1;
                if_blank_record = true;
            }
            b'\r' => {}
            _ => if_blank_record = false,
        }
    }
    if !if_blank_record {
        n_max = n_max.max(n_fields);
    }
    n_max
}

fn derive_tmp_path(path_file: &Path) -> PathBuf {
    let c_name = path_file
        .file_name()
        .map(|val| val.to_string_lossy().to_string())
        .unwrap_or_else(|| "sheet.csv".to_string());
    path_file.with_file_name(format!(".{c_name}.tmp"))
}
