//! XLSX writer kernel that converts a DataFrame into a one-sheet workbook.

use std::collections::BTreeSet;
use std::path::PathBuf;

use polars::prelude::{AnyValue, DataFrame};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};

use crate::conf::{N_ROWS_AUTOFIT_MAX, N_WIDTH_CELL_MAX, N_WIDTH_CELL_MIN, N_WIDTH_CELL_PADDING};
use crate::spec::{EnumCellValue, SheetError, SpecCellFormat};
use crate::util::{estimate_unicode_string_width, sanitize_sheet_name};

/// Workbook writer bound to one output path.
pub struct XlsxWriter {
    path_file_out: PathBuf,
    workbook: Workbook,
    fmt_text: SpecCellFormat,
    fmt_integer: SpecCellFormat,
    fmt_header: SpecCellFormat,
}

impl XlsxWriter {
    /// Create writer bound to output path and format presets.
    ///
    /// The workbook is buffered in memory until [`Self::close`] is called.
    pub fn new(
        path_file_out: PathBuf,
        fmt_text: SpecCellFormat,
        fmt_integer: SpecCellFormat,
        fmt_header: SpecCellFormat,
    ) -> Self {
        Self {
            path_file_out,
            workbook: Workbook::new(),
            fmt_text,
            fmt_integer,
            fmt_header,
        }
    }

    /// Return output file path as string.
    pub fn file_out(&self) -> String {
        self.path_file_out.to_string_lossy().to_string()
    }

    /// Flush the workbook to disk.
    pub fn close(mut self) -> Result<(), SheetError> {
        self.workbook.save(&self.path_file_out)?;
        Ok(())
    }

    /// Write one sheet from an in-memory dataframe.
    ///
    /// The header row is frozen. Integer columns use the integer
    /// format, everything else the text format. Columns are sized from header
    /// and body widths. Returns the sanitized sheet name.
    pub fn write_sheet(
        &mut self,
        df_data: &DataFrame,
        sheet_name: &str,
    ) -> Result<String, SheetError> {
        let l_colnames: Vec<String> = df_data
            .get_column_names_str()
            .into_iter()
            .map(ToString::to_string)
            .collect();

        let set_cols_idx_integer: BTreeSet<usize> = df_data
            .get_columns()
            .iter()
            .enumerate()
            .filter(|(_, c_col)| c_col.dtype().is_integer())
            .map(|(n_idx, _)| n_idx)
            .collect();

        let l_fmt_data_by_col: Vec<Format> = (0..l_colnames.len())
            .map(|n_idx_col| {
                if set_cols_idx_integer.contains(&n_idx_col) {
                    derive_rust_xlsx_format(&self.fmt_integer)
                } else {
                    derive_rust_xlsx_format(&self.fmt_text)
                }
            })
            .collect();
        let fmt_header = derive_rust_xlsx_format(&self.fmt_header);

        let sheet_name_clean = sanitize_sheet_name(sheet_name, "_");
        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(&sheet_name_clean)?;

        let mut l_width_by_col: Vec<usize> = l_colnames
            .iter()
            .map(|c_name| estimate_unicode_string_width(c_name))
            .collect();

        write_header(worksheet, &l_colnames, &fmt_header)?;
        worksheet.set_freeze_panes(1, 0)?;

        for (n_idx_col, c_col) in df_data.get_columns().iter().enumerate() {
            for n_idx_row in 0..df_data.height() {
                let value = derive_cell_value_from_any_value(c_col.get(n_idx_row)?);
                if n_idx_row < N_ROWS_AUTOFIT_MAX {
                    l_width_by_col[n_idx_col] =
                        usize::max(l_width_by_col[n_idx_col], estimate_width_len(&value));
                }
                write_cell_with_format(
                    worksheet,
                    n_idx_row + 1,
                    n_idx_col,
                    &value,
                    &l_fmt_data_by_col[n_idx_col],
                )?;
            }
        }

        for (n_idx_col, n_width_recorded) in l_width_by_col.into_iter().enumerate() {
            let n_width_final = (n_width_recorded + N_WIDTH_CELL_PADDING)
                .clamp(N_WIDTH_CELL_MIN, N_WIDTH_CELL_MAX);
            worksheet.set_column_width(cast_col_num(n_idx_col)?, n_width_final as f64)?;
        }

        tracing::debug!(
            sheet = %sheet_name_clean,
            rows = df_data.height(),
            cols = l_colnames.len(),
            "xlsx sheet written"
        );
        Ok(sheet_name_clean)
    }
}

/// Estimate displayed width units for one normalized cell value.
pub fn estimate_width_len(value: &EnumCellValue) -> usize {
    match value {
        EnumCellValue::None => 0,
        EnumCellValue::String(s) => estimate_unicode_string_width(s),
        EnumCellValue::Integer(n) => n.to_string().len(),
    }
}

fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::String(val) => EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellValue::String(val.to_string()),
        AnyValue::UInt32(val) => EnumCellValue::Integer(i64::from(val)),
        AnyValue::Int32(val) => EnumCellValue::Integer(i64::from(val)),
        AnyValue::Int64(val) => EnumCellValue::Integer(val),
        AnyValue::UInt64(val) => match i64::try_from(val) {
            Ok(n) => EnumCellValue::Integer(n),
            Err(_) => EnumCellValue::String(val.to_string()),
        },
        _ => EnumCellValue::String(value.to_string()),
    }
}

fn write_header(
    worksheet: &mut Worksheet,
    l_colnames: &[String],
    fmt_header: &Format,
) -> Result<(), SheetError> {
    for (col_idx, cell_value) in l_colnames.iter().enumerate() {
        worksheet.write_string_with_format(0, cast_col_num(col_idx)?, cell_value, fmt_header)?;
    }
    Ok(())
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
) -> Result<(), SheetError> {
    let n_row = cast_row_num(row_idx)?;
    let n_col = cast_col_num(col_idx)?;
    match value {
        EnumCellValue::None => {
            worksheet.write_blank(n_row, n_col, format)?;
        }
        EnumCellValue::String(val) => {
            worksheet.write_string_with_format(n_row, n_col, val, format)?;
        }
        EnumCellValue::Integer(val) => {
            worksheet.write_number_with_format(n_row, n_col, *val as f64, format)?;
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(val.as_str());
    }
    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    match align.trim().to_ascii_lowercase().as_str() {
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "vcenter" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

fn cast_row_num(value: usize) -> Result<u32, SheetError> {
    u32::try_from(value).map_err(|_| SheetError::Xlsx(format!("row index overflow: {value}")))
}

fn cast_col_num(value: usize) -> Result<u16, SheetError> {
    u16::try_from(value).map_err(|_| SheetError::Xlsx(format!("column index overflow: {value}")))
}

#[cfg(test)]
mod tests {
    use super::{XlsxWriter, estimate_width_len};
    use crate::conf::derive_default_xlsx_formats;
    use crate::spec::EnumCellValue;
    use polars::prelude::{Column, DataFrame};

    #[test]
    fn writes_workbook_under_sanitized_sheet_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path_file_out = dir.path().join("out.xlsx");
        let df = DataFrame::new(vec![
            Column::new("row".into(), vec![1u64, 2]),
            Column::new("name".into(), vec![Some("ACME"), None]),
        ])
        .expect("df");

        let dict_fmt = derive_default_xlsx_formats();
        let mut writer = XlsxWriter::new(
            path_file_out.clone(),
            dict_fmt["text"].clone(),
            dict_fmt["integer"].clone(),
            dict_fmt["header"].clone(),
        );
        assert_eq!(
            writer.write_sheet(&df, "Run 2026/10").expect("write"),
            "Run 2026_10"
        );
        writer.close().expect("close");

        let v_bytes = std::fs::read(&path_file_out).expect("read");
        assert!(v_bytes.starts_with(b"PK"));
    }

    #[test]
    fn estimate_width_len_by_kind() {
        assert_eq!(estimate_width_len(&EnumCellValue::None), 0);
        assert_eq!(
            estimate_width_len(&EnumCellValue::String("ACME".to_string())),
            4
        );
        assert_eq!(estimate_width_len(&EnumCellValue::Integer(120)), 3);
    }
}
