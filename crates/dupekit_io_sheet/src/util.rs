//! Shared helpers for sheet cells and workbook naming.

use crate::conf::{N_LEN_EXCEL_SHEET_NAME_MAX, TUP_EXCEL_ILLEGAL};

////////////////////////////////////////////////////////////////////////////////
// #region CellUtils

/// Trim a raw cell; blank cells become `None`.
pub fn normalize_cell_text(value: Option<&str>) -> Option<String> {
    let c_text = value?.trim();
    if c_text.is_empty() {
        None
    } else {
        Some(c_text.to_string())
    }
}

/// Estimate displayed width units for one text cell.
pub fn estimate_unicode_string_width(s: &str) -> usize {
    let n_ascii = s.chars().filter(|chr| chr.is_ascii()).count();
    let n_non_ascii = s.chars().count().saturating_sub(n_ascii);
    n_ascii + (n_non_ascii as f64 * 1.6).round() as usize
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_cell_text() {
        assert_eq!(normalize_cell_text(None), None);
        assert_eq!(normalize_cell_text(Some("   ")), None);
        assert_eq!(
            normalize_cell_text(Some(" root-1 ")),
            Some("root-1".to_string())
        );
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("Run [2026/10]", "_"), "Run _2026_10_");
        assert_eq!(sanitize_sheet_name("  ", "_"), "Sheet");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40), "_").len(), 31);
    }

    #[test]
    fn test_estimate_unicode_string_width() {
        assert_eq!(estimate_unicode_string_width("abc"), 3);
        assert_eq!(estimate_unicode_string_width("ab文件"), 5);
    }
}
