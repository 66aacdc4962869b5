//! Validated run configuration.

use std::fmt;
use std::path::PathBuf;

use dupekit_io_fs::{
    DupeError, EnumLocateMode, EnumMarkerPatternMode, SpecCopyOptions, SpecLocateOptions,
    TemplateLocator,
};

/// Everything a `run` needs, checked before any job starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecDupeConfig {
    /// Control sheet (CSV) path.
    pub path_sheet: PathBuf,
    pub locate: SpecLocateOptions,
    pub copy: SpecCopyOptions,
    /// Carry timestamps/permissions/xattrs over to copied files.
    pub if_preserve_metadata: bool,
    /// Optional run-report workbook path.
    pub path_report_xlsx: Option<PathBuf>,
}

impl SpecDupeConfig {
    /// Build and validate a configuration.
    pub fn new(
        path_sheet: PathBuf,
        rule_locate: EnumLocateMode,
        marker: &str,
        rule_marker: EnumMarkerPatternMode,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            path_sheet,
            locate: SpecLocateOptions {
                rule_locate,
                marker: marker.to_string(),
                rule_marker,
            },
            copy: SpecCopyOptions::default(),
            if_preserve_metadata: true,
            path_report_xlsx: None,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_workers(mut self, num_workers_max: Option<usize>) -> Self {
        self.copy.num_workers_max = num_workers_max;
        self
    }

    pub fn with_preserve_metadata(mut self, if_preserve_metadata: bool) -> Self {
        self.if_preserve_metadata = if_preserve_metadata;
        self
    }

    pub fn with_report_xlsx(
        mut self,
        path_report_xlsx: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        self.path_report_xlsx = path_report_xlsx;
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.locate.marker.trim().is_empty() {
            return Err(ConfigError::EmptyMarker);
        }
        if let Err(DupeError::InvalidMarker(message)) = TemplateLocator::new(&self.locate) {
            return Err(ConfigError::InvalidMarker(message));
        }
        if self.path_report_xlsx.as_ref() == Some(&self.path_sheet) {
            return Err(ConfigError::ReportOverwritesSheet(
                self.path_sheet.display().to_string(),
            ));
        }
        Ok(())
    }
}

/// Rejected configuration values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    EmptyMarker,
    InvalidMarker(String),
    ReportOverwritesSheet(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyMarker => write!(f, "Template marker must not be empty."),
            ConfigError::InvalidMarker(message) => write!(f, "Invalid template marker: {message}"),
            ConfigError::ReportOverwritesSheet(path) => {
                write!(f, "Run report path would overwrite the control sheet: {path}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
