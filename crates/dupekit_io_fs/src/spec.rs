//! Locate/copy specification models and top-level error types.

use std::fmt;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Strategy used to resolve the template folder from a job selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumLocateMode {
    /// Selector is a root folder; pick the first child whose name matches the marker.
    #[default]
    ByNameUnderRoot,
    /// Selector is the template folder identifier; anchor at its first parent.
    ByIdentifier,
}

/// Pattern matching mode for the template marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumMarkerPatternMode {
    /// Plain substring match.
    #[default]
    Literal,
    /// Shell-like wildcards (`*`, `?`, character classes) over the whole name.
    Glob,
    /// Regular expression, unanchored.
    Regex,
}

/// Classification of a storage backend failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumStorageErrorKind {
    /// The referenced folder or file does not exist.
    NotFound,
    /// The backend refused the mutation (permission, quota, duplicate name).
    Rejected,
    /// Any other backend fault (I/O, listing interrupted).
    Unavailable,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// Marker convention used by the by-name locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecLocateOptions {
    /// Locator strategy.
    pub rule_locate: EnumLocateMode,
    /// Marker text or pattern a template folder name must match.
    pub marker: String,
    /// Marker interpretation mode.
    pub rule_marker: EnumMarkerPatternMode,
}

impl Default for SpecLocateOptions {
    fn default() -> Self {
        Self {
            rule_locate: EnumLocateMode::ByNameUnderRoot,
            marker: "TEMPLATE".to_string(),
            rule_marker: EnumMarkerPatternMode::Literal,
        }
    }
}

/// Input options for `copy_tree`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecCopyOptions {
    /// Maximum worker threads for the per-folder file-copy step.
    pub num_workers_max: Option<usize>,
}

/// Failure reported by a [`crate::storage::Storage`] backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageError {
    /// Failure class.
    pub kind: EnumStorageErrorKind,
    /// Identifier or name of the folder/file involved.
    pub target: String,
    /// Backend error text.
    pub message: String,
}

impl StorageError {
    pub fn new(
        kind: EnumStorageErrorKind,
        target: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            target: target.into(),
            message: message.into(),
        }
    }

    pub fn not_found(target: impl Into<String>) -> Self {
        let target = target.into();
        let message = format!("No such folder or file: {target}");
        Self::new(EnumStorageErrorKind::NotFound, target, message)
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for StorageError {}

/// Errors raised by the locate, provision and copy phases of one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DupeError {
    /// The selector matched no folder.
    Locate {
        /// Selector as given by the job.
        selector: String,
        /// Human-readable reason.
        message: String,
    },
    /// Marker pattern failed to compile.
    InvalidMarker(String),
    /// Destination folder or file copy rejected by storage.
    Creation {
        /// Name or identifier of the item that could not be created.
        target: String,
        /// Underlying storage error text.
        message: String,
    },
    /// Any other storage fault surfaced during traversal.
    Storage(StorageError),
    /// Source and destination trees overlap.
    SourceDestinationOverlap {
        /// Source folder identifier.
        source: String,
        /// Destination folder identifier.
        destination: String,
    },
    /// Destination root already has content.
    DestinationNotEmpty(String),
}

impl DupeError {
    pub(crate) fn creation(target: impl Into<String>, err: StorageError) -> Self {
        Self::Creation {
            target: target.into(),
            message: err.message,
        }
    }
}

impl From<StorageError> for DupeError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

impl fmt::Display for DupeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Locate { selector, message } => {
                write!(f, "No template found for {selector:?}: {message}")
            }
            Self::InvalidMarker(msg) => write!(f, "{msg}"),
            Self::Creation { target, message } => {
                write!(f, "Failed to create {target:?}: {message}")
            }
            Self::Storage(err) => write!(f, "Storage error at {}: {}", err.target, err.message),
            Self::SourceDestinationOverlap {
                source,
                destination,
            } => write!(
                f,
                "Source and destination folders overlap: {source} <-> {destination}"
            ),
            Self::DestinationNotEmpty(id) => {
                write!(f, "Destination folder is not empty: {id}")
            }
        }
    }
}

impl std::error::Error for DupeError {}

// #endregion
////////////////////////////////////////////////////////////////////////////////
