use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use regex::Regex;

use crate::spec::{DupeError, EnumMarkerPatternMode};

////////////////////////////////////////////////////////////////////////////////
// #region PatternMatching

#[derive(Debug, Clone)]
pub(crate) enum TypeMarkerPattern {
    Literal(String),
    Glob(GlobMatcher),
    Regex(Regex),
}

impl TypeMarkerPattern {
    pub(crate) fn compile(
        marker: &str,
        rule_marker: EnumMarkerPatternMode,
    ) -> Result<Self, DupeError> {
        if marker.is_empty() {
            return Err(DupeError::InvalidMarker(
                "Template marker must not be empty.".to_string(),
            ));
        }

        match rule_marker {
            EnumMarkerPatternMode::Literal => Ok(Self::Literal(marker.to_string())),
            EnumMarkerPatternMode::Glob => {
                let matcher = Glob::new(marker)
                    .map_err(|e| DupeError::InvalidMarker(format!("Invalid marker glob: {e}")))?
                    .compile_matcher();
                Ok(Self::Glob(matcher))
            }
            EnumMarkerPatternMode::Regex => {
                let regex = Regex::new(marker)
                    .map_err(|e| DupeError::InvalidMarker(format!("Invalid marker regex: {e}")))?;
                Ok(Self::Regex(regex))
            }
        }
    }

    pub(crate) fn is_match(&self, value: &str) -> bool {
        match self {
            Self::Literal(marker) => value.contains(marker.as_str()),
            Self::Glob(matcher) => matcher.is_match(value),
            Self::Regex(regex) => regex.is_match(value),
        }
    }

    pub(crate) fn as_text(&self) -> &str {
        match self {
            Self::Literal(marker) => marker,
            Self::Glob(matcher) => matcher.glob().glob(),
            Self::Regex(regex) => regex.as_str(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

fn _is_relative_to_base(path: &Path, base: &Path) -> bool {
    path.starts_with(base)
}

fn _normalize_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = fs::canonicalize(path) {
        return resolved;
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}

pub(crate) fn is_within(path: &Path, base: &Path) -> bool {
    _is_relative_to_base(&_normalize_path(path), &_normalize_path(base))
}

pub(crate) fn copy_file_with_metadata(
    path_file_src: &Path,
    path_file_dst: &Path,
) -> Result<(), io::Error> {
    fs::copy(path_file_src, path_file_dst)?;
    #[cfg(target_os = "linux")]
    {
        apply_metadata_linux(path_file_src, path_file_dst)?;
    }
    Ok(())
}

#[cfg(target_os = "linux")]
fn apply_metadata_linux(path_file_src: &Path, path_file_dst: &Path) -> Result<(), io::Error> {
    use filetime::{FileTime, set_file_times};

    let stat_src = fs::metadata(path_file_src)?;
    fs::set_permissions(path_file_dst, stat_src.permissions())?;

    let file_time_access = FileTime::from_last_access_time(&stat_src);
    let file_time_modify = FileTime::from_last_modification_time(&stat_src);
    set_file_times(path_file_dst, file_time_access, file_time_modify)?;

    copy_xattrs_linux(path_file_src, path_file_dst);
    Ok(())
}

#[cfg(target_os = "linux")]
fn copy_xattrs_linux(path_file_src: &Path, path_file_dst: &Path) {
    let iter_xattr_names = match xattr::list(path_file_src) {
        Ok(v) => v,
        Err(_) => return,
    };

    for name in iter_xattr_names {
        let Some(raw_value) = xattr::get(path_file_src, &name).ok().flatten() else {
            continue;
        };
        if let Err(e) = xattr::set(path_file_dst, &name, &raw_value) {
            tracing::debug!(
                path = %path_file_dst.display(),
                attr = ?name,
                error = %e,
                "extended attribute not copied"
            );
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Workers

pub(crate) fn calculate_worker_limit(num_workers_max: Option<usize>) -> usize {
    let n_cpu = std::thread::available_parallelism()
        .map(|v| v.get())
        .unwrap_or(1);

    match num_workers_max {
        Some(n) => n.clamp(1, n_cpu),
        None => n_cpu.clamp(1, 8),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
