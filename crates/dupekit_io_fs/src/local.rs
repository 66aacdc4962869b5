//! Local filesystem storage backend.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::spec::{EnumStorageErrorKind, StorageError};
use crate::storage::{FileRef, FolderRef, Storage, StorageIter};
use crate::util::{copy_file_with_metadata, is_within};

/// [`Storage`] over the local filesystem.
///
/// Identifiers are canonical absolute paths. Symlinked directories are never
/// descended; symlinks to regular files are listed as files.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    if_preserve_metadata: bool,
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self {
            if_preserve_metadata: true,
        }
    }
}

impl LocalStorage {
    pub fn new(if_preserve_metadata: bool) -> Self {
        Self {
            if_preserve_metadata,
        }
    }

    /// Build a handle for an existing directory path.
    pub fn folder_at(&self, path: impl AsRef<Path>) -> Result<FolderRef, StorageError> {
        let path = path.as_ref();
        let (id, _) = derive_entry_id_name(path)?;
        self.folder_by_id(&id)
    }
}

fn derive_storage_error(path: &Path, e: &io::Error) -> StorageError {
    let kind = match e.kind() {
        io::ErrorKind::NotFound => EnumStorageErrorKind::NotFound,
        io::ErrorKind::PermissionDenied | io::ErrorKind::AlreadyExists => {
            EnumStorageErrorKind::Rejected
        }
        _ => EnumStorageErrorKind::Unavailable,
    };
    StorageError::new(kind, path.display().to_string(), format!("{} ({e})", path.display()))
}

/// Identifier and display name of `path`.
///
/// Identifiers must round-trip to the same path, so non-UTF-8 names are
/// rejected instead of lossily converted.
fn derive_entry_id_name(path: &Path) -> Result<(String, String), StorageError> {
    let Some(id) = path.to_str() else {
        return Err(StorageError::new(
            EnumStorageErrorKind::Rejected,
            path.display().to_string(),
            format!("Name is not valid UTF-8: {}", path.display()),
        ));
    };
    let name = path
        .file_name()
        .and_then(|v| v.to_str())
        .unwrap_or(id)
        .to_string();
    Ok((id.to_string(), name))
}

fn derive_folder_ref(path: PathBuf) -> Result<FolderRef, StorageError> {
    let (id, name) = derive_entry_id_name(&path)?;
    Ok(FolderRef::new(id, name))
}

fn derive_file_ref(path: PathBuf) -> Result<FileRef, StorageError> {
    let (id, name) = derive_entry_id_name(&path)?;
    Ok(FileRef::new(id, name))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnumEntryKind {
    Folder,
    File,
    Skipped,
}

fn classify_entry(entry: &fs::DirEntry) -> Result<EnumEntryKind, io::Error> {
    let cfg_file_type = entry.file_type()?;
    if cfg_file_type.is_dir() {
        return Ok(EnumEntryKind::Folder);
    }
    if cfg_file_type.is_file() {
        return Ok(EnumEntryKind::File);
    }

    let path_entry = entry.path();
    if cfg_file_type.is_symlink() {
        if path_entry.is_file() {
            return Ok(EnumEntryKind::File);
        }
        tracing::warn!(path = %path_entry.display(), "symlink not followed");
        return Ok(EnumEntryKind::Skipped);
    }
    tracing::warn!(path = %path_entry.display(), "special file skipped");
    Ok(EnumEntryKind::Skipped)
}

fn list_entries(
    path_dir: &Path,
    kind_wanted: EnumEntryKind,
) -> Result<StorageIter<'static, PathBuf>, StorageError> {
    let iter_entries = fs::read_dir(path_dir).map_err(|e| derive_storage_error(path_dir, &e))?;
    let path_dir = path_dir.to_path_buf();

    let iter = iter_entries.filter_map(move |_entry_res| {
        let entry = match _entry_res {
            Ok(v) => v,
            Err(e) => return Some(Err(derive_storage_error(&path_dir, &e))),
        };
        match classify_entry(&entry) {
            Ok(kind) if kind == kind_wanted => Some(Ok(entry.path())),
            Ok(_) => None,
            Err(e) => Some(Err(derive_storage_error(&entry.path(), &e))),
        }
    });
    Ok(Box::new(iter))
}

impl Storage for LocalStorage {
    fn folder_by_id(&self, id: &str) -> Result<FolderRef, StorageError> {
        let path = Path::new(id);
        let path_resolved = fs::canonicalize(path).map_err(|e| derive_storage_error(path, &e))?;
        if !path_resolved.is_dir() {
            return Err(StorageError::new(
                EnumStorageErrorKind::NotFound,
                id,
                format!("Not a directory: {}", path.display()),
            ));
        }
        derive_folder_ref(path_resolved)
    }

    fn folders(&self, folder: &FolderRef) -> Result<StorageIter<'_, FolderRef>, StorageError> {
        let iter = list_entries(Path::new(folder.id()), EnumEntryKind::Folder)?;
        Ok(Box::new(iter.map(|res| res.and_then(derive_folder_ref))))
    }

    fn files(&self, folder: &FolderRef) -> Result<StorageIter<'_, FileRef>, StorageError> {
        let iter = list_entries(Path::new(folder.id()), EnumEntryKind::File)?;
        Ok(Box::new(iter.map(|res| res.and_then(derive_file_ref))))
    }

    fn parents(&self, folder: &FolderRef) -> Result<StorageIter<'_, FolderRef>, StorageError> {
        let parent = Path::new(folder.id()).parent().map(Path::to_path_buf);
        Ok(Box::new(parent.into_iter().map(derive_folder_ref)))
    }

    fn create_folder(&self, parent: &FolderRef, name: &str) -> Result<FolderRef, StorageError> {
        validate_child_name(parent, name)?;
        let path_dir_new = Path::new(parent.id()).join(name);
        fs::create_dir(&path_dir_new).map_err(|e| derive_storage_error(&path_dir_new, &e))?;
        derive_folder_ref(path_dir_new)
    }

    fn copy_file(
        &self,
        file: &FileRef,
        name: &str,
        destination: &FolderRef,
    ) -> Result<FileRef, StorageError> {
        validate_child_name(destination, name)?;
        let path_file_src = Path::new(file.id());
        let path_file_dst = Path::new(destination.id()).join(name);

        if fs::symlink_metadata(&path_file_dst).is_ok() {
            return Err(StorageError::new(
                EnumStorageErrorKind::Rejected,
                path_file_dst.display().to_string(),
                format!("Destination exists: {}", path_file_dst.display()),
            ));
        }

        let res_copy = if self.if_preserve_metadata {
            copy_file_with_metadata(path_file_src, &path_file_dst)
        } else {
            fs::copy(path_file_src, &path_file_dst).map(|_| ())
        };
        res_copy.map_err(|e| derive_storage_error(&path_file_dst, &e))?;

        derive_file_ref(path_file_dst)
    }

    fn is_within(&self, folder: &FolderRef, ancestor: &FolderRef) -> bool {
        is_within(Path::new(folder.id()), Path::new(ancestor.id()))
    }
}

fn validate_child_name(parent: &FolderRef, name: &str) -> Result<(), StorageError> {
    let b_is_plain = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\');
    if b_is_plain {
        return Ok(());
    }
    Err(StorageError::new(
        EnumStorageErrorKind::Rejected,
        parent.id(),
        format!("Invalid entry name {name:?} under {}", parent.id()),
    ))
}
