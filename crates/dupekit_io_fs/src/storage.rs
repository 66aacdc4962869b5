//! Storage-system seam consumed by the locator, provisioner and copy engine.

use crate::spec::StorageError;

/// Forward-only, single-pass child listing.
///
/// Listings are lazy; callers must not expect to restart them.
pub type StorageIter<'a, T> = Box<dyn Iterator<Item = Result<T, StorageError>> + 'a>;

/// Opaque handle to a folder in a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FolderRef {
    id: String,
    name: String,
}

impl FolderRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Stable, backend-unique identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Opaque handle to a leaf file in a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileRef {
    id: String,
    name: String,
}

impl FileRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Folder/file primitives a backend must provide.
///
/// Every call is blocking and treated as atomic. Backends are shared across the
/// file-copy worker pool, hence the `Sync` bound.
pub trait Storage: Sync {
    /// Resolve a folder by identifier.
    fn folder_by_id(&self, id: &str) -> Result<FolderRef, StorageError>;

    /// Immediate child folders, in backend enumeration order.
    fn folders(&self, folder: &FolderRef) -> Result<StorageIter<'_, FolderRef>, StorageError>;

    /// Immediate child files, in backend enumeration order.
    fn files(&self, folder: &FolderRef) -> Result<StorageIter<'_, FileRef>, StorageError>;

    /// Parent folders. A folder may have none or several.
    fn parents(&self, folder: &FolderRef) -> Result<StorageIter<'_, FolderRef>, StorageError>;

    /// Create one child folder named `name` under `parent`.
    fn create_folder(&self, parent: &FolderRef, name: &str) -> Result<FolderRef, StorageError>;

    /// Copy `file` into `destination` under `name`.
    fn copy_file(
        &self,
        file: &FileRef,
        name: &str,
        destination: &FolderRef,
    ) -> Result<FileRef, StorageError>;

    /// Whether `folder` is `ancestor` or lies somewhere below it.
    fn is_within(&self, folder: &FolderRef, ancestor: &FolderRef) -> bool {
        folder.id() == ancestor.id()
    }

    /// Whether one folder is the other or contains it.
    fn is_overlap(&self, a: &FolderRef, b: &FolderRef) -> bool {
        self.is_within(a, b) || self.is_within(b, a)
    }
}
