//! In-memory storage backend with failure injection.
//!
//! Folders may carry several parents, like shared folders in hosted drives.
//! Listing calls are counted per folder so callers can assert single-pass traversal.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::spec::{EnumStorageErrorKind, StorageError};
use crate::storage::{FileRef, FolderRef, Storage, StorageIter};

#[derive(Debug, Clone, Default)]
struct SpecMemoryFolder {
    name: String,
    l_parents: Vec<String>,
    l_folders: Vec<String>,
    l_files: Vec<String>,
}

#[derive(Debug, Clone)]
struct SpecMemoryFile {
    name: String,
    content: Vec<u8>,
}

#[derive(Debug, Default)]
struct MemoryState {
    n_next_id: u64,
    dict_folders: BTreeMap<String, SpecMemoryFolder>,
    dict_files: BTreeMap<String, SpecMemoryFile>,
    dict_list_calls: BTreeMap<String, u64>,
    set_reject_copy_names: BTreeSet<String>,
    set_reject_folder_names: BTreeSet<String>,
}

impl MemoryState {
    fn allocate_id(&mut self, prefix: &str) -> String {
        self.n_next_id += 1;
        format!("{prefix}-{}", self.n_next_id)
    }

    fn folder(&self, id: &str) -> Result<&SpecMemoryFolder, StorageError> {
        self.dict_folders
            .get(id)
            .ok_or_else(|| StorageError::not_found(id))
    }

    fn folder_ref(&self, id: &str) -> Result<FolderRef, StorageError> {
        Ok(FolderRef::new(id, self.folder(id)?.name.clone()))
    }

    fn insert_folder(&mut self, parent_id: Option<&str>, name: &str) -> FolderRef {
        let id = self.allocate_id("folder");
        let l_parents = parent_id.map(|p| vec![p.to_string()]).unwrap_or_default();
        self.dict_folders.insert(
            id.clone(),
            SpecMemoryFolder {
                name: name.to_string(),
                l_parents,
                ..Default::default()
            },
        );
        if let Some(parent_id) = parent_id
            && let Some(parent) = self.dict_folders.get_mut(parent_id)
        {
            parent.l_folders.push(id.clone());
        }
        FolderRef::new(id, name)
    }

    fn insert_file(&mut self, parent_id: &str, name: &str, content: Vec<u8>) -> FileRef {
        let id = self.allocate_id("file");
        self.dict_files.insert(
            id.clone(),
            SpecMemoryFile {
                name: name.to_string(),
                content,
            },
        );
        if let Some(parent) = self.dict_folders.get_mut(parent_id) {
            parent.l_files.push(id.clone());
        }
        FileRef::new(id, name)
    }

    fn is_ancestor(&self, ancestor_id: &str, id: &str) -> bool {
        let mut l_stack = vec![id.to_string()];
        let mut set_seen = BTreeSet::new();
        while let Some(cur) = l_stack.pop() {
            if cur == ancestor_id {
                return true;
            }
            if !set_seen.insert(cur.clone()) {
                continue;
            }
            if let Some(folder) = self.dict_folders.get(&cur) {
                l_stack.extend(folder.l_parents.iter().cloned());
            }
        }
        false
    }
}

/// Thread-safe in-memory [`Storage`].
#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: Mutex<MemoryState>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a folder; `parent = None` creates a parentless root.
    pub fn add_folder(&self, parent: Option<&FolderRef>, name: &str) -> FolderRef {
        self.lock().insert_folder(parent.map(FolderRef::id), name)
    }

    /// Add a file with the given content.
    pub fn add_file(&self, parent: &FolderRef, name: &str, content: &[u8]) -> FileRef {
        self.lock().insert_file(parent.id(), name, content.to_vec())
    }

    /// Register `parent` as an additional parent of `folder`.
    pub fn add_parent(&self, folder: &FolderRef, parent: &FolderRef) {
        let mut state = self.lock();
        if let Some(spec_folder) = state.dict_folders.get_mut(folder.id()) {
            spec_folder.l_parents.push(parent.id().to_string());
        }
        if let Some(spec_parent) = state.dict_folders.get_mut(parent.id()) {
            spec_parent.l_folders.push(folder.id().to_string());
        }
    }

    /// Make every copy of a file named `name` fail.
    pub fn reject_file_copy(&self, name: &str) {
        self.lock().set_reject_copy_names.insert(name.to_string());
    }

    /// Make every creation of a folder named `name` fail.
    pub fn reject_folder_creation(&self, name: &str) {
        self.lock().set_reject_folder_names.insert(name.to_string());
    }

    /// Child folders, by name, in enumeration order.
    pub fn folder_names(&self, folder: &FolderRef) -> Vec<String> {
        let state = self.lock();
        state
            .dict_folders
            .get(folder.id())
            .map(|f| {
                f.l_folders
                    .iter()
                    .filter_map(|id| state.dict_folders.get(id).map(|c| c.name.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Child files, by name, in enumeration order.
    pub fn file_names(&self, folder: &FolderRef) -> Vec<String> {
        let state = self.lock();
        state
            .dict_folders
            .get(folder.id())
            .map(|f| {
                f.l_files
                    .iter()
                    .filter_map(|id| state.dict_files.get(id).map(|c| c.name.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// First child folder named `name`.
    pub fn child_folder(&self, folder: &FolderRef, name: &str) -> Option<FolderRef> {
        let state = self.lock();
        let spec_folder = state.dict_folders.get(folder.id())?;
        spec_folder.l_folders.iter().find_map(|id| {
            state
                .dict_folders
                .get(id)
                .filter(|c| c.name == name)
                .map(|c| FolderRef::new(id.clone(), c.name.clone()))
        })
    }

    /// Content of the first child file named `name`.
    pub fn file_content(&self, folder: &FolderRef, name: &str) -> Option<Vec<u8>> {
        let state = self.lock();
        let spec_folder = state.dict_folders.get(folder.id())?;
        spec_folder.l_files.iter().find_map(|id| {
            state
                .dict_files
                .get(id)
                .filter(|c| c.name == name)
                .map(|c| c.content.clone())
        })
    }

    /// Number of folders held by the backend.
    pub fn folder_count(&self) -> usize {
        self.lock().dict_folders.len()
    }

    /// Number of files held by the backend.
    pub fn file_count(&self) -> usize {
        self.lock().dict_files.len()
    }

    /// How many times the children of `folder` were listed (folders + files).
    pub fn list_calls(&self, folder: &FolderRef) -> u64 {
        self.lock()
            .dict_list_calls
            .get(folder.id())
            .copied()
            .unwrap_or(0)
    }
}

impl Storage for MemoryStorage {
    fn folder_by_id(&self, id: &str) -> Result<FolderRef, StorageError> {
        self.lock().folder_ref(id)
    }

    fn folders(&self, folder: &FolderRef) -> Result<StorageIter<'_, FolderRef>, StorageError> {
        let mut state = self.lock();
        let l_ids = state.folder(folder.id())?.l_folders.clone();
        *state
            .dict_list_calls
            .entry(folder.id().to_string())
            .or_default() += 1;
        let l_refs = l_ids
            .iter()
            .map(|id| state.folder_ref(id))
            .collect::<Vec<_>>();
        Ok(Box::new(l_refs.into_iter()))
    }

    fn files(&self, folder: &FolderRef) -> Result<StorageIter<'_, FileRef>, StorageError> {
        let mut state = self.lock();
        let l_ids = state.folder(folder.id())?.l_files.clone();
        *state
            .dict_list_calls
            .entry(folder.id().to_string())
            .or_default() += 1;
        let l_refs = l_ids
            .iter()
            .map(|id| {
                state
                    .dict_files
                    .get(id)
                    .map(|f| FileRef::new(id.clone(), f.name.clone()))
                    .ok_or_else(|| StorageError::not_found(id.clone()))
            })
            .collect::<Vec<_>>();
        Ok(Box::new(l_refs.into_iter()))
    }

    fn parents(&self, folder: &FolderRef) -> Result<StorageIter<'_, FolderRef>, StorageError> {
        let state = self.lock();
        let l_refs = state
            .folder(folder.id())?
            .l_parents
            .iter()
            .map(|id| state.folder_ref(id))
            .collect::<Vec<_>>();
        Ok(Box::new(l_refs.into_iter()))
    }

    fn create_folder(&self, parent: &FolderRef, name: &str) -> Result<FolderRef, StorageError> {
        let mut state = self.lock();
        state.folder(parent.id())?;
        if state.set_reject_folder_names.contains(name) {
            return Err(StorageError::new(
                EnumStorageErrorKind::Rejected,
                name,
                format!("Folder creation rejected: {name}"),
            ));
        }
        Ok(state.insert_folder(Some(parent.id()), name))
    }

    fn copy_file(
        &self,
        file: &FileRef,
        name: &str,
        destination: &FolderRef,
    ) -> Result<FileRef, StorageError> {
        let mut state = self.lock();
        state.folder(destination.id())?;
        if state.set_reject_copy_names.contains(file.name()) {
            return Err(StorageError::new(
                EnumStorageErrorKind::Rejected,
                file.name(),
                format!("File copy rejected: {}", file.name()),
            ));
        }
        let content = state
            .dict_files
            .get(file.id())
            .map(|f| f.content.clone())
            .ok_or_else(|| StorageError::not_found(file.id()))?;
        Ok(state.insert_file(destination.id(), name, content))
    }

    fn is_within(&self, folder: &FolderRef, ancestor: &FolderRef) -> bool {
        self.lock().is_ancestor(ancestor.id(), folder.id())
    }
}
