//! Destination folder creation.

use crate::spec::DupeError;
use crate::storage::{FolderRef, Storage};

/// Create one new, empty folder named `name` under `anchor`.
///
/// Not idempotent: two calls create two folders, or fail on the backend's
/// duplicate-name policy. Callers provision at most once per job.
pub fn provision_destination<S: Storage + ?Sized>(
    storage: &S,
    anchor: &FolderRef,
    name: &str,
) -> Result<FolderRef, DupeError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DupeError::Creation {
            target: anchor.id().to_string(),
            message: "Destination folder name is empty.".to_string(),
        });
    }

    let folder = storage
        .create_folder(anchor, name)
        .map_err(|err| DupeError::creation(name, err))?;
    tracing::debug!(anchor = anchor.id(), destination = folder.id(), "destination provisioned");
    Ok(folder)
}
