//! `dupekit_io_fs` v1:
//! Template-folder duplication kernel.
//!
//! Modules:
//! - `storage`   : folder/file handles and the backend trait
//! - `local`     : local filesystem backend
//! - `memory`    : in-memory backend with failure injection
//! - `locate`    : template resolution (by name under root, by identifier)
//! - `provision` : destination folder creation
//! - `copy`      : breadth-first tree copy engine
//! - `spec`      : enums/options/errors
//! - `report`    : run-time report model
//! - `util`      : shared helper functions

pub mod copy;
pub mod local;
pub mod locate;
pub mod memory;
pub mod provision;
pub mod report;
pub mod spec;
pub mod storage;
mod util;

pub use copy::{SpecCopyTask, copy_tree};
pub use local::LocalStorage;
pub use locate::{SpecLocatedTemplate, TemplateLocator, locate_by_identifier, resolve_folder};
pub use memory::MemoryStorage;
pub use provision::provision_destination;
pub use report::{ReportCopy, ReportCopyBuilder};
pub use spec::{
    DupeError, EnumLocateMode, EnumMarkerPatternMode, EnumStorageErrorKind, SpecCopyOptions,
    SpecLocateOptions, StorageError,
};
pub use storage::{FileRef, FolderRef, Storage, StorageIter};
