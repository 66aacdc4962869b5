//! Breadth-first tree copy over a [`Storage`] backend.

use std::collections::VecDeque;

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

use crate::report::{ReportCopy, ReportCopyBuilder};
use crate::spec::{DupeError, SpecCopyOptions};
use crate::storage::{FileRef, FolderRef, Storage};
use crate::util::calculate_worker_limit;

/// One pending "mirror `source` into `destination`" unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecCopyTask {
    /// Folder whose children are copied.
    pub source: FolderRef,
    /// Freshly created folder receiving the copies.
    pub destination: FolderRef,
}

struct SpecCopyContext<'a, S: ?Sized> {
    storage: &'a S,
    q_tasks: VecDeque<SpecCopyTask>,
    thread_pool: Option<rayon::ThreadPool>,
    builder_cp_report: ReportCopyBuilder,
}

/// Mirror the tree under `source_root` into the empty folder `destination_root`.
///
/// Traversal is level-order over a growing worklist: every task creates its
/// child folders (enqueueing one task per child), then copies its files. A
/// folder is always created before its task is enqueued, so later tasks never
/// write into a missing destination.
///
/// Returns [`ReportCopy`] with `if_complete == true` once every discovered
/// folder was inspected. The first storage failure aborts the run with
/// [`DupeError`]; nothing already copied is removed.
pub fn copy_tree<S: Storage + ?Sized>(
    storage: &S,
    source_root: &FolderRef,
    destination_root: &FolderRef,
    spec_cp_options: &SpecCopyOptions,
) -> Result<ReportCopy, DupeError> {
    if storage.is_overlap(source_root, destination_root) {
        return Err(DupeError::SourceDestinationOverlap {
            source: source_root.id().to_string(),
            destination: destination_root.id().to_string(),
        });
    }
    validate_destination_empty(storage, destination_root)?;

    let mut builder_cp_report = ReportCopyBuilder::default();
    let n_workers_max = calculate_worker_limit(spec_cp_options.num_workers_max);
    let thread_pool = if n_workers_max <= 1 {
        None
    } else {
        match ThreadPoolBuilder::new().num_threads(n_workers_max).build() {
            Ok(pool) => Some(pool),
            Err(e) => {
                builder_cp_report.add_warning(format!(
                    "Failed to initialize thread pool (workers={n_workers_max}); fallback to serial copy ({e})."
                ));
                None
            }
        }
    };

    let mut spec_cp_ctx = SpecCopyContext {
        storage,
        q_tasks: VecDeque::new(),
        thread_pool,
        builder_cp_report,
    };
    spec_cp_ctx.q_tasks.push_back(SpecCopyTask {
        source: source_root.clone(),
        destination: destination_root.clone(),
    });
    spec_cp_ctx.builder_cp_report.add_expected();

    while let Some(spec_task) = spec_cp_ctx.q_tasks.pop_front() {
        copy_folders(&spec_task, &mut spec_cp_ctx)?;
        copy_files(&spec_task, &mut spec_cp_ctx)?;
        spec_cp_ctx.builder_cp_report.add_inspected();
        tracing::debug!(
            source = spec_task.source.id(),
            destination = spec_task.destination.id(),
            queued = spec_cp_ctx.q_tasks.len(),
            "copy task inspected"
        );
    }

    let report = spec_cp_ctx.builder_cp_report.build();
    tracing::info!(
        source = source_root.id(),
        destination = destination_root.id(),
        "{report}"
    );
    Ok(report)
}

fn validate_destination_empty<S: Storage + ?Sized>(
    storage: &S,
    destination_root: &FolderRef,
) -> Result<(), DupeError> {
    if storage.folders(destination_root)?.next().transpose()?.is_some()
        || storage.files(destination_root)?.next().transpose()?.is_some()
    {
        return Err(DupeError::DestinationNotEmpty(
            destination_root.id().to_string(),
        ));
    }
    Ok(())
}

fn copy_folders<S: Storage + ?Sized>(
    spec_task: &SpecCopyTask,
    spec_cp_ctx: &mut SpecCopyContext<'_, S>,
) -> Result<(), DupeError> {
    let l_folders_src = spec_cp_ctx
        .storage
        .folders(&spec_task.source)?
        .collect::<Result<Vec<FolderRef>, _>>()?;
    for folder_src_sub in l_folders_src {
        let folder_dst_sub = spec_cp_ctx
            .storage
            .create_folder(&spec_task.destination, folder_src_sub.name())
            .map_err(|err| DupeError::creation(folder_src_sub.name(), err))?;
        spec_cp_ctx.builder_cp_report.add_folder_created();

        spec_cp_ctx.q_tasks.push_back(SpecCopyTask {
            source: folder_src_sub,
            destination: folder_dst_sub,
        });
        spec_cp_ctx.builder_cp_report.add_expected();
    }
    Ok(())
}

fn copy_files<S: Storage + ?Sized>(
    spec_task: &SpecCopyTask,
    spec_cp_ctx: &mut SpecCopyContext<'_, S>,
) -> Result<(), DupeError> {
    let l_files = spec_cp_ctx
        .storage
        .files(&spec_task.source)?
        .collect::<Result<Vec<FileRef>, _>>()?;
    if l_files.is_empty() {
        return Ok(());
    }

    let storage = spec_cp_ctx.storage;
    let folder_dst = &spec_task.destination;
    let copy_one = |file: &FileRef| {
        storage
            .copy_file(file, file.name(), folder_dst)
            .map_err(|err| DupeError::creation(file.name(), err))
    };

    let l_copied = match &spec_cp_ctx.thread_pool {
        Some(thread_pool) if l_files.len() > 1 => thread_pool.install(|| {
            l_files
                .par_iter()
                .map(copy_one)
                .collect::<Result<Vec<_>, _>>()
        })?,
        _ => l_files
            .iter()
            .map(copy_one)
            .collect::<Result<Vec<_>, _>>()?,
    };

    spec_cp_ctx
        .builder_cp_report
        .add_files_copied(l_copied.len() as u64);
    Ok(())
}
