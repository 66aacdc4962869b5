//! Template folder resolution.

use crate::spec::{DupeError, EnumLocateMode, EnumStorageErrorKind, SpecLocateOptions};
use crate::storage::{FolderRef, Storage};
use crate::util::TypeMarkerPattern;

/// A resolved template together with the folder its copy is created under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecLocatedTemplate {
    /// Folder to duplicate.
    pub template: FolderRef,
    /// Folder the new destination is provisioned under.
    pub anchor: FolderRef,
}

/// Resolves a job selector into a [`SpecLocatedTemplate`].
#[derive(Debug, Clone)]
pub struct TemplateLocator {
    rule_locate: EnumLocateMode,
    marker: TypeMarkerPattern,
}

impl TemplateLocator {
    /// Compile the marker pattern up front so a bad pattern fails before any job runs.
    pub fn new(options: &SpecLocateOptions) -> Result<Self, DupeError> {
        Ok(Self {
            rule_locate: options.rule_locate,
            marker: TypeMarkerPattern::compile(&options.marker, options.rule_marker)?,
        })
    }

    pub fn rule_locate(&self) -> EnumLocateMode {
        self.rule_locate
    }

    /// Resolve `selector` according to the configured strategy.
    pub fn locate<S: Storage + ?Sized>(
        &self,
        storage: &S,
        selector: &str,
    ) -> Result<SpecLocatedTemplate, DupeError> {
        let selector = selector.trim();
        if selector.is_empty() {
            return Err(DupeError::Locate {
                selector: selector.to_string(),
                message: "Empty selector.".to_string(),
            });
        }

        match self.rule_locate {
            EnumLocateMode::ByNameUnderRoot => {
                let root = resolve_folder(storage, selector)?;
                let template = self.locate_by_name_under_root(storage, &root)?;
                Ok(SpecLocatedTemplate {
                    template,
                    anchor: root,
                })
            }
            EnumLocateMode::ByIdentifier => {
                let (template, parent) = locate_by_identifier(storage, selector)?;
                let anchor = parent.ok_or_else(|| DupeError::Locate {
                    selector: selector.to_string(),
                    message: "Template has no parent folder to place the copy in.".to_string(),
                })?;
                Ok(SpecLocatedTemplate { template, anchor })
            }
        }
    }

    /// First immediate child of `root` whose name matches the marker.
    ///
    /// Ties are broken by storage enumeration order, which is not guaranteed stable.
    pub fn locate_by_name_under_root<S: Storage + ?Sized>(
        &self,
        storage: &S,
        root: &FolderRef,
    ) -> Result<FolderRef, DupeError> {
        for _folder_res in storage.folders(root)? {
            let folder = _folder_res?;
            if self.marker.is_match(folder.name()) {
                tracing::debug!(root = root.id(), template = folder.id(), "template found");
                return Ok(folder);
            }
        }
        Err(DupeError::Locate {
            selector: root.id().to_string(),
            message: format!(
                "No child folder of {:?} matches marker {:?}.",
                root.name(),
                self.marker.as_text()
            ),
        })
    }
}

/// Resolve a folder by identifier and its first parent, if any.
///
/// Only the first parent in storage enumeration order is returned.
pub fn locate_by_identifier<S: Storage + ?Sized>(
    storage: &S,
    id: &str,
) -> Result<(FolderRef, Option<FolderRef>), DupeError> {
    let folder = resolve_folder(storage, id)?;
    let parent = storage.parents(&folder)?.next().transpose()?;
    Ok((folder, parent))
}

/// Resolve a folder by identifier, mapping "not found" to a locate error.
pub fn resolve_folder<S: Storage + ?Sized>(storage: &S, id: &str) -> Result<FolderRef, DupeError> {
    storage.folder_by_id(id).map_err(|err| match err.kind {
        EnumStorageErrorKind::NotFound => DupeError::Locate {
            selector: id.to_string(),
            message: err.message,
        },
        _ => DupeError::Storage(err),
    })
}

#[cfg(test)]
mod tests {
    use super::{TemplateLocator, locate_by_identifier};
    use crate::memory::MemoryStorage;
    use crate::spec::{DupeError, EnumLocateMode, EnumMarkerPatternMode, SpecLocateOptions};

    #[test]
    fn by_name_returns_first_match_and_anchors_at_root() {
        let storage = MemoryStorage::new();
        let root = storage.add_folder(None, "clients");
        storage.add_folder(Some(&root), "archive");
        let tpl_first = storage.add_folder(Some(&root), "TEMPLATE - new client");
        storage.add_folder(Some(&root), "old TEMPLATE");

        let locator = TemplateLocator::new(&SpecLocateOptions::default()).expect("locator");
        let located = locator.locate(&storage, root.id()).expect("locate");

        assert_eq!(located.template, tpl_first);
        assert_eq!(located.anchor, root);
    }

    #[test]
    fn by_name_without_match_is_locate_error() {
        let storage = MemoryStorage::new();
        let root = storage.add_folder(None, "clients");
        storage.add_folder(Some(&root), "archive");

        let locator = TemplateLocator::new(&SpecLocateOptions::default()).expect("locator");
        let err = locator.locate(&storage, root.id()).expect_err("no match");
        assert!(matches!(err, DupeError::Locate { .. }));
    }

    #[test]
    fn by_name_with_regex_marker() {
        let storage = MemoryStorage::new();
        let root = storage.add_folder(None, "clients");
        storage.add_folder(Some(&root), "template-draft");
        let tpl = storage.add_folder(Some(&root), "template-v3");

        let locator = TemplateLocator::new(&SpecLocateOptions {
            marker: r"^template-v\d+$".to_string(),
            rule_marker: EnumMarkerPatternMode::Regex,
            ..SpecLocateOptions::default()
        })
        .expect("locator");
        let located = locator.locate(&storage, root.id()).expect("locate");
        assert_eq!(located.template, tpl);
    }

    #[test]
    fn by_identifier_uses_first_parent() {
        let storage = MemoryStorage::new();
        let home = storage.add_folder(None, "home");
        let shared = storage.add_folder(None, "shared");
        let tpl = storage.add_folder(Some(&home), "tpl");
        storage.add_parent(&tpl, &shared);

        let (folder, parent) = locate_by_identifier(&storage, tpl.id()).expect("locate");
        assert_eq!(folder, tpl);
        assert_eq!(parent, Some(home.clone()));

        let locator = TemplateLocator::new(&SpecLocateOptions {
            rule_locate: EnumLocateMode::ByIdentifier,
            ..SpecLocateOptions::default()
        })
        .expect("locator");
        let located = locator.locate(&storage, tpl.id()).expect("locate");
        assert_eq!(located.anchor, home);
    }

    #[test]
    fn by_identifier_without_parent_or_unknown_id_fails() {
        let storage = MemoryStorage::new();
        let orphan = storage.add_folder(None, "orphan");
        let locator = TemplateLocator::new(&SpecLocateOptions {
            rule_locate: EnumLocateMode::ByIdentifier,
            ..SpecLocateOptions::default()
        })
        .expect("locator");

        assert!(matches!(
            locator.locate(&storage, orphan.id()),
            Err(DupeError::Locate { .. })
        ));
        assert!(matches!(
            locator.locate(&storage, "folder-404"),
            Err(DupeError::Locate { .. })
        ));
        assert!(matches!(
            locator.locate(&storage, "  "),
            Err(DupeError::Locate { .. })
        ));
    }
}
