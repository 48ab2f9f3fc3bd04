//! Fragment assembly.
//!
//! Drives one generation pass: plans the layout transform, rebuilds the
//! directory tree, assembles every component through a
//! [`ComponentAssembler`] and groups the results into the document graph.

use super::component::{ComponentAssembler, FileAssociation};
use super::context::AssemblyContext;
use super::directories::DirectoryTree;
use super::document::{
    BranchLevel, Component, ComponentGroup, DirectoryAnchor, DirectoryBranch, DirectoryCleaner,
    DirectoryDecl, Fragment, IconDecl, Property, RegistryEntry, WixDocument,
};
use super::id::{custom_id, Id};
use super::path::{WixPath, TARGETDIR};
use super::service::LauncherService;
use super::WixToolset;
use crate::bail;
use crate::bundler::error::{Context, Result};
use crate::bundler::layout::{ApplicationLayout, InstallLayout, InstallableFile, LayoutTransform};
use crate::bundler::settings::Settings;

/// Component group of installed files and directories.
pub const FILES_GROUP: &str = "Files";
/// Component group of launcher shortcuts.
pub const SHORTCUTS_GROUP: &str = "Shortcuts";
/// Component group of file type registrations.
pub const FILE_ASSOCIATIONS_GROUP: &str = "FileAssociations";

/// Assembles the document graph for one application image.
pub struct FragmentAssembler<'a> {
    settings: &'a Settings,
    ctx: AssemblyContext,
}

impl<'a> FragmentAssembler<'a> {
    /// Assembler for `settings` targeting `toolset`.
    pub fn new(settings: &'a Settings, toolset: WixToolset) -> Result<Self> {
        Ok(Self {
            settings,
            ctx: AssemblyContext::new(settings, toolset)?,
        })
    }

    /// Runs the pass.
    pub fn assemble(&self) -> Result<WixDocument> {
        let layout = if self.settings.wix().runtime_installer {
            ApplicationLayout::runtime_only()
        } else {
            ApplicationLayout::platform_app_image()
        };
        let source = layout.resolve_source(self.settings.app_image());
        let install = layout.resolve_install(&WixPath::installdir());

        let (associations, icon_files) = self.file_associations(&install);
        let services = self.services(&install);
        let service_installer = self.service_installer(&install, &services)?;

        let mut transform = LayoutTransform::plan(&source, &install)
            .with_context(|| format!("planning {}", self.settings.app_image().display()))?;
        for file in &icon_files {
            transform.add_file(file);
        }
        if let Some(file) = &service_installer {
            transform.add_file(file);
        }

        let tree = DirectoryTree::from_events(transform.events())?;
        log::debug!(
            "{} directories, {} empty",
            tree.directories().count(),
            tree.empty_directories().count()
        );

        let mut assembler = ComponentAssembler::new(&self.ctx);
        let mut main = Fragment::default();

        let ids = self.add_file_associations(&mut assembler, &mut main, &associations)?;
        main.push(ComponentGroup::new(FILE_ASSOCIATIONS_GROUP, ids));

        let ids = self.add_shortcuts(&mut assembler, &mut main, &install)?;
        main.push(ComponentGroup::new(SHORTCUTS_GROUP, ids));

        let mut ids = Vec::new();
        for (src, dst) in transform.files() {
            let registrations = match &service_installer {
                Some(installer) if installer.install_path == *dst => services
                    .iter()
                    .map(LauncherService::service_install)
                    .collect::<Result<Vec<_>>>()?,
                _ => Vec::new(),
            };
            let component = assembler.add_file(src, dst, registrations)?;
            ids.push(push_component(&mut main, component));
        }
        ids.extend(self.add_directory_hierarchy(&mut assembler, &mut main, &tree)?);
        main.push(self.root_branch(&self.ctx.install_dir)?);
        if self.ctx.toolset.has_wix36_features() {
            let cleaner = self.directory_cleaner()?;
            ids.push(Some(cleaner.component_id.clone()));
            main.push(cleaner);
        }
        for service in &services {
            let component = assembler.add_service_config(service)?;
            ids.push(push_component(&mut main, component));
        }
        main.push(ComponentGroup::new(FILES_GROUP, ids));

        for folder in &self.ctx.shortcut_folders {
            main.push(Property {
                id: folder.property().to_string(),
                value: "1".to_string(),
            });
        }

        let mut fragments = vec![main];
        let icons = self.icons(&transform)?;
        if !icons.items.is_empty() {
            fragments.push(icons);
        }

        Ok(WixDocument {
            toolset: self.ctx.toolset.clone(),
            is_64bit: self.ctx.is_64bit,
            fragments,
        })
    }

    /// Resolves configured associations, along with the icon files they add
    /// to the image. Empty extensions, missing icons and associations left
    /// without extensions are dropped.
    fn file_associations(
        &self,
        install: &InstallLayout,
    ) -> (Vec<FileAssociation>, Vec<InstallableFile>) {
        let launchers_dir = install.launchers_directory();
        let icons_dir = install.desktop_integration_directory();
        let mut icon_files = Vec::new();

        let associations = self
            .settings
            .file_associations()
            .iter()
            .filter_map(|fa| {
                let extensions: Vec<String> = fa
                    .extensions
                    .iter()
                    .filter(|ext| !ext.is_empty())
                    .cloned()
                    .collect();
                if extensions.is_empty() {
                    log::warn!(
                        "Dropping file association of {} without extensions",
                        fa.launcher
                    );
                    return None;
                }

                let icon = match &fa.icon {
                    Some(icon) if icon.exists() => {
                        let install_path =
                            icons_dir.join(format!("fa_{}.ico", extensions.join("_")));
                        icon_files.push(InstallableFile {
                            src: icon.clone(),
                            install_path: install_path.clone(),
                        });
                        Some(install_path)
                    }
                    Some(icon) => {
                        log::warn!("Ignoring missing icon {}", icon.display());
                        None
                    }
                    None => None,
                };

                Some(FileAssociation {
                    launcher_path: launchers_dir.join(&fa.launcher).with_suffix(".exe"),
                    extensions,
                    icon,
                    description: fa.description.clone(),
                    mime_types: fa.mime_types.clone(),
                })
            })
            .collect();
        (associations, icon_files)
    }

    fn services(&self, install: &InstallLayout) -> Vec<LauncherService> {
        let launchers_dir = install.launchers_directory();
        self.settings
            .launchers()
            .iter()
            .filter(|launcher| launcher.service)
            .map(|launcher| LauncherService::new(launcher, &launchers_dir))
            .collect()
    }

    fn service_installer(
        &self,
        install: &InstallLayout,
        services: &[LauncherService],
    ) -> Result<Option<InstallableFile>> {
        if services.is_empty() {
            return Ok(None);
        }
        let Some(installer) = self.settings.service_installer() else {
            bail!("launchers registered as services require a service installer");
        };
        Ok(Some(InstallableFile {
            src: installer.source.clone(),
            install_path: install.launchers_directory().join(&installer.install_path),
        }))
    }

    fn add_file_associations(
        &self,
        assembler: &mut ComponentAssembler<'_>,
        fragment: &mut Fragment,
        associations: &[FileAssociation],
    ) -> Result<Vec<Option<String>>> {
        let mut ids = Vec::new();
        for association in associations {
            for extension in &association.extensions {
                let component = assembler.add_prog_id(association, extension)?;
                ids.push(push_component(fragment, component));
            }
        }
        Ok(ids)
    }

    fn add_shortcuts(
        &self,
        assembler: &mut ComponentAssembler<'_>,
        fragment: &mut Fragment,
        install: &InstallLayout,
    ) -> Result<Vec<Option<String>>> {
        let launchers_dir = install.launchers_directory();
        let mut ids = Vec::new();
        let mut used = Vec::new();
        for launcher in self.settings.launchers() {
            let launcher_path = launchers_dir.join(&launcher.name).with_suffix(".exe");
            for folder in &self.ctx.shortcut_folders {
                if folder.is_requested_by(launcher) {
                    let component = assembler.add_shortcut(&launcher_path, *folder)?;
                    ids.push(push_component(fragment, component));
                    if !used.contains(folder) {
                        used.push(*folder);
                    }
                }
            }
        }

        // Only folders that received a shortcut are declared
        for folder in self.ctx.shortcut_folders.iter().filter(|f| used.contains(*f)) {
            let root = folder.root(&self.ctx.menu_group);
            if !self.ctx.toolset.has_standard_directory() || !self.ctx.known.is_system_dir(&root) {
                fragment.push(self.root_branch(&root)?);
            }
        }
        Ok(ids)
    }

    /// Creation components for empty directories, removal components for
    /// populated directories without a marker (per-user only), and a
    /// declaration of every directory below `INSTALLDIR`.
    fn add_directory_hierarchy(
        &self,
        assembler: &mut ComponentAssembler<'_>,
        fragment: &mut Fragment,
        tree: &DirectoryTree,
    ) -> Result<Vec<Option<String>>> {
        let mut ids = Vec::new();
        for dir in tree.empty_directories() {
            let component = assembler.add_create_folder(dir)?;
            ids.push(push_component(fragment, component));
        }

        if self.ctx.is_per_user() {
            let unmarked: Vec<&WixPath> = tree
                .populated_directories()
                .filter(|dir| !assembler.has_removal_marker(dir))
                .collect();
            for dir in unmarked {
                let component = assembler.add_remove_folder(dir)?;
                ids.push(push_component(fragment, component));
            }
        }

        for dir in tree.directories() {
            let chain = tree.ancestor_chain(dir);
            let Some(parent) = chain.get(1) else {
                continue;
            };
            fragment.push(DirectoryDecl {
                parent: self.ctx.directory_anchor(parent)?,
                id: self.ctx.directory_id(dir)?,
                name: dir.file_name().unwrap_or_default().to_string(),
            });
        }
        Ok(ids)
    }

    /// Nested declarations from `TARGETDIR` down to `path`.
    ///
    /// Grammars with standard directories drop the `TARGETDIR` level and
    /// reference OS-standard folders directly. Well-known levels carry no
    /// display name.
    pub fn root_branch(&self, path: &WixPath) -> Result<DirectoryBranch> {
        path.validate()?;
        if path.root() != Some(TARGETDIR) {
            return Err(path.invalid());
        }

        let standard = self.ctx.toolset.has_standard_directory();
        let anchor = (!standard).then(|| DirectoryAnchor {
            id: TARGETDIR.to_string(),
            standard: false,
        });

        let segments = path.segments();
        let mut levels = Vec::new();
        for depth in 2..=segments.len() {
            let level = WixPath::from_segments(segments[..depth].iter().cloned());
            let system = self.ctx.known.is_system_dir(&level);
            levels.push(BranchLevel {
                id: self.ctx.directory_id(&level)?,
                name: (!system).then(|| segments[depth - 1].clone()),
                standard: standard && system,
            });
        }
        Ok(DirectoryBranch { anchor, levels })
    }

    /// Recursive-removal helper for `INSTALLDIR`.
    fn directory_cleaner(&self) -> Result<DirectoryCleaner> {
        let installdir = WixPath::installdir();
        let base = custom_id(&installdir, "rm_rf")?;
        let property = base.to_uppercase();
        log::debug!("Using WiX 3.6 RemoveFolderEx for {}", self.ctx.install_dir);
        Ok(DirectoryCleaner {
            search_id: custom_id(&installdir, "regsearch")?,
            component_id: format!("c{base}"),
            directory: self.ctx.directory_anchor(&installdir)?,
            registry: RegistryEntry {
                root: self.ctx.registry_root(&installdir),
                key: self.ctx.registry_key.clone(),
                name: property.clone(),
                value: self.ctx.known.to_formatted(&installdir)?,
                create_and_remove: false,
            },
            property,
        })
    }

    /// One declaration per installed `.ico` file.
    fn icons(&self, transform: &LayoutTransform) -> Result<Fragment> {
        let mut fragment = Fragment::default();
        for (src, dst) in transform.files() {
            let is_icon = dst
                .file_name()
                .is_some_and(|name| name.to_lowercase().ends_with(".ico"));
            if is_icon {
                fragment.push(IconDecl {
                    id: Id::Icon.of(dst).context("deriving icon id")?,
                    source: src.to_path_buf(),
                });
            }
        }
        Ok(fragment)
    }
}

fn push_component(fragment: &mut Fragment, component: Component) -> Option<String> {
    let id = component.id.clone();
    fragment.push(component);
    Some(id)
}
