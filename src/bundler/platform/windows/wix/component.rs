//! Component assembly.
//!
//! Every installed artifact becomes exactly one [`Component`]. The assembler
//! decides the owning directory, the key path and the removal marker of each
//! component, and carries the per-pass state those decisions need: the
//! per-directory marker counters and the set of MIME types already declared
//! as default.

use super::context::{AssemblyContext, ShortcutFolder};
use super::document::{Component, Element, Extension, KeyPath, RemovalMarker, Verb};
use super::id::{component_guid, custom_id, Id};
use super::path::{WixPath, INSTALLDIR};
use super::service::{LauncherService, ServiceInstall};
use crate::bundler::error::{Error, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Why a component exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Role {
    /// An installed file.
    File,
    /// A launcher shortcut.
    Shortcut,
    /// A file type registration.
    ProgId,
    /// An empty directory.
    CreateFolder,
    /// Removal of a populated directory on uninstall.
    RemoveFolder,
    /// Failure actions of a service.
    ServiceConfig,
}

/// Fixed behavior of a [`Role`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoleConfig {
    /// The component path names a file; its parent owns the component.
    pub is_file: bool,
    /// The component schedules its directory for removal on uninstall.
    pub marks_directory: bool,
}

impl Role {
    /// Configuration of this role.
    pub const fn config(self) -> RoleConfig {
        match self {
            Role::File | Role::Shortcut | Role::ProgId => RoleConfig {
                is_file: true,
                marks_directory: true,
            },
            Role::CreateFolder => RoleConfig {
                is_file: false,
                marks_directory: true,
            },
            Role::RemoveFolder => RoleConfig {
                is_file: false,
                marks_directory: false,
            },
            Role::ServiceConfig => RoleConfig {
                is_file: true,
                marks_directory: false,
            },
        }
    }

    /// Role tag salted into component GUIDs.
    pub const fn name(self) -> &'static str {
        match self {
            Role::File => "File",
            Role::Shortcut => "Shortcut",
            Role::ProgId => "ProgId",
            Role::CreateFolder => "CreateFolder",
            Role::RemoveFolder => "RemoveFolder",
            Role::ServiceConfig => "ServiceConfig",
        }
    }
}

/// Directory owning a component for `path` in `role`.
pub fn owning_directory(role: Role, path: &WixPath) -> Result<WixPath> {
    path.validate()?;
    if role.config().is_file {
        path.parent().ok_or_else(|| path.invalid())
    } else {
        Ok(path.clone())
    }
}

/// Id of the primary element for `path` in `role`.
pub fn element_id(role: Role, path: &WixPath) -> Result<String> {
    match role {
        Role::File => Id::File.of(path),
        Role::Shortcut => Id::Shortcut.of(path),
        Role::ProgId => Id::ProgId.of(path),
        Role::CreateFolder => Id::CreateFolder.of(path),
        Role::RemoveFolder => Id::RemoveFolder.of(path),
        Role::ServiceConfig => custom_id(path, "svccfg"),
    }
}

/// A file type handled by a launcher, resolved against the install layout.
#[derive(Clone, Debug)]
pub struct FileAssociation {
    /// Installed path of the launcher.
    pub launcher_path: WixPath,
    /// Extensions without the dot. Never empty.
    pub extensions: Vec<String>,
    /// Installed path of the icon.
    pub icon: Option<WixPath>,
    /// File type description.
    pub description: String,
    /// MIME types, the first one being the content type.
    pub mime_types: Vec<String>,
}

/// Builds components for one generation pass.
#[derive(Debug)]
pub struct ComponentAssembler<'a> {
    ctx: &'a AssemblyContext,
    removal_counters: BTreeMap<WixPath, u32>,
    default_mimes: BTreeSet<String>,
}

impl<'a> ComponentAssembler<'a> {
    /// Assembler with fresh per-pass state.
    pub fn new(ctx: &'a AssemblyContext) -> Self {
        Self {
            ctx,
            removal_counters: BTreeMap::new(),
            default_mimes: BTreeSet::new(),
        }
    }

    /// True when some component already marked `dir` for removal.
    pub fn has_removal_marker(&self, dir: &WixPath) -> bool {
        self.removal_counters.contains_key(dir)
    }

    /// Assembles a component for `path` in `role`.
    ///
    /// `element` receives the element id and builds the role payload.
    pub fn add_component<F>(&mut self, path: &WixPath, role: Role, element: F) -> Result<Component>
    where
        F: FnOnce(String) -> Result<Element>,
    {
        let directory = owning_directory(role, path)?;

        let condition = match role {
            Role::Shortcut => {
                let folder = self.ctx.shortcut_folder_for(path).ok_or_else(|| {
                    Error::NoShortcutFolder {
                        path: path.to_string(),
                    }
                })?;
                Some(folder.property().to_string())
            }
            _ => None,
        };

        let key_path = if self.ctx.is_per_user() {
            KeyPath::Element
        } else {
            KeyPath::Registry(self.ctx.product_code_entry(&directory))
        };

        let removal_marker = if self.wants_removal_marker(role, &directory) {
            Some(self.next_removal_marker(&directory)?)
        } else {
            None
        };

        let element_id = element_id(role, path)?;
        let component = Component {
            id: format!("c{element_id}"),
            guid: component_guid(path, role.name())?,
            role,
            path: path.clone(),
            directory: self.ctx.directory_anchor(&directory)?,
            condition,
            key_path,
            removal_marker,
            element: element(element_id)?,
            services: Vec::new(),
        };
        log::trace!("Component {} for {} ({:?})", component.id, path, role);
        Ok(component)
    }

    /// File-like roles mark their directory in both scopes, empty directories
    /// only in per-user installs. Per-machine installs mark each directory
    /// once.
    fn wants_removal_marker(&self, role: Role, dir: &WixPath) -> bool {
        let config = role.config();
        if !config.marks_directory || self.ctx.known.is_known_dir(dir) {
            return false;
        }
        if self.ctx.is_per_user() {
            return true;
        }
        config.is_file && !self.has_removal_marker(dir)
    }

    fn next_removal_marker(&mut self, dir: &WixPath) -> Result<RemovalMarker> {
        let base = Id::RemoveFolder.of(dir)?;
        let counter = self.removal_counters.entry(dir.clone()).or_insert(0);
        let id = format!("{base}_{counter}");
        *counter += 1;
        Ok(RemovalMarker { id })
    }

    /// File installed from `src` to `dst`, registering `services` with it.
    pub fn add_file(
        &mut self,
        src: &Path,
        dst: &WixPath,
        services: Vec<ServiceInstall>,
    ) -> Result<Component> {
        let mut component = self.add_component(dst, Role::File, |id| {
            Ok(Element::File {
                id,
                source: src.to_path_buf(),
            })
        })?;
        component.services = services;
        Ok(component)
    }

    /// Shortcut to the launcher at `launcher_path` in `folder`.
    pub fn add_shortcut(
        &mut self,
        launcher_path: &WixPath,
        folder: ShortcutFolder,
    ) -> Result<Component> {
        if launcher_path.root() != Some(INSTALLDIR) {
            return Err(launcher_path.invalid());
        }
        let file_name = launcher_path.file_name().unwrap_or_default();
        let name = Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name)
            .to_string();
        let target = format!("[#{}]", Id::File.of(launcher_path)?);
        let path = folder.root(&self.ctx.menu_group).join(&name);

        self.add_component(&path, Role::Shortcut, |id| {
            Ok(Element::Shortcut {
                id,
                name,
                working_directory: INSTALLDIR.to_string(),
                target,
            })
        })
    }

    /// ProgId registering `extension` of `association`.
    ///
    /// The first MIME type becomes the content type. It is declared default
    /// only the first time any association uses it.
    pub fn add_prog_id(
        &mut self,
        association: &FileAssociation,
        extension: &str,
    ) -> Result<Component> {
        let launcher_name = association.launcher_path.file_name().unwrap_or_default();
        let path = WixPath::installdir().join(format!("{extension}_{launcher_name}"));
        let icon = association.icon.as_ref().map(|i| Id::File.of(i)).transpose()?;
        let target_file = Id::File.of(&association.launcher_path)?;

        let content_type = association.mime_types.first().cloned();
        let default_mime = content_type
            .clone()
            .filter(|mime| self.default_mimes.insert(mime.clone()));

        self.add_component(&path, Role::ProgId, |id| {
            Ok(Element::ProgId {
                id,
                description: association.description.clone(),
                icon,
                extension: Extension {
                    id: extension.to_string(),
                    content_type,
                    default_mime,
                    verb: Verb {
                        id: "open".to_string(),
                        command: "!(loc.ContextMenuCommandLabel)".to_string(),
                        argument: "\"%1\" %*".to_string(),
                        target_file,
                    },
                },
            })
        })
    }

    /// Creation of the empty directory `dir`.
    pub fn add_create_folder(&mut self, dir: &WixPath) -> Result<Component> {
        self.add_component(dir, Role::CreateFolder, |_| Ok(Element::CreateFolder))
    }

    /// Removal of the populated directory `dir` on uninstall.
    pub fn add_remove_folder(&mut self, dir: &WixPath) -> Result<Component> {
        self.add_component(dir, Role::RemoveFolder, |id| Ok(Element::RemoveFolder { id }))
    }

    /// Failure actions of `service`.
    pub fn add_service_config(&mut self, service: &LauncherService) -> Result<Component> {
        self.add_component(service.launcher_path(), Role::ServiceConfig, |_| {
            Ok(Element::ServiceConfig(service.service_config()))
        })
    }
}
