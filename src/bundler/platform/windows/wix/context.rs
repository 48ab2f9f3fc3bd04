//! Per-pass assembly context: scope, install location and shortcut folders.

use super::document::{DirectoryAnchor, RegistryEntry, RegistryRoot};
use super::id::directory_id;
use super::path::{KnownDirs, WixPath};
use super::WixToolset;
use crate::bundler::error::Result;
use crate::bundler::settings::{InstallScope, LauncherSettings, Settings, WixSettings};

/// Folder receiving launcher shortcuts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShortcutFolder {
    /// Start menu group.
    ProgramMenu,
    /// User desktop.
    Desktop,
}

impl ShortcutFolder {
    /// Every folder, in emission order.
    pub const ALL: [ShortcutFolder; 2] = [ShortcutFolder::ProgramMenu, ShortcutFolder::Desktop];

    /// Directory holding the shortcuts.
    pub fn root(self, menu_group: &str) -> WixPath {
        match self {
            ShortcutFolder::ProgramMenu => KnownDirs::program_menu().join(menu_group),
            ShortcutFolder::Desktop => KnownDirs::desktop(),
        }
    }

    /// Installer property toggling the shortcuts at install time.
    pub const fn property(self) -> &'static str {
        match self {
            ShortcutFolder::ProgramMenu => "INSTALL_STARTMENU_SHORTCUT",
            ShortcutFolder::Desktop => "INSTALL_DESKTOP_SHORTCUT",
        }
    }

    /// True when the package enables shortcuts in this folder.
    pub fn is_enabled(self, wix: &WixSettings) -> bool {
        match self {
            ShortcutFolder::ProgramMenu => wix.start_menu_shortcuts,
            ShortcutFolder::Desktop => wix.desktop_shortcuts,
        }
    }

    /// True when `launcher` asks for a shortcut in this folder.
    pub fn is_requested_by(self, launcher: &LauncherSettings) -> bool {
        match self {
            ShortcutFolder::ProgramMenu => launcher.menu,
            ShortcutFolder::Desktop => launcher.shortcut,
        }
    }
}

/// Inputs shared by every stage of one generation pass.
#[derive(Clone, Debug)]
pub struct AssemblyContext {
    /// Target grammar.
    pub toolset: WixToolset,
    /// Per-user or per-machine.
    pub scope: InstallScope,
    /// Well-known directories for the target bitness.
    pub known: KnownDirs,
    /// Location of `INSTALLDIR` under `TARGETDIR`.
    pub install_dir: WixPath,
    /// Product registry key.
    pub registry_key: String,
    /// Start menu group.
    pub menu_group: String,
    /// Enabled shortcut folders.
    pub shortcut_folders: Vec<ShortcutFolder>,
    /// Target bitness.
    pub is_64bit: bool,
}

impl AssemblyContext {
    /// Context for `settings` targeting `toolset`.
    pub fn new(settings: &Settings, toolset: WixToolset) -> Result<Self> {
        let is_64bit = settings.binary_arch().is_64bit();
        let known = KnownDirs::new(is_64bit);
        let scope = settings.wix().install_scope;
        let base = match scope {
            InstallScope::PerMachine => known.program_files().clone(),
            InstallScope::PerUser => KnownDirs::local_program_files(),
        };
        let install_dir = base.join(settings.windows_install_dir());
        install_dir.validate()?;

        let shortcut_folders = ShortcutFolder::ALL
            .into_iter()
            .filter(|folder| folder.is_enabled(settings.wix()))
            .collect();

        Ok(Self {
            toolset,
            scope,
            known,
            install_dir,
            registry_key: settings.registry_key(),
            menu_group: settings.menu_group().to_string(),
            shortcut_folders,
            is_64bit,
        })
    }

    /// True for per-user installs.
    pub fn is_per_user(&self) -> bool {
        self.scope == InstallScope::PerUser
    }

    /// Directory id of `dir`. The install location maps to `INSTALLDIR`.
    pub fn directory_id(&self, dir: &WixPath) -> Result<String> {
        if *dir == self.install_dir {
            return Ok(super::path::INSTALLDIR.to_string());
        }
        directory_id(dir, &self.known)
    }

    /// Reference to `dir` from a component or declaration.
    pub fn directory_anchor(&self, dir: &WixPath) -> Result<DirectoryAnchor> {
        Ok(DirectoryAnchor {
            id: self.directory_id(dir)?,
            standard: self.toolset.has_standard_directory() && self.known.is_system_dir(dir),
        })
    }

    /// Hive for registry entries owned by `dir`.
    pub fn registry_root(&self, dir: &WixPath) -> RegistryRoot {
        if self.is_per_user() || KnownDirs::is_user_profile_dir(dir) {
            RegistryRoot::CurrentUser
        } else {
            RegistryRoot::LocalMachine
        }
    }

    /// `ProductCode` value under the product key, used as a registry key path.
    pub fn product_code_entry(&self, dir: &WixPath) -> RegistryEntry {
        RegistryEntry {
            root: self.registry_root(dir),
            key: self.registry_key.clone(),
            name: "ProductCode".to_string(),
            value: "[ProductCode]".to_string(),
            create_and_remove: !self.toolset.has_wix36_features(),
        }
    }

    /// Enabled folder whose root contains `path`.
    pub fn shortcut_folder_for(&self, path: &WixPath) -> Option<ShortcutFolder> {
        self.shortcut_folders
            .iter()
            .copied()
            .find(|folder| path.starts_with(&folder.root(&self.menu_group)))
    }
}
