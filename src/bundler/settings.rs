//! Configuration structures for fragment generation.
//!
//! This module provides the configuration types for turning an application
//! image into a WiX fragment: package metadata, installer settings, launcher
//! and file association descriptors, and a builder for [`Settings`].
//!
//! Settings are usually loaded from a TOML file:
//!
//! ```toml
//! [package]
//! product_name = "MyApp"
//! version = "1.0.0"
//! vendor = "Example Inc."
//!
//! [wix]
//! toolset_version = "3.14.0"
//! install_scope = "perUser"
//! desktop_shortcuts = true
//!
//! [[launcher]]
//! name = "MyApp"
//! shortcut = true
//! ```

use crate::bundler::error::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CPU architecture of the installed binaries.
///
/// Only the bitness matters to the fragment: it selects the Program Files
/// folder and the component bitness attribute.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize)]
pub enum Arch {
    /// x86_64 / AMD64 (64-bit)
    #[default]
    #[serde(rename = "x86_64")]
    X86_64,
    /// x86 / i686 (32-bit)
    #[serde(rename = "x86")]
    X86,
    /// AArch64 / ARM64 (64-bit)
    #[serde(rename = "aarch64")]
    AArch64,
}

impl Arch {
    /// True for 64-bit targets.
    pub fn is_64bit(self) -> bool {
        !matches!(self, Arch::X86)
    }
}

/// Package metadata.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_wix::bundler::PackageSettings;
///
/// let settings = PackageSettings {
///     product_name: "MyApp".into(),
///     version: "1.0.0".into(),
///     vendor: "Example Inc.".into(),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PackageSettings {
    /// Product name displayed to users.
    pub product_name: String,

    /// Version string, e.g. "1.0.0".
    pub version: String,

    /// Brief description of the application.
    pub description: String,

    /// Vendor, part of the product registry key.
    pub vendor: String,
}

/// Installation scope.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InstallScope {
    /// Per-user installation under `LocalAppDataFolder`.
    PerUser,

    /// Per-machine installation under Program Files.
    #[default]
    PerMachine,
}

/// WiX fragment configuration.
///
/// # Configuration
///
/// ```toml
/// [wix]
/// toolset_version = "4.0.5"
/// install_scope = "perMachine"
/// install_dir = "Example\\MyApp"
/// menu_group = "Example"
/// start_menu_shortcuts = true
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct WixSettings {
    /// WiX toolset version the fragment targets.
    ///
    /// Default: "3.11.0"
    pub toolset_version: String,

    /// Per-user or per-machine installation.
    ///
    /// Default: per-machine
    pub install_scope: InstallScope,

    /// Installation directory relative to Program Files or LocalAppData.
    ///
    /// Default: None (uses the product name)
    pub install_dir: Option<String>,

    /// Start menu group holding the menu shortcuts.
    ///
    /// Default: None (uses "Unknown")
    pub menu_group: Option<String>,

    /// Create start menu shortcuts for launchers that ask for one.
    pub start_menu_shortcuts: bool,

    /// Create desktop shortcuts for launchers that ask for one.
    pub desktop_shortcuts: bool,

    /// The image is a bare runtime without launchers.
    pub runtime_installer: bool,

    /// Target architecture.
    pub arch: Arch,
}

impl Default for WixSettings {
    fn default() -> Self {
        Self {
            toolset_version: "3.11.0".to_string(),
            install_scope: InstallScope::default(),
            install_dir: None,
            menu_group: None,
            start_menu_shortcuts: false,
            desktop_shortcuts: false,
            runtime_installer: false,
            arch: Arch::default(),
        }
    }
}

/// An application launcher in the image.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct LauncherSettings {
    /// Launcher name without the `.exe` suffix.
    pub name: String,

    /// Description, used as the service description.
    pub description: Option<String>,

    /// Add a start menu shortcut.
    pub menu: bool,

    /// Add a desktop shortcut.
    pub shortcut: bool,

    /// Register the launcher as a background service.
    pub service: bool,
}

impl LauncherSettings {
    /// Launcher with the given name and no integration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A file type associated with one of the launchers.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileAssociationSettings {
    /// Launcher opening the files.
    pub launcher: String,

    /// File extensions without the leading dot.
    pub extensions: Vec<String>,

    /// Icon file on the build host.
    pub icon: Option<PathBuf>,

    /// Description of the file type.
    pub description: String,

    /// MIME types of the file type.
    pub mime_types: Vec<String>,
}

/// Tool installing launchers as services.
#[derive(Clone, Debug, Deserialize)]
pub struct ServiceInstallerSettings {
    /// Tool executable on the build host.
    pub source: PathBuf,

    /// Installed file name, relative to the launchers directory.
    pub install_path: String,
}

/// Complete configuration file.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct FragmentConfig {
    /// `[package]`
    pub package: PackageSettings,

    /// `[wix]`
    pub wix: WixSettings,

    /// `[[launcher]]`
    #[serde(rename = "launcher")]
    pub launchers: Vec<LauncherSettings>,

    /// `[[file_association]]`
    #[serde(rename = "file_association")]
    pub file_associations: Vec<FileAssociationSettings>,

    /// `[service_installer]`
    pub service_installer: Option<ServiceInstallerSettings>,
}

impl FragmentConfig {
    /// Parses a TOML configuration document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| crate::bundler::Error::GenericError(e.to_string()))
            .context("parsing fragment configuration")
    }

    /// Starts a [`SettingsBuilder`] populated from this configuration.
    pub fn into_builder(self) -> SettingsBuilder {
        let mut builder = SettingsBuilder::new()
            .package_settings(self.package)
            .wix_settings(self.wix)
            .launchers(self.launchers)
            .file_associations(self.file_associations);
        if let Some(installer) = self.service_installer {
            builder = builder.service_installer(installer);
        }
        builder
    }
}

/// Validated settings for one generation pass.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_wix::bundler::{PackageSettings, SettingsBuilder};
///
/// # fn example() -> kodegen_bundler_wix::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .app_image("target/release/app-image")
///     .package_settings(PackageSettings {
///         product_name: "MyApp".into(),
///         version: "1.0.0".into(),
///         vendor: "Example Inc.".into(),
///         ..Default::default()
///     })
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Settings {
    package: PackageSettings,
    wix: WixSettings,
    app_image: PathBuf,
    launchers: Vec<LauncherSettings>,
    file_associations: Vec<FileAssociationSettings>,
    service_installer: Option<ServiceInstallerSettings>,
}

impl Settings {
    /// Returns the product name.
    pub fn product_name(&self) -> &str {
        &self.package.product_name
    }

    /// Returns the version string.
    pub fn version_string(&self) -> &str {
        &self.package.version
    }

    /// Returns the vendor.
    pub fn vendor(&self) -> &str {
        &self.package.vendor
    }

    /// Root of the application image on the build host.
    pub fn app_image(&self) -> &Path {
        &self.app_image
    }

    /// Returns the WiX settings.
    pub fn wix(&self) -> &WixSettings {
        &self.wix
    }

    /// Returns the launchers. Empty for runtime installers.
    pub fn launchers(&self) -> &[LauncherSettings] {
        if self.wix.runtime_installer {
            return &[];
        }
        &self.launchers
    }

    /// Returns the file associations.
    pub fn file_associations(&self) -> &[FileAssociationSettings] {
        &self.file_associations
    }

    /// Returns the service installer, if any.
    pub fn service_installer(&self) -> Option<&ServiceInstallerSettings> {
        self.service_installer.as_ref()
    }

    /// Returns the target architecture.
    pub fn binary_arch(&self) -> Arch {
        self.wix.arch
    }

    /// `Software\<vendor>\<product>\<version>`
    pub fn registry_key(&self) -> String {
        format!(
            "Software\\{}\\{}\\{}",
            self.package.vendor, self.package.product_name, self.package.version
        )
    }

    /// Start menu group name.
    pub fn menu_group(&self) -> &str {
        self.wix.menu_group.as_deref().unwrap_or("Unknown")
    }

    /// Installation directory relative to Program Files or LocalAppData.
    ///
    /// Values containing a drive separator or `..` are rejected in favor of
    /// the product name; one leading and one trailing `\` are stripped.
    pub fn windows_install_dir(&self) -> String {
        if let Some(dir) = &self.wix.install_dir {
            if dir.contains(':') || dir.contains("..") {
                log::error!(
                    "Invalid installation directory \"{}\", using \"{}\" instead",
                    dir,
                    self.package.product_name
                );
            } else {
                let dir = dir.strip_prefix('\\').unwrap_or(dir);
                let dir = dir.strip_suffix('\\').unwrap_or(dir);
                return dir.to_string();
            }
        }
        self.package.product_name.clone()
    }
}

/// Builder for constructing [`Settings`].
///
/// # See Also
///
/// - [`Settings`] - The built settings struct
/// - [`FragmentConfig::into_builder`] - Builder from a configuration file
#[derive(Default)]
pub struct SettingsBuilder {
    app_image: Option<PathBuf>,
    package_settings: Option<PackageSettings>,
    wix: WixSettings,
    launchers: Vec<LauncherSettings>,
    file_associations: Vec<FileAssociationSettings>,
    service_installer: Option<ServiceInstallerSettings>,
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the application image directory.
    ///
    /// # Required
    ///
    /// This field is required for building.
    pub fn app_image<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.app_image = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets package metadata.
    ///
    /// # Required
    ///
    /// This field is required for building.
    pub fn package_settings(mut self, settings: PackageSettings) -> Self {
        self.package_settings = Some(settings);
        self
    }

    /// Sets WiX configuration.
    ///
    /// Default: [`WixSettings::default`]
    pub fn wix_settings(mut self, settings: WixSettings) -> Self {
        self.wix = settings;
        self
    }

    /// Sets the launchers.
    pub fn launchers(mut self, launchers: Vec<LauncherSettings>) -> Self {
        self.launchers = launchers;
        self
    }

    /// Sets the file associations.
    pub fn file_associations(mut self, associations: Vec<FileAssociationSettings>) -> Self {
        self.file_associations = associations;
        self
    }

    /// Sets the service installer tool.
    pub fn service_installer(mut self, installer: ServiceInstallerSettings) -> Self {
        self.service_installer = Some(installer);
        self
    }

    /// Builds the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if `app_image` or `package_settings` is missing, or
    /// if the product name is empty.
    pub fn build(self) -> Result<Settings> {
        let package = self
            .package_settings
            .context("package_settings is required")?;
        if package.product_name.is_empty() {
            crate::bail!("product name must not be empty");
        }

        Ok(Settings {
            package,
            wix: self.wix,
            app_image: self.app_image.context("app_image is required")?,
            launchers: self.launchers,
            file_associations: self.file_associations,
            service_installer: self.service_installer,
        })
    }
}
