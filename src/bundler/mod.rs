//! WiX fragment generation for Windows application images.
//!
//! This module turns an application image (launchers, application files and
//! a bundled runtime laid out in one directory) into a WiX source fragment
//! that an MSI build includes through its component groups.
//!
//! # Configuration
//!
//! Generation is configured with a TOML document:
//!
//! ```toml
//! [package]
//! product_name = "MyApp"
//! version = "1.0.0"
//! vendor = "Example Inc."
//!
//! [wix]
//! toolset_version = "3.14.0"
//! install_scope = "perMachine"
//! start_menu_shortcuts = true
//!
//! [[launcher]]
//! name = "MyApp"
//! menu = true
//!
//! [[file_association]]
//! launcher = "MyApp"
//! extensions = ["myapp"]
//! mime_types = ["application/x-myapp"]
//! ```
//!
//! # Output
//!
//! | Component group | Contents |
//! |-----------------|----------|
//! | `Files` | files, directories, cleanup helper, service configuration |
//! | `Shortcuts` | start menu and desktop shortcuts |
//! | `FileAssociations` | ProgIds with extensions and verbs |
//!
//! # Integration
//!
//! ```no_run
//! use kodegen_bundler_wix::bundler::{wix, FragmentConfig};
//!
//! # fn example() -> kodegen_bundler_wix::bundler::Result<()> {
//! let contents = std::fs::read_to_string("wix.toml")?;
//! let settings = FragmentConfig::from_toml_str(&contents)?
//!     .into_builder()
//!     .app_image("target/app-image")
//!     .build()?;
//!
//! let document = wix::generate(&settings)?;
//! std::fs::write("app-content.wxs", wix::writer::to_string(&document)?)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod error;
pub mod layout;
pub(crate) mod platform;
mod settings;

// Public re-exports
pub use error::{Context, Error, ErrorExt, Result};
pub use platform::windows::wix;
pub use settings::{
    // Architecture detection
    Arch,
    // Configuration file
    FragmentConfig,
    InstallScope,
    // Application image descriptors
    FileAssociationSettings,
    LauncherSettings,
    PackageSettings,
    ServiceInstallerSettings,
    // Main configuration types
    Settings,
    SettingsBuilder,
    WixSettings,
};
