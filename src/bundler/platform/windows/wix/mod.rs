//! WiX source fragment generation.
//!
//! Turns a Windows application image into a `.wxs` fragment declaring every
//! installed file, directory, shortcut, file association and service. The
//! pipeline runs in one synchronous pass:
//!
//! 1. [`layout`](crate::bundler::layout) plans the copy and directory events
//! 2. [`directories`] rebuilds the directory tree from those events
//! 3. [`component`] turns each artifact into a component with a stable id
//! 4. [`fragment`] groups components into the [`document`] graph
//! 5. [`writer`] serializes the graph for the selected WiX grammar
//!
//! # Example
//!
//! ```no_run
//! use kodegen_bundler_wix::bundler::{PackageSettings, SettingsBuilder};
//! use kodegen_bundler_wix::bundler::wix;
//!
//! # fn example() -> kodegen_bundler_wix::bundler::Result<()> {
//! let settings = SettingsBuilder::new()
//!     .app_image("target/app-image")
//!     .package_settings(PackageSettings {
//!         product_name: "MyApp".into(),
//!         version: "1.0.0".into(),
//!         vendor: "Example Inc.".into(),
//!         ..Default::default()
//!     })
//!     .build()?;
//!
//! let document = wix::generate(&settings)?;
//! let xml = wix::writer::to_string(&document)?;
//! # Ok(())
//! # }
//! ```

pub mod component;
pub mod context;
pub mod directories;
pub mod document;
pub mod fragment;
pub mod id;
pub mod path;
pub mod service;
pub mod writer;

use crate::bundler::error::{Error, Result};
use crate::bundler::settings::Settings;
use document::WixDocument;
use fragment::FragmentAssembler;
use semver::Version;
use serde::Serialize;

/// WiX source grammar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum WixToolsetType {
    /// WiX 3.x
    Wix3,
    /// WiX 4 and later, sharing the v4 schema.
    Wix4,
}

/// Target toolset: grammar plus exact version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WixToolset {
    kind: WixToolsetType,
    version: Version,
}

impl WixToolset {
    /// Selects the grammar for `version`.
    pub fn from_version(version: Version) -> Result<Self> {
        let kind = match version.major {
            3 => WixToolsetType::Wix3,
            4..=6 => WixToolsetType::Wix4,
            _ => {
                return Err(Error::UnsupportedToolset {
                    version: version.to_string(),
                });
            }
        };
        Ok(Self { kind, version })
    }

    /// Parses a version such as `3.11`, `3.14.1` or `4.0.5`.
    ///
    /// Missing minor and patch components default to zero.
    pub fn parse(version: &str) -> Result<Self> {
        let trimmed = version.trim();
        let parsed = Version::parse(trimmed).or_else(|_| {
            let mut padded = trimmed.to_string();
            for _ in trimmed.split('.').count()..3 {
                padded.push_str(".0");
            }
            Version::parse(&padded)
        });
        match parsed {
            Ok(version) => Self::from_version(version),
            Err(_) => Err(Error::UnsupportedToolset {
                version: trimmed.to_string(),
            }),
        }
    }

    /// Grammar variant.
    pub fn kind(&self) -> WixToolsetType {
        self.kind
    }

    /// `RemoveFolderEx`, and registry keys without an explicit action.
    pub fn has_wix36_features(&self) -> bool {
        self.version >= Version::new(3, 6, 0)
    }

    /// `<StandardDirectory>` shorthand for OS-standard folders.
    pub fn has_standard_directory(&self) -> bool {
        self.kind == WixToolsetType::Wix4
    }

    /// Default XML namespace.
    pub fn namespace(&self) -> &'static str {
        match self.kind {
            WixToolsetType::Wix3 => "http://schemas.microsoft.com/wix/2006/wi",
            WixToolsetType::Wix4 => "http://wixtoolset.org/schemas/v4/wxs",
        }
    }

    /// Util extension namespace.
    pub fn util_namespace(&self) -> &'static str {
        match self.kind {
            WixToolsetType::Wix3 => "http://schemas.microsoft.com/wix/UtilExtension",
            WixToolsetType::Wix4 => "http://wixtoolset.org/schemas/v4/wxs/util",
        }
    }
}

/// Generates the document graph for `settings`.
///
/// # Errors
///
/// - [`Error::UnsupportedToolset`] for toolset versions without a known grammar
/// - [`Error::InvalidPath`] and [`Error::NoShortcutFolder`] for layouts that
///   escape the installer's directory tree
/// - I/O errors while walking the application image
pub fn generate(settings: &Settings) -> Result<WixDocument> {
    let toolset = WixToolset::parse(&settings.wix().toolset_version)?;
    log::info!(
        "Generating {:?} fragment for {} {}",
        toolset.kind(),
        settings.product_name(),
        settings.version_string()
    );
    FragmentAssembler::new(settings, toolset)?.assemble()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toolset_selection() {
        assert_eq!(WixToolset::parse("3.11").unwrap().kind(), WixToolsetType::Wix3);
        assert_eq!(WixToolset::parse("4.0.5").unwrap().kind(), WixToolsetType::Wix4);
        assert_eq!(WixToolset::parse("6").unwrap().kind(), WixToolsetType::Wix4);
    }

    #[test]
    fn test_unsupported_toolset() {
        assert!(matches!(
            WixToolset::parse("2.0"),
            Err(Error::UnsupportedToolset { .. })
        ));
        assert!(matches!(
            WixToolset::parse("latest"),
            Err(Error::UnsupportedToolset { .. })
        ));
    }

    #[test]
    fn test_wix36_features() {
        assert!(!WixToolset::parse("3.5").unwrap().has_wix36_features());
        assert!(WixToolset::parse("3.6").unwrap().has_wix36_features());
        assert!(WixToolset::parse("4.0").unwrap().has_wix36_features());
    }
}
