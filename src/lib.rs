//! # Kodegen Bundler WiX
//!
//! Deterministic WiX source fragments for Windows application images.
//!
//! This crate walks an application image and declares every installed file,
//! directory, shortcut, file association and service as a WiX component.
//! Identifiers and component GUIDs are derived from installer paths, so
//! rebuilding the same image yields byte-identical output and upgrades keep
//! matching components.
//!
//! ## Features
//!
//! - **Stable identity**: name-based identifiers, case-insensitive paths
//! - **Both install scopes**: per-user and per-machine key path and cleanup policies
//! - **WiX 3 and v4 schema**: grammar differences handled by the writer
//! - **Uninstall cleanup**: removal markers plus a recursive-removal helper
//!
//! ## Usage
//!
//! ```bash
//! kodegen_bundler_wix target/app-image --config wix.toml
//! kodegen_bundler_wix target/app-image --config wix.toml --per-user
//! kodegen_bundler_wix target/app-image --config wix.toml --wix-version 4.0.5
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Core modules
pub mod bundler;
pub mod cli;
pub mod error;
pub mod metadata;

// Re-export main types for public API
pub use bundler::{FragmentConfig, Settings, SettingsBuilder};
pub use cli::Args;
pub use error::{CliError, ConfigError, Result, WixError};
