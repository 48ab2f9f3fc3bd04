//! Command line argument parsing and validation.

use clap::Parser;
use std::path::PathBuf;

/// Generates a WiX source fragment for a Windows application image
#[derive(Parser, Debug)]
#[command(
    name = "kodegen_bundler_wix",
    version,
    about = "Generate a WiX source fragment for a Windows application image",
    long_about = "Declare every file, directory, shortcut, file association and service of
an application image as WiX components with stable identifiers.

Usage:
  kodegen_bundler_wix target/app-image --config wix.toml
  kodegen_bundler_wix target/app-image --config wix.toml --per-user --wix-version 4.0.5
  kodegen_bundler_wix target/app-image --config wix.toml --manifest-path Cargo.toml"
)]
pub struct Args {
    /// Application image directory
    #[arg(index = 1, value_name = "APP_IMAGE")]
    pub app_image: PathBuf,

    /// Fragment configuration (TOML)
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: PathBuf,

    /// Cargo.toml supplying product metadata missing from the configuration
    #[arg(long, value_name = "FILE")]
    pub manifest_path: Option<PathBuf>,

    /// Output .wxs file
    #[arg(long, short = 'o', value_name = "FILE", default_value = "app-content.wxs")]
    pub output: PathBuf,

    /// Install for the current user only
    #[arg(long)]
    pub per_user: bool,

    /// WiX toolset version, overriding the configuration
    #[arg(long, value_name = "VERSION", env = "WIX_VERSION")]
    pub wix_version: Option<String>,

    /// Also write the document graph as JSON
    #[arg(long, value_name = "FILE")]
    pub summary: Option<PathBuf>,

    /// Suppress all output except errors
    #[arg(long, short)]
    pub quiet: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.output.as_os_str().is_empty() {
            return Err("Output path must not be empty".to_string());
        }
        if self.summary.as_ref() == Some(&self.output) {
            return Err("Summary and output must be different files".to_string());
        }
        if self.wix_version.as_deref().is_some_and(|v| v.trim().is_empty()) {
            return Err("WiX version must not be empty".to_string());
        }
        Ok(())
    }
}
