//! The generate command.

use super::{Args, OutputManager};
use crate::bundler::wix::{self, fragment};
use crate::bundler::{FragmentConfig, InstallScope};
use crate::error::{CliError, ConfigError, Result};
use crate::metadata::extract_metadata;
use path_absolutize::Absolutize;

/// Generates the fragment described by `args` and writes it to disk.
///
/// Returns the process exit code.
pub async fn execute(args: Args) -> Result<i32> {
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;
    let output = OutputManager::new(args.quiet);

    if !args.app_image.is_dir() {
        return Err(ConfigError::MissingAppImage {
            path: args.app_image.clone(),
        }
        .into());
    }
    let app_image = args.app_image.absolutize()?.into_owned();

    let contents = tokio::fs::read_to_string(&args.config).await?;
    let mut config = FragmentConfig::from_toml_str(&contents)?;
    if let Some(manifest) = &args.manifest_path {
        extract_metadata(manifest)?.apply_to(&mut config.package);
    }
    if args.per_user {
        config.wix.install_scope = InstallScope::PerUser;
    }
    if let Some(version) = &args.wix_version {
        config.wix.toolset_version = version.clone();
    }

    let settings = config.into_builder().app_image(&app_image).build()?;
    output.section(&format!(
        "{} {}",
        settings.product_name(),
        settings.version_string()
    ))?;

    let document = wix::generate(&settings)?;
    let xml = wix::writer::to_string(&document)?;
    tokio::fs::write(&args.output, xml).await?;
    log::debug!("Wrote {}", args.output.display());

    if let Some(path) = &args.summary {
        tokio::fs::write(path, serde_json::to_string_pretty(&document)?).await?;
        output.info(&format!("Document graph written to {}", path.display()))?;
    }

    output.success(&format!("Fragment written to {}", args.output.display()))?;
    for group in [
        fragment::FILES_GROUP,
        fragment::SHORTCUTS_GROUP,
        fragment::FILE_ASSOCIATIONS_GROUP,
    ] {
        let count = document
            .group(group)
            .map_or(0, |g| g.component_ids.len());
        output.indent(&format!("{group}: {count} components"))?;
    }
    output.indent(&format!("Icons: {}", document.icons().count()))?;

    Ok(0)
}
