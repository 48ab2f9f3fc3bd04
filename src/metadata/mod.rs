//! Product metadata from a Cargo.toml

use crate::bundler::PackageSettings;
use crate::error::{ConfigError, Result};
use std::path::Path;

/// Package metadata extracted from Cargo.toml
#[derive(Debug, Clone)]
pub struct PackageMetadata {
    /// Package name from Cargo.toml
    pub name: String,

    /// Package description from Cargo.toml
    pub description: String,

    /// Package version from Cargo.toml (e.g., "0.1.0")
    pub version: String,

    /// List of package authors from Cargo.toml
    pub authors: Vec<String>,
}

impl PackageMetadata {
    /// Vendor name: the first author without an email suffix.
    pub fn vendor(&self) -> String {
        self.authors
            .first()
            .map(|author| match author.split_once('<') {
                Some((name, _)) => name.trim().to_string(),
                None => author.trim().to_string(),
            })
            .unwrap_or_else(|| self.name.clone())
    }

    /// Fills the fields of `settings` that are still empty.
    pub fn apply_to(&self, settings: &mut PackageSettings) {
        if settings.product_name.is_empty() {
            settings.product_name = self.name.clone();
        }
        if settings.version.is_empty() {
            settings.version = self.version.clone();
        }
        if settings.description.is_empty() {
            settings.description = self.description.clone();
        }
        if settings.vendor.is_empty() {
            settings.vendor = self.vendor();
        }
    }
}

/// Extract metadata from Cargo.toml [package] section
pub fn extract_metadata(cargo_toml_path: &Path) -> Result<PackageMetadata> {
    if !cargo_toml_path.exists() {
        return Err(ConfigError::MissingCargoToml {
            path: cargo_toml_path.to_path_buf(),
        }
        .into());
    }
    let manifest = std::fs::read_to_string(cargo_toml_path)?;
    let toml_value: toml::Value = toml::from_str(&manifest)?;

    let missing = |field| ConfigError::MissingField {
        field,
        path: cargo_toml_path.to_path_buf(),
    };
    let package = toml_value.get("package").ok_or_else(|| missing("package"))?;

    Ok(PackageMetadata {
        name: package
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| missing("name"))?
            .to_string(),

        description: package
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or("Rust application")
            .to_string(),

        version: package
            .get("version")
            .and_then(|v| v.as_str())
            .ok_or_else(|| missing("version"))?
            .to_string(),

        authors: package
            .get("authors")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WixError;

    #[test]
    fn test_extract_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Cargo.toml");
        std::fs::write(
            &path,
            r#"
            [package]
            name = "myapp"
            version = "0.3.1"
            authors = ["Jane Doe <jane@example.com>"]
            "#,
        )
        .unwrap();

        let metadata = extract_metadata(&path).unwrap();
        assert_eq!(metadata.name, "myapp");
        assert_eq!(metadata.version, "0.3.1");
        assert_eq!(metadata.description, "Rust application");
        assert_eq!(metadata.vendor(), "Jane Doe");

        let mut settings = PackageSettings {
            product_name: "MyApp".into(),
            ..Default::default()
        };
        metadata.apply_to(&mut settings);
        assert_eq!(settings.product_name, "MyApp");
        assert_eq!(settings.version, "0.3.1");
        assert_eq!(settings.vendor, "Jane Doe");
    }

    #[test]
    fn test_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_metadata(&dir.path().join("Cargo.toml")).unwrap_err();
        assert!(matches!(
            err,
            WixError::Config(ConfigError::MissingCargoToml { .. })
        ));
    }

    #[test]
    fn test_missing_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Cargo.toml");
        std::fs::write(&path, "[package]\nname = \"x\"\n").unwrap();
        let err = extract_metadata(&path).unwrap_err();
        assert!(matches!(
            err,
            WixError::Config(ConfigError::MissingField { field: "version", .. })
        ));
    }
}
