#[cfg(test)]
mod tests {
    use assert_cmd::Command;
    use predicates::prelude::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn workspace() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("image");
        fs::create_dir_all(image.join("app")).unwrap();
        fs::write(image.join("App.exe"), b"exe").unwrap();
        fs::write(image.join("app/App.cfg"), b"cfg").unwrap();
        dir
    }

    fn write_config(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("wix.toml");
        fs::write(&path, contents).unwrap();
        path
    }

    fn cmd() -> Command {
        let mut cmd = Command::cargo_bin("kodegen_bundler_wix").unwrap();
        cmd.env_remove("WIX_VERSION");
        cmd
    }

    #[test]
    fn test_writes_fragment() {
        let dir = workspace();
        let config = write_config(
            dir.path(),
            r#"
            [package]
            product_name = "App"
            version = "1.0"
            vendor = "Acme"

            [wix]
            desktop_shortcuts = true

            [[launcher]]
            name = "App"
            shortcut = true
            "#,
        );
        let output = dir.path().join("out.wxs");
        let summary = dir.path().join("out.json");

        cmd()
            .arg(dir.path().join("image"))
            .arg("--config")
            .arg(&config)
            .arg("--output")
            .arg(&output)
            .arg("--summary")
            .arg(&summary)
            .assert()
            .success()
            .stdout(predicate::str::contains("Fragment written to"));

        let xml = fs::read_to_string(&output).unwrap();
        assert!(xml.contains("<Wix"));
        assert!(xml.contains(r#"<ComponentGroup Id="Files">"#));
        assert!(xml.contains("INSTALL_DESKTOP_SHORTCUT"));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&summary).unwrap()).unwrap();
        assert!(json["fragments"].as_array().is_some_and(|f| !f.is_empty()));
    }

    #[test]
    fn test_missing_app_image_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path(), "[package]\nproduct_name = \"App\"\n");

        cmd()
            .arg(dir.path().join("missing"))
            .arg("--config")
            .arg(&config)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Application image not found"));
    }

    #[test]
    fn test_unsupported_toolset_fails() {
        let dir = workspace();
        let config = write_config(dir.path(), "[package]\nproduct_name = \"App\"\n");

        cmd()
            .arg(dir.path().join("image"))
            .arg("--config")
            .arg(&config)
            .arg("--output")
            .arg(dir.path().join("out.wxs"))
            .arg("--wix-version")
            .arg("7.0")
            .assert()
            .failure()
            .stderr(predicate::str::contains("unsupported WiX toolset version"));

        assert!(!dir.path().join("out.wxs").exists());
    }

    #[test]
    fn test_manifest_supplies_product_metadata() {
        let dir = workspace();
        let config = write_config(dir.path(), "[wix]\ninstall_scope = \"perMachine\"\n");
        let output = dir.path().join("out.wxs");
        let manifest = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/Cargo.toml");

        cmd()
            .arg(dir.path().join("image"))
            .arg("--config")
            .arg(&config)
            .arg("--manifest-path")
            .arg(&manifest)
            .arg("--output")
            .arg(&output)
            .arg("--quiet")
            .assert()
            .success();

        let xml = fs::read_to_string(&output).unwrap();
        assert!(xml.contains(r"Software\Sample Vendor\sample-app\2.4.0"));
        assert!(xml.contains(r#"Name="sample-app""#));
    }
}
