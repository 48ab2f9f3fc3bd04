#[cfg(test)]
mod tests {
    use kodegen_bundler_wix::bundler::wix::component::Role;
    use kodegen_bundler_wix::bundler::wix::document::{Component, Element, RegistryRoot};
    use kodegen_bundler_wix::bundler::wix::fragment::{
        FILES_GROUP, FILE_ASSOCIATIONS_GROUP, SHORTCUTS_GROUP,
    };
    use kodegen_bundler_wix::bundler::wix::path::WixPath;
    use kodegen_bundler_wix::bundler::{wix, Error, FragmentConfig, Settings};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const BASE_CONFIG: &str = r#"
        [package]
        product_name = "App"
        version = "1.0"
        vendor = "Acme"

        [[launcher]]
        name = "App"
        shortcut = true
    "#;

    fn image(files: &[&str]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for file in files {
            let path = dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, file.as_bytes()).unwrap();
        }
        dir
    }

    fn settings(image: &Path, wix: &str, extra: &str) -> Settings {
        let config = format!("{BASE_CONFIG}\n[wix]\n{wix}\n{extra}");
        FragmentConfig::from_toml_str(&config)
            .unwrap()
            .into_builder()
            .app_image(image)
            .build()
            .unwrap()
    }

    fn of_role<'a>(components: &[&'a Component], role: Role) -> Vec<&'a Component> {
        components.iter().copied().filter(|c| c.role == role).collect()
    }

    #[test]
    fn test_per_user_scenario() {
        let dir = image(&["App.exe"]);
        let settings = settings(
            dir.path(),
            "install_scope = \"perUser\"\ndesktop_shortcuts = true",
            "",
        );
        let doc = wix::generate(&settings).unwrap();

        let files = doc.group_components(FILES_GROUP);
        let file_components = of_role(&files, Role::File);
        assert_eq!(file_components.len(), 1);
        let app = file_components[0];
        assert_eq!(app.path, WixPath::parse(r"INSTALLDIR\App.exe"));
        assert!(app.element_is_key_path());
        assert!(app.registry_key_path().is_none());

        let removals = of_role(&files, Role::RemoveFolder);
        assert_eq!(removals.len(), 1);
        assert_eq!(removals[0].path, WixPath::installdir());

        let shortcuts = doc.group_components(SHORTCUTS_GROUP);
        assert_eq!(shortcuts.len(), 1);
        assert_eq!(shortcuts[0].directory.id, "DesktopFolder");
        assert!(shortcuts[0].element_is_key_path());
        assert_eq!(
            shortcuts[0].condition.as_deref(),
            Some("INSTALL_DESKTOP_SHORTCUT")
        );

        let properties: Vec<_> = doc.properties().map(|p| p.id.as_str()).collect();
        assert_eq!(properties, vec!["INSTALL_DESKTOP_SHORTCUT"]);
    }

    #[test]
    fn test_per_machine_scenario() {
        let dir = image(&["App.exe"]);
        let settings = settings(
            dir.path(),
            "install_scope = \"perMachine\"\ndesktop_shortcuts = true",
            "",
        );
        let doc = wix::generate(&settings).unwrap();

        let files = doc.group_components(FILES_GROUP);
        let app = of_role(&files, Role::File)[0];
        let entry = app.registry_key_path().unwrap();
        assert_eq!(entry.root, RegistryRoot::LocalMachine);
        assert_eq!(entry.key, r"Software\Acme\App\1.0");
        assert!(!app.element_is_key_path());

        assert!(of_role(&files, Role::RemoveFolder).is_empty());
        assert!(doc.components().all(|c| c.removal_marker.is_none()));
        assert!(doc.cleaner().is_some());
    }

    #[test]
    fn test_removal_markers_are_unique() {
        let dir = image(&["App.exe", "app/a.cfg", "app/b.cfg", "app/c.cfg"]);
        let settings = settings(dir.path(), "install_scope = \"perUser\"", "");
        let doc = wix::generate(&settings).unwrap();

        let app_dir = WixPath::parse(r"INSTALLDIR\app");
        let markers: Vec<&str> = doc
            .components()
            .filter(|c| c.path.parent().as_ref() == Some(&app_dir))
            .filter_map(|c| c.removal_marker.as_ref().map(|m| m.id.as_str()))
            .collect();
        assert_eq!(markers.len(), 3);
        let mut unique = markers.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 3);

        // Marked directories get no separate removal component
        let files = doc.group_components(FILES_GROUP);
        assert!(of_role(&files, Role::RemoveFolder)
            .iter()
            .all(|c| c.path != app_dir));
    }

    #[test]
    fn test_per_machine_marks_each_directory_once() {
        let dir = image(&["App.exe", "app/lib/a.dll", "app/lib/b.dll"]);
        let settings = settings(
            dir.path(),
            "install_scope = \"perMachine\"\nstart_menu_shortcuts = true\nmenu_group = \"Acme\"",
            "[[launcher]]\nname = \"Tool\"\nmenu = true\n",
        );
        let doc = wix::generate(&settings).unwrap();

        let mut per_directory = std::collections::BTreeMap::new();
        for component in doc.components().filter(|c| c.removal_marker.is_some()) {
            *per_directory.entry(component.directory.id.clone()).or_insert(0) += 1;
        }
        assert!(per_directory.values().all(|count| *count == 1));

        let lib = doc
            .components()
            .filter(|c| c.path.parent() == Some(WixPath::parse(r"INSTALLDIR\app\lib")))
            .filter(|c| c.removal_marker.is_some())
            .count();
        assert_eq!(lib, 1);

        let shortcuts = doc.group_components(SHORTCUTS_GROUP);
        assert_eq!(shortcuts.len(), 1);
        assert_eq!(
            shortcuts[0].path,
            WixPath::parse(r"TARGETDIR\ProgramMenuFolder\Acme\Tool")
        );
        assert!(shortcuts[0].removal_marker.is_some());
        assert!(shortcuts[0].registry_key_path().is_some());
    }

    #[test]
    fn test_per_user_menu_group_is_declared_and_removed() {
        let dir = image(&["App.exe"]);
        let settings = settings(
            dir.path(),
            "install_scope = \"perUser\"\nstart_menu_shortcuts = true\nmenu_group = \"Acme\"",
            "[[launcher]]\nname = \"Tool\"\nmenu = true\n",
        );
        let doc = wix::generate(&settings).unwrap();

        let shortcuts = doc.group_components(SHORTCUTS_GROUP);
        assert_eq!(shortcuts.len(), 1);
        assert_eq!(
            shortcuts[0].condition.as_deref(),
            Some("INSTALL_STARTMENU_SHORTCUT")
        );
        assert!(shortcuts[0].removal_marker.is_some());
        assert!(shortcuts[0].element_is_key_path());

        let menu_branch = doc
            .branches()
            .find(|b| b.levels.iter().any(|l| l.name.as_deref() == Some("Acme")))
            .unwrap();
        assert_eq!(menu_branch.levels[0].id, "ProgramMenuFolder");
        assert!(menu_branch.levels[0].name.is_none());

        let xml = wix::writer::to_string(&doc).unwrap();
        assert!(xml.contains(r#"<Directory Id="ProgramMenuFolder">"#));
        assert!(xml.contains(r#"Name="Acme""#));
    }

    #[test]
    fn test_empty_directories_are_created() {
        let dir = image(&["App.exe", "runtime/release"]);
        fs::create_dir_all(dir.path().join("runtime/conf/empty")).unwrap();
        let settings = settings(dir.path(), "install_scope = \"perUser\"", "");
        let doc = wix::generate(&settings).unwrap();

        let files = doc.group_components(FILES_GROUP);
        let created = of_role(&files, Role::CreateFolder);
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].path, WixPath::parse(r"INSTALLDIR\runtime\conf\empty"));
        assert!(created[0].removal_marker.is_some());

        let removed: Vec<String> = of_role(&files, Role::RemoveFolder)
            .iter()
            .map(|c| c.path.to_string())
            .collect();
        assert!(removed.contains(&r"INSTALLDIR\runtime\conf".to_string()));
        assert!(!removed.contains(&r"INSTALLDIR\runtime\conf\empty".to_string()));

        let declared: Vec<String> = doc.directories().map(|d| d.name.clone()).collect();
        assert!(declared.contains(&"runtime".to_string()));
        assert!(declared.contains(&"empty".to_string()));
    }

    #[test]
    fn test_mime_type_declared_default_once() {
        let dir = image(&["App.exe"]);
        let icons = tempfile::tempdir().unwrap();
        let icon = icons.path().join("text.ico");
        fs::write(&icon, b"ico").unwrap();

        let associations = format!(
            r#"
            [[file_association]]
            launcher = "App"
            extensions = ["txt"]
            icon = '{}'
            description = "Text"
            mime_types = ["text/plain"]

            [[file_association]]
            launcher = "App"
            extensions = ["log", ""]
            description = "Log"
            mime_types = ["text/plain"]

            [[file_association]]
            launcher = "App"
            extensions = [""]
            description = "Nothing"
            "#,
            icon.display()
        );
        let settings = settings(dir.path(), "", &associations);
        let doc = wix::generate(&settings).unwrap();

        let prog_ids = doc.group_components(FILE_ASSOCIATIONS_GROUP);
        assert_eq!(prog_ids.len(), 2);

        let defaults: Vec<Option<String>> = prog_ids
            .iter()
            .map(|c| match &c.element {
                Element::ProgId { extension, .. } => extension.default_mime.clone(),
                other => panic!("unexpected element {other:?}"),
            })
            .collect();
        assert_eq!(defaults, vec![Some("text/plain".to_string()), None]);

        let icon_path = WixPath::parse(r"INSTALLDIR\fa_txt.ico");
        assert!(doc.components().any(|c| c.path == icon_path));
        assert_eq!(doc.icons().count(), 1);
    }

    #[test]
    fn test_services_register_with_installer() {
        let dir = image(&["App.exe", "Daemon.exe"]);
        let tools = tempfile::tempdir().unwrap();
        let installer = tools.path().join("installer.exe");
        fs::write(&installer, b"exe").unwrap();

        let extra = format!(
            r#"
            [[launcher]]
            name = "Daemon"
            service = true

            [service_installer]
            source = '{}'
            install_path = "service-installer.exe"
            "#,
            installer.display()
        );
        let settings = settings(dir.path(), "", &extra);
        let doc = wix::generate(&settings).unwrap();

        let files = doc.group_components(FILES_GROUP);
        let host = files
            .iter()
            .find(|c| c.path == WixPath::parse(r"INSTALLDIR\service-installer.exe"))
            .unwrap();
        assert_eq!(host.services.len(), 1);
        assert_eq!(host.services[0].name, "Daemon");
        assert_eq!(of_role(&files, Role::ServiceConfig).len(), 1);
    }

    #[test]
    fn test_services_require_installer() {
        let dir = image(&["App.exe"]);
        let extra = "[[launcher]]\nname = \"Daemon\"\nservice = true\n";
        let settings = settings(dir.path(), "", extra);
        assert!(wix::generate(&settings).is_err());
    }

    #[test]
    fn test_output_is_deterministic() {
        let dir = image(&["App.exe", "app/App.cfg", "runtime/lib/x.dll"]);
        let settings = settings(
            dir.path(),
            "install_scope = \"perUser\"\nstart_menu_shortcuts = true",
            "[[launcher]]\nname = \"Tool\"\nmenu = true\n",
        );
        let first = wix::writer::to_string(&wix::generate(&settings).unwrap()).unwrap();
        let second = wix::writer::to_string(&wix::generate(&settings).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_wix3_grammar() {
        let dir = image(&["App.exe"]);
        let settings = settings(
            dir.path(),
            "toolset_version = \"3.11\"\ndesktop_shortcuts = true",
            "",
        );
        let xml = wix::writer::to_string(&wix::generate(&settings).unwrap()).unwrap();

        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains(r#"xmlns="http://schemas.microsoft.com/wix/2006/wi""#));
        assert!(xml.contains(r#"<DirectoryRef Id="TARGETDIR">"#));
        assert!(xml.contains(r#"<Directory Id="ProgramFiles64Folder">"#));
        assert!(xml.contains(r#"Win64="yes""#));
        assert!(xml.contains("<Condition>"));
        assert!(xml.contains(r#"<RegistryKey Root="HKLM" Key="Software\Acme\App\1.0">"#));
        assert!(xml.contains("util:RemoveFolderEx"));
        assert!(!xml.contains("createAndRemoveOnUninstall"));
        assert!(!xml.contains("StandardDirectory"));
    }

    #[test]
    fn test_wix4_grammar() {
        let dir = image(&["App.exe"]);
        let settings = settings(
            dir.path(),
            "toolset_version = \"4.0.5\"\ninstall_scope = \"perUser\"\ndesktop_shortcuts = true",
            "",
        );
        let xml = wix::writer::to_string(&wix::generate(&settings).unwrap()).unwrap();

        assert!(xml.contains(r#"xmlns="http://wixtoolset.org/schemas/v4/wxs""#));
        assert!(xml.contains(r#"<StandardDirectory Id="LocalAppDataFolder">"#));
        assert!(xml.contains(r#"<StandardDirectory Id="DesktopFolder">"#));
        assert!(xml.contains(r#"Bitness="always64""#));
        assert!(xml.contains(r#"Condition="INSTALL_DESKTOP_SHORTCUT""#));
        assert!(!xml.contains("Win64"));
        assert!(!xml.contains(r#"<DirectoryRef Id="TARGETDIR">"#));
        assert!(!xml.contains(r#"Guid="*""#));
    }

    #[test]
    fn test_legacy_toolset_skips_recursive_removal() {
        let dir = image(&["App.exe"]);
        let settings = settings(dir.path(), "toolset_version = \"3.5\"", "");
        let doc = wix::generate(&settings).unwrap();
        assert!(doc.cleaner().is_none());

        let xml = wix::writer::to_string(&doc).unwrap();
        assert!(xml.contains(r#"Action="createAndRemoveOnUninstall""#));
        assert!(!xml.contains("RemoveFolderEx"));
    }

    #[test]
    fn test_unsupported_toolset() {
        let dir = image(&["App.exe"]);
        let settings = settings(dir.path(), "toolset_version = \"7.0\"", "");
        assert!(matches!(
            wix::generate(&settings),
            Err(Error::UnsupportedToolset { .. })
        ));
    }

    #[test]
    fn test_runtime_installer_has_no_shortcuts() {
        let dir = image(&["bin/java.exe", "release"]);
        let settings = settings(
            dir.path(),
            "runtime_installer = true\ndesktop_shortcuts = true",
            "",
        );
        let doc = wix::generate(&settings).unwrap();

        assert!(doc.group_components(SHORTCUTS_GROUP).is_empty());
        // Enabled folders without shortcuts get no declaration
        assert_eq!(doc.branches().count(), 1);
        assert!(doc.properties().any(|p| p.id == "INSTALL_DESKTOP_SHORTCUT"));
        let files: Vec<String> = of_role(&doc.group_components(FILES_GROUP), Role::File)
            .iter()
            .map(|c| c.path.to_string())
            .collect();
        assert_eq!(files, vec![r"INSTALLDIR\bin\java.exe", r"INSTALLDIR\release"]);
    }
}
