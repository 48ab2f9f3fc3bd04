//! Application image layouts and the layout transform.
//!
//! An [`ApplicationLayout`] names the slots of an application image
//! (launchers, application files, runtime, ...) by their relative location.
//! Resolving it at the image directory gives a [`SourceLayout`]; resolving it
//! at `INSTALLDIR` gives the parallel [`InstallLayout`]. [`LayoutTransform`]
//! pairs the two and yields the copy and directory events every later stage
//! consumes.

use crate::bundler::error::{Error, Result};
use crate::bundler::platform::windows::wix::path::WixPath;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// A named location inside an application image.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayoutSlot {
    /// Directory holding the launcher executables.
    Launchers,
    /// Application files.
    App,
    /// Application modules, nested inside [`LayoutSlot::App`].
    AppMods,
    /// Bundled runtime.
    Runtime,
    /// Icons and other desktop integration files.
    DesktopIntegration,
    /// Additional file or directory added for a single generation pass.
    Extra(String),
}

/// Relative locations of the slots of an application image.
#[derive(Clone, Debug, Default)]
pub struct ApplicationLayout {
    slots: BTreeMap<LayoutSlot, String>,
}

impl ApplicationLayout {
    /// Layout of a Windows application image.
    ///
    /// Launchers and desktop integration files live at the image root, next
    /// to the `app` and `runtime` directories.
    pub fn platform_app_image() -> Self {
        Self::default()
            .with(LayoutSlot::Launchers, "")
            .with(LayoutSlot::App, "app")
            .with(LayoutSlot::AppMods, "app/mods")
            .with(LayoutSlot::Runtime, "runtime")
            .with(LayoutSlot::DesktopIntegration, "")
    }

    /// Layout of a runtime-only image.
    pub fn runtime_only() -> Self {
        Self::default()
            .with(LayoutSlot::Runtime, "")
            .with(LayoutSlot::Launchers, "bin")
    }

    /// Sets the relative location of `slot`.
    pub fn with(mut self, slot: LayoutSlot, relative: impl Into<String>) -> Self {
        self.slots.insert(slot, relative.into());
        self
    }

    /// Resolves every slot under the image directory `root`.
    pub fn resolve_source(&self, root: &Path) -> SourceLayout {
        let slots = self
            .slots
            .iter()
            .map(|(slot, relative)| {
                let mut path = root.to_path_buf();
                path.extend(relative.split('/').filter(|s| !s.is_empty()));
                (slot.clone(), path)
            })
            .collect();
        SourceLayout { slots }
    }

    /// Resolves every slot under the installer path `root`.
    pub fn resolve_install(&self, root: &WixPath) -> InstallLayout {
        let slots = self
            .slots
            .iter()
            .map(|(slot, relative)| (slot.clone(), root.join(relative)))
            .collect();
        InstallLayout { slots }
    }
}

/// Application image slots resolved on the build host.
#[derive(Clone, Debug, Default)]
pub struct SourceLayout {
    slots: BTreeMap<LayoutSlot, PathBuf>,
}

impl SourceLayout {
    /// Host path of `slot`.
    pub fn path(&self, slot: &LayoutSlot) -> Option<&Path> {
        self.slots.get(slot).map(PathBuf::as_path)
    }

    /// Adds or replaces a slot.
    pub fn set_path(&mut self, slot: LayoutSlot, path: impl Into<PathBuf>) {
        self.slots.insert(slot, path.into());
    }
}

/// Application image slots resolved in the installer's directory tree.
#[derive(Clone, Debug, Default)]
pub struct InstallLayout {
    slots: BTreeMap<LayoutSlot, WixPath>,
}

impl InstallLayout {
    /// Installer path of `slot`.
    pub fn path(&self, slot: &LayoutSlot) -> Option<&WixPath> {
        self.slots.get(slot)
    }

    /// Adds or replaces a slot.
    pub fn set_path(&mut self, slot: LayoutSlot, path: WixPath) {
        self.slots.insert(slot, path);
    }

    /// Launchers directory, or the first slot's root when the layout has none.
    pub fn launchers_directory(&self) -> WixPath {
        self.slot_or_root(&LayoutSlot::Launchers)
    }

    /// Directory receiving desktop integration files such as icons.
    pub fn desktop_integration_directory(&self) -> WixPath {
        self.slot_or_root(&LayoutSlot::DesktopIntegration)
    }

    fn slot_or_root(&self, slot: &LayoutSlot) -> WixPath {
        self.slots
            .get(slot)
            .cloned()
            .unwrap_or_else(WixPath::installdir)
    }
}

/// A single file installed from `src` to `install_path`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallableFile {
    /// Host path of the file.
    pub src: PathBuf,
    /// Installer path of the file.
    pub install_path: WixPath,
}

/// Structural event produced by [`LayoutTransform`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayoutEvent {
    /// Install the host file `src` at `dst`.
    CopyFile {
        /// Host path
        src: PathBuf,
        /// Installer path
        dst: WixPath,
    },
    /// Make sure directory `dir` exists, even when it receives no files.
    EnsureDirectory(WixPath),
}

#[derive(Clone, Debug)]
struct Action {
    src: PathBuf,
    is_dir: bool,
}

/// Pairing of a source layout with its install layout.
///
/// The source image is walked once, when the transform is planned. The
/// resulting event sequence is finite and can be iterated any number of
/// times. Overlapping slots collapse onto a single destination, and source
/// slots that the install layout does not carry are excluded from the walk.
#[derive(Clone, Debug, Default)]
pub struct LayoutTransform {
    actions: BTreeMap<WixPath, Action>,
}

impl LayoutTransform {
    /// Walks `source` and maps every entry to its destination in `install`.
    pub fn plan(source: &SourceLayout, install: &InstallLayout) -> Result<Self> {
        let excluded: Vec<&Path> = source
            .slots
            .iter()
            .filter(|(slot, _)| !install.slots.contains_key(*slot))
            .map(|(_, path)| path.as_path())
            .collect();

        let mut actions = BTreeMap::new();
        for (slot, src_root) in &source.slots {
            let Some(dst_root) = install.slots.get(slot) else {
                continue;
            };

            if src_root.is_dir() {
                for entry in WalkDir::new(src_root).sort_by_file_name() {
                    let entry = entry?;
                    let relative = entry.path().strip_prefix(src_root)?;
                    let dst = dst_root.join_path(&relative_to_wix(relative)?);
                    actions.insert(
                        dst,
                        Action {
                            src: entry.path().to_path_buf(),
                            is_dir: entry.file_type().is_dir(),
                        },
                    );
                }
            } else {
                actions.insert(
                    dst_root.clone(),
                    Action {
                        src: src_root.clone(),
                        is_dir: false,
                    },
                );
            }
        }

        actions.retain(|dst, action| {
            if excluded.iter().any(|ex| action.src.starts_with(ex)) {
                log::debug!("Excluding {} from {}", action.src.display(), dst);
                return false;
            }
            action.src.exists()
        });

        Ok(Self { actions })
    }

    /// Adds a single file copy on top of the planned image.
    pub fn add_file(&mut self, file: &InstallableFile) {
        self.actions.insert(
            file.install_path.clone(),
            Action {
                src: file.src.clone(),
                is_dir: false,
            },
        );
    }

    /// Lazy event sequence, ordered by destination path.
    pub fn events(&self) -> impl Iterator<Item = LayoutEvent> + '_ {
        self.actions.iter().map(|(dst, action)| {
            if action.is_dir {
                LayoutEvent::EnsureDirectory(dst.clone())
            } else {
                LayoutEvent::CopyFile {
                    src: action.src.clone(),
                    dst: dst.clone(),
                }
            }
        })
    }

    /// Only the file copies, as `(src, dst)` pairs.
    pub fn files(&self) -> impl Iterator<Item = (&Path, &WixPath)> + '_ {
        self.actions
            .iter()
            .filter(|(_, action)| !action.is_dir)
            .map(|(dst, action)| (action.src.as_path(), dst))
    }
}

fn relative_to_wix(relative: &Path) -> Result<WixPath> {
    let mut segments = Vec::new();
    for component in relative.components() {
        if let Component::Normal(name) = component {
            let name = name
                .to_str()
                .ok_or_else(|| Error::NonUtf8Path(relative.to_path_buf()))?;
            segments.push(name.to_string());
        }
    }
    Ok(WixPath::from_segments(segments))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn image() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("App.exe"), b"exe").unwrap();
        fs::create_dir_all(root.join("app/mods")).unwrap();
        fs::write(root.join("app/App.cfg"), b"cfg").unwrap();
        fs::write(root.join("app/mods/m.jar"), b"jar").unwrap();
        fs::create_dir_all(root.join("runtime/conf/empty")).unwrap();
        fs::write(root.join("runtime/release"), b"r").unwrap();
        dir
    }

    fn transform(root: &Path, layout: &ApplicationLayout) -> LayoutTransform {
        let source = layout.resolve_source(root);
        let install = layout.resolve_install(&WixPath::installdir());
        LayoutTransform::plan(&source, &install).unwrap()
    }

    #[test]
    fn test_events_cover_files_and_directories() {
        let dir = image();
        let plan = transform(dir.path(), &ApplicationLayout::platform_app_image());

        let files: Vec<String> = plan.files().map(|(_, dst)| dst.to_string()).collect();
        assert_eq!(
            files,
            vec![
                r"INSTALLDIR\App.exe",
                r"INSTALLDIR\app\App.cfg",
                r"INSTALLDIR\app\mods\m.jar",
                r"INSTALLDIR\runtime\release",
            ]
        );

        let dirs: Vec<String> = plan
            .events()
            .filter_map(|e| match e {
                LayoutEvent::EnsureDirectory(d) => Some(d.to_string()),
                LayoutEvent::CopyFile { .. } => None,
            })
            .collect();
        assert!(dirs.contains(&"INSTALLDIR".to_string()));
        assert!(dirs.contains(&r"INSTALLDIR\runtime\conf\empty".to_string()));
    }

    #[test]
    fn test_events_are_restartable() {
        let dir = image();
        let plan = transform(dir.path(), &ApplicationLayout::platform_app_image());
        let first: Vec<LayoutEvent> = plan.events().collect();
        let second: Vec<LayoutEvent> = plan.events().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_slots_missing_from_install_layout_are_excluded() {
        let dir = image();
        let layout = ApplicationLayout::platform_app_image();
        let source = layout.resolve_source(dir.path());
        let install = ApplicationLayout::default()
            .with(LayoutSlot::Launchers, "")
            .with(LayoutSlot::App, "app")
            .with(LayoutSlot::AppMods, "app/mods")
            .with(LayoutSlot::DesktopIntegration, "")
            .resolve_install(&WixPath::installdir());

        let plan = LayoutTransform::plan(&source, &install).unwrap();
        assert!(plan.files().all(|(_, dst)| !dst.to_string().contains("runtime")));
    }

    #[test]
    fn test_missing_source_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = SourceLayout::default();
        source.set_path(LayoutSlot::Extra("icon".into()), dir.path().join("missing.ico"));
        let mut install = InstallLayout::default();
        install.set_path(
            LayoutSlot::Extra("icon".into()),
            WixPath::parse(r"INSTALLDIR\fa.ico"),
        );

        let plan = LayoutTransform::plan(&source, &install).unwrap();
        assert_eq!(plan.events().count(), 0);
    }

    #[test]
    fn test_extra_file_slot_is_copied() {
        let dir = image();
        let mut source = ApplicationLayout::platform_app_image().resolve_source(dir.path());
        let mut install = ApplicationLayout::platform_app_image().resolve_install(&WixPath::installdir());
        source.set_path(LayoutSlot::Extra("icon".into()), dir.path().join("App.exe"));
        install.set_path(
            LayoutSlot::Extra("icon".into()),
            WixPath::parse(r"INSTALLDIR\copy.exe"),
        );

        let plan = LayoutTransform::plan(&source, &install).unwrap();
        assert!(plan
            .files()
            .any(|(_, dst)| dst == &WixPath::parse(r"INSTALLDIR\copy.exe")));
    }
}
