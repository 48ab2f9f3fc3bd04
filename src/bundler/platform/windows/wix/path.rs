//! Installer-side paths and the well-known directory tables.
//!
//! Every installer path is a sequence of segments anchored at one of the
//! root directories (`INSTALLDIR` or `TARGETDIR`). Paths compare, hash and
//! order case-insensitively, matching the target filesystem.

use crate::bundler::error::{Error, Result};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Root of the installer's directory tree.
pub const TARGETDIR: &str = "TARGETDIR";

/// Root of the installed application.
pub const INSTALLDIR: &str = "INSTALLDIR";

/// Names a path may start with.
pub const ROOT_DIRS: [&str; 2] = [INSTALLDIR, TARGETDIR];

/// A path inside the installer's directory tree.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(into = "String")]
pub struct WixPath {
    segments: Vec<String>,
}

impl WixPath {
    /// Parses a path, accepting both `\` and `/` separators.
    pub fn parse(path: &str) -> Self {
        Self {
            segments: split_segments(path).collect(),
        }
    }

    /// Builds a path from individual segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// `TARGETDIR`
    pub fn targetdir() -> Self {
        Self::parse(TARGETDIR)
    }

    /// `INSTALLDIR`
    pub fn installdir() -> Self {
        Self::parse(INSTALLDIR)
    }

    /// Appends a relative path, which may itself contain separators.
    pub fn join(&self, relative: impl AsRef<str>) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(split_segments(relative.as_ref()));
        Self { segments }
    }

    /// Appends every segment of `other`.
    pub fn join_path(&self, other: &WixPath) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    /// The containing directory, or `None` for a single-segment path.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Last segment.
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// First segment.
    pub fn root(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    /// Path segments in order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True for the empty path.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Case-insensitive prefix test on whole segments.
    pub fn starts_with(&self, base: &WixPath) -> bool {
        base.segments.len() <= self.segments.len()
            && base
                .segments
                .iter()
                .zip(&self.segments)
                .all(|(a, b)| a.to_lowercase() == b.to_lowercase())
    }

    /// Path of `self` relative to `base`, if `base` is a prefix.
    pub fn strip_prefix(&self, base: &WixPath) -> Option<WixPath> {
        self.starts_with(base).then(|| Self {
            segments: self.segments[base.segments.len()..].to_vec(),
        })
    }

    /// Appends `suffix` to the last segment unless it already ends with it.
    pub fn with_suffix(&self, suffix: &str) -> Self {
        let mut segments = self.segments.clone();
        if let Some(last) = segments.last_mut()
            && !last.to_lowercase().ends_with(&suffix.to_lowercase())
        {
            last.push_str(suffix);
        }
        Self { segments }
    }

    /// Ancestors from the parent up to the root, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = WixPath> + '_ {
        (1..self.segments.len()).rev().map(|len| Self {
            segments: self.segments[..len].to_vec(),
        })
    }

    /// Lower-cased `\`-joined form used for identity hashing.
    pub fn normalized(&self) -> String {
        self.to_string().to_lowercase()
    }

    /// Fails with [`Error::InvalidPath`] unless the path starts at a root directory.
    pub fn validate(&self) -> Result<()> {
        match self.root() {
            Some(root) if ROOT_DIRS.contains(&root) => Ok(()),
            _ => Err(self.invalid()),
        }
    }

    pub(crate) fn invalid(&self) -> Error {
        Error::InvalidPath {
            path: self.to_string(),
        }
    }

    fn lowered(&self) -> impl Iterator<Item = String> + '_ {
        self.segments.iter().map(|s| s.to_lowercase())
    }
}

fn split_segments(path: &str) -> impl Iterator<Item = String> + '_ {
    path.split(['\\', '/'])
        .filter(|s| !s.is_empty() && *s != ".")
        .map(str::to_string)
}

impl fmt::Display for WixPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("\\"))
    }
}

impl From<WixPath> for String {
    fn from(path: WixPath) -> Self {
        path.to_string()
    }
}

impl PartialEq for WixPath {
    fn eq(&self, other: &Self) -> bool {
        self.segments.len() == other.segments.len() && self.lowered().eq(other.lowered())
    }
}

impl Eq for WixPath {}

impl Hash for WixPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for segment in self.lowered() {
            segment.hash(state);
        }
    }
}

impl Ord for WixPath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.lowered().cmp(other.lowered())
    }
}

impl PartialOrd for WixPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The fixed set of OS-standard directories for one target bitness.
#[derive(Clone, Debug)]
pub struct KnownDirs {
    program_files: WixPath,
}

impl KnownDirs {
    /// Tables for a 64-bit or 32-bit target.
    pub fn new(is_64bit: bool) -> Self {
        let folder = if is_64bit {
            "ProgramFiles64Folder"
        } else {
            "ProgramFilesFolder"
        };
        Self {
            program_files: WixPath::targetdir().join(folder),
        }
    }

    /// `TARGETDIR\ProgramMenuFolder`
    pub fn program_menu() -> WixPath {
        WixPath::targetdir().join("ProgramMenuFolder")
    }

    /// `TARGETDIR\DesktopFolder`
    pub fn desktop() -> WixPath {
        WixPath::targetdir().join("DesktopFolder")
    }

    /// `TARGETDIR\LocalAppDataFolder`
    pub fn local_program_files() -> WixPath {
        WixPath::targetdir().join("LocalAppDataFolder")
    }

    /// Program Files folder matching the target bitness.
    pub fn program_files(&self) -> &WixPath {
        &self.program_files
    }

    fn system_dirs(&self) -> [WixPath; 5] {
        [
            WixPath::targetdir(),
            Self::program_menu(),
            Self::desktop(),
            self.program_files.clone(),
            Self::local_program_files(),
        ]
    }

    /// OS-standard directories. These are referenced, never declared.
    pub fn is_system_dir(&self, path: &WixPath) -> bool {
        self.system_dirs().contains(path)
    }

    /// System directories plus `INSTALLDIR`.
    pub fn is_known_dir(&self, path: &WixPath) -> bool {
        self.is_system_dir(path) || *path == WixPath::installdir()
    }

    /// True when `path` lives inside the user's profile.
    pub fn is_user_profile_dir(path: &WixPath) -> bool {
        [
            Self::local_program_files(),
            Self::program_menu(),
            Self::desktop(),
        ]
        .iter()
        .any(|dir| path.starts_with(dir))
    }

    /// Formatted-string form of a path: the deepest known directory in
    /// brackets followed by the remainder, e.g. `[ProgramFiles64Folder]foo\bar`.
    pub fn to_formatted(&self, path: &WixPath) -> Result<String> {
        let mut known: Vec<WixPath> = self.system_dirs().into();
        known.push(WixPath::installdir());
        known.sort_by_key(|dir| std::cmp::Reverse(dir.len()));

        let root = known
            .into_iter()
            .find(|dir| path.starts_with(dir))
            .ok_or_else(|| path.invalid())?;
        let rest = path.strip_prefix(&root).unwrap_or_default();
        Ok(format!(
            "[{}]{}",
            root.file_name().unwrap_or_default(),
            rest
        ))
    }
}
