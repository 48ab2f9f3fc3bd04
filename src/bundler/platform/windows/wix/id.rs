//! Deterministic identifiers for WiX elements.
//!
//! Identifiers are name-based (MD5, version 3) UUIDs over the lower-cased
//! installer path salted with a role tag, so the same inputs produce the same
//! identifiers on every host and across rebuilds. Component GUIDs are drawn
//! from a separate namespace so an element id and its component GUID never
//! share a digest.

use super::path::{KnownDirs, WixPath};
use crate::bundler::error::Result;
use uuid::{Builder, Uuid};

const GUID_NAMESPACE: &str = "guid:";

/// Value for the `Id` attribute of WiX elements, by element kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Id {
    /// `<File>`
    File,
    /// `<Directory>`
    Folder,
    /// `<Shortcut>`
    Shortcut,
    /// `<ProgId>`
    ProgId,
    /// `<Icon>`
    Icon,
    /// `<CreateFolder>` components
    CreateFolder,
    /// `<RemoveFolder>`
    RemoveFolder,
}

impl Id {
    /// Prefix of the generated identifier.
    pub const fn prefix(self) -> &'static str {
        match self {
            Id::File => "file",
            Id::Folder => "dir",
            Id::Shortcut => "shortcut",
            Id::ProgId => "progid",
            Id::Icon => "icon",
            Id::CreateFolder => "mkdir",
            Id::RemoveFolder => "rm",
        }
    }

    /// Role tag salted into the hash.
    pub const fn role(self) -> &'static str {
        match self {
            Id::File => "File",
            Id::Folder => "Folder",
            Id::Shortcut => "Shortcut",
            Id::ProgId => "ProgId",
            Id::Icon => "Icon",
            Id::CreateFolder => "CreateFolder",
            Id::RemoveFolder => "RemoveFolder",
        }
    }

    /// Identifier for `path` in this role.
    ///
    /// Icon identifiers are folded through a 32-bit hash because the full
    /// UUID form exceeds the icon id length limit of the WiX compiler.
    pub fn of(self, path: &WixPath) -> Result<String> {
        let id = derive(path, self.prefix(), self.role())?;
        if self == Id::Icon {
            return Ok(format!("{}{}", self.prefix(), short_hash(&id)).replace('-', "_"));
        }
        Ok(id)
    }
}

/// Directory identifier. Well-known directories keep their own name.
pub fn directory_id(path: &WixPath, known: &KnownDirs) -> Result<String> {
    if known.is_known_dir(path) {
        path.validate()?;
        return Ok(path.file_name().unwrap_or_default().to_string());
    }
    Id::Folder.of(path)
}

/// Identifier with a free-form prefix that doubles as the role tag.
pub fn custom_id(path: &WixPath, prefix: &str) -> Result<String> {
    derive(path, prefix, prefix)
}

/// Braced component GUID for `path` in `role`.
pub fn component_guid(path: &WixPath, role: &str) -> Result<String> {
    let uuid = name_uuid(path, &format!("{GUID_NAMESPACE}{role}"))?;
    Ok(format!("{{{uuid}}}"))
}

/// Name-based UUID over `role@<lower-cased path>`.
///
/// Fails with `InvalidPath` unless `path` is anchored at a root directory.
pub fn name_uuid(path: &WixPath, role: &str) -> Result<Uuid> {
    path.validate()?;
    let key = format!("{role}@{}", path.normalized());
    Ok(uuid_from_name(&key))
}

fn derive(path: &WixPath, prefix: &str, role: &str) -> Result<String> {
    let uuid = name_uuid(path, role)?;
    Ok(format!("{prefix}{}", uuid.simple()))
}

fn uuid_from_name(name: &str) -> Uuid {
    Builder::from_md5_bytes(md5::compute(name.as_bytes()).0).into_uuid()
}

/// 31-multiplier polynomial hash over UTF-16 code units.
fn short_hash(value: &str) -> i32 {
    value
        .encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::error::Error;

    fn app_exe() -> WixPath {
        WixPath::parse(r"INSTALLDIR\App.exe")
    }

    #[test]
    fn test_identifier_is_pinned() {
        assert_eq!(
            Id::File.of(&app_exe()).unwrap(),
            "file4d4baf42957432f29300a3310c7325eb"
        );
        assert_eq!(
            component_guid(&app_exe(), "File").unwrap(),
            "{47f81ef7-3953-3448-86b7-1c91c2f5180c}"
        );
    }

    #[test]
    fn test_case_variants_collapse() {
        let lower = WixPath::parse(r"installdir\app.exe");
        assert_eq!(Id::File.of(&app_exe()).unwrap(), Id::File.of(&lower).unwrap());
        assert_eq!(
            component_guid(&app_exe(), "File").unwrap(),
            component_guid(&lower, "File").unwrap()
        );
    }

    #[test]
    fn test_roles_never_collide() {
        let roles = [
            Id::File,
            Id::Folder,
            Id::Shortcut,
            Id::ProgId,
            Id::Icon,
            Id::CreateFolder,
            Id::RemoveFolder,
        ];
        let mut ids: Vec<String> = roles.iter().map(|r| r.of(&app_exe()).unwrap()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), roles.len());
    }

    #[test]
    fn test_guid_namespace_is_separate() {
        let id_uuid = name_uuid(&app_exe(), "File").unwrap();
        let guid = component_guid(&app_exe(), "File").unwrap();
        assert!(!guid.contains(&id_uuid.to_string()));
    }

    #[test]
    fn test_icon_id_is_short() {
        let id = Id::Icon.of(&app_exe()).unwrap();
        assert_eq!(id, "icon1621669285");
        assert!(!id.contains('-'));
    }

    #[test]
    fn test_known_directories_keep_names() {
        let known = KnownDirs::new(true);
        assert_eq!(
            directory_id(&WixPath::installdir(), &known).unwrap(),
            "INSTALLDIR"
        );
        assert_eq!(
            directory_id(&KnownDirs::desktop(), &known).unwrap(),
            "DesktopFolder"
        );
        assert!(directory_id(&WixPath::parse(r"INSTALLDIR\app"), &known)
            .unwrap()
            .starts_with("dir"));
    }

    #[test]
    fn test_custom_id() {
        assert_eq!(
            custom_id(&WixPath::installdir(), "rm_rf").unwrap(),
            "rm_rf48431aecbd69377ea800d62616352f20"
        );
    }

    #[test]
    fn test_invalid_path_is_rejected() {
        let err = Id::File.of(&WixPath::parse(r"C:\App.exe")).unwrap_err();
        assert!(matches!(err, Error::InvalidPath { .. }));
    }

    #[test]
    fn test_short_hash_wraps() {
        assert_eq!(short_hash(""), 0);
        assert_eq!(short_hash("a"), 97);
        assert_eq!(short_hash("ab"), 97 * 31 + 98);
    }
}
