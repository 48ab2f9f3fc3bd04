//! Installer document graph.
//!
//! Plain data produced by the fragment assembler and consumed by the writer.
//! Items keep their emission order; anything derived from an unordered
//! collection is sorted before it lands here.

use super::component::Role;
use super::path::WixPath;
use super::service::{ServiceConfig, ServiceInstall};
use super::WixToolset;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Complete output of one generation pass.
#[derive(Clone, Debug, Serialize)]
pub struct WixDocument {
    /// Grammar the document targets.
    pub toolset: WixToolset,
    /// Target bitness.
    pub is_64bit: bool,
    /// Fragments in output order.
    pub fragments: Vec<Fragment>,
}

impl WixDocument {
    /// Every item of every fragment.
    pub fn items(&self) -> impl Iterator<Item = &FragmentItem> + '_ {
        self.fragments.iter().flat_map(|f| f.items.iter())
    }

    /// Every component, in emission order.
    pub fn components(&self) -> impl Iterator<Item = &Component> + '_ {
        self.items().filter_map(|item| match item {
            FragmentItem::Component(c) => Some(c),
            _ => None,
        })
    }

    /// Component with the given id.
    pub fn component(&self, id: &str) -> Option<&Component> {
        self.components().find(|c| c.id == id)
    }

    /// Component group with the given id.
    pub fn group(&self, id: &str) -> Option<&ComponentGroup> {
        self.items().find_map(|item| match item {
            FragmentItem::Group(g) if g.id == id => Some(g),
            _ => None,
        })
    }

    /// Components referenced by the group `id`, in group order.
    pub fn group_components(&self, id: &str) -> Vec<&Component> {
        self.group(id)
            .map(|g| g.component_ids.iter().filter_map(|c| self.component(c)).collect())
            .unwrap_or_default()
    }

    /// Declared properties.
    pub fn properties(&self) -> impl Iterator<Item = &Property> + '_ {
        self.items().filter_map(|item| match item {
            FragmentItem::Property(p) => Some(p),
            _ => None,
        })
    }

    /// Declared icons.
    pub fn icons(&self) -> impl Iterator<Item = &IconDecl> + '_ {
        self.items().filter_map(|item| match item {
            FragmentItem::Icon(i) => Some(i),
            _ => None,
        })
    }

    /// Directory declarations outside root branches.
    pub fn directories(&self) -> impl Iterator<Item = &DirectoryDecl> + '_ {
        self.items().filter_map(|item| match item {
            FragmentItem::Directory(d) => Some(d),
            _ => None,
        })
    }

    /// Root branch declarations.
    pub fn branches(&self) -> impl Iterator<Item = &DirectoryBranch> + '_ {
        self.items().filter_map(|item| match item {
            FragmentItem::Branch(b) => Some(b),
            _ => None,
        })
    }

    /// The recursive-removal helper, if emitted.
    pub fn cleaner(&self) -> Option<&DirectoryCleaner> {
        self.items().find_map(|item| match item {
            FragmentItem::Cleaner(c) => Some(c),
            _ => None,
        })
    }
}

/// One `<Fragment>` element.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Fragment {
    /// Children in output order.
    pub items: Vec<FragmentItem>,
}

impl Fragment {
    pub(crate) fn push(&mut self, item: impl Into<FragmentItem>) {
        self.items.push(item.into());
    }
}

/// Child of a fragment.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FragmentItem {
    /// A component wrapped in a reference to its directory.
    Component(Component),
    /// A directory declared under its parent.
    Directory(DirectoryDecl),
    /// A chain of nested directory declarations.
    Branch(DirectoryBranch),
    /// The recursive-removal helper.
    Cleaner(DirectoryCleaner),
    /// A component group.
    Group(ComponentGroup),
    /// An installer property.
    Property(Property),
    /// An icon declaration.
    Icon(IconDecl),
}

macro_rules! impl_into_item {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for FragmentItem {
            fn from(value: $ty) -> Self {
                FragmentItem::$variant(value)
            }
        })*
    };
}

impl_into_item!(
    Component => Component,
    DirectoryDecl => Directory,
    DirectoryBranch => Branch,
    DirectoryCleaner => Cleaner,
    ComponentGroup => Group,
    Property => Property,
    IconDecl => Icon,
);

/// Reference to an existing directory: `<DirectoryRef>`, or
/// `<StandardDirectory>` for OS-standard folders where the grammar has it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DirectoryAnchor {
    /// Directory id.
    pub id: String,
    /// Written as `<StandardDirectory>`.
    pub standard: bool,
}

/// `<Directory Id Name>` nested in a reference to its parent.
#[derive(Clone, Debug, Serialize)]
pub struct DirectoryDecl {
    /// Parent directory.
    pub parent: DirectoryAnchor,
    /// Directory id.
    pub id: String,
    /// Directory name on disk.
    pub name: String,
}

/// Nested directory declarations from an outermost referenced root down to
/// a target directory.
#[derive(Clone, Debug, Serialize)]
pub struct DirectoryBranch {
    /// Directory the branch hangs off, when it is referenced rather than declared.
    pub anchor: Option<DirectoryAnchor>,
    /// Declared levels, outermost first.
    pub levels: Vec<BranchLevel>,
}

/// One level of a [`DirectoryBranch`].
#[derive(Clone, Debug, Serialize)]
pub struct BranchLevel {
    /// Directory id.
    pub id: String,
    /// Directory name. `None` for well-known folders.
    pub name: Option<String>,
    /// Written as `<StandardDirectory>`.
    pub standard: bool,
}

/// Registry hive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RegistryRoot {
    /// `HKCU`
    #[serde(rename = "HKCU")]
    CurrentUser,
    /// `HKLM`
    #[serde(rename = "HKLM")]
    LocalMachine,
}

impl fmt::Display for RegistryRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RegistryRoot::CurrentUser => "HKCU",
            RegistryRoot::LocalMachine => "HKLM",
        })
    }
}

/// `<RegistryKey>` holding a single string `<RegistryValue>`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RegistryEntry {
    /// Hive.
    pub root: RegistryRoot,
    /// Key under the hive.
    pub key: String,
    /// Value name.
    pub name: String,
    /// Value data.
    pub value: String,
    /// `Action="createAndRemoveOnUninstall"` on the key.
    pub create_and_remove: bool,
}

/// What the installer checks to detect a component.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum KeyPath {
    /// The component's primary element.
    ///
    /// Only `<File>` has a `KeyPath` attribute. Components whose primary
    /// element is a shortcut, ProgId or folder declare no key path in the
    /// output, and the installer falls back to the owning directory.
    Element,
    /// A registry value under the product key.
    Registry(RegistryEntry),
}

/// `<RemoveFolder On="uninstall">`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RemovalMarker {
    /// Marker id, unique per directory.
    pub id: String,
}

/// The installable unit.
#[derive(Clone, Debug, Serialize)]
pub struct Component {
    /// Component id.
    pub id: String,
    /// Braced component GUID, or `*`.
    pub guid: String,
    /// Why the component exists.
    pub role: Role,
    /// Path the component was assembled for.
    pub path: WixPath,
    /// Directory owning the component.
    pub directory: DirectoryAnchor,
    /// Condition guarding installation.
    pub condition: Option<String>,
    /// Detection anchor.
    pub key_path: KeyPath,
    /// Removal of the owning directory on uninstall.
    pub removal_marker: Option<RemovalMarker>,
    /// Role-specific payload.
    pub element: Element,
    /// Services registered with the component's file.
    pub services: Vec<ServiceInstall>,
}

impl Component {
    /// True when the primary element is the key path.
    pub fn element_is_key_path(&self) -> bool {
        self.key_path == KeyPath::Element
    }

    /// Registry key path, if any.
    pub fn registry_key_path(&self) -> Option<&RegistryEntry> {
        match &self.key_path {
            KeyPath::Registry(entry) => Some(entry),
            KeyPath::Element => None,
        }
    }
}

/// Primary element of a component.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Element {
    /// `<File>`
    File {
        /// File id.
        id: String,
        /// Host path of the file.
        source: PathBuf,
    },
    /// `<Shortcut>`
    Shortcut {
        /// Shortcut id.
        id: String,
        /// Shortcut display name.
        name: String,
        /// Working directory id.
        working_directory: String,
        /// `[#fileId]` of the launcher.
        target: String,
    },
    /// `<ProgId>` with its extension and verb.
    ProgId {
        /// ProgId id.
        id: String,
        /// File type description.
        description: String,
        /// File id of the icon.
        icon: Option<String>,
        /// Registered extension.
        extension: Extension,
    },
    /// `<CreateFolder/>`
    CreateFolder,
    /// `<RemoveFolder On="uninstall"/>`
    RemoveFolder {
        /// Element id.
        id: String,
    },
    /// `<util:ServiceConfig>`
    ServiceConfig(ServiceConfig),
}

/// `<Extension>` of a ProgId.
#[derive(Clone, Debug, Serialize)]
pub struct Extension {
    /// Extension without the dot.
    pub id: String,
    /// First MIME type of the association.
    pub content_type: Option<String>,
    /// MIME type declared as default, the first time it is seen.
    pub default_mime: Option<String>,
    /// `open` verb.
    pub verb: Verb,
}

/// `<Verb>`
#[derive(Clone, Debug, Serialize)]
pub struct Verb {
    /// Verb id.
    pub id: String,
    /// Localized command label.
    pub command: String,
    /// Command-line arguments.
    pub argument: String,
    /// File id of the launcher.
    pub target_file: String,
}

/// Named, ordered set of component references.
#[derive(Clone, Debug, Serialize)]
pub struct ComponentGroup {
    /// Group id.
    pub id: String,
    /// Referenced component ids, without duplicates.
    pub component_ids: Vec<String>,
}

impl ComponentGroup {
    /// Group over `ids`. Absent and repeated ids are dropped.
    pub fn new<I>(id: impl Into<String>, ids: I) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        let mut seen = BTreeSet::new();
        let component_ids = ids
            .into_iter()
            .flatten()
            .filter(|c| seen.insert(c.clone()))
            .collect();
        Self {
            id: id.into(),
            component_ids,
        }
    }
}

/// `<Property Id Value>`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Property {
    /// Property id.
    pub id: String,
    /// Property value.
    pub value: String,
}

/// `<Icon Id SourceFile>`
#[derive(Clone, Debug, Serialize)]
pub struct IconDecl {
    /// Icon id.
    pub id: String,
    /// Host path of the icon.
    pub source: PathBuf,
}

/// Last-resort recursive removal of the install directory.
///
/// The install path is stored in the registry at install time, read back
/// into `property` at uninstall time and handed to `RemoveFolderEx`.
#[derive(Clone, Debug, Serialize)]
pub struct DirectoryCleaner {
    /// Property receiving the stored path.
    pub property: String,
    /// `RegistrySearch` id.
    pub search_id: String,
    /// Component storing the path.
    pub component_id: String,
    /// Component owning directory.
    pub directory: DirectoryAnchor,
    /// Registry value holding the install path.
    pub registry: RegistryEntry,
}
