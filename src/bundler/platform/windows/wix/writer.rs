//! XML serialization of the document graph.
//!
//! The graph is first lowered into a small element tree, which is then
//! streamed through `quick_xml`. Differences between the WiX 3 and WiX 4
//! grammars are resolved during lowering.

use super::document::{
    Component, ComponentGroup, DirectoryAnchor, DirectoryBranch, DirectoryCleaner, DirectoryDecl,
    Element, FragmentItem, IconDecl, KeyPath, Property, RegistryEntry, WixDocument,
};
use super::WixToolset;
use crate::bundler::error::{Error, Result, SerializeExt};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;
use std::path::Path;

#[derive(Clone, Debug, Default)]
struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<XmlElement>,
}

impl XmlElement {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attributes.push((key.to_string(), value.into()));
        self
    }

    fn attr_opt(self, key: &str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.attr(key, value),
            None => self,
        }
    }

    fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    fn child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    fn write<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.children.is_empty() && self.text.is_none() {
            return writer.write_event(Event::Empty(start)).xml_context(&self.name);
        }

        writer.write_event(Event::Start(start)).xml_context(&self.name)?;
        if let Some(text) = &self.text {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .xml_context(&self.name)?;
        }
        for child in &self.children {
            child.write(writer)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .xml_context(&self.name)
    }
}

/// Writes `document` to `out` and returns the sink.
///
/// On error the sink holds a partial document that must be discarded.
pub fn write_document<W: Write>(document: &WixDocument, out: W) -> Result<W> {
    let root = lower(document);
    let mut writer = Writer::new_with_indent(out, b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .xml_context("declaration")?;
    root.write(&mut writer)?;
    let mut out = writer.into_inner();
    out.write_all(b"\n").xml_context("document")?;
    Ok(out)
}

/// Serializes `document` into a string.
pub fn to_string(document: &WixDocument) -> Result<String> {
    let bytes = write_document(document, Vec::new())?;
    String::from_utf8(bytes).map_err(|e| Error::GenericError(e.to_string()))
}

fn lower(document: &WixDocument) -> XmlElement {
    let grammar = Grammar {
        toolset: &document.toolset,
        is_64bit: document.is_64bit,
    };
    document.fragments.iter().fold(
        XmlElement::new("Wix")
            .attr("xmlns", document.toolset.namespace())
            .attr("xmlns:util", document.toolset.util_namespace()),
        |root, fragment| {
            root.child(
                fragment
                    .items
                    .iter()
                    .flat_map(|item| grammar.item(item))
                    .fold(XmlElement::new("Fragment"), XmlElement::child),
            )
        },
    )
}

struct Grammar<'a> {
    toolset: &'a WixToolset,
    is_64bit: bool,
}

impl Grammar<'_> {
    fn item(&self, item: &FragmentItem) -> Vec<XmlElement> {
        match item {
            FragmentItem::Component(c) => {
                vec![self.anchor(&c.directory).child(self.component(c))]
            }
            FragmentItem::Directory(d) => vec![self.directory(d)],
            FragmentItem::Branch(b) => vec![self.branch(b)],
            FragmentItem::Cleaner(c) => self.cleaner(c),
            FragmentItem::Group(g) => vec![group(g)],
            FragmentItem::Property(p) => vec![property(p)],
            FragmentItem::Icon(i) => vec![icon(i)],
        }
    }

    fn anchor(&self, anchor: &DirectoryAnchor) -> XmlElement {
        let name = if anchor.standard {
            "StandardDirectory"
        } else {
            "DirectoryRef"
        };
        XmlElement::new(name).attr("Id", &anchor.id)
    }

    fn component_start(&self, id: &str, guid: &str) -> XmlElement {
        let element = XmlElement::new("Component").attr("Id", id);
        if self.toolset.has_standard_directory() {
            let bitness = if self.is_64bit { "always64" } else { "always32" };
            let element = if guid == "*" {
                element
            } else {
                element.attr("Guid", guid)
            };
            element.attr("Bitness", bitness)
        } else {
            element
                .attr("Guid", guid)
                .attr("Win64", if self.is_64bit { "yes" } else { "no" })
        }
    }

    fn component(&self, component: &Component) -> XmlElement {
        let mut element = self.component_start(&component.id, &component.guid);
        if let Some(condition) = &component.condition {
            element = if self.toolset.has_standard_directory() {
                element.attr("Condition", condition)
            } else {
                element.child(XmlElement::new("Condition").text(condition))
            };
        }

        element = element.child(self.payload(component));

        if let KeyPath::Registry(entry) = &component.key_path {
            element = element.child(registry_key(entry));
        }
        if let Some(marker) = &component.removal_marker {
            element = element.child(
                XmlElement::new("RemoveFolder")
                    .attr("Id", &marker.id)
                    .attr("On", "uninstall"),
            );
        }
        for service in &component.services {
            element = element
                .child(
                    XmlElement::new("ServiceInstall")
                        .attr("Id", &service.id)
                        .attr("Name", &service.name)
                        .attr("DisplayName", &service.display_name)
                        .attr("Description", &service.description)
                        .attr("Type", "ownProcess")
                        .attr("Start", "auto")
                        .attr("ErrorControl", "normal")
                        .attr("Arguments", &service.arguments),
                )
                .child(
                    XmlElement::new("ServiceControl")
                        .attr("Id", &service.control_id)
                        .attr("Name", &service.name)
                        .attr("Start", "install")
                        .attr("Stop", "both")
                        .attr("Remove", "uninstall")
                        .attr("Wait", "yes"),
                );
        }
        element
    }

    fn payload(&self, component: &Component) -> XmlElement {
        match &component.element {
            Element::File { id, source } => {
                let installed = component.path.file_name().unwrap_or_default();
                let renamed = source
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_none_or(|n| !n.eq_ignore_ascii_case(installed));
                XmlElement::new("File")
                    .attr("Id", id)
                    .attr_opt("Name", renamed.then_some(installed))
                    .attr_opt("KeyPath", component.element_is_key_path().then_some("yes"))
                    .attr("Source", source_path(source))
            }
            Element::Shortcut {
                id,
                name,
                working_directory,
                target,
            } => XmlElement::new("Shortcut")
                .attr("Id", id)
                .attr("Name", name)
                .attr("WorkingDirectory", working_directory)
                .attr("Advertise", "no")
                .attr("Target", target),
            Element::ProgId {
                id,
                description,
                icon,
                extension,
            } => {
                let mut ext = XmlElement::new("Extension")
                    .attr("Id", &extension.id)
                    .attr("Advertise", "no")
                    .attr_opt("ContentType", extension.content_type.as_deref());
                if let Some(mime) = &extension.default_mime {
                    ext = ext.child(
                        XmlElement::new("MIME")
                            .attr("ContentType", mime)
                            .attr("Default", "yes"),
                    );
                }
                let verb = &extension.verb;
                ext = ext.child(
                    XmlElement::new("Verb")
                        .attr("Id", &verb.id)
                        .attr("Command", &verb.command)
                        .attr("Argument", &verb.argument)
                        .attr("TargetFile", &verb.target_file),
                );

                let prog_id = XmlElement::new("ProgId")
                    .attr("Id", id)
                    .attr("Description", description);
                match icon {
                    Some(icon) => prog_id.attr("Icon", icon).attr("IconIndex", "0"),
                    None => prog_id,
                }
                .child(ext)
            }
            Element::CreateFolder => XmlElement::new("CreateFolder"),
            Element::RemoveFolder { id } => XmlElement::new("RemoveFolder")
                .attr("Id", id)
                .attr("On", "uninstall"),
            Element::ServiceConfig(config) => XmlElement::new("util:ServiceConfig")
                .attr("ServiceName", &config.service_name)
                .attr("FirstFailureActionType", config.first_failure)
                .attr("SecondFailureActionType", config.second_failure)
                .attr("ThirdFailureActionType", config.third_failure)
                .attr(
                    "RestartServiceDelayInSeconds",
                    config.restart_delay_seconds.to_string(),
                )
                .attr("ResetPeriodInDays", config.reset_period_days.to_string()),
        }
    }

    fn directory(&self, decl: &DirectoryDecl) -> XmlElement {
        self.anchor(&decl.parent).child(
            XmlElement::new("Directory")
                .attr("Id", &decl.id)
                .attr("Name", &decl.name),
        )
    }

    fn branch(&self, branch: &DirectoryBranch) -> XmlElement {
        let innermost = branch.levels.iter().rev().fold(None, |inner, level| {
            let name = if level.standard {
                "StandardDirectory"
            } else {
                "Directory"
            };
            let element = XmlElement::new(name)
                .attr("Id", &level.id)
                .attr_opt("Name", level.name.as_deref());
            Some(match inner {
                Some(inner) => element.child(inner),
                None => element,
            })
        });

        match (&branch.anchor, innermost) {
            (Some(anchor), Some(inner)) => self.anchor(anchor).child(inner),
            (Some(anchor), None) => self.anchor(anchor),
            (None, Some(inner)) => inner,
            (None, None) => XmlElement::new("DirectoryRef").attr("Id", super::path::TARGETDIR),
        }
    }

    fn cleaner(&self, cleaner: &DirectoryCleaner) -> Vec<XmlElement> {
        let entry = &cleaner.registry;
        let search = XmlElement::new("Property").attr("Id", &cleaner.property).child(
            XmlElement::new("RegistrySearch")
                .attr("Id", &cleaner.search_id)
                .attr("Root", entry.root.to_string())
                .attr("Key", &entry.key)
                .attr("Type", "raw")
                .attr("Name", &entry.name),
        );

        let component = self
            .component_start(&cleaner.component_id, "*")
            .child(
                XmlElement::new("RegistryValue")
                    .attr("Root", entry.root.to_string())
                    .attr("Key", &entry.key)
                    .attr("Type", "string")
                    .attr("Name", &entry.name)
                    .attr("Value", &entry.value)
                    .attr("KeyPath", "yes"),
            )
            .child(
                XmlElement::new("util:RemoveFolderEx")
                    .attr("On", "uninstall")
                    .attr("Property", &cleaner.property),
            );

        vec![search, self.anchor(&cleaner.directory).child(component)]
    }
}

fn registry_key(entry: &RegistryEntry) -> XmlElement {
    XmlElement::new("RegistryKey")
        .attr("Root", entry.root.to_string())
        .attr("Key", &entry.key)
        .attr_opt(
            "Action",
            entry.create_and_remove.then_some("createAndRemoveOnUninstall"),
        )
        .child(
            XmlElement::new("RegistryValue")
                .attr("Type", "string")
                .attr("KeyPath", "yes")
                .attr("Name", &entry.name)
                .attr("Value", &entry.value),
        )
}

fn group(group: &ComponentGroup) -> XmlElement {
    group.component_ids.iter().fold(
        XmlElement::new("ComponentGroup").attr("Id", &group.id),
        |element, id| element.child(XmlElement::new("ComponentRef").attr("Id", id)),
    )
}

fn property(property: &Property) -> XmlElement {
    XmlElement::new("Property")
        .attr("Id", &property.id)
        .attr("Value", &property.value)
}

fn icon(icon: &IconDecl) -> XmlElement {
    XmlElement::new("Icon")
        .attr("Id", &icon.id)
        .attr("SourceFile", source_path(&icon.source))
}

fn source_path(path: &Path) -> String {
    path.display().to_string()
}
