//! # CPACS Document
//!
//! Reference [`DomainModel`] over an in-memory XML document.
//!
//! A document can be:
//! - **Memory-backed**: Temporary, for testing or in-memory operations
//! - **File-backed**: Single-user editing with disk persistence
//!
//! ## Lifecycle
//!
//! ```text
//! Load → Parse → Edit → Serialize → Save
//!   ↓      ↓       ↓        ↓         ↓
//! File  XmlDocument Edits  String    File
//! ```
//!
//! Every edit validates first and mutates second, so a rejected edit
//! leaves the document as it was.

use crate::domain::{BodyKind, DomainHandle, DomainModel, ProfileKind};
use crate::errors::EditorError;
use crate::tree::UID_ATTRIBUTE;
use cpacs_common::path;
use cpacs_common::DocumentBackend;
use cpacs_parser::{parse, serialize, Element, Node, XmlDocument};
use std::path::PathBuf;

/// Editable CPACS document
#[derive(Debug)]
pub struct CpacsDocument {
    /// Path to source file (if any)
    pub path: PathBuf,

    /// Current version number (increments on each change)
    pub version: u64,

    storage: DocumentStorage,
}

/// Storage backend for a document
#[derive(Debug)]
pub enum DocumentStorage {
    /// In-memory only (for testing, temp docs)
    Memory { xml: XmlDocument },

    /// File-backed (single-user editing)
    File { xml: XmlDocument, dirty: bool },
}

impl CpacsDocument {
    /// Create document from source text (memory-backed)
    pub fn from_source(path: PathBuf, source: &str) -> Result<Self, EditorError> {
        let xml = parse(source)?;

        Ok(Self {
            path,
            version: 0,
            storage: DocumentStorage::Memory { xml },
        })
    }

    /// Load document from file (file-backed)
    pub fn load(path: PathBuf) -> Result<Self, EditorError> {
        let source = std::fs::read_to_string(&path)?;
        let xml = parse(&source)?;

        tracing::info!(path = %path.display(), bytes = source.len(), "loaded document");
        Ok(Self {
            path,
            version: 0,
            storage: DocumentStorage::File { xml, dirty: false },
        })
    }

    pub fn xml(&self) -> &XmlDocument {
        match &self.storage {
            DocumentStorage::Memory { xml } | DocumentStorage::File { xml, .. } => xml,
        }
    }

    /// Mutable access for edits made outside the structural operations
    ///
    /// Counts as a change: the version is bumped and the document is marked dirty.
    pub fn xml_mut(&mut self) -> &mut XmlDocument {
        self.touch();
        self.xml_storage_mut()
    }

    fn xml_storage_mut(&mut self) -> &mut XmlDocument {
        match &mut self.storage {
            DocumentStorage::Memory { xml } | DocumentStorage::File { xml, .. } => xml,
        }
    }

    fn touch(&mut self) {
        self.version += 1;
        if let DocumentStorage::File { dirty, .. } = &mut self.storage {
            *dirty = true;
        }
    }

    /// Check if document has unsaved changes
    pub fn is_dirty(&self) -> bool {
        match &self.storage {
            DocumentStorage::File { dirty, .. } => *dirty,
            DocumentStorage::Memory { .. } => false,
        }
    }

    /// Save document to disk (if file-backed)
    pub fn save(&mut self) -> Result<(), EditorError> {
        let source = self.source();
        match &mut self.storage {
            DocumentStorage::File { dirty, .. } => {
                std::fs::write(&self.path, source)?;
                *dirty = false;
                tracing::info!(path = %self.path.display(), "saved document");
                Ok(())
            }
            DocumentStorage::Memory { .. } => Err(EditorError::NotFileBacked),
        }
    }

    /// Write the document to another file without changing its backing
    pub fn save_as(&self, target: &std::path::Path) -> Result<(), EditorError> {
        std::fs::write(target, self.source())?;
        Ok(())
    }

    /// Serialized document text
    pub fn source(&self) -> String {
        serialize(self.xml())
    }

    // ---------------------------------------------------------------------
    // Lookup helpers
    // ---------------------------------------------------------------------

    fn element_by_uid(&self, uid: &str) -> Option<&Element> {
        self.xml().root().find(&|e| e.attribute(UID_ATTRIBUTE) == Some(uid))
    }

    fn uid_in_use(&self, uid: &str) -> bool {
        self.element_by_uid(uid).is_some()
    }

    fn ensure_unused(&self, uids: &[String]) -> Result<(), EditorError> {
        for (i, uid) in uids.iter().enumerate() {
            if uid.is_empty() {
                return Err(EditorError::rejected("uID must not be empty"));
            }
            if self.uid_in_use(uid) || uids[..i].contains(uid) {
                return Err(EditorError::rejected(format!("uID '{}' already exists", uid)));
            }
        }
        Ok(())
    }

    /// Ancestor chain from the root down to the element carrying `uid`
    fn chain_of(&self, uid: &str) -> Option<Vec<&Element>> {
        fn descend<'a>(element: &'a Element, uid: &str, chain: &mut Vec<&'a Element>) -> bool {
            chain.push(element);
            if element.attribute(UID_ATTRIBUTE) == Some(uid) {
                return true;
            }
            for child in element.child_elements() {
                if descend(child, uid, chain) {
                    return true;
                }
            }
            chain.pop();
            false
        }

        let mut chain = Vec::new();
        descend(self.xml().root(), uid, &mut chain).then_some(chain)
    }

    /// Parent element of the element carrying `uid`, with its index in `children`
    fn parent_of_uid_mut(&mut self, uid: &str) -> Result<(&mut Element, usize), EditorError> {
        let element_path = self
            .xml()
            .path_of_uid(uid)
            .ok_or_else(|| EditorError::not_found(uid))?;
        let parent_path = path::drop_last_segment(&element_path)?;
        if parent_path.is_empty() {
            return Err(EditorError::rejected("the document root cannot be edited"));
        }
        let parent = self
            .xml_storage_mut()
            .element_at_mut(&parent_path)?
            .ok_or_else(|| EditorError::not_found(parent_path.clone()))?;
        let index = parent
            .position_of_uid(uid)
            .ok_or_else(|| EditorError::not_found(uid))?;
        Ok((parent, index))
    }

    /// First element named `name` in document order
    fn first_named_mut(&mut self, name: &str) -> Result<Option<&mut Element>, EditorError> {
        let Some(found) = self.xml().path_where(&|e| e.name == name) else {
            return Ok(None);
        };
        Ok(self.xml_storage_mut().element_at_mut(&found)?)
    }

    fn require_section(&self, uid: &str) -> Result<(BodyKind, String), EditorError> {
        match self.resolve_by_uid(uid) {
            Some(DomainHandle::Section { body, body_uid, .. }) => Ok((body, body_uid)),
            Some(other) => Err(EditorError::rejected(format!("{} is not a section", other))),
            None => Err(EditorError::not_found(uid)),
        }
    }

    /// Profile named by the first element of a section
    fn section_profile(&self, section_uid: &str, kind: ProfileKind) -> Option<String> {
        self.element_by_uid(section_uid)?
            .first_child_named("elements")?
            .first_child_named("element")?
            .child_text(kind.reference_element())
    }

    fn new_section(name: &str, description: Option<String>, profile: Option<(ProfileKind, String)>) -> Element {
        let element_uid = format!("{}Elem", name);
        let mut element = Element::new("element")
            .with_attribute(UID_ATTRIBUTE, element_uid.clone())
            .with_child(Element::new("name").with_text(element_uid));
        if let Some((kind, profile_uid)) = profile {
            element = element.with_child(Element::new(kind.reference_element()).with_text(profile_uid));
        }

        let mut section = Element::new("section")
            .with_attribute(UID_ATTRIBUTE, name)
            .with_child(Element::new("name").with_text(name));
        if let Some(description) = description {
            section = section.with_child(Element::new("description").with_text(description));
        }
        section.with_child(Element::new("elements").with_child(element))
    }

    fn insert_section(
        &mut self,
        reference_uid: &str,
        after: bool,
        name: &str,
        description: Option<String>,
    ) -> Result<(), EditorError> {
        let (body, _) = self.require_section(reference_uid)?;
        self.ensure_unused(&[name.to_string(), format!("{}Elem", name)])?;

        let kind = body.profile_kind();
        let profile = self.section_profile(reference_uid, kind).map(|p| (kind, p));
        let section = Self::new_section(name, description, profile);

        let (container, index) = self.parent_of_uid_mut(reference_uid)?;
        let at = if after { index + 1 } else { index };
        container.children.insert(at, Node::Element(section));
        self.touch();

        tracing::debug!(reference = %reference_uid, name = %name, after, "created section");
        Ok(())
    }

    fn body_element(kind: BodyKind, uid: &str, section_count: usize, profile_uid: &str) -> Element {
        let profile_kind = kind.profile_kind();
        let mut sections = Element::new("sections");
        let mut positionings = Element::new("positionings");
        let mut segments = Element::new("segments");

        for i in 1..=section_count {
            let section_uid = format!("{}Section{}", uid, i);
            sections = sections.with_child(Self::new_section(
                &section_uid,
                None,
                Some((profile_kind, profile_uid.to_string())),
            ));

            let positioning_uid = format!("{}Positioning{}", uid, i);
            let mut positioning = Element::new("positioning")
                .with_attribute(UID_ATTRIBUTE, positioning_uid.clone())
                .with_child(Element::new("name").with_text(positioning_uid))
                .with_child(Element::new("length").with_text(if i == 1 { "0" } else { "1" }))
                .with_child(Element::new("sweepAngle").with_text("0"))
                .with_child(Element::new("dihedralAngle").with_text("0"));
            if i > 1 {
                positioning = positioning
                    .with_child(Element::new("fromSectionUID").with_text(format!("{}Section{}", uid, i - 1)));
            }
            positionings = positionings
                .with_child(positioning.with_child(Element::new("toSectionUID").with_text(section_uid)));

            if i > 1 {
                let segment_uid = format!("{}Segment{}", uid, i - 1);
                segments = segments.with_child(
                    Element::new("segment")
                        .with_attribute(UID_ATTRIBUTE, segment_uid.clone())
                        .with_child(Element::new("name").with_text(segment_uid))
                        .with_child(
                            Element::new("fromElementUID").with_text(format!("{}Section{}Elem", uid, i - 1)),
                        )
                        .with_child(Element::new("toElementUID").with_text(format!("{}Section{}Elem", uid, i))),
                );
            }
        }

        let mut body = Element::new(kind.element_type()).with_attribute(UID_ATTRIBUTE, uid);
        if kind == BodyKind::Wing {
            body.set_attribute("symmetry", "x-z-plane");
        }
        body.with_child(Element::new("name").with_text(uid))
            .with_child(sections)
            .with_child(positionings)
            .with_child(segments)
    }

    fn body_uids(kind: BodyKind, uid: &str, section_count: usize) -> Vec<String> {
        let mut uids = vec![uid.to_string()];
        for i in 1..=section_count {
            uids.push(format!("{}Section{}", uid, i));
            uids.push(format!("{}Section{}Elem", uid, i));
            uids.push(format!("{}Positioning{}", uid, i));
            if i > 1 {
                uids.push(format!("{}Segment{}", uid, i - 1));
            }
        }
        tracing::trace!(kind = kind.element_type(), count = uids.len(), "reserved body uIDs");
        uids
    }

    fn profile_element(kind: ProfileKind, uid: &str) -> Element {
        // closed diamond, enough for a valid point list
        let (x, y, z) = match kind {
            ProfileKind::WingAirfoil => ("1;0.5;0;0.5;1", "0;0;0;0;0", "0;0.05;0;-0.05;0"),
            ProfileKind::FuselageProfile => ("0;0;0;0;0", "0;0.5;0;-0.5;0", "-0.5;0;0.5;0;-0.5"),
        };
        let vector = |name: &str, values: &str| {
            Element::new(name)
                .with_attribute("mapType", "vector")
                .with_text(values)
        };
        Element::new(kind.element_type())
            .with_attribute(UID_ATTRIBUTE, uid)
            .with_child(Element::new("name").with_text(uid))
            .with_child(
                Element::new("pointList")
                    .with_child(vector("x", x))
                    .with_child(vector("y", y))
                    .with_child(vector("z", z)),
            )
    }
}

impl DomainModel for CpacsDocument {
    fn backend(&self) -> &dyn DocumentBackend {
        self.xml()
    }

    fn revision(&self) -> u64 {
        self.version
    }

    fn resolve_by_uid(&self, uid: &str) -> Option<DomainHandle> {
        if uid.is_empty() {
            return None;
        }
        let chain = self.chain_of(uid)?;
        let element = chain.last()?;
        let ancestor = |up: usize| chain.len().checked_sub(1 + up).and_then(|i| chain.get(i));
        let name_at = |up: usize| ancestor(up).map(|e| e.name.as_str());
        let uid_at = |up: usize| {
            ancestor(up)
                .and_then(|e| e.attribute(UID_ATTRIBUTE))
                .unwrap_or_default()
                .to_string()
        };
        let uid = uid.to_string();

        let handle = match (element.name.as_str(), name_at(1)) {
            ("model", _) => DomainHandle::Model { uid },
            ("wing", Some("wings")) => DomainHandle::Body { uid, kind: BodyKind::Wing },
            ("fuselage", Some("fuselages")) => DomainHandle::Body { uid, kind: BodyKind::Fuselage },
            ("section", Some("sections")) => match name_at(2).and_then(BodyKind::from_element_type) {
                Some(body) => DomainHandle::Section {
                    uid,
                    body,
                    body_uid: uid_at(2),
                },
                None => DomainHandle::Other { uid, element_type: "section".to_string() },
            },
            ("element", Some("elements")) if name_at(2) == Some("section") => {
                DomainHandle::SectionElement { uid, section_uid: uid_at(2) }
            }
            ("positioning", _) => {
                let body_uid = chain
                    .iter()
                    .rev()
                    .find(|e| BodyKind::from_element_type(&e.name).is_some())
                    .and_then(|e| e.attribute(UID_ATTRIBUTE))
                    .unwrap_or_default()
                    .to_string();
                DomainHandle::Positioning { uid, body_uid }
            }
            ("wingAirfoil", Some("wingAirfoils")) => DomainHandle::Profile { uid, kind: ProfileKind::WingAirfoil },
            ("fuselageProfile", Some("fuselageProfiles")) => {
                DomainHandle::Profile { uid, kind: ProfileKind::FuselageProfile }
            }
            (other, _) => DomainHandle::Other { uid, element_type: other.to_string() },
        };
        Some(handle)
    }

    fn section_uids(&self, body_uid: &str) -> Result<Vec<String>, EditorError> {
        let body = self
            .element_by_uid(body_uid)
            .ok_or_else(|| EditorError::not_found(body_uid))?;
        Ok(body
            .first_child_named("sections")
            .map(|sections| {
                sections
                    .children_named("section")
                    .filter_map(|s| s.attribute(UID_ATTRIBUTE))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }

    fn create_section_before(&mut self, section_uid: &str, name: &str) -> Result<(), EditorError> {
        self.insert_section(section_uid, false, name, None)
    }

    fn create_section_after(&mut self, section_uid: &str, name: &str) -> Result<(), EditorError> {
        self.insert_section(section_uid, true, name, None)
    }

    fn create_section_between(
        &mut self,
        first_uid: &str,
        second_uid: &str,
        eta: f64,
        name: &str,
    ) -> Result<(), EditorError> {
        if !(eta > 0.0 && eta < 1.0) {
            return Err(EditorError::rejected(format!(
                "eta must lie strictly between 0 and 1, got {}",
                eta
            )));
        }
        let (_, first_body) = self.require_section(first_uid)?;
        let (_, second_body) = self.require_section(second_uid)?;
        if first_body != second_body {
            return Err(EditorError::rejected("sections belong to different components"));
        }
        let order = self.section_uids(&first_body)?;
        let first = order.iter().position(|s| s == first_uid);
        let second = order.iter().position(|s| s == second_uid);
        match (first, second) {
            (Some(a), Some(b)) if b == a + 1 => {}
            _ => {
                return Err(EditorError::rejected(format!(
                    "sections '{}' and '{}' are not adjacent",
                    first_uid, second_uid
                )))
            }
        }

        let description = format!("eta {} between {} and {}", eta, first_uid, second_uid);
        self.insert_section(first_uid, true, name, Some(description))
    }

    fn delete_section(&mut self, section_uid: &str) -> Result<(), EditorError> {
        let (body, body_uid) = self.require_section(section_uid)?;
        if self.section_uids(&body_uid)?.len() <= 2 {
            return Err(EditorError::rejected(format!(
                "a {} needs at least two sections",
                body.element_type()
            )));
        }

        let (container, index) = self.parent_of_uid_mut(section_uid)?;
        container.children.remove(index);
        self.touch();

        tracing::debug!(section = %section_uid, "deleted section");
        Ok(())
    }

    fn create_body(
        &mut self,
        kind: BodyKind,
        uid: &str,
        section_count: usize,
        profile_uid: &str,
    ) -> Result<(), EditorError> {
        if section_count < 2 {
            return Err(EditorError::rejected(format!(
                "a {} needs at least two sections",
                kind.element_type()
            )));
        }
        match self.resolve_by_uid(profile_uid) {
            Some(DomainHandle::Profile { kind: found, .. }) if found == kind.profile_kind() => {}
            _ => {
                return Err(EditorError::rejected(format!(
                    "profile '{}' is not a {}",
                    profile_uid,
                    kind.profile_kind().element_type()
                )))
            }
        }
        self.ensure_unused(&Self::body_uids(kind, uid, section_count))?;

        let body = Self::body_element(kind, uid, section_count, profile_uid);
        let container = self
            .first_named_mut("model")?
            .and_then(|model| model.first_child_named_mut(kind.container_type()))
            .ok_or_else(|| EditorError::rejected(format!("the model has no {} element", kind.container_type())))?;
        container.children.push(Node::Element(body));
        self.touch();

        tracing::debug!(kind = kind.element_type(), uid = %uid, section_count, "created component");
        Ok(())
    }

    fn delete_body(&mut self, kind: BodyKind, uid: &str) -> Result<(), EditorError> {
        match self.resolve_by_uid(uid) {
            Some(DomainHandle::Body { kind: found, .. }) if found == kind => {}
            Some(other) => {
                return Err(EditorError::rejected(format!("{} is not a {}", other, kind.element_type())))
            }
            None => return Err(EditorError::not_found(uid)),
        }

        let (container, index) = self.parent_of_uid_mut(uid)?;
        container.children.remove(index);
        self.touch();

        tracing::debug!(kind = kind.element_type(), uid = %uid, "deleted component");
        Ok(())
    }

    fn add_profile(&mut self, kind: ProfileKind, uid: &str) -> Result<(), EditorError> {
        self.ensure_unused(&[uid.to_string()])?;
        let profile = Self::profile_element(kind, uid);
        let container = self
            .first_named_mut(kind.container_type())?
            .ok_or_else(|| EditorError::rejected(format!("the document has no {} element", kind.container_type())))?;
        container.children.push(Node::Element(profile));
        self.touch();
        Ok(())
    }

    fn serialize_whole_document(&self) -> Result<String, EditorError> {
        Ok(self.source())
    }

    fn replace_whole_document(&mut self, source: &str) -> Result<(), EditorError> {
        let xml = parse(source)?;
        *self.xml_storage_mut() = xml;
        self.touch();
        Ok(())
    }
}
