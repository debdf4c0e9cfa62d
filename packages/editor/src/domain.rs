//! # Domain Model Interface
//!
//! The domain model owns the aircraft document. The controller resolves
//! edit targets through it, asks it to perform structural edits, and uses
//! whole-document serialization for undo snapshots.
//!
//! Implementations must leave the document untouched when an edit is
//! rejected.

use crate::errors::EditorError;
use cpacs_common::DocumentBackend;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Component kind owning sections and positionings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyKind {
    Wing,
    Fuselage,
}

impl BodyKind {
    pub fn from_element_type(name: &str) -> Option<Self> {
        match name {
            "wing" => Some(BodyKind::Wing),
            "fuselage" => Some(BodyKind::Fuselage),
            _ => None,
        }
    }

    pub fn element_type(self) -> &'static str {
        match self {
            BodyKind::Wing => "wing",
            BodyKind::Fuselage => "fuselage",
        }
    }

    /// Element holding all bodies of this kind under a model
    pub fn container_type(self) -> &'static str {
        match self {
            BodyKind::Wing => "wings",
            BodyKind::Fuselage => "fuselages",
        }
    }

    /// Profile kind referenced by section elements of this body
    pub fn profile_kind(self) -> ProfileKind {
        match self {
            BodyKind::Wing => ProfileKind::WingAirfoil,
            BodyKind::Fuselage => ProfileKind::FuselageProfile,
        }
    }
}

/// Profile library a profile belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProfileKind {
    WingAirfoil,
    FuselageProfile,
}

impl ProfileKind {
    pub fn element_type(self) -> &'static str {
        match self {
            ProfileKind::WingAirfoil => "wingAirfoil",
            ProfileKind::FuselageProfile => "fuselageProfile",
        }
    }

    pub fn container_type(self) -> &'static str {
        match self {
            ProfileKind::WingAirfoil => "wingAirfoils",
            ProfileKind::FuselageProfile => "fuselageProfiles",
        }
    }

    /// Child of a section element that names the profile
    pub fn reference_element(self) -> &'static str {
        match self {
            ProfileKind::WingAirfoil => "airfoilUID",
            ProfileKind::FuselageProfile => "profileUID",
        }
    }
}

/// Where a new section goes relative to its reference section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    Before,
    After,
}

/// Typed handle to a domain object, as resolved from a `uID`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainHandle {
    Model { uid: String },
    Body { uid: String, kind: BodyKind },
    Section { uid: String, body: BodyKind, body_uid: String },
    SectionElement { uid: String, section_uid: String },
    Positioning { uid: String, body_uid: String },
    Profile { uid: String, kind: ProfileKind },
    Other { uid: String, element_type: String },
}

impl DomainHandle {
    pub fn uid(&self) -> &str {
        match self {
            DomainHandle::Model { uid }
            | DomainHandle::Body { uid, .. }
            | DomainHandle::Section { uid, .. }
            | DomainHandle::SectionElement { uid, .. }
            | DomainHandle::Positioning { uid, .. }
            | DomainHandle::Profile { uid, .. }
            | DomainHandle::Other { uid, .. } => uid,
        }
    }

    pub fn element_type(&self) -> &str {
        match self {
            DomainHandle::Model { .. } => "model",
            DomainHandle::Body { kind, .. } => kind.element_type(),
            DomainHandle::Section { .. } => "section",
            DomainHandle::SectionElement { .. } => "element",
            DomainHandle::Positioning { .. } => "positioning",
            DomainHandle::Profile { kind, .. } => kind.element_type(),
            DomainHandle::Other { element_type, .. } => element_type,
        }
    }
}

impl fmt::Display for DomainHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.element_type(), self.uid())
    }
}

/// Operations the controller needs from the owner of the document
pub trait DomainModel {
    /// Path-based read access for building the mirror tree
    fn backend(&self) -> &dyn DocumentBackend;

    /// Counter that changes whenever the document changes
    fn revision(&self) -> u64;

    fn resolve_by_uid(&self, uid: &str) -> Option<DomainHandle>;

    /// `uID`s of the sections of a wing or fuselage, in document order
    fn section_uids(&self, body_uid: &str) -> Result<Vec<String>, EditorError>;

    /// Create a section named `name` directly before `section_uid`
    fn create_section_before(&mut self, section_uid: &str, name: &str) -> Result<(), EditorError>;

    /// Create a section named `name` directly after `section_uid`
    fn create_section_after(&mut self, section_uid: &str, name: &str) -> Result<(), EditorError>;

    /// Create a section between two adjacent sections at relative
    /// position `eta`, exclusive of both ends
    fn create_section_between(
        &mut self,
        first_uid: &str,
        second_uid: &str,
        eta: f64,
        name: &str,
    ) -> Result<(), EditorError>;

    fn delete_section(&mut self, section_uid: &str) -> Result<(), EditorError>;

    /// Append a body with `section_count` sections using an existing profile
    fn create_body(
        &mut self,
        kind: BodyKind,
        uid: &str,
        section_count: usize,
        profile_uid: &str,
    ) -> Result<(), EditorError>;

    fn delete_body(&mut self, kind: BodyKind, uid: &str) -> Result<(), EditorError>;

    fn add_profile(&mut self, kind: ProfileKind, uid: &str) -> Result<(), EditorError>;

    fn serialize_whole_document(&self) -> Result<String, EditorError>;

    /// Replace the document; on error the previous document stays in place
    fn replace_whole_document(&mut self, source: &str) -> Result<(), EditorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_accessors() {
        let handle = DomainHandle::Section {
            uid: "W1_S2".to_string(),
            body: BodyKind::Wing,
            body_uid: "W1".to_string(),
        };
        assert_eq!(handle.uid(), "W1_S2");
        assert_eq!(handle.element_type(), "section");
        assert_eq!(handle.to_string(), "section 'W1_S2'");
    }

    #[test]
    fn test_kind_tables() {
        assert_eq!(BodyKind::Fuselage.container_type(), "fuselages");
        assert_eq!(BodyKind::Wing.profile_kind(), ProfileKind::WingAirfoil);
        assert_eq!(ProfileKind::FuselageProfile.reference_element(), "profileUID");
        assert_eq!(ProfileKind::WingAirfoil.container_type(), "wingAirfoils");
    }
}
