//! # Structural Edits
//!
//! Serializable description of every edit the controller performs, so a
//! sequence of edits can be stored and replayed.
//!
//! ## Edit Semantics
//!
//! ### Sections
//! - Added next to a reference section; if a neighbour exists on that side
//!   the new section goes between the two and needs `eta` in `(0, 1)`
//! - Deleting keeps at least two sections per component
//!
//! ### Wings and fuselages
//! - Appended to the model's container with `section_count >= 2` sections
//!   referencing an existing profile
//! - Deleted with their whole subtree
//!
//! ### Profiles
//! - Appended to the matching profile library

use crate::domain::{BodyKind, Placement, ProfileKind};
use crate::errors::EditorError;
use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Structural edit on the document and its mirror
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum StructuralEdit {
    AddSection {
        reference_uid: String,
        placement: Placement,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        eta: Option<f64>,
    },

    DeleteSection {
        uid: String,
    },

    AddBody {
        kind: BodyKind,
        uid: String,
        section_count: usize,
        profile_uid: String,
    },

    DeleteBody {
        kind: BodyKind,
        uid: String,
    },

    AddProfile {
        kind: ProfileKind,
        uid: String,
    },
}

impl StructuralEdit {
    /// Check the arguments without looking at any document
    pub fn validate(&self) -> Result<(), EditorError> {
        let non_empty = |field: &str, value: &str| {
            if value.trim().is_empty() {
                Err(EditorError::rejected(format!("{} must not be empty", field)))
            } else {
                Ok(())
            }
        };

        match self {
            StructuralEdit::AddSection { reference_uid, name, eta, .. } => {
                non_empty("reference_uid", reference_uid)?;
                non_empty("name", name)?;
                if let Some(eta) = eta {
                    if !eta.is_finite() {
                        return Err(EditorError::rejected("eta must be a finite number"));
                    }
                }
                Ok(())
            }
            StructuralEdit::DeleteSection { uid } | StructuralEdit::DeleteBody { uid, .. } => {
                non_empty("uid", uid)
            }
            StructuralEdit::AddBody { uid, profile_uid, .. } => {
                non_empty("uid", uid)?;
                non_empty("profile_uid", profile_uid)
            }
            StructuralEdit::AddProfile { uid, .. } => non_empty("uid", uid),
        }
    }

    /// Element type and `uID` of the node this edit inserts, if any
    pub fn inserted(&self) -> Option<(&'static str, &str)> {
        match self {
            StructuralEdit::AddSection { name, .. } => Some(("section", name.as_str())),
            StructuralEdit::AddBody { kind, uid, .. } => Some((kind.element_type(), uid.as_str())),
            StructuralEdit::AddProfile { kind, uid } => Some((kind.element_type(), uid.as_str())),
            StructuralEdit::DeleteSection { .. } | StructuralEdit::DeleteBody { .. } => None,
        }
    }
}

impl fmt::Display for StructuralEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuralEdit::AddSection { reference_uid, placement, name, .. } => {
                let side = match placement {
                    Placement::Before => "before",
                    Placement::After => "after",
                };
                write!(f, "Add section {} {} {}", name, side, reference_uid)
            }
            StructuralEdit::DeleteSection { uid } => write!(f, "Delete section {}", uid),
            StructuralEdit::AddBody { kind, uid, .. } => write!(f, "Add {} {}", kind.element_type(), uid),
            StructuralEdit::DeleteBody { kind, uid } => write!(f, "Delete {} {}", kind.element_type(), uid),
            StructuralEdit::AddProfile { kind, uid } => write!(f, "Add {} {}", kind.element_type(), uid),
        }
    }
}

/// Result of applying an edit
#[derive(Debug, Clone, PartialEq)]
pub struct EditResult {
    /// Domain revision after the edit
    pub version: u64,

    /// Mirror node whose children changed
    pub parent: NodeId,

    /// Row that was inserted or removed
    pub row: usize,

    /// Inserted mirror node, for additions
    pub inserted: Option<NodeId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_serialization() {
        let edit = StructuralEdit::AddSection {
            reference_uid: "W1_S1".to_string(),
            placement: Placement::After,
            name: "Mid".to_string(),
            eta: Some(0.5),
        };

        let json = serde_json::to_string(&edit).unwrap();
        let deserialized: StructuralEdit = serde_json::from_str(&json).unwrap();

        assert_eq!(edit, deserialized);
    }

    #[test]
    fn test_script_without_eta() {
        let json = r#"[
            { "AddSection": { "reference_uid": "S1", "placement": "Before", "name": "S0" } },
            { "DeleteBody": { "kind": "Fuselage", "uid": "F1" } }
        ]"#;
        let edits: Vec<StructuralEdit> = serde_json::from_str(json).unwrap();
        assert_eq!(edits.len(), 2);
        assert!(matches!(edits[0], StructuralEdit::AddSection { eta: None, .. }));
        assert_eq!(edits[1].to_string(), "Delete fuselage F1");
    }

    #[test]
    fn test_validation_rejects_empty_ids() {
        let edit = StructuralEdit::DeleteSection { uid: " ".to_string() };
        assert!(matches!(edit.validate(), Err(EditorError::DomainRejected(_))));

        let edit = StructuralEdit::AddSection {
            reference_uid: "S1".to_string(),
            placement: Placement::After,
            name: "S2".to_string(),
            eta: Some(f64::NAN),
        };
        assert!(edit.validate().is_err());
    }

    #[test]
    fn test_inserted_node() {
        let edit = StructuralEdit::AddProfile {
            kind: ProfileKind::WingAirfoil,
            uid: "NACA".to_string(),
        };
        assert_eq!(edit.inserted(), Some(("wingAirfoil", "NACA")));
        assert_eq!(StructuralEdit::DeleteSection { uid: "S".into() }.inserted(), None);
    }
}
