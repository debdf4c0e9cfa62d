//! # Mirror Nodes
//!
//! A mirror node caches the element type and `uID` of one document element.
//! Nodes live in the arena owned by [`MirrorTree`](crate::MirrorTree) and are
//! addressed by [`NodeId`]. A removed node's id never resolves again, even
//! after its slot is reused.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Generational index of a node in a mirror tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    pub(crate) slot: u32,
    pub(crate) generation: u32,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.slot, self.generation)
    }
}

/// Cached view of one document element
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorNode {
    element_type: String,
    uid: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl MirrorNode {
    pub(crate) fn new(element_type: impl Into<String>, uid: impl Into<String>, parent: Option<NodeId>) -> Self {
        Self {
            element_type: element_type.into(),
            uid: uid.into(),
            parent,
            children: Vec::new(),
        }
    }

    /// Element name, e.g. `wing`
    pub fn element_type(&self) -> &str {
        &self.element_type
    }

    /// Value of the `uID` attribute, empty when the element has none
    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

/// Arena slot; the generation is bumped every time the slot is vacated
#[derive(Debug, Default)]
pub(crate) struct Slot {
    pub(crate) generation: u32,
    pub(crate) node: Option<MirrorNode>,
}
