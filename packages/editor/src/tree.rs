//! # Mirror Tree
//!
//! Tree-shaped cache of a CPACS document below a configured root path.
//!
//! ## Design
//!
//! - Nodes are stored in a generational arena; [`NodeId`]s of removed
//!   nodes never resolve again
//! - A node stores only its type, `uID`, parent and ordered children
//! - Paths and positional indices are derived from the current sibling
//!   order, so inserting or removing a sibling never leaves stale paths
//! - Children of a node are grouped by type in order of first appearance
//!   in the document, then by position among same-typed siblings
//! - Every structural change bumps [`MirrorTree::revision`]
//!
//! Query methods never fail on an unbuilt tree or a stale id. They answer
//! with empty or neutral values instead.

use crate::errors::EditorError;
use crate::node::{MirrorNode, NodeId, Slot};
use cpacs_common::path::{self, Path, Segment};
use cpacs_common::DocumentBackend;
use std::sync::atomic::{AtomicU64, Ordering};

/// Attribute holding an element's unique id
pub const UID_ATTRIBUTE: &str = "uID";

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Mirror of the document subtree below a root path
#[derive(Debug)]
pub struct MirrorTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: Option<NodeId>,
    /// Last root path passed to `build`; kept across `clean` so `reload` works
    root_path: Option<String>,
    revision: u64,
    instance: u64,
    live: usize,
}

impl MirrorTree {
    /// Create an unbuilt tree
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: None,
            root_path: None,
            revision: 0,
            instance: NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed),
            live: 0,
        }
    }

    pub fn is_built(&self) -> bool {
        self.root.is_some()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn root_path(&self) -> Option<&str> {
        self.root_path.as_deref()
    }

    /// Counter bumped on every build, clean, insert and removal
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Distinguishes trees when caches are keyed by revision
    pub fn instance(&self) -> u64 {
        self.instance
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    // ---------------------------------------------------------------------
    // Building
    // ---------------------------------------------------------------------

    /// Discard the current contents and mirror the document below `root_path`
    ///
    /// On failure the tree is left unbuilt.
    #[tracing::instrument(skip(self, backend))]
    pub fn build(&mut self, backend: &dyn DocumentBackend, root_path: &str) -> Result<(), EditorError> {
        let parsed = Path::parse(root_path)?;
        // trailing separators dropped, children are appended to this form
        let root_path = parsed.to_string();
        let root_path = root_path.as_str();
        self.clear_nodes();
        self.root_path = Some(root_path.to_string());

        if !backend.resolve_path(root_path) {
            return Err(EditorError::not_found(root_path));
        }

        let element_type = parsed
            .last()
            .map(|s| s.element_type.clone())
            .ok_or_else(|| EditorError::not_found(root_path))?;
        let uid = backend
            .get_attribute(root_path, UID_ATTRIBUTE)?
            .unwrap_or_default();

        let root = self.alloc(MirrorNode::new(element_type, uid, None));
        self.root = Some(root);

        if let Err(e) = self.populate_from(backend, root, root_path) {
            self.clear_nodes();
            return Err(e);
        }

        tracing::debug!(root = %root_path, nodes = self.live, "built mirror tree");
        Ok(())
    }

    /// Rebuild from the root path of the last `build`
    pub fn reload(&mut self, backend: &dyn DocumentBackend) -> Result<(), EditorError> {
        let root_path = self.root_path.clone().ok_or(EditorError::NotBuilt)?;
        self.build(backend, &root_path)
    }

    /// Discard all nodes and return to the unbuilt state
    pub fn clean(&mut self) {
        self.clear_nodes();
    }

    /// Replace the children of `node` with a fresh mirror of the document
    pub fn populate_subtree(&mut self, backend: &dyn DocumentBackend, node: NodeId) -> Result<(), EditorError> {
        let path = self
            .derive_path(node)
            .ok_or_else(|| EditorError::not_found(node.to_string()))?;

        let old_children = std::mem::take(&mut self.get_mut(node)?.children);
        for child in old_children {
            self.free_subtree(child);
        }

        self.populate_from(backend, node, &path)?;
        self.revision += 1;
        Ok(())
    }

    fn populate_from(&mut self, backend: &dyn DocumentBackend, node: NodeId, node_path: &str) -> Result<(), EditorError> {
        for (element_type, count) in backend.child_types_and_counts(node_path)? {
            for ordinal in 1..=count {
                let child_path = path::append(node_path, &format!("{}[{}]", element_type, ordinal));
                let uid = backend
                    .get_attribute(&child_path, UID_ATTRIBUTE)?
                    .unwrap_or_default();
                let child = self.alloc(MirrorNode::new(element_type.clone(), uid, Some(node)));
                self.get_mut(node)?.children.push(child);
                self.populate_from(backend, child, &child_path)?;
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Targeted edits
    // ---------------------------------------------------------------------

    /// Insert a childless node at `row` of `parent`
    pub fn insert_child_at(
        &mut self,
        parent: NodeId,
        row: usize,
        element_type: &str,
        uid: &str,
    ) -> Result<NodeId, EditorError> {
        if !self.is_built() {
            return Err(EditorError::NotBuilt);
        }
        let len = self.get(parent)?.children.len();
        if row > len {
            return Err(EditorError::InvalidRow { row, len });
        }

        let child = self.alloc(MirrorNode::new(element_type, uid, Some(parent)));
        self.get_mut(parent)?.children.insert(row, child);
        self.revision += 1;
        Ok(child)
    }

    /// Remove the child at `row` of `parent` together with its subtree
    pub fn remove_child_at(&mut self, parent: NodeId, row: usize) -> Result<(), EditorError> {
        if !self.is_built() {
            return Err(EditorError::NotBuilt);
        }
        let children = &mut self.get_mut(parent)?.children;
        let len = children.len();
        if row >= len {
            return Err(EditorError::InvalidRow { row, len });
        }

        let child = children.remove(row);
        self.free_subtree(child);
        self.revision += 1;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    pub fn node(&self, id: NodeId) -> Option<&MirrorNode> {
        self.slots
            .get(id.slot as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn element_type(&self, id: NodeId) -> Option<&str> {
        self.node(id).map(MirrorNode::element_type)
    }

    pub fn uid(&self, id: NodeId) -> Option<&str> {
        self.node(id).map(MirrorNode::uid)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(MirrorNode::children).unwrap_or(&[])
    }

    pub fn row_count(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    pub fn child_at(&self, id: NodeId, row: usize) -> Option<NodeId> {
        self.children(id).get(row).copied()
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(MirrorNode::parent)
    }

    /// Position among all children of the parent; `None` for the root
    pub fn row_of(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent_of(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    /// 1-based rank among same-typed siblings; 1 for the root
    pub fn positional_index(&self, id: NodeId) -> Option<usize> {
        let node = self.node(id)?;
        let Some(parent) = node.parent else {
            return Some(1);
        };
        let mut rank = 0;
        for sibling in self.children(parent) {
            if self.element_type(*sibling) == Some(node.element_type()) {
                rank += 1;
            }
            if *sibling == id {
                return Some(rank);
            }
        }
        None
    }

    fn same_type_sibling_count(&self, id: NodeId) -> usize {
        let (Some(parent), Some(element_type)) = (self.parent_of(id), self.element_type(id)) else {
            return 1;
        };
        self.children(parent)
            .iter()
            .filter(|c| self.element_type(**c) == Some(element_type))
            .count()
    }

    /// Absolute document path of a node
    ///
    /// The ordinal is rendered only when the parent has more than one child
    /// of the node's type.
    pub fn derive_path(&self, id: NodeId) -> Option<String> {
        let root_path = self.root_path.as_deref()?;
        let mut segments = Vec::new();
        let mut current = id;

        while let Some(parent) = self.parent_of(current) {
            let element_type = self.element_type(current)?;
            let segment = if self.same_type_sibling_count(current) > 1 {
                format!("{}[{}]", element_type, self.positional_index(current)?)
            } else {
                element_type.to_string()
            };
            segments.push(segment);
            current = parent;
        }

        if Some(current) != self.root {
            return None;
        }

        let mut out = root_path.to_string();
        for segment in segments.iter().rev() {
            out = path::append(&out, segment);
        }
        Some(out)
    }

    /// Find the node a document path addresses
    ///
    /// Paths outside the root path, or naming no mirrored element, give
    /// `Ok(None)`. Malformed paths are errors.
    pub fn node_at_path(&self, raw: &str) -> Result<Option<NodeId>, EditorError> {
        let target = Path::parse(raw)?;
        let (Some(root), Some(root_path)) = (self.root, self.root_path.as_deref()) else {
            return Ok(None);
        };
        let root_path = Path::parse(root_path)?;

        if target.len() < root_path.len() {
            return Ok(None);
        }
        let (prefix, rest) = target.segments().split_at(root_path.len());
        if !prefix
            .iter()
            .zip(root_path.segments())
            .all(|(a, b)| a.addresses_same(b))
        {
            return Ok(None);
        }

        let mut current = root;
        for segment in rest {
            match self.nth_child_of_type(current, segment) {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    fn nth_child_of_type(&self, id: NodeId, segment: &Segment) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| self.element_type(*c) == Some(segment.element_type.as_str()))
            .nth(segment.ordinal().checked_sub(1)?)
    }

    /// First node in pre-order whose `uID` equals `uid`
    pub fn find_by_uid(&self, uid: &str) -> Option<NodeId> {
        if uid.is_empty() {
            return None;
        }
        self.preorder(self.root?).find(|id| self.uid(*id) == Some(uid))
    }

    /// All nodes of a type in pre-order
    pub fn find_all_of_type(&self, element_type: &str) -> Vec<NodeId> {
        match self.root {
            Some(root) => self.find_all_of_type_under(root, element_type),
            None => Vec::new(),
        }
    }

    /// Nodes of a type in pre-order, including `start` itself
    pub fn find_all_of_type_under(&self, start: NodeId, element_type: &str) -> Vec<NodeId> {
        self.preorder(start)
            .filter(|id| self.element_type(*id) == Some(element_type))
            .collect()
    }

    /// Pre-order traversal starting at `start`
    pub fn preorder(&self, start: NodeId) -> Preorder<'_> {
        let stack = if self.contains(start) { vec![start] } else { Vec::new() };
        Preorder { tree: self, stack }
    }

    /// Depth of a node below the root
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = self.parent_of(current) {
            depth += 1;
            current = parent;
        }
        depth
    }

    // ---------------------------------------------------------------------
    // Arena
    // ---------------------------------------------------------------------

    fn get(&self, id: NodeId) -> Result<&MirrorNode, EditorError> {
        self.node(id).ok_or_else(|| EditorError::not_found(id.to_string()))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut MirrorNode, EditorError> {
        self.slots
            .get_mut(id.slot as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
            .ok_or_else(|| EditorError::not_found(id.to_string()))
    }

    fn alloc(&mut self, node: MirrorNode) -> NodeId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId { slot: index, generation: slot.generation };
        }
        self.slots.push(Slot { generation: 0, node: Some(node) });
        NodeId {
            slot: (self.slots.len() - 1) as u32,
            generation: 0,
        }
    }

    fn release(&mut self, id: NodeId) -> Option<MirrorNode> {
        let slot = self.slots.get_mut(id.slot as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.slot);
        self.live -= 1;
        Some(node)
    }

    fn free_subtree(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(node) = self.release(next) {
                pending.extend(node.children);
            }
        }
    }

    fn clear_nodes(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.node.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        self.live = 0;
        self.root = None;
        self.revision += 1;
    }
}

impl Default for MirrorTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a subtree in pre-order
pub struct Preorder<'a> {
    tree: &'a MirrorTree,
    stack: Vec<NodeId>,
}

impl Iterator for Preorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let next = self.stack.pop()?;
        self.stack.extend(self.tree.children(next).iter().rev().copied());
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpacs_parser::parse;

    const SOURCE: &str = r#"
        <cpacs>
            <vehicles>
                <aircraft>
                    <model uID="D150">
                        <name>D150</name>
                        <wings>
                            <wing uID="W1">
                                <sections>
                                    <section uID="W1_S1"/>
                                    <section uID="W1_S2"/>
                                </sections>
                            </wing>
                        </wings>
                    </model>
                </aircraft>
            </vehicles>
        </cpacs>
    "#;

    fn built() -> MirrorTree {
        let doc = parse(SOURCE).unwrap();
        let mut tree = MirrorTree::new();
        tree.build(&doc, "/cpacs/vehicles").unwrap();
        tree
    }

    #[test]
    fn test_build_mirrors_every_element() {
        let tree = built();
        // vehicles aircraft model name wings wing sections section section
        assert_eq!(tree.len(), 9);
        let root = tree.root().unwrap();
        assert_eq!(tree.element_type(root), Some("vehicles"));
        assert_eq!(tree.derive_path(root).as_deref(), Some("/cpacs/vehicles"));
    }

    #[test]
    fn test_ordinal_rendered_only_for_repeated_types() {
        let tree = built();
        let wing = tree.find_by_uid("W1").unwrap();
        assert_eq!(
            tree.derive_path(wing).as_deref(),
            Some("/cpacs/vehicles/aircraft/model/wings/wing")
        );
        let s2 = tree.find_by_uid("W1_S2").unwrap();
        assert_eq!(
            tree.derive_path(s2).as_deref(),
            Some("/cpacs/vehicles/aircraft/model/wings/wing/sections/section[2]")
        );
        assert_eq!(tree.positional_index(s2), Some(2));
    }

    #[test]
    fn test_build_with_trailing_separator() {
        let doc = parse(SOURCE).unwrap();
        let mut tree = MirrorTree::new();
        tree.build(&doc, "/cpacs/vehicles/").unwrap();

        assert_eq!(tree.len(), 9);
        assert_eq!(tree.root_path(), Some("/cpacs/vehicles"));
        let s2 = tree.find_by_uid("W1_S2").unwrap();
        assert_eq!(
            tree.derive_path(s2).as_deref(),
            Some("/cpacs/vehicles/aircraft/model/wings/wing/sections/section[2]")
        );
        tree.reload(&doc).unwrap();
        assert_eq!(tree.len(), 9);
    }

    #[test]
    fn test_node_at_path_accepts_explicit_first_ordinal() {
        let tree = built();
        let wing = tree.find_by_uid("W1").unwrap();
        let found = tree
            .node_at_path("/cpacs/vehicles/aircraft/model/wings/wing[1]")
            .unwrap();
        assert_eq!(found, Some(wing));
        assert_eq!(tree.node_at_path("/cpacs/other").unwrap(), None);
        assert!(tree.node_at_path("/cpacs/vehicles/wing[").is_err());
    }

    #[test]
    fn test_insert_shifts_sibling_paths() {
        let mut tree = built();
        let s1 = tree.find_by_uid("W1_S1").unwrap();
        let sections = tree.parent_of(s1).unwrap();
        let revision = tree.revision();

        let new = tree.insert_child_at(sections, 0, "section", "NEW").unwrap();
        assert_eq!(tree.revision(), revision + 1);
        assert_eq!(tree.row_of(new), Some(0));
        assert_eq!(tree.row_of(s1), Some(1));
        assert!(tree.derive_path(s1).unwrap().ends_with("section[2]"));
        assert_eq!(tree.row_count(sections), 3);
    }

    #[test]
    fn test_insert_row_out_of_range() {
        let mut tree = built();
        let root = tree.root().unwrap();
        let err = tree.insert_child_at(root, 5, "x", "").unwrap_err();
        assert!(matches!(err, EditorError::InvalidRow { row: 5, len: 1 }));
    }

    #[test]
    fn test_remove_invalidates_subtree_ids() {
        let mut tree = built();
        let wing = tree.find_by_uid("W1").unwrap();
        let s1 = tree.find_by_uid("W1_S1").unwrap();
        let wings = tree.parent_of(wing).unwrap();

        tree.remove_child_at(wings, 0).unwrap();
        assert!(!tree.contains(wing));
        assert!(!tree.contains(s1));
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.find_by_uid("W1_S1"), None);

        // reused slots hand out fresh generations
        let again = tree.insert_child_at(wings, 0, "wing", "W9").unwrap();
        assert_ne!(again, wing);
        assert!(!tree.contains(wing));
    }

    #[test]
    fn test_unbuilt_queries_are_neutral() {
        let tree = MirrorTree::new();
        let stale = NodeId { slot: 0, generation: 0 };
        assert!(!tree.is_built());
        assert_eq!(tree.row_count(stale), 0);
        assert_eq!(tree.parent_of(stale), None);
        assert_eq!(tree.child_at(stale, 0), None);
        assert_eq!(tree.find_by_uid("W1"), None);
        assert!(tree.find_all_of_type("wing").is_empty());
        assert_eq!(tree.node_at_path("/cpacs/vehicles").unwrap(), None);
    }

    #[test]
    fn test_edits_on_unbuilt_tree_fail() {
        let mut tree = MirrorTree::new();
        let stale = NodeId { slot: 0, generation: 0 };
        assert!(matches!(
            tree.insert_child_at(stale, 0, "wing", "W"),
            Err(EditorError::NotBuilt)
        ));
        assert!(matches!(tree.reload(&parse(SOURCE).unwrap()), Err(EditorError::NotBuilt)));
    }

    #[test]
    fn test_clean_then_reload() {
        let doc = parse(SOURCE).unwrap();
        let mut tree = built();
        let old_root = tree.root().unwrap();
        tree.clean();
        assert!(!tree.is_built());
        assert!(!tree.contains(old_root));

        tree.reload(&doc).unwrap();
        assert_eq!(tree.len(), 9);
    }

    #[test]
    fn test_build_missing_root_leaves_tree_unbuilt() {
        let doc = parse(SOURCE).unwrap();
        let mut tree = built();
        assert!(matches!(
            tree.build(&doc, "/cpacs/missing"),
            Err(EditorError::NotFound(_))
        ));
        assert!(!tree.is_built());
        assert!(matches!(
            tree.build(&doc, "/cpacs/vehicles[0]"),
            Err(EditorError::MalformedPath(_))
        ));
    }

    #[test]
    fn test_populate_subtree_replaces_children() {
        let doc = parse(SOURCE).unwrap();
        let mut tree = built();
        let wing = tree.find_by_uid("W1").unwrap();
        tree.populate_subtree(&doc, wing).unwrap();
        assert_eq!(tree.len(), 9);
        assert_eq!(tree.find_all_of_type("section").len(), 2);
    }

    #[test]
    fn test_find_all_of_type_in_preorder() {
        let tree = built();
        let uids: Vec<_> = tree
            .find_all_of_type("section")
            .into_iter()
            .filter_map(|id| tree.uid(id))
            .collect();
        assert_eq!(uids, vec!["W1_S1", "W1_S2"]);
        let model = tree.find_by_uid("D150").unwrap();
        assert_eq!(tree.find_all_of_type_under(model, "wings").len(), 1);
        assert_eq!(tree.depth(model), 2);
    }
}
