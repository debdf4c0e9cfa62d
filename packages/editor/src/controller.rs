//! # Tree Controller
//!
//! The only component that changes both the domain model and the mirror
//! tree. Every structural edit runs the same protocol:
//!
//! 1. Check the controller is ready and resolve the target
//! 2. Compute the affected parent and row, capture the `before` snapshot
//! 3. Announce the change to observers
//! 4. Edit the domain model; on failure close the announcement and stop
//! 5. Apply the same change to the mirror (one insert or removal)
//! 6. Close the announcement
//! 7. Record one undo entry
//!
//! Undo and redo replace the whole document and rebuild the mirror inside
//! a reset announcement.

use crate::config::EditorConfig;
use crate::domain::{DomainHandle, DomainModel, Placement};
use crate::errors::EditorError;
use crate::mutations::{EditResult, StructuralEdit};
use crate::node::NodeId;
use crate::observer::{ModelObserver, Notifier};
use crate::tree::MirrorTree;
use crate::undo_stack::{SnapshotEntry, SnapshotTarget, SnapshotUndoStack};
use tracing::{debug, error, info, instrument, warn};

/// Whether edits can be accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// No domain attached, or the mirror could not be built
    Unready,
    Ready,
}

#[derive(Debug)]
enum Change {
    Insert { element_type: &'static str, uid: String },
    Remove,
}

/// Where an edit lands in the mirror, computed before anything changes
#[derive(Debug)]
struct Plan {
    parent: NodeId,
    row: usize,
    change: Change,
    /// Section on the far side of the insertion point, if any
    neighbor: Option<String>,
}

/// Owns the domain model, the mirror tree and the undo history
pub struct TreeController<D: DomainModel> {
    config: EditorConfig,
    domain: Option<D>,
    tree: MirrorTree,
    notifier: Notifier,
    undo_stack: SnapshotUndoStack,
    /// Domain revision the mirror was last synchronized with
    seen_revision: u64,
}

impl<D: DomainModel> TreeController<D> {
    pub fn new(config: EditorConfig) -> Self {
        let undo_stack =
            SnapshotUndoStack::with_max_levels(config.undo_limit).with_warn_bytes(config.snapshot_warn_bytes);
        Self {
            config,
            domain: None,
            tree: MirrorTree::new(),
            notifier: Notifier::new(),
            undo_stack,
            seen_revision: 0,
        }
    }

    /// Controller with `domain` attached and the mirror built
    pub fn with_domain(config: EditorConfig, domain: D) -> Result<Self, EditorError> {
        let mut controller = Self::new(config);
        controller.attach(domain)?;
        Ok(controller)
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn state(&self) -> ControllerState {
        if self.domain.is_some() && self.tree.is_built() {
            ControllerState::Ready
        } else {
            ControllerState::Unready
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state() == ControllerState::Ready
    }

    pub fn subscribe(&mut self, observer: Box<dyn ModelObserver>) {
        self.notifier.subscribe(observer);
    }

    pub fn tree(&self) -> &MirrorTree {
        &self.tree
    }

    pub fn domain(&self) -> Option<&D> {
        self.domain.as_ref()
    }

    /// Direct access to the domain; changes made here bypass the mirror
    /// until [`sync_external_changes`](Self::sync_external_changes) runs
    pub fn domain_mut(&mut self) -> Option<&mut D> {
        self.domain.as_mut()
    }

    pub fn undo_stack(&self) -> &SnapshotUndoStack {
        &self.undo_stack
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Attach a domain model and build the mirror from it
    ///
    /// Any previous domain and its history are dropped. The domain stays
    /// attached when the build fails; the controller is then unready.
    pub fn attach(&mut self, domain: D) -> Result<(), EditorError> {
        self.undo_stack.clear();
        self.domain = Some(domain);
        self.reset_tree()
    }

    /// Detach the domain model, leaving an unbuilt mirror
    pub fn detach(&mut self) -> Option<D> {
        let domain = self.domain.take();
        self.undo_stack.clear();
        if let Err(e) = self.reset_tree() {
            warn!(error = %e, "clearing the mirror failed");
        }
        domain
    }

    /// Rebuild the whole mirror inside a reset announcement
    #[instrument(skip(self), fields(root = %self.config.root_path))]
    pub fn reset_tree(&mut self) -> Result<(), EditorError> {
        self.notifier.begin_reset()?;
        let result = match &self.domain {
            Some(domain) => {
                self.seen_revision = domain.revision();
                self.tree.build(domain.backend(), &self.config.root_path)
            }
            None => {
                self.tree.clean();
                Ok(())
            }
        };
        self.notifier.end();

        match &result {
            Ok(()) => debug!(nodes = self.tree.len(), "mirror rebuilt"),
            Err(e) => warn!(error = %e, "mirror could not be built"),
        }
        result
    }

    /// Rebuild when the domain changed behind the controller's back
    ///
    /// Returns whether a rebuild happened.
    pub fn sync_external_changes(&mut self) -> Result<bool, EditorError> {
        let Some(domain) = &self.domain else {
            return Ok(false);
        };
        if domain.revision() == self.seen_revision && self.tree.is_built() {
            return Ok(false);
        }
        info!(
            seen = self.seen_revision,
            current = domain.revision(),
            "domain changed outside the controller"
        );
        self.reset_tree()?;
        Ok(true)
    }

    pub fn configuration_as_string(&self) -> Result<String, EditorError> {
        self.domain
            .as_ref()
            .ok_or(EditorError::NotBuilt)?
            .serialize_whole_document()
    }

    /// Replace the whole document and rebuild the mirror
    ///
    /// The undo history is kept.
    pub fn update_configuration_from_string(&mut self, source: &str) -> Result<(), EditorError> {
        self.domain
            .as_mut()
            .ok_or(EditorError::NotBuilt)?
            .replace_whole_document(source)?;
        self.reset_tree()
    }

    // ---------------------------------------------------------------------
    // Edits
    // ---------------------------------------------------------------------

    /// Apply a structural edit to the domain and the mirror
    #[instrument(skip(self, edit), fields(edit = %edit))]
    pub fn apply(&mut self, edit: &StructuralEdit) -> Result<EditResult, EditorError> {
        edit.validate()?;
        let domain = self.domain.as_mut().ok_or(EditorError::NotBuilt)?;
        if !self.tree.is_built() {
            return Err(EditorError::NotBuilt);
        }

        let plan = plan_edit(&self.tree, &*domain, edit)?;
        let before = domain.serialize_whole_document()?;

        match plan.change {
            Change::Insert { .. } => self.notifier.begin_insert_rows(plan.parent, plan.row, plan.row)?,
            Change::Remove => self.notifier.begin_remove_rows(plan.parent, plan.row, plan.row)?,
        }

        if let Err(e) = execute(domain, edit, plan.neighbor.as_deref()) {
            self.notifier.end();
            warn!(error = %e, "edit rejected");
            return Err(e);
        }

        let patched = match &plan.change {
            Change::Insert { element_type, uid } => self
                .tree
                .insert_child_at(plan.parent, plan.row, element_type, uid)
                .and_then(|node| {
                    self.tree.populate_subtree(domain.backend(), node)?;
                    Ok(Some(node))
                }),
            Change::Remove => self.tree.remove_child_at(plan.parent, plan.row).map(|()| None),
        };
        self.notifier.end();
        let version = domain.revision();

        let entry = SnapshotEntry::new(before).with_description(edit.to_string());
        let inserted = match patched {
            Ok(node) => node,
            Err(e) => {
                error!(error = %e, "mirror patch failed, rebuilding");
                if let Err(rebuild) = self.reset_tree() {
                    // the domain change stays undoable
                    self.record(entry)?;
                    return Err(rebuild);
                }
                edit.inserted().and_then(|(_, uid)| self.tree.find_by_uid(uid))
            }
        };
        self.seen_revision = version;

        self.record(entry)?;
        debug!(parent = %plan.parent, row = plan.row, "edit applied");

        Ok(EditResult {
            version,
            parent: plan.parent,
            row: plan.row,
            inserted,
        })
    }

    /// Apply edits in order as a single undo step, stopping at the first failure
    pub fn apply_all(&mut self, edits: &[StructuralEdit], description: &str) -> Result<Vec<EditResult>, EditorError> {
        self.begin_batch(description);
        let results: Result<Vec<_>, _> = edits.iter().map(|edit| self.apply(edit)).collect();
        self.end_batch();
        results
    }

    /// Run an edit the controller cannot express structurally
    ///
    /// The mirror is rebuilt afterwards and the change is recorded as one
    /// undo step. When `edit` fails the document is restored to its state
    /// before the call.
    pub fn edit_with<F>(&mut self, description: &str, edit: F) -> Result<(), EditorError>
    where
        F: FnOnce(&mut D) -> Result<(), EditorError>,
    {
        let domain = self.domain.as_mut().ok_or(EditorError::NotBuilt)?;
        let before = domain.serialize_whole_document()?;
        if let Err(e) = edit(domain) {
            warn!(error = %e, "edit rejected, restoring document");
            domain
                .replace_whole_document(&before)
                .map_err(|restore| EditorError::SnapshotCorrupt(restore.to_string()))?;
            self.reset_tree()?;
            return Err(e);
        }
        let entry = SnapshotEntry::new(before).with_description(description);
        if let Err(e) = self.reset_tree() {
            self.record(entry)?;
            return Err(e);
        }
        self.record(entry)
    }

    fn record(&mut self, entry: SnapshotEntry) -> Result<(), EditorError> {
        let domain = self.domain.as_mut().ok_or(EditorError::NotBuilt)?;
        let mut target = Resync {
            domain,
            tree: &mut self.tree,
            notifier: &mut self.notifier,
        };
        self.undo_stack.push(entry, &mut target)
    }

    // ---------------------------------------------------------------------
    // History
    // ---------------------------------------------------------------------

    #[instrument(skip(self))]
    pub fn undo(&mut self) -> Result<bool, EditorError> {
        let domain = self.domain.as_mut().ok_or(EditorError::NotBuilt)?;
        let mut target = Resync {
            domain,
            tree: &mut self.tree,
            notifier: &mut self.notifier,
        };
        let undone = self.undo_stack.undo(&mut target)?;
        self.mark_synced();
        Ok(undone)
    }

    #[instrument(skip(self))]
    pub fn redo(&mut self) -> Result<bool, EditorError> {
        let domain = self.domain.as_mut().ok_or(EditorError::NotBuilt)?;
        let mut target = Resync {
            domain,
            tree: &mut self.tree,
            notifier: &mut self.notifier,
        };
        let redone = self.undo_stack.redo(&mut target)?;
        self.mark_synced();
        Ok(redone)
    }

    fn mark_synced(&mut self) {
        if let Some(domain) = &self.domain {
            self.seen_revision = domain.revision();
        }
    }

    pub fn can_undo(&self) -> bool {
        self.undo_stack.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo_stack.can_redo()
    }

    /// Group the following edits into one undo step
    pub fn begin_batch(&mut self, description: &str) {
        self.undo_stack.begin_batch();
        self.undo_stack.set_batch_description(description);
    }

    pub fn end_batch(&mut self) {
        self.undo_stack.end_batch();
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    pub fn row_count(&self, node: NodeId) -> usize {
        self.tree.row_count(node)
    }

    pub fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.tree.parent_of(node)
    }

    pub fn child_at(&self, node: NodeId, row: usize) -> Option<NodeId> {
        self.tree.child_at(node, row)
    }

    pub fn find_by_uid(&self, uid: &str) -> Option<NodeId> {
        self.tree.find_by_uid(uid)
    }

    pub fn find_all_of_type(&self, element_type: &str) -> Vec<NodeId> {
        self.tree.find_all_of_type(element_type)
    }

    pub fn derive_path(&self, node: NodeId) -> Option<String> {
        self.tree.derive_path(node)
    }

    /// First aircraft model in the mirror
    pub fn aircraft_model(&self) -> Option<NodeId> {
        self.tree.find_all_of_type("model").into_iter().next()
    }

    /// Mirror nodes of the sections of a wing or fuselage, in order
    pub fn sections_of(&self, body_uid: &str) -> Vec<NodeId> {
        let Some(body) = self.tree.find_by_uid(body_uid) else {
            return Vec::new();
        };
        self.tree
            .children(body)
            .iter()
            .filter(|c| self.tree.element_type(**c) == Some("sections"))
            .flat_map(|sections| self.tree.children(*sections).iter().copied())
            .filter(|s| self.tree.element_type(*s) == Some("section"))
            .collect()
    }

    /// Section `uID`s of a wing or fuselage as the domain orders them
    pub fn ordered_sections(&self, body_uid: &str) -> Result<Vec<String>, EditorError> {
        self.domain
            .as_ref()
            .ok_or(EditorError::NotBuilt)?
            .section_uids(body_uid)
    }
}

impl<D: DomainModel> std::fmt::Debug for TreeController<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeController")
            .field("state", &self.state())
            .field("nodes", &self.tree.len())
            .field("undo_levels", &self.undo_stack.undo_levels())
            .finish()
    }
}

/// Snapshot target that restores the domain and rebuilds the mirror
struct Resync<'a, D: DomainModel> {
    domain: &'a mut D,
    tree: &'a mut MirrorTree,
    notifier: &'a mut Notifier,
}

impl<D: DomainModel> SnapshotTarget for Resync<'_, D> {
    fn capture(&self) -> Result<String, EditorError> {
        self.domain.serialize_whole_document()
    }

    fn restore(&mut self, snapshot: &str) -> Result<(), EditorError> {
        self.notifier.begin_reset()?;
        let result = self
            .domain
            .replace_whole_document(snapshot)
            .and_then(|()| self.tree.reload(self.domain.backend()));
        if let Err(e) = result {
            self.tree.clean();
            self.notifier.end();
            error!(error = %e, "snapshot restore failed");
            return Err(EditorError::SnapshotCorrupt(e.to_string()));
        }
        self.notifier.end();
        Ok(())
    }
}

fn plan_edit<D: DomainModel>(tree: &MirrorTree, domain: &D, edit: &StructuralEdit) -> Result<Plan, EditorError> {
    match edit {
        StructuralEdit::AddSection { reference_uid, placement, name, .. } => {
            let body_uid = match domain.resolve_by_uid(reference_uid) {
                Some(DomainHandle::Section { body_uid, .. }) => body_uid,
                Some(other) => return Err(EditorError::rejected(format!("{} is not a section", other))),
                None => return Err(EditorError::not_found(reference_uid.as_str())),
            };
            let (parent, row) = locate(tree, reference_uid)?;

            let order = domain.section_uids(&body_uid)?;
            let index = order
                .iter()
                .position(|uid| uid == reference_uid)
                .ok_or_else(|| EditorError::not_found(reference_uid.as_str()))?;
            let (row, neighbor) = match placement {
                Placement::Before => (row, index.checked_sub(1).and_then(|i| order.get(i)).cloned()),
                Placement::After => (row + 1, order.get(index + 1).cloned()),
            };

            Ok(Plan {
                parent,
                row,
                change: Change::Insert { element_type: "section", uid: name.clone() },
                neighbor,
            })
        }

        StructuralEdit::DeleteSection { uid } => {
            match domain.resolve_by_uid(uid) {
                Some(DomainHandle::Section { .. }) => {}
                Some(other) => return Err(EditorError::rejected(format!("{} is not a section", other))),
                None => return Err(EditorError::not_found(uid.as_str())),
            }
            let (parent, row) = locate(tree, uid)?;
            Ok(Plan { parent, row, change: Change::Remove, neighbor: None })
        }

        StructuralEdit::AddBody { kind, uid, .. } => {
            let model = tree
                .find_all_of_type("model")
                .into_iter()
                .next()
                .ok_or_else(|| EditorError::not_found("aircraft model"))?;
            let container = single(tree.find_all_of_type_under(model, kind.container_type()), kind.container_type())?;
            Ok(Plan {
                parent: container,
                row: append_row(tree, container, kind.element_type()),
                change: Change::Insert { element_type: kind.element_type(), uid: uid.clone() },
                neighbor: None,
            })
        }

        StructuralEdit::DeleteBody { kind, uid } => {
            match domain.resolve_by_uid(uid) {
                Some(DomainHandle::Body { kind: found, .. }) if found == *kind => {}
                Some(other) => {
                    return Err(EditorError::rejected(format!("{} is not a {}", other, kind.element_type())))
                }
                None => return Err(EditorError::not_found(uid.as_str())),
            }
            let (parent, row) = locate(tree, uid)?;
            Ok(Plan { parent, row, change: Change::Remove, neighbor: None })
        }

        StructuralEdit::AddProfile { kind, uid } => {
            let container = single(tree.find_all_of_type(kind.container_type()), kind.container_type())?;
            Ok(Plan {
                parent: container,
                row: append_row(tree, container, kind.element_type()),
                change: Change::Insert { element_type: kind.element_type(), uid: uid.clone() },
                neighbor: None,
            })
        }
    }
}

fn execute<D: DomainModel>(domain: &mut D, edit: &StructuralEdit, neighbor: Option<&str>) -> Result<(), EditorError> {
    match edit {
        StructuralEdit::AddSection { reference_uid, placement, name, eta } => {
            let require_eta =
                || eta.ok_or_else(|| EditorError::rejected("no eta given for a section between two sections"));
            match (placement, neighbor) {
                (Placement::Before, Some(previous)) => domain.create_section_between(previous, reference_uid, require_eta()?, name),
                (Placement::After, Some(next)) => domain.create_section_between(reference_uid, next, require_eta()?, name),
                (Placement::Before, None) => domain.create_section_before(reference_uid, name),
                (Placement::After, None) => domain.create_section_after(reference_uid, name),
            }
        }
        StructuralEdit::DeleteSection { uid } => domain.delete_section(uid),
        StructuralEdit::AddBody { kind, uid, section_count, profile_uid } => {
            domain.create_body(*kind, uid, *section_count, profile_uid)
        }
        StructuralEdit::DeleteBody { kind, uid } => domain.delete_body(*kind, uid),
        StructuralEdit::AddProfile { kind, uid } => domain.add_profile(*kind, uid),
    }
}

/// Parent and row of the mirror node carrying `uid`
fn locate(tree: &MirrorTree, uid: &str) -> Result<(NodeId, usize), EditorError> {
    let node = tree.find_by_uid(uid).ok_or_else(|| EditorError::not_found(uid))?;
    let parent = tree
        .parent_of(node)
        .ok_or_else(|| EditorError::rejected(format!("'{}' is the mirror root", uid)))?;
    let row = tree.row_of(node).ok_or_else(|| EditorError::not_found(uid))?;
    Ok((parent, row))
}

fn single(candidates: Vec<NodeId>, what: &str) -> Result<NodeId, EditorError> {
    match candidates.as_slice() {
        [one] => Ok(*one),
        [] => Err(EditorError::not_found(what)),
        _ => Err(EditorError::rejected(format!("more than one {} element", what))),
    }
}

/// Row after the last child of `element_type`, or the end when there is none
fn append_row(tree: &MirrorTree, parent: NodeId, element_type: &str) -> usize {
    tree.children(parent)
        .iter()
        .rposition(|c| tree.element_type(*c) == Some(element_type))
        .map_or(tree.row_count(parent), |last| last + 1)
}
