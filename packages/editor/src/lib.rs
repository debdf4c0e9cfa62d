//! # CPACS Tree Editor
//!
//! Mirrored tree cache over a CPACS document, with structural editing and
//! snapshot undo.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ parser: XML text → XmlDocument              │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: domain model + mirror tree          │
//! │  - CpacsDocument owns the document          │
//! │  - MirrorTree caches type/uID per element   │
//! │  - TreeController edits both in lockstep    │
//! │  - SnapshotUndoStack restores whole docs    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ views: FilterProjection + ModelObserver     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **The document is the source of truth**: the mirror can always be rebuilt
//! 2. **Derived addressing**: paths and ordinals come from sibling order, never stored
//! 3. **Targeted resync**: an edit touches one mirror row, not the whole tree
//! 4. **Bracketed changes**: observers see a begin/end pair for every change
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cpacs_editor::{CpacsDocument, EditorConfig, Placement, StructuralEdit, TreeController};
//!
//! // Load document and build the mirror
//! let doc = CpacsDocument::load("aircraft.xml".into())?;
//! let mut controller = TreeController::with_domain(EditorConfig::default(), doc)?;
//!
//! // Add a section behind the root section
//! controller.apply(&StructuralEdit::AddSection {
//!     reference_uid: "Wing_Sec1".to_string(),
//!     placement: Placement::After,
//!     name: "Wing_Sec1b".to_string(),
//!     eta: Some(0.5),
//! })?;
//!
//! // Undo restores the previous document and rebuilds the mirror
//! controller.undo()?;
//! ```

mod config;
mod controller;
mod document;
mod domain;
mod errors;
mod filter;
mod mutations;
mod node;
mod observer;
mod tree;
mod undo_stack;

pub use config::{EditorConfig, FilterConfig, DEFAULT_CONFIG_NAME};
pub use controller::{ControllerState, TreeController};
pub use document::{CpacsDocument, DocumentStorage};
pub use domain::{BodyKind, DomainHandle, DomainModel, Placement, ProfileKind};
pub use errors::EditorError;
pub use filter::{FilterProjection, DEFAULT_ALLOWED_TYPES};
pub use mutations::{EditResult, StructuralEdit};
pub use node::{MirrorNode, NodeId};
pub use observer::{EventLog, ModelEvent, ModelObserver, Notifier};
pub use tree::{MirrorTree, Preorder, UID_ATTRIBUTE};
pub use undo_stack::{SnapshotEntry, SnapshotTarget, SnapshotUndoStack};

// Re-export common types for convenience
pub use cpacs_common::{DocumentBackend, MalformedPath};
pub use cpacs_parser::XmlDocument;
