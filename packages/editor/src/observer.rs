//! # Structural Change Notifications
//!
//! Views hold non-owning references to the mirror tree and must be told
//! about every structural change before and after it happens. Each change
//! is announced as a begin/end pair; pairs never nest.

use crate::errors::EditorError;
use crate::node::NodeId;
use std::cell::RefCell;
use std::rc::Rc;

/// Notification delivered to observers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelEvent {
    BeginInsertRows { parent: NodeId, first: usize, last: usize },
    EndInsertRows,
    BeginRemoveRows { parent: NodeId, first: usize, last: usize },
    EndRemoveRows,
    BeginReset,
    EndReset,
}

/// Receiver of structural change notifications
pub trait ModelObserver {
    fn on_event(&mut self, event: &ModelEvent);
}

impl<T: ModelObserver> ModelObserver for Rc<RefCell<T>> {
    fn on_event(&mut self, event: &ModelEvent) {
        self.borrow_mut().on_event(event);
    }
}

/// Observer that records every event
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    pub events: Vec<ModelEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle, for registering with a controller while keeping access
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Whether begins and ends alternate and every begin is closed by its own kind
    pub fn is_balanced(&self) -> bool {
        let mut open: Option<&ModelEvent> = None;
        for event in &self.events {
            match (open, event) {
                (None, ModelEvent::BeginInsertRows { .. })
                | (None, ModelEvent::BeginRemoveRows { .. })
                | (None, ModelEvent::BeginReset) => open = Some(event),
                (Some(ModelEvent::BeginInsertRows { .. }), ModelEvent::EndInsertRows)
                | (Some(ModelEvent::BeginRemoveRows { .. }), ModelEvent::EndRemoveRows)
                | (Some(ModelEvent::BeginReset), ModelEvent::EndReset) => open = None,
                _ => return false,
            }
        }
        open.is_none()
    }
}

impl ModelObserver for EventLog {
    fn on_event(&mut self, event: &ModelEvent) {
        self.events.push(event.clone());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bracket {
    Insert,
    Remove,
    Reset,
}

/// Fan-out to registered observers, enforcing non-nesting brackets
#[derive(Default)]
pub struct Notifier {
    observers: Vec<Box<dyn ModelObserver>>,
    open: Option<Bracket>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Box<dyn ModelObserver>) {
        self.observers.push(observer);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    fn emit(&mut self, event: ModelEvent) {
        for observer in &mut self.observers {
            observer.on_event(&event);
        }
    }

    fn open(&mut self, bracket: Bracket, event: ModelEvent) -> Result<(), EditorError> {
        if self.open.is_some() {
            return Err(EditorError::BracketOpen);
        }
        self.open = Some(bracket);
        self.emit(event);
        Ok(())
    }

    pub fn begin_insert_rows(&mut self, parent: NodeId, first: usize, last: usize) -> Result<(), EditorError> {
        self.open(Bracket::Insert, ModelEvent::BeginInsertRows { parent, first, last })
    }

    pub fn begin_remove_rows(&mut self, parent: NodeId, first: usize, last: usize) -> Result<(), EditorError> {
        self.open(Bracket::Remove, ModelEvent::BeginRemoveRows { parent, first, last })
    }

    pub fn begin_reset(&mut self) -> Result<(), EditorError> {
        self.open(Bracket::Reset, ModelEvent::BeginReset)
    }

    /// Close whichever bracket is open; no-op when none is
    pub fn end(&mut self) {
        let event = match self.open.take() {
            Some(Bracket::Insert) => ModelEvent::EndInsertRows,
            Some(Bracket::Remove) => ModelEvent::EndRemoveRows,
            Some(Bracket::Reset) => ModelEvent::EndReset,
            None => {
                tracing::warn!("end called with no open bracket");
                return;
            }
        };
        self.emit(event);
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("observers", &self.observers.len())
            .field("open", &self.open)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> NodeId {
        NodeId { slot: 0, generation: 0 }
    }

    #[test]
    fn test_brackets_do_not_nest() {
        let mut notifier = Notifier::new();
        notifier.begin_insert_rows(id(), 0, 0).unwrap();
        assert!(matches!(notifier.begin_reset(), Err(EditorError::BracketOpen)));
        notifier.end();
        assert!(!notifier.is_open());
        notifier.begin_reset().unwrap();
    }

    #[test]
    fn test_shared_log_receives_pairs() {
        let log = EventLog::shared();
        let mut notifier = Notifier::new();
        notifier.subscribe(Box::new(log.clone()));

        notifier.begin_remove_rows(id(), 2, 2).unwrap();
        notifier.end();
        notifier.end();

        let log = log.borrow();
        assert_eq!(
            log.events,
            vec![
                ModelEvent::BeginRemoveRows { parent: id(), first: 2, last: 2 },
                ModelEvent::EndRemoveRows,
            ]
        );
        assert!(log.is_balanced());
    }

    #[test]
    fn test_unbalanced_log_detected() {
        let log = EventLog {
            events: vec![ModelEvent::BeginReset, ModelEvent::EndInsertRows],
        };
        assert!(!log.is_balanced());
        let open = EventLog {
            events: vec![ModelEvent::BeginReset],
        };
        assert!(!open.is_balanced());
    }
}
