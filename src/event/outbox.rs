use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use super::Event;
use crate::model::NodeId;

/// A routing request raised while another delivery may be in progress.
#[derive(Debug, Clone)]
pub enum Dispatch {
    /// Deliver to the ancestors of `origin`.
    Bubble { origin: NodeId, event: Event },
    /// Deliver to the descendants of `origin`.
    Trickle { origin: NodeId, event: Event },
    /// Deliver to the root and then every node below it.
    Broadcast(Event),
}

impl Dispatch {
    pub fn event(&self) -> &Event {
        match self {
            Dispatch::Bubble { event, .. }
            | Dispatch::Trickle { event, .. }
            | Dispatch::Broadcast(event) => event,
        }
    }
}

/// FIFO of pending dispatches shared by every controller of one layout.
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    queue: Arc<Mutex<VecDeque<Dispatch>>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, dispatch: Dispatch) {
        self.queue.lock().push_back(dispatch);
    }

    pub fn bubble(&self, origin: NodeId, event: Event) {
        self.push(Dispatch::Bubble { origin, event });
    }

    pub fn trickle(&self, origin: NodeId, event: Event) {
        self.push(Dispatch::Trickle { origin, event });
    }

    pub fn pop(&self) -> Option<Dispatch> {
        self.queue.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Drop everything queued, returning how many dispatches were discarded.
    pub fn clear(&self) -> usize {
        let mut queue = self.queue.lock();
        let dropped = queue.len();
        queue.clear();
        dropped
    }
}
