use std::sync::Arc;

use flume::{Receiver, Sender};

use crate::model::TreeNode;
use crate::tree::Tree;

/// Handle returned by [`TreeStore::subscribe`](crate::TreeStore::subscribe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Owned snapshot of the root sequence sent to channel subscribers.
pub type Snapshot = Arc<[TreeNode]>;

// Returns `false` once it wants to be dropped.
type Observer = Box<dyn FnMut(&Tree) -> bool>;

/// Synchronous observer list with replay of the latest value.
///
/// Observers run inline during the emitting call. Because they only see a
/// shared `&Tree`, a handler cannot call back into store mutations.
#[derive(Default)]
pub(crate) struct Observers {
    observers: Vec<(SubscriptionId, Observer)>,
    channels: Vec<Sender<Snapshot>>,
    next_id: u64,
}

impl Observers {
    /// Register an observer and replay `current` to it immediately.
    ///
    /// The observer stays registered until it returns `false` or is
    /// unsubscribed.
    pub(crate) fn subscribe(
        &mut self,
        current: &Tree,
        mut observer: impl FnMut(&Tree) -> bool + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        if observer(current) {
            self.observers.push((id, Box::new(observer)));
        }
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    /// Open a channel that receives `current` first, then every emission.
    pub(crate) fn subscribe_channel(
        &mut self,
        current: &Tree,
    ) -> Receiver<Snapshot> {
        let (tx, rx) = flume::unbounded();
        // The receiver is alive here, so the send cannot fail.
        let _ = tx.send(Snapshot::from(current.to_nested()));
        self.channels.push(tx);
        rx
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len() + self.channels.len()
    }

    pub(crate) fn emit(&mut self, tree: &Tree) {
        self.observers.retain_mut(|(_, observer)| observer(tree));

        self.channels.retain(|tx| !tx.is_disconnected());
        if self.channels.is_empty() {
            return;
        }
        let snapshot = Snapshot::from(tree.to_nested());
        self.channels
            .retain(|tx| tx.send(Arc::clone(&snapshot)).is_ok());
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("observers", &self.observers.len())
            .field("channels", &self.channels.len())
            .finish()
    }
}
