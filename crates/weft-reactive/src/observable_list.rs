#![forbid(unsafe_code)]

//! Observable decorator around an ordered sequence.
//!
//! [`ObservableList<T>`] keys its notifications on item identity rather
//! than value identity: separate listener sequences observe additions and
//! deletions, and unlike [`Observable::on_change`](crate::Observable),
//! registration does not replay existing items.
//!
//! Deletion dispatch iterates a shallow copy of the delete-listener
//! sequence, so a listener may deregister itself (via [`SelfRemove`]) or
//! other listeners (via [`ListenerId`]) while a round is in flight.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::observable::SelfRemove;

/// Handle returned by listener registration, used for explicit removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct AddEntry<T> {
    id: ListenerId,
    callback: Rc<dyn Fn(&T)>,
}

impl<T> Clone for AddEntry<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            callback: Rc::clone(&self.callback),
        }
    }
}

struct DelEntry<T> {
    id: ListenerId,
    callback: Rc<dyn Fn(&T, &SelfRemove)>,
    removed: Rc<Cell<bool>>,
}

impl<T> Clone for DelEntry<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            callback: Rc::clone(&self.callback),
            removed: Rc::clone(&self.removed),
        }
    }
}

struct ListInner<T> {
    items: Vec<T>,
    add_listeners: Vec<AddEntry<T>>,
    del_listeners: Vec<DelEntry<T>>,
    next_id: u64,
}

/// An ordered sequence with add/delete notification.
///
/// Cloning the list creates a second handle to the same inner sequence.
pub struct ObservableList<T> {
    inner: Rc<RefCell<ListInner<T>>>,
}

impl<T> Clone for ObservableList<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ObservableList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ObservableList")
            .field("items", &inner.items)
            .field("add_listeners", &inner.add_listeners.len())
            .field("del_listeners", &inner.del_listeners.len())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> ObservableList<T> {
    /// Create a list seeded with the given items.
    ///
    /// Seed items produce no notifications.
    #[must_use]
    pub fn new(seed: Vec<T>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ListInner {
                items: seed,
                add_listeners: Vec::new(),
                del_listeners: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Register an add listener. Existing items are not replayed.
    pub fn on_add(&self, callback: impl Fn(&T) + 'static) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        let id = ListenerId(inner.next_id);
        inner.next_id += 1;
        inner.add_listeners.push(AddEntry {
            id,
            callback: Rc::new(callback),
        });
        id
    }

    /// Register a delete listener. Existing items are not replayed.
    ///
    /// The callback receives the deleted item and a [`SelfRemove`]
    /// capability for deregistering itself mid-round.
    pub fn on_del(&self, callback: impl Fn(&T, &SelfRemove) + 'static) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        let id = ListenerId(inner.next_id);
        inner.next_id += 1;
        inner.del_listeners.push(DelEntry {
            id,
            callback: Rc::new(callback),
            removed: Rc::new(Cell::new(false)),
        });
        id
    }

    /// Append an item, then notify every add listener with it.
    pub fn add(&self, item: T) {
        let snapshot: Vec<AddEntry<T>> = {
            let mut inner = self.inner.borrow_mut();
            inner.items.push(item.clone());
            inner.add_listeners.clone()
        };
        for entry in &snapshot {
            (*entry.callback)(&item);
        }
    }

    /// Remove the first occurrence of `item` (by equality), then notify
    /// every delete listener.
    ///
    /// Listeners are notified whether or not an occurrence was present;
    /// deletion of an absent item is observable as an unchanged count.
    pub fn del(&self, item: &T) {
        let snapshot: Vec<DelEntry<T>> = {
            let mut inner = self.inner.borrow_mut();
            if let Some(position) = inner.items.iter().position(|candidate| candidate == item) {
                inner.items.remove(position);
            }
            inner.del_listeners.clone()
        };
        for entry in &snapshot {
            if entry.removed.get() {
                continue;
            }
            let self_remove = SelfRemove::for_flag(&entry.removed);
            (*entry.callback)(item, &self_remove);
        }
        self.inner
            .borrow_mut()
            .del_listeners
            .retain(|entry| !entry.removed.get());
    }

    /// Deregister an add listener by its registration handle.
    pub fn remove_add_listener(&self, id: ListenerId) {
        self.inner
            .borrow_mut()
            .add_listeners
            .retain(|entry| entry.id != id);
    }

    /// Deregister a delete listener by its registration handle.
    pub fn remove_del_listener(&self, id: ListenerId) {
        self.inner
            .borrow_mut()
            .del_listeners
            .retain(|entry| entry.id != id);
    }

    /// Current number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().items.len()
    }

    /// True when the list holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().items.is_empty()
    }

    /// Count items satisfying `predicate`. Linear scan, no caching.
    #[must_use]
    pub fn count_if(&self, predicate: impl Fn(&T) -> bool) -> usize {
        self.inner
            .borrow()
            .items
            .iter()
            .filter(|item| predicate(item))
            .count()
    }

    /// Access the items by reference.
    pub fn with_items<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.inner.borrow().items)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
