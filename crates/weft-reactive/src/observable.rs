#![forbid(unsafe_code)]

//! Observable value cell with change notification and version tracking.
//!
//! # Design
//!
//! [`Observable<T>`] wraps a value of type `T` in shared, reference-counted
//! storage (`Rc<RefCell<..>>`). When the value changes (determined by
//! `PartialEq`), listeners are notified in registration order with the new
//! and old value. Registration replays the current state to the new
//! listener before returning, so wiring code never needs a manual getter
//! call to pick up the initial state.
//!
//! Listeners are stored strongly and live as long as the cell does. There
//! is no external deregistration; a listener that wants out calls the
//! [`SelfRemove`] capability passed into each invocation.
//!
//! # Reentrancy
//!
//! A listener may call [`set`](Observable::set) on this or any other
//! observable from inside its own invocation. Dispatch never holds the
//! interior borrow across a listener call, takes a shallow copy of the
//! listener sequence before iterating (listeners registered during a round
//! are not visited in that round), and re-checks before every invocation
//! that the current value still equals the value that started the round.
//! When a reentrant `set` has already moved the value on, the remaining
//! listeners of the stale round are skipped: every listener converges on
//! the final value, while a listener registered earlier may observe more
//! intermediate states than one registered later (missed-intermediate
//! delivery, chosen over out-of-order or duplicate delivery).
//!
//! # Performance
//!
//! | Operation     | Complexity                 |
//! |---------------|----------------------------|
//! | `get()`       | O(1) + one clone of `T`    |
//! | `set()`       | O(L) where L = listeners   |
//! | `on_change()` | O(1) amortized + replay    |
//!
//! # Failure Modes
//!
//! - **Listener leak**: listeners are never removed automatically. When a
//!   sequence grows past [`LISTENER_WARN_THRESHOLD`] entries, one warning
//!   is emitted through the injected [`WarnSink`]; nothing else changes.
//! - **Panicking listener**: listener callbacks are trusted. A panic
//!   propagates out of the triggering `set` call with the new value
//!   already stored.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::sink::{TracingWarnSink, WarnSink};

/// Listener sequence length past which a leak warning is emitted.
///
/// A heuristic, not a hard limit: registration always succeeds.
pub const LISTENER_WARN_THRESHOLD: usize = 100;

type ChangeFn<T> = dyn Fn(&T, &T, &SelfRemove);

/// Capability handed to a listener that deregisters exactly that listener.
///
/// Removal takes effect immediately: the listener is skipped for the rest
/// of the current round and dropped from the sequence afterwards. The
/// capability passed during registration replay is inert.
pub struct SelfRemove {
    removed: Rc<Cell<bool>>,
}

impl SelfRemove {
    /// Deregister the listener this capability was handed to.
    pub fn remove(&self) {
        self.removed.set(true);
    }

    /// A capability whose `remove` has no effect, used for replay.
    fn inert() -> Self {
        Self {
            removed: Rc::new(Cell::new(false)),
        }
    }

    /// Capability bound to a listener's removal flag.
    pub(crate) fn for_flag(flag: &Rc<Cell<bool>>) -> Self {
        Self {
            removed: Rc::clone(flag),
        }
    }
}

struct ListenerEntry<T> {
    callback: Rc<ChangeFn<T>>,
    removed: Rc<Cell<bool>>,
}

impl<T> Clone for ListenerEntry<T> {
    fn clone(&self) -> Self {
        Self {
            callback: Rc::clone(&self.callback),
            removed: Rc::clone(&self.removed),
        }
    }
}

struct ObservableInner<T> {
    value: T,
    version: u64,
    listeners: Vec<ListenerEntry<T>>,
    warn_sink: Rc<dyn WarnSink>,
}

/// A shared, version-tracked value with change notification.
///
/// Cloning an `Observable` creates a new handle to the **same** inner
/// cell: both handles see the same value and share listeners. Identity of
/// the cell (not equality of the value) is tested with
/// [`ptr_eq`](Observable::ptr_eq).
///
/// # Invariants
///
/// 1. `set(v)` where `v == current` is a no-op: zero listener
///    invocations, no version bump.
/// 2. `version` increments by exactly 1 on each value-changing mutation.
/// 3. Listeners are visited in registration order.
/// 4. `on_change` invokes the new listener exactly once with
///    `(current, current)` before returning.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

// Manual Clone: shares the same cell.
impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("listener_count", &inner.listeners.len())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create a new observable with the given initial value.
    ///
    /// Warnings go to the default `tracing` sink.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self::with_warn_sink(value, Rc::new(TracingWarnSink))
    }

    /// Create a new observable with an injected warning sink.
    #[must_use]
    pub fn with_warn_sink(value: T, warn_sink: Rc<dyn WarnSink>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                listeners: Vec::new(),
                warn_sink,
            })),
        }
    }

    /// Get a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Access the current value by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Set a new value and notify listeners.
    ///
    /// When `value` equals the current value this is a no-op. The
    /// equality short-circuit is what terminates mutual update chains
    /// between observables that push into each other from listeners.
    pub fn set(&self, value: T) {
        let old = {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return;
            }
            inner.version += 1;
            std::mem::replace(&mut inner.value, value)
        };
        let round = self.get();
        self.notify(&round, &old);
    }

    /// Modify the value in place via a closure.
    ///
    /// The value is compared against a snapshot afterwards; listeners are
    /// notified only when it actually changed.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let old = {
            let mut inner = self.inner.borrow_mut();
            let old = inner.value.clone();
            f(&mut inner.value);
            if inner.value == old {
                return;
            }
            inner.version += 1;
            old
        };
        let round = self.get();
        self.notify(&round, &old);
    }

    /// Register a change listener.
    ///
    /// The callback receives `(new, old, self_remove)`. It is invoked
    /// exactly once with `(current, current)` before `on_change` returns;
    /// self-removal during that replay is ignored.
    pub fn on_change(&self, callback: impl Fn(&T, &T, &SelfRemove) + 'static) {
        let entry = ListenerEntry {
            callback: Rc::new(callback),
            removed: Rc::new(Cell::new(false)),
        };
        let (count, sink) = {
            let mut inner = self.inner.borrow_mut();
            inner.listeners.push(entry.clone());
            (inner.listeners.len(), Rc::clone(&inner.warn_sink))
        };
        if count == LISTENER_WARN_THRESHOLD + 1 {
            sink.warn(&format!(
                "observable has {count} listeners; this many usually indicates a listener leak"
            ));
        }
        let current = self.get();
        (*entry.callback)(&current, &current, &SelfRemove::inert());
    }

    /// Current version number, incremented once per value-changing
    /// mutation. Useful for dirty-checking in render loops.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Number of currently registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// True when both handles point at the same inner cell.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Create a non-owning handle to this cell.
    #[must_use]
    pub fn downgrade(&self) -> WeakObservable<T> {
        WeakObservable {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Notify listeners of a change from `old` to `round`.
    ///
    /// Iterates a shallow copy of the listener sequence. Before each
    /// invocation the current value is re-checked against `round`; a
    /// mismatch means a listener earlier in this round already set a newer
    /// value (and fully notified it), so the rest of the stale round is
    /// skipped.
    fn notify(&self, round: &T, old: &T) {
        let snapshot: Vec<ListenerEntry<T>> = self.inner.borrow().listeners.clone();
        for entry in &snapshot {
            if entry.removed.get() {
                continue;
            }
            if self.inner.borrow().value != *round {
                break;
            }
            let self_remove = SelfRemove::for_flag(&entry.removed);
            (*entry.callback)(round, old, &self_remove);
        }
        self.inner
            .borrow_mut()
            .listeners
            .retain(|entry| !entry.removed.get());
    }
}

/// Non-owning handle to an [`Observable`].
///
/// Lets long-lived closures refer back to a cell without keeping it alive.
pub struct WeakObservable<T> {
    inner: Weak<RefCell<ObservableInner<T>>>,
}

impl<T> Clone for WeakObservable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T> WeakObservable<T> {
    /// Upgrade to a strong handle if the cell is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Observable<T>> {
        self.inner.upgrade().map(|inner| Observable { inner })
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for WeakObservable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakObservable").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
