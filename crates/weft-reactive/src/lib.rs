#![forbid(unsafe_code)]

//! Reactive data bindings for Weft.
//!
//! This crate provides the change-tracking primitives the rest of the
//! toolkit builds on:
//!
//! - [`Observable`]: a shared value cell with change notification,
//!   replay-on-subscribe, and listener self-removal.
//! - [`ObservableList`]: an ordered sequence with add/delete notification
//!   keyed on item identity.
//! - [`WarnSink`]: injected capability for listener-leak diagnostics.
//!
//! # Architecture
//!
//! Everything is single-threaded shared ownership (`Rc<RefCell<..>>`).
//! Dispatch tolerates reentrancy structurally: listener sequences are
//! snapshotted before iteration, no interior borrow is held across a
//! listener call, and stale notification rounds are cut short when a
//! listener has already moved the value on.
//!
//! # Invariants
//!
//! 1. Setting a value equal to the current value is a no-op (no version
//!    bump, no notifications).
//! 2. Listeners are visited in registration order.
//! 3. `Observable::on_change` replays the current state exactly once,
//!    synchronously, before returning.
//! 4. All listeners of an observable converge on its final value even
//!    when listeners set values reentrantly.

pub mod observable;
pub mod observable_list;
pub mod sink;

pub use observable::{LISTENER_WARN_THRESHOLD, Observable, SelfRemove, WeakObservable};
pub use observable_list::{ListenerId, ObservableList};
pub use sink::{MemoryWarnSink, TracingWarnSink, WarnSink};
