#![forbid(unsafe_code)]

//! Qualifier-keyed synchronization registry.
//!
//! # Design
//!
//! A [`ModelWorld`] maps `(qualifier, observable name)` to the group of
//! [`Observable`] cells that must stay value-equal. Attributes report every
//! change of their named observables here; the registry pushes the new
//! value into every other member of the group. Nothing is global: a world
//! is an explicit, cheap-to-clone handle, constructed once per process or
//! once per test.
//!
//! # Invariants
//!
//! 1. Immediately after any group member's `set` call returns, every
//!    member of that group holds an equal value.
//! 2. A cell appears in a group at most once (membership by cell
//!    identity).
//! 3. A group entry is deleted the instant its member list becomes empty;
//!    the registry never holds dangling empty groups.
//! 4. Propagation terminates, including around cycles: pushing a value a
//!    member already holds is a no-op, so a chain stops the moment all
//!    members agree.
//!
//! # Reentrancy
//!
//! Pushing into a member triggers that member's forwarding listener, which
//! re-enters this registry before the outer call returns. The interior
//! borrow is therefore never held across a `set` call; member lists are
//! snapshotted first and re-checked when membership is amended afterwards.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use weft_reactive::Observable;

use crate::attribute::ObsName;
use crate::value::Value;

/// Caller-supplied identifier used purely as a synchronization join key.
///
/// Carries no storage semantics itself; equal qualifiers mean "keep these
/// attributes consistent".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Qualifier(String);

impl Qualifier {
    /// Wrap an identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as given by the caller.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Qualifier {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for Qualifier {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for Qualifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Typed registry key; replaces string concatenation in the lookup path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GroupKey {
    qualifier: Qualifier,
    name: ObsName,
}

impl GroupKey {
    fn new(qualifier: &Qualifier, name: &ObsName) -> Self {
        Self {
            qualifier: qualifier.clone(),
            name: name.clone(),
        }
    }
}

type Groups = HashMap<GroupKey, Vec<Observable<Value>>>;

/// Registry keeping qualified observables synchronized across attributes.
///
/// Cloning the handle shares the registry. See the module docs for the
/// invariants it maintains.
#[derive(Clone, Default)]
pub struct ModelWorld {
    groups: Rc<RefCell<Groups>>,
}

impl std::fmt::Debug for ModelWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelWorld")
            .field("group_count", &self.groups.borrow().len())
            .finish()
    }
}

impl ModelWorld {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a change of an attribute's named observable.
    ///
    /// `qualifier` is the attribute's qualifier as resolved at
    /// notification time. Unqualified observables never synchronize. The
    /// first qualified report of a `(qualifier, name)` creates its group;
    /// later reports push the reporter's value into every other member
    /// and append the reporter if it is not yet listed (a lazily created
    /// observable joining an established qualifier).
    pub fn update(&self, qualifier: Option<&Qualifier>, name: &ObsName, observable: &Observable<Value>) {
        let Some(qualifier) = qualifier else {
            return;
        };
        let key = GroupKey::new(qualifier, name);
        let members: Vec<Observable<Value>> = {
            let mut groups = self.groups.borrow_mut();
            match groups.entry(key.clone()) {
                std::collections::hash_map::Entry::Vacant(entry) => {
                    tracing::trace!(target: "weft::model", %qualifier, ?name, "group created");
                    entry.insert(vec![observable.clone()]);
                    return; // first member, nothing to propagate to
                }
                std::collections::hash_map::Entry::Occupied(entry) => entry.get().clone(),
            }
        };
        let mut listed = false;
        for member in &members {
            if member.ptr_eq(observable) {
                listed = true;
            } else {
                // Re-read per member: a reentrant report may have moved the
                // value on while this loop was running.
                member.set(observable.get());
            }
        }
        if !listed {
            let mut groups = self.groups.borrow_mut();
            let members = groups.entry(key).or_default();
            if !members.iter().any(|member| member.ptr_eq(observable)) {
                members.push(observable.clone());
            }
        }
    }

    /// Move an attribute's observables between groups after a qualifier
    /// change.
    ///
    /// Every named observable leaves its old group (the group entry is
    /// dropped when it empties) and joins the new one. A joiner adopts the
    /// current value of an established group before being appended: the
    /// group's value wins over the newcomer's. When the group is brand
    /// new, the newcomer's value stands by virtue of sole membership.
    pub fn update_qualifier(
        &self,
        old: Option<&Qualifier>,
        new: Option<&Qualifier>,
        observables: &HashMap<ObsName, Observable<Value>>,
    ) {
        for (name, observable) in observables {
            if let Some(old_qualifier) = old {
                let key = GroupKey::new(old_qualifier, name);
                let mut groups = self.groups.borrow_mut();
                if let Some(members) = groups.get_mut(&key) {
                    members.retain(|member| !member.ptr_eq(observable));
                    if members.is_empty() {
                        tracing::trace!(target: "weft::model", qualifier = %old_qualifier, ?name, "group dropped");
                        groups.remove(&key);
                    }
                }
            }
            if let Some(new_qualifier) = new {
                let key = GroupKey::new(new_qualifier, name);
                let adopted: Option<Value> = {
                    let mut groups = self.groups.borrow_mut();
                    groups
                        .entry(key.clone())
                        .or_default()
                        .first()
                        .map(Observable::get)
                };
                if let Some(value) = adopted {
                    // May re-enter `update`, which also appends the joiner.
                    observable.set(value);
                }
                let mut groups = self.groups.borrow_mut();
                let members = groups.entry(key).or_default();
                if !members.iter().any(|member| member.ptr_eq(observable)) {
                    members.push(observable.clone());
                }
            }
        }
    }

    /// Current value of an established qualifier, read from the first
    /// member of its VALUE group.
    ///
    /// Lets a newly constructed attribute start pre-synchronized instead
    /// of registering first and overwriting the group.
    #[must_use]
    pub fn read_qualifier_value(&self, qualifier: &Qualifier) -> Option<Value> {
        let key = GroupKey::new(qualifier, &ObsName::Value);
        self.groups
            .borrow()
            .get(&key)
            .and_then(|members| members.first())
            .map(Observable::get)
    }

    /// Number of live groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.borrow().len()
    }

    /// True when a group exists for `(qualifier, name)`.
    #[must_use]
    pub fn has_group(&self, qualifier: &Qualifier, name: &ObsName) -> bool {
        self.groups.borrow().contains_key(&GroupKey::new(qualifier, name))
    }

    /// Member count of the group for `(qualifier, name)`, if it exists.
    #[must_use]
    pub fn group_len(&self, qualifier: &Qualifier, name: &ObsName) -> Option<usize> {
        self.groups
            .borrow()
            .get(&GroupKey::new(qualifier, name))
            .map(Vec::len)
    }

    /// Non-owning handle for forwarding listeners.
    pub(crate) fn downgrade(&self) -> WeakModelWorld {
        WeakModelWorld {
            groups: Rc::downgrade(&self.groups),
        }
    }
}

/// Non-owning registry handle held by forwarding listeners, so that the
/// attribute/world graph does not keep itself alive through `Rc` cycles.
pub(crate) struct WeakModelWorld {
    groups: Weak<RefCell<Groups>>,
}

impl Clone for WeakModelWorld {
    fn clone(&self) -> Self {
        Self {
            groups: Weak::clone(&self.groups),
        }
    }
}

impl WeakModelWorld {
    pub(crate) fn upgrade(&self) -> Option<ModelWorld> {
        self.groups.upgrade().map(|groups| ModelWorld { groups })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
