#![forbid(unsafe_code)]

//! Attribute and model-world layer of Weft.
//!
//! # Role in Weft
//! This crate turns the reactive primitives of `weft-reactive` into a
//! presentation model: [`Attribute`]s bundle the observables of one
//! semantic field, and a [`ModelWorld`] keeps attributes that share a
//! [`Qualifier`] automatically consistent across widgets, pages, and
//! anything else that happens to model the same underlying datum.
//!
//! # Primary responsibilities
//! - **Value**: dynamic attribute payload with load-bearing equality.
//! - **Attribute**: lazily created named observables, converter,
//!   validator, mutable qualifier.
//! - **ModelWorld**: explicit synchronization registry; group membership
//!   bookkeeping, value propagation, termination under cycles.
//!
//! # How it fits in the system
//! View projectors bind controls to attribute observables through
//! `get`/`set`/`on_change`; the navigation layer models page state with
//! attributes. Neither is part of this crate: the core is consumed
//! synchronously, in process, and performs no I/O.

pub mod attribute;
pub mod model_world;
pub mod value;

pub use attribute::{Attribute, ObsName, presentation_model_from_attribute_names};
pub use model_world::{ModelWorld, Qualifier};
pub use value::Value;
