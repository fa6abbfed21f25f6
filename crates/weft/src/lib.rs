#![forbid(unsafe_code)]

//! Weft reactive core facade.
//!
//! Re-exports the public API of the two core crates so applications can
//! depend on a single crate:
//!
//! - [`weft_reactive`]: [`Observable`], [`ObservableList`], listener
//!   self-removal, leak-warning sink.
//! - [`weft_model`]: [`Value`], [`Attribute`], [`ModelWorld`],
//!   [`Qualifier`], presentation model building.
//!
//! # Example
//!
//! ```
//! use weft::{Attribute, ModelWorld, ObsName, Qualifier, Value};
//!
//! let world = ModelWorld::new();
//! let qualifier = Qualifier::from("Person.1.firstname");
//!
//! let form_field = Attribute::new(&world, Value::from("Dierk"), Some(qualifier.clone()));
//! let header = Attribute::qualified(&world, qualifier);
//!
//! // Independently created, yet consistent through the shared qualifier.
//! form_field.set_converted_value(Value::from("Dieter"));
//! assert_eq!(header.obs(ObsName::Value).get(), Value::from("Dieter"));
//! ```

pub use weft_model::{
    Attribute, ModelWorld, ObsName, Qualifier, Value, presentation_model_from_attribute_names,
};
pub use weft_reactive::{
    LISTENER_WARN_THRESHOLD, ListenerId, MemoryWarnSink, Observable, ObservableList, SelfRemove,
    TracingWarnSink, WarnSink, WeakObservable,
};
