#![forbid(unsafe_code)]

//! Attributes: named bundles of lazily created observables.
//!
//! An [`Attribute`] models one semantic field of a presentation model. Its
//! observables (value, validity, label, ...) are created on first request
//! and registered with the attribute's [`ModelWorld`], so that attributes
//! sharing a [`Qualifier`] stay consistent without referencing each other.
//!
//! Each created observable carries one forwarding listener that reports
//! changes to the world, tagged with the attribute's qualifier *as read at
//! notification time*, so changing the qualifier later redirects all
//! subsequent reports without rewiring.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use weft_reactive::Observable;

use crate::model_world::{ModelWorld, Qualifier};
use crate::value::Value;

/// Name of an observable within an attribute.
///
/// The well-known names cover the standard presentation concerns;
/// [`ObsName::Custom`] leaves the map open for callers. A name that was
/// never requested is distinct from one requested and holding a default.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObsName {
    /// The attribute's payload.
    Value,
    /// Result of the installed validator.
    Valid,
    /// Whether a projected control accepts input.
    Editable,
    /// Human-facing label.
    Label,
    /// Technical field name.
    Name,
    /// Projection hint (e.g. an input type).
    Type,
    /// Caller-defined name.
    Custom(String),
}

impl ObsName {
    /// Caller-defined observable name.
    #[must_use]
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }
}

impl std::fmt::Display for ObsName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value => f.write_str("value"),
            Self::Valid => f.write_str("valid"),
            Self::Editable => f.write_str("editable"),
            Self::Label => f.write_str("label"),
            Self::Name => f.write_str("name"),
            Self::Type => f.write_str("type"),
            Self::Custom(name) => f.write_str(name),
        }
    }
}

type Converter = Rc<dyn Fn(Value) -> Value>;
type Validator = Rc<dyn Fn(&Value) -> bool>;

/// One semantic field: qualifier, lazily created observables, converter,
/// validator.
///
/// Cloning an `Attribute` creates a second handle to the same field.
/// Attributes sharing a qualifier stay synchronized through their world
/// but hold no reference to one another.
pub struct Attribute {
    world: ModelWorld,
    qualifier: Rc<RefCell<Option<Qualifier>>>,
    observables: Rc<RefCell<HashMap<ObsName, Observable<Value>>>>,
    converter: Rc<RefCell<Converter>>,
    validator: Rc<RefCell<Option<Validator>>>,
    validator_attached: Rc<Cell<bool>>,
}

impl Clone for Attribute {
    fn clone(&self) -> Self {
        Self {
            world: self.world.clone(),
            qualifier: Rc::clone(&self.qualifier),
            observables: Rc::clone(&self.observables),
            converter: Rc::clone(&self.converter),
            validator: Rc::clone(&self.validator),
            validator_attached: Rc::clone(&self.validator_attached),
        }
    }
}

impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attribute")
            .field("qualifier", &self.qualifier.borrow())
            .field("observables", &self.observables.borrow().len())
            .finish()
    }
}

impl Attribute {
    /// Create an attribute with an initial value and optional qualifier.
    ///
    /// When the qualifier already has an established VALUE group, the new
    /// attribute adopts that group's current value instead of `value`:
    /// known values are preserved, never overwritten by a newcomer.
    #[must_use]
    pub fn new(world: &ModelWorld, value: Value, qualifier: Option<Qualifier>) -> Self {
        let initial = match &qualifier {
            Some(qualifier) => world.read_qualifier_value(qualifier).unwrap_or(value),
            None => value,
        };
        let attribute = Self {
            world: world.clone(),
            qualifier: Rc::new(RefCell::new(qualifier)),
            observables: Rc::new(RefCell::new(HashMap::new())),
            converter: Rc::new(RefCell::new(Rc::new(|value| value) as Converter)),
            validator: Rc::new(RefCell::new(None)),
            validator_attached: Rc::new(Cell::new(false)),
        };
        attribute.obs_with(ObsName::Value, initial);
        attribute
    }

    /// Create an attribute pre-synchronized with an existing qualifier.
    #[must_use]
    pub fn qualified(world: &ModelWorld, qualifier: Qualifier) -> Self {
        Self::new(world, Value::Null, Some(qualifier))
    }

    /// The named observable, created with a `Null` default on first
    /// request.
    #[must_use]
    pub fn obs(&self, name: ObsName) -> Observable<Value> {
        self.obs_with(name, Value::Null)
    }

    /// The named observable, created with `init` on first request.
    ///
    /// `init` is ignored when the observable already exists.
    #[must_use]
    pub fn obs_with(&self, name: ObsName, init: Value) -> Observable<Value> {
        if let Some(existing) = self.observables.borrow().get(&name) {
            return existing.clone();
        }
        self.make_observable(name, init)
    }

    /// True only if the named observable was previously requested.
    #[must_use]
    pub fn has_obs(&self, name: &ObsName) -> bool {
        self.observables.borrow().contains_key(name)
    }

    /// Pass `raw` through the installed converter and write the result
    /// into the VALUE observable.
    pub fn set_converted_value(&self, raw: Value) {
        let convert = Rc::clone(&self.converter.borrow());
        self.obs(ObsName::Value).set((*convert)(raw));
    }

    /// Install a converter and immediately re-apply it to the current
    /// value, normalizing existing state retroactively.
    pub fn set_converter(&self, converter: impl Fn(Value) -> Value + 'static) {
        *self.converter.borrow_mut() = Rc::new(converter);
        let current = self.obs(ObsName::Value).get();
        self.set_converted_value(current);
    }

    /// Install a validator.
    ///
    /// The first installation attaches one listener on VALUE that
    /// recomputes VALID on every change (including the attachment
    /// replay). Replacing the validator swaps the function without
    /// attaching a second listener.
    pub fn set_validator(&self, validator: impl Fn(&Value) -> bool + 'static) {
        *self.validator.borrow_mut() = Some(Rc::new(validator));
        if self.validator_attached.get() {
            return;
        }
        self.validator_attached.set(true);
        let valid = self.obs(ObsName::Valid);
        let validator_slot = Rc::clone(&self.validator);
        self.obs(ObsName::Value).on_change(move |new_value, _, _| {
            let verdict = validator_slot.borrow().clone();
            let is_valid = verdict.is_none_or(|validate| (*validate)(new_value));
            valid.set(Value::Bool(is_valid));
        });
    }

    /// The current qualifier.
    #[must_use]
    pub fn qualifier(&self) -> Option<Qualifier> {
        self.qualifier.borrow().clone()
    }

    /// Change the qualifier and move all created observables between
    /// their synchronization groups.
    pub fn set_qualifier(&self, qualifier: Option<Qualifier>) {
        let old = self.qualifier.replace(qualifier.clone());
        let observables = self.observables.borrow().clone();
        self.world
            .update_qualifier(old.as_ref(), qualifier.as_ref(), &observables);
    }

    fn make_observable(&self, name: ObsName, init: Value) -> Observable<Value> {
        let observable = Observable::new(init);
        self.observables
            .borrow_mut()
            .insert(name.clone(), observable.clone());

        // Forward every change to the world, resolving the qualifier at
        // notification time. Weak handles keep the cell and registry from
        // holding each other alive. The registration replay below doubles
        // as the cell's first report.
        let world = self.world.downgrade();
        let qualifier = Rc::clone(&self.qualifier);
        let cell = observable.downgrade();
        observable.on_change(move |_, _, _| {
            let Some(world) = world.upgrade() else {
                return;
            };
            let Some(observable) = cell.upgrade() else {
                return;
            };
            let qualifier = qualifier.borrow().clone();
            world.update(qualifier.as_ref(), &name, &observable);
        });
        observable
    }
}

/// Build a presentation model: one unqualified attribute per name, each
/// pre-seeded with a LABEL observable holding its own name.
#[must_use]
pub fn presentation_model_from_attribute_names(
    world: &ModelWorld,
    names: &[&str],
) -> HashMap<String, Attribute> {
    let mut model = HashMap::with_capacity(names.len());
    for name in names {
        let attribute = Attribute::new(world, Value::Null, None);
        attribute.obs(ObsName::Label).set(Value::from(*name));
        model.insert((*name).to_string(), attribute);
    }
    model
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_observable_created_eagerly() {
        let world = ModelWorld::new();
        let attribute = Attribute::new(&world, Value::from("init"), None);

        assert!(attribute.has_obs(&ObsName::Value));
        assert_eq!(attribute.obs(ObsName::Value).get(), Value::from("init"));
    }

    #[test]
    fn untouched_vs_defaulted_observables() {
        let world = ModelWorld::new();
        let attribute = Attribute::new(&world, Value::Null, None);

        assert!(!attribute.has_obs(&ObsName::Valid));
        let valid = attribute.obs(ObsName::Valid);
        assert!(attribute.has_obs(&ObsName::Valid));
        assert_eq!(valid.get(), Value::Null);
    }

    #[test]
    fn obs_with_ignores_init_for_existing() {
        let world = ModelWorld::new();
        let attribute = Attribute::new(&world, Value::from("kept"), None);

        let value = attribute.obs_with(ObsName::Value, Value::from("ignored"));
        assert_eq!(value.get(), Value::from("kept"));
    }

    #[test]
    fn converted_value_passes_through_converter() {
        let world = ModelWorld::new();
        let attribute = Attribute::new(&world, Value::from("a"), None);

        attribute.set_converter(|value| match value {
            Value::Text(s) => Value::Text(s.to_uppercase()),
            other => other,
        });

        attribute.set_converted_value(Value::from("hello"));
        assert_eq!(attribute.obs(ObsName::Value).get(), Value::from("HELLO"));
    }

    #[test]
    fn converter_applies_retroactively() {
        let world = ModelWorld::new();
        let attribute = Attribute::new(&world, Value::from("low"), None);

        attribute.set_converter(|value| match value {
            Value::Text(s) => Value::Text(s.to_uppercase()),
            other => other,
        });

        // Installing normalized the value that was already there.
        assert_eq!(attribute.obs(ObsName::Value).get(), Value::from("LOW"));
    }

    #[test]
    fn validator_recomputes_on_install_and_change() {
        let world = ModelWorld::new();
        let attribute = Attribute::new(&world, Value::from("ok"), None);

        attribute.set_validator(|value| value.as_text().is_some_and(|s| s.len() <= 3));
        assert_eq!(attribute.obs(ObsName::Valid).get(), Value::Bool(true));

        attribute.set_converted_value(Value::from("too long"));
        assert_eq!(attribute.obs(ObsName::Valid).get(), Value::Bool(false));
    }

    #[test]
    fn replacing_validator_keeps_single_listener() {
        let world = ModelWorld::new();
        let attribute = Attribute::new(&world, Value::from("aa"), None);
        let value = attribute.obs(ObsName::Value);
        let listeners_after_first = {
            attribute.set_validator(|_| true);
            value.listener_count()
        };

        attribute.set_validator(|value| value.as_text().is_some_and(|s| s.starts_with('b')));
        assert_eq!(value.listener_count(), listeners_after_first);

        // The replacement is authoritative from the next change on.
        attribute.set_converted_value(Value::from("bb"));
        assert_eq!(attribute.obs(ObsName::Valid).get(), Value::Bool(true));
        attribute.set_converted_value(Value::from("ab"));
        assert_eq!(attribute.obs(ObsName::Valid).get(), Value::Bool(false));
    }

    #[test]
    fn qualifier_roundtrip() {
        let world = ModelWorld::new();
        let attribute = Attribute::new(&world, Value::Null, Some(Qualifier::from("q")));
        assert_eq!(attribute.qualifier(), Some(Qualifier::from("q")));

        attribute.set_qualifier(None);
        assert_eq!(attribute.qualifier(), None);
    }

    #[test]
    fn unqualified_attribute_registers_nothing() {
        let world = ModelWorld::new();
        let attribute = Attribute::new(&world, Value::from("x"), None);
        attribute.set_converted_value(Value::from("y"));

        assert_eq!(world.group_count(), 0);
    }

    #[test]
    fn qualified_attribute_registers_on_creation() {
        let world = ModelWorld::new();
        let qualifier = Qualifier::from("q");
        let _attribute = Attribute::new(&world, Value::from("x"), Some(qualifier.clone()));

        assert!(world.has_group(&qualifier, &ObsName::Value));
        assert_eq!(world.group_len(&qualifier, &ObsName::Value), Some(1));
    }

    #[test]
    fn clone_shares_the_field() {
        let world = ModelWorld::new();
        let attribute = Attribute::new(&world, Value::from("x"), None);
        let handle = attribute.clone();

        handle.set_converted_value(Value::from("y"));
        assert_eq!(attribute.obs(ObsName::Value).get(), Value::from("y"));
    }

    #[test]
    fn presentation_model_labels_attributes() {
        let world = ModelWorld::new();
        let model = presentation_model_from_attribute_names(&world, &["firstname", "lastname"]);

        assert_eq!(model.len(), 2);
        let firstname = &model["firstname"];
        assert_eq!(firstname.obs(ObsName::Label).get(), Value::from("firstname"));
        assert_eq!(firstname.obs(ObsName::Value).get(), Value::Null);
        assert_eq!(model["lastname"].obs(ObsName::Label).get(), Value::from("lastname"));
    }

    #[test]
    fn obs_name_display() {
        assert_eq!(ObsName::Value.to_string(), "value");
        assert_eq!(ObsName::custom("tooltip").to_string(), "tooltip");
    }
}
