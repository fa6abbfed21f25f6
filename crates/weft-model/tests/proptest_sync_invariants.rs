//! Property-based invariant tests for the synchronization engine.
//!
//! These verify invariants that must hold for any sequence of attribute
//! operations:
//!
//! 1. After every operation, all VALUE observables of attributes sharing
//!    a qualifier are equal (consistency within the returning call, not
//!    eventually).
//! 2. A `(qualifier, VALUE)` group exists exactly while at least one
//!    attribute holds that qualifier: never empty, never dangling.
//! 3. Group member counts match the number of attributes holding the
//!    qualifier (membership at most once per cell).
//! 4. Every operation terminates (mutual propagation is cut off by the
//!    equality short-circuit; the suite would hang otherwise).

use proptest::prelude::*;
use weft_model::{Attribute, ModelWorld, ObsName, Qualifier, Value};

const QUALIFIER_POOL: [&str; 3] = ["alpha", "beta", "gamma"];
const ATTRIBUTE_COUNT: usize = 4;

#[derive(Debug, Clone)]
enum Op {
    SetValue { attr: usize, value: i64 },
    SetQualifier { attr: usize, qualifier: Option<usize> },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..ATTRIBUTE_COUNT, 0i64..8).prop_map(|(attr, value)| Op::SetValue { attr, value }),
        (
            0..ATTRIBUTE_COUNT,
            proptest::option::of(0..QUALIFIER_POOL.len())
        )
            .prop_map(|(attr, qualifier)| Op::SetQualifier { attr, qualifier }),
    ]
}

fn check_invariants(
    world: &ModelWorld,
    attributes: &[Attribute],
    held: &[Option<usize>],
) -> Result<(), TestCaseError> {
    for (pool_index, id) in QUALIFIER_POOL.iter().enumerate() {
        let qualifier = Qualifier::from(*id);
        let holders: Vec<&Attribute> = attributes
            .iter()
            .zip(held)
            .filter(|(_, h)| **h == Some(pool_index))
            .map(|(attribute, _)| attribute)
            .collect();

        if holders.is_empty() {
            prop_assert!(
                !world.has_group(&qualifier, &ObsName::Value),
                "dangling group for vacated qualifier {id}"
            );
            continue;
        }

        prop_assert_eq!(
            world.group_len(&qualifier, &ObsName::Value),
            Some(holders.len()),
            "member count diverged for {}",
            id
        );

        let reference = holders[0].obs(ObsName::Value).get();
        for holder in &holders[1..] {
            prop_assert_eq!(
                holder.obs(ObsName::Value).get(),
                reference.clone(),
                "group {} members disagree",
                id
            );
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn groups_stay_consistent_under_arbitrary_ops(
        ops in proptest::collection::vec(op_strategy(), 1..48)
    ) {
        let world = ModelWorld::new();
        let attributes: Vec<Attribute> = (0..ATTRIBUTE_COUNT)
            .map(|i| Attribute::new(&world, Value::Int(i as i64), None))
            .collect();
        let mut held: Vec<Option<usize>> = vec![None; ATTRIBUTE_COUNT];

        for op in ops {
            match op {
                Op::SetValue { attr, value } => {
                    attributes[attr].set_converted_value(Value::Int(value));
                }
                Op::SetQualifier { attr, qualifier } => {
                    let qualifier_value =
                        qualifier.map(|index| Qualifier::from(QUALIFIER_POOL[index]));
                    attributes[attr].set_qualifier(qualifier_value);
                    held[attr] = qualifier;
                }
            }
            check_invariants(&world, &attributes, &held)?;
        }
    }

    #[test]
    fn vacated_qualifiers_leave_no_registry_state(
        rounds in 1usize..6
    ) {
        let world = ModelWorld::new();
        let qualifier = Qualifier::from("recycled");

        for round in 0..rounds {
            let a = Attribute::new(
                &world,
                Value::Int(round as i64),
                Some(qualifier.clone()),
            );
            let b = Attribute::new(&world, Value::Null, Some(qualifier.clone()));
            prop_assert_eq!(
                b.obs(ObsName::Value).get(),
                Value::Int(round as i64)
            );

            a.set_qualifier(None);
            b.set_qualifier(None);
            prop_assert!(!world.has_group(&qualifier, &ObsName::Value));
            prop_assert_eq!(world.group_count(), 0);
        }
    }
}
