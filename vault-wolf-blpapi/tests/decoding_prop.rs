use proptest::prelude::*;

use vault_wolf_blpapi::{
    flatten, DecodedMessage, FieldMap, ResponseAccumulator, SecurityResult, Value,
};

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int64),
        "[a-z]{0,6}".prop_map(Value::String),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    arb_scalar().prop_recursive(4, 32, 4, |inner| {
        prop::collection::vec(("[a-e]{1,2}", inner), 0..4)
            .prop_map(|pairs| Value::Map(pairs.into_iter().collect()))
    })
}

fn arb_fields() -> impl Strategy<Value = FieldMap> {
    prop::collection::vec(("[a-f]", arb_scalar()), 0..5).prop_map(|pairs| pairs.into_iter().collect())
}

fn arb_result() -> impl Strategy<Value = SecurityResult> {
    (arb_fields(), arb_fields(), arb_fields()).prop_map(|(data, errors, exceptions)| SecurityResult {
        security_data: data,
        security_errors: errors,
        field_exceptions: exceptions,
    })
}

fn merged(mut base: SecurityResult, newer: SecurityResult) -> SecurityResult {
    base.merge(newer);
    base
}

fn order(map: &FieldMap) -> Vec<String> {
    map.keys().cloned().collect()
}

proptest! {
    #[test]
    fn flatten_leaves_scalars_alone(v in arb_scalar()) {
        prop_assert_eq!(flatten(v.clone()), v);
    }

    #[test]
    fn flatten_leaves_multi_key_maps_alone(v in arb_value()) {
        prop_assume!(matches!(&v, Value::Map(m) if m.len() > 1));
        prop_assert_eq!(flatten(v.clone()), v);
    }

    // Not idempotent in general: {a:{b:1}} flattens to {b:1}, which flattens to 1.
    #[test]
    fn flatten_is_stable_once_unwrapped(v in arb_value()) {
        let once = flatten(v);
        prop_assume!(!matches!(&once, Value::Map(m) if m.len() == 1));
        prop_assert_eq!(flatten(once.clone()), once);
    }

    #[test]
    fn merge_is_associative(a in arb_result(), b in arb_result(), c in arb_result()) {
        let left = merged(merged(a.clone(), b.clone()), c.clone());
        let right = merged(a, merged(b, c));
        prop_assert_eq!(order(&left.security_data), order(&right.security_data));
        prop_assert_eq!(order(&left.security_errors), order(&right.security_errors));
        prop_assert_eq!(left, right);
    }

    #[test]
    fn accumulated_securities_never_disappear(
        fragments in prop::collection::vec(("[A-D]", "[xy]", arb_result()), 1..12)
    ) {
        let mut acc = ResponseAccumulator::new();
        let mut seen: Vec<String> = Vec::new();
        for (security, message_type, result) in fragments {
            acc.accept(&message_type, DecodedMessage::keyed(security.clone(), result));
            if !seen.contains(&security) {
                seen.push(security);
            }
            let present: Vec<String> = acc.output().securities.keys().cloned().collect();
            prop_assert_eq!(&present, &seen);
        }
    }
}
