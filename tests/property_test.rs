use calc_engine::{
    coerce::coerce, CalculationEvaluator, Configuration, State, Value, VariableDefinition,
    VariableType,
};
use proptest::prelude::*;
use strum::IntoEnumIterator;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[ctor::ctor]
fn init_tests() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Undefined),
        Just(Value::Null),
        any::<bool>().prop_map(Value::Boolean),
        any::<f64>().prop_map(Value::Number),
        "[a-z0-9 ./:-]{0,12}".prop_map(Value::String),
    ];
    leaf.prop_recursive(2, 8, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,4}", inner, 0..4).prop_map(Value::Object),
        ]
    })
}

fn arb_state() -> impl Strategy<Value = State> {
    prop::collection::btree_map(
        prop_oneof![Just("age".to_string()), "[a-z]{1,6}"],
        prop_oneof![
            (0..120i32).prop_map(|n| Value::Number(f64::from(n))),
            "[a-z0-9]{0,6}".prop_map(Value::String),
            Just(Value::Null),
        ],
        0..5,
    )
}

fn configuration() -> Configuration {
    Configuration::new(
        "properties",
        vec![
            VariableDefinition::new("is_senior", "return this.age >= 65;", VariableType::Boolean),
            VariableDefinition::new("decade", "return Math.floor(age / 10);", VariableType::Number),
            VariableDefinition::new(
                "label",
                "if (is_senior) { return 'senior'; } return 'decade ' + decade;",
                VariableType::String,
            ),
            VariableDefinition::new("decade", "return decade * 10;", VariableType::Number),
        ],
    )
}

proptest! {
    #[test]
    fn coercion_is_total(value in arb_value()) {
        for variable_type in VariableType::iter() {
            let coerced = coerce(value.clone(), &variable_type);
            match variable_type {
                VariableType::Number => prop_assert!(matches!(coerced, Value::Number(_))),
                VariableType::String => prop_assert!(matches!(coerced, Value::String(_))),
                VariableType::Boolean => prop_assert!(matches!(coerced, Value::Boolean(_))),
                VariableType::Date | VariableType::Untyped => {}
            }
        }
    }

    #[test]
    fn evaluation_is_idempotent(state in arb_state()) {
        let evaluator = CalculationEvaluator::create(&configuration(), "1").unwrap();
        let first = evaluator.evaluate(&state);
        let second = evaluator.evaluate(&state);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn every_variable_is_a_result_key(state in arb_state()) {
        let evaluator = CalculationEvaluator::create(&configuration(), "1").unwrap();
        let record = evaluator.evaluate(&state);

        prop_assert_eq!(record.record_type.as_str(), "Calculations");
        prop_assert_eq!(record.segment.as_str(), "properties");
        match &record.calculations {
            Value::Object(fields) => {
                let keys: Vec<_> = fields.keys().map(String::as_str).collect();
                prop_assert_eq!(keys, vec!["decade", "is_senior", "label"]);
            }
            other => prop_assert!(false, "calculations is not an object: {:?}", other),
        }
        prop_assert_eq!(record.error.is_some(), !state.contains_key("age"));
    }
}
