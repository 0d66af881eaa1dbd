//! Property tests for the tokenizer, parser and evaluator

use fieldcalc_core::{FieldCatalog, FieldDefinition, FieldType, RecordSnapshot};
use fieldcalc_formula::{
    dependencies, evaluate_formula, parse_formula, tokenize, validate_syntax, FormulaEngine,
};
use proptest::prelude::*;

fn catalog() -> FieldCatalog {
    FieldCatalog::from_fields([
        FieldDefinition::new("fa", "A", FieldType::Number),
        FieldDefinition::new("fb", "B", FieldType::Number),
        FieldDefinition::new("fc", "C", FieldType::Text),
    ])
    .unwrap()
}

/// Small well-formed formulas over literals, fields and a few functions
fn formula() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        (0u32..1000).prop_map(|n| n.to_string()),
        (0u32..1000, 1u32..100).prop_map(|(a, b)| format!("{}.{}", a, b)),
        Just("{A}".to_string()),
        Just("{B}".to_string()),
        Just("{C}".to_string()),
        Just("{Missing}".to_string()),
        "[a-z ]{0,6}".prop_map(|s| format!("\"{}\"", s)),
        Just("TRUE".to_string()),
        Just("BLANK()".to_string()),
    ];

    leaf.prop_recursive(4, 32, 3, |inner| {
        prop_oneof![
            (
                inner.clone(),
                prop::sample::select(vec![
                    "+", "-", "*", "/", "%", "^", "=", "!=", "<", "<=", ">", ">=", "&"
                ]),
                inner.clone()
            )
                .prop_map(|(l, op, r)| format!("({} {} {})", l, op, r)),
            inner.clone().prop_map(|e| format!("-({})", e)),
            prop::collection::vec(inner.clone(), 1..4)
                .prop_map(|args| format!("SUM({})", args.join(", "))),
            (inner.clone(), inner.clone(), inner.clone())
                .prop_map(|(c, a, b)| format!("IF({}, {}, {})", c, a, b)),
            prop::collection::vec(inner, 1..3)
                .prop_map(|args| format!("CONCAT({})", args.join(", "))),
        ]
    })
}

fn record() -> impl Strategy<Value = RecordSnapshot> {
    (any::<i32>(), any::<bool>(), "[a-z0-9]{0,5}").prop_map(|(a, with_b, c)| {
        let record = RecordSnapshot::new().with("fa", a).with("fc", c);
        if with_b {
            record.with("fb", 7)
        } else {
            record
        }
    })
}

proptest! {
    #[test]
    fn tokenize_never_panics(text in "\\PC{0,64}") {
        let _ = tokenize(&text);
        let _ = validate_syntax(&text);
    }

    #[test]
    fn evaluate_never_panics_on_arbitrary_text(text in "[-+*/%^&=<>!(){},.\"'a-zA-Z0-9 ]{0,40}") {
        let _ = evaluate_formula(&text, &catalog(), &RecordSnapshot::new());
    }

    #[test]
    fn generated_formulas_parse(f in formula()) {
        prop_assert!(validate_syntax(&f).is_ok(), "failed to parse {}", f);
    }

    #[test]
    fn evaluation_is_idempotent(f in formula(), record in record()) {
        let catalog = catalog();
        let first = evaluate_formula(&f, &catalog, &record);
        let second = evaluate_formula(&f, &catalog, &record);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn parse_is_deterministic(f in formula()) {
        prop_assert_eq!(parse_formula(&f), parse_formula(&f));
    }

    #[test]
    fn dependencies_are_a_subset_of_the_catalog(f in formula()) {
        let catalog = catalog();
        let engine = FormulaEngine::default();
        for id in engine.dependencies(&f, &catalog).unwrap() {
            prop_assert!(catalog.get(&id).is_some());
        }
        prop_assert_eq!(
            dependencies(&f, &catalog).unwrap(),
            engine.dependencies(&f, &catalog).unwrap()
        );
    }
}
