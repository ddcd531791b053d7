use proptest::prelude::*;
use rulelens_core::{Condition, FeatureIndex, FeatureVector, Operator, Rule, Severity, Transaction};
use rulelens_engine::{evaluate_rule, hit_rate, BatchEvaluator};
use serde_json::json;

fn operator() -> impl Strategy<Value = Operator> {
    prop_oneof![
        Just(Operator::Eq),
        Just(Operator::Ne),
        Just(Operator::Gt),
        Just(Operator::Lt),
        Just(Operator::Gte),
        Just(Operator::Lte),
        Just(Operator::Contains),
        Just(Operator::OutOfHours),
    ]
}

proptest! {
    #[test]
    fn test_evaluation_is_deterministic(
        amount in -10_000i64..10_000i64,
        velocity in 0.0f64..50.0f64,
        threshold in "[0-9a-z.]{0,6}",
        ops in prop::collection::vec(operator(), 1..6),
        with_features in any::<bool>(),
    ) {
        let conditions = ops
            .iter()
            .enumerate()
            .map(|(i, op)| {
                if i % 2 == 0 {
                    Condition::raw("amount", *op, threshold.clone())
                } else {
                    Condition::derived("velocity", *op, threshold.clone())
                }
            })
            .collect();
        let rule = Rule::new("R1", "Generated", Severity::Low, "log", conditions);
        let txn = Transaction::new("T1").with_field("amount", json!(amount));
        let fv = FeatureVector::new("T1").with_field("velocity", json!(velocity));
        let fv = with_features.then_some(&fv);

        let first = evaluate_rule(&rule, &txn, fv);
        let second = evaluate_rule(&rule, &txn, fv);

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.conditions.len(), ops.len());
        prop_assert_eq!(first.pass, first.conditions.iter().all(|c| c.pass));
    }

    #[test]
    fn test_eq_and_ne_are_complements(
        actual in prop_oneof![
            any::<i32>().prop_map(|n| json!(n)),
            "[a-zA-Z0-9 ]{0,8}".prop_map(|s| json!(s)),
        ],
        expected in "[a-zA-Z0-9 ]{0,8}",
    ) {
        let txn = Transaction::new("T1").with_field("field", actual);
        let eq_rule = Rule::new(
            "R",
            "eq",
            Severity::Low,
            "log",
            vec![Condition::raw("field", Operator::Eq, expected.clone())],
        );
        let ne_rule = Rule::new(
            "R",
            "ne",
            Severity::Low,
            "log",
            vec![Condition::raw("field", Operator::Ne, expected)],
        );
        let eq = evaluate_rule(&eq_rule, &txn, None);
        let ne = evaluate_rule(&ne_rule, &txn, None);
        prop_assert_ne!(eq.pass, ne.pass);
    }

    #[test]
    fn test_hit_rate_is_a_percentage(
        amounts in prop::collection::vec(0i64..5_000i64, 0..40),
        threshold in 0i64..5_000i64,
    ) {
        let rule = Rule::new(
            "R1",
            "Threshold",
            Severity::High,
            "review",
            vec![Condition::raw("amount", Operator::Gt, threshold)],
        );
        let txns: Vec<Transaction> = amounts
            .iter()
            .enumerate()
            .map(|(i, a)| Transaction::new(format!("T{}", i)).with_field("amount", json!(a)))
            .collect();
        let features = FeatureIndex::new();

        let stats = BatchEvaluator::new(&[], &txns, &features).rule_stats(&rule);
        let expected_hits = amounts.iter().filter(|a| **a > threshold).count();

        prop_assert_eq!(stats.hits, expected_hits);
        prop_assert!(stats.hit_rate <= 100);
        prop_assert_eq!(stats.hit_rate, hit_rate(expected_hits, amounts.len()));
    }
}
