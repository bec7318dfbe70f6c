use intent_meta::version::{ConstraintSet, Satisfaction, VersionTuple, satisfies};
use proptest::prelude::*;

fn version_string() -> impl Strategy<Value = String> {
    prop::collection::vec(0u64..40, 1..4).prop_map(|parts| {
        parts
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(".")
    })
}

fn supported_op() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["==", ">=", ">", "<", "<=", ""])
}

fn unsupported_op() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["!=", "===", "^", "~", "=>", "=<"])
}

fn clause_holds(op: &str, version: &VersionTuple, bound: &VersionTuple) -> bool {
    match op {
        "==" | "" => version == bound,
        ">=" => version >= bound,
        ">" => version > bound,
        "<" => version < bound,
        "<=" => version <= bound,
        other => panic!("unexpected operator {other}"),
    }
}

proptest! {
    #[test]
    fn test_satisfies_is_conjunction_of_clauses(
        version in version_string(),
        clauses in prop::collection::vec((supported_op(), version_string()), 1..4),
    ) {
        let declared = VersionTuple::parse(&version).unwrap();
        let spec = clauses
            .iter()
            .map(|(op, v)| format!("{op}{v}"))
            .collect::<Vec<_>>()
            .join(",");
        let expected = clauses.iter().all(|(op, v)| {
            clause_holds(op, &declared, &VersionTuple::parse(v).unwrap())
        });

        let outcome = satisfies(&declared, &spec);
        prop_assert_eq!(
            outcome,
            if expected { Satisfaction::Satisfied } else { Satisfaction::Violated }
        );
    }

    #[test]
    fn test_unknown_operator_is_unsupported(
        version in version_string(),
        good in prop::collection::vec((supported_op(), version_string()), 0..3),
        bad_op in unsupported_op(),
        bad_version in version_string(),
    ) {
        let declared = VersionTuple::parse(&version).unwrap();
        let mut clauses: Vec<String> = good.iter().map(|(op, v)| format!("{op}{v}")).collect();
        clauses.push(format!("{bad_op}{bad_version}"));
        let spec = clauses.join(",");

        prop_assert_eq!(satisfies(&declared, &spec), Satisfaction::Unsupported);
        prop_assert!(!ConstraintSet::parse(&spec).is_supported());
    }

    #[test]
    fn test_ordering_is_total_and_padded(a in version_string(), b in version_string()) {
        let va = VersionTuple::parse(&a).unwrap();
        let vb = VersionTuple::parse(&b).unwrap();
        prop_assert_eq!(va.cmp(&vb), vb.cmp(&va).reverse());

        let padded = VersionTuple::parse(&format!("{a}.0")).unwrap();
        prop_assert_eq!(va, padded);
    }
}
