mod common;

use bson::{Document, doc};
use nexusmap::query::Sort;
use proptest::prelude::*;

fn directives() -> impl Strategy<Value = Vec<(&'static str, bool)>> {
    let fields = vec!["width", "height"];
    (Just(fields).prop_shuffle(), 1usize..=2, any::<(bool, bool)>())
        .prop_map(|(fields, n, (d0, d1))| fields.into_iter().take(n).zip([d0, d1]).collect())
}

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        failure_persistence: Some(Box::new(proptest::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        cases: 32,
        .. proptest::test_runner::Config::default()
    })]
    #[test]
    fn prop_string_and_directives_agree(keys in directives()) {
        let spec = keys
            .iter()
            .map(|(f, desc)| if *desc { format!("-{f}") } else { (*f).to_string() })
            .collect::<Vec<_>>()
            .join(",");
        let mut by_string = common::query("Rectangle");
        by_string.order(&spec).unwrap();
        let mut by_directives = common::query("Rectangle");
        by_directives
            .order_by(keys.iter().map(|(f, desc)| if *desc { Sort::descending(*f) } else { Sort::ascending(*f) }))
            .unwrap();
        prop_assert_eq!(by_string.sort_spec(), by_directives.sort_spec());
        let a = by_string.freeze().unwrap();
        let b = by_directives.freeze().unwrap();
        prop_assert_eq!(a.to_bytes().unwrap(), b.to_bytes().unwrap());
    }

    #[test]
    fn prop_sorted_order_is_non_decreasing(
        keys in directives(),
        rows in proptest::collection::vec((0i32..5, 0i32..5), 0..20),
    ) {
        let mut q = common::query("Rectangle");
        q.order_by(keys.iter().map(|(f, desc)| if *desc { Sort::descending(*f) } else { Sort::ascending(*f) }))
            .unwrap();
        let spec = q.sort_spec().clone();
        let mut docs: Vec<Document> = rows.iter().map(|(w, h)| doc! {"width": *w, "height": *h}).collect();
        docs.sort_by(|a, b| spec.compare(a, b));
        for w in docs.windows(2) {
            prop_assert_ne!(spec.compare(&w[0], &w[1]), std::cmp::Ordering::Greater);
        }
        let mut reversed = docs.clone();
        reversed.reverse();
        reversed.sort_by(|a, b| spec.compare(a, b));
        prop_assert_eq!(
            reversed.iter().map(|d| spec.compare(d, &docs[0])).collect::<Vec<_>>(),
            docs.iter().map(|d| spec.compare(d, &docs[0])).collect::<Vec<_>>()
        );
    }
}
