mod common;

use bson::doc;
use common::query;
use nexusmap::QueryError;
use nexusmap::query::{Sort, SortDirection, SortSpec};

#[test]
fn string_and_directives_agree() {
    let mut a = query("Rectangle");
    a.order("width,-height").unwrap();
    let mut b = query("Rectangle");
    b.order_by([Sort::ascending("width"), Sort::descending("height")]).unwrap();
    assert_eq!(a.sort_spec(), b.sort_spec());
    assert_eq!(a.freeze().unwrap().sort(), &doc! {"width": 1, "height": -1});
    let keys = a.sort_spec().keys();
    assert_eq!(keys[1].direction, SortDirection::Descending);
}

#[test]
fn sort_uses_wire_names() {
    let mut q = query("ContainsRenamedFields");
    q.order("lastName, -firstName").unwrap();
    assert_eq!(q.freeze().unwrap().sort(), &doc! {"last_name": 1, "first_name": -1});
}

#[test]
fn natural_order_sentinels() {
    let mut q = query("Rectangle");
    q.order_by([Sort::natural_descending()]).unwrap();
    assert_eq!(q.freeze().unwrap().sort(), &doc! {"$natural": -1});
    q.order("$natural").unwrap();
    assert_eq!(q.sort_spec(), &SortSpec::Natural(SortDirection::Ascending));
    let err = q.order_by([Sort::natural_ascending(), Sort::ascending("width")]).unwrap_err();
    assert!(matches!(err, QueryError::InvalidSort(_)));
}

#[test]
fn sort_fields_are_validated() {
    let mut q = query("Rectangle");
    assert!(matches!(q.order("depth"), Err(QueryError::UnknownField { .. })));
    assert!(matches!(q.order("width,,height"), Err(QueryError::InvalidSort(_))));
    assert_eq!(q.sort_spec(), &SortSpec::Unsorted);
}

#[test]
fn sort_key_limit() {
    let cfg = nexusmap::CompilerConfig { max_sort_fields: 1, ..Default::default() };
    let mut q = common::query_with("Rectangle", cfg);
    assert!(matches!(q.order("width,height"), Err(QueryError::LimitExceeded(_))));
}

#[test]
fn comparator_is_lexicographic() {
    let mut q = query("Rectangle");
    q.order("width,-height").unwrap();
    let spec = q.sort_spec();
    let mut docs = vec![
        doc! {"width": 2, "height": 1},
        doc! {"width": 1, "height": 1},
        doc! {"width": 1, "height": 5},
        doc! {"width": 2, "height": 9},
    ];
    docs.sort_by(|a, b| spec.compare(a, b));
    assert_eq!(
        docs,
        vec![
            doc! {"width": 1, "height": 5},
            doc! {"width": 1, "height": 1},
            doc! {"width": 2, "height": 9},
            doc! {"width": 2, "height": 1},
        ]
    );
}
