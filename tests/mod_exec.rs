mod common;

use bson::{Document, doc};
use common::query;
use nexusmap::QueryError;
use nexusmap::query::{ArraySlice, FindOptions, MemoryCollection, QueryExecutor};

fn photos() -> MemoryCollection {
    MemoryCollection::from_documents(
        "photos",
        [
            doc! {"_id": 1, "keywords": [{"keyword": "a", "score": 25}, {"keyword": "b", "score": 5}]},
            doc! {"_id": 2, "keywords": [{"keyword": "c", "score": 10}, {"keyword": "d", "score": 150}]},
            doc! {"_id": 3, "keywords": [{"keyword": "e", "score": 99}]},
        ],
    )
}

fn ids(docs: Vec<Document>) -> Vec<i32> {
    docs.iter().map(|d| d.get_i32("_id").unwrap()).collect()
}

#[test]
fn elem_match_needs_one_element_satisfying_all() {
    let mut q = query("PhotoWithKeywords");
    let mut sub = q.sub_query_for("keywords").unwrap();
    sub.field("score").unwrap().greater_than(20).unwrap();
    sub.field("score").unwrap().less_than(100).unwrap();
    q.elem_match_query("keywords", &sub).unwrap();
    let found = photos().execute(&q.freeze().unwrap()).unwrap().to_vec();
    // photo 2 satisfies each bound only with different elements
    assert_eq!(ids(found), vec![1, 3]);

    let mut dotted = query("PhotoWithKeywords");
    dotted.disable_validation();
    dotted.filter("keywords.score >", 20).unwrap().filter("keywords.score <", 100).unwrap();
    let found = photos().execute(&dotted.freeze().unwrap()).unwrap().to_vec();
    assert_eq!(ids(found), vec![1, 2, 3]);
}

fn people() -> MemoryCollection {
    MemoryCollection::from_documents(
        "people",
        [doc! {"_id": 1, "name": "bob"}, doc! {"_id": 2, "name": "alice"}, doc! {"_id": 3, "name": "Ralphie"}],
    )
}

#[test]
fn negated_prefix_and_double_negation() {
    let col = MemoryCollection::from_documents("pics", [doc! {"_id": 1, "name": "bob"}, doc! {"_id": 2, "name": "alice"}]);
    let mut q = query("ContainsPic");
    q.field("name").unwrap().not().starts_with("ralph").unwrap();
    assert_eq!(col.execute(&q.freeze().unwrap()).unwrap().count(), 2);

    let mut plain = query("ContainsPic");
    plain.field("name").unwrap().starts_with("ralph").unwrap();
    let mut twice = query("ContainsPic");
    twice.field("name").unwrap().not().not().starts_with("ralph").unwrap();
    let col = people();
    let a = col.execute(&plain.freeze().unwrap()).unwrap().to_vec();
    let b = col.execute(&twice.freeze().unwrap()).unwrap().to_vec();
    assert_eq!(a, b);
    assert!(a.is_empty());

    let mut ci = query("ContainsPic");
    ci.field("name").unwrap().starts_with_ignore_case("ralph").unwrap();
    assert_eq!(ids(col.execute(&ci.freeze().unwrap()).unwrap().to_vec()), vec![3]);
}

#[test]
fn sort_skip_limit_projection() {
    let col = MemoryCollection::from_documents(
        "rects",
        (0..6).map(|i| doc! {"_id": i, "width": i % 3, "height": i}),
    );
    let mut q = query("Rectangle");
    q.filter("height >=", 1).unwrap();
    q.order("width,-height").unwrap();
    q.project("width", true).unwrap();
    q.offset(1).limit(3);
    let docs = col.execute(&q.freeze().unwrap()).unwrap().to_vec();
    assert_eq!(
        docs,
        vec![doc! {"_id": 4, "width": 1}, doc! {"_id": 1, "width": 1}, doc! {"_id": 5, "width": 2}]
    );
}

#[test]
fn array_slice_projection_over_sixteen() {
    let scalars: Vec<i32> = (0..16).collect();
    let col = MemoryCollection::from_documents("vec", [doc! {"_id": 1, "scalars": scalars}]);
    let cases = [
        (ArraySlice::new(4), 0..4),
        (ArraySlice::with_skip(5, 4), 5..9),
        (ArraySlice::with_skip(-10, 6), 6..12),
        (ArraySlice::new(-12), 4..16),
    ];
    for (slice, want) in cases {
        let mut q = query("IntVector");
        q.project_slice("scalars", slice).unwrap();
        let docs = col.execute(&q.freeze().unwrap()).unwrap().to_vec();
        let got: Vec<i32> =
            docs[0].get_array("scalars").unwrap().iter().map(|b| b.as_i32().unwrap()).collect();
        assert_eq!(got, want.collect::<Vec<_>>(), "{slice:?}");
    }
}

#[test]
fn natural_order_and_single_batch() {
    let col = people();
    let mut q = query("ContainsPic");
    q.order("-$natural").unwrap().batch_size(-2);
    assert_eq!(ids(col.execute(&q.freeze().unwrap()).unwrap().to_vec()), vec![3, 2]);
}

#[test]
fn where_is_reported_unsupported() {
    let mut q = query("Rectangle");
    q.where_("this.width > 1");
    let err = people().execute(&q.freeze().unwrap()).unwrap_err();
    assert!(matches!(err, QueryError::Unsupported(_)));
}

#[test]
fn raw_filters_run_through_find() {
    let col = people();
    let cur = col
        .find(&doc! {"$or": [{"name": "bob"}, {"_id": 3}]}, &doc! {"_id": -1}, &doc! {}, &FindOptions::new())
        .unwrap();
    assert_eq!(ids(cur.to_vec()), vec![3, 1]);
    assert_eq!(col.count(&doc! {"$nor": [{"name": "bob"}]}).unwrap(), 2);
}

#[test]
fn most_negative_limit_is_unbounded() {
    let col = people();
    let opts = FindOptions::new().limit(i64::MIN);
    let cur = col.find(&doc! {}, &doc! {"_id": 1}, &doc! {}, &opts).unwrap();
    assert_eq!(cur.remaining(), col.len());
}
