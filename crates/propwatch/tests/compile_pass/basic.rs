//! Test: plain fields with no attributes.

use propwatch::KeyValue;

#[derive(Clone, Default, KeyValue)]
struct Counter {
    count: i64,
    label: String,
}

fn main() {
    let mut counter = Counter::default();
    counter.set_key("count", Some(3.into())).unwrap();

    assert_eq!(Counter::keys(), &["count", "label"]);
    assert_eq!(counter.count, 3);
    let _ = counter.get_key("label");
}
