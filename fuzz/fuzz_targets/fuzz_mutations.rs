#![no_main]

use std::sync::Arc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use propwatch::{ObservableObject, ObserveExt, ObserverOptions, Value};

#[derive(Arbitrary, Debug)]
enum Op {
    Set(i64),
    Clear,
    Push(i64),
    Insert(usize, i64),
    RemoveAt(Vec<usize>),
    ReplaceAt(usize, i64),
    AddToSet(i64),
    RemoveFromSet(i64),
}

#[derive(Arbitrary, Debug)]
struct Input {
    options: u8,
    ops: Vec<Op>,
}

fuzz_target!(|input: Input| {
    let object = Arc::new(ObservableObject::new());
    let options = ObserverOptions::from_bits(u32::from(input.options));
    let Ok(observer) = object.observe_with("items", options) else {
        return;
    };

    let _ = observer.report_change(|record| {
        // Relationship records always carry their indexes
        let _ = record.inserted_indexes();
        let _ = record.removed_indexes();
        let _ = record.replaced_indexes();
    });

    // === Mutations should error, never panic ===
    for op in input.ops {
        let _ = match op {
            Op::Set(n) => object.set("items", vec![Value::Integer(n)]),
            Op::Clear => object.set_value("items", None),
            Op::Push(n) => object.push("items", n),
            Op::Insert(i, n) => object.insert("items", i, vec![Value::Integer(n)]),
            Op::RemoveAt(indexes) => object.remove_at("items", indexes),
            Op::ReplaceAt(i, n) => object.replace_at("items", i, vec![Value::Integer(n)]),
            Op::AddToSet(n) => object.add_to_set("items", vec![Value::Integer(n)]),
            Op::RemoveFromSet(n) => object.remove_from_set("items", vec![Value::Integer(n)]),
        };
    }
});
