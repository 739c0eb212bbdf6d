//! Performance benchmarks for change dispatch.
//!
//! Run with: `cargo bench -p propwatch`

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use divan::Bencher;
use propwatch::{
    KeyPath, KeyValue, Mapping, ObservableObject, ObserveExt, Observed, ObserverOptions, Value,
};

fn main() {
    divan::main();
}

#[derive(Clone, Default, KeyValue)]
struct Model {
    count: i64,
    title: String,
    visible: bool,
}

// ============================================================================
// Key Paths
// ============================================================================

#[divan::bench]
fn parse_simple_key_path() -> KeyPath {
    KeyPath::parse(divan::black_box("count")).unwrap()
}

#[divan::bench]
fn parse_nested_key_path() -> KeyPath {
    KeyPath::parse(divan::black_box("document.layout.frame.origin")).unwrap()
}

// ============================================================================
// Dispatch
// ============================================================================

#[divan::bench(args = [0, 1, 8, 64])]
fn set_with_observers(bencher: Bencher, observers: usize) {
    let object = Arc::new(ObservableObject::new().with("count", 0));
    let hits = Arc::new(AtomicU64::new(0));

    let held: Vec<_> = (0..observers)
        .map(|_| {
            let observer = object
                .observe_with("count", ObserverOptions::new().skip_initial())
                .unwrap();
            let hits = Arc::clone(&hits);
            observer
                .report_integer(move |_| {
                    hits.fetch_add(1, Ordering::Relaxed);
                })
                .unwrap();
            observer
        })
        .collect();

    let mut next = 0_i64;
    bencher.bench_local(|| {
        next += 1;
        object.set("count", next).unwrap();
    });

    drop(held);
}

#[divan::bench]
fn set_with_prior_change(bencher: Bencher) {
    let object = Arc::new(ObservableObject::new().with("count", 0));
    let observer = object
        .observe_with("count", ObserverOptions::new().skip_initial().prior_change())
        .unwrap();
    observer.report_change(|record| {
        divan::black_box(record.is_prior());
    })
    .unwrap();

    let mut next = 0_i64;
    bencher.bench_local(|| {
        next += 1;
        object.set("count", next).unwrap();
    });
}

#[divan::bench]
fn equal_setting_suppressed(bencher: Bencher) {
    let object = Arc::new(ObservableObject::new().with("count", 0));
    let observer = object
        .observe_with("count", ObserverOptions::new().skip_initial())
        .unwrap();
    observer.report_change(|_| unreachable!()).unwrap();

    bencher.bench_local(|| object.set("count", 0).unwrap());
}

#[divan::bench]
fn push_to_list(bencher: Bencher) {
    let object = Arc::new(ObservableObject::new().with("items", Vec::<Value>::new()));
    let observer = object
        .observe_with("items", ObserverOptions::new().skip_initial())
        .unwrap();
    observer.report_change(|record| {
        divan::black_box(record.inserted_indexes());
    })
    .unwrap();

    bencher.bench_local(|| object.push("items", 1).unwrap());
}

// ============================================================================
// Derived Properties
// ============================================================================

#[divan::bench]
fn observed_update(bencher: Bencher) {
    let model = Arc::new(Observed::new(Model::default()));
    let observer = model
        .observe_with("count", ObserverOptions::new().skip_initial())
        .unwrap();
    observer.report_integer(|n| {
        divan::black_box(n);
    })
    .unwrap();

    bencher.bench_local(|| model.update(|m| m.count += 1));
}

#[divan::bench]
fn mapping_chain(bencher: Bencher) {
    let model = Arc::new(Observed::new(Model::default()));
    let view = Arc::new(ObservableObject::new());

    let _title = propwatch::map_property(&model, "title", &view, "heading", Mapping::Identity)
        .unwrap();
    let _hidden = propwatch::map_property(
        &model,
        "visible",
        &view,
        "hidden",
        Mapping::transform(propwatch::transforms::invert_bool),
    )
    .unwrap();

    let mut flag = false;
    bencher.bench_local(|| {
        flag = !flag;
        model.set("visible", flag).unwrap();
    });
}
