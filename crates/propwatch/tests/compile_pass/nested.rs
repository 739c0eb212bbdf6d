//! Test: nested structs reachable through dotted keys.

use std::sync::Arc;

use propwatch::{KeyValue, ObserveExt, Observed};

#[derive(Clone, Default, KeyValue)]
struct Inner {
    enabled: bool,
}

#[derive(Clone, Default, KeyValue)]
struct Outer {
    name: String,

    #[key(nested)]
    inner: Inner,
}

fn main() {
    let model = Arc::new(Observed::new(Outer::default()));
    let observer = model.observe("inner.enabled").unwrap();
    observer.report_bool(|enabled| assert!(!enabled)).unwrap();
}
