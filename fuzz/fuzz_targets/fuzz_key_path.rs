#![no_main]

use libfuzzer_sys::fuzz_target;
use propwatch::{KeyPath, ObservableObject, ObserveExt};
use std::sync::Arc;

fuzz_target!(|data: &str| {
    // === Parsing should never panic ===
    let Ok(path) = KeyPath::parse(data) else {
        return;
    };

    // === Accessors on a valid path ===
    let _ = path.first();
    let _ = path.len();
    let _ = path.is_simple();
    let _ = format!("{path}");
    assert_eq!(path.segments().count(), path.len());
    assert!(!path.is_ancestor_of(&path));

    // === Joining and relativizing agree ===
    if let Ok(child) = path.join("leaf") {
        assert!(path.is_ancestor_of(&child));
        assert_eq!(child.relative_to(&path).map(|p| p.to_string()), Some("leaf".to_string()));
    }

    // === Writing and observing any valid path should never panic ===
    let object = Arc::new(ObservableObject::new());
    let _ = object.set(data, 1);
    let _ = object.get(data);
    if let Ok(observer) = object.observe(data) {
        let _ = observer.report_change(|_| {});
        let _ = object.set(data, 2);
        observer.remove_from_target();
    }
});
