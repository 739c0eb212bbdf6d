//! Error message quality tests.
//!
//! Ensures error messages name the key path involved and carry stable
//! diagnostic codes.

#![allow(clippy::pedantic)]

use std::sync::Arc;

use miette::Diagnostic;
use parking_lot::Mutex;
use propwatch::{
    KeyPath, Mapping, ObservableObject, ObserveError, ObserveExt, ObserverOptions, Value,
};

fn code(err: &ObserveError) -> String {
    err.code().map(|c| c.to_string()).unwrap_or_default()
}

// ============================================================================
// Key Path Errors
// ============================================================================

#[test]
fn test_invalid_key_path_shows_text_and_reason() {
    let err = KeyPath::parse("address..city").unwrap_err();
    let display = format!("{err}");

    assert!(display.contains("address..city"), "should show the path: {display}");
    assert!(display.contains("empty segment"), "should show the reason: {display}");
    assert_eq!(code(&err), "propwatch::invalid_key_path");
    assert!(err.help().is_some());
}

#[test]
fn test_observe_rejects_malformed_path() {
    let object = Arc::new(ObservableObject::new());
    let err = object.observe(" ").unwrap_err();

    assert!(matches!(err, ObserveError::InvalidKeyPath { .. }));
}

// ============================================================================
// Mutation Errors
// ============================================================================

#[test]
fn test_type_mismatch_names_both_shapes() {
    let object = Arc::new(ObservableObject::new().with("name", "Ada"));
    let err = object.set("name.first", "A").unwrap_err();
    let display = format!("{err}");

    assert!(display.contains("name"), "should name the key path: {display}");
    assert!(display.contains("map"), "should name the expected shape: {display}");
    assert!(display.contains("string"), "should name the found shape: {display}");
    assert_eq!(code(&err), "propwatch::type_mismatch");
}

#[test]
fn test_not_a_collection_has_help() {
    let object = Arc::new(ObservableObject::new().with("count", 1));
    let err = object.push("count", 2).unwrap_err();

    assert!(format!("{err}").contains("count"));
    assert_eq!(code(&err), "propwatch::not_a_collection");
    assert!(err.help().is_some());
}

#[test]
fn test_index_out_of_bounds_shows_index_and_len() {
    let object = Arc::new(ObservableObject::new().with("items", vec![Value::Integer(1)]));
    let err = object.remove_at("items", [3]).unwrap_err();
    let display = format!("{err}");

    assert!(display.contains('3'), "should show the index: {display}");
    assert!(display.contains("len 1"), "should show the length: {display}");
}

// ============================================================================
// Reaction Errors
// ============================================================================

#[test]
fn test_reaction_errors_reach_the_error_callback() {
    let object = Arc::new(ObservableObject::new().with("flag", "yes"));
    let observer = object.observe("flag").unwrap();

    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);
    observer.on_error(move |err| sink.lock().push(code(err)));
    observer.report_bool(|_| {}).unwrap();

    object.set("flag", Value::Point(propwatch::Point::new(0.0, 0.0))).unwrap();

    assert_eq!(*errors.lock(), vec!["propwatch::type_mismatch".to_string()]);
}

#[test]
fn test_transform_error_keeps_its_source() {
    #[derive(Debug, thiserror::Error)]
    #[error("value out of range")]
    struct OutOfRange;

    let object = Arc::new(ObservableObject::new().with("level", 1));
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);

    let observer = object
        .observe_with("level", ObserverOptions::new().skip_initial())
        .unwrap();
    observer.on_error(move |err| sink.lock().push(format!("{err}")));
    observer
        .set_transformed_on(&object, "label", |_| Err(OutOfRange.into()))
        .unwrap();

    object.set("level", 2).unwrap();

    let errors = errors.lock();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("label"));
    assert!(errors[0].contains("value out of range"));
}

#[test]
fn test_panicking_reaction_is_reported() {
    let object = Arc::new(ObservableObject::new().with("n", 0));
    let observer = object.observe_with("n", ObserverOptions::new().skip_initial()).unwrap();

    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);
    observer.on_error(move |err| sink.lock().push(format!("{err}")));
    observer.report_integer(|_| panic!("boom")).unwrap();

    object.set("n", 1).unwrap();

    let errors = errors.lock();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("boom"));
}

#[test]
fn test_removed_observer_rejects_new_reactions() {
    let object = Arc::new(ObservableObject::new());
    let observer = object.observe("n").unwrap();
    observer.remove_from_target();

    let err = observer.report_change(|_| {}).unwrap_err();
    assert_eq!(code(&err), "propwatch::invalid_state");
    assert!(format!("{err}").contains("removed"));
}

#[test]
fn test_mapping_to_read_only_is_reported() {
    let source = Arc::new(ObservableObject::new().with("n", 1));
    let destination = Arc::new(propwatch::Observed::new(Locked { id: 0 }));

    let result = propwatch::map_property(&source, "n", &destination, "id", Mapping::Identity);

    // Registration succeeds; the failing write is reported, not returned
    assert!(result.is_ok());
    assert_eq!(destination.read(|l| l.id), 0);
}

#[derive(Clone, propwatch::KeyValue)]
struct Locked {
    #[key(readonly)]
    id: u64,
}
