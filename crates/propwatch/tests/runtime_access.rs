//! Tests for `#[derive(KeyValue)]` and observing `Observed<T>`.

use std::sync::Arc;

use parking_lot::Mutex;
use propwatch::{
    ChangeRecord, KeyValue, Mapping, ObserveError, ObserveExt, Observed, ObserverOptions, Point,
    Value, map_property,
};

// ============================================================================
// Test Types
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq, KeyValue)]
struct Address {
    city: String,
    zip: Option<String>,
}

#[derive(Clone, Debug, Default, KeyValue)]
struct Customer {
    #[key(readonly)]
    id: u64,

    #[key(rename = "displayName")]
    display_name: String,

    balance: f64,

    location: Point,

    tags: Vec<String>,

    #[key(nested)]
    address: Address,

    #[key(skip)]
    #[allow(dead_code)]
    scratch: Vec<u8>,
}

fn customer() -> Customer {
    Customer {
        id: 7,
        display_name: "Ada".to_string(),
        balance: 10.5,
        location: Point::new(1.0, 2.0),
        tags: vec!["vip".to_string()],
        address: Address {
            city: "Brno".to_string(),
            zip: None,
        },
        scratch: Vec::new(),
    }
}

// ============================================================================
// Derive
// ============================================================================

#[test]
fn test_keys_in_declaration_order() {
    assert_eq!(
        Customer::keys(),
        &["id", "displayName", "balance", "location", "tags", "address"]
    );
    assert_eq!(Address::keys(), &["city", "zip"]);
}

#[test]
fn test_get_key() {
    let c = customer();

    assert_eq!(c.get_key("id").unwrap(), Some(Value::Integer(7)));
    assert_eq!(c.get_key("displayName").unwrap(), Some(Value::from("Ada")));
    assert_eq!(c.get_key("location").unwrap(), Some(Value::Point(Point::new(1.0, 2.0))));
    assert_eq!(
        c.get_key("tags").unwrap(),
        Some(Value::List(vec![Value::from("vip")]))
    );
    assert_eq!(c.get_key("address.city").unwrap(), Some(Value::from("Brno")));
    assert_eq!(c.get_key("address.zip").unwrap(), None);

    let address = c.get_key("address").unwrap().unwrap();
    assert_eq!(address.as_map().unwrap().get("city"), Some(&Value::from("Brno")));

    assert!(matches!(c.get_key("scratch"), Err(ObserveError::UnknownKey { .. })));
    assert!(matches!(c.get_key("display_name"), Err(ObserveError::UnknownKey { .. })));
}

#[test]
fn test_set_key() {
    let mut c = customer();

    c.set_key("displayName", Some("Grace".into())).unwrap();
    c.set_key("balance", Some(Value::Integer(3))).unwrap();
    c.set_key("address.zip", Some("60200".into())).unwrap();

    assert_eq!(c.display_name, "Grace");
    assert!((c.balance - 3.0).abs() < f64::EPSILON);
    assert_eq!(c.address.zip.as_deref(), Some("60200"));

    assert!(matches!(
        c.set_key("id", Some(Value::Integer(1))),
        Err(ObserveError::ReadOnly { .. })
    ));
    assert!(matches!(
        c.set_key("balance", Some("lots".into())),
        Err(ObserveError::TypeMismatch { .. })
    ));
    assert!(matches!(
        c.set_key("displayName", None),
        Err(ObserveError::TypeMismatch { .. })
    ));
}

#[test]
fn test_set_nested_as_map() {
    let mut c = customer();
    let mut entries = std::collections::BTreeMap::new();
    entries.insert("city".to_string(), Value::from("Praha"));
    c.set_key("address", Some(Value::Map(entries))).unwrap();

    assert_eq!(c.address.city, "Praha");
    assert!(matches!(
        c.set_key("address", Some(Value::Integer(1))),
        Err(ObserveError::TypeMismatch { .. })
    ));
}

// ============================================================================
// Observed<T>
// ============================================================================

fn record_changes(observer: &propwatch::PropertyObserver) -> Arc<Mutex<Vec<ChangeRecord>>> {
    let records = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&records);
    observer
        .report_change(move |record| sink.lock().push(record.clone()))
        .unwrap();
    records
}

#[test]
fn test_observed_set_and_observe() {
    let model = Arc::new(Observed::new(customer()));
    let observer = model.observe("balance").unwrap();
    let records = record_changes(&observer);

    model.set("balance", 20.0).unwrap();

    let records = records.lock();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].current_value(), Some(&Value::Float(10.5)));
    assert_eq!(records[1].previous_value(), Some(&Value::Float(10.5)));
    assert_eq!(records[1].current_value(), Some(&Value::Float(20.0)));
}

#[test]
fn test_observed_unknown_key_cannot_be_observed() {
    let model = Arc::new(Observed::new(customer()));
    assert!(matches!(
        model.observe("nickname"),
        Err(ObserveError::UnknownKey { .. })
    ));
}

#[test]
fn test_observed_update_notifies_changed_keys_only() {
    let model = Arc::new(Observed::new(customer()));
    let options = ObserverOptions::new().skip_initial();

    let name = record_changes(&model.observe_with("displayName", options).unwrap());
    let balance = record_changes(&model.observe_with("balance", options).unwrap());
    let city = record_changes(&model.observe_with("address.city", options).unwrap());

    model.update(|c| {
        c.display_name = "Grace".to_string();
        c.address.city = "Wien".to_string();
    });

    assert_eq!(name.lock().len(), 1);
    assert!(balance.lock().is_empty());

    let city = city.lock();
    assert_eq!(city.len(), 1);
    assert_eq!(city[0].previous_value(), Some(&Value::from("Brno")));
    assert_eq!(city[0].current_value(), Some(&Value::from("Wien")));
}

#[test]
fn test_observed_update_prior_sees_old_state() {
    let model = Arc::new(Observed::new(customer()));
    let observer = model
        .observe_with("balance", ObserverOptions::new().skip_initial().prior_change())
        .unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let reader = Arc::clone(&model);
    observer
        .report_change(move |record| {
            let balance = reader.read(|c| c.balance);
            sink.lock().push((record.is_prior(), balance));
        })
        .unwrap();

    model.update(|c| c.balance = 99.0);

    assert_eq!(*seen.lock(), vec![(true, 10.5), (false, 99.0)]);
}

#[test]
fn test_observed_rejected_write_sends_nothing() {
    let model = Arc::new(Observed::new(customer()));
    let observer = model
        .observe_with("id", ObserverOptions::new().skip_initial().prior_change())
        .unwrap();
    let records = record_changes(&observer);

    assert!(matches!(model.set("id", 8_u64), Err(ObserveError::ReadOnly { .. })));
    assert!(records.lock().is_empty());
    assert_eq!(model.get_as::<u64>("id").unwrap(), 7);
}

#[test]
fn test_mapping_between_observed_values() {
    let source = Arc::new(Observed::new(customer()));
    let destination = Arc::new(Observed::new(Address::default()));

    let _mapping =
        map_property(&source, "address.city", &destination, "city", Mapping::Identity).unwrap();
    assert_eq!(destination.read(|a| a.city.clone()), "Brno");

    source.set("address.city", "Praha".to_string()).unwrap();
    assert_eq!(destination.read(|a| a.city.clone()), "Praha");
}
