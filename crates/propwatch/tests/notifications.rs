//! Tests for notification-posting reactions.
//!
//! Tests using the global center run serially so their observers do not see
//! each other's notifications.

use std::sync::Arc;

use parking_lot::Mutex;
use propwatch::{
    Notification, NotificationCenter, ObservableObject, ObserveExt, ObserverOptions, Value,
};
use serial_test::serial;

fn collect(center: &NotificationCenter, name: &str) -> Arc<Mutex<Vec<Notification>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    center.add_observer(Some(name), move |n| sink.lock().push(n.clone()));
    seen
}

#[test]
#[serial]
fn test_post_to_global_center() {
    let center = NotificationCenter::global();
    let seen = collect(&center, "count.changed");

    let object = Arc::new(ObservableObject::new().with("count", 0));
    let observer = object.observe_with("count", ObserverOptions::new().skip_initial()).unwrap();
    observer.post_notification("count.changed").unwrap();

    object.set("count", 1).unwrap();

    let seen = seen.lock();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].is_from(&object));
    assert!(seen[0].user_info.is_empty());
}

#[test]
#[serial]
fn test_post_with_value_key() {
    let center = NotificationCenter::global();
    let seen = collect(&center, "title.changed");

    let object = Arc::new(ObservableObject::new().with("title", "draft"));
    let observer = object.observe("title").unwrap();
    observer.post_notification_with_key("title.changed", "title").unwrap();

    object.set("title", "final").unwrap();

    let seen = seen.lock();
    let titles: Vec<Option<&Value>> = seen.iter().map(|n| n.info("title")).collect();
    assert_eq!(
        titles,
        vec![Some(&Value::from("draft")), Some(&Value::from("final"))]
    );
}

#[test]
fn test_post_to_explicit_center() {
    let center = Arc::new(NotificationCenter::new());
    let seen = collect(&center, "flag.changed");

    let object = Arc::new(ObservableObject::new());
    let observer = object.observe_with("flag", ObserverOptions::new().skip_initial()).unwrap();
    observer
        .post_notification_in(&center, "flag.changed", Some("flag"))
        .unwrap();

    object.set("flag", true).unwrap();
    object.set_value("flag", None).unwrap();

    let seen = seen.lock();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].info("flag"), Some(&Value::Bool(true)));
    // An absent value leaves the key out
    assert!(seen[1].info("flag").is_none());
}

#[test]
fn test_sender_filtered_registration() {
    let center = Arc::new(NotificationCenter::new());
    let first = Arc::new(ObservableObject::new().with("n", 0));
    let second = Arc::new(ObservableObject::new().with("n", 0));

    let hits = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&hits);
    center.add_observer_for(Some("n.changed"), &first, move |_| *counter.lock() += 1);

    let options = ObserverOptions::new().skip_initial();
    let a = first.observe_with("n", options).unwrap();
    a.post_notification_in(&center, "n.changed", None).unwrap();
    let b = second.observe_with("n", options).unwrap();
    b.post_notification_in(&center, "n.changed", None).unwrap();

    first.set("n", 1).unwrap();
    second.set("n", 1).unwrap();
    second.set("n", 2).unwrap();

    assert_eq!(*hits.lock(), 1);
}
