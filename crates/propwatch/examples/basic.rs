//! Example: observing a property and reacting to its changes
//!
//! Run with:
//!   cargo run --package propwatch --example basic

use std::sync::Arc;

use propwatch::{ObservableObject, ObserveExt, ObserverOptions, ObserverSet};

fn main() -> miette::Result<()> {
    let counter = Arc::new(ObservableObject::new().with("count", 0));
    let observers = ObserverSet::new();

    // Full change records, including the initial value
    let changes = counter.observe_with("count", ObserverOptions::new().prior_change())?;
    changes.report_change(|record| {
        if record.is_initial() {
            println!("initial   count = {:?}", record.current_value());
        } else if record.is_prior() {
            println!("before    count = {:?}", record.current_value());
        } else {
            println!(
                "changed   count = {:?} (was {:?})",
                record.current_value(),
                record.previous_value()
            );
        }
    })?;
    observers.insert(changes);

    // Typed reaction that can be silenced while we update the value ourselves
    let typed = counter.observe_with("count", ObserverOptions::new().skip_initial())?;
    typed.report_integer(|count| println!("integer   count = {count}"))?;
    observers.insert(typed.clone());

    counter.set("count", 1)?;

    // Equal settings are suppressed by default
    counter.set("count", 1)?;

    typed.disable_in(|| counter.set("count", 2))?;

    // Errors render through miette
    if let Err(err) = counter.set("count.value", 3) {
        eprintln!("{:?}", miette::Report::from(err));
    }

    println!("removed {} observers", observers.remove_all());
    counter.set("count", 3)?;

    Ok(())
}
