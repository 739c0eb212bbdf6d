//! Example: derived properties on a `#[derive(KeyValue)]` model
//!
//! A form's `enabled` flag follows `busy`, and a status line is rebuilt
//! whenever the title changes.
//!
//! Run with:
//!   cargo run --package propwatch --example derived_properties

use std::sync::Arc;

use propwatch::{
    KeyValue, Mapping, ObservableObject, ObserveExt, Observed, ObserverSet, Value, map_property,
    transforms,
};

#[derive(Clone, Debug, Default, KeyValue)]
struct Document {
    title: String,
    busy: bool,

    #[key(rename = "pageCount")]
    page_count: u32,
}

fn main() -> miette::Result<()> {
    let document = Arc::new(Observed::new(Document {
        title: "Untitled".to_string(),
        ..Document::default()
    }));
    let view = Arc::new(ObservableObject::new());
    let mappings = ObserverSet::new();

    mappings.insert(map_property(
        &document,
        "busy",
        &view,
        "saveEnabled",
        Mapping::transform(transforms::invert_bool),
    )?);

    mappings.insert(map_property(
        &document,
        "title",
        &view,
        "status",
        Mapping::transform(|title| {
            let title = title.and_then(Value::as_str).unwrap_or("");
            Ok(Some(Value::from(format!("Editing {title}"))))
        }),
    )?);

    mappings.insert(map_property(
        &document,
        "pageCount",
        &view,
        "pages",
        Mapping::or(0),
    )?);

    let printer = view.observe("status")?;
    printer.report_current_value(|status| println!("status: {status:?}"))?;
    mappings.insert(printer);

    document.update(|doc| {
        doc.title = "Quarterly report".to_string();
        doc.busy = true;
    });
    println!("save enabled: {:?}", view.get("saveEnabled")?);

    document.set("busy", false)?;
    document.set("pageCount", 12_u32)?;
    println!("save enabled: {:?}", view.get("saveEnabled")?);
    println!("pages: {:?}", view.get("pages")?);
    println!("{:#?}", document.snapshot());

    Ok(())
}
