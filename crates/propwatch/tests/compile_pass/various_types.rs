//! Test: every supported field type.

use std::collections::BTreeMap;

use propwatch::{EdgeInsets, KeyValue, Point, Rect, Size, Value};

#[derive(Clone, Default, KeyValue)]
struct Layout {
    visible: bool,
    depth: i32,
    index: usize,
    alpha: f32,
    scale: f64,
    title: String,
    subtitle: Option<String>,
    origin: Point,
    size: Size,
    frame: Rect,
    margins: EdgeInsets,
    children: Vec<String>,
    attributes: BTreeMap<String, i64>,
    extra: Option<Value>,
}

fn main() {
    let layout = Layout::default();
    assert_eq!(Layout::keys().len(), 14);
    let _ = layout.to_map();
}
