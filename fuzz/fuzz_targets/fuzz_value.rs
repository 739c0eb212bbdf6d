#![no_main]

use libfuzzer_sys::fuzz_target;
use propwatch::Value;

fuzz_target!(|data: &str| {
    // === Coercions from text should never panic ===
    let text = Value::from(data);

    let _ = format!("{}", text);
    let _ = format!("{:?}", text);
    let _ = text.type_name();
    let _ = text.to_bool();
    let _ = text.to_i8();
    let _ = text.to_i64();
    let _ = text.to_u16();
    let _ = text.to_usize();
    let _ = text.to_f32();
    let _ = text.to_f64();
    let _ = text.to_point();
    let _ = text.to_size();
    let _ = text.to_rect();
    let _ = text.to_edge_insets();

    // === Arbitrary JSON converts without panicking ===
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(data) {
        let value = Value::from(json);

        let _ = value.to_point();
        let _ = value.to_rect();
        let _ = value.to_edge_insets();
        let _ = value.as_list();
        let _ = value.as_map();
        let _ = value.get_path(data.split('.'));

        // === JSON has no NaN, so equality is reflexive ===
        assert_eq!(value, value.clone());
    }
});
