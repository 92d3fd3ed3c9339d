//! Post-processing of local-search payloads.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

use crate::projection::tm128_to_wgs84;

static MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Remove anything between `<` and `>`.
pub fn strip_markup(text: &str) -> String {
    MARKUP.replace_all(text, "").into_owned()
}

/// Strip markup from each item's `title` and attach `wgs84` when `mapx`/`mapy` decode.
///
/// Items without usable coordinates are left as they are.
pub fn normalize_local_search(mut body: Value) -> Value {
    let Some(items) = body.get_mut("items").and_then(Value::as_array_mut) else {
        return body;
    };

    for item in items.iter_mut().filter_map(Value::as_object_mut) {
        if let Some(Value::String(title)) = item.get("title") {
            let clean = strip_markup(title);
            item.insert("title".to_string(), Value::String(clean));
        }

        let coord = match (item.get("mapx"), item.get("mapy")) {
            (Some(x), Some(y)) => match (as_text(x), as_text(y)) {
                (Some(x), Some(y)) => tm128_to_wgs84(&x, &y),
                _ => None,
            },
            _ => None,
        };

        if let Some(point) = coord {
            item.insert("wgs84".to_string(), json!({ "lat": point.lat, "lng": point.lng }));
        }
    }

    body
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
