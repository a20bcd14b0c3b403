use serde_json::{Map, Value};

const SEPARATOR: &str = "_";

/// Collapse nested objects into `parent_child` keys.
///
/// Arrays are replaced by their first element; Cost Explorer only ever
/// returns single-key groups here, so later elements are dropped. An empty
/// array becomes `null`.
pub fn flatten(map: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    flatten_into(&mut out, "", map);
    out
}

fn flatten_into(out: &mut Map<String, Value>, prefix: &str, map: &Map<String, Value>) {
    for (key, value) in map {
        let key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}{}{}", prefix, SEPARATOR, key)
        };
        insert_flat(out, key, value);
    }
}

fn insert_flat(out: &mut Map<String, Value>, key: String, value: &Value) {
    match value {
        Value::Object(nested) => flatten_into(out, &key, nested),
        Value::Array(items) => match items.first() {
            Some(first) => insert_flat(out, key, first),
            None => {
                out.insert(key, Value::Null);
            }
        },
        scalar => {
            out.insert(key, scalar.clone());
        }
    }
}
