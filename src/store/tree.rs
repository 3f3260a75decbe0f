//! Path addressing inside a JSON tree.

use serde_json::{Map, Value};

/// Value at `segments` below `root`. Array elements are addressed by index.
pub fn get_at<'a>(root: &'a Value, segments: &[String]) -> Option<&'a Value> {
    let mut current = root;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(values) => values.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    (!current.is_null()).then_some(current)
}

/// Replace the value at `segments`, creating intermediate objects. Writing
/// `null` removes the key and never creates parents. Scalars in the way are
/// replaced by objects.
pub fn set_at(root: &mut Value, segments: &[String], value: Value) {
    let Some((last, parents)) = segments.split_last() else {
        *root = value;
        return;
    };

    let mut current = root;
    for segment in parents {
        let idx = array_index(current, segment);
        current = match (current, idx) {
            (Value::Array(values), Some(i)) => &mut values[i],
            (other, _) => {
                if value.is_null() {
                    match other.as_object_mut().and_then(|map| map.get_mut(segment)) {
                        Some(child) => child,
                        None => return,
                    }
                } else {
                    if !other.is_object() {
                        *other = Value::Object(Map::new());
                    }
                    let Value::Object(map) = other else {
                        return;
                    };
                    map.entry(segment.clone())
                        .or_insert_with(|| Value::Object(Map::new()))
                }
            }
        };
    }

    let idx = array_index(current, last);
    match (current, idx) {
        (Value::Array(values), Some(i)) => values[i] = value,
        (other, _) => {
            if !other.is_object() {
                if value.is_null() {
                    return;
                }
                *other = Value::Object(Map::new());
            }
            if let Value::Object(map) = other {
                if value.is_null() {
                    map.remove(last);
                } else {
                    map.insert(last.clone(), value);
                }
            }
        }
    }
}

fn array_index(value: &Value, segment: &str) -> Option<usize> {
    match value {
        Value::Array(values) => segment.parse::<usize>().ok().filter(|i| *i < values.len()),
        _ => None,
    }
}
