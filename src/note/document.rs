//! Mapping between stored JSON documents and note records.
//!
//! Decoding is lenient: optional fields fall back to defaults and bad field
//! values are reported as warnings instead of failing the whole document.
//! Only a document whose shape is unusable (non-object root, `items` that is
//! not a collection) fails outright.
//!
//! Encoding always materializes every field, so re-encoding a decoded
//! document is a fixed point.

use serde_json::{Map, Value, json};

use super::{LineItem, Note, NoteColor, NoteId, TodoItem, TodoList};
use crate::error::{NoteError, NoteResult};

pub const FIELD_COLOR: &str = "colorHex";
pub const FIELD_ITEMS: &str = "items";

/// A decoded value together with the problems that were recovered from.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    pub value: T,
    pub warnings: Vec<NoteError>,
}

impl<T> Decoded<T> {
    pub fn log_warnings(&self, path: &str) {
        for warning in &self.warnings {
            tracing::warn!(path = %path, "Recovered while decoding: {}", warning);
        }
    }
}

pub fn decode_note(
    id: &NoteId,
    document: &Value,
    fallback: NoteColor,
) -> NoteResult<Decoded<Note>> {
    let root = root_object(document)?;
    let mut warnings = Vec::new();

    let color = decode_color(root, fallback, &mut warnings);

    let mut items = Vec::new();
    for child in children(root.get(FIELD_ITEMS))? {
        let Some(fields) = child.as_object() else {
            warnings.push(NoteError::schema(format!("item is not an object: {child}")));
            continue;
        };

        let name = match fields.get("name").and_then(scalar_string) {
            Some(name) if !name.trim().is_empty() => name,
            _ => {
                warnings.push(NoteError::schema(format!("item without a name: {child}")));
                continue;
            }
        };

        items.push(LineItem {
            quantity: decode_quantity(fields.get("quantity"), &mut warnings),
            done: decode_bool(fields.get("done"), "done", false, &mut warnings),
            visible: decode_bool(fields.get("isVisible"), "isVisible", true, &mut warnings),
            name,
        });
    }

    Ok(Decoded {
        value: Note::with_items(id.clone(), color, items),
        warnings,
    })
}

pub fn encode_note(note: &Note) -> Value {
    let items: Vec<Value> = note
        .items
        .iter()
        .map(|item| {
            json!({
                "name": item.name,
                "quantity": item.quantity,
                "done": item.done,
                "isVisible": item.visible,
            })
        })
        .collect();

    json!({
        FIELD_COLOR: note.color.to_hex(),
        FIELD_ITEMS: items,
    })
}

pub fn decode_todo_list(
    id: &NoteId,
    document: &Value,
    fallback: NoteColor,
) -> NoteResult<Decoded<TodoList>> {
    let root = root_object(document)?;
    let mut warnings = Vec::new();

    let color = decode_color(root, fallback, &mut warnings);

    let mut items = Vec::new();
    for child in children(root.get(FIELD_ITEMS))? {
        let Some(fields) = child.as_object() else {
            warnings.push(NoteError::schema(format!("item is not an object: {child}")));
            continue;
        };

        let color_hex = fields
            .get(FIELD_COLOR)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        items.push(TodoItem {
            title: fields.get("title").and_then(scalar_string).unwrap_or_default(),
            note: fields.get("note").and_then(scalar_string).unwrap_or_default(),
            done: decode_bool(fields.get("done"), "done", false, &mut warnings),
            important: decode_bool(fields.get("important"), "important", false, &mut warnings),
            color_hex,
        });
    }

    Ok(Decoded {
        value: TodoList::with_items(id.clone(), color, items),
        warnings,
    })
}

pub fn encode_todo_list(list: &TodoList) -> Value {
    let items: Vec<Value> = list
        .items
        .iter()
        .map(|item| {
            let mut fields = Map::new();
            fields.insert("title".into(), json!(item.title));
            fields.insert("note".into(), json!(item.note));
            fields.insert("done".into(), json!(item.done));
            fields.insert("important".into(), json!(item.important));
            if let Some(hex) = &item.color_hex {
                fields.insert(FIELD_COLOR.into(), json!(hex));
            }
            Value::Object(fields)
        })
        .collect();

    json!({
        FIELD_COLOR: list.color.to_hex(),
        FIELD_ITEMS: items,
    })
}

fn root_object(document: &Value) -> NoteResult<&Map<String, Value>> {
    document
        .as_object()
        .ok_or_else(|| NoteError::schema(format!("document root is not an object: {document}")))
}

/// Children of a list field. Realtime stores hand back sparse arrays as
/// objects keyed by index, so both shapes are accepted.
fn children(field: Option<&Value>) -> NoteResult<Vec<&Value>> {
    match field {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(values)) => Ok(values.iter().filter(|v| !v.is_null()).collect()),
        Some(Value::Object(map)) => {
            let mut entries: Vec<(&String, &Value)> =
                map.iter().filter(|(_, v)| !v.is_null()).collect();
            entries.sort_by(|(a, _), (b, _)| match (a.parse::<u64>(), b.parse::<u64>()) {
                (Ok(a), Ok(b)) => a.cmp(&b),
                (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                (Err(_), Err(_)) => a.cmp(b),
            });
            Ok(entries.into_iter().map(|(_, v)| v).collect())
        }
        Some(other) => Err(NoteError::schema(format!(
            "'{FIELD_ITEMS}' is not a list: {other}"
        ))),
    }
}

fn decode_color(
    root: &Map<String, Value>,
    fallback: NoteColor,
    warnings: &mut Vec<NoteError>,
) -> NoteColor {
    match root.get(FIELD_COLOR) {
        None | Some(Value::Null) => fallback,
        Some(Value::String(hex)) => NoteColor::from_hex(hex).unwrap_or_else(|err| {
            warnings.push(err);
            fallback
        }),
        Some(other) => {
            warnings.push(NoteError::format(FIELD_COLOR, other));
            fallback
        }
    }
}

fn decode_quantity(value: Option<&Value>, warnings: &mut Vec<NoteError>) -> u32 {
    let parsed = match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    match parsed.and_then(|q| u32::try_from(q).ok()) {
        Some(quantity) => quantity,
        None => {
            let raw = value.map_or_else(|| "<missing>".to_string(), Value::to_string);
            warnings.push(NoteError::format("quantity", raw));
            0
        }
    }
}

fn decode_bool(
    value: Option<&Value>,
    field: &str,
    default: bool,
    warnings: &mut Vec<NoteError>,
) -> bool {
    match value {
        None | Some(Value::Null) => default,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => true,
        Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => false,
        Some(other) => {
            warnings.push(NoteError::format(field, other));
            default
        }
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
