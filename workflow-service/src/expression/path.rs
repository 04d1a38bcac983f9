// Path Resolution
// Walks dotted field paths through nested JSON data

use serde_json::Value;

/// Resolve a dotted path such as `user.address.city` or `items.0.name`.
///
/// Returns `None` as soon as a segment is missing. An empty path yields the
/// value itself. A leading `input` segment refers to the root when the root
/// has no `input` key of its own.
pub fn resolve_path<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    let path = path.trim();
    if path.is_empty() {
        return Some(value);
    }

    let mut segments = path.split('.').peekable();
    if segments.peek() == Some(&"input") && value.get("input").is_none() {
        segments.next();
    }

    segments.try_fold(value, |current, segment| step(current, segment.trim()))
}

/// Resolve a path and treat null the same as absent
pub fn resolve_present<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    resolve_path(value, path).filter(|v| !v.is_null())
}

fn step<'v>(current: &'v Value, segment: &str) -> Option<&'v Value> {
    match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}
