//! Traversal helpers over a serialized OpenAPI document.
//!
//! Passes operate on the JSON form of the document rather than on typed
//! structs, so every pass sees the same homogeneous node shape regardless of
//! which builder produced the document.

use serde_json::{Map, Value};

/// HTTP methods that may key an operation inside a path item.
pub const OPERATION_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Visit every operation in the document, yielding the path, the lowercase
/// method key, and the mutable operation object.
pub fn visit_operations_mut<F>(doc: &mut Value, mut visit: F)
where
    F: FnMut(&str, &str, &mut Value),
{
    let Some(paths) = doc.get_mut("paths").and_then(Value::as_object_mut) else {
        return;
    };
    for (path, item) in paths {
        let Some(item) = item.as_object_mut() else {
            continue;
        };
        for method in OPERATION_METHODS {
            if let Some(operation) = item.get_mut(method) {
                if operation.is_object() {
                    visit(path, method, operation);
                }
            }
        }
    }
}

/// Visit every JSON object reachable from `node` in depth-first order,
/// parents before children. This is how passes reach schema-like nodes
/// wherever they occur: component schemas, parameters, request bodies,
/// response content, and nested properties/items/composites.
pub fn visit_objects_mut<F>(node: &mut Value, visit: &mut F)
where
    F: FnMut(&mut Map<String, Value>),
{
    match node {
        Value::Object(map) => {
            visit(map);
            for (_, child) in map {
                visit_objects_mut(child, visit);
            }
        }
        Value::Array(items) => {
            for item in items {
                visit_objects_mut(item, visit);
            }
        }
        _ => {}
    }
}

/// Prepend `prefix` to an operation's description, creating the field when
/// absent. No-op when the description already contains the prefix anywhere:
/// a later run's notice may sit behind notices other passes prepended in the
/// meantime, so a starts-with check would stack copies.
pub fn prepend_description(operation: &mut Value, prefix: &str) {
    let existing = operation
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if existing.contains(prefix) {
        return;
    }
    let combined = if existing.is_empty() {
        prefix.to_string()
    } else {
        format!("{prefix}\n\n{existing}")
    };
    operation["description"] = Value::String(combined);
}

/// Derive an operation id from the method and path: `PATCH::invoices-id-send`
/// for `PATCH /invoices/{id}/send`.
#[must_use]
pub fn synthesize_operation_id(method: &str, path: &str) -> String {
    let slug: String = path
        .chars()
        .filter(|c| *c != '{' && *c != '}')
        .map(|c| if c == '/' { '-' } else { c })
        .collect();
    let slug = slug.trim_matches('-');
    format!("{}::{slug}", method.to_uppercase())
}
