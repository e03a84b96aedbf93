//! Normalization of the response envelopes the commerce API returns.
//!
//! Endpoints are inconsistent: some answer with a bare array, others wrap it
//! in `data`, `items`, `results` or a resource-named key, sometimes one level
//! deeper. Everything here is infallible. A shape that cannot be understood
//! yields an empty list or `None`.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

/// Keys probed, in order, for a wrapped list.
const LIST_KEYS: &[&str] = &["data", "items", "results", "products", "reviews", "orders"];

/// Keys probed, in order, for a wrapped single object.
const OBJECT_KEYS: &[&str] = &["data", "item"];

/// Containers that may hold pagination fields.
const META_KEYS: &[&str] = &["meta", "pagination"];

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// A page holding exactly `items` and nothing else.
    #[must_use]
    pub fn single(items: Vec<T>) -> Self {
        let len = items.len() as u64;
        Self {
            items,
            total: len,
            page: 1,
            limit: len.max(1),
            total_pages: u64::from(len > 0),
        }
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::single(Vec::new())
    }
}

/// Locate the array inside an envelope.
fn find_array(value: &Value) -> Option<&Vec<Value>> {
    if let Some(array) = value.as_array() {
        return Some(array);
    }
    let object = value.as_object()?;

    for key in LIST_KEYS {
        if let Some(Value::Array(array)) = object.get(*key) {
            return Some(array);
        }
    }
    // One level deeper, e.g. `{"data": {"items": [...]}}`.
    for key in LIST_KEYS {
        if let Some(Value::Object(inner)) = object.get(*key) {
            for inner_key in LIST_KEYS {
                if let Some(Value::Array(array)) = inner.get(*inner_key) {
                    return Some(array);
                }
            }
        }
    }
    None
}

/// Extract a list of `T`, skipping elements that do not deserialize.
#[must_use]
pub fn list<T: DeserializeOwned>(value: &Value) -> Vec<T> {
    let Some(array) = find_array(value) else {
        if !value.is_null() {
            warn!(shape = shape_of(value), "Response did not contain a list");
        }
        return Vec::new();
    };

    array
        .iter()
        .enumerate()
        .filter_map(|(index, element)| match T::deserialize(element) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(index, error = %e, "Skipping malformed list element");
                None
            }
        })
        .collect()
}

fn get_u64(object: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|key| {
        let value = object.get(*key)?;
        value
            .as_u64()
            .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
    })
}

/// Find a pagination field at the top level, under `data`, or in a meta block.
fn pagination_field(value: &Value, keys: &[&str]) -> Option<u64> {
    let object = value.as_object()?;
    let mut scopes = vec![object];
    if let Some(Value::Object(data)) = object.get("data") {
        scopes.push(data);
    }
    for meta in META_KEYS {
        if let Some(Value::Object(inner)) = object.get(*meta) {
            scopes.push(inner);
        }
    }
    scopes.into_iter().find_map(|scope| get_u64(scope, keys))
}

/// Extract a page of `T` with whatever pagination the envelope carries.
///
/// Missing figures are derived from the items: the total defaults to the item
/// count, the page to 1 and the limit to `requested_limit` or the item count.
#[must_use]
pub fn page<T: DeserializeOwned>(value: &Value, requested_limit: Option<u64>) -> Page<T> {
    let items: Vec<T> = list(value);
    let count = items.len() as u64;

    let total = pagination_field(value, &["total", "totalCount", "count"]).unwrap_or(count);
    let page = pagination_field(value, &["page", "currentPage"])
        .unwrap_or(1)
        .max(1);
    let limit = pagination_field(value, &["limit", "pageSize", "perPage"])
        .or(requested_limit)
        .unwrap_or(count)
        .max(1);
    let total_pages = pagination_field(value, &["totalPages", "pages"])
        .unwrap_or_else(|| total.div_ceil(limit));

    Page {
        items,
        total,
        page,
        limit,
        total_pages,
    }
}

/// Extract a single `T` from `data`, `item`, one of `named`, or the bare body.
///
/// `named` keys are also probed inside `data`, so `{"data": {"user": {...}}}`
/// resolves with `named = &["user"]`.
#[must_use]
pub fn single<T: DeserializeOwned>(value: &Value, named: &[&str]) -> Option<T> {
    let object = value.as_object()?;

    let mut candidates: Vec<&Value> = Vec::new();
    for key in named {
        if let Some(inner) = object.get(*key) {
            candidates.push(inner);
        }
    }
    if let Some(Value::Object(data)) = object.get("data") {
        for key in named {
            if let Some(inner) = data.get(*key) {
                candidates.push(inner);
            }
        }
    }
    for key in OBJECT_KEYS {
        if let Some(inner) = object.get(*key) {
            candidates.push(inner);
        }
    }
    candidates.push(value);

    let found = candidates
        .into_iter()
        .filter(|c| c.is_object())
        .find_map(|candidate| T::deserialize(candidate).ok());
    if found.is_none() {
        warn!(shape = shape_of(value), "Response did not contain the expected object");
    }
    found
}

/// Machine code and human message from an error body.
///
/// Understands `{message, code}`, `{error: "..."}` and
/// `{error: {message, code}}`.
#[must_use]
pub fn error_details(value: &Value) -> (Option<String>, Option<String>) {
    let text = |v: Option<&Value>| -> Option<String> {
        match v? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    };

    let Some(object) = value.as_object() else {
        return (None, None);
    };

    match object.get("error") {
        Some(Value::Object(inner)) => (
            text(inner.get("code")),
            text(inner.get("message")).or_else(|| text(object.get("message"))),
        ),
        Some(error @ Value::String(_)) => (
            text(object.get("code")),
            text(object.get("message")).or_else(|| text(Some(error))),
        ),
        _ => (text(object.get("code")), text(object.get("message"))),
    }
}

/// Short description of a JSON value's shape, for logs.
fn shape_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: u32,
    }

    fn ids(items: &[Item]) -> Vec<u32> {
        items.iter().map(|i| i.id).collect()
    }

    #[test]
    fn test_list_shapes() {
        let shapes = [
            json!([{"id": 1}, {"id": 2}]),
            json!({"data": [{"id": 1}, {"id": 2}]}),
            json!({"products": [{"id": 1}, {"id": 2}], "total": 2}),
            json!({"data": {"items": [{"id": 1}, {"id": 2}]}}),
            json!({"data": {"count": 2}, "results": [{"id": 1}, {"id": 2}]}),
        ];
        for shape in shapes {
            assert_eq!(ids(&list::<Item>(&shape)), vec![1, 2], "shape: {shape}");
        }
    }

    #[test]
    fn test_list_skips_bad_elements() {
        let body = json!({"items": [{"id": 1}, {"id": "nope"}, {"name": "x"}, {"id": 4}]});
        assert_eq!(ids(&list::<Item>(&body)), vec![1, 4]);
    }

    #[test]
    fn test_list_unrecognized_is_empty() {
        assert!(list::<Item>(&json!({"unexpected": true})).is_empty());
        assert!(list::<Item>(&json!("text")).is_empty());
        assert!(list::<Item>(&Value::Null).is_empty());
    }

    #[test]
    fn test_page_reads_meta() {
        let body = json!({
            "data": [{"id": 1}],
            "meta": {"total": "41", "page": 3, "pageSize": 20}
        });
        let page: Page<Item> = page(&body, None);
        assert_eq!(page.total, 41);
        assert_eq!(page.page, 3);
        assert_eq!(page.limit, 20);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn test_page_derives_missing_fields() {
        let body = json!([{"id": 1}, {"id": 2}, {"id": 3}]);
        let page: Page<Item> = page(&body, Some(2));
        assert_eq!(page.total, 3);
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 2);
        assert_eq!(page.total_pages, 2);

        let empty: Page<Item> = super::page(&json!({}), None);
        assert_eq!(empty.total_pages, 0);
        assert_eq!(empty.limit, 1);
    }

    #[test]
    fn test_single_shapes() {
        let shapes = [
            json!({"id": 7}),
            json!({"data": {"id": 7}}),
            json!({"item": {"id": 7}}),
            json!({"product": {"id": 7}}),
            json!({"data": {"product": {"id": 7}}}),
            json!({"success": true, "data": {"id": 7}}),
        ];
        for shape in shapes {
            assert_eq!(single::<Item>(&shape, &["product"]), Some(Item { id: 7 }), "shape: {shape}");
        }
    }

    #[test]
    fn test_single_failure_is_none() {
        assert_eq!(single::<Item>(&json!({"data": {"name": "x"}}), &[]), None);
        assert_eq!(single::<Item>(&json!([{"id": 1}]), &[]), None);
        assert_eq!(single::<Item>(&Value::Null, &[]), None);
    }

    #[test]
    fn test_error_details() {
        assert_eq!(
            error_details(&json!({"message": "Out of stock", "code": "OUT_OF_STOCK"})),
            (Some("OUT_OF_STOCK".into()), Some("Out of stock".into()))
        );
        assert_eq!(
            error_details(&json!({"error": "Invalid code"})),
            (None, Some("Invalid code".into()))
        );
        assert_eq!(
            error_details(&json!({"error": {"message": "Expired", "code": 4012}})),
            (Some("4012".into()), Some("Expired".into()))
        );
        assert_eq!(error_details(&json!("plain")), (None, None));
        assert_eq!(error_details(&json!({"message": ""})), (None, None));
    }
}
