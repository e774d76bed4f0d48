use serde_json::Value;

/// Items of a list response.
///
/// The backend answers list endpoints either with a bare JSON array or with a
/// paginated object whose `results` field holds the array. Any other shape
/// yields an empty list.
///
/// ```
/// use crm_api_executor::list_items;
/// use serde_json::json;
///
/// assert_eq!(list_items(json!([1, 2])), vec![json!(1), json!(2)]);
/// assert_eq!(list_items(json!({"count": 1, "results": [3]})), vec![json!(3)]);
/// assert!(list_items(json!({"detail": "nothing"})).is_empty());
/// ```
pub fn list_items(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("results") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}
