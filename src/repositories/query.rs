use serde::Serialize;
use serde_json::Value;

/// One entry of the backend's `queries[]` list, serialised as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    attribute: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    values: Vec<Value>,
}

impl Query {
    pub(super) fn new(method: &'static str, attribute: Option<&str>, values: Vec<Value>) -> Self {
        Self {
            method,
            attribute: attribute.map(str::to_string),
            values,
        }
    }

    pub fn equal(attribute: &str, value: impl Into<Value>) -> Self {
        Self::new("equal", Some(attribute), vec![value.into()])
    }

    pub fn search(attribute: &str, term: &str) -> Self {
        Self::new("search", Some(attribute), vec![Value::from(term)])
    }

    pub fn order_desc(attribute: &str) -> Self {
        Self::new("orderDesc", Some(attribute), Vec::new())
    }

    pub fn limit(limit: u32) -> Self {
        Self::new("limit", None, vec![Value::from(limit)])
    }

    pub fn cursor_after(document_id: &str) -> Self {
        Self::new("cursorAfter", None, vec![Value::from(document_id)])
    }

    pub fn method(&self) -> &str {
        self.method
    }

    pub fn attribute(&self) -> Option<&str> {
        self.attribute.as_deref()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Query-string pairs for a list request.
pub fn query_params(queries: &[Query]) -> Vec<(&'static str, String)> {
    queries
        .iter()
        .map(|query| ("queries[]", query.to_json()))
        .collect()
}
