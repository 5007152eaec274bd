//! # Filter Expression AST
//!
//! Field filters for store queries. Filters address fields by path and are
//! combined conjunctively by [`Query`](super::Query).

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::path;

/// Filter operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOperator {
    /// Equals
    #[serde(rename = "==")]
    Eq,

    /// Not equals (field must be present and non-null)
    #[serde(rename = "!=")]
    Neq,

    /// Greater than
    #[serde(rename = ">")]
    Gt,

    /// Greater than or equal
    #[serde(rename = ">=")]
    Gte,

    /// Less than
    #[serde(rename = "<")]
    Lt,

    /// Less than or equal
    #[serde(rename = "<=")]
    Lte,

    /// Value in list
    #[serde(rename = "in")]
    In,

    /// Array field contains value
    #[serde(rename = "array-contains")]
    ArrayContains,
}

impl FilterOperator {
    /// Get the operator string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "==",
            FilterOperator::Neq => "!=",
            FilterOperator::Gt => ">",
            FilterOperator::Gte => ">=",
            FilterOperator::Lt => "<",
            FilterOperator::Lte => "<=",
            FilterOperator::In => "in",
            FilterOperator::ArrayContains => "array-contains",
        }
    }
}

/// A filter expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterExpr {
    /// Field path to filter on
    pub field: String,

    /// Comparison operator
    pub operator: FilterOperator,

    /// Value to compare against
    pub value: Value,
}

impl FilterExpr {
    /// Create a new filter expression
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    /// Create an equality filter
    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOperator::Eq, value)
    }

    /// Create a not-equal filter
    pub fn neq(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOperator::Neq, value)
    }

    /// Create an "in list" filter
    pub fn in_list(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::new(field, FilterOperator::In, Value::Array(values))
    }

    /// Create an "array contains" filter
    pub fn array_contains(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOperator::ArrayContains, value)
    }

    /// Check if a document matches this filter
    ///
    /// A document missing the field never matches.
    pub fn matches(&self, doc: &Map<String, Value>) -> bool {
        let field_value = match path::resolve(doc, &self.field) {
            Some(v) => v,
            None => return false,
        };

        match self.operator {
            FilterOperator::Eq => field_value == &self.value,
            FilterOperator::Neq => !field_value.is_null() && field_value != &self.value,
            FilterOperator::Gt => range_cmp(field_value, &self.value) == Some(Ordering::Greater),
            FilterOperator::Gte => matches!(
                range_cmp(field_value, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOperator::Lt => range_cmp(field_value, &self.value) == Some(Ordering::Less),
            FilterOperator::Lte => matches!(
                range_cmp(field_value, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOperator::In => self
                .value
                .as_array()
                .map(|arr| arr.contains(field_value))
                .unwrap_or(false),
            FilterOperator::ArrayContains => field_value
                .as_array()
                .map(|arr| arr.contains(&self.value))
                .unwrap_or(false),
        }
    }
}

/// Range comparisons only hold between values of the same kind
fn range_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    if type_rank(a) != type_rank(b) {
        return None;
    }
    Some(compare_values(a, b))
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values used for sorting
///
/// Values of different kinds order by kind:
/// null < bool < number < string < array < map.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .unwrap_or(0.0)
            .partial_cmp(&b.as_f64().unwrap_or(0.0))
            .unwrap_or(Ordering::Equal),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Array(a), Value::Array(b)) => {
            for (x, y) in a.iter().zip(b.iter()) {
                let ord = compare_values(x, y);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            a.len().cmp(&b.len())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_eq_filter() {
        let filter = FilterExpr::eq("type", json!("build.submit"));

        assert!(filter.matches(&doc(json!({"type": "build.submit"}))));
        assert!(!filter.matches(&doc(json!({"type": "challenge.submit"}))));
        assert!(!filter.matches(&doc(json!({}))));
    }

    #[test]
    fn test_neq_skips_missing_and_null() {
        let filter = FilterExpr::neq("stream.streamAddress", json!(""));

        assert!(filter.matches(&doc(json!({"stream": {"streamAddress": "0xabc"}}))));
        assert!(!filter.matches(&doc(json!({"stream": {"streamAddress": ""}}))));
        assert!(!filter.matches(&doc(json!({"stream": {"streamAddress": null}}))));
        assert!(!filter.matches(&doc(json!({"stream": {}}))));
        assert!(!filter.matches(&doc(json!({}))));
    }

    #[test]
    fn test_in_filter() {
        let filter = FilterExpr::in_list("type", vec![json!("a"), json!("b")]);

        assert!(filter.matches(&doc(json!({"type": "a"}))));
        assert!(filter.matches(&doc(json!({"type": "b"}))));
        assert!(!filter.matches(&doc(json!({"type": "c"}))));
    }

    #[test]
    fn test_array_contains_filter() {
        let filter = FilterExpr::array_contains("coBuilders", json!("0x2"));

        assert!(filter.matches(&doc(json!({"coBuilders": ["0x1", "0x2"]}))));
        assert!(!filter.matches(&doc(json!({"coBuilders": ["0x1"]}))));
        assert!(!filter.matches(&doc(json!({"coBuilders": "0x2"}))));
    }

    #[test]
    fn test_range_filters_require_same_kind() {
        let gt = FilterExpr::new("timestamp", FilterOperator::Gt, json!(100));

        assert!(gt.matches(&doc(json!({"timestamp": 101}))));
        assert!(!gt.matches(&doc(json!({"timestamp": 100}))));
        assert!(!gt.matches(&doc(json!({"timestamp": "200"}))));

        let lte = FilterExpr::new("timestamp", FilterOperator::Lte, json!(100));
        assert!(lte.matches(&doc(json!({"timestamp": 100}))));
        assert!(!lte.matches(&doc(json!({"timestamp": 101}))));
    }

    #[test]
    fn test_compare_values_orders_kinds() {
        assert_eq!(compare_values(&json!(null), &json!(false)), Ordering::Less);
        assert_eq!(compare_values(&json!(5), &json!("5")), Ordering::Less);
        assert_eq!(compare_values(&json!(2), &json!(10)), Ordering::Less);
        assert_eq!(compare_values(&json!("b"), &json!("a")), Ordering::Greater);
    }

    #[test]
    fn test_operator_wire_names() {
        assert_eq!(
            serde_json::to_string(&FilterOperator::ArrayContains).unwrap(),
            "\"array-contains\""
        );
        assert_eq!(FilterOperator::Neq.as_str(), "!=");
    }
}
