use std::cmp::Ordering;

use leafdb_core::{Document, LeafError};
use serde_json::Value;
use tracing::{trace, warn};

/// Operators that a query may name but the evaluator does not implement.
/// As top-level keys they are treated as ordinary field paths and never match.
const UNSUPPORTED_OPERATORS: &[&str] = &[
    "$and", "$or", "$not", "$nor", "$where", "$elemMatch", "$size",
];

/// Comparison operator inside an operator object (`{"age": {"$gt": 29}}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Nin,
    Exists,
}

impl Operator {
    /// Parse an operator key such as `$gte`. Unknown keys yield `None`.
    pub fn parse(key: &str) -> Option<Self> {
        Some(match key {
            "$eq" => Operator::Eq,
            "$ne" => Operator::Ne,
            "$gt" => Operator::Gt,
            "$gte" => Operator::Gte,
            "$lt" => Operator::Lt,
            "$lte" => Operator::Lte,
            "$in" => Operator::In,
            "$nin" => Operator::Nin,
            "$exists" => Operator::Exists,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "$eq",
            Operator::Ne => "$ne",
            Operator::Gt => "$gt",
            Operator::Gte => "$gte",
            Operator::Lt => "$lt",
            Operator::Lte => "$lte",
            Operator::In => "$in",
            Operator::Nin => "$nin",
            Operator::Exists => "$exists",
        }
    }

    /// Test a resolved document value against `operand`. `None` is a missing
    /// field, which never satisfies an ordering comparison.
    pub fn evaluate(&self, value: Option<&Value>, operand: &Value) -> bool {
        match self {
            Operator::Eq => value.is_some_and(|v| strict_eq(v, operand)),
            Operator::Ne => !value.is_some_and(|v| strict_eq(v, operand)),
            Operator::Gt => ordering(value, operand).is_some_and(|o| o == Ordering::Greater),
            Operator::Gte => ordering(value, operand).is_some_and(|o| o != Ordering::Less),
            Operator::Lt => ordering(value, operand).is_some_and(|o| o == Ordering::Less),
            Operator::Lte => ordering(value, operand).is_some_and(|o| o != Ordering::Greater),
            Operator::In => match operand {
                Value::Array(items) => value.is_some_and(|v| contains(items, v)),
                _ => false,
            },
            Operator::Nin => match operand {
                Value::Array(items) => !value.is_some_and(|v| contains(items, v)),
                _ => false,
            },
            Operator::Exists => value.is_some() == is_truthy(operand),
        }
    }
}

/// Condition attached to one field path, classified once when the filter is
/// built.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Field equals the value.
    Literal(Value),
    /// Field equals one of the values.
    Membership(Vec<Value>),
    /// Every operator must hold.
    Operators(Vec<(Operator, Value)>),
}

impl FilterValue {
    /// Classify a raw JSON condition: objects are operator objects, arrays
    /// are membership sets, everything else is a literal.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(obj) => FilterValue::Operators(
                obj.into_iter()
                    .filter_map(|(key, operand)| match Operator::parse(&key) {
                        Some(op) => Some((op, operand)),
                        None => {
                            trace!(operator = %key, "ignoring unrecognized operator");
                            None
                        }
                    })
                    .collect(),
            ),
            Value::Array(items) => FilterValue::Membership(items),
            literal => FilterValue::Literal(literal),
        }
    }

    pub fn matches(&self, value: Option<&Value>) -> bool {
        match self {
            FilterValue::Literal(expected) => value.is_some_and(|v| strict_eq(v, expected)),
            FilterValue::Membership(items) => value.is_some_and(|v| contains(items, v)),
            FilterValue::Operators(ops) => ops.iter().all(|(op, operand)| op.evaluate(value, operand)),
        }
    }
}

/// A query: field paths mapped to conditions, combined with AND.
///
/// Composite operators (`$and`, `$or`, `$not`, `$nor`, `$where`,
/// `$elemMatch`, `$size`) are not supported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub fields: Vec<(String, FilterValue)>,
}

impl Filter {
    /// Create an empty filter that matches all documents.
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Parse a JSON query object such as
    /// `{"age": {"$gte": 18}, "role": ["admin", "owner"], "address.city": "NYC"}`.
    pub fn from_json(query: Value) -> Result<Self, LeafError> {
        let Value::Object(obj) = query else {
            return Err(LeafError::InvalidDocument(
                "filter must be a JSON object".to_string(),
            ));
        };

        let fields = obj
            .into_iter()
            .map(|(path, condition)| {
                if UNSUPPORTED_OPERATORS.contains(&path.as_str()) {
                    warn!(operator = %path, "unsupported composite operator, treated as a field path");
                }
                (path, FilterValue::from_json(condition))
            })
            .collect();

        Ok(Self { fields })
    }

    /// Add a condition for a field path.
    pub fn field(mut self, path: impl Into<String>, condition: FilterValue) -> Self {
        self.fields.push((path.into(), condition));
        self
    }

    fn op(self, path: impl Into<String>, op: Operator, operand: Value) -> Self {
        self.field(path, FilterValue::Operators(vec![(op, operand)]))
    }

    /// Field equals `value`.
    pub fn eq(self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.field(path, FilterValue::Literal(value.into()))
    }

    pub fn ne(self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.op(path, Operator::Ne, value.into())
    }

    pub fn gt(self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.op(path, Operator::Gt, value.into())
    }

    pub fn gte(self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.op(path, Operator::Gte, value.into())
    }

    pub fn lt(self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.op(path, Operator::Lt, value.into())
    }

    pub fn lte(self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.op(path, Operator::Lte, value.into())
    }

    /// Field equals one of `values`.
    pub fn in_values(self, path: impl Into<String>, values: Vec<Value>) -> Self {
        self.field(path, FilterValue::Membership(values))
    }

    pub fn nin(self, path: impl Into<String>, values: Vec<Value>) -> Self {
        self.op(path, Operator::Nin, Value::Array(values))
    }

    pub fn exists(self, path: impl Into<String>, exists: bool) -> Self {
        self.op(path, Operator::Exists, Value::Bool(exists))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Test if a document matches this filter. Stops at the first failing
    /// condition.
    pub fn matches(&self, doc: &Document) -> bool {
        self.fields
            .iter()
            .all(|(path, condition)| condition.matches(doc.get_path(path)))
    }
}

/// Equality where numbers compare by value (`30 == 30.0`) and containers
/// compare element-wise.
pub fn strict_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| strict_eq(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter().all(|(k, v)| y.get(k).is_some_and(|w| strict_eq(v, w)))
        }
        _ => a == b,
    }
}

fn contains(items: &[Value], value: &Value) -> bool {
    items.iter().any(|item| strict_eq(item, value))
}

fn ordering(value: Option<&Value>, operand: &Value) -> Option<Ordering> {
    match (value?, operand) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn person() -> Document {
        Document::from_value(json!({
            "id": "p1",
            "name": "Alice",
            "age": 30,
            "active": true,
            "score": null,
            "address": { "city": "NYC", "zip": "10001" },
            "tags": ["admin", "ops"]
        }))
        .unwrap()
    }

    fn query(value: Value) -> Filter {
        Filter::from_json(value).unwrap()
    }

    #[test]
    fn test_comparison_laws_on_age() {
        let doc = person();
        assert!(query(json!({ "age": { "$gt": 29 } })).matches(&doc));
        assert!(!query(json!({ "age": { "$gt": 30 } })).matches(&doc));
        assert!(query(json!({ "age": { "$gte": 30 } })).matches(&doc));
        assert!(query(json!({ "age": { "$lt": 31 } })).matches(&doc));
        assert!(!query(json!({ "age": { "$lte": 29 } })).matches(&doc));
        assert!(query(json!({ "age": { "$in": [30, 31] } })).matches(&doc));
        assert!(!query(json!({ "age": { "$nin": [30] } })).matches(&doc));
    }

    #[test]
    fn test_exists() {
        let doc = person();
        assert!(query(json!({ "nickname": { "$exists": false } })).matches(&doc));
        assert!(!query(json!({ "nickname": { "$exists": true } })).matches(&doc));
        // A stored null is defined.
        assert!(query(json!({ "score": { "$exists": true } })).matches(&doc));
    }

    #[test]
    fn test_missing_field_never_orders() {
        let doc = person();
        for op in ["$gt", "$gte", "$lt", "$lte"] {
            assert!(!query(json!({ "height": { op: 0 } })).matches(&doc), "{op}");
        }
        assert!(query(json!({ "height": { "$ne": 0 } })).matches(&doc));
        assert!(!query(json!({ "height": { "$eq": null } })).matches(&doc));
        assert!(query(json!({ "height": { "$nin": [1, 2] } })).matches(&doc));
        assert!(!query(json!({ "height": { "$in": [1, 2] } })).matches(&doc));
    }

    #[test]
    fn test_literal_and_membership() {
        let doc = person();
        assert!(query(json!({ "name": "Alice" })).matches(&doc));
        assert!(!query(json!({ "name": "Bob" })).matches(&doc));
        assert!(query(json!({ "name": ["Bob", "Alice"] })).matches(&doc));
        assert!(!query(json!({ "name": ["Bob"] })).matches(&doc));
        assert!(query(json!({ "score": null })).matches(&doc));
        assert!(!query(json!({ "missing": null })).matches(&doc));
    }

    #[test]
    fn test_nested_paths() {
        let doc = person();
        assert!(query(json!({ "address.city": "NYC" })).matches(&doc));
        assert!(query(json!({ "tags.0": "admin" })).matches(&doc));
        assert!(query(json!({ "address.zip": { "$gte": "10000", "$lt": "20000" } })).matches(&doc));
        assert!(!query(json!({ "address.city.name": { "$exists": true } })).matches(&doc));
    }

    #[test]
    fn test_operators_are_and_combined() {
        let doc = person();
        assert!(query(json!({ "age": { "$gt": 18, "$lt": 40 } })).matches(&doc));
        assert!(!query(json!({ "age": { "$gt": 18, "$lt": 20 } })).matches(&doc));
        assert!(!query(json!({ "age": 30, "name": "Bob" })).matches(&doc));
    }

    #[test]
    fn test_unknown_operator_keys_are_ignored() {
        let doc = person();
        assert!(query(json!({ "age": { "$regex": "^3", "$gt": 1 } })).matches(&doc));
        // An operator object with no known operators matches everything.
        assert!(query(json!({ "age": { "$size": 1 } })).matches(&doc));
    }

    #[test]
    fn test_composite_operators_do_not_match() {
        let doc = person();
        assert!(!query(json!({ "$or": [{ "age": 30 }] })).matches(&doc));
    }

    #[test]
    fn test_numeric_equality_ignores_representation() {
        let doc = person();
        assert!(query(json!({ "age": 30.0 })).matches(&doc));
        assert!(query(json!({ "age": { "$in": [30.0] } })).matches(&doc));
    }

    #[test]
    fn test_mixed_type_ordering_does_not_match() {
        let doc = person();
        assert!(!query(json!({ "age": { "$gt": "20" } })).matches(&doc));
        assert!(!query(json!({ "name": { "$lt": 5 } })).matches(&doc));
    }

    #[test]
    fn test_builder_matches_json_form() {
        let doc = person();
        let built = Filter::new()
            .eq("name", "Alice")
            .gte("age", 30)
            .in_values("tags.1", vec![json!("ops")])
            .exists("nickname", false);
        assert!(built.matches(&doc));
        assert!(!Filter::new().ne("name", "Alice").matches(&doc));
        assert!(Filter::new().matches(&doc));
    }

    #[test]
    fn test_non_object_filter_is_rejected() {
        assert!(Filter::from_json(json!([1])).is_err());
    }

    #[test]
    fn test_classification() {
        assert_eq!(FilterValue::from_json(json!(1)), FilterValue::Literal(json!(1)));
        assert_eq!(
            FilterValue::from_json(json!([1, 2])),
            FilterValue::Membership(vec![json!(1), json!(2)])
        );
        assert_eq!(
            FilterValue::from_json(json!({ "$gt": 1, "$bogus": 2 })),
            FilterValue::Operators(vec![(Operator::Gt, json!(1))])
        );
    }
}
