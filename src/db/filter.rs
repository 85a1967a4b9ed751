use std::cmp::Ordering;

use serde_json::Value;

use super::Row;

/// Comparison applied by a [`Filter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Case-insensitive SQL `LIKE` pattern with `%` and `_` wildcards
    ILike,
}

impl FilterOp {
    /// SQL operator for ordinary comparisons
    pub fn sql(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Neq => "!=",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
            FilterOp::ILike => "LIKE",
        }
    }
}

/// Query predicate on one record field
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn new(field: &str, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.to_string(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }

    /// Evaluate against an in-memory row. A missing field reads as null.
    pub fn matches(&self, row: &Row) -> bool {
        let actual = row.get(&self.field).unwrap_or(&Value::Null);

        match self.op {
            FilterOp::Eq => values_equal(actual, &self.value),
            FilterOp::Neq => !values_equal(actual, &self.value),
            FilterOp::ILike => match (actual, &self.value) {
                (Value::String(text), Value::String(pattern)) => like(text, pattern),
                _ => false,
            },
            FilterOp::Gt => compare(actual, &self.value) == Some(Ordering::Greater),
            FilterOp::Gte => matches!(
                compare(actual, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOp::Lt => compare(actual, &self.value) == Some(Ordering::Less),
            FilterOp::Lte => matches!(
                compare(actual, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Numbers compare numerically, strings lexically; anything else is unordered
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Case-insensitive `LIKE` match
fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.to_lowercase().chars().collect();
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
    like_from(&text, &pattern)
}

fn like_from(text: &[char], pattern: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some(('%', rest)) => (0..=text.len()).any(|skip| like_from(&text[skip..], rest)),
        Some(('_', rest)) => !text.is_empty() && like_from(&text[1..], rest),
        Some((c, rest)) => text.first() == Some(c) && like_from(&text[1..], rest),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_comparisons() {
        let player = row(json!({"name": "Sory Kaba", "age": 28, "goals": 9}));

        assert!(Filter::eq("age", 28).matches(&player));
        assert!(Filter::new("age", FilterOp::Neq, 30).matches(&player));
        assert!(Filter::new("goals", FilterOp::Gte, 9).matches(&player));
        assert!(!Filter::new("goals", FilterOp::Gt, 9).matches(&player));
        assert!(Filter::new("age", FilterOp::Lt, 28.5).matches(&player));
        assert!(!Filter::new("name", FilterOp::Lte, 5).matches(&player));
    }

    #[test]
    fn test_ilike() {
        let player = row(json!({"name": "Iñigo Vicente"}));

        assert!(Filter::new("name", FilterOp::ILike, "%vicente").matches(&player));
        assert!(Filter::new("name", FilterOp::ILike, "iñigo%").matches(&player));
        assert!(Filter::new("name", FilterOp::ILike, "i_igo %").matches(&player));
        assert!(!Filter::new("name", FilterOp::ILike, "vicente").matches(&player));
    }

    #[test]
    fn test_missing_field_reads_as_null() {
        let status = row(json!({"data_type": "players"}));

        assert!(Filter::eq("error_message", Value::Null).matches(&status));
        assert!(!Filter::eq("error_message", "boom").matches(&status));
    }
}
