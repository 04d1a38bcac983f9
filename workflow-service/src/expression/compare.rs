// Value Semantics
// Truthiness, coercion, loose/strict equality and the named comparison operators

use serde_json::Value;

use std::cmp::Ordering;

/// Falsy: null, false, 0, NaN and "". Everything else is truthy,
/// including empty arrays and objects.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Numeric coercion. Unparseable text gives NaN.
pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => parse_number(s),
        Value::Array(_) | Value::Object(_) => parse_number(&to_text(value)),
    }
}

fn parse_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    if !trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
    {
        return f64::NAN;
    }

    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// Format a number the way a script would print it
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i128)
    } else {
        format!("{}", n)
    }
}

/// Text coercion. Arrays join their elements with commas and objects print
/// as `[object Object]`.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i.to_string(),
            None => format_number(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => to_text(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Text used when rendering a value into a template: strings raw,
/// everything else as JSON.
pub fn to_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_primitive(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

/// Type-coercing equality (`==`). Arrays and objects compare structurally.
pub fn loose_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Bool(_), _) | (_, Value::Bool(_)) => {
            if let (Value::Bool(a), Value::Bool(b)) = (left, right) {
                return a == b;
            }
            number_equals(to_number(left), to_number(right))
        }
        (Value::Number(_), Value::Number(_) | Value::String(_))
        | (Value::String(_), Value::Number(_)) => {
            number_equals(to_number(left), to_number(right))
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| loose_equals(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(k, v)| b.get(k).map(|w| loose_equals(v, w)).unwrap_or(false))
        }
        (composite, primitive) | (primitive, composite) if is_primitive(primitive) => {
            loose_equals(&Value::String(to_text(composite)), primitive)
        }
        _ => false,
    }
}

/// Type-strict equality (`===`). Arrays and objects compare structurally.
pub fn strict_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(_), Value::Number(_)) => number_equals(to_number(left), to_number(right)),
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| strict_equals(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(k, v)| b.get(k).map(|w| strict_equals(v, w)).unwrap_or(false))
        }
        _ => false,
    }
}

fn number_equals(a: f64, b: f64) -> bool {
    !a.is_nan() && !b.is_nan() && a == b
}

/// Relational ordering. Two strings compare lexicographically, anything else
/// numerically. `None` when either side is NaN.
fn relational(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => to_number(left).partial_cmp(&to_number(right)),
    }
}

/// Named comparison operators used by branch nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Equals,
    NotEquals,
    Greater,
    GreaterEquals,
    Less,
    LessEquals,
    Contains,
    StartsWith,
    EndsWith,
}

impl CompareOp {
    pub fn parse(name: &str) -> Option<Self> {
        let op = match name {
            "equals" => CompareOp::Equals,
            "not_equals" => CompareOp::NotEquals,
            "greater" => CompareOp::Greater,
            "greater_equals" => CompareOp::GreaterEquals,
            "less" => CompareOp::Less,
            "less_equals" => CompareOp::LessEquals,
            "contains" => CompareOp::Contains,
            "starts_with" => CompareOp::StartsWith,
            "ends_with" => CompareOp::EndsWith,
            _ => return None,
        };
        Some(op)
    }

    /// Apply the operator. An absent left side equals only null and never
    /// orders against anything; it prints as `undefined`.
    pub fn apply(self, left: Option<&Value>, right: &Value) -> bool {
        let left = match left {
            Some(value) => value,
            None => return self.apply_absent(right),
        };

        match self {
            CompareOp::Equals => loose_equals(left, right),
            CompareOp::NotEquals => !loose_equals(left, right),
            CompareOp::Greater => relational(left, right) == Some(Ordering::Greater),
            CompareOp::GreaterEquals => matches!(
                relational(left, right),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            CompareOp::Less => relational(left, right) == Some(Ordering::Less),
            CompareOp::LessEquals => matches!(
                relational(left, right),
                Some(Ordering::Less | Ordering::Equal)
            ),
            CompareOp::Contains => to_text(left).contains(&to_text(right)),
            CompareOp::StartsWith => to_text(left).starts_with(&to_text(right)),
            CompareOp::EndsWith => to_text(left).ends_with(&to_text(right)),
        }
    }

    fn apply_absent(self, right: &Value) -> bool {
        const UNDEFINED: &str = "undefined";
        match self {
            CompareOp::Equals => right.is_null(),
            CompareOp::NotEquals => !right.is_null(),
            CompareOp::Greater
            | CompareOp::GreaterEquals
            | CompareOp::Less
            | CompareOp::LessEquals => false,
            CompareOp::Contains => UNDEFINED.contains(&to_text(right)),
            CompareOp::StartsWith => UNDEFINED.starts_with(&to_text(right)),
            CompareOp::EndsWith => UNDEFINED.ends_with(&to_text(right)),
        }
    }
}

/// Compare two values with a named operator. `left` is `None` when the
/// field it was read from is missing. Unknown operators yield false.
pub fn compare(left: Option<&Value>, right: &Value, operator: &str) -> bool {
    CompareOp::parse(operator)
        .map(|op| op.apply(left, right))
        .unwrap_or(false)
}

/// Check a value against a type name: string, number, boolean, object or
/// array. `object` excludes arrays and null. Unknown names yield false.
pub fn check_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        _ => false,
    }
}
