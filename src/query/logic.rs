//! Portable logic expressions (a JsonLogic subset).
//!
//! This is the form filters travel in: inside the `f` URL parameter and in
//! the `advanced_filters` field of the search request body.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicOperator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    StartsWith,
    EndsWith,
    Proximity,
}

impl LogicOperator {
    const ALL: [LogicOperator; 10] = [
        LogicOperator::Eq,
        LogicOperator::Ne,
        LogicOperator::Lt,
        LogicOperator::Le,
        LogicOperator::Gt,
        LogicOperator::Ge,
        LogicOperator::In,
        LogicOperator::StartsWith,
        LogicOperator::EndsWith,
        LogicOperator::Proximity,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LogicOperator::Eq => "==",
            LogicOperator::Ne => "!=",
            LogicOperator::Lt => "<",
            LogicOperator::Le => "<=",
            LogicOperator::Gt => ">",
            LogicOperator::Ge => ">=",
            LogicOperator::In => "in",
            LogicOperator::StartsWith => "startsWith",
            LogicOperator::EndsWith => "endsWith",
            LogicOperator::Proximity => "proximity",
        }
    }

    pub fn parse(token: &str) -> Option<LogicOperator> {
        Self::ALL.into_iter().find(|op| op.as_str() == token)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogicExpression {
    And(Vec<LogicExpression>),
    Or(Vec<LogicExpression>),
    /// `{"!": x}`
    Not(Box<LogicExpression>),
    /// `{"!!": x}`
    Truthy(Box<LogicExpression>),
    Compare(LogicOperator, Vec<LogicExpression>),
    Var(String),
    Literal(Value),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogicError {
    #[error("{path}: expected a single-key object, found {found}")]
    NotAnOperation { path: String, found: String },
    #[error("{path}: unsupported operator '{operator}'")]
    UnsupportedOperator { path: String, operator: String },
    #[error("{path}: '{operator}' expects {expected}")]
    BadOperands {
        path: String,
        operator: String,
        expected: &'static str,
    },
    #[error("{path}: operations nested deeper than {limit} levels")]
    TooDeep { path: String, limit: usize },
}

/// Deepest operation nesting `from_value` accepts.
pub const MAX_DEPTH: usize = 64;

impl LogicExpression {
    pub fn var(field: impl Into<String>) -> Self {
        LogicExpression::Var(field.into())
    }

    pub fn text(value: impl Into<String>) -> Self {
        LogicExpression::Literal(Value::String(value.into()))
    }

    pub fn to_value(&self) -> Value {
        match self {
            LogicExpression::And(children) => operation("and", array(children)),
            LogicExpression::Or(children) => operation("or", array(children)),
            LogicExpression::Not(inner) => operation("!", inner.to_value()),
            LogicExpression::Truthy(inner) => operation("!!", inner.to_value()),
            LogicExpression::Compare(op, args) => operation(op.as_str(), array(args)),
            LogicExpression::Var(field) => operation("var", Value::String(field.clone())),
            LogicExpression::Literal(value) => value.clone(),
        }
    }

    pub fn from_value(value: &Value) -> Result<Self, LogicError> {
        parse_value(value, "$", 0)
    }

    /// False for `and` / `or` groups with no clause at any depth.
    pub fn has_clauses(&self) -> bool {
        match self {
            LogicExpression::And(children) | LogicExpression::Or(children) => {
                children.iter().any(LogicExpression::has_clauses)
            }
            _ => true,
        }
    }
}

fn operation(key: &str, operand: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), operand);
    Value::Object(map)
}

fn array(children: &[LogicExpression]) -> Value {
    Value::Array(children.iter().map(LogicExpression::to_value).collect())
}

fn parse_value(value: &Value, path: &str, depth: usize) -> Result<LogicExpression, LogicError> {
    let obj = match value {
        Value::Object(obj) => obj,
        scalar => return Ok(LogicExpression::Literal(scalar.clone())),
    };
    if depth >= MAX_DEPTH {
        return Err(LogicError::TooDeep {
            path: path.to_string(),
            limit: MAX_DEPTH,
        });
    }

    let mut entries = obj.iter();
    let (key, operand) = match (entries.next(), entries.next()) {
        (Some(entry), None) => entry,
        _ => {
            return Err(LogicError::NotAnOperation {
                path: path.to_string(),
                found: format!("an object with {} keys", obj.len()),
            });
        }
    };
    let path = format!("{path}.{key}");

    match key.as_str() {
        "and" => Ok(LogicExpression::And(parse_list(operand, &path, key, depth)?)),
        "or" => Ok(LogicExpression::Or(parse_list(operand, &path, key, depth)?)),
        "!" => Ok(LogicExpression::Not(Box::new(parse_unary(
            operand, &path, key, depth,
        )?))),
        "!!" => Ok(LogicExpression::Truthy(Box::new(parse_unary(
            operand, &path, key, depth,
        )?))),
        "var" => parse_var(operand, &path),
        other => {
            let Some(op) = LogicOperator::parse(other) else {
                return Err(LogicError::UnsupportedOperator {
                    path,
                    operator: other.to_string(),
                });
            };
            Ok(LogicExpression::Compare(op, parse_list(operand, &path, key, depth)?))
        }
    }
}

fn parse_list(
    operand: &Value,
    path: &str,
    key: &str,
    depth: usize,
) -> Result<Vec<LogicExpression>, LogicError> {
    let Value::Array(items) = operand else {
        return Err(LogicError::BadOperands {
            path: path.to_string(),
            operator: key.to_string(),
            expected: "an array of operands",
        });
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| parse_value(item, &format!("{path}[{i}]"), depth + 1))
        .collect()
}

// JsonLogic accepts both `{"!": x}` and `{"!": [x]}`.
fn parse_unary(
    operand: &Value,
    path: &str,
    key: &str,
    depth: usize,
) -> Result<LogicExpression, LogicError> {
    match operand {
        Value::Array(items) if items.len() == 1 => {
            parse_value(&items[0], &format!("{path}[0]"), depth + 1)
        }
        Value::Array(_) => Err(LogicError::BadOperands {
            path: path.to_string(),
            operator: key.to_string(),
            expected: "exactly one operand",
        }),
        other => parse_value(other, path, depth + 1),
    }
}

fn parse_var(operand: &Value, path: &str) -> Result<LogicExpression, LogicError> {
    let name = match operand {
        Value::String(name) => Some(name.clone()),
        Value::Array(items) if items.len() == 1 => items[0].as_str().map(str::to_string),
        _ => None,
    };

    name.map(LogicExpression::Var)
        .ok_or_else(|| LogicError::BadOperands {
            path: path.to_string(),
            operator: "var".to_string(),
            expected: "a field name",
        })
}

impl Serialize for LogicExpression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LogicExpression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        LogicExpression::from_value(&value).map_err(serde::de::Error::custom)
    }
}
