use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::logic::{LogicExpression, LogicOperator};
use crate::schema::{FieldSchema, OperatorKind, SearchMode, ValueType, schema_for};

/// Date values are plain calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Combinator {
    #[default]
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub field: String,
    /// `None` while the user has not picked an operator yet.
    pub operator: Option<OperatorKind>,
    pub value: Vec<String>,
}

impl Rule {
    pub fn new(field: impl Into<String>, operator: OperatorKind, value: Vec<String>) -> Self {
        Self {
            field: field.into(),
            operator: Some(operator),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub combinator: Combinator,
    pub children: Vec<FilterNode>,
}

impl Group {
    pub fn new(combinator: Combinator, children: Vec<FilterNode>) -> Self {
        Self {
            combinator,
            children,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterNode {
    Rule(Rule),
    Group(Group),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("{path}: field '{field}' is not filterable in {mode}")]
    UnknownField {
        path: String,
        field: String,
        mode: SearchMode,
    },
    #[error("{path}: operator '{operator}' is not allowed on '{field}'")]
    OperatorNotAllowed {
        path: String,
        field: String,
        operator: OperatorKind,
    },
    #[error("{path}: '{operator}' takes {expected} value(s), found {found}")]
    WrongArity {
        path: String,
        operator: OperatorKind,
        expected: usize,
        found: usize,
    },
    #[error("{path}: '{value}' is not a date (expected YYYY-MM-DD)")]
    InvalidDate { path: String, value: String },
}

/// The tree a fresh filter editor shows for `mode`: one blank rule on the
/// mode's first field.
pub fn empty_tree(mode: SearchMode) -> Group {
    let field = schema_for(mode).first_field();
    Group::new(
        Combinator::And,
        vec![FilterNode::Rule(Rule {
            field: field.key.to_string(),
            operator: None,
            value: vec![String::new()],
        })],
    )
}

pub fn is_default(tree: &Group, mode: SearchMode) -> bool {
    *tree == empty_tree(mode)
}

/// Converts a tree into its logic expression. Rules without an operator or
/// with an incomplete value list contribute nothing; a tree with no clauses
/// at all maps to `None`.
pub fn to_logic_expression(tree: &Group) -> Option<LogicExpression> {
    group_to_logic(tree)
}

fn group_to_logic(group: &Group) -> Option<LogicExpression> {
    let clauses: Vec<LogicExpression> = group
        .children
        .iter()
        .filter_map(|child| match child {
            FilterNode::Rule(rule) => rule_to_logic(rule),
            FilterNode::Group(group) => group_to_logic(group),
        })
        .collect();

    if clauses.is_empty() {
        return None;
    }

    Some(match group.combinator {
        Combinator::And => LogicExpression::And(clauses),
        Combinator::Or => LogicExpression::Or(clauses),
    })
}

fn rule_to_logic(rule: &Rule) -> Option<LogicExpression> {
    use LogicExpression as L;

    let operator = rule.operator?;
    if rule.value.len() != operator.arity() {
        return None;
    }

    let var = L::var(rule.field.clone());
    let mut values: Vec<L> = rule.value.iter().cloned().map(L::text).collect();

    let compare = |op: LogicOperator, mut values: Vec<L>| {
        values.insert(0, var.clone());
        L::Compare(op, values)
    };

    Some(match operator {
        OperatorKind::Equal => compare(LogicOperator::Eq, values),
        OperatorKind::NotEqual => compare(LogicOperator::Ne, values),
        OperatorKind::Less => compare(LogicOperator::Lt, values),
        OperatorKind::LessOrEqual => compare(LogicOperator::Le, values),
        OperatorKind::Greater => compare(LogicOperator::Gt, values),
        OperatorKind::GreaterOrEqual => compare(LogicOperator::Ge, values),
        OperatorKind::StartsWith => compare(LogicOperator::StartsWith, values),
        OperatorKind::EndsWith => compare(LogicOperator::EndsWith, values),
        OperatorKind::Proximity => compare(LogicOperator::Proximity, values),
        OperatorKind::Between | OperatorKind::NotBetween => {
            values.insert(1, var.clone());
            let range = L::Compare(LogicOperator::Le, values);
            if operator == OperatorKind::Between {
                range
            } else {
                L::Not(Box::new(range))
            }
        }
        OperatorKind::Like | OperatorKind::NotLike => {
            values.push(var.clone());
            let contains = L::Compare(LogicOperator::In, values);
            if operator == OperatorKind::Like {
                contains
            } else {
                L::Not(Box::new(contains))
            }
        }
        OperatorKind::IsEmpty => L::Not(Box::new(var.clone())),
        OperatorKind::IsNotEmpty => L::Truthy(Box::new(var.clone())),
    })
}

/// Rebuilds a filter tree from a logic expression. Clauses that do not fit
/// the schema of `mode` are dropped one by one; if nothing survives the
/// result is the empty tree.
pub fn from_logic_expression(expr: Option<&LogicExpression>, mode: SearchMode) -> Group {
    let schema = schema_for(mode);

    let root = match expr {
        None => return empty_tree(mode),
        Some(LogicExpression::And(children)) => convert_group(Combinator::And, children, schema),
        Some(LogicExpression::Or(children)) => convert_group(Combinator::Or, children, schema),
        Some(clause) => convert_group(Combinator::And, std::slice::from_ref(clause), schema),
    };

    if root.children.is_empty() {
        empty_tree(mode)
    } else {
        root
    }
}

fn convert_group(combinator: Combinator, children: &[LogicExpression], schema: &FieldSchema) -> Group {
    let children = children
        .iter()
        .filter_map(|child| convert_node(child, schema))
        .collect();
    Group::new(combinator, children)
}

fn convert_node(expr: &LogicExpression, schema: &FieldSchema) -> Option<FilterNode> {
    let group = match expr {
        LogicExpression::And(children) => convert_group(Combinator::And, children, schema),
        LogicExpression::Or(children) => convert_group(Combinator::Or, children, schema),
        clause => return convert_rule(clause, schema).map(FilterNode::Rule),
    };

    if group.children.is_empty() {
        None
    } else {
        Some(FilterNode::Group(group))
    }
}

fn convert_rule(expr: &LogicExpression, schema: &FieldSchema) -> Option<Rule> {
    let Some((field, operator, operands)) = rule_shape(expr) else {
        debug!(clause = %expr.to_value(), "dropping clause with unrecognized shape");
        return None;
    };

    let Some(field_spec) = schema.field(field) else {
        debug!(field, mode = %schema.mode(), "dropping clause on unknown field");
        return None;
    };

    if !field_spec.allows(operator) {
        debug!(field, %operator, "dropping clause with disallowed operator");
        return None;
    }

    let mut value = Vec::with_capacity(operands.len());
    for operand in operands {
        match operand {
            LogicExpression::Literal(serde_json::Value::String(text)) => value.push(text.clone()),
            other => {
                debug!(field, operand = %other.to_value(), "dropping clause with non-text value");
                return None;
            }
        }
    }

    if value.len() != operator.arity() {
        return None;
    }

    if field_spec.value_type == ValueType::Date && !value.iter().all(|v| is_date(v)) {
        debug!(field, ?value, "dropping clause with malformed date");
        return None;
    }

    Some(Rule {
        field: field.to_string(),
        operator: Some(operator),
        value,
    })
}

/// Recognizes the clause encodings produced by `rule_to_logic`.
fn rule_shape(expr: &LogicExpression) -> Option<(&str, OperatorKind, Vec<&LogicExpression>)> {
    use LogicExpression as L;

    match expr {
        L::Compare(op, args) => match (op, args.as_slice()) {
            (LogicOperator::Le, [low, L::Var(field), high]) => {
                Some((field.as_str(), OperatorKind::Between, vec![low, high]))
            }
            (LogicOperator::In, [value, L::Var(field)]) => {
                Some((field.as_str(), OperatorKind::Like, vec![value]))
            }
            (LogicOperator::Proximity, [L::Var(field), rest @ ..]) => Some((
                field.as_str(),
                OperatorKind::Proximity,
                rest.iter().collect(),
            )),
            (op, [L::Var(field), value]) => {
                Some((field.as_str(), single_value_operator(*op)?, vec![value]))
            }
            _ => None,
        },
        L::Not(inner) => match inner.as_ref() {
            L::Var(field) => Some((field.as_str(), OperatorKind::IsEmpty, Vec::new())),
            L::Compare(LogicOperator::Le, args) => match args.as_slice() {
                [low, L::Var(field), high] => {
                    Some((field.as_str(), OperatorKind::NotBetween, vec![low, high]))
                }
                _ => None,
            },
            L::Compare(LogicOperator::In, args) => match args.as_slice() {
                [value, L::Var(field)] => Some((field.as_str(), OperatorKind::NotLike, vec![value])),
                _ => None,
            },
            _ => None,
        },
        L::Truthy(inner) => match inner.as_ref() {
            L::Var(field) => Some((field.as_str(), OperatorKind::IsNotEmpty, Vec::new())),
            _ => None,
        },
        _ => None,
    }
}

fn single_value_operator(op: LogicOperator) -> Option<OperatorKind> {
    match op {
        LogicOperator::Eq => Some(OperatorKind::Equal),
        LogicOperator::Ne => Some(OperatorKind::NotEqual),
        LogicOperator::Lt => Some(OperatorKind::Less),
        LogicOperator::Le => Some(OperatorKind::LessOrEqual),
        LogicOperator::Gt => Some(OperatorKind::Greater),
        LogicOperator::Ge => Some(OperatorKind::GreaterOrEqual),
        LogicOperator::StartsWith => Some(OperatorKind::StartsWith),
        LogicOperator::EndsWith => Some(OperatorKind::EndsWith),
        LogicOperator::In | LogicOperator::Proximity => None,
    }
}

fn is_date(value: &str) -> bool {
    NaiveDate::parse_from_str(value, DATE_FORMAT).is_ok()
}

/// Checks every rule that carries an operator against the schema of `mode`.
/// Rules without an operator are incomplete, not invalid.
pub fn validate(tree: &Group, mode: SearchMode) -> Result<(), FilterError> {
    validate_group(tree, schema_for(mode), "$")
}

fn validate_group(group: &Group, schema: &FieldSchema, path: &str) -> Result<(), FilterError> {
    for (i, child) in group.children.iter().enumerate() {
        let path = format!("{path}.children[{i}]");
        match child {
            FilterNode::Group(group) => validate_group(group, schema, &path)?,
            FilterNode::Rule(rule) => validate_rule(rule, schema, path)?,
        }
    }
    Ok(())
}

fn validate_rule(rule: &Rule, schema: &FieldSchema, path: String) -> Result<(), FilterError> {
    let Some(field_spec) = schema.field(&rule.field) else {
        return Err(FilterError::UnknownField {
            path,
            field: rule.field.clone(),
            mode: schema.mode(),
        });
    };

    let Some(operator) = rule.operator else {
        return Ok(());
    };

    if !field_spec.allows(operator) {
        return Err(FilterError::OperatorNotAllowed {
            path,
            field: rule.field.clone(),
            operator,
        });
    }

    if rule.value.len() != operator.arity() {
        return Err(FilterError::WrongArity {
            path,
            operator,
            expected: operator.arity(),
            found: rule.value.len(),
        });
    }

    if field_spec.value_type == ValueType::Date
        && let Some(bad) = rule.value.iter().find(|v| !is_date(v))
    {
        return Err(FilterError::InvalidDate {
            path,
            value: bad.clone(),
        });
    }

    Ok(())
}

/// Keeps the part of `tree` that is meaningful for `mode`.
pub fn sanitize(tree: &Group, mode: SearchMode) -> Group {
    from_logic_expression(to_logic_expression(tree).as_ref(), mode)
}
