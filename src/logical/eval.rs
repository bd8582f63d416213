//! Evaluation of filter expressions against model entities.
//!
//! The tree does not know what a task or resource is. Callers implement
//! [`LogicalScope`] for the entity a filter is applied to; the scope answers
//! flag membership and attribute lookups, and [`LogicalOperation::eval`]
//! does the rest.

use std::cmp::Ordering;

use smol_str::SmolStr;
use thiserror::Error;
use time::PrimitiveDateTime;

use super::expr::{LogicalOperand, LogicalOperation, LogicalOperator};

/// A value produced while evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(SmolStr),
    Date(PrimitiveDateTime),
}

impl LogicalValue {
    /// Truth value used by `&`, `|` and `~`.
    pub fn truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::Date(_) => true,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "a boolean",
            Self::Int(_) => "an integer",
            Self::Float(_) => "a number",
            Self::Str(_) => "a string",
            Self::Date(_) => "a date",
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }
}

/// The entity a filter expression is evaluated against.
pub trait LogicalScope {
    /// Whether the entity carries the given flag.
    fn has_flag(&self, name: &str) -> bool;

    /// Look up an attribute value for the given scenario index.
    /// `None` means the entity has no such attribute.
    fn attribute(&self, scenario: usize, name: &str) -> Option<LogicalValue>;
}

#[derive(Debug, Error)]
#[error("cannot evaluate filter expression: {0}")]
pub struct EvalError(pub String);

impl LogicalOperand {
    pub fn eval(&self, scope: &dyn LogicalScope) -> Result<LogicalValue, EvalError> {
        match self {
            Self::Operation(op) => op.eval(scope),
            Self::Not(inner) => Ok(LogicalValue::Bool(!inner.eval(scope)?.truthy())),
            Self::Attribute { scenario, name } => scope.attribute(*scenario, name).ok_or_else(|| {
                EvalError(format!("the entity has no attribute named '{name}'"))
            }),
            Self::Flag(name) => Ok(LogicalValue::Bool(scope.has_flag(name))),
            Self::Date(d) => Ok(LogicalValue::Date(*d)),
            Self::Int(i) => Ok(LogicalValue::Int(*i)),
            Self::Str(s) => Ok(LogicalValue::Str(s.clone())),
        }
    }
}

impl LogicalOperation {
    /// Evaluate the operation against a scope. Chains built by the grammar
    /// are left-nested, so this recursion evaluates them left to right.
    pub fn eval(&self, scope: &dyn LogicalScope) -> Result<LogicalValue, EvalError> {
        let left = self.operand1.eval(scope)?;
        match (&self.operator, &self.operand2) {
            (None, _) => Ok(left),
            (Some(op), Some(rhs)) => apply(*op, left, rhs.eval(scope)?),
            (Some(op), None) => Err(EvalError(format!(
                "operator '{}' is missing its right operand",
                op.as_symbol()
            ))),
        }
    }
}

fn apply(op: LogicalOperator, left: LogicalValue, right: LogicalValue) -> Result<LogicalValue, EvalError> {
    match op {
        LogicalOperator::And => return Ok(LogicalValue::Bool(left.truthy() && right.truthy())),
        LogicalOperator::Or => return Ok(LogicalValue::Bool(left.truthy() || right.truthy())),
        _ => {}
    }

    let ordering = compare(&left, &right).ok_or_else(|| {
        EvalError(format!(
            "cannot compare {} with {}",
            left.type_name(),
            right.type_name()
        ))
    })?;
    let result = match op {
        LogicalOperator::Greater => ordering == Ordering::Greater,
        LogicalOperator::Less => ordering == Ordering::Less,
        LogicalOperator::Equal => ordering == Ordering::Equal,
        LogicalOperator::GreaterOrEqual => ordering != Ordering::Less,
        LogicalOperator::LessOrEqual => ordering != Ordering::Greater,
        LogicalOperator::And | LogicalOperator::Or => unreachable!(),
    };
    Ok(LogicalValue::Bool(result))
}

fn compare(left: &LogicalValue, right: &LogicalValue) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) {
        return a.partial_cmp(&b);
    }
    match (left, right) {
        (LogicalValue::Str(a), LogicalValue::Str(b)) => Some(a.cmp(b)),
        (LogicalValue::Date(a), LogicalValue::Date(b)) => Some(a.cmp(b)),
        (LogicalValue::Bool(a), LogicalValue::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
