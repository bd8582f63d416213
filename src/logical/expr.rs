//! Filter expression trees.
//!
//! Report filters (`hidetask`, `hideresource`) are small logical expressions
//! over flags, attributes and literals. The grammar builds these trees at
//! parse time; evaluation happens later, once per entity, when a report is
//! generated (see [`super::eval`]).

use smol_str::SmolStr;
use time::PrimitiveDateTime;

/// Binary operators of the filter language.
///
/// There is no relative precedence between them: `a & b | c` evaluates
/// strictly left to right as `(a & b) | c`. Parentheses are the only
/// grouping mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
    Greater,
    Less,
    Equal,
    GreaterOrEqual,
    LessOrEqual,
}

impl LogicalOperator {
    pub fn from_symbol(text: &str) -> Option<Self> {
        match text {
            "&" => Some(Self::And),
            "|" => Some(Self::Or),
            ">" => Some(Self::Greater),
            "<" => Some(Self::Less),
            "=" => Some(Self::Equal),
            ">=" => Some(Self::GreaterOrEqual),
            "<=" => Some(Self::LessOrEqual),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> &'static str {
        match self {
            Self::And => "&",
            Self::Or => "|",
            Self::Greater => ">",
            Self::Less => "<",
            Self::Equal => "=",
            Self::GreaterOrEqual => ">=",
            Self::LessOrEqual => "<=",
        }
    }
}

/// One operand of an operation.
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalOperand {
    /// A parenthesized sub-expression.
    Operation(Box<LogicalOperation>),
    /// `~` negation. Binds tighter than any binary operator.
    Not(Box<LogicalOperand>),
    /// `scenario.attribute`, with the scenario already resolved to its index.
    Attribute { scenario: usize, name: SmolStr },
    /// A declared flag name; evaluates to whether the entity carries it.
    Flag(SmolStr),
    Date(PrimitiveDateTime),
    Int(i64),
    Str(SmolStr),
}

impl LogicalOperand {
    pub fn negated(self) -> Self {
        Self::Not(Box::new(self))
    }
}

/// A possibly degenerate binary operation: `operand1` alone, or
/// `operand1 operator operand2`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalOperation {
    pub operand1: LogicalOperand,
    pub operator: Option<LogicalOperator>,
    pub operand2: Option<LogicalOperand>,
}

impl LogicalOperation {
    pub fn single(operand: LogicalOperand) -> Self {
        Self { operand1: operand, operator: None, operand2: None }
    }

    pub fn binary(operand1: LogicalOperand, operator: LogicalOperator, operand2: LogicalOperand) -> Self {
        Self { operand1, operator: Some(operator), operand2: Some(operand2) }
    }

    /// Turn an operand into an operation without adding a wrapper layer
    /// when the operand already is one.
    pub fn from_operand(operand: LogicalOperand) -> Self {
        match operand {
            LogicalOperand::Operation(inner) => *inner,
            other => Self::single(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_symbols_round_trip() {
        for symbol in ["&", "|", ">", "<", "=", ">=", "<="] {
            let op = LogicalOperator::from_symbol(symbol).unwrap();
            assert_eq!(op.as_symbol(), symbol);
        }
        assert_eq!(LogicalOperator::from_symbol("~"), None);
    }

    #[test]
    fn from_operand_unwraps_nested_operations() {
        let inner = LogicalOperation::binary(
            LogicalOperand::Int(1),
            LogicalOperator::Less,
            LogicalOperand::Int(2),
        );
        let wrapped = LogicalOperand::Operation(Box::new(inner.clone()));
        assert_eq!(LogicalOperation::from_operand(wrapped), inner);

        let flag = LogicalOperand::Flag("urgent".into());
        let single = LogicalOperation::from_operand(flag.clone());
        assert_eq!(single.operand1, flag);
        assert_eq!(single.operator, None);
        assert_eq!(single.operand2, None);
    }
}
