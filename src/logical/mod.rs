//! Logical expressions for report filters.
//!
//! A tiny embedded language: flags, `scenario.attribute` references, date,
//! integer and string literals, combined with `& | > < = >= <=` and the
//! prefix negation `~`. Trees are built by the parser; evaluation runs
//! against anything implementing [`LogicalScope`].

mod eval;
mod expr;

pub use eval::{EvalError, LogicalScope, LogicalValue};
pub use expr::{LogicalOperand, LogicalOperation, LogicalOperator};
