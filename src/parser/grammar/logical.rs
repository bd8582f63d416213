//! Rules for the report filter expression language.
//!
//! `hidetask`/`hideresource` arguments are chains of operands joined by
//! binary operators, folded strictly left to right. Flags and
//! `scenario.attribute` references are checked against the project while
//! the expression is read, so a typo fails at its own line instead of at
//! report generation time.

use crate::logical::{LogicalOperand, LogicalOperation, LogicalOperator};

use super::super::context::{NodeValue, ParseCtx};
use super::super::errors::{ErrorCode, Message, ParseError};
use super::super::registry::SyntaxRegistry;
use super::super::syntax::{Pattern, PatternDoc};
use super::super::tokens::TokenClass;
use super::helpers::{action, arg, class, kw, pass, sub};

pub(super) fn declare(registry: &mut SyntaxRegistry) {
    registry.define_rule("operation");
    registry.add_pattern(
        "operation",
        Pattern::new(vec![sub("operand"), sub("operationTail")])
            .with_action(action(fold_operation))
            .with_doc(
                PatternDoc::new(
                    "Logical expression",
                    "Operands joined by binary operators, evaluated left to \
                     right. `~` negates the operand it precedes; parentheses \
                     group.",
                )
                .see("hidetask")
                .see("hideresource"),
            ),
    );

    registry.define_rule("operationTail");
    registry.set_optional("operationTail");
    registry.set_repeatable("operationTail");
    registry.add_pattern(
        "operationTail",
        Pattern::new(vec![sub("operator"), sub("operand")])
            .with_action(action(|_, values| Ok(NodeValue::List(values)))),
    );

    registry.define_rule("operator");
    for symbol in ["&", "|", ">", "<", "=", ">=", "<="] {
        registry.add_pattern("operator", Pattern::new(vec![kw(symbol)]).with_action(pass(0)));
    }

    declare_operand(registry);
}

fn fold_operation(_: &mut ParseCtx, mut values: Vec<NodeValue>) -> Result<NodeValue, ParseError> {
    let mut acc = arg(&mut values, 0).into_logical()?;
    for step in arg(&mut values, 1).into_list()? {
        let mut parts = step.into_list()?.into_iter();
        let symbol = parts.next().unwrap_or(NodeValue::None).into_id()?;
        let rhs = parts.next().unwrap_or(NodeValue::None).into_logical()?;
        let operator = LogicalOperator::from_symbol(&symbol).ok_or_else(|| {
            Message::error(
                ErrorCode::T0901,
                format!("'{symbol}' is not a logical operator"),
            )
        })?;
        acc = LogicalOperand::Operation(Box::new(LogicalOperation::binary(acc, operator, rhs)));
    }
    Ok(NodeValue::Logical(Box::new(acc)))
}

fn declare_operand(registry: &mut SyntaxRegistry) {
    registry.define_rule("operand");
    registry.add_pattern(
        "operand",
        Pattern::new(vec![kw("("), sub("operation"), kw(")")]).with_action(pass(1)),
    );
    registry.add_pattern(
        "operand",
        Pattern::new(vec![kw("~"), sub("operand")]).with_action(action(|_, mut values| {
            let operand = arg(&mut values, 1).into_logical()?;
            Ok(NodeValue::Logical(Box::new(operand.negated())))
        })),
    );
    // scenario.attribute: the scenario part must name a declared scenario.
    registry.add_pattern(
        "operand",
        Pattern::new(vec![class(TokenClass::AbsoluteId)]).with_action(action(
            |ctx, mut values| {
                let text = arg(&mut values, 0).into_id()?;
                let Some((scenario_id, name)) = split_attribute_ref(&text) else {
                    return Err(ctx.error(
                        ErrorCode::T0403,
                        format!("attribute reference '{text}' must have the form scenario.attribute"),
                    ));
                };
                let scenario = ctx
                    .project()?
                    .scenarios
                    .index_of(scenario_id)
                    .ok_or_else(|| {
                        ctx.error(
                            ErrorCode::T0402,
                            format!("scenario '{scenario_id}' is not defined"),
                        )
                    })?;
                Ok(NodeValue::Logical(Box::new(LogicalOperand::Attribute {
                    scenario,
                    name: name.into(),
                })))
            },
        )),
    );
    registry.add_pattern(
        "operand",
        Pattern::new(vec![class(TokenClass::Date)]).with_action(action(|_, mut values| {
            let date = arg(&mut values, 0).into_date()?;
            Ok(NodeValue::Logical(Box::new(LogicalOperand::Date(date))))
        })),
    );
    // A bare id is a flag test and must refer to a declared flag.
    registry.add_pattern(
        "operand",
        Pattern::new(vec![class(TokenClass::Id)]).with_action(action(|ctx, mut values| {
            let flag = arg(&mut values, 0).into_id()?;
            if !ctx.project()?.has_flag(&flag) {
                return Err(ctx.error(
                    ErrorCode::T0401,
                    format!("flag '{flag}' has not been declared"),
                ));
            }
            Ok(NodeValue::Logical(Box::new(LogicalOperand::Flag(flag))))
        })),
    );
    registry.add_pattern(
        "operand",
        Pattern::new(vec![class(TokenClass::Integer)]).with_action(action(|_, mut values| {
            let value = arg(&mut values, 0).into_int()?;
            Ok(NodeValue::Logical(Box::new(LogicalOperand::Int(value))))
        })),
    );
    registry.add_pattern(
        "operand",
        Pattern::new(vec![class(TokenClass::String)]).with_action(action(|_, mut values| {
            let text = arg(&mut values, 0).into_str()?;
            Ok(NodeValue::Logical(Box::new(LogicalOperand::Str(text))))
        })),
    );
}

/// Split `plan.Deadline` into scenario and attribute. More than one dot is
/// malformed.
fn split_attribute_ref(text: &str) -> Option<(&str, &str)> {
    let mut parts = text.split('.');
    let scenario = parts.next()?;
    let name = parts.next()?;
    if parts.next().is_some() || scenario.is_empty() || name.is_empty() {
        return None;
    }
    Some((scenario, name))
}
