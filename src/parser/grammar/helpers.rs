//! Shared shorthand for declaring catalog rules.
//!
//! The catalog modules build thousands of symbols; these constructors keep
//! the declarations close to the shape of the grammar they describe.

use std::mem;
use std::rc::Rc;

use crate::model::TimeSlot;

use super::super::context::{NodeValue, ParseCtx};
use super::super::errors::{ErrorCode, Message, ParseError};
use super::super::syntax::{SemanticAction, Symbol};
use super::super::tokens::TokenClass;

/// A keyword symbol.
pub(super) fn kw(text: &str) -> Symbol {
    Symbol::keyword(text)
}

/// A token-class symbol.
pub(super) fn class(class: TokenClass) -> Symbol {
    Symbol::terminal(class)
}

/// A rule-reference symbol.
pub(super) fn sub(rule: &str) -> Symbol {
    Symbol::rule(rule)
}

/// Wrap a closure as a semantic action.
pub(super) fn action<F>(f: F) -> SemanticAction
where
    F: Fn(&mut ParseCtx, Vec<NodeValue>) -> Result<NodeValue, ParseError> + 'static,
{
    Rc::new(f)
}

/// An action forwarding the sub-value at `index` unchanged.
pub(super) fn pass(index: usize) -> SemanticAction {
    Rc::new(move |_, mut values| Ok(arg(&mut values, index)))
}

/// An action packing all sub-values into a list, for patterns consumed by
/// a fold in their parent rule.
pub(super) fn collect() -> SemanticAction {
    Rc::new(|_, values| Ok(NodeValue::List(values)))
}

/// Take the sub-value at `index` out of the collected list. Positions are
/// fixed by the pattern's symbols, so a missing index is a grammar bug and
/// surfaces as `None` (and then as a coded type mismatch).
pub(super) fn arg(values: &mut [NodeValue], index: usize) -> NodeValue {
    values
        .get_mut(index)
        .map(|value| mem::replace(value, NodeValue::None))
        .unwrap_or(NodeValue::None)
}

/// Flatten one level of nested lists; items produced by range expansions
/// arrive as lists inside the comma list.
pub(super) fn flatten(list: NodeValue) -> Result<Vec<NodeValue>, ParseError> {
    let mut out = Vec::new();
    for item in list.into_list()? {
        match item {
            NodeValue::List(inner) => out.extend(inner),
            other => out.push(other),
        }
    }
    Ok(out)
}

/// Rebuild a validated `[start, end]` time pair into a [`TimeSlot`]. The
/// producing pattern already range-checked it, so failure here is internal.
pub(super) fn time_slot(value: NodeValue) -> Result<TimeSlot, ParseError> {
    let mut parts = value.into_list()?.into_iter();
    let start = parts.next().unwrap_or(NodeValue::None).into_time()?;
    let end = parts.next().unwrap_or(NodeValue::None).into_time()?;
    TimeSlot::checked(start, end).ok_or_else(|| {
        Message::error(
            ErrorCode::T0901,
            "time interval lost its ordering between validation and storage",
        )
        .into()
    })
}
