//! The rule matcher.
//!
//! One token of lookahead drives everything: [`RuleMatcher::match_rule`]
//! peeks, asks the registry which alternative starts with that token,
//! consumes the pattern's symbols (recursing for non-terminals) and hands
//! the collected sub-values to the pattern's action. All model mutation
//! happens inside actions; the matcher itself only moves tokens.
//!
//! Because actions run as soon as their pattern completes, rule-table
//! changes made by an action (`extend`) are visible to the very next
//! token, and scanner requests (`include`, `macro`) splice into the
//! stream right behind the declaration.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use super::context::{NodeValue, ParseCtx, StreamOp};
use super::errors::{ErrorCode, Message, ParseError};
use super::registry::SyntaxRegistry;
use super::stream::TokenStream;
use super::syntax::{Pattern, Symbol};
use super::tokens::{Token, TokenClass, TokenValue};

pub struct RuleMatcher<'a> {
    registry: Rc<RefCell<SyntaxRegistry>>,
    stream: &'a mut TokenStream,
}

impl<'a> RuleMatcher<'a> {
    pub fn new(registry: Rc<RefCell<SyntaxRegistry>>, stream: &'a mut TokenStream) -> Self {
        Self { registry, stream }
    }

    /// Match one rule at the current stream position.
    ///
    /// Returns `Ok(None)` when an optional rule matched nothing (no token
    /// was consumed). Repeatable rules loop until no alternative accepts
    /// the lookahead and collect the per-iteration values into a
    /// [`NodeValue::List`].
    pub fn match_rule(&mut self, rule: &str, ctx: &mut ParseCtx) -> Result<Option<NodeValue>, ParseError> {
        let (optional, repeatable) = {
            let registry = self.registry.borrow();
            let entry = registry.lookup(rule);
            (entry.optional, entry.repeatable)
        };

        let mut collected = Vec::new();
        let mut matched_any = false;
        loop {
            let token = self.stream.peek()?;
            let selected = self.registry.borrow_mut().select_pattern(rule, &token);
            let Some(pattern) = selected else {
                if matched_any || optional {
                    break;
                }
                return Err(self.no_alternative_error(rule, &token));
            };
            trace!(rule, token = %token.text, "matched alternative");

            let value = self.match_pattern(&pattern, ctx)?;
            matched_any = true;
            if !repeatable {
                return Ok(Some(value));
            }
            collected.push(value);
        }

        if !matched_any {
            return Ok(None);
        }
        Ok(Some(NodeValue::List(collected)))
    }

    /// Consume every symbol of an already-selected pattern, then run its
    /// action on the collected values.
    fn match_pattern(&mut self, pattern: &Pattern, ctx: &mut ParseCtx) -> Result<NodeValue, ParseError> {
        let start = self.stream.peek()?.at;
        let mut values = Vec::with_capacity(pattern.symbols.len());

        for symbol in &pattern.symbols {
            match symbol {
                Symbol::Keyword(_) | Symbol::Terminal(_) => {
                    let token = self.stream.next()?;
                    if !symbol.accepts_token(&token) {
                        return Err(symbol_mismatch_error(symbol, &token));
                    }
                    values.push(token_value(&token));
                }
                Symbol::NonTerminal(name) => {
                    let value = self.match_rule(name, ctx)?;
                    values.push(value.unwrap_or(NodeValue::None));
                }
            }
        }

        // Sub-rules moved the context location around; point it back at
        // this pattern before its own action runs.
        ctx.set_at(start);
        let value = match &pattern.action {
            Some(action) => action(ctx, values)?,
            None => NodeValue::None,
        };
        self.apply_stream_ops(ctx)?;
        Ok(value)
    }

    /// Apply scanner requests the action queued up: includes and macro
    /// definitions take effect right behind the declaration.
    fn apply_stream_ops(&mut self, ctx: &mut ParseCtx) -> Result<(), ParseError> {
        for op in ctx.take_stream_ops() {
            match op {
                StreamOp::Include { target, at } => {
                    self.stream.include(&target, at)?;
                }
                StreamOp::DefineMacro { name, body, at } => {
                    if let Some(previous) = self.stream.define_macro(name.clone(), body, at) {
                        ctx.log.push(
                            Message::warning(
                                ErrorCode::T0606,
                                format!("macro '{}' is redefined here", previous.name),
                            )
                            .at(at),
                        );
                    }
                }
            }
        }
        Ok(())
    }

    fn no_alternative_error(&self, rule: &str, token: &Token) -> ParseError {
        let expected = {
            let registry = self.registry.borrow();
            let entry = registry.lookup(rule);
            match entry.patterns.len() {
                1 => entry.expected_description(),
                _ => format!("one of {}", entry.expected_description()),
            }
        };
        let code = if token.is_eof() { ErrorCode::T0202 } else { ErrorCode::T0201 };
        Message::error(code, format!("expected {expected}, found {}", token.describe()))
            .at(token.at)
            .into()
    }
}

fn symbol_mismatch_error(symbol: &Symbol, token: &Token) -> ParseError {
    let code = if token.is_eof() { ErrorCode::T0202 } else { ErrorCode::T0201 };
    let mut message = Message::error(
        code,
        format!("expected {}, found {}", symbol.describe(), token.describe()),
    )
    .at(token.at);
    // A stray identifier where a body should close usually means an
    // attribute keyword this rule does not know.
    if *symbol == Symbol::Keyword("}".into()) && token.class == TokenClass::Id {
        message = message.with_hint(format!("'{}' is not a recognized attribute here", token.text));
    }
    message.into()
}

/// The value one matched token contributes to its pattern.
fn token_value(token: &Token) -> NodeValue {
    match &token.value {
        TokenValue::Int(i) => NodeValue::Int(*i),
        TokenValue::Float(f) => NodeValue::Float(*f),
        TokenValue::Date(d) => NodeValue::Date(*d),
        TokenValue::Time(t) => NodeValue::TimeOfDay(*t),
        TokenValue::Str(s) => match token.class {
            // Scenario prefixes stay identifiers even though the cooked
            // value strips the trailing colon.
            TokenClass::IdWithColon => NodeValue::Id(s.clone()),
            _ => NodeValue::Str(s.clone()),
        },
        TokenValue::None => NodeValue::Id(token.text.clone()),
    }
}

#[cfg(test)]
mod tests {
    use smol_str::SmolStr;

    use super::*;

    fn item_registry() -> SyntaxRegistry {
        let mut registry = SyntaxRegistry::new();
        registry.define_rule("item");
        registry.add_pattern(
            "item",
            Pattern::new(vec![
                Symbol::keyword("item"),
                Symbol::terminal(TokenClass::Integer),
            ])
            .with_action(Rc::new(|_, mut values| Ok(values.remove(1)))),
        );
        registry.define_rule("items");
        registry.add_pattern(
            "items",
            Pattern::new(vec![Symbol::rule("item")])
                .with_action(Rc::new(|_, mut values| Ok(values.remove(0)))),
        );
        registry.set_optional("items");
        registry.set_repeatable("items");
        registry
    }

    fn run(registry: SyntaxRegistry, rule: &str, input: &str) -> Result<Option<NodeValue>, ParseError> {
        let registry = Rc::new(RefCell::new(registry));
        let mut stream = TokenStream::from_text("test", input).unwrap();
        let mut ctx = ParseCtx::new(registry.clone());
        let mut matcher = RuleMatcher::new(registry, &mut stream);
        matcher.match_rule(rule, &mut ctx)
    }

    #[test]
    fn repeatable_rules_collect_their_iterations() {
        let value = run(item_registry(), "items", "item 1 item 2 item 3").unwrap();
        assert_eq!(
            value,
            Some(NodeValue::List(vec![
                NodeValue::Int(1),
                NodeValue::Int(2),
                NodeValue::Int(3),
            ]))
        );
    }

    #[test]
    fn optional_rules_match_nothing_without_consuming() {
        let registry = Rc::new(RefCell::new(item_registry()));
        let mut stream = TokenStream::from_text("test", "unrelated").unwrap();
        let mut ctx = ParseCtx::new(registry.clone());
        let mut matcher = RuleMatcher::new(registry, &mut stream);

        let value = matcher.match_rule("items", &mut ctx).unwrap();
        assert_eq!(value, None);
        // The lookahead token is still there for the next rule.
        assert_eq!(stream.peek().unwrap().text, "unrelated");
    }

    #[test]
    fn mandatory_rules_name_the_expected_alternatives() {
        let err = run(item_registry(), "item", "nonsense 1").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::T0201));
        assert!(err.to_string().contains("'item'"), "got: {err}");
    }

    #[test]
    fn mismatches_after_the_first_symbol_point_at_the_offender() {
        let err = run(item_registry(), "item", "item oops").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::T0201));
        assert!(err.to_string().contains("a number"), "got: {err}");
    }

    #[test]
    fn end_of_input_uses_the_eof_code() {
        let err = run(item_registry(), "item", "").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::T0202));
    }

    #[test]
    fn keywords_contribute_their_text() {
        let mut registry = SyntaxRegistry::new();
        registry.define_rule("unit");
        registry.add_pattern(
            "unit",
            Pattern::new(vec![Symbol::keyword("d")])
                .with_action(Rc::new(|_, mut values| Ok(values.remove(0)))),
        );
        let value = run(registry, "unit", "d").unwrap();
        assert_eq!(value, Some(NodeValue::Id(SmolStr::new("d"))));
    }

    #[test]
    fn action_errors_abort_the_parse() {
        let mut registry = SyntaxRegistry::new();
        registry.define_rule("boom");
        registry.add_pattern(
            "boom",
            Pattern::new(vec![Symbol::keyword("boom")]).with_action(Rc::new(|ctx: &mut ParseCtx, _| {
                Err(ctx.error(ErrorCode::T0305, "value out of range"))
            })),
        );
        let err = run(registry, "boom", "boom").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::T0305));
    }

    #[test]
    fn macro_definitions_take_effect_for_the_next_token() {
        let mut registry = SyntaxRegistry::new();
        registry.define_rule("def");
        registry.add_pattern(
            "def",
            Pattern::new(vec![Symbol::keyword("def")]).with_action(Rc::new(|ctx: &mut ParseCtx, _| {
                let at = ctx.at();
                ctx.request_macro("answer".into(), "42".into(), at);
                Ok(NodeValue::None)
            })),
        );
        registry.define_rule("test");
        registry.add_pattern(
            "test",
            Pattern::new(vec![
                Symbol::rule("def"),
                Symbol::terminal(TokenClass::Integer),
            ])
            .with_action(Rc::new(|_, mut values| Ok(values.remove(1)))),
        );

        let value = run(registry, "test", "def ${answer}").unwrap();
        assert_eq!(value, Some(NodeValue::Int(42)));
    }
}
