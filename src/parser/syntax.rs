//! Grammar data model: symbols, patterns, rules
//!
//! A grammar here is data, not code: named [`Rule`]s hold alternative
//! [`Pattern`]s of [`Symbol`]s, and each pattern may carry a semantic
//! action that runs when the pattern has matched. The whole TJP syntax is
//! declared through this model (see `parser::grammar`), and `extend`
//! declarations splice additional patterns into live rules mid-parse.

use std::fmt;
use std::rc::Rc;

use smol_str::SmolStr;

use super::context::{NodeValue, ParseCtx};
use super::errors::ParseError;
use super::tokens::{Token, TokenClass};

/// A semantic action: receives the pattern's collected sub-values and the
/// shared parse context, produces the rule's value. All model mutation
/// happens inside actions; the matcher itself only moves tokens.
pub type SemanticAction =
    Rc<dyn Fn(&mut ParseCtx, Vec<NodeValue>) -> Result<NodeValue, ParseError>>;

/// One grammar symbol
///
/// The symbol kind is a closed variant, not a string convention: dispatch
/// bugs become type errors.
#[derive(Clone, PartialEq, Eq)]
pub enum Symbol {
    /// Exact text match against an identifier or punctuation token.
    /// Keywords live here, not in the lexer, because `extend` mints new
    /// ones at runtime.
    Keyword(SmolStr),
    /// Match any token of the given class.
    Terminal(TokenClass),
    /// Recurse into the named rule.
    NonTerminal(SmolStr),
}

impl Symbol {
    pub fn keyword(text: impl Into<SmolStr>) -> Self {
        Self::Keyword(text.into())
    }

    pub fn terminal(class: TokenClass) -> Self {
        Self::Terminal(class)
    }

    pub fn rule(name: impl Into<SmolStr>) -> Self {
        Self::NonTerminal(name.into())
    }

    /// Direct token acceptance; NonTerminal acceptance goes through the
    /// registry's first sets instead.
    pub fn accepts_token(&self, token: &Token) -> bool {
        match self {
            Symbol::Keyword(text) => {
                matches!(token.class, TokenClass::Id | TokenClass::Literal)
                    && token.text == *text
            }
            Symbol::Terminal(class) => token.class == *class,
            Symbol::NonTerminal(_) => false,
        }
    }

    /// Phrase used in "expected ..." diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Symbol::Keyword(text) => format!("'{text}'"),
            Symbol::Terminal(class) => class.describe().to_string(),
            Symbol::NonTerminal(name) => format!("<{name}>"),
        }
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Keyword(text) => write!(f, "Keyword({text})"),
            Symbol::Terminal(class) => write!(f, "Terminal({class:?})"),
            Symbol::NonTerminal(name) => write!(f, "NonTerminal({name})"),
        }
    }
}

/// Documentation attached to one argument position of a pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgDoc {
    pub name: SmolStr,
    pub text: String,
}

/// Advisory documentation for a pattern; never affects matching. Rendered
/// by the driver's syntax reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternDoc {
    /// Short title, e.g. "Task declaration"
    pub title: String,
    /// Longer description
    pub text: String,
    /// Related keywords ("see also")
    pub see_also: Vec<SmolStr>,
    /// Per-argument docs, positional
    pub args: Vec<ArgDoc>,
}

impl PatternDoc {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            see_also: Vec::new(),
            args: Vec::new(),
        }
    }

    pub fn see(mut self, keyword: impl Into<SmolStr>) -> Self {
        self.see_also.push(keyword.into());
        self
    }

    pub fn arg(mut self, name: impl Into<SmolStr>, text: impl Into<String>) -> Self {
        self.args.push(ArgDoc {
            name: name.into(),
            text: text.into(),
        });
        self
    }
}

/// One alternative of a rule: an ordered symbol sequence, an optional
/// action, and optional documentation.
#[derive(Clone)]
pub struct Pattern {
    pub symbols: Vec<Symbol>,
    pub action: Option<SemanticAction>,
    pub doc: Option<PatternDoc>,
}

impl Pattern {
    pub fn new(symbols: Vec<Symbol>) -> Self {
        Self {
            symbols,
            action: None,
            doc: None,
        }
    }

    pub fn with_action(mut self, action: SemanticAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn with_doc(mut self, doc: PatternDoc) -> Self {
        self.doc = Some(doc);
        self
    }

    /// The dispatch symbol. Patterns are never empty.
    pub fn first_symbol(&self) -> &Symbol {
        &self.symbols[0]
    }
}

// The action closure has no useful Debug; show the shape instead.
impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("symbols", &self.symbols)
            .field("has_action", &self.action.is_some())
            .finish()
    }
}

/// A named production: alternatives plus occurrence flags
///
/// `optional` - the rule may match zero occurrences; `repeatable` - the
/// rule may match more than once, its value becoming the list of
/// per-iteration values.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: SmolStr,
    pub patterns: Vec<Rc<Pattern>>,
    pub optional: bool,
    pub repeatable: bool,
}

impl Rule {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            patterns: Vec::new(),
            optional: false,
            repeatable: false,
        }
    }

    /// All alternatives' leading symbols, for duplicate checks and
    /// diagnostics.
    pub fn first_symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.patterns.iter().map(|p| p.first_symbol())
    }

    /// Human-readable list of what this rule can start with.
    pub fn expected_description(&self) -> String {
        let parts: Vec<String> = self.first_symbols().map(|s| s.describe()).collect();
        parts.join(", ")
    }
}
