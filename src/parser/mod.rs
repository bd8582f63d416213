//! The TJP parser.
//!
//! Layered bottom-up: tokens and the lexer, the macro- and include-aware
//! [`TokenStream`], the grammar data model and [`SyntaxRegistry`] rule
//! table, the matching engine, and on top the grammar catalog plus the
//! [`ProjectFileParser`] driver. The grammar is data: rules carry
//! patterns, patterns carry semantic actions, and `extend` splices new
//! patterns into live rules while the parse is running.

pub mod errors;

mod context;
mod driver;
mod engine;
mod grammar;
mod lexer;
mod registry;
mod stream;
mod syntax;
mod tokens;

pub use context::{ExtendTarget, NodeValue, ParseCtx, PropertyRef, StreamOp};
pub use driver::{syntax_reference, ProjectFileParser};
pub use engine::RuleMatcher;
pub use registry::{ExtendConflict, FirstSet, SyntaxRegistry};
pub use stream::TokenStream;
pub use syntax::{ArgDoc, Pattern, PatternDoc, Rule, SemanticAction, Symbol};
pub use tokens::{Token, TokenClass, TokenValue};
