//! Token model for the TJP scanner
//!
//! Keywords are deliberately NOT token classes: the grammar grows new
//! keywords at runtime (`extend`), so keyword recognition happens in the
//! rule table by comparing identifier text, not in the lexer.

use smol_str::SmolStr;
use time::PrimitiveDateTime;

use crate::base::SourceRef;

/// Classes of tokens the scanner produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenClass {
    /// Unsigned integer literal
    Integer,
    /// Floating-point literal
    Float,
    /// Calendar date, optionally with a time of day (`2024-01-01-13:00`)
    Date,
    /// Time of day (`9:00`); `24:00` is allowed as an interval end
    Time,
    /// Double-quoted string
    String,
    /// Bare identifier (also the carrier for keywords)
    Id,
    /// Identifier with a trailing colon (`plan:`), a scenario qualifier
    IdWithColon,
    /// Dotted identifier path (`tree.build.compile`)
    AbsoluteId,
    /// `!`-prefixed identifier path; each leading `!` climbs one scope
    RelativeId,
    /// Raw text of a `[ ... ]` macro body
    MacroBody,
    /// A `${...}` macro call; expanded inside the stream, never surfaced
    /// to the matcher
    MacroCall,
    /// Punctuation (`{`, `-`, `>=`, ...)
    Literal,
    /// End of all input
    Eof,
}

impl TokenClass {
    /// Phrase used in "expected ..." diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Integer => "a number",
            Self::Float => "a floating-point number",
            Self::Date => "a date",
            Self::Time => "a time of day",
            Self::String => "a string",
            Self::Id => "an identifier",
            Self::IdWithColon => "a scenario id",
            Self::AbsoluteId => "an absolute id",
            Self::RelativeId => "a relative id",
            Self::MacroBody => "a macro body",
            Self::MacroCall => "a macro call",
            Self::Literal => "a symbol",
            Self::Eof => "end of input",
        }
    }
}

/// Cooked value attached to a token
///
/// `None` for tokens whose text is their value (identifiers, punctuation).
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    None,
    /// Integer literals
    Int(i64),
    /// Float literals
    Float(f64),
    /// Date literals, normalized to a naive timestamp
    Date(PrimitiveDateTime),
    /// Time-of-day literals as seconds since midnight (`24:00` = 86400)
    Time(u32),
    /// Unquoted string content, colon-stripped scenario ids, macro bodies
    Str(SmolStr),
}

/// One token: class, raw text, cooked value, and source location
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub class: TokenClass,
    pub text: SmolStr,
    pub value: TokenValue,
    pub at: SourceRef,
}

impl Token {
    pub fn new(class: TokenClass, text: impl Into<SmolStr>, value: TokenValue, at: SourceRef) -> Self {
        Self {
            class,
            text: text.into(),
            value,
            at,
        }
    }

    pub fn eof(at: SourceRef) -> Self {
        Self::new(TokenClass::Eof, "<EOF>", TokenValue::None, at)
    }

    pub fn is_eof(&self) -> bool {
        self.class == TokenClass::Eof
    }

    /// Phrase used in diagnostics for this concrete token.
    pub fn describe(&self) -> String {
        match self.class {
            TokenClass::Eof => "end of input".to_string(),
            TokenClass::String => format!("string {}", self.text),
            _ => format!("'{}'", self.text),
        }
    }
}
