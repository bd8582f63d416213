//! Diagnostic records and the top-level parse error
//!
//! A [`Message`] is one structured diagnostic: stable code, severity,
//! human-readable text, and an optional source location. Fatal messages
//! travel out of the parser wrapped in [`ParseError`]; warnings accumulate
//! in the [`MessageLog`] without aborting.

use std::fmt;

use thiserror::Error;

use crate::base::{SourceMap, SourceRef};

use super::codes::ErrorCode;

/// Whether a diagnostic aborts the parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Severity {
    #[default]
    Error,
    /// Advisory only; parsing continues.
    Warning,
}

impl Severity {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

/// One diagnostic: the stable code plus everything needed to render it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub code: ErrorCode,
    pub severity: Severity,
    pub text: String,
    /// Where in the sources the problem sits, when known.
    pub at: Option<SourceRef>,
    /// A concrete suggestion, appended to the rendered output.
    pub hint: Option<String>,
}

impl Message {
    /// Create an error message with explicit text
    pub fn error(code: ErrorCode, text: impl Into<String>) -> Self {
        Self {
            code,
            severity: Severity::Error,
            text: text.into(),
            at: None,
            hint: None,
        }
    }

    /// Create a warning message with explicit text
    pub fn warning(code: ErrorCode, text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(code, text)
        }
    }

    /// Create an error carrying the code's default message
    pub fn from_code(code: ErrorCode) -> Self {
        Self::error(code, code.default_message())
    }

    /// Attach a source location
    pub fn at(mut self, at: SourceRef) -> Self {
        self.at = Some(at);
        self
    }

    /// Attach a hint
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Render the message with its location resolved against the sources,
    /// in the form `file:line:col: severity T0xxx: text`.
    pub fn render(&self, sources: &SourceMap) -> String {
        let mut out = String::new();
        if let Some(at) = self.at {
            out.push_str(&sources.describe(at).to_string());
            out.push_str(": ");
        }
        out.push_str(&format!(
            "{} {}: {}",
            self.severity.as_str(),
            self.code,
            self.text
        ));
        if let Some(hint) = &self.hint {
            out.push_str(&format!("\n  hint: {hint}"));
        }
        out
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.severity.as_str(), self.code, self.text)
    }
}

/// Top-level failure of one parse
///
/// The parse is fail-fast: the first fatal diagnostic aborts the input and
/// surfaces here; no partial model is returned.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A fatal diagnostic produced during lexing, matching, or a semantic
    /// action.
    #[error("{0}")]
    Diagnostic(Message),

    /// A source file handed to the driver could not be read.
    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ParseError {
    /// The error code, if this failure carries a diagnostic record.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Diagnostic(m) => Some(m.code),
            Self::Io { .. } => None,
        }
    }

    /// The source location, if one is known.
    pub fn location(&self) -> Option<SourceRef> {
        match self {
            Self::Diagnostic(m) => m.at,
            Self::Io { .. } => None,
        }
    }
}

impl From<Message> for ParseError {
    fn from(message: Message) -> Self {
        ParseError::Diagnostic(message)
    }
}

/// Accumulator for non-fatal diagnostics
///
/// Fatal errors do not land here: they abort via [`ParseError`]. The log
/// collects warnings so the driver can hand them to the caller after a
/// successful parse.
#[derive(Debug, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a non-fatal message.
    pub fn push(&mut self, message: Message) {
        debug_assert!(!message.severity.is_error());
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn warning_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.severity == Severity::Warning)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use text_size::{TextRange, TextSize};

    #[test]
    fn test_message_display() {
        let msg = Message::error(ErrorCode::T0305, "priority 2000 not in [0, 1000]");
        assert_eq!(
            msg.to_string(),
            "error T0305: priority 2000 not in [0, 1000]"
        );
    }

    #[test]
    fn test_message_from_code_uses_default_text() {
        let msg = Message::from_code(ErrorCode::T0602);
        assert_eq!(msg.text, "include cycle");
        assert!(msg.severity.is_error());
    }

    #[test]
    fn test_render_with_location() {
        let mut sources = SourceMap::new();
        let file = sources.insert("demo.tjp", "task t1 \"T1\"\n");
        let at = SourceRef::new(
            file,
            TextRange::new(TextSize::from(5), TextSize::from(7)),
        );
        let msg = Message::error(ErrorCode::T0303, "task 't1' already defined").at(at);
        assert_eq!(
            msg.render(&sources),
            "demo.tjp:1:6: error T0303: task 't1' already defined"
        );
    }

    #[test]
    fn test_render_includes_hint() {
        let sources = SourceMap::new();
        let msg = Message::error(ErrorCode::T0501, "attribute 'foo' starts lowercase")
            .with_hint("rename the attribute to 'Foo'");
        let rendered = msg.render(&sources);
        assert!(rendered.contains("T0501"));
        assert!(rendered.contains("hint: rename the attribute to 'Foo'"));
    }

    #[test]
    fn test_parse_error_carries_code() {
        let err = ParseError::from(Message::from_code(ErrorCode::T0201));
        assert_eq!(err.code(), Some(ErrorCode::T0201));
    }

    #[test]
    fn test_log_counts_warnings() {
        let mut log = MessageLog::new();
        log.push(Message::warning(
            ErrorCode::T0606,
            "macro 'm' is redefined here",
        ));
        assert_eq!(log.warning_count(), 1);
        assert!(!log.is_empty());
    }
}
