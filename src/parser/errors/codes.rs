//! Stable diagnostic codes.
//!
//! Codes follow the convention T{category}{number}:
//! - T01xx: Lexical errors (bad characters and literals)
//! - T02xx: Syntax errors (no alternative matched, unexpected EOF)
//! - T03xx: Semantic validation errors (ranges, references, duplicates)
//! - T04xx: Logical-expression errors
//! - T05xx: Attribute-extension errors
//! - T06xx: File, include, and macro errors
//! - T09xx: Internal errors

use std::fmt;

/// Every failure the parser can report.
///
/// Message wording may change freely; the code is the contract tests and
/// downstream tooling match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // T01xx: Lexical errors
    // =========================================================================
    /// Character that starts no token
    T0101,
    /// String missing its closing quote
    T0102,
    /// Invalid date literal
    T0103,
    /// Invalid time-of-day literal
    T0104,
    /// Unterminated macro body
    T0105,
    /// Malformed numeric literal
    T0106,

    // =========================================================================
    // T02xx: Syntax errors
    // =========================================================================
    /// Token matched no alternative of a mandatory rule
    T0201,
    /// Unexpected end of input
    T0202,

    // =========================================================================
    // T03xx: Semantic validation errors
    // =========================================================================
    /// Second `project` definition in one parse
    T0301,
    /// Input contained no `project` definition
    T0302,
    /// Duplicate declaration (task, resource, scenario, flag)
    T0303,
    /// Unresolved reference (unknown task, resource, scenario, flag)
    T0304,
    /// Numeric value outside its permitted range
    T0305,
    /// Interval end does not lie after its start
    T0306,
    /// Report period outside the project interval
    T0307,
    /// More than one top-level scenario
    T0308,
    /// Unknown report column
    T0309,
    /// Unknown sort criterion
    T0310,

    // =========================================================================
    // T04xx: Logical-expression errors
    // =========================================================================
    /// Unknown flag in a logical expression
    T0401,
    /// Unknown scenario in a qualified attribute
    T0402,
    /// Malformed qualified attribute (expected scenario.attribute)
    T0403,

    // =========================================================================
    // T05xx: Attribute-extension errors
    // =========================================================================
    /// Extension attribute name does not start with an uppercase letter
    T0501,
    /// Extension attribute collides with an existing keyword
    T0502,
    /// Extension attribute declared twice for one property type
    T0503,

    // =========================================================================
    // T06xx: File, include, and macro errors
    // =========================================================================
    /// File cannot be read
    T0601,
    /// Include cycle detected
    T0602,
    /// Call of an undefined macro
    T0603,
    /// Malformed macro call or missing argument
    T0604,
    /// Macro expansion nested too deeply
    T0605,
    /// Macro redefined (advisory)
    T0606,

    // =========================================================================
    // T09xx: Internal errors
    // =========================================================================
    /// Semantic action received a value of an unexpected type
    T0901,
    /// Parser invariant violated
    T0999,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            // Lexical
            Self::T0101 => "T0101",
            Self::T0102 => "T0102",
            Self::T0103 => "T0103",
            Self::T0104 => "T0104",
            Self::T0105 => "T0105",
            Self::T0106 => "T0106",
            // Syntax
            Self::T0201 => "T0201",
            Self::T0202 => "T0202",
            // Semantic
            Self::T0301 => "T0301",
            Self::T0302 => "T0302",
            Self::T0303 => "T0303",
            Self::T0304 => "T0304",
            Self::T0305 => "T0305",
            Self::T0306 => "T0306",
            Self::T0307 => "T0307",
            Self::T0308 => "T0308",
            Self::T0309 => "T0309",
            Self::T0310 => "T0310",
            // Logical
            Self::T0401 => "T0401",
            Self::T0402 => "T0402",
            Self::T0403 => "T0403",
            // Extension
            Self::T0501 => "T0501",
            Self::T0502 => "T0502",
            Self::T0503 => "T0503",
            // File/include/macro
            Self::T0601 => "T0601",
            Self::T0602 => "T0602",
            Self::T0603 => "T0603",
            Self::T0604 => "T0604",
            Self::T0605 => "T0605",
            Self::T0606 => "T0606",
            // Internal
            Self::T0901 => "T0901",
            Self::T0999 => "T0999",
        }
    }

    /// The human-readable name of the code's category.
    pub fn category_description(&self) -> &'static str {
        match self {
            Self::T0101 | Self::T0102 | Self::T0103 | Self::T0104 | Self::T0105 | Self::T0106 => {
                "lexical error"
            }
            Self::T0201 | Self::T0202 => "syntax error",
            Self::T0301
            | Self::T0302
            | Self::T0303
            | Self::T0304
            | Self::T0305
            | Self::T0306
            | Self::T0307
            | Self::T0308
            | Self::T0309
            | Self::T0310 => "semantic error",
            Self::T0401 | Self::T0402 | Self::T0403 => "logical expression error",
            Self::T0501 | Self::T0502 | Self::T0503 => "extension error",
            Self::T0601 | Self::T0602 | Self::T0603 | Self::T0604 | Self::T0605 | Self::T0606 => {
                "file error"
            }
            Self::T0901 | Self::T0999 => "internal error",
        }
    }

    /// Fallback text for messages built with [`super::Message::from_code`].
    pub fn default_message(&self) -> &'static str {
        match self {
            // Lexical
            Self::T0101 => "invalid character",
            Self::T0102 => "unterminated string literal",
            Self::T0103 => "invalid date",
            Self::T0104 => "invalid time of day",
            Self::T0105 => "unterminated macro body",
            Self::T0106 => "invalid number",
            // Syntax
            Self::T0201 => "unexpected token",
            Self::T0202 => "unexpected end of input",
            // Semantic
            Self::T0301 => "project already defined",
            Self::T0302 => "no project defined",
            Self::T0303 => "duplicate declaration",
            Self::T0304 => "unresolved reference",
            Self::T0305 => "value out of range",
            Self::T0306 => "interval end must be after its start",
            Self::T0307 => "period lies outside the project interval",
            Self::T0308 => "only one top-level scenario is allowed",
            Self::T0309 => "unknown report column",
            Self::T0310 => "unknown sort criterion",
            // Logical
            Self::T0401 => "unknown flag",
            Self::T0402 => "unknown scenario",
            Self::T0403 => "expected scenario.attribute",
            // Extension
            Self::T0501 => "attribute name must start with an uppercase letter",
            Self::T0502 => "attribute collides with an existing keyword",
            Self::T0503 => "attribute already defined",
            // File/include/macro
            Self::T0601 => "cannot read file",
            Self::T0602 => "include cycle",
            Self::T0603 => "undefined macro",
            Self::T0604 => "malformed macro call",
            Self::T0605 => "macro expansion too deep",
            Self::T0606 => "macro redefined",
            // Internal
            Self::T0901 => "unexpected value type",
            Self::T0999 => "internal parser error",
        }
    }

    /// Whether the code reports bad input rather than an internal fault.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, Self::T0901 | Self::T0999)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
