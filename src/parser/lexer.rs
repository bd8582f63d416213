//! Logos-based lexer for the TJP project-file syntax
//!
//! Fast tokenization using the logos crate. Whole files are lexed eagerly
//! into cooked [`Token`]s; trivia (whitespace, `#` line comments, `/* */`
//! block comments) is dropped here and never reaches the matcher.

use logos::Logos;
use smol_str::SmolStr;
use text_size::{TextRange, TextSize};
use time::{Date, Month, PrimitiveDateTime, Time};

use crate::base::{FileId, SourceRef};

use super::errors::{ErrorCode, Message, ParseError};
use super::tokens::{Token, TokenClass, TokenValue};

/// Logos token enum - raw shapes, cooked into [`Token`]s by [`lex_file`]
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
pub enum RawToken {
    // =========================================================================
    // WHITESPACE AND COMMENTS
    // =========================================================================
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[regex(r"#[^\n]*")]
    LineComment,

    #[regex(r"/\*([^*]|\*[^/])*\*/")]
    BlockComment,

    // =========================================================================
    // LITERALS (longest match wins; dates before times before integers)
    // =========================================================================
    #[regex(r"[0-9]{4}-[0-9]{1,2}-[0-9]{1,2}(-[0-9]{1,2}:[0-9]{2}(:[0-9]{2})?)?")]
    Date,

    #[regex(r"[0-9]{1,2}:[0-9]{2}")]
    Time,

    #[regex(r"[0-9]*\.[0-9]+")]
    Float,

    #[regex(r"[0-9]+")]
    Integer,

    #[regex(r#""([^"\\]|\\.)*""#)]
    String,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*:")]
    IdWithColon,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*(\.[a-zA-Z_][a-zA-Z0-9_]*)+")]
    AbsoluteId,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Id,

    #[regex(r"!+[a-zA-Z_][a-zA-Z0-9_]*(\.[a-zA-Z_][a-zA-Z0-9_]*)*")]
    RelativeId,

    #[token("[", lex_macro_body)]
    MacroBody,

    #[token("${", lex_macro_call)]
    MacroCall,

    // =========================================================================
    // TWO-CHARACTER OPERATORS
    // =========================================================================
    #[token(">=")]
    GtEq,

    #[token("<=")]
    LtEq,

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
    #[token("-")]
    Minus,
    #[token("+")]
    Plus,
    #[token("~")]
    Tilde,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token(">")]
    Gt,
    #[token("<")]
    Lt,
    #[token("=")]
    Eq,
}

/// Consume a `[ ... ]` macro body, honoring nested brackets. The raw body
/// text is preserved exactly, including embedded macro calls.
fn lex_macro_body(lex: &mut logos::Lexer<RawToken>) -> bool {
    let mut depth = 1usize;
    for (i, c) in lex.remainder().char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    lex.bump(i + 1);
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

/// Consume a `${ ... }` macro call up to its closing brace. Braces inside
/// quoted arguments do not close the call.
fn lex_macro_call(lex: &mut logos::Lexer<RawToken>) -> bool {
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in lex.remainder().char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else {
            match c {
                '"' => in_string = true,
                '}' => {
                    lex.bump(i + 1);
                    return true;
                }
                _ => {}
            }
        }
    }
    false
}

/// Lex one file into cooked tokens. The first lexical error aborts.
pub fn lex_file(file: FileId, text: &str) -> Result<Vec<Token>, ParseError> {
    let mut lexer = RawToken::lexer(text);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let range = TextRange::new(
            TextSize::from(span.start as u32),
            TextSize::from(span.end as u32),
        );
        let at = SourceRef::new(file, range);
        let slice = lexer.slice();
        match result {
            Ok(raw) => {
                if let Some(token) = cook(raw, slice, at)? {
                    tokens.push(token);
                }
            }
            Err(()) => return Err(lex_error(slice, at)),
        }
    }
    Ok(tokens)
}

/// Turn a raw logos token into a cooked [`Token`]; trivia yields `None`.
fn cook(raw: RawToken, slice: &str, at: SourceRef) -> Result<Option<Token>, ParseError> {
    let token = match raw {
        RawToken::Whitespace | RawToken::LineComment | RawToken::BlockComment => return Ok(None),

        RawToken::Integer => {
            let value: i64 = slice.parse().map_err(|_| {
                Message::error(ErrorCode::T0106, format!("number '{slice}' is too large")).at(at)
            })?;
            Token::new(TokenClass::Integer, slice, TokenValue::Int(value), at)
        }
        RawToken::Float => {
            let value: f64 = slice.parse().map_err(|_| {
                Message::error(ErrorCode::T0106, format!("invalid number '{slice}'")).at(at)
            })?;
            Token::new(TokenClass::Float, slice, TokenValue::Float(value), at)
        }
        RawToken::Date => {
            let value = parse_date(slice)
                .map_err(|reason| {
                    Message::error(ErrorCode::T0103, format!("invalid date '{slice}': {reason}"))
                        .at(at)
                })?;
            Token::new(TokenClass::Date, slice, TokenValue::Date(value), at)
        }
        RawToken::Time => {
            let value = parse_time_of_day(slice).map_err(|reason| {
                Message::error(ErrorCode::T0104, format!("invalid time '{slice}': {reason}")).at(at)
            })?;
            Token::new(TokenClass::Time, slice, TokenValue::Time(value), at)
        }
        RawToken::String => {
            let inner = &slice[1..slice.len() - 1];
            Token::new(
                TokenClass::String,
                slice,
                TokenValue::Str(unescape(inner)),
                at,
            )
        }
        RawToken::Id => Token::new(TokenClass::Id, slice, TokenValue::None, at),
        RawToken::IdWithColon => {
            let id = &slice[..slice.len() - 1];
            Token::new(
                TokenClass::IdWithColon,
                slice,
                TokenValue::Str(SmolStr::new(id)),
                at,
            )
        }
        RawToken::AbsoluteId => Token::new(TokenClass::AbsoluteId, slice, TokenValue::None, at),
        RawToken::RelativeId => Token::new(TokenClass::RelativeId, slice, TokenValue::None, at),
        RawToken::MacroBody => {
            let inner = &slice[1..slice.len() - 1];
            Token::new(
                TokenClass::MacroBody,
                slice,
                TokenValue::Str(SmolStr::new(inner)),
                at,
            )
        }
        RawToken::MacroCall => Token::new(TokenClass::MacroCall, slice, TokenValue::None, at),

        RawToken::GtEq
        | RawToken::LtEq
        | RawToken::LBrace
        | RawToken::RBrace
        | RawToken::LParen
        | RawToken::RParen
        | RawToken::Comma
        | RawToken::Minus
        | RawToken::Plus
        | RawToken::Tilde
        | RawToken::Amp
        | RawToken::Pipe
        | RawToken::Gt
        | RawToken::Lt
        | RawToken::Eq => Token::new(TokenClass::Literal, slice, TokenValue::None, at),
    };
    Ok(Some(token))
}

/// Classify a logos error slice into a coded lexical error.
fn lex_error(slice: &str, at: SourceRef) -> ParseError {
    let message = match slice.chars().next() {
        Some('"') => Message::from_code(ErrorCode::T0102),
        Some('[') => Message::from_code(ErrorCode::T0105),
        Some('$') => Message::error(ErrorCode::T0604, "unterminated macro call"),
        Some(c) => Message::error(ErrorCode::T0101, format!("invalid character '{c}'")),
        None => Message::from_code(ErrorCode::T0101),
    };
    message.at(at).into()
}

/// Parse `YYYY-M-D[-H:MM[:SS]]` into a naive timestamp. A time of `24:00`
/// normalizes to midnight of the following day.
fn parse_date(text: &str) -> Result<PrimitiveDateTime, String> {
    let mut parts = text.splitn(4, '-');
    let year: i32 = parts
        .next()
        .unwrap_or_default()
        .parse()
        .map_err(|_| "bad year".to_string())?;
    let month: u8 = parts
        .next()
        .ok_or("missing month")?
        .parse()
        .map_err(|_| "bad month".to_string())?;
    let day: u8 = parts
        .next()
        .ok_or("missing day")?
        .parse()
        .map_err(|_| "bad day".to_string())?;

    let month = Month::try_from(month).map_err(|e| e.to_string())?;
    let date = Date::from_calendar_date(year, month, day).map_err(|e| e.to_string())?;

    match parts.next() {
        None => Ok(PrimitiveDateTime::new(date, Time::MIDNIGHT)),
        Some(clock) => {
            let seconds = parse_clock(clock)?;
            if seconds == 86_400 {
                let next = date.next_day().ok_or("date out of range")?;
                Ok(PrimitiveDateTime::new(next, Time::MIDNIGHT))
            } else {
                let time = Time::from_hms(
                    (seconds / 3600) as u8,
                    (seconds % 3600 / 60) as u8,
                    (seconds % 60) as u8,
                )
                .map_err(|e| e.to_string())?;
                Ok(PrimitiveDateTime::new(date, time))
            }
        }
    }
}

/// Parse `H:MM[:SS]` into seconds since midnight; `24:00` (= 86400) is
/// legal so working-hour intervals can end at the end of the day.
fn parse_clock(text: &str) -> Result<u32, String> {
    let mut parts = text.splitn(3, ':');
    let hour: u32 = parts
        .next()
        .unwrap_or_default()
        .parse()
        .map_err(|_| "bad hour".to_string())?;
    let minute: u32 = parts
        .next()
        .ok_or("missing minutes")?
        .parse()
        .map_err(|_| "bad minutes".to_string())?;
    let second: u32 = match parts.next() {
        Some(s) => s.parse().map_err(|_| "bad seconds".to_string())?,
        None => 0,
    };

    if minute > 59 {
        return Err(format!("minutes must be below 60, got {minute}"));
    }
    if second > 59 {
        return Err(format!("seconds must be below 60, got {second}"));
    }
    if hour > 24 || (hour == 24 && (minute != 0 || second != 0)) {
        return Err(format!("hour out of range in '{text}'"));
    }
    Ok(hour * 3600 + minute * 60 + second)
}

fn parse_time_of_day(text: &str) -> Result<u32, String> {
    parse_clock(text)
}

/// Resolve string escapes: `\"`, `\\`, `\n`, `\t`; anything else keeps the
/// escaped character as-is.
fn unescape(raw: &str) -> SmolStr {
    if !raw.contains('\\') {
        return SmolStr::new(raw);
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    SmolStr::new(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn classes(text: &str) -> Vec<TokenClass> {
        lex_file(FileId(0), text)
            .expect("lexes")
            .into_iter()
            .map(|t| t.class)
            .collect()
    }

    #[test]
    fn test_lex_task_header() {
        let tokens = lex_file(FileId(0), "task t1 \"Task 1\" {").expect("lexes");
        assert_eq!(
            tokens.iter().map(|t| t.class).collect::<Vec<_>>(),
            vec![
                TokenClass::Id,
                TokenClass::Id,
                TokenClass::String,
                TokenClass::Literal
            ]
        );
        assert_eq!(tokens[0].text, "task");
        assert_eq!(tokens[2].value, TokenValue::Str("Task 1".into()));
    }

    #[test]
    fn test_lex_dates() {
        let tokens = lex_file(FileId(0), "2024-01-01 2024-3-5-13:45").expect("lexes");
        assert_eq!(tokens[0].value, TokenValue::Date(datetime!(2024-01-01 0:00)));
        assert_eq!(tokens[1].value, TokenValue::Date(datetime!(2024-03-05 13:45)));
    }

    #[test]
    fn test_lex_interval_with_separate_dash() {
        assert_eq!(
            classes("2024-01-01 - 2024-02-01"),
            vec![TokenClass::Date, TokenClass::Literal, TokenClass::Date]
        );
    }

    #[test]
    fn test_lex_times() {
        let tokens = lex_file(FileId(0), "9:00 24:00").expect("lexes");
        assert_eq!(tokens[0].value, TokenValue::Time(9 * 3600));
        assert_eq!(tokens[1].value, TokenValue::Time(24 * 3600));
    }

    #[test]
    fn test_lex_scenario_prefix() {
        let tokens = lex_file(FileId(0), "plan:start").expect("lexes");
        assert_eq!(tokens[0].class, TokenClass::IdWithColon);
        assert_eq!(tokens[0].value, TokenValue::Str("plan".into()));
        assert_eq!(tokens[1].class, TokenClass::Id);
    }

    #[test]
    fn test_lex_id_shapes() {
        assert_eq!(
            classes("t1 a.b.c !up !!top.sub"),
            vec![
                TokenClass::Id,
                TokenClass::AbsoluteId,
                TokenClass::RelativeId,
                TokenClass::RelativeId
            ]
        );
    }

    #[test]
    fn test_lex_effort_value_splits_number_and_unit() {
        assert_eq!(classes("effort 2d"), vec![
            TokenClass::Id,
            TokenClass::Integer,
            TokenClass::Id
        ]);
    }

    #[test]
    fn test_lex_macro_body_keeps_raw_text() {
        let tokens = lex_file(FileId(0), "macro m [ effort ${1} ]").expect("lexes");
        assert_eq!(tokens[2].class, TokenClass::MacroBody);
        assert_eq!(tokens[2].value, TokenValue::Str(" effort ${1} ".into()));
    }

    #[test]
    fn test_lex_macro_call() {
        let tokens = lex_file(FileId(0), "${alloc \"dev1\"}").expect("lexes");
        assert_eq!(tokens[0].class, TokenClass::MacroCall);
        assert_eq!(tokens[0].text, "${alloc \"dev1\"}");
    }

    #[test]
    fn test_lex_comments_are_trivia() {
        assert_eq!(
            classes("task # trailing words\n/* block */ t1"),
            vec![TokenClass::Id, TokenClass::Id]
        );
    }

    #[test]
    fn test_lex_comparison_operators() {
        let tokens = lex_file(FileId(0), "<= >= < > = ~ & |").expect("lexes");
        assert!(tokens.iter().all(|t| t.class == TokenClass::Literal));
        assert_eq!(tokens[0].text, "<=");
        assert_eq!(tokens[1].text, ">=");
    }

    #[test]
    fn test_bad_date_is_rejected() {
        let err = lex_file(FileId(0), "2024-13-01").expect_err("month 13");
        assert_eq!(err.code(), Some(ErrorCode::T0103));
    }

    #[test]
    fn test_bad_time_is_rejected() {
        let err = lex_file(FileId(0), "25:00").expect_err("hour 25");
        assert_eq!(err.code(), Some(ErrorCode::T0104));
    }

    #[test]
    fn test_unterminated_string_is_rejected() {
        let err = lex_file(FileId(0), "\"no closing quote").expect_err("unterminated");
        assert_eq!(err.code(), Some(ErrorCode::T0102));
    }

    #[test]
    fn test_unterminated_macro_body_is_rejected() {
        let err = lex_file(FileId(0), "macro m [ never closed").expect_err("unterminated");
        assert_eq!(err.code(), Some(ErrorCode::T0105));
    }

    #[test]
    fn test_string_escapes() {
        let tokens = lex_file(FileId(0), r#""a \"quoted\" word\n""#).expect("lexes");
        assert_eq!(
            tokens[0].value,
            TokenValue::Str("a \"quoted\" word\n".into())
        );
    }
}
