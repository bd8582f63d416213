//! Buffered token source: include stack, macro expansion, pushback
//!
//! The matcher consumes tokens one at a time with one-token lookahead
//! (`peek` is `next` + `push_back`). Beneath that surface the stream keeps
//! a stack of frames: the root file at the bottom, `include`d files and
//! macro expansions pushed on top. A frame's tokens are consumed until
//! exhaustion, then control falls back to the frame below - a nested
//! substitution, not concurrency.

use std::path::Path;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use text_size::{TextRange, TextSize};
use tracing::debug;

use crate::base::{resolve_include_path, FileId, SourceMap, SourceRef};

use super::errors::{ErrorCode, Message, ParseError};
use super::lexer::lex_file;
use super::tokens::{Token, TokenClass};

/// Cap on nested macro expansions; a self-calling macro hits this instead
/// of overflowing the stack.
const MAX_MACRO_DEPTH: usize = 64;

/// One defined macro: raw body text plus where it was declared.
#[derive(Debug, Clone)]
pub struct Macro {
    pub name: SmolStr,
    pub body: SmolStr,
    pub at: SourceRef,
}

struct Frame {
    /// File providing relative-path context; for expansions, the file of
    /// the call site.
    file: FileId,
    /// Display name for cycle detection and tracing.
    name: String,
    is_expansion: bool,
    tokens: std::vec::IntoIter<Token>,
}

/// The token source the matcher reads from.
pub struct TokenStream {
    sources: SourceMap,
    frames: Vec<Frame>,
    pushback: Vec<Token>,
    macros: FxHashMap<SmolStr, Macro>,
    eof_at: SourceRef,
}

impl TokenStream {
    /// Open a stream over in-memory text registered under `name`.
    pub fn from_text(name: impl Into<String>, text: impl Into<String>) -> Result<Self, ParseError> {
        let mut sources = SourceMap::new();
        let name = name.into();
        let file = sources.insert(name.clone(), text);
        Self::with_root(sources, file, name)
    }

    /// Open a stream over a file on disk.
    pub fn from_file(path: &Path) -> Result<Self, ParseError> {
        let mut sources = SourceMap::new();
        let file = sources.load(path).map_err(|source| ParseError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let name = sources.name(file).to_string();
        Self::with_root(sources, file, name)
    }

    fn with_root(sources: SourceMap, file: FileId, name: String) -> Result<Self, ParseError> {
        let tokens = lex_file(file, sources.text(file))?;
        let end = TextSize::of(sources.text(file));
        let eof_at = SourceRef::new(file, TextRange::empty(end));
        Ok(Self {
            sources,
            frames: vec![Frame {
                file,
                name,
                is_expansion: false,
                tokens: tokens.into_iter(),
            }],
            pushback: Vec::new(),
            macros: FxHashMap::default(),
            eof_at,
        })
    }

    /// Next token; macro calls expand transparently, exhausted frames pop.
    /// Past the end of all input this returns EOF tokens forever.
    pub fn next(&mut self) -> Result<Token, ParseError> {
        if let Some(token) = self.pushback.pop() {
            return Ok(token);
        }
        loop {
            let Some(frame) = self.frames.last_mut() else {
                return Ok(Token::eof(self.eof_at));
            };
            match frame.tokens.next() {
                Some(token) if token.class == TokenClass::MacroCall => {
                    self.expand_macro(token)?;
                }
                Some(token) => return Ok(token),
                None => {
                    if let Some(done) = self.frames.pop() {
                        debug!(frame = %done.name, "token frame exhausted");
                    }
                }
            }
        }
    }

    /// One-token lookahead.
    pub fn peek(&mut self) -> Result<Token, ParseError> {
        let token = self.next()?;
        self.pushback.push(token.clone());
        Ok(token)
    }

    /// Return a token to the stream; it is handed out again before any
    /// further frame tokens.
    pub fn push_back(&mut self, token: Token) {
        self.pushback.push(token);
    }

    /// File the innermost frame reads from.
    pub fn current_file(&self) -> FileId {
        self.frames
            .last()
            .map(|f| f.file)
            .unwrap_or(self.eof_at.file)
    }

    pub fn sources(&self) -> &SourceMap {
        &self.sources
    }

    /// Surrender the source map once parsing is over, for rendering
    /// diagnostics.
    pub fn into_sources(self) -> SourceMap {
        self.sources
    }

    // =========================================================================
    // Includes
    // =========================================================================

    /// Push `target` (resolved relative to the including file) as a new
    /// frame. Unreadable files and inclusion cycles are fatal.
    pub fn include(&mut self, target: &str, at: SourceRef) -> Result<(), ParseError> {
        let from = self.sources.name(self.current_file());
        let path = resolve_include_path(from, target);
        let name = path.display().to_string();

        if self.frames.iter().any(|f| !f.is_expansion && f.name == name) {
            return Err(Message::error(
                ErrorCode::T0602,
                format!("inclusion of '{name}' would form a cycle"),
            )
            .at(at)
            .into());
        }

        let text = std::fs::read_to_string(&path).map_err(|e| {
            Message::error(ErrorCode::T0601, format!("cannot read '{name}': {e}")).at(at)
        })?;
        let file = self.sources.insert(name.clone(), text);
        let tokens = lex_file(file, self.sources.text(file))?;
        debug!(file = %name, tokens = tokens.len(), "include pushed");
        self.frames.push(Frame {
            file,
            name,
            is_expansion: false,
            tokens: tokens.into_iter(),
        });
        Ok(())
    }

    // =========================================================================
    // Macros
    // =========================================================================

    /// Define or replace a macro. Returns the previous definition when the
    /// name was already taken, so the caller can warn about it.
    pub fn define_macro(
        &mut self,
        name: impl Into<SmolStr>,
        body: impl Into<SmolStr>,
        at: SourceRef,
    ) -> Option<Macro> {
        let name = name.into();
        self.macros.insert(
            name.clone(),
            Macro {
                name,
                body: body.into(),
                at,
            },
        )
    }

    pub fn has_macro(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    fn expansion_depth(&self) -> usize {
        self.frames.iter().filter(|f| f.is_expansion).count()
    }

    fn expand_macro(&mut self, call: Token) -> Result<(), ParseError> {
        if self.expansion_depth() >= MAX_MACRO_DEPTH {
            return Err(Message::from_code(ErrorCode::T0605).at(call.at).into());
        }

        let (name, args) = parse_macro_call(&call.text, call.at)?;
        if name.chars().all(|c| c.is_ascii_digit()) {
            return Err(Message::error(
                ErrorCode::T0604,
                format!("argument reference ${{{name}}} outside a macro body"),
            )
            .at(call.at)
            .into());
        }
        let def = self.macros.get(&name).ok_or_else(|| {
            Message::error(ErrorCode::T0603, format!("undefined macro '{name}'")).at(call.at)
        })?;

        let body = substitute_args(&def.body, &name, &args, call.at)?;
        // Expanded tokens (and lex errors in the body) report the call
        // site, not positions inside the synthetic body text.
        let tokens: Vec<Token> = lex_file(call.at.file, &body)
            .map_err(|e| match e {
                ParseError::Diagnostic(m) => ParseError::Diagnostic(m.at(call.at)),
                other => other,
            })?
            .into_iter()
            .map(|mut t| {
                t.at = call.at;
                t
            })
            .collect();
        debug!(macro_name = %name, tokens = tokens.len(), "macro expanded");
        self.frames.push(Frame {
            file: call.at.file,
            name: format!("${{{name}}}"),
            is_expansion: true,
            tokens: tokens.into_iter(),
        });
        Ok(())
    }
}

/// Split `${name "arg" ...}` into the macro name and its arguments.
fn parse_macro_call(text: &str, at: SourceRef) -> Result<(SmolStr, Vec<SmolStr>), ParseError> {
    let inner = text
        .strip_prefix("${")
        .and_then(|t| t.strip_suffix('}'))
        .unwrap_or(text)
        .trim();

    let name_len = inner
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .count();
    if name_len == 0 {
        return Err(
            Message::error(ErrorCode::T0604, "macro call is missing a name")
                .at(at)
                .into(),
        );
    }
    let name = SmolStr::new(&inner[..name_len]);

    let mut args = Vec::new();
    let mut rest = inner[name_len..].trim_start();
    while !rest.is_empty() {
        let Some(stripped) = rest.strip_prefix('"') else {
            return Err(Message::error(
                ErrorCode::T0604,
                format!("macro arguments must be quoted strings, found '{rest}'"),
            )
            .at(at)
            .into());
        };
        let mut end = None;
        let mut escaped = false;
        for (i, c) in stripped.char_indices() {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                end = Some(i);
                break;
            }
        }
        let Some(end) = end else {
            return Err(
                Message::error(ErrorCode::T0604, "unterminated macro argument")
                    .at(at)
                    .into(),
            );
        };
        args.push(SmolStr::new(&stripped[..end]));
        rest = stripped[end + 1..].trim_start();
    }
    Ok((name, args))
}

/// Replace `${1}`..`${9}` in a macro body with the call's arguments.
/// Everything else, including nested `${...}` calls, passes through raw.
fn substitute_args(
    body: &str,
    name: &str,
    args: &[SmolStr],
    at: SourceRef,
) -> Result<String, ParseError> {
    let mut out = String::with_capacity(body.len());
    let mut rest = body;
    while let Some(pos) = rest.find("${") {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 2..];
        let digit = after.chars().next().and_then(|c| c.to_digit(10));
        match digit {
            Some(d) if after[1..].starts_with('}') => {
                let index = d as usize;
                let arg = index
                    .checked_sub(1)
                    .and_then(|i| args.get(i))
                    .ok_or_else(|| {
                        Message::error(
                            ErrorCode::T0604,
                            format!("macro '{name}' called without argument ${{{index}}}"),
                        )
                        .at(at)
                    })?;
                out.push_str(arg);
                rest = &after[2..];
            }
            _ => {
                out.push_str("${");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(text: &str) -> TokenStream {
        TokenStream::from_text("test.tjp", text).expect("stream opens")
    }

    fn texts(stream: &mut TokenStream) -> Vec<String> {
        let mut out = Vec::new();
        loop {
            let token = stream.next().expect("token");
            if token.is_eof() {
                return out;
            }
            out.push(token.text.to_string());
        }
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut s = stream("task t1");
        assert_eq!(s.peek().unwrap().text, "task");
        assert_eq!(s.peek().unwrap().text, "task");
        assert_eq!(s.next().unwrap().text, "task");
        assert_eq!(s.next().unwrap().text, "t1");
        assert!(s.next().unwrap().is_eof());
    }

    #[test]
    fn test_push_back_is_handed_out_first() {
        let mut s = stream("a b");
        let a = s.next().unwrap();
        s.push_back(a);
        assert_eq!(texts(&mut s), vec!["a", "b"]);
    }

    #[test]
    fn test_eof_repeats() {
        let mut s = stream("");
        assert!(s.next().unwrap().is_eof());
        assert!(s.next().unwrap().is_eof());
    }

    #[test]
    fn test_macro_expansion() {
        let mut s = stream("${m}");
        let at = s.eof_at;
        s.define_macro("m", "effort 8", at);
        assert_eq!(texts(&mut s), vec!["effort", "8"]);
    }

    #[test]
    fn test_macro_positional_args() {
        let mut s = stream("${alloc \"dev1\" \"dev2\"} end");
        let at = s.eof_at;
        s.define_macro("alloc", "allocate ${1}, ${2}", at);
        assert_eq!(texts(&mut s), vec!["allocate", "dev1", ",", "dev2", "end"]);
    }

    #[test]
    fn test_macro_tokens_report_the_call_site() {
        let mut s = stream("${m}");
        let at = s.eof_at;
        s.define_macro("m", "effort 8", at);
        let call_file = s.current_file();
        let token = s.next().unwrap();
        assert_eq!(token.at.file, call_file);
        assert_eq!(token.at.range, TextRange::new(0.into(), 4.into()));
    }

    #[test]
    fn test_nested_macro_expansion() {
        let mut s = stream("${outer}");
        let at = s.eof_at;
        s.define_macro("inner", "2", at);
        s.define_macro("outer", "effort ${inner}", at);
        assert_eq!(texts(&mut s), vec!["effort", "2"]);
    }

    #[test]
    fn test_undefined_macro_is_fatal() {
        let mut s = stream("${ghost}");
        let err = s.next().expect_err("undefined");
        assert_eq!(err.code(), Some(ErrorCode::T0603));
    }

    #[test]
    fn test_missing_argument_is_fatal() {
        let mut s = stream("${m \"one\"}");
        let at = s.eof_at;
        s.define_macro("m", "${1} ${2}", at);
        let err = s.next().expect_err("missing ${2}");
        assert_eq!(err.code(), Some(ErrorCode::T0604));
    }

    #[test]
    fn test_argument_reference_outside_macro_is_fatal() {
        let mut s = stream("${1}");
        let err = s.next().expect_err("bare ${1}");
        assert_eq!(err.code(), Some(ErrorCode::T0604));
    }

    #[test]
    fn test_self_recursive_macro_hits_the_depth_cap() {
        let mut s = stream("${m}");
        let at = s.eof_at;
        s.define_macro("m", "${m}", at);
        let err = s.next().expect_err("recursion");
        assert_eq!(err.code(), Some(ErrorCode::T0605));
    }

    #[test]
    fn test_redefining_a_macro_returns_the_old_one() {
        let mut s = stream("");
        let at = s.eof_at;
        assert!(s.define_macro("m", "1", at).is_none());
        let old = s.define_macro("m", "2", at).expect("previous definition");
        assert_eq!(old.body, "1");
    }

    #[test]
    fn test_include_pushes_and_pops() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sub = dir.path().join("tasks.tji");
        std::fs::write(&sub, "task sub \"Sub\"").expect("write");

        let root = dir.path().join("main.tjp");
        std::fs::write(&root, "before after").expect("write");

        let mut s = TokenStream::from_file(&root).expect("stream opens");
        let before = s.next().unwrap();
        assert_eq!(before.text, "before");
        s.include("tasks.tji", before.at).expect("include");
        assert_eq!(texts(&mut s), vec!["task", "sub", "\"Sub\"", "after"]);
    }

    #[test]
    fn test_include_cycle_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("main.tjp");
        std::fs::write(&root, "x").expect("write");

        let mut s = TokenStream::from_file(&root).expect("stream opens");
        let x = s.next().unwrap();
        let err = s.include("main.tjp", x.at).expect_err("cycle");
        assert_eq!(err.code(), Some(ErrorCode::T0602));
    }

    #[test]
    fn test_missing_include_is_fatal() {
        let mut s = stream("x");
        let x = s.next().unwrap();
        let err = s.include("nowhere.tji", x.at).expect_err("missing");
        assert_eq!(err.code(), Some(ErrorCode::T0601));
    }
}
