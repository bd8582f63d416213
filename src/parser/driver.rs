//! The parse driver: one call from file or text to a finished [`Project`].
//!
//! Each run builds a fresh grammar catalog, so `extend` declarations are
//! scoped to the file that made them, then matches the root rule and
//! finishes with reference resolution. Dependency targets may point
//! forward in the file; nothing about them is checked until the whole
//! token stream has been consumed.

use std::cell::RefCell;
use std::fmt::Write as _;
use std::mem;
use std::path::Path;
use std::rc::Rc;

use tracing::debug;

use crate::base::SourceMap;
use crate::model::{PathRef, Project};

use super::context::ParseCtx;
use super::engine::RuleMatcher;
use super::errors::{ErrorCode, Message, MessageLog, ParseError};
use super::grammar::{self, ROOT_RULE};
use super::stream::TokenStream;
use super::syntax::Symbol;
use super::tokens::TokenClass;

/// Parses `.tjp` project files.
///
/// The parser is reusable; warnings and the source map always describe
/// the most recent run.
pub struct ProjectFileParser {
    warnings: MessageLog,
    sources: Option<SourceMap>,
}

impl ProjectFileParser {
    pub fn new() -> Self {
        Self {
            warnings: MessageLog::new(),
            sources: None,
        }
    }

    /// Parse a project file from disk. `include` paths resolve relative
    /// to it.
    pub fn parse_file(&mut self, path: &Path) -> Result<Project, ParseError> {
        debug!(path = %path.display(), "parsing project file");
        let stream = TokenStream::from_file(path)?;
        self.run(stream)
    }

    /// Parse a project from an in-memory string. `name` labels the text
    /// in diagnostics.
    pub fn parse_str(
        &mut self,
        name: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<Project, ParseError> {
        let stream = TokenStream::from_text(name, text)?;
        self.run(stream)
    }

    /// Warnings collected during the most recent parse, in source order.
    pub fn warnings(&self) -> &[Message] {
        self.warnings.messages()
    }

    /// Sources read by the most recent parse (main file plus includes),
    /// for rendering diagnostics.
    pub fn sources(&self) -> Option<&SourceMap> {
        self.sources.as_ref()
    }

    fn run(&mut self, mut stream: TokenStream) -> Result<Project, ParseError> {
        let registry = Rc::new(RefCell::new(grammar::build_catalog()));
        let mut ctx = ParseCtx::new(registry.clone());

        let outcome = {
            let mut matcher = RuleMatcher::new(registry, &mut stream);
            matcher.match_rule(ROOT_RULE, &mut ctx)
        };
        let outcome = outcome.and_then(|value| {
            let token = stream.peek()?;
            if !token.is_eof() {
                return Err(Message::error(
                    ErrorCode::T0201,
                    format!(
                        "unexpected {} after the end of the project definition",
                        token.describe()
                    ),
                )
                .at(token.at)
                .into());
            }
            Ok(value)
        });

        // Keep warnings and sources around even when the parse failed;
        // callers want them for rendering the error.
        self.sources = Some(stream.into_sources());
        self.warnings = mem::take(&mut ctx.log);
        outcome?;

        let mut project = ctx.project.take().ok_or_else(|| {
            ParseError::from(Message::error(
                ErrorCode::T0302,
                "the file does not define a project",
            ))
        })?;
        resolve_references(&mut project)?;
        debug!(
            tasks = project.tasks.len(),
            resources = project.resources.len(),
            reports = project.reports.len(),
            warnings = self.warnings.warning_count(),
            "parse finished"
        );
        Ok(project)
    }
}

impl Default for ProjectFileParser {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Reference resolution
// ============================================================================

/// Resolve every textual property reference that was allowed to point
/// forward: dependency targets, `responsible`, allocation candidates.
fn resolve_references(project: &mut Project) -> Result<(), ParseError> {
    for index in 0..project.tasks.len() {
        let parent = project.tasks.get(index).parent;

        let targets: Vec<PathRef> = project
            .tasks
            .get(index)
            .dependencies
            .iter()
            .map(|dependency| dependency.target.clone())
            .collect();
        for (position, target) in targets.iter().enumerate() {
            let resolved = resolve_task_path(project, parent, target)?;
            project.tasks.get_mut(index).dependencies[position].resolved = Some(resolved);
        }

        if let Some(who) = project.tasks.get(index).responsible.clone() {
            lookup_resource(project, &who)?;
        }

        let candidate_lists: Vec<Vec<PathRef>> = project
            .tasks
            .get(index)
            .allocations
            .iter()
            .map(|allocation| allocation.candidates.clone())
            .collect();
        for (position, candidates) in candidate_lists.iter().enumerate() {
            let mut resolved = Vec::with_capacity(candidates.len());
            for candidate in candidates {
                resolved.push(lookup_resource(project, candidate)?);
            }
            project.tasks.get_mut(index).allocations[position].resolved = resolved;
        }
    }
    Ok(())
}

fn lookup_resource(project: &Project, reference: &PathRef) -> Result<usize, ParseError> {
    project.resources.lookup(&reference.text).ok_or_else(|| {
        Message::error(
            ErrorCode::T0304,
            format!("resource '{}' is not defined", reference.text),
        )
        .at(reference.at)
        .into()
    })
}

/// Resolve a dependency target from the scope of the depending task.
///
/// A plain id names a sibling, falling back to the top level; a dotted id
/// is absolute; `!` anchors at the enclosing scope and every further `!`
/// climbs one level higher.
fn resolve_task_path(
    project: &Project,
    from_parent: Option<usize>,
    target: &PathRef,
) -> Result<usize, ParseError> {
    let text = target.text.as_str();
    let not_found = || {
        ParseError::from(
            Message::error(ErrorCode::T0304, format!("task '{text}' is not defined"))
                .at(target.at),
        )
    };

    if text.starts_with('!') {
        let rest = text.trim_start_matches('!');
        let bangs = text.len() - rest.len();
        let mut anchor = from_parent;
        for _ in 1..bangs {
            anchor = anchor.and_then(|index| project.tasks.get(index).parent);
        }
        let full = match anchor {
            Some(index) => format!("{}.{rest}", project.tasks.get(index).full_id),
            None => rest.to_string(),
        };
        return project.tasks.lookup(&full).ok_or_else(not_found);
    }

    if text.contains('.') {
        return project.tasks.lookup(text).ok_or_else(not_found);
    }

    if let Some(parent) = from_parent {
        let sibling = format!("{}.{text}", project.tasks.get(parent).full_id);
        if let Some(index) = project.tasks.lookup(&sibling) {
            return Ok(index);
        }
    }
    project.tasks.lookup(text).ok_or_else(not_found)
}

// ============================================================================
// Syntax reference
// ============================================================================

/// Render the documented part of the grammar as plain text, in rule
/// declaration order. Only patterns carrying documentation appear.
pub fn syntax_reference() -> String {
    let registry = grammar::build_catalog();
    let mut out = String::new();
    for rule in registry.rules() {
        for pattern in &rule.patterns {
            let Some(doc) = &pattern.doc else { continue };

            let header = format!("== {} ", doc.title);
            let _ = writeln!(out, "{header:=<76}");
            let usage: Vec<String> = pattern.symbols.iter().map(usage_token).collect();
            let _ = writeln!(out, "\n  {}\n", usage.join(" "));
            let _ = writeln!(out, "  {}\n", doc.text);
            if !doc.args.is_empty() {
                let width = doc.args.iter().map(|arg| arg.name.len()).max().unwrap_or(0);
                for arg in &doc.args {
                    let _ = writeln!(out, "  {:width$}  {}", arg.name, arg.text);
                }
                out.push('\n');
            }
            if !doc.see_also.is_empty() {
                let refs: Vec<&str> = doc.see_also.iter().map(|name| name.as_str()).collect();
                let _ = writeln!(out, "  See also: {}\n", refs.join(", "));
            }
        }
    }
    out
}

fn usage_token(symbol: &Symbol) -> String {
    match symbol {
        Symbol::Keyword(text) => text.to_string(),
        Symbol::Terminal(class) => match class {
            TokenClass::Integer => "<integer>".into(),
            TokenClass::Float => "<number>".into(),
            TokenClass::Date => "<date>".into(),
            TokenClass::Time => "<time>".into(),
            TokenClass::String => "<string>".into(),
            TokenClass::Id => "<id>".into(),
            TokenClass::IdWithColon => "<scenario>:".into(),
            TokenClass::AbsoluteId | TokenClass::RelativeId => "<path>".into(),
            TokenClass::MacroBody => "[ body ]".into(),
            other => format!("<{}>", other.describe()),
        },
        Symbol::NonTerminal(name) => format!("<{name}>"),
    }
}
