//! Parser and project model for the TJP project-description language.
//!
//! A TJP file declares a project, its calendar, scenarios, a task tree,
//! resources, and report definitions. This crate turns such a file into a
//! [`Project`]: lexing, rule-table parsing with one token of lookahead,
//! semantic actions that build the model, and post-parse reference
//! resolution. Two properties of the language shape the design:
//!
//! - The grammar is extensible at runtime. An `extend task { ... }`
//!   declaration adds user-defined attributes, and the new keywords are
//!   valid from the next line on. Rules therefore live in a mutable
//!   [`parser::SyntaxRegistry`] that semantic actions may splice patterns
//!   into mid-parse.
//! - Report filters embed a small logical expression language, parsed
//!   into [`logical`] trees and evaluated later per task or resource.
//!
//! ```
//! use tjplan::ProjectFileParser;
//!
//! let text = r#"
//! project acme "Accounting" "1.0" 2024-01-01 - 2024-06-01 { }
//! task build "Build the software" { effort 2d }
//! "#;
//!
//! let mut parser = ProjectFileParser::new();
//! let project = parser.parse_str("acme.tjp", text)?;
//! assert_eq!(project.tasks.len(), 1);
//! let build = project.tasks.get(0);
//! assert_eq!(build.effort.get(0), Some(&57_600));
//! # Ok::<(), tjplan::ParseError>(())
//! ```

pub mod base;
pub mod logical;
pub mod model;
pub mod parser;

pub use model::Project;
pub use parser::errors::{ErrorCode, Message, MessageLog, ParseError, Severity};
pub use parser::{syntax_reference, ProjectFileParser};
