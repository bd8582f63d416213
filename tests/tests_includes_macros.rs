//! End-to-end tests for file inclusion and macro expansion.
//!
//! Both take effect mid-parse: an `include` splices the named file into
//! the token stream right behind the statement, and macros expand at the
//! call site with positional `${n}` arguments.

use std::fs;

use tempfile::TempDir;
use tjplan::{ErrorCode, Project, ProjectFileParser, Severity};

const HEADER: &str = r#"project acme "Accounting" "1.0" 2024-01-01 - 2024-06-01 { }
"#;

/// Parse the body after a minimal project header.
fn parse(body: &str) -> Project {
    let mut parser = ProjectFileParser::new();
    parser
        .parse_str("test.tjp", format!("{HEADER}{body}"))
        .expect("input should parse")
}

// ============================================================================
// Includes
// ============================================================================

#[test]
fn test_included_files_splice_into_the_stream() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("tasks.tji"), "task inc \"Included\" { effort 1d }\n").unwrap();
    fs::write(
        dir.path().join("main.tjp"),
        format!("{HEADER}include \"tasks.tji\"\ntask after \"After\"\n"),
    )
    .unwrap();

    let mut parser = ProjectFileParser::new();
    let project = parser
        .parse_file(&dir.path().join("main.tjp"))
        .expect("Should parse across files");

    let inc = project.tasks.lookup("inc").expect("included task exists");
    assert_eq!(project.tasks.get(inc).effort.get(0), Some(&28_800));
    // Parsing continues in the including file afterwards.
    assert!(project.tasks.lookup("after").is_some());
}

#[test]
fn test_includes_resolve_relative_to_the_including_file() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(
        dir.path().join("sub/level1.tji"),
        "task one \"One\"\ninclude \"level2.tji\"\n",
    )
    .unwrap();
    fs::write(dir.path().join("sub/level2.tji"), "task two \"Two\"\n").unwrap();
    fs::write(
        dir.path().join("main.tjp"),
        format!("{HEADER}include \"sub/level1.tji\"\n"),
    )
    .unwrap();

    let mut parser = ProjectFileParser::new();
    let project = parser
        .parse_file(&dir.path().join("main.tjp"))
        .expect("Should resolve the nested include");
    assert!(project.tasks.lookup("one").is_some());
    assert!(project.tasks.lookup("two").is_some());
}

#[test]
fn test_includes_work_inside_the_project_body() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("flags.tji"), "flags urgent\n").unwrap();
    fs::write(
        dir.path().join("main.tjp"),
        "project acme \"Accounting\" \"1.0\" 2024-01-01 - 2024-06-01 {\n  include \"flags.tji\"\n}\n",
    )
    .unwrap();

    let mut parser = ProjectFileParser::new();
    let project = parser
        .parse_file(&dir.path().join("main.tjp"))
        .expect("Should parse the included attributes");
    assert!(project.has_flag("urgent"));
}

#[test]
fn test_missing_include_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("main.tjp"),
        format!("{HEADER}include \"ghost.tji\"\n"),
    )
    .unwrap();

    let mut parser = ProjectFileParser::new();
    let err = parser
        .parse_file(&dir.path().join("main.tjp"))
        .expect_err("missing file should be fatal");
    assert_eq!(err.code(), Some(ErrorCode::T0601));
}

#[test]
fn test_include_cycles_are_fatal() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("loop.tji"), "include \"loop.tji\"\n").unwrap();
    fs::write(
        dir.path().join("main.tjp"),
        format!("{HEADER}include \"loop.tji\"\n"),
    )
    .unwrap();

    let mut parser = ProjectFileParser::new();
    let err = parser
        .parse_file(&dir.path().join("main.tjp"))
        .expect_err("cycle should be fatal");
    assert_eq!(err.code(), Some(ErrorCode::T0602));
}

// ============================================================================
// Macros
// ============================================================================

#[test]
fn test_macros_expand_where_they_are_called() {
    let project = parse(
        r#"
macro halfday [effort 4h]
task a "A" { ${halfday} }
"#,
    );
    assert_eq!(project.tasks.get(0).effort.get(0), Some(&14_400));
}

#[test]
fn test_macro_arguments_substitute_positionally() {
    let project = parse(
        r#"
macro profile [
  effort ${1}
  priority ${2}
]
task a "A" { ${profile "2d" "900"} }
"#,
    );
    let task = project.tasks.get(0);
    assert_eq!(task.effort.get(0), Some(&57_600));
    assert_eq!(task.priority, Some(900));
}

#[test]
fn test_macros_may_produce_whole_properties() {
    let project = parse(
        r#"
macro boiler [task ${1} "${2}" { effort 1d }]
${boiler "a" "Task A"}
${boiler "b" "Task B"}
"#,
    );
    assert_eq!(project.tasks.len(), 2);
    assert_eq!(project.tasks.get(project.tasks.lookup("a").unwrap()).name, "Task A");
    assert_eq!(project.tasks.get(project.tasks.lookup("b").unwrap()).name, "Task B");
}

#[test]
fn test_macros_must_be_defined_before_use() {
    let mut parser = ProjectFileParser::new();
    let err = parser
        .parse_str("test.tjp", format!("{HEADER}task a \"A\" {{ ${{ghost}} }}\n"))
        .expect_err("undefined macro should be fatal");
    assert_eq!(err.code(), Some(ErrorCode::T0603));
}

#[test]
fn test_macro_redefinition_warns_and_replaces() {
    let mut parser = ProjectFileParser::new();
    let project = parser
        .parse_str(
            "test.tjp",
            format!(
                r#"{HEADER}
macro m [effort 1d]
macro m [effort 2d]
task a "A" {{ ${{m}} }}
"#
            ),
        )
        .expect("redefinition is not fatal");

    // The later definition wins.
    assert_eq!(project.tasks.get(0).effort.get(0), Some(&57_600));

    let warning = parser
        .warnings()
        .iter()
        .find(|m| m.code == ErrorCode::T0606)
        .expect("redefinition leaves a warning");
    assert_eq!(warning.severity, Severity::Warning);
    assert!(warning.text.contains("'m'"), "got: {}", warning.text);
}
