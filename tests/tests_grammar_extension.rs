//! End-to-end tests for `extend`: user-defined attributes spliced into
//! the running grammar.

use time::macros::datetime;
use tjplan::model::{AttributeType, AttributeValue};
use tjplan::{ErrorCode, ParseError, ProjectFileParser};

/// Parse a complete file, failing the test on a diagnostic.
fn parse(text: &str) -> tjplan::Project {
    let mut parser = ProjectFileParser::new();
    parser
        .parse_str("test.tjp", text)
        .expect("input should parse")
}

/// Parse a complete file that must fail, returning the diagnostic record.
fn parse_diagnostic(text: &str) -> tjplan::Message {
    let mut parser = ProjectFileParser::new();
    let err = parser
        .parse_str("test.tjp", text)
        .expect_err("input should be rejected");
    match err {
        ParseError::Diagnostic(message) => message,
        other => panic!("expected a diagnostic, got {other}"),
    }
}

// ============================================================================
// Definition and use
// ============================================================================

#[test]
fn test_extended_attributes_become_keywords() {
    let project = parse(
        r#"
project acme "Accounting" "1.0" 2024-01-01 - 2024-06-01 {
  extend task {
    reference Spec "Specification"
  }
}
task build "Build" {
  Spec "http://example.com/spec"
}
"#,
    );

    let def = project.task_attributes.get("Spec").expect("attribute defined");
    assert_eq!(def.title, "Specification");
    assert_eq!(def.attr_type, AttributeType::Reference);
    assert!(!def.inherited);
    assert!(!def.scenario_specific);
    // Task and resource registries are separate.
    assert!(project.resource_attributes.get("Spec").is_none());

    let build = project.tasks.get(0);
    assert_eq!(
        build.extended.value("Spec", &project.scenarios, 0),
        Some(&AttributeValue::Reference("http://example.com/spec".into()))
    );
}

#[test]
fn test_date_and_text_attribute_kinds() {
    let project = parse(
        r#"
project acme "Accounting" "1.0" 2024-01-01 - 2024-06-01 {
  extend task {
    date Review "Review date"
    text Notes "Free-form notes"
  }
}
task build "Build" {
  Review 2024-05-01
  Notes "needs a second pair of eyes"
}
"#,
    );
    let build = project.tasks.get(0);
    assert_eq!(
        build.extended.value("Review", &project.scenarios, 0),
        Some(&AttributeValue::Date(datetime!(2024-05-01 0:00)))
    );
    assert_eq!(
        build.extended.value("Notes", &project.scenarios, 0),
        Some(&AttributeValue::Text("needs a second pair of eyes".into()))
    );
}

#[test]
fn test_extend_resource() {
    let project = parse(
        r#"
project acme "Accounting" "1.0" 2024-01-01 - 2024-06-01 {
  extend resource {
    text Badge "Badge color"
  }
}
resource dev "Dev" {
  Badge "blue"
}
"#,
    );
    assert!(project.resource_attributes.get("Badge").is_some());
    assert_eq!(
        project.resources.get(0).extended.value("Badge", &project.scenarios, 0),
        Some(&AttributeValue::Text("blue".into()))
    );
}

#[test]
fn test_option_flags_are_recorded() {
    let project = parse(
        r#"
project acme "Accounting" "1.0" 2024-01-01 - 2024-06-01 {
  extend resource {
    reference Handbook "Handbook page" { inherit scenariospecific }
  }
}
"#,
    );
    let def = project.resource_attributes.get("Handbook").expect("attribute defined");
    assert!(def.inherited);
    assert!(def.scenario_specific);
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_lowercase_names_are_rejected() {
    let message = parse_diagnostic(
        r#"
project acme "Accounting" "1.0" 2024-01-01 - 2024-06-01 {
  extend task {
    text notes "Notes"
  }
}
"#,
    );
    assert_eq!(message.code, ErrorCode::T0501);
    let hint = message.hint.expect("hint suggests the fix");
    assert!(hint.contains("'Notes'"), "hint should capitalize the name: {hint}");
}

#[test]
fn test_redefining_an_attribute_is_rejected() {
    let message = parse_diagnostic(
        r#"
project acme "Accounting" "1.0" 2024-01-01 - 2024-06-01 {
  extend task {
    text Spec "First"
    reference Spec "Second"
  }
}
"#,
    );
    assert_eq!(message.code, ErrorCode::T0503);
}

#[test]
fn test_unknown_attributes_stay_rejected() {
    let message = parse_diagnostic(
        r#"
project acme "Accounting" "1.0" 2024-01-01 - 2024-06-01 { }
task build "Build" {
  wibble
}
"#,
    );
    assert_eq!(message.code, ErrorCode::T0201);
    let hint = message.hint.expect("hint names the stray word");
    assert!(hint.contains("wibble"), "got: {hint}");
}

// ============================================================================
// Scenario-specific storage
// ============================================================================

#[test]
fn test_scenario_specific_attributes_take_a_prefix() {
    let project = parse(
        r#"
project acme "Accounting" "1.0" 2024-01-01 - 2024-06-01 {
  scenario plan "Plan" { scenario delayed "Delayed" }
  extend task {
    date Deadline "Drop-dead date" { scenariospecific }
  }
}
task build "Build" {
  Deadline 2024-05-01
  delayed: Deadline 2024-05-15
}
task other "Other" {
  Deadline 2024-04-01
}
"#,
    );
    let tree = &project.scenarios;

    let build = project.tasks.get(project.tasks.lookup("build").unwrap());
    assert_eq!(
        build.extended.value("Deadline", tree, 0),
        Some(&AttributeValue::Date(datetime!(2024-05-01 0:00)))
    );
    assert_eq!(
        build.extended.value("Deadline", tree, 1),
        Some(&AttributeValue::Date(datetime!(2024-05-15 0:00)))
    );

    // A task that never set the child value resolves through the parent
    // scenario.
    let other = project.tasks.get(project.tasks.lookup("other").unwrap());
    assert_eq!(
        other.extended.value("Deadline", tree, 1),
        Some(&AttributeValue::Date(datetime!(2024-04-01 0:00)))
    );
}

// ============================================================================
// Inheritance
// ============================================================================

#[test]
fn test_inherit_flows_to_subtasks() {
    let project = parse(
        r#"
project acme "Accounting" "1.0" 2024-01-01 - 2024-06-01 {
  extend task {
    text Team "Team name" { inherit }
    text Contact "Contact person"
  }
}
task parent "Parent" {
  Team "Alpha"
  Contact "alice"
  task child "Child" { }
}
"#,
    );
    let child = project.tasks.get(project.tasks.lookup("parent.child").unwrap());
    assert_eq!(
        child.extended.value("Team", &project.scenarios, 0),
        Some(&AttributeValue::Text("Alpha".into()))
    );
    // Attributes without `inherit` stay where they were set.
    assert_eq!(child.extended.value("Contact", &project.scenarios, 0), None);
}

// ============================================================================
// Interplay with reports
// ============================================================================

#[test]
fn test_extended_attributes_are_reportable() {
    let project = parse(
        r#"
project acme "Accounting" "1.0" 2024-01-01 - 2024-06-01 {
  extend task {
    reference Spec "Specification"
  }
}
taskreport "t.html" {
  columns name, Spec
  sorttasks Spec.down
}
"#,
    );
    assert_eq!(project.reports[0].columns[1], "Spec");
    assert_eq!(project.reports[0].sort_tasks[0].key, "Spec");
}

// ============================================================================
// Isolation
// ============================================================================

#[test]
fn test_extensions_do_not_leak_between_parses() {
    let extended = r#"
project acme "Accounting" "1.0" 2024-01-01 - 2024-06-01 {
  extend task {
    text Notes "Notes"
  }
}
task build "Build" { Notes "kept" }
"#;
    let plain = r#"
project acme "Accounting" "1.0" 2024-01-01 - 2024-06-01 { }
task build "Build" { Notes "leaked" }
"#;

    let mut parser = ProjectFileParser::new();
    parser
        .parse_str("first.tjp", extended)
        .expect("extended input should parse");

    // The same parser gets a fresh grammar for the second file.
    let err = parser
        .parse_str("second.tjp", plain)
        .expect_err("the extension must not survive the first parse");
    assert_eq!(err.code(), Some(ErrorCode::T0201));
}
