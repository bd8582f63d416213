//! End-to-end tests for project declarations and project-level attributes.
//!
//! Each test feeds a complete file through [`ProjectFileParser`] and
//! inspects the resulting model, or the diagnostic code of the failure.

use rstest::rstest;
use time::Weekday;
use time::macros::datetime;
use tjplan::model::TimeSlot;
use tjplan::{ErrorCode, Project, ProjectFileParser};

/// Parse a complete file, failing the test on a diagnostic.
fn parse(text: &str) -> Project {
    let mut parser = ProjectFileParser::new();
    parser
        .parse_str("test.tjp", text)
        .expect("input should parse")
}

/// Parse a complete file that must fail, returning the diagnostic code.
fn parse_err(text: &str) -> ErrorCode {
    let mut parser = ProjectFileParser::new();
    let err = parser
        .parse_str("test.tjp", text)
        .expect_err("input should be rejected");
    err.code().expect("failure should carry a diagnostic code")
}

/// Wrap project attributes in a minimal project declaration.
fn project_with(attributes: &str) -> String {
    format!(
        r#"project acme "Accounting" "1.0" 2024-01-01 - 2024-06-01 {{
{attributes}
}}
"#
    )
}

// ============================================================================
// Project declaration
// ============================================================================

#[test]
fn test_minimal_project() {
    let project = parse(r#"project acme "Accounting" "1.0" 2024-01-01 - 2024-06-01 { }"#);
    assert_eq!(project.id, "acme");
    assert_eq!(project.name, "Accounting");
    assert_eq!(project.version, "1.0");
    assert_eq!(project.interval.start, datetime!(2024-01-01 0:00));
    assert_eq!(project.interval.end, datetime!(2024-06-01 0:00));
}

#[test]
fn test_project_id_may_be_quoted() {
    let project = parse(r#"project "acme phase 2" "Accounting" "1.0" 2024-01-01 { }"#);
    assert_eq!(project.id, "acme phase 2");
}

#[test]
fn test_single_date_covers_one_whole_day() {
    let project = parse(r#"project p "P" "1" 2024-01-01 { }"#);
    assert_eq!(project.interval.end, datetime!(2024-01-02 0:00));
}

#[test]
fn test_plus_duration_extends_the_start_date() {
    let project = parse(r#"project p "P" "1" 2024-01-01 + 2w { }"#);
    assert_eq!(project.interval.end, datetime!(2024-01-15 0:00));
}

#[test]
fn test_backwards_interval_is_rejected() {
    let code = parse_err(r#"project p "P" "1" 2024-06-01 - 2024-01-01 { }"#);
    assert_eq!(code, ErrorCode::T0306);
}

#[test]
fn test_project_body_braces_are_mandatory() {
    assert_eq!(parse_err(r#"project p "P" "1" 2024-01-01"#), ErrorCode::T0202);
}

#[test]
fn test_empty_input_is_rejected() {
    assert_eq!(parse_err(""), ErrorCode::T0202);
}

// ============================================================================
// Flags
// ============================================================================

#[test]
fn test_flags_are_declared_in_order() {
    let project = parse(&project_with("flags important, internal"));
    let declared: Vec<&str> = project.flags.iter().map(|f| f.as_str()).collect();
    assert_eq!(declared, vec!["important", "internal"]);
}

#[test]
fn test_redeclaring_a_flag_is_rejected() {
    let code = parse_err(&project_with("flags urgent, urgent"));
    assert_eq!(code, ErrorCode::T0303);
}

// ============================================================================
// Calendar settings
// ============================================================================

#[test]
fn test_working_time_settings_default() {
    let project = parse(&project_with(""));
    assert_eq!(project.daily_working_hours, 8.0);
    assert_eq!(project.yearly_working_days, 260.714);
}

#[test]
fn test_daily_working_hours_accept_fractions() {
    let project = parse(&project_with("dailyworkinghours 7.5"));
    assert_eq!(project.daily_working_hours, 7.5);
}

#[rstest]
#[case("dailyworkinghours 0")]
#[case("dailyworkinghours 25")]
#[case("yearlyworkingdays 0")]
#[case("yearlyworkingdays 367")]
fn test_out_of_range_calendar_settings(#[case] attribute: &str) {
    assert_eq!(parse_err(&project_with(attribute)), ErrorCode::T0305);
}

#[test]
fn test_now_copyright_and_timezone_are_stored() {
    let project = parse(&project_with(
        r#"
now 2024-03-15-12:30
copyright "Acme Corp"
timezone "Europe/Berlin"
"#,
    ));
    assert_eq!(project.now, Some(datetime!(2024-03-15 12:30)));
    assert_eq!(project.copyright.as_deref(), Some("Acme Corp"));
    assert_eq!(project.timezone.as_deref(), Some("Europe/Berlin"));
}

// ============================================================================
// Vacations
// ============================================================================

#[test]
fn test_project_vacations_may_carry_a_name() {
    let project = parse(&project_with(
        r#"
vacation "Spring break" 2024-03-01 - 2024-03-08
vacation 2024-05-01
"#,
    ));
    assert_eq!(project.vacations.len(), 2);
    assert_eq!(project.vacations[0].name.as_deref(), Some("Spring break"));
    assert_eq!(project.vacations[0].interval.start, datetime!(2024-03-01 0:00));
    assert_eq!(project.vacations[1].name, None);
    // A single date covers one whole day.
    assert_eq!(project.vacations[1].interval.end, datetime!(2024-05-02 0:00));
}

// ============================================================================
// Working hours
// ============================================================================

#[test]
fn test_working_hours_replace_the_standard_day() {
    let project = parse(&project_with("workinghours mon - fri 8:00 - 16:00"));
    let slot = TimeSlot { start: 8 * 3600, end: 16 * 3600 };
    assert_eq!(project.working_hours.day(Weekday::Monday), &[slot]);
    assert_eq!(project.working_hours.day(Weekday::Friday), &[slot]);
    assert!(!project.working_hours.is_working_day(Weekday::Saturday));
}

#[test]
fn test_off_clears_a_working_day() {
    let project = parse(&project_with("workinghours fri off"));
    assert!(!project.working_hours.is_working_day(Weekday::Friday));
    // Days not mentioned keep the built-in hours.
    assert_eq!(project.working_hours.day(Weekday::Monday).len(), 2);
}

#[test]
fn test_weekday_spans_wrap_around_the_weekend() {
    let project = parse(&project_with("workinghours fri - mon 10:00 - 12:00"));
    for day in [Weekday::Friday, Weekday::Saturday, Weekday::Sunday, Weekday::Monday] {
        assert!(project.working_hours.is_working_day(day), "{day} should be set");
    }
    let slot = TimeSlot { start: 10 * 3600, end: 12 * 3600 };
    assert_eq!(project.working_hours.day(Weekday::Sunday), &[slot]);
    // Tuesday was not part of the span.
    assert_eq!(project.working_hours.day(Weekday::Tuesday).len(), 2);
}

#[test]
fn test_multiple_slots_per_day() {
    let project = parse(&project_with("workinghours wed 6:00 - 10:00, 14:00 - 18:00"));
    assert_eq!(project.working_hours.day(Weekday::Wednesday).len(), 2);
}

#[test]
fn test_reversed_working_hours_are_rejected() {
    let code = parse_err(&project_with("workinghours mon 16:00 - 8:00"));
    assert_eq!(code, ErrorCode::T0306);
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_every_project_starts_with_the_plan_scenario() {
    let project = parse(&project_with(""));
    assert_eq!(project.scenarios.len(), 1);
    assert_eq!(project.scenarios.get(0).id, "plan");
}

#[test]
fn test_first_scenario_declaration_replaces_the_root() {
    let project = parse(&project_with(r#"scenario actual "Tracking""#));
    assert_eq!(project.scenarios.len(), 1);
    assert_eq!(project.scenarios.get(0).id, "actual");
    assert_eq!(project.scenarios.get(0).name, "Tracking");
    assert_eq!(project.scenarios.index_of("plan"), None);
}

#[test]
fn test_nested_scenarios_form_a_tree() {
    let project = parse(&project_with(
        r#"
scenario plan "Plan" {
  scenario delayed "Delayed"
}
"#,
    ));
    assert_eq!(project.scenarios.len(), 2);
    assert_eq!(project.scenarios.index_of("delayed"), Some(1));
    assert_eq!(project.scenarios.parent_of(1), Some(0));
}

#[test]
fn test_second_top_level_scenario_is_rejected() {
    let code = parse_err(&project_with(
        r#"
scenario plan "Plan"
scenario other "Other"
"#,
    ));
    assert_eq!(code, ErrorCode::T0308);
}

#[test]
fn test_scenario_ids_are_unique_across_the_tree() {
    let code = parse_err(&project_with(
        r#"
scenario plan "Plan" {
  scenario plan "Again"
}
"#,
    ));
    assert_eq!(code, ErrorCode::T0303);
}

#[test]
fn test_properties_may_sit_inside_the_project_body() {
    let project = parse(&project_with(
        r#"
task inner "Inner" { }
resource dev "Dev"
"#,
    ));
    assert_eq!(project.tasks.len(), 1);
    assert_eq!(project.resources.len(), 1);
}

#[test]
fn test_single_line_project_with_one_task() {
    let project = parse(
        r#"project "p" "Demo" "1.0" 2024-01-01 - 2024-02-01 { task "t1" "Task 1" { effort 2d } }"#,
    );
    let t1 = project.tasks.lookup("t1").expect("task exists");
    assert_eq!(project.tasks.get(t1).effort.get(0), Some(&57_600));
}
