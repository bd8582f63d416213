//! Shared value rules: numbers, ids, dates, intervals, durations, weekdays.
//!
//! Every property module reaches for these. Durations come in two flavors
//! with identical surface syntax: `calendarDuration` counts wall-clock
//! seconds (interval arithmetic, the `duration` attribute) while
//! `workingDuration` converts through the project's working-time settings
//! (`effort`, `length`).

use time::{Duration, Weekday};

use crate::model::{DurationUnit, Interval, TimeSlot};

use super::super::context::NodeValue;
use super::super::errors::{ErrorCode, Message, ParseError};
use super::super::registry::SyntaxRegistry;
use super::super::syntax::Pattern;
use super::super::tokens::TokenClass;
use super::helpers::{action, arg, class, kw, pass, sub};

pub(super) fn declare(registry: &mut SyntaxRegistry) {
    declare_basics(registry);
    declare_intervals(registry);
    declare_durations(registry);
    declare_weekdays(registry);
    declare_references(registry);
}

// ============================================================================
// Numbers, ids, flags
// ============================================================================

fn declare_basics(registry: &mut SyntaxRegistry) {
    registry.define_rule("number");
    registry.add_pattern(
        "number",
        Pattern::new(vec![class(TokenClass::Integer)]).with_action(pass(0)),
    );
    registry.add_pattern(
        "number",
        Pattern::new(vec![class(TokenClass::Float)]).with_action(pass(0)),
    );

    // Declaration ids accept a bare identifier or a quoted string, so both
    // `task t1 "x"` and `task "t1" "x"` parse.
    registry.define_rule("declId");
    registry.add_pattern(
        "declId",
        Pattern::new(vec![class(TokenClass::Id)]).with_action(pass(0)),
    );
    registry.add_pattern(
        "declId",
        Pattern::new(vec![class(TokenClass::String)]).with_action(action(|_, mut values| {
            Ok(NodeValue::Id(arg(&mut values, 0).into_str()?))
        })),
    );

    registry.define_list_rule("flagList", class(TokenClass::Id));
}

// ============================================================================
// Date intervals and time-of-day intervals
// ============================================================================

fn declare_intervals(registry: &mut SyntaxRegistry) {
    // <date> [- <date> | +<duration>]; a bare date covers its whole day.
    registry.define_rule("interval");
    registry.add_pattern(
        "interval",
        Pattern::new(vec![class(TokenClass::Date), sub("intervalEnd")]).with_action(action(
            |ctx, mut values| {
                let start = arg(&mut values, 0).into_date()?;
                let interval = match arg(&mut values, 1) {
                    NodeValue::None => Interval::whole_day(start),
                    NodeValue::Date(end) => Interval::checked(start, end).ok_or_else(|| {
                        ctx.error(
                            ErrorCode::T0306,
                            format!("interval end {end} does not lie after its start {start}"),
                        )
                    })?,
                    NodeValue::Seconds(seconds) => {
                        let end = start + Duration::seconds(seconds);
                        Interval::checked(start, end).ok_or_else(|| {
                            ctx.error(ErrorCode::T0306, "interval duration must be positive")
                        })?
                    }
                    _ => {
                        return Err(Message::error(
                            ErrorCode::T0901,
                            "interval end resolved to an unexpected value",
                        )
                        .into());
                    }
                };
                Ok(NodeValue::Interval(interval))
            },
        )),
    );

    registry.define_rule("intervalEnd");
    registry.set_optional("intervalEnd");
    registry.add_pattern(
        "intervalEnd",
        Pattern::new(vec![kw("-"), class(TokenClass::Date)]).with_action(pass(1)),
    );
    registry.add_pattern(
        "intervalEnd",
        Pattern::new(vec![kw("+"), sub("calendarDuration")]).with_action(pass(1)),
    );

    registry.define_list_rule("intervalList", sub("interval"));

    // 9:00 - 12:00, end of day spelled 24:00. The value is the validated
    // [start, end] pair in seconds since midnight.
    registry.define_rule("timeInterval");
    registry.add_pattern(
        "timeInterval",
        Pattern::new(vec![class(TokenClass::Time), kw("-"), class(TokenClass::Time)]).with_action(
            action(|ctx, mut values| {
                let start = arg(&mut values, 0).into_time()?;
                let end = arg(&mut values, 2).into_time()?;
                if TimeSlot::checked(start, end).is_none() {
                    return Err(ctx.error(
                        ErrorCode::T0306,
                        format!(
                            "time interval {} - {} must end after it starts",
                            format_clock(start),
                            format_clock(end)
                        ),
                    ));
                }
                Ok(NodeValue::List(vec![
                    NodeValue::TimeOfDay(start),
                    NodeValue::TimeOfDay(end),
                ]))
            }),
        ),
    );

    registry.define_list_rule("timeIntervalList", sub("timeInterval"));
}

// ============================================================================
// Durations
// ============================================================================

fn declare_durations(registry: &mut SyntaxRegistry) {
    registry.define_rule("durationUnit");
    for unit in ["min", "h", "d", "w", "m", "y"] {
        registry.add_pattern(
            "durationUnit",
            Pattern::new(vec![kw(unit)]).with_action(pass(0)),
        );
    }

    registry.define_rule("calendarDuration");
    registry.add_pattern(
        "calendarDuration",
        Pattern::new(vec![sub("number"), sub("durationUnit")]).with_action(action(
            |_, values| {
                let (value, unit) = duration_parts(values)?;
                let seconds = (value * unit.calendar_seconds() as f64).round() as i64;
                Ok(NodeValue::Seconds(seconds))
            },
        )),
    );

    registry.define_rule("workingDuration");
    registry.add_pattern(
        "workingDuration",
        Pattern::new(vec![sub("number"), sub("durationUnit")]).with_action(action(
            |ctx, values| {
                let (value, unit) = duration_parts(values)?;
                let seconds = ctx.project()?.working_seconds(value, unit);
                Ok(NodeValue::Seconds(seconds))
            },
        )),
    );
}

fn duration_parts(mut values: Vec<NodeValue>) -> Result<(f64, DurationUnit), ParseError> {
    let value = arg(&mut values, 0).as_number()?;
    let unit_id = arg(&mut values, 1).into_id()?;
    let unit = DurationUnit::from_keyword(&unit_id).ok_or_else(|| {
        Message::error(
            ErrorCode::T0901,
            format!("'{unit_id}' is not a duration unit"),
        )
    })?;
    Ok((value, unit))
}

// ============================================================================
// Weekdays
// ============================================================================

fn declare_weekdays(registry: &mut SyntaxRegistry) {
    registry.define_rule("weekday");
    for day in ["mon", "tue", "wed", "thu", "fri", "sat", "sun"] {
        registry.add_pattern("weekday", Pattern::new(vec![kw(day)]).with_action(pass(0)));
    }

    registry.define_rule("weekdaySpan");
    registry.set_optional("weekdaySpan");
    registry.add_pattern(
        "weekdaySpan",
        Pattern::new(vec![kw("-"), sub("weekday")]).with_action(pass(1)),
    );

    // `fri - mon` wraps over the weekend into fri, sat, sun, mon. The value
    // is the list of day indices counted from Monday.
    registry.define_rule("weekdayInterval");
    registry.add_pattern(
        "weekdayInterval",
        Pattern::new(vec![sub("weekday"), sub("weekdaySpan")]).with_action(action(
            |_, mut values| {
                let first = weekday_index(&arg(&mut values, 0).into_id()?)?;
                let last = match arg(&mut values, 1) {
                    NodeValue::None => first,
                    value => weekday_index(&value.into_id()?)?,
                };
                let mut days = Vec::new();
                let mut day = first;
                loop {
                    days.push(NodeValue::Int(day as i64));
                    if day == last {
                        break;
                    }
                    day = (day + 1) % 7;
                }
                Ok(NodeValue::List(days))
            },
        )),
    );

    registry.define_list_rule("weekdayIntervalList", sub("weekdayInterval"));
}

fn weekday_index(keyword: &str) -> Result<u8, ParseError> {
    match keyword {
        "mon" => Ok(0),
        "tue" => Ok(1),
        "wed" => Ok(2),
        "thu" => Ok(3),
        "fri" => Ok(4),
        "sat" => Ok(5),
        "sun" => Ok(6),
        other => Err(Message::error(
            ErrorCode::T0901,
            format!("'{other}' is not a weekday"),
        )
        .into()),
    }
}

/// Day index counted from Monday back to the calendar type.
pub(super) fn weekday_from_index(index: i64) -> Weekday {
    match index.rem_euclid(7) {
        0 => Weekday::Monday,
        1 => Weekday::Tuesday,
        2 => Weekday::Wednesday,
        3 => Weekday::Thursday,
        4 => Weekday::Friday,
        5 => Weekday::Saturday,
        _ => Weekday::Sunday,
    }
}

fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 3600, seconds % 3600 / 60)
}

// ============================================================================
// Property references
// ============================================================================

fn declare_references(registry: &mut SyntaxRegistry) {
    // A property address: bare id or dotted path from the root.
    registry.define_rule("pathRef");
    registry.add_pattern(
        "pathRef",
        Pattern::new(vec![class(TokenClass::Id)]).with_action(pass(0)),
    );
    registry.add_pattern(
        "pathRef",
        Pattern::new(vec![class(TokenClass::AbsoluteId)]).with_action(pass(0)),
    );
    registry.define_list_rule("pathRefList", sub("pathRef"));

    // Dependency targets additionally allow `!`-relative paths.
    registry.define_rule("taskRef");
    registry.add_pattern(
        "taskRef",
        Pattern::new(vec![class(TokenClass::Id)]).with_action(pass(0)),
    );
    registry.add_pattern(
        "taskRef",
        Pattern::new(vec![class(TokenClass::AbsoluteId)]).with_action(pass(0)),
    );
    registry.add_pattern(
        "taskRef",
        Pattern::new(vec![class(TokenClass::RelativeId)]).with_action(pass(0)),
    );
    registry.define_list_rule("taskRefList", sub("taskRef"));
}
