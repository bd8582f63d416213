//! The file root: project declaration, global settings, top-level
//! properties, includes and macros.
//!
//! `vacation` and `workinghours` appear both at project level and inside
//! resources; the shared rules route on the open property scope instead
//! of duplicating the syntax.

use crate::model::{Project, TimeSlot, Vacation};

use super::super::context::{NodeValue, PropertyRef};
use super::super::errors::ErrorCode;
use super::super::registry::SyntaxRegistry;
use super::super::syntax::{Pattern, PatternDoc};
use super::super::tokens::TokenClass;
use super::helpers::{action, arg, class, flatten, kw, pass, sub, time_slot};
use super::values::weekday_from_index;

pub(super) fn declare(registry: &mut SyntaxRegistry) {
    declare_file(registry);
    declare_project_attributes(registry);
    declare_calendar_attributes(registry);
    declare_stream_directives(registry);
}

// ============================================================================
// File structure
// ============================================================================

fn declare_file(registry: &mut SyntaxRegistry) {
    registry.define_rule("projectFile");
    registry.add_pattern(
        "projectFile",
        Pattern::new(vec![sub("projectDeclaration"), sub("properties")]),
    );

    registry.define_rule("properties");
    registry.set_optional("properties");
    registry.set_repeatable("properties");
    registry.add_pattern("properties", Pattern::new(vec![sub("task")]));
    registry.add_pattern("properties", Pattern::new(vec![sub("resource")]));
    registry.add_pattern("properties", Pattern::new(vec![sub("report")]));
    registry.add_pattern("properties", Pattern::new(vec![sub("includeFile")]));
    registry.add_pattern("properties", Pattern::new(vec![sub("macroDefinition")]));

    registry.define_rule("projectDeclaration");
    registry.add_pattern(
        "projectDeclaration",
        Pattern::new(vec![sub("projectHeader"), sub("projectBody")]),
    );

    registry.define_rule("projectHeader");
    registry.add_pattern(
        "projectHeader",
        Pattern::new(vec![
            kw("project"),
            sub("declId"),
            class(TokenClass::String),
            class(TokenClass::String),
            sub("interval"),
        ])
        .with_action(action(|ctx, mut values| {
            let id = arg(&mut values, 1).into_id()?;
            let name = arg(&mut values, 2).into_str()?;
            let version = arg(&mut values, 3).into_str()?;
            let interval = arg(&mut values, 4).into_interval()?;
            ctx.create_project(Project::new(id, name, version, interval))?;
            Ok(NodeValue::None)
        }))
        .with_doc(
            PatternDoc::new(
                "Project declaration",
                "Opens the project. Exactly one per file, before any other \
                 property; every date of the plan must fall into the given \
                 interval.",
            )
            .arg("id", "Project id.")
            .arg("name", "Project name.")
            .arg("version", "Version string, free-form.")
            .arg("interval", "Scheduling window, `start - end` or `start +duration`."),
        ),
    );

    // The braces are required even for an empty body; this is the one
    // body in the grammar that is not optional.
    registry.define_rule("projectBody");
    registry.add_pattern(
        "projectBody",
        Pattern::new(vec![kw("{"), sub("projectAttributes"), kw("}")]),
    );
}

// ============================================================================
// Project attributes
// ============================================================================

fn declare_project_attributes(registry: &mut SyntaxRegistry) {
    registry.define_rule("projectAttributes");
    registry.set_optional("projectAttributes");
    registry.set_repeatable("projectAttributes");

    registry.add_pattern("projectAttributes", Pattern::new(vec![sub("scenario")]));
    registry.add_pattern("projectAttributes", Pattern::new(vec![sub("extendProperty")]));
    registry.add_pattern(
        "projectAttributes",
        Pattern::new(vec![kw("flags"), sub("flagList")]).with_action(action(
            |ctx, mut values| {
                for value in arg(&mut values, 1).into_list()? {
                    let flag = value.into_id()?;
                    if !ctx.project_mut()?.declare_flag(flag.clone()) {
                        return Err(ctx.error(
                            ErrorCode::T0303,
                            format!("flag '{flag}' is already declared"),
                        ));
                    }
                }
                Ok(NodeValue::None)
            },
        )),
    );
    registry.add_pattern(
        "projectAttributes",
        Pattern::new(vec![sub("vacationAttribute")]),
    );
    registry.add_pattern(
        "projectAttributes",
        Pattern::new(vec![sub("workingHoursAttribute")]),
    );
    registry.add_pattern(
        "projectAttributes",
        Pattern::new(vec![kw("dailyworkinghours"), sub("number")]).with_action(action(
            |ctx, mut values| {
                let hours = arg(&mut values, 1).as_number()?;
                if !(hours > 0.0 && hours <= 24.0) {
                    return Err(ctx.error(
                        ErrorCode::T0305,
                        format!("dailyworkinghours {hours} is outside the allowed range (0, 24]"),
                    ));
                }
                ctx.project_mut()?.daily_working_hours = hours;
                Ok(NodeValue::None)
            },
        )),
    );
    registry.add_pattern(
        "projectAttributes",
        Pattern::new(vec![kw("yearlyworkingdays"), sub("number")]).with_action(action(
            |ctx, mut values| {
                let days = arg(&mut values, 1).as_number()?;
                if !(days > 0.0 && days <= 366.0) {
                    return Err(ctx.error(
                        ErrorCode::T0305,
                        format!("yearlyworkingdays {days} is outside the allowed range (0, 366]"),
                    ));
                }
                ctx.project_mut()?.yearly_working_days = days;
                Ok(NodeValue::None)
            },
        )),
    );
    registry.add_pattern(
        "projectAttributes",
        Pattern::new(vec![kw("now"), class(TokenClass::Date)]).with_action(action(
            |ctx, mut values| {
                let now = arg(&mut values, 1).into_date()?;
                ctx.project_mut()?.now = Some(now);
                Ok(NodeValue::None)
            },
        )),
    );
    registry.add_pattern(
        "projectAttributes",
        Pattern::new(vec![kw("copyright"), class(TokenClass::String)]).with_action(action(
            |ctx, mut values| {
                let text = arg(&mut values, 1).into_str()?;
                ctx.project_mut()?.copyright = Some(text);
                Ok(NodeValue::None)
            },
        )),
    );
    registry.add_pattern(
        "projectAttributes",
        Pattern::new(vec![kw("timezone"), class(TokenClass::String)]).with_action(action(
            |ctx, mut values| {
                let zone = arg(&mut values, 1).into_str()?;
                ctx.project_mut()?.timezone = Some(zone);
                Ok(NodeValue::None)
            },
        )),
    );
    registry.add_pattern("projectAttributes", Pattern::new(vec![sub("includeFile")]));
    registry.add_pattern("projectAttributes", Pattern::new(vec![sub("macroDefinition")]));
    registry.add_pattern("projectAttributes", Pattern::new(vec![sub("task")]));
    registry.add_pattern("projectAttributes", Pattern::new(vec![sub("resource")]));
    registry.add_pattern("projectAttributes", Pattern::new(vec![sub("report")]));
}

// ============================================================================
// Calendar attributes shared between project and resource scope
// ============================================================================

fn declare_calendar_attributes(registry: &mut SyntaxRegistry) {
    registry.define_rule("vacationAttribute");
    registry.add_pattern(
        "vacationAttribute",
        Pattern::new(vec![kw("vacation"), sub("vacationSpec")]).with_action(action(
            |ctx, mut values| {
                let mut parts = arg(&mut values, 1).into_list()?.into_iter();
                let name = match parts.next().unwrap_or(NodeValue::None) {
                    NodeValue::Str(name) => Some(name.to_string()),
                    _ => None,
                };
                let interval = parts.next().unwrap_or(NodeValue::None).into_interval()?;
                let vacation = Vacation { name, interval };
                match ctx.current_property() {
                    Some(PropertyRef::Resource(_)) => {
                        ctx.resource_mut()?.vacations.push(vacation);
                    }
                    _ => ctx.project_mut()?.vacations.push(vacation),
                }
                Ok(NodeValue::None)
            },
        )),
    );

    registry.define_rule("vacationSpec");
    registry.add_pattern(
        "vacationSpec",
        Pattern::new(vec![class(TokenClass::String), sub("interval")])
            .with_action(action(|_, values| Ok(NodeValue::List(values)))),
    );
    registry.add_pattern(
        "vacationSpec",
        Pattern::new(vec![sub("interval")]).with_action(action(|_, mut values| {
            Ok(NodeValue::List(vec![NodeValue::None, arg(&mut values, 0)]))
        })),
    );

    registry.define_rule("workingHoursAttribute");
    registry.add_pattern(
        "workingHoursAttribute",
        Pattern::new(vec![
            kw("workinghours"),
            sub("weekdayIntervalList"),
            sub("workingHoursSpec"),
        ])
        .with_action(action(|ctx, mut values| {
            let days = flatten(arg(&mut values, 1))?;
            let mut slots: Vec<TimeSlot> = Vec::new();
            for item in arg(&mut values, 2).into_list()? {
                slots.push(time_slot(item)?);
            }
            let targets_resource =
                matches!(ctx.current_property(), Some(PropertyRef::Resource(_)));
            if targets_resource {
                // A resource starts from the project calendar and
                // overrides the listed days only.
                let inherited = ctx.project()?.working_hours.clone();
                let resource = ctx.resource_mut()?;
                let hours = resource.working_hours.get_or_insert(inherited);
                for day in days {
                    hours.set_day(weekday_from_index(day.into_int()?), slots.clone());
                }
            } else {
                let project = ctx.project_mut()?;
                for day in days {
                    project
                        .working_hours
                        .set_day(weekday_from_index(day.into_int()?), slots.clone());
                }
            }
            Ok(NodeValue::None)
        }))
        .with_doc(
            PatternDoc::new(
                "Working hours",
                "Sets the working time slots for the listed weekdays, replacing \
                 whatever those days had. `off` clears the days entirely.",
            )
            .arg("days", "Weekdays or weekday ranges (`mon - fri`), comma-separated.")
            .arg("slots", "Time intervals (`9:00 - 17:00`) or `off`."),
        ),
    );

    registry.define_rule("workingHoursSpec");
    registry.add_pattern(
        "workingHoursSpec",
        Pattern::new(vec![kw("off")]).with_action(action(|_, _| Ok(NodeValue::List(Vec::new())))),
    );
    registry.add_pattern(
        "workingHoursSpec",
        Pattern::new(vec![sub("timeIntervalList")]).with_action(pass(0)),
    );
}

// ============================================================================
// Includes and macros
// ============================================================================

fn declare_stream_directives(registry: &mut SyntaxRegistry) {
    registry.define_rule("includeFile");
    registry.add_pattern(
        "includeFile",
        Pattern::new(vec![kw("include"), class(TokenClass::String)])
            .with_action(action(|ctx, mut values| {
                let target = arg(&mut values, 1).into_str()?;
                let at = ctx.at();
                ctx.request_include(target, at);
                Ok(NodeValue::None)
            }))
            .with_doc(
                PatternDoc::new(
                    "File inclusion",
                    "Reads the named file as if its text stood here. Relative \
                     paths resolve against the including file's directory.",
                )
                .arg("file", "Path of the file to include."),
            ),
    );

    registry.define_rule("macroDefinition");
    registry.add_pattern(
        "macroDefinition",
        Pattern::new(vec![kw("macro"), class(TokenClass::Id), class(TokenClass::MacroBody)])
            .with_action(action(|ctx, mut values| {
                let name = arg(&mut values, 1).into_id()?;
                let body = arg(&mut values, 2).into_str()?;
                let at = ctx.at();
                ctx.request_macro(name, body, at);
                Ok(NodeValue::None)
            }))
            .with_doc(
                PatternDoc::new(
                    "Macro definition",
                    "Defines a text macro. `${name}` and `${name \"arg\" ...}` \
                     calls splice the body into the token stream, with `${1}` \
                     and friends replaced by the call arguments. Redefining a \
                     macro is legal but reported as a warning.",
                )
                .arg("name", "Macro name.")
                .arg("body", "Replacement text in `[` `]` brackets."),
            ),
    );
}
