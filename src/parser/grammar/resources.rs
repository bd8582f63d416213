//! Resource declarations and their attributes.
//!
//! Resources mirror the task shape: nested declarations form teams with
//! dotted full ids. Unlike task dependencies, booking targets resolve
//! immediately, since a booking records work on a task that must already
//! be known when the booking is written down.

use smol_str::SmolStr;

use crate::model::{Booking, Resource};

use super::super::context::{NodeValue, ParseCtx, PropertyRef};
use super::super::errors::{ErrorCode, Message, ParseError};
use super::super::registry::SyntaxRegistry;
use super::super::syntax::{Pattern, PatternDoc};
use super::super::tokens::TokenClass;
use super::helpers::{action, arg, class, kw, sub};

pub(super) fn declare(registry: &mut SyntaxRegistry) {
    declare_resource(registry);
    declare_resource_attributes(registry);
    declare_bookings(registry);
}

// ============================================================================
// Declaration
// ============================================================================

fn declare_resource(registry: &mut SyntaxRegistry) {
    registry.define_rule("resource");
    registry.add_pattern(
        "resource",
        Pattern::new(vec![sub("resourceHeader"), sub("resourceBody")]).with_action(action(
            |ctx, _| {
                ctx.close_property();
                Ok(NodeValue::None)
            },
        )),
    );

    registry.define_rule("resourceHeader");
    registry.add_pattern(
        "resourceHeader",
        Pattern::new(vec![kw("resource"), sub("declId"), class(TokenClass::String)])
            .with_action(action(|ctx, mut values| {
                let id = arg(&mut values, 1).into_id()?;
                let name = arg(&mut values, 2).into_str()?;
                let parent = match ctx.current_property() {
                    Some(PropertyRef::Resource(index)) => Some(index),
                    _ => None,
                };
                let full_id = match parent {
                    Some(index) => {
                        let parent_id = &ctx.project()?.resources.get(index).full_id;
                        SmolStr::new(format!("{parent_id}.{id}"))
                    }
                    None => id.clone(),
                };
                let mut resource = Resource::new(id, full_id, name, parent, ctx.at());
                if let Some(index) = parent {
                    let project = ctx.project()?;
                    resource.extended.inherit_from(
                        &project.resources.get(index).extended,
                        &project.resource_attributes,
                    );
                }
                let inserted = ctx.project_mut()?.resources.insert(resource);
                let index = inserted.map_err(|dup| {
                    ctx.error(
                        ErrorCode::T0303,
                        format!("resource '{dup}' is already defined"),
                    )
                })?;
                ctx.open_property(PropertyRef::Resource(index));
                Ok(NodeValue::None)
            }))
            .with_doc(
                PatternDoc::new(
                    "Resource declaration",
                    "Defines a resource. Resources declared inside another \
                     resource form a team; allocating the team allocates its \
                     members.",
                )
                .arg("id", "Id unique among the siblings.")
                .arg("name", "Display name."),
            ),
    );

    registry.define_optional_body("resourceBody", "resourceAttributes");
}

// ============================================================================
// Attributes
// ============================================================================

fn declare_resource_attributes(registry: &mut SyntaxRegistry) {
    registry.define_rule("resourceAttributes");
    registry.set_optional("resourceAttributes");
    registry.set_repeatable("resourceAttributes");

    registry.add_pattern("resourceAttributes", Pattern::new(vec![sub("resource")]));
    registry.add_pattern(
        "resourceAttributes",
        Pattern::new(vec![kw("rate"), sub("number")]).with_action(action(|ctx, mut values| {
            let rate = arg(&mut values, 1).as_number()?;
            if rate < 0.0 {
                return Err(ctx.error(ErrorCode::T0305, "rate must not be negative"));
            }
            ctx.resource_mut()?.rate = Some(rate);
            Ok(NodeValue::None)
        })),
    );
    registry.add_pattern(
        "resourceAttributes",
        Pattern::new(vec![kw("efficiency"), sub("number")]).with_action(action(
            |ctx, mut values| {
                let efficiency = arg(&mut values, 1).as_number()?;
                if efficiency < 0.0 {
                    return Err(ctx.error(ErrorCode::T0305, "efficiency must not be negative"));
                }
                ctx.resource_mut()?.efficiency = Some(efficiency);
                Ok(NodeValue::None)
            },
        )),
    );
    registry.add_pattern(
        "resourceAttributes",
        Pattern::new(vec![kw("flags"), sub("flagList")]).with_action(action(
            |ctx, mut values| {
                let mut flags = Vec::new();
                for value in arg(&mut values, 1).into_list()? {
                    flags.push(value.into_id()?);
                }
                for flag in &flags {
                    if !ctx.project()?.has_flag(flag) {
                        return Err(ctx.error(
                            ErrorCode::T0304,
                            format!("flag '{flag}' has not been declared"),
                        ));
                    }
                }
                let resource = ctx.resource_mut()?;
                for flag in flags {
                    resource.add_flag(flag);
                }
                Ok(NodeValue::None)
            },
        )),
    );
    registry.add_pattern(
        "resourceAttributes",
        Pattern::new(vec![sub("vacationAttribute")]),
    );
    registry.add_pattern(
        "resourceAttributes",
        Pattern::new(vec![sub("workingHoursAttribute")]),
    );
    registry.add_pattern(
        "resourceAttributes",
        Pattern::new(vec![sub("scenarioPrefix"), sub("resourceScenarioAttributes")]).with_action(
            action(|ctx, _| {
                ctx.pop_scenario();
                Ok(NodeValue::None)
            }),
        ),
    );
    registry.add_pattern(
        "resourceAttributes",
        Pattern::new(vec![sub("resourceScenarioAttributes")]),
    );

    registry.define_rule("resourceScenarioAttributes");
    registry.add_pattern(
        "resourceScenarioAttributes",
        Pattern::new(vec![sub("booking")]),
    );
}

// ============================================================================
// Bookings
// ============================================================================

fn declare_bookings(registry: &mut SyntaxRegistry) {
    registry.define_rule("booking");
    registry.add_pattern(
        "booking",
        Pattern::new(vec![sub("bookingHeader"), sub("bookingBody")]).with_action(action(
            |ctx, _| {
                let at = ctx.at();
                let booking = ctx.booking.take().ok_or_else(|| {
                    Message::error(ErrorCode::T0901, "no booking is under construction").at(at)
                })?;
                let scenario = ctx.scenario;
                ctx.resource_mut()?.add_booking(scenario, booking);
                Ok(NodeValue::None)
            },
        )),
    );

    registry.define_rule("bookingHeader");
    registry.add_pattern(
        "bookingHeader",
        Pattern::new(vec![kw("booking"), sub("pathRef"), sub("intervalList")])
            .with_action(action(|ctx, mut values| {
                let target = arg(&mut values, 1).into_id()?;
                let mut intervals = Vec::new();
                for value in arg(&mut values, 2).into_list()? {
                    intervals.push(value.into_interval()?);
                }
                let task = ctx.project()?.tasks.lookup(&target).ok_or_else(|| {
                    ctx.error(ErrorCode::T0304, format!("task '{target}' is not defined"))
                })?;
                ctx.booking = Some(Booking::new(task, intervals, ctx.at()));
                Ok(NodeValue::None)
            }))
            .with_doc(
                PatternDoc::new(
                    "Booking",
                    "Records completed work: the resource was busy on the task \
                     during the listed intervals. Prefix with a scenario id to \
                     book into that scenario. The task must be declared before \
                     the booking.",
                )
                .arg("task", "Full id of the booked task.")
                .arg("intervals", "Comma-separated list of date intervals."),
            ),
    );

    registry.define_optional_body("bookingBody", "bookingAttributes");

    registry.define_rule("bookingAttributes");
    registry.set_optional("bookingAttributes");
    registry.set_repeatable("bookingAttributes");
    registry.add_pattern(
        "bookingAttributes",
        Pattern::new(vec![kw("overtime"), class(TokenClass::Integer)]).with_action(action(
            |ctx, mut values| {
                let level = arg(&mut values, 1).into_int()?;
                if !(0..=2).contains(&level) {
                    return Err(ctx.error(
                        ErrorCode::T0305,
                        format!("overtime level {level} is outside the allowed range [0, 2]"),
                    ));
                }
                current_booking(ctx)?.overtime = level as u8;
                Ok(NodeValue::None)
            },
        )),
    );
    registry.add_pattern(
        "bookingAttributes",
        Pattern::new(vec![kw("sloppy"), class(TokenClass::Integer)]).with_action(action(
            |ctx, mut values| {
                let level = arg(&mut values, 1).into_int()?;
                if !(0..=2).contains(&level) {
                    return Err(ctx.error(
                        ErrorCode::T0305,
                        format!("sloppy level {level} is outside the allowed range [0, 2]"),
                    ));
                }
                current_booking(ctx)?.sloppy = level as u8;
                Ok(NodeValue::None)
            },
        )),
    );
}

fn current_booking(ctx: &mut ParseCtx) -> Result<&mut Booking, ParseError> {
    let at = ctx.at();
    ctx.booking.as_mut().ok_or_else(|| {
        Message::error(ErrorCode::T0901, "booking attribute outside a booking entry")
            .at(at)
            .into()
    })
}
