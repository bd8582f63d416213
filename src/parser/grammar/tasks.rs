//! Task declarations and their attributes.
//!
//! Task ids nest: a task declared inside another gets the dotted full id
//! `parent.child` and inherits the parent's inheritable extended
//! attributes at creation time. Dependency targets stay textual here;
//! the driver resolves them once the whole file is known, so forward
//! references need no special handling.

use smol_str::SmolStr;

use crate::model::{Allocation, Dependency, DependencyKind, PathRef, SelectionMode, Task};

use super::super::context::{NodeValue, ParseCtx, PropertyRef};
use super::super::errors::{ErrorCode, Message, ParseError};
use super::super::registry::SyntaxRegistry;
use super::super::syntax::{Pattern, PatternDoc, SemanticAction};
use super::super::tokens::TokenClass;
use super::helpers::{action, arg, class, kw, pass, sub};

pub(super) fn declare(registry: &mut SyntaxRegistry) {
    declare_task(registry);
    declare_task_attributes(registry);
    declare_allocations(registry);
}

// ============================================================================
// Declaration
// ============================================================================

fn declare_task(registry: &mut SyntaxRegistry) {
    registry.define_rule("task");
    registry.add_pattern(
        "task",
        Pattern::new(vec![sub("taskHeader"), sub("taskBody")]).with_action(action(|ctx, _| {
            ctx.close_property();
            Ok(NodeValue::None)
        })),
    );

    registry.define_rule("taskHeader");
    registry.add_pattern(
        "taskHeader",
        Pattern::new(vec![kw("task"), sub("declId"), class(TokenClass::String)])
            .with_action(action(|ctx, mut values| {
                let id = arg(&mut values, 1).into_id()?;
                let name = arg(&mut values, 2).into_str()?;
                let parent = match ctx.current_property() {
                    Some(PropertyRef::Task(index)) => Some(index),
                    _ => None,
                };
                let full_id = match parent {
                    Some(index) => {
                        let parent_id = &ctx.project()?.tasks.get(index).full_id;
                        SmolStr::new(format!("{parent_id}.{id}"))
                    }
                    None => id.clone(),
                };
                let mut task = Task::new(id, full_id, name, parent, ctx.at());
                if let Some(index) = parent {
                    let project = ctx.project()?;
                    task.extended.inherit_from(
                        &project.tasks.get(index).extended,
                        &project.task_attributes,
                    );
                }
                let inserted = ctx.project_mut()?.tasks.insert(task);
                let index = inserted.map_err(|dup| {
                    ctx.error(ErrorCode::T0303, format!("task '{dup}' is already defined"))
                })?;
                ctx.open_property(PropertyRef::Task(index));
                Ok(NodeValue::None)
            }))
            .with_doc(
                PatternDoc::new(
                    "Task declaration",
                    "Defines a task. Tasks declared inside another task become \
                     sub-tasks; their full id is the dotted path from the top \
                     level.",
                )
                .arg("id", "Id unique among the siblings.")
                .arg("name", "Display name."),
            ),
    );

    registry.define_optional_body("taskBody", "taskAttributes");
}

// ============================================================================
// Attributes
// ============================================================================

fn declare_task_attributes(registry: &mut SyntaxRegistry) {
    registry.define_rule("taskAttributes");
    registry.set_optional("taskAttributes");
    registry.set_repeatable("taskAttributes");

    registry.add_pattern("taskAttributes", Pattern::new(vec![sub("task")]));
    registry.add_pattern(
        "taskAttributes",
        Pattern::new(vec![kw("milestone")]).with_action(action(|ctx, _| {
            ctx.task_mut()?.milestone = true;
            Ok(NodeValue::None)
        })),
    );
    registry.add_pattern(
        "taskAttributes",
        Pattern::new(vec![kw("priority"), class(TokenClass::Integer)]).with_action(action(
            |ctx, mut values| {
                let value = arg(&mut values, 1).into_int()?;
                if !(0..=1000).contains(&value) {
                    return Err(ctx.error(
                        ErrorCode::T0305,
                        format!("priority {value} is outside the allowed range [0, 1000]"),
                    ));
                }
                ctx.task_mut()?.priority = Some(value as u32);
                Ok(NodeValue::None)
            },
        )),
    );
    registry.add_pattern(
        "taskAttributes",
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
                let task = ctx.task_mut()?;
                for flag in flags {
                    task.add_flag(flag);
                }
                Ok(NodeValue::None)
            },
        )),
    );
    registry.add_pattern(
        "taskAttributes",
        Pattern::new(vec![kw("responsible"), sub("pathRef")]).with_action(action(
            |ctx, mut values| {
                let target = arg(&mut values, 1).into_id()?;
                let reference = PathRef::new(target, ctx.at());
                ctx.task_mut()?.responsible = Some(reference);
                Ok(NodeValue::None)
            },
        )),
    );
    registry.add_pattern(
        "taskAttributes",
        Pattern::new(vec![kw("note"), class(TokenClass::String)]).with_action(action(
            |ctx, mut values| {
                let note = arg(&mut values, 1).into_str()?;
                ctx.task_mut()?.note = Some(note);
                Ok(NodeValue::None)
            },
        )),
    );
    registry.add_pattern(
        "taskAttributes",
        Pattern::new(vec![kw("depends"), sub("taskRefList")])
            .with_action(dependency_action(DependencyKind::Depends)),
    );
    registry.add_pattern(
        "taskAttributes",
        Pattern::new(vec![kw("precedes"), sub("taskRefList")])
            .with_action(dependency_action(DependencyKind::Precedes)),
    );
    registry.add_pattern(
        "taskAttributes",
        Pattern::new(vec![kw("allocate"), sub("allocationList")]).with_doc(
            PatternDoc::new(
                "Resource allocation",
                "Requests resources for the task. Each entry names a primary \
                 candidate and may add alternatives and a selection mode in \
                 its body.",
            )
            .see("resource"),
        ),
    );
    registry.add_pattern(
        "taskAttributes",
        Pattern::new(vec![sub("scenarioPrefix"), sub("taskScenarioAttributes")]).with_action(
            action(|ctx, _| {
                ctx.pop_scenario();
                Ok(NodeValue::None)
            }),
        ),
    );
    registry.add_pattern(
        "taskAttributes",
        Pattern::new(vec![sub("taskScenarioAttributes")]),
    );

    declare_scenario_attributes(registry);
}

fn dependency_action(kind: DependencyKind) -> SemanticAction {
    action(move |ctx, mut values| {
        let mut targets = Vec::new();
        for value in arg(&mut values, 1).into_list()? {
            targets.push(PathRef::new(value.into_id()?, ctx.at()));
        }
        let task = ctx.task_mut()?;
        for target in targets {
            task.dependencies.push(Dependency::new(target, kind));
        }
        Ok(NodeValue::None)
    })
}

fn declare_scenario_attributes(registry: &mut SyntaxRegistry) {
    registry.define_rule("taskScenarioAttributes");
    registry.add_pattern(
        "taskScenarioAttributes",
        Pattern::new(vec![kw("start"), class(TokenClass::Date)]).with_action(action(
            |ctx, mut values| {
                let date = arg(&mut values, 1).into_date()?;
                let scenario = ctx.scenario;
                ctx.task_mut()?.start.set(scenario, date);
                Ok(NodeValue::None)
            },
        )),
    );
    registry.add_pattern(
        "taskScenarioAttributes",
        Pattern::new(vec![kw("end"), class(TokenClass::Date)]).with_action(action(
            |ctx, mut values| {
                let date = arg(&mut values, 1).into_date()?;
                let scenario = ctx.scenario;
                ctx.task_mut()?.end.set(scenario, date);
                Ok(NodeValue::None)
            },
        )),
    );
    registry.add_pattern(
        "taskScenarioAttributes",
        Pattern::new(vec![kw("duration"), sub("calendarDuration")]).with_action(action(
            |ctx, mut values| {
                let seconds = arg(&mut values, 1).into_seconds()?;
                let scenario = ctx.scenario;
                ctx.task_mut()?.duration.set(scenario, seconds);
                Ok(NodeValue::None)
            },
        )),
    );
    registry.add_pattern(
        "taskScenarioAttributes",
        Pattern::new(vec![kw("length"), sub("workingDuration")]).with_action(action(
            |ctx, mut values| {
                let seconds = arg(&mut values, 1).into_seconds()?;
                let scenario = ctx.scenario;
                ctx.task_mut()?.length.set(scenario, seconds);
                Ok(NodeValue::None)
            },
        )),
    );
    registry.add_pattern(
        "taskScenarioAttributes",
        Pattern::new(vec![kw("effort"), sub("workingDuration")])
            .with_action(action(|ctx, mut values| {
                let seconds = arg(&mut values, 1).into_seconds()?;
                let scenario = ctx.scenario;
                ctx.task_mut()?.effort.set(scenario, seconds);
                Ok(NodeValue::None)
            }))
            .with_doc(
                PatternDoc::new(
                    "Effort",
                    "Resource effort needed to complete the task, converted to \
                     working-time seconds using the project's \
                     `dailyworkinghours` and `yearlyworkingdays` settings. \
                     `length` measures working time regardless of how many \
                     resources work on the task; `duration` measures calendar \
                     time.",
                )
                .see("length")
                .see("duration"),
            ),
    );
    registry.add_pattern(
        "taskScenarioAttributes",
        Pattern::new(vec![kw("complete"), sub("number")]).with_action(action(
            |ctx, mut values| {
                let value = arg(&mut values, 1).as_number()?;
                if !(0.0..=100.0).contains(&value) {
                    return Err(ctx.error(
                        ErrorCode::T0305,
                        format!("completion {value} is outside the allowed range [0, 100]"),
                    ));
                }
                let scenario = ctx.scenario;
                ctx.task_mut()?.complete.set(scenario, value);
                Ok(NodeValue::None)
            },
        )),
    );
}

// ============================================================================
// Allocations
// ============================================================================

fn declare_allocations(registry: &mut SyntaxRegistry) {
    registry.define_rule("allocation");
    registry.add_pattern(
        "allocation",
        Pattern::new(vec![sub("allocationHeader"), sub("allocationBody")]).with_action(action(
            |ctx, _| {
                let at = ctx.at();
                let allocation = ctx.allocation.take().ok_or_else(|| {
                    Message::error(ErrorCode::T0901, "no allocation is under construction").at(at)
                })?;
                ctx.task_mut()?.allocations.push(allocation);
                Ok(NodeValue::None)
            },
        )),
    );

    registry.define_rule("allocationHeader");
    registry.add_pattern(
        "allocationHeader",
        Pattern::new(vec![sub("pathRef")]).with_action(action(|ctx, mut values| {
            let target = arg(&mut values, 0).into_id()?;
            ctx.allocation = Some(Allocation::new(PathRef::new(target, ctx.at())));
            Ok(NodeValue::None)
        })),
    );

    registry.define_optional_body("allocationBody", "allocationAttributes");

    registry.define_rule("allocationAttributes");
    registry.set_optional("allocationAttributes");
    registry.set_repeatable("allocationAttributes");
    registry.add_pattern(
        "allocationAttributes",
        Pattern::new(vec![kw("alternative"), sub("pathRefList")]).with_action(action(
            |ctx, mut values| {
                let at = ctx.at();
                let mut alternatives = Vec::new();
                for value in arg(&mut values, 1).into_list()? {
                    alternatives.push(PathRef::new(value.into_id()?, at));
                }
                let allocation = current_allocation(ctx)?;
                allocation.candidates.extend(alternatives);
                Ok(NodeValue::None)
            },
        )),
    );
    registry.add_pattern(
        "allocationAttributes",
        Pattern::new(vec![kw("select"), sub("selectionMode")]).with_action(action(
            |ctx, mut values| {
                let mode_id = arg(&mut values, 1).into_id()?;
                let mode = SelectionMode::from_keyword(&mode_id).ok_or_else(|| {
                    Message::error(
                        ErrorCode::T0901,
                        format!("'{mode_id}' is not a selection mode"),
                    )
                })?;
                current_allocation(ctx)?.selection = mode;
                Ok(NodeValue::None)
            },
        )),
    );
    registry.add_pattern(
        "allocationAttributes",
        Pattern::new(vec![kw("persistent")]).with_action(action(|ctx, _| {
            current_allocation(ctx)?.persistent = true;
            Ok(NodeValue::None)
        })),
    );
    registry.add_pattern(
        "allocationAttributes",
        Pattern::new(vec![kw("mandatory")]).with_action(action(|ctx, _| {
            current_allocation(ctx)?.mandatory = true;
            Ok(NodeValue::None)
        })),
    );

    registry.define_rule("selectionMode");
    for mode in ["order", "minallocated", "minloaded", "maxloaded", "random"] {
        registry.add_pattern(
            "selectionMode",
            Pattern::new(vec![kw(mode)]).with_action(pass(0)),
        );
    }

    registry.define_list_rule("allocationList", sub("allocation"));
}

fn current_allocation(ctx: &mut ParseCtx) -> Result<&mut Allocation, ParseError> {
    let at = ctx.at();
    ctx.allocation.as_mut().ok_or_else(|| {
        Message::error(ErrorCode::T0901, "allocation attribute outside an allocate entry")
            .at(at)
            .into()
    })
}
