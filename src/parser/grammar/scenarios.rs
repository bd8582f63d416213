//! Scenario declarations, `scenarioId:` prefixes, and `extend`.
//!
//! `extend` is where the grammar turns on itself: the semantic action of
//! an attribute definition splices a brand-new pattern into the live task
//! or resource attribute rules, so the very next token can already use the
//! new keyword. The registry's revision counter takes care of first-set
//! invalidation; all this module does is build the pattern and pick the
//! rule to splice it into.

use smol_str::SmolStr;

use crate::model::{AttributeDefinition, AttributeType, AttributeValue};

use super::super::context::{ExtendTarget, NodeValue, ParseCtx, PropertyRef};
use super::super::errors::{ErrorCode, Message, ParseError};
use super::super::registry::SyntaxRegistry;
use super::super::syntax::{Pattern, PatternDoc, SemanticAction, Symbol};
use super::super::tokens::TokenClass;
use super::helpers::{action, arg, class, kw, pass, sub};
use super::{
    RESOURCE_ATTRIBUTES, RESOURCE_SCENARIO_ATTRIBUTES, TASK_ATTRIBUTES, TASK_SCENARIO_ATTRIBUTES,
};

pub(super) fn declare(registry: &mut SyntaxRegistry) {
    declare_scenarios(registry);
    declare_extend(registry);
}

// ============================================================================
// Scenario tree
// ============================================================================

fn declare_scenarios(registry: &mut SyntaxRegistry) {
    registry.define_rule("scenario");
    registry.add_pattern(
        "scenario",
        Pattern::new(vec![sub("scenarioHeader"), sub("scenarioBody")]).with_action(action(
            |ctx, _| {
                ctx.close_property();
                Ok(NodeValue::None)
            },
        )),
    );

    // The first top-level scenario replaces the built-in `plan` root and
    // keeps index 0; further roots are rejected. Nested declarations hang
    // off the enclosing scenario.
    registry.define_rule("scenarioHeader");
    registry.add_pattern(
        "scenarioHeader",
        Pattern::new(vec![
            kw("scenario"),
            class(TokenClass::Id),
            class(TokenClass::String),
        ])
        .with_action(action(|ctx, mut values| {
            let id = arg(&mut values, 1).into_id()?;
            let name = arg(&mut values, 2).into_str()?;
            let index = match ctx.current_property() {
                Some(PropertyRef::Scenario(parent)) => {
                    let added = ctx.project_mut()?.scenarios.add_child(parent, id, name);
                    added.map_err(|dup| {
                        ctx.error(ErrorCode::T0303, format!("scenario '{dup}' is already declared"))
                    })?
                }
                _ => {
                    if ctx.root_scenario_declared {
                        return Err(ctx.error(
                            ErrorCode::T0308,
                            "the project already has a root scenario; nest further \
                             scenarios inside it",
                        ));
                    }
                    let renamed = ctx.project_mut()?.scenarios.rename_root(id, name);
                    renamed.map_err(|dup| {
                        ctx.error(ErrorCode::T0303, format!("scenario '{dup}' is already declared"))
                    })?;
                    ctx.root_scenario_declared = true;
                    0
                }
            };
            ctx.open_property(PropertyRef::Scenario(index));
            Ok(NodeValue::None)
        }))
        .with_doc(
            PatternDoc::new(
                "Scenario declaration",
                "Defines a scenario. The first scenario of a project replaces \
                 the built-in plan scenario; scenarios declared inside another \
                 scenario become its children and inherit every value the \
                 parent chain set.",
            )
            .arg("id", "Unique id, usable as an attribute prefix (`id: start ...`).")
            .arg("name", "Display name."),
        ),
    );

    registry.define_optional_body("scenarioBody", "scenarioAttributes");

    registry.define_rule("scenarioAttributes");
    registry.set_optional("scenarioAttributes");
    registry.set_repeatable("scenarioAttributes");
    registry.add_pattern("scenarioAttributes", Pattern::new(vec![sub("scenario")]));

    // `delayed: start 2024-02-01` routes the attribute to that scenario.
    registry.define_rule("scenarioPrefix");
    registry.add_pattern(
        "scenarioPrefix",
        Pattern::new(vec![class(TokenClass::IdWithColon)]).with_action(action(
            |ctx, mut values| {
                let id = arg(&mut values, 0).into_id()?;
                let index = ctx.project()?.scenarios.index_of(&id).ok_or_else(|| {
                    ctx.error(ErrorCode::T0304, format!("scenario '{id}' is not defined"))
                })?;
                ctx.push_scenario(index);
                Ok(NodeValue::None)
            },
        )),
    );
}

// ============================================================================
// extend
// ============================================================================

fn declare_extend(registry: &mut SyntaxRegistry) {
    registry.define_rule("extendProperty");
    registry.add_pattern(
        "extendProperty",
        Pattern::new(vec![sub("extendHeader"), sub("extendBody")]).with_action(action(
            |ctx, _| {
                ctx.extend_target = None;
                Ok(NodeValue::None)
            },
        )),
    );

    registry.define_rule("extendHeader");
    registry.add_pattern(
        "extendHeader",
        Pattern::new(vec![kw("extend"), sub("extendTarget")])
            .with_action(action(|ctx, mut values| {
                let target = arg(&mut values, 1).into_id()?;
                ctx.extend_target = Some(match target.as_str() {
                    "task" => ExtendTarget::Task,
                    "resource" => ExtendTarget::Resource,
                    other => {
                        return Err(Message::error(
                            ErrorCode::T0901,
                            format!("'{other}' is not an extendable property type"),
                        )
                        .into());
                    }
                });
                Ok(NodeValue::None)
            }))
            .with_doc(
                PatternDoc::new(
                    "Property extension",
                    "Adds user-defined attributes to all tasks or all resources. \
                     Each definition becomes a real keyword immediately, usable \
                     from the next line on and listable as a report column.",
                )
                .see("task")
                .see("resource"),
            ),
    );

    registry.define_rule("extendTarget");
    registry.add_pattern("extendTarget", Pattern::new(vec![kw("task")]).with_action(pass(0)));
    registry.add_pattern(
        "extendTarget",
        Pattern::new(vec![kw("resource")]).with_action(pass(0)),
    );

    // The body is mandatory; an extension without definitions is useless
    // but harmless, an extension without braces is a syntax error.
    registry.define_rule("extendBody");
    registry.add_pattern(
        "extendBody",
        Pattern::new(vec![kw("{"), sub("extendAttributes"), kw("}")]),
    );

    registry.define_rule("extendAttributes");
    registry.set_optional("extendAttributes");
    registry.set_repeatable("extendAttributes");
    for (keyword, attr_type) in [
        ("date", AttributeType::Date),
        ("reference", AttributeType::Reference),
        ("text", AttributeType::Text),
    ] {
        registry.add_pattern(
            "extendAttributes",
            Pattern::new(vec![
                kw(keyword),
                class(TokenClass::Id),
                class(TokenClass::String),
                sub("extendOptionsBody"),
            ])
            .with_action(action(move |ctx, values| {
                define_attribute(ctx, attr_type, values)
            })),
        );
    }

    registry.define_rule("extendOptionsBody");
    registry.set_optional("extendOptionsBody");
    registry.add_pattern(
        "extendOptionsBody",
        Pattern::new(vec![kw("{"), sub("extendOptions"), kw("}")]).with_action(pass(1)),
    );

    registry.define_rule("extendOptions");
    registry.set_optional("extendOptions");
    registry.set_repeatable("extendOptions");
    registry.add_pattern(
        "extendOptions",
        Pattern::new(vec![kw("inherit")]).with_action(pass(0)),
    );
    registry.add_pattern(
        "extendOptions",
        Pattern::new(vec![kw("scenariospecific")]).with_action(pass(0)),
    );
}

/// Register one attribute definition and splice its pattern into the
/// matching attribute rule.
fn define_attribute(
    ctx: &mut ParseCtx,
    attr_type: AttributeType,
    mut values: Vec<NodeValue>,
) -> Result<NodeValue, ParseError> {
    let name = arg(&mut values, 1).into_id()?;
    let title = arg(&mut values, 2).into_str()?;

    // User attributes are uppercase so they can never shadow a built-in
    // keyword spelled in lowercase.
    if !name.chars().next().is_some_and(char::is_uppercase) {
        return Err(Message::error(
            ErrorCode::T0501,
            format!("extended attribute name '{name}' must start with an uppercase letter"),
        )
        .at(ctx.at())
        .with_hint(format!("rename it to '{}'", capitalized(&name)))
        .into());
    }

    let target = ctx.extend_target.ok_or_else(|| {
        Message::error(
            ErrorCode::T0901,
            "attribute definition reached outside an extend block",
        )
    })?;

    let mut def = AttributeDefinition::new(name.clone(), title.clone(), attr_type);
    for option in arg(&mut values, 3).into_list()? {
        match option.into_id()?.as_str() {
            "inherit" => def.inherited = true,
            "scenariospecific" => def.scenario_specific = true,
            other => {
                return Err(Message::error(
                    ErrorCode::T0901,
                    format!("'{other}' is not an extension option"),
                )
                .into());
            }
        }
    }
    let scenario_specific = def.scenario_specific;

    let defined = match target {
        ExtendTarget::Task => ctx.project_mut()?.task_attributes.define(def),
        ExtendTarget::Resource => ctx.project_mut()?.resource_attributes.define(def),
    };
    defined.map_err(|dup| {
        ctx.error(
            ErrorCode::T0503,
            format!(
                "extended attribute '{dup}' is already defined for {}s",
                target.as_str()
            ),
        )
    })?;
    ctx.register_column(name.clone(), title);

    let rule = match (target, scenario_specific) {
        (ExtendTarget::Task, false) => TASK_ATTRIBUTES,
        (ExtendTarget::Task, true) => TASK_SCENARIO_ATTRIBUTES,
        (ExtendTarget::Resource, false) => RESOURCE_ATTRIBUTES,
        (ExtendTarget::Resource, true) => RESOURCE_SCENARIO_ATTRIBUTES,
    };
    let value_class = match attr_type {
        AttributeType::Date => TokenClass::Date,
        AttributeType::Reference | AttributeType::Text => TokenClass::String,
    };
    let pattern = Pattern::new(vec![Symbol::keyword(name.clone()), class(value_class)])
        .with_action(store_action(name, target, attr_type, scenario_specific));

    let spliced = ctx.registry.borrow_mut().extend_rule(rule, pattern);
    spliced.map_err(|conflict| ctx.error(ErrorCode::T0502, conflict.to_string()))?;
    Ok(NodeValue::None)
}

/// The action behind a spliced attribute pattern: store the value on the
/// task or resource currently being filled in.
fn store_action(
    name: SmolStr,
    target: ExtendTarget,
    attr_type: AttributeType,
    scenario_specific: bool,
) -> SemanticAction {
    action(move |ctx, mut values| {
        let value = match attr_type {
            AttributeType::Date => AttributeValue::Date(arg(&mut values, 1).into_date()?),
            AttributeType::Reference => AttributeValue::Reference(arg(&mut values, 1).into_str()?),
            AttributeType::Text => AttributeValue::Text(arg(&mut values, 1).into_str()?),
        };
        let scenario = ctx.scenario;
        let extended = match target {
            ExtendTarget::Task => &mut ctx.task_mut()?.extended,
            ExtendTarget::Resource => &mut ctx.resource_mut()?.extended,
        };
        if scenario_specific {
            extended.set_scenario(name.clone(), scenario, value);
        } else {
            extended.set_plain(name.clone(), value);
        }
        Ok(NodeValue::None)
    })
}

fn capitalized(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalization_hint_upcases_only_the_first_letter() {
        assert_eq!(capitalized("deadline"), "Deadline");
        assert_eq!(capitalized("xRef"), "XRef");
        assert_eq!(capitalized(""), "");
    }
}
