//! Report declarations.
//!
//! `taskreport` and `resourcereport` share every attribute; the kind only
//! decides the default column set. Column and sort keys are validated
//! against the known attribute set, which includes anything `extend`
//! registered earlier in the file.

use smol_str::SmolStr;

use crate::logical::LogicalOperation;
use crate::model::{Report, ReportKind, SortCriterion};

use super::super::context::{NodeValue, ParseCtx, PropertyRef};
use super::super::errors::{ErrorCode, ParseError};
use super::super::registry::SyntaxRegistry;
use super::super::syntax::{Pattern, PatternDoc, SemanticAction};
use super::super::tokens::TokenClass;
use super::helpers::{action, arg, class, kw, pass, sub};

pub(super) fn declare(registry: &mut SyntaxRegistry) {
    registry.define_rule("report");
    registry.add_pattern(
        "report",
        Pattern::new(vec![sub("reportHeader"), sub("reportBody")]).with_action(action(
            |ctx, _| {
                ctx.close_property();
                Ok(NodeValue::None)
            },
        )),
    );

    registry.define_rule("reportHeader");
    registry.add_pattern(
        "reportHeader",
        Pattern::new(vec![kw("taskreport"), class(TokenClass::String)])
            .with_action(report_header(ReportKind::Tasks))
            .with_doc(
                PatternDoc::new(
                    "Task report",
                    "Declares a report over the task tree, written to the given \
                     file. The body may override columns, restrict the period, \
                     filter with `hidetask` and set the sort order.",
                )
                .see("resourcereport")
                .arg("file", "Output file name."),
            ),
    );
    registry.add_pattern(
        "reportHeader",
        Pattern::new(vec![kw("resourcereport"), class(TokenClass::String)])
            .with_action(report_header(ReportKind::Resources)),
    );

    registry.define_optional_body("reportBody", "reportAttributes");
    declare_report_attributes(registry);

    registry.define_list_rule("columnList", class(TokenClass::Id));

    registry.define_rule("sortCriterion");
    registry.add_pattern(
        "sortCriterion",
        Pattern::new(vec![class(TokenClass::Id)]).with_action(pass(0)),
    );
    registry.add_pattern(
        "sortCriterion",
        Pattern::new(vec![class(TokenClass::AbsoluteId)]).with_action(pass(0)),
    );
    registry.define_list_rule("sortCriteria", sub("sortCriterion"));
}

fn report_header(kind: ReportKind) -> SemanticAction {
    action(move |ctx, mut values| {
        let file_name = arg(&mut values, 1).into_str()?;
        let index = {
            let project = ctx.project_mut()?;
            project.reports.push(Report::new(kind, file_name));
            project.reports.len() - 1
        };
        ctx.open_property(PropertyRef::Report(index));
        Ok(NodeValue::None)
    })
}

fn declare_report_attributes(registry: &mut SyntaxRegistry) {
    registry.define_rule("reportAttributes");
    registry.set_optional("reportAttributes");
    registry.set_repeatable("reportAttributes");

    registry.add_pattern(
        "reportAttributes",
        Pattern::new(vec![kw("columns"), sub("columnList")]).with_action(action(
            |ctx, mut values| {
                let mut columns = Vec::new();
                for value in arg(&mut values, 1).into_list()? {
                    columns.push(value.into_id()?);
                }
                for column in &columns {
                    if !ctx.has_column(column) {
                        return Err(ctx.error(
                            ErrorCode::T0309,
                            format!("column '{column}' is not a reportable attribute"),
                        ));
                    }
                }
                // Replaces the kind's default column set.
                ctx.report_mut()?.columns = columns;
                Ok(NodeValue::None)
            },
        )),
    );
    registry.add_pattern(
        "reportAttributes",
        Pattern::new(vec![kw("period"), sub("interval")]).with_action(action(
            |ctx, mut values| {
                let period = arg(&mut values, 1).into_interval()?;
                let project_interval = ctx.project()?.interval;
                if !project_interval.contains(&period) {
                    return Err(ctx.error(
                        ErrorCode::T0307,
                        "report period lies outside the project interval",
                    ));
                }
                ctx.report_mut()?.period = Some(period);
                Ok(NodeValue::None)
            },
        )),
    );
    registry.add_pattern(
        "reportAttributes",
        Pattern::new(vec![kw("headline"), class(TokenClass::String)]).with_action(action(
            |ctx, mut values| {
                let headline = arg(&mut values, 1).into_str()?;
                ctx.report_mut()?.headline = Some(headline);
                Ok(NodeValue::None)
            },
        )),
    );
    registry.add_pattern(
        "reportAttributes",
        Pattern::new(vec![kw("hidetask"), sub("operation")])
            .with_action(action(|ctx, mut values| {
                let operand = arg(&mut values, 1).into_logical()?;
                ctx.report_mut()?.hide_task = Some(LogicalOperation::from_operand(operand));
                Ok(NodeValue::None)
            }))
            .with_doc(
                PatternDoc::new(
                    "Task filter",
                    "Hides every task for which the expression is true. \
                     Operands are flags, literals and `scenario.attribute` \
                     references.",
                )
                .see("hideresource")
                .arg("expression", "Logical expression, evaluated per task."),
            ),
    );
    registry.add_pattern(
        "reportAttributes",
        Pattern::new(vec![kw("hideresource"), sub("operation")]).with_action(action(
            |ctx, mut values| {
                let operand = arg(&mut values, 1).into_logical()?;
                ctx.report_mut()?.hide_resource = Some(LogicalOperation::from_operand(operand));
                Ok(NodeValue::None)
            },
        )),
    );
    registry.add_pattern(
        "reportAttributes",
        Pattern::new(vec![kw("sorttasks"), sub("sortCriteria")]).with_action(sort_action(true)),
    );
    registry.add_pattern(
        "reportAttributes",
        Pattern::new(vec![kw("sortresources"), sub("sortCriteria")])
            .with_action(sort_action(false)),
    );
    registry.add_pattern(
        "reportAttributes",
        Pattern::new(vec![kw("taskroot"), sub("pathRef")]).with_action(action(
            |ctx, mut values| {
                let target = arg(&mut values, 1).into_id()?;
                let index = ctx.project()?.tasks.lookup(&target).ok_or_else(|| {
                    ctx.error(ErrorCode::T0304, format!("task '{target}' is not defined"))
                })?;
                ctx.report_mut()?.task_root = Some(index);
                Ok(NodeValue::None)
            },
        )),
    );
}

fn sort_action(tasks: bool) -> SemanticAction {
    action(move |ctx, mut values| {
        let mut criteria = Vec::new();
        for value in arg(&mut values, 1).into_list()? {
            criteria.push(parse_criterion(ctx, value)?);
        }
        let report = ctx.report_mut()?;
        if tasks {
            report.sort_tasks = criteria;
        } else {
            report.sort_resources = criteria;
        }
        Ok(NodeValue::None)
    })
}

/// `key`, `key.up` or `key.down`, where the key is `tree` or a reportable
/// attribute.
fn parse_criterion(ctx: &ParseCtx, value: NodeValue) -> Result<SortCriterion, ParseError> {
    let spec = value.into_id()?;
    let unknown = |spec: &SmolStr| {
        ctx.error(
            ErrorCode::T0310,
            format!("sort criterion '{spec}' is not recognized"),
        )
    };
    let criterion = SortCriterion::parse(&spec).ok_or_else(|| unknown(&spec))?;
    if criterion.key != "tree" && !ctx.has_column(&criterion.key) {
        return Err(unknown(&spec));
    }
    Ok(criterion)
}
