//! [`LogicalScope`] views over tasks and resources.
//!
//! Report filters evaluate against one entity at a time, but attribute
//! resolution needs the surrounding project (scenario tree, extended
//! attribute registries). These thin wrappers carry both.

use crate::logical::{LogicalScope, LogicalValue};

use super::attributes::AttributeValue;
use super::project::Project;

/// Priority applied when a task never set one.
const DEFAULT_PRIORITY: i64 = 500;

pub struct TaskScope<'a> {
    project: &'a Project,
    task: usize,
}

impl<'a> TaskScope<'a> {
    pub fn new(project: &'a Project, task: usize) -> Self {
        Self { project, task }
    }
}

impl LogicalScope for TaskScope<'_> {
    fn has_flag(&self, name: &str) -> bool {
        self.project.tasks.get(self.task).has_flag(name)
    }

    fn attribute(&self, scenario: usize, name: &str) -> Option<LogicalValue> {
        let task = self.project.tasks.get(self.task);
        let tree = &self.project.scenarios;
        match name {
            "id" => Some(LogicalValue::Str(task.full_id.clone())),
            "name" => Some(LogicalValue::Str(task.name.clone())),
            "milestone" => Some(LogicalValue::Bool(task.milestone)),
            "priority" => Some(LogicalValue::Int(
                task.priority.map_or(DEFAULT_PRIORITY, i64::from),
            )),
            "start" => task.start.resolve(tree, scenario).map(|d| LogicalValue::Date(*d)),
            "end" => task.end.resolve(tree, scenario).map(|d| LogicalValue::Date(*d)),
            "duration" => task.duration.resolve(tree, scenario).map(|s| LogicalValue::Int(*s)),
            "length" => task.length.resolve(tree, scenario).map(|s| LogicalValue::Int(*s)),
            "effort" => task.effort.resolve(tree, scenario).map(|s| LogicalValue::Int(*s)),
            "complete" => task.complete.resolve(tree, scenario).map(|p| LogicalValue::Float(*p)),
            _ => {
                let def = self.project.task_attributes.get(name)?;
                task.extended
                    .value_or_default(def, tree, scenario)
                    .map(attribute_value)
            }
        }
    }
}

pub struct ResourceScope<'a> {
    project: &'a Project,
    resource: usize,
}

impl<'a> ResourceScope<'a> {
    pub fn new(project: &'a Project, resource: usize) -> Self {
        Self { project, resource }
    }
}

impl LogicalScope for ResourceScope<'_> {
    fn has_flag(&self, name: &str) -> bool {
        self.project.resources.get(self.resource).has_flag(name)
    }

    fn attribute(&self, scenario: usize, name: &str) -> Option<LogicalValue> {
        let resource = self.project.resources.get(self.resource);
        match name {
            "id" => Some(LogicalValue::Str(resource.full_id.clone())),
            "name" => Some(LogicalValue::Str(resource.name.clone())),
            "rate" => resource.rate.map(LogicalValue::Float),
            "efficiency" => Some(LogicalValue::Float(resource.efficiency.unwrap_or(1.0))),
            _ => {
                let def = self.project.resource_attributes.get(name)?;
                resource
                    .extended
                    .value_or_default(def, &self.project.scenarios, scenario)
                    .map(attribute_value)
            }
        }
    }
}

fn attribute_value(value: &AttributeValue) -> LogicalValue {
    match value {
        AttributeValue::Date(d) => LogicalValue::Date(*d),
        AttributeValue::Reference(s) | AttributeValue::Text(s) => LogicalValue::Str(s.clone()),
    }
}
