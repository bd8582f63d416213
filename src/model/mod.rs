//! The in-memory project model.
//!
//! What a successful parse produces: the [`Project`] with its calendar
//! settings, scenario tree, task and resource sets, report definitions and
//! user-extended attributes. Later stages (scheduling, report generation)
//! consume this model; nothing in here depends on the parser.

mod attributes;
mod calendar;
mod property;
mod project;
mod report;
mod resource;
mod scenario;
mod scopes;
mod task;

pub use attributes::{
    AttributeData, AttributeDefinition, AttributeRegistry, AttributeType, AttributeValue,
    ExtendedValues,
};
pub use calendar::{DurationUnit, Interval, TimeSlot, Vacation, WorkingHours};
pub use property::{PathRef, Property, PropertySet};
pub use project::{Project, DEFAULT_DAILY_WORKING_HOURS, DEFAULT_YEARLY_WORKING_DAYS};
pub use report::{Report, ReportKind, SortCriterion, SortDirection};
pub use resource::{Booking, Resource};
pub use scenario::{Scenario, ScenarioTree, ScenarioValues};
pub use scopes::{ResourceScope, TaskScope};
pub use task::{Allocation, Dependency, DependencyKind, SelectionMode, Task};
