//! The project root.
//!
//! Everything a parse produces hangs off [`Project`]: calendar settings,
//! declared flags, the scenario tree, the task and resource sets, report
//! definitions and the extended-attribute registries. Working-time
//! conversion lives here because `effort 2d` depends on the project's
//! `dailyworkinghours` and `yearlyworkingdays` settings.

use indexmap::IndexSet;
use smol_str::SmolStr;
use time::PrimitiveDateTime;

use super::attributes::AttributeRegistry;
use super::calendar::{DurationUnit, Interval, Vacation, WorkingHours};
use super::property::PropertySet;
use super::report::Report;
use super::resource::Resource;
use super::scenario::ScenarioTree;
use super::task::Task;

pub const DEFAULT_DAILY_WORKING_HOURS: f64 = 8.0;
pub const DEFAULT_YEARLY_WORKING_DAYS: f64 = 260.714;

/// Average weeks per year (365.25 / 7); used to derive the length of a
/// working week from the yearly setting.
const WEEKS_PER_YEAR: f64 = 52.1786;

#[derive(Debug)]
pub struct Project {
    pub id: SmolStr,
    pub name: SmolStr,
    pub version: SmolStr,
    /// Scheduling happens only inside this interval.
    pub interval: Interval,

    pub now: Option<PrimitiveDateTime>,
    pub copyright: Option<SmolStr>,
    pub timezone: Option<SmolStr>,
    pub daily_working_hours: f64,
    pub yearly_working_days: f64,
    pub working_hours: WorkingHours,
    pub vacations: Vec<Vacation>,
    /// Flags usable on tasks and resources, in declaration order.
    pub flags: IndexSet<SmolStr>,

    pub scenarios: ScenarioTree,
    pub tasks: PropertySet<Task>,
    pub resources: PropertySet<Resource>,
    pub reports: Vec<Report>,

    pub task_attributes: AttributeRegistry,
    pub resource_attributes: AttributeRegistry,
}

impl Project {
    pub fn new(
        id: impl Into<SmolStr>,
        name: impl Into<SmolStr>,
        version: impl Into<SmolStr>,
        interval: Interval,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: version.into(),
            interval,
            now: None,
            copyright: None,
            timezone: None,
            daily_working_hours: DEFAULT_DAILY_WORKING_HOURS,
            yearly_working_days: DEFAULT_YEARLY_WORKING_DAYS,
            working_hours: WorkingHours::standard(),
            vacations: Vec::new(),
            flags: IndexSet::new(),
            scenarios: ScenarioTree::new(),
            tasks: PropertySet::new(),
            resources: PropertySet::new(),
            reports: Vec::new(),
            task_attributes: AttributeRegistry::new(),
            resource_attributes: AttributeRegistry::new(),
        }
    }

    /// Declare a flag. Returns false when it was already declared.
    pub fn declare_flag(&mut self, name: SmolStr) -> bool {
        self.flags.insert(name)
    }

    pub fn has_flag(&self, name: &str) -> bool {
        self.flags.contains(name)
    }

    /// Convert a working-time duration (`effort 2d`, `length 1w`) into
    /// seconds, using the project calendar settings. A day is
    /// `dailyworkinghours` hours; weeks, months and years derive from
    /// `yearlyworkingdays`.
    pub fn working_seconds(&self, value: f64, unit: DurationUnit) -> i64 {
        let day = self.daily_working_hours * 3_600.0;
        let seconds = match unit {
            DurationUnit::Minutes => value * 60.0,
            DurationUnit::Hours => value * 3_600.0,
            DurationUnit::Days => value * day,
            DurationUnit::Weeks => value * day * (self.yearly_working_days / WEEKS_PER_YEAR),
            DurationUnit::Months => value * day * (self.yearly_working_days / 12.0),
            DurationUnit::Years => value * day * self.yearly_working_days,
        };
        seconds.round() as i64
    }
}
