//! Resources and bookings.

use smol_str::SmolStr;

use crate::base::SourceRef;

use super::attributes::ExtendedValues;
use super::calendar::{Interval, Vacation, WorkingHours};
use super::property::Property;
use super::scenario::ScenarioValues;

/// A completed piece of work: a resource was busy on a task during the
/// given intervals. Bookings are scenario-specific.
#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    /// Task index; booking targets resolve while the file is read, since
    /// bookings follow the task declarations they refer to.
    pub task: usize,
    pub intervals: Vec<Interval>,
    /// 0 = within working hours only, 1 = may extend into off-hours,
    /// 2 = around the clock.
    pub overtime: u8,
    /// 0 = reject bookings that collide with vacations or other bookings,
    /// higher values tolerate more.
    pub sloppy: u8,
    pub at: SourceRef,
}

impl Booking {
    pub fn new(task: usize, intervals: Vec<Interval>, at: SourceRef) -> Self {
        Self { task, intervals, overtime: 0, sloppy: 0, at }
    }
}

/// A resource. Like tasks, resources form a tree (teams containing
/// people), and the full id is the dotted path.
#[derive(Debug)]
pub struct Resource {
    pub id: SmolStr,
    pub full_id: SmolStr,
    pub name: SmolStr,
    pub parent: Option<usize>,
    pub defined_at: SourceRef,

    /// Cost per working day.
    pub rate: Option<f64>,
    /// 1.0 is a normal full-speed resource.
    pub efficiency: Option<f64>,
    pub flags: Vec<SmolStr>,
    pub vacations: Vec<Vacation>,
    /// `None` means the project-wide calendar applies.
    pub working_hours: Option<WorkingHours>,
    pub bookings: ScenarioValues<Vec<Booking>>,

    pub extended: ExtendedValues,
}

impl Resource {
    pub fn new(
        id: impl Into<SmolStr>,
        full_id: impl Into<SmolStr>,
        name: impl Into<SmolStr>,
        parent: Option<usize>,
        defined_at: SourceRef,
    ) -> Self {
        Self {
            id: id.into(),
            full_id: full_id.into(),
            name: name.into(),
            parent,
            defined_at,
            rate: None,
            efficiency: None,
            flags: Vec::new(),
            vacations: Vec::new(),
            working_hours: None,
            bookings: ScenarioValues::new(),
            extended: ExtendedValues::new(),
        }
    }

    pub fn has_flag(&self, name: &str) -> bool {
        self.flags.iter().any(|flag| flag == name)
    }

    pub fn add_flag(&mut self, name: SmolStr) {
        if !self.has_flag(&name) {
            self.flags.push(name);
        }
    }

    pub fn add_booking(&mut self, scenario: usize, booking: Booking) {
        self.bookings.get_or_insert_default(scenario).push(booking);
    }
}

impl Property for Resource {
    fn full_id(&self) -> &SmolStr {
        &self.full_id
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn bookings_accumulate_per_scenario() {
        let mut resource = Resource::new("dev1", "dev1", "Dev One", None, SourceRef::default());
        let interval =
            Interval::checked(datetime!(2024-01-02 9:00), datetime!(2024-01-02 13:00)).unwrap();
        resource.add_booking(0, Booking::new(0, vec![interval], SourceRef::default()));
        resource.add_booking(0, Booking::new(1, vec![interval], SourceRef::default()));
        resource.add_booking(2, Booking::new(0, vec![interval], SourceRef::default()));

        assert_eq!(resource.bookings.get(0).unwrap().len(), 2);
        assert_eq!(resource.bookings.get(2).unwrap().len(), 1);
        assert_eq!(resource.bookings.get(1), None);
    }
}
