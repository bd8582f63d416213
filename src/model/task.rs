//! Tasks, dependencies and resource allocations.

use smol_str::SmolStr;
use time::PrimitiveDateTime;

use crate::base::SourceRef;

use super::attributes::ExtendedValues;
use super::property::{PathRef, Property};
use super::scenario::ScenarioValues;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
    /// This task starts after the target ends.
    Depends,
    /// The target starts after this task ends.
    Precedes,
}

/// One `depends` / `precedes` entry. The target stays textual until the
/// whole file has been read; forward references are legal.
#[derive(Debug, Clone, PartialEq)]
pub struct Dependency {
    pub target: PathRef,
    pub kind: DependencyKind,
    /// Task index, filled in by reference resolution after the parse.
    pub resolved: Option<usize>,
}

impl Dependency {
    pub fn new(target: PathRef, kind: DependencyKind) -> Self {
        Self { target, kind, resolved: None }
    }
}

/// How the scheduler picks among allocation candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    Order,
    #[default]
    MinAllocated,
    MinLoaded,
    MaxLoaded,
    Random,
}

impl SelectionMode {
    pub fn from_keyword(text: &str) -> Option<Self> {
        match text {
            "order" => Some(Self::Order),
            "minallocated" => Some(Self::MinAllocated),
            "minloaded" => Some(Self::MinLoaded),
            "maxloaded" => Some(Self::MaxLoaded),
            "random" => Some(Self::Random),
            _ => None,
        }
    }
}

/// One `allocate` entry: a primary candidate plus alternatives.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub candidates: Vec<PathRef>,
    /// Resource indices for `candidates`, filled in by reference
    /// resolution after the parse.
    pub resolved: Vec<usize>,
    pub selection: SelectionMode,
    /// Keep the once-picked resource across scheduling breaks.
    pub persistent: bool,
    pub mandatory: bool,
}

impl Allocation {
    pub fn new(primary: PathRef) -> Self {
        Self {
            candidates: vec![primary],
            resolved: Vec::new(),
            selection: SelectionMode::default(),
            persistent: false,
            mandatory: false,
        }
    }
}

/// A task. Scenario-specific attributes are sparse per-scenario slots;
/// everything else is set once per task.
#[derive(Debug)]
pub struct Task {
    pub id: SmolStr,
    pub full_id: SmolStr,
    pub name: SmolStr,
    pub parent: Option<usize>,
    pub defined_at: SourceRef,

    pub milestone: bool,
    pub priority: Option<u32>,
    pub responsible: Option<PathRef>,
    pub note: Option<SmolStr>,
    pub flags: Vec<SmolStr>,
    pub dependencies: Vec<Dependency>,
    pub allocations: Vec<Allocation>,

    pub start: ScenarioValues<PrimitiveDateTime>,
    pub end: ScenarioValues<PrimitiveDateTime>,
    /// Calendar seconds.
    pub duration: ScenarioValues<i64>,
    /// Working-time seconds.
    pub length: ScenarioValues<i64>,
    /// Working-time seconds of resource effort.
    pub effort: ScenarioValues<i64>,
    /// Percent, 0 to 100.
    pub complete: ScenarioValues<f64>,

    pub extended: ExtendedValues,
}

impl Task {
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
            milestone: false,
            priority: None,
            responsible: None,
            note: None,
            flags: Vec::new(),
            dependencies: Vec::new(),
            allocations: Vec::new(),
            start: ScenarioValues::new(),
            end: ScenarioValues::new(),
            duration: ScenarioValues::new(),
            length: ScenarioValues::new(),
            effort: ScenarioValues::new(),
            complete: ScenarioValues::new(),
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
}

impl Property for Task {
    fn full_id(&self) -> &SmolStr {
        &self.full_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_mode_keywords() {
        assert_eq!(SelectionMode::from_keyword("order"), Some(SelectionMode::Order));
        assert_eq!(SelectionMode::from_keyword("minallocated"), Some(SelectionMode::MinAllocated));
        assert_eq!(SelectionMode::from_keyword("greedy"), None);
        assert_eq!(SelectionMode::default(), SelectionMode::MinAllocated);
    }

    #[test]
    fn flags_are_kept_unique() {
        let mut task = Task::new("t", "t", "T", None, SourceRef::default());
        task.add_flag("urgent".into());
        task.add_flag("urgent".into());
        assert_eq!(task.flags.len(), 1);
        assert!(task.has_flag("urgent"));
        assert!(!task.has_flag("cheap"));
    }
}
