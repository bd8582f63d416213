//! Report definitions.
//!
//! Reports are stored, not rendered: the parser collects the output file,
//! the column selection, filters and sort order, and later stages turn
//! that into files.

use smol_str::SmolStr;

use crate::logical::LogicalOperation;

use super::calendar::Interval;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Tasks,
    Resources,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Up,
    Down,
}

/// One entry of a `sorttasks` / `sortresources` list: an attribute key
/// with an optional `.up` / `.down` suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortCriterion {
    pub key: SmolStr,
    pub direction: SortDirection,
}

impl SortCriterion {
    /// Parse `key`, `key.up` or `key.down`. Anything else is `None`.
    pub fn parse(spec: &str) -> Option<Self> {
        let (key, direction) = match spec.split_once('.') {
            None => (spec, SortDirection::Up),
            Some((key, "up")) => (key, SortDirection::Up),
            Some((key, "down")) => (key, SortDirection::Down),
            Some(_) => return None,
        };
        if key.is_empty() {
            return None;
        }
        Some(Self { key: key.into(), direction })
    }
}

#[derive(Debug)]
pub struct Report {
    pub kind: ReportKind,
    pub file_name: SmolStr,
    pub columns: Vec<SmolStr>,
    /// Restricts the report to this interval; must lie inside the
    /// project interval.
    pub period: Option<Interval>,
    pub headline: Option<SmolStr>,
    pub hide_task: Option<LogicalOperation>,
    pub hide_resource: Option<LogicalOperation>,
    pub sort_tasks: Vec<SortCriterion>,
    pub sort_resources: Vec<SortCriterion>,
    /// Task index limiting a task report to one subtree.
    pub task_root: Option<usize>,
}

impl Report {
    pub fn new(kind: ReportKind, file_name: impl Into<SmolStr>) -> Self {
        let columns = match kind {
            ReportKind::Tasks => vec!["name".into(), "start".into(), "end".into(), "effort".into()],
            ReportKind::Resources => vec!["name".into(), "rate".into(), "effort".into()],
        };
        Self {
            kind,
            file_name: file_name.into(),
            columns,
            period: None,
            headline: None,
            hide_task: None,
            hide_resource: None,
            sort_tasks: Vec::new(),
            sort_resources: Vec::new(),
            task_root: None,
        }
    }
}
