//! Parse context and the tagged sub-value model.
//!
//! Every semantic action receives the same two things: the sub-values the
//! matcher collected for the pattern, and a [`ParseCtx`] holding the
//! project under construction, the property scope stack, the active
//! scenario, a handle back to the rule table (for `extend`) and the
//! warning log. The matcher threads the context through the whole parse;
//! nothing is global.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use smol_str::SmolStr;
use time::PrimitiveDateTime;

use crate::base::SourceRef;
use crate::logical::LogicalOperand;
use crate::model::{Allocation, Booking, Interval, Project, Report, Resource, Task};

use super::errors::{ErrorCode, Message, MessageLog, ParseError};
use super::registry::SyntaxRegistry;

// ============================================================================
// Node values
// ============================================================================

/// The value a matched symbol contributes to its pattern.
///
/// Keywords contribute their text as [`NodeValue::Id`], terminals their
/// cooked token value, non-terminals whatever the sub-rule's action
/// returned. Actions destructure these positionally.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    None,
    Id(SmolStr),
    Str(SmolStr),
    Int(i64),
    Float(f64),
    Date(PrimitiveDateTime),
    /// Seconds since midnight.
    TimeOfDay(u32),
    /// A duration reduced to seconds.
    Seconds(i64),
    Interval(Interval),
    Logical(Box<LogicalOperand>),
    List(Vec<NodeValue>),
}

impl NodeValue {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::None => "nothing",
            Self::Id(_) => "an identifier",
            Self::Str(_) => "a string",
            Self::Int(_) => "an integer",
            Self::Float(_) => "a floating point number",
            Self::Date(_) => "a date",
            Self::TimeOfDay(_) => "a time of day",
            Self::Seconds(_) => "a duration",
            Self::Interval(_) => "an interval",
            Self::Logical(_) => "a logical expression",
            Self::List(_) => "a list",
        }
    }

    fn mismatch(&self, wanted: &str) -> ParseError {
        Message::error(
            ErrorCode::T0901,
            format!("expected {wanted} here, but the grammar produced {}", self.kind()),
        )
        .into()
    }

    pub fn into_id(self) -> Result<SmolStr, ParseError> {
        match self {
            Self::Id(id) => Ok(id),
            other => Err(other.mismatch("an identifier")),
        }
    }

    pub fn into_str(self) -> Result<SmolStr, ParseError> {
        match self {
            Self::Str(s) => Ok(s),
            other => Err(other.mismatch("a string")),
        }
    }

    pub fn into_int(self) -> Result<i64, ParseError> {
        match self {
            Self::Int(i) => Ok(i),
            other => Err(other.mismatch("an integer")),
        }
    }

    /// Integer or float, widened to `f64`.
    pub fn as_number(&self) -> Result<f64, ParseError> {
        match self {
            Self::Int(i) => Ok(*i as f64),
            Self::Float(f) => Ok(*f),
            other => Err(other.mismatch("a number")),
        }
    }

    pub fn into_date(self) -> Result<PrimitiveDateTime, ParseError> {
        match self {
            Self::Date(d) => Ok(d),
            other => Err(other.mismatch("a date")),
        }
    }

    pub fn into_time(self) -> Result<u32, ParseError> {
        match self {
            Self::TimeOfDay(t) => Ok(t),
            other => Err(other.mismatch("a time of day")),
        }
    }

    pub fn into_seconds(self) -> Result<i64, ParseError> {
        match self {
            Self::Seconds(s) => Ok(s),
            other => Err(other.mismatch("a duration")),
        }
    }

    pub fn into_interval(self) -> Result<Interval, ParseError> {
        match self {
            Self::Interval(i) => Ok(i),
            other => Err(other.mismatch("an interval")),
        }
    }

    pub fn into_logical(self) -> Result<LogicalOperand, ParseError> {
        match self {
            Self::Logical(operand) => Ok(*operand),
            other => Err(other.mismatch("a logical expression")),
        }
    }

    pub fn into_list(self) -> Result<Vec<NodeValue>, ParseError> {
        match self {
            Self::List(items) => Ok(items),
            Self::None => Ok(Vec::new()),
            other => Err(other.mismatch("a list")),
        }
    }
}

// ============================================================================
// Scope bookkeeping
// ============================================================================

/// The model entity currently being filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyRef {
    Task(usize),
    Resource(usize),
    Scenario(usize),
    Report(usize),
}

/// Target of an `extend` declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendTarget {
    Task,
    Resource,
}

impl ExtendTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Resource => "resource",
        }
    }
}

/// A scanner-level side effect requested by an action. Actions never see
/// the token stream; the matcher drains these after each action and
/// applies them in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOp {
    Include { target: SmolStr, at: SourceRef },
    DefineMacro { name: SmolStr, body: SmolStr, at: SourceRef },
}

/// Reportable columns start out with the built-in attributes; `extend`
/// adds to them.
const BUILTIN_COLUMNS: &[(&str, &str)] = &[
    ("id", "Id"),
    ("name", "Name"),
    ("start", "Start"),
    ("end", "End"),
    ("duration", "Duration"),
    ("length", "Length"),
    ("effort", "Effort"),
    ("complete", "Completion"),
    ("priority", "Priority"),
    ("milestone", "Milestone"),
    ("flags", "Flags"),
    ("note", "Note"),
    ("responsible", "Responsible"),
    ("rate", "Rate"),
    ("efficiency", "Efficiency"),
];

/// Shared state of one parse run.
pub struct ParseCtx {
    /// `None` until the project header has been read.
    pub project: Option<Project>,
    /// The live rule table; `extend` actions splice patterns into it.
    pub registry: Rc<RefCell<SyntaxRegistry>>,
    /// Non-fatal diagnostics collected along the way.
    pub log: MessageLog,
    /// Active scenario index; 0 unless a `scenarioId:` prefix is open.
    pub scenario: usize,
    /// Set while an `extend task { ... }` body is being read.
    pub extend_target: Option<ExtendTarget>,
    /// Whether a top-level `scenario` has replaced the built-in root.
    pub root_scenario_declared: bool,
    /// Allocation under construction, while inside `allocate ... { ... }`.
    pub allocation: Option<Allocation>,
    /// Booking under construction, while inside `booking ... { ... }`.
    pub booking: Option<Booking>,

    property_stack: Vec<PropertyRef>,
    scenario_stack: Vec<usize>,
    columns: IndexMap<SmolStr, SmolStr>,
    stream_ops: Vec<StreamOp>,
    at: SourceRef,
}

impl ParseCtx {
    pub fn new(registry: Rc<RefCell<SyntaxRegistry>>) -> Self {
        let mut columns = IndexMap::new();
        for (id, title) in BUILTIN_COLUMNS {
            columns.insert(SmolStr::new(id), SmolStr::new(title));
        }
        Self {
            project: None,
            registry,
            log: MessageLog::new(),
            scenario: 0,
            extend_target: None,
            root_scenario_declared: false,
            allocation: None,
            booking: None,
            property_stack: Vec::new(),
            scenario_stack: Vec::new(),
            columns,
            stream_ops: Vec::new(),
            at: SourceRef::default(),
        }
    }

    // ------------------------------------------------------------------
    // Locations and diagnostics
    // ------------------------------------------------------------------

    /// Location of the pattern currently being reduced. The matcher sets
    /// this right before invoking an action.
    pub fn at(&self) -> SourceRef {
        self.at
    }

    pub fn set_at(&mut self, at: SourceRef) {
        self.at = at;
    }

    /// An error pointing at the current pattern.
    pub fn error(&self, code: ErrorCode, text: impl Into<String>) -> ParseError {
        Message::error(code, text).at(self.at).into()
    }

    /// Record a warning pointing at the current pattern.
    pub fn warn(&mut self, code: ErrorCode, text: impl Into<String>) {
        self.log.push(Message::warning(code, text).at(self.at));
    }

    // ------------------------------------------------------------------
    // Project access
    // ------------------------------------------------------------------

    pub fn create_project(&mut self, project: Project) -> Result<(), ParseError> {
        if self.project.is_some() {
            return Err(self.error(
                ErrorCode::T0301,
                "a project has already been defined; only one project per file is allowed",
            ));
        }
        self.project = Some(project);
        Ok(())
    }

    pub fn project(&self) -> Result<&Project, ParseError> {
        self.project.as_ref().ok_or_else(|| {
            Message::error(ErrorCode::T0302, "no project has been defined yet")
                .at(self.at)
                .into()
        })
    }

    pub fn project_mut(&mut self) -> Result<&mut Project, ParseError> {
        let at = self.at;
        self.project.as_mut().ok_or_else(|| {
            Message::error(ErrorCode::T0302, "no project has been defined yet")
                .at(at)
                .into()
        })
    }

    // ------------------------------------------------------------------
    // Property scope stack
    // ------------------------------------------------------------------

    /// Push the entity a header action just created. The matching body's
    /// enclosing pattern pops it again.
    pub fn open_property(&mut self, property: PropertyRef) {
        self.property_stack.push(property);
    }

    pub fn close_property(&mut self) -> Option<PropertyRef> {
        self.property_stack.pop()
    }

    pub fn current_property(&self) -> Option<PropertyRef> {
        self.property_stack.last().copied()
    }

    fn scope_mismatch(&self, wanted: &str) -> ParseError {
        Message::error(
            ErrorCode::T0901,
            format!("this attribute can only appear inside a {wanted}"),
        )
        .at(self.at)
        .into()
    }

    /// The task currently being filled in.
    pub fn task_mut(&mut self) -> Result<&mut Task, ParseError> {
        match self.current_property() {
            Some(PropertyRef::Task(index)) => Ok(self.project_mut()?.tasks.get_mut(index)),
            _ => Err(self.scope_mismatch("task")),
        }
    }

    pub fn resource_mut(&mut self) -> Result<&mut Resource, ParseError> {
        match self.current_property() {
            Some(PropertyRef::Resource(index)) => Ok(self.project_mut()?.resources.get_mut(index)),
            _ => Err(self.scope_mismatch("resource")),
        }
    }

    pub fn report_mut(&mut self) -> Result<&mut Report, ParseError> {
        match self.current_property() {
            Some(PropertyRef::Report(index)) => {
                Ok(&mut self.project_mut()?.reports[index])
            }
            _ => Err(self.scope_mismatch("report")),
        }
    }

    // ------------------------------------------------------------------
    // Scenario prefix stack
    // ------------------------------------------------------------------

    /// Enter a `scenarioId:` qualified attribute.
    pub fn push_scenario(&mut self, scenario: usize) {
        self.scenario_stack.push(self.scenario);
        self.scenario = scenario;
    }

    pub fn pop_scenario(&mut self) {
        self.scenario = self.scenario_stack.pop().unwrap_or(0);
    }

    // ------------------------------------------------------------------
    // Report columns
    // ------------------------------------------------------------------

    /// Make an attribute usable in report `columns` lists. Registering an
    /// existing id again just updates the title.
    pub fn register_column(&mut self, id: SmolStr, title: SmolStr) {
        self.columns.insert(id, title);
    }

    pub fn has_column(&self, id: &str) -> bool {
        self.columns.contains_key(id)
    }

    // ------------------------------------------------------------------
    // Stream requests
    // ------------------------------------------------------------------

    pub fn request_include(&mut self, target: SmolStr, at: SourceRef) {
        self.stream_ops.push(StreamOp::Include { target, at });
    }

    pub fn request_macro(&mut self, name: SmolStr, body: SmolStr, at: SourceRef) {
        self.stream_ops.push(StreamOp::DefineMacro { name, body, at });
    }

    pub fn take_stream_ops(&mut self) -> Vec<StreamOp> {
        std::mem::take(&mut self.stream_ops)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn ctx() -> ParseCtx {
        ParseCtx::new(Rc::new(RefCell::new(SyntaxRegistry::new())))
    }

    fn demo_project() -> Project {
        let interval =
            Interval::checked(datetime!(2024-01-01 0:00), datetime!(2024-06-01 0:00)).unwrap();
        Project::new("p", "P", "1.0", interval)
    }

    #[test]
    fn accessors_reject_mismatched_values() {
        assert_eq!(NodeValue::Id("x".into()).into_id().unwrap(), "x");
        assert_eq!(NodeValue::Int(3).as_number().unwrap(), 3.0);
        assert_eq!(NodeValue::Float(2.5).as_number().unwrap(), 2.5);

        let err = NodeValue::Str("x".into()).into_int().unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::T0901));
        let err = NodeValue::None.into_date().unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::T0901));
    }

    #[test]
    fn into_list_treats_missing_values_as_empty() {
        assert_eq!(NodeValue::None.into_list().unwrap(), Vec::new());
        let items = NodeValue::List(vec![NodeValue::Int(1)]).into_list().unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn only_one_project_per_parse() {
        let mut ctx = ctx();
        ctx.create_project(demo_project()).unwrap();
        let err = ctx.create_project(demo_project()).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::T0301));
    }

    #[test]
    fn project_access_before_the_header_is_an_error() {
        let ctx = ctx();
        assert_eq!(ctx.project().unwrap_err().code(), Some(ErrorCode::T0302));
    }

    #[test]
    fn property_stack_nests() {
        let mut ctx = ctx();
        assert_eq!(ctx.current_property(), None);
        ctx.open_property(PropertyRef::Task(0));
        ctx.open_property(PropertyRef::Task(1));
        assert_eq!(ctx.current_property(), Some(PropertyRef::Task(1)));
        assert_eq!(ctx.close_property(), Some(PropertyRef::Task(1)));
        assert_eq!(ctx.current_property(), Some(PropertyRef::Task(0)));
    }

    #[test]
    fn scenario_prefixes_restore_the_previous_index() {
        let mut ctx = ctx();
        ctx.push_scenario(2);
        assert_eq!(ctx.scenario, 2);
        ctx.push_scenario(1);
        assert_eq!(ctx.scenario, 1);
        ctx.pop_scenario();
        assert_eq!(ctx.scenario, 2);
        ctx.pop_scenario();
        assert_eq!(ctx.scenario, 0);
    }

    #[test]
    fn attribute_scope_checks_report_the_expected_owner() {
        let mut ctx = ctx();
        ctx.create_project(demo_project()).unwrap();
        let err = ctx.task_mut().unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::T0901));
    }

    #[test]
    fn builtin_columns_are_seeded() {
        let mut ctx = ctx();
        assert!(ctx.has_column("start"));
        assert!(ctx.has_column("rate"));
        assert!(!ctx.has_column("Deadline"));
        ctx.register_column("Deadline".into(), "Deadline".into());
        assert!(ctx.has_column("Deadline"));
    }
}
