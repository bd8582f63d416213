//! Scenario tree and per-scenario value storage.
//!
//! Every project has at least one scenario; index 0 is the root. Child
//! scenarios inherit attribute values from their parent chain: a value is
//! stored only for the scenario that explicitly set it, and lookups walk
//! up the tree on a miss. Overriding a value in a child therefore never
//! touches what the parent stored.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

/// One node of the scenario tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub id: SmolStr,
    pub name: SmolStr,
    pub parent: Option<usize>,
}

/// The scenario tree. Ids are unique across the whole tree, not just
/// among siblings.
#[derive(Debug, Clone)]
pub struct ScenarioTree {
    scenarios: Vec<Scenario>,
    by_id: FxHashMap<SmolStr, usize>,
}

impl ScenarioTree {
    /// A fresh tree containing the built-in root scenario `plan`.
    pub fn new() -> Self {
        let root = Scenario { id: "plan".into(), name: "Plan".into(), parent: None };
        let mut by_id = FxHashMap::default();
        by_id.insert(root.id.clone(), 0);
        Self { scenarios: vec![root], by_id }
    }

    /// Replace the id and name of the root scenario. Fails with the id
    /// when another scenario already uses it.
    pub fn rename_root(&mut self, id: impl Into<SmolStr>, name: impl Into<SmolStr>) -> Result<(), SmolStr> {
        let id = id.into();
        if self.by_id.get(&id).is_some_and(|&index| index != 0) {
            return Err(id);
        }
        let old = self.scenarios[0].id.clone();
        self.by_id.remove(&old);
        self.by_id.insert(id.clone(), 0);
        self.scenarios[0].id = id;
        self.scenarios[0].name = name.into();
        Ok(())
    }

    /// Add a child scenario. Fails with the id on a duplicate.
    pub fn add_child(
        &mut self,
        parent: usize,
        id: impl Into<SmolStr>,
        name: impl Into<SmolStr>,
    ) -> Result<usize, SmolStr> {
        let id = id.into();
        if self.by_id.contains_key(&id) {
            return Err(id);
        }
        let index = self.scenarios.len();
        self.by_id.insert(id.clone(), index);
        self.scenarios.push(Scenario { id, name: name.into(), parent: Some(parent) });
        Ok(index)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn parent_of(&self, index: usize) -> Option<usize> {
        self.scenarios[index].parent
    }

    pub fn get(&self, index: usize) -> &Scenario {
        &self.scenarios[index]
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.iter()
    }
}

impl Default for ScenarioTree {
    fn default() -> Self {
        Self::new()
    }
}

/// A scenario-specific attribute slot: a sparse map from scenario index
/// to the value that scenario explicitly set.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioValues<T> {
    values: FxHashMap<usize, T>,
}

impl<T> Default for ScenarioValues<T> {
    fn default() -> Self {
        Self { values: FxHashMap::default() }
    }
}

impl<T> ScenarioValues<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value for one scenario, returning the previous one.
    pub fn set(&mut self, scenario: usize, value: T) -> Option<T> {
        self.values.insert(scenario, value)
    }

    /// The value this scenario set itself; no inheritance.
    pub fn get(&self, scenario: usize) -> Option<&T> {
        self.values.get(&scenario)
    }

    pub fn get_or_insert_default(&mut self, scenario: usize) -> &mut T
    where
        T: Default,
    {
        self.values.entry(scenario).or_default()
    }

    /// Resolve the value for a scenario, walking up the parent chain on
    /// a miss.
    pub fn resolve(&self, tree: &ScenarioTree, scenario: usize) -> Option<&T> {
        let mut current = Some(scenario);
        while let Some(index) = current {
            if let Some(value) = self.values.get(&index) {
                return Some(value);
            }
            current = tree.parent_of(index);
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
