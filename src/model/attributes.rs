//! User-extended attributes.
//!
//! `extend task { ... }` and `extend resource { ... }` add new attributes
//! at parse time. The definition (type, title, inheritance behavior) lives
//! in an [`AttributeRegistry`] per property type; the values an entity
//! actually set live in its [`ExtendedValues`].

use indexmap::IndexMap;
use smol_str::SmolStr;
use time::PrimitiveDateTime;

use super::scenario::{ScenarioTree, ScenarioValues};

/// Value type of an extended attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    Date,
    Reference,
    Text,
}

impl AttributeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Reference => "reference",
            Self::Text => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Date(PrimitiveDateTime),
    Reference(SmolStr),
    Text(SmolStr),
}

impl AttributeValue {
    /// Textual content for text and reference values.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Reference(s) | Self::Text(s) => Some(s),
            Self::Date(_) => None,
        }
    }
}

/// One `extend` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDefinition {
    pub name: SmolStr,
    pub title: SmolStr,
    pub attr_type: AttributeType,
    /// Children copy the parent's value at creation unless they set
    /// their own later.
    pub inherited: bool,
    /// Values are kept per scenario instead of once per entity.
    pub scenario_specific: bool,
    pub default: Option<AttributeValue>,
}

impl AttributeDefinition {
    pub fn new(name: impl Into<SmolStr>, title: impl Into<SmolStr>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            attr_type,
            inherited: false,
            scenario_specific: false,
            default: None,
        }
    }
}

/// All extended attribute definitions for one property type, in
/// declaration order.
#[derive(Debug, Clone, Default)]
pub struct AttributeRegistry {
    defs: IndexMap<SmolStr, AttributeDefinition>,
}

impl AttributeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition. Fails with the name when the attribute was
    /// already defined; redefinition is never allowed.
    pub fn define(&mut self, def: AttributeDefinition) -> Result<(), SmolStr> {
        if self.defs.contains_key(&def.name) {
            return Err(def.name);
        }
        self.defs.insert(def.name.clone(), def);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&AttributeDefinition> {
        self.defs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeDefinition> {
        self.defs.values()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

/// Storage for one attribute on one entity. The definition fixes which
/// shape is used.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeData {
    Plain(AttributeValue),
    Scenario(ScenarioValues<AttributeValue>),
}

/// The extended attribute values one entity carries.
#[derive(Debug, Clone, Default)]
pub struct ExtendedValues {
    values: IndexMap<SmolStr, AttributeData>,
}

impl ExtendedValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_plain(&mut self, name: impl Into<SmolStr>, value: AttributeValue) {
        self.values.insert(name.into(), AttributeData::Plain(value));
    }

    pub fn set_scenario(&mut self, name: impl Into<SmolStr>, scenario: usize, value: AttributeValue) {
        let slot = self
            .values
            .entry(name.into())
            .or_insert_with(|| AttributeData::Scenario(ScenarioValues::new()));
        match slot {
            AttributeData::Scenario(map) => {
                map.set(scenario, value);
            }
            AttributeData::Plain(_) => {
                // The definition fixes the storage shape; mixed writes
                // cannot come out of a well-formed grammar.
                debug_assert!(false, "scenario write into a plain attribute slot");
            }
        }
    }

    /// Resolve the value of an attribute for a scenario. Plain attributes
    /// ignore the scenario; scenario-specific ones walk the parent chain.
    pub fn value(&self, name: &str, tree: &ScenarioTree, scenario: usize) -> Option<&AttributeValue> {
        match self.values.get(name)? {
            AttributeData::Plain(value) => Some(value),
            AttributeData::Scenario(map) => map.resolve(tree, scenario),
        }
    }

    /// Like [`Self::value`] but falling back to the definition's default.
    pub fn value_or_default<'a>(
        &'a self,
        def: &'a AttributeDefinition,
        tree: &ScenarioTree,
        scenario: usize,
    ) -> Option<&'a AttributeValue> {
        self.value(&def.name, tree, scenario).or(def.default.as_ref())
    }

    /// Copy the parent's values for every definition marked `inherit`,
    /// skipping attributes this entity already set.
    pub fn inherit_from(&mut self, parent: &ExtendedValues, registry: &AttributeRegistry) {
        for def in registry.iter().filter(|def| def.inherited) {
            if self.values.contains_key(&def.name) {
                continue;
            }
            if let Some(data) = parent.values.get(&def.name) {
                self.values.insert(def.name.clone(), data.clone());
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
