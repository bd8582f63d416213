//! The TJP grammar catalog.
//!
//! Everything the parser accepts is declared here, as data, against the
//! rule table in [`super::registry`]. The driver builds a fresh catalog
//! for every parse so that `extend` declarations never leak from one file
//! into the next.

use super::registry::SyntaxRegistry;

mod helpers;
mod logical;
mod project;
mod reports;
mod resources;
mod scenarios;
mod tasks;
mod values;

/// Rule the driver starts matching from.
pub const ROOT_RULE: &str = "projectFile";

// Rules `extend` splices user attribute patterns into. Plain attributes
// land in the per-property rule, scenario-specific ones in the scenario
// attribute rule so they work behind a `scenarioId:` prefix too.
const TASK_ATTRIBUTES: &str = "taskAttributes";
const TASK_SCENARIO_ATTRIBUTES: &str = "taskScenarioAttributes";
const RESOURCE_ATTRIBUTES: &str = "resourceAttributes";
const RESOURCE_SCENARIO_ATTRIBUTES: &str = "resourceScenarioAttributes";

/// Build the full rule table.
pub fn build_catalog() -> SyntaxRegistry {
    let mut registry = SyntaxRegistry::new();
    values::declare(&mut registry);
    logical::declare(&mut registry);
    scenarios::declare(&mut registry);
    tasks::declare(&mut registry);
    resources::declare(&mut registry);
    reports::declare(&mut registry);
    project::declare(&mut registry);
    registry
}

#[cfg(test)]
mod tests {
    use super::super::syntax::{Pattern, Symbol};
    use super::super::tokens::{Token, TokenClass, TokenValue};
    use super::*;

    use crate::base::SourceRef;

    fn id(text: &str) -> Token {
        Token::new(TokenClass::Id, text, TokenValue::None, SourceRef::default())
    }

    #[test]
    fn every_referenced_rule_is_defined() {
        let registry = build_catalog();
        let mut missing = Vec::new();
        for rule in registry.rules() {
            for pattern in &rule.patterns {
                for symbol in &pattern.symbols {
                    if let Symbol::NonTerminal(name) = symbol {
                        if !registry.contains(name) {
                            missing
                                .push(format!("<{}> references undefined <{name}>", rule.name));
                        }
                    }
                }
            }
        }
        assert!(missing.is_empty(), "{}", missing.join("\n"));
    }

    #[test]
    fn the_root_and_splice_rules_exist() {
        let registry = build_catalog();
        for rule in [
            ROOT_RULE,
            TASK_ATTRIBUTES,
            TASK_SCENARIO_ATTRIBUTES,
            RESOURCE_ATTRIBUTES,
            RESOURCE_SCENARIO_ATTRIBUTES,
        ] {
            assert!(registry.contains(rule), "missing <{rule}>");
        }
    }

    #[test]
    fn core_keywords_dispatch() {
        let mut registry = build_catalog();
        assert!(registry.select_pattern("projectAttributes", &id("task")).is_some());
        assert!(registry.select_pattern("projectAttributes", &id("scenario")).is_some());
        assert!(registry.select_pattern(TASK_ATTRIBUTES, &id("effort")).is_some());
        assert!(registry.select_pattern(TASK_ATTRIBUTES, &id("gantt")).is_none());
        assert!(registry.select_pattern(RESOURCE_ATTRIBUTES, &id("booking")).is_some());
    }

    #[test]
    fn catalogs_are_independent() {
        let mut extended = build_catalog();
        let fresh = build_catalog();
        extended
            .extend_rule(
                TASK_ATTRIBUTES,
                Pattern::new(vec![Symbol::keyword("Deadline")]),
            )
            .expect("no conflict");
        assert_eq!(
            extended.lookup(TASK_ATTRIBUTES).patterns.len(),
            fresh.lookup(TASK_ATTRIBUTES).patterns.len() + 1
        );
    }
}
