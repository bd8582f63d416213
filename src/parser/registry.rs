//! The rule table: named rules, first-set dispatch, runtime extension
//!
//! The registry owns every [`Rule`] of the grammar. Construction-time
//! mistakes (defining a rule twice, adding a pattern whose dispatch symbol
//! duplicates an existing alternative) are programming faults and panic.
//! The runtime path, [`SyntaxRegistry::extend_rule`], is driven by user
//! input and returns an error instead.
//!
//! Pattern selection is LL(1) at the first symbol: one peeked token picks
//! the alternative. For alternatives led by a non-terminal this needs the
//! referenced rule's first-token set; those sets are memoized per registry
//! revision, and every mutation bumps the revision, so a lookup right
//! after an extension sees the new pattern with no explicit recompilation.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use tracing::trace;

use super::context::NodeValue;
use super::syntax::{Pattern, Rule, Symbol};
use super::tokens::{Token, TokenClass};

/// The set of tokens a rule can start with.
#[derive(Debug, Clone, Default)]
pub struct FirstSet {
    keywords: FxHashSet<SmolStr>,
    classes: FxHashSet<TokenClass>,
}

impl FirstSet {
    pub fn accepts(&self, token: &Token) -> bool {
        if self.classes.contains(&token.class) {
            return true;
        }
        matches!(token.class, TokenClass::Id | TokenClass::Literal)
            && self.keywords.contains(token.text.as_str())
    }

    fn add_keyword(&mut self, text: &SmolStr) {
        self.keywords.insert(text.clone());
    }

    fn add_class(&mut self, class: TokenClass) {
        self.classes.insert(class);
    }

    fn union(&mut self, other: &FirstSet) {
        self.keywords.extend(other.keywords.iter().cloned());
        self.classes.extend(other.classes.iter());
    }
}

/// Failure to splice a pattern into a live rule: the new alternative's
/// dispatch symbol collides with an existing one.
#[derive(Debug, Clone)]
pub struct ExtendConflict {
    pub rule: SmolStr,
    pub symbol: String,
}

impl fmt::Display for ExtendConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pattern starting with {} conflicts with an existing alternative of <{}>",
            self.symbol, self.rule
        )
    }
}

/// Rule table plus its revision-stamped first-set cache.
pub struct SyntaxRegistry {
    rules: IndexMap<SmolStr, Rule>,
    revision: u64,
    first_sets: FxHashMap<SmolStr, (u64, Rc<FirstSet>)>,
}

impl Default for SyntaxRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntaxRegistry {
    pub fn new() -> Self {
        Self {
            rules: IndexMap::new(),
            revision: 0,
            first_sets: FxHashMap::default(),
        }
    }

    /// Current mutation count; any change to the rule table bumps it.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // =========================================================================
    // Declaration API (grammar construction; faults panic)
    // =========================================================================

    /// Create an empty rule. Panics when the name is already taken.
    pub fn define_rule(&mut self, name: impl Into<SmolStr>) {
        let name = name.into();
        let previous = self.rules.insert(name.clone(), Rule::new(name.clone()));
        assert!(previous.is_none(), "rule <{name}> defined twice");
        self.revision += 1;
    }

    /// Append an alternative. Panics on an undefined rule or a duplicate
    /// dispatch symbol.
    pub fn add_pattern(&mut self, rule: &str, pattern: Pattern) {
        assert!(
            !pattern.symbols.is_empty(),
            "empty pattern for rule <{rule}>"
        );
        let entry = self
            .rules
            .get_mut(rule)
            .unwrap_or_else(|| panic!("rule <{rule}> is not defined"));
        let first = pattern.first_symbol();
        assert!(
            !entry.patterns.iter().any(|p| p.first_symbol() == first),
            "rule <{rule}> already has an alternative starting with {}",
            first.describe()
        );
        entry.patterns.push(Rc::new(pattern));
        self.revision += 1;
    }

    /// Mark the rule as matching zero occurrences without error.
    pub fn set_optional(&mut self, rule: &str) {
        self.rule_mut(rule).optional = true;
        self.revision += 1;
    }

    /// Mark the rule as matching more than once; its value becomes the
    /// list of per-iteration values.
    pub fn set_repeatable(&mut self, rule: &str) {
        self.rule_mut(rule).repeatable = true;
        self.revision += 1;
    }

    /// Fetch a rule. An unknown name is a malformed grammar and panics.
    pub fn lookup(&self, name: &str) -> &Rule {
        self.rules
            .get(name)
            .unwrap_or_else(|| panic!("rule <{name}> is not defined"))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// All rules in declaration order, for the syntax reference.
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    fn rule_mut(&mut self, name: &str) -> &mut Rule {
        self.rules
            .get_mut(name)
            .unwrap_or_else(|| panic!("rule <{name}> is not defined"))
    }

    // =========================================================================
    // Extension API (driven by parsed input; faults are errors)
    // =========================================================================

    /// Splice a new alternative into a live rule mid-parse. A duplicate
    /// dispatch symbol is a parse-time conflict, not a panic. On success
    /// the revision bump invalidates every memoized first set, so the
    /// next lookup already dispatches on the new pattern.
    pub fn extend_rule(&mut self, rule: &str, pattern: Pattern) -> Result<(), ExtendConflict> {
        let entry = self
            .rules
            .get_mut(rule)
            .unwrap_or_else(|| panic!("rule <{rule}> is not defined"));
        let first = pattern.first_symbol();
        if entry.patterns.iter().any(|p| p.first_symbol() == first) {
            return Err(ExtendConflict {
                rule: entry.name.clone(),
                symbol: first.describe(),
            });
        }
        trace!(rule = %entry.name, symbol = %first.describe(), "rule extended");
        entry.patterns.push(Rc::new(pattern));
        self.revision += 1;
        Ok(())
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Pick the alternative of `rule` that accepts the peeked token, or
    /// `None`. Keyword alternatives win over token-class alternatives so
    /// a grammar may accept both a specific keyword and a generic
    /// identifier in one rule.
    pub fn select_pattern(&mut self, rule: &str, token: &Token) -> Option<Rc<Pattern>> {
        let patterns = self.lookup(rule).patterns.clone();
        for pattern in &patterns {
            if matches!(pattern.first_symbol(), Symbol::Keyword(_))
                && pattern.first_symbol().accepts_token(token)
            {
                return Some(pattern.clone());
            }
        }
        for pattern in &patterns {
            match pattern.first_symbol() {
                Symbol::Keyword(_) => {}
                _ => {
                    if self.pattern_accepts(pattern, token) {
                        return Some(pattern.clone());
                    }
                }
            }
        }
        None
    }

    /// Whether `pattern` can start with `token`. Leading optional
    /// non-terminals are skippable, so acceptance walks forward until the
    /// first symbol that must consume something.
    pub fn pattern_accepts(&mut self, pattern: &Pattern, token: &Token) -> bool {
        for symbol in &pattern.symbols {
            match symbol {
                Symbol::Keyword(_) | Symbol::Terminal(_) => return symbol.accepts_token(token),
                Symbol::NonTerminal(name) => {
                    let name = name.clone();
                    if self.first_set(&name).accepts(token) {
                        return true;
                    }
                    if !self.lookup(&name).optional {
                        return false;
                    }
                }
            }
        }
        false
    }

    /// Memoized first-token set of a rule at the current revision.
    pub fn first_set(&mut self, rule: &str) -> Rc<FirstSet> {
        if let Some((revision, set)) = self.first_sets.get(rule) {
            if *revision == self.revision {
                return set.clone();
            }
        }
        let mut visiting = FxHashSet::default();
        let set = Rc::new(self.compute_first_set(rule, &mut visiting));
        self.first_sets
            .insert(SmolStr::new(rule), (self.revision, set.clone()));
        set
    }

    fn compute_first_set(&mut self, rule: &str, visiting: &mut FxHashSet<SmolStr>) -> FirstSet {
        let mut set = FirstSet::default();
        if !visiting.insert(SmolStr::new(rule)) {
            // Left recursion would loop forever; the grammar is built
            // right-recursive, so an already-visited rule contributes
            // nothing new here.
            return set;
        }
        let patterns = self.lookup(rule).patterns.clone();
        for pattern in &patterns {
            for symbol in &pattern.symbols {
                match symbol {
                    Symbol::Keyword(text) => {
                        set.add_keyword(text);
                        break;
                    }
                    Symbol::Terminal(class) => {
                        set.add_class(*class);
                        break;
                    }
                    Symbol::NonTerminal(sub) => {
                        let sub = sub.clone();
                        let sub_set = self.compute_first_set(&sub, visiting);
                        set.union(&sub_set);
                        if !self.lookup(&sub).optional {
                            break;
                        }
                    }
                }
            }
        }
        visiting.remove(rule);
        set
    }

    // =========================================================================
    // Convenience builders (sugar over the primitive API)
    // =========================================================================

    /// Declare `<name>` as a comma-separated list of `item`. The rule's
    /// value is the flat `NodeValue::List` of item values. The generated
    /// continuation rule is named `<name>.more`.
    pub fn define_list_rule(&mut self, name: &str, item: Symbol) {
        let more = SmolStr::new(format!("{name}.more"));
        self.define_rule(more.clone());
        self.add_pattern(
            &more,
            Pattern::new(vec![Symbol::keyword(","), item.clone()]).with_action(Rc::new(
                |_, mut values| Ok(values.pop().unwrap_or(NodeValue::None)),
            )),
        );
        self.set_optional(&more);
        self.set_repeatable(&more);

        self.define_rule(name);
        self.add_pattern(
            name,
            Pattern::new(vec![item, Symbol::rule(more)]).with_action(Rc::new(|_, values| {
                let mut items = Vec::new();
                let mut values = values.into_iter();
                if let Some(head) = values.next() {
                    items.push(head);
                }
                if let Some(NodeValue::List(rest)) = values.next() {
                    items.extend(rest);
                }
                Ok(NodeValue::List(items))
            })),
        );
    }

    /// Declare `<name>` as an optional brace-delimited body around
    /// `attributes` (a rule the caller defines as optional + repeatable).
    pub fn define_optional_body(&mut self, name: &str, attributes: &str) {
        self.define_rule(name);
        self.set_optional(name);
        self.add_pattern(
            name,
            Pattern::new(vec![
                Symbol::keyword("{"),
                Symbol::rule(attributes),
                Symbol::keyword("}"),
            ]),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use text_size::TextRange;

    use crate::base::{FileId, SourceRef};
    use crate::parser::tokens::TokenValue;

    fn tok(class: TokenClass, text: &str) -> Token {
        let at = SourceRef::new(FileId(0), TextRange::empty(0.into()));
        Token::new(class, text, TokenValue::None, at)
    }

    fn id(text: &str) -> Token {
        tok(TokenClass::Id, text)
    }

    #[test]
    fn test_select_by_keyword() {
        let mut reg = SyntaxRegistry::new();
        reg.define_rule("attr");
        reg.add_pattern("attr", Pattern::new(vec![Symbol::keyword("start")]));
        reg.add_pattern("attr", Pattern::new(vec![Symbol::keyword("end")]));

        let selected = reg.select_pattern("attr", &id("end")).expect("matches");
        assert_eq!(selected.first_symbol(), &Symbol::keyword("end"));
        assert!(reg.select_pattern("attr", &id("middle")).is_none());
    }

    #[test]
    fn test_keywords_win_over_classes() {
        let mut reg = SyntaxRegistry::new();
        reg.define_rule("operand");
        reg.add_pattern(
            "operand",
            Pattern::new(vec![Symbol::terminal(TokenClass::Id)]),
        );
        reg.add_pattern("operand", Pattern::new(vec![Symbol::keyword("off")]));

        let selected = reg.select_pattern("operand", &id("off")).expect("matches");
        assert_eq!(selected.first_symbol(), &Symbol::keyword("off"));
        let selected = reg.select_pattern("operand", &id("other")).expect("matches");
        assert_eq!(
            selected.first_symbol(),
            &Symbol::terminal(TokenClass::Id)
        );
    }

    #[test]
    fn test_first_set_reaches_through_nonterminals() {
        let mut reg = SyntaxRegistry::new();
        reg.define_rule("leaf");
        reg.add_pattern("leaf", Pattern::new(vec![Symbol::keyword("task")]));
        reg.define_rule("outer");
        reg.add_pattern("outer", Pattern::new(vec![Symbol::rule("leaf")]));

        assert!(reg.first_set("outer").accepts(&id("task")));
        assert!(!reg.first_set("outer").accepts(&id("resource")));
    }

    #[test]
    fn test_leading_optional_nonterminal_is_skippable() {
        let mut reg = SyntaxRegistry::new();
        reg.define_rule("prefix");
        reg.add_pattern("prefix", Pattern::new(vec![Symbol::keyword("journal")]));
        reg.set_optional("prefix");
        reg.define_rule("entry");
        reg.add_pattern(
            "entry",
            Pattern::new(vec![Symbol::rule("prefix"), Symbol::keyword("note")]),
        );

        assert!(reg.first_set("entry").accepts(&id("journal")));
        assert!(reg.first_set("entry").accepts(&id("note")));
        assert!(reg.select_pattern("entry", &id("note")).is_some());
    }

    #[test]
    fn test_extend_is_visible_immediately() {
        let mut reg = SyntaxRegistry::new();
        reg.define_rule("attr");
        reg.add_pattern("attr", Pattern::new(vec![Symbol::keyword("start")]));
        assert!(reg.select_pattern("attr", &id("Foo")).is_none());

        let before = reg.revision();
        reg.extend_rule("attr", Pattern::new(vec![Symbol::keyword("Foo")]))
            .expect("no conflict");
        assert!(reg.revision() > before);
        assert!(reg.select_pattern("attr", &id("Foo")).is_some());
    }

    #[test]
    fn test_extend_invalidates_first_sets_of_referring_rules() {
        let mut reg = SyntaxRegistry::new();
        reg.define_rule("attr");
        reg.add_pattern("attr", Pattern::new(vec![Symbol::keyword("start")]));
        reg.define_rule("body");
        reg.add_pattern("body", Pattern::new(vec![Symbol::rule("attr")]));

        // Prime the cache, then extend the leaf rule.
        assert!(!reg.first_set("body").accepts(&id("Foo")));
        reg.extend_rule("attr", Pattern::new(vec![Symbol::keyword("Foo")]))
            .expect("no conflict");
        assert!(reg.first_set("body").accepts(&id("Foo")));
    }

    #[test]
    fn test_extend_conflict_is_an_error_not_a_panic() {
        let mut reg = SyntaxRegistry::new();
        reg.define_rule("attr");
        reg.add_pattern("attr", Pattern::new(vec![Symbol::keyword("Foo")]));

        let err = reg
            .extend_rule("attr", Pattern::new(vec![Symbol::keyword("Foo")]))
            .expect_err("duplicate dispatch symbol");
        assert_eq!(err.rule, "attr");
        assert!(err.to_string().contains("'Foo'"));
    }

    #[test]
    #[should_panic(expected = "defined twice")]
    fn test_double_definition_panics() {
        let mut reg = SyntaxRegistry::new();
        reg.define_rule("attr");
        reg.define_rule("attr");
    }

    #[test]
    #[should_panic(expected = "already has an alternative")]
    fn test_duplicate_dispatch_symbol_panics() {
        let mut reg = SyntaxRegistry::new();
        reg.define_rule("attr");
        reg.add_pattern("attr", Pattern::new(vec![Symbol::keyword("start")]));
        reg.add_pattern("attr", Pattern::new(vec![Symbol::keyword("start")]));
    }

    #[test]
    #[should_panic(expected = "is not defined")]
    fn test_lookup_of_unknown_rule_panics() {
        let reg = SyntaxRegistry::new();
        reg.lookup("ghost");
    }

    #[test]
    fn test_list_rule_shape() {
        let mut reg = SyntaxRegistry::new();
        reg.define_list_rule("flagList", Symbol::terminal(TokenClass::Id));

        assert!(reg.contains("flagList"));
        assert!(reg.contains("flagList.more"));
        let more = reg.lookup("flagList.more");
        assert!(more.optional && more.repeatable);
        assert!(reg.first_set("flagList").accepts(&id("dev")));
    }
}
