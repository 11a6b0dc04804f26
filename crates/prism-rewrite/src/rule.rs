//! The rule abstraction and the registry that orders rules for a compile.

use crate::context::TranslationContext;
use prism_ast::{Decl, Expr, Stmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleCategory {
    Preprocessor,
    Qualifier,
    Type,
    Function,
    Variable,
    Output,
    Layout,
    Feature,
}

/// A node-transform rule. The driver hands each visited node to every
/// applicable rule in descending priority order; a rule mutates the node
/// through the `&mut` slot (replacement is an assignment) and returns
/// whether it changed anything. Rules must not recurse into children; the
/// driver owns traversal.
pub trait RewriteRule {
    fn name(&self) -> &'static str;
    fn category(&self) -> RuleCategory;
    /// Higher runs earlier. The library uses 100 (qualifier) down to 40
    /// (feature rejects).
    fn priority(&self) -> i32;
    /// Direction and stage gating; checked once per compile.
    fn applies(&self, cx: &TranslationContext) -> bool;

    fn rewrite_decl(&self, _decl: &mut Decl, _cx: &mut TranslationContext) -> bool {
        false
    }
    fn rewrite_stmt(&self, _stmt: &mut Stmt, _cx: &mut TranslationContext) -> bool {
        false
    }
    fn rewrite_expr(&self, _expr: &mut Expr, _cx: &mut TranslationContext) -> bool {
        false
    }
}

/// Holds the rule set sorted by descending priority (stable within equal
/// priorities, so registration order breaks ties deterministically).
pub struct RuleRegistry {
    rules: Vec<Box<dyn RewriteRule + Send + Sync>>,
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// The normative rule library.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        crate::rules::register_defaults(&mut registry);
        registry
    }

    pub fn register(&mut self, rule: Box<dyn RewriteRule + Send + Sync>) {
        self.rules.push(rule);
        self.rules.sort_by_key(|r| std::cmp::Reverse(r.priority()));
    }

    pub fn rules(&self) -> &[Box<dyn RewriteRule + Send + Sync>] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy(i32, &'static str);

    impl RewriteRule for Dummy {
        fn name(&self) -> &'static str {
            self.1
        }
        fn category(&self) -> RuleCategory {
            RuleCategory::Feature
        }
        fn priority(&self) -> i32 {
            self.0
        }
        fn applies(&self, _cx: &TranslationContext) -> bool {
            true
        }
    }

    #[test]
    fn registry_orders_by_descending_priority() {
        let mut reg = RuleRegistry::new();
        reg.register(Box::new(Dummy(40, "low")));
        reg.register(Box::new(Dummy(100, "high")));
        reg.register(Box::new(Dummy(70, "mid")));
        let names: Vec<_> = reg.rules().iter().map(|r| r.name()).collect();
        assert_eq!(names, ["high", "mid", "low"]);
    }

    #[test]
    fn equal_priorities_keep_registration_order() {
        let mut reg = RuleRegistry::new();
        reg.register(Box::new(Dummy(50, "first")));
        reg.register(Box::new(Dummy(50, "second")));
        let names: Vec<_> = reg.rules().iter().map(|r| r.name()).collect();
        assert_eq!(names, ["first", "second"]);
    }

    #[test]
    fn default_registry_is_populated() {
        let reg = RuleRegistry::with_defaults();
        assert!(!reg.is_empty());
        // Ordering invariant across categories.
        let priorities: Vec<_> = reg.rules().iter().map(|r| r.priority()).collect();
        let mut sorted = priorities.clone();
        sorted.sort_by_key(|p| std::cmp::Reverse(*p));
        assert_eq!(priorities, sorted);
    }
}
