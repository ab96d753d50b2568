//! Symbol to package matching
//!
//! Decides which pending packages are worth building for the current set of
//! unresolved symbols. The orchestrator only sees the trait, so an exact
//! symbol index can replace the substring rule.

/// Predicate selecting packages that may define an unresolved symbol
pub trait SymbolMatcher: Send + Sync {
    fn may_provide(&self, package: &str, unresolved: &[String]) -> bool;
}

/// Matches when a symbol's qualified name contains the package identifier.
///
/// Qualified names embed their package, so this never misses a defining
/// package; unrelated packages sharing a substring cost one extra build.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringMatcher;

impl SymbolMatcher for SubstringMatcher {
    fn may_provide(&self, package: &str, unresolved: &[String]) -> bool {
        unresolved.iter().any(|symbol| symbol.contains(package))
    }
}
