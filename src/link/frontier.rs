//! Dependency frontier
//!
//! Tracks every package identifier discovered so far and whether it has been
//! built. Owned by the orchestrator alone; workers never touch it.

use std::collections::HashMap;

/// Pseudo packages that have no archive and count as built from the start
pub const PSEUDO_PACKAGES: &[&str] = &["unsafe"];

/// Packages every entry implicitly depends on
pub const BASELINE_IMPORTS: &[&str] = &["runtime"];

/// Import naming the C-interop pseudo package
const CGO_IMPORT: &str = "C";

/// Package implementing C interop at runtime
const CGO_PACKAGE: &str = "runtime/cgo";

/// Insertion-ordered map of package identifier to built flag
#[derive(Debug, Clone, Default)]
pub struct Frontier {
    entries: Vec<(String, bool)>,
    index: HashMap<String, usize>,
}

impl Frontier {
    /// Seed the frontier from the entry package's imports
    pub fn seeded(imports: &[String]) -> Self {
        let mut frontier = Self::default();
        for pseudo in PSEUDO_PACKAGES {
            frontier.insert(pseudo, true);
        }
        frontier.add_imports(imports);
        for baseline in BASELINE_IMPORTS {
            frontier.insert(baseline, false);
        }
        frontier
    }

    /// Add newly discovered imports, returning how many were new
    pub fn add_imports(&mut self, imports: &[String]) -> usize {
        imports
            .iter()
            .map(|import| {
                let package = if import == CGO_IMPORT {
                    CGO_PACKAGE
                } else {
                    import.as_str()
                };
                self.insert(package, false)
            })
            .filter(|added| *added)
            .count()
    }

    /// Packages discovered but not yet built, in discovery order
    pub fn pending(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, built)| !built)
            .map(|(package, _)| package.as_str())
    }

    /// Mark a package as built, adding it if unknown
    pub fn mark_built(&mut self, package: &str) {
        match self.index.get(package) {
            Some(&i) => self.entries[i].1 = true,
            None => {
                self.insert(package, true);
            }
        }
    }

    /// Whether a package has been built or seeded as built
    pub fn is_built(&self, package: &str) -> bool {
        self.index
            .get(package)
            .is_some_and(|&i| self.entries[i].1)
    }

    /// Whether a package has been discovered
    pub fn contains(&self, package: &str) -> bool {
        self.index.contains_key(package)
    }

    /// Number of discovered packages, built or pending
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no package has been discovered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, package: &str, built: bool) -> bool {
        if self.index.contains_key(package) {
            return false;
        }
        self.index.insert(package.to_string(), self.entries.len());
        self.entries.push((package.to_string(), built));
        true
    }
}
