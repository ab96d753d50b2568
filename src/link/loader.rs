//! Runtime loader contract
//!
//! The loader turns archives into linker state and reports which symbols
//! remain unbound. Orchestration only drives it through [`Loader`] and never
//! looks inside [`HostSymbols`].

use crate::error::LoadkitResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

/// Symbol addresses registered by the host program
#[derive(Debug, Clone, Default)]
pub struct HostSymbols {
    addrs: HashMap<String, u64>,
}

impl HostSymbols {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a symbol address
    pub fn insert(&mut self, name: impl Into<String>, addr: u64) {
        self.addrs.insert(name.into(), addr);
    }

    /// Whether the host provides `name`
    pub fn contains(&self, name: &str) -> bool {
        self.addrs.contains_key(name)
    }

    /// Address of `name`, if registered
    pub fn get(&self, name: &str) -> Option<u64> {
        self.addrs.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }
}

impl FromIterator<(String, u64)> for HostSymbols {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        Self {
            addrs: iter.into_iter().collect(),
        }
    }
}

/// Black-box runtime loader
#[async_trait]
pub trait Loader: Send + Sync {
    /// Linker state built up from ingested archives
    type Linker: Send;

    /// Ingest the entry archive and start a new linker state
    async fn read_obj(&self, archive: &Path, package: &str) -> LoadkitResult<Self::Linker>;

    /// Extend the linker state with a dependency archive.
    ///
    /// `unresolved` is the set outstanding before this archive was built and
    /// tells the loader what to prioritize.
    async fn read_dependency(
        &self,
        linker: &mut Self::Linker,
        archive: &Path,
        package: &str,
        unresolved: &[String],
    ) -> LoadkitResult<()>;

    /// Symbols neither the linker state nor the host can bind
    fn unresolved_symbols(&self, linker: &Self::Linker, host: &HostSymbols) -> Vec<String>;

    /// Persist the linker state
    fn serialize(&self, linker: &Self::Linker, sink: &mut dyn Write) -> LoadkitResult<()>;
}
