//! Symbol-driven dependency closure
//!
//! Starting from the entry archive, each round builds the pending packages
//! that may define an unresolved symbol, feeds their archives to the loader
//! and recomputes the unresolved set. The loop ends when nothing is left
//! unresolved or after `max_iterations` rounds.
//!
//! Builds inside a round run concurrently; ingestion into the linker state
//! and every frontier update happen sequentially on the orchestrating task.

use crate::builder::{build_dependency, BuildConfig};
use crate::error::{LoadkitError, LoadkitResult};
use crate::link::frontier::Frontier;
use crate::link::loader::{HostSymbols, Loader};
use crate::link::matcher::{SubstringMatcher, SymbolMatcher};
use crate::toolchain::{PackageMetadata, Toolchain};
use futures_util::stream::{self, StreamExt};
use std::path::PathBuf;
use tracing::{debug, info};

/// Default bound on closure rounds
pub const DEFAULT_MAX_ITERATIONS: usize = 128;

/// Default number of dependency builds running at once
pub const DEFAULT_JOBS: usize = 4;

/// Tuning for the closure loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosureOptions {
    /// Rounds to run before giving up
    pub max_iterations: usize,
    /// Concurrent dependency builds per round
    pub jobs: usize,
}

impl Default for ClosureOptions {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            jobs: DEFAULT_JOBS,
        }
    }
}

/// A dependency archive ingested by the loader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltDependency {
    pub package: String,
    pub archive: PathBuf,
}

/// Fully resolved linker state
#[derive(Debug)]
pub struct Closure<K> {
    /// Linker state with every ingested archive
    pub linker: K,
    /// Dependencies in ingestion order
    pub dependencies: Vec<BuiltDependency>,
    /// Rounds executed
    pub iterations: usize,
}

/// Drives the closure loop for one entry package
pub struct ClosureBuilder<'a, L: Loader> {
    toolchain: &'a dyn Toolchain,
    loader: &'a L,
    host: &'a HostSymbols,
    matcher: &'a dyn SymbolMatcher,
    options: ClosureOptions,
}

impl<'a, L: Loader> ClosureBuilder<'a, L> {
    /// Create a builder using the substring matcher and default options
    pub fn new(toolchain: &'a dyn Toolchain, loader: &'a L, host: &'a HostSymbols) -> Self {
        Self {
            toolchain,
            loader,
            host,
            matcher: &SubstringMatcher,
            options: ClosureOptions::default(),
        }
    }

    /// Replace the symbol matcher
    #[must_use]
    pub fn with_matcher(mut self, matcher: &'a dyn SymbolMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Replace the loop options
    #[must_use]
    pub fn with_options(mut self, options: ClosureOptions) -> Self {
        self.options = options;
        self
    }

    /// Resolve the closure of an entry package that has already been built.
    ///
    /// `config` is the planned entry configuration; its `target_path` is the
    /// entry archive and each dependency build inherits the rest.
    pub async fn run(
        &self,
        config: &BuildConfig,
        entry: &PackageMetadata,
    ) -> LoadkitResult<Closure<L::Linker>> {
        let mut linker = self
            .loader
            .read_obj(&config.target_path, &config.pkg_path)
            .await?;
        let mut unresolved = self.loader.unresolved_symbols(&linker, self.host);
        let mut frontier = Frontier::seeded(&entry.imports);
        let mut dependencies = Vec::new();
        let mut iteration = 1;

        while !unresolved.is_empty() && iteration <= self.options.max_iterations {
            let round: Vec<String> = frontier
                .pending()
                .filter(|package| self.matcher.may_provide(package, &unresolved))
                .map(str::to_string)
                .collect();
            debug!(
                "Round {}: {} unresolved, building {:?}",
                iteration,
                unresolved.len(),
                round
            );

            let results = self.build_round(config, &round).await;
            for (package, result) in round.into_iter().zip(results) {
                let (archive, pkg) = result?;
                self.loader
                    .read_dependency(&mut linker, &archive, &package, &unresolved)
                    .await?;
                frontier.mark_built(&package);
                let added = frontier.add_imports(&pkg.imports);
                debug!("Ingested {} ({} new imports)", package, added);
                dependencies.push(BuiltDependency { package, archive });
            }

            unresolved = self.loader.unresolved_symbols(&linker, self.host);
            iteration += 1;
        }

        if !unresolved.is_empty() {
            return Err(LoadkitError::UnresolvedSymbols(unresolved));
        }

        info!(
            "Resolved {} with {} dependencies in {} rounds",
            config.pkg_path,
            dependencies.len(),
            iteration - 1
        );
        Ok(Closure {
            linker,
            dependencies,
            iterations: iteration - 1,
        })
    }

    /// Build every package of a round, returning results in input order
    /// once all builds have finished.
    async fn build_round(
        &self,
        config: &BuildConfig,
        packages: &[String],
    ) -> Vec<LoadkitResult<(PathBuf, PackageMetadata)>> {
        let toolchain = self.toolchain;
        stream::iter(packages)
            .map(move |package| async move {
                let mut dep_config = config.for_dependency(package);
                let pkg = build_dependency(toolchain, &mut dep_config).await?;
                Ok::<_, LoadkitError>((dep_config.target_path, pkg))
            })
            .buffered(self.options.jobs.max(1))
            .collect()
            .await
    }
}
