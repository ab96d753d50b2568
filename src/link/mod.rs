//! Dependency closure linking
//!
//! Feeds the entry archive to a [`Loader`] and builds only the dependencies
//! needed to bind the symbols it leaves unresolved.

mod closure;
mod frontier;
mod loader;
mod matcher;
pub mod nm;

pub use closure::{
    BuiltDependency, Closure, ClosureBuilder, ClosureOptions, DEFAULT_JOBS,
    DEFAULT_MAX_ITERATIONS,
};
pub use frontier::Frontier;
pub use loader::{HostSymbols, Loader};
pub use matcher::{SubstringMatcher, SymbolMatcher};
pub use nm::NmLoader;
