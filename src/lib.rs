//! loadkit - dependency-closure builds for runtime loaders
//!
//! Builds a package with the external compiler driver, asks a loader which
//! symbols the archive leaves unresolved, and builds just enough of the
//! package's dependency graph to resolve them.

pub mod builder;
pub mod cli;
pub mod config;
pub mod error;
pub mod link;
pub mod toolchain;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{LoadkitError, LoadkitResult};
