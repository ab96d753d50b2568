//! In-memory toolchain and loader used by unit tests

use crate::error::{LoadkitError, LoadkitResult};
use crate::link::{HostSymbols, Loader};
use crate::toolchain::{CommandOutput, PackageError, PackageMetadata, Toolchain};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Listed metadata for a package with one source file
pub fn package(import_path: &str, imports: &[&str]) -> PackageMetadata {
    let name = import_path
        .rsplit('/')
        .next()
        .unwrap_or(import_path)
        .trim_end_matches(".go")
        .to_string();
    PackageMetadata {
        import_path: import_path.to_string(),
        go_files: vec![format!("{}.go", name)],
        name,
        imports: imports.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

/// Toolchain answering from a fixed package table and writing stub archives
#[derive(Default)]
pub struct FakeToolchain {
    packages: HashMap<String, PackageMetadata>,
    deps_errors_until_tidy: HashMap<String, String>,
    failing_builds: HashSet<String>,
    fail_list: bool,
    tidied: AtomicBool,
    lists: AtomicUsize,
    builds: Mutex<Vec<String>>,
    mods: Mutex<Vec<&'static str>>,
}

impl FakeToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_package(mut self, pkg: PackageMetadata) -> Self {
        self.packages.insert(pkg.import_path.clone(), pkg);
        self
    }

    /// Report a dependency error for `path` until `mod tidy` has run
    pub fn with_deps_errors_until_tidy(mut self, path: &str, err: &str) -> Self {
        self.deps_errors_until_tidy
            .insert(path.to_string(), err.to_string());
        self
    }

    pub fn failing_build(mut self, package: &str) -> Self {
        self.failing_builds.insert(package.to_string());
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub fn list_calls(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    /// Packages compiled so far, in call order
    pub fn built_packages(&self) -> Vec<String> {
        self.builds.lock().unwrap().clone()
    }

    pub fn mod_calls(&self) -> Vec<&'static str> {
        self.mods.lock().unwrap().clone()
    }
}

#[async_trait]
impl Toolchain for FakeToolchain {
    async fn list(
        &self,
        _binary: &str,
        path: &str,
        _work_dir: Option<&Path>,
    ) -> LoadkitResult<PackageMetadata> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        if self.fail_list {
            return Err(LoadkitError::Listing {
                path: path.to_string(),
                reason: "lister unavailable".to_string(),
                stderr: String::new(),
            });
        }

        let mut pkg = self
            .packages
            .get(path)
            .cloned()
            .ok_or_else(|| LoadkitError::Listing {
                path: path.to_string(),
                reason: "exit status: 1".to_string(),
                stderr: format!("cannot find package \"{}\"", path),
            })?;

        if let Some(err) = self.deps_errors_until_tidy.get(path) {
            if !self.tidied.load(Ordering::SeqCst) {
                pkg.deps_errors.push(PackageError {
                    err: err.clone(),
                    ..Default::default()
                });
            }
        }
        Ok(pkg)
    }

    async fn build(
        &self,
        binary: &str,
        args: &[String],
        _work_dir: &Path,
        _env: &[(String, String)],
    ) -> LoadkitResult<CommandOutput> {
        let package = args.last().cloned().unwrap_or_default();
        let target = args
            .iter()
            .position(|a| a == "-o")
            .and_then(|i| args.get(i + 1))
            .cloned()
            .unwrap_or_default();

        if self.failing_builds.contains(&package) {
            return Err(LoadkitError::Build {
                command: crate::toolchain::command_line(binary, args),
                reason: "exit status: 1".to_string(),
                stdout: String::new(),
                stderr: format!("{}: syntax error", package),
            });
        }

        self.builds.lock().unwrap().push(package.clone());
        let target = Path::new(&target);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LoadkitError::io("fake build", e))?;
        }
        std::fs::write(target, format!("archive of {}", package))
            .map_err(|e| LoadkitError::io("fake build", e))?;

        Ok(CommandOutput {
            stdout: format!("built {}", package),
            stderr: String::new(),
        })
    }

    async fn mod_download(
        &self,
        _binary: &str,
        _work_dir: Option<&Path>,
        _args: &[String],
    ) -> LoadkitResult<()> {
        self.mods.lock().unwrap().push("download");
        Ok(())
    }

    async fn mod_tidy(&self, _binary: &str, _work_dir: Option<&Path>) -> LoadkitResult<()> {
        self.mods.lock().unwrap().push("tidy");
        self.tidied.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Linker state of [`FakeLoader`]
#[derive(Debug, Default)]
pub struct FakeLinker {
    pub ingested: Vec<String>,
    pub defined: BTreeSet<String>,
    pub referenced: BTreeSet<String>,
}

/// Loader whose objects define and reference fixed symbol lists
#[derive(Default)]
pub struct FakeLoader {
    objects: HashMap<String, (Vec<String>, Vec<String>)>,
    queries: AtomicUsize,
}

impl FakeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(mut self, package: &str, defines: &[&str], references: &[&str]) -> Self {
        let to_vec =
            |list: &[&str]| -> Vec<String> { list.iter().map(|s| s.to_string()).collect() };
        self.objects
            .insert(package.to_string(), (to_vec(defines), to_vec(references)));
        self
    }

    /// Number of unresolved-set queries answered
    pub fn unresolved_queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn ingest(&self, linker: &mut FakeLinker, archive: &Path, package: &str) -> LoadkitResult<()> {
        if !archive.exists() {
            return Err(LoadkitError::loader(
                format!("reading {}", archive.display()),
                "archive missing",
            ));
        }
        let (defines, references) = self
            .objects
            .get(package)
            .ok_or_else(|| LoadkitError::loader(format!("reading {}", package), "unknown object"))?;
        linker.ingested.push(package.to_string());
        linker.defined.extend(defines.iter().cloned());
        linker.referenced.extend(references.iter().cloned());
        Ok(())
    }
}

#[async_trait]
impl Loader for FakeLoader {
    type Linker = FakeLinker;

    async fn read_obj(&self, archive: &Path, package: &str) -> LoadkitResult<FakeLinker> {
        let mut linker = FakeLinker::default();
        self.ingest(&mut linker, archive, package)?;
        Ok(linker)
    }

    async fn read_dependency(
        &self,
        linker: &mut FakeLinker,
        archive: &Path,
        package: &str,
        _unresolved: &[String],
    ) -> LoadkitResult<()> {
        self.ingest(linker, archive, package)
    }

    fn unresolved_symbols(&self, linker: &FakeLinker, host: &HostSymbols) -> Vec<String> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        linker
            .referenced
            .iter()
            .filter(|s| !linker.defined.contains(*s) && !host.contains(s))
            .cloned()
            .collect()
    }

    fn serialize(&self, linker: &FakeLinker, sink: &mut dyn Write) -> LoadkitResult<()> {
        writeln!(sink, "{}", linker.ingested.join(","))
            .map_err(|e| LoadkitError::io("writing linker state", e))
    }
}
