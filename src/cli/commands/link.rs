//! Link command - build the entry package and its dependency closure

use crate::builder::{build_entry, BuildConfig, WorkDirGuard, DEFAULT_TOOLCHAIN};
use crate::cli::args::LinkArgs;
use crate::cli::commands::{build_config, create_progress_bar};
use crate::config::Config;
use crate::error::{LoadkitError, LoadkitResult};
use crate::link::{Closure, ClosureBuilder, ClosureOptions, HostSymbols, Loader, NmLoader};
use crate::toolchain::{CommandToolchain, PackageMetadata, Toolchain};
use console::style;
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Extension of the serialized linker state
pub const LINK_EXTENSION: &str = "link";

/// Execute the link command
pub async fn execute(args: LinkArgs, config: &Config, verbose: bool) -> LoadkitResult<()> {
    let mut build = build_config(&args.build, config, verbose);
    let mut settings = config.link.clone();
    if let Some(max) = args.max_iterations {
        settings.max_iterations = max;
    }
    if let Some(jobs) = args.jobs {
        settings.jobs = jobs;
    }
    if args.executable.is_some() {
        settings.host_executable = args.executable.clone();
    }

    let binary = if build.toolchain.is_empty() {
        DEFAULT_TOOLCHAIN.to_string()
    } else {
        build.toolchain.clone()
    };
    let loader = NmLoader::new(binary);
    let pb = create_progress_bar("Reading host symbols...");
    let host = match settings.host_executable {
        Some(ref exe) => match loader.host_symbols(exe).await {
            Ok(host) => host,
            Err(e) => {
                pb.finish_and_clear();
                return Err(e);
            }
        },
        None => HostSymbols::new(),
    };
    debug!("{} host symbols", host.len());

    let toolchain = CommandToolchain::new();
    let result = link_entry(
        &toolchain,
        &loader,
        &host,
        &mut build,
        settings.closure_options(),
        &pb,
    )
    .await;
    pb.finish_and_clear();
    let (entry, closure) = result?;

    let output = link_output_path(&build);
    write_linker(&loader, &closure.linker, &output)?;
    info!("Wrote linker state to {}", output.display());

    println!(
        "{} Linked {} with {} dependencies",
        style("✓").green(),
        style(&entry.import_path).cyan(),
        closure.dependencies.len()
    );
    for dep in &closure.dependencies {
        println!("  {} {}", style(&dep.package).dim(), dep.archive.display());
    }
    println!("  Output: {}", output.display());
    Ok(())
}

/// Build the entry package and resolve its dependency closure.
///
/// Dependency builds share the entry's scratch directory, which is removed
/// once the closure is resolved or has failed, unless it is kept.
pub async fn link_entry<L: Loader>(
    toolchain: &dyn Toolchain,
    loader: &L,
    host: &HostSymbols,
    build: &mut BuildConfig,
    options: ClosureOptions,
    pb: &ProgressBar,
) -> LoadkitResult<(PackageMetadata, Closure<L::Linker>)> {
    let _scratch = WorkDirGuard::new(&build.work_dir, build.keep_work_dir);

    pb.set_message(format!("Building {}...", build.pkg_path));
    let entry = build_entry(toolchain, build).await?;

    pb.set_message("Resolving dependencies...");
    let closure = ClosureBuilder::new(toolchain, loader, host)
        .with_options(options)
        .run(build, &entry)
        .await?;
    Ok((entry, closure))
}

/// `<target-dir>/<pkg>.link`
fn link_output_path(build: &BuildConfig) -> PathBuf {
    build
        .target_dir
        .join(format!("{}.{}", build.pkg_path, LINK_EXTENSION))
}

fn write_linker<L: Loader>(loader: &L, linker: &L::Linker, path: &Path) -> LoadkitResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| LoadkitError::io(format!("creating {}", parent.display()), e))?;
    }
    let mut file = std::fs::File::create(path)
        .map_err(|e| LoadkitError::io(format!("creating {}", path.display()), e))?;
    loader.serialize(linker, &mut file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{package, FakeLinker, FakeLoader, FakeToolchain};
    use tempfile::TempDir;

    fn entry_build(temp: &TempDir) -> BuildConfig {
        let src = temp.path().join("app");
        std::fs::create_dir_all(&src).unwrap();
        BuildConfig {
            toolchain: "go".to_string(),
            build_paths: vec![src.display().to_string()],
            pkg_path: "main".to_string(),
            target_dir: temp.path().join("target"),
            work_dir: temp.path().join("work"),
            ..Default::default()
        }
    }

    fn toolchain(temp: &TempDir) -> FakeToolchain {
        let src = temp.path().join("app").display().to_string();
        FakeToolchain::new()
            .with_package(package(&src, &["alpha"]))
            .with_package(package("alpha", &[]))
    }

    fn loader() -> FakeLoader {
        FakeLoader::new()
            .with_object("main", &[], &["alpha.Foo"])
            .with_object("alpha", &["alpha.Foo"], &[])
    }

    #[test]
    fn output_path_uses_package() {
        let build = BuildConfig {
            target_dir: PathBuf::from("/out"),
            pkg_path: "main".to_string(),
            ..Default::default()
        };
        assert_eq!(link_output_path(&build), PathBuf::from("/out/main.link"));
    }

    #[test]
    fn writes_serialized_state() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("nested/main.link");
        let linker = FakeLinker {
            ingested: vec!["main".to_string(), "alpha".to_string()],
            ..Default::default()
        };

        write_linker(&FakeLoader::new(), &linker, &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "main,alpha\n");
    }

    #[tokio::test]
    async fn scratch_dir_removed_after_closure() {
        let temp = TempDir::new().unwrap();
        let mut build = entry_build(&temp);
        let toolchain = toolchain(&temp);

        let (entry, closure) = link_entry(
            &toolchain,
            &loader(),
            &HostSymbols::new(),
            &mut build,
            ClosureOptions::default(),
            &ProgressBar::hidden(),
        )
        .await
        .unwrap();

        assert_eq!(entry.imports, vec!["alpha"]);
        assert_eq!(closure.dependencies.len(), 1);
        assert_eq!(toolchain.built_packages().len(), 2);
        assert!(!temp.path().join("work").exists());
    }

    #[tokio::test]
    async fn scratch_dir_removed_when_dependency_fails() {
        let temp = TempDir::new().unwrap();
        let mut build = entry_build(&temp);
        let toolchain = toolchain(&temp).failing_build("alpha");

        let err = link_entry(
            &toolchain,
            &loader(),
            &HostSymbols::new(),
            &mut build,
            ClosureOptions::default(),
            &ProgressBar::hidden(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, LoadkitError::Build { .. }));
        assert!(!temp.path().join("work").exists());
    }

    #[tokio::test]
    async fn scratch_dir_kept_on_request() {
        let temp = TempDir::new().unwrap();
        let mut build = entry_build(&temp);
        build.keep_work_dir = true;

        link_entry(
            &toolchain(&temp),
            &loader(),
            &HostSymbols::new(),
            &mut build,
            ClosureOptions::default(),
            &ProgressBar::hidden(),
        )
        .await
        .unwrap();

        assert!(temp.path().join("work").exists());
    }
}
