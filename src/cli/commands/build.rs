//! Build command - compile the entry package only

use crate::builder::build_entry;
use crate::cli::args::BuildArgs;
use crate::cli::commands::{build_config, create_progress_bar};
use crate::config::Config;
use crate::error::LoadkitResult;
use crate::toolchain::CommandToolchain;
use console::style;
use tracing::debug;

/// Execute the build command
pub async fn execute(args: BuildArgs, config: &Config, verbose: bool) -> LoadkitResult<()> {
    let mut build = build_config(&args, config, verbose);
    debug!("Build configuration: {:?}", build);

    let pb = create_progress_bar(&format!("Building {}...", build.pkg_path));
    let result = build_entry(&CommandToolchain::new(), &mut build).await;
    pb.finish_and_clear();
    let pkg = result?;

    println!(
        "{} Built {} ({} imports)",
        style("✓").green(),
        style(&pkg.import_path).cyan(),
        pkg.imports.len()
    );
    println!("  Archive: {}", build.target_path.display());
    Ok(())
}
