//! CLI argument definitions using clap derive

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// loadkit - build a package and the dependency closure its loader needs
///
/// Compiles the entry package, then builds only the dependency packages
/// that define symbols the loader could not resolve.
#[derive(Parser, Debug)]
#[command(name = "loadkit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "LOADKIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local loadkit.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the entry package archive only
    Build(BuildArgs),

    /// Build the entry package and the dependencies needed to resolve it
    Link(LinkArgs),

    /// Show configuration
    Config(ConfigArgs),
}

/// Options shared by every build
#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Source file or package directory (repeatable for files)
    #[arg(short = 'f', long = "file", required = true)]
    pub files: Vec<String>,

    /// Build environment variable (KEY=VALUE)
    #[arg(long, value_parser = parse_env_var)]
    pub env: Vec<(String, String)>,

    /// Extra compiler flag (repeatable)
    #[arg(long = "flag", allow_hyphen_values = true)]
    pub flags: Vec<String>,

    /// Keep the working directory
    #[arg(short, long)]
    pub keep_work_dir: bool,

    /// Working directory
    #[arg(short, long)]
    pub work_dir: Option<PathBuf>,

    /// Target directory
    #[arg(short, long)]
    pub target_dir: Option<PathBuf>,

    /// Package identifier of the entry package
    #[arg(short, long)]
    pub pkg_path: Option<String>,

    /// Toolchain binary
    #[arg(short = 'g', long)]
    pub toolchain: Option<String>,

    /// Enable position-independent code
    #[arg(long, conflicts_with = "no_dynlink")]
    pub dynlink: bool,

    /// Disable position-independent code
    #[arg(long)]
    pub no_dynlink: bool,

    /// Toolchain search root; packages under it are never cached
    #[arg(long, env = "GOPATH", hide_env_values = true)]
    pub toolchain_root: Option<PathBuf>,
}

impl BuildArgs {
    /// Position-independent code override, if given
    pub fn dynlink_override(&self) -> Option<bool> {
        match (self.dynlink, self.no_dynlink) {
            (true, _) => Some(true),
            (false, true) => Some(false),
            (false, false) => None,
        }
    }
}

/// Arguments for the link command
#[derive(Args, Debug, Clone)]
pub struct LinkArgs {
    #[command(flatten)]
    pub build: BuildArgs,

    /// Host executable whose symbols are available at load time
    #[arg(short, long)]
    pub executable: Option<PathBuf>,

    /// Rounds before giving up on unresolved symbols
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Concurrent dependency builds per round
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}

fn parse_env_var(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=VALUE format: no '=' found in '{s}'"))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}
