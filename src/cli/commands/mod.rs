//! CLI command implementations

pub mod build;
pub mod config;
pub mod link;

pub use build::execute as build;
pub use config::execute as config;
pub use link::execute as link;

use crate::builder::BuildConfig;
use crate::cli::args::BuildArgs;
use crate::config::Config;
use indicatif::{ProgressBar, ProgressStyle};

/// Build configuration from file settings overridden by command-line options
pub(crate) fn build_config(args: &BuildArgs, config: &Config, verbose: bool) -> BuildConfig {
    let mut build = BuildConfig::from_settings(&config.build);
    build.build_paths = args.files.clone();
    build.extra_flags.extend(args.flags.iter().cloned());
    for (key, value) in &args.env {
        build.env.retain(|(k, _)| k != key);
        build.env.push((key.clone(), value.clone()));
    }
    if args.keep_work_dir {
        build.keep_work_dir = true;
    }
    if let Some(ref dir) = args.work_dir {
        build.work_dir = dir.clone();
    }
    if let Some(ref dir) = args.target_dir {
        build.target_dir = dir.clone();
    }
    if let Some(ref pkg) = args.pkg_path {
        build.pkg_path = pkg.clone();
    }
    if let Some(ref toolchain) = args.toolchain {
        build.toolchain = toolchain.clone();
    }
    if let Some(dynlink) = args.dynlink_override() {
        build.dynlink = dynlink;
    }
    build.toolchain_root = args
        .toolchain_root
        .clone()
        .filter(|root| !root.as_os_str().is_empty());
    build.verbose = verbose;
    build
}

pub(crate) fn create_progress_bar(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn args_override_settings() {
        let mut config = Config::default();
        config.build.flags = vec!["-trimpath".to_string()];
        config
            .build
            .env
            .insert("CGO_ENABLED".to_string(), "1".to_string());

        let args = BuildArgs {
            files: vec!["./app".to_string()],
            flags: vec!["-x".to_string()],
            env: vec![("CGO_ENABLED".to_string(), "0".to_string())],
            pkg_path: Some("example.com/app".to_string()),
            no_dynlink: true,
            toolchain_root: Some(PathBuf::new()),
            ..Default::default()
        };

        let build = build_config(&args, &config, true);
        assert_eq!(build.build_paths, vec!["./app"]);
        assert_eq!(build.extra_flags, vec!["-trimpath", "-x"]);
        assert_eq!(
            build.env,
            vec![("CGO_ENABLED".to_string(), "0".to_string())]
        );
        assert_eq!(build.pkg_path, "example.com/app");
        assert!(!build.dynlink);
        assert!(build.toolchain_root.is_none());
        assert!(build.verbose);
    }
}
