//! Integration tests for loadkit

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;

    fn loadkit() -> Command {
        let mut cmd = cargo_bin_cmd!("loadkit");
        cmd.env_remove("LOADKIT_CONFIG").arg("--no-local");
        cmd
    }

    #[test]
    fn help_displays() {
        loadkit()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("dependency closure"));
    }

    #[test]
    fn version_displays() {
        loadkit()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("loadkit"));
    }

    #[test]
    fn config_path() {
        loadkit()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        loadkit()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[build]"))
            .stdout(predicate::str::contains("max_iterations = 128"));
    }

    #[test]
    fn build_requires_sources() {
        loadkit()
            .arg("build")
            .assert()
            .failure()
            .stderr(predicate::str::contains("--file"));
    }

    #[test]
    fn build_rejects_non_directory() {
        let temp = tempfile::TempDir::new().unwrap();
        let file = temp.path().join("notes.txt");
        std::fs::write(&file, "x").unwrap();

        loadkit()
            .current_dir(temp.path())
            .args(["build", "-f"])
            .arg(&file)
            .assert()
            .failure()
            .stderr(predicate::str::contains("is not a directory"));
    }

    #[test]
    fn link_help() {
        loadkit()
            .args(["link", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--max-iterations"));
    }
}
