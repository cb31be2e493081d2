//! End-to-end tests for the mixhub binary
//!
//! A fake `mix` script stands in for the real tool; config lookup is
//! isolated by pointing HOME and XDG_CONFIG_HOME at a temp dir.

mod common;

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use common::*;

/// Command for the mixhub binary with isolated config and the given mix
fn mixhub(home: &Path, mix: &Path) -> Command {
    let mut cmd = Command::cargo_bin("mixhub").unwrap();
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("MIXHUB_MIX__COMMAND", mix)
        .env("NO_COLOR", "1")
        .env_remove("MIXHUB_LOG")
        .current_dir(home);
    cmd
}

#[test]
fn test_root_prefers_umbrella() {
    let home = TempDir::new().unwrap();
    let (_mix_dir, mix) = create_fake_mix();
    let (_dir, umbrella, app) = create_umbrella_project();

    mixhub(home.path(), &mix)
        .args(["root", "-d"])
        .arg(app.join("lib").join("web"))
        .assert()
        .success()
        .stdout(predicate::str::diff(format!("{}\n", canonical(&umbrella).display())));
}

#[test]
fn test_root_nearest_flag() {
    let home = TempDir::new().unwrap();
    let (_mix_dir, mix) = create_fake_mix();
    let (_dir, _umbrella, app) = create_umbrella_project();

    mixhub(home.path(), &mix)
        .args(["--nearest", "root", "-d"])
        .arg(app.join("lib"))
        .assert()
        .success()
        .stdout(predicate::str::diff(format!("{}\n", canonical(&app).display())));
}

#[test]
fn test_root_config_disables_umbrella() {
    let home = TempDir::new().unwrap();
    let (_mix_dir, mix) = create_fake_mix();
    let (_dir, _umbrella, app) = create_umbrella_project();

    mixhub(home.path(), &mix)
        .env("MIXHUB_PROJECT__PREFER_UMBRELLA", "false")
        .args(["root", "-d"])
        .arg(&app)
        .assert()
        .success()
        .stdout(predicate::str::diff(format!("{}\n", canonical(&app).display())));
}

#[test]
fn test_root_json_reports_both_roots() {
    let home = TempDir::new().unwrap();
    let (_mix_dir, mix) = create_fake_mix();
    let (_dir, umbrella, app) = create_umbrella_project();

    let output = mixhub(home.path(), &mix)
        .args(["root", "-f", "json", "-d"])
        .arg(&app)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["nearest"], canonical(&app).display().to_string());
    assert_eq!(json["umbrella"], canonical(&umbrella).display().to_string());
    assert_eq!(json["nested"], true);
}

#[test]
fn test_root_without_marker_fails() {
    let home = TempDir::new().unwrap();
    let (_mix_dir, mix) = create_fake_mix();
    let (_dir, empty) = create_empty_dir();
    if marker_above(&empty) {
        eprintln!("Skipping test: mix.exs exists above the temp dir");
        return;
    }

    mixhub(home.path(), &mix)
        .args(["root", "-d"])
        .arg(&empty)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No mix project root found"));
}

#[test]
fn test_list_tasks_in_order() {
    let home = TempDir::new().unwrap();
    let (_mix_dir, mix) = create_fake_mix();
    let (_dir, project) = create_mix_project();

    mixhub(home.path(), &mix)
        .args(["list", "-f", "plain", "-d"])
        .arg(&project)
        .assert()
        .success()
        .stdout("compile\ndeps.get\ntest\n");
}

#[test]
fn test_list_raw_descriptors() {
    let home = TempDir::new().unwrap();
    let (_mix_dir, mix) = create_fake_mix();
    let (_dir, project) = create_mix_project();

    mixhub(home.path(), &mix)
        .args(["list", "--raw", "-d"])
        .arg(&project)
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "compile           # Compiles source files\n",
        ))
        .stdout(predicate::str::contains("Runs the default task").not())
        .stdout(predicate::str::contains("iex").not());
}

#[test]
fn test_list_table_shows_descriptions() {
    let home = TempDir::new().unwrap();
    let (_mix_dir, mix) = create_fake_mix();
    let (_dir, project) = create_mix_project();

    mixhub(home.path(), &mix)
        .args(["list", "-d"])
        .arg(&project)
        .assert()
        .success()
        .stdout(predicate::str::contains("deps.get"))
        .stdout(predicate::str::contains("# Gets all out of date dependencies"));
}

#[test]
fn test_list_empty_help_output() {
    let home = TempDir::new().unwrap();
    let tools = TempDir::new().unwrap();
    let mix = write_script(tools.path(), "mix", "#!/bin/sh\necho 'Usage: mix [task]'\n");
    let (_dir, project) = create_mix_project();

    mixhub(home.path(), &mix)
        .args(["list", "-d"])
        .arg(&project)
        .assert()
        .success()
        .stdout(predicate::str::contains("No tasks found."));
}

#[test]
fn test_list_failing_mix_is_error() {
    let home = TempDir::new().unwrap();
    let tools = TempDir::new().unwrap();
    let mix = write_script(
        tools.path(),
        "mix",
        "#!/bin/sh\necho '** (Mix) Could not find a Mix.Project' >&2\nexit 1\n",
    );
    let (_dir, project) = create_mix_project();

    mixhub(home.path(), &mix)
        .args(["list", "-d"])
        .arg(&project)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not find a Mix.Project"))
        .stderr(predicate::str::contains("hint"));
}

#[test]
fn test_list_missing_mix_command() {
    let home = TempDir::new().unwrap();
    let (_dir, project) = create_mix_project();

    mixhub(home.path(), Path::new("nonexistent_mix_12345"))
        .args(["list", "-d"])
        .arg(&project)
        .assert()
        .failure()
        .stderr(predicate::str::contains("nonexistent_mix_12345"));
}

#[test]
fn test_compile_runs_at_umbrella_root() {
    let home = TempDir::new().unwrap();
    let (_mix_dir, mix) = create_fake_mix();
    let (_dir, umbrella, app) = create_umbrella_project();

    mixhub(home.path(), &mix)
        .args(["compile", "--locations", "-d"])
        .arg(app.join("lib").join("web"))
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "Compiling in {}",
            canonical(&umbrella).display()
        )))
        .stderr(predicate::str::contains("warning: variable"))
        .stderr(predicate::str::contains("lib/app.ex:7"));
}

#[test]
fn test_compile_nearest_runs_in_app() {
    let home = TempDir::new().unwrap();
    let (_mix_dir, mix) = create_fake_mix();
    let (_dir, _umbrella, app) = create_umbrella_project();

    mixhub(home.path(), &mix)
        .args(["--nearest", "compile", "-d"])
        .arg(&app)
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "Compiling in {}",
            canonical(&app).display()
        )));
}

#[test]
fn test_compile_without_project_fails() {
    let home = TempDir::new().unwrap();
    let (_mix_dir, mix) = create_fake_mix();
    let (_dir, empty) = create_empty_dir();
    if marker_above(&empty) {
        eprintln!("Skipping test: mix.exs exists above the temp dir");
        return;
    }

    mixhub(home.path(), &mix)
        .args(["compile", "-d"])
        .arg(&empty)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Compiling").not())
        .stderr(predicate::str::contains("No mix project root found"));
}

#[test]
fn test_run_passes_args_and_mix_env() {
    let home = TempDir::new().unwrap();
    let (_mix_dir, mix) = create_fake_mix();
    let (_dir, project) = create_mix_project();

    mixhub(home.path(), &mix)
        .args(["run", "echo", "--mix-env", "test", "-d"])
        .arg(&project)
        .args(["one", "--two"])
        .assert()
        .success()
        .stdout(predicate::str::contains("MIX_ENV=test args=one --two"));
}

#[test]
fn test_run_unknown_task_fails() {
    let home = TempDir::new().unwrap();
    let (_mix_dir, mix) = create_fake_mix();
    let (_dir, project) = create_mix_project();

    mixhub(home.path(), &mix)
        .args(["run", "frobnicate", "-d"])
        .arg(&project)
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not be found"))
        .stderr(predicate::str::contains("Task 'frobnicate' failed"));
}

#[cfg(unix)]
#[test]
fn test_shell_opens_at_project_root() {
    let home = TempDir::new().unwrap();
    let (_mix_dir, mix) = create_fake_mix();
    let (_dir, umbrella, app) = create_umbrella_project();
    let config = home.path().join("shell.toml");
    std::fs::write(
        &config,
        "[shell]\nprogram = \"/bin/sh\"\nargs = [\"-c\", \"pwd\"]\n",
    )
    .unwrap();

    mixhub(home.path(), &mix)
        .arg("-c")
        .arg(&config)
        .args(["shell", "-d"])
        .arg(&app)
        .assert()
        .success()
        .stdout(predicate::str::diff(format!("{}\n", canonical(&umbrella).display())));
}

#[cfg(unix)]
#[test]
fn test_shell_falls_back_to_start_dir() {
    let home = TempDir::new().unwrap();
    let (_mix_dir, mix) = create_fake_mix();
    let (_dir, empty) = create_empty_dir();
    if marker_above(&empty) {
        eprintln!("Skipping test: mix.exs exists above the temp dir");
        return;
    }
    let config = home.path().join("shell.toml");
    std::fs::write(
        &config,
        "[shell]\nprogram = \"/bin/sh\"\nargs = [\"-c\", \"pwd\"]\n",
    )
    .unwrap();

    mixhub(home.path(), &mix)
        .arg("-c")
        .arg(&config)
        .args(["shell", "-d"])
        .arg(&empty)
        .assert()
        .success()
        .stdout(predicate::str::diff(format!("{}\n", canonical(&empty).display())));
}

#[test]
fn test_config_json_shows_env_override() {
    let home = TempDir::new().unwrap();
    let (_mix_dir, mix) = create_fake_mix();

    let output = mixhub(home.path(), &mix)
        .args(["config", "-f", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["mix"]["command"], mix.display().to_string());
    assert_eq!(json["project"]["prefer_umbrella"], true);
}

#[test]
fn test_help_lists_subcommands() {
    let home = TempDir::new().unwrap();

    mixhub(home.path(), Path::new("mix"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("root"))
        .stdout(predicate::str::contains("compile"))
        .stdout(predicate::str::contains("shell"));
}
