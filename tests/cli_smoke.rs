use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;

fn recipe(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("recipe").expect("recipe binary should build");
    cmd.env("RECIPE_HOME", home.path())
        .env_remove("RECIPE_CONFIG_PATH")
        .env_remove("RUST_LOG")
        .env("SHELL", "sh")
        .env("NO_COLOR", "1");
    cmd
}

fn home_with_catalog() -> TempDir {
    let home = TempDir::new().expect("temp home");
    let catalog = json!([
        {
            "id": "1",
            "name": "Greeting",
            "command": "printf hi",
            "category": "Demo",
        },
        {
            "id": "2",
            "name": "Fail Three",
            "command": "exit 3",
            "category": "Demo",
            "use_shell": true,
        },
    ]);
    std::fs::write(
        home.path().join("commands.json"),
        serde_json::to_vec_pretty(&catalog).expect("serialize catalog"),
    )
    .expect("write catalog");
    home
}

#[test]
fn recipe_help_command_succeeds() {
    let home = TempDir::new().expect("temp home");
    recipe(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--background"));
}

#[test]
fn version_prints_package_version() {
    let home = TempDir::new().expect("temp home");
    recipe(&home)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn list_seeds_a_missing_catalog() {
    let home = TempDir::new().expect("temp home");
    recipe(&home)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Disk Space"));
    assert!(home.path().join("commands.json").exists());
}

#[test]
fn list_prints_existing_entries() {
    let home = home_with_catalog();
    recipe(&home)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("1\tDemo\tGreeting\tprintf hi"))
        .stdout(predicate::str::contains("Fail Three"));
}

#[test]
fn run_by_name_prints_the_report() {
    let home = home_with_catalog();
    recipe(&home)
        .args(["run", "greeting"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Command: printf hi"))
        .stdout(predicate::str::contains("Exit Code: 0"))
        .stdout(predicate::str::contains("--- Output ---\nhi"));
}

#[test]
fn run_exits_with_the_child_code() {
    let home = home_with_catalog();
    recipe(&home)
        .args(["run", "2"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("Exit Code: 3"))
        .stdout(predicate::str::contains("--- Error ---"));
}

#[test]
fn run_unknown_target_fails() {
    let home = home_with_catalog();
    recipe(&home)
        .args(["run", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No command with id or name 'nope'"));
}

#[test]
fn explicit_config_must_exist() {
    let home = home_with_catalog();
    recipe(&home)
        .args(["--config", "/definitely/missing/recipe.toml", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load settings"));
}
