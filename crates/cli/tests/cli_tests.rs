mod common;

use common::TestWorkspace;
use predicates::prelude::*;

const SECRETS: &str = r#"[
    { "name": "RDSPassword", "length": 20 },
    { "name": "grafanaPassword", "length": 15 },
    { "name": "apiToken", "length": 32, "policy": { "kind": "alphanumeric_only" } }
]"#;

fn provision_json(workspace: &TestWorkspace) -> serde_json::Value {
    let output = workspace
        .cmd()
        .args(["provision", "--format", "json", "--reveal"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_provision_is_idempotent_across_runs() {
    let workspace = TestWorkspace::with_config(SECRETS);

    let first = provision_json(&workspace);
    let second = provision_json(&workspace);

    for i in 0..3 {
        assert_eq!(first[i]["origin"], "created");
        assert_eq!(second[i]["origin"], "existing");
        assert_eq!(first[i]["value"], second[i]["value"]);
    }
    assert_eq!(first[0]["storageKey"], "RDSPassword-prod");
    assert_eq!(first[0]["value"].as_str().unwrap().chars().count(), 20);
    assert_eq!(first[1]["value"].as_str().unwrap().chars().count(), 15);
    assert!(first[2]["value"]
        .as_str()
        .unwrap()
        .chars()
        .all(|c| c.is_ascii_alphanumeric()));

    let stored = workspace.stored();
    assert_eq!(stored["secrets"]["RDSPassword-prod"], first[0]["value"]);
}

#[test]
fn test_values_are_masked_unless_revealed() {
    let workspace = TestWorkspace::with_config(SECRETS);

    workspace
        .cmd()
        .args(["resolve", "RDSPassword"])
        .assert()
        .success()
        .stdout(predicate::str::contains("RDSPassword (RDSPassword-prod) [created]: ********"));

    let stored = workspace.stored();
    let value = stored["secrets"]["RDSPassword-prod"].as_str().unwrap().to_string();

    workspace
        .cmd()
        .args(["resolve", "RDSPassword"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[existing]"))
        .stdout(predicate::str::contains(value.as_str()).not());

    workspace
        .cmd()
        .args(["resolve", "RDSPassword", "--reveal"])
        .assert()
        .success()
        .stdout(predicate::str::contains(value.as_str()));
}

#[test]
fn test_status_never_creates() {
    let workspace = TestWorkspace::with_config(SECRETS);

    workspace
        .cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("RDSPassword (RDSPassword-prod): missing"));
    assert!(!workspace.store_path().exists());

    workspace.cmd().args(["resolve", "RDSPassword"]).assert().success();

    workspace
        .cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("RDSPassword (RDSPassword-prod): present"))
        .stdout(predicate::str::contains("grafanaPassword (grafanaPassword-prod): missing"));
}

#[test]
fn test_status_has_no_env_format() {
    let workspace = TestWorkspace::with_config(SECRETS);

    workspace
        .cmd()
        .args(["status", "--format", "env"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value 'env'"));

    workspace
        .cmd()
        .args(["status", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"state\": \"missing\""));
}

#[test]
fn test_resolve_flags_without_config_file() {
    let workspace = TestWorkspace::new();
    let store = workspace.store_path();

    let output = workspace
        .cmd()
        .args(["--namespace", "dev", "--store-path"])
        .arg(&store)
        .args([
            "resolve",
            "apiToken",
            "--length",
            "40",
            "--policy",
            "alphanumeric",
            "--format",
            "env",
            "--reveal",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout).unwrap();
    let value = stdout
        .trim()
        .strip_prefix("export API_TOKEN='")
        .and_then(|rest| rest.strip_suffix('\''))
        .unwrap();
    assert_eq!(value.len(), 40);
    assert!(value.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_eq!(workspace.stored()["secrets"]["apiToken-dev"], value);
}

#[test]
fn test_namespace_flag_overrides_config() {
    let workspace = TestWorkspace::with_config(SECRETS);

    workspace
        .cmd()
        .args(["--namespace", "staging", "resolve", "RDSPassword"])
        .assert()
        .success()
        .stdout(predicate::str::contains("RDSPassword-staging"));
}

#[test]
fn test_missing_namespace_fails() {
    let workspace = TestWorkspace::new();

    workspace
        .cmd()
        .args(["--store", "memory", "resolve", "RDSPassword"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no namespace configured"));
}

#[test]
fn test_store_path_requires_file_backend() {
    let workspace = TestWorkspace::new();

    workspace
        .cmd()
        .args(["--namespace", "prod", "--store", "memory", "--store-path", "x.json"])
        .args(["resolve", "RDSPassword"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--store-path only applies"));
}

#[test]
fn test_alphanumeric_policy_rejects_symbols_flag() {
    let workspace = TestWorkspace::with_config(SECRETS);

    workspace
        .cmd()
        .args(["resolve", "RDSPassword", "--policy", "alphanumeric", "--symbols", "!#"])
        .assert()
        .failure();
    assert!(!workspace.store_path().exists());
}

#[test]
fn test_corrupt_store_is_an_error_not_a_new_secret() {
    let workspace = TestWorkspace::with_config(SECRETS);
    std::fs::write(workspace.store_path(), "not json").unwrap();

    workspace
        .cmd()
        .args(["resolve", "RDSPassword"])
        .assert()
        .failure();
    assert_eq!(std::fs::read_to_string(workspace.store_path()).unwrap(), "not json");
}

#[test]
fn test_provision_without_declarations_fails() {
    let workspace = TestWorkspace::with_config("[]");

    workspace
        .cmd()
        .arg("provision")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no secrets are declared"));
}
