use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// A scratch directory holding a configuration file and a file-backed store
pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    /// Write `seedvault.json` with a file store next to it
    pub fn with_config(secrets: &str) -> Self {
        let workspace = Self::new();
        let config = format!(
            r#"{{
                "namespace": "prod",
                "store": {{ "backend": "file", "path": "secrets.json" }},
                "secrets": {secrets}
            }}"#
        );
        fs::write(workspace.dir.path().join("seedvault.json"), config).expect("failed to write config");
        workspace
    }

    pub fn store_path(&self) -> PathBuf {
        self.dir.path().join("secrets.json")
    }

    pub fn stored(&self) -> serde_json::Value {
        let content = fs::read_to_string(self.store_path()).expect("store file missing");
        serde_json::from_str(&content).expect("store file is not JSON")
    }

    /// The binary, run inside the workspace with no ambient configuration
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("seedvault").expect("binary not built");
        cmd.current_dir(self.dir.path())
            .env_remove("SEEDVAULT_NAMESPACE")
            .env_remove("SEEDVAULT_REGION")
            .env_remove("SEEDVAULT_STORE_TIMEOUT_MS")
            .env("SEEDVAULT_LOG", "warn");
        cmd
    }
}
