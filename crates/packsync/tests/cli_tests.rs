//! CLI integration tests.
//!
//! These tests run the packsync binary end-to-end against a throwaway
//! home and data directory.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    fn package(&self, name: &str, files: &[(&str, &str)]) -> PathBuf {
        let root = self.dir.path().join("src").join(format!("{name}.logicx"));
        for (rel, content) in files {
            let path = root.join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
        root
    }

    fn run(&self, args: &[&str]) -> Output {
        let home = self.dir.path().join("home");
        std::fs::create_dir_all(&home).unwrap();
        Command::new(env!("CARGO_BIN_EXE_packsync"))
            .args(args)
            .arg("--data-dir")
            .arg(self.data_dir())
            .env("HOME", &home)
            .env("XDG_CONFIG_HOME", home.join(".config"))
            .env("PACKSYNC_USER_ID", "alice")
            .env("PACKSYNC_USER_NAME", "Alice")
            .env_remove("PACKSYNC_CONFIG_CONTENT")
            .env_remove("PACKSYNC_DATA_DIR")
            .env_remove("PACKSYNC_LOG_LEVEL")
            .output()
            .expect("Failed to execute command")
    }

    fn json(&self, args: &[&str]) -> serde_json::Value {
        let mut full = args.to_vec();
        full.push("--json");
        let output = self.run(&full);
        assert!(
            output.status.success(),
            "{args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("Output is not JSON")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn write(path: &Path, content: &str) {
    std::fs::write(path, content).unwrap();
}

#[test]
fn test_help_command() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["--help"]);

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Versioned snapshots of directory packages"));
    assert!(out.contains("import"));
    assert!(out.contains("add-version"));
}

#[test]
fn test_list_empty() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["list"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("No projects found."));
}

#[test]
fn test_import_commit_and_status() {
    let sandbox = Sandbox::new();
    let package = sandbox.package("Song", &[("ProjectData", "v1"), ("Media/a.wav", "aaa")]);

    let project = sandbox.json(&["import", package.to_str().unwrap()]);
    assert_eq!(project["name"], "Song");
    assert_eq!(project["ownerId"], "alice");
    assert_eq!(project["versions"].as_array().unwrap().len(), 1);

    let working_copy = PathBuf::from(project["workingCopyPath"].as_str().unwrap());
    write(&working_copy.join("ProjectData"), "v2");

    let status = sandbox.json(&["status", "song"]);
    assert_eq!(status["changes"]["modified"][0], "ProjectData");

    let version = sandbox.json(&["commit", "Song", "-m", "second take"]);
    assert_eq!(version["message"], "second take");
    assert_eq!(version["creatorId"], "alice");

    let status = sandbox.json(&["status", "Song"]);
    assert!(status["changes"]["modified"].as_array().unwrap().is_empty());

    let listed = sandbox.json(&["list"]);
    assert_eq!(listed[0]["versions"].as_array().unwrap().len(), 2);
    assert!(sandbox.data_dir().join("snapshot.json").exists());
}

#[test]
fn test_fork_then_activity() {
    let sandbox = Sandbox::new();
    let package = sandbox.package("Song", &[("ProjectData", "v1")]);
    let project = sandbox.json(&["import", package.to_str().unwrap()]);
    let version_id = project["versions"][0]["id"].as_str().unwrap().to_string();

    let fork = sandbox.json(&["fork", &version_id, "-n", "Remix"]);
    assert_eq!(fork["name"], "Remix");
    assert_eq!(fork["origin"]["kind"], "fork");

    let output = sandbox.run(&["activity", "-n", "5"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Remix"));
}

#[test]
fn test_unknown_project_fails() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["show", "missing"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing"));
}

#[test]
fn test_merge_rejects_unknown_policy() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["merge", "ver_a", "ver_b", "--policy", "coin-flip"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("coin-flip"));
}
