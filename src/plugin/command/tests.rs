//! Command action tests

use super::*;
use crate::plugin::{ActionFactory, ActionManifest, ActionState};
use std::path::Path;
use tempfile::TempDir;

fn manifest(dir: &Path, yaml: &str) -> ActionManifest {
    ActionManifest::from_yaml(yaml)
        .unwrap()
        .with_source(dir.join("action.yaml"))
}

#[tokio::test]
async fn test_missing_program_is_invalid() {
    let temp_dir = TempDir::new().unwrap();
    let manifest = manifest(
        temp_dir.path(),
        "identifier: ghost\nname: Ghost\nkind: command\nprogram: /definitely/not/here/ghost\n",
    );

    let action = CommandActionFactory.create_action(&manifest).await.unwrap();
    assert_eq!(action.state(), ActionState::INVALID);
    assert!(action.run().is_err());
}

#[cfg(unix)]
#[tokio::test]
async fn test_requires_and_disabled_paths() {
    let temp_dir = TempDir::new().unwrap();
    let manifest = manifest(
        temp_dir.path(),
        r#"
identifier: render
name: Render
kind: command
program: sh
args: ["-c", "true"]
requires: [scene.ma]
disabled_when_exists: render.lock
"#,
    );

    let action = CommandActionFactory.create_action(&manifest).await.unwrap();
    assert_eq!(action.state(), ActionState::INVALID);

    std::fs::write(temp_dir.path().join("scene.ma"), "").unwrap();
    assert_eq!(action.state(), ActionState::VALID);

    std::fs::write(temp_dir.path().join("render.lock"), "").unwrap();
    let state = action.state();
    assert!(state.is_disabled());
    assert!(!state.is_invalid());
}

#[cfg(unix)]
#[tokio::test]
async fn test_status_probe_reports_stdout() {
    let temp_dir = TempDir::new().unwrap();
    let manifest = manifest(
        temp_dir.path(),
        r#"
identifier: mail
name: Mail
kind: command
program: sh
status_probe_delay_ms: 250
status:
  program: sh
  args: ["-c", "echo '  3 unread  '"]
"#,
    );

    let action = CommandActionFactory.create_action(&manifest).await.unwrap();
    assert_eq!(action.status().unwrap(), Some("3 unread".to_string()));
    assert_eq!(action.status_probe_delay().as_millis(), 250);
}

#[cfg(unix)]
#[tokio::test]
async fn test_silent_status_probe_reports_nothing() {
    let quiet = CommandSpec::new("sh").arg("-c").arg("true");
    assert_eq!(quiet.output().unwrap(), None);

    let failing = CommandSpec::new("sh").arg("-c").arg("exit 3");
    assert!(failing.output().is_err());
}

#[cfg(unix)]
#[tokio::test]
async fn test_sub_actions_run_their_commands() {
    let temp_dir = TempDir::new().unwrap();
    let marker = temp_dir.path().join("touched");
    let yaml = format!(
        r#"
identifier: tools
name: Tools
kind: command
program: sh
actions:
  Touch Marker:
    program: sh
    args: ["-c", "touch {}"]
  Second:
    program: sh
"#,
        marker.display()
    );

    let action = CommandActionFactory
        .create_action(&manifest(temp_dir.path(), &yaml))
        .await
        .unwrap();

    let sub_actions = action.sub_actions();
    let names: Vec<_> = sub_actions.keys().cloned().collect();
    assert_eq!(names, vec!["Touch Marker", "Second"]);

    (sub_actions["Touch Marker"])().unwrap();
    for _ in 0..50 {
        if marker.exists() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert!(marker.exists());
}

#[cfg(unix)]
#[test]
fn test_launch_needs_a_runtime() {
    let err = CommandSpec::new("sh").arg("-c").arg("true").spawn().unwrap_err();
    assert!(err.to_string().contains("outside a runtime"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_spawn_returns_before_the_child_exits() {
    let temp_dir = TempDir::new().unwrap();
    let marker = temp_dir.path().join("done");
    let spec = CommandSpec::new("sh")
        .arg("-c")
        .arg(format!("touch {}", marker.display()));

    for _ in 0..3 {
        spec.spawn().unwrap();
    }
    for _ in 0..50 {
        if marker.exists() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert!(marker.exists());
}

#[test]
fn test_relative_program_is_anchored() {
    let spec = CommandSpec::new("bin/tool").anchored_at(|p| Path::new("/plugins").join(p));
    assert_eq!(spec.program, "/plugins/bin/tool");

    let spec = CommandSpec::new("tool").anchored_at(|p| Path::new("/plugins").join(p));
    assert_eq!(spec.program, "tool");
}
