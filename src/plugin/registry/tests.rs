//! Registry tests

use super::*;
use crate::plugin::{ActionManifest, ActionMetadata, UNCATEGORISED};
use async_trait::async_trait;
use rstest::rstest;
use std::fs;
use tempfile::TempDir;

fn write_url_action(dir: &Path, file: &str, identifier: &str, groups: &[&str], beta: bool) {
    let groups: Vec<String> = groups.iter().map(|g| format!("\"{g}\"")).collect();
    fs::write(
        dir.join(file),
        format!(
            "identifier: {identifier}\nname: {identifier}\ngroups: [{}]\nbeta: {beta}\nkind: url\nurl: https://example.com/{identifier}\n",
            groups.join(", ")
        ),
    )
    .unwrap();
}

/// Action whose validity check always panics
#[derive(Debug)]
struct Faulty(ActionMetadata);

impl Action for Faulty {
    fn metadata(&self) -> &ActionMetadata {
        &self.0
    }

    fn state(&self) -> ActionState {
        panic!("cannot determine validity");
    }

    fn run(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

struct FaultyFactory;

#[async_trait]
impl ActionFactory for FaultyFactory {
    fn kind(&self) -> &str {
        "faulty"
    }

    async fn create_action(&self, manifest: &ActionManifest) -> anyhow::Result<Arc<dyn Action>> {
        Ok(Arc::new(Faulty(manifest.metadata())))
    }
}

#[tokio::test]
async fn test_empty_registry() {
    let registry = PluginRegistry::new(Vec::new(), ScanOptions::default()).await;

    assert!(registry.paths().is_empty());
    assert!(registry.identifiers(true).is_empty());
    assert!(registry.grouped_identifiers(true).is_empty());
    assert_eq!(
        registry.request("missing").unwrap_err(),
        RegistryError::NotFound("missing".to_string())
    );
}

#[tokio::test]
async fn test_grouped_identifiers_scenario() {
    let temp_dir = TempDir::new().unwrap();
    write_url_action(temp_dir.path(), "a.yaml", "a", &["Apps"], false);
    write_url_action(temp_dir.path(), "b.yaml", "b", &[], false);

    let registry =
        PluginRegistry::new(vec![temp_dir.path().to_path_buf()], ScanOptions::default()).await;

    let grouped = registry.grouped_identifiers(false);
    assert_eq!(grouped.len(), 2);
    assert_eq!(grouped["Apps"], vec!["a"]);
    assert_eq!(grouped[UNCATEGORISED], vec!["b"]);
    assert!(registry.warnings().is_empty());
}

#[tokio::test]
async fn test_multi_group_action_listed_in_each_group() {
    let temp_dir = TempDir::new().unwrap();
    write_url_action(temp_dir.path(), "a.yaml", "a", &["A", "B"], false);
    write_url_action(temp_dir.path(), "c.yaml", "c", &["B"], false);

    let registry =
        PluginRegistry::new(vec![temp_dir.path().to_path_buf()], ScanOptions::default()).await;

    let grouped = registry.grouped_identifiers(false);
    assert_eq!(grouped["A"], vec!["a"]);
    assert_eq!(grouped["B"], vec!["a", "c"]);
    assert!(!grouped.contains_key(UNCATEGORISED));
}

#[tokio::test]
async fn test_paths_are_deduplicated_in_insertion_order() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    let paths = vec![
        second.path().to_path_buf(),
        first.path().to_path_buf(),
        second.path().to_path_buf(),
        first.path().to_path_buf(),
    ];

    let registry = PluginRegistry::new(paths, ScanOptions::default()).await;
    assert_eq!(
        registry.paths(),
        vec![second.path().to_path_buf(), first.path().to_path_buf()]
    );
}

#[tokio::test]
async fn test_beta_actions_are_opt_in() {
    let temp_dir = TempDir::new().unwrap();
    write_url_action(temp_dir.path(), "1.yaml", "stable", &[], false);
    write_url_action(temp_dir.path(), "2.yaml", "preview", &["Labs"], true);

    let registry =
        PluginRegistry::new(vec![temp_dir.path().to_path_buf()], ScanOptions::default()).await;

    let default = registry.identifiers(false);
    let all = registry.identifiers(true);
    assert_eq!(default, vec!["stable"]);
    assert_eq!(all, vec!["stable", "preview"]);
    assert!(default.iter().all(|id| all.contains(id)));

    assert!(!registry.grouped_identifiers(false).contains_key("Labs"));
    assert_eq!(registry.grouped_identifiers(true)["Labs"], vec!["preview"]);
}

#[tokio::test]
async fn test_invalid_actions_are_hidden_but_resolvable() {
    let temp_dir = TempDir::new().unwrap();
    write_url_action(temp_dir.path(), "ok.yaml", "ok", &[], false);
    fs::write(
        temp_dir.path().join("missing.yaml"),
        "identifier: maya\nname: Maya\nkind: command\nprogram: /no/such/maya\n",
    )
    .unwrap();

    let registry =
        PluginRegistry::new(vec![temp_dir.path().to_path_buf()], ScanOptions::default()).await;

    assert_eq!(registry.identifiers(true), vec!["ok"]);
    assert_eq!(registry.snapshot().actions().len(), 2);
    assert_eq!(registry.state("maya").unwrap(), ActionState::INVALID);
}

#[tokio::test]
async fn test_broken_manifests_do_not_abort_the_scan() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("gone");
    write_url_action(temp_dir.path(), "good.yaml", "good", &[], false);
    fs::write(temp_dir.path().join("broken.yaml"), "identifier: [unterminated").unwrap();
    fs::write(
        temp_dir.path().join("alien.yaml"),
        "identifier: alien\nname: Alien\nkind: teleport\n",
    )
    .unwrap();

    let registry = PluginRegistry::new(
        vec![temp_dir.path().to_path_buf(), missing.clone()],
        ScanOptions::default(),
    )
    .await;

    assert_eq!(registry.identifiers(true), vec!["good"]);

    let warnings = registry.warnings();
    assert_eq!(warnings.len(), 3);
    assert!(warnings
        .iter()
        .any(|w| matches!(w, DiscoveryWarning::InvalidManifest { path, .. } if path.ends_with("broken.yaml"))));
    assert!(warnings
        .iter()
        .any(|w| matches!(w, DiscoveryWarning::UnknownKind { kind, .. } if kind == "teleport")));
    assert!(warnings.contains(&DiscoveryWarning::MissingDirectory(missing)));
}

#[rstest]
#[case(DuplicatePolicy::FirstWins, vec!["shared", "solo"], Some("First"))]
#[case(DuplicatePolicy::LastWins, vec!["shared", "solo"], Some("Second"))]
#[case(DuplicatePolicy::RejectBoth, vec!["solo"], None)]
#[tokio::test]
async fn test_duplicate_policy(
    #[case] policy: DuplicatePolicy,
    #[case] expected: Vec<&str>,
    #[case] winner: Option<&str>,
) {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    fs::write(
        first.path().join("shared.yaml"),
        "identifier: shared\nname: First\nkind: url\nurl: https://first\n",
    )
    .unwrap();
    write_url_action(first.path(), "solo.yaml", "solo", &[], false);
    fs::write(
        second.path().join("shared.yaml"),
        "identifier: shared\nname: Second\nkind: url\nurl: https://second\n",
    )
    .unwrap();

    let options = ScanOptions {
        duplicate_policy: policy,
        ..ScanOptions::default()
    };
    let registry = PluginRegistry::new(
        vec![first.path().to_path_buf(), second.path().to_path_buf()],
        options,
    )
    .await;

    assert_eq!(registry.identifiers(true), expected);

    let name = registry
        .request("shared")
        .ok()
        .map(|handle| handle.metadata().name.clone());
    assert_eq!(name.as_deref(), winner);

    assert!(registry
        .warnings()
        .iter()
        .any(|w| matches!(w, DiscoveryWarning::Duplicate { identifier, .. } if identifier == "shared")));
}

#[tokio::test]
async fn test_recursive_scanning_is_opt_in() {
    let temp_dir = TempDir::new().unwrap();
    let nested = temp_dir.path().join("nested");
    fs::create_dir(&nested).unwrap();
    write_url_action(temp_dir.path(), "top.yaml", "top", &[], false);
    write_url_action(&nested, "deep.yaml", "deep", &[], false);

    let flat =
        PluginRegistry::new(vec![temp_dir.path().to_path_buf()], ScanOptions::default()).await;
    assert_eq!(flat.identifiers(true), vec!["top"]);

    let recursive = PluginRegistry::new(
        vec![temp_dir.path().to_path_buf()],
        ScanOptions {
            recursive: true,
            ..ScanOptions::default()
        },
    )
    .await;
    assert_eq!(recursive.identifiers(true), vec!["deep", "top"]);
}

#[cfg(unix)]
#[tokio::test]
async fn test_unreadable_directories_are_reported() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    let locked = temp_dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    write_url_action(temp_dir.path(), "top.yaml", "top", &[], false);
    write_url_action(&locked, "hidden.yaml", "hidden", &[], false);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users can read the directory anyway
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let registry = PluginRegistry::new(
        vec![temp_dir.path().to_path_buf()],
        ScanOptions {
            recursive: true,
            ..ScanOptions::default()
        },
    )
    .await;
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert_eq!(registry.identifiers(true), vec!["top"]);
    assert!(registry
        .warnings()
        .iter()
        .any(|w| matches!(w, DiscoveryWarning::Unreadable { path, .. } if path == &locked)));
}

#[tokio::test]
async fn test_add_path_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    write_url_action(temp_dir.path(), "a.yaml", "a", &["Apps"], false);

    let registry = PluginRegistry::new(Vec::new(), ScanOptions::default()).await;

    assert!(registry.add_path(temp_dir.path()).await);
    let once_paths = registry.paths();
    let once_ids = registry.identifiers(true);
    let once_snapshot = registry.snapshot();

    assert!(!registry.add_path(temp_dir.path()).await);
    assert_eq!(registry.paths(), once_paths);
    assert_eq!(registry.identifiers(true), once_ids);
    assert!(Arc::ptr_eq(&once_snapshot, &registry.snapshot()));
}

#[tokio::test]
async fn test_remove_path_rescans() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    write_url_action(first.path(), "a.yaml", "a", &[], false);
    write_url_action(second.path(), "b.yaml", "b", &[], false);

    let registry = PluginRegistry::new(
        vec![first.path().to_path_buf(), second.path().to_path_buf()],
        ScanOptions::default(),
    )
    .await;
    let before = registry.snapshot();

    assert!(registry.remove_path(first.path()).await);
    assert!(!registry.remove_path(first.path()).await);
    assert_eq!(registry.identifiers(true), vec!["b"]);
    assert!(registry.request("a").is_err());

    // Readers holding the old snapshot keep a consistent view
    assert_eq!(before.identifiers(true), vec!["a", "b"]);
}

#[tokio::test]
async fn test_rescan_picks_up_new_manifests() {
    let temp_dir = TempDir::new().unwrap();
    let registry =
        PluginRegistry::new(vec![temp_dir.path().to_path_buf()], ScanOptions::default()).await;
    assert!(registry.identifiers(true).is_empty());

    write_url_action(temp_dir.path(), "late.yaml", "late", &[], false);
    registry.rescan().await;
    assert_eq!(registry.identifiers(true), vec!["late"]);
}

#[tokio::test]
async fn test_panicking_validity_resolves_to_invalid() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("faulty.yaml"),
        "identifier: faulty\nname: Faulty\nkind: faulty\n",
    )
    .unwrap();

    let registry =
        PluginRegistry::new(vec![temp_dir.path().to_path_buf()], ScanOptions::default()).await;
    assert!(registry.request("faulty").is_err());

    registry.register_factory(Arc::new(FaultyFactory)).await;

    let handle = registry.request("faulty").unwrap();
    assert_eq!(handle.state(), ActionState::INVALID);
    assert!(registry.identifiers(true).is_empty());
}
