//! Utility functions for LaunchPad

use anyhow::{anyhow, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Ensure a directory exists, creating it if necessary
pub fn ensure_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    } else if !path.is_dir() {
        return Err(anyhow!("Path exists but is not a directory: {:?}", path));
    }
    Ok(())
}

/// Get the XDG config directory for LaunchPad
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow!("Could not determine config directory"))?
        .join("launchpad");

    Ok(config_dir)
}

/// Expand `~` and environment variables in a configured path
pub fn expand_path(path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw)
        .map_err(|e| anyhow!("Failed to expand path {:?}: {}", path, e))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Remove duplicate paths, keeping the first occurrence of each
pub fn dedup_paths<I>(paths: I) -> Vec<PathBuf>
where
    I: IntoIterator<Item = PathBuf>,
{
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .filter(|path| seen.insert(path.clone()))
        .collect()
}

/// Whether a file looks like an action manifest
pub fn is_manifest_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Find action manifests in a directory.
///
/// Only the directory's own entries are considered unless `recursive` is
/// set. Entries are returned in file name order, together with the errors
/// hit while walking.
pub fn find_manifest_files(dir: &Path, recursive: bool) -> (Vec<PathBuf>, Vec<walkdir::Error>) {
    let mut walker = WalkDir::new(dir).min_depth(1).sort_by_file_name();
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    let mut errors = Vec::new();
    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_file() && is_manifest_file(entry.path()) => {
                files.push(entry.into_path());
            }
            Ok(_) => {}
            Err(e) => errors.push(e),
        }
    }
    (files, errors)
}

/// Resolve a program name or path to an executable
pub fn resolve_program(program: &str) -> Option<PathBuf> {
    if program.is_empty() {
        return None;
    }
    which::which(program).ok()
}

/// Format duration as human readable string
pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if secs > 0 {
        format!("{secs}.{millis:03}s")
    } else {
        format!("{millis}ms")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_dedup_paths_keeps_first_occurrence() {
        let paths = dedup_paths(vec![
            PathBuf::from("/b"),
            PathBuf::from("/a"),
            PathBuf::from("/b"),
            PathBuf::from("/c"),
            PathBuf::from("/a"),
        ]);
        assert_eq!(
            paths,
            vec![PathBuf::from("/b"), PathBuf::from("/a"), PathBuf::from("/c")]
        );
    }

    #[test]
    fn test_find_manifest_files() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested");
        fs::create_dir(&nested).unwrap();

        fs::write(temp_dir.path().join("b.yaml"), "").unwrap();
        fs::write(temp_dir.path().join("a.yml"), "").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "").unwrap();
        fs::write(nested.join("c.yaml"), "").unwrap();

        let names = |files: Vec<PathBuf>| -> Vec<String> {
            files
                .iter()
                .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
                .collect()
        };

        assert_eq!(
            names(find_manifest_files(temp_dir.path(), false).0),
            vec!["a.yml", "b.yaml"]
        );
        assert_eq!(
            names(find_manifest_files(temp_dir.path(), true).0),
            vec!["a.yml", "b.yaml", "c.yaml"]
        );
    }

    #[test]
    fn test_find_manifest_files_reports_walk_errors() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing");

        let (files, errors) = find_manifest_files(&missing, false);
        assert!(files.is_empty());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path(), Some(missing.as_path()));
    }

    #[test]
    fn test_expand_path() {
        std::env::set_var("LAUNCHPAD_TEST_ROOT", "/opt/launchpad");
        assert_eq!(
            expand_path(Path::new("$LAUNCHPAD_TEST_ROOT/plugins")).unwrap(),
            PathBuf::from("/opt/launchpad/plugins")
        );
        assert_eq!(
            expand_path(Path::new("/plain")).unwrap(),
            PathBuf::from("/plain")
        );
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(std::time::Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(std::time::Duration::from_millis(1500)), "1.500s");
    }
}
