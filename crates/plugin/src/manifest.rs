//! On-disk action manifests
//!
//! A manifest is a YAML document describing one action. The fields every
//! action shares are typed here; everything else is kept as kind-specific
//! `settings` for the factory of that kind to interpret.
//!
//! A manifest may also carry a `variants` table. Each row is a set of
//! `{placeholder}` substitutions and produces its own action, which is how a
//! single manifest covers every installed version of an application.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ActionMetadata;

/// Manifest errors
#[derive(thiserror::Error, Debug)]
pub enum ManifestError {
    #[error("Failed to parse manifest: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Manifest field `{0}` must not be empty")]
    MissingField(&'static str),

    #[error("Invalid settings for kind `{kind}`: {message}")]
    Settings { kind: String, message: String },
}

/// Action manifest file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionManifest {
    /// Action identifier; may contain variant placeholders
    pub identifier: String,

    /// Display name
    pub name: String,

    /// Display description
    #[serde(default)]
    pub description: String,

    /// Display groups
    #[serde(default)]
    pub groups: Vec<String>,

    /// Icon path, relative to the manifest's directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<PathBuf>,

    /// Hidden from default listings
    #[serde(default)]
    pub beta: bool,

    /// Factory kind that builds this action
    pub kind: String,

    /// Delay before each status probe, in milliseconds
    #[serde(default)]
    pub status_probe_delay_ms: u64,

    /// Placeholder substitution table
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<IndexMap<String, String>>,

    /// Kind-specific settings
    #[serde(flatten)]
    pub settings: Mapping,

    /// File the manifest was read from
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl ActionManifest {
    /// Parse a manifest from YAML
    pub fn from_yaml(content: &str) -> Result<Self, ManifestError> {
        let manifest: ActionManifest = serde_yaml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Record the file the manifest came from
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Check the capability set every action needs
    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.identifier.trim().is_empty() {
            return Err(ManifestError::MissingField("identifier"));
        }
        if self.name.trim().is_empty() {
            return Err(ManifestError::MissingField("name"));
        }
        if self.kind.trim().is_empty() {
            return Err(ManifestError::MissingField("kind"));
        }
        Ok(())
    }

    /// Expand the variants table into one manifest per row.
    ///
    /// A manifest without variants expands to itself. When a row does not
    /// change the identifier, the row's values are appended to it so every
    /// expanded manifest still has its own identifier.
    pub fn expand(&self) -> Result<Vec<ActionManifest>, ManifestError> {
        let mut template = self.clone();
        template.variants.clear();

        if self.variants.is_empty() {
            return Ok(vec![template]);
        }

        let value = serde_yaml::to_value(&template)?;
        let mut expanded = Vec::with_capacity(self.variants.len());

        for row in &self.variants {
            let mut manifest: ActionManifest = serde_yaml::from_value(render_value(&value, row))?;
            if manifest.identifier == template.identifier {
                let suffix: Vec<&str> = row.values().map(String::as_str).collect();
                manifest.identifier = format!("{}-{}", manifest.identifier, suffix.join("-"));
            }
            manifest.source = self.source.clone();
            manifest.validate()?;
            expanded.push(manifest);
        }

        Ok(expanded)
    }

    /// Deserialize the kind-specific settings
    pub fn settings<T: DeserializeOwned>(&self) -> Result<T, ManifestError> {
        serde_yaml::from_value(Value::Mapping(self.settings.clone())).map_err(|e| {
            ManifestError::Settings {
                kind: self.kind.clone(),
                message: e.to_string(),
            }
        })
    }

    /// Resolve a path declared in the manifest against the manifest's directory
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match self.source.as_deref().and_then(Path::parent) {
            Some(dir) => dir.join(path),
            None => path.to_path_buf(),
        }
    }

    /// Delay the poller waits before probing
    pub fn status_probe_delay(&self) -> Duration {
        Duration::from_millis(self.status_probe_delay_ms)
    }

    /// Display metadata for the action this manifest describes
    pub fn metadata(&self) -> ActionMetadata {
        ActionMetadata {
            identifier: self.identifier.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            groups: self.groups.clone(),
            icon: self.icon.as_deref().map(|icon| self.resolve_path(icon)),
            beta: self.beta,
            source: self.source.clone(),
        }
    }
}

/// Substitute `{key}` placeholders in a template string
pub fn render_template(template: &str, row: &IndexMap<String, String>) -> String {
    row.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{key}}}"), value)
    })
}

fn render_value(value: &Value, row: &IndexMap<String, String>) -> Value {
    match value {
        Value::String(s) => Value::String(render_template(s, row)),
        Value::Sequence(items) => {
            Value::Sequence(items.iter().map(|item| render_value(item, row)).collect())
        }
        Value::Mapping(map) => Value::Mapping(
            map.iter()
                .map(|(k, v)| (k.clone(), render_value(v, row)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAYA: &str = r#"
identifier: maya-{version}
name: Maya {version}
description: Launches Maya {version}
groups: [Applications]
kind: command
program: /opt/autodesk/maya{version}/bin/maya
args: ["-proj", "{version}"]
variants:
  - { version: "2024" }
  - { version: "2025" }
"#;

    #[derive(Debug, Deserialize)]
    struct CommandSettings {
        program: String,
        #[serde(default)]
        args: Vec<String>,
    }

    #[test]
    fn test_parse_manifest() {
        let manifest = ActionManifest::from_yaml(
            "identifier: github\nname: Github\nkind: url\nurl: https://github.com\n",
        )
        .unwrap();

        assert_eq!(manifest.identifier, "github");
        assert!(manifest.groups.is_empty());
        assert!(!manifest.beta);
        assert_eq!(
            manifest.settings.get("url").and_then(Value::as_str),
            Some("https://github.com")
        );
    }

    #[test]
    fn test_missing_identifier_is_rejected() {
        let err = ActionManifest::from_yaml("identifier: ''\nname: X\nkind: url\n").unwrap_err();
        assert!(matches!(err, ManifestError::MissingField("identifier")));
    }

    #[test]
    fn test_variants_expand_per_row() {
        let manifest = ActionManifest::from_yaml(MAYA).unwrap();
        let expanded = manifest.expand().unwrap();

        assert_eq!(expanded.len(), 2);
        assert_eq!(expanded[0].identifier, "maya-2024");
        assert_eq!(expanded[1].name, "Maya 2025");
        assert!(expanded.iter().all(|m| m.variants.is_empty()));

        let settings: CommandSettings = expanded[1].settings().unwrap();
        assert_eq!(settings.program, "/opt/autodesk/maya2025/bin/maya");
        assert_eq!(settings.args, vec!["-proj", "2025"]);
    }

    #[test]
    fn test_variant_without_placeholder_gets_suffix() {
        let manifest = ActionManifest::from_yaml(
            "identifier: tool\nname: Tool {v}\nkind: url\nvariants:\n  - { v: a }\n  - { v: b }\n",
        )
        .unwrap();

        let ids: Vec<_> = manifest
            .expand()
            .unwrap()
            .into_iter()
            .map(|m| m.identifier)
            .collect();
        assert_eq!(ids, vec!["tool-a", "tool-b"]);
    }

    #[test]
    fn test_paths_resolve_against_manifest_directory() {
        let manifest =
            ActionManifest::from_yaml("identifier: a\nname: A\nkind: url\nicon: icons/a.png\n")
                .unwrap()
                .with_source("/plugins/a.yaml");

        assert_eq!(
            manifest.metadata().icon,
            Some(PathBuf::from("/plugins/icons/a.png"))
        );
    }
}
