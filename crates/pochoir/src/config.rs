//! Configuration file loading for pochoir.
//!
//! Reads `pochoir.config.json` from the project root. Every field is
//! optional; command-line flags override whatever the file says.

use std::path::{Path, PathBuf};

use pochoir_atelier_style::TraversalMode;
use pochoir_atelier_template::TemplateMode;
use pochoir_carton::NamingScheme;
use serde::{Deserialize, Serialize};

use crate::error::{BuildError, BuildResult};

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "pochoir.config.json";

/// Styles root used when the config does not name one
pub const DEFAULT_STYLES_ROOT: &str = "app";

/// Top-level pochoir configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PochoirConfig {
    /// JSON Schema reference (for editor autocompletion).
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Namespace qualifying every module path. Defaults to the `name` in
    /// `package.json`, then to the project directory name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Directory holding style modules and templates, relative to the
    /// project root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub styles_root: Option<PathBuf>,

    pub naming_scheme: NamingScheme,

    pub traversal: TraversalMode,

    pub template_mode: TemplateMode,

    /// Accept import aliases outside `[A-Za-z0-9.-]+`.
    pub skip_alias_validation: bool,
}

impl PochoirConfig {
    /// Absolute styles root for a project at `root`.
    pub fn styles_root(&self, root: &Path) -> PathBuf {
        root.join(
            self.styles_root
                .as_deref()
                .unwrap_or_else(|| Path::new(DEFAULT_STYLES_ROOT)),
        )
    }

    /// Namespace for a project at `root`.
    pub fn namespace(&self, root: &Path) -> String {
        if let Some(namespace) = &self.namespace {
            return namespace.clone();
        }
        if let Some(name) = package_name(root) {
            return name;
        }
        root.canonicalize()
            .ok()
            .as_deref()
            .unwrap_or(root)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "app".to_string())
    }
}

/// Read `pochoir.config.json` from `dir`. A missing file is the default config.
pub fn try_load_config(dir: &Path) -> BuildResult<PochoirConfig> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        return Ok(PochoirConfig::default());
    }

    let content = std::fs::read_to_string(&config_path).map_err(|source| BuildError::Read {
        path: config_path.clone(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| BuildError::Config {
        path: config_path,
        source,
    })
}

/// Load `pochoir.config.json` from `dir`, falling back to the defaults with
/// a warning when the file cannot be read or parsed.
pub fn load_config(dir: &Path) -> PochoirConfig {
    match try_load_config(dir) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("{}; using the default configuration", e);
            PochoirConfig::default()
        }
    }
}

#[derive(Deserialize)]
struct PackageJson {
    name: Option<String>,
}

/// `name` of the `package.json` in `root`, if any.
fn package_name(root: &Path) -> Option<String> {
    let content = std::fs::read_to_string(root.join("package.json")).ok()?;
    let package: PackageJson = serde_json::from_str(&content).ok()?;
    package.name.filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_config(dir.path()), PochoirConfig::default());
    }

    #[test]
    fn test_parse_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{
  "namespace": "my-app",
  "stylesRoot": "src",
  "namingScheme": "prefixed",
  "traversal": "deep",
  "templateMode": "scanner",
  "skipAliasValidation": true
}"#,
        )
        .unwrap();

        let config = load_config(dir.path());
        assert_eq!(config.namespace.as_deref(), Some("my-app"));
        assert_eq!(config.styles_root(dir.path()), dir.path().join("src"));
        assert_eq!(config.naming_scheme, NamingScheme::Prefixed);
        assert_eq!(config.traversal, TraversalMode::Deep);
        assert_eq!(config.template_mode, TemplateMode::Scanner);
        assert!(config.skip_alias_validation);
    }

    #[test]
    fn test_invalid_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{ "namingScheme": "fancy" }"#,
        )
        .unwrap();

        assert!(matches!(try_load_config(dir.path()), Err(BuildError::Config { .. })));
        assert_eq!(load_config(dir.path()), PochoirConfig::default());
    }

    #[test]
    fn test_namespace_fallbacks() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("my-project");
        std::fs::create_dir(&project).unwrap();

        let config = PochoirConfig::default();
        assert_eq!(config.namespace(&project), "my-project");
        assert_eq!(config.styles_root(&project), project.join("app"));

        std::fs::write(project.join("package.json"), r#"{ "name": "my-app" }"#).unwrap();
        assert_eq!(config.namespace(&project), "my-app");

        let config = PochoirConfig {
            namespace: Some("explicit".to_string()),
            ..Default::default()
        };
        assert_eq!(config.namespace(&project), "explicit");
    }
}
