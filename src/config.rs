use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{PythawError, Result};

/// A user-defined rule declared in configuration.
///
/// Matches by exact dotted-name equality, same as the built-in rules. Codes
/// are assigned in declaration order (`PWC001`, `PWC002`, ...).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CustomRuleConfig {
    /// Fully-qualified dotted name to watch for (e.g. `mylib.create_engine`)
    pub pattern: String,

    /// Message attached to violations of this rule
    pub message: String,
}

/// Project configuration loaded from the `[tool.pythaw]` section of
/// pyproject.toml.
#[derive(Debug, Clone)]
pub struct Config {
    /// Glob patterns matched against top-level function names
    pub handler_patterns: Vec<String>,

    /// Glob patterns excluding files from handler enumeration
    pub exclude: Vec<String>,

    /// Enabled rule codes; `None` enables every rule
    pub select: Option<Vec<String>>,

    /// User-defined rules
    pub custom_rules: Vec<CustomRuleConfig>,

    /// Directory containing pyproject.toml, or the working directory when no
    /// manifest was found. Import resolution is anchored here.
    pub project_root: PathBuf,
}

/// Raw shape of the `[tool.pythaw]` table.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PythawSection {
    handler_patterns: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
    select: Option<Vec<String>>,
    custom_rules: Option<Vec<CustomRuleConfig>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            handler_patterns: vec![
                "handler".to_string(),
                "lambda_handler".to_string(),
                "*_handler".to_string(),
            ],
            exclude: vec![],
            select: None,
            custom_rules: vec![],
            project_root: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Load configuration by searching for pyproject.toml in the current
    /// directory and its parents. Returns defaults when no manifest or no
    /// `[tool.pythaw]` section exists.
    pub fn load() -> Result<Self> {
        let cwd = std::env::current_dir()?;
        Self::load_from(&cwd)
    }

    /// Load configuration starting the pyproject.toml search at *dir*.
    pub fn load_from(dir: &Path) -> Result<Self> {
        match find_pyproject(dir) {
            Some(manifest) => Self::load_manifest(&manifest),
            None => Ok(Self {
                project_root: dir.to_path_buf(),
                ..Self::default()
            }),
        }
    }

    /// Load configuration from a specific pyproject.toml file.
    pub fn load_manifest(manifest: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(manifest)
            .map_err(|e| PythawError::Config(format!("Failed to read {}: {}", manifest.display(), e)))?;
        let data: toml::Value = toml::from_str(&content)
            .map_err(|e| PythawError::Config(format!("Failed to read {}: {}", manifest.display(), e)))?;

        let root = manifest
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let section = data
            .get("tool")
            .and_then(|t| t.get("pythaw"))
            .cloned();

        let section: PythawSection = match section {
            Some(value) => value
                .try_into()
                .map_err(|e| PythawError::Config(format!("Invalid [tool.pythaw] section: {}", e)))?,
            None => PythawSection::default(),
        };

        let defaults = Config::default();
        Ok(Config {
            handler_patterns: section.handler_patterns.unwrap_or(defaults.handler_patterns),
            exclude: section.exclude.unwrap_or_default(),
            select: section.select,
            custom_rules: section.custom_rules.unwrap_or_default(),
            project_root: root,
        })
    }
}

/// Walk up from *dir* looking for pyproject.toml.
fn find_pyproject(dir: &Path) -> Option<PathBuf> {
    let mut current = Some(dir);
    while let Some(d) = current {
        let candidate = d.join("pyproject.toml");
        if candidate.is_file() {
            return Some(candidate);
        }
        current = d.parent();
    }
    None
}
