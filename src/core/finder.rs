use std::collections::HashSet;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::debug;

use crate::config::Config;
use super::resolver::ModuleIndex;

/// A handler entry point discovered in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handler {
    pub file: PathBuf,
    pub name: String,
    /// 1-indexed line of the `def`
    pub line: usize,
    /// 0-indexed column of the `def`
    pub col: usize,
}

/// Enumerates Python files and handler entry points under the target paths.
///
/// `exclude` patterns restrict handler enumeration only; the reachability
/// engine may still follow imports into excluded files.
pub struct HandlerFinder<'a> {
    config: &'a Config,
}

impl<'a> HandlerFinder<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Collect `*.py` files under *targets*, honoring gitignore and the
    /// configured exclude patterns. A file target is returned directly with
    /// no filtering. The result is sorted and de-duplicated so enumeration
    /// order is stable.
    pub fn collect_files(&self, targets: &[PathBuf]) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();

        for target in targets {
            // Resolve the target so collected paths line up with the project
            // root when the user passes relative paths.
            let target = target.canonicalize().unwrap_or_else(|_| target.clone());
            if target.is_file() {
                if seen.insert(target.clone()) {
                    files.push(target.clone());
                }
                continue;
            }
            if !target.is_dir() {
                debug!("Skipping missing target {}", target.display());
                continue;
            }

            let walker = WalkBuilder::new(&target).hidden(false).build();
            for entry in walker.flatten() {
                let path = entry.path();
                if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("py") {
                    continue;
                }
                if self.is_excluded(path, &target) {
                    continue;
                }
                let path = path.to_path_buf();
                if seen.insert(path.clone()) {
                    files.push(path);
                }
            }
        }

        files.sort();
        files
    }

    /// Top-level functions of *index* whose name matches a handler pattern,
    /// in source order.
    pub fn extract_handlers(&self, index: &ModuleIndex) -> Vec<Handler> {
        index
            .functions()
            .iter()
            .filter(|f| self.is_handler_name(&f.name))
            .map(|f| Handler {
                file: index.path.clone(),
                name: f.name.clone(),
                line: f.line,
                col: f.col,
            })
            .collect()
    }

    pub fn is_handler_name(&self, name: &str) -> bool {
        self.config
            .handler_patterns
            .iter()
            .any(|pattern| glob_match::glob_match(pattern, name))
    }

    /// Each component of the path relative to *base* is tested individually
    /// so a pattern like `tests` matches a directory at any depth; the whole
    /// relative path is also tested to support patterns like `tests/*.py`.
    fn is_excluded(&self, file: &Path, base: &Path) -> bool {
        let Ok(relative) = file.strip_prefix(base) else {
            return false;
        };
        let relative_str = relative.to_string_lossy();

        self.config.exclude.iter().any(|pattern| {
            relative
                .components()
                .any(|part| glob_match::glob_match(pattern, &part.as_os_str().to_string_lossy()))
                || glob_match::glob_match(pattern, &relative_str)
        })
    }
}
