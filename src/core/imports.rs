use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::resolver::ModuleRef;

/// Where a module reference points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A source file inside the project
    Project(PathBuf),
    /// Third-party or standard-library; traversal stops at this edge
    External,
}

/// Maps `import` references to concrete source files under the project root.
///
/// Results are cached per (importer, reference) so each probe sequence runs
/// once per run.
pub struct ImportResolver {
    root: PathBuf,
    cache: HashMap<(PathBuf, String), Resolution>,
}

impl ImportResolver {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            cache: HashMap::new(),
        }
    }

    /// Resolve *reference* as written in *importer*.
    ///
    /// Absolute references probe `root/a/b/c.py` then `root/a/b/c/__init__.py`;
    /// relative references probe the same layout anchored at *importer*'s
    /// package. Anything else is external.
    pub fn resolve(&mut self, reference: &ModuleRef, importer: &Path) -> Resolution {
        let key = (importer.to_path_buf(), reference.display());
        if let Some(hit) = self.cache.get(&key) {
            return hit.clone();
        }

        let resolution = self.probe(reference, importer);
        if resolution == Resolution::External {
            debug!(
                "Import '{}' in {} is external",
                reference.display(),
                importer.display()
            );
        }
        self.cache.insert(key, resolution.clone());
        resolution
    }

    /// Dotted module name for a project file, derived from its root-relative
    /// path (`infra/aws.py` becomes `infra.aws`, `pkg/__init__.py` becomes
    /// `pkg`). Falls back to the file stem outside the root.
    pub fn module_name(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let mut segments: Vec<String> = relative
            .with_extension("")
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        if segments.last().is_some_and(|s| s == "__init__") {
            segments.pop();
        }
        segments.join(".")
    }

    fn probe(&self, reference: &ModuleRef, importer: &Path) -> Resolution {
        let base = if reference.dots == 0 {
            Some(self.root.clone())
        } else {
            // One dot anchors at the importer's package; each extra dot goes
            // up one level.
            let mut dir = importer.parent().map(Path::to_path_buf);
            for _ in 1..reference.dots {
                dir = dir.as_deref().and_then(Path::parent).map(Path::to_path_buf);
            }
            dir
        };
        let Some(base) = base else {
            return Resolution::External;
        };

        if reference.parts.is_empty() {
            // `from . import x` names the package itself.
            let init = base.join("__init__.py");
            if init.is_file() {
                return Resolution::Project(init);
            }
            return Resolution::External;
        }

        let mut candidate = base;
        for part in &reference.parts {
            candidate.push(part);
        }

        let module_file = candidate.with_extension("py");
        if module_file.is_file() {
            return Resolution::Project(module_file);
        }
        let package_init = candidate.join("__init__.py");
        if package_init.is_file() {
            return Resolution::Project(package_init);
        }

        Resolution::External
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) -> PathBuf {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "").unwrap();
        path
    }

    fn absolute(parts: &[&str]) -> ModuleRef {
        ModuleRef::absolute(parts.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_resolves_module_file() {
        let tmp = TempDir::new().unwrap();
        let aws = touch(tmp.path(), "infra/aws.py");
        let importer = touch(tmp.path(), "h.py");

        let mut resolver = ImportResolver::new(tmp.path());
        assert_eq!(
            resolver.resolve(&absolute(&["infra", "aws"]), &importer),
            Resolution::Project(aws)
        );
    }

    #[test]
    fn test_resolves_package_init() {
        let tmp = TempDir::new().unwrap();
        let init = touch(tmp.path(), "infra/__init__.py");
        let importer = touch(tmp.path(), "h.py");

        let mut resolver = ImportResolver::new(tmp.path());
        assert_eq!(
            resolver.resolve(&absolute(&["infra"]), &importer),
            Resolution::Project(init)
        );
    }

    #[test]
    fn test_module_file_wins_over_package() {
        let tmp = TempDir::new().unwrap();
        let module = touch(tmp.path(), "infra.py");
        touch(tmp.path(), "infra/__init__.py");
        let importer = touch(tmp.path(), "h.py");

        let mut resolver = ImportResolver::new(tmp.path());
        assert_eq!(
            resolver.resolve(&absolute(&["infra"]), &importer),
            Resolution::Project(module)
        );
    }

    #[test]
    fn test_unknown_module_is_external() {
        let tmp = TempDir::new().unwrap();
        let importer = touch(tmp.path(), "h.py");

        let mut resolver = ImportResolver::new(tmp.path());
        assert_eq!(
            resolver.resolve(&absolute(&["boto3"]), &importer),
            Resolution::External
        );
    }

    #[test]
    fn test_relative_imports() {
        let tmp = TempDir::new().unwrap();
        let sibling = touch(tmp.path(), "pkg/sibling.py");
        let shared = touch(tmp.path(), "shared.py");
        let importer = touch(tmp.path(), "pkg/mod.py");

        let mut resolver = ImportResolver::new(tmp.path());
        // from .sibling import x
        assert_eq!(
            resolver.resolve(
                &ModuleRef { dots: 1, parts: vec!["sibling".into()] },
                &importer
            ),
            Resolution::Project(sibling)
        );
        // from ..shared import y
        assert_eq!(
            resolver.resolve(
                &ModuleRef { dots: 2, parts: vec!["shared".into()] },
                &importer
            ),
            Resolution::Project(shared)
        );
    }

    #[test]
    fn test_relative_import_of_package_itself() {
        let tmp = TempDir::new().unwrap();
        let init = touch(tmp.path(), "pkg/__init__.py");
        let importer = touch(tmp.path(), "pkg/mod.py");

        let mut resolver = ImportResolver::new(tmp.path());
        assert_eq!(
            resolver.resolve(&ModuleRef { dots: 1, parts: vec![] }, &importer),
            Resolution::Project(init)
        );
    }

    #[test]
    fn test_module_name_from_path() {
        let tmp = TempDir::new().unwrap();
        let resolver = ImportResolver::new(tmp.path());
        assert_eq!(
            resolver.module_name(&tmp.path().join("infra/aws.py")),
            "infra.aws"
        );
        assert_eq!(
            resolver.module_name(&tmp.path().join("pkg/__init__.py")),
            "pkg"
        );
        assert_eq!(resolver.module_name(&tmp.path().join("h.py")), "h");
    }
}
