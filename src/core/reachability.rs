use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::debug;

use super::finder::Handler;
use super::imports::{ImportResolver, Resolution};
use super::parser::{FileStore, ParseStatus};
use super::resolver::{Binding, ClassBody, FunctionBody, ModuleIndex, ModuleRef};
use super::rules::RuleRegistry;
use super::violation::{CallSite, Diagnostic, DiagnosticKind, Violation};

/// Hop limit when chasing re-exported imports (`from a import f` where `a`
/// itself imports `f` from somewhere else).
const MAX_IMPORT_HOPS: usize = 8;

/// A callee resolved to a concrete project definition.
struct ResolvedFn {
    index: Rc<ModuleIndex>,
    /// Qualified name within the file, e.g. `S3Client.__init__`
    qualified: String,
    body: Rc<FunctionBody>,
}

/// Depth-first traversal of everything reachable from handler entry points,
/// applying rules at every call site and recording the call chain.
///
/// The visited set is keyed by (file, qualified name) and cleared between
/// handlers so that a function shared by two handlers yields violations with
/// each handler's chain. The file store is shared across handlers; no file is
/// parsed twice.
pub struct ReachabilityEngine<'a> {
    store: &'a mut FileStore,
    imports: &'a mut ImportResolver,
    rules: &'a RuleRegistry,
    root: PathBuf,
    violations: Vec<Violation>,
    diagnostics: Vec<Diagnostic>,
    warned_imports: HashSet<(PathBuf, String)>,
    reported_parse_failures: HashSet<PathBuf>,
    visited: HashSet<(PathBuf, String)>,
    chain: Vec<CallSite>,
}

impl<'a> ReachabilityEngine<'a> {
    pub fn new(
        store: &'a mut FileStore,
        imports: &'a mut ImportResolver,
        rules: &'a RuleRegistry,
        root: &Path,
    ) -> Self {
        Self {
            store,
            imports,
            rules,
            root: root.to_path_buf(),
            violations: Vec::new(),
            diagnostics: Vec::new(),
            warned_imports: HashSet::new(),
            reported_parse_failures: HashSet::new(),
            visited: HashSet::new(),
            chain: Vec::new(),
        }
    }

    /// Traverse everything reachable from *handler*, emitting violations in
    /// source order along the way.
    pub fn check_handler(&mut self, handler: &Handler) {
        debug!("Checking handler {} in {}", handler.name, handler.file.display());
        let index = self.store.get_or_index(&handler.file);
        let Some(body) = index.function(&handler.name).cloned() else {
            return;
        };

        self.visited.clear();
        self.chain.clear();
        self.visit_function(&index, &handler.name, &body);
    }

    /// Record a parse-error diagnostic for *index*, once per file.
    pub fn report_parse_failure(&mut self, index: &ModuleIndex) {
        let ParseStatus::Failed { message, line, col } = &index.status else {
            return;
        };
        if self.reported_parse_failures.insert(index.path.clone()) {
            let file = self.display_path(&index.path);
            self.diagnostics.push(Diagnostic {
                kind: DiagnosticKind::ParseError,
                file,
                line: *line,
                col: *col,
                detail: message.clone(),
            });
        }
    }

    pub fn into_results(self) -> (Vec<Violation>, Vec<Diagnostic>) {
        (self.violations, self.diagnostics)
    }

    fn visit_function(&mut self, index: &Rc<ModuleIndex>, qualified: &str, body: &Rc<FunctionBody>) {
        let key = (index.path.clone(), qualified.to_string());
        if !self.visited.insert(key) {
            return;
        }

        let file_display = self.display_path(&index.path);
        for call in &body.calls {
            let Some(parts) = call.parts.as_ref() else {
                continue;
            };

            let qualified_name = self.resolve_qualified(parts, index);
            let matched: Vec<(String, String)> = match &qualified_name {
                Some(name) => self
                    .rules
                    .matching(name)
                    .iter()
                    .map(|r| (r.code().to_string(), r.message().to_string()))
                    .collect(),
                None => Vec::new(),
            };
            for (code, message) in &matched {
                let chain = self.chain.clone();
                self.violations.push(Violation {
                    code: code.clone(),
                    message: message.clone(),
                    file: file_display.clone(),
                    line: call.line,
                    col: call.col,
                    call_chain: chain,
                });
            }

            let target = self.resolve_callee(parts, index, body, qualified, !matched.is_empty());
            if let Some(resolved) = target {
                self.chain.push(CallSite {
                    file: file_display.clone(),
                    line: call.line,
                    col: call.col,
                    name: parts.join("."),
                });
                self.visit_function(&resolved.index, &resolved.qualified, &resolved.body);
                self.chain.pop();
            }
        }
    }

    /// Canonical dotted name of a callee, with the leftmost segment resolved
    /// through the enclosing file's binding map (module aliases become real
    /// module names, imported symbols become module-qualified).
    fn resolve_qualified(&mut self, parts: &[String], index: &Rc<ModuleIndex>) -> Option<String> {
        let head = &parts[0];
        match index.bindings.get(head).cloned() {
            Some(Binding::Module { target, .. }) => {
                let mut segments = target.parts.clone();
                segments.extend(parts[1..].iter().cloned());
                Some(segments.join("."))
            }
            Some(Binding::Symbol { module, name, .. }) => {
                let module_name = self.canonical_module_name(&module, &index.path)?;
                let mut segments = vec![module_name, name];
                segments.extend(parts[1..].iter().cloned());
                Some(segments.join("."))
            }
            Some(Binding::Function) | Some(Binding::Class) => Some(parts.join(".")),
            None => {
                // Names pulled in by `from M import *` resolve as members of
                // the first wildcard source that defines them.
                for source in index.wildcard_sources.clone() {
                    let Resolution::Project(path) = self.imports.resolve(&source, &index.path)
                    else {
                        continue;
                    };
                    let module_index = self.store.get_or_index(&path);
                    if matches!(
                        module_index.bindings.get(head),
                        Some(Binding::Function) | Some(Binding::Class)
                    ) {
                        let mut segments = vec![self.imports.module_name(&path)];
                        segments.extend(parts.iter().cloned());
                        return Some(segments.join("."));
                    }
                }
                None
            }
        }
    }

    /// Dotted name of the module a reference points at; relative references
    /// are named after the file they resolve to.
    fn canonical_module_name(&mut self, module: &ModuleRef, importer: &Path) -> Option<String> {
        if module.dots == 0 {
            return Some(module.parts.join("."));
        }
        match self.imports.resolve(module, importer) {
            Resolution::Project(path) => Some(self.imports.module_name(&path)),
            Resolution::External => None,
        }
    }

    /// Resolve a callee to a concrete project definition, or `None` when the
    /// target is external or cannot be determined statically. External import
    /// targets produce one diagnostic per (importer, module) unless a rule
    /// already matched the call.
    fn resolve_callee(
        &mut self,
        parts: &[String],
        index: &Rc<ModuleIndex>,
        body: &Rc<FunctionBody>,
        current_qualified: &str,
        rule_matched: bool,
    ) -> Option<ResolvedFn> {
        let head = &parts[0];

        // A bare call to a def nested in the current body.
        if parts.len() == 1 {
            if let Some(nested) = body.nested_fn(head) {
                return Some(ResolvedFn {
                    index: Rc::clone(index),
                    qualified: format!("{}.{}", current_qualified, head),
                    body: Rc::clone(nested),
                });
            }
        }

        match index.bindings.get(head).cloned() {
            Some(Binding::Function) => {
                if parts.len() != 1 {
                    return None;
                }
                let body = index.function(head)?;
                Some(ResolvedFn {
                    index: Rc::clone(index),
                    qualified: head.clone(),
                    body: Rc::clone(body),
                })
            }
            Some(Binding::Class) => {
                let class = Rc::clone(index.class(head)?);
                self.resolve_within_class(index, &class, head, &parts[1..])
            }
            Some(Binding::Symbol {
                module,
                name,
                line,
                col,
            }) => {
                let mut names = vec![name];
                names.extend(parts[1..].iter().cloned());
                self.lookup_symbol(index, &module, &names, rule_matched, line, col, 0)
            }
            Some(Binding::Module { target, line, col }) => {
                let mut full = target.parts.clone();
                full.extend(parts[1..].iter().cloned());
                self.resolve_module_attr(&index.path, &full, rule_matched, line, col, 0)
            }
            None => {
                // `obj.method()` where `obj = SomeClass(...)` earlier in this
                // body resolves to that class's method.
                if parts.len() == 2 {
                    if let Some(class_name) = body.assigns.get(head).cloned() {
                        let mut class_parts: Vec<String> =
                            class_name.split('.').map(|s| s.to_string()).collect();
                        class_parts.push(parts[1].clone());
                        // Only follow when the assignment names something
                        // other than the variable itself.
                        if class_parts.first() != Some(head) {
                            return self.resolve_callee(
                                &class_parts,
                                index,
                                body,
                                current_qualified,
                                rule_matched,
                            );
                        }
                    }
                }

                // Probe wildcard-import sources for the name, one hop.
                for source in index.wildcard_sources.clone() {
                    let Resolution::Project(path) = self.imports.resolve(&source, &index.path)
                    else {
                        continue;
                    };
                    let module_index = self.store.get_or_index(&path);
                    if matches!(
                        module_index.bindings.get(head),
                        Some(Binding::Function) | Some(Binding::Class)
                    ) {
                        return self.lookup_in_module(&module_index, parts, rule_matched, 0);
                    }
                }
                None
            }
        }
    }

    /// Resolve `module.attr...` by probing the longest module prefix that is
    /// a project file, then looking the remaining segments up inside it.
    fn resolve_module_attr(
        &mut self,
        importer: &Path,
        full: &[String],
        rule_matched: bool,
        line: usize,
        col: usize,
        hops: usize,
    ) -> Option<ResolvedFn> {
        if full.len() < 2 {
            return None;
        }
        for split in (1..full.len()).rev() {
            let reference = ModuleRef::absolute(full[..split].to_vec());
            if let Resolution::Project(path) = self.imports.resolve(&reference, importer) {
                return self.lookup_in_module_file(&path, &full[split..], rule_matched, hops);
            }
        }
        if !rule_matched {
            self.warn_unresolved(importer, &full[..full.len() - 1].join("."), line, col);
        }
        None
    }

    /// Resolve `from M import X` style access: find M, then look names up
    /// inside it, falling back to `M.X` as a submodule.
    #[allow(clippy::too_many_arguments)]
    fn lookup_symbol(
        &mut self,
        importer_index: &Rc<ModuleIndex>,
        module: &ModuleRef,
        names: &[String],
        rule_matched: bool,
        line: usize,
        col: usize,
        hops: usize,
    ) -> Option<ResolvedFn> {
        match self.imports.resolve(module, &importer_index.path) {
            Resolution::External => {
                if !rule_matched {
                    self.warn_unresolved(&importer_index.path, &module.display(), line, col);
                }
                None
            }
            Resolution::Project(path) => {
                if let Some(found) = self.lookup_in_module_file(&path, names, rule_matched, hops) {
                    return Some(found);
                }
                // `from pkg import mod` where `mod` is a submodule rather
                // than a symbol of pkg/__init__.py.
                let submodule = module.join(&names[..1]);
                if names.len() > 1 {
                    if let Resolution::Project(subpath) =
                        self.imports.resolve(&submodule, &importer_index.path)
                    {
                        return self.lookup_in_module_file(
                            &subpath,
                            &names[1..],
                            rule_matched,
                            hops,
                        );
                    }
                }
                None
            }
        }
    }

    /// Index *path* and look *names* up inside it. A file that fails to parse
    /// is reported once and treated as an unresolvable edge.
    fn lookup_in_module_file(
        &mut self,
        path: &Path,
        names: &[String],
        rule_matched: bool,
        hops: usize,
    ) -> Option<ResolvedFn> {
        let index = self.store.get_or_index(path);
        if matches!(index.status, ParseStatus::Failed { .. }) {
            self.report_parse_failure(&index);
            return None;
        }
        self.lookup_in_module(&index, names, rule_matched, hops)
    }

    fn lookup_in_module(
        &mut self,
        index: &Rc<ModuleIndex>,
        names: &[String],
        rule_matched: bool,
        hops: usize,
    ) -> Option<ResolvedFn> {
        let head = &names[0];
        match index.bindings.get(head).cloned() {
            Some(Binding::Function) => {
                if names.len() != 1 {
                    return None;
                }
                let body = index.function(head)?;
                Some(ResolvedFn {
                    index: Rc::clone(index),
                    qualified: head.clone(),
                    body: Rc::clone(body),
                })
            }
            Some(Binding::Class) => {
                let class = Rc::clone(index.class(head)?);
                self.resolve_within_class(index, &class, head, &names[1..])
            }
            Some(Binding::Symbol {
                module,
                name,
                line,
                col,
            }) => {
                // Re-exported symbol; chase it with a hop limit.
                if hops >= MAX_IMPORT_HOPS {
                    return None;
                }
                let mut chased = vec![name];
                chased.extend(names[1..].iter().cloned());
                self.lookup_symbol(index, &module, &chased, rule_matched, line, col, hops + 1)
            }
            Some(Binding::Module { target, line, col }) => {
                let mut full = target.parts.clone();
                full.extend(names[1..].iter().cloned());
                self.resolve_module_attr(&index.path, &full, rule_matched, line, col, hops)
            }
            None => None,
        }
    }

    /// Constructor and method resolution on a class: `Cls()` visits
    /// `Cls.__init__`, `Cls.method` visits the method, one level of nested
    /// classes is reachable through attribute access.
    fn resolve_within_class(
        &mut self,
        index: &Rc<ModuleIndex>,
        class: &Rc<ClassBody>,
        class_qualified: &str,
        rest: &[String],
    ) -> Option<ResolvedFn> {
        match rest.len() {
            0 => class.method("__init__").map(|body| ResolvedFn {
                index: Rc::clone(index),
                qualified: format!("{}.__init__", class_qualified),
                body: Rc::clone(body),
            }),
            1 => {
                if let Some(method) = class.method(&rest[0]) {
                    return Some(ResolvedFn {
                        index: Rc::clone(index),
                        qualified: format!("{}.{}", class_qualified, rest[0]),
                        body: Rc::clone(method),
                    });
                }
                let inner = class.nested_class(&rest[0])?;
                let inner = Rc::clone(inner);
                self.resolve_within_class(
                    index,
                    &inner,
                    &format!("{}.{}", class_qualified, rest[0]),
                    &[],
                )
            }
            2 => {
                let inner = Rc::clone(class.nested_class(&rest[0])?);
                self.resolve_within_class(
                    index,
                    &inner,
                    &format!("{}.{}", class_qualified, rest[0]),
                    &rest[1..],
                )
            }
            _ => None,
        }
    }

    fn warn_unresolved(&mut self, file: &Path, module: &str, line: usize, col: usize) {
        let key = (file.to_path_buf(), module.to_string());
        if self.warned_imports.insert(key) {
            let display = self.display_path(file);
            self.diagnostics.push(Diagnostic {
                kind: DiagnosticKind::UnresolvedImport,
                file: display,
                line,
                col,
                detail: format!("Cannot resolve import '{}'", module),
            });
        }
    }

    fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) -> PathBuf {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    fn run_handler(
        root: &Path,
        file: &Path,
        name: &str,
    ) -> (Vec<Violation>, Vec<Diagnostic>) {
        let mut store = FileStore::new().unwrap();
        let mut imports = ImportResolver::new(root);
        let rules = RuleRegistry::from_config(&Config::default()).unwrap();
        let mut engine = ReachabilityEngine::new(&mut store, &mut imports, &rules, root);
        engine.check_handler(&Handler {
            file: file.to_path_buf(),
            name: name.to_string(),
            line: 1,
            col: 0,
        });
        engine.into_results()
    }

    #[test]
    fn test_direct_violation_in_handler() {
        let tmp = TempDir::new().unwrap();
        let h = write(
            tmp.path(),
            "h.py",
            "import boto3\ndef lambda_handler(event, context):\n    c = boto3.client(\"s3\")\n    return c\n",
        );

        let (violations, diagnostics) = run_handler(tmp.path(), &h, "lambda_handler");
        assert_eq!(violations.len(), 1);
        let v = &violations[0];
        assert_eq!(v.code, "PW001");
        assert_eq!(v.file, "h.py");
        assert_eq!(v.line, 3);
        assert_eq!(v.col, 8);
        assert!(v.call_chain.is_empty());
        // The matched call does not also warn about boto3 being external.
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_indirect_violation_through_class() {
        let tmp = TempDir::new().unwrap();
        let h = write(
            tmp.path(),
            "h.py",
            "from infra.aws import S3Client\ndef handler(e, x):\n    return S3Client().get()\n",
        );
        write(
            tmp.path(),
            "infra/aws.py",
            "import boto3\nclass S3Client:\n    def __init__(self):\n        self.c = boto3.client(\"s3\")\n    def get(self): return self.c\n",
        );

        let (violations, _) = run_handler(tmp.path(), &h, "handler");
        assert_eq!(violations.len(), 1);
        let v = &violations[0];
        assert_eq!(v.code, "PW001");
        assert_eq!(v.file, "infra/aws.py");
        assert_eq!(v.line, 4);
        assert_eq!(v.col, 17);
        assert_eq!(
            v.call_chain,
            vec![CallSite {
                file: "h.py".into(),
                line: 3,
                col: 11,
                name: "S3Client".into(),
            }]
        );
    }

    #[test]
    fn test_alias_resolves_to_real_module_name() {
        let tmp = TempDir::new().unwrap();
        let h = write(
            tmp.path(),
            "h.py",
            "import boto3 as b3\ndef handler(e, x):\n    return b3.client(\"s3\")\n",
        );

        let (violations, _) = run_handler(tmp.path(), &h, "handler");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code, "PW001");
    }

    #[test]
    fn test_from_import_symbol_resolves() {
        let tmp = TempDir::new().unwrap();
        let h = write(
            tmp.path(),
            "h.py",
            "from boto3 import client\ndef handler(e, x):\n    return client(\"s3\")\n",
        );

        let (violations, _) = run_handler(tmp.path(), &h, "handler");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code, "PW001");
    }

    #[test]
    fn test_cross_file_cycle_terminates() {
        let tmp = TempDir::new().unwrap();
        let a = write(
            tmp.path(),
            "a.py",
            "from b import f\nimport boto3\ndef handler(e, x):\n    f()\ndef g():\n    boto3.client(\"s3\")\n    f()\n",
        );
        write(tmp.path(), "b.py", "from a import g\ndef f():\n    g()\n");

        let (violations, _) = run_handler(tmp.path(), &a, "handler");
        // handler -> f -> g; g -> f is pruned by the visited set.
        assert_eq!(violations.len(), 1);
        let v = &violations[0];
        assert_eq!(v.file, "a.py");
        let names: Vec<_> = v.call_chain.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["f", "g"]);
    }

    #[test]
    fn test_self_recursive_handler_terminates() {
        let tmp = TempDir::new().unwrap();
        let h = write(
            tmp.path(),
            "h.py",
            "def handler(e, x):\n    handler(e, x)\n",
        );
        let (violations, diagnostics) = run_handler(tmp.path(), &h, "handler");
        assert!(violations.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_unresolved_import_warns_once() {
        let tmp = TempDir::new().unwrap();
        let h = write(
            tmp.path(),
            "h.py",
            "import boto3\nimport some_thirdparty\ndef handler(e, x):\n    boto3.client(\"s3\")\n    some_thirdparty.foo()\n    some_thirdparty.bar()\n",
        );

        let (violations, diagnostics) = run_handler(tmp.path(), &h, "handler");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code, "PW001");
        // boto3 was rule-matched, so only some_thirdparty warns, and only once.
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::UnresolvedImport);
        assert!(diagnostics[0].detail.contains("some_thirdparty"));
    }

    #[test]
    fn test_nested_def_traversed_only_when_called() {
        let tmp = TempDir::new().unwrap();
        let h = write(
            tmp.path(),
            "h.py",
            "import boto3\ndef handler(e, x):\n    def used():\n        boto3.client(\"s3\")\n    def unused():\n        boto3.resource(\"s3\")\n    used()\n",
        );

        let (violations, _) = run_handler(tmp.path(), &h, "handler");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code, "PW001");
        let names: Vec<_> = violations[0].call_chain.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["used"]);
    }

    #[test]
    fn test_instance_method_resolution() {
        let tmp = TempDir::new().unwrap();
        let h = write(
            tmp.path(),
            "h.py",
            "from infra.aws import Provider\ndef handler(e, x):\n    p = Provider()\n    return p.connect()\n",
        );
        write(
            tmp.path(),
            "infra/aws.py",
            "import pymysql\nclass Provider:\n    def connect(self):\n        return pymysql.connect(host=\"db\")\n",
        );

        let (violations, _) = run_handler(tmp.path(), &h, "handler");
        let codes: Vec<_> = violations.iter().map(|v| v.code.as_str()).collect();
        assert_eq!(codes, vec!["PW004"]);
        let names: Vec<_> = violations[0].call_chain.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["p.connect"]);
    }

    #[test]
    fn test_wildcard_import_probes_project_module() {
        let tmp = TempDir::new().unwrap();
        let h = write(
            tmp.path(),
            "h.py",
            "from shared.clients import *\ndef handler(e, x):\n    return make_client()\n",
        );
        write(
            tmp.path(),
            "shared/clients.py",
            "import boto3\ndef make_client():\n    return boto3.client(\"s3\")\n",
        );

        let (violations, _) = run_handler(tmp.path(), &h, "handler");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code, "PW001");
        assert_eq!(violations[0].file, "shared/clients.py");
    }

    #[test]
    fn test_reexport_chase() {
        let tmp = TempDir::new().unwrap();
        let h = write(
            tmp.path(),
            "h.py",
            "from facade import build\ndef handler(e, x):\n    return build()\n",
        );
        write(tmp.path(), "facade.py", "from impl import build\n");
        write(
            tmp.path(),
            "impl.py",
            "import httpx\ndef build():\n    return httpx.Client()\n",
        );

        let (violations, _) = run_handler(tmp.path(), &h, "handler");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code, "PW008");
        assert_eq!(violations[0].file, "impl.py");
    }

    #[test]
    fn test_unknown_callee_is_silent() {
        let tmp = TempDir::new().unwrap();
        let h = write(
            tmp.path(),
            "h.py",
            "def handler(e, x):\n    does_not_exist()\n",
        );
        let (violations, diagnostics) = run_handler(tmp.path(), &h, "handler");
        assert!(violations.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_parse_failure_of_import_target() {
        let tmp = TempDir::new().unwrap();
        let h = write(
            tmp.path(),
            "h.py",
            "from util import helper\ndef handler(e, x):\n    helper()\n",
        );
        write(tmp.path(), "util.py", "def helper(:\n    pass\n");

        let (violations, diagnostics) = run_handler(tmp.path(), &h, "handler");
        assert!(violations.is_empty());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::ParseError);
        assert_eq!(diagnostics[0].file, "util.py");
    }

    #[test]
    fn test_visited_set_resets_between_handlers() {
        let tmp = TempDir::new().unwrap();
        let h = write(
            tmp.path(),
            "h.py",
            "from util import shared\ndef first_handler(e, x):\n    shared()\ndef second_handler(e, x):\n    shared()\n",
        );
        write(
            tmp.path(),
            "util.py",
            "import redis\ndef shared():\n    return redis.Redis(host=\"cache\")\n",
        );

        let mut store = FileStore::new().unwrap();
        let mut imports = ImportResolver::new(tmp.path());
        let rules = RuleRegistry::from_config(&Config::default()).unwrap();
        let mut engine = ReachabilityEngine::new(&mut store, &mut imports, &rules, tmp.path());
        for name in ["first_handler", "second_handler"] {
            engine.check_handler(&Handler {
                file: h.clone(),
                name: name.to_string(),
                line: 1,
                col: 0,
            });
        }
        let (violations, _) = engine.into_results();
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].call_chain[0].line, 3);
        assert_eq!(violations[1].call_chain[0].line, 5);
    }
}
