use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tree_sitter::{Node, Tree};

use super::parser::ParseStatus;

/// Reference to a module as written in an import statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleRef {
    /// Leading dots for relative imports (0 = absolute)
    pub dots: usize,
    /// Dotted path segments after the dots
    pub parts: Vec<String>,
}

impl ModuleRef {
    pub fn absolute(parts: Vec<String>) -> Self {
        Self { dots: 0, parts }
    }

    /// The reference as written, e.g. `boto3` or `..infra.aws`.
    pub fn display(&self) -> String {
        format!("{}{}", ".".repeat(self.dots), self.parts.join("."))
    }

    /// Extend with additional trailing segments.
    pub fn join(&self, extra: &[String]) -> Self {
        let mut parts = self.parts.clone();
        parts.extend(extra.iter().cloned());
        Self {
            dots: self.dots,
            parts,
        }
    }
}

/// What a file-top-level name is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// Top-level `def`
    Function,
    /// Top-level `class`
    Class,
    /// `import M`, `import M as N`, `import M.sub`
    Module {
        target: ModuleRef,
        line: usize,
        col: usize,
    },
    /// `from M import X` (and `as Y`)
    Symbol {
        module: ModuleRef,
        name: String,
        line: usize,
        col: usize,
    },
}

/// A call expression inside a function body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallExpr {
    /// Dotted callee segments when the callee is a plain dotted name
    /// (`boto3.client`, `obj.method`, `f`); `None` for anything else
    pub parts: Option<Vec<String>>,
    /// 1-indexed line of the call expression
    pub line: usize,
    /// 0-indexed column of the call expression
    pub col: usize,
}

impl CallExpr {
    /// The callee as written, for call-chain display.
    pub fn written(&self) -> String {
        self.parts
            .as_ref()
            .map(|p| p.join("."))
            .unwrap_or_default()
    }
}

/// A function definition with its extracted body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionBody {
    pub name: String,
    /// 1-indexed line of the `def`
    pub line: usize,
    /// 0-indexed column of the `def`
    pub col: usize,
    /// Call expressions in source order, nested `def`/`class` bodies excluded
    pub calls: Vec<CallExpr>,
    /// Local `var = Callee(...)` assignments: variable name to dotted callee
    pub assigns: HashMap<String, String>,
    /// Directly nested `def`s; traversed only when actually called
    pub nested: Vec<Rc<FunctionBody>>,
}

impl FunctionBody {
    pub fn nested_fn(&self, name: &str) -> Option<&Rc<FunctionBody>> {
        self.nested.iter().find(|f| f.name == name)
    }
}

/// A class definition with its methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassBody {
    pub name: String,
    pub line: usize,
    pub col: usize,
    pub methods: Vec<Rc<FunctionBody>>,
    /// Classes nested one level inside this class
    pub nested_classes: Vec<Rc<ClassBody>>,
}

impl ClassBody {
    pub fn method(&self, name: &str) -> Option<&Rc<FunctionBody>> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn nested_class(&self, name: &str) -> Option<&Rc<ClassBody>> {
        self.nested_classes.iter().find(|c| c.name == name)
    }
}

/// Per-file name resolution result: the binding map plus every top-level
/// definition with its extracted body.
///
/// Owns plain data only; Tree-sitter nodes do not escape this module.
#[derive(Debug)]
pub struct ModuleIndex {
    pub path: PathBuf,
    pub status: ParseStatus,
    pub bindings: HashMap<String, Binding>,
    /// Modules named in `from M import *`, probed for otherwise-unknown names
    pub wildcard_sources: Vec<ModuleRef>,
    functions: Vec<Rc<FunctionBody>>,
    classes: Vec<Rc<ClassBody>>,
}

impl ModuleIndex {
    /// Placeholder index for a file that could not be read or parsed.
    pub fn failed(path: &Path, message: String, line: usize, col: usize) -> Self {
        Self {
            path: path.to_path_buf(),
            status: ParseStatus::Failed { message, line, col },
            bindings: HashMap::new(),
            wildcard_sources: Vec::new(),
            functions: Vec::new(),
            classes: Vec::new(),
        }
    }

    /// Top-level functions in source order.
    pub fn functions(&self) -> &[Rc<FunctionBody>] {
        &self.functions
    }

    pub fn function(&self, name: &str) -> Option<&Rc<FunctionBody>> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn class(&self, name: &str) -> Option<&Rc<ClassBody>> {
        self.classes.iter().find(|c| c.name == name)
    }
}

/// Build the binding map and definition bodies for one parsed file.
pub fn index_module(path: &Path, tree: &Tree, source: &str) -> ModuleIndex {
    let mut index = ModuleIndex {
        path: path.to_path_buf(),
        status: ParseStatus::Ok,
        bindings: HashMap::new(),
        wildcard_sources: Vec::new(),
        functions: Vec::new(),
        classes: Vec::new(),
    };

    let root = tree.root_node();
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        index_top_level(child, source, &mut index);
    }

    index
}

fn index_top_level(node: Node, source: &str, index: &mut ModuleIndex) {
    match node.kind() {
        "function_definition" => {
            let function = build_function(node, source);
            index
                .bindings
                .insert(function.name.clone(), Binding::Function);
            index.functions.push(function);
        }
        "class_definition" => {
            let class = build_class(node, source);
            index.bindings.insert(class.name.clone(), Binding::Class);
            index.classes.push(class);
        }
        "decorated_definition" => {
            if let Some(inner) = node.child_by_field_name("definition") {
                index_top_level(inner, source, index);
            }
        }
        "import_statement" => index_import(node, source, index),
        "import_from_statement" => index_import_from(node, source, index),
        _ => {}
    }
}

/// `import M`, `import M as N`, `import M.sub`, comma-separated.
fn index_import(node: Node, source: &str, index: &mut ModuleIndex) {
    let pos = node.start_position();
    let (line, col) = (pos.row + 1, pos.column);

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "dotted_name" => {
                // `import a.b.c` binds `a`; the tail is reached through
                // attribute access at call sites.
                let parts = dotted_name_parts(child, source);
                if let Some(first) = parts.first() {
                    index.bindings.insert(
                        first.clone(),
                        Binding::Module {
                            target: ModuleRef::absolute(vec![first.clone()]),
                            line,
                            col,
                        },
                    );
                }
            }
            "aliased_import" => {
                // `import a.b as ab` binds the alias to the full path.
                let name = child.child_by_field_name("name");
                let alias = child.child_by_field_name("alias");
                if let (Some(name), Some(alias)) = (name, alias) {
                    let parts = dotted_name_parts(name, source);
                    index.bindings.insert(
                        node_text(alias, source),
                        Binding::Module {
                            target: ModuleRef::absolute(parts),
                            line,
                            col,
                        },
                    );
                }
            }
            _ => {}
        }
    }
}

/// `from M import X, Y as Z`, `from . import x`, `from M import *`.
fn index_import_from(node: Node, source: &str, index: &mut ModuleIndex) {
    let pos = node.start_position();
    let (line, col) = (pos.row + 1, pos.column);

    let Some(module_node) = node.child_by_field_name("module_name") else {
        return;
    };
    let module = match module_node.kind() {
        "dotted_name" => ModuleRef::absolute(dotted_name_parts(module_node, source)),
        "relative_import" => relative_module_ref(module_node, source),
        _ => return,
    };

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "wildcard_import" {
            index.wildcard_sources.push(module.clone());
        }
    }

    let mut cursor = node.walk();
    for child in node.children_by_field_name("name", &mut cursor) {
        match child.kind() {
            "dotted_name" => {
                let parts = dotted_name_parts(child, source);
                if let Some(name) = parts.first() {
                    index.bindings.insert(
                        name.clone(),
                        Binding::Symbol {
                            module: module.clone(),
                            name: name.clone(),
                            line,
                            col,
                        },
                    );
                }
            }
            "aliased_import" => {
                let name = child.child_by_field_name("name");
                let alias = child.child_by_field_name("alias");
                if let (Some(name), Some(alias)) = (name, alias) {
                    let parts = dotted_name_parts(name, source);
                    if let Some(symbol) = parts.first() {
                        index.bindings.insert(
                            node_text(alias, source),
                            Binding::Symbol {
                                module: module.clone(),
                                name: symbol.clone(),
                                line,
                                col,
                            },
                        );
                    }
                }
            }
            _ => {}
        }
    }
}

/// Parse a `relative_import` node (`.`, `..pkg`, `.mod`).
fn relative_module_ref(node: Node, source: &str) -> ModuleRef {
    let mut dots = 0;
    let mut parts = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "import_prefix" => {
                dots = node_text(child, source).chars().filter(|c| *c == '.').count();
            }
            "dotted_name" => {
                parts = dotted_name_parts(child, source);
            }
            _ => {}
        }
    }
    ModuleRef { dots, parts }
}

fn build_function(node: Node, source: &str) -> Rc<FunctionBody> {
    let name = node
        .child_by_field_name("name")
        .map(|n| node_text(n, source))
        .unwrap_or_default();
    let pos = node.start_position();

    let mut calls = Vec::new();
    let mut assigns = HashMap::new();
    let mut nested = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        collect_body(body, source, &mut calls, &mut assigns, &mut nested);
    }

    Rc::new(FunctionBody {
        name,
        line: pos.row + 1,
        col: pos.column,
        calls,
        assigns,
        nested,
    })
}

fn build_class(node: Node, source: &str) -> Rc<ClassBody> {
    let name = node
        .child_by_field_name("name")
        .map(|n| node_text(n, source))
        .unwrap_or_default();
    let pos = node.start_position();

    let mut methods = Vec::new();
    let mut nested_classes = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            collect_class_member(child, source, &mut methods, &mut nested_classes);
        }
    }

    Rc::new(ClassBody {
        name,
        line: pos.row + 1,
        col: pos.column,
        methods,
        nested_classes,
    })
}

fn collect_class_member(
    node: Node,
    source: &str,
    methods: &mut Vec<Rc<FunctionBody>>,
    nested_classes: &mut Vec<Rc<ClassBody>>,
) {
    match node.kind() {
        "function_definition" => methods.push(build_function(node, source)),
        "class_definition" => nested_classes.push(build_class(node, source)),
        "decorated_definition" => {
            if let Some(inner) = node.child_by_field_name("definition") {
                collect_class_member(inner, source, methods, nested_classes);
            }
        }
        _ => {}
    }
}

/// Walk a function body in document order, collecting call expressions and
/// simple `var = Callee(...)` assignments. Nested `def` bodies are recorded
/// separately rather than folded into the parent; defining a function does
/// not execute it. Nested `class` bodies are skipped for the same reason.
fn collect_body(
    node: Node,
    source: &str,
    calls: &mut Vec<CallExpr>,
    assigns: &mut HashMap<String, String>,
    nested: &mut Vec<Rc<FunctionBody>>,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "function_definition" => {
                nested.push(build_function(child, source));
            }
            "class_definition" | "lambda" => {}
            "decorated_definition" => {
                if let Some(inner) = child.child_by_field_name("definition") {
                    if inner.kind() == "function_definition" {
                        nested.push(build_function(inner, source));
                    }
                }
            }
            "call" => {
                let pos = child.start_position();
                let parts = child
                    .child_by_field_name("function")
                    .and_then(|f| dotted_parts(f, source));
                calls.push(CallExpr {
                    parts,
                    line: pos.row + 1,
                    col: pos.column,
                });
                // Arguments and attribute bases may contain further calls.
                collect_body(child, source, calls, assigns, nested);
            }
            "assignment" => {
                record_assignment(child, source, assigns);
                collect_body(child, source, calls, assigns, nested);
            }
            _ => {
                collect_body(child, source, calls, assigns, nested);
            }
        }
    }
}

/// Track `var = Callee(...)` so that `var.method()` can later resolve to the
/// class the variable was instantiated from.
fn record_assignment(node: Node, source: &str, assigns: &mut HashMap<String, String>) {
    let Some(left) = node.child_by_field_name("left") else {
        return;
    };
    if left.kind() != "identifier" {
        return;
    }
    let Some(right) = node.child_by_field_name("right") else {
        return;
    };
    if right.kind() != "call" {
        return;
    }
    let Some(parts) = right
        .child_by_field_name("function")
        .and_then(|f| dotted_parts(f, source))
    else {
        return;
    };
    assigns.insert(node_text(left, source), parts.join("."));
}

/// Flatten `a.b.c` callee expressions into segments; anything that is not a
/// chain of identifiers (subscripts, calls, literals) yields `None`.
fn dotted_parts(node: Node, source: &str) -> Option<Vec<String>> {
    match node.kind() {
        "identifier" => Some(vec![node_text(node, source)]),
        "attribute" => {
            let object = node.child_by_field_name("object")?;
            let attribute = node.child_by_field_name("attribute")?;
            let mut parts = dotted_parts(object, source)?;
            parts.push(node_text(attribute, source));
            Some(parts)
        }
        _ => None,
    }
}

fn dotted_name_parts(node: Node, source: &str) -> Vec<String> {
    node_text(node, source)
        .split('.')
        .map(|s| s.to_string())
        .collect()
}

fn node_text(node: Node, source: &str) -> String {
    source[node.byte_range()].to_string()
}
