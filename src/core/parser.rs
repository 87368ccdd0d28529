use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::debug;
use tree_sitter::{Node, Parser, Tree};

use crate::error::{PythawError, Result};
use super::resolver::{self, ModuleIndex};

/// Outcome of parsing a single source file.
///
/// Positions are normalized to 1-indexed lines and 0-indexed columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseStatus {
    Ok,
    Failed {
        message: String,
        line: usize,
        col: usize,
    },
}

/// Python parser backed by Tree-sitter.
pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let python_language = tree_sitter_python::language();
        parser
            .set_language(&python_language)
            .map_err(|e| PythawError::Parser(format!("Failed to set Python language: {}", e)))?;

        Ok(Self { parser })
    }

    /// Parse *source*, reporting the first syntax error as a failure status
    /// rather than an error.
    pub fn parse(&mut self, source: &str) -> Result<(Tree, ParseStatus)> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| PythawError::Parser("Failed to parse Python source".to_string()))?;

        let status = match first_error_node(tree.root_node()) {
            Some(position) => ParseStatus::Failed {
                message: "invalid syntax".to_string(),
                line: position.0,
                col: position.1,
            },
            None => ParseStatus::Ok,
        };

        Ok((tree, status))
    }
}

/// Find the position of the first error or missing node, in source order.
fn first_error_node(node: Node) -> Option<(usize, usize)> {
    if !node.has_error() {
        return None;
    }
    if node.is_error() || node.is_missing() {
        let pos = node.start_position();
        return Some((pos.row + 1, pos.column));
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_error_node(child) {
            return Some(found);
        }
    }
    // The root is flagged but no descendant carries the error marker; point
    // at the root itself.
    let pos = node.start_position();
    Some((pos.row + 1, pos.column))
}

/// Run-scoped cache of indexed source files.
///
/// Each path is read, parsed, and indexed at most once per run; every later
/// access returns the same shared index. Files that cannot be read or parsed
/// still get an entry, carrying a failed status.
pub struct FileStore {
    parser: PythonParser,
    indexes: HashMap<PathBuf, Rc<ModuleIndex>>,
}

impl FileStore {
    pub fn new() -> Result<Self> {
        Ok(Self {
            parser: PythonParser::new()?,
            indexes: HashMap::new(),
        })
    }

    /// Return the index for *path*, parsing and indexing it on first access.
    pub fn get_or_index(&mut self, path: &Path) -> Rc<ModuleIndex> {
        if let Some(index) = self.indexes.get(path) {
            return Rc::clone(index);
        }

        debug!("Indexing {}", path.display());
        let index = Rc::new(self.index_file(path));
        self.indexes.insert(path.to_path_buf(), Rc::clone(&index));
        index
    }

    /// Number of files indexed so far.
    pub fn indexed_files(&self) -> usize {
        self.indexes.len()
    }

    fn index_file(&mut self, path: &Path) -> ModuleIndex {
        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                return ModuleIndex::failed(path, e.to_string(), 1, 0);
            }
        };

        match self.parser.parse(&source) {
            Ok((tree, ParseStatus::Ok)) => resolver::index_module(path, &tree, &source),
            Ok((_, ParseStatus::Failed { message, line, col })) => {
                ModuleIndex::failed(path, message, line, col)
            }
            Err(e) => ModuleIndex::failed(path, e.to_string(), 1, 0),
        }
    }
}
