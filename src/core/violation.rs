use serde::{Deserialize, Serialize};

/// One step in the path from a handler to a violation site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    /// File containing the call, relative to the project root
    pub file: String,
    /// 1-indexed line of the call expression
    pub line: usize,
    /// 0-indexed column of the call expression
    pub col: usize,
    /// Callee name as written at the call site (e.g. `S3Client`)
    pub name: String,
}

/// A single rule violation found on a handler-reachable path.
///
/// The same site reached through two different call chains yields two
/// violations, one per chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Rule code (e.g. `PW001`)
    pub code: String,
    /// Human-readable description of the violation
    pub message: String,
    /// File containing the offending call, relative to the project root
    pub file: String,
    /// 1-indexed line of the offending call
    pub line: usize,
    /// 0-indexed column of the offending call
    pub col: usize,
    /// Call sites from the handler body to the offending call; empty when
    /// the call is directly inside the handler
    pub call_chain: Vec<CallSite>,
}

/// Non-fatal condition reported alongside violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    ParseError,
    UnresolvedImport,
}

/// A warning produced during analysis: a file that failed to parse, or an
/// import that could not be mapped to a project file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub file: String,
    pub line: usize,
    pub col: usize,
    pub detail: String,
}
