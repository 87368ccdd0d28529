//! Reachability analysis core for pythaw
//!
//! This module implements the traversal that starts at serverless handler
//! entry points and follows calls across project files, flagging heavy
//! resource-initialization calls that should live at module scope instead.

mod engine;
mod finder;
mod formatters;
mod imports;
mod parser;
mod reachability;
mod resolver;
mod rules;
mod violation;

pub use engine::{CheckReport, Engine};
pub use finder::{Handler, HandlerFinder};
pub use formatters::{formatter_for, ConciseFormatter, Formatter, GithubFormatter, JsonFormatter};
pub use imports::{ImportResolver, Resolution};
pub use parser::{FileStore, ParseStatus, PythonParser};
pub use reachability::ReachabilityEngine;
pub use resolver::{Binding, CallExpr, ClassBody, FunctionBody, ModuleIndex, ModuleRef};
pub use rules::{BuiltinRule, CustomRule, Rule, RuleRegistry, BUILTIN_RULES};
pub use violation::{CallSite, Diagnostic, DiagnosticKind, Violation};
