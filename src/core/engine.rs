use std::path::PathBuf;
use std::rc::Rc;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::Result;
use super::finder::{Handler, HandlerFinder};
use super::imports::ImportResolver;
use super::parser::{FileStore, ParseStatus};
use super::reachability::ReachabilityEngine;
use super::resolver::ModuleIndex;
use super::rules::RuleRegistry;
use super::violation::{Diagnostic, DiagnosticKind, Violation};

/// Everything a check run produced, in emission order.
#[derive(Debug)]
pub struct CheckReport {
    pub violations: Vec<Violation>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckReport {
    pub fn has_parse_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::ParseError)
    }

    /// Exit code for the CLI: 0 when clean, 1 when any violation or parse
    /// error was found. Configuration errors exit 2 before a report exists.
    pub fn exit_code(&self) -> i32 {
        if self.violations.is_empty() && !self.has_parse_errors() {
            0
        } else {
            1
        }
    }
}

/// Orchestrates one analysis run: enumerate handlers, then trace everything
/// reachable from each one.
pub struct Engine {
    config: Config,
    registry: RuleRegistry,
}

impl Engine {
    pub fn new(config: Config) -> Result<Self> {
        let registry = RuleRegistry::from_config(&config)?;
        Ok(Self { config, registry })
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Run the analyzer over *targets* (files or directories).
    pub fn check(&self, targets: &[PathBuf]) -> Result<CheckReport> {
        let mut store = FileStore::new()?;
        let mut imports = ImportResolver::new(&self.config.project_root);
        let finder = HandlerFinder::new(&self.config);

        let files = finder.collect_files(targets);
        info!("Scanning {} files for handlers", files.len());

        let mut handlers: Vec<Handler> = Vec::new();
        let mut failed: Vec<Rc<ModuleIndex>> = Vec::new();
        for file in &files {
            let index = store.get_or_index(file);
            if matches!(index.status, ParseStatus::Failed { .. }) {
                failed.push(index);
            } else {
                handlers.extend(finder.extract_handlers(&index));
            }
        }
        info!("Found {} handlers", handlers.len());

        let mut engine = ReachabilityEngine::new(
            &mut store,
            &mut imports,
            &self.registry,
            &self.config.project_root,
        );
        for index in &failed {
            engine.report_parse_failure(index);
        }
        for handler in &handlers {
            debug!("Tracing from {}:{}", handler.file.display(), handler.name);
            engine.check_handler(handler);
        }

        let (violations, diagnostics) = engine.into_results();
        info!(
            "Analysis complete: {} violations, {} diagnostics",
            violations.len(),
            diagnostics.len()
        );

        Ok(CheckReport {
            violations,
            diagnostics,
        })
    }
}
