use crate::error::Result;
use super::violation::Violation;

/// Trait that all output formatters implement
pub trait Formatter {
    /// Format violations into an output string ready for printing.
    fn format(&self, violations: &[Violation]) -> Result<String>;
}

/// Look a formatter up by its CLI name.
pub fn formatter_for(name: &str) -> Option<Box<dyn Formatter>> {
    match name {
        "concise" => Some(Box::new(ConciseFormatter)),
        "json" => Some(Box::new(JsonFormatter)),
        "github" => Some(Box::new(GithubFormatter)),
        _ => None,
    }
}

/// One line per violation with a summary footer.
///
/// Output format:
///
/// ```text
/// file:line:col: CODE message
///   via file:line:col → Name1() → Name2()
///
/// Found N violation(s) in M file(s).
/// ```
///
/// The `via` continuation appears only for indirect violations and lists the
/// call chain from the handler to the offending site.
pub struct ConciseFormatter;

impl Formatter for ConciseFormatter {
    fn format(&self, violations: &[Violation]) -> Result<String> {
        if violations.is_empty() {
            return Ok(String::new());
        }

        let mut lines = Vec::new();
        for v in violations {
            lines.push(format!(
                "{}:{}:{}: {} {}",
                v.file, v.line, v.col, v.code, v.message
            ));
            if let Some(first) = v.call_chain.first() {
                let mut via = format!("  via {}:{}:{}", first.file, first.line, first.col);
                for site in &v.call_chain {
                    via.push_str(&format!(" → {}()", site.name));
                }
                lines.push(via);
            }
        }

        let file_count = {
            let mut files: Vec<&str> = violations.iter().map(|v| v.file.as_str()).collect();
            files.sort_unstable();
            files.dedup();
            files.len()
        };
        let violation_count = violations.len();
        let v_plural = if violation_count != 1 { "s" } else { "" };
        let f_plural = if file_count != 1 { "s" } else { "" };

        lines.push(String::new());
        lines.push(format!(
            "Found {} violation{} in {} file{}.",
            violation_count, v_plural, file_count, f_plural
        ));

        Ok(lines.join("\n"))
    }
}

/// Violations as a JSON array.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self, violations: &[Violation]) -> Result<String> {
        Ok(serde_json::to_string_pretty(violations)?)
    }
}

/// Violations as GitHub Actions error annotations.
pub struct GithubFormatter;

impl Formatter for GithubFormatter {
    fn format(&self, violations: &[Violation]) -> Result<String> {
        let lines: Vec<String> = violations
            .iter()
            .map(|v| {
                format!(
                    "::error file={},line={},col={}::{} {}",
                    v.file, v.line, v.col, v.code, v.message
                )
            })
            .collect();
        Ok(lines.join("\n"))
    }
}
