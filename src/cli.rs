use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;
use crate::core::{formatter_for, DiagnosticKind, Engine, Rule};
use crate::error::{PythawError, Result};

#[derive(Parser)]
#[command(name = "pythaw")]
#[command(about = "Detect heavy initialization reachable from AWS Lambda Python handlers")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check files for violations
    Check {
        /// Files or directories to check
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Output format (concise, json, github)
        #[arg(long, default_value = "concise")]
        format: String,
    },

    /// List all rules
    Rules,

    /// Show details for a rule
    Rule {
        /// Rule code (e.g. PW001)
        code: String,
    },
}

impl Cli {
    /// Execute the requested command, returning the process exit code
    /// (0 = no issues, 1 = violations or parse errors, 2 = tool error).
    pub fn execute(self) -> i32 {
        match self.run() {
            Ok(code) => code,
            Err(e) => {
                eprintln!("{}", e);
                2
            }
        }
    }

    fn run(self) -> Result<i32> {
        match self.command {
            Commands::Check { paths, format } => cmd_check(&paths, &format),
            Commands::Rules => cmd_rules(),
            Commands::Rule { code } => cmd_rule(&code),
        }
    }
}

fn cmd_check(paths: &[PathBuf], format: &str) -> Result<i32> {
    let formatter = formatter_for(format)
        .ok_or_else(|| PythawError::Config(format!("Unknown output format: {}", format)))?;

    let config = Config::load()?;
    let engine = Engine::new(config)?;
    let report = engine.check(paths)?;

    for diagnostic in &report.diagnostics {
        let label = match diagnostic.kind {
            DiagnosticKind::ParseError => "error",
            DiagnosticKind::UnresolvedImport => "warning",
        };
        eprintln!(
            "{}:{}:{}: {}: {}",
            diagnostic.file, diagnostic.line, diagnostic.col, label, diagnostic.detail
        );
    }

    if !report.violations.is_empty() {
        println!("{}", formatter.format(&report.violations)?);
    } else if format == "json" {
        println!("{}", formatter.format(&report.violations)?);
    } else if report.exit_code() == 0 {
        println!("All checks passed!");
    }

    Ok(report.exit_code())
}

fn cmd_rules() -> Result<i32> {
    let config = Config::load()?;
    let engine = Engine::new(config)?;
    for rule in engine.registry().all_rules() {
        println!("{}  {}", rule.code(), rule.message());
    }
    Ok(0)
}

fn cmd_rule(code: &str) -> Result<i32> {
    let config = Config::load()?;
    let engine = Engine::new(config)?;
    let Some(rule) = engine.registry().get(code) else {
        eprintln!("Unknown rule: {}", code);
        return Ok(2);
    };

    println!("{}: {}", rule.code(), rule.message());
    println!();
    match rule {
        Rule::Builtin(builtin) => {
            println!("What it does:");
            println!("  {}", builtin.what);
            println!();
            println!("Why is this bad?:");
            println!("  {}", builtin.why);
            println!();
            println!("Example:");
            for line in builtin.example.lines() {
                println!("  {}", line);
            }
        }
        Rule::Custom(custom) => {
            println!("Custom rule watching `{}`.", custom.pattern);
        }
    }
    Ok(0)
}
