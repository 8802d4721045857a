//! # Command Line Interface Module
//!
//! This module implements the CLI for the Zen compiler front end.

use crate::{Compiler, CompilerOptions, Diagnostic};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Zen compiler front end
#[derive(Parser)]
#[command(name = "zenc")]
#[command(about = "Zen - a systems programming language with ownership semantics")]
#[command(version = crate::VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the ownership analyses on a source file
    Check {
        /// Source file to check
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Emit diagnostics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse a source file and dump the AST as JSON
    Ast {
        /// Source file to parse
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show language information
    Info,
}

/// CLI application
pub struct CliApp {
    args: Cli,
}

impl CliApp {
    /// Create a new CLI application from process arguments
    pub fn new() -> Self {
        let args = Cli::parse();
        Self { args }
    }

    /// Run the CLI application, returning the process exit code
    pub fn run(&self) -> anyhow::Result<i32> {
        match &self.args.command {
            Commands::Check { input, json } => self.check_command(input, *json),
            Commands::Ast { input } => self.ast_command(input),
            Commands::Info => {
                println!("{} {}", crate::LANGUAGE_NAME, crate::VERSION);
                println!("Analyses: borrow checking, move checking");
                Ok(0)
            }
        }
    }

    fn check_command(&self, input: &PathBuf, json: bool) -> anyhow::Result<i32> {
        let options = CompilerOptions {
            verbose: self.args.verbose,
            json_diagnostics: json,
        };
        let compiler = Compiler::with_options(options).source_file(input);

        let report = compiler
            .check_file()
            .with_context(|| format!("failed to check {}", input.display()))?;

        if compiler.options.json_diagnostics {
            println!("{}", serde_json::to_string_pretty(&report.diagnostics)?);
        } else {
            for diagnostic in &report.diagnostics {
                print_diagnostic(diagnostic);
            }
        }

        if report.summary.borrow_violations > 0 {
            eprintln!(
                "[BorrowCheck] Found {} borrow violation(s).",
                report.summary.borrow_violations
            );
        }
        if report.summary.move_violations > 0 {
            eprintln!(
                "[MoveCheck] Found {} move violation(s).",
                report.summary.move_violations
            );
        }

        if report.is_clean() {
            if compiler.options.verbose {
                eprintln!("{}: no ownership violations", input.display());
            }
            Ok(0)
        } else {
            Ok(1)
        }
    }

    fn ast_command(&self, input: &PathBuf) -> anyhow::Result<i32> {
        let source = std::fs::read_to_string(input)
            .with_context(|| format!("failed to read {}", input.display()))?;

        let compiler = Compiler::new();
        let ast = compiler
            .parse_source(&source)
            .with_context(|| format!("failed to parse {}", input.display()))?;

        println!("{}", serde_json::to_string_pretty(&ast)?);
        Ok(0)
    }
}

impl Default for CliApp {
    fn default() -> Self {
        Self::new()
    }
}

fn print_diagnostic(diagnostic: &Diagnostic) {
    eprintln!(
        "error at {}:{}:{}: {}",
        diagnostic.file, diagnostic.line, diagnostic.column, diagnostic.message
    );
    for hint in &diagnostic.hints {
        eprintln!("  hint: {}", hint);
    }
}
