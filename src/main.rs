//! Kestrel Interpreter
//!
//! Command-line driver: run, check or dump a script.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use kestrel::feedback::{Diagnostic, DiagnosticReport, Phase};
use kestrel::frontend;
use kestrel::{BuiltinRegistry, Error, Interpreter};

/// Kestrel Interpreter
#[derive(Parser, Debug)]
#[command(name = "kestrel")]
#[command(author = "Z1529")]
#[command(version = "0.1.0")]
#[command(about = "Kestrel - a small imperative scripting language")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Script to run
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Print the parsed program instead of running it
    #[arg(long, global = true)]
    emit_ast: bool,

    /// How errors are reported
    #[arg(long, value_enum, default_value_t = ErrorFormat::Human, global = true)]
    error_format: ErrorFormat,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a script
    Run {
        /// Script to run
        input: PathBuf,
    },
    /// Parse a script and report errors without running it
    Check {
        /// Script to check
        input: PathBuf,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorFormat {
    Human,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Run,
    Check,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let (input, mode) = match &cli.command {
        Some(Commands::Run { input }) => (input, Mode::Run),
        Some(Commands::Check { input }) => (input, Mode::Check),
        None => match &cli.input {
            Some(input) => (input, Mode::Run),
            None => {
                eprintln!("Error: No input file specified");
                eprintln!("Usage: kestrel <FILE> or kestrel run <FILE>");
                process::exit(1);
            }
        },
    };

    if !execute(input, mode, &cli) {
        process::exit(1);
    }
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Returns false when anything was reported as an error
fn execute(input: &Path, mode: Mode, cli: &Cli) -> bool {
    let file = input.display().to_string();

    let source = match read_source(input) {
        Ok(source) => source,
        Err(e) => {
            let report = DiagnosticReport::from_diagnostics(&file, vec![Diagnostic::io(format!("{:#}", e))]);
            emit_report(cli.error_format, &report);
            return false;
        }
    };

    let program = match frontend::parse(&source) {
        Ok(program) => program,
        Err(errors) => {
            emit_report(cli.error_format, &DiagnosticReport::from_parse_errors(&file, &errors));
            return false;
        }
    };
    debug!("parsed {} top-level statements from {}", program.statements.len(), file);

    if cli.emit_ast {
        print!("{}", program);
        return true;
    }

    if mode == Mode::Check {
        match cli.error_format {
            ErrorFormat::Human => println!("No errors found in {}", file),
            ErrorFormat::Json => println!("{}", DiagnosticReport::success(&file).to_json()),
        }
        return true;
    }

    let mut interpreter = Interpreter::new(BuiltinRegistry::standard());
    match interpreter.run(&program) {
        Ok(()) => true,
        Err(e) => {
            emit_report(cli.error_format, &DiagnosticReport::from_error(&file, &Error::Runtime(e)));
            false
        }
    }
}

fn emit_report(format: ErrorFormat, report: &DiagnosticReport) {
    match format {
        ErrorFormat::Json => println!("{}", report.to_json()),
        ErrorFormat::Human => {
            for diagnostic in &report.diagnostics {
                let phase = match diagnostic.phase {
                    Phase::Io => "error",
                    Phase::Parse => "parse error",
                    Phase::Runtime => "runtime error",
                };
                match (diagnostic.line, diagnostic.column) {
                    (Some(line), Some(column)) => {
                        eprintln!("{}:{}:{}: {}: {}", report.file, line, column, phase, diagnostic.message)
                    }
                    _ => eprintln!("{}: {}: {}", report.file, phase, diagnostic.message),
                }
            }
        }
    }
}
