//! rsharpc: the rsharp C# front-end CLI.
//!
//! Usage:
//!   rsharpc [options] [file...]
//!
//! Parses and resolves the given sources (or the `rsharp.json` project in
//! the current directory) and prints the diagnostics in the familiar
//! `file(line,col): error CS0246: message` form.

use clap::error::ErrorKind;
use clap::Parser as ClapParser;
use miette::IntoDiagnostic;
use rsharp_compiler::{Compilation, Program};
use rsharp_diagnostics::Diagnostic;
use rsharp_options::{CompilerOptions, PROJECT_FILE_NAME};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(ClapParser, Debug)]
#[command(name = "rsharpc", version, about = "rsharp - A C# front end written in Rust")]
struct Cli {
    /// C# source files to compile.
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Path to rsharp.json, or the directory holding it.
    #[arg(short = 'p', long = "project")]
    project: Option<PathBuf>,

    /// Define a preprocessor symbol; `A;B` defines both.
    #[arg(short = 'd', long = "define", value_name = "SYMBOL")]
    defines: Vec<String>,

    /// Reference an assembly manifest (JSON).
    #[arg(short = 'r', long = "reference", value_name = "MANIFEST")]
    references: Vec<String>,

    /// Do not reference the built-in core library.
    #[arg(long)]
    nostdlib: bool,

    /// Report all warnings as errors.
    #[arg(long)]
    warnaserror: bool,

    /// Print the syntax tree of every file.
    #[arg(long = "dump-tree")]
    dump_tree: bool,

    /// Print the semantic entity graph.
    #[arg(long = "dump-graph")]
    dump_graph: bool,

    /// Debug logging (overrides RSHARP_LOG).
    #[arg(short = 'v', long)]
    verbose: bool,
}

// ANSI color codes
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const GRAY: &str = "\x1b[90m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn main() -> miette::Result<ExitCode> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            let code = match error.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            // Printing help can only fail on a closed stdout.
            let _ = error.print();
            return Ok(ExitCode::from(code));
        }
    };
    init_logging(cli.verbose);
    run_compile(&cli)
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("RSHARP_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Options given on the command line; they override the project file.
fn command_line_options(cli: &Cli) -> CompilerOptions {
    let mut options = CompilerOptions {
        references: cli.references.clone(),
        no_std_lib: cli.nostdlib,
        warnings_as_errors: cli.warnaserror,
        ..Default::default()
    };
    for define in &cli.defines {
        options.add_defines(define);
    }
    options
}

fn run_compile(cli: &Cli) -> miette::Result<ExitCode> {
    let start = Instant::now();
    let overrides = command_line_options(cli);

    let project = cli.project.clone().or_else(|| {
        let default = Path::new(PROJECT_FILE_NAME);
        (cli.files.is_empty() && default.exists()).then(|| default.to_path_buf())
    });
    let mut program = match project {
        Some(path) => Program::from_project(&path, &overrides).into_diagnostic()?,
        None => Program::new(overrides),
    };
    program.root_files.extend(cli.files.iter().cloned());

    if program.root_files.is_empty() {
        print_error("No input files found.");
        return Ok(ExitCode::from(1));
    }

    program.load_root_files().into_diagnostic()?;
    let compilation = program.compile().into_diagnostic()?;

    if cli.dump_tree {
        for tree in &compilation.trees {
            println!("{}", tree.dump());
        }
    }
    if cli.dump_graph {
        println!("{}", compilation.graph.dump());
    }

    let use_color = std::io::stderr().is_terminal();
    for diagnostic in compilation.diagnostics.diagnostics() {
        print_diagnostic(diagnostic, use_color);
    }
    print_summary(&compilation, start, use_color);

    Ok(if compilation.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

fn print_diagnostic(diagnostic: &Diagnostic, use_color: bool) {
    if !use_color {
        eprintln!("{diagnostic}");
        return;
    }
    let color = if diagnostic.is_error() { RED } else { YELLOW };
    if let Some(location) = &diagnostic.location {
        eprint!("{CYAN}{}{RESET}({}): ", location.file, location.position);
    }
    eprintln!(
        "{BOLD}{color}{}{RESET} {GRAY}{}{RESET}: {}",
        diagnostic.severity,
        diagnostic.code_string(),
        diagnostic.message_text
    );
}

fn print_summary(compilation: &Compilation, start: Instant, use_color: bool) {
    let errors = compilation.diagnostics.error_count();
    let warnings = compilation.diagnostics.warning_count();
    let plural = |n: usize| if n == 1 { "" } else { "s" };
    let summary = format!(
        "{} file{}, {errors} error{}, {warnings} warning{} ({:.2}s)",
        compilation.trees.len(),
        plural(compilation.trees.len()),
        plural(errors),
        plural(warnings),
        start.elapsed().as_secs_f64()
    );
    match (use_color, errors > 0) {
        (true, true) => eprintln!("\n{RED}{summary}{RESET}"),
        (true, false) => eprintln!("\n{GRAY}{summary}{RESET}"),
        (false, _) => eprintln!("\n{summary}"),
    }
}

fn print_error(msg: &str) {
    if std::io::stderr().is_terminal() {
        eprintln!("{BOLD}{RED}error{RESET}: {msg}");
    } else {
        eprintln!("error: {msg}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_parse() {
        let cli = Cli::try_parse_from([
            "rsharpc",
            "a.cs",
            "b.cs",
            "-d",
            "DEBUG;TRACE",
            "--define",
            "X",
            "-r",
            "lib.json",
            "--nostdlib",
            "--warnaserror",
            "--dump-graph",
        ])
        .unwrap();
        assert_eq!(cli.files, vec![PathBuf::from("a.cs"), PathBuf::from("b.cs")]);
        let options = command_line_options(&cli);
        assert_eq!(options.defines, vec!["DEBUG", "TRACE", "X"]);
        assert_eq!(options.references, vec!["lib.json"]);
        assert!(options.no_std_lib && options.warnings_as_errors);
        assert!(cli.dump_graph && !cli.dump_tree);
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        assert!(Cli::try_parse_from(["rsharpc", "--bogus"]).is_err());
    }
}
