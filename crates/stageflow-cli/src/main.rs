//! StageFlow CLI - SQL stage diagram generator

use stageflow_cli::cli;
use stageflow_cli::config::DiagramOptions;
use stageflow_cli::diagram::{diagram_source, SourceDiagram};
use stageflow_cli::input;
use stageflow_cli::output::{format_json, format_markdown, format_mermaid, format_table};

use anyhow::{Context, Result};
use clap::Parser;
use stageflow_core::Severity;
use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;

use cli::{Args, OutputFormat};

/// A diagram result carries error issues.
const EXIT_FAILURE: u8 = 1;
/// Configuration or IO error (bad config file, unreadable input, invalid AST).
const EXIT_CONFIG_ERROR: u8 = 66;

fn main() -> ExitCode {
    let args = Args::parse();

    #[cfg(feature = "tracing")]
    init_tracing(args.quiet);

    match run(args) {
        Ok(has_errors) => {
            if has_errors {
                ExitCode::from(EXIT_FAILURE)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("stageflow: error: {e:#}");
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}

/// Log to stderr, filtered by `RUST_LOG` (warnings only by default).
/// `--quiet` turns logging off.
#[cfg(feature = "tracing")]
fn init_tracing(quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if quiet {
        EnvFilter::new("off")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // A subscriber may already be installed when embedded; keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run(args: Args) -> Result<bool> {
    let options = DiagramOptions::resolve(&args)?;
    let sources = input::read_input(&args.files)?;

    let diagrams = sources
        .iter()
        .map(|source| diagram_source(source, args.ast, &options))
        .collect::<Result<Vec<_>>>()?;

    let output_str = match options.format {
        OutputFormat::Mermaid => format_mermaid(&diagrams),
        OutputFormat::Markdown => format_markdown(&diagrams),
        OutputFormat::Json => {
            format_json(&diagrams, args.compact).context("Failed to serialize JSON")?
        }
        OutputFormat::Table => format_table(&diagrams, args.quiet, !args.quiet),
    };

    write_output(&args.output, &output_str)?;

    if !args.quiet && matches!(options.format, OutputFormat::Mermaid | OutputFormat::Markdown) {
        print_issues_to_stderr(&diagrams);
    }

    Ok(diagrams
        .iter()
        .any(|diagram| diagram.result.summary.has_errors))
}

fn write_output(path: &Option<std::path::PathBuf>, content: &str) -> Result<()> {
    if let Some(path) = path {
        fs::write(path, content)
            .with_context(|| format!("Failed to write to {}", path.display()))?;
    } else {
        io::stdout()
            .write_all(content.as_bytes())
            .context("Failed to write to stdout")?;
        // Ensure newline at end for terminal output
        if !content.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}

fn print_issues_to_stderr(diagrams: &[SourceDiagram]) {
    for diagram in diagrams {
        for issue in &diagram.result.issues {
            let level = match issue.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            };

            let location = issue
                .statement_index
                .map(|index| format!(" (statement {})", index + 1))
                .unwrap_or_default();

            eprintln!(
                "stageflow: {level}: {}{location}: {}",
                diagram.name, issue.message
            );
        }
    }
}
