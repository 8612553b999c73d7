//! Human-readable table output formatting.

use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use stageflow_core::{DiagramResult, Severity, Stage};
use std::fmt::Write;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::diagram::SourceDiagram;

#[derive(Tabled)]
struct StageRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Stage")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Clauses")]
    clauses: usize,
    #[tabled(rename = "Depends on")]
    depends_on: String,
}

impl From<&Stage> for StageRow {
    fn from(stage: &Stage) -> Self {
        let depends_on: Vec<&str> = stage.dependencies.iter().map(|dep| dep.as_str()).collect();
        Self {
            id: stage.id.clone(),
            name: stage.name.clone(),
            kind: stage.kind.label(),
            clauses: stage.clause_count(),
            depends_on: if depends_on.is_empty() {
                "-".to_string()
            } else {
                depends_on.join(", ")
            },
        }
    }
}

/// Format diagram results as human-readable text with optional colors.
pub fn format_table(diagrams: &[SourceDiagram], quiet: bool, use_colors: bool) -> String {
    let colored = use_colors && std::io::stdout().is_terminal();
    let mut out = String::new();

    write_header(&mut out, colored);
    for diagram in diagrams {
        write_source(&mut out, diagram, colored);
        write_stages(&mut out, &diagram.result);
        if !quiet {
            write_issues(&mut out, &diagram.result, colored);
        }
    }

    out
}

fn write_header(out: &mut String, colored: bool) {
    let title = "StageFlow Diagram";
    let line = "═".repeat(50);

    if colored {
        writeln!(out, "{}", title.bold()).unwrap();
        writeln!(out, "{}", line.dimmed()).unwrap();
    } else {
        writeln!(out, "{title}").unwrap();
        writeln!(out, "{line}").unwrap();
    }
}

fn write_source(out: &mut String, diagram: &SourceDiagram, colored: bool) {
    let summary = &diagram.result.summary;
    writeln!(out, "Source: {}", diagram.name).unwrap();

    let stats = format!(
        "Summary: {} statements | {} stages | {} dependencies",
        summary.statement_count, summary.stage_count, summary.dependency_count
    );
    if colored {
        writeln!(out, "{}", stats.cyan()).unwrap();
    } else {
        writeln!(out, "{stats}").unwrap();
    }
    writeln!(out).unwrap();
}

fn write_stages(out: &mut String, result: &DiagramResult) {
    if result.spec.is_empty() {
        writeln!(out, "No stages.").unwrap();
        writeln!(out).unwrap();
        return;
    }

    let rows: Vec<StageRow> = result.spec.stages.iter().map(StageRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    writeln!(out, "{table}").unwrap();
    writeln!(out).unwrap();
}

fn write_issues(out: &mut String, result: &DiagramResult, colored: bool) {
    if result.issues.is_empty() {
        return;
    }

    let counts = &result.summary.issue_count;
    let mut parts = Vec::new();
    if counts.errors > 0 {
        parts.push(format!("{} errors", counts.errors));
    }
    if counts.warnings > 0 {
        parts.push(format!("{} warnings", counts.warnings));
    }

    let header = format!("Issues ({}):", parts.join(", "));
    if colored {
        writeln!(out, "{}", header.bold()).unwrap();
    } else {
        writeln!(out, "{header}").unwrap();
    }

    for issue in &result.issues {
        let severity_str = match issue.severity {
            Severity::Error if colored => "ERROR".red().to_string(),
            Severity::Error => "ERROR".to_string(),
            Severity::Warning if colored => "WARN".yellow().to_string(),
            Severity::Warning => "WARN".to_string(),
        };

        let location = issue
            .statement_index
            .map(|index| format!(" statement {}:", index + 1))
            .unwrap_or_default();

        writeln!(out, "  [{severity_str}]{location} {}", issue.message).unwrap();
    }
    writeln!(out).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use stageflow_core::{generate_diagram, DiagramRequest};

    fn diagram(sql: &str) -> SourceDiagram {
        SourceDiagram {
            name: "script.sql".to_string(),
            result: generate_diagram(&DiagramRequest::new(sql)),
        }
    }

    #[test]
    fn test_format_table_basic() {
        let output = format_table(
            &[diagram("WITH a AS (SELECT * FROM t) SELECT * FROM a")],
            false,
            false,
        );
        assert!(output.contains("StageFlow Diagram"));
        assert!(output.contains("Source: script.sql"));
        assert!(output.contains("Summary: 1 statements | 2 stages | 1 dependencies"));
        assert!(output.contains("Final SELECT"));
        assert!(output.contains("CTE"));
    }

    #[test]
    fn test_format_table_quiet_hides_issues() {
        let diagrams = [diagram("SELECT * FROM")];
        let verbose = format_table(&diagrams, false, false);
        let quiet = format_table(&diagrams, true, false);

        assert!(verbose.contains("Issues (1 errors):"));
        assert!(verbose.contains("[ERROR]"));
        assert!(!quiet.contains("Issues"));
        assert!(quiet.contains("No stages."));
    }
}
