//! Public entry points: SQL or AST in, stage model and diagram out.

use crate::ast::Statement;
use crate::extractor::{extract, unsupported_statement};
use crate::parser::parse_statements;
use crate::render::render;
use crate::types::{
    issue_codes, DiagramRequest, DiagramResult, DiagramSpec, Issue, IssueCount, RenderOptions,
    Summary,
};
#[cfg(feature = "tracing")]
use tracing::{info_span, warn};

/// Render a spec as Mermaid flowchart text.
pub fn render_diagram(spec: &DiagramSpec, options: &RenderOptions) -> String {
    #[cfg(feature = "tracing")]
    let _span = info_span!("render_diagram", stage_count = spec.len()).entered();
    render(spec, options)
}

/// Parse, extract and render in one call.
///
/// Never fails. Parse errors and unusable input are reported as issues, and
/// the diagram falls back to the error diagram.
pub fn generate_diagram(request: &DiagramRequest) -> DiagramResult {
    #[cfg(feature = "tracing")]
    let _span = info_span!("generate_diagram", dialect = ?request.dialect).entered();

    let options = request.options.unwrap_or_default();
    let mut result = match parse_statements(&request.sql, request.dialect) {
        Ok(statements) => build_result(&statements, &options),
        Err(err) => {
            #[cfg(feature = "tracing")]
            warn!(error = %err, "SQL could not be parsed");
            let issues = vec![Issue::error(issue_codes::PARSE_ERROR, err.to_string())];
            finish(DiagramSpec::default(), issues, 0, &options)
        }
    };

    if let Some(source_name) = &request.source_name {
        for issue in &mut result.issues {
            issue.source_name = Some(source_name.clone());
        }
    }
    result
}

/// Extract and render statements built by another parser.
pub fn generate_diagram_from_ast(statements: &[Statement], options: &RenderOptions) -> DiagramResult {
    #[cfg(feature = "tracing")]
    let _span = info_span!("generate_diagram_from_ast", statement_count = statements.len()).entered();
    build_result(statements, options)
}

fn build_result(statements: &[Statement], options: &RenderOptions) -> DiagramResult {
    let (spec, issues) = match extract(statements) {
        Ok(extraction) => (extraction.spec, extraction.issues),
        Err(err) => {
            // Keep warnings for skipped statements alongside the failure.
            let mut issues: Vec<Issue> = statements
                .iter()
                .enumerate()
                .filter(|(_, statement)| {
                    matches!(statement, Statement::Unknown { .. } | Statement::Unrecognized)
                })
                .map(|(index, statement)| unsupported_statement(index, statement))
                .collect();
            issues.push(Issue::error(issue_codes::INPUT_UNUSABLE, err.to_string()));
            (DiagramSpec::default(), issues)
        }
    };
    finish(spec, issues, statements.len(), options)
}

fn finish(
    spec: DiagramSpec,
    issues: Vec<Issue>,
    statement_count: usize,
    options: &RenderOptions,
) -> DiagramResult {
    let issue_count = IssueCount::from_issues(&issues);
    let summary = Summary {
        statement_count,
        stage_count: spec.len(),
        dependency_count: spec.dependency_count(),
        has_errors: issue_count.errors > 0,
        issue_count,
    };
    DiagramResult {
        diagram: render(&spec, options),
        spec,
        issues,
        summary,
    }
}
