//! Per-input diagram generation.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use stageflow_core::{ast, generate_diagram, generate_diagram_from_ast, DiagramRequest, DiagramResult};

use crate::config::DiagramOptions;
use crate::input::InputSource;

/// The diagram produced for one input source.
#[derive(Debug, Clone)]
pub struct SourceDiagram {
    pub name: String,
    pub result: DiagramResult,
}

/// Build the diagram for one source.
///
/// SQL input never fails here; parse problems are carried as issues. JSON AST
/// input fails when the document is not valid JSON of the expected shape.
pub fn diagram_source(
    source: &InputSource,
    ast_input: bool,
    options: &DiagramOptions,
) -> Result<SourceDiagram> {
    let result = if ast_input {
        let statements = parse_ast_document(&source.content)
            .with_context(|| format!("Failed to read statement AST from {}", source.name))?;
        let mut result = generate_diagram_from_ast(&statements, &options.render_options());
        for issue in &mut result.issues {
            issue.source_name = Some(source.name.clone());
        }
        result
    } else {
        let mut request = DiagramRequest::new(source.content.as_str()).with_dialect(options.dialect);
        request.source_name = Some(source.name.clone());
        request.options = Some(options.render_options());
        generate_diagram(&request)
    };

    Ok(SourceDiagram {
        name: source.name.clone(),
        result,
    })
}

/// A JSON AST document is a statement list or a single statement object.
fn parse_ast_document(content: &str) -> Result<Vec<ast::Statement>> {
    let document: Value = serde_json::from_str(content).context("Invalid JSON AST")?;
    match document {
        Value::Array(_) => serde_json::from_value(document).context("Invalid statement list"),
        Value::Object(_) => Ok(vec![
            serde_json::from_value(document).context("Invalid statement")?
        ]),
        other => bail!(
            "Invalid JSON AST: expected a statement object or an array of statements, found {}",
            json_kind(&other)
        ),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stageflow_core::{issue_codes, StageKind};

    fn source(content: &str) -> InputSource {
        InputSource {
            name: "script.sql".to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_sql_source() {
        let diagram = diagram_source(
            &source("WITH a AS (SELECT 1 AS x) SELECT * FROM a"),
            false,
            &DiagramOptions::default(),
        )
        .unwrap();
        assert_eq!(diagram.name, "script.sql");
        assert_eq!(diagram.result.spec.len(), 2);
        assert!(diagram.result.diagram.starts_with("flowchart TD"));
    }

    #[test]
    fn test_ast_single_statement() {
        let diagram = diagram_source(
            &source(
                r##"{"type": "select", "into": "#t", "from": [{"type": "table", "name": "src"}]}"##,
            ),
            true,
            &DiagramOptions::default(),
        )
        .unwrap();
        assert_eq!(diagram.result.spec.stages[0].kind, StageKind::TempTable);
        assert_eq!(diagram.result.spec.stages[0].name, "#t");
    }

    #[test]
    fn test_ast_issues_carry_source_name() {
        let diagram = diagram_source(
            &source(r#"[{"type": "drop"}]"#),
            true,
            &DiagramOptions::default(),
        )
        .unwrap();
        let last = diagram.result.issues.last().unwrap();
        assert_eq!(last.code, issue_codes::INPUT_UNUSABLE);
        assert_eq!(last.source_name.as_deref(), Some("script.sql"));
    }

    #[test]
    fn test_invalid_ast_is_an_error() {
        let err = diagram_source(&source("not json"), true, &DiagramOptions::default())
            .unwrap_err();
        assert!(format!("{err:#}").contains("script.sql"));
    }

    #[test]
    fn test_scalar_ast_document_names_the_expected_shape() {
        let err = diagram_source(&source("42"), true, &DiagramOptions::default()).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("array of statements"), "{message}");
        assert!(message.contains("found a number"), "{message}");
    }

    #[test]
    fn test_ast_statement_list_keeps_every_entry() {
        let diagram = diagram_source(
            &source(
                r##"[{"type": "select", "into": "#a", "from": [{"type": "table", "name": "src"}]},
                    {"type": "select", "from": [{"type": "table", "name": "#a"}]}]"##,
            ),
            true,
            &DiagramOptions::default(),
        )
        .unwrap();
        assert_eq!(diagram.result.spec.len(), 2);
    }
}
