//! JSON output formatting.

use serde_json::Value;

use crate::diagram::SourceDiagram;

/// Format diagram results as JSON.
///
/// A single input yields its `DiagramResult` object; several inputs yield an
/// array of `{ "source": ..., "result": ... }` objects. If `compact` is true,
/// outputs minified JSON without whitespace.
pub fn format_json(diagrams: &[SourceDiagram], compact: bool) -> serde_json::Result<String> {
    let value = match diagrams {
        [single] => serde_json::to_value(&single.result)?,
        many => Value::Array(
            many.iter()
                .map(|diagram| {
                    Ok(serde_json::json!({
                        "source": diagram.name,
                        "result": serde_json::to_value(&diagram.result)?,
                    }))
                })
                .collect::<serde_json::Result<Vec<_>>>()?,
        ),
    };

    if compact {
        serde_json::to_string(&value)
    } else {
        serde_json::to_string_pretty(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stageflow_core::{generate_diagram, DiagramRequest};

    fn diagram(name: &str, sql: &str) -> SourceDiagram {
        SourceDiagram {
            name: name.to_string(),
            result: generate_diagram(&DiagramRequest::new(sql)),
        }
    }

    #[test]
    fn test_json_pretty() {
        let json = format_json(&[diagram("a.sql", "SELECT * FROM users")], false).unwrap();
        assert!(json.contains('\n'));
        assert!(json.contains("\"summary\""));
        assert!(json.contains("\"diagram\""));
    }

    #[test]
    fn test_json_compact() {
        let json = format_json(&[diagram("a.sql", "SELECT * FROM users")], true).unwrap();
        assert!(!json.starts_with("{\n"));
    }

    #[test]
    fn test_json_multiple_sources() {
        let json = format_json(
            &[
                diagram("a.sql", "SELECT * FROM users"),
                diagram("b.sql", "SELECT * FROM orders"),
            ],
            true,
        )
        .unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
        assert_eq!(value[1]["source"], "b.sql");
        assert_eq!(value[1]["result"]["spec"]["stages"][0]["id"], "S0");
    }
}
