//! Mermaid and Markdown output.

use crate::diagram::SourceDiagram;

/// Format the rendered diagrams as plain Mermaid text.
///
/// With several inputs each diagram is preceded by a `%%` comment naming its
/// source, and diagrams are separated by a blank line.
pub fn format_mermaid(diagrams: &[SourceDiagram]) -> String {
    match diagrams {
        [single] => single.result.diagram.clone(),
        many => many
            .iter()
            .map(|diagram| format!("%% {}\n{}", diagram.name, diagram.result.diagram))
            .collect::<Vec<_>>()
            .join("\n\n"),
    }
}

/// Format the rendered diagrams as fenced Markdown blocks, one section per input.
pub fn format_markdown(diagrams: &[SourceDiagram]) -> String {
    diagrams
        .iter()
        .map(|diagram| {
            format!(
                "## {}\n\n```mermaid\n{}\n```\n",
                diagram.name, diagram.result.diagram
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
