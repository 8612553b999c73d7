//! Mermaid flowchart rendering.
//!
//! Output is a pure function of the `DiagramSpec` and `RenderOptions`: stage
//! blocks in stage order, then lineage arrows. Lines are joined with `\n` and
//! there is no trailing newline.

use crate::naming::canonicalize_str;
use crate::types::{CanonicalName, DiagramSpec, RenderOptions, Stage};
#[cfg(feature = "tracing")]
use tracing::debug;

/// Label of the single node emitted for an empty spec.
pub const EMPTY_DIAGRAM_MESSAGE: &str = "No SQL stages could be extracted from the query";

/// Label of the node emitted for a stage without clause items.
pub const NO_CLAUSES_LABEL: &str = "(No SQL clauses)";

const INDENT: &str = "    ";

/// Render a spec as a Mermaid flowchart.
pub fn render(spec: &DiagramSpec, options: &RenderOptions) -> String {
    let mut lines = vec![format!("flowchart {}", options.direction)];

    if spec.is_empty() {
        lines.push(format!(
            "{INDENT}error[\"{}\"]",
            escape_label(EMPTY_DIAGRAM_MESSAGE)
        ));
        return lines.join("\n");
    }

    for stage in &spec.stages {
        render_stage(stage, &mut lines);
    }

    let arrows = lineage_arrows(spec);
    if arrows.is_empty() {
        for pair in spec.stages.windows(2) {
            lines.push(format!("{INDENT}{} --> {}", pair[0].id, pair[1].id));
        }
    } else {
        lines.extend(arrows);
    }

    lines.join("\n")
}

fn render_stage(stage: &Stage, lines: &mut Vec<String>) {
    let title = format!("{} ({})", stage.name, stage.kind.label());
    lines.push(format!(
        "{INDENT}subgraph {}[\"{}\"]",
        stage.id,
        escape_label(&title)
    ));
    lines.push(format!("{INDENT}{INDENT}direction TB"));

    let mut labels: Vec<String> = stage
        .from
        .iter()
        .map(|item| format!("FROM: {}", item.sql))
        .chain(stage.joins.iter().map(|item| format!("JOIN: {}", item.sql)))
        .chain(stage.filters.iter().map(|item| format!("WHERE: {}", item.sql)))
        .chain(
            stage
                .group_by
                .iter()
                .map(|item| format!("GROUP BY: {}", item.sql)),
        )
        .collect();
    if labels.is_empty() {
        labels.push(NO_CLAUSES_LABEL.to_string());
    }

    let node_ids: Vec<String> = (0..labels.len())
        .map(|index| format!("{}_N{index}", stage.id))
        .collect();
    for (node_id, label) in node_ids.iter().zip(&labels) {
        lines.push(format!(
            "{INDENT}{INDENT}{node_id}[\"{}\"]",
            escape_label(label)
        ));
    }
    for pair in node_ids.windows(2) {
        lines.push(format!("{INDENT}{INDENT}{} --> {}", pair[0], pair[1]));
    }

    lines.push(format!("{INDENT}end"));
}

/// One arrow per resolved dependency, producer first.
fn lineage_arrows(spec: &DiagramSpec) -> Vec<String> {
    let canonical: Vec<Option<CanonicalName>> = spec
        .stages
        .iter()
        .map(|stage| canonicalize_str(&stage.name))
        .collect();

    let mut arrows = Vec::new();
    for (position, stage) in spec.stages.iter().enumerate() {
        for dependency in &stage.dependencies {
            match producer_of(&canonical, dependency, position) {
                Some(producer) => arrows.push(format!(
                    "{INDENT}{} --> {}",
                    spec.stages[producer].id, stage.id
                )),
                None => {
                    #[cfg(feature = "tracing")]
                    debug!(
                        stage = %stage.id,
                        dependency = %dependency,
                        "Dropping dependency that matches no stage"
                    );
                }
            }
        }
    }
    arrows
}

/// The closest stage before `position` with the given name, else the first one.
fn producer_of(
    canonical: &[Option<CanonicalName>],
    dependency: &CanonicalName,
    position: usize,
) -> Option<usize> {
    let matches = |index: &usize| canonical[*index].as_ref() == Some(dependency);
    (0..position)
        .rev()
        .find(matches)
        .or_else(|| (0..canonical.len()).find(|index| *index != position && matches(index)))
}

/// Escape text for use inside a quoted Mermaid label.
pub fn escape_label(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push(' '),
            '\r' => {}
            other => escaped.push(other),
        }
    }
    escaped
}
