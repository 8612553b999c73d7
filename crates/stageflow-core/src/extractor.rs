//! Stage discovery, clause extraction and dependency inference.
//!
//! Extraction runs in three passes over the statement list:
//!
//! 1. Discovery: every statement contributes its `WITH` CTEs in declaration
//!    order, then itself (`SELECT ... INTO` and `CREATE TABLE ... AS` become
//!    temp tables, `INSERT INTO` a temp-table insert, anything else selectable
//!    the final select). Stage ids continue across statements.
//! 2. The canonical names of all discovered stages form the stage set.
//! 3. Each stage's sub-AST is walked for clause items, then for aliases and
//!    dependencies against the stage set.

mod clauses;
mod dependencies;
mod visitor;

use std::collections::BTreeMap;

use crate::ast::{Cte, Select, Statement};
use crate::error::ExtractError;
use crate::naming::{canonicalize_str, display_name};
use crate::types::{issue_codes, CanonicalName, DiagramSpec, Issue, Stage, StageKind};
use clauses::ClauseCollector;
use dependencies::{collect_dependencies, Scope};
#[cfg(feature = "tracing")]
use tracing::{debug, info_span, warn};

pub use clauses::normalize_join_type;
pub use visitor::{walk_expr, walk_join, walk_relation, walk_select, walk_select_body, Visitor};

/// Name given to stages whose name cannot be resolved.
pub const FINAL_SELECT_NAME: &str = "Final SELECT";

/// State shared by the per-stage passes.
#[derive(Debug, Default)]
pub(crate) struct ExtractionContext {
    /// Canonical name of every discovered stage, to its first raw name
    stage_names: BTreeMap<CanonicalName, String>,
}

impl ExtractionContext {
    fn from_stages(stages: &[Stage]) -> Self {
        let mut stage_names = BTreeMap::new();
        for stage in stages {
            if let Some(canonical) = canonicalize_str(&stage.name) {
                stage_names
                    .entry(canonical)
                    .or_insert_with(|| stage.name.clone());
            }
        }
        Self { stage_names }
    }

    pub(crate) fn is_stage(&self, name: &CanonicalName) -> bool {
        self.stage_names.contains_key(name)
    }
}

/// Stages discovered from a statement list, with any issues raised on the way.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub spec: DiagramSpec,
    pub issues: Vec<Issue>,
}

/// A discovered stage and the query block its clauses come from.
struct Pending<'a> {
    stage: Stage,
    body: Option<(&'a Select, Scope)>,
}

#[derive(Default)]
struct Discovery<'a> {
    pending: Vec<Pending<'a>>,
    issues: Vec<Issue>,
    skipped: usize,
}

impl<'a> Discovery<'a> {
    fn push(
        &mut self,
        name: Option<String>,
        kind: StageKind,
        body: Option<(&'a Select, Scope)>,
    ) {
        // A nominally-named stage whose name cannot be recovered is shown as
        // the final select.
        let (name, kind) = match name {
            Some(name) => (name, kind),
            None => (FINAL_SELECT_NAME.to_string(), StageKind::FinalSelect),
        };
        let stage = Stage::new(self.pending.len(), name, kind);
        self.pending.push(Pending { stage, body });
    }

    fn push_ctes(&mut self, ctes: &'a [Cte]) {
        for cte in ctes {
            self.push(
                display_name(&cte.name),
                StageKind::Cte,
                Some((&cte.query, Scope::WithClause)),
            );
        }
    }

    fn statement(&mut self, index: usize, statement: &'a Statement) {
        match statement {
            Statement::Select(select) => {
                self.push_ctes(&select.with);
                match &select.into {
                    Some(target) => self.push(
                        display_name(target),
                        StageKind::TempTable,
                        Some((select, Scope::BodyOnly)),
                    ),
                    None => self.push(
                        Some(FINAL_SELECT_NAME.to_string()),
                        StageKind::FinalSelect,
                        Some((select, Scope::BodyOnly)),
                    ),
                }
            }
            Statement::Insert(insert) => {
                self.push_ctes(&insert.with);
                if let Some(source) = &insert.source {
                    self.push_ctes(&source.with);
                }
                self.push(
                    display_name(&insert.table),
                    StageKind::TempTableInsert,
                    insert.source.as_ref().map(|source| (source, Scope::BodyOnly)),
                );
            }
            Statement::Unknown { .. } | Statement::Unrecognized => {
                #[cfg(feature = "tracing")]
                warn!(index, "Skipping unsupported statement");
                self.skipped += 1;
                self.issues.push(unsupported_statement(index, statement));
            }
        }
    }
}

/// Warning recorded for a statement that does not define a stage.
pub(crate) fn unsupported_statement(index: usize, statement: &Statement) -> Issue {
    Issue::warning(
        issue_codes::UNSUPPORTED_STATEMENT,
        format!(
            "Statement skipped, it does not define a stage: {}",
            statement.describe()
        ),
    )
    .with_statement(index)
}

/// Run every extraction pass.
///
/// Fails only when there is nothing to diagram; callers that want the empty
/// spec use [`extract_stages`].
pub fn extract(statements: &[Statement]) -> Result<Extraction, ExtractError> {
    #[cfg(feature = "tracing")]
    let _span = info_span!("extract_stages", statement_count = statements.len()).entered();

    if statements.is_empty() {
        return Err(ExtractError::EmptyInput);
    }

    let mut discovery = Discovery::default();
    for (index, statement) in statements.iter().enumerate() {
        discovery.statement(index, statement);
    }
    if discovery.pending.is_empty() {
        return Err(ExtractError::NoStages {
            skipped: discovery.skipped,
        });
    }

    let stages: Vec<Stage> = discovery
        .pending
        .iter()
        .map(|pending| pending.stage.clone())
        .collect();
    let ctx = ExtractionContext::from_stages(&stages);

    let stages = discovery
        .pending
        .into_iter()
        .map(|Pending { mut stage, body }| {
            if let Some((select, scope)) = body {
                ClauseCollector::new(&mut stage).collect(select);
                let own_name = canonicalize_str(&stage.name);
                stage.dependencies = collect_dependencies(&ctx, select, scope, own_name.as_ref());
            }
            #[cfg(feature = "tracing")]
            debug!(
                stage = %stage.id,
                name = %stage.name,
                clauses = stage.clause_count(),
                dependencies = stage.dependencies.len(),
                "Extracted stage"
            );
            stage
        })
        .collect();

    Ok(Extraction {
        spec: DiagramSpec::new(stages),
        issues: discovery.issues,
    })
}

/// Extract the stage model from parsed statements.
///
/// Never fails: input with nothing to diagram yields an empty spec, which the
/// renderer turns into its error diagram.
pub fn extract_stages(statements: &[Statement]) -> DiagramSpec {
    extract(statements)
        .map(|extraction| extraction.spec)
        .unwrap_or_default()
}
