//! Response types: the extracted stage model and the generated diagram.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::common::{CanonicalName, Issue, Summary};

/// The complete result of diagram generation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiagramResult {
    /// Extracted stages, in discovery order
    pub spec: DiagramSpec,

    /// Rendered Mermaid flowchart text
    pub diagram: String,

    /// Issues encountered during parsing and extraction
    pub issues: Vec<Issue>,

    /// Summary statistics
    pub summary: Summary,
}

/// The ordered stages extracted from one query.
///
/// This is also the payload handed to alternate renderers; it never carries
/// the raw SQL text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiagramSpec {
    pub stages: Vec<Stage>,
}

impl DiagramSpec {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn stage(&self, id: &str) -> Option<&Stage> {
        self.stages.iter().find(|stage| stage.id == id)
    }

    /// Finds the first stage with the given display name.
    pub fn stage_named(&self, name: &str) -> Option<&Stage> {
        self.stages.iter().find(|stage| stage.name == name)
    }

    pub fn dependency_count(&self) -> usize {
        self.stages.iter().map(|stage| stage.dependencies.len()).sum()
    }
}

/// What kind of logical unit a stage is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageKind {
    /// A `WITH` clause definition
    Cte,
    /// `SELECT ... INTO` (or `CREATE TABLE ... AS SELECT`)
    TempTable,
    /// `INSERT INTO ... SELECT`
    TempTableInsert,
    /// The statement's result set
    FinalSelect,
}

impl StageKind {
    /// The serialized token, e.g. `TEMP_TABLE`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cte => "CTE",
            Self::TempTable => "TEMP_TABLE",
            Self::TempTableInsert => "TEMP_TABLE_INSERT",
            Self::FinalSelect => "FINAL_SELECT",
        }
    }

    /// The token as shown in diagram labels, e.g. `TEMP TABLE`.
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One CTE, temp-table materialization, or final query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    /// Opaque identifier (`S0`, `S1`, ...) assigned in discovery order
    pub id: String,

    /// Raw display name
    pub name: String,

    pub kind: StageKind,

    /// FROM clause items in source order
    #[serde(default)]
    pub from: Vec<FromItem>,

    /// JOIN items in source order
    #[serde(default)]
    pub joins: Vec<JoinItem>,

    /// WHERE predicates, one per top-level conjunct
    #[serde(default)]
    pub filters: Vec<WhereItem>,

    /// GROUP BY expressions
    #[serde(default)]
    pub group_by: Vec<GroupByItem>,

    /// Canonical names of the stages this one reads from
    #[serde(default)]
    pub dependencies: BTreeSet<CanonicalName>,
}

impl Stage {
    pub fn new(index: usize, name: impl Into<String>, kind: StageKind) -> Self {
        Self {
            id: format!("S{index}"),
            name: name.into(),
            kind,
            from: Vec::new(),
            joins: Vec::new(),
            filters: Vec::new(),
            group_by: Vec::new(),
            dependencies: BTreeSet::new(),
        }
    }

    pub fn clause_count(&self) -> usize {
        self.from.len() + self.joins.len() + self.filters.len() + self.group_by.len()
    }

    pub fn depends_on(&self, name: &str) -> bool {
        self.dependencies.iter().any(|dep| dep.as_str() == name)
    }
}

/// A FROM clause entry: a table or derived table, with its alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FromItem {
    /// Reconstructed SQL text
    pub sql: String,

    /// Raw table name when the entry is a plain table reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

/// A JOIN entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinItem {
    /// Reconstructed SQL text, e.g. `LEFT JOIN c ON a.id = c.id`
    pub sql: String,

    /// Normalized join keyword, e.g. `LEFT JOIN`
    pub join_type: String,

    /// Reconstructed ON condition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

/// A single WHERE predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WhereItem {
    pub sql: String,
}

/// A single GROUP BY expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupByItem {
    pub sql: String,
}
