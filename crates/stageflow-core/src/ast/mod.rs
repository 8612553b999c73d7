//! Typed stage AST.
//!
//! This is the contract between a SQL parsing collaborator and the stage
//! pipeline. It keeps only the shapes the pipeline understands: statements
//! that can become stages, their FROM/JOIN/WHERE/GROUP BY structure, and the
//! expression kinds the rehydrator can rebuild. Anything else is carried as an
//! `Unknown` node holding the collaborator's own rendering of it, if any.
//!
//! The types deserialize from JSON so that an AST produced outside this crate
//! can be fed to [`crate::extract_stages`] directly. Missing fields default to
//! "no clause". A statement, relation or expression node that does not fit its
//! type (unknown or missing `type` tag, missing required fields) deserializes
//! to the `Unrecognized` variant instead of failing the whole document.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Implement serde for a node type through its derived `remote = "Self"`
/// form, falling back to `Unrecognized` when the node does not fit.
macro_rules! lenient_node {
    ($ty:ident, $label:literal) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                $ty::serialize(self, serializer)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = serde_json::Value::deserialize(deserializer)?;
                Ok($ty::deserialize(value).unwrap_or_else(|_err| {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(node = $label, error = %_err, "Unrecognized AST node");
                    $ty::Unrecognized
                }))
            }
        }
    };
}

/// A top-level statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    remote = "Self",
    tag = "type",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum Statement {
    /// `SELECT`, including `SELECT ... INTO` and `CREATE TABLE ... AS SELECT`
    Select(Select),
    /// `INSERT INTO ...`
    Insert(Insert),
    /// A statement kind the pipeline does not diagram
    Unknown {
        #[serde(default)]
        text: Option<String>,
    },
    #[serde(other)]
    Unrecognized,
}

lenient_node!(Statement, "statement");

impl Statement {
    /// Short description used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Self::Select(_) => "SELECT".to_string(),
            Self::Insert(_) => "INSERT".to_string(),
            Self::Unknown { text: Some(text) } => {
                text.split_whitespace().take(3).collect::<Vec<_>>().join(" ")
            }
            Self::Unknown { text: None } | Self::Unrecognized => "unknown statement".to_string(),
        }
    }
}

/// A query block with its optional `WITH` clause.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Select {
    pub with: Vec<Cte>,
    pub projection: Vec<Expr>,
    pub from: Vec<FromEntry>,
    #[serde(rename = "where")]
    pub selection: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
    /// Target of `SELECT ... INTO`
    pub into: Option<NameNode>,
    /// Set-operation branches after the first (`UNION`, `INTERSECT`, `EXCEPT`)
    pub compound: Vec<Select>,
}

/// A `WITH` clause definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cte {
    pub name: NameNode,
    #[serde(alias = "stmt", alias = "statement")]
    pub query: Select,
}

/// `INSERT INTO <table> [SELECT ...]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insert {
    #[serde(default)]
    pub with: Vec<Cte>,
    pub table: NameNode,
    /// The inner `SELECT`; `None` for `INSERT ... VALUES`
    #[serde(default)]
    pub source: Option<Select>,
}

/// An entry of the FROM list. Joined relations are flattened into the list
/// after the relation they join to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FromEntry {
    Join(JoinEntry),
    Relation(Relation),
}

/// A relation that can appear in FROM or as a join target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    remote = "Self",
    tag = "type",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum Relation {
    Table(TableRef),
    Derived(DerivedTable),
    /// Table functions, `UNNEST`, `VALUES` lists and similar
    Other {
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        alias: Option<String>,
    },
    #[serde(other)]
    Unrecognized,
}

lenient_node!(Relation, "relation");

impl Relation {
    pub fn alias(&self) -> Option<&str> {
        match self {
            Self::Table(table) => table.alias.as_deref(),
            Self::Derived(derived) => derived.alias.as_deref(),
            Self::Other { alias, .. } => alias.as_deref(),
            Self::Unrecognized => None,
        }
    }
}

/// A named table reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRef {
    pub name: NameNode,
    #[serde(default, alias = "as")]
    pub alias: Option<String>,
}

impl TableRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: NameNode::Plain(name.into()),
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

/// A parenthesized subquery used as a relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedTable {
    pub subquery: Box<Select>,
    #[serde(default, alias = "as")]
    pub alias: Option<String>,
    /// The collaborator's rendering of the subquery
    #[serde(default)]
    pub text: Option<String>,
}

/// A joined relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinEntry {
    /// Join keyword as written, e.g. `LEFT OUTER JOIN`
    pub join: String,
    pub relation: Relation,
    #[serde(default)]
    pub on: Option<Expr>,
    #[serde(default)]
    pub using: Vec<String>,
}

/// An identifier-bearing node of uncertain shape.
///
/// Variants are listed in lookup priority order; untagged deserialization picks
/// the first one that fits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NameNode {
    /// A direct string
    Plain(String),
    /// `{table}` or the `{db, schema, table}` composite
    Qualified {
        #[serde(default, alias = "db")]
        database: Option<String>,
        #[serde(default)]
        schema: Option<String>,
        table: String,
    },
    /// `{table: {...}}`
    Nested { table: Box<NameNode> },
    /// `{value}`
    Value { value: String },
    /// `{expr: ...}`
    Expr { expr: Box<NameNode> },
    /// `{name: ...}`
    Named { name: Box<NameNode> },
    /// Any other object; scanned shallowly for an identifier-like string
    Fields(BTreeMap<String, serde_json::Value>),
}

impl NameNode {
    pub fn qualified(
        database: Option<String>,
        schema: Option<String>,
        table: impl Into<String>,
    ) -> Self {
        Self::Qualified {
            database,
            schema,
            table: table.into(),
        }
    }
}

/// An expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    remote = "Self",
    tag = "type",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum Expr {
    Binary {
        operator: String,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Column {
        #[serde(default)]
        table: Option<String>,
        column: String,
    },
    Number {
        value: String,
    },
    String {
        value: String,
    },
    /// Booleans, `NULL`, placeholders and other literal tokens, kept verbatim
    Literal {
        value: String,
    },
    List {
        #[serde(default)]
        items: Vec<Expr>,
    },
    Function {
        name: String,
        #[serde(default)]
        args: Vec<Expr>,
        #[serde(default)]
        distinct: bool,
        #[serde(default)]
        over: Option<WindowSpec>,
    },
    Case {
        #[serde(default)]
        operand: Option<Box<Expr>>,
        #[serde(default)]
        branches: Vec<CaseBranch>,
        #[serde(default)]
        else_result: Option<Box<Expr>>,
    },
    Cast {
        expr: Box<Expr>,
        data_type: String,
    },
    /// A parenthesized expression
    Nested {
        expr: Box<Expr>,
    },
    /// Prefix operators such as `NOT` and `EXISTS`
    Unary {
        operator: String,
        expr: Box<Expr>,
    },
    Subquery {
        query: Box<Select>,
        #[serde(default)]
        text: Option<String>,
    },
    /// A shape the AST does not model, with the collaborator's rendering
    Unknown {
        #[serde(default)]
        text: Option<String>,
    },
    #[serde(other)]
    Unrecognized,
}

lenient_node!(Expr, "expression");

impl Expr {
    pub fn binary(left: Expr, operator: impl Into<String>, right: Expr) -> Self {
        Self::Binary {
            operator: operator.into(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn column(table: Option<&str>, column: impl Into<String>) -> Self {
        Self::Column {
            table: table.map(str::to_string),
            column: column.into(),
        }
    }

    pub fn number(value: impl Into<String>) -> Self {
        Self::Number {
            value: value.into(),
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::String {
            value: value.into(),
        }
    }

    /// True for a binary `AND` (any case).
    pub fn is_conjunction(&self) -> bool {
        matches!(self, Self::Binary { operator, .. } if operator.eq_ignore_ascii_case("AND"))
    }
}

/// `WHEN <condition> THEN <result>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseBranch {
    pub condition: Expr,
    pub result: Expr,
}

/// The `OVER (...)` clause of a window function.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WindowSpec {
    pub partition_by: Vec<Expr>,
    pub order_by: Vec<OrderKey>,
}

/// An `ORDER BY` key inside a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderKey {
    pub expr: Expr,
    /// `Some(true)` for `ASC`, `Some(false)` for `DESC`
    #[serde(default)]
    pub asc: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_deserializes_with_missing_fields() {
        let statement: Statement = serde_json::from_str(r#"{"type": "select"}"#).unwrap();
        assert_eq!(statement, Statement::Select(Select::default()));
    }

    #[test]
    fn test_unknown_expression_tag_is_tolerated() {
        let expr: Expr =
            serde_json::from_str(r#"{"type": "interval", "value": "1 day"}"#).unwrap();
        assert_eq!(expr, Expr::Unrecognized);
    }

    #[test]
    fn test_untyped_where_degrades_to_unrecognized() {
        let statements: Vec<Statement> = serde_json::from_str(
            r#"[{"type": "select", "from": [{"type": "table", "name": "a"}],
                 "where": {"operator": "=", "left": 1}}]"#,
        )
        .unwrap();
        match &statements[0] {
            Statement::Select(select) => {
                assert_eq!(select.from.len(), 1);
                assert_eq!(select.selection, Some(Expr::Unrecognized));
            }
            other => panic!("expected select, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_nodes_do_not_fail_the_document() {
        let statements: Vec<Statement> = serde_json::from_str(
            r#"[{"kind": "select"}, {"type": "insert"},
                {"type": "select", "from": [{"type": "table"}]}]"#,
        )
        .unwrap();
        assert_eq!(statements[0], Statement::Unrecognized);
        assert_eq!(statements[1], Statement::Unrecognized);
        match &statements[2] {
            Statement::Select(select) => {
                assert_eq!(select.from, vec![FromEntry::Relation(Relation::Unrecognized)])
            }
            other => panic!("expected select, got {other:?}"),
        }
    }

    #[test]
    fn test_lenient_nodes_serialize_with_tags() {
        let value = serde_json::to_value(Expr::column(Some("t"), "id")).unwrap();
        assert_eq!(value["type"], "column");
        let back: Expr = serde_json::from_value(value).unwrap();
        assert_eq!(back, Expr::column(Some("t"), "id"));
    }

    #[test]
    fn test_name_node_variant_order() {
        let plain: NameNode = serde_json::from_str(r#""orders""#).unwrap();
        assert_eq!(plain, NameNode::Plain("orders".to_string()));

        let qualified: NameNode =
            serde_json::from_str(r#"{"db": "sales", "schema": "dbo", "table": "orders"}"#)
                .unwrap();
        assert_eq!(
            qualified,
            NameNode::qualified(Some("sales".into()), Some("dbo".into()), "orders")
        );

        let nested: NameNode = serde_json::from_str(r#"{"table": {"value": "orders"}}"#).unwrap();
        assert!(matches!(nested, NameNode::Nested { .. }));

        let other: NameNode = serde_json::from_str(r#"{"ident": "orders", "n": 1}"#).unwrap();
        assert!(matches!(other, NameNode::Fields(_)));
    }

    #[test]
    fn test_from_entry_join_or_relation() {
        let join: FromEntry = serde_json::from_str(
            r#"{"join": "LEFT JOIN", "relation": {"type": "table", "name": "c"}}"#,
        )
        .unwrap();
        assert!(matches!(join, FromEntry::Join(_)));

        let table: FromEntry =
            serde_json::from_str(r#"{"type": "table", "name": "o", "as": "x"}"#).unwrap();
        assert_eq!(
            table,
            FromEntry::Relation(Relation::Table(TableRef::named("o").with_alias("x")))
        );
    }

    #[test]
    fn test_conjunction_is_case_insensitive() {
        let expr = Expr::binary(Expr::number("1"), "and", Expr::number("2"));
        assert!(expr.is_conjunction());
        let expr = Expr::binary(Expr::number("1"), "OR", Expr::number("2"));
        assert!(!expr.is_conjunction());
    }
}
