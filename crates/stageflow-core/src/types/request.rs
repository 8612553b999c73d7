//! Request types for the diagram generation API.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A request to turn SQL text into a stage diagram.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiagramRequest {
    /// The SQL code to diagram (UTF-8 string, multi-statement supported)
    pub sql: String,

    /// SQL dialect used by the parser
    #[serde(default)]
    pub dialect: Dialect,

    /// Optional source name (file path or script identifier) attached to issues
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,

    /// Optional rendering options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<RenderOptions>,
}

impl DiagramRequest {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            dialect: Dialect::default(),
            source_name: None,
            options: None,
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }
}

/// SQL dialect for parsing.
///
/// T-SQL is the default because `#temp` tables and `SELECT ... INTO` are
/// first-class stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Generic,
    Ansi,
    Bigquery,
    Clickhouse,
    Databricks,
    Duckdb,
    Hive,
    #[default]
    Mssql,
    Mysql,
    Postgres,
    Redshift,
    Snowflake,
    Sqlite,
}

impl Dialect {
    pub fn to_sqlparser_dialect(&self) -> Box<dyn sqlparser::dialect::Dialect> {
        use sqlparser::dialect::{
            AnsiDialect, BigQueryDialect, ClickHouseDialect, DatabricksDialect, DuckDbDialect,
            GenericDialect, HiveDialect, MsSqlDialect, MySqlDialect, PostgreSqlDialect,
            RedshiftSqlDialect, SQLiteDialect, SnowflakeDialect,
        };
        match self {
            Self::Generic => Box::new(GenericDialect {}),
            Self::Ansi => Box::new(AnsiDialect {}),
            Self::Bigquery => Box::new(BigQueryDialect {}),
            Self::Clickhouse => Box::new(ClickHouseDialect {}),
            Self::Databricks => Box::new(DatabricksDialect {}),
            Self::Duckdb => Box::new(DuckDbDialect {}),
            Self::Hive => Box::new(HiveDialect {}),
            Self::Mssql => Box::new(MsSqlDialect {}),
            Self::Mysql => Box::new(MySqlDialect {}),
            Self::Postgres => Box::new(PostgreSqlDialect {}),
            Self::Redshift => Box::new(RedshiftSqlDialect {}),
            Self::Snowflake => Box::new(SnowflakeDialect {}),
            Self::Sqlite => Box::new(SQLiteDialect {}),
        }
    }
}

/// Flowchart direction token written in the diagram header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub enum FlowDirection {
    /// Top to bottom (`TD`)
    #[default]
    #[serde(rename = "TD")]
    TopDown,
    /// Top to bottom (`TB`)
    #[serde(rename = "TB")]
    TopBottom,
    /// Bottom to top (`BT`)
    #[serde(rename = "BT")]
    BottomTop,
    /// Left to right (`LR`)
    #[serde(rename = "LR")]
    LeftRight,
    /// Right to left (`RL`)
    #[serde(rename = "RL")]
    RightLeft,
}

impl FlowDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopDown => "TD",
            Self::TopBottom => "TB",
            Self::BottomTop => "BT",
            Self::LeftRight => "LR",
            Self::RightLeft => "RL",
        }
    }
}

impl fmt::Display for FlowDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlowDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TD" => Ok(Self::TopDown),
            "TB" => Ok(Self::TopBottom),
            "BT" => Ok(Self::BottomTop),
            "LR" => Ok(Self::LeftRight),
            "RL" => Ok(Self::RightLeft),
            other => Err(format!("unknown flowchart direction '{other}'")),
        }
    }
}

/// Options controlling diagram rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    /// Header direction of the flowchart
    #[serde(default)]
    pub direction: FlowDirection,
}
