//! CLI argument parsing using clap.

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use stageflow_core::FlowDirection;
use std::path::PathBuf;

/// StageFlow - SQL stage diagram generator
#[derive(Parser, Debug)]
#[command(name = "stageflow")]
#[command(about = "Turn SQL scripts into Mermaid stage diagrams", long_about = None)]
#[command(version)]
pub struct Args {
    /// SQL files to diagram (reads from stdin if none provided)
    #[arg(value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// Treat input as a JSON statement AST instead of SQL text
    #[arg(long)]
    pub ast: bool,

    /// JSON options file (dialect, direction, format); flags take precedence
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// SQL dialect [default: mssql]
    #[arg(short, long, value_enum)]
    pub dialect: Option<DialectArg>,

    /// Flowchart direction: TD, TB, BT, LR or RL [default: TD]
    #[arg(long, value_name = "DIR")]
    pub direction: Option<FlowDirection>,

    /// Output format [default: mermaid]
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Suppress warnings on stderr
    #[arg(short, long)]
    pub quiet: bool,

    /// Compact JSON output (no pretty-printing)
    #[arg(short, long)]
    pub compact: bool,
}

/// SQL dialect options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DialectArg {
    Generic,
    Ansi,
    Bigquery,
    Clickhouse,
    Databricks,
    Duckdb,
    Hive,
    Mssql,
    Mysql,
    Postgres,
    Redshift,
    Snowflake,
    Sqlite,
}

impl From<DialectArg> for stageflow_core::Dialect {
    fn from(d: DialectArg) -> Self {
        match d {
            DialectArg::Generic => stageflow_core::Dialect::Generic,
            DialectArg::Ansi => stageflow_core::Dialect::Ansi,
            DialectArg::Bigquery => stageflow_core::Dialect::Bigquery,
            DialectArg::Clickhouse => stageflow_core::Dialect::Clickhouse,
            DialectArg::Databricks => stageflow_core::Dialect::Databricks,
            DialectArg::Duckdb => stageflow_core::Dialect::Duckdb,
            DialectArg::Hive => stageflow_core::Dialect::Hive,
            DialectArg::Mssql => stageflow_core::Dialect::Mssql,
            DialectArg::Mysql => stageflow_core::Dialect::Mysql,
            DialectArg::Postgres => stageflow_core::Dialect::Postgres,
            DialectArg::Redshift => stageflow_core::Dialect::Redshift,
            DialectArg::Snowflake => stageflow_core::Dialect::Snowflake,
            DialectArg::Sqlite => stageflow_core::Dialect::Sqlite,
        }
    }
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Mermaid flowchart text
    #[default]
    Mermaid,
    /// Full diagram result as JSON
    Json,
    /// Human-readable stage table
    Table,
    /// Mermaid flowchart in a fenced Markdown block
    Markdown,
}
