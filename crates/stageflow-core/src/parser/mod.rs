//! SQL parsing collaborator.
//!
//! Wraps `sqlparser` and lowers its statements into the crate's stage AST.
//! Nothing past this module looks at SQL text again.

mod lower;

use crate::ast;
use crate::error::ParseError;
use crate::types::Dialect;
use sqlparser::ast::Statement;
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
#[cfg(feature = "tracing")]
use tracing::debug;

pub use lower::lower_statement;

/// Parse SQL using the specified dialect.
pub fn parse_sql_with_dialect(sql: &str, dialect: Dialect) -> Result<Vec<Statement>, ParseError> {
    let sqlparser_dialect = dialect.to_sqlparser_dialect();
    match Parser::parse_sql(sqlparser_dialect.as_ref(), sql) {
        Ok(statements) => Ok(statements),
        Err(primary_err) => {
            // Generic rejects Postgres-only operators (`::`, `->>`) that show up
            // in warehouse SQL; retry those with the Postgres dialect.
            if matches!(dialect, Dialect::Generic) && looks_like_postgres_syntax(sql) {
                let postgres = PostgreSqlDialect {};
                if let Ok(statements) = Parser::parse_sql(&postgres, sql) {
                    #[cfg(feature = "tracing")]
                    debug!("Generic dialect failed, parsed with Postgres fallback");
                    return Ok(statements);
                }
            }
            Err(ParseError::from(primary_err).with_dialect(dialect))
        }
    }
}

fn looks_like_postgres_syntax(sql: &str) -> bool {
    sql.contains("::") || sql.contains("->") || sql.contains("?|") || sql.contains("?&")
}

/// Parse SQL and lower every statement into the stage AST.
pub fn parse_statements(sql: &str, dialect: Dialect) -> Result<Vec<ast::Statement>, ParseError> {
    let statements = parse_sql_with_dialect(sql, dialect)?;
    Ok(statements.iter().map(lower_statement).collect())
}
