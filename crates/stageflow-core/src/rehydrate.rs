//! Reconstruction of SQL text from expression nodes.
//!
//! Rehydration never fails: shapes the AST does not model fall back to the
//! parser's own rendering when one was captured, and to
//! [`COMPLEX_EXPRESSION`] otherwise.

use crate::ast::{CaseBranch, Expr, OrderKey, WindowSpec};
#[cfg(feature = "tracing")]
use tracing::debug;

/// Placeholder emitted for expressions that cannot be reconstructed.
pub const COMPLEX_EXPRESSION: &str = "[Complex Expression]";

/// Rebuild SQL text for an expression.
pub fn rehydrate(expr: &Expr) -> String {
    match expr {
        Expr::Binary {
            operator,
            left,
            right,
        } => format!("{} {} {}", rehydrate(left), operator, rehydrate(right)),
        Expr::Column { table, column } => match table.as_deref() {
            Some(table) if !table.is_empty() => format!("{table}.{column}"),
            _ => column.clone(),
        },
        Expr::Number { value } | Expr::Literal { value } => value.clone(),
        Expr::String { value } => format!("'{}'", value.replace('\'', "''")),
        Expr::List { items } => format!("({})", join(items)),
        Expr::Function {
            name,
            args,
            distinct,
            over,
        } => {
            let prefix = if *distinct { "DISTINCT " } else { "" };
            let call = format!("{name}({prefix}{})", join(args));
            match over {
                Some(window) => format!("{call} {}", window_clause(window)),
                None => call,
            }
        }
        Expr::Case {
            operand,
            branches,
            else_result,
        } => case_expression(operand.as_deref(), branches, else_result.as_deref()),
        Expr::Cast { expr, data_type } => format!("CAST({} AS {data_type})", rehydrate(expr)),
        Expr::Nested { expr } => format!("({})", rehydrate(expr)),
        // Keyword operators take a space, symbolic ones bind tightly: `NOT x`, `-5`.
        Expr::Unary { operator, expr } if operator.ends_with(char::is_alphabetic) => {
            format!("{operator} {}", rehydrate(expr))
        }
        Expr::Unary { operator, expr } => format!("{operator}{}", rehydrate(expr)),
        Expr::Subquery { text, .. } => match unparsed(text.as_deref()) {
            Some(text) => format!("({text})"),
            None => placeholder(),
        },
        Expr::Unknown { text } => match unparsed(text.as_deref()) {
            Some(text) => text.to_string(),
            None => placeholder(),
        },
        Expr::Unrecognized => placeholder(),
    }
}

fn join(items: &[Expr]) -> String {
    items.iter().map(rehydrate).collect::<Vec<_>>().join(", ")
}

fn unparsed(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|text| !text.is_empty())
}

fn placeholder() -> String {
    #[cfg(feature = "tracing")]
    debug!("Expression could not be reconstructed, using placeholder");
    COMPLEX_EXPRESSION.to_string()
}

/// `OVER(PARTITION BY ... ORDER BY ...)`, or `OVER()` for an empty window.
fn window_clause(window: &WindowSpec) -> String {
    let mut parts = Vec::new();
    if !window.partition_by.is_empty() {
        parts.push(format!("PARTITION BY {}", join(&window.partition_by)));
    }
    if !window.order_by.is_empty() {
        let keys = window
            .order_by
            .iter()
            .map(order_key)
            .collect::<Vec<_>>()
            .join(", ");
        parts.push(format!("ORDER BY {keys}"));
    }
    format!("OVER({})", parts.join(" "))
}

fn order_key(key: &OrderKey) -> String {
    let expr = rehydrate(&key.expr);
    match key.asc {
        Some(true) => format!("{expr} ASC"),
        Some(false) => format!("{expr} DESC"),
        None => expr,
    }
}

fn case_expression(
    operand: Option<&Expr>,
    branches: &[CaseBranch],
    else_result: Option<&Expr>,
) -> String {
    let mut out = String::from("CASE");
    if let Some(operand) = operand {
        out.push(' ');
        out.push_str(&rehydrate(operand));
    }
    for branch in branches {
        out.push_str(&format!(
            " WHEN {} THEN {}",
            rehydrate(&branch.condition),
            rehydrate(&branch.result)
        ));
    }
    if let Some(else_result) = else_result {
        out.push_str(&format!(" ELSE {}", rehydrate(else_result)));
    }
    out.push_str(" END");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Select;

    fn col(table: Option<&str>, column: &str) -> Expr {
        Expr::column(table, column)
    }

    #[test]
    fn test_binary_and_columns() {
        let expr = Expr::binary(col(Some("o"), "total"), ">=", Expr::number("100"));
        assert_eq!(rehydrate(&expr), "o.total >= 100");
    }

    #[test]
    fn test_string_literal_is_quoted() {
        let expr = Expr::binary(col(None, "status"), "=", Expr::string("open"));
        assert_eq!(rehydrate(&expr), "status = 'open'");
    }

    #[test]
    fn test_embedded_quote_is_doubled() {
        let expr = Expr::binary(col(None, "name"), "=", Expr::string("O'Brien"));
        assert_eq!(rehydrate(&expr), "name = 'O''Brien'");
    }

    #[test]
    fn test_unary_operator_spacing() {
        let negative = Expr::Unary {
            operator: "-".to_string(),
            expr: Box::new(Expr::number("5")),
        };
        assert_eq!(rehydrate(&negative), "-5");

        let negated = Expr::Unary {
            operator: "NOT".to_string(),
            expr: Box::new(col(None, "active")),
        };
        assert_eq!(rehydrate(&negated), "NOT active");
    }

    #[test]
    fn test_in_list() {
        let expr = Expr::binary(
            col(None, "region"),
            "IN",
            Expr::List {
                items: vec![Expr::string("EU"), Expr::string("US")],
            },
        );
        assert_eq!(rehydrate(&expr), "region IN ('EU', 'US')");
    }

    #[test]
    fn test_function_with_window() {
        let expr = Expr::Function {
            name: "ROW_NUMBER".into(),
            args: vec![],
            distinct: false,
            over: Some(WindowSpec {
                partition_by: vec![col(None, "customer_id")],
                order_by: vec![OrderKey {
                    expr: col(None, "created_at"),
                    asc: Some(false),
                }],
            }),
        };
        assert_eq!(
            rehydrate(&expr),
            "ROW_NUMBER() OVER(PARTITION BY customer_id ORDER BY created_at DESC)"
        );
    }

    #[test]
    fn test_function_with_empty_window() {
        let expr = Expr::Function {
            name: "COUNT".into(),
            args: vec![col(None, "*")],
            distinct: false,
            over: Some(WindowSpec::default()),
        };
        assert_eq!(rehydrate(&expr), "COUNT(*) OVER()");
    }

    #[test]
    fn test_distinct_function() {
        let expr = Expr::Function {
            name: "COUNT".into(),
            args: vec![col(None, "id")],
            distinct: true,
            over: None,
        };
        assert_eq!(rehydrate(&expr), "COUNT(DISTINCT id)");
    }

    #[test]
    fn test_case_expression() {
        let expr = Expr::Case {
            operand: None,
            branches: vec![CaseBranch {
                condition: Expr::binary(col(None, "amount"), ">", Expr::number("0")),
                result: Expr::string("credit"),
            }],
            else_result: Some(Box::new(Expr::string("debit"))),
        };
        assert_eq!(
            rehydrate(&expr),
            "CASE WHEN amount > 0 THEN 'credit' ELSE 'debit' END"
        );
    }

    #[test]
    fn test_cast() {
        let expr = Expr::Cast {
            expr: Box::new(col(None, "order_date")),
            data_type: "DATE".into(),
        };
        assert_eq!(rehydrate(&expr), "CAST(order_date AS DATE)");
    }

    #[test]
    fn test_unknown_shapes_fall_back() {
        let with_text = Expr::Unknown {
            text: Some("x IS NULL".into()),
        };
        assert_eq!(rehydrate(&with_text), "x IS NULL");

        assert_eq!(rehydrate(&Expr::Unknown { text: None }), COMPLEX_EXPRESSION);
        assert_eq!(
            rehydrate(&Expr::Unknown {
                text: Some("  ".into())
            }),
            COMPLEX_EXPRESSION
        );
        assert_eq!(rehydrate(&Expr::Unrecognized), COMPLEX_EXPRESSION);
    }

    #[test]
    fn test_subquery_without_text_is_placeholder() {
        let expr = Expr::binary(
            col(None, "id"),
            "IN",
            Expr::Subquery {
                query: Box::new(Select::default()),
                text: None,
            },
        );
        assert_eq!(rehydrate(&expr), format!("id IN {COMPLEX_EXPRESSION}"));
    }

    #[test]
    fn test_nested_placeholder_is_deterministic() {
        let expr = Expr::Nested {
            expr: Box::new(Expr::binary(
                Expr::Unrecognized,
                "OR",
                col(Some("t"), "flag"),
            )),
        };
        assert_eq!(rehydrate(&expr), rehydrate(&expr));
        assert_eq!(rehydrate(&expr), "([Complex Expression] OR t.flag)");
    }
}
